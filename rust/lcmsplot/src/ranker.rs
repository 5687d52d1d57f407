use std::cmp::Ordering;

use crate::errors::{
    LcmsPlotError,
    Result,
};

/// Configuration for the [IonFilterRanker].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankerConfig {
    /// Maximum number of points that survive a [IonFilterRanker::filter_data] call.
    pub max_count: usize,
    /// If set (0-100], the kept points are further limited to the most intense
    /// ones needed to reach this percentage of the total intensity.
    pub total_intensity_pct: Option<f64>,
}

impl RankerConfig {
    pub fn max_count(max_count: usize) -> Self {
        Self {
            max_count,
            total_intensity_pct: None,
        }
    }
}

/// Streaming top-K selector over (key, intensity) pairs.
///
/// Points are added one at a time (possibly from many scans) and a single
/// call to [IonFilterRanker::filter_data] decides which ones are kept.
/// The ranking is exact: the kept set is the `max_count` most intense points,
/// ties broken by insertion order (earlier points win).
///
/// The buffers are re-used across sessions, call [IonFilterRanker::reset]
/// to start a new one.
///
/// # Example
///
/// ```
/// use lcmsplot::IonFilterRanker;
///
/// let mut ranker = IonFilterRanker::<u32>::new(2);
/// ranker.add_point(10, 5.0);
/// ranker.add_point(11, 50.0);
/// ranker.add_point(12, 20.0);
/// assert_eq!(ranker.filter_data(), 2);
///
/// let kept: Vec<u32> = ranker
///     .iter_marked()
///     .unwrap()
///     .filter(|(_, keep)| *keep)
///     .map(|(k, _)| k)
///     .collect();
/// assert_eq!(kept, vec![11, 12]);
/// ```
#[derive(Debug, Clone)]
pub struct IonFilterRanker<K: Copy = usize> {
    keys: Vec<K>,
    intensities: Vec<f64>,
    keep: Vec<bool>,
    order: Vec<usize>,
    config: RankerConfig,
    filtered: bool,
}

impl<K: Copy> IonFilterRanker<K> {
    pub fn new(max_count: usize) -> Self {
        Self::with_capacity(0, RankerConfig::max_count(max_count))
    }

    pub fn with_capacity(capacity: usize, config: RankerConfig) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            intensities: Vec::with_capacity(capacity),
            keep: Vec::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            config,
            filtered: false,
        }
    }

    /// Clears all points and sets a new retain count.
    /// Keeps the allocated buffers.
    pub fn reset(&mut self, max_count: usize) {
        self.keys.clear();
        self.intensities.clear();
        self.keep.clear();
        self.order.clear();
        self.config.max_count = max_count;
        self.filtered = false;
    }

    pub fn set_total_intensity_pct(&mut self, pct: Option<f64>) {
        self.config.total_intensity_pct = pct;
        self.filtered = false;
    }

    pub fn config(&self) -> RankerConfig {
        self.config
    }

    pub fn add_point(&mut self, key: K, intensity: f64) {
        self.keys.push(key);
        self.intensities.push(intensity);
        self.filtered = false;
    }

    pub fn reserve(&mut self, additional: usize) {
        self.keys.reserve(additional);
        self.intensities.reserve(additional);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Evaluates the global threshold over every point added so far.
    ///
    /// Returns the number of kept points, which is always
    /// `min(max_count, len())` unless the intensity percentage filter
    /// is enabled (then it can be lower).
    pub fn filter_data(&mut self) -> usize {
        let n = self.intensities.len();
        let k = self.config.max_count.min(n);

        self.keep.clear();
        self.keep.resize(n, false);
        self.filtered = true;

        if k == 0 {
            return 0;
        }

        if k == n && self.config.total_intensity_pct.is_none() {
            self.keep.iter_mut().for_each(|x| *x = true);
            return n;
        }

        self.order.clear();
        self.order.extend(0..n);

        let intensities = &self.intensities;
        // Descending intensity, then ascending insertion position.
        let cmp = |a: &usize, b: &usize| -> Ordering {
            intensities[*b]
                .total_cmp(&intensities[*a])
                .then_with(|| a.cmp(b))
        };

        if k < n {
            self.order.select_nth_unstable_by(k - 1, cmp);
        }
        let top = &mut self.order[..k];

        let num_kept = match self.config.total_intensity_pct {
            None => k,
            Some(pct) => {
                top.sort_unstable_by(cmp);
                let total: f64 = intensities.iter().sum();
                let target = total * (pct.clamp(0.0, 100.0) / 100.0);
                let mut cumulative = 0.0;
                let mut num = 0;
                for &idx in top.iter() {
                    if cumulative >= target && num > 0 {
                        break;
                    }
                    cumulative += intensities[idx];
                    num += 1;
                }
                num
            }
        };

        for &idx in &self.order[..num_kept] {
            self.keep[idx] = true;
        }
        num_kept
    }

    /// Whether the point added at position `pos` (0-based insertion order)
    /// was kept by the last [IonFilterRanker::filter_data] call.
    pub fn is_kept(&self, pos: usize) -> Result<bool> {
        if !self.filtered {
            return Err(LcmsPlotError::RankerNotFiltered);
        }
        self.keep
            .get(pos)
            .copied()
            .ok_or(LcmsPlotError::RankerIndexOutOfBounds {
                pos,
                len: self.keep.len(),
            })
    }

    /// Iterates over `(key, keep)` in insertion order.
    pub fn iter_marked(&self) -> Result<impl Iterator<Item = (K, bool)> + '_> {
        if !self.filtered {
            return Err(LcmsPlotError::RankerNotFiltered);
        }
        Ok(self.keys.iter().copied().zip(self.keep.iter().copied()))
    }

    /// Keep/discard flags in insertion order.
    pub fn marks(&self) -> Result<&[bool]> {
        if !self.filtered {
            return Err(LcmsPlotError::RankerNotFiltered);
        }
        Ok(&self.keep)
    }

    pub fn kept_count(&self) -> usize {
        self.keep.iter().filter(|x| **x).count()
    }
}
