//! Streaming accumulation of scans with bounded memory.
//!
//! Every scan goes through the same ingestion steps:
//!
//! 1. Drop ions with intensity <= 0 or below the configured minimum.
//! 2. Sort by m/z if the reader handed them out of order.
//! 3. Centroid if any two neighbors are closer than the m/z resolution.
//! 4. Cap the scan to [MAX_ALLOWABLE_ION_COUNT] ions, keeping the most intense.
//!
//! After each insertion the running point count is checked against
//! `max_points_to_plot * 5`; crossing it (and having grown at least 10%
//! since the last trim) triggers a global trim over all cached scans.

use std::fmt::Display;

use tracing::{
    debug,
    info,
    instrument,
    warn,
};

use crate::centroiding::{
    CentroidSummary,
    Centroider,
    needs_centroiding,
};
use crate::errors::{
    AddScanOutcome,
    LcmsPlotError,
    Result,
};
use crate::options::FilterOptions;
use crate::ranker::IonFilterRanker;
use crate::scan::{
    Ion,
    MsLevelFilter,
    ScanRecord,
};

/// Hard limit of ions kept for a single scan.
pub const MAX_ALLOWABLE_ION_COUNT: usize = 50_000;

/// The cache can grow to this multiple of `max_points_to_plot` before trimming.
pub const TRIM_TRIGGER_MULTIPLIER: usize = 5;

/// A trim only fires again once the cache grew this much since the last one.
pub const TRIM_GROWTH_FACTOR: f64 = 1.1;

const NOTICE_INITIAL_COUNT: usize = 10;
const UNSORTED_NOTICE_INTERVAL: usize = 100;

/// Counters used to rate-limit the warnings of a single accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoticeCounters {
    pub unsorted_scans: usize,
    pub capped_scans: usize,
    pub max_capped_ion_count: usize,
}

impl NoticeCounters {
    /// Registers an unsorted scan, true for the first 10 and then every 100th.
    fn register_unsorted(&mut self) -> bool {
        self.unsorted_scans += 1;
        self.unsorted_scans <= NOTICE_INITIAL_COUNT
            || self.unsorted_scans % UNSORTED_NOTICE_INTERVAL == 0
    }

    /// Registers a capped scan, true for the first 10 and whenever a new
    /// maximum ion count shows up.
    fn register_capped(&mut self, ion_count: usize) -> bool {
        self.capped_scans += 1;
        let new_max = ion_count > self.max_capped_ion_count;
        if new_max {
            self.max_capped_ion_count = ion_count;
        }
        self.capped_scans <= NOTICE_INITIAL_COUNT || new_max
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulatorStats {
    pub scans_added: usize,
    pub scans_skipped_empty: usize,
    pub ions_received: usize,
    pub ions_dropped_low_intensity: usize,
    pub centroid_passes: usize,
    pub ions_removed_centroiding: usize,
    pub capped_scans: usize,
    pub ions_removed_capping: usize,
    pub trim_passes: usize,
    pub ions_removed_trimming: usize,
}

impl Display for AccumulatorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Scans added: {}", self.scans_added)?;
        writeln!(f, "Scans skipped (empty): {}", self.scans_skipped_empty)?;
        writeln!(f, "Ions received: {}", self.ions_received)?;
        writeln!(
            f,
            "Ions dropped (intensity filter): {}",
            self.ions_dropped_low_intensity
        )?;
        writeln!(
            f,
            "Centroid passes: {} (removed {} ions)",
            self.centroid_passes, self.ions_removed_centroiding
        )?;
        writeln!(
            f,
            "Capped scans: {} (removed {} ions)",
            self.capped_scans, self.ions_removed_capping
        )?;
        writeln!(
            f,
            "Trim passes: {} (removed {} ions)",
            self.trim_passes, self.ions_removed_trimming
        )?;
        Ok(())
    }
}

/// Result of a single [ScanAccumulator::trim_cached_data] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimSummary {
    pub points_before: usize,
    pub points_after: usize,
    /// Scans that lost at least one point.
    pub scans_trimmed: usize,
    /// Scans that would have dropped under the floor and were
    /// re-filtered on their own.
    pub scans_floored: usize,
}

/// Owns every cached scan of one dataset.
///
/// Single writer: scans are pushed sequentially by the reading loop.
/// One accumulator per dataset is the unit of parallelism.
#[derive(Debug)]
pub struct ScanAccumulator {
    options: FilterOptions,
    scans: Vec<ScanRecord>,
    total_cached_points: usize,
    points_cached_after_last_trim: usize,
    centroider: Centroider,
    global_ranker: IonFilterRanker<u32>,
    local_ranker: IonFilterRanker<usize>,
    notices: NoticeCounters,
    stats: AccumulatorStats,
}

impl ScanAccumulator {
    pub fn new(options: FilterOptions) -> Result<Self> {
        options.validate()?;
        let centroider = Centroider::new(options.mz_resolution);
        Ok(Self {
            options,
            scans: Vec::new(),
            total_cached_points: 0,
            points_cached_after_last_trim: 0,
            centroider,
            global_ranker: IonFilterRanker::new(0),
            local_ranker: IonFilterRanker::new(0),
            notices: NoticeCounters::default(),
            stats: AccumulatorStats::default(),
        })
    }

    /// Drops every cached scan and zeroes the counters.
    pub fn reset(&mut self) {
        self.scans.clear();
        self.total_cached_points = 0;
        self.points_cached_after_last_trim = 0;
        self.notices = NoticeCounters::default();
        self.stats = AccumulatorStats::default();
    }

    /// Filters, sorts, centroids and caps the ions before caching them.
    ///
    /// An empty ion list (or one where nothing survives the intensity filter)
    /// returns [AddScanOutcome::NothingToAdd].
    pub fn add_scan(
        &mut self,
        scan_number: i32,
        ms_level: u8,
        elution_time: f64,
        ions: &[Ion],
    ) -> Result<AddScanOutcome> {
        self.add_scan_iter(scan_number, ms_level, elution_time, ions.iter().copied())
    }

    /// Same as [ScanAccumulator::add_scan] for parallel arrays.
    pub fn add_scan_arrays(
        &mut self,
        scan_number: i32,
        ms_level: u8,
        elution_time: f64,
        mz: &[f64],
        intensity: &[f64],
        charge: Option<&[u8]>,
    ) -> Result<AddScanOutcome> {
        let charge_len = charge.map(|c| c.len());
        if mz.len() != intensity.len() || charge_len.is_some_and(|c| c != mz.len()) {
            return Err(LcmsPlotError::ExpectedSlicesSameLength {
                mz: mz.len(),
                intensity: intensity.len(),
                charge: charge_len,
            });
        }
        let ions = mz.iter().zip(intensity.iter()).enumerate().map(|(i, (mz, int))| {
            let z = charge.map(|c| c[i]).unwrap_or(0);
            Ion::new(*mz, *int, z)
        });
        self.add_scan_iter(scan_number, ms_level, elution_time, ions)
    }

    fn add_scan_iter(
        &mut self,
        scan_number: i32,
        ms_level: u8,
        elution_time: f64,
        ions: impl ExactSizeIterator<Item = Ion>,
    ) -> Result<AddScanOutcome> {
        check_scan_metadata(scan_number, ms_level, elution_time)?;
        let num_ions = ions.len();
        self.stats.ions_received += num_ions;
        if num_ions == 0 {
            self.stats.scans_skipped_empty += 1;
            debug!("Scan {} has no ions, nothing to add", scan_number);
            return Ok(AddScanOutcome::NothingToAdd);
        }

        let min_intensity = self.options.min_intensity;
        let mut record = ScanRecord::with_capacity(scan_number, ms_level, elution_time, num_ions);
        for (index, ion) in ions.enumerate() {
            if !ion.mz.is_finite() || !ion.intensity.is_finite() {
                return Err(LcmsPlotError::NonFiniteValue { scan_number, index });
            }
            if ion.intensity > 0.0 && ion.intensity >= min_intensity {
                record.push(ion);
            }
        }
        self.stats.ions_dropped_low_intensity += num_ions - record.ion_count();

        if record.is_empty() {
            self.stats.scans_skipped_empty += 1;
            debug!(
                "Scan {} has no ions above the intensity threshold, nothing to add",
                scan_number
            );
            return Ok(AddScanOutcome::NothingToAdd);
        }

        self.ingest(record)
    }

    fn ingest(&mut self, mut record: ScanRecord) -> Result<AddScanOutcome> {
        // Zero-intensity ions are already gone, so any disorder left is
        // real data disorder and worth a (rate-limited) notice.
        if !record.is_mz_sorted() {
            if self.notices.register_unsorted() {
                warn!(
                    "Scan {} has m/z values out of order, sorting (unsorted scans so far: {})",
                    record.scan_number, self.notices.unsorted_scans
                );
            }
            record.sort_by_mz();
        }

        if needs_centroiding(record.mz(), self.options.mz_resolution) {
            let CentroidSummary {
                initial_points,
                final_points,
            } = self
                .centroider
                .centroid_scan(&mut record)
                .map_err(|e| e.in_context("centroiding"))?;
            self.stats.centroid_passes += 1;
            self.stats.ions_removed_centroiding += initial_points - final_points;
        }

        let ion_count = record.ion_count();
        if ion_count > MAX_ALLOWABLE_ION_COUNT {
            if self.notices.register_capped(ion_count) {
                warn!(
                    "Scan {} has {} ions, keeping the {} most intense (capped scans so far: {})",
                    record.scan_number,
                    ion_count,
                    MAX_ALLOWABLE_ION_COUNT,
                    self.notices.capped_scans
                );
            }
            let kept = Self::keep_most_intense(
                &mut self.local_ranker,
                &mut record,
                MAX_ALLOWABLE_ION_COUNT,
            )
            .map_err(|e| e.in_context("ion cap"))?;
            record.shrink_arrays();
            self.stats.capped_scans += 1;
            self.stats.ions_removed_capping += ion_count - kept;
        }

        self.push_scan(record)
    }

    /// Caches a scan as-is, without filtering, sorting or centroiding.
    ///
    /// Meant for replaying data that was already processed. The trim
    /// trigger still applies.
    pub fn add_scan_skip_filters(&mut self, scan: ScanRecord) -> Result<AddScanOutcome> {
        self.stats.ions_received += scan.ion_count();
        if scan.is_empty() {
            self.stats.scans_skipped_empty += 1;
            return Ok(AddScanOutcome::NothingToAdd);
        }
        self.push_scan(scan)
    }

    fn push_scan(&mut self, scan: ScanRecord) -> Result<AddScanOutcome> {
        let ions_stored = scan.ion_count();
        self.total_cached_points += ions_stored;
        self.scans.push(scan);
        self.stats.scans_added += 1;

        let trimmed = self.maybe_trim()?;
        Ok(AddScanOutcome::Added {
            ions_stored,
            trimmed,
        })
    }

    fn should_trim(&self) -> bool {
        let limit = self
            .options
            .max_points_to_plot
            .saturating_mul(TRIM_TRIGGER_MULTIPLIER);
        self.total_cached_points > limit
            && self.total_cached_points as f64
                > self.points_cached_after_last_trim as f64 * TRIM_GROWTH_FACTOR
    }

    fn maybe_trim(&mut self) -> Result<bool> {
        if !self.should_trim() {
            return Ok(false);
        }
        self.trim_cached_data(
            self.options.max_points_to_plot,
            self.options.min_points_per_spectrum,
        )?;
        Ok(true)
    }

    /// Trims to `max_points_to_plot` if the cache holds more than that.
    ///
    /// Called right before plotting.
    pub fn trim_to_target(&mut self) -> Result<Option<TrimSummary>> {
        if self.total_cached_points <= self.options.max_points_to_plot {
            return Ok(None);
        }
        self.trim_cached_data(
            self.options.max_points_to_plot,
            self.options.min_points_per_spectrum,
        )
        .map(Some)
    }

    /// Global trim of the cache down to (roughly) `target_count` points.
    ///
    /// All scans with more than `min_per_spectrum` ions are ranked together
    /// and only the `target_count` most intense ions survive. A scan that
    /// would end below `min_per_spectrum` ions is instead filtered on its own,
    /// keeping exactly `min_per_spectrum` ions, so sparse scans are never
    /// wiped out by dense ones.
    #[instrument(skip(self))]
    pub fn trim_cached_data(
        &mut self,
        target_count: usize,
        min_per_spectrum: usize,
    ) -> Result<TrimSummary> {
        let points_before = self.total_cached_points;

        self.global_ranker.reset(target_count);
        for (scan_idx, scan) in self.scans.iter().enumerate() {
            if scan.ion_count() <= min_per_spectrum {
                continue;
            }
            self.global_ranker.reserve(scan.ion_count());
            for &intensity in scan.intensity() {
                self.global_ranker.add_point(scan_idx as u32, intensity);
            }
        }

        let mut scans_trimmed = 0;
        let mut scans_floored = 0;

        if !self.global_ranker.is_empty() {
            self.global_ranker.filter_data();
            let marks = self
                .global_ranker
                .marks()
                .map_err(|e| e.in_context("global trim"))?;

            let mut offset = 0;
            for scan in self.scans.iter_mut() {
                let n = scan.ion_count();
                if n <= min_per_spectrum {
                    continue;
                }
                let scan_marks = &marks[offset..offset + n];
                offset += n;

                let kept = scan_marks.iter().filter(|x| **x).count();
                if kept == n {
                    continue;
                }

                if kept < min_per_spectrum {
                    Self::keep_most_intense(&mut self.local_ranker, scan, min_per_spectrum)
                        .map_err(|e| e.in_context("trim floor"))?;
                    scans_floored += 1;
                } else {
                    scan.retain_marked(scan_marks)
                        .map_err(|e| e.in_context("global trim"))?;
                }
                scan.shrink_arrays();
                scans_trimmed += 1;
            }
        }

        self.total_cached_points = self.scans.iter().map(|s| s.ion_count()).sum();
        self.points_cached_after_last_trim = self.total_cached_points;
        self.stats.trim_passes += 1;
        self.stats.ions_removed_trimming += points_before.saturating_sub(self.total_cached_points);

        let summary = TrimSummary {
            points_before,
            points_after: self.total_cached_points,
            scans_trimmed,
            scans_floored,
        };
        debug!(
            "Trimmed cached data from {} to {} points ({} scans trimmed, {} kept at the floor)",
            summary.points_before, summary.points_after, scans_trimmed, scans_floored
        );
        Ok(summary)
    }

    /// Single-scan filter, keeps the `keep_count` most intense ions in place.
    fn keep_most_intense(
        ranker: &mut IonFilterRanker<usize>,
        scan: &mut ScanRecord,
        keep_count: usize,
    ) -> Result<usize> {
        ranker.reset(keep_count);
        ranker.reserve(scan.ion_count());
        for (i, &intensity) in scan.intensity().iter().enumerate() {
            ranker.add_point(i, intensity);
        }
        ranker.filter_data();
        scan.retain_marked(ranker.marks()?)
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn scans(&self) -> &[ScanRecord] {
        &self.scans
    }

    pub fn scan_count(&self) -> usize {
        self.scans.len()
    }

    pub fn total_cached_points(&self) -> usize {
        self.total_cached_points
    }

    pub fn points_cached_after_last_trim(&self) -> usize {
        self.points_cached_after_last_trim
    }

    pub fn trim_count(&self) -> usize {
        self.stats.trim_passes
    }

    pub fn stats(&self) -> &AccumulatorStats {
        &self.stats
    }

    pub fn notices(&self) -> &NoticeCounters {
        &self.notices
    }

    pub fn get_scan_by_scan_number(&self, scan_number: i32) -> Option<&ScanRecord> {
        self.scans.iter().find(|s| s.scan_number == scan_number)
    }

    /// (min, max) scan number among the cached scans that pass the filter.
    pub fn scan_number_range(&self, filter: MsLevelFilter) -> Option<(i32, i32)> {
        self.scans
            .iter()
            .filter(|s| filter.matches(s.ms_level))
            .fold(None, |acc, s| match acc {
                None => Some((s.scan_number, s.scan_number)),
                Some((lo, hi)) => Some((lo.min(s.scan_number), hi.max(s.scan_number))),
            })
    }

    /// Sorted, de-duplicated MS levels present in the cache.
    pub fn ms_levels(&self) -> Vec<u8> {
        let mut levels: Vec<u8> = self.scans.iter().map(|s| s.ms_level).collect();
        levels.sort_unstable();
        levels.dedup();
        levels
    }

    pub fn log_summary(&self) {
        info!(
            "Accumulator holds {} points in {} scans\n{}",
            self.total_cached_points,
            self.scans.len(),
            self.stats
        );
    }
}

fn check_scan_metadata(scan_number: i32, ms_level: u8, elution_time: f64) -> Result<()> {
    if ms_level == 0 {
        return Err(LcmsPlotError::InvalidScanMetadata {
            scan_number,
            msg: "MS level must be at least 1".to_string(),
        });
    }
    if !elution_time.is_finite() || elution_time < 0.0 {
        return Err(LcmsPlotError::InvalidScanMetadata {
            scan_number,
            msg: format!("elution time must be finite and non-negative, got {}", elution_time),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FilterOptions {
        FilterOptions::default().with_mz_resolution(0.0)
    }

    fn flat_scan(n: usize, offset: f64) -> Vec<Ion> {
        (0..n)
            .map(|i| Ion::new(100.0 + i as f64, offset + i as f64, 0))
            .collect()
    }

    #[test]
    fn test_empty_scan_is_noop() {
        let mut acc = ScanAccumulator::new(options()).unwrap();
        let out = acc.add_scan(1, 1, 0.1, &[]).unwrap();
        assert_eq!(out, AddScanOutcome::NothingToAdd);
        assert_eq!(acc.scan_count(), 0);
        assert_eq!(acc.total_cached_points(), 0);
    }

    #[test]
    fn test_intensity_filter() {
        let mut acc = ScanAccumulator::new(options().with_min_intensity(10.0)).unwrap();
        let ions = [
            Ion::new(100.0, 0.0, 0),
            Ion::new(101.0, 5.0, 0),
            Ion::new(102.0, 10.0, 0),
            Ion::new(103.0, -3.0, 0),
        ];
        let out = acc.add_scan(1, 1, 0.1, &ions).unwrap();
        assert_eq!(
            out,
            AddScanOutcome::Added {
                ions_stored: 1,
                trimmed: false
            }
        );
        assert_eq!(acc.scans()[0].mz(), &[102.0]);
        assert_eq!(acc.stats().ions_dropped_low_intensity, 3);

        // Nothing above the threshold
        let out = acc.add_scan(2, 1, 0.2, &ions[..2]).unwrap();
        assert_eq!(out, AddScanOutcome::NothingToAdd);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let mut acc = ScanAccumulator::new(options()).unwrap();
        let ions = [
            Ion::new(300.0, 1.0, 0),
            Ion::new(100.0, 2.0, 1),
            Ion::new(200.0, 3.0, 2),
        ];
        acc.add_scan(1, 1, 0.0, &ions).unwrap();
        assert_eq!(acc.scans()[0].mz(), &[100.0, 200.0, 300.0]);
        assert_eq!(acc.scans()[0].charge(), &[1, 2, 0]);
        assert_eq!(acc.notices().unsorted_scans, 1);
    }

    #[test]
    fn test_unsorted_zero_intensity_is_silent() {
        let mut acc = ScanAccumulator::new(options()).unwrap();
        let ions = [
            Ion::new(300.0, 0.0, 0),
            Ion::new(100.0, 2.0, 0),
            Ion::new(200.0, 3.0, 0),
        ];
        acc.add_scan(1, 1, 0.0, &ions).unwrap();
        assert_eq!(acc.notices().unsorted_scans, 0);
    }

    #[test]
    fn test_notice_rate_limits() {
        let mut counters = NoticeCounters::default();
        let reported: Vec<bool> = (0..200).map(|_| counters.register_unsorted()).collect();
        assert!(reported[..10].iter().all(|x| *x));
        assert!(!reported[10]);
        assert!(reported[99]);
        assert!(reported[199]);
        assert_eq!(reported.iter().filter(|x| **x).count(), 12);

        let mut counters = NoticeCounters::default();
        for _ in 0..10 {
            assert!(counters.register_capped(60_000));
        }
        assert!(!counters.register_capped(60_000));
        assert!(counters.register_capped(70_000));
        assert!(!counters.register_capped(65_000));
    }

    #[test]
    fn test_ion_cap() {
        let mut acc = ScanAccumulator::new(options().with_max_points_to_plot(1_000_000)).unwrap();
        let ions = flat_scan(MAX_ALLOWABLE_ION_COUNT + 100, 1.0);
        acc.add_scan(1, 1, 0.0, &ions).unwrap();
        let scan = &acc.scans()[0];
        assert_eq!(scan.ion_count(), MAX_ALLOWABLE_ION_COUNT);
        // The weakest ions are the first 100
        assert_eq!(scan.mz()[0], 200.0);
        assert!(scan.is_mz_sorted());
        assert_eq!(acc.stats().capped_scans, 1);
    }

    #[test]
    fn test_non_finite_is_error() {
        let mut acc = ScanAccumulator::new(options()).unwrap();
        let res = acc.add_scan(4, 1, 0.0, &[Ion::new(f64::NAN, 1.0, 0)]);
        assert!(matches!(
            res,
            Err(LcmsPlotError::NonFiniteValue {
                scan_number: 4,
                index: 0
            })
        ));
    }

    #[test]
    fn test_bad_scan_metadata_is_error() {
        let mut acc = ScanAccumulator::new(options()).unwrap();
        let ions = flat_scan(3, 1.0);
        for (ms_level, elution_time) in [(0, 1.0), (1, -0.5), (1, f64::NAN), (2, f64::INFINITY)] {
            let res = acc.add_scan(7, ms_level, elution_time, &ions);
            assert!(
                matches!(
                    res,
                    Err(LcmsPlotError::InvalidScanMetadata { scan_number: 7, .. })
                ),
                "ms_level {} elution_time {}",
                ms_level,
                elution_time
            );
        }
        assert_eq!(acc.scan_count(), 0);
        assert!(acc.add_scan(7, 1, 0.0, &ions).unwrap().was_added());
    }

    #[test]
    fn test_add_scan_arrays_mismatch() {
        let mut acc = ScanAccumulator::new(options()).unwrap();
        assert!(
            acc.add_scan_arrays(1, 1, 0.0, &[1.0, 2.0], &[1.0], None)
                .is_err()
        );
        let out = acc
            .add_scan_arrays(1, 1, 0.0, &[1.0, 2.0], &[1.0, 3.0], Some(&[0, 2]))
            .unwrap();
        assert!(out.was_added());
        assert_eq!(acc.scans()[0].charge(), &[0, 2]);
    }

    #[test]
    fn test_skip_filters_keeps_everything() {
        let mut acc = ScanAccumulator::new(FilterOptions::default()).unwrap();
        let scan = ScanRecord::from_ions(
            3,
            2,
            1.0,
            &[Ion::new(100.0, 0.0, 0), Ion::new(100.01, 5.0, 0)],
        );
        let out = acc.add_scan_skip_filters(scan).unwrap();
        assert_eq!(
            out,
            AddScanOutcome::Added {
                ions_stored: 2,
                trimmed: false
            }
        );
        let out = acc
            .add_scan_skip_filters(ScanRecord::new(4, 1, 1.0))
            .unwrap();
        assert_eq!(out, AddScanOutcome::NothingToAdd);
    }

    #[test]
    fn test_trim_respects_floor() {
        let mut acc = ScanAccumulator::new(options().with_max_points_to_plot(1_000_000)).unwrap();
        // One dense bright scan and one sparse dim scan
        acc.add_scan(1, 1, 0.0, &flat_scan(100, 1000.0)).unwrap();
        acc.add_scan(2, 1, 0.1, &flat_scan(20, 1.0)).unwrap();
        acc.add_scan(3, 1, 0.2, &flat_scan(3, 1.0)).unwrap();

        let summary = acc.trim_cached_data(50, 5).unwrap();
        assert_eq!(summary.points_before, 123);
        assert_eq!(summary.scans_floored, 1);
        assert_eq!(acc.scans()[0].ion_count(), 50);
        assert_eq!(acc.scans()[1].ion_count(), 5);
        // Below the floor to begin with, untouched
        assert_eq!(acc.scans()[2].ion_count(), 3);
        assert_eq!(acc.total_cached_points(), 58);
        assert_eq!(acc.points_cached_after_last_trim(), 58);
        // Floored scan kept its most intense ions
        assert_eq!(acc.scans()[1].intensity(), &[16.0, 17.0, 18.0, 19.0, 20.0]);
    }

    #[test]
    fn test_trim_trigger() {
        let mut acc = ScanAccumulator::new(
            options()
                .with_max_points_to_plot(100)
                .with_min_points_per_spectrum(1),
        )
        .unwrap();
        let mut trims = 0;
        for i in 0..20 {
            let out = acc.add_scan(i, 1, i as f64, &flat_scan(100, 1.0)).unwrap();
            if let AddScanOutcome::Added { trimmed: true, .. } = out {
                trims += 1;
            }
            assert!(acc.total_cached_points() <= 100 * TRIM_TRIGGER_MULTIPLIER + 100);
        }
        assert!(trims >= 1);
        assert_eq!(acc.trim_count(), trims);
    }

    #[test]
    fn test_trim_waits_for_cache_growth() {
        // The floor keeps 5 ions per scan, so after the first trim the
        // cache stays above 5x target and only the growth check gates trims.
        let max_points = 10;
        let mut acc = ScanAccumulator::new(
            options()
                .with_max_points_to_plot(max_points)
                .with_min_points_per_spectrum(5),
        )
        .unwrap();
        let limit = max_points * TRIM_TRIGGER_MULTIPLIER;

        let mut trim_scans = Vec::new();
        let mut held_back = 0;
        for i in 0..40 {
            let before_total = acc.total_cached_points();
            let last_trim = acc.points_cached_after_last_trim();
            let out = acc.add_scan(i, 1, i as f64, &flat_scan(6, 1.0)).unwrap();
            let AddScanOutcome::Added {
                ions_stored,
                trimmed,
            } = out
            else {
                panic!("scan {} was not added", i);
            };
            let grown = before_total + ions_stored;
            let over_growth = grown as f64 > last_trim as f64 * TRIM_GROWTH_FACTOR;

            assert_eq!(trimmed, grown > limit && over_growth, "scan {}", i);
            if trimmed {
                trim_scans.push(i);
                assert_eq!(acc.points_cached_after_last_trim(), acc.total_cached_points());
            } else if grown > limit {
                assert!(!over_growth);
                held_back += 1;
            }
        }

        assert_eq!(trim_scans.first(), Some(&8));
        assert!(held_back > 0);
        assert!(acc.total_cached_points() > limit);
        // Trims get sparser as the floored cache grows
        let gaps: Vec<i32> = trim_scans.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(gaps.windows(2).all(|w| w[0] <= w[1]), "{:?}", gaps);
        assert!(gaps.last().copied().unwrap_or(0) > 1);
    }

    #[test]
    fn test_trim_to_target() {
        let mut acc = ScanAccumulator::new(
            options()
                .with_max_points_to_plot(30)
                .with_min_points_per_spectrum(0),
        )
        .unwrap();
        acc.add_scan(1, 1, 0.0, &flat_scan(20, 1.0)).unwrap();
        assert!(acc.trim_to_target().unwrap().is_none());
        acc.add_scan(2, 1, 0.0, &flat_scan(20, 1.0)).unwrap();
        let summary = acc.trim_to_target().unwrap().unwrap();
        assert_eq!(summary.points_after, 30);
    }

    #[test]
    fn test_queries_and_reset() {
        let mut acc = ScanAccumulator::new(options()).unwrap();
        acc.add_scan(10, 1, 0.0, &flat_scan(3, 1.0)).unwrap();
        acc.add_scan(11, 2, 0.1, &flat_scan(3, 1.0)).unwrap();
        acc.add_scan(14, 2, 0.2, &flat_scan(3, 1.0)).unwrap();
        assert_eq!(acc.ms_levels(), vec![1, 2]);
        assert_eq!(
            acc.scan_number_range(MsLevelFilter::AtLeast(2)),
            Some((11, 14))
        );
        assert_eq!(acc.scan_number_range(MsLevelFilter::Exactly(3)), None);
        assert_eq!(acc.get_scan_by_scan_number(11).map(|s| s.ms_level), Some(2));
        acc.reset();
        assert_eq!(acc.scan_count(), 0);
        assert_eq!(acc.total_cached_points(), 0);
    }
}
