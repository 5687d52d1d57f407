use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::{
    LcmsPlotError,
    Result,
};

/// Selects which scans take part in a plot or a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsLevelFilter {
    All,
    Exactly(u8),
    AtLeast(u8),
}

impl MsLevelFilter {
    pub fn matches(&self, ms_level: u8) -> bool {
        match self {
            MsLevelFilter::All => true,
            MsLevelFilter::Exactly(x) => ms_level == *x,
            MsLevelFilter::AtLeast(x) => ms_level >= *x,
        }
    }

    /// True when the filter only lets fragmentation scans through.
    pub fn is_fragmentation_only(&self) -> bool {
        match self {
            MsLevelFilter::All => false,
            MsLevelFilter::Exactly(x) | MsLevelFilter::AtLeast(x) => *x >= 2,
        }
    }
}

/// A single ion as handed over by the readers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ion {
    pub mz: f64,
    pub intensity: f64,
    /// 0 means unassigned.
    #[serde(default)]
    pub charge: u8,
}

impl Ion {
    pub fn new(mz: f64, intensity: f64, charge: u8) -> Self {
        Self {
            mz,
            intensity,
            charge,
        }
    }
}

/// One scan worth of ions stored as parallel arrays.
///
/// `ion_count` is the logical length, the arrays can be longer after
/// an in-place compaction (until [ScanRecord::shrink_arrays] is called).
/// The m/z array is sorted ascending for the first `ion_count` elements
/// whenever the record lives inside an accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRecord {
    pub scan_number: i32,
    pub ms_level: u8,
    /// Minutes
    pub elution_time: f64,
    ion_count: usize,
    mz: Vec<f64>,
    intensity: Vec<f64>,
    charge: Vec<u8>,
}

impl ScanRecord {
    pub fn new(scan_number: i32, ms_level: u8, elution_time: f64) -> Self {
        Self {
            scan_number,
            ms_level,
            elution_time,
            ion_count: 0,
            mz: Vec::new(),
            intensity: Vec::new(),
            charge: Vec::new(),
        }
    }

    pub fn with_capacity(scan_number: i32, ms_level: u8, elution_time: f64, capacity: usize) -> Self {
        let mut out = Self::new(scan_number, ms_level, elution_time);
        out.mz.reserve(capacity);
        out.intensity.reserve(capacity);
        out.charge.reserve(capacity);
        out
    }

    pub fn from_ions(scan_number: i32, ms_level: u8, elution_time: f64, ions: &[Ion]) -> Self {
        let mut out = Self::with_capacity(scan_number, ms_level, elution_time, ions.len());
        for ion in ions {
            out.push(*ion);
        }
        out
    }

    /// Builds a record from parallel slices, charge defaults to 0 when not given.
    pub fn from_arrays(
        scan_number: i32,
        ms_level: u8,
        elution_time: f64,
        mz: &[f64],
        intensity: &[f64],
        charge: Option<&[u8]>,
    ) -> Result<Self> {
        let charge_len = charge.map(|c| c.len());
        if mz.len() != intensity.len() || charge_len.is_some_and(|c| c != mz.len()) {
            return Err(LcmsPlotError::ExpectedSlicesSameLength {
                mz: mz.len(),
                intensity: intensity.len(),
                charge: charge_len,
            });
        }

        let mut out = Self::new(scan_number, ms_level, elution_time);
        out.mz.extend_from_slice(mz);
        out.intensity.extend_from_slice(intensity);
        match charge {
            Some(c) => out.charge.extend_from_slice(c),
            None => out.charge.resize(mz.len(), 0),
        }
        out.ion_count = mz.len();
        Ok(out)
    }

    pub fn push(&mut self, ion: Ion) {
        // Drop anything past the logical end before appending.
        self.truncate_to_count();
        self.mz.push(ion.mz);
        self.intensity.push(ion.intensity);
        self.charge.push(ion.charge);
        self.ion_count += 1;
    }

    fn truncate_to_count(&mut self) {
        self.mz.truncate(self.ion_count);
        self.intensity.truncate(self.ion_count);
        self.charge.truncate(self.ion_count);
    }

    pub fn ion_count(&self) -> usize {
        self.ion_count
    }

    pub fn is_empty(&self) -> bool {
        self.ion_count == 0
    }

    /// Allocated length of the arrays, >= ion_count.
    pub fn allocated_len(&self) -> usize {
        self.mz.len()
    }

    pub fn mz(&self) -> &[f64] {
        &self.mz[..self.ion_count]
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity[..self.ion_count]
    }

    pub fn charge(&self) -> &[u8] {
        &self.charge[..self.ion_count]
    }

    pub fn ion(&self, idx: usize) -> Option<Ion> {
        if idx >= self.ion_count {
            return None;
        }
        Some(Ion::new(self.mz[idx], self.intensity[idx], self.charge[idx]))
    }

    pub fn iter_ions(&self) -> impl Iterator<Item = Ion> + '_ {
        self.mz()
            .iter()
            .zip(self.intensity().iter())
            .zip(self.charge().iter())
            .map(|((mz, int), z)| Ion::new(*mz, *int, *z))
    }

    /// In-place compaction, keeps the ions whose flag is true.
    ///
    /// `keep` must have exactly `ion_count` elements. The relative order
    /// of the kept ions is preserved and the arrays are NOT shrunk.
    pub fn retain_marked(&mut self, keep: &[bool]) -> Result<usize> {
        if keep.len() != self.ion_count {
            return Err(LcmsPlotError::FilterFailure {
                context: format!("compacting scan {}", self.scan_number),
                msg: format!(
                    "expected {} keep flags, got {}",
                    self.ion_count,
                    keep.len()
                ),
            });
        }

        let mut target = 0;
        for (src, &k) in keep.iter().enumerate() {
            if !k {
                continue;
            }
            if target != src {
                self.mz[target] = self.mz[src];
                self.intensity[target] = self.intensity[src];
                self.charge[target] = self.charge[src];
            }
            target += 1;
        }
        self.ion_count = target;
        Ok(target)
    }

    /// Releases the memory past the logical end of the arrays.
    pub fn shrink_arrays(&mut self) {
        self.truncate_to_count();
        self.mz.shrink_to_fit();
        self.intensity.shrink_to_fit();
        self.charge.shrink_to_fit();
    }

    pub fn is_mz_sorted(&self) -> bool {
        self.mz().windows(2).all(|w| w[0] <= w[1])
    }

    /// Stable sort of all three arrays by ascending m/z.
    pub(crate) fn sort_by_mz(&mut self) {
        let mut ions: Vec<Ion> = self.iter_ions().collect();
        ions.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        for (i, ion) in ions.into_iter().enumerate() {
            self.mz[i] = ion.mz;
            self.intensity[i] = ion.intensity;
            self.charge[i] = ion.charge;
        }
    }

    /// Total ion current of the stored ions.
    pub fn total_intensity(&self) -> f64 {
        self.intensity().iter().sum()
    }

    /// (m/z, intensity) of the most intense stored ion.
    pub fn base_peak(&self) -> Option<(f64, f64)> {
        self.mz()
            .iter()
            .zip(self.intensity().iter())
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(mz, int)| (*mz, *int))
    }

    pub fn mz_range(&self) -> Option<(f64, f64)> {
        let mz = self.mz();
        if mz.is_empty() {
            return None;
        }
        let min = mz.iter().copied().fold(f64::INFINITY, f64::min);
        let max = mz.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }
}
