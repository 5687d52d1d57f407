use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::{
    LcmsPlotError,
    Result,
};
use crate::scan::{
    Ion,
    MsLevelFilter,
};
use crate::series::{
    AxisRange,
    PlotData,
    PlotPoint,
    PlotSeries,
    SeriesKind,
    scan_axis,
};
use crate::utils::round_up_to_multiple;

/// Per-scan summary used for the TIC and BPI plots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChromatogramPoint {
    pub scan_number: i32,
    pub ms_level: u8,
    pub elution_time: f64,
    /// Number of ions the reader handed over (before any filtering).
    pub raw_ion_count: usize,
    pub tic: f64,
    pub bpi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChromatogramKind {
    Tic,
    Bpi,
}

impl ChromatogramKind {
    fn title(&self) -> &'static str {
        match self {
            ChromatogramKind::Tic => "TIC",
            ChromatogramKind::Bpi => "BPI",
        }
    }

    fn value(&self, point: &ChromatogramPoint) -> f64 {
        match self {
            ChromatogramKind::Tic => point.tic,
            ChromatogramKind::Bpi => point.bpi,
        }
    }
}

/// Collects TIC and base peak intensity of every scan.
///
/// Unlike the [crate::ScanAccumulator] nothing is ever dropped, one small
/// record is kept per scan.
#[derive(Debug, Clone, Default)]
pub struct ChromatogramAccumulator {
    points: Vec<ChromatogramPoint>,
    use_observed_min_scan: bool,
}

impl ChromatogramAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the scan axis at the lowest observed scan instead of 0.
    pub fn with_observed_min_scan(mut self, use_observed_min_scan: bool) -> Self {
        self.use_observed_min_scan = use_observed_min_scan;
        self
    }

    /// Records the scan from the raw ion list, non-positive intensities are ignored.
    pub fn add_scan(
        &mut self,
        scan_number: i32,
        ms_level: u8,
        elution_time: f64,
        ions: &[Ion],
    ) -> Result<()> {
        let mut tic = 0.0;
        let mut bpi = 0.0f64;
        for (index, ion) in ions.iter().enumerate() {
            if !ion.intensity.is_finite() {
                return Err(LcmsPlotError::NonFiniteValue { scan_number, index });
            }
            if ion.intensity <= 0.0 {
                continue;
            }
            tic += ion.intensity;
            bpi = bpi.max(ion.intensity);
        }
        self.points.push(ChromatogramPoint {
            scan_number,
            ms_level,
            elution_time,
            raw_ion_count: ions.len(),
            tic,
            bpi,
        });
        Ok(())
    }

    pub fn points(&self) -> &[ChromatogramPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Line series of (scan number, TIC or BPI) for the scans that pass the filter.
    ///
    /// The intensity axis always starts at 0.
    pub fn build_series(&self, kind: ChromatogramKind, filter: MsLevelFilter) -> PlotData {
        let title = kind.title();
        let points: Vec<PlotPoint> = self
            .points
            .iter()
            .filter(|p| filter.matches(p.ms_level))
            .map(|p| PlotPoint {
                x: p.scan_number as f64,
                y: kind.value(p),
                value: p.elution_time,
            })
            .collect();

        if points.is_empty() {
            return PlotData::empty(title, "Scan Number", "Intensity");
        }

        let min_scan = points.iter().map(|p| p.x as i32).min().unwrap_or(0);
        let max_scan = points.iter().map(|p| p.x as i32).max().unwrap_or(0);
        let max_y = points.iter().map(|p| p.y).fold(0.0, f64::max);
        let max_elution_time = points.iter().map(|p| p.value).fold(0.0, f64::max);

        let (x_min, x_max) = scan_axis(min_scan, max_scan, self.use_observed_min_scan);
        let y_max = if max_y > 0.0 {
            round_up_to_multiple(max_y, 10f64.powi(max_y.log10().floor() as i32))
        } else {
            1.0
        };

        let num_points = points.len();
        let mut out = PlotData {
            title: title.to_string(),
            x_label: "Scan Number".to_string(),
            y_label: "Intensity".to_string(),
            series: vec![PlotSeries {
                title: title.to_string(),
                kind: SeriesKind::Line,
                points,
                marker_size: 1.0,
                color: None,
            }],
            axis: AxisRange {
                x_min,
                x_max,
                y_min: 0.0,
                y_max,
            },
            color_scale: None,
            annotations: Vec::new(),
            points_plotted: num_points,
            max_elution_time: if max_elution_time > 0.0 {
                Some(max_elution_time)
            } else {
                None
            },
        };
        out.push_standard_annotations();
        out
    }
}
