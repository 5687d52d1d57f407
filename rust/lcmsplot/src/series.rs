//! Projection of the cached scans into plottable series.
//!
//! Nothing here rasterizes: the output is a [PlotData] (labeled point sets,
//! axis ranges, color scale and annotations) meant for a [crate::PlotRenderer].

use serde::{
    Deserialize,
    Serialize,
};
use tracing::debug;

use crate::accumulator::ScanAccumulator;
use crate::options::FilterOptions;
use crate::scan::{
    MsLevelFilter,
    ScanRecord,
};
use crate::utils::{
    format_count,
    format_elution_time,
    median_in_place,
    rounded_range,
};

/// Scan axis bounds are rounded outward to this multiple.
pub const SCAN_AXIS_MULTIPLE: f64 = 10.0;
/// m/z (or mass) axis bounds are rounded outward to this multiple.
pub const MZ_AXIS_MULTIPLE: f64 = 100.0;

const MARKER_SIZE_FEW_SCANS: f64 = 4.0;
const MARKER_SIZE_SOME_SCANS: f64 = 3.0;
const MARKER_SIZE_MANY_SCANS: f64 = 2.0;
const MARKER_SIZE_MANY_POINTS: f64 = 1.0;
const FEW_SCANS_THRESHOLD: usize = 250;
const SOME_SCANS_THRESHOLD: usize = 2500;
const MANY_POINTS_THRESHOLD: usize = 250_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const BLUE: Rgb = Rgb::new(0, 0, 255);
pub const RED: Rgb = Rgb::new(255, 0, 0);
pub const GREEN: Rgb = Rgb::new(0, 128, 0);
pub const MAGENTA: Rgb = Rgb::new(255, 0, 255);
pub const BROWN: Rgb = Rgb::new(165, 42, 42);
pub const INDIGO: Rgb = Rgb::new(75, 0, 130);
pub const LIME: Rgb = Rgb::new(0, 255, 0);
pub const CORNFLOWER_BLUE: Rgb = Rgb::new(100, 149, 237);
pub const GRAY: Rgb = Rgb::new(128, 128, 128);

/// Fixed color for each charge state, unassigned and > 8 are gray.
pub fn charge_color(charge: u8) -> Rgb {
    match charge {
        1 => BLUE,
        2 => RED,
        3 => GREEN,
        4 => MAGENTA,
        5 => BROWN,
        6 => INDIGO,
        7 => LIME,
        8 => CORNFLOWER_BLUE,
        _ => GRAY,
    }
}

/// Gradient used to map the point value (intensity) to a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    #[default]
    Jet,
    BlackWhite,
    Blues,
    Rainbow,
}

impl Palette {
    /// Color for a position in [0, 1] along the gradient.
    pub fn color_at(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let lerp = |a: u8, b: u8, t: f64| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        match self {
            Palette::BlackWhite => {
                let v = lerp(255, 0, t);
                Rgb::new(v, v, v)
            }
            Palette::Blues => Rgb::new(lerp(222, 8, t), lerp(235, 48, t), lerp(247, 107, t)),
            Palette::Jet => {
                // blue -> cyan -> yellow -> red
                let stops = [BLUE, Rgb::new(0, 255, 255), Rgb::new(255, 255, 0), RED];
                Self::interpolate_stops(&stops, t)
            }
            Palette::Rainbow => {
                let stops = [
                    Rgb::new(148, 0, 211),
                    BLUE,
                    LIME,
                    Rgb::new(255, 255, 0),
                    Rgb::new(255, 127, 0),
                    RED,
                ];
                Self::interpolate_stops(&stops, t)
            }
        }
    }

    fn interpolate_stops(stops: &[Rgb], t: f64) -> Rgb {
        let segments = (stops.len() - 1) as f64;
        let pos = t * segments;
        let idx = (pos.floor() as usize).min(stops.len() - 2);
        let local = pos - idx as f64;
        let (a, b) = (stops[idx], stops[idx + 1]);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * local).round() as u8;
        Rgb::new(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    /// Third dimension used for color mapping (intensity or elution time).
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Scatter,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    pub title: String,
    pub kind: SeriesKind,
    pub points: Vec<PlotPoint>,
    pub marker_size: f64,
    /// None means "use the color scale of the plot".
    pub color: Option<Rgb>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    /// Median value, so sparse low-intensity noise does not wash out the gradient.
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub palette: Palette,
}

impl ColorScale {
    pub fn color_for(&self, value: f64) -> Rgb {
        let span = self.max - self.min;
        let t = if span > 0.0 {
            (value - self.min) / span
        } else {
            1.0
        };
        self.palette.color_at(t)
    }
}

/// Everything a renderer needs to draw one plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<PlotSeries>,
    pub axis: AxisRange,
    pub color_scale: Option<ColorScale>,
    pub annotations: Vec<String>,
    pub points_plotted: usize,
    pub max_elution_time: Option<f64>,
}

impl PlotData {
    pub fn empty(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            series: Vec::new(),
            axis: AxisRange::default(),
            color_scale: None,
            annotations: Vec::new(),
            points_plotted: 0,
            max_elution_time: None,
        }
    }

    /// True when there is nothing to draw, callers should skip the plot.
    pub fn is_empty(&self) -> bool {
        self.points_plotted == 0
    }

    pub fn iter_points(&self) -> impl Iterator<Item = &PlotPoint> {
        self.series.iter().flat_map(|s| s.points.iter())
    }

    pub(crate) fn push_standard_annotations(&mut self) {
        self.annotations
            .push(format!("{} points plotted", format_count(self.points_plotted)));
        if let Some(t) = self.max_elution_time {
            if t > 0.0 {
                self.annotations.push(format_elution_time(t));
            }
        }
    }
}

/// Marker size that keeps dense plots legible.
pub fn marker_size_for(scan_count: usize, point_count: usize) -> f64 {
    if scan_count < FEW_SCANS_THRESHOLD {
        MARKER_SIZE_FEW_SCANS
    } else if scan_count < SOME_SCANS_THRESHOLD {
        MARKER_SIZE_SOME_SCANS
    } else if point_count < MANY_POINTS_THRESHOLD {
        MARKER_SIZE_MANY_SCANS
    } else {
        MARKER_SIZE_MANY_POINTS
    }
}

/// Scan axis range, starting at 0 unless the observed minimum is requested.
pub(crate) fn scan_axis(min_scan: i32, max_scan: i32, use_observed_min_scan: bool) -> (f64, f64) {
    let lo = if use_observed_min_scan {
        min_scan
    } else {
        min_scan.min(0)
    };
    rounded_range(lo as f64, max_scan as f64, SCAN_AXIS_MULTIPLE)
}

#[derive(Debug, Default)]
struct ExtentTracker {
    min_scan: i32,
    max_scan: i32,
    min_y: f64,
    max_y: f64,
    max_elution_time: f64,
    scans_included: usize,
    any: bool,
}

impl ExtentTracker {
    fn new() -> Self {
        Self {
            min_scan: i32::MAX,
            max_scan: i32::MIN,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            ..Default::default()
        }
    }

    fn add_scan(&mut self, scan: &ScanRecord) {
        self.min_scan = self.min_scan.min(scan.scan_number);
        self.max_scan = self.max_scan.max(scan.scan_number);
        self.max_elution_time = self.max_elution_time.max(scan.elution_time);
        self.scans_included += 1;
    }

    fn add_y(&mut self, y: f64) {
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.any = true;
    }

    fn max_elution_time(&self) -> Option<f64> {
        if self.max_elution_time > 0.0 {
            Some(self.max_elution_time)
        } else {
            None
        }
    }
}

/// Reads the cached scans and emits the plot series.
pub struct SeriesBuilder<'a> {
    scans: &'a [ScanRecord],
    options: &'a FilterOptions,
    palette: Palette,
}

impl<'a> SeriesBuilder<'a> {
    pub fn new(accumulator: &'a ScanAccumulator) -> Self {
        Self::from_parts(accumulator.scans(), accumulator.options())
    }

    pub fn from_parts(scans: &'a [ScanRecord], options: &'a FilterOptions) -> Self {
        Self {
            scans,
            options,
            palette: Palette::default(),
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    fn title_for(&self, filter: MsLevelFilter) -> &str {
        if filter.is_fragmentation_only() {
            &self.options.ms2_plot_title
        } else {
            &self.options.ms1_plot_title
        }
    }

    fn included_scans(&self, filter: MsLevelFilter) -> impl Iterator<Item = &'a ScanRecord> + use<'a> {
        self.scans
            .iter()
            .filter(move |s| filter.matches(s.ms_level) && !s.is_empty())
    }

    /// Picks the m/z or the charge-partitioned mass plot depending on
    /// `plotting_deisotoped_data`.
    pub fn build(&self, filter: MsLevelFilter) -> PlotData {
        if self.options.plotting_deisotoped_data {
            self.build_mono_mass_vs_scan_by_charge(filter)
        } else {
            self.build_mz_vs_scan(filter)
        }
    }

    /// One scatter series of (scan number, m/z) colored by intensity.
    pub fn build_mz_vs_scan(&self, filter: MsLevelFilter) -> PlotData {
        let title = self.title_for(filter);
        let mut extent = ExtentTracker::new();
        let mut points = Vec::new();
        let mut intensities = Vec::new();
        let mut intensity_sum = 0.0;
        let mut max_intensity = f64::NEG_INFINITY;

        for scan in self.included_scans(filter) {
            extent.add_scan(scan);
            for ion in scan.iter_ions() {
                extent.add_y(ion.mz);
                points.push(PlotPoint {
                    x: scan.scan_number as f64,
                    y: ion.mz,
                    value: ion.intensity,
                });
                intensities.push(ion.intensity);
                intensity_sum += ion.intensity;
                max_intensity = max_intensity.max(ion.intensity);
            }
        }

        if !extent.any {
            debug!("No points to plot for {:?}", filter);
            return PlotData::empty(title, "Scan Number", "m/z");
        }

        let num_points = points.len();
        // Not empty, checked above
        let median = median_in_place(&mut intensities).unwrap_or(0.0);
        let color_scale = ColorScale {
            min: median,
            max: max_intensity,
            mean: intensity_sum / num_points as f64,
            palette: self.palette,
        };

        let (x_min, x_max) = scan_axis(
            extent.min_scan,
            extent.max_scan,
            self.options.use_observed_min_scan,
        );
        let (y_min, y_max) = rounded_range(extent.min_y, extent.max_y, MZ_AXIS_MULTIPLE);

        let series = PlotSeries {
            title: "Intensity".to_string(),
            kind: SeriesKind::Scatter,
            points,
            marker_size: marker_size_for(extent.scans_included, num_points),
            color: None,
        };

        let mut out = PlotData {
            title: title.to_string(),
            x_label: "Scan Number".to_string(),
            y_label: "m/z".to_string(),
            series: vec![series],
            axis: AxisRange {
                x_min,
                x_max,
                y_min,
                y_max,
            },
            color_scale: Some(color_scale),
            annotations: Vec::new(),
            points_plotted: num_points,
            max_elution_time: extent.max_elution_time(),
        };
        out.push_standard_annotations();
        out
    }

    /// One scatter series per charge state (0 to the max observed charge)
    /// of (scan number, monoisotopic mass), each with its fixed color.
    ///
    /// Masses above `max_mono_mass_for_deisotoped_plot` are left out of the
    /// plot (but stay in the cache).
    pub fn build_mono_mass_vs_scan_by_charge(&self, filter: MsLevelFilter) -> PlotData {
        let title = self.title_for(filter);
        let mass_cap = self.options.max_mono_mass_for_deisotoped_plot;

        let mut extent = ExtentTracker::new();
        let mut by_charge: Vec<Vec<PlotPoint>> = Vec::new();

        for scan in self.included_scans(filter) {
            let mut scan_has_points = false;
            for ion in scan.iter_ions() {
                if ion.mz > mass_cap {
                    continue;
                }
                scan_has_points = true;
                extent.add_y(ion.mz);
                let charge = ion.charge as usize;
                if by_charge.len() <= charge {
                    by_charge.resize_with(charge + 1, Vec::new);
                }
                by_charge[charge].push(PlotPoint {
                    x: scan.scan_number as f64,
                    y: ion.mz,
                    value: ion.intensity,
                });
            }
            if scan_has_points {
                extent.add_scan(scan);
            }
        }

        if !extent.any {
            debug!("No points to plot for {:?}", filter);
            return PlotData::empty(title, "Scan Number", "Monoisotopic Mass");
        }

        let num_points: usize = by_charge.iter().map(|x| x.len()).sum();
        let marker_size = marker_size_for(extent.scans_included, num_points);

        let series = by_charge
            .into_iter()
            .enumerate()
            .map(|(charge, points)| PlotSeries {
                title: format!("Charge {}", charge),
                kind: SeriesKind::Scatter,
                points,
                marker_size,
                color: Some(charge_color(charge as u8)),
            })
            .collect();

        let (x_min, x_max) = scan_axis(
            extent.min_scan,
            extent.max_scan,
            self.options.use_observed_min_scan,
        );
        let (y_min, y_max) = rounded_range(extent.min_y, extent.max_y, MZ_AXIS_MULTIPLE);
        let y_max = y_max.min(mass_cap).max(y_min + 1.0);

        let mut out = PlotData {
            title: title.to_string(),
            x_label: "Scan Number".to_string(),
            y_label: "Monoisotopic Mass".to_string(),
            series,
            axis: AxisRange {
                x_min,
                x_max,
                y_min,
                y_max,
            },
            color_scale: None,
            annotations: Vec::new(),
            points_plotted: num_points,
            max_elution_time: extent.max_elution_time(),
        };
        out.push_standard_annotations();
        out
    }
}
