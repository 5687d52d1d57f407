use indicatif::{
    ParallelProgressIterator,
    ProgressBar,
    ProgressStyle,
};
use lcmsplot::{
    ChromatogramAccumulator,
    ChromatogramKind,
    MsLevelFilter,
    PlotData,
    PlotRenderer,
    ScanAccumulator,
    SeriesBuilder,
    save_plot,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{
    Path,
    PathBuf,
};
use std::time::Instant;
use tracing::{
    error,
    info,
    instrument,
};

use crate::config::Config;
use crate::error::CliError;
use crate::input::ScanTableReader;
use crate::renderers::{
    JsonPlotWriter,
    TerminalPreview,
};

const PREVIEW_WIDTH: usize = 80;
const PREVIEW_HEIGHT: usize = 24;

#[derive(Debug, Clone, Default)]
pub struct DatasetSummary {
    pub name: String,
    pub scans_read: usize,
    pub points_cached: usize,
    pub plots_written: usize,
}

impl std::fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} scans read, {} points kept, {} plots written",
            self.name, self.scans_read, self.points_cached, self.plots_written
        )
    }
}

#[derive(Debug, Serialize)]
struct ScanStatsRow {
    #[serde(rename = "Scan")]
    scan_number: i32,
    #[serde(rename = "MSLevel")]
    ms_level: u8,
    #[serde(rename = "ElutionTime")]
    elution_time: f64,
    #[serde(rename = "IonCount")]
    raw_ion_count: usize,
    #[serde(rename = "TIC")]
    tic: f64,
    #[serde(rename = "BPI")]
    bpi: f64,
}

/// Plot file suffixes for the survey and fragmentation scans.
fn lcms_suffixes(deisotoped: bool) -> (&'static str, &'static str) {
    if deisotoped {
        ("HighAbu_LCMS", "HighAbu_LCMS_MSn")
    } else {
        ("MS", "MSn")
    }
}

fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "dataset".to_string())
}

fn build_renderers(config: &Config) -> Vec<Box<dyn PlotRenderer>> {
    let mut renderers: Vec<Box<dyn PlotRenderer>> = Vec::new();
    if config.output.write_series_json {
        renderers.push(Box::new(JsonPlotWriter::new(false)));
    }
    if config.output.terminal_preview {
        renderers.push(Box::new(TerminalPreview::new(PREVIEW_WIDTH, PREVIEW_HEIGHT)));
    }
    renderers
}

pub fn write_scan_stats(
    path: &Path,
    chromatogram: &ChromatogramAccumulator,
) -> Result<(), CliError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;
    for point in chromatogram.points() {
        wtr.serialize(ScanStatsRow {
            scan_number: point.scan_number,
            ms_level: point.ms_level,
            elution_time: point.elution_time,
            raw_ion_count: point.raw_ion_count,
            tic: point.tic,
            bpi: point.bpi,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Reads one scan table and writes all of its plots and the scan statistics.
///
/// Any error leaves the outputs of this dataset incomplete, other datasets
/// are not affected.
#[instrument(skip_all, fields(dataset = %input.display()))]
pub fn process_dataset(input: &Path, config: &Config) -> Result<DatasetSummary, CliError> {
    let start = Instant::now();
    let name = dataset_name(input);
    let out_dir = &config.output.directory;

    let mut accumulator = ScanAccumulator::new(config.filter.clone())?;
    let mut chromatogram = ChromatogramAccumulator::new()
        .with_observed_min_scan(config.filter.use_observed_min_scan);

    let mut reader = ScanTableReader::from_path(input)?;
    for block in reader.by_ref() {
        let block = block?;
        chromatogram.add_scan(
            block.scan_number,
            block.ms_level,
            block.elution_time,
            &block.ions,
        )?;
        accumulator
            .add_scan(
                block.scan_number,
                block.ms_level,
                block.elution_time,
                &block.ions,
            )
            .map_err(|e| e.in_context(&format!("scan {}", block.scan_number)))?;
    }
    let scans_read = reader.scans_read();
    if scans_read == 0 {
        return Err(CliError::DataReading(format!(
            "No scans found in {}",
            input.display()
        )));
    }

    accumulator.trim_to_target()?;
    accumulator.log_summary();

    write_scan_stats(&out_dir.join(format!("{}_ScanStats.txt", name)), &chromatogram)?;

    let (ms1_suffix, msn_suffix) = lcms_suffixes(config.filter.plotting_deisotoped_data);
    let builder = SeriesBuilder::new(&accumulator).with_palette(config.output.palette);
    let plots: Vec<(&str, PlotData)> = vec![
        (ms1_suffix, builder.build(MsLevelFilter::Exactly(1))),
        (msn_suffix, builder.build(MsLevelFilter::AtLeast(2))),
        (
            "TIC",
            chromatogram.build_series(ChromatogramKind::Tic, MsLevelFilter::Exactly(1)),
        ),
        (
            "BPI",
            chromatogram.build_series(ChromatogramKind::Bpi, MsLevelFilter::Exactly(1)),
        ),
    ];

    let renderers = build_renderers(config);
    let mut plots_written = 0;
    for (suffix, plot) in plots.iter() {
        let mut saved = false;
        for renderer in renderers.iter() {
            saved |= save_plot(
                renderer.as_ref(),
                plot,
                out_dir,
                &name,
                suffix,
                config.output.image_format,
            )?;
        }
        if saved {
            plots_written += 1;
        }
    }

    let summary = DatasetSummary {
        name,
        scans_read,
        points_cached: accumulator.total_cached_points(),
        plots_written,
    };
    info!("{} in {:?}", summary, start.elapsed());
    Ok(summary)
}

/// Processes every dataset in parallel, one accumulator per dataset.
///
/// Failed datasets are logged and reported together once all are done.
pub fn process_datasets(inputs: &[PathBuf], config: &Config) -> Result<Vec<DatasetSummary>, CliError> {
    std::fs::create_dir_all(&config.output.directory)?;

    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )
    .map_err(|e| CliError::Config(format!("Invalid progress template: {}", e)))?;
    let pb = ProgressBar::new(inputs.len() as u64).with_style(style);

    let results: Vec<(PathBuf, Result<DatasetSummary, CliError>)> = inputs
        .par_iter()
        .progress_with(pb)
        .map(|input| (input.clone(), process_dataset(input, config)))
        .collect();

    let mut summaries = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (input, res) in results {
        match res {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                error!("Failed processing {}: {}", input.display(), e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(CliError::DataProcessing(format!(
            "{} of {} datasets failed",
            failed,
            inputs.len()
        )));
    }
    Ok(summaries)
}
