use clap::{
    Parser,
    Subcommand,
};
use lcmsplot::ImageFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the LC-MS, TIC and BPI plots of one or more scan tables.
    Plot(PlotArgs),
    /// Write a template configuration file.
    WriteTemplate(WriteTemplateArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct PlotArgs {
    /// Tab-delimited scan tables, one per dataset.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Path to the JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the output directory (will over-write the config file)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of points to keep for the LC-MS plots
    #[arg(long)]
    pub max_points: Option<usize>,

    /// Centroiding tolerance in m/z units, 0 disables it
    #[arg(long)]
    pub mz_resolution: Option<f64>,

    /// Ions below this intensity are ignored
    #[arg(long)]
    pub min_intensity: Option<f64>,

    /// The m/z column holds monoisotopic masses, plot them by charge
    #[arg(long)]
    pub deisotoped: bool,

    /// Image format of the plots (png or jpg)
    #[arg(short, long)]
    pub format: Option<ImageFormat>,

    /// Print a preview of every plot to the terminal
    #[arg(long)]
    pub preview: bool,
}

#[derive(Parser, Debug)]
pub struct WriteTemplateArgs {
    /// The path to the output file.
    #[arg(short, long, default_value = "lcmsplot_config.json")]
    pub output_path: PathBuf,
}
