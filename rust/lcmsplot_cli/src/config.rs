use lcmsplot::{
    FilterOptions,
    ImageFormat,
    Palette,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::path::{
    Path,
    PathBuf,
};

use crate::cli::PlotArgs;
use crate::error::CliError;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub filter: FilterOptions,
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Format of the images the external rasterizer should produce.
    pub image_format: ImageFormat,
    pub palette: Palette,
    pub write_series_json: bool,
    pub terminal_preview: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("lcmsplot_output"),
            image_format: ImageFormat::Png,
            palette: Palette::Jet,
            write_series_json: true,
            terminal_preview: false,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let file = std::fs::File::open(path).map_err(|e| {
            CliError::Config(format!(
                "Unable to open config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    /// Loads the config file (if any) and applies the command line overrides.
    pub fn from_args(args: &PlotArgs) -> Result<Self, CliError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(args);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, args: &PlotArgs) {
        if let Some(dir) = &args.output_dir {
            self.output.directory = dir.clone();
        }
        if let Some(max_points) = args.max_points {
            self.filter.max_points_to_plot = max_points;
        }
        if let Some(mz_resolution) = args.mz_resolution {
            self.filter.mz_resolution = mz_resolution;
        }
        if let Some(min_intensity) = args.min_intensity {
            self.filter.min_intensity = min_intensity;
        }
        if args.deisotoped {
            self.filter.plotting_deisotoped_data = true;
        }
        if let Some(format) = args.format {
            self.output.image_format = format;
        }
        if args.preview {
            self.output.terminal_preview = true;
        }
    }

    pub fn validate(&self) -> Result<(), CliError> {
        self.filter.validate()?;
        if !self.output.write_series_json && !self.output.terminal_preview {
            return Err(CliError::Config(
                "Nothing to output, enable write_series_json or terminal_preview".to_string(),
            ));
        }
        Ok(())
    }

    pub fn template_json() -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&Self::default())?)
    }
}
