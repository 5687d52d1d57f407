use std::fmt::Display;
use std::path::{
    Path,
    PathBuf,
};
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
};

use crate::errors::{
    LcmsPlotError,
    Result,
};
use crate::series::PlotData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = LcmsPlotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpg),
            other => Err(LcmsPlotError::Render(format!(
                "Unsupported image format: {}",
                other
            ))),
        }
    }
}

/// Anything that can turn a [PlotData] into a file.
pub trait PlotRenderer {
    fn render(&self, plot: &PlotData, target: &Path, format: ImageFormat) -> Result<()>;
}

/// `<dir>/<base_name>_<suffix>.<ext>`
pub fn plot_file_path(dir: &Path, base_name: &str, suffix: &str, format: ImageFormat) -> PathBuf {
    dir.join(format!("{}_{}.{}", base_name, suffix, format.extension()))
}

/// Renders the plot to its file, returns false (and renders nothing) for
/// an empty plot.
pub fn save_plot(
    renderer: &dyn PlotRenderer,
    plot: &PlotData,
    dir: &Path,
    base_name: &str,
    suffix: &str,
    format: ImageFormat,
) -> Result<bool> {
    if plot.is_empty() {
        debug!("Skipping empty plot {} for {}", suffix, base_name);
        return Ok(false);
    }
    let target = plot_file_path(dir, base_name, suffix, format);
    renderer.render(plot, &target, format)?;
    info!(
        "Rendered plot with {} points for {}",
        plot.points_plotted,
        target.display()
    );
    Ok(true)
}
