use lcmsplot::{
    ImageFormat,
    LcmsPlotError,
    PlotData,
    PlotRenderer,
    Rgb,
};
use serde::Serialize;
use std::io::{
    BufWriter,
    Write,
};
use std::path::{
    Path,
    PathBuf,
};

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_GRAY: &str = "\x1b[90m";

/// Payload handed to the external rasterizer.
#[derive(Debug, Serialize)]
struct PlotPayload<'a> {
    image_path: &'a Path,
    image_format: ImageFormat,
    plot: &'a PlotData,
}

/// Writes the plot next to its image path as `<name>.json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPlotWriter {
    pretty: bool,
}

impl JsonPlotWriter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn payload_path(target: &Path) -> PathBuf {
        target.with_extension("json")
    }
}

impl PlotRenderer for JsonPlotWriter {
    fn render(&self, plot: &PlotData, target: &Path, format: ImageFormat) -> lcmsplot::Result<()> {
        let payload = PlotPayload {
            image_path: target,
            image_format: format,
            plot,
        };
        let path = Self::payload_path(target);
        let file = std::fs::File::create(&path).map_err(|e| {
            LcmsPlotError::Render(format!("Unable to create {}: {}", path.display(), e))
        })?;
        let mut writer = BufWriter::new(file);
        let res = if self.pretty {
            serde_json::to_writer_pretty(&mut writer, &payload)
        } else {
            serde_json::to_writer(&mut writer, &payload)
        };
        res.map_err(|e| LcmsPlotError::Render(format!("Unable to serialize plot: {}", e)))?;
        writer
            .flush()
            .map_err(|e| LcmsPlotError::Render(format!("Unable to write {}: {}", path.display(), e)))?;
        Ok(())
    }
}

/// Character heatmap of the point cloud, printed to stdout.
#[derive(Debug, Clone, Copy)]
pub struct TerminalPreview {
    width: usize,
    height: usize,
}

impl TerminalPreview {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(2),
            height: height.max(2),
        }
    }

    /// Each cell shows the most intense point falling in it, colored like
    /// its series (or by the color scale when the series has no color).
    pub fn format_plot(&self, plot: &PlotData) -> String {
        let axis = plot.axis;
        let x_span = axis.x_max - axis.x_min;
        let y_span = axis.y_max - axis.y_min;

        // (value, color) of the strongest point per cell
        let mut cells: Vec<Option<(f64, Rgb)>> = vec![None; self.width * self.height];
        let mut max_value = 0.0f64;

        for series in plot.series.iter() {
            for point in series.points.iter() {
                if x_span <= 0.0 || y_span <= 0.0 {
                    continue;
                }
                let fx = (point.x - axis.x_min) / x_span;
                let fy = (point.y - axis.y_min) / y_span;
                if !(0.0..=1.0).contains(&fx) || !(0.0..=1.0).contains(&fy) {
                    continue;
                }
                let col = ((fx * (self.width - 1) as f64).round() as usize).min(self.width - 1);
                // Row 0 is the top of the plot
                let row = self.height - 1
                    - ((fy * (self.height - 1) as f64).round() as usize).min(self.height - 1);

                let color = match (series.color, plot.color_scale) {
                    (Some(c), _) => c,
                    (None, Some(scale)) => scale.color_for(point.value),
                    (None, None) => Rgb::new(255, 255, 255),
                };
                let cell = &mut cells[row * self.width + col];
                let replace = match *cell {
                    Some((v, _)) => point.value > v,
                    None => true,
                };
                if replace {
                    *cell = Some((point.value, color));
                }
                max_value = max_value.max(point.value);
            }
        }

        let mut output = String::new();
        output.push_str(&format!("{}\n", plot.title));
        output.push_str(&format!(
            "{}{:.0} {}{}\n",
            COLOR_GRAY, axis.y_max, plot.y_label, COLOR_RESET
        ));
        output.push('╔');
        output.push_str(&"═".repeat(self.width));
        output.push_str("╗\n");

        for row in 0..self.height {
            output.push('║');
            for col in 0..self.width {
                match cells[row * self.width + col] {
                    None => output.push(' '),
                    Some((value, color)) => {
                        let intensity = if max_value > 0.0 {
                            value / max_value
                        } else {
                            1.0
                        };
                        output.push_str(&format!(
                            "\x1b[38;2;{};{};{}m{}{}",
                            color.r,
                            color.g,
                            color.b,
                            get_block_char(intensity),
                            COLOR_RESET
                        ));
                    }
                }
            }
            output.push_str("║\n");
        }

        output.push('╚');
        output.push_str(&"═".repeat(self.width));
        output.push_str("╝\n");
        output.push_str(&format!(
            "{}{:.0}{:>width$.0} {}{}\n",
            COLOR_GRAY,
            axis.x_min,
            axis.x_max,
            plot.x_label,
            COLOR_RESET,
            width = self.width.saturating_sub(4)
        ));
        for annotation in plot.annotations.iter() {
            output.push_str(&format!("  {}\n", annotation));
        }
        output
    }
}

impl PlotRenderer for TerminalPreview {
    fn render(&self, plot: &PlotData, target: &Path, _format: ImageFormat) -> lcmsplot::Result<()> {
        let text = self.format_plot(plot);
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "\n{}\n{}", target.display(), text)
            .map_err(|e| LcmsPlotError::Render(format!("Unable to print preview: {}", e)))?;
        Ok(())
    }
}

/// Maps intensity (0.0 to 1.0) to a block character.
fn get_block_char(intensity: f64) -> char {
    match intensity {
        i if i >= 0.75 => '█',
        i if i >= 0.50 => '▓',
        i if i >= 0.25 => '▒',
        i if i >= 0.05 => '░',
        _ => '·',
    }
}
