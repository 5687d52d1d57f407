use lcmsplot::LcmsPlotError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scan table error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Processing error: {0}")]
    LcmsPlot(#[from] LcmsPlotError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data reading error: {0}")]
    DataReading(String),

    #[error("Data processing error: {0}")]
    DataProcessing(String),
}
