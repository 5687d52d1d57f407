use thiserror::Error;

#[derive(Error, Debug)]
pub enum LcmsPlotError {
    #[error(
        "Expected parallel arrays of the same length, got mz: {mz}, intensity: {intensity}, charge: {charge:?}"
    )]
    ExpectedSlicesSameLength {
        mz: usize,
        intensity: usize,
        charge: Option<usize>,
    },

    #[error("Invalid filter options: {0}")]
    InvalidOptions(String),

    #[error("Non-finite value found in scan {scan_number} at ion index {index}")]
    NonFiniteValue { scan_number: i32, index: usize },

    #[error("Invalid metadata for scan {scan_number}: {msg}")]
    InvalidScanMetadata { scan_number: i32, msg: String },

    #[error("Ranker position {pos} out of bounds ({len} points)")]
    RankerIndexOutOfBounds { pos: usize, len: usize },

    #[error("Ranker results were requested before filter_data() was called")]
    RankerNotFiltered,

    #[error("Filtering failed ({context}): {msg}")]
    FilterFailure { context: String, msg: String },

    #[error("Renderer error: {0}")]
    Render(String),
}

impl LcmsPlotError {
    /// Wraps the error into a [LcmsPlotError::FilterFailure] keeping the
    /// original message and adding where it happened.
    pub fn in_context(self, context: &str) -> Self {
        match self {
            LcmsPlotError::FilterFailure {
                context: mut owned_context,
                msg,
            } => {
                owned_context.push_str("; ");
                owned_context.push_str(context);
                LcmsPlotError::FilterFailure {
                    context: owned_context,
                    msg,
                }
            }
            other => LcmsPlotError::FilterFailure {
                context: context.to_string(),
                msg: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, LcmsPlotError>;

/// What happened when a scan was handed to the accumulator.
///
/// An empty scan is a normal "nothing to add" signal and not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddScanOutcome {
    Added {
        /// Ions kept for this scan after filtering, centroiding and capping.
        ions_stored: usize,
        /// Whether adding this scan triggered a global trim pass.
        trimmed: bool,
    },
    NothingToAdd,
}

impl AddScanOutcome {
    pub fn was_added(&self) -> bool {
        matches!(self, AddScanOutcome::Added { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_appended() {
        let err = LcmsPlotError::RankerNotFiltered.in_context("trim pass");
        let err = err.in_context("scan 12");
        match err {
            LcmsPlotError::FilterFailure { context, msg } => {
                assert_eq!(context, "trim pass; scan 12");
                assert!(msg.contains("filter_data"));
            }
            other => panic!("Unexpected variant {:?}", other),
        }
    }

    #[test]
    fn test_outcome_flag() {
        assert!(
            AddScanOutcome::Added {
                ions_stored: 3,
                trimmed: false
            }
            .was_added()
        );
        assert!(!AddScanOutcome::NothingToAdd.was_added());
    }
}
