//! Error types for the process simulators.

use crate::wastewater::TrainError;
use bf_core::{BfError, ensure_non_negative};
use thiserror::Error;

/// Largest raw biogas flow the upgrading tier table covers.
pub const CAPACITY_CEILING_SCFM: f64 = 1_200.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    /// No tabulated equipment tier covers this flow. Callers treat this as a
    /// request for a non-deterministic estimate, not as a defect.
    #[error("Biogas flow {scfm:.1} SCFM exceeds the {ceiling:.0} SCFM equipment ceiling")]
    CapacityExceeded { scfm: f64, ceiling: f64 },

    #[error("Invalid input: {what}")]
    InvalidInput { what: String },

    #[error("Train error: {0}")]
    Train(#[from] TrainError),

    #[error("Numeric error: {0}")]
    Numeric(#[from] BfError),
}

pub type ProcessResult<T> = Result<T, ProcessError>;

/// Fail with [`ProcessError::CapacityExceeded`] above the ceiling. A flow
/// that is not a finite non-negative number is a [`ProcessError::Numeric`].
pub fn check_capacity(scfm: f64) -> ProcessResult<()> {
    let scfm = ensure_non_negative(scfm, "raw biogas flow")?;
    if scfm > CAPACITY_CEILING_SCFM {
        return Err(ProcessError::CapacityExceeded {
            scfm,
            ceiling: CAPACITY_CEILING_SCFM,
        });
    }
    Ok(())
}
