//! Application-level error type.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the orchestration layer.
#[derive(Error, Debug)]
pub enum AppError {
    /// The intake cannot support a run for its project type.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Biogas above the tabulated equipment range. Callers route these
    /// projects to a non-deterministic estimate.
    #[error("Biogas flow {scfm:.1} SCFM exceeds the {ceiling:.0} SCFM equipment ceiling")]
    CapacityExceeded { scfm: f64, ceiling: f64 },

    #[error("Failed to load intake: {path}")]
    IntakeLoad {
        path: PathBuf,
        source: bf_intake::IntakeError,
    },

    #[error("Intake error: {0}")]
    Intake(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Equipment sizing error: {0}")]
    Equipment(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, AppError::CapacityExceeded { .. })
    }

    pub fn is_input_error(&self) -> bool {
        matches!(self, AppError::InvalidInput(_))
    }
}

/// Result type for bf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<bf_process::ProcessError> for AppError {
    fn from(err: bf_process::ProcessError) -> Self {
        match err {
            bf_process::ProcessError::CapacityExceeded { scfm, ceiling } => {
                AppError::CapacityExceeded { scfm, ceiling }
            }
            bf_process::ProcessError::InvalidInput { what } => AppError::InvalidInput(what),
            other => AppError::Process(other.to_string()),
        }
    }
}

impl From<bf_intake::IntakeError> for AppError {
    fn from(err: bf_intake::IntakeError) -> Self {
        match err {
            bf_intake::IntakeError::Validation(v) => AppError::InvalidInput(v.to_string()),
            other => AppError::Intake(other.to_string()),
        }
    }
}

impl From<bf_intake::ValidationError> for AppError {
    fn from(err: bf_intake::ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<bf_equipment::EquipmentError> for AppError {
    fn from(err: bf_equipment::EquipmentError) -> Self {
        AppError::Equipment(err.to_string())
    }
}

impl From<bf_results::ResultsError> for AppError {
    fn from(err: bf_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_error_is_recognisable() {
        let err: AppError = bf_process::ProcessError::CapacityExceeded {
            scfm: 1_300.0,
            ceiling: 1_200.0,
        }
        .into();
        assert!(err.is_capacity_exceeded());
        assert!(err.to_string().contains("1300.0"));

        let err: AppError = bf_process::ProcessError::InvalidInput {
            what: "no feed".into(),
        }
        .into();
        assert!(err.is_input_error());
        assert!(!err.is_capacity_exceeded());
    }
}
