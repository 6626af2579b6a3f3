//! Error types for equipment sizing.

use bf_core::BfError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EquipmentError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

pub type EquipmentResult<T> = Result<T, EquipmentError>;

impl From<EquipmentError> for BfError {
    fn from(e: EquipmentError) -> Self {
        match e {
            EquipmentError::NonPhysical { what } => BfError::Invariant { what },
            EquipmentError::InvalidArg { what } => BfError::InvalidArg { what },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_conversion() {
        let err = EquipmentError::NonPhysical { what: "tank volume" };
        assert!(err.to_string().contains("tank volume"));
        let bf: BfError = err.into();
        assert!(matches!(bf, BfError::Invariant { .. }));
    }
}
