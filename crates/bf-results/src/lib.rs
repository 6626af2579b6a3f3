//! bf-results: mass-balance result types, run fingerprints and JSON export.

pub mod hash;
pub mod types;

pub use hash::compute_run_id;
pub use types::*;

use std::path::Path;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn to_json(results: &MassBalanceResults) -> ResultsResult<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

pub fn save_json(path: &Path, results: &MassBalanceResults) -> ResultsResult<()> {
    std::fs::write(path, to_json(results)?)?;
    Ok(())
}
