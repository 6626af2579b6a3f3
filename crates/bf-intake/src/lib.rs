//! bf-intake: project intake record, design overrides, and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_intake, validate_overrides};

use std::path::Path;

pub type IntakeResult<T> = Result<T, IntakeError>;

#[derive(thiserror::Error, Debug)]
pub enum IntakeError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported file format: {path}")]
    UnsupportedFormat { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &Path) -> IntakeResult<IntakeRecord> {
    let content = std::fs::read_to_string(path)?;
    let intake: IntakeRecord = serde_yaml::from_str(&content)?;
    validate_intake(&intake)?;
    Ok(intake)
}

pub fn save_yaml(path: &Path, intake: &IntakeRecord) -> IntakeResult<()> {
    validate_intake(intake)?;
    let content = serde_yaml::to_string(intake)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> IntakeResult<IntakeRecord> {
    let content = std::fs::read_to_string(path)?;
    let intake: IntakeRecord = serde_json::from_str(&content)?;
    validate_intake(&intake)?;
    Ok(intake)
}

pub fn save_json(path: &Path, intake: &IntakeRecord) -> IntakeResult<()> {
    validate_intake(intake)?;
    let content = serde_json::to_string_pretty(intake)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load an intake record, picking the format from the file extension.
pub fn load_intake(path: &Path) -> IntakeResult<IntakeRecord> {
    match extension(path).as_deref() {
        Some("yaml") | Some("yml") => load_yaml(path),
        Some("json") => load_json(path),
        _ => Err(IntakeError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}

/// Load a design-override snapshot (YAML or JSON).
pub fn load_overrides(path: &Path) -> IntakeResult<DesignOverrides> {
    let content = std::fs::read_to_string(path)?;
    let overrides: DesignOverrides = match extension(path).as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        Some("json") => serde_json::from_str(&content)?,
        _ => {
            return Err(IntakeError::UnsupportedFormat {
                path: path.display().to_string(),
            });
        }
    };
    validate_overrides(&overrides)?;
    Ok(overrides)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
