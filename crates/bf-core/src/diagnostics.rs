//! Structured diagnostics embedded in results instead of being raised.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What produced the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Recycle loop stopped at the iteration cap.
    Convergence,
    /// Feedstock or parameter fell back to literal defaults.
    LibraryMatch,
    /// Always present: the run used deterministic engineering calculation.
    Methodology,
    /// Questionable but usable input (e.g. a value clamped into range).
    Input,
    /// Sizing note (e.g. equipment split into multiple trains).
    Sizing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// Field or stage the diagnostic is about, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            field: None,
            message: message.into(),
        }
    }

    pub fn info(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Info,
            field: None,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_set_severity() {
        let d = Diagnostic::warning(DiagnosticKind::LibraryMatch, "no match").with_field("feedstock");
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.field.as_deref(), Some("feedstock"));
        assert_eq!(
            Diagnostic::info(DiagnosticKind::Methodology, "x").severity,
            Severity::Info
        );
    }
}
