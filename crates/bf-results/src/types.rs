//! Result data types.

use bf_core::{Diagnostic, DiagnosticKind, Severity};
use bf_equipment::EquipmentItem;
use bf_intake::ProjectType;
use bf_process::{AdProcessStage, Quantity, RecycleStream, TreatmentStage};
use serde::Serialize;
use std::collections::BTreeMap;

pub type RunId = String;

/// Headline figure; same shape as a stream quantity.
pub type SummaryValue = Quantity;

/// A literal constant the run relied on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assumption {
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    pub source: String,
}

impl Assumption {
    pub fn new(parameter: &str, value: f64, unit: &str, source: &str) -> Self {
        Self {
            parameter: parameter.to_string(),
            value,
            unit: unit.to_string(),
            source: source.to_string(),
        }
    }
}

/// Aggregate result of one deterministic run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MassBalanceResults {
    pub run_id: RunId,
    pub project_name: String,
    pub project_type: ProjectType,
    pub stages: Vec<TreatmentStage>,
    pub ad_stages: Vec<AdProcessStage>,
    pub recycle_streams: Vec<RecycleStream>,
    pub equipment: Vec<EquipmentItem>,
    pub convergence_iterations: usize,
    pub convergence_achieved: bool,
    pub assumptions: Vec<Assumption>,
    /// Warnings and notices, including the methodology notice.
    pub warnings: Vec<Diagnostic>,
    pub summary: BTreeMap<String, SummaryValue>,
    pub engine_version: String,
}

impl MassBalanceResults {
    pub fn summary_value(&self, key: &str) -> Option<f64> {
        self.summary.get(key).map(|q| q.value)
    }

    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.warnings.iter().filter(move |d| d.kind == kind)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings.iter().any(|d| d.severity >= Severity::Warning)
    }

    pub fn assumption(&self, parameter: &str) -> Option<&Assumption> {
        self.assumptions.iter().find(|a| a.parameter == parameter)
    }
}
