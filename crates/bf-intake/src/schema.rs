//! Intake record and design-override schema definitions.

use bf_core::parse_lenient;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A number that may arrive as text ("20-30", "1,200", "n/a").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// Resolve to a number; ranges become midpoints, unparsable text becomes 0.
    pub fn value(&self) -> f64 {
        match self {
            NumericInput::Number(v) if v.is_finite() => *v,
            NumericInput::Number(_) => 0.0,
            NumericInput::Text(t) => parse_lenient(t),
        }
    }
}

impl Default for NumericInput {
    fn default() -> Self {
        NumericInput::Number(0.0)
    }
}

impl From<f64> for NumericInput {
    fn from(v: f64) -> Self {
        NumericInput::Number(v)
    }
}

impl From<&str> for NumericInput {
    fn from(v: &str) -> Self {
        NumericInput::Text(v.to_string())
    }
}

/// Facility archetype; selects which trains are composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    /// A: wastewater treatment only.
    WastewaterOnly,
    /// B: greenfield digestion plus gas upgrading.
    Greenfield,
    /// C: upgrading added to an existing biogas source.
    BoltOn,
    /// D: wastewater train whose sludge is co-digested.
    Hybrid,
}

impl ProjectType {
    /// Normalize a free-form project-type code. Unknown codes map to
    /// wastewater-only.
    pub fn from_code(code: &str) -> Self {
        let c: String = code
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .collect();
        let c = c
            .strip_prefix("type")
            .or_else(|| c.strip_prefix("projecttype"))
            .unwrap_or(&c);
        match c {
            "a" | "wastewater" | "wastewateronly" | "ww" | "wwtp" => Self::WastewaterOnly,
            "b" | "greenfield" | "rngproduction" | "greenfieldrng" | "digestion" => {
                Self::Greenfield
            }
            "c" | "bolton" | "boltonupgrading" | "upgrading" | "upgradingonly" => Self::BoltOn,
            "d" | "hybrid" | "codigestion" | "wastewaterrng" => Self::Hybrid,
            _ => Self::WastewaterOnly,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::WastewaterOnly => "A",
            Self::Greenfield => "B",
            Self::BoltOn => "C",
            Self::Hybrid => "D",
        }
    }

    pub fn has_wastewater_train(self) -> bool {
        matches!(self, Self::WastewaterOnly | Self::Hybrid)
    }

    pub fn has_gas_train(self) -> bool {
        !matches!(self, Self::WastewaterOnly)
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::WastewaterOnly => "wastewater-only",
            Self::Greenfield => "greenfield digestion + upgrading",
            Self::BoltOn => "bolt-on upgrading",
            Self::Hybrid => "hybrid wastewater + co-digestion",
        };
        write!(f, "{} ({})", self.code(), label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    /// Free-form code, normalized with [`ProjectType::from_code`].
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub feedstocks: Vec<FeedstockEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wastewater: Option<InfluentDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_biogas: Option<ExistingBiogasDef>,
    #[serde(default)]
    pub output_requirements: OutputRequirementsDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationDef>,
    #[serde(default)]
    pub constraints: ConstraintsDef,
}

fn default_version() -> u32 {
    1
}

impl IntakeRecord {
    pub fn project_type(&self) -> ProjectType {
        ProjectType::from_code(&self.project_type)
    }
}

/// One trucked or piped feedstock as captured at intake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedstockEntry {
    /// Free-text feedstock type ("potato processing waste").
    #[serde(rename = "type")]
    pub feedstock_type: String,
    #[serde(default)]
    pub volume: NumericInput,
    #[serde(default)]
    pub unit: String,
    /// Structured technical parameters keyed by spec key.
    #[serde(default)]
    pub specs: BTreeMap<String, SpecValue>,
    #[serde(default)]
    pub packaged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecValue {
    pub value: NumericInput,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl SpecValue {
    pub fn new(value: impl Into<NumericInput>, unit: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            unit: unit.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Raw wastewater design influent. Concentrations in mg/L.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InfluentDef {
    pub flow: NumericInput,
    #[serde(default = "default_flow_unit")]
    pub flow_unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bod_mg_l: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cod_mg_l: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tss_mg_l: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tkn_mg_l: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_mg_l: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fog_mg_l: Option<f64>,
    /// Peak-hour to average flow ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peaking_factor: Option<f64>,
}

fn default_flow_unit() -> String {
    "MGD".to_string()
}

/// Biogas already produced on site (bolt-on upgrading).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExistingBiogasDef {
    pub flow: NumericInput,
    #[serde(default = "default_gas_unit")]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ch4_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h2s_ppmv: Option<f64>,
}

fn default_gas_unit() -> String {
    "SCFM".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputRequirementsDef {
    /// Pipeline injection pressure; a booster compressor is added above the skid outlet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_pipeline_pressure_psig: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effluent_bod_mg_l: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effluent_tss_mg_l: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LocationDef {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    /// Mean annual temperature; sets the feed temperature for heating load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_annual_temp_c: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConstraintsDef {
    /// Force DAF pretreatment in or out of the wastewater train.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_daf: Option<bool>,
    /// Largest single digester tank the site can accept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_digester_tank_m3: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Sparse engineering-constant overrides. Every field is optional; `None`
/// keeps the project-type default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DesignOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrt_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vs_destruction_pct: Option<f64>,
    /// Organic loading rate target, kg VS/m³·d.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub olr_target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digester_temp_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixing_power_w_per_m3: Option<f64>,
    /// Methane yield per kg VS destroyed; replaces per-feedstock BMP when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_yield_m3_per_kg_vs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ch4_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h2s_ppmv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cake_solids_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_efficiency_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycle_tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_recycle_iterations: Option<usize>,
}

impl DesignOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_type_codes() {
        assert_eq!(ProjectType::from_code("A"), ProjectType::WastewaterOnly);
        assert_eq!(ProjectType::from_code("type_b"), ProjectType::Greenfield);
        assert_eq!(ProjectType::from_code("Type C"), ProjectType::BoltOn);
        assert_eq!(ProjectType::from_code("bolt-on"), ProjectType::BoltOn);
        assert_eq!(ProjectType::from_code("hybrid"), ProjectType::Hybrid);
        assert_eq!(ProjectType::from_code("D"), ProjectType::Hybrid);
        assert_eq!(ProjectType::from_code("something else"), ProjectType::WastewaterOnly);
        assert_eq!(ProjectType::from_code(""), ProjectType::WastewaterOnly);
    }

    #[test]
    fn numeric_input_resolution() {
        assert_eq!(NumericInput::from(12.5).value(), 12.5);
        assert_eq!(NumericInput::from("20-30").value(), 25.0);
        assert_eq!(NumericInput::from("unknown").value(), 0.0);
        assert_eq!(NumericInput::Number(f64::NAN).value(), 0.0);
    }

    #[test]
    fn numeric_input_untagged_serde() {
        let n: NumericInput = serde_json::from_str("42").unwrap();
        assert_eq!(n, NumericInput::Number(42.0));
        let t: NumericInput = serde_json::from_str("\"10,000\"").unwrap();
        assert_eq!(t.value(), 10_000.0);
    }

    #[test]
    fn empty_overrides() {
        assert!(DesignOverrides::default().is_empty());
        let o = DesignOverrides {
            hrt_days: Some(30.0),
            ..Default::default()
        };
        assert!(!o.is_empty());
    }
}
