//! Stream snapshots and design-criteria records attached to stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

/// A named set of quantities. Stages never mutate a stream; each one
/// produces a new snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessStream(BTreeMap<String, Quantity>);

impl ProcessStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: f64, unit: &str) -> Self {
        self.0.insert(
            key.to_string(),
            Quantity {
                value,
                unit: unit.to_string(),
            },
        );
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).map(|q| q.value)
    }

    /// Value or zero when the key is absent.
    pub fn value(&self, key: &str) -> f64 {
        self.get(key).unwrap_or(0.0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Quantity)> {
        self.0.iter().map(|(k, q)| (k.as_str(), q))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A sizing or performance figure with the reference it was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignCriterion {
    pub value: f64,
    pub unit: String,
    pub source: String,
}

pub type DesignCriteria = BTreeMap<String, DesignCriterion>;

pub(crate) fn criterion(value: f64, unit: &str, source: &str) -> DesignCriterion {
    DesignCriterion {
        value,
        unit: unit.to_string(),
        source: source.to_string(),
    }
}

/// Reference labels cited by design criteria.
pub mod sources {
    pub const METCALF_EDDY: &str = "Metcalf & Eddy, Wastewater Engineering, 5th ed.";
    pub const TEN_STATES: &str = "Recommended Standards for Wastewater Facilities (Ten States)";
    pub const WEF_MOP8: &str = "WEF MOP 8, Design of Water Resource Recovery Facilities";
    pub const WEF_MOP16: &str = "WEF MOP 16, Anaerobic Digester Design";
    pub const VENDOR_TIER: &str = "Upgrading vendor capacity tier table";
    pub const PLANT_PRACTICE: &str = "Typical plant design practice";
    pub const INTAKE: &str = "Project intake";
    pub const OVERRIDE: &str = "Design override";
}
