//! Equipment list records.

use bf_process::Quantity;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessArea {
    Headworks,
    PrimaryTreatment,
    SecondaryTreatment,
    TertiaryTreatment,
    Disinfection,
    SolidsHandling,
    FeedstockReceiving,
    Digestion,
    DigestateHandling,
    GasConditioning,
    GasUpgrading,
    GasSafety,
}

impl ProcessArea {
    pub fn label(self) -> &'static str {
        match self {
            Self::Headworks => "Headworks",
            Self::PrimaryTreatment => "Primary Treatment",
            Self::SecondaryTreatment => "Secondary Treatment",
            Self::TertiaryTreatment => "Tertiary Treatment",
            Self::Disinfection => "Disinfection",
            Self::SolidsHandling => "Solids Handling",
            Self::FeedstockReceiving => "Feedstock Receiving",
            Self::Digestion => "Anaerobic Digestion",
            Self::DigestateHandling => "Digestate Handling",
            Self::GasConditioning => "Gas Conditioning",
            Self::GasUpgrading => "Gas Upgrading",
            Self::GasSafety => "Gas Safety",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentItem {
    /// Per-run tag, `EQ-001` onward.
    pub id: String,
    pub process_area: ProcessArea,
    pub equipment_type: String,
    pub description: String,
    /// Installed units including standby; at least 1.
    pub quantity: u32,
    pub specs: BTreeMap<String, Quantity>,
    pub design_basis: String,
    pub notes: Vec<String>,
    pub is_overridden: bool,
    pub is_locked: bool,
}

impl EquipmentItem {
    pub fn spec(&self, key: &str) -> Option<f64> {
        self.specs.get(key).map(|q| q.value)
    }

    /// Units expected to run at design load.
    pub fn duty_count(&self) -> u32 {
        self.spec("duty_count")
            .map_or(self.quantity, |n| n.max(0.0) as u32)
    }

    /// Connected power of the running units.
    pub fn running_kw(&self) -> f64 {
        self.spec("power_kw").unwrap_or(0.0) * self.duty_count() as f64
    }
}

/// Equipment list plus the sizing notes raised while building it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EquipmentList {
    pub items: Vec<EquipmentItem>,
    pub diagnostics: Vec<bf_core::Diagnostic>,
}

impl EquipmentList {
    pub fn by_type<'a>(&'a self, equipment_type: &'a str) -> impl Iterator<Item = &'a EquipmentItem> {
        self.items
            .iter()
            .filter(move |i| i.equipment_type == equipment_type)
    }

    pub fn total_running_kw(&self) -> f64 {
        self.items.iter().map(EquipmentItem::running_kw).sum()
    }

    /// Installed power including standby units.
    pub fn total_connected_kw(&self) -> f64 {
        self.items
            .iter()
            .map(|i| i.spec("power_kw").unwrap_or(0.0) * i.quantity as f64)
            .sum()
    }
}
