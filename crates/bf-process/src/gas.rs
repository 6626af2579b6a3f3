//! Gas conditioning and capacity-indexed upgrading.

use crate::error::{ProcessError, ProcessResult, check_capacity};
use crate::stream::{DesignCriteria, ProcessStream, criterion, sources};
use bf_core::constants::{CH4_HHV_BTU_PER_SCF, MINUTES_PER_DAY};
use bf_core::scfm_to_m3_per_day;
use serde::Serialize;

pub const H2S_REMOVAL: f64 = 0.995;
pub const MOISTURE_REMOVAL: f64 = 0.95;
pub const SILOXANE_REMOVAL: f64 = 0.98;
/// Flare capacity relative to peak biogas flow.
pub const FLARE_SAFETY_FACTOR: f64 = 1.10;
pub const FLARE_DESTRUCTION_PCT: f64 = 99.0;

/// Raw or conditioned biogas. Composition is on a dry basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Biogas {
    pub scfm: f64,
    pub ch4_pct: f64,
    pub co2_pct: f64,
    pub h2s_ppmv: f64,
    pub moisture_pct: f64,
    pub siloxane_mg_m3: f64,
}

impl Biogas {
    pub fn m3_per_day(&self) -> f64 {
        scfm_to_m3_per_day(self.scfm)
    }

    pub fn ch4_scfm(&self) -> f64 {
        self.scfm * self.ch4_pct / 100.0
    }

    pub fn stream(&self) -> ProcessStream {
        ProcessStream::new()
            .with("flow", self.scfm, "SCFM")
            .with("flow_m3_per_day", self.m3_per_day(), "m³/d")
            .with("ch4", self.ch4_pct, "%")
            .with("co2", self.co2_pct, "%")
            .with("h2s", self.h2s_ppmv, "ppmv")
            .with("moisture", self.moisture_pct, "%")
            .with("siloxanes", self.siloxane_mg_m3, "mg/m³")
    }

    /// Fixed-percentage removal of H2S, moisture and siloxanes. Removed H2S
    /// leaves the gas volume.
    pub fn conditioned(&self) -> Biogas {
        let h2s_vol_fraction = self.h2s_ppmv * 1.0e-6 * H2S_REMOVAL;
        Biogas {
            scfm: self.scfm * (1.0 - h2s_vol_fraction),
            h2s_ppmv: self.h2s_ppmv * (1.0 - H2S_REMOVAL),
            moisture_pct: self.moisture_pct * (1.0 - MOISTURE_REMOVAL),
            siloxane_mg_m3: self.siloxane_mg_m3 * (1.0 - SILOXANE_REMOVAL),
            ..*self
        }
    }
}

/// One row of the vendor capacity table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UpgradingTier {
    pub max_scfm: f64,
    pub technology: &'static str,
    pub methane_recovery_pct: f64,
    pub product_purity_pct: f64,
    pub volume_loss_pct: f64,
    pub outlet_psig: f64,
    /// kW per SCFM of inlet gas.
    pub specific_kw_per_scfm: f64,
}

pub const UPGRADING_TIERS: [UpgradingTier; 7] = [
    UpgradingTier {
        max_scfm: 100.0,
        technology: "Two-stage membrane skid",
        methane_recovery_pct: 97.0,
        product_purity_pct: 96.0,
        volume_loss_pct: 3.0,
        outlet_psig: 100.0,
        specific_kw_per_scfm: 0.30,
    },
    UpgradingTier {
        max_scfm: 200.0,
        technology: "Two-stage membrane skid",
        methane_recovery_pct: 97.5,
        product_purity_pct: 96.5,
        volume_loss_pct: 2.5,
        outlet_psig: 150.0,
        specific_kw_per_scfm: 0.28,
    },
    UpgradingTier {
        max_scfm: 400.0,
        technology: "Three-stage membrane skid",
        methane_recovery_pct: 98.0,
        product_purity_pct: 97.0,
        volume_loss_pct: 2.0,
        outlet_psig: 200.0,
        specific_kw_per_scfm: 0.26,
    },
    UpgradingTier {
        max_scfm: 600.0,
        technology: "Three-stage membrane skid",
        methane_recovery_pct: 98.5,
        product_purity_pct: 97.5,
        volume_loss_pct: 1.5,
        outlet_psig: 250.0,
        specific_kw_per_scfm: 0.25,
    },
    UpgradingTier {
        max_scfm: 800.0,
        technology: "Pressure swing adsorption",
        methane_recovery_pct: 99.0,
        product_purity_pct: 98.0,
        volume_loss_pct: 1.0,
        outlet_psig: 250.0,
        specific_kw_per_scfm: 0.24,
    },
    UpgradingTier {
        max_scfm: 1_000.0,
        technology: "Pressure swing adsorption",
        methane_recovery_pct: 99.0,
        product_purity_pct: 98.0,
        volume_loss_pct: 1.0,
        outlet_psig: 300.0,
        specific_kw_per_scfm: 0.23,
    },
    UpgradingTier {
        max_scfm: 1_200.0,
        technology: "Dual-train pressure swing adsorption",
        methane_recovery_pct: 99.5,
        product_purity_pct: 98.5,
        volume_loss_pct: 0.5,
        outlet_psig: 300.0,
        specific_kw_per_scfm: 0.22,
    },
];

/// Smallest tier that covers `scfm`; above the last tier is a capacity error.
pub fn select_tier(scfm: f64) -> ProcessResult<&'static UpgradingTier> {
    check_capacity(scfm)?;
    UPGRADING_TIERS
        .iter()
        .find(|t| scfm <= t.max_scfm)
        .ok_or(ProcessError::CapacityExceeded {
            scfm,
            ceiling: crate::error::CAPACITY_CEILING_SCFM,
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UpgradingResult {
    pub tier: UpgradingTier,
    pub rng_scfm: f64,
    pub tail_gas_scfm: f64,
    pub rng_mmbtu_per_day: f64,
    pub skid_kw: f64,
    /// Added when the pipeline needs more pressure than the skid delivers.
    pub booster_kw: f64,
    pub delivery_psig: f64,
}

/// kW per SCFM per 100 psi of boost.
const BOOSTER_KW_PER_SCFM_100PSI: f64 = 0.05;

pub fn upgrade(conditioned: &Biogas, pipeline_psig: Option<f64>) -> ProcessResult<UpgradingResult> {
    let tier = *select_tier(conditioned.scfm)?;
    let rng_scfm = conditioned.scfm * (conditioned.ch4_pct / 100.0)
        * (tier.methane_recovery_pct / 100.0)
        / (tier.product_purity_pct / 100.0);
    let rng_mmbtu_per_day =
        rng_scfm * MINUTES_PER_DAY * (tier.product_purity_pct / 100.0) * CH4_HHV_BTU_PER_SCF / 1.0e6;
    let delivery_psig = pipeline_psig.unwrap_or(tier.outlet_psig).max(tier.outlet_psig);
    let boost = (delivery_psig - tier.outlet_psig).max(0.0);
    Ok(UpgradingResult {
        tier,
        rng_scfm,
        tail_gas_scfm: (conditioned.scfm - rng_scfm).max(0.0),
        rng_mmbtu_per_day,
        skid_kw: tier.specific_kw_per_scfm * conditioned.scfm,
        booster_kw: BOOSTER_KW_PER_SCFM_100PSI * rng_scfm * boost / 100.0,
        delivery_psig,
    })
}

pub(crate) fn conditioning_criteria(raw: &Biogas) -> DesignCriteria {
    let mut c = DesignCriteria::new();
    c.insert(
        "h2s_removal_pct".into(),
        criterion(H2S_REMOVAL * 100.0, "%", sources::PLANT_PRACTICE),
    );
    c.insert(
        "moisture_removal_pct".into(),
        criterion(MOISTURE_REMOVAL * 100.0, "%", sources::PLANT_PRACTICE),
    );
    c.insert(
        "siloxane_removal_pct".into(),
        criterion(SILOXANE_REMOVAL * 100.0, "%", sources::PLANT_PRACTICE),
    );
    c.insert(
        "design_flow_scfm".into(),
        criterion(raw.scfm, "SCFM", sources::PLANT_PRACTICE),
    );
    c.insert(
        "h2s_load_kg_per_day".into(),
        criterion(h2s_kg_per_day(raw), "kg/d", sources::PLANT_PRACTICE),
    );
    c
}

pub(crate) fn upgrading_criteria(up: &UpgradingResult, inlet_scfm: f64) -> DesignCriteria {
    let mut c = DesignCriteria::new();
    c.insert("inlet_scfm".into(), criterion(inlet_scfm, "SCFM", sources::VENDOR_TIER));
    c.insert(
        "tier_capacity_scfm".into(),
        criterion(up.tier.max_scfm, "SCFM", sources::VENDOR_TIER),
    );
    c.insert(
        "methane_recovery_pct".into(),
        criterion(up.tier.methane_recovery_pct, "%", sources::VENDOR_TIER),
    );
    c.insert(
        "product_purity_pct".into(),
        criterion(up.tier.product_purity_pct, "%", sources::VENDOR_TIER),
    );
    c.insert(
        "volume_loss_pct".into(),
        criterion(up.tier.volume_loss_pct, "%", sources::VENDOR_TIER),
    );
    c.insert(
        "outlet_psig".into(),
        criterion(up.tier.outlet_psig, "psig", sources::VENDOR_TIER),
    );
    c.insert(
        "delivery_psig".into(),
        criterion(up.delivery_psig, "psig", sources::INTAKE),
    );
    c.insert("skid_kw".into(), criterion(up.skid_kw, "kW", sources::VENDOR_TIER));
    c.insert("booster_kw".into(), criterion(up.booster_kw, "kW", sources::PLANT_PRACTICE));
    c
}

pub(crate) fn flare_criteria(max_biogas_scfm: f64) -> DesignCriteria {
    let mut c = DesignCriteria::new();
    c.insert(
        "flare_capacity_scfm".into(),
        criterion(max_biogas_scfm * FLARE_SAFETY_FACTOR, "SCFM", sources::PLANT_PRACTICE),
    );
    c.insert(
        "safety_factor".into(),
        criterion(FLARE_SAFETY_FACTOR, "-", sources::PLANT_PRACTICE),
    );
    c.insert(
        "destruction_efficiency_pct".into(),
        criterion(FLARE_DESTRUCTION_PCT, "%", sources::PLANT_PRACTICE),
    );
    c
}

/// H2S mass at 1.434 kg/m³ (standard conditions).
fn h2s_kg_per_day(gas: &Biogas) -> f64 {
    gas.m3_per_day() * gas.h2s_ppmv * 1.0e-6 * 1.434
}
