//! Simulation configuration snapshot.
//!
//! A `SimulationConfig` is built once per run from per-type defaults plus an
//! optional [`DesignOverrides`] and passed by reference into every stage. The
//! simulators hold no module-level state.

use bf_intake::{DesignOverrides, ProjectType};
use serde::Serialize;

/// Literal design constants. Kept distinct per feed character; they are not
/// meant to be unified.
pub mod defaults {
    /// Trucked organics only.
    pub const VS_DESTRUCTION_GREENFIELD: f64 = 0.58;
    /// Wastewater sludge blended with trucked high-VS co-substrates.
    pub const VS_DESTRUCTION_HYBRID_BLEND: f64 = 0.90;
    /// Wastewater sludge alone.
    pub const VS_DESTRUCTION_SLUDGE_ONLY: f64 = 0.55;

    pub const CH4_FRACTION_MIXED_ORGANIC: f64 = 0.60;
    pub const CH4_FRACTION_MUNICIPAL_SLUDGE: f64 = 0.63;
    pub const N2_PCT: f64 = 0.5;
    pub const O2_PCT: f64 = 0.1;

    /// m³ CH4 per kg VS destroyed for thickened municipal sludge.
    pub const SLUDGE_BMP: f64 = 0.30;

    pub const HRT_DAYS: f64 = 25.0;
    /// In-plant digester fed thickened municipal sludge only.
    pub const SLUDGE_DIGESTER_HRT_DAYS: f64 = 20.0;
    /// kg VS per m³ digester per day.
    pub const OLR_TARGET: f64 = 3.0;
    pub const DIGESTER_TEMP_C: f64 = 38.0;
    pub const MIXING_W_PER_M3: f64 = 6.0;
    /// Wet digestion feed limit; thicker blends are diluted.
    pub const MAX_FEED_TS_PCT: f64 = 12.0;

    pub const CAKE_SOLIDS_PCT: f64 = 25.0;
    pub const CAPTURE_PCT: f64 = 95.0;
    pub const THICKENED_SOLIDS_PCT: f64 = 5.0;

    pub const H2S_PPMV: f64 = 1_500.0;
    pub const SILOXANE_MG_M3: f64 = 10.0;
    /// Raw digester gas is water saturated at digester temperature.
    pub const MOISTURE_PCT: f64 = 5.0;

    pub const AMBIENT_TEMP_C: f64 = 15.0;

    /// Recycle-loop stop criterion: largest relative change of any tracked
    /// quantity at any stage between two sweeps.
    pub const RECYCLE_TOLERANCE: f64 = 1.0e-4;
    pub const MAX_RECYCLE_ITERATIONS: usize = 50;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConvergenceConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            tolerance: defaults::RECYCLE_TOLERANCE,
            max_iterations: defaults::MAX_RECYCLE_ITERATIONS,
        }
    }
}

/// What the digester is fed; selects the VS-destruction and CH4 constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedCharacter {
    TruckedOnly,
    SludgeBlend,
    SludgeOnly,
}

impl FeedCharacter {
    pub fn classify(has_trucked: bool, has_sludge: bool) -> Self {
        match (has_trucked, has_sludge) {
            (true, true) => Self::SludgeBlend,
            (false, true) => Self::SludgeOnly,
            _ => Self::TruckedOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VsDestruction {
    pub greenfield: f64,
    pub hybrid_blend: f64,
    pub sludge_only: f64,
}

impl Default for VsDestruction {
    fn default() -> Self {
        Self {
            greenfield: defaults::VS_DESTRUCTION_GREENFIELD,
            hybrid_blend: defaults::VS_DESTRUCTION_HYBRID_BLEND,
            sludge_only: defaults::VS_DESTRUCTION_SLUDGE_ONLY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestionConstants {
    pub vs_destruction: VsDestruction,
    /// Replaces every per-type fraction when set.
    pub vs_destruction_override: Option<f64>,
    pub ch4_fraction_mixed: f64,
    pub ch4_fraction_sludge: f64,
    pub ch4_fraction_override: Option<f64>,
    pub co2_pct_override: Option<f64>,
    /// Replaces every per-feedstock BMP when set.
    pub gas_yield_override: Option<f64>,
    pub sludge_bmp: f64,
    pub hrt_days: f64,
    /// Retention for the in-plant sludge digester of a wastewater train.
    pub sludge_hrt_days: f64,
    pub olr_target: f64,
    pub digester_temp_c: f64,
    pub mixing_w_per_m3: f64,
    pub max_feed_ts_pct: f64,
    pub h2s_ppmv: f64,
    pub siloxane_mg_m3: f64,
    pub moisture_pct: f64,
}

impl Default for DigestionConstants {
    fn default() -> Self {
        Self {
            vs_destruction: VsDestruction::default(),
            vs_destruction_override: None,
            ch4_fraction_mixed: defaults::CH4_FRACTION_MIXED_ORGANIC,
            ch4_fraction_sludge: defaults::CH4_FRACTION_MUNICIPAL_SLUDGE,
            ch4_fraction_override: None,
            co2_pct_override: None,
            gas_yield_override: None,
            sludge_bmp: defaults::SLUDGE_BMP,
            hrt_days: defaults::HRT_DAYS,
            sludge_hrt_days: defaults::SLUDGE_DIGESTER_HRT_DAYS,
            olr_target: defaults::OLR_TARGET,
            digester_temp_c: defaults::DIGESTER_TEMP_C,
            mixing_w_per_m3: defaults::MIXING_W_PER_M3,
            max_feed_ts_pct: defaults::MAX_FEED_TS_PCT,
            h2s_ppmv: defaults::H2S_PPMV,
            siloxane_mg_m3: defaults::SILOXANE_MG_M3,
            moisture_pct: defaults::MOISTURE_PCT,
        }
    }
}

impl DigestionConstants {
    pub fn vs_destruction_for(&self, feed: FeedCharacter) -> f64 {
        if let Some(v) = self.vs_destruction_override {
            return v;
        }
        match feed {
            FeedCharacter::TruckedOnly => self.vs_destruction.greenfield,
            FeedCharacter::SludgeBlend => self.vs_destruction.hybrid_blend,
            FeedCharacter::SludgeOnly => self.vs_destruction.sludge_only,
        }
    }

    pub fn ch4_fraction_for(&self, feed: FeedCharacter) -> f64 {
        if let Some(v) = self.ch4_fraction_override {
            return v;
        }
        match feed {
            FeedCharacter::SludgeOnly => self.ch4_fraction_sludge,
            _ => self.ch4_fraction_mixed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolidsHandling {
    pub cake_solids_pct: f64,
    pub capture_pct: f64,
    pub thickened_solids_pct: f64,
}

impl Default for SolidsHandling {
    fn default() -> Self {
        Self {
            cake_solids_pct: defaults::CAKE_SOLIDS_PCT,
            capture_pct: defaults::CAPTURE_PCT,
            thickened_solids_pct: defaults::THICKENED_SOLIDS_PCT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationConfig {
    pub project_type: ProjectType,
    pub digestion: DigestionConstants,
    pub solids: SolidsHandling,
    pub convergence: ConvergenceConfig,
    pub ambient_temp_c: f64,
    /// Names of the fields taken from a [`DesignOverrides`] snapshot.
    pub overridden: Vec<&'static str>,
}

impl SimulationConfig {
    pub fn for_project(project_type: ProjectType) -> Self {
        Self {
            project_type,
            digestion: DigestionConstants::default(),
            solids: SolidsHandling::default(),
            convergence: ConvergenceConfig::default(),
            ambient_temp_c: defaults::AMBIENT_TEMP_C,
            overridden: Vec::new(),
        }
    }

    pub fn with_ambient_temp(mut self, temp_c: Option<f64>) -> Self {
        if let Some(t) = temp_c.filter(|t| t.is_finite()) {
            self.ambient_temp_c = t;
        }
        self
    }

    /// Apply a sparse override snapshot. Percentages arrive in 0..=100.
    pub fn with_overrides(mut self, o: &DesignOverrides) -> Self {
        let d = &mut self.digestion;
        let mut hit = Vec::new();
        let mut set = |slot: &mut f64, value: Option<f64>, name: &'static str, scale: f64| {
            if let Some(v) = value {
                *slot = v * scale;
                hit.push(name);
            }
        };
        set(&mut d.hrt_days, o.hrt_days, "hrt_days", 1.0);
        if let Some(v) = o.hrt_days {
            d.sludge_hrt_days = v;
        }
        set(&mut d.olr_target, o.olr_target, "olr_target", 1.0);
        set(&mut d.digester_temp_c, o.digester_temp_c, "digester_temp_c", 1.0);
        set(
            &mut d.mixing_w_per_m3,
            o.mixing_power_w_per_m3,
            "mixing_power_w_per_m3",
            1.0,
        );
        set(&mut d.h2s_ppmv, o.h2s_ppmv, "h2s_ppmv", 1.0);
        set(
            &mut self.solids.cake_solids_pct,
            o.cake_solids_pct,
            "cake_solids_pct",
            1.0,
        );
        set(
            &mut self.solids.capture_pct,
            o.capture_efficiency_pct,
            "capture_efficiency_pct",
            1.0,
        );
        set(
            &mut self.convergence.tolerance,
            o.recycle_tolerance,
            "recycle_tolerance",
            1.0,
        );

        if let Some(v) = o.vs_destruction_pct {
            d.vs_destruction_override = Some(v / 100.0);
            hit.push("vs_destruction_pct");
        }
        if let Some(v) = o.ch4_pct {
            d.ch4_fraction_override = Some(v / 100.0);
            hit.push("ch4_pct");
        }
        if let Some(v) = o.co2_pct {
            d.co2_pct_override = Some(v);
            hit.push("co2_pct");
        }
        if let Some(v) = o.gas_yield_m3_per_kg_vs {
            d.gas_yield_override = Some(v);
            hit.push("gas_yield_m3_per_kg_vs");
        }
        if let Some(n) = o.max_recycle_iterations {
            self.convergence.max_iterations = n.max(1);
            hit.push("max_recycle_iterations");
        }

        self.overridden.extend(hit);
        self
    }

    pub fn is_overridden(&self, name: &str) -> bool {
        self.overridden.contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_type_constants_stay_distinct() {
        let cfg = SimulationConfig::for_project(ProjectType::Hybrid);
        let d = &cfg.digestion;
        assert_eq!(d.vs_destruction_for(FeedCharacter::TruckedOnly), 0.58);
        assert_eq!(d.vs_destruction_for(FeedCharacter::SludgeBlend), 0.90);
        assert_eq!(d.vs_destruction_for(FeedCharacter::SludgeOnly), 0.55);
        assert_eq!(d.ch4_fraction_for(FeedCharacter::TruckedOnly), 0.60);
        assert_eq!(d.ch4_fraction_for(FeedCharacter::SludgeOnly), 0.63);
    }

    #[test]
    fn overrides_replace_defaults() {
        let overrides = DesignOverrides {
            hrt_days: Some(30.0),
            vs_destruction_pct: Some(65.0),
            ch4_pct: Some(58.0),
            max_recycle_iterations: Some(7),
            ..Default::default()
        };
        let cfg = SimulationConfig::for_project(ProjectType::Greenfield).with_overrides(&overrides);
        assert_eq!(cfg.digestion.hrt_days, 30.0);
        assert_eq!(cfg.digestion.vs_destruction_for(FeedCharacter::SludgeOnly), 0.65);
        assert_eq!(cfg.digestion.ch4_fraction_for(FeedCharacter::SludgeOnly), 0.58);
        assert_eq!(cfg.convergence.max_iterations, 7);
        assert!(cfg.is_overridden("hrt_days"));
        assert!(!cfg.is_overridden("olr_target"));
    }

    #[test]
    fn empty_overrides_are_a_no_op() {
        let base = SimulationConfig::for_project(ProjectType::BoltOn);
        let same = base.clone().with_overrides(&DesignOverrides::default());
        assert_eq!(base, same);
    }
}
