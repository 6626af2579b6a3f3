//! Assumption list: every literal constant a run relied on.

use bf_process::digestion::{FILTRATE_TSS_REMOVAL, REJECTS_SOLIDS_PCT};
use bf_process::gas::{FLARE_SAFETY_FACTOR, H2S_REMOVAL, MOISTURE_REMOVAL, SILOXANE_REMOVAL};
use bf_process::wastewater::simulate::typical;
use bf_process::wastewater::stage;
use bf_process::{CAPACITY_CEILING_SCFM, FeedCharacter, SimulationConfig, defaults, sources};
use bf_results::Assumption;

/// Collects assumptions, citing the override snapshot where one applied.
struct Ledger<'a> {
    config: &'a SimulationConfig,
    items: Vec<Assumption>,
}

impl<'a> Ledger<'a> {
    fn add(&mut self, parameter: &str, value: f64, unit: &str, source: &str) {
        let source = if self.config.is_overridden(parameter) {
            sources::OVERRIDE
        } else {
            source
        };
        self.items.push(Assumption::new(parameter, value, unit, source));
    }
}

pub fn wastewater_assumptions(config: &SimulationConfig, in_plant_digester: bool) -> Vec<Assumption> {
    let mut l = Ledger {
        config,
        items: Vec::new(),
    };
    l.add("recycle_tolerance", config.convergence.tolerance, "-", sources::PLANT_PRACTICE);
    l.add(
        "max_recycle_iterations",
        config.convergence.max_iterations as f64,
        "-",
        sources::PLANT_PRACTICE,
    );
    l.add("influent_vss_tss", typical::VSS_TSS, "-", sources::METCALF_EDDY);
    l.add("primary_sludge_vs_ts", stage::PRIMARY_SLUDGE_VS_TS, "-", sources::METCALF_EDDY);
    l.add("primary_sludge_solids_pct", stage::PRIMARY_SLUDGE_SOLIDS_PCT, "%", sources::METCALF_EDDY);
    l.add("daf_float_vs_ts", stage::DAF_FLOAT_VS_TS, "-", sources::METCALF_EDDY);
    l.add("was_yield", stage::WAS_YIELD, "lb VSS/lb BOD", sources::METCALF_EDDY);
    l.add("was_vss_tss", stage::WAS_VSS_TSS, "-", sources::METCALF_EDDY);
    l.add("capture_efficiency_pct", config.solids.capture_pct, "%", sources::WEF_MOP8);
    if in_plant_digester {
        let d = &config.digestion;
        l.add(
            "vs_destruction_pct",
            d.vs_destruction_for(FeedCharacter::SludgeOnly) * 100.0,
            "%",
            sources::WEF_MOP16,
        );
        l.add("sludge_bmp", d.sludge_bmp, "m³ CH4/kg VS", sources::WEF_MOP16);
        if let Some(y) = d.gas_yield_override {
            l.add("gas_yield_m3_per_kg_vs", y, "m³ CH4/kg VS", sources::OVERRIDE);
        }
        l.add(
            "ch4_pct",
            d.ch4_fraction_for(FeedCharacter::SludgeOnly) * 100.0,
            "%",
            sources::WEF_MOP16,
        );
        l.add("hrt_days", d.sludge_hrt_days, "d", sources::WEF_MOP16);
        l.add("mixing_power_w_per_m3", d.mixing_w_per_m3, "W/m³", sources::WEF_MOP16);
        l.add("cake_solids_pct", config.solids.cake_solids_pct, "%", sources::WEF_MOP8);
    } else {
        l.add(
            "thickened_solids_pct",
            config.solids.thickened_solids_pct,
            "%",
            sources::WEF_MOP8,
        );
    }
    l.items
}

/// Constants used by the digestion train. `character` is `None` for
/// bolt-on projects, which skip digestion.
pub fn gas_train_assumptions(
    config: &SimulationConfig,
    character: Option<FeedCharacter>,
) -> Vec<Assumption> {
    let d = &config.digestion;
    let mut l = Ledger {
        config,
        items: Vec::new(),
    };
    if let Some(character) = character {
        l.add(
            "vs_destruction_pct",
            d.vs_destruction_for(character) * 100.0,
            "%",
            sources::WEF_MOP16,
        );
        l.add("ch4_pct", d.ch4_fraction_for(character) * 100.0, "%", sources::WEF_MOP16);
        if let Some(y) = d.gas_yield_override {
            l.add("gas_yield_m3_per_kg_vs", y, "m³ CH4/kg VS", sources::OVERRIDE);
        }
        l.add("hrt_days", d.hrt_days, "d", sources::WEF_MOP16);
        l.add("olr_target", d.olr_target, "kg VS/m³·d", sources::WEF_MOP16);
        l.add("digester_temp_c", d.digester_temp_c, "°C", sources::WEF_MOP16);
        l.add("mixing_power_w_per_m3", d.mixing_w_per_m3, "W/m³", sources::WEF_MOP16);
        l.add("max_feed_ts_pct", d.max_feed_ts_pct, "%", sources::WEF_MOP16);
        l.add("ambient_temp_c", config.ambient_temp_c, "°C", sources::INTAKE);
        l.add("rejects_solids_pct", REJECTS_SOLIDS_PCT, "%", sources::PLANT_PRACTICE);
        l.add("cake_solids_pct", config.solids.cake_solids_pct, "%", sources::WEF_MOP8);
        l.add("capture_efficiency_pct", config.solids.capture_pct, "%", sources::WEF_MOP8);
        l.add("filtrate_tss_removal_pct", FILTRATE_TSS_REMOVAL * 100.0, "%", sources::METCALF_EDDY);
        l.add("n2_pct", defaults::N2_PCT, "%", sources::PLANT_PRACTICE);
        l.add("o2_pct", defaults::O2_PCT, "%", sources::PLANT_PRACTICE);
        l.add("h2s_ppmv", d.h2s_ppmv, "ppmv", sources::PLANT_PRACTICE);
        l.add("siloxane_mg_m3", d.siloxane_mg_m3, "mg/m³", sources::PLANT_PRACTICE);
        l.add("moisture_pct", d.moisture_pct, "%", sources::PLANT_PRACTICE);
    }
    l.add("h2s_removal_pct", H2S_REMOVAL * 100.0, "%", sources::PLANT_PRACTICE);
    l.add("moisture_removal_pct", MOISTURE_REMOVAL * 100.0, "%", sources::PLANT_PRACTICE);
    l.add("siloxane_removal_pct", SILOXANE_REMOVAL * 100.0, "%", sources::PLANT_PRACTICE);
    l.add("flare_safety_factor", FLARE_SAFETY_FACTOR, "-", sources::PLANT_PRACTICE);
    l.add("capacity_ceiling_scfm", CAPACITY_CEILING_SCFM, "SCFM", sources::VENDOR_TIER);
    l.items
}
