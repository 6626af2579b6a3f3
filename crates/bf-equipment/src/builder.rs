//! Bill-of-materials builder.
//!
//! Sizes equipment from converged simulator outputs. Items are appended in a
//! fixed order and tagged from a per-run [`IdSequence`], so identical inputs
//! give identical lists.

use crate::error::EquipmentResult;
use crate::item::{EquipmentItem, EquipmentList, ProcessArea};
use crate::sizing::{
    DEFAULT_MAX_DIGESTER_M3, DIGESTER_ASPECT, PUMP_EFFICIENCY, PUMP_HEAD_FT, TANK_ASPECT,
    aeration_power, circle_diameter, feet, ft2, pump_power, safety, split_volume, tank_geometry,
};
use bf_core::constants::{GAL_PER_M3, KG_PER_LB, KG_PER_SHORT_TON, MINUTES_PER_DAY};
use bf_core::{Diagnostic, DiagnosticKind, IdSequence, m3, mgd_to_gpm, to_kw, to_m, to_m3};
use bf_process::gas::{FLARE_DESTRUCTION_PCT, FLARE_SAFETY_FACTOR};
use bf_process::{
    AdProcessStage, AdStageKind, DigestionOutcome, ProcessStream, Quantity, StageKind,
    TreatmentStage, WastewaterOutcome, defaults,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Equipment type names used in the list.
pub mod kinds {
    pub const FLARE: &str = "Enclosed Flare";
    pub const PUMP: &str = "Pump";
    pub const SCREEN: &str = "Mechanical Bar Screen";
    pub const GRIT: &str = "Grit Removal";
    pub const TANK: &str = "Tank";
    pub const MIXER: &str = "Mixer";
    pub const DAF: &str = "Dissolved Air Flotation Unit";
    pub const CLARIFIER: &str = "Clarifier";
    pub const BLOWER: &str = "Blower";
    pub const FILTER: &str = "Disk Filter";
    pub const UV: &str = "UV Disinfection System";
    pub const DIGESTER: &str = "Anaerobic Digester";
    pub const HEAT: &str = "Boiler / Heat Exchanger";
    pub const THICKENER: &str = "Gravity Belt Thickener";
    pub const DEWATERING: &str = "Dewatering Centrifuge";
    pub const SCREW_PRESS: &str = "Screw Press";
    pub const CONVEYOR: &str = "Cake Conveyor";
    pub const UNLOADING: &str = "Truck Unloading Bay";
    pub const DEPACKAGER: &str = "Depackaging Unit";
    pub const MACERATOR: &str = "Macerator";
    pub const H2S_SCRUBBER: &str = "H2S Scrubber";
    pub const DRYER: &str = "Gas Chiller / Dryer";
    pub const CARBON: &str = "Siloxane Carbon Vessel";
    pub const UPGRADER: &str = "Upgrading Skid";
    pub const COMPRESSOR: &str = "RNG Booster Compressor";
    pub const METER: &str = "RNG Analyzer & Meter Station";
}

const SECONDARY_SOR_GPD_FT2: f64 = 600.0;
const EQ_MIXING_W_PER_M3: f64 = 5.0;
/// Biogas blower power, kW per SCFM.
const GAS_BLOWER_KW_PER_SCFM: f64 = 0.08;
const DRYER_KW_PER_SCFM: f64 = 0.05;
const CENTRIFUGE_KW_PER_GPM: f64 = 0.4;
const THICKENER_KW_PER_GPM: f64 = 0.05;
const UV_KW_PER_MGD: f64 = 4.0;
const DEPACKAGER_KW_PER_TPH: f64 = 15.0;
const MACERATOR_KW_PER_TPH: f64 = 5.0;
const TRUCKS_PER_BAY: f64 = 12.0;
/// Hours per day depackaging and maceration run.
const PREP_HOURS_PER_DAY: f64 = 8.0;

/// An item under construction; the builder assigns its tag.
struct Draft {
    area: ProcessArea,
    equipment_type: &'static str,
    description: String,
    quantity: u32,
    specs: BTreeMap<String, Quantity>,
    design_basis: String,
    notes: Vec<String>,
}

impl Draft {
    fn new(area: ProcessArea, equipment_type: &'static str, description: impl Into<String>) -> Self {
        Self {
            area,
            equipment_type,
            description: description.into(),
            quantity: 1,
            specs: BTreeMap::new(),
            design_basis: String::new(),
            notes: Vec::new(),
        }
    }

    fn quantity(mut self, n: u32) -> Self {
        self.quantity = n.max(1);
        self
    }

    /// One running unit plus one installed spare.
    fn duty_standby(self) -> Self {
        self.quantity(2).spec("duty_count", 1.0, "-").spec("standby_count", 1.0, "-")
    }

    fn spec(mut self, key: &str, value: f64, unit: &str) -> Self {
        self.specs.insert(
            key.to_string(),
            Quantity {
                value,
                unit: unit.to_string(),
            },
        );
        self
    }

    fn basis(mut self, basis: impl Into<String>) -> Self {
        self.design_basis = basis.into();
        self
    }

    fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[derive(Debug)]
pub struct BomBuilder {
    ids: IdSequence,
    items: Vec<EquipmentItem>,
    diagnostics: Vec<Diagnostic>,
    max_tank_m3: f64,
    max_biogas_scfm: f64,
}

impl Default for BomBuilder {
    fn default() -> Self {
        Self {
            ids: IdSequence::new(),
            items: Vec::new(),
            diagnostics: Vec::new(),
            max_tank_m3: DEFAULT_MAX_DIGESTER_M3,
            max_biogas_scfm: 0.0,
        }
    }
}

impl BomBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest single digester the site accepts.
    pub fn with_max_tank_volume(mut self, max_m3: Option<f64>) -> Self {
        if let Some(v) = max_m3.filter(|v| v.is_finite() && *v > 0.0) {
            self.max_tank_m3 = v;
        }
        self
    }

    fn push(&mut self, draft: Draft) {
        let id = self.ids.next_id().tag("EQ");
        debug!(%id, equipment_type = draft.equipment_type, quantity = draft.quantity, "equipment item");
        self.items.push(EquipmentItem {
            id,
            process_area: draft.area,
            equipment_type: draft.equipment_type.to_string(),
            description: draft.description,
            quantity: draft.quantity,
            specs: draft.specs,
            design_basis: draft.design_basis,
            notes: draft.notes,
            is_overridden: false,
            is_locked: false,
        });
    }

    /// Record a biogas source; the flare covers the largest one.
    fn record_gas(&mut self, scfm: f64) {
        if scfm.is_finite() && scfm > self.max_biogas_scfm {
            self.max_biogas_scfm = scfm;
        }
    }

    fn pump_pair(
        &mut self,
        area: ProcessArea,
        description: impl Into<String>,
        gpm: f64,
    ) -> EquipmentResult<()> {
        if gpm <= 0.0 {
            return Ok(());
        }
        let design_gpm = gpm * safety::HYDRAULIC;
        let power = pump_power(design_gpm, PUMP_HEAD_FT, PUMP_EFFICIENCY)?;
        self.push(
            Draft::new(area, kinds::PUMP, description)
                .duty_standby()
                .spec("capacity_gpm", design_gpm, "gpm")
                .spec("head_ft", PUMP_HEAD_FT, "ft")
                .spec("power_kw", to_kw(power), "kW")
                .basis(format!(
                    "{:.0} gpm × {:.2} safety factor at {:.0} ft TDH, {:.0}% efficiency",
                    gpm,
                    safety::HYDRAULIC,
                    PUMP_HEAD_FT,
                    PUMP_EFFICIENCY * 100.0
                )),
        );
        Ok(())
    }

    fn tank(
        &mut self,
        area: ProcessArea,
        description: impl Into<String>,
        volume_m3: f64,
        mixing_w_per_m3: f64,
    ) -> EquipmentResult<()> {
        if volume_m3 <= 0.0 {
            return Ok(());
        }
        let design = volume_m3 * safety::VOLUME;
        let g = tank_geometry(m3(design), TANK_ASPECT)?;
        let description = description.into();
        self.push(
            Draft::new(area, kinds::TANK, description.clone())
                .spec("volume_m3", design, "m³")
                .spec("diameter_m", to_m(g.diameter), "m")
                .spec("height_m", to_m(g.height), "m")
                .basis(format!(
                    "{:.0} m³ × {:.2} safety factor",
                    volume_m3,
                    safety::VOLUME
                )),
        );
        if mixing_w_per_m3 > 0.0 {
            self.push(
                Draft::new(area, kinds::MIXER, format!("{} mixer", description))
                    .spec("power_kw", mixing_w_per_m3 * design / 1_000.0, "kW")
                    .basis(format!("{:.0} W/m³ mixing density", mixing_w_per_m3)),
            );
        }
        Ok(())
    }

    pub fn add_wastewater(&mut self, out: &WastewaterOutcome) -> EquipmentResult<()> {
        for stage in &out.stages {
            self.wastewater_stage(stage)?;
        }
        for r in &out.recycle_streams {
            let name = r.name.to_ascii_lowercase();
            let area = if name.contains("sludge") || name.contains("float") {
                ProcessArea::SolidsHandling
            } else {
                ProcessArea::Headworks
            };
            self.pump_pair(area, format!("{} pumps", r.name), mgd_to_gpm(r.flow_mgd))?;
        }
        self.record_gas(out.digester_biogas_scfm());
        Ok(())
    }

    fn wastewater_stage(&mut self, stage: &TreatmentStage) -> EquipmentResult<()> {
        let c = |key: &str| stage.design_criteria.get(key).map_or(0.0, |c| c.value);
        let peak_mgd = c("peak_flow_mgd");
        let flow_mgd = c("design_flow_mgd");
        match stage.kind {
            StageKind::Preliminary => {
                self.pump_pair(ProcessArea::Headworks, "Influent pump station", mgd_to_gpm(peak_mgd))?;
                self.push(
                    Draft::new(ProcessArea::Headworks, kinds::SCREEN, "Mechanical bar screen")
                        .duty_standby()
                        .spec("capacity_mgd", peak_mgd * safety::HYDRAULIC, "MGD")
                        .spec("opening_mm", c("screen_opening_mm"), "mm")
                        .basis("Peak flow × hydraulic safety factor"),
                );
                self.push(
                    Draft::new(ProcessArea::Headworks, kinds::GRIT, "Vortex grit chamber")
                        .spec("capacity_mgd", peak_mgd * safety::HYDRAULIC, "MGD")
                        .basis("Peak flow × hydraulic safety factor"),
                );
            }
            StageKind::Equalization => {
                self.tank(
                    ProcessArea::Headworks,
                    "Equalization basin",
                    c("volume_m3"),
                    EQ_MIXING_W_PER_M3,
                )?;
            }
            StageKind::Daf => {
                let area = c("surface_area_ft2") * safety::HYDRAULIC;
                self.push(
                    Draft::new(ProcessArea::PrimaryTreatment, kinds::DAF, "DAF unit")
                        .spec("surface_area_ft2", area, "ft²")
                        .spec("hydraulic_loading_gpm_ft2", c("hydraulic_loading_gpm_ft2"), "gpm/ft²")
                        .basis("Peak flow at design hydraulic loading × safety factor"),
                );
            }
            StageKind::PrimaryClarifier => {
                self.clarifiers(
                    ProcessArea::PrimaryTreatment,
                    "Primary clarifier",
                    c("surface_area_ft2"),
                    c("surface_overflow_gpd_ft2"),
                );
            }
            StageKind::ActivatedSludge => {
                self.tank(ProcessArea::SecondaryTreatment, "Aeration basin", c("volume_m3"), 0.0)?;
                let o2_kg = c("oxygen_demand_lb_per_day") * KG_PER_LB;
                let total_kw = to_kw(aeration_power(o2_kg)) * safety::AERATION;
                self.push(
                    Draft::new(ProcessArea::SecondaryTreatment, kinds::BLOWER, "Aeration blower")
                        .quantity(3)
                        .spec("duty_count", 2.0, "-")
                        .spec("standby_count", 1.0, "-")
                        .spec("power_kw", total_kw / 2.0, "kW")
                        .spec("oxygen_demand_kg_per_day", o2_kg, "kg/d")
                        .basis(format!(
                            "Oxygen demand at {:.1} kg O2/kWh × {:.2} safety factor",
                            crate::sizing::AERATION_KG_O2_PER_KWH,
                            safety::AERATION
                        )),
                );
                self.clarifiers(
                    ProcessArea::SecondaryTreatment,
                    "Secondary clarifier",
                    flow_mgd * 1.0e6 / SECONDARY_SOR_GPD_FT2,
                    SECONDARY_SOR_GPD_FT2,
                );
            }
            StageKind::TertiaryFilter => {
                self.push(
                    Draft::new(ProcessArea::TertiaryTreatment, kinds::FILTER, "Tertiary disk filter")
                        .spec("surface_area_ft2", c("surface_area_ft2") * safety::HYDRAULIC, "ft²")
                        .basis("Peak flow at filter hydraulic loading × safety factor"),
                );
            }
            StageKind::Disinfection => {
                let capacity = peak_mgd * safety::HYDRAULIC;
                self.push(
                    Draft::new(ProcessArea::Disinfection, kinds::UV, "UV disinfection system")
                        .spec("capacity_mgd", capacity, "MGD")
                        .spec("uv_dose_mj_cm2", c("uv_dose_mj_cm2"), "mJ/cm²")
                        .spec("power_kw", capacity * UV_KW_PER_MGD, "kW")
                        .basis("Peak flow × hydraulic safety factor"),
                );
            }
            StageKind::SludgeDigester => {
                self.digesters(c("volume_m3"), c("mixing_power_w_per_m3"))?;
            }
            StageKind::Thickening => {
                let gpm = c("feed_gpm") * safety::SOLIDS;
                self.push(
                    Draft::new(ProcessArea::SolidsHandling, kinds::THICKENER, "Gravity belt thickener")
                        .spec("capacity_gpm", gpm, "gpm")
                        .spec("product_solids_pct", c("product_solids_pct"), "%")
                        .spec("power_kw", gpm * THICKENER_KW_PER_GPM, "kW")
                        .basis("Sludge feed × solids safety factor"),
                );
            }
            StageKind::Dewatering => {
                let gpm = c("feed_gpm") * safety::SOLIDS;
                self.push(
                    Draft::new(ProcessArea::SolidsHandling, kinds::DEWATERING, "Dewatering centrifuge")
                        .duty_standby()
                        .spec("capacity_gpm", gpm, "gpm")
                        .spec("cake_solids_pct", c("product_solids_pct"), "%")
                        .spec("power_kw", gpm * CENTRIFUGE_KW_PER_GPM, "kW")
                        .basis("Digested sludge feed × solids safety factor"),
                );
                self.push(
                    Draft::new(ProcessArea::SolidsHandling, kinds::CONVEYOR, "Cake conveyor")
                        .spec("dry_solids_kg_per_day", c("dry_solids_kg_per_day"), "kg/d"),
                );
            }
        }
        Ok(())
    }

    /// Two clarifiers sharing the required area.
    fn clarifiers(&mut self, area: ProcessArea, description: &str, required_ft2: f64, sor: f64) {
        if required_ft2 <= 0.0 {
            return;
        }
        let each = required_ft2 * safety::HYDRAULIC / 2.0;
        self.push(
            Draft::new(area, kinds::CLARIFIER, description)
                .quantity(2)
                .spec("duty_count", 2.0, "-")
                .spec("surface_area_ft2", each, "ft²")
                .spec("diameter_ft", feet(circle_diameter(ft2(each))), "ft")
                .basis(format!("{:.0} gpd/ft² surface overflow rate", sor)),
        );
    }

    /// Digester tanks, split so no tank exceeds the site limit.
    fn digesters(&mut self, volume_m3: f64, mixing_w_per_m3: f64) -> EquipmentResult<()> {
        if volume_m3 <= 0.0 {
            return Ok(());
        }
        let design = volume_m3 * safety::VOLUME;
        let (count, each) = split_volume(m3(design), m3(self.max_tank_m3))?;
        let g = tank_geometry(each, DIGESTER_ASPECT)?;
        let each_m3 = to_m3(each);
        let mut draft = Draft::new(ProcessArea::Digestion, kinds::DIGESTER, "Anaerobic digester tank")
            .quantity(count)
            .spec("volume_m3", each_m3, "m³")
            .spec("diameter_m", to_m(g.diameter), "m")
            .spec("height_m", to_m(g.height), "m")
            .basis(format!(
                "{:.0} m³ total × {:.2} safety factor",
                volume_m3,
                safety::VOLUME
            ));
        if count > 1 {
            draft = draft.note(format!(
                "Split into {} tanks to stay within {:.0} m³ per tank",
                count, self.max_tank_m3
            ));
            self.diagnostics.push(
                Diagnostic::info(
                    DiagnosticKind::Sizing,
                    format!(
                        "Digester volume {:.0} m³ split into {} tanks of {:.0} m³",
                        design, count, each_m3
                    ),
                )
                .with_field("max_digester_tank_m3"),
            );
        }
        self.push(draft);
        self.push(
            Draft::new(ProcessArea::Digestion, kinds::MIXER, "Digester mixing system")
                .quantity(count)
                .spec("power_kw", mixing_w_per_m3 * each_m3 / 1_000.0, "kW")
                .basis(format!("{:.0} W/m³ mixing density", mixing_w_per_m3)),
        );
        Ok(())
    }

    pub fn add_digestion(&mut self, out: &DigestionOutcome) -> EquipmentResult<()> {
        for stage in &out.stages {
            self.digestion_stage(stage, out)?;
        }
        self.record_gas(out.raw_biogas.scfm);
        Ok(())
    }

    fn digestion_stage(&mut self, stage: &AdProcessStage, out: &DigestionOutcome) -> EquipmentResult<()> {
        let c = |key: &str| stage.design_criteria.get(key).map_or(0.0, |c| c.value);
        let m3_per_day = |s: &ProcessStream| s.value("flow");
        match stage.kind {
            AdStageKind::Receiving => {
                self.tank(
                    ProcessArea::FeedstockReceiving,
                    "Feedstock receiving tank",
                    c("storage_volume_m3"),
                    defaults::MIXING_W_PER_M3,
                )?;
                let trucks = c("truck_deliveries_per_day");
                if trucks > 0.0 {
                    self.push(
                        Draft::new(ProcessArea::FeedstockReceiving, kinds::UNLOADING, "Truck unloading bay")
                            .quantity((trucks / TRUCKS_PER_BAY).ceil() as u32)
                            .spec("deliveries_per_day", trucks, "trucks/d")
                            .basis(format!("{:.0} deliveries per bay per day", TRUCKS_PER_BAY)),
                    );
                }
            }
            AdStageKind::Preparation => {
                let tph = out.feed.wet_kg_per_day / KG_PER_SHORT_TON / PREP_HOURS_PER_DAY
                    * safety::SOLIDS;
                if c("depackaging_required") > 0.0 {
                    self.push(
                        Draft::new(ProcessArea::FeedstockReceiving, kinds::DEPACKAGER, "Depackaging unit")
                            .spec("capacity_tph", tph, "tons/h")
                            .spec("power_kw", tph * DEPACKAGER_KW_PER_TPH, "kW")
                            .spec("rejects_kg_per_day", c("rejects_kg_per_day"), "kg/d")
                            .basis(format!("{:.0} h/day operation", PREP_HOURS_PER_DAY)),
                    );
                }
                self.push(
                    Draft::new(ProcessArea::FeedstockReceiving, kinds::MACERATOR, "Feedstock macerator")
                        .spec("capacity_tph", tph, "tons/h")
                        .spec("particle_size_mm", c("particle_size_mm"), "mm")
                        .spec("power_kw", tph * MACERATOR_KW_PER_TPH, "kW")
                        .basis(format!("{:.0} h/day operation", PREP_HOURS_PER_DAY)),
                );
            }
            AdStageKind::Equalization => {
                self.tank(
                    ProcessArea::Digestion,
                    "Blend tank",
                    c("volume_m3"),
                    defaults::MIXING_W_PER_M3,
                )?;
                let gpm = m3_per_day(&stage.output) * GAL_PER_M3 / MINUTES_PER_DAY;
                self.pump_pair(ProcessArea::Digestion, "Digester feed pumps", gpm)?;
            }
            AdStageKind::Digestion => {
                let mixing = out
                    .digester
                    .map_or(defaults::MIXING_W_PER_M3, |d| {
                        if d.volume_m3 > 0.0 {
                            d.mixing_kw * 1_000.0 / d.volume_m3
                        } else {
                            defaults::MIXING_W_PER_M3
                        }
                    });
                self.digesters(c("volume_m3"), mixing)?;
                let heat = c("heating_kw") * safety::THERMAL;
                if heat > 0.0 {
                    self.push(
                        Draft::new(ProcessArea::Digestion, kinds::HEAT, "Digester boiler and heat exchanger")
                            .spec("heat_duty_kw", heat, "kW")
                            .spec("temperature_c", c("temperature_c"), "°C")
                            .basis("Feed heating plus shell losses × thermal safety factor"),
                    );
                }
            }
            AdStageKind::Dewatering => {
                let gpm = m3_per_day(&stage.input) * GAL_PER_M3 / MINUTES_PER_DAY * safety::SOLIDS;
                if gpm > 0.0 {
                    self.push(
                        Draft::new(ProcessArea::DigestateHandling, kinds::SCREW_PRESS, "Digestate screw press")
                            .duty_standby()
                            .spec("capacity_gpm", gpm, "gpm")
                            .spec("cake_solids_pct", c("cake_solids_pct"), "%")
                            .spec("power_kw", gpm * CENTRIFUGE_KW_PER_GPM, "kW")
                            .basis("Digestate flow × solids safety factor"),
                    );
                    self.push(
                        Draft::new(ProcessArea::DigestateHandling, kinds::CONVEYOR, "Cake conveyor")
                            .spec("cake_tons_per_day", c("cake_tons_per_day"), "tons/d"),
                    );
                }
            }
            AdStageKind::LiquidCleanup => {
                let gpm = c("filtrate_m3_per_day") * GAL_PER_M3 / MINUTES_PER_DAY;
                if gpm > 0.0 {
                    self.push(
                        Draft::new(ProcessArea::DigestateHandling, kinds::DAF, "Filtrate DAF unit")
                            .spec("capacity_gpm", gpm * safety::HYDRAULIC, "gpm")
                            .spec("tss_removal_pct", c("tss_removal_pct"), "%")
                            .basis("Filtrate flow × hydraulic safety factor"),
                    );
                }
                self.pump_pair(ProcessArea::DigestateHandling, "Filtrate transfer pumps", gpm)?;
            }
            AdStageKind::GasConditioning => {
                let scfm = c("design_flow_scfm") * safety::GAS;
                self.push(
                    Draft::new(ProcessArea::GasConditioning, kinds::BLOWER, "Biogas blower")
                        .duty_standby()
                        .spec("capacity_scfm", scfm, "SCFM")
                        .spec("power_kw", scfm * GAS_BLOWER_KW_PER_SCFM, "kW")
                        .basis("Raw biogas × gas safety factor"),
                );
                self.push(
                    Draft::new(ProcessArea::GasConditioning, kinds::H2S_SCRUBBER, "Biological H2S scrubber")
                        .spec("capacity_scfm", scfm, "SCFM")
                        .spec("h2s_load_kg_per_day", c("h2s_load_kg_per_day"), "kg/d")
                        .spec("removal_pct", c("h2s_removal_pct"), "%")
                        .basis("Raw biogas × gas safety factor"),
                );
                self.push(
                    Draft::new(ProcessArea::GasConditioning, kinds::DRYER, "Gas chiller and dryer")
                        .spec("capacity_scfm", scfm, "SCFM")
                        .spec("power_kw", scfm * DRYER_KW_PER_SCFM, "kW")
                        .basis("Raw biogas × gas safety factor"),
                );
                self.push(
                    Draft::new(ProcessArea::GasConditioning, kinds::CARBON, "Activated carbon vessel")
                        .quantity(2)
                        .spec("duty_count", 2.0, "-")
                        .spec("capacity_scfm", scfm, "SCFM")
                        .spec("removal_pct", c("siloxane_removal_pct"), "%")
                        .note("Lead/lag arrangement"),
                );
            }
            AdStageKind::GasUpgrading => {
                let up = &out.upgrading;
                self.push(
                    Draft::new(ProcessArea::GasUpgrading, kinds::UPGRADER, up.tier.technology)
                        .spec("tier_capacity_scfm", up.tier.max_scfm, "SCFM")
                        .spec("inlet_scfm", c("inlet_scfm"), "SCFM")
                        .spec("rng_scfm", up.rng_scfm, "SCFM")
                        .spec("product_purity_pct", up.tier.product_purity_pct, "%")
                        .spec("outlet_psig", up.tier.outlet_psig, "psig")
                        .spec("power_kw", up.skid_kw, "kW")
                        .basis(format!("Vendor tier up to {:.0} SCFM", up.tier.max_scfm)),
                );
                if up.booster_kw > 0.0 {
                    self.push(
                        Draft::new(ProcessArea::GasUpgrading, kinds::COMPRESSOR, "RNG booster compressor")
                            .duty_standby()
                            .spec("capacity_scfm", up.rng_scfm * safety::THERMAL, "SCFM")
                            .spec("discharge_psig", up.delivery_psig, "psig")
                            .spec("power_kw", up.booster_kw * safety::THERMAL, "kW")
                            .basis("Pipeline pressure above skid outlet"),
                    );
                }
                self.push(
                    Draft::new(ProcessArea::GasUpgrading, kinds::METER, "RNG gas quality analyzer and meter")
                        .spec("capacity_scfm", up.rng_scfm * safety::GAS, "SCFM"),
                );
            }
            AdStageKind::EmergencyGasManagement => {
                // Flare is added once in `finish`, sized on the largest source.
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> EquipmentList {
        if self.max_biogas_scfm > 0.0 {
            let capacity = self.max_biogas_scfm * FLARE_SAFETY_FACTOR;
            self.push(
                Draft::new(ProcessArea::GasSafety, kinds::FLARE, "Enclosed ground flare")
                    .spec("capacity_scfm", capacity, "SCFM")
                    .spec("destruction_efficiency_pct", FLARE_DESTRUCTION_PCT, "%")
                    .basis(format!(
                        "{:.1} SCFM maximum biogas × {:.2}",
                        self.max_biogas_scfm, FLARE_SAFETY_FACTOR
                    )),
            );
        }
        let list = EquipmentList {
            items: self.items,
            diagnostics: self.diagnostics,
        };
        info!(items = list.items.len(), running_kw = list.total_running_kw(), "equipment list");
        list
    }
}

/// Equipment for whichever trains ran.
pub fn build_equipment(
    wastewater: Option<&WastewaterOutcome>,
    digestion: Option<&DigestionOutcome>,
    max_digester_tank_m3: Option<f64>,
) -> EquipmentResult<EquipmentList> {
    let mut b = BomBuilder::new().with_max_tank_volume(max_digester_tank_m3);
    if let Some(ww) = wastewater {
        b.add_wastewater(ww)?;
    }
    if let Some(ad) = digestion {
        b.add_digestion(ad)?;
    }
    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_standby_pumps_come_in_pairs() {
        let mut b = BomBuilder::new();
        b.pump_pair(ProcessArea::Headworks, "Influent pumps", 500.0).unwrap();
        let list = b.finish();
        assert_eq!(list.items.len(), 1);
        let pump = &list.items[0];
        assert_eq!(pump.id, "EQ-001");
        assert_eq!(pump.quantity, 2);
        assert_eq!(pump.duty_count(), 1);
        assert!((pump.spec("capacity_gpm").unwrap() - 625.0).abs() < 1e-9);
        assert!(!pump.is_overridden && !pump.is_locked);
    }

    #[test]
    fn no_flare_without_gas() {
        let mut b = BomBuilder::new();
        b.tank(ProcessArea::Headworks, "Equalization basin", 500.0, 5.0).unwrap();
        let list = b.finish();
        assert_eq!(list.by_type(kinds::FLARE).count(), 0);
        assert_eq!(list.items.len(), 2);
    }

    #[test]
    fn one_flare_on_largest_source() {
        let mut b = BomBuilder::new();
        b.record_gas(120.0);
        b.record_gas(300.0);
        b.record_gas(80.0);
        let list = b.finish();
        let flares: Vec<_> = list.by_type(kinds::FLARE).collect();
        assert_eq!(flares.len(), 1);
        assert!((flares[0].spec("capacity_scfm").unwrap() - 330.0).abs() < 1e-9);
    }

    #[test]
    fn digesters_split_at_site_limit() {
        let mut b = BomBuilder::new().with_max_tank_volume(Some(3_000.0));
        b.digesters(10_000.0, 6.0).unwrap();
        let list = b.finish();
        let tanks = list.by_type(kinds::DIGESTER).next().unwrap();
        assert_eq!(tanks.quantity, 4);
        assert!(tanks.spec("volume_m3").unwrap() <= 3_000.0);
        assert_eq!(list.diagnostics.len(), 1);
        assert_eq!(list.diagnostics[0].kind, DiagnosticKind::Sizing);
    }
}
