//! Stage-by-stage propagation with fixed-point recycle resolution.

use super::liquor::{Liquor, WwParam};
use super::stage::StageKind;
use super::train::{Port, StageTrain};
use crate::config::{FeedCharacter, SimulationConfig};
use crate::error::{ProcessError, ProcessResult};
use crate::stream::{DesignCriteria, ProcessStream, criterion, sources};
use bf_core::constants::{GAL_PER_M3, KG_PER_LB};
use bf_core::{
    Diagnostic, DiagnosticKind, clamp_pct, m3_per_day_to_scfm, mgd_to_gpm, relative_change,
};
use bf_intake::InfluentDef;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Medium-strength municipal defaults for concentrations missing at intake.
pub mod typical {
    pub const BOD_MG_L: f64 = 220.0;
    pub const COD_MG_L: f64 = 500.0;
    pub const TSS_MG_L: f64 = 220.0;
    pub const TKN_MG_L: f64 = 40.0;
    pub const TP_MG_L: f64 = 7.0;
    pub const FOG_MG_L: f64 = 50.0;
    pub const PEAKING_FACTOR: f64 = 2.5;
    /// Influent VSS as a share of TSS.
    pub const VSS_TSS: f64 = 0.80;
}

/// Relative-change floor: magnitudes below this are treated as zero.
const CHANGE_FLOOR: f64 = 1.0e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InfluentQuality {
    pub flow_mgd: f64,
    pub bod_mg_l: f64,
    pub cod_mg_l: f64,
    pub tss_mg_l: f64,
    pub tkn_mg_l: f64,
    pub tp_mg_l: f64,
    pub fog_mg_l: f64,
    pub peaking_factor: f64,
}

impl InfluentQuality {
    /// Resolve an intake influent, filling missing concentrations with
    /// typical municipal values. Each fill is reported.
    pub fn from_intake(def: &InfluentDef) -> ProcessResult<(Self, Vec<Diagnostic>)> {
        let flow_mgd = bf_core::normalize_liquid_flow(def.flow.value(), &def.flow_unit);
        if flow_mgd.is_nan() || flow_mgd <= 0.0 {
            return Err(ProcessError::InvalidInput {
                what: format!("wastewater flow must be positive (got {} {})", flow_mgd, def.flow_unit),
            });
        }

        let mut diagnostics = Vec::new();
        let mut fill = |value: Option<f64>, default: f64, field: &str| match value {
            Some(v) => v,
            None => {
                diagnostics.push(
                    Diagnostic::info(
                        DiagnosticKind::Input,
                        format!("{} not given; typical municipal value {} used", field, default),
                    )
                    .with_field(field),
                );
                default
            }
        };
        let q = Self {
            flow_mgd,
            bod_mg_l: fill(def.bod_mg_l, typical::BOD_MG_L, "bod_mg_l"),
            cod_mg_l: fill(def.cod_mg_l, typical::COD_MG_L, "cod_mg_l"),
            tss_mg_l: fill(def.tss_mg_l, typical::TSS_MG_L, "tss_mg_l"),
            tkn_mg_l: fill(def.tkn_mg_l, typical::TKN_MG_L, "tkn_mg_l"),
            tp_mg_l: fill(def.tp_mg_l, typical::TP_MG_L, "tp_mg_l"),
            fog_mg_l: fill(def.fog_mg_l, typical::FOG_MG_L, "fog_mg_l"),
            peaking_factor: def.peaking_factor.unwrap_or(typical::PEAKING_FACTOR),
        };
        Ok((q, diagnostics))
    }

    pub fn municipal(flow_mgd: f64, bod_mg_l: f64) -> Self {
        Self {
            flow_mgd,
            bod_mg_l,
            cod_mg_l: typical::COD_MG_L,
            tss_mg_l: typical::TSS_MG_L,
            tkn_mg_l: typical::TKN_MG_L,
            tp_mg_l: typical::TP_MG_L,
            fog_mg_l: typical::FOG_MG_L,
            peaking_factor: typical::PEAKING_FACTOR,
        }
    }

    pub fn liquor(&self) -> Liquor {
        let mut l = Liquor::with_flow(self.flow_mgd);
        l.set_concentration(WwParam::Bod, self.bod_mg_l);
        l.set_concentration(WwParam::Cod, self.cod_mg_l);
        l.set_concentration(WwParam::Tss, self.tss_mg_l);
        l.set_concentration(WwParam::Vss, self.tss_mg_l * typical::VSS_TSS);
        l.set_concentration(WwParam::Tkn, self.tkn_mg_l);
        l.set_concentration(WwParam::Tp, self.tp_mg_l);
        l.set_concentration(WwParam::Fog, self.fog_mg_l);
        l
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentStage {
    pub name: String,
    pub kind: StageKind,
    pub influent: ProcessStream,
    pub effluent: ProcessStream,
    /// Percent removal per parameter, each within [0, 100].
    pub removal_efficiencies: BTreeMap<String, f64>,
    pub design_criteria: DesignCriteria,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecycleStream {
    pub name: String,
    pub source: String,
    pub destination: String,
    pub flow_mgd: f64,
    /// lb/day per parameter.
    pub loads: BTreeMap<String, f64>,
}

/// Solids leaving the wastewater train (cake or thickened sludge).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SludgeSummary {
    pub dry_solids_kg_per_day: f64,
    pub vs_kg_per_day: f64,
    pub wet_m3_per_day: f64,
    pub tkn_kg_per_day: f64,
}

impl SludgeSummary {
    pub fn is_empty(&self) -> bool {
        self.dry_solids_kg_per_day <= 0.0
    }

    pub fn solids_pct(&self) -> f64 {
        let wet_kg = self.wet_m3_per_day * 1_000.0;
        if wet_kg > 0.0 {
            self.dry_solids_kg_per_day / wet_kg * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WastewaterOutcome {
    pub influent: InfluentQuality,
    pub stages: Vec<TreatmentStage>,
    pub recycle_streams: Vec<RecycleStream>,
    pub sludge: SludgeSummary,
    /// Plant effluent after the last main-line stage.
    pub effluent: ProcessStream,
    /// Biogas from an in-plant sludge digester, if the train has one.
    pub digester_biogas_m3_per_day: f64,
    pub digester_volume_m3: f64,
    pub iterations: usize,
    pub converged: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl WastewaterOutcome {
    pub fn stage(&self, kind: StageKind) -> Option<&TreatmentStage> {
        self.stages.iter().find(|s| s.kind == kind)
    }

    pub fn digester_biogas_scfm(&self) -> f64 {
        m3_per_day_to_scfm(self.digester_biogas_m3_per_day)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct StageState {
    influent: Liquor,
    effluent: Liquor,
    underflow: Liquor,
}

impl StageState {
    fn port(&self, port: Port) -> Liquor {
        match port {
            Port::Effluent => self.effluent,
            Port::Underflow => self.underflow,
        }
    }

    fn tracked(&self) -> impl Iterator<Item = f64> + '_ {
        self.influent
            .tracked()
            .chain(self.effluent.tracked())
            .chain(self.underflow.tracked())
    }
}

/// A validated stage train bound to its design influent.
#[derive(Debug, Clone)]
pub struct WastewaterTrain {
    pub train: StageTrain,
    pub influent: InfluentQuality,
}

impl WastewaterTrain {
    pub fn new(train: StageTrain, influent: InfluentQuality) -> Self {
        Self { train, influent }
    }

    /// Run sweeps until every tracked quantity settles or the iteration cap
    /// is hit. Hitting the cap is reported, never raised.
    pub fn run(&self, config: &SimulationConfig) -> WastewaterOutcome {
        let stages = self.train.stages();
        let raw = self.influent.liquor();
        let cap = config.convergence.max_iterations.max(1);
        let tol = config.convergence.tolerance;
        let has_back_edges = self.train.has_back_edges();

        let mut state = vec![StageState::default(); stages.len()];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < cap {
            iterations += 1;
            let next = self.sweep(&raw, &state, config);
            let change = max_change(&state, &next);
            state = next;
            debug!(iteration = iterations, change, "recycle sweep");
            if !has_back_edges || change < tol {
                converged = true;
                break;
            }
        }

        let mut diagnostics = Vec::new();
        if !converged {
            warn!(iterations, tolerance = tol, "recycle loop hit the iteration cap");
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::Convergence,
                    format!(
                        "Recycle loop did not reach tolerance {:e} within {} iterations; last iterate reported",
                        tol, iterations
                    ),
                )
                .with_field("recycle_streams"),
            );
        }

        self.report(&state, iterations, converged, diagnostics, config)
    }

    /// One Gauss-Seidel pass: forward edges use this sweep's values, back-edges
    /// the previous sweep's.
    fn sweep(&self, raw: &Liquor, previous: &[StageState], config: &SimulationConfig) -> Vec<StageState> {
        let stages = self.train.stages();
        let mut next: Vec<StageState> = Vec::with_capacity(stages.len());
        let mut main_line: Option<Liquor> = None;

        for (i, spec) in stages.iter().enumerate() {
            let mut inflow = if spec.kind.is_side_stream() {
                Liquor::zero()
            } else {
                main_line.unwrap_or(*raw)
            };
            for r in self.train.incoming(spec.id) {
                let src = r.source.index() as usize;
                let source = if src < i { &next[src] } else { &previous[src] };
                inflow += source.port(r.port) * r.fraction;
            }

            let (effluent, underflow) = spec.kind.evaluate(&inflow, config);
            if !spec.kind.is_side_stream() {
                let onward = 1.0 - self.train.routed_fraction(spec.id, Port::Effluent);
                main_line = Some(effluent * onward.max(0.0));
            }
            next.push(StageState {
                influent: inflow,
                effluent,
                underflow,
            });
        }
        next
    }

    fn report(
        &self,
        state: &[StageState],
        iterations: usize,
        converged: bool,
        diagnostics: Vec<Diagnostic>,
        config: &SimulationConfig,
    ) -> WastewaterOutcome {
        let stages = self.train.stages();
        let mut treatment = Vec::with_capacity(stages.len());
        let mut sludge = Liquor::zero();
        let mut plant_effluent = Liquor::zero();
        let mut digester_biogas = 0.0;
        let mut digester_volume = 0.0;

        for (spec, s) in stages.iter().zip(state) {
            let unrouted = 1.0 - self.train.routed_fraction(spec.id, Port::Underflow);
            if spec.kind.has_underflow() && unrouted > 0.0 {
                sludge += s.underflow * unrouted;
            }
            if !spec.kind.is_side_stream() {
                let onward = 1.0 - self.train.routed_fraction(spec.id, Port::Effluent);
                plant_effluent = s.effluent * onward.max(0.0);
            }

            let criteria = design_criteria(spec.kind, s, &self.influent, config);
            if spec.kind == StageKind::SludgeDigester {
                digester_biogas = criteria.get("biogas_m3_per_day").map_or(0.0, |c| c.value);
                digester_volume = criteria.get("volume_m3").map_or(0.0, |c| c.value);
            }
            let notes = stage_notes(spec.kind, self.train.incoming(spec.id).count());
            treatment.push(TreatmentStage {
                name: spec.name.clone(),
                kind: spec.kind,
                influent: liquid_stream(&s.influent),
                effluent: liquid_stream(&s.effluent),
                removal_efficiencies: removal_efficiencies(&s.influent, &s.effluent),
                design_criteria: criteria,
                notes,
            });
        }

        let recycle_streams = self
            .train
            .recycles()
            .iter()
            .map(|r| {
                let src = r.source.index() as usize;
                let carried = state[src].port(r.port) * r.fraction;
                RecycleStream {
                    name: r.name.clone(),
                    source: stages[src].name.clone(),
                    destination: stages[r.destination.index() as usize].name.clone(),
                    flow_mgd: carried.flow_mgd,
                    loads: WwParam::ALL
                        .iter()
                        .map(|p| (p.key().to_string(), carried.load(*p)))
                        .collect(),
                }
            })
            .collect();

        WastewaterOutcome {
            influent: self.influent,
            stages: treatment,
            recycle_streams,
            sludge: SludgeSummary {
                dry_solids_kg_per_day: sludge.load(WwParam::Tss) * KG_PER_LB,
                vs_kg_per_day: sludge.load(WwParam::Vss) * KG_PER_LB,
                wet_m3_per_day: sludge.flow_mgd * 1.0e6 / GAL_PER_M3,
                tkn_kg_per_day: sludge.load(WwParam::Tkn) * KG_PER_LB,
            },
            effluent: liquid_stream(&plant_effluent),
            digester_biogas_m3_per_day: digester_biogas,
            digester_volume_m3: digester_volume,
            iterations,
            converged,
            diagnostics,
        }
    }
}

fn max_change(previous: &[StageState], current: &[StageState]) -> f64 {
    previous
        .iter()
        .zip(current)
        .flat_map(|(a, b)| a.tracked().zip(b.tracked()))
        .map(|(a, b)| relative_change(a, b, CHANGE_FLOOR))
        .fold(0.0, f64::max)
}

fn liquid_stream(l: &Liquor) -> ProcessStream {
    WwParam::ALL.iter().fold(
        ProcessStream::new().with("flow", l.flow_mgd, "MGD"),
        |s, p| s.with(p.key(), l.concentration(*p), "mg/L"),
    )
}

fn removal_efficiencies(influent: &Liquor, effluent: &Liquor) -> BTreeMap<String, f64> {
    WwParam::ALL
        .iter()
        .filter(|p| influent.load(**p) > 0.0)
        .map(|p| {
            let pct = (1.0 - effluent.load(*p) / influent.load(*p)) * 100.0;
            (p.key().to_string(), clamp_pct(pct))
        })
        .collect()
}

/// Surface overflow rates, gpd/ft².
const PRIMARY_SOR: f64 = 1_000.0;
const DAF_HLR_GPM_FT2: f64 = 2.0;
const FILTER_HLR_GPM_FT2: f64 = 5.0;
/// Aeration basin hydraulic retention, hours.
const AERATION_HRT_H: f64 = 6.0;
/// lb O2 per lb BOD removed and per lb TKN nitrified.
const O2_PER_BOD: f64 = 1.1;
const O2_PER_TKN: f64 = 4.57;
const EQ_VOLUME_SHARE: f64 = 0.25;
const UV_DOSE_MJ_CM2: f64 = 30.0;

fn design_criteria(
    kind: StageKind,
    s: &StageState,
    influent: &InfluentQuality,
    config: &SimulationConfig,
) -> DesignCriteria {
    let flow = s.influent.flow_mgd;
    let peak = flow * influent.peaking_factor;
    let mut c = DesignCriteria::new();
    c.insert("design_flow_mgd".into(), criterion(flow, "MGD", sources::INTAKE));
    c.insert(
        "peak_flow_mgd".into(),
        criterion(peak, "MGD", sources::TEN_STATES),
    );

    let r = kind.design_removal();
    match kind {
        StageKind::Preliminary => {
            c.insert("screen_opening_mm".into(), criterion(6.0, "mm", sources::WEF_MOP8));
            c.insert(
                "grit_removal_pct".into(),
                criterion(r.tss * 100.0, "%", sources::METCALF_EDDY),
            );
        }
        StageKind::Equalization => {
            let volume_gal = flow * 1.0e6 * EQ_VOLUME_SHARE;
            c.insert(
                "volume_m3".into(),
                criterion(volume_gal / GAL_PER_M3, "m³", sources::METCALF_EDDY),
            );
        }
        StageKind::Daf => {
            let area = mgd_to_gpm(peak) / DAF_HLR_GPM_FT2;
            c.insert(
                "hydraulic_loading_gpm_ft2".into(),
                criterion(DAF_HLR_GPM_FT2, "gpm/ft²", sources::METCALF_EDDY),
            );
            c.insert("surface_area_ft2".into(), criterion(area, "ft²", sources::METCALF_EDDY));
            c.insert(
                "float_solids_pct".into(),
                criterion(super::stage::DAF_FLOAT_SOLIDS_PCT, "%", sources::METCALF_EDDY),
            );
        }
        StageKind::PrimaryClarifier => {
            c.insert(
                "surface_overflow_gpd_ft2".into(),
                criterion(PRIMARY_SOR, "gpd/ft²", sources::TEN_STATES),
            );
            c.insert(
                "surface_area_ft2".into(),
                criterion(flow * 1.0e6 / PRIMARY_SOR, "ft²", sources::TEN_STATES),
            );
            c.insert(
                "sludge_solids_pct".into(),
                criterion(super::stage::PRIMARY_SLUDGE_SOLIDS_PCT, "%", sources::METCALF_EDDY),
            );
        }
        StageKind::ActivatedSludge => {
            let volume_gal = flow * 1.0e6 * AERATION_HRT_H / 24.0;
            let bod_removed = s.influent.load(WwParam::Bod) - s.effluent.load(WwParam::Bod);
            let tkn_removed = s.influent.load(WwParam::Tkn) - s.effluent.load(WwParam::Tkn);
            let o2 = O2_PER_BOD * bod_removed + O2_PER_TKN * tkn_removed;
            c.insert(
                "hrt_hours".into(),
                criterion(AERATION_HRT_H, "h", sources::METCALF_EDDY),
            );
            c.insert(
                "volume_m3".into(),
                criterion(volume_gal / GAL_PER_M3, "m³", sources::METCALF_EDDY),
            );
            c.insert(
                "oxygen_demand_lb_per_day".into(),
                criterion(o2, "lb O2/day", sources::METCALF_EDDY),
            );
            c.insert(
                "was_yield".into(),
                criterion(super::stage::WAS_YIELD, "lb VSS/lb BOD", sources::METCALF_EDDY),
            );
        }
        StageKind::TertiaryFilter => {
            c.insert(
                "surface_area_ft2".into(),
                criterion(mgd_to_gpm(peak) / FILTER_HLR_GPM_FT2, "ft²", sources::TEN_STATES),
            );
        }
        StageKind::Disinfection => {
            c.insert("uv_dose_mj_cm2".into(), criterion(UV_DOSE_MJ_CM2, "mJ/cm²", sources::WEF_MOP8));
        }
        StageKind::SludgeDigester => {
            let feed_m3 = flow * 1.0e6 / GAL_PER_M3;
            let destroyed_kg =
                (s.influent.load(WwParam::Vss) - s.effluent.load(WwParam::Vss)) * KG_PER_LB;
            let d = &config.digestion;
            let ch4 = destroyed_kg * d.gas_yield_override.unwrap_or(d.sludge_bmp);
            let ch4_fraction = d.ch4_fraction_for(FeedCharacter::SludgeOnly);
            let biogas = if ch4_fraction > 0.0 { ch4 / ch4_fraction } else { 0.0 };
            c.insert(
                "hrt_days".into(),
                criterion(d.sludge_hrt_days, "d", sources::WEF_MOP16),
            );
            c.insert(
                "volume_m3".into(),
                criterion(feed_m3 * d.sludge_hrt_days, "m³", sources::WEF_MOP16),
            );
            c.insert(
                "mixing_power_w_per_m3".into(),
                criterion(d.mixing_w_per_m3, "W/m³", sources::WEF_MOP16),
            );
            c.insert(
                "vs_destruction_pct".into(),
                criterion(
                    d.vs_destruction_for(FeedCharacter::SludgeOnly) * 100.0,
                    "%",
                    sources::WEF_MOP16,
                ),
            );
            c.insert(
                "biogas_m3_per_day".into(),
                criterion(biogas, "m³/d", sources::WEF_MOP16),
            );
            c.insert(
                "biogas_scfm".into(),
                criterion(m3_per_day_to_scfm(biogas), "SCFM", sources::WEF_MOP16),
            );
        }
        StageKind::Thickening | StageKind::Dewatering => {
            let target = if kind == StageKind::Thickening {
                config.solids.thickened_solids_pct
            } else {
                config.solids.cake_solids_pct
            };
            c.insert(
                "feed_gpm".into(),
                criterion(mgd_to_gpm(flow), "gpm", sources::PLANT_PRACTICE),
            );
            c.insert(
                "solids_capture_pct".into(),
                criterion(config.solids.capture_pct, "%", sources::WEF_MOP8),
            );
            c.insert(
                "product_solids_pct".into(),
                criterion(target, "%", sources::WEF_MOP8),
            );
            c.insert(
                "dry_solids_kg_per_day".into(),
                criterion(s.underflow.load(WwParam::Tss) * KG_PER_LB, "kg/d", sources::WEF_MOP8),
            );
        }
    }
    c
}

fn stage_notes(kind: StageKind, recycles_in: usize) -> Vec<String> {
    let mut notes = Vec::new();
    if recycles_in > 0 {
        notes.push(format!("Receives {} recycle stream(s)", recycles_in));
    }
    match kind {
        StageKind::Preliminary => notes.push("Screenings and grit hauled to landfill".into()),
        StageKind::TertiaryFilter => notes.push("Backwash returned ahead of secondary treatment is not tracked".into()),
        StageKind::ActivatedSludge => notes.push("Nitrified nitrogen assumed fully denitrified".into()),
        _ => {}
    }
    notes
}
