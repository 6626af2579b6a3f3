//! Anaerobic digestion and gas train.
//!
//! A [`DigestionTrain`] either digests a blended feed (trucked feedstocks,
//! wastewater sludge, or both) through nine ordered stages, or, for bolt-on
//! projects, takes an existing biogas stream straight to conditioning and
//! upgrading.

use crate::config::{FeedCharacter, SimulationConfig, defaults};
use crate::error::{ProcessError, ProcessResult, check_capacity};
use crate::gas::{
    Biogas, FLARE_SAFETY_FACTOR, UpgradingResult, conditioning_criteria, flare_criteria, upgrade,
    upgrading_criteria,
};
use crate::stream::{DesignCriteria, ProcessStream, criterion, sources};
use crate::wastewater::SludgeSummary;
use bf_core::constants::{BIOGAS_DENSITY_KG_PER_M3, KG_PER_SHORT_TON, SECONDS_PER_DAY};
use bf_core::{Diagnostic, DiagnosticKind, ensure_non_negative, m3_per_day_to_scfm};
use bf_feedstock::ParsedFeedstock;
use serde::Serialize;
use tracing::{debug, info};

/// Reject stream solids content after depackaging/screening.
pub const REJECTS_SOLIDS_PCT: f64 = 50.0;
pub const RECEIVING_STORAGE_DAYS: f64 = 2.0;
pub const EQUALIZATION_DAYS: f64 = 1.0;
/// Wet tons per delivery truck.
pub const TRUCK_PAYLOAD_TONS: f64 = 20.0;
/// Water specific heat, kJ/kg·K.
const CP_WATER: f64 = 4.186;
/// Shell and piping losses on top of feed heating.
const HEAT_LOSS_FACTOR: f64 = 1.15;
/// Filtrate TSS removed in liquid cleanup.
pub const FILTRATE_TSS_REMOVAL: f64 = 0.90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    Trucked,
    Sludge,
}

/// One digester feed contribution, per day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedComponent {
    pub name: String,
    pub source: FeedSource,
    pub wet_kg_per_day: f64,
    pub ts_kg_per_day: f64,
    pub vs_kg_per_day: f64,
    pub inert_kg_per_day: f64,
    pub tkn_kg_per_day: f64,
    /// m³ CH4 per kg VS destroyed.
    pub bmp: f64,
    pub packaged: bool,
}

impl FeedComponent {
    pub fn from_feedstock(f: &ParsedFeedstock) -> Self {
        Self {
            name: f.name.clone(),
            source: FeedSource::Trucked,
            wet_kg_per_day: f.wet_kg_per_day(),
            ts_kg_per_day: f.ts_kg_per_day(),
            vs_kg_per_day: f.vs_kg_per_day(),
            inert_kg_per_day: f.inert_kg_per_day(),
            tkn_kg_per_day: f.tkn_kg_per_day(),
            bmp: f.bmp,
            packaged: f.packaged,
        }
    }

    pub fn from_sludge(s: &SludgeSummary, bmp: f64) -> Self {
        Self {
            name: "Thickened wastewater sludge".to_string(),
            source: FeedSource::Sludge,
            wet_kg_per_day: s.wet_m3_per_day * 1_000.0,
            ts_kg_per_day: s.dry_solids_kg_per_day,
            vs_kg_per_day: s.vs_kg_per_day,
            inert_kg_per_day: 0.0,
            tkn_kg_per_day: s.tkn_kg_per_day,
            bmp,
            packaged: false,
        }
    }

    /// Rejects never exceed the fixed (non-volatile) solids.
    fn rejects_kg_per_day(&self) -> f64 {
        let fixed = (self.ts_kg_per_day - self.vs_kg_per_day).max(0.0);
        self.inert_kg_per_day.clamp(0.0, fixed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdStageKind {
    Receiving,
    Preparation,
    Equalization,
    Digestion,
    Dewatering,
    LiquidCleanup,
    GasConditioning,
    GasUpgrading,
    EmergencyGasManagement,
}

impl AdStageKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Receiving => "Feedstock Receiving",
            Self::Preparation => "Feedstock Preparation",
            Self::Equalization => "Equalization & Blending",
            Self::Digestion => "Anaerobic Digestion",
            Self::Dewatering => "Digestate Dewatering",
            Self::LiquidCleanup => "Liquid Cleanup",
            Self::GasConditioning => "Biogas Conditioning",
            Self::GasUpgrading => "Biogas Upgrading",
            Self::EmergencyGasManagement => "Emergency Gas Management",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdProcessStage {
    pub name: String,
    pub kind: AdStageKind,
    pub input: ProcessStream,
    pub output: ProcessStream,
    pub design_criteria: DesignCriteria,
    pub notes: Vec<String>,
}

impl AdProcessStage {
    fn new(kind: AdStageKind, input: ProcessStream, output: ProcessStream) -> Self {
        Self {
            name: kind.label().to_string(),
            kind,
            input,
            output,
            design_criteria: DesignCriteria::new(),
            notes: Vec::new(),
        }
    }

    fn criteria(mut self, criteria: DesignCriteria) -> Self {
        self.design_criteria = criteria;
        self
    }

    fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Daily solids and water balance at one point of the train.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SolidsBalance {
    pub wet_kg_per_day: f64,
    pub ts_kg_per_day: f64,
    pub vs_kg_per_day: f64,
    pub tkn_kg_per_day: f64,
}

impl SolidsBalance {
    fn stream(&self) -> ProcessStream {
        ProcessStream::new()
            .with("wet_mass", self.wet_kg_per_day / KG_PER_SHORT_TON, "tons/day")
            .with("flow", self.wet_kg_per_day / 1_000.0, "m³/d")
            .with("total_solids", self.ts_kg_per_day, "kg/d")
            .with("volatile_solids", self.vs_kg_per_day, "kg/d")
            .with("ts_pct", self.ts_pct(), "%")
            .with("tkn", self.tkn_kg_per_day, "kg/d")
    }

    pub fn ts_pct(&self) -> f64 {
        if self.wet_kg_per_day > 0.0 {
            self.ts_kg_per_day / self.wet_kg_per_day * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DigesterSizing {
    pub volume_m3: f64,
    pub hrt_days: f64,
    /// kg VS per m³ per day at the sized volume.
    pub olr: f64,
    pub temperature_c: f64,
    pub mixing_kw: f64,
    pub heating_kw: f64,
    /// True when the organic loading limit, not HRT, set the volume.
    pub olr_governed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestionOutcome {
    pub stages: Vec<AdProcessStage>,
    pub feed_character: Option<FeedCharacter>,
    /// As received, before preparation.
    pub feed: SolidsBalance,
    pub rejects_kg_per_day: f64,
    pub dilution_m3_per_day: f64,
    pub vs_destruction: f64,
    pub vs_destroyed_kg_per_day: f64,
    pub ch4_m3_per_day: f64,
    pub digester: Option<DigesterSizing>,
    pub cake: Option<SolidsBalance>,
    pub filtrate: Option<SolidsBalance>,
    pub raw_biogas: Biogas,
    pub conditioned_biogas: Biogas,
    pub upgrading: UpgradingResult,
    pub flare_capacity_scfm: f64,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq)]
enum GasSource {
    Digestion(Vec<FeedComponent>),
    Existing(Biogas),
}

/// Composable digestion/gas stage component.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestionTrain {
    source: GasSource,
    pipeline_psig: Option<f64>,
}

impl DigestionTrain {
    pub fn digest(feed: Vec<FeedComponent>) -> Self {
        Self {
            source: GasSource::Digestion(feed),
            pipeline_psig: None,
        }
    }

    /// Bolt-on: upgrade an existing biogas stream, no digestion.
    pub fn existing_biogas(gas: Biogas) -> Self {
        Self {
            source: GasSource::Existing(gas),
            pipeline_psig: None,
        }
    }

    pub fn with_pipeline_pressure(mut self, psig: Option<f64>) -> Self {
        self.pipeline_psig = psig;
        self
    }

    pub fn run(&self, config: &SimulationConfig) -> ProcessResult<DigestionOutcome> {
        match &self.source {
            GasSource::Digestion(feed) => self.run_digestion(feed, config),
            GasSource::Existing(gas) => self.run_bolt_on(gas),
        }
    }

    fn run_bolt_on(&self, raw: &Biogas) -> ProcessResult<DigestionOutcome> {
        check_capacity(raw.scfm)?;
        let (mut stages, conditioned, upgrading, flare) = self.gas_stages(raw)?;
        if let Some(first) = stages.first_mut() {
            first.notes.push("Fed by existing on-site biogas".to_string());
        }
        info!(scfm = raw.scfm, rng_scfm = upgrading.rng_scfm, "bolt-on gas train");
        Ok(DigestionOutcome {
            stages,
            feed_character: None,
            feed: SolidsBalance::default(),
            rejects_kg_per_day: 0.0,
            dilution_m3_per_day: 0.0,
            vs_destruction: 0.0,
            vs_destroyed_kg_per_day: 0.0,
            ch4_m3_per_day: raw.m3_per_day() * raw.ch4_pct / 100.0,
            digester: None,
            cake: None,
            filtrate: None,
            raw_biogas: *raw,
            conditioned_biogas: conditioned,
            upgrading,
            flare_capacity_scfm: flare,
            diagnostics: Vec::new(),
        })
    }

    fn run_digestion(
        &self,
        feed: &[FeedComponent],
        config: &SimulationConfig,
    ) -> ProcessResult<DigestionOutcome> {
        let d = &config.digestion;
        let received = SolidsBalance {
            wet_kg_per_day: feed.iter().map(|c| c.wet_kg_per_day).sum(),
            ts_kg_per_day: feed.iter().map(|c| c.ts_kg_per_day).sum(),
            vs_kg_per_day: feed.iter().map(|c| c.vs_kg_per_day).sum(),
            tkn_kg_per_day: feed.iter().map(|c| c.tkn_kg_per_day).sum(),
        };
        if received.wet_kg_per_day <= 0.0 || received.vs_kg_per_day <= 0.0 {
            return Err(ProcessError::InvalidInput {
                what: "digester feed carries no volatile solids".to_string(),
            });
        }

        let has_trucked = feed.iter().any(|c| c.source == FeedSource::Trucked);
        let has_sludge = feed.iter().any(|c| c.source == FeedSource::Sludge);
        let character = FeedCharacter::classify(has_trucked, has_sludge);
        let mut diagnostics = Vec::new();

        // Receiving
        let trucked_tpd: f64 = feed
            .iter()
            .filter(|c| c.source == FeedSource::Trucked)
            .map(|c| c.wet_kg_per_day / KG_PER_SHORT_TON)
            .sum();
        let mut rc = DesignCriteria::new();
        rc.insert(
            "storage_days".into(),
            criterion(RECEIVING_STORAGE_DAYS, "d", sources::PLANT_PRACTICE),
        );
        rc.insert(
            "storage_volume_m3".into(),
            criterion(
                received.wet_kg_per_day / 1_000.0 * RECEIVING_STORAGE_DAYS,
                "m³",
                sources::PLANT_PRACTICE,
            ),
        );
        rc.insert(
            "truck_deliveries_per_day".into(),
            criterion(
                (trucked_tpd / TRUCK_PAYLOAD_TONS).ceil(),
                "trucks/d",
                sources::PLANT_PRACTICE,
            ),
        );
        let mut receiving = AdProcessStage::new(
            AdStageKind::Receiving,
            received.stream(),
            received.stream(),
        )
        .criteria(rc);
        for c in feed {
            receiving.notes.push(format!(
                "{}: {:.1} wet tons/day",
                c.name,
                c.wet_kg_per_day / KG_PER_SHORT_TON
            ));
        }

        // Preparation
        let rejects: f64 = feed.iter().map(FeedComponent::rejects_kg_per_day).sum();
        let rejects_wet = rejects / (REJECTS_SOLIDS_PCT / 100.0);
        let prepared = SolidsBalance {
            wet_kg_per_day: (received.wet_kg_per_day - rejects_wet).max(received.ts_kg_per_day - rejects),
            ts_kg_per_day: received.ts_kg_per_day - rejects,
            ..received
        };
        let packaged = feed.iter().any(|c| c.packaged);
        let mut pc = DesignCriteria::new();
        pc.insert(
            "rejects_kg_per_day".into(),
            criterion(rejects, "kg/d", sources::PLANT_PRACTICE),
        );
        pc.insert(
            "depackaging_required".into(),
            criterion(if packaged { 1.0 } else { 0.0 }, "-", sources::INTAKE),
        );
        pc.insert(
            "particle_size_mm".into(),
            criterion(12.0, "mm", sources::PLANT_PRACTICE),
        );
        let mut preparation =
            AdProcessStage::new(AdStageKind::Preparation, received.stream(), prepared.stream())
                .criteria(pc);
        if packaged {
            preparation = preparation.note("Depackaging line for packaged feedstocks");
        }

        // Equalization and dilution to a pumpable blend
        let max_ts = d.max_feed_ts_pct / 100.0;
        let dilution_kg = if prepared.ts_pct() > d.max_feed_ts_pct && max_ts > 0.0 {
            prepared.ts_kg_per_day / max_ts - prepared.wet_kg_per_day
        } else {
            0.0
        };
        let blended = SolidsBalance {
            wet_kg_per_day: prepared.wet_kg_per_day + dilution_kg,
            ..prepared
        };
        if dilution_kg > 0.0 {
            diagnostics.push(
                Diagnostic::info(
                    DiagnosticKind::Sizing,
                    format!(
                        "Blend diluted from {:.1}% to {:.1}% TS with {:.0} m³/d water",
                        prepared.ts_pct(),
                        d.max_feed_ts_pct,
                        dilution_kg / 1_000.0
                    ),
                )
                .with_field("equalization"),
            );
        }
        let feed_m3 = blended.wet_kg_per_day / 1_000.0;
        let mut ec = DesignCriteria::new();
        ec.insert(
            "max_feed_ts_pct".into(),
            criterion(d.max_feed_ts_pct, "%", sources::WEF_MOP16),
        );
        ec.insert(
            "dilution_m3_per_day".into(),
            criterion(dilution_kg / 1_000.0, "m³/d", sources::WEF_MOP16),
        );
        ec.insert(
            "volume_m3".into(),
            criterion(feed_m3 * EQUALIZATION_DAYS, "m³", sources::PLANT_PRACTICE),
        );
        let equalization =
            AdProcessStage::new(AdStageKind::Equalization, prepared.stream(), blended.stream())
                .criteria(ec);

        // Digestion
        let vs_destruction = d.vs_destruction_for(character);
        let ch4_fraction = d.ch4_fraction_for(character);
        let vs_destroyed =
            ensure_non_negative(blended.vs_kg_per_day * vs_destruction, "VS destroyed")?;
        let ch4_m3: f64 = feed
            .iter()
            .map(|c| d.gas_yield_override.unwrap_or(c.bmp) * c.vs_kg_per_day * vs_destruction)
            .sum();
        let biogas_m3 = if ch4_fraction > 0.0 { ch4_m3 / ch4_fraction } else { 0.0 };
        let raw = raw_biogas(biogas_m3, ch4_fraction, config);
        debug!(
            vs_destroyed,
            ch4_m3,
            biogas_scfm = raw.scfm,
            ?character,
            "digestion balance"
        );
        check_capacity(raw.scfm)?;

        let hrt_volume = d.hrt_days * feed_m3;
        let olr_volume = if d.olr_target > 0.0 {
            blended.vs_kg_per_day / d.olr_target
        } else {
            0.0
        };
        let volume = ensure_non_negative(hrt_volume.max(olr_volume), "digester volume")?;
        let delta_t = (d.digester_temp_c - config.ambient_temp_c).max(0.0);
        let sizing = DigesterSizing {
            volume_m3: volume,
            hrt_days: if feed_m3 > 0.0 { volume / feed_m3 } else { 0.0 },
            olr: if volume > 0.0 { blended.vs_kg_per_day / volume } else { 0.0 },
            temperature_c: d.digester_temp_c,
            mixing_kw: d.mixing_w_per_m3 * volume / 1_000.0,
            heating_kw: blended.wet_kg_per_day * CP_WATER * delta_t / SECONDS_PER_DAY
                * HEAT_LOSS_FACTOR,
            olr_governed: olr_volume > hrt_volume,
        };
        let biogas_kg = biogas_m3 * BIOGAS_DENSITY_KG_PER_M3;
        let digestate = SolidsBalance {
            wet_kg_per_day: (blended.wet_kg_per_day - biogas_kg).max(0.0),
            ts_kg_per_day: (blended.ts_kg_per_day - vs_destroyed).max(0.0),
            vs_kg_per_day: (blended.vs_kg_per_day - vs_destroyed).max(0.0),
            tkn_kg_per_day: blended.tkn_kg_per_day,
        };
        let digestion = AdProcessStage::new(
            AdStageKind::Digestion,
            blended.stream(),
            digestate.stream().with("biogas", biogas_m3, "m³/d"),
        )
        .criteria(digestion_criteria(&sizing, vs_destruction, ch4_fraction, d.hrt_days, d.olr_target, config))
        .note(format!("Feed character: {:?}", character));

        // Dewatering; mass closes against digestate, which already lost the biogas mass.
        let capture = (config.solids.capture_pct / 100.0).clamp(0.0, 1.0);
        let cake_ts = digestate.ts_kg_per_day * capture;
        let cake_wet = (cake_ts / (config.solids.cake_solids_pct / 100.0)).min(digestate.wet_kg_per_day);
        let water_share = if digestate.wet_kg_per_day > 0.0 {
            cake_wet / digestate.wet_kg_per_day
        } else {
            0.0
        };
        let cake = SolidsBalance {
            wet_kg_per_day: cake_wet,
            ts_kg_per_day: cake_ts,
            vs_kg_per_day: digestate.vs_kg_per_day * capture,
            tkn_kg_per_day: digestate.tkn_kg_per_day * water_share,
        };
        let filtrate = SolidsBalance {
            wet_kg_per_day: digestate.wet_kg_per_day - cake.wet_kg_per_day,
            ts_kg_per_day: digestate.ts_kg_per_day - cake.ts_kg_per_day,
            vs_kg_per_day: digestate.vs_kg_per_day - cake.vs_kg_per_day,
            tkn_kg_per_day: digestate.tkn_kg_per_day - cake.tkn_kg_per_day,
        };
        let mut dc = DesignCriteria::new();
        dc.insert(
            "cake_solids_pct".into(),
            criterion(config.solids.cake_solids_pct, "%", criteria_source(config, "cake_solids_pct")),
        );
        dc.insert(
            "solids_capture_pct".into(),
            criterion(config.solids.capture_pct, "%", criteria_source(config, "capture_efficiency_pct")),
        );
        dc.insert(
            "feed_m3_per_day".into(),
            criterion(digestate.wet_kg_per_day / 1_000.0, "m³/d", sources::PLANT_PRACTICE),
        );
        dc.insert(
            "cake_tons_per_day".into(),
            criterion(cake.wet_kg_per_day / KG_PER_SHORT_TON, "tons/d", sources::PLANT_PRACTICE),
        );
        let dewatering = AdProcessStage::new(
            AdStageKind::Dewatering,
            digestate.stream(),
            cake.stream().with("filtrate_flow", filtrate.wet_kg_per_day / 1_000.0, "m³/d"),
        )
        .criteria(dc);

        // Liquid cleanup
        let treated = SolidsBalance {
            ts_kg_per_day: filtrate.ts_kg_per_day * (1.0 - FILTRATE_TSS_REMOVAL),
            vs_kg_per_day: filtrate.vs_kg_per_day * (1.0 - FILTRATE_TSS_REMOVAL),
            ..filtrate
        };
        let mut lc = DesignCriteria::new();
        lc.insert(
            "filtrate_m3_per_day".into(),
            criterion(filtrate.wet_kg_per_day / 1_000.0, "m³/d", sources::PLANT_PRACTICE),
        );
        lc.insert(
            "tss_removal_pct".into(),
            criterion(FILTRATE_TSS_REMOVAL * 100.0, "%", sources::METCALF_EDDY),
        );
        lc.insert(
            "tkn_kg_per_day".into(),
            criterion(filtrate.tkn_kg_per_day, "kg/d", sources::PLANT_PRACTICE),
        );
        let liquid = AdProcessStage::new(
            AdStageKind::LiquidCleanup,
            filtrate.stream(),
            treated.stream(),
        )
        .criteria(lc)
        .note("Treated filtrate discharged to sewer or land applied");

        let (gas_stages, conditioned, upgrading, flare) = self.gas_stages(&raw)?;
        let mut stages = vec![receiving, preparation, equalization, digestion, dewatering, liquid];
        stages.extend(gas_stages);

        info!(
            feed_tpd = received.wet_kg_per_day / KG_PER_SHORT_TON,
            biogas_scfm = raw.scfm,
            rng_scfm = upgrading.rng_scfm,
            volume_m3 = sizing.volume_m3,
            "digestion train"
        );

        Ok(DigestionOutcome {
            stages,
            feed_character: Some(character),
            feed: received,
            rejects_kg_per_day: rejects,
            dilution_m3_per_day: dilution_kg / 1_000.0,
            vs_destruction,
            vs_destroyed_kg_per_day: vs_destroyed,
            ch4_m3_per_day: ch4_m3,
            digester: Some(sizing),
            cake: Some(cake),
            filtrate: Some(filtrate),
            raw_biogas: raw,
            conditioned_biogas: conditioned,
            upgrading,
            flare_capacity_scfm: flare,
            diagnostics,
        })
    }

    /// Conditioning, upgrading and flare; shared by both sources.
    fn gas_stages(
        &self,
        raw: &Biogas,
    ) -> ProcessResult<(Vec<AdProcessStage>, Biogas, UpgradingResult, f64)> {
        let conditioned = raw.conditioned();
        let upgrading = upgrade(&conditioned, self.pipeline_psig)?;
        let flare = raw.scfm * FLARE_SAFETY_FACTOR;

        let conditioning = AdProcessStage::new(
            AdStageKind::GasConditioning,
            raw.stream(),
            conditioned.stream(),
        )
        .criteria(conditioning_criteria(raw));

        let rng = ProcessStream::new()
            .with("rng_flow", upgrading.rng_scfm, "SCFM")
            .with("rng_energy", upgrading.rng_mmbtu_per_day, "MMBtu/d")
            .with("ch4", upgrading.tier.product_purity_pct, "%")
            .with("pressure", upgrading.delivery_psig, "psig")
            .with("tail_gas_flow", upgrading.tail_gas_scfm, "SCFM");
        let upgrading_stage =
            AdProcessStage::new(AdStageKind::GasUpgrading, conditioned.stream(), rng)
                .criteria(upgrading_criteria(&upgrading, conditioned.scfm))
                .note(upgrading.tier.technology);

        let emergency = AdProcessStage::new(
            AdStageKind::EmergencyGasManagement,
            raw.stream(),
            ProcessStream::new().with("flare_capacity", flare, "SCFM"),
        )
        .criteria(flare_criteria(raw.scfm))
        .note("Enclosed flare for upset and maintenance periods");

        Ok((
            vec![conditioning, upgrading_stage, emergency],
            conditioned,
            upgrading,
            flare,
        ))
    }
}

/// Raw digester gas at the given CH4 fraction; CO2 takes the balance after
/// trace H2S, N2 and O2.
fn raw_biogas(biogas_m3_per_day: f64, ch4_fraction: f64, config: &SimulationConfig) -> Biogas {
    let d = &config.digestion;
    let ch4_pct = ch4_fraction * 100.0;
    let h2s_pct = d.h2s_ppmv / 1.0e4;
    let co2_pct = d
        .co2_pct_override
        .unwrap_or(100.0 - ch4_pct - h2s_pct - defaults::N2_PCT - defaults::O2_PCT)
        .max(0.0);
    Biogas {
        scfm: m3_per_day_to_scfm(biogas_m3_per_day),
        ch4_pct,
        co2_pct,
        h2s_ppmv: d.h2s_ppmv,
        moisture_pct: d.moisture_pct,
        siloxane_mg_m3: d.siloxane_mg_m3,
    }
}

/// Biogas from an existing source; missing composition is filled from the
/// configuration.
pub fn existing_biogas(
    scfm: f64,
    ch4_pct: Option<f64>,
    co2_pct: Option<f64>,
    h2s_ppmv: Option<f64>,
    config: &SimulationConfig,
) -> Biogas {
    let d = &config.digestion;
    let ch4 = ch4_pct.unwrap_or(d.ch4_fraction_for(FeedCharacter::TruckedOnly) * 100.0);
    let h2s = h2s_ppmv.unwrap_or(d.h2s_ppmv);
    let co2 = co2_pct
        .or(d.co2_pct_override)
        .unwrap_or(100.0 - ch4 - h2s / 1.0e4 - defaults::N2_PCT - defaults::O2_PCT)
        .max(0.0);
    Biogas {
        scfm,
        ch4_pct: ch4,
        co2_pct: co2,
        h2s_ppmv: h2s,
        moisture_pct: d.moisture_pct,
        siloxane_mg_m3: d.siloxane_mg_m3,
    }
}

fn criteria_source(config: &SimulationConfig, field: &str) -> &'static str {
    if config.is_overridden(field) {
        sources::OVERRIDE
    } else {
        sources::WEF_MOP16
    }
}

fn digestion_criteria(
    sizing: &DigesterSizing,
    vs_destruction: f64,
    ch4_fraction: f64,
    hrt_target: f64,
    olr_target: f64,
    config: &SimulationConfig,
) -> DesignCriteria {
    let mut c = DesignCriteria::new();
    c.insert(
        "hrt_target_days".into(),
        criterion(hrt_target, "d", criteria_source(config, "hrt_days")),
    );
    c.insert(
        "olr_target".into(),
        criterion(olr_target, "kg VS/m³·d", criteria_source(config, "olr_target")),
    );
    c.insert("volume_m3".into(), criterion(sizing.volume_m3, "m³", sources::WEF_MOP16));
    c.insert("hrt_days".into(), criterion(sizing.hrt_days, "d", sources::WEF_MOP16));
    c.insert("olr".into(), criterion(sizing.olr, "kg VS/m³·d", sources::WEF_MOP16));
    c.insert(
        "vs_destruction_pct".into(),
        criterion(vs_destruction * 100.0, "%", criteria_source(config, "vs_destruction_pct")),
    );
    c.insert(
        "ch4_pct".into(),
        criterion(ch4_fraction * 100.0, "%", criteria_source(config, "ch4_pct")),
    );
    c.insert(
        "temperature_c".into(),
        criterion(sizing.temperature_c, "°C", criteria_source(config, "digester_temp_c")),
    );
    c.insert(
        "mixing_kw".into(),
        criterion(sizing.mixing_kw, "kW", criteria_source(config, "mixing_power_w_per_m3")),
    );
    c.insert("heating_kw".into(), criterion(sizing.heating_kw, "kW", sources::WEF_MOP16));
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_intake::ProjectType;

    fn potato() -> FeedComponent {
        // 100,000 tons/year at 15% TS, 87% VS/TS.
        let wet = 100_000.0 * KG_PER_SHORT_TON / 365.0;
        FeedComponent {
            name: "Potato waste".into(),
            source: FeedSource::Trucked,
            wet_kg_per_day: wet,
            ts_kg_per_day: wet * 0.15,
            vs_kg_per_day: wet * 0.15 * 0.87,
            inert_kg_per_day: wet * 0.15 * 0.03,
            tkn_kg_per_day: wet * 0.003,
            bmp: 0.30,
            packaged: false,
        }
    }

    #[test]
    fn greenfield_biogas_and_nine_stages() {
        let cfg = SimulationConfig::for_project(ProjectType::Greenfield);
        let out = DigestionTrain::digest(vec![potato()]).run(&cfg).unwrap();
        assert_eq!(out.stages.len(), 9);
        assert_eq!(out.stages[0].kind, AdStageKind::Receiving);
        assert_eq!(out.stages[8].kind, AdStageKind::EmergencyGasManagement);
        assert_eq!(out.feed_character, Some(FeedCharacter::TruckedOnly));
        assert!((out.raw_biogas.scfm - 230.7).abs() < 0.5);
        assert!((out.flare_capacity_scfm - 1.10 * out.raw_biogas.scfm).abs() < 1e-9);
        assert!(out.upgrading.rng_scfm > 0.0);
        assert!(out.upgrading.rng_mmbtu_per_day > 0.0);
    }

    #[test]
    fn digester_volume_takes_governing_limit() {
        let cfg = SimulationConfig::for_project(ProjectType::Greenfield);
        let out = DigestionTrain::digest(vec![potato()]).run(&cfg).unwrap();
        let sizing = out.digester.unwrap();
        let vs = potato().vs_kg_per_day;
        assert!(sizing.volume_m3 >= vs / 3.0 - 1e-6);
        assert!(sizing.olr <= 3.0 + 1e-9);
        assert!(sizing.hrt_days >= 25.0 - 1e-9);
    }

    #[test]
    fn dewatering_closes_mass_after_biogas() {
        let cfg = SimulationConfig::for_project(ProjectType::Greenfield);
        let out = DigestionTrain::digest(vec![potato()]).run(&cfg).unwrap();
        let cake = out.cake.unwrap();
        let filtrate = out.filtrate.unwrap();
        let biogas_kg = out.raw_biogas.m3_per_day() * BIOGAS_DENSITY_KG_PER_M3;
        let rejects_wet = out.rejects_kg_per_day / (REJECTS_SOLIDS_PCT / 100.0);
        let into_digester = out.feed.wet_kg_per_day - rejects_wet + out.dilution_m3_per_day * 1_000.0;
        let leaving = cake.wet_kg_per_day + filtrate.wet_kg_per_day + biogas_kg;
        assert!((into_digester - leaving).abs() / into_digester < 1e-6);
    }

    #[test]
    fn overrides_reach_the_balance() {
        let base = SimulationConfig::for_project(ProjectType::Greenfield);
        let cfg = base.clone().with_overrides(&bf_intake::DesignOverrides {
            gas_yield_m3_per_kg_vs: Some(0.15),
            ..Default::default()
        });
        let a = DigestionTrain::digest(vec![potato()]).run(&base).unwrap();
        let b = DigestionTrain::digest(vec![potato()]).run(&cfg).unwrap();
        assert!((b.ch4_m3_per_day - a.ch4_m3_per_day / 2.0).abs() < 1e-6);
    }

    #[test]
    fn over_capacity_digestion_is_an_error() {
        let cfg = SimulationConfig::for_project(ProjectType::Greenfield);
        let mut big = potato();
        for v in [
            &mut big.wet_kg_per_day,
            &mut big.ts_kg_per_day,
            &mut big.vs_kg_per_day,
        ] {
            *v *= 10.0;
        }
        let err = DigestionTrain::digest(vec![big]).run(&cfg).unwrap_err();
        assert!(matches!(err, ProcessError::CapacityExceeded { .. }));
    }

    #[test]
    fn bolt_on_has_three_stages() {
        let cfg = SimulationConfig::for_project(ProjectType::BoltOn);
        let gas = existing_biogas(800.0, Some(60.0), Some(38.0), Some(1_500.0), &cfg);
        let out = DigestionTrain::existing_biogas(gas).run(&cfg).unwrap();
        assert_eq!(out.stages.len(), 3);
        assert!(out.digester.is_none());
        assert_eq!(out.upgrading.tier.max_scfm, 800.0);

        let gas = existing_biogas(1_300.0, Some(60.0), None, None, &cfg);
        assert!(matches!(
            DigestionTrain::existing_biogas(gas).run(&cfg),
            Err(ProcessError::CapacityExceeded { .. })
        ));
    }
}
