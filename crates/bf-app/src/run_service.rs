//! Project-type orchestration.
//!
//! One run validates the intake, snapshots the configuration, composes the
//! wastewater and digestion trains the project type calls for, sizes the
//! equipment and assembles a [`MassBalanceResults`]. Runs share nothing, so
//! batches evaluate in parallel.

use std::collections::HashSet;
use std::path::Path;

use bf_core::{Diagnostic, DiagnosticKind, normalize_gas_flow};
use bf_equipment::build_equipment;
use bf_feedstock::{curated_library, parse_feedstocks};
use bf_intake::{DesignOverrides, IntakeRecord, ProjectType, validate_intake, validate_overrides};
use bf_process::{
    DigestionOutcome, DigestionTrain, FeedComponent, InfluentQuality, ProcessError,
    SimulationConfig, TemplateOptions, TrainTemplate, WastewaterOutcome, WastewaterTrain,
    build_template, existing_biogas,
};
use bf_results::{Assumption, MassBalanceResults, compute_run_id};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::assumptions::{gas_train_assumptions, wastewater_assumptions};
use crate::error::{AppError, AppResult};
use crate::summary::SummaryBuilder;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const METHODOLOGY_NOTICE: &str = "Deterministic engineering calculation: stage-by-stage mass \
     balance with literature design constants and tabulated vendor equipment tiers.";

/// One independent intake/override pair for batch evaluation.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub intake: IntakeRecord,
    pub overrides: DesignOverrides,
}

impl Scenario {
    pub fn new(intake: IntakeRecord) -> Self {
        Self {
            intake,
            overrides: DesignOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: DesignOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Trains produced by one dispatch, before equipment sizing.
#[derive(Default)]
struct Trains {
    wastewater: Option<(TrainTemplate, WastewaterOutcome)>,
    digestion: Option<DigestionOutcome>,
    diagnostics: Vec<Diagnostic>,
}

/// Run the deterministic mass balance for one intake.
pub fn run_mass_balance(
    intake: &IntakeRecord,
    overrides: &DesignOverrides,
) -> AppResult<MassBalanceResults> {
    validate_intake(intake)?;
    validate_overrides(overrides)?;

    let project_type = intake.project_type();
    let config = SimulationConfig::for_project(project_type)
        .with_ambient_temp(intake.location.as_ref().and_then(|l| l.mean_annual_temp_c))
        .with_overrides(overrides);
    info!(project = %intake.name, %project_type, overrides = config.overridden.len(), "mass balance started");

    let trains = match project_type {
        ProjectType::WastewaterOnly => wastewater_only(intake, &config)?,
        ProjectType::Greenfield => greenfield(intake, &config)?,
        ProjectType::BoltOn => bolt_on(intake, &config)?,
        ProjectType::Hybrid => hybrid(intake, &config)?,
    };

    let ww = trains.wastewater.as_ref().map(|(_, outcome)| outcome);
    let ad = trains.digestion.as_ref();
    let equipment = build_equipment(ww, ad, intake.constraints.max_digester_tank_m3)?;

    let mut warnings =
        vec![Diagnostic::info(DiagnosticKind::Methodology, METHODOLOGY_NOTICE)];
    warnings.extend(trains.diagnostics);
    if let Some(ww) = ww {
        warnings.extend(ww.diagnostics.iter().cloned());
    }
    if let Some(ad) = ad {
        warnings.extend(ad.diagnostics.iter().cloned());
    }
    warnings.extend(equipment.diagnostics.iter().cloned());

    let mut assumptions = Vec::new();
    if let Some((template, _)) = &trains.wastewater {
        let in_plant = *template == TrainTemplate::DigestAndDewater;
        assumptions.extend(wastewater_assumptions(&config, in_plant));
    }
    if let Some(ad) = ad {
        assumptions.extend(gas_train_assumptions(&config, ad.feed_character));
    }

    let mut summary = SummaryBuilder::new();
    if let Some(ww) = ww {
        summary = summary.wastewater(ww);
    }
    if let Some(ad) = ad {
        summary = summary.digestion(ad);
    }
    let summary = summary.equipment(&equipment).finish();

    // Trains without a wastewater loop finish in a single pass.
    let (iterations, converged) = ww.map_or((1, true), |w| (w.iterations, w.converged));
    let results = MassBalanceResults {
        run_id: compute_run_id(intake, overrides, ENGINE_VERSION),
        project_name: intake.name.clone(),
        project_type,
        stages: ww.map(|w| w.stages.clone()).unwrap_or_default(),
        ad_stages: ad.map(|a| a.stages.clone()).unwrap_or_default(),
        recycle_streams: ww.map(|w| w.recycle_streams.clone()).unwrap_or_default(),
        equipment: equipment.items,
        convergence_iterations: iterations,
        convergence_achieved: converged,
        assumptions: dedup_assumptions(assumptions),
        warnings,
        summary,
        engine_version: ENGINE_VERSION.to_string(),
    };
    info!(
        run_id = %results.run_id,
        stages = results.stages.len(),
        ad_stages = results.ad_stages.len(),
        equipment = results.equipment.len(),
        iterations,
        converged,
        "mass balance finished"
    );
    Ok(results)
}

/// Evaluate independent scenarios in parallel. Results keep input order.
pub fn run_batch(scenarios: &[Scenario]) -> Vec<AppResult<MassBalanceResults>> {
    info!(count = scenarios.len(), "batch started");
    scenarios
        .par_iter()
        .map(|s| run_mass_balance(&s.intake, &s.overrides))
        .collect()
}

/// Load an intake (and optional override snapshot) from disk and run it.
pub fn run_files(intake_path: &Path, overrides_path: Option<&Path>) -> AppResult<MassBalanceResults> {
    let intake = bf_intake::load_intake(intake_path).map_err(|source| AppError::IntakeLoad {
        path: intake_path.to_path_buf(),
        source,
    })?;
    let overrides = match overrides_path {
        Some(path) => bf_intake::load_overrides(path).map_err(|source| AppError::IntakeLoad {
            path: path.to_path_buf(),
            source,
        })?,
        None => DesignOverrides::default(),
    };
    run_mass_balance(&intake, &overrides)
}

fn wastewater_only(intake: &IntakeRecord, config: &SimulationConfig) -> AppResult<Trains> {
    let mut trains = Trains::default();
    let ww = run_wastewater(intake, TrainTemplate::DigestAndDewater, config, &mut trains.diagnostics)?;
    trains.wastewater = Some((TrainTemplate::DigestAndDewater, ww));
    Ok(trains)
}

fn greenfield(intake: &IntakeRecord, config: &SimulationConfig) -> AppResult<Trains> {
    let mut trains = Trains::default();
    let feed = trucked_feed(intake, &mut trains.diagnostics);
    if feed.is_empty() {
        return Err(AppError::InvalidInput(
            "greenfield project requires a positive total feedstock volume".to_string(),
        ));
    }
    trains.digestion = Some(digest(intake, feed, config)?);
    Ok(trains)
}

fn bolt_on(intake: &IntakeRecord, config: &SimulationConfig) -> AppResult<Trains> {
    let def = intake.existing_biogas.as_ref().ok_or_else(|| {
        AppError::InvalidInput("bolt-on project requires an existing biogas source".to_string())
    })?;
    let scfm = normalize_gas_flow(def.flow.value(), &def.unit);
    if scfm.is_nan() || scfm <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "existing biogas flow must be positive (got {} {})",
            scfm, def.unit
        )));
    }
    debug!(scfm, "existing biogas normalized");
    let gas = existing_biogas(scfm, def.ch4_pct, def.co2_pct, def.h2s_ppmv, config);
    let outcome = DigestionTrain::existing_biogas(gas)
        .with_pipeline_pressure(intake.output_requirements.rng_pipeline_pressure_psig)
        .run(config)?;
    Ok(Trains {
        digestion: Some(outcome),
        ..Trains::default()
    })
}

fn hybrid(intake: &IntakeRecord, config: &SimulationConfig) -> AppResult<Trains> {
    let mut trains = Trains::default();
    let ww = run_wastewater(
        intake,
        TrainTemplate::ThickenForCodigestion,
        config,
        &mut trains.diagnostics,
    )?;
    let mut feed = trucked_feed(intake, &mut trains.diagnostics);
    if !ww.sludge.is_empty() {
        feed.push(FeedComponent::from_sludge(&ww.sludge, config.digestion.sludge_bmp));
    }
    if feed.is_empty() {
        return Err(AppError::InvalidInput(
            "hybrid project has neither trucked feedstock volume nor wastewater sludge"
                .to_string(),
        ));
    }
    trains.digestion = Some(digest(intake, feed, config)?);
    trains.wastewater = Some((TrainTemplate::ThickenForCodigestion, ww));
    Ok(trains)
}

fn run_wastewater(
    intake: &IntakeRecord,
    template: TrainTemplate,
    config: &SimulationConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> AppResult<WastewaterOutcome> {
    let def = intake.wastewater.as_ref().ok_or_else(|| {
        AppError::InvalidInput(format!(
            "project type {} requires a wastewater influent",
            intake.project_type().code()
        ))
    })?;
    let (influent, fills) = InfluentQuality::from_intake(def)?;
    diagnostics.extend(fills);

    let options = TemplateOptions {
        include_daf: intake.constraints.include_daf,
        effluent_tss_target_mg_l: intake.output_requirements.effluent_tss_mg_l,
    };
    let train = build_template(template, &influent, &options).map_err(ProcessError::from)?;
    debug!(stages = train.stages().len(), recycles = train.recycles().len(), "stage train built");
    Ok(WastewaterTrain::new(train, influent).run(config))
}

/// Parse trucked feedstocks. Entries without a usable volume are dropped
/// with a warning; an empty result means no trucked feed at all.
fn trucked_feed(intake: &IntakeRecord, diagnostics: &mut Vec<Diagnostic>) -> Vec<FeedComponent> {
    let library = curated_library();
    let parsed = parse_feedstocks(&intake.feedstocks, &library);
    diagnostics.extend(parsed.diagnostics);

    let mut feed = Vec::with_capacity(parsed.feedstocks.len());
    for f in &parsed.feedstocks {
        if f.tons_per_year.is_finite() && f.tons_per_year > 0.0 {
            feed.push(FeedComponent::from_feedstock(f));
        } else {
            debug!(feedstock = %f.name, "feedstock skipped without volume");
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::Input,
                    format!("feedstock '{}' has no usable volume and was left out", f.name),
                )
                .with_field(format!("feedstocks.{}.volume", f.name)),
            );
        }
    }
    feed
}

fn digest(
    intake: &IntakeRecord,
    feed: Vec<FeedComponent>,
    config: &SimulationConfig,
) -> AppResult<DigestionOutcome> {
    let outcome = DigestionTrain::digest(feed)
        .with_pipeline_pressure(intake.output_requirements.rng_pipeline_pressure_psig)
        .run(config)?;
    Ok(outcome)
}

/// First entry wins when both trains cite the same constant.
fn dedup_assumptions(list: Vec<Assumption>) -> Vec<Assumption> {
    let mut seen = HashSet::new();
    list.into_iter()
        .filter(|a| seen.insert(a.parameter.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_intake::{ExistingBiogasDef, FeedstockEntry, NumericInput};

    fn bolt_on_intake(flow: f64) -> IntakeRecord {
        IntakeRecord {
            version: 1,
            name: "Bolt-on".into(),
            project_type: "C".into(),
            feedstocks: vec![],
            wastewater: None,
            existing_biogas: Some(ExistingBiogasDef {
                flow: flow.into(),
                unit: "SCFM".into(),
                ch4_pct: Some(60.0),
                co2_pct: None,
                h2s_ppmv: None,
            }),
            output_requirements: Default::default(),
            location: None,
            constraints: Default::default(),
        }
    }

    #[test]
    fn methodology_notice_leads_the_warnings() {
        let r = run_mass_balance(&bolt_on_intake(300.0), &DesignOverrides::default()).unwrap();
        assert_eq!(r.warnings[0].kind, DiagnosticKind::Methodology);
        assert_eq!(r.convergence_iterations, 1);
        assert!(r.convergence_achieved);
        assert!(r.stages.is_empty());
    }

    #[test]
    fn missing_sources_are_input_errors() {
        let mut intake = bolt_on_intake(300.0);
        intake.existing_biogas = None;
        let err = run_mass_balance(&intake, &DesignOverrides::default()).unwrap_err();
        assert!(err.is_input_error());

        intake.project_type = "B".into();
        let err = run_mass_balance(&intake, &DesignOverrides::default()).unwrap_err();
        assert!(err.is_input_error());

        intake.project_type = "A".into();
        let err = run_mass_balance(&intake, &DesignOverrides::default()).unwrap_err();
        assert!(err.is_input_error());
    }

    fn entry(name: &str, volume: NumericInput) -> FeedstockEntry {
        FeedstockEntry {
            feedstock_type: name.into(),
            volume,
            unit: "tons/year".into(),
            specs: Default::default(),
            packaged: false,
        }
    }

    #[test]
    fn zero_volume_entries_are_dropped_with_a_warning() {
        let mut intake = bolt_on_intake(300.0);
        intake.project_type = "B".into();
        intake.existing_biogas = None;
        intake.feedstocks = vec![
            entry("Potato waste", 20_000.0.into()),
            entry("Mystery slurry", "TBD".into()),
        ];
        let r = run_mass_balance(&intake, &DesignOverrides::default()).unwrap();
        let input: Vec<_> = r
            .warnings
            .iter()
            .filter(|w| w.kind == DiagnosticKind::Input)
            .collect();
        assert_eq!(input.len(), 1);
        assert_eq!(input[0].severity, bf_core::Severity::Warning);
        assert!(input[0].message.contains("Mystery slurry"));
        assert!(r.summary_value("biogas_scfm").unwrap() > 0.0);
    }

    #[test]
    fn zero_total_volume_is_rejected() {
        let mut intake = bolt_on_intake(300.0);
        intake.project_type = "B".into();
        intake.existing_biogas = None;
        intake.feedstocks = vec![
            entry("Potato waste", 0.0.into()),
            entry("Mystery slurry", "TBD".into()),
        ];
        let err = run_mass_balance(&intake, &DesignOverrides::default()).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn shared_constants_are_listed_once() {
        let list = dedup_assumptions(vec![
            Assumption::new("capture_efficiency_pct", 95.0, "%", "a"),
            Assumption::new("hrt_days", 25.0, "d", "b"),
            Assumption::new("capture_efficiency_pct", 95.0, "%", "c"),
        ]);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].source, "a");
    }
}
