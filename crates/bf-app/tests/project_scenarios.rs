//! End-to-end runs of the four project archetypes.

use bf_app::{AppError, Scenario, run_batch, run_files, run_mass_balance};
use bf_core::{DiagnosticKind, Severity};
use bf_equipment::kinds;
use bf_intake::{
    DesignOverrides, ExistingBiogasDef, FeedstockEntry, IntakeRecord, ProjectType, SpecValue,
    load_intake,
};
use bf_process::AdStageKind;
use bf_results::MassBalanceResults;
use std::collections::BTreeMap;
use std::path::PathBuf;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

fn intake(name: &str) -> IntakeRecord {
    load_intake(&demo(&format!("intakes/{}", name))).unwrap()
}

fn run(name: &str) -> MassBalanceResults {
    run_mass_balance(&intake(name), &DesignOverrides::default()).unwrap()
}

fn flares(r: &MassBalanceResults) -> Vec<f64> {
    r.equipment
        .iter()
        .filter(|e| e.equipment_type == kinds::FLARE)
        .filter_map(|e| e.spec("capacity_scfm"))
        .collect()
}

fn potato(tons_per_year: f64) -> FeedstockEntry {
    let mut specs = BTreeMap::new();
    specs.insert("total_solids".to_string(), SpecValue::new(15.0, "%"));
    specs.insert("volatile_solids".to_string(), SpecValue::new(87.0, "% of TS"));
    specs.insert("methane_potential".to_string(), SpecValue::new(0.30, "m3/kg VS"));
    FeedstockEntry {
        feedstock_type: "Potato waste".to_string(),
        volume: tons_per_year.into(),
        unit: "tons/year".to_string(),
        specs,
        packaged: false,
    }
}

fn bolt_on(scfm: f64) -> IntakeRecord {
    IntakeRecord {
        version: 1,
        name: "Landfill gas upgrade".to_string(),
        project_type: "C".to_string(),
        feedstocks: vec![],
        wastewater: None,
        existing_biogas: Some(ExistingBiogasDef {
            flow: scfm.into(),
            unit: "SCFM".to_string(),
            ch4_pct: Some(55.0),
            co2_pct: None,
            h2s_ppmv: None,
        }),
        output_requirements: Default::default(),
        location: None,
        constraints: Default::default(),
    }
}

#[test]
fn greenfield_potato_waste() {
    let r = run("01_potato_greenfield.yaml");
    assert_eq!(r.project_type, ProjectType::Greenfield);
    assert!(r.stages.is_empty());
    assert_eq!(r.ad_stages.len(), 9);
    assert_eq!(r.ad_stages[0].kind, AdStageKind::Receiving);
    assert_eq!(r.ad_stages[8].kind, AdStageKind::EmergencyGasManagement);

    let scfm = r.summary_value("biogas_scfm").unwrap();
    assert!((scfm - 230.7).abs() < 0.5, "{}", scfm);
    assert_eq!(flares(&r).len(), 1);
    assert!((flares(&r)[0] - scfm * 1.10).abs() < 1e-6);
    assert!((r.summary_value("flare_capacity_scfm").unwrap() - scfm * 1.10).abs() < 1e-6);

    assert_eq!(r.warnings[0].kind, DiagnosticKind::Methodology);
    assert!(r.summary_value("rng_scfm").unwrap() > 0.0);
    let running = r.summary_value("total_running_kw").unwrap();
    assert!(running > 0.0);
    assert!(r.summary_value("total_connected_kw").unwrap() >= running);
    let vs = r.assumption("vs_destruction_pct").unwrap().value;
    assert!((vs - 58.0).abs() < 1e-9);
    assert_eq!(r.assumption("ambient_temp_c").map(|a| a.value), Some(9.0));
}

#[test]
fn bolt_on_existing_gas() {
    let r = run("02_bolt_on_landfill.yaml");
    assert_eq!(r.project_type, ProjectType::BoltOn);
    assert_eq!(r.ad_stages.len(), 3);
    assert_eq!(r.convergence_iterations, 1);
    assert!(r.convergence_achieved);
    let flare = flares(&r);
    assert_eq!(flare.len(), 1);
    assert!((flare[0] - 880.0).abs() < 1e-9);
    assert!(r.equipment.iter().all(|e| e.equipment_type != kinds::DIGESTER));
}

#[test]
fn bolt_on_above_ceiling_is_capacity_exceeded() {
    let err = run_mass_balance(&bolt_on(1_300.0), &DesignOverrides::default()).unwrap_err();
    assert!(err.is_capacity_exceeded());
    match err {
        AppError::CapacityExceeded { scfm, ceiling } => {
            assert_eq!(scfm, 1_300.0);
            assert_eq!(ceiling, 1_200.0);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn greenfield_above_ceiling_is_capacity_exceeded() {
    let mut i = bolt_on(100.0);
    i.project_type = "B".to_string();
    i.existing_biogas = None;
    i.feedstocks = vec![potato(600_000.0)];
    let err = run_mass_balance(&i, &DesignOverrides::default()).unwrap_err();
    assert!(err.is_capacity_exceeded());
}

#[test]
fn hybrid_above_ceiling_is_capacity_exceeded() {
    let mut i = intake("04_hybrid_codigestion.yaml");
    i.feedstocks.push(potato(600_000.0));
    let err = run_mass_balance(&i, &DesignOverrides::default()).unwrap_err();
    assert!(err.is_capacity_exceeded());
}

#[test]
fn municipal_daf_recycle_converges() {
    let r = run("03_municipal_wastewater.yaml");
    assert_eq!(r.project_type, ProjectType::WastewaterOnly);
    assert!(r.convergence_achieved);
    assert!(r.convergence_iterations >= 2 && r.convergence_iterations <= 50);
    assert!(
        r.recycle_streams
            .iter()
            .any(|s| s.name == "DAF float" && s.destination == "Sludge Digester")
    );
    assert!(r.diagnostics_of(DiagnosticKind::Convergence).next().is_none());
    assert!(r.ad_stages.is_empty());
    assert_eq!(flares(&r).len(), 1);

    let bod_in = r.summary_value("influent_bod_mg_l").unwrap();
    let bod_out = r.summary_value("effluent_bod_mg_l").unwrap();
    assert!(bod_out < bod_in);
    assert!(r.summary_value("sludge_dry_kg_per_day").unwrap() > 0.0);
    for stage in &r.stages {
        for pct in stage.removal_efficiencies.values() {
            assert!((0.0..=100.0).contains(pct));
        }
    }
}

#[test]
fn hybrid_reports_both_trains() {
    let r = run("04_hybrid_codigestion.yaml");
    assert_eq!(r.project_type, ProjectType::Hybrid);
    assert!(!r.stages.is_empty());
    assert_eq!(r.ad_stages.len(), 9);
    assert!(!r.recycle_streams.is_empty());
    assert_eq!(flares(&r).len(), 1);
    let digesters = r
        .equipment
        .iter()
        .find(|e| e.equipment_type == kinds::DIGESTER)
        .unwrap();
    assert!(digesters.spec("volume_m3").unwrap() <= 4_000.0);
    let vs = r.assumption("vs_destruction_pct").unwrap().value;
    assert!((vs - 90.0).abs() < 1e-9);
}

#[test]
fn unknown_feedstock_warns_and_uses_defaults() {
    let mut i = bolt_on(100.0);
    i.project_type = "B".to_string();
    i.existing_biogas = None;
    i.feedstocks = vec![FeedstockEntry {
        feedstock_type: "Kelp harvest residue".to_string(),
        volume: 20_000.0.into(),
        unit: "tons/year".to_string(),
        specs: BTreeMap::new(),
        packaged: false,
    }];
    let r = run_mass_balance(&i, &DesignOverrides::default()).unwrap();
    let warnings: Vec<_> = r.diagnostics_of(DiagnosticKind::LibraryMatch).collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Severity::Warning);
    assert!(r.has_warnings());
    assert!(r.summary_value("biogas_scfm").unwrap() > 0.0);
}

#[test]
fn placeholder_feedstock_volume_is_left_out() {
    let base = run("01_potato_greenfield.yaml");
    let mut i = intake("01_potato_greenfield.yaml");
    i.feedstocks.push(FeedstockEntry {
        feedstock_type: "Mystery slurry".to_string(),
        volume: "TBD".into(),
        unit: "tons/year".to_string(),
        specs: BTreeMap::new(),
        packaged: false,
    });
    let r = run_mass_balance(&i, &DesignOverrides::default()).unwrap();
    let skipped: Vec<_> = r.diagnostics_of(DiagnosticKind::Input).collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].severity, Severity::Warning);
    assert!(skipped[0].message.contains("Mystery slurry"));
    assert_eq!(
        r.summary_value("biogas_scfm"),
        base.summary_value("biogas_scfm")
    );
}

#[test]
fn hybrid_runs_on_sludge_when_trucked_volume_is_missing() {
    let mut i = intake("04_hybrid_codigestion.yaml");
    for f in &mut i.feedstocks {
        f.volume = 0.0.into();
    }
    let r = run_mass_balance(&i, &DesignOverrides::default()).unwrap();
    assert_eq!(r.ad_stages.len(), 9);
    assert!(r.summary_value("biogas_scfm").unwrap() > 0.0);
    let skipped = r
        .diagnostics_of(DiagnosticKind::Input)
        .filter(|d| d.severity == Severity::Warning)
        .count();
    assert_eq!(skipped, i.feedstocks.len());
}

#[test]
fn identical_inputs_give_identical_results() {
    let i = intake("04_hybrid_codigestion.yaml");
    let first = run_mass_balance(&i, &DesignOverrides::default()).unwrap();
    let second = run_mass_balance(&i, &DesignOverrides::default()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        bf_results::to_json(&first).unwrap(),
        bf_results::to_json(&second).unwrap()
    );
}

#[test]
fn overrides_change_the_run_and_its_id() {
    let path = demo("intakes/01_potato_greenfield.yaml");
    let base = run_files(&path, None).unwrap();
    let tuned = run_files(&path, Some(&demo("overrides/long_hrt_mesophilic.yaml"))).unwrap();
    assert_ne!(base.run_id, tuned.run_id);
    let hrt = tuned.assumption("hrt_days").unwrap();
    assert_eq!(hrt.value, 30.0);
    assert_eq!(hrt.source, bf_process::sources::OVERRIDE);
    assert!(
        tuned.summary_value("digester_volume_m3").unwrap()
            >= base.summary_value("digester_volume_m3").unwrap()
    );
}

#[test]
fn hrt_override_grows_the_in_plant_digester() {
    let path = demo("intakes/03_municipal_wastewater.yaml");
    let base = run_files(&path, None).unwrap();
    let tuned = run_files(&path, Some(&demo("overrides/long_hrt_mesophilic.yaml"))).unwrap();

    let volume = |r: &MassBalanceResults| r.summary_value("digester_volume_m3").unwrap();
    assert!(volume(&tuned) > volume(&base));
    let hrt = tuned.assumption("hrt_days").unwrap();
    assert_eq!(hrt.value, 30.0);
    assert_eq!(hrt.source, bf_process::sources::OVERRIDE);

    let mixing_kw = |r: &MassBalanceResults| -> f64 {
        r.equipment
            .iter()
            .filter(|e| e.description == "Digester mixing system")
            .map(|e| e.spec("power_kw").unwrap_or(0.0) * e.quantity as f64)
            .sum()
    };
    assert!(mixing_kw(&tuned) > mixing_kw(&base));
}

#[test]
fn input_errors() {
    let mut no_feed = bolt_on(100.0);
    no_feed.project_type = "B".to_string();
    assert!(
        run_mass_balance(&no_feed, &DesignOverrides::default())
            .unwrap_err()
            .is_input_error()
    );

    let mut negative = no_feed.clone();
    negative.feedstocks = vec![potato(-5.0)];
    assert!(
        run_mass_balance(&negative, &DesignOverrides::default())
            .unwrap_err()
            .is_input_error()
    );

    assert!(
        run_mass_balance(&bolt_on(0.0), &DesignOverrides::default())
            .unwrap_err()
            .is_input_error()
    );

    let mut no_influent = intake("03_municipal_wastewater.yaml");
    no_influent.wastewater = None;
    assert!(
        run_mass_balance(&no_influent, &DesignOverrides::default())
            .unwrap_err()
            .is_input_error()
    );

    let bad_override = DesignOverrides {
        vs_destruction_pct: Some(140.0),
        ..Default::default()
    };
    assert!(
        run_mass_balance(&bolt_on(100.0), &bad_override)
            .unwrap_err()
            .is_input_error()
    );
}

#[test]
fn missing_intake_file_is_a_load_error() {
    let err = run_files(&demo("intakes/does_not_exist.yaml"), None).unwrap_err();
    assert!(matches!(err, AppError::IntakeLoad { .. }));
}

#[test]
fn batch_keeps_order_and_isolates_failures() {
    let scenarios = vec![
        Scenario::new(intake("01_potato_greenfield.yaml")),
        Scenario::new(bolt_on(1_300.0)),
        Scenario::new(intake("03_municipal_wastewater.yaml")),
        Scenario::new(intake("02_bolt_on_landfill.yaml")),
    ];
    let results = run_batch(&scenarios);
    assert_eq!(results.len(), 4);
    assert_eq!(
        results[0].as_ref().unwrap().project_type,
        ProjectType::Greenfield
    );
    assert!(results[1].as_ref().unwrap_err().is_capacity_exceeded());
    assert_eq!(
        results[2].as_ref().unwrap().project_type,
        ProjectType::WastewaterOnly
    );
    let sequential = run_mass_balance(&scenarios[3].intake, &scenarios[3].overrides).unwrap();
    assert_eq!(results[3].as_ref().unwrap(), &sequential);
}
