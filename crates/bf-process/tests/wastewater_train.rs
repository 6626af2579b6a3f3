//! Integration tests for the wastewater stage-graph simulator.

use bf_core::DiagnosticKind;
use bf_intake::{DesignOverrides, ProjectType};
use bf_process::wastewater::WwParam;
use bf_process::{
    ConvergenceConfig, InfluentQuality, Port, SimulationConfig, StageKind, TemplateOptions,
    TrainBuilder, TrainTemplate, WastewaterTrain, build_template,
};
use proptest::prelude::*;

fn config(project_type: ProjectType) -> SimulationConfig {
    SimulationConfig::for_project(project_type)
}

#[test]
fn municipal_train_with_daf_converges() {
    // 1 MGD, BOD 250 mg/L, DAF forced in.
    let influent = InfluentQuality::municipal(1.0, 250.0);
    let options = TemplateOptions {
        include_daf: Some(true),
        ..Default::default()
    };
    let train = build_template(TrainTemplate::DigestAndDewater, &influent, &options).unwrap();
    let out = WastewaterTrain::new(train, influent).run(&config(ProjectType::WastewaterOnly));

    assert!(out.converged);
    assert!(out.iterations >= 2 && out.iterations <= 50);
    assert!(out.diagnostics.is_empty());

    let float = out
        .recycle_streams
        .iter()
        .find(|r| r.name == "DAF float")
        .unwrap();
    assert_eq!(float.source, "DAF Unit");
    assert_eq!(float.destination, "Sludge Digester");
    assert!(float.flow_mgd > 0.0);

    let centrate = out
        .recycle_streams
        .iter()
        .find(|r| r.name == "Centrate return")
        .unwrap();
    assert_eq!(centrate.destination, "Headworks");

    assert!(out.stage(StageKind::Daf).is_some());
    let digester = out.stage(StageKind::SludgeDigester).unwrap();
    assert!(digester.design_criteria["biogas_m3_per_day"].value > 0.0);
    assert!(out.digester_biogas_scfm() > 0.0);
    assert!(!out.sludge.is_empty());
    assert!(out.sludge.solids_pct() > 20.0);
}

#[test]
fn sludge_digester_follows_hrt_and_mixing_overrides() {
    let influent = InfluentQuality::municipal(1.0, 250.0);
    let train = build_template(
        TrainTemplate::DigestAndDewater,
        &influent,
        &TemplateOptions::default(),
    )
    .unwrap();
    let sim = WastewaterTrain::new(train, influent);
    let base = sim.run(&config(ProjectType::WastewaterOnly));
    let tuned = sim.run(&config(ProjectType::WastewaterOnly).with_overrides(&DesignOverrides {
        hrt_days: Some(30.0),
        mixing_power_w_per_m3: Some(8.0),
        ..Default::default()
    }));

    let criteria = &tuned.stage(StageKind::SludgeDigester).unwrap().design_criteria;
    assert_eq!(criteria["hrt_days"].value, 30.0);
    assert_eq!(criteria["mixing_power_w_per_m3"].value, 8.0);
    assert!((tuned.digester_volume_m3 / base.digester_volume_m3 - 30.0 / 20.0).abs() < 1e-9);
}

#[test]
fn treated_effluent_is_cleaner_than_influent() {
    let influent = InfluentQuality::municipal(2.0, 250.0);
    let train = build_template(
        TrainTemplate::ThickenForCodigestion,
        &influent,
        &TemplateOptions::default(),
    )
    .unwrap();
    let out = WastewaterTrain::new(train, influent).run(&config(ProjectType::Hybrid));

    assert!(out.converged);
    assert!(out.effluent.value("bod") < 30.0);
    assert!(out.effluent.value("tss") < influent.tss_mg_l);
    assert!(out.effluent.value("flow") < influent.flow_mgd);
    assert!(out.sludge.vs_kg_per_day > 0.0);
    assert!(out.sludge.vs_kg_per_day < out.sludge.dry_solids_kg_per_day);
    // Thickened sludge is exported, not digested in-plant.
    assert_eq!(out.digester_biogas_m3_per_day, 0.0);
}

#[test]
fn train_without_recycles_converges_in_one_sweep() {
    let mut b = TrainBuilder::new();
    b.add_stage("Headworks", StageKind::Preliminary);
    b.add_stage("Primary Clarifiers", StageKind::PrimaryClarifier);
    b.add_stage("UV Disinfection", StageKind::Disinfection);
    let train = b.build().unwrap();

    let out = WastewaterTrain::new(train, InfluentQuality::municipal(1.0, 220.0))
        .run(&config(ProjectType::WastewaterOnly));
    assert!(out.converged);
    assert_eq!(out.iterations, 1);
    assert!(out.recycle_streams.is_empty());
}

#[test]
fn iteration_cap_is_reported_not_raised() {
    let mut b = TrainBuilder::new();
    let head = b.add_stage("Headworks", StageKind::Preliminary);
    let primary = b.add_stage("Primary Clarifiers", StageKind::PrimaryClarifier);
    let dewater = b.add_stage("Dewatering", StageKind::Dewatering);
    b.add_recycle("Primary sludge", primary, Port::Underflow, dewater, 1.0);
    b.add_recycle("Centrate", dewater, Port::Effluent, head, 1.0);
    let train = b.build().unwrap();

    let mut cfg = config(ProjectType::WastewaterOnly);
    cfg.convergence = ConvergenceConfig {
        tolerance: 1.0e-14,
        max_iterations: 3,
    };
    let out = WastewaterTrain::new(train, InfluentQuality::municipal(1.0, 250.0)).run(&cfg);

    assert!(!out.converged);
    assert_eq!(out.iterations, 3);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::Convergence);
    // Last iterate is still reported.
    assert_eq!(out.stages.len(), 3);
    assert!(out.recycle_streams[1].flow_mgd > 0.0);
}

#[test]
fn peaking_factor_adds_equalization() {
    let mut influent = InfluentQuality::municipal(1.0, 250.0);
    influent.peaking_factor = 1.5;
    let train = build_template(
        TrainTemplate::DigestAndDewater,
        &influent,
        &TemplateOptions::default(),
    )
    .unwrap();
    assert!(
        !train
            .stages()
            .iter()
            .any(|s| s.kind == StageKind::Equalization)
    );
}

fn load(stream: &bf_process::ProcessStream, key: &str) -> f64 {
    stream.value("flow") * stream.value(key)
}

proptest! {
    #[test]
    fn no_stage_creates_pollutant_mass(
        flow in 0.1_f64..20.0,
        bod in 100.0_f64..3_000.0,
        fog in 10.0_f64..400.0,
        thicken in any::<bool>(),
    ) {
        let mut influent = InfluentQuality::municipal(flow, bod);
        influent.fog_mg_l = fog;
        let template = if thicken {
            TrainTemplate::ThickenForCodigestion
        } else {
            TrainTemplate::DigestAndDewater
        };
        let train = build_template(template, &influent, &TemplateOptions::default()).unwrap();
        let out = WastewaterTrain::new(train, influent).run(&config(ProjectType::Hybrid));

        prop_assert!(out.iterations <= 50);
        for stage in &out.stages {
            for p in WwParam::ALL {
                let key = p.key();
                let inflow = load(&stage.influent, key);
                let outflow = load(&stage.effluent, key);
                prop_assert!(outflow <= inflow * (1.0 + 1e-9) + 1e-9, "{} {}", stage.name, key);
            }
            for pct in stage.removal_efficiencies.values() {
                prop_assert!((0.0..=100.0).contains(pct));
            }
        }
    }
}
