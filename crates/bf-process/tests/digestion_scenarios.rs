//! Integration tests for the digestion and gas train against parsed intake feedstocks.

use bf_feedstock::{curated_library, parse_feedstocks};
use bf_intake::{FeedstockEntry, ProjectType, SpecValue};
use bf_process::{
    AdStageKind, DigestionTrain, FeedCharacter, FeedComponent, ProcessError, SimulationConfig,
    SludgeSummary, existing_biogas,
};
use std::collections::BTreeMap;

fn potato_entry(tons_per_year: f64) -> FeedstockEntry {
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

fn components(entries: &[FeedstockEntry]) -> Vec<FeedComponent> {
    parse_feedstocks(entries, &curated_library())
        .feedstocks
        .iter()
        .map(FeedComponent::from_feedstock)
        .collect()
}

#[test]
fn potato_greenfield_lands_in_the_400_scfm_tier() {
    let cfg = SimulationConfig::for_project(ProjectType::Greenfield);
    let out = DigestionTrain::digest(components(&[potato_entry(100_000.0)]))
        .with_pipeline_pressure(Some(400.0))
        .run(&cfg)
        .unwrap();

    assert!((out.raw_biogas.scfm - 230.7).abs() < 0.5, "{}", out.raw_biogas.scfm);
    assert_eq!(out.upgrading.tier.max_scfm, 400.0);
    assert_eq!(out.upgrading.delivery_psig, 400.0);
    assert!(out.upgrading.booster_kw > 0.0);
    assert!((out.raw_biogas.ch4_pct - 60.0).abs() < 1e-9);
    assert_eq!(out.vs_destruction, 0.58);

    let kinds: Vec<AdStageKind> = out.stages.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AdStageKind::Receiving,
            AdStageKind::Preparation,
            AdStageKind::Equalization,
            AdStageKind::Digestion,
            AdStageKind::Dewatering,
            AdStageKind::LiquidCleanup,
            AdStageKind::GasConditioning,
            AdStageKind::GasUpgrading,
            AdStageKind::EmergencyGasManagement,
        ]
    );
    // 15% TS is diluted down to a pumpable blend.
    assert!(out.dilution_m3_per_day > 0.0);
    let digestion = &out.stages[3];
    assert!((digestion.input.value("ts_pct") - 12.0).abs() < 1e-6);
}

#[test]
fn capacity_ceiling_applies_to_raw_biogas() {
    let cfg = SimulationConfig::for_project(ProjectType::Greenfield);
    // Roughly 1,384 SCFM.
    let err = DigestionTrain::digest(components(&[potato_entry(600_000.0)]))
        .run(&cfg)
        .unwrap_err();
    match err {
        ProcessError::CapacityExceeded { scfm, ceiling } => {
            assert!(scfm > 1_200.0);
            assert_eq!(ceiling, 1_200.0);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn sludge_blend_uses_blend_constants() {
    let cfg = SimulationConfig::for_project(ProjectType::Hybrid);
    let sludge = SludgeSummary {
        dry_solids_kg_per_day: 4_000.0,
        vs_kg_per_day: 3_000.0,
        wet_m3_per_day: 80.0,
        tkn_kg_per_day: 120.0,
    };
    let mut feed = components(&[potato_entry(10_000.0)]);
    feed.push(FeedComponent::from_sludge(&sludge, cfg.digestion.sludge_bmp));
    let out = DigestionTrain::digest(feed).run(&cfg).unwrap();
    assert_eq!(out.feed_character, Some(FeedCharacter::SludgeBlend));
    assert_eq!(out.vs_destruction, 0.90);

    let only_sludge = vec![FeedComponent::from_sludge(&sludge, cfg.digestion.sludge_bmp)];
    let out = DigestionTrain::digest(only_sludge).run(&cfg).unwrap();
    assert_eq!(out.feed_character, Some(FeedCharacter::SludgeOnly));
    assert_eq!(out.vs_destruction, 0.55);
    assert!((out.raw_biogas.ch4_pct - 63.0).abs() < 1e-9);
}

#[test]
fn empty_feed_is_invalid() {
    let cfg = SimulationConfig::for_project(ProjectType::Greenfield);
    let err = DigestionTrain::digest(Vec::new()).run(&cfg).unwrap_err();
    assert!(matches!(err, ProcessError::InvalidInput { .. }));
}

#[test]
fn bolt_on_skips_digestion() {
    let cfg = SimulationConfig::for_project(ProjectType::BoltOn);
    let gas = existing_biogas(450.0, None, None, None, &cfg);
    assert!((gas.ch4_pct + gas.co2_pct + 0.15 + 0.5 + 0.1 - 100.0).abs() < 1e-9);
    let out = DigestionTrain::existing_biogas(gas).run(&cfg).unwrap();
    let kinds: Vec<AdStageKind> = out.stages.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AdStageKind::GasConditioning,
            AdStageKind::GasUpgrading,
            AdStageKind::EmergencyGasManagement,
        ]
    );
    assert_eq!(out.upgrading.tier.max_scfm, 600.0);
    assert!((out.flare_capacity_scfm - 495.0).abs() < 1e-9);
}
