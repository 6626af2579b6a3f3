use bf_feedstock::{FeedstockParam, SpecSource, curated_library, parse_feedstocks};
use std::path::PathBuf;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos/intakes")
        .join(name)
}

#[test]
fn hybrid_demo_feedstocks_resolve_against_library() {
    let intake = bf_intake::load_intake(&demo("04_hybrid_codigestion.yaml")).unwrap();
    let out = parse_feedstocks(&intake.feedstocks, &curated_library());

    assert_eq!(out.feedstocks.len(), 2);
    assert!(out.diagnostics.is_empty());

    let fog = &out.feedstocks[0];
    assert_eq!(fog.library_match.as_deref(), Some("FOG"));
    assert!((fog.tons_per_year - 30.0 * 365.0).abs() < 1e-9);
    assert_eq!(fog.provenance[&FeedstockParam::TotalSolids], SpecSource::Library);

    let whey = &out.feedstocks[1];
    assert_eq!(whey.library_match.as_deref(), Some("Cheese whey"));
    assert_eq!(whey.ts_pct, 6.5);
    assert_eq!(whey.provenance[&FeedstockParam::TotalSolids], SpecSource::SpecKey);
}

#[test]
fn greenfield_demo_uses_structured_specs() {
    let intake = bf_intake::load_intake(&demo("01_potato_greenfield.yaml")).unwrap();
    let out = parse_feedstocks(&intake.feedstocks, &curated_library());
    let potato = &out.feedstocks[0];
    assert_eq!(potato.ts_pct, 15.0);
    assert_eq!(potato.vs_ts_pct, 87.0);
    assert!((potato.bmp - 0.30).abs() < 1e-12);
    assert!(!potato.used_defaults());
}

#[test]
fn library_search_is_case_insensitive() {
    let hits = bf_feedstock::filter_library("GREASE");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "FOG");
}
