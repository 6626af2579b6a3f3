//! Intake feedstock entries to normalized engineering parameters.

use crate::library::{FeedstockLibrary, MatchTier};
use crate::params::{FeedstockParam, SpecSource, lookup};
use bf_core::constants::{DAYS_PER_YEAR, KG_PER_SHORT_TON};
use bf_core::{Diagnostic, DiagnosticKind, SolidsUnit, normalize_volume};
use bf_intake::FeedstockEntry;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedFeedstock {
    pub name: String,
    pub tons_per_year: f64,
    pub ts_pct: f64,
    /// VS as % of TS.
    pub vs_ts_pct: f64,
    pub biodegradable_pct: f64,
    /// m³ CH4 per kg VS destroyed.
    pub bmp: f64,
    /// % of TS.
    pub inert_pct: f64,
    /// g per kg wet.
    pub tkn_g_per_kg: f64,
    pub packaged: bool,
    pub library_match: Option<String>,
    pub provenance: BTreeMap<FeedstockParam, SpecSource>,
}

impl ParsedFeedstock {
    pub fn wet_kg_per_day(&self) -> f64 {
        self.tons_per_year * KG_PER_SHORT_TON / DAYS_PER_YEAR
    }

    pub fn ts_kg_per_day(&self) -> f64 {
        self.wet_kg_per_day() * self.ts_pct / 100.0
    }

    pub fn vs_kg_per_day(&self) -> f64 {
        self.ts_kg_per_day() * self.vs_ts_pct / 100.0
    }

    /// Inert solids, never more than the non-volatile share of TS.
    pub fn inert_kg_per_day(&self) -> f64 {
        let fixed = self.ts_kg_per_day() - self.vs_kg_per_day();
        (self.ts_kg_per_day() * self.inert_pct / 100.0).min(fixed.max(0.0))
    }

    pub fn tkn_kg_per_day(&self) -> f64 {
        self.wet_kg_per_day() * self.tkn_g_per_kg / 1000.0
    }

    /// Whether any parameter fell back to a literal default.
    pub fn used_defaults(&self) -> bool {
        self.provenance.values().any(|s| *s == SpecSource::Default)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub feedstocks: Vec<ParsedFeedstock>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutcome {
    pub fn total_tons_per_year(&self) -> f64 {
        self.feedstocks.iter().map(|f| f.tons_per_year).sum()
    }
}

/// Parse every entry. Missing or odd data is never an error here; it is
/// reported through diagnostics and filled from the library or defaults.
pub fn parse_feedstocks(entries: &[FeedstockEntry], library: &FeedstockLibrary) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    for entry in entries {
        let parsed = parse_entry(entry, library, &mut outcome.diagnostics);
        outcome.feedstocks.push(parsed);
    }
    outcome
}

fn parse_entry(
    entry: &FeedstockEntry,
    library: &FeedstockLibrary,
    diagnostics: &mut Vec<Diagnostic>,
) -> ParsedFeedstock {
    let name = entry.feedstock_type.trim().to_string();
    let raw_volume = entry.volume.value();
    if SolidsUnit::parse(&entry.unit).is_none() {
        debug!(feedstock = %name, unit = %entry.unit, "unrecognized volume unit; value used as tons/year");
    }
    let tons_per_year = normalize_volume(raw_volume, &entry.unit).max(0.0);

    let matched = library.find(&name);
    match matched {
        Some(m) => {
            debug!(feedstock = %name, profile = m.profile.name, tier = ?m.tier, "library match");
            if m.tier == MatchTier::TokenOverlap {
                diagnostics.push(
                    Diagnostic::info(
                        DiagnosticKind::LibraryMatch,
                        format!(
                            "'{}' loosely matched to library profile '{}'",
                            name, m.profile.name
                        ),
                    )
                    .with_field(name.clone()),
                );
            }
        }
        None => {
            warn!(feedstock = %name, "no library profile; using literal defaults");
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::LibraryMatch,
                    format!(
                        "Feedstock '{}' did not match the library; default parameters applied where specs were missing",
                        name
                    ),
                )
                .with_field(name.clone()),
            );
        }
    }
    let profile = matched.map(|m| m.profile);

    let mut provenance = BTreeMap::new();
    let mut resolve = |param: FeedstockParam| {
        let r = lookup(param, &entry.specs, profile);
        provenance.insert(param, r.source);
        r.value
    };
    let ts_pct = resolve(FeedstockParam::TotalSolids);
    let mut vs_ts_pct = resolve(FeedstockParam::VolatileSolids);
    let biodegradable_pct = resolve(FeedstockParam::Biodegradable);
    let bmp = resolve(FeedstockParam::Bmp);
    let inert_pct = resolve(FeedstockParam::Inert);
    let tkn_g_per_kg = resolve(FeedstockParam::Tkn);

    // VS reported on a wet basis is rebased onto TS.
    if vs_on_wet_basis(entry) && ts_pct > 0.0 {
        vs_ts_pct = (vs_ts_pct / ts_pct * 100.0).min(100.0);
    }

    ParsedFeedstock {
        name,
        tons_per_year,
        ts_pct,
        vs_ts_pct,
        biodegradable_pct,
        bmp,
        inert_pct,
        tkn_g_per_kg,
        packaged: entry.packaged || profile.is_some_and(|p| p.packaged),
        library_match: profile.map(|p| p.name.to_string()),
        provenance,
    }
}

fn vs_on_wet_basis(entry: &FeedstockEntry) -> bool {
    entry.specs.iter().any(|(key, spec)| {
        let key = key.trim().to_ascii_lowercase();
        FeedstockParam::VolatileSolids
            .spec_keys()
            .contains(&key.as_str())
            && spec.unit.to_ascii_lowercase().contains("wet")
    })
}
