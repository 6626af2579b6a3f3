//! Typed technical-parameter lookup with a fixed fallback chain.
//!
//! Each [`FeedstockParam`] is resolved from, in order: an exact spec key, a
//! display-name match, the matched library profile, then a literal default.

use crate::library::FeedstockProfile;
use bf_core::normalize_bmp;
use bf_intake::SpecValue;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedstockParam {
    /// % of wet mass.
    TotalSolids,
    /// % of TS.
    VolatileSolids,
    /// % of VS.
    Biodegradable,
    /// m³ CH4 per kg VS.
    Bmp,
    /// % of TS.
    Inert,
    /// g per kg wet mass.
    Tkn,
}

impl FeedstockParam {
    pub const ALL: [FeedstockParam; 6] = [
        FeedstockParam::TotalSolids,
        FeedstockParam::VolatileSolids,
        FeedstockParam::Biodegradable,
        FeedstockParam::Bmp,
        FeedstockParam::Inert,
        FeedstockParam::Tkn,
    ];

    /// Structured spec keys recognized verbatim.
    pub fn spec_keys(self) -> &'static [&'static str] {
        match self {
            Self::TotalSolids => &["total_solids", "ts"],
            Self::VolatileSolids => &["volatile_solids", "vs"],
            Self::Biodegradable => &["biodegradable_fraction"],
            Self::Bmp => &["methane_potential", "bmp"],
            Self::Inert => &["inert_content"],
            Self::Tkn => &["tkn"],
        }
    }

    /// Phrases looked for in display names (and in spec keys with `_` read
    /// as a space).
    fn display_hints(self) -> &'static [&'static str] {
        match self {
            Self::TotalSolids => &["total solids", "dry matter", "dry solids"],
            Self::VolatileSolids => &["volatile solids", "vs/ts", "organic matter"],
            Self::Biodegradable => &["biodegradab", "degradability"],
            Self::Bmp => &["methane potential", "methane yield", "bmp"],
            Self::Inert => &["inert", "contaminant", "non-digestible"],
            Self::Tkn => &["kjeldahl", "tkn", "nitrogen"],
        }
    }

    pub fn default_value(self) -> f64 {
        match self {
            Self::TotalSolids => 15.0,
            Self::VolatileSolids => 85.0,
            Self::Biodegradable => 70.0,
            Self::Bmp => 0.30,
            Self::Inert => 3.0,
            Self::Tkn => 3.0,
        }
    }

    pub fn library_value(self, profile: &FeedstockProfile) -> f64 {
        match self {
            Self::TotalSolids => profile.ts_pct,
            Self::VolatileSolids => profile.vs_ts_pct,
            Self::Biodegradable => profile.biodegradable_pct,
            Self::Bmp => profile.bmp_m3_per_kg_vs,
            Self::Inert => profile.inert_pct,
            Self::Tkn => profile.tkn_g_per_kg,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::TotalSolids => "% wet",
            Self::VolatileSolids => "% of TS",
            Self::Biodegradable => "% of VS",
            Self::Bmp => "m³ CH4/kg VS",
            Self::Inert => "% of TS",
            Self::Tkn => "g/kg wet",
        }
    }

    fn is_percentage(self) -> bool {
        !matches!(self, Self::Bmp | Self::Tkn)
    }

    /// Convert a raw spec value given in `unit` to this parameter's
    /// canonical unit.
    pub fn canonicalize(self, value: f64, unit: &str) -> f64 {
        let unit = unit.trim().to_ascii_lowercase();
        match self {
            Self::Bmp => normalize_bmp(value, &unit),
            Self::Tkn if unit.contains("mg/kg") || unit == "ppm" => value / 1000.0,
            Self::Tkn if unit.contains('%') => value * 10.0,
            Self::Tkn => value,
            _ if unit.contains("fraction") || unit == "-" => value * 100.0,
            _ => value,
        }
    }
}

/// Where a resolved parameter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecSource {
    SpecKey,
    DisplayName,
    Library,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolved {
    pub value: f64,
    pub source: SpecSource,
}

/// Resolve `param` for one feedstock entry.
pub fn lookup(
    param: FeedstockParam,
    specs: &BTreeMap<String, SpecValue>,
    profile: Option<&FeedstockProfile>,
) -> Resolved {
    if let Some(spec) = find_by_key(param, specs) {
        return Resolved {
            value: sanitize(param, param.canonicalize(spec.value.value(), &spec.unit)),
            source: SpecSource::SpecKey,
        };
    }

    if let Some(spec) = find_by_display_name(param, specs) {
        return Resolved {
            value: sanitize(param, param.canonicalize(spec.value.value(), &spec.unit)),
            source: SpecSource::DisplayName,
        };
    }

    match profile {
        Some(p) => Resolved {
            value: param.library_value(p),
            source: SpecSource::Library,
        },
        None => Resolved {
            value: param.default_value(),
            source: SpecSource::Default,
        },
    }
}

fn find_by_key<'a>(
    param: FeedstockParam,
    specs: &'a BTreeMap<String, SpecValue>,
) -> Option<&'a SpecValue> {
    specs.iter().find_map(|(key, spec)| {
        let key = key.trim().to_ascii_lowercase();
        param.spec_keys().contains(&key.as_str()).then_some(spec)
    })
}

fn find_by_display_name<'a>(
    param: FeedstockParam,
    specs: &'a BTreeMap<String, SpecValue>,
) -> Option<&'a SpecValue> {
    specs.iter().find_map(|(key, spec)| {
        if is_structured_key(key) {
            return None;
        }
        let label = spec
            .display_name
            .as_deref()
            .unwrap_or(key)
            .to_ascii_lowercase()
            .replace('_', " ");
        (label_owner(&label) == Some(param)).then_some(spec)
    })
}

/// Keys that belong to some parameter verbatim are never re-read by label.
fn is_structured_key(key: &str) -> bool {
    let key = key.trim().to_ascii_lowercase();
    FeedstockParam::ALL
        .iter()
        .any(|p| p.spec_keys().contains(&key.as_str()))
}

/// The parameter whose hint starts earliest in `label`; a longer hint wins
/// at the same position. "Volatile solids (% of total solids)" is VS.
fn label_owner(label: &str) -> Option<FeedstockParam> {
    FeedstockParam::ALL
        .iter()
        .flat_map(|&p| {
            p.display_hints()
                .iter()
                .filter_map(move |h| label.find(h).map(|pos| (pos, Reverse(h.len()), p)))
        })
        .min()
        .map(|(_, _, p)| p)
}

fn sanitize(param: FeedstockParam, value: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        return 0.0;
    }
    if param.is_percentage() {
        value.min(100.0)
    } else {
        value
    }
}
