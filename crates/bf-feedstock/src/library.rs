//! Curated feedstock profile library and name matching.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeedstockProfile {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Total solids, % of wet mass.
    pub ts_pct: f64,
    /// Volatile solids, % of TS.
    pub vs_ts_pct: f64,
    pub biodegradable_pct: f64,
    /// m³ CH4 per kg VS destroyed.
    pub bmp_m3_per_kg_vs: f64,
    /// Non-digestible solids (grit, plastics), % of TS.
    pub inert_pct: f64,
    /// g TKN per kg wet mass.
    pub tkn_g_per_kg: f64,
    /// Usually arrives in packaging and needs depackaging.
    pub packaged: bool,
}

impl FeedstockProfile {
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_ascii_lowercase();
        if query.is_empty() {
            return true;
        }

        self.name.to_ascii_lowercase().contains(&query)
            || self
                .aliases
                .iter()
                .any(|alias| alias.to_ascii_lowercase().contains(&query))
    }
}

/// How a library profile was found for a free-text feedstock name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    ExactName,
    Containment,
    TokenOverlap,
}

#[derive(Debug, Clone, Copy)]
pub struct LibraryMatch<'a> {
    pub profile: &'a FeedstockProfile,
    pub tier: MatchTier,
}

/// Tokens too generic to identify a feedstock on their own.
const GENERIC_TOKENS: [&str; 9] = [
    "waste", "wastes", "material", "mixed", "other", "and", "the", "from", "with",
];

const CURATED_PROFILES: [FeedstockProfile; 15] = [
    FeedstockProfile {
        name: "Potato waste",
        aliases: &["potato processing waste", "potato peel", "potato culls", "potatoes"],
        ts_pct: 18.0,
        vs_ts_pct: 90.0,
        biodegradable_pct: 85.0,
        bmp_m3_per_kg_vs: 0.36,
        inert_pct: 3.0,
        tkn_g_per_kg: 3.0,
        packaged: false,
    },
    FeedstockProfile {
        name: "Food waste",
        aliases: &["source separated organics", "sso", "food scraps", "restaurant waste", "kitchen waste"],
        ts_pct: 27.0,
        vs_ts_pct: 88.0,
        biodegradable_pct: 80.0,
        bmp_m3_per_kg_vs: 0.45,
        inert_pct: 5.0,
        tkn_g_per_kg: 7.0,
        packaged: false,
    },
    FeedstockProfile {
        name: "Packaged food waste",
        aliases: &["expired product", "off-spec packaged food", "depackaging", "grocery returns"],
        ts_pct: 25.0,
        vs_ts_pct: 88.0,
        biodegradable_pct: 78.0,
        bmp_m3_per_kg_vs: 0.42,
        inert_pct: 8.0,
        tkn_g_per_kg: 6.0,
        packaged: true,
    },
    FeedstockProfile {
        name: "Dairy manure",
        aliases: &["cow manure", "cattle manure", "dairy cow manure", "flushed manure"],
        ts_pct: 12.0,
        vs_ts_pct: 82.0,
        biodegradable_pct: 50.0,
        bmp_m3_per_kg_vs: 0.21,
        inert_pct: 5.0,
        tkn_g_per_kg: 4.5,
        packaged: false,
    },
    FeedstockProfile {
        name: "Swine manure",
        aliases: &["hog manure", "pig manure", "pig slurry"],
        ts_pct: 6.0,
        vs_ts_pct: 80.0,
        biodegradable_pct: 60.0,
        bmp_m3_per_kg_vs: 0.30,
        inert_pct: 4.0,
        tkn_g_per_kg: 5.0,
        packaged: false,
    },
    FeedstockProfile {
        name: "Poultry litter",
        aliases: &["chicken manure", "poultry manure", "broiler litter", "layer manure"],
        ts_pct: 60.0,
        vs_ts_pct: 70.0,
        biodegradable_pct: 55.0,
        bmp_m3_per_kg_vs: 0.25,
        inert_pct: 10.0,
        tkn_g_per_kg: 25.0,
        packaged: false,
    },
    FeedstockProfile {
        name: "FOG",
        aliases: &["fats oils grease", "grease trap waste", "brown grease", "trap grease", "grease"],
        ts_pct: 8.0,
        vs_ts_pct: 95.0,
        biodegradable_pct: 90.0,
        bmp_m3_per_kg_vs: 0.60,
        inert_pct: 1.0,
        tkn_g_per_kg: 1.0,
        packaged: false,
    },
    FeedstockProfile {
        name: "Cheese whey",
        aliases: &["whey", "acid whey", "dairy whey"],
        ts_pct: 6.0,
        vs_ts_pct: 90.0,
        biodegradable_pct: 95.0,
        bmp_m3_per_kg_vs: 0.45,
        inert_pct: 1.0,
        tkn_g_per_kg: 1.5,
        packaged: false,
    },
    FeedstockProfile {
        name: "Brewery spent grain",
        aliases: &["spent grain", "brewers grain", "brewery waste"],
        ts_pct: 22.0,
        vs_ts_pct: 95.0,
        biodegradable_pct: 70.0,
        bmp_m3_per_kg_vs: 0.33,
        inert_pct: 1.0,
        tkn_g_per_kg: 8.0,
        packaged: false,
    },
    FeedstockProfile {
        name: "Fruit and vegetable waste",
        aliases: &["produce waste", "vegetable waste", "fruit waste", "culled produce"],
        ts_pct: 12.0,
        vs_ts_pct: 90.0,
        biodegradable_pct: 85.0,
        bmp_m3_per_kg_vs: 0.35,
        inert_pct: 2.0,
        tkn_g_per_kg: 2.5,
        packaged: false,
    },
    FeedstockProfile {
        name: "Municipal sewage sludge",
        aliases: &["sewage sludge", "biosolids", "primary sludge", "waste activated sludge"],
        ts_pct: 4.0,
        vs_ts_pct: 75.0,
        biodegradable_pct: 55.0,
        bmp_m3_per_kg_vs: 0.30,
        inert_pct: 5.0,
        tkn_g_per_kg: 2.0,
        packaged: false,
    },
    FeedstockProfile {
        name: "Slaughterhouse waste",
        aliases: &["rendering waste", "paunch manure", "blood", "meat processing waste"],
        ts_pct: 16.0,
        vs_ts_pct: 85.0,
        biodegradable_pct: 80.0,
        bmp_m3_per_kg_vs: 0.50,
        inert_pct: 3.0,
        tkn_g_per_kg: 20.0,
        packaged: false,
    },
    FeedstockProfile {
        name: "Crude glycerin",
        aliases: &["glycerol", "glycerine", "biodiesel glycerin"],
        ts_pct: 80.0,
        vs_ts_pct: 95.0,
        biodegradable_pct: 95.0,
        bmp_m3_per_kg_vs: 0.40,
        inert_pct: 2.0,
        tkn_g_per_kg: 0.5,
        packaged: false,
    },
    FeedstockProfile {
        name: "Corn silage",
        aliases: &["maize silage", "energy crop", "silage"],
        ts_pct: 33.0,
        vs_ts_pct: 95.0,
        biodegradable_pct: 75.0,
        bmp_m3_per_kg_vs: 0.34,
        inert_pct: 2.0,
        tkn_g_per_kg: 4.0,
        packaged: false,
    },
    FeedstockProfile {
        name: "Ethanol stillage",
        aliases: &["thin stillage", "whole stillage", "distillers solubles"],
        ts_pct: 8.0,
        vs_ts_pct: 90.0,
        biodegradable_pct: 85.0,
        bmp_m3_per_kg_vs: 0.40,
        inert_pct: 3.0,
        tkn_g_per_kg: 3.5,
        packaged: false,
    },
];

/// Pre-loaded, read-only profile table. Cheap to copy; the default borrows
/// the curated table.
#[derive(Debug, Clone, Copy)]
pub struct FeedstockLibrary<'a> {
    profiles: &'a [FeedstockProfile],
}

impl Default for FeedstockLibrary<'static> {
    fn default() -> Self {
        Self {
            profiles: &CURATED_PROFILES,
        }
    }
}

impl<'a> FeedstockLibrary<'a> {
    pub fn new(profiles: &'a [FeedstockProfile]) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &'a [FeedstockProfile] {
        self.profiles
    }

    /// Resolve a free-text feedstock name. First match wins, in tier order:
    /// exact name, substring containment (either direction, name or alias),
    /// then shared word tokens of three or more letters. Short names such as
    /// "FOG" or "blood" only contain-match as whole words.
    pub fn find(&self, raw_name: &str) -> Option<LibraryMatch<'a>> {
        let query = raw_name.trim().to_ascii_lowercase();
        if query.is_empty() {
            return None;
        }

        if let Some(profile) = self
            .profiles
            .iter()
            .find(|p| p.name.to_ascii_lowercase() == query)
        {
            return Some(LibraryMatch {
                profile,
                tier: MatchTier::ExactName,
            });
        }

        let contains_either = |candidate: &str| {
            let candidate = candidate.to_ascii_lowercase();
            if candidate.len().min(query.len()) < SHORT_NAME_LEN {
                has_word(&query, &candidate) || has_word(&candidate, &query)
            } else {
                candidate.contains(&query) || query.contains(&candidate)
            }
        };
        if let Some(profile) = self.profiles.iter().find(|p| {
            contains_either(p.name) || p.aliases.iter().any(|a| contains_either(a))
        }) {
            return Some(LibraryMatch {
                profile,
                tier: MatchTier::Containment,
            });
        }

        let query_tokens = tokens(&query);
        if query_tokens.is_empty() {
            return None;
        }
        let overlaps = |candidate: &str| {
            tokens(&candidate.to_ascii_lowercase())
                .iter()
                .any(|t| query_tokens.contains(t))
        };
        self.profiles
            .iter()
            .find(|p| overlaps(p.name) || p.aliases.iter().any(|a| overlaps(a)))
            .map(|profile| LibraryMatch {
                profile,
                tier: MatchTier::TokenOverlap,
            })
    }
}

pub fn curated_library() -> FeedstockLibrary<'static> {
    FeedstockLibrary::default()
}

/// Search the curated library by name or alias substring.
pub fn filter_library(query: &str) -> Vec<FeedstockProfile> {
    curated_library()
        .profiles()
        .iter()
        .copied()
        .filter(|p| p.matches_query(query))
        .collect()
}

/// Names shorter than this contain-match only as whole words.
const SHORT_NAME_LEN: usize = 6;

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|w| w == word)
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| w.len() >= 3)
        .filter(|w| !GENERIC_TOKENS.contains(w))
        .map(str::to_string)
        .collect()
}
