//! Unit-string normalization.
//!
//! Intake data arrives with free-form unit strings ("tons/yr", "gal/day",
//! "Nm3/h", "mL CH4/g VS"). This module maps them onto two canonical bases:
//!
//! - solids throughput: short tons per year
//! - gas flow: standard cubic feet per minute (SCFM)
//!
//! Unrecognized unit strings pass the numeric value through unchanged. That is
//! deliberate: a bad unit degrades the estimate, it never aborts the run.

use crate::units::constants::{
    DAYS_PER_YEAR, FT3_PER_M3, GAL_PER_M3, KG_PER_SHORT_TON, LB_PER_GAL_WATER, LB_PER_SHORT_TON,
    MINUTES_PER_DAY, MONTHS_PER_YEAR, SHORT_TON_PER_METRIC_TONNE,
};

/// Solids/liquid throughput unit family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolidsUnit {
    TonsPerYear,
    TonsPerMonth,
    TonsPerDay,
    MetricTonnesPerYear,
    MetricTonnesPerDay,
    LbPerDay,
    KgPerDay,
    /// Liquid volume, converted at 8.34 lb/gal.
    GallonsPerDay,
    /// Million gallons per day, converted at 8.34 lb/gal.
    Mgd,
}

impl SolidsUnit {
    pub const ALL: [SolidsUnit; 9] = [
        SolidsUnit::TonsPerYear,
        SolidsUnit::TonsPerMonth,
        SolidsUnit::TonsPerDay,
        SolidsUnit::MetricTonnesPerYear,
        SolidsUnit::MetricTonnesPerDay,
        SolidsUnit::LbPerDay,
        SolidsUnit::KgPerDay,
        SolidsUnit::GallonsPerDay,
        SolidsUnit::Mgd,
    ];

    /// Recognize a unit string; `None` when it is not a throughput unit we know.
    pub fn parse(unit: &str) -> Option<Self> {
        let u = squash(unit);
        if u.is_empty() {
            return None;
        }
        if u.contains("mgd") || u.contains("milliongal") {
            return Some(Self::Mgd);
        }
        if u.contains("gal") || u == "gpd" {
            return Some(Self::GallonsPerDay);
        }
        if u.contains("lb") || u.contains("pound") {
            return Some(Self::LbPerDay);
        }
        if u.contains("kg") || u.contains("kilogram") {
            return Some(Self::KgPerDay);
        }
        let metric = u.contains("tonne") || u.contains("metric") || u.starts_with("mt");
        let per_day = u.contains("day") || u.ends_with("/d") || u == "tpd" || u == "mtpd";
        let per_month = u.contains("month") || u.ends_with("/mo") || u == "tpm";
        if metric {
            return Some(if per_day {
                Self::MetricTonnesPerDay
            } else {
                Self::MetricTonnesPerYear
            });
        }
        if u.contains("ton") || u.starts_with("tp") {
            return Some(if per_day {
                Self::TonsPerDay
            } else if per_month {
                Self::TonsPerMonth
            } else {
                Self::TonsPerYear
            });
        }
        None
    }

    /// Multiplier from this unit to short tons per year.
    fn factor_to_tpy(self) -> f64 {
        match self {
            Self::TonsPerYear => 1.0,
            Self::TonsPerMonth => MONTHS_PER_YEAR,
            Self::TonsPerDay => DAYS_PER_YEAR,
            Self::MetricTonnesPerYear => SHORT_TON_PER_METRIC_TONNE,
            Self::MetricTonnesPerDay => SHORT_TON_PER_METRIC_TONNE * DAYS_PER_YEAR,
            Self::LbPerDay => DAYS_PER_YEAR / LB_PER_SHORT_TON,
            Self::KgPerDay => DAYS_PER_YEAR / KG_PER_SHORT_TON,
            Self::GallonsPerDay => LB_PER_GAL_WATER * DAYS_PER_YEAR / LB_PER_SHORT_TON,
            Self::Mgd => 1.0e6 * LB_PER_GAL_WATER * DAYS_PER_YEAR / LB_PER_SHORT_TON,
        }
    }

    pub fn to_tons_per_year(self, value: f64) -> f64 {
        value * self.factor_to_tpy()
    }

    pub fn from_tons_per_year(self, tpy: f64) -> f64 {
        tpy / self.factor_to_tpy()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::TonsPerYear => "tons/year",
            Self::TonsPerMonth => "tons/month",
            Self::TonsPerDay => "tons/day",
            Self::MetricTonnesPerYear => "tonnes/year",
            Self::MetricTonnesPerDay => "tonnes/day",
            Self::LbPerDay => "lb/day",
            Self::KgPerDay => "kg/day",
            Self::GallonsPerDay => "gal/day",
            Self::Mgd => "MGD",
        }
    }
}

/// Gas flow unit family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasFlowUnit {
    Scfm,
    Scfh,
    Scfd,
    MmscfPerDay,
    M3PerHour,
    M3PerDay,
}

impl GasFlowUnit {
    pub const ALL: [GasFlowUnit; 6] = [
        GasFlowUnit::Scfm,
        GasFlowUnit::Scfh,
        GasFlowUnit::Scfd,
        GasFlowUnit::MmscfPerDay,
        GasFlowUnit::M3PerHour,
        GasFlowUnit::M3PerDay,
    ];

    pub fn parse(unit: &str) -> Option<Self> {
        let u = squash(unit).replace('³', "3");
        if u.is_empty() {
            return None;
        }
        if u.contains("m3") {
            return Some(if u.contains("/d") || u.ends_with("pd") {
                Self::M3PerDay
            } else {
                Self::M3PerHour
            });
        }
        if u.contains("mmscf") {
            return Some(Self::MmscfPerDay);
        }
        if u.contains("cf") || u.contains("ft3") || u.contains("cubicfeet") {
            if u.ends_with('m') || u.contains("min") {
                return Some(Self::Scfm);
            }
            if u.ends_with('h') || u.contains("/h") || u.contains("hour") {
                return Some(Self::Scfh);
            }
            if u.ends_with('d') || u.contains("/d") || u.contains("day") {
                return Some(Self::Scfd);
            }
        }
        None
    }

    fn factor_to_scfm(self) -> f64 {
        match self {
            Self::Scfm => 1.0,
            Self::Scfh => 1.0 / 60.0,
            Self::Scfd => 1.0 / MINUTES_PER_DAY,
            Self::MmscfPerDay => 1.0e6 / MINUTES_PER_DAY,
            Self::M3PerHour => FT3_PER_M3 / 60.0,
            Self::M3PerDay => FT3_PER_M3 / MINUTES_PER_DAY,
        }
    }

    pub fn to_scfm(self, value: f64) -> f64 {
        value * self.factor_to_scfm()
    }

    pub fn from_scfm(self, scfm: f64) -> f64 {
        scfm / self.factor_to_scfm()
    }
}

/// Normalize a throughput to short tons/year; unknown units pass through.
pub fn normalize_volume(value: f64, unit: &str) -> f64 {
    match SolidsUnit::parse(unit) {
        Some(u) => u.to_tons_per_year(value),
        None => value,
    }
}

/// Normalize a gas flow to SCFM; unknown units pass through.
pub fn normalize_gas_flow(value: f64, unit: &str) -> f64 {
    match GasFlowUnit::parse(unit) {
        Some(u) => u.to_scfm(value),
        None => value,
    }
}

/// Normalize a liquid flow to MGD; unknown units pass through.
pub fn normalize_liquid_flow(value: f64, unit: &str) -> f64 {
    let u = squash(unit).replace('³', "3");
    let factor = if u.is_empty() || u.contains("mgd") {
        1.0
    } else if u.contains("gpm") || u.contains("gal/min") {
        MINUTES_PER_DAY / 1.0e6
    } else if u.contains("gpd") || u.contains("gal") {
        1.0e-6
    } else if u.contains("mld") || u.contains("ml/d") {
        GAL_PER_M3 * 1.0e3 / 1.0e6
    } else if u.contains("m3/h") || u.contains("m3h") {
        GAL_PER_M3 * 24.0 / 1.0e6
    } else if u.contains("m3") {
        GAL_PER_M3 / 1.0e6
    } else {
        1.0
    };
    value * factor
}

/// Normalize a methane potential to m³ CH4 per kg VS.
///
/// Values above 1.0, or tagged with a "ml" unit, are taken as mL CH4/g VS.
pub fn normalize_bmp(value: f64, unit: &str) -> f64 {
    if value > 1.0 || unit.to_ascii_lowercase().contains("ml") {
        value / 1000.0
    } else {
        value
    }
}

fn squash(unit: &str) -> String {
    unit.trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_spellings() {
        assert_eq!(SolidsUnit::parse("tons/year"), Some(SolidsUnit::TonsPerYear));
        assert_eq!(SolidsUnit::parse("TPY"), Some(SolidsUnit::TonsPerYear));
        assert_eq!(SolidsUnit::parse("tons per day"), Some(SolidsUnit::TonsPerDay));
        assert_eq!(SolidsUnit::parse("tpd"), Some(SolidsUnit::TonsPerDay));
        assert_eq!(SolidsUnit::parse("tons/month"), Some(SolidsUnit::TonsPerMonth));
        assert_eq!(SolidsUnit::parse("lb/day"), Some(SolidsUnit::LbPerDay));
        assert_eq!(SolidsUnit::parse("gallons/day"), Some(SolidsUnit::GallonsPerDay));
        assert_eq!(SolidsUnit::parse("MGD"), Some(SolidsUnit::Mgd));
        assert_eq!(SolidsUnit::parse("kg/day"), Some(SolidsUnit::KgPerDay));
        assert_eq!(
            SolidsUnit::parse("metric tonnes/year"),
            Some(SolidsUnit::MetricTonnesPerYear)
        );
        assert_eq!(
            SolidsUnit::parse("tonnes per day"),
            Some(SolidsUnit::MetricTonnesPerDay)
        );
        assert_eq!(SolidsUnit::parse("furlongs"), None);
    }

    #[test]
    fn literal_factors() {
        assert_eq!(normalize_volume(100.0, "tons/day"), 36_500.0);
        assert_eq!(normalize_volume(10.0, "tons/month"), 120.0);
        assert!((normalize_volume(1_000.0, "metric tonnes") - 1_102.3).abs() < 1e-9);
        assert!((normalize_volume(2_000.0, "lb/day") - 365.0).abs() < 1e-9);
        // 1,000 gal/day × 8.34 lb/gal = 4.17 tons/day
        assert!((normalize_volume(1_000.0, "gal/day") - 4.17 * 365.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_unit_passes_through() {
        assert_eq!(normalize_volume(42.0, "bushels"), 42.0);
        assert_eq!(normalize_volume(42.0, ""), 42.0);
        assert_eq!(normalize_gas_flow(42.0, "widgets"), 42.0);
    }

    #[test]
    fn gas_flow_units() {
        assert_eq!(GasFlowUnit::parse("SCFM"), Some(GasFlowUnit::Scfm));
        assert_eq!(GasFlowUnit::parse("scfh"), Some(GasFlowUnit::Scfh));
        assert_eq!(GasFlowUnit::parse("SCFD"), Some(GasFlowUnit::Scfd));
        assert_eq!(GasFlowUnit::parse("MMSCFD"), Some(GasFlowUnit::MmscfPerDay));
        assert_eq!(GasFlowUnit::parse("Nm3/h"), Some(GasFlowUnit::M3PerHour));
        assert_eq!(GasFlowUnit::parse("m³/hr"), Some(GasFlowUnit::M3PerHour));
        assert_eq!(GasFlowUnit::parse("m3/day"), Some(GasFlowUnit::M3PerDay));
        assert!((normalize_gas_flow(60.0, "scfh") - 1.0).abs() < 1e-12);
        assert!((normalize_gas_flow(1_440.0, "m3/day") - FT3_PER_M3).abs() < 1e-9);
    }

    #[test]
    fn liquid_flow_units() {
        assert_eq!(normalize_liquid_flow(2.5, "MGD"), 2.5);
        assert_eq!(normalize_liquid_flow(2.5, ""), 2.5);
        assert!((normalize_liquid_flow(500_000.0, "gpd") - 0.5).abs() < 1e-12);
        assert!((normalize_liquid_flow(694.444_444, "gpm") - 1.0).abs() < 1e-6);
        assert!((normalize_liquid_flow(3_785.41, "m3/d") - 1.0).abs() < 1e-4);
        assert_eq!(normalize_liquid_flow(7.0, "acre-feet"), 7.0);
    }

    #[test]
    fn bmp_scaling() {
        assert_eq!(normalize_bmp(300.0, "mL CH4/g VS"), 0.3);
        assert!((normalize_bmp(0.3, "mL/g") - 0.0003).abs() < 1e-15);
        assert_eq!(normalize_bmp(450.0, ""), 0.45);
        assert_eq!(normalize_bmp(0.35, "m3 CH4/kg VS"), 0.35);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn solids_round_trip(value in 0.0_f64..1.0e7, idx in 0usize..SolidsUnit::ALL.len()) {
            let unit = SolidsUnit::ALL[idx];
            let back = unit.from_tons_per_year(unit.to_tons_per_year(value));
            prop_assert!((back - value).abs() <= 1e-9 * value.max(1.0));
        }

        #[test]
        fn solids_labels_parse_back(idx in 0usize..SolidsUnit::ALL.len()) {
            let unit = SolidsUnit::ALL[idx];
            prop_assert_eq!(SolidsUnit::parse(unit.label()), Some(unit));
        }

        #[test]
        fn gas_round_trip(value in 0.0_f64..1.0e6, idx in 0usize..GasFlowUnit::ALL.len()) {
            let unit = GasFlowUnit::ALL[idx];
            let back = unit.from_scfm(unit.to_scfm(value));
            prop_assert!((back - value).abs() <= 1e-9 * value.max(1.0));
        }
    }
}
