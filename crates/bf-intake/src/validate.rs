//! Intake and override validation logic.
//!
//! Validation rejects values that are malformed (negative flows, percentages
//! outside 0..=100, duplicate feedstocks). Missing or zero data is not a
//! validation failure here: the orchestrator drops feedstocks without a usable
//! volume with a warning and rejects a run only when no feed remains.

use crate::schema::{
    DesignOverrides, ExistingBiogasDef, FeedstockEntry, InfluentDef, IntakeRecord, NumericInput,
};
use std::collections::HashSet;

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate feedstock: {name}")]
    DuplicateFeedstock { name: String },

    #[error("Missing value: {field}")]
    Missing { field: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_intake(intake: &IntakeRecord) -> Result<(), ValidationError> {
    if intake.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: intake.version,
        });
    }

    let mut names = HashSet::new();
    for entry in &intake.feedstocks {
        validate_feedstock(entry)?;
        if !names.insert(entry.feedstock_type.trim().to_ascii_lowercase()) {
            return Err(ValidationError::DuplicateFeedstock {
                name: entry.feedstock_type.clone(),
            });
        }
    }

    if let Some(influent) = &intake.wastewater {
        validate_influent(influent)?;
    }

    if let Some(gas) = &intake.existing_biogas {
        validate_existing_biogas(gas)?;
    }

    let out = &intake.output_requirements;
    if let Some(p) = out.rng_pipeline_pressure_psig {
        validate_non_negative_finite("output rng_pipeline_pressure_psig", p)?;
    }
    if let Some(v) = out.effluent_bod_mg_l {
        validate_non_negative_finite("output effluent_bod_mg_l", v)?;
    }
    if let Some(v) = out.effluent_tss_mg_l {
        validate_non_negative_finite("output effluent_tss_mg_l", v)?;
    }

    if let Some(v) = intake.constraints.max_digester_tank_m3 {
        validate_positive_finite("constraints max_digester_tank_m3", v)?;
    }

    Ok(())
}

pub fn validate_overrides(overrides: &DesignOverrides) -> Result<(), ValidationError> {
    let positive = [
        ("hrt_days", overrides.hrt_days),
        ("olr_target", overrides.olr_target),
        ("mixing_power_w_per_m3", overrides.mixing_power_w_per_m3),
        ("gas_yield_m3_per_kg_vs", overrides.gas_yield_m3_per_kg_vs),
        ("recycle_tolerance", overrides.recycle_tolerance),
    ];
    for (field, value) in positive {
        if let Some(v) = value {
            validate_positive_finite(&format!("overrides {}", field), v)?;
        }
    }

    let percentages = [
        ("vs_destruction_pct", overrides.vs_destruction_pct),
        ("ch4_pct", overrides.ch4_pct),
        ("co2_pct", overrides.co2_pct),
        ("cake_solids_pct", overrides.cake_solids_pct),
        ("capture_efficiency_pct", overrides.capture_efficiency_pct),
    ];
    for (field, value) in percentages {
        if let Some(v) = value {
            validate_percentage(&format!("overrides {}", field), v)?;
        }
    }

    if let Some(ch4) = overrides.ch4_pct {
        if ch4 <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "overrides ch4_pct".to_string(),
                value: ch4.to_string(),
                reason: "methane content must be positive".to_string(),
            });
        }
    }

    if let Some(h2s) = overrides.h2s_ppmv {
        validate_non_negative_finite("overrides h2s_ppmv", h2s)?;
    }

    if let Some(t) = overrides.digester_temp_c {
        if !t.is_finite() || !(10.0..=70.0).contains(&t) {
            return Err(ValidationError::InvalidValue {
                field: "overrides digester_temp_c".to_string(),
                value: t.to_string(),
                reason: "must be within 10..=70 °C".to_string(),
            });
        }
    }

    if let Some(0) = overrides.max_recycle_iterations {
        return Err(ValidationError::InvalidValue {
            field: "overrides max_recycle_iterations".to_string(),
            value: "0".to_string(),
            reason: "must allow at least one iteration".to_string(),
        });
    }

    Ok(())
}

fn validate_feedstock(entry: &FeedstockEntry) -> Result<(), ValidationError> {
    if entry.feedstock_type.trim().is_empty() {
        return Err(ValidationError::Missing {
            field: "feedstock type".to_string(),
        });
    }
    validate_numeric_input(
        &format!("feedstock '{}' volume", entry.feedstock_type),
        &entry.volume,
    )?;
    for (key, spec) in &entry.specs {
        validate_numeric_input(
            &format!("feedstock '{}' spec '{}'", entry.feedstock_type, key),
            &spec.value,
        )?;
    }
    Ok(())
}

fn validate_influent(influent: &InfluentDef) -> Result<(), ValidationError> {
    validate_numeric_input("wastewater flow", &influent.flow)?;
    let concentrations = [
        ("bod_mg_l", influent.bod_mg_l),
        ("cod_mg_l", influent.cod_mg_l),
        ("tss_mg_l", influent.tss_mg_l),
        ("tkn_mg_l", influent.tkn_mg_l),
        ("tp_mg_l", influent.tp_mg_l),
        ("fog_mg_l", influent.fog_mg_l),
    ];
    for (field, value) in concentrations {
        if let Some(v) = value {
            validate_non_negative_finite(&format!("wastewater {}", field), v)?;
        }
    }
    if let Some(pf) = influent.peaking_factor {
        if !pf.is_finite() || pf < 1.0 {
            return Err(ValidationError::InvalidValue {
                field: "wastewater peaking_factor".to_string(),
                value: pf.to_string(),
                reason: "must be at least 1.0".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_existing_biogas(gas: &ExistingBiogasDef) -> Result<(), ValidationError> {
    validate_numeric_input("existing_biogas flow", &gas.flow)?;
    if let Some(v) = gas.ch4_pct {
        validate_percentage("existing_biogas ch4_pct", v)?;
    }
    if let Some(v) = gas.co2_pct {
        validate_percentage("existing_biogas co2_pct", v)?;
    }
    if let (Some(ch4), Some(co2)) = (gas.ch4_pct, gas.co2_pct) {
        if ch4 + co2 > 100.0 {
            return Err(ValidationError::InvalidValue {
                field: "existing_biogas ch4_pct + co2_pct".to_string(),
                value: (ch4 + co2).to_string(),
                reason: "composition exceeds 100%".to_string(),
            });
        }
    }
    if let Some(v) = gas.h2s_ppmv {
        validate_non_negative_finite("existing_biogas h2s_ppmv", v)?;
    }
    Ok(())
}

fn validate_numeric_input(field: &str, input: &NumericInput) -> Result<(), ValidationError> {
    // Text inputs are resolved leniently; only explicit numbers are checked.
    if let NumericInput::Number(v) = input {
        validate_non_negative_finite(field, *v)?;
    }
    Ok(())
}

fn validate_percentage(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be within 0..=100".to_string(),
        });
    }
    Ok(())
}

fn validate_positive_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be positive and finite".to_string(),
        });
    }
    Ok(())
}

fn validate_non_negative_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be non-negative and finite".to_string(),
        });
    }
    Ok(())
}
