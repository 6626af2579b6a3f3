//! Content-based hashing for run IDs.

use bf_intake::{DesignOverrides, IntakeRecord};
use sha2::{Digest, Sha256};

/// SHA-256 over the intake, the override snapshot and the engine version.
pub fn compute_run_id(
    intake: &IntakeRecord,
    overrides: &DesignOverrides,
    engine_version: &str,
) -> String {
    let mut hasher = Sha256::new();

    let intake_json = serde_json::to_string(intake).unwrap_or_default();
    hasher.update(intake_json.as_bytes());

    let overrides_json = serde_json::to_string(overrides).unwrap_or_default();
    hasher.update(overrides_json.as_bytes());

    hasher.update(engine_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_intake::*;

    fn intake(name: &str, flow: f64) -> IntakeRecord {
        IntakeRecord {
            version: 1,
            name: name.to_string(),
            project_type: "A".to_string(),
            feedstocks: vec![],
            wastewater: Some(InfluentDef {
                flow: flow.into(),
                flow_unit: "MGD".to_string(),
                bod_mg_l: Some(250.0),
                cod_mg_l: None,
                tss_mg_l: None,
                tkn_mg_l: None,
                tp_mg_l: None,
                fog_mg_l: None,
                peaking_factor: None,
            }),
            existing_biogas: None,
            output_requirements: OutputRequirementsDef::default(),
            location: None,
            constraints: ConstraintsDef::default(),
        }
    }

    #[test]
    fn hash_stability() {
        let i = intake("Plant", 1.0);
        let o = DesignOverrides::default();
        assert_eq!(compute_run_id(&i, &o, "v1"), compute_run_id(&i, &o, "v1"));
        assert_eq!(compute_run_id(&i, &o, "v1").len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let o = DesignOverrides::default();
        let a = compute_run_id(&intake("Plant", 1.0), &o, "v1");
        let b = compute_run_id(&intake("Plant", 2.0), &o, "v1");
        assert_ne!(a, b);

        let hrt = DesignOverrides {
            hrt_days: Some(30.0),
            ..Default::default()
        };
        assert_ne!(a, compute_run_id(&intake("Plant", 1.0), &hrt, "v1"));
        assert_ne!(a, compute_run_id(&intake("Plant", 1.0), &o, "v2"));
    }
}
