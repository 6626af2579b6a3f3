//! Headline figures collected from the converged trains.

use bf_core::constants::KG_PER_SHORT_TON;
use bf_equipment::{EquipmentList, kinds};
use bf_process::{DigestionOutcome, ProcessStream, Quantity, WastewaterOutcome};
use bf_results::SummaryValue;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct SummaryBuilder {
    values: BTreeMap<String, SummaryValue>,
}

impl SummaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(&mut self, key: &str, value: f64, unit: &str) {
        self.values.insert(
            key.to_string(),
            Quantity {
                value,
                unit: unit.to_string(),
            },
        );
    }

    fn put_effluent(&mut self, stream: &ProcessStream) {
        self.put("effluent_flow_mgd", stream.value("flow"), "MGD");
        for key in ["bod", "tss", "tkn"] {
            self.put(&format!("effluent_{}_mg_l", key), stream.value(key), "mg/L");
        }
    }

    pub fn wastewater(mut self, ww: &WastewaterOutcome) -> Self {
        let raw = &ww.influent;
        self.put("influent_flow_mgd", raw.flow_mgd, "MGD");
        self.put("influent_bod_mg_l", raw.bod_mg_l, "mg/L");
        self.put("influent_tss_mg_l", raw.tss_mg_l, "mg/L");
        self.put("influent_tkn_mg_l", raw.tkn_mg_l, "mg/L");
        self.put_effluent(&ww.effluent);
        self.put("sludge_dry_kg_per_day", ww.sludge.dry_solids_kg_per_day, "kg/d");
        self.put("sludge_wet_m3_per_day", ww.sludge.wet_m3_per_day, "m³/d");
        if ww.digester_biogas_m3_per_day > 0.0 {
            self.put("biogas_m3_per_day", ww.digester_biogas_m3_per_day, "m³/d");
            self.put("biogas_scfm", ww.digester_biogas_scfm(), "SCFM");
            self.put("digester_volume_m3", ww.digester_volume_m3, "m³");
        }
        self
    }

    /// Gas-train figures; these replace any in-plant digester figures.
    pub fn digestion(mut self, ad: &DigestionOutcome) -> Self {
        if ad.feed.wet_kg_per_day > 0.0 {
            let tons = ad.feed.wet_kg_per_day / KG_PER_SHORT_TON;
            self.put("feed_tons_per_day", tons, "tons/day");
            self.put("vs_destroyed_kg_per_day", ad.vs_destroyed_kg_per_day, "kg/d");
        }
        if let Some(d) = &ad.digester {
            self.put("digester_volume_m3", d.volume_m3, "m³");
        }
        self.put("biogas_m3_per_day", ad.raw_biogas.m3_per_day(), "m³/d");
        self.put("biogas_scfm", ad.raw_biogas.scfm, "SCFM");
        self.put("ch4_pct", ad.raw_biogas.ch4_pct, "%");
        self.put("rng_scfm", ad.upgrading.rng_scfm, "SCFM");
        self.put("rng_mmbtu_per_day", ad.upgrading.rng_mmbtu_per_day, "MMBtu/d");
        self
    }

    pub fn equipment(mut self, list: &EquipmentList) -> Self {
        self.put("total_running_kw", list.total_running_kw(), "kW");
        self.put("total_connected_kw", list.total_connected_kw(), "kW");
        self.put("equipment_count", list.items.len() as f64, "items");
        if let Some(flare) = list.by_type(kinds::FLARE).next() {
            self.put(
                "flare_capacity_scfm",
                flare.spec("capacity_scfm").unwrap_or(0.0),
                "SCFM",
            );
        }
        self
    }

    pub fn finish(self) -> BTreeMap<String, SummaryValue> {
        self.values
    }
}
