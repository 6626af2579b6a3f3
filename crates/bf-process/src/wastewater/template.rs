//! Default stage trains per project archetype.

use super::simulate::InfluentQuality;
use super::stage::StageKind;
use super::train::{Port, StageTrain, TrainBuilder, TrainError};
use bf_intake::ProjectType;

/// FOG above this (mg/L) calls for DAF pretreatment.
pub const DAF_FOG_TRIGGER_MG_L: f64 = 100.0;
/// BOD above this (mg/L) calls for DAF pretreatment.
pub const DAF_BOD_TRIGGER_MG_L: f64 = 1_000.0;
/// Effluent TSS targets below this (mg/L) need tertiary filtration.
pub const TERTIARY_TSS_TRIGGER_MG_L: f64 = 10.0;
/// Peaking factors above this get an equalization basin.
pub const EQ_PEAKING_TRIGGER: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainTemplate {
    /// Sludge is digested and dewatered in-plant; centrate returns to the
    /// headworks.
    DigestAndDewater,
    /// Sludge is thickened and exported to a co-digestion train; filtrate
    /// returns to the headworks.
    ThickenForCodigestion,
}

impl TrainTemplate {
    pub fn for_project(project_type: ProjectType) -> Option<Self> {
        match project_type {
            ProjectType::WastewaterOnly => Some(Self::DigestAndDewater),
            ProjectType::Hybrid => Some(Self::ThickenForCodigestion),
            ProjectType::Greenfield | ProjectType::BoltOn => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemplateOptions {
    /// Forces DAF in or out; `None` applies the influent triggers.
    pub include_daf: Option<bool>,
    pub effluent_tss_target_mg_l: Option<f64>,
}

pub fn build_template(
    template: TrainTemplate,
    influent: &InfluentQuality,
    options: &TemplateOptions,
) -> Result<StageTrain, TrainError> {
    let include_daf = options.include_daf.unwrap_or(
        influent.fog_mg_l > DAF_FOG_TRIGGER_MG_L || influent.bod_mg_l > DAF_BOD_TRIGGER_MG_L,
    );
    let include_tertiary = options
        .effluent_tss_target_mg_l
        .is_some_and(|t| t < TERTIARY_TSS_TRIGGER_MG_L);

    let mut b = TrainBuilder::new();
    let head = b.add_stage("Headworks", StageKind::Preliminary);
    if influent.peaking_factor > EQ_PEAKING_TRIGGER {
        b.add_stage("Equalization Basin", StageKind::Equalization);
    }
    let daf = include_daf.then(|| b.add_stage("DAF Unit", StageKind::Daf));
    let primary = b.add_stage("Primary Clarifiers", StageKind::PrimaryClarifier);
    let aeration = b.add_stage("Aeration Basins", StageKind::ActivatedSludge);
    if include_tertiary {
        b.add_stage("Tertiary Filters", StageKind::TertiaryFilter);
    }
    b.add_stage("UV Disinfection", StageKind::Disinfection);

    let solids_in = match template {
        TrainTemplate::DigestAndDewater => {
            let digester = b.add_stage("Sludge Digester", StageKind::SludgeDigester);
            let dewater = b.add_stage("Dewatering Centrifuge", StageKind::Dewatering);
            b.add_recycle("Digested sludge", digester, Port::Effluent, dewater, 1.0);
            b.add_recycle("Centrate return", dewater, Port::Effluent, head, 1.0);
            digester
        }
        TrainTemplate::ThickenForCodigestion => {
            let thickener = b.add_stage("Gravity Belt Thickener", StageKind::Thickening);
            b.add_recycle("Thickener filtrate", thickener, Port::Effluent, head, 1.0);
            thickener
        }
    };

    if let Some(daf) = daf {
        b.add_recycle("DAF float", daf, Port::Underflow, solids_in, 1.0);
    }
    b.add_recycle("Primary sludge", primary, Port::Underflow, solids_in, 1.0);
    b.add_recycle("Waste activated sludge", aeration, Port::Underflow, solids_in, 1.0);

    b.build()
}
