//! Wastewater stage-graph simulator.
//!
//! An ordered train of unit operations with recycle back-edges. Each sweep
//! propagates the design influent stage by stage; sweeps repeat until the
//! recycles settle or the iteration cap is reached.

pub mod liquor;
pub mod simulate;
pub mod stage;
pub mod template;
pub mod train;

pub use liquor::{Liquor, WwParam};
pub use simulate::{
    InfluentQuality, RecycleStream, SludgeSummary, TreatmentStage, WastewaterOutcome,
    WastewaterTrain,
};
pub use stage::{Removal, StageKind};
pub use template::{TemplateOptions, TrainTemplate, build_template};
pub use train::{Port, RecycleSpec, StageSpec, StageTrain, TrainBuilder, TrainError};
