//! bf-process: deterministic process simulators.
//!
//! Provides:
//! - Wastewater stage-graph simulation with recycle convergence
//! - Anaerobic digestion with nine-stage solids and gas balance
//! - Gas conditioning and capacity-tiered upgrading
//! - Per-project engineering constants with sparse overrides
//!
//! Every simulator is a pure function of its inputs and configuration.

pub mod config;
pub mod digestion;
pub mod error;
pub mod gas;
pub mod stream;
pub mod wastewater;

pub use config::{
    ConvergenceConfig, DigestionConstants, FeedCharacter, SimulationConfig, SolidsHandling,
    VsDestruction, defaults,
};
pub use digestion::{
    AdProcessStage, AdStageKind, DigesterSizing, DigestionOutcome, DigestionTrain, FeedComponent,
    FeedSource, SolidsBalance, existing_biogas,
};
pub use error::{CAPACITY_CEILING_SCFM, ProcessError, ProcessResult, check_capacity};
pub use gas::{Biogas, UPGRADING_TIERS, UpgradingResult, UpgradingTier, select_tier, upgrade};
pub use stream::{DesignCriteria, DesignCriterion, ProcessStream, Quantity, sources};
pub use wastewater::{
    InfluentQuality, Port, RecycleStream, SludgeSummary, StageKind, StageTrain, TemplateOptions,
    TrainBuilder, TrainError, TrainTemplate, TreatmentStage, WastewaterOutcome, WastewaterTrain,
    build_template,
};
