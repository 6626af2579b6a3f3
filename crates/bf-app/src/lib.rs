//! Shared application service layer for biogasflow.
//!
//! Dispatches an intake to the wastewater and digestion trains its project
//! type calls for and assembles one result object. Used by the CLI and by
//! batch callers.

pub mod assumptions;
pub mod error;
pub mod run_service;
pub mod summary;

pub use error::{AppError, AppResult};
pub use run_service::{
    ENGINE_VERSION, METHODOLOGY_NOTICE, Scenario, run_batch, run_files, run_mass_balance,
};
pub use summary::SummaryBuilder;
