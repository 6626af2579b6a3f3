//! bf-core: stable foundation for biogasflow.
//!
//! Contains:
//! - units (uom SI types + constructors + US customary helpers)
//! - normalize (unit-string normalization to canonical tons/year and SCFM)
//! - numeric (Real, finiteness/sign checks, lenient number parsing)
//! - ids (monotonic per-run identifiers)
//! - diagnostics (structured warnings/notices attached to results)
//! - error (shared error types)

pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod normalize;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use error::{BfError, BfResult};
pub use ids::*;
pub use normalize::{
    GasFlowUnit, SolidsUnit, normalize_bmp, normalize_gas_flow, normalize_liquid_flow,
    normalize_volume,
};
pub use numeric::*;
pub use units::*;
