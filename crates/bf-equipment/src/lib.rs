//! bf-equipment: equipment sizing and bill of materials.
//!
//! Provides:
//! - Sizing heuristics (safety multipliers, tank geometry, pump and blower power)
//! - `BomBuilder`, which turns converged simulator outputs into tagged items
//!
//! Pumps are listed as duty/standby pairs. A single flare covers the largest
//! biogas source whenever the project produces gas.

pub mod builder;
pub mod error;
pub mod item;
pub mod sizing;

pub use builder::{BomBuilder, build_equipment, kinds};
pub use error::{EquipmentError, EquipmentResult};
pub use item::{EquipmentItem, EquipmentList, ProcessArea};
pub use sizing::{TankGeometry, safety};
