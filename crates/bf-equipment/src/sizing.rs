//! Geometric and power heuristics shared by the equipment builder.

use crate::error::{EquipmentError, EquipmentResult};
use bf_core::units::{Area, Length, Power, Volume};
use bf_core::{ensure_finite, hp, m, m2, m3, to_m, to_m3};
use std::f64::consts::PI;

/// Safety multipliers applied to converged throughput.
pub mod safety {
    /// Tanks and basins.
    pub const VOLUME: f64 = 1.10;
    /// Gas handling and conditioning.
    pub const GAS: f64 = 1.10;
    /// Pumps and hydraulic equipment.
    pub const HYDRAULIC: f64 = 1.25;
    /// Solids separation and conveyance.
    pub const SOLIDS: f64 = 1.25;
    /// Heating and compression.
    pub const THERMAL: f64 = 1.25;
    /// Aeration blowers.
    pub const AERATION: f64 = 1.50;
}

pub const PUMP_HEAD_FT: f64 = 50.0;
pub const PUMP_EFFICIENCY: f64 = 0.70;
/// Water horsepower constant, gpm·ft per hp.
const WHP_CONSTANT: f64 = 3_960.0;
/// Field oxygen transfer efficiency, kg O2 per kWh.
pub const AERATION_KG_O2_PER_KWH: f64 = 1.5;
/// Height to diameter for process tanks.
pub const TANK_ASPECT: f64 = 0.75;
/// Height to diameter for digesters.
pub const DIGESTER_ASPECT: f64 = 0.6;
/// Largest single digester when the site sets no limit.
pub const DEFAULT_MAX_DIGESTER_M3: f64 = 8_000.0;

fn check_positive(value: f64, what: &'static str) -> EquipmentResult<f64> {
    let v = ensure_finite(value, what).map_err(|_| EquipmentError::NonPhysical { what })?;
    if v <= 0.0 {
        return Err(EquipmentError::NonPhysical { what });
    }
    Ok(v)
}

/// Shaft power for a pump at `gpm` against `head_ft`.
pub fn pump_power(gpm: f64, head_ft: f64, efficiency: f64) -> EquipmentResult<Power> {
    if !(efficiency > 0.0 && efficiency <= 1.0) {
        return Err(EquipmentError::InvalidArg {
            what: "pump efficiency must be in (0,1]",
        });
    }
    let gpm = check_positive(gpm, "pump flow")?;
    let head = check_positive(head_ft, "pump head")?;
    Ok(hp(gpm * head / (WHP_CONSTANT * efficiency)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankGeometry {
    pub diameter: Length,
    pub height: Length,
}

/// Cylinder of `volume` with height = `aspect` × diameter.
pub fn tank_geometry(volume: Volume, aspect: f64) -> EquipmentResult<TankGeometry> {
    let v = check_positive(to_m3(volume), "tank volume")?;
    let aspect = check_positive(aspect, "tank aspect ratio")?;
    let d = (4.0 * v / (PI * aspect)).cbrt();
    Ok(TankGeometry {
        diameter: m(d),
        height: m(d * aspect),
    })
}

/// Circular footprint diameter for a plan area.
pub fn circle_diameter(area: Area) -> Length {
    use uom::si::area::square_meter;
    m((4.0 * area.get::<square_meter>().max(0.0) / PI).sqrt())
}

/// Number of equal tanks so none exceeds `max_each`, and the volume of each.
pub fn split_volume(total: Volume, max_each: Volume) -> EquipmentResult<(u32, Volume)> {
    let total_m3 = check_positive(to_m3(total), "tank volume")?;
    let max_m3 = check_positive(to_m3(max_each), "maximum tank volume")?;
    let count = (total_m3 / max_m3).ceil().max(1.0) as u32;
    Ok((count, m3(total_m3 / count as f64)))
}

/// Blower power for an oxygen demand in kg/day.
pub fn aeration_power(o2_kg_per_day: f64) -> Power {
    bf_core::kw(o2_kg_per_day.max(0.0) / 24.0 / AERATION_KG_O2_PER_KWH)
}

pub fn ft2(v: f64) -> Area {
    m2(v / (bf_core::constants::FT_PER_M * bf_core::constants::FT_PER_M))
}

pub fn feet(l: Length) -> f64 {
    to_m(l) * bf_core::constants::FT_PER_M
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_core::to_hp;

    #[test]
    fn pump_power_follows_whp_formula() {
        let p = pump_power(396.0, 50.0, 0.7).unwrap();
        assert!((to_hp(p) - 396.0 * 50.0 / (3960.0 * 0.7)).abs() < 1e-9);
        assert!(pump_power(100.0, 50.0, 0.0).is_err());
        assert!(pump_power(0.0, 50.0, 0.7).is_err());
    }

    #[test]
    fn tank_geometry_reproduces_volume() {
        let g = tank_geometry(m3(5_000.0), DIGESTER_ASPECT).unwrap();
        let d = to_m(g.diameter);
        let h = to_m(g.height);
        assert!((PI / 4.0 * d * d * h - 5_000.0).abs() < 1e-6);
        assert!((h / d - DIGESTER_ASPECT).abs() < 1e-12);
        assert!(tank_geometry(m3(-1.0), 1.0).is_err());
    }

    #[test]
    fn split_respects_limit() {
        let (n, each) = split_volume(m3(10_812.0), m3(4_000.0)).unwrap();
        assert_eq!(n, 3);
        assert!(to_m3(each) <= 4_000.0);
        let (n, _) = split_volume(m3(1_000.0), m3(4_000.0)).unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn square_feet_round_trip() {
        let a = ft2(1_000.0);
        let d = circle_diameter(a);
        let d_ft = feet(d);
        assert!((PI / 4.0 * d_ft * d_ft - 1_000.0).abs() < 1e-6);
    }
}
