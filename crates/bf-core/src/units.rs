// bf-core/src/units.rs

use uom::si::f64::{
    Area as UomArea, Length as UomLength, Mass as UomMass, MassRate as UomMassRate,
    Power as UomPower, Time as UomTime, Volume as UomVolume, VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type Length = UomLength;
pub type Mass = UomMass;
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Time = UomTime;
pub type Volume = UomVolume;
pub type VolumeRate = UomVolumeRate;

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn kg_per_day(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v / constants::SECONDS_PER_DAY)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn m2(v: f64) -> Area {
    use uom::si::area::square_meter;
    Area::new::<square_meter>(v)
}

#[inline]
pub fn m3(v: f64) -> Volume {
    use uom::si::volume::cubic_meter;
    Volume::new::<cubic_meter>(v)
}

#[inline]
pub fn m3_per_day(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_meter_per_second;
    VolumeRate::new::<cubic_meter_per_second>(v / constants::SECONDS_PER_DAY)
}

#[inline]
pub fn w(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn kw(v: f64) -> Power {
    w(v * 1000.0)
}

#[inline]
pub fn hp(v: f64) -> Power {
    w(v * constants::W_PER_HP)
}

/// Read a volume back as m³.
#[inline]
pub fn to_m3(v: Volume) -> f64 {
    use uom::si::volume::cubic_meter;
    v.get::<cubic_meter>()
}

/// Read a volume rate back as m³/day.
#[inline]
pub fn to_m3_per_day(v: VolumeRate) -> f64 {
    use uom::si::volume_rate::cubic_meter_per_second;
    v.get::<cubic_meter_per_second>() * constants::SECONDS_PER_DAY
}

/// Read a volume rate back as standard cubic feet per minute.
#[inline]
pub fn to_scfm(v: VolumeRate) -> f64 {
    to_m3_per_day(v) * constants::FT3_PER_M3 / constants::MINUTES_PER_DAY
}

#[inline]
pub fn to_kw(p: Power) -> f64 {
    use uom::si::power::watt;
    p.get::<watt>() / 1000.0
}

#[inline]
pub fn to_hp(p: Power) -> f64 {
    use uom::si::power::watt;
    p.get::<watt>() / constants::W_PER_HP
}

#[inline]
pub fn to_m(l: Length) -> f64 {
    use uom::si::length::meter;
    l.get::<meter>()
}

#[inline]
pub fn to_kg_per_day(r: MassRate) -> f64 {
    use uom::si::mass_rate::kilogram_per_second;
    r.get::<kilogram_per_second>() * constants::SECONDS_PER_DAY
}

/// Wastewater "pounds formula": lb/day = MGD × mg/L × 8.34.
#[inline]
pub fn lb_per_day(flow_mgd: f64, conc_mg_l: f64) -> f64 {
    flow_mgd * conc_mg_l * constants::LB_PER_GAL_WATER
}

/// Inverse of [`lb_per_day`]: mg/L from a daily load and a flow.
#[inline]
pub fn mg_per_l(load_lb_day: f64, flow_mgd: f64) -> f64 {
    if flow_mgd <= 0.0 {
        0.0
    } else {
        load_lb_day / (flow_mgd * constants::LB_PER_GAL_WATER)
    }
}

#[inline]
pub fn mgd_to_gpm(flow_mgd: f64) -> f64 {
    flow_mgd * 1.0e6 / constants::MINUTES_PER_DAY
}

#[inline]
pub fn m3_per_day_to_scfm(v: f64) -> f64 {
    v * constants::FT3_PER_M3 / constants::MINUTES_PER_DAY
}

#[inline]
pub fn scfm_to_m3_per_day(v: f64) -> f64 {
    v * constants::MINUTES_PER_DAY / constants::FT3_PER_M3
}

pub mod constants {
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
    pub const MINUTES_PER_DAY: f64 = 1_440.0;
    pub const DAYS_PER_YEAR: f64 = 365.0;
    pub const MONTHS_PER_YEAR: f64 = 12.0;

    pub const LB_PER_GAL_WATER: f64 = 8.34;
    pub const LB_PER_SHORT_TON: f64 = 2_000.0;
    pub const KG_PER_SHORT_TON: f64 = 907.185;
    pub const KG_PER_LB: f64 = 0.453_592;
    pub const SHORT_TON_PER_METRIC_TONNE: f64 = 1.1023;

    pub const FT3_PER_M3: f64 = 35.3147;
    pub const GAL_PER_M3: f64 = 264.172;
    pub const FT_PER_M: f64 = 3.280_84;

    pub const W_PER_HP: f64 = 745.7;

    /// Higher heating value of methane at standard conditions.
    pub const CH4_HHV_BTU_PER_SCF: f64 = 1_012.0;
    /// Biogas density near 60% CH4, used for digestate mass closure.
    pub const BIOGAS_DENSITY_KG_PER_M3: f64 = 1.15;
}
