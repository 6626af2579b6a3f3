//! Wastewater unit operations and their literal performance criteria.

use super::liquor::{Liquor, WwParam};
use crate::config::SimulationConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Screening and grit removal.
    Preliminary,
    Equalization,
    /// Dissolved air flotation.
    Daf,
    PrimaryClarifier,
    ActivatedSludge,
    TertiaryFilter,
    Disinfection,
    /// Anaerobic sludge digestion inside a wastewater-only plant.
    SludgeDigester,
    Thickening,
    Dewatering,
}

/// Fractional removal per tracked parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Removal {
    pub bod: f64,
    pub cod: f64,
    pub tss: f64,
    pub tkn: f64,
    pub tp: f64,
    pub fog: f64,
}

impl Removal {
    pub fn of(&self, p: WwParam) -> f64 {
        match p {
            WwParam::Bod => self.bod,
            WwParam::Cod => self.cod,
            WwParam::Tss | WwParam::Vss => self.tss,
            WwParam::Tkn => self.tkn,
            WwParam::Tp => self.tp,
            WwParam::Fog => self.fog,
        }
    }
}

/// Primary sludge VS/TS and thickness.
pub const PRIMARY_SLUDGE_VS_TS: f64 = 0.75;
pub const PRIMARY_SLUDGE_SOLIDS_PCT: f64 = 4.0;
/// DAF float VS/TS and thickness.
pub const DAF_FLOAT_VS_TS: f64 = 0.90;
pub const DAF_FLOAT_SOLIDS_PCT: f64 = 5.0;
/// lb VSS produced per lb BOD removed.
pub const WAS_YIELD: f64 = 0.5;
pub const WAS_VSS_TSS: f64 = 0.80;
pub const WAS_SOLIDS_PCT: f64 = 1.0;

impl StageKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Preliminary => "Preliminary Treatment",
            Self::Equalization => "Flow Equalization",
            Self::Daf => "Dissolved Air Flotation",
            Self::PrimaryClarifier => "Primary Clarification",
            Self::ActivatedSludge => "Activated Sludge",
            Self::TertiaryFilter => "Tertiary Filtration",
            Self::Disinfection => "UV Disinfection",
            Self::SludgeDigester => "Anaerobic Sludge Digestion",
            Self::Thickening => "Sludge Thickening",
            Self::Dewatering => "Sludge Dewatering",
        }
    }

    /// Side-stream stages take only the recycles routed to them.
    pub fn is_side_stream(self) -> bool {
        matches!(
            self,
            Self::SludgeDigester | Self::Thickening | Self::Dewatering
        )
    }

    /// Whether the stage separates a sludge, float or cake underflow.
    pub fn has_underflow(self) -> bool {
        matches!(
            self,
            Self::Daf
                | Self::PrimaryClarifier
                | Self::ActivatedSludge
                | Self::Thickening
                | Self::Dewatering
        )
    }

    /// Literal removal efficiencies for main-line stages.
    pub fn design_removal(self) -> Removal {
        match self {
            Self::Preliminary => Removal {
                tss: 0.05,
                fog: 0.10,
                ..Removal::default()
            },
            Self::Daf => Removal {
                bod: 0.30,
                cod: 0.30,
                tss: 0.85,
                fog: 0.90,
                ..Removal::default()
            },
            Self::PrimaryClarifier => Removal {
                bod: 0.35,
                cod: 0.35,
                tss: 0.60,
                fog: 0.20,
                ..Removal::default()
            },
            Self::ActivatedSludge => Removal {
                bod: 0.90,
                cod: 0.85,
                tss: 0.88,
                tkn: 0.80,
                tp: 0.30,
                fog: 0.90,
            },
            Self::TertiaryFilter => Removal {
                bod: 0.30,
                cod: 0.20,
                tss: 0.70,
                ..Removal::default()
            },
            _ => Removal::default(),
        }
    }

    /// Evaluate one pass: returns (effluent, underflow).
    pub(crate) fn evaluate(self, inflow: &Liquor, config: &SimulationConfig) -> (Liquor, Liquor) {
        match self {
            Self::Preliminary
            | Self::Equalization
            | Self::TertiaryFilter
            | Self::Disinfection => {
                let r = self.design_removal();
                (inflow.after_removal(|p| r.of(p)), Liquor::zero())
            }
            Self::Daf => clarify(inflow, self.design_removal(), |removed| {
                let solids = removed.load(WwParam::Tss) + removed.load(WwParam::Fog);
                sludge(removed, solids, solids * DAF_FLOAT_VS_TS, DAF_FLOAT_SOLIDS_PCT)
            }),
            Self::PrimaryClarifier => clarify(inflow, self.design_removal(), |removed| {
                let solids = removed.load(WwParam::Tss);
                sludge(
                    removed,
                    solids,
                    solids * PRIMARY_SLUDGE_VS_TS,
                    PRIMARY_SLUDGE_SOLIDS_PCT,
                )
            }),
            Self::ActivatedSludge => clarify(inflow, self.design_removal(), |removed| {
                let vss = WAS_YIELD * removed.load(WwParam::Bod);
                let tss = vss / WAS_VSS_TSS;
                // Nitrogen leaves as gas; phosphorus uptake stays in the biomass.
                Liquor::with_flow(Liquor::sludge_flow_mgd(tss, WAS_SOLIDS_PCT))
                    .with_load(WwParam::Tss, tss)
                    .with_load(WwParam::Vss, vss)
                    .with_load(WwParam::Tp, removed.load(WwParam::Tp))
            }),
            Self::SludgeDigester => {
                let d = config
                    .digestion
                    .vs_destruction_for(crate::config::FeedCharacter::SludgeOnly);
                let destroyed = inflow.load(WwParam::Vss) * d;
                let mut out = inflow.after_removal(|p| match p {
                    WwParam::Bod | WwParam::Cod | WwParam::Fog => d,
                    _ => 0.0,
                });
                out.set_load(WwParam::Vss, inflow.load(WwParam::Vss) - destroyed);
                out.set_load(WwParam::Tss, inflow.load(WwParam::Tss) - destroyed);
                (out, Liquor::zero())
            }
            Self::Thickening => separate(
                inflow,
                config.solids.capture_pct,
                config.solids.thickened_solids_pct,
            ),
            Self::Dewatering => separate(
                inflow,
                config.solids.capture_pct,
                config.solids.cake_solids_pct,
            ),
        }
    }
}

/// Remove per `removal`, hand the removed mass to `underflow`, and take the
/// underflow's water out of the forward flow.
fn clarify(
    inflow: &Liquor,
    removal: Removal,
    underflow: impl Fn(&Liquor) -> Liquor,
) -> (Liquor, Liquor) {
    let mut effluent = inflow.after_removal(|p| removal.of(p));
    let removed = inflow.minus(&effluent);
    let mut under = underflow(&removed);
    under.flow_mgd = under.flow_mgd.min(inflow.flow_mgd);
    effluent.flow_mgd = (inflow.flow_mgd - under.flow_mgd).max(0.0);
    (effluent, under)
}

fn sludge(removed: &Liquor, tss: f64, vss: f64, solids_pct: f64) -> Liquor {
    Liquor::with_flow(Liquor::sludge_flow_mgd(tss, solids_pct))
        .with_load(WwParam::Tss, tss)
        .with_load(WwParam::Vss, vss)
        .with_load(WwParam::Bod, removed.load(WwParam::Bod))
        .with_load(WwParam::Cod, removed.load(WwParam::Cod))
        .with_load(WwParam::Fog, removed.load(WwParam::Fog))
        .with_load(WwParam::Tp, removed.load(WwParam::Tp))
}

/// Solids/liquid separation: particulates follow the capture rate,
/// solubles split with the water.
fn separate(inflow: &Liquor, capture_pct: f64, solids_pct: f64) -> (Liquor, Liquor) {
    let capture = (capture_pct / 100.0).clamp(0.0, 1.0);
    let cake_tss = inflow.load(WwParam::Tss) * capture;
    let cake_flow = Liquor::sludge_flow_mgd(cake_tss, solids_pct).min(inflow.flow_mgd);
    let water_share = if inflow.flow_mgd > 0.0 {
        cake_flow / inflow.flow_mgd
    } else {
        0.0
    };

    let mut cake = Liquor::with_flow(cake_flow);
    for p in WwParam::ALL {
        let share = match p {
            WwParam::Tkn | WwParam::Tp => water_share,
            _ => capture,
        };
        cake.set_load(p, inflow.load(p) * share);
    }
    (inflow.minus(&cake), cake)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_intake::ProjectType;

    fn raw(flow: f64) -> Liquor {
        let mut l = Liquor::with_flow(flow);
        l.set_concentration(WwParam::Bod, 250.0);
        l.set_concentration(WwParam::Cod, 500.0);
        l.set_concentration(WwParam::Tss, 250.0);
        l.set_concentration(WwParam::Vss, 200.0);
        l.set_concentration(WwParam::Tkn, 40.0);
        l.set_concentration(WwParam::Tp, 7.0);
        l.set_concentration(WwParam::Fog, 50.0);
        l
    }

    #[test]
    fn primary_removes_literal_fractions() {
        let cfg = SimulationConfig::for_project(ProjectType::WastewaterOnly);
        let inflow = raw(1.0);
        let (eff, under) = StageKind::PrimaryClarifier.evaluate(&inflow, &cfg);
        let bod_in = inflow.load(WwParam::Bod);
        assert!((eff.load(WwParam::Bod) - 0.65 * bod_in).abs() < 1e-9);
        assert!((eff.load(WwParam::Tss) - 0.40 * inflow.load(WwParam::Tss)).abs() < 1e-9);
        let removed_tss = 0.60 * inflow.load(WwParam::Tss);
        assert!((under.load(WwParam::Tss) - removed_tss).abs() < 1e-9);
        assert!((under.load(WwParam::Vss) - 0.75 * removed_tss).abs() < 1e-9);
        assert!((eff.flow_mgd + under.flow_mgd - 1.0).abs() < 1e-12);
    }

    #[test]
    fn was_follows_yield() {
        let cfg = SimulationConfig::for_project(ProjectType::WastewaterOnly);
        let inflow = raw(1.0);
        let (_, was) = StageKind::ActivatedSludge.evaluate(&inflow, &cfg);
        let bod_removed = 0.90 * inflow.load(WwParam::Bod);
        assert!((was.load(WwParam::Vss) - 0.5 * bod_removed).abs() < 1e-9);
        assert!((was.load(WwParam::Tss) - 0.5 * bod_removed / 0.8).abs() < 1e-9);
    }

    #[test]
    fn separation_conserves_mass() {
        let cfg = SimulationConfig::for_project(ProjectType::WastewaterOnly);
        let feed = Liquor::with_flow(0.02)
            .with_load(WwParam::Tss, 5_000.0)
            .with_load(WwParam::Vss, 3_500.0)
            .with_load(WwParam::Tkn, 200.0);
        let (centrate, cake) = StageKind::Dewatering.evaluate(&feed, &cfg);
        for p in WwParam::ALL {
            let total = centrate.load(p) + cake.load(p);
            assert!((total - feed.load(p)).abs() < 1e-9, "{:?}", p);
        }
        assert!((cake.load(WwParam::Tss) - 4_750.0).abs() < 1e-9);
        assert!((centrate.flow_mgd + cake.flow_mgd - 0.02).abs() < 1e-12);
    }

    #[test]
    fn digester_destroys_volatile_solids_only() {
        let cfg = SimulationConfig::for_project(ProjectType::WastewaterOnly);
        let feed = Liquor::with_flow(0.01)
            .with_load(WwParam::Tss, 1_000.0)
            .with_load(WwParam::Vss, 800.0)
            .with_load(WwParam::Tkn, 50.0);
        let (out, _) = StageKind::SludgeDigester.evaluate(&feed, &cfg);
        assert!((out.load(WwParam::Vss) - 800.0 * 0.45).abs() < 1e-9);
        assert!((out.load(WwParam::Tss) - (1_000.0 - 800.0 * 0.55)).abs() < 1e-9);
        assert_eq!(out.load(WwParam::Tkn), 50.0);
    }
}
