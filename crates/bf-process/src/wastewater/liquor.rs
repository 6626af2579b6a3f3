//! Liquid-stream state carried between wastewater stages.

use bf_core::constants::LB_PER_GAL_WATER;
use bf_core::{lb_per_day, mg_per_l};
use serde::Serialize;
use std::ops::{Add, AddAssign, Mul};

/// Tracked constituents. Loads are lb/day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WwParam {
    Bod,
    Cod,
    Tss,
    Vss,
    Tkn,
    Tp,
    Fog,
}

impl WwParam {
    pub const COUNT: usize = 7;

    pub const ALL: [WwParam; Self::COUNT] = [
        WwParam::Bod,
        WwParam::Cod,
        WwParam::Tss,
        WwParam::Vss,
        WwParam::Tkn,
        WwParam::Tp,
        WwParam::Fog,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Bod => "bod",
            Self::Cod => "cod",
            Self::Tss => "tss",
            Self::Vss => "vss",
            Self::Tkn => "tkn",
            Self::Tp => "tp",
            Self::Fog => "fog",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Liquor {
    pub flow_mgd: f64,
    loads: [f64; WwParam::COUNT],
}

impl Liquor {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn with_flow(flow_mgd: f64) -> Self {
        Self {
            flow_mgd,
            ..Self::default()
        }
    }

    pub fn load(&self, p: WwParam) -> f64 {
        self.loads[p.slot()]
    }

    pub fn set_load(&mut self, p: WwParam, lb_day: f64) {
        self.loads[p.slot()] = lb_day.max(0.0);
    }

    pub fn with_load(mut self, p: WwParam, lb_day: f64) -> Self {
        self.set_load(p, lb_day);
        self
    }

    pub fn set_concentration(&mut self, p: WwParam, mg_l: f64) {
        self.set_load(p, lb_per_day(self.flow_mgd, mg_l));
    }

    pub fn concentration(&self, p: WwParam) -> f64 {
        mg_per_l(self.load(p), self.flow_mgd)
    }

    /// Scale every load by `1 - removal[p]`; flow is untouched.
    pub fn after_removal(&self, removal: impl Fn(WwParam) -> f64) -> Self {
        let mut out = *self;
        for p in WwParam::ALL {
            out.set_load(p, self.load(p) * (1.0 - removal(p)));
        }
        out
    }

    /// Component-wise difference, floored at zero.
    pub fn minus(&self, other: &Liquor) -> Self {
        let mut out = Liquor::with_flow((self.flow_mgd - other.flow_mgd).max(0.0));
        for p in WwParam::ALL {
            out.set_load(p, self.load(p) - other.load(p));
        }
        out
    }

    /// Wet flow carrying `dry_lb_day` of solids at `solids_pct`.
    pub fn sludge_flow_mgd(dry_lb_day: f64, solids_pct: f64) -> f64 {
        if solids_pct <= 0.0 {
            return 0.0;
        }
        dry_lb_day / (solids_pct / 100.0) / LB_PER_GAL_WATER / 1.0e6
    }

    /// Every value that the recycle loop watches for convergence.
    pub(crate) fn tracked(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::once(self.flow_mgd).chain(self.loads.iter().copied())
    }
}

impl Add for Liquor {
    type Output = Liquor;

    fn add(mut self, rhs: Liquor) -> Liquor {
        self += rhs;
        self
    }
}

impl AddAssign for Liquor {
    fn add_assign(&mut self, rhs: Liquor) {
        self.flow_mgd += rhs.flow_mgd;
        for (a, b) in self.loads.iter_mut().zip(rhs.loads) {
            *a += b;
        }
    }
}

impl Mul<f64> for Liquor {
    type Output = Liquor;

    fn mul(self, k: f64) -> Liquor {
        let mut out = self;
        out.flow_mgd *= k;
        for l in out.loads.iter_mut() {
            *l *= k;
        }
        out
    }
}
