//! Stage train: ordered stages plus recycle edges, built incrementally and
//! validated once.

use super::stage::StageKind;
use bf_core::{RecycleId, StageId};
use serde::Serialize;
use thiserror::Error;

/// Which output of the source stage a recycle draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Port {
    Effluent,
    Underflow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub id: StageId,
    pub name: String,
    pub kind: StageKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecycleSpec {
    pub id: RecycleId,
    pub name: String,
    pub source: StageId,
    pub port: Port,
    pub destination: StageId,
    /// Share of the source port routed along this edge.
    pub fraction: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrainError {
    #[error("Train has no main-line stage")]
    NoMainLine,

    #[error("First stage '{name}' is a side-stream stage")]
    SideStreamFirst { name: String },

    #[error("Recycle '{recycle}' references unknown stage {stage}")]
    UnknownStage { recycle: String, stage: StageId },

    #[error("Recycle '{recycle}' returns to its own source")]
    SelfLoop { recycle: String },

    #[error("Recycle '{recycle}' fraction {fraction} outside (0, 1]")]
    InvalidFraction { recycle: String, fraction: f64 },

    #[error("Stage '{stage}' routes {total:.3} of one port (> 1)")]
    OverAllocated { stage: String, total: f64 },

    #[error("Stage '{stage}' has no underflow to recycle")]
    NoUnderflow { stage: String },

    #[error("Side-stream stage '{stage}' receives no recycle")]
    UnfedSideStream { stage: String },
}

/// Immutable, validated train.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTrain {
    stages: Vec<StageSpec>,
    recycles: Vec<RecycleSpec>,
}

impl StageTrain {
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn recycles(&self) -> &[RecycleSpec] {
        &self.recycles
    }

    pub fn stage(&self, id: StageId) -> Option<&StageSpec> {
        self.stages.get(id.index() as usize)
    }

    pub fn incoming(&self, id: StageId) -> impl Iterator<Item = &RecycleSpec> {
        self.recycles.iter().filter(move |r| r.destination == id)
    }

    /// Total share of `port` at `id` routed onward by recycles.
    pub fn routed_fraction(&self, id: StageId, port: Port) -> f64 {
        routed(&self.recycles, id, port)
    }

    /// A back-edge feeds a stage evaluated no later than its source, so the
    /// sweep has to use the previous iterate.
    pub fn is_back_edge(&self, r: &RecycleSpec) -> bool {
        r.destination.index() <= r.source.index()
    }

    pub fn has_back_edges(&self) -> bool {
        self.recycles.iter().any(|r| self.is_back_edge(r))
    }
}

fn routed(recycles: &[RecycleSpec], id: StageId, port: Port) -> f64 {
    recycles
        .iter()
        .filter(|r| r.source == id && r.port == port)
        .map(|r| r.fraction)
        .sum()
}

#[derive(Debug, Default)]
pub struct TrainBuilder {
    stages: Vec<StageSpec>,
    recycles: Vec<RecycleSpec>,
}

impl TrainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage. Main-line stages receive the previous main-line
    /// effluent; side-stream stages only their recycles.
    pub fn add_stage(&mut self, name: impl Into<String>, kind: StageKind) -> StageId {
        let id = StageId::from_index(self.stages.len() as u32);
        self.stages.push(StageSpec {
            id,
            name: name.into(),
            kind,
        });
        id
    }

    pub fn add_recycle(
        &mut self,
        name: impl Into<String>,
        source: StageId,
        port: Port,
        destination: StageId,
        fraction: f64,
    ) -> RecycleId {
        let id = RecycleId::from_index(self.recycles.len() as u32);
        self.recycles.push(RecycleSpec {
            id,
            name: name.into(),
            source,
            port,
            destination,
            fraction,
        });
        id
    }

    pub fn build(self) -> Result<StageTrain, TrainError> {
        validate(&self.stages, &self.recycles)?;
        Ok(StageTrain {
            stages: self.stages,
            recycles: self.recycles,
        })
    }
}

fn validate(stages: &[StageSpec], recycles: &[RecycleSpec]) -> Result<(), TrainError> {
    let Some(first) = stages.first() else {
        return Err(TrainError::NoMainLine);
    };
    if first.kind.is_side_stream() {
        return Err(TrainError::SideStreamFirst {
            name: first.name.clone(),
        });
    }

    for r in recycles {
        for stage in [r.source, r.destination] {
            if stage.index() as usize >= stages.len() {
                return Err(TrainError::UnknownStage {
                    recycle: r.name.clone(),
                    stage,
                });
            }
        }
        if r.source == r.destination {
            return Err(TrainError::SelfLoop {
                recycle: r.name.clone(),
            });
        }
        if !(r.fraction > 0.0 && r.fraction <= 1.0) {
            return Err(TrainError::InvalidFraction {
                recycle: r.name.clone(),
                fraction: r.fraction,
            });
        }
        let source = &stages[r.source.index() as usize];
        if r.port == Port::Underflow && !source.kind.has_underflow() {
            return Err(TrainError::NoUnderflow {
                stage: source.name.clone(),
            });
        }
    }

    for stage in stages {
        for port in [Port::Effluent, Port::Underflow] {
            let total = routed(recycles, stage.id, port);
            if total > 1.0 + 1e-9 {
                return Err(TrainError::OverAllocated {
                    stage: stage.name.clone(),
                    total,
                });
            }
        }
        if stage.kind.is_side_stream() && !recycles.iter().any(|r| r.destination == stage.id) {
            return Err(TrainError::UnfedSideStream {
                stage: stage.name.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_assigns_sequential_ids() {
        let mut b = TrainBuilder::new();
        let a = b.add_stage("Headworks", StageKind::Preliminary);
        let p = b.add_stage("Primary", StageKind::PrimaryClarifier);
        assert_eq!(a.index(), 0);
        assert_eq!(p.index(), 1);
        let train = b.build().unwrap();
        assert_eq!(train.stages().len(), 2);
        assert!(!train.has_back_edges());
    }

    #[test]
    fn back_edges_detected() {
        let mut b = TrainBuilder::new();
        let head = b.add_stage("Headworks", StageKind::Preliminary);
        let primary = b.add_stage("Primary", StageKind::PrimaryClarifier);
        let dewater = b.add_stage("Dewatering", StageKind::Dewatering);
        b.add_recycle("Primary sludge", primary, Port::Underflow, dewater, 1.0);
        b.add_recycle("Centrate", dewater, Port::Effluent, head, 1.0);
        let train = b.build().unwrap();
        let flags: Vec<bool> = train
            .recycles()
            .iter()
            .map(|r| train.is_back_edge(r))
            .collect();
        assert_eq!(flags, vec![false, true]);
        assert_eq!(train.incoming(head).count(), 1);
    }

    #[test]
    fn rejects_bad_trains() {
        assert_eq!(TrainBuilder::new().build(), Err(TrainError::NoMainLine));

        let mut b = TrainBuilder::new();
        b.add_stage("Digester", StageKind::SludgeDigester);
        assert!(matches!(b.build(), Err(TrainError::SideStreamFirst { .. })));

        let mut b = TrainBuilder::new();
        let head = b.add_stage("Headworks", StageKind::Preliminary);
        let uv = b.add_stage("UV", StageKind::Disinfection);
        b.add_recycle("Bogus", head, Port::Underflow, uv, 0.5);
        assert!(matches!(b.build(), Err(TrainError::NoUnderflow { .. })));

        let mut b = TrainBuilder::new();
        let head = b.add_stage("Headworks", StageKind::Preliminary);
        let primary = b.add_stage("Primary", StageKind::PrimaryClarifier);
        b.add_recycle("Half", primary, Port::Effluent, head, 0.7);
        b.add_recycle("Other half", primary, Port::Effluent, head, 0.7);
        assert!(matches!(b.build(), Err(TrainError::OverAllocated { .. })));

        let mut b = TrainBuilder::new();
        let head = b.add_stage("Headworks", StageKind::Preliminary);
        b.add_recycle("Loop", head, Port::Effluent, head, 0.5);
        assert!(matches!(b.build(), Err(TrainError::SelfLoop { .. })));

        let mut b = TrainBuilder::new();
        b.add_stage("Headworks", StageKind::Preliminary);
        b.add_stage("Thickener", StageKind::Thickening);
        assert!(matches!(b.build(), Err(TrainError::UnfedSideStream { .. })));
    }
}
