//! Benders cuts and the append-only pool the master problem keeps them in.

use super::formulation::DiscreteDecision;
use super::subproblem::SubproblemOutcome;

/// Absorbs floating point noise before a real cost is rounded to scaled integers.
pub const ROUNDING_SNAP: f64 = 1e-6;

/// One component of a discrete decision, as the master will see it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionLiteral {
    Runway { plane: usize, runway: usize },
    Before { first: usize, second: usize, value: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    /// The decision has no timing; at least one literal must change.
    Feasibility,
    /// Whenever the decision is taken again, `theta >= bound` (scaled units).
    Optimality { bound: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cut {
    pub kind: CutKind,
    pub literals: Vec<DecisionLiteral>,
    pub iteration: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CutPool {
    cuts: Vec<Cut>,
}

impl CutPool {
    pub fn push(&mut self, cut: Cut) {
        self.cuts.push(cut);
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cut> {
        self.cuts.iter()
    }

    pub fn feasibility_cuts(&self) -> usize {
        self.cuts.iter().filter(|c| c.kind == CutKind::Feasibility).count()
    }

    pub fn optimality_cuts(&self) -> usize {
        self.cuts.len() - self.feasibility_cuts()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CutGenerator {
    cost_scale: i64,
}

impl CutGenerator {
    pub fn new(cost_scale: i64) -> Self {
        CutGenerator { cost_scale }
    }

    /// `ceil(cost * scale)` once noise below [`ROUNDING_SNAP`] is discarded.
    pub fn scaled_bound(&self, cost: f64) -> i64 {
        (cost * self.cost_scale as f64 - ROUNDING_SNAP).ceil() as i64
    }

    /// A runway literal per plane followed by the order literal of every undetermined pair.
    pub fn literals(decision: &DiscreteDecision) -> Vec<DecisionLiteral> {
        let runways = decision.runways.iter()
            .enumerate()
            .map(|(plane, runway)| DecisionLiteral::Runway { plane, runway: *runway });
        let orders = decision.before.iter()
            .map(|((first, second), value)| DecisionLiteral::Before { first: *first, second: *second, value: *value });
        runways.chain(orders).collect()
    }

    /// The cut excluding or re-pricing `decision`, none when the subproblem
    /// failed for reasons unrelated to the decision.
    pub fn generate(&self, decision: &DiscreteDecision, outcome: &SubproblemOutcome, iteration: usize) -> Option<Cut> {
        let kind = match outcome {
            SubproblemOutcome::Infeasible => CutKind::Feasibility,
            SubproblemOutcome::Optimal { cost, .. } => CutKind::Optimality { bound: self.scaled_bound(*cost) },
            SubproblemOutcome::Other(_) => return None,
        };
        Some(Cut { kind, literals: Self::literals(decision), iteration })
    }
}
