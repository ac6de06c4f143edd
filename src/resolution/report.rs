use log::{debug, info, warn};

use super::cuts::{Cut, CutKind};
use super::decomposition::{DecompositionOutcome, LoopState};
use super::formulation::DiscreteDecision;
use super::subproblem::SubproblemOutcome;

/// Observer of the decomposition loop. Every hook defaults to doing nothing.
pub trait DecompositionReporter {
    fn name(&self) -> &str;
    fn on_transition(&mut self, _from: LoopState, _to: LoopState, _iteration: usize) {}
    fn on_master_solved(&mut self, _iteration: usize, _theta: i64, _decision: &DiscreteDecision) {}
    fn on_subproblem_solved(&mut self, _iteration: usize, _outcome: &SubproblemOutcome) {}
    fn on_cut(&mut self, _cut: &Cut) {}
    fn on_finish(&mut self, _outcome: &DecompositionOutcome) {}
}

impl std::fmt::Debug for dyn DecompositionReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DecompositionReporter({})", self.name())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl DecompositionReporter for NoOpReporter {
    fn name(&self) -> &str {
        "NoOpReporter"
    }
}

/// Forwards every event to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl DecompositionReporter for LogReporter {
    fn name(&self) -> &str {
        "LogReporter"
    }

    fn on_transition(&mut self, from: LoopState, to: LoopState, iteration: usize) {
        debug!("iteration {iteration}: {from:?} -> {to:?}");
    }

    fn on_master_solved(&mut self, iteration: usize, theta: i64, _decision: &DiscreteDecision) {
        info!("iteration {iteration}: master theta = {theta}");
    }

    fn on_subproblem_solved(&mut self, iteration: usize, outcome: &SubproblemOutcome) {
        match outcome {
            SubproblemOutcome::Optimal { cost, .. } => info!("iteration {iteration}: subproblem cost = {cost:.4}"),
            SubproblemOutcome::Infeasible => info!("iteration {iteration}: subproblem infeasible"),
            SubproblemOutcome::Other(reason) => warn!("iteration {iteration}: subproblem failed: {reason}"),
        }
    }

    fn on_cut(&mut self, cut: &Cut) {
        match cut.kind {
            CutKind::Feasibility => info!("iteration {}: feasibility cut over {} literals", cut.iteration, cut.literals.len()),
            CutKind::Optimality { bound } => info!("iteration {}: optimality cut theta >= {bound}", cut.iteration),
        }
    }

    fn on_finish(&mut self, outcome: &DecompositionOutcome) {
        match outcome.objective {
            Some(objective) => info!(
                "{:?} after {} iterations, objective {objective:.4} (proven optimal: {})",
                outcome.termination, outcome.iterations, outcome.is_proven_optimal()
            ),
            None => warn!("{:?} after {} iterations without a schedule", outcome.termination, outcome.iterations),
        }
    }
}

/// Keeps every transition and master bound, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    pub transitions: Vec<(LoopState, LoopState)>,
    pub thetas: Vec<i64>,
    pub cuts: Vec<Cut>,
    pub finished: bool,
}

impl DecompositionReporter for RecordingReporter {
    fn name(&self) -> &str {
        "RecordingReporter"
    }

    fn on_transition(&mut self, from: LoopState, to: LoopState, _iteration: usize) {
        self.transitions.push((from, to));
    }

    fn on_master_solved(&mut self, _iteration: usize, theta: i64, _decision: &DiscreteDecision) {
        self.thetas.push(theta);
    }

    fn on_cut(&mut self, cut: &Cut) {
        self.cuts.push(cut.clone());
    }

    fn on_finish(&mut self, _outcome: &DecompositionOutcome) {
        self.finished = true;
    }
}
