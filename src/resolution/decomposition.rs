//! Logic-based Benders loop: master, exact timing, cut, repeat.

use std::time::{Duration, Instant};

use log::debug;

use crate::error::AlpError;
use crate::instance::Instance;
use crate::model::ConstraintModel;

use super::cuts::{CutGenerator, CutKind};
use super::master::MasterProblem;
use super::precedence::PrecedenceSets;
use super::report::DecompositionReporter;
use super::schedule::Schedule;
use super::solve::DecompositionConfig;
use super::subproblem::{SubproblemOutcome, SubproblemSolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    Init,
    SolvingMaster,
    SolvingSubproblem,
    Cutting,
    Converged,
    MasterInfeasible,
    IterationLimit,
    TimeLimit,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Converged | LoopState::MasterInfeasible | LoopState::IterationLimit | LoopState::TimeLimit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The schedule is certified optimal.
    Converged,
    /// No discrete decision is left, there is no schedule.
    MasterInfeasible,
    /// Best schedule found within the iteration cap, not proven optimal.
    IterationLimit,
    /// Best schedule found within the time budget, not proven optimal.
    TimeLimit,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Converged => write!(f, "CONVERGED"),
            Termination::MasterInfeasible => write!(f, "MASTER_INFEASIBLE"),
            Termination::IterationLimit => write!(f, "ITERATION_LIMIT"),
            Termination::TimeLimit => write!(f, "TIME_LIMIT"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecompositionStatistics {
    pub feasibility_cuts: usize,
    pub optimality_cuts: usize,
    /// `theta` of every master solve, in scaled units
    pub theta_history: Vec<i64>,
    pub master_variables: usize,
    pub master_constraints: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionOutcome {
    pub termination: Termination,
    pub schedule: Option<Schedule>,
    /// Exact cost of `schedule`
    pub objective: Option<f64>,
    /// Last master bound divided by the cost scale. Cut bounds round up, so this
    /// can exceed the optimum by less than `1 / cost_scale`; on convergence it is
    /// capped by the proven objective.
    pub lower_bound: Option<f64>,
    pub iterations: usize,
    pub statistics: DecompositionStatistics,
}

impl DecompositionOutcome {
    pub fn is_proven_optimal(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// The schedule, certified or best effort. Fails when the loop produced none.
    pub fn into_schedule(self) -> Result<Schedule, AlpError> {
        match (self.termination, self.schedule) {
            (Termination::MasterInfeasible, _) => Err(AlpError::MasterInfeasible { iterations: self.iterations }),
            (_, Some(schedule)) => Ok(schedule),
            (_, None) => Err(AlpError::IterationLimitExceeded { iterations: self.iterations }),
        }
    }
}

pub struct DecompositionLoop<'a, M: ConstraintModel + Default> {
    instance: &'a Instance,
    sets: PrecedenceSets,
    config: &'a DecompositionConfig,
    master: MasterProblem<M>,
    generator: CutGenerator,
    state: LoopState,
}

impl<'a, M: ConstraintModel + Default> DecompositionLoop<'a, M> {
    /// Validates the instance and the configuration, classifies the pairs and builds the master.
    pub fn new(instance: &'a Instance, config: &'a DecompositionConfig) -> Result<Self, AlpError> {
        instance.validate()?;
        config.validate()?;
        let sets = PrecedenceSets::classify(instance)?;
        debug!("precedence sets: |W| = {}, |V| = {}, |U| = {}", sets.w.len(), sets.v.len(), sets.u.len());

        let master = MasterProblem::new(M::default(), instance, &sets, config.cost_scale);
        Ok(DecompositionLoop {
            instance,
            sets,
            config,
            master,
            generator: CutGenerator::new(config.cost_scale),
            state: LoopState::Init,
        })
    }

    pub fn sets(&self) -> &PrecedenceSets {
        &self.sets
    }

    fn transition(&mut self, to: LoopState, iteration: usize, reporter: &mut dyn DecompositionReporter) {
        reporter.on_transition(self.state, to, iteration);
        self.state = to;
    }

    pub fn run(mut self, reporter: &mut dyn DecompositionReporter) -> Result<DecompositionOutcome, AlpError> {
        let start = Instant::now();
        let budget = self.config.timeout.map(Duration::from_secs);
        let scale = self.config.cost_scale as f64;

        let mut statistics = DecompositionStatistics::default();
        let mut best: Option<(f64, Schedule)> = None;
        let mut lower_bound = None;
        let mut iteration = 0;

        self.transition(LoopState::SolvingMaster, iteration, reporter);

        let termination = loop {
            if iteration >= self.config.max_iterations {
                break Termination::IterationLimit;
            }
            if budget.is_some_and(|budget| start.elapsed() >= budget) {
                break Termination::TimeLimit;
            }
            iteration += 1;

            let Some(master) = self.master.solve()? else {
                break Termination::MasterInfeasible;
            };
            statistics.theta_history.push(master.theta);
            lower_bound = Some(master.theta as f64 / scale);
            reporter.on_master_solved(iteration, master.theta, &master.decision);
            self.transition(LoopState::SolvingSubproblem, iteration, reporter);

            let outcome = SubproblemSolver::new(self.instance, &self.sets).solve::<M>(&master.decision)?;
            reporter.on_subproblem_solved(iteration, &outcome);

            match &outcome {
                SubproblemOutcome::Optimal { cost, schedule } => {
                    let bound = self.generator.scaled_bound(*cost);
                    if bound as f64 <= master.theta as f64 + self.config.tolerance {
                        best = Some((*cost, schedule.clone()));
                        break Termination::Converged;
                    }
                    if best.as_ref().map_or(true, |(best_cost, _)| cost < best_cost) {
                        best = Some((*cost, schedule.clone()));
                    }
                }
                SubproblemOutcome::Infeasible => {}
                SubproblemOutcome::Other(reason) => return Err(AlpError::Backend(reason.clone())),
            }

            let Some(cut) = self.generator.generate(&master.decision, &outcome, iteration) else {
                return Err(AlpError::Backend("no cut for a non-converged iteration".to_string()));
            };
            self.transition(LoopState::Cutting, iteration, reporter);
            match cut.kind {
                CutKind::Feasibility => statistics.feasibility_cuts += 1,
                CutKind::Optimality { .. } => statistics.optimality_cuts += 1,
            }
            reporter.on_cut(&cut);
            self.master.add_cut(cut)?;
            self.transition(LoopState::SolvingMaster, iteration, reporter);
        };

        let terminal = match termination {
            Termination::Converged => LoopState::Converged,
            Termination::MasterInfeasible => LoopState::MasterInfeasible,
            Termination::IterationLimit => LoopState::IterationLimit,
            Termination::TimeLimit => LoopState::TimeLimit,
        };
        self.transition(terminal, iteration, reporter);

        statistics.master_variables = self.master.model().num_variables();
        statistics.master_constraints = self.master.model().num_constraints();
        statistics.elapsed = start.elapsed();

        let (objective, schedule) = match (termination, best) {
            (Termination::MasterInfeasible, _) | (_, None) => (None, None),
            (_, Some((cost, schedule))) => (Some(cost), Some(schedule)),
        };
        let lower_bound = match (termination, objective, lower_bound) {
            (Termination::Converged, Some(objective), Some(bound)) => Some(bound.min(objective)),
            _ => lower_bound,
        };

        let outcome = DecompositionOutcome {
            termination,
            schedule,
            objective,
            lower_bound,
            iterations: iteration,
            statistics,
        };
        reporter.on_finish(&outcome);
        Ok(outcome)
    }
}
