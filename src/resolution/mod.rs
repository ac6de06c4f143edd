//! Hybrid decomposition of the aircraft landing problem: a discrete sequencing
//! master, an exact timing subproblem and the cuts coupling them.

mod cuts;
mod decomposition;
mod direct;
mod formulation;
mod master;
mod precedence;
mod report;
mod schedule;
mod solve;
mod subproblem;

pub use cuts::{Cut, CutGenerator, CutKind, CutPool, DecisionLiteral, ROUNDING_SNAP};
pub use decomposition::{DecompositionLoop, DecompositionOutcome, DecompositionStatistics, LoopState, Termination};
pub use direct::solve_direct;
pub use formulation::DiscreteDecision;
pub use master::{scaled_penalty, MasterProblem, MasterSolution};
pub use precedence::{PrecedenceClass, PrecedenceSets};
pub use report::{DecompositionReporter, LogReporter, NoOpReporter, RecordingReporter};
pub use schedule::{Landing, Schedule, ScheduleViolation};
pub use solve::{solve, solve_with, DecompositionConfig};
pub use subproblem::{SubproblemOutcome, SubproblemSolver};
