//! Exact landing times for a fixed runway assignment and landing order.

use crate::error::AlpError;
use crate::instance::Instance;
use crate::model::{ConstraintModel, LinearConstraint, LinearExpr, SolveStatus};

use super::formulation::DiscreteDecision;
use super::precedence::PrecedenceSets;
use super::schedule::Schedule;

#[derive(Debug, Clone, PartialEq)]
pub enum SubproblemOutcome {
    Optimal { cost: f64, schedule: Schedule },
    /// The decision admits no valid continuous schedule.
    Infeasible,
    Other(String),
}

impl SubproblemOutcome {
    pub fn cost(&self) -> Option<f64> {
        match self {
            SubproblemOutcome::Optimal { cost, .. } => Some(*cost),
            _ => None,
        }
    }
}

pub struct SubproblemSolver<'a> {
    instance: &'a Instance,
    sets: &'a PrecedenceSets,
}

impl<'a> SubproblemSolver<'a> {
    pub fn new(instance: &'a Instance, sets: &'a PrecedenceSets) -> Self {
        SubproblemSolver { instance, sets }
    }

    /// Builds and solves a fresh linear program in which every precedence of
    /// `decision` carries the separation of the runways it fixes.
    pub fn solve<M: ConstraintModel + Default>(&self, decision: &DiscreteDecision) -> Result<SubproblemOutcome, AlpError> {
        decision.validate(self.instance)?;
        let mut model = M::default();
        let mut time = Vec::with_capacity(self.instance.nb_planes());
        let mut objective = LinearExpr::new();

        for (i, plane) in self.instance.planes.iter().enumerate() {
            let x = model.new_real_var(plane.earliest, plane.latest, &format!("x_{i}"));
            let alpha = model.new_real_var(0.0, plane.max_early(), &format!("alpha_{i}"));
            let beta = model.new_real_var(0.0, plane.max_late(), &format!("beta_{i}"));
            model.add_linear(LinearConstraint::eq(LinearExpr::new().term(x, 1.0).term(alpha, 1.0).term(beta, -1.0), plane.target));
            objective.add_term(alpha, plane.penalty_early);
            objective.add_term(beta, plane.penalty_late);
            time.push(x);
        }

        for (i, j) in decision.precedences(self.sets) {
            let sep = self.instance.separation_between(i, j, decision.same_runway(i, j));
            model.add_linear(LinearConstraint::geq(LinearExpr::difference(time[j], time[i]), sep));
        }

        model.minimize(objective);

        match model.solve()? {
            SolveStatus::Optimal(solution) => {
                let times: Vec<f64> = time.iter().map(|x| solution.value(*x)).collect();
                let schedule = Schedule::new(&times, &decision.runways);
                let cost = schedule.cost(self.instance);
                Ok(SubproblemOutcome::Optimal { cost, schedule })
            }
            SolveStatus::Infeasible => Ok(SubproblemOutcome::Infeasible),
            SolveStatus::Unbounded => Ok(SubproblemOutcome::Other("unbounded timing problem".to_string())),
        }
    }
}
