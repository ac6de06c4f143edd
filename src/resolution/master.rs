//! Relaxed sequencing problem of the decomposition.
//!
//! Decides runways and the order of undetermined pairs while estimating the cost
//! with proxy landing times. Penalties enter in scaled integer units through the
//! epigraph variable `theta`, which is minimised. For any decision the proxy cost
//! never exceeds the exact timing cost, so `theta` bounds the optimum from below.

use log::debug;

use crate::error::AlpError;
use crate::instance::Instance;
use crate::model::{ConstraintModel, LinearConstraint, LinearExpr, Literal, SolveStatus, VarId};

use super::cuts::{Cut, CutKind, CutPool, DecisionLiteral, ROUNDING_SNAP};
use super::formulation::{DiscreteDecision, SequencingVariables};
use super::precedence::PrecedenceSets;

/// Integer coefficient of `penalty` in the master, never above `penalty * scale`.
pub fn scaled_penalty(penalty: f64, cost_scale: i64) -> f64 {
    (penalty * cost_scale as f64 + ROUNDING_SNAP).floor()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MasterSolution {
    /// Scaled lower bound on the optimum
    pub theta: i64,
    pub decision: DiscreteDecision,
    pub proxy_times: Vec<f64>,
}

pub struct MasterProblem<M: ConstraintModel> {
    model: M,
    vars: SequencingVariables,
    theta: VarId,
    cost_scale: i64,
    cuts: CutPool,
}

impl<M: ConstraintModel> MasterProblem<M> {
    pub fn new(mut model: M, instance: &Instance, sets: &PrecedenceSets, cost_scale: i64) -> Self {
        let vars = SequencingVariables::build(&mut model, instance, sets, false);

        let worst = instance.planes.iter()
            .map(|p| p.penalty_early * p.max_early() + p.penalty_late * p.max_late())
            .sum::<f64>();
        let theta_ub = (worst * cost_scale as f64).ceil() as i64 + 1;
        let theta = model.new_int_var(0, theta_ub, "theta");

        let mut epigraph = vars.deviation_cost(instance, |penalty| -scaled_penalty(penalty, cost_scale));
        epigraph.add_term(theta, 1.0);
        model.add_linear(LinearConstraint::geq(epigraph, 0.0));
        model.minimize(LinearExpr::from(theta));

        MasterProblem { model, vars, theta, cost_scale, cuts: CutPool::default() }
    }

    /// `None` when no decision is left under the accumulated cuts.
    pub fn solve(&mut self) -> Result<Option<MasterSolution>, AlpError> {
        match self.model.solve()? {
            SolveStatus::Optimal(solution) => {
                let theta = solution.int_value(self.theta);
                debug!("master solved, theta = {theta}");
                Ok(Some(MasterSolution {
                    theta,
                    decision: self.vars.decision(&solution),
                    proxy_times: self.vars.times(&solution),
                }))
            }
            SolveStatus::Infeasible => Ok(None),
            SolveStatus::Unbounded => Err(AlpError::Backend("master problem reported unbounded".to_string())),
        }
    }

    fn literal(&self, literal: &DecisionLiteral) -> Result<Literal, AlpError> {
        let found = match *literal {
            DecisionLiteral::Runway { plane, runway } => self.vars.runway_literal(plane, runway),
            DecisionLiteral::Before { first, second, value } => self.vars.before_literal(first, second, value),
        };
        found.ok_or_else(|| AlpError::InvalidDecision(format!("{literal:?} has no master variable")))
    }

    /// Registers `cut` in the model and records it. Cuts are never removed.
    /// A cut mentioning a plane, runway or order unknown to the master is rejected
    /// and leaves the model untouched.
    pub fn add_cut(&mut self, cut: Cut) -> Result<(), AlpError> {
        let literals = cut.literals.iter().map(|l| self.literal(l)).collect::<Result<Vec<Literal>, AlpError>>()?;
        match cut.kind {
            CutKind::Feasibility => {
                let negated: Vec<Literal> = literals.iter().map(|l| !*l).collect();
                self.model.add_clause(&negated);
            }
            CutKind::Optimality { bound } => {
                self.model.add_implication(&literals, LinearConstraint::geq(self.theta, bound as f64));
            }
        }
        self.cuts.push(cut);
        Ok(())
    }

    pub fn cuts(&self) -> &CutPool {
        &self.cuts
    }

    pub fn cost_scale(&self) -> i64 {
        self.cost_scale
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}
