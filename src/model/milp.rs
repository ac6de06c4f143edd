use good_lp::{microlp, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable};
use log::debug;

use crate::error::AlpError;

use super::{ConstraintModel, LinearConstraint, LinearExpr, Literal, ModelSolution, SolveStatus, VarId, VarKind};

#[derive(Debug, Clone)]
struct VarDef {
    kind: VarKind,
    lb: f64,
    ub: f64,
    name: String,
}

#[derive(Debug, Clone)]
enum Row {
    Linear(LinearConstraint),
    Implication { condition: Vec<Literal>, constraint: LinearConstraint },
    Clause(Vec<Literal>),
}

/// Mixed integer model solved with `good_lp` on top of the pure Rust `microlp` solver.
///
/// Rows are kept in the order they were added and linearised on every solve:
/// implications become big-M rows whose constants are the exact slack the
/// expression can take within the variable bounds.
#[derive(Debug, Clone, Default)]
pub struct MilpModel {
    vars: Vec<VarDef>,
    rows: Vec<Row>,
    objective: LinearExpr,
}

impl MilpModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_var(&mut self, kind: VarKind, lb: f64, ub: f64, name: &str) -> VarId {
        self.vars.push(VarDef { kind, lb, ub, name: name.to_string() });
        VarId(self.vars.len() - 1)
    }

    /// Smallest and largest value `expr` can take over the variable box.
    fn range(&self, expr: &LinearExpr) -> (f64, f64) {
        expr.terms.iter().fold((expr.constant, expr.constant), |(lo, hi), (v, c)| {
            let def = &self.vars[v.0];
            if *c >= 0.0 {
                (lo + c * def.lb, hi + c * def.ub)
            } else {
                (lo + c * def.ub, hi + c * def.lb)
            }
        })
    }

    /// Number of literals of `condition` that are violated, as an expression.
    fn violation(condition: &[Literal]) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for lit in condition {
            if lit.negated {
                expr.add_term(lit.var, 1.0);
            } else {
                expr.constant += 1.0;
                expr.add_term(lit.var, -1.0);
            }
        }
        expr
    }

    fn relax(expr: &LinearExpr, violation: &LinearExpr, big_m: f64) -> LinearExpr {
        let mut relaxed = expr.clone();
        relaxed.constant += big_m * violation.constant;
        for (v, c) in violation.terms.iter() {
            relaxed.add_term(*v, big_m * c);
        }
        relaxed
    }

    fn linearise_implication(&self, condition: &[Literal], constraint: &LinearConstraint, rows: &mut Vec<LinearConstraint>) -> Result<(), AlpError> {
        if condition.is_empty() {
            rows.push(constraint.clone());
            return Ok(());
        }
        let violation = Self::violation(condition);
        let (lo, hi) = self.range(&constraint.expr);

        if constraint.lb.is_finite() && lo < constraint.lb {
            let big_m = constraint.lb - lo;
            if !big_m.is_finite() {
                return Err(AlpError::UnboundedImplication);
            }
            rows.push(LinearConstraint::geq(Self::relax(&constraint.expr, &violation, big_m), constraint.lb));
        }
        if constraint.ub.is_finite() && hi > constraint.ub {
            let big_m = hi - constraint.ub;
            if !big_m.is_finite() {
                return Err(AlpError::UnboundedImplication);
            }
            rows.push(LinearConstraint::leq(Self::relax(&constraint.expr, &violation, -big_m), constraint.ub));
        }
        Ok(())
    }

    /// Plain linear rows equivalent to the stored model, or `None` when some
    /// row is violated regardless of the variables (an empty clause).
    fn linearise(&self) -> Result<Option<Vec<LinearConstraint>>, AlpError> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in self.rows.iter() {
            match row {
                Row::Linear(constraint) => rows.push(constraint.clone()),
                Row::Implication { condition, constraint } => self.linearise_implication(condition, constraint, &mut rows)?,
                Row::Clause(literals) => {
                    let mut expr = LinearExpr::new();
                    for lit in literals {
                        if lit.negated {
                            expr.constant += 1.0;
                            expr.add_term(lit.var, -1.0);
                        } else {
                            expr.add_term(lit.var, 1.0);
                        }
                    }
                    rows.push(LinearConstraint::geq(expr, 1.0));
                }
            }
        }

        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if row.expr.terms.is_empty() {
                let value = row.expr.constant;
                if value < row.lb - 1e-9 || value > row.ub + 1e-9 {
                    return Ok(None);
                }
            } else {
                kept.push(row);
            }
        }
        Ok(Some(kept))
    }
}

fn to_expression(expr: &LinearExpr, vars: &[Variable]) -> Expression {
    expr.terms.iter().fold(Expression::from(expr.constant), |acc, (v, c)| acc + *c * vars[v.0])
}

impl ConstraintModel for MilpModel {
    fn new_int_var(&mut self, lb: i64, ub: i64, name: &str) -> VarId {
        self.add_var(VarKind::Integer, lb as f64, ub as f64, name)
    }

    fn new_bool_var(&mut self, name: &str) -> VarId {
        self.add_var(VarKind::Boolean, 0.0, 1.0, name)
    }

    fn new_real_var(&mut self, lb: f64, ub: f64, name: &str) -> VarId {
        self.add_var(VarKind::Continuous, lb, ub, name)
    }

    fn add_linear(&mut self, constraint: LinearConstraint) {
        self.rows.push(Row::Linear(constraint));
    }

    fn add_implication(&mut self, condition: &[Literal], constraint: LinearConstraint) {
        self.rows.push(Row::Implication { condition: condition.to_vec(), constraint });
    }

    fn add_clause(&mut self, literals: &[Literal]) {
        self.rows.push(Row::Clause(literals.to_vec()));
    }

    fn minimize(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    fn solve(&mut self) -> Result<SolveStatus, AlpError> {
        let Some(rows) = self.linearise()? else {
            debug!("model holds a constant violated row");
            return Ok(SolveStatus::Infeasible);
        };
        debug!("solving milp with {} variables and {} rows", self.vars.len(), rows.len());

        let mut problem_vars = ProblemVariables::new();
        let vars: Vec<Variable> = self.vars.iter()
            .map(|def| {
                let definition = variable().min(def.lb).max(def.ub).name(def.name.clone());
                if def.kind.is_integral() {
                    problem_vars.add(definition.integer())
                } else {
                    problem_vars.add(definition)
                }
            })
            .collect();

        let objective = to_expression(&self.objective, &vars);
        let mut problem = problem_vars.minimise(objective).using(microlp);
        for row in rows.iter() {
            let expr = to_expression(&row.expr, &vars);
            if row.lb == row.ub {
                problem.add_constraint(expr.eq(row.lb));
                continue;
            }
            if row.lb.is_finite() && row.ub.is_finite() {
                problem.add_constraint(expr.clone().geq(row.lb));
                problem.add_constraint(expr.leq(row.ub));
            } else if row.lb.is_finite() {
                problem.add_constraint(expr.geq(row.lb));
            } else if row.ub.is_finite() {
                problem.add_constraint(expr.leq(row.ub));
            }
        }

        match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = vars.iter().map(|v| solution.value(*v)).collect();
                let mut solution = ModelSolution { values, objective: 0.0 };
                solution.objective = self.objective.evaluate(&solution);
                Ok(SolveStatus::Optimal(solution))
            }
            Err(ResolutionError::Infeasible) => Ok(SolveStatus::Infeasible),
            Err(ResolutionError::Unbounded) => Ok(SolveStatus::Unbounded),
            Err(e) => Err(AlpError::Backend(e.to_string())),
        }
    }

    fn num_variables(&self) -> usize {
        self.vars.len()
    }

    fn num_constraints(&self) -> usize {
        self.rows.len()
    }
}
