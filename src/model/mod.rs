//! Backend independent constraint model.
//!
//! The sequencing master, the timing subproblem and the direct model only talk to
//! a [`ConstraintModel`]: they create variables, register linear constraints and
//! implications, set a linear objective and ask for a solve. Which library actually
//! searches the model is decided by the implementor.

use std::ops::Not;

use crate::error::AlpError;

mod milp;

pub use milp::MilpModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Integer,
    Boolean,
    Continuous,
}

impl VarKind {
    pub fn is_integral(self) -> bool {
        !matches!(self, VarKind::Continuous)
    }
}

/// A boolean variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    pub var: VarId,
    pub negated: bool,
}

impl Literal {
    pub fn positive(var: VarId) -> Self {
        Literal { var, negated: false }
    }

    /// The literal that holds when `var` takes `value`.
    pub fn with_value(var: VarId, value: bool) -> Self {
        Literal { var, negated: !value }
    }

    pub fn is_satisfied_by(self, solution: &ModelSolution) -> bool {
        solution.bool_value(self.var) != self.negated
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal { var: self.var, negated: !self.negated }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        LinearExpr { terms: vec![], constant: value }
    }

    pub fn term(mut self, var: VarId, coeff: f64) -> Self {
        self.add_term(var, coeff);
        self
    }

    pub fn add_term(&mut self, var: VarId, coeff: f64) {
        if coeff != 0.0 {
            self.terms.push((var, coeff));
        }
    }

    /// `a - b`
    pub fn difference(a: VarId, b: VarId) -> Self {
        LinearExpr::new().term(a, 1.0).term(b, -1.0)
    }

    pub fn evaluate(&self, solution: &ModelSolution) -> f64 {
        self.terms.iter().fold(self.constant, |acc, (v, c)| acc + c * solution.value(*v))
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::new().term(var, 1.0)
    }
}

/// `lb <= expr <= ub`, either side possibly infinite.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub expr: LinearExpr,
    pub lb: f64,
    pub ub: f64,
}

impl LinearConstraint {
    pub fn geq(expr: impl Into<LinearExpr>, rhs: f64) -> Self {
        LinearConstraint { expr: expr.into(), lb: rhs, ub: f64::INFINITY }
    }

    pub fn leq(expr: impl Into<LinearExpr>, rhs: f64) -> Self {
        LinearConstraint { expr: expr.into(), lb: f64::NEG_INFINITY, ub: rhs }
    }

    pub fn eq(expr: impl Into<LinearExpr>, rhs: f64) -> Self {
        LinearConstraint { expr: expr.into(), lb: rhs, ub: rhs }
    }
}

/// Values of every variable at the optimum the backend reported.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSolution {
    pub values: Vec<f64>,
    pub objective: f64,
}

impl ModelSolution {
    #[inline]
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.0]
    }

    pub fn int_value(&self, var: VarId) -> i64 {
        self.value(var).round() as i64
    }

    pub fn bool_value(&self, var: VarId) -> bool {
        self.value(var) > 0.5
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    Optimal(ModelSolution),
    Infeasible,
    Unbounded,
}

/// Capability interface over a mutable discrete/linear model.
///
/// Constraints are only ever added. Implementors may translate the model into
/// an external solver lazily in [`ConstraintModel::solve`], which can be called
/// repeatedly as constraints keep being appended.
pub trait ConstraintModel {
    fn new_int_var(&mut self, lb: i64, ub: i64, name: &str) -> VarId;
    fn new_bool_var(&mut self, name: &str) -> VarId;
    fn new_real_var(&mut self, lb: f64, ub: f64, name: &str) -> VarId;
    fn add_linear(&mut self, constraint: LinearConstraint);
    /// `condition[0] && condition[1] && ... => constraint`. An empty condition
    /// adds the constraint unconditionally.
    fn add_implication(&mut self, condition: &[Literal], constraint: LinearConstraint);
    /// At least one of `literals` holds.
    fn add_clause(&mut self, literals: &[Literal]);
    fn minimize(&mut self, objective: LinearExpr);
    fn solve(&mut self) -> Result<SolveStatus, AlpError>;
    fn num_variables(&self) -> usize;
    fn num_constraints(&self) -> usize;
}
