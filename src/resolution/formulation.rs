//! Sequencing variables shared by the decomposition master and the direct model:
//! runway assignment, pairwise order for undetermined pairs, runway equality and
//! per-plane landing time with its early/late deviation.

use std::collections::BTreeMap;

use crate::error::AlpError;
use crate::instance::Instance;
use crate::model::{ConstraintModel, LinearConstraint, LinearExpr, Literal, ModelSolution, VarId};

use super::precedence::PrecedenceSets;

/// Runway per plane and landing order of every undetermined pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscreteDecision {
    /// 0-based runway index of each plane
    pub runways: Vec<usize>,
    /// `before[(i, j)]` for every `(i, j)` in `U`
    pub before: BTreeMap<(usize, usize), bool>,
}

impl DiscreteDecision {
    pub fn same_runway(&self, i: usize, j: usize) -> bool {
        self.runways[i] == self.runways[j]
    }

    /// Rejects decisions that do not fit `instance`: a runway per plane, every
    /// runway index below the runway count, order entries between known planes.
    pub fn validate(&self, instance: &Instance) -> Result<(), AlpError> {
        let n = instance.nb_planes();
        if self.runways.len() != n {
            return Err(AlpError::InvalidDecision(format!("{} runways for {n} planes", self.runways.len())));
        }
        if let Some((plane, runway)) = self.runways.iter().enumerate().find(|(_, r)| **r >= instance.nb_runways) {
            return Err(AlpError::InvalidDecision(format!(
                "plane {plane} on runway {runway}, only {} runways", instance.nb_runways
            )));
        }
        if let Some((i, j)) = self.before.keys().find(|(i, j)| *i >= n || *j >= n || i == j) {
            return Err(AlpError::InvalidDecision(format!("order entry ({i}, {j}) does not pair two planes")));
        }
        Ok(())
    }

    /// Ordered pairs `(i, j)` with `i` landing before `j`, fixed by the windows or by the decision.
    pub fn precedences<'a>(&'a self, sets: &'a PrecedenceSets) -> impl Iterator<Item = (usize, usize)> + 'a {
        sets.fixed_pairs()
            .chain(self.before.iter().filter(|(_, b)| **b).map(|(pair, _)| *pair))
    }
}

pub(crate) struct SequencingVariables {
    pub runway: Vec<VarId>,
    pub assigned: Vec<Vec<VarId>>,
    pub before: BTreeMap<(usize, usize), VarId>,
    pub same: BTreeMap<(usize, usize), VarId>,
    pub time: Vec<VarId>,
    pub early: Vec<VarId>,
    pub late: Vec<VarId>,
}

impl SequencingVariables {
    /// Registers the variables and the sequencing constraints in `model`.
    ///
    /// Separation is enforced for `V` pairs and for `U` pairs in the chosen order.
    /// `W` pairs only get a constraint when `with_separated` is set, which matters
    /// when the cross runway separation exceeds the same runway one.
    pub fn build<M: ConstraintModel>(model: &mut M, instance: &Instance, sets: &PrecedenceSets, with_separated: bool) -> Self {
        let n = instance.nb_planes();
        let nb_runways = instance.nb_runways;

        let mut vars = SequencingVariables {
            runway: Vec::with_capacity(n),
            assigned: Vec::with_capacity(n),
            before: BTreeMap::new(),
            same: BTreeMap::new(),
            time: Vec::with_capacity(n),
            early: Vec::with_capacity(n),
            late: Vec::with_capacity(n),
        };

        for (i, plane) in instance.planes.iter().enumerate() {
            let runway = model.new_int_var(0, nb_runways as i64 - 1, &format!("r_{i}"));
            let assigned: Vec<VarId> = (0..nb_runways).map(|r| model.new_bool_var(&format!("y_{i}_{r}"))).collect();

            let mut one_hot = LinearExpr::new();
            let mut index = LinearExpr::from(runway);
            for (r, y) in assigned.iter().copied().enumerate() {
                one_hot.add_term(y, 1.0);
                index.add_term(y, -(r as f64));
            }
            model.add_linear(LinearConstraint::eq(one_hot, 1.0));
            model.add_linear(LinearConstraint::eq(index, 0.0));

            let time = model.new_real_var(plane.earliest, plane.latest, &format!("x_{i}"));
            let early = model.new_real_var(0.0, plane.max_early(), &format!("alpha_{i}"));
            let late = model.new_real_var(0.0, plane.max_late(), &format!("beta_{i}"));
            let link = LinearExpr::new().term(time, 1.0).term(early, 1.0).term(late, -1.0);
            model.add_linear(LinearConstraint::eq(link, plane.target));

            vars.runway.push(runway);
            vars.assigned.push(assigned);
            vars.time.push(time);
            vars.early.push(early);
            vars.late.push(late);
        }

        for (i, j) in sets.undetermined_pairs() {
            let b_ij = model.new_bool_var(&format!("before_{i}_{j}"));
            let b_ji = model.new_bool_var(&format!("before_{j}_{i}"));
            model.add_linear(LinearConstraint::eq(LinearExpr::new().term(b_ij, 1.0).term(b_ji, 1.0), 1.0));
            vars.before.insert((i, j), b_ij);
            vars.before.insert((j, i), b_ji);
        }

        for (i, j) in sets.v.iter().copied() {
            vars.add_separation(model, instance, i, j, &[]);
        }
        if with_separated {
            for (i, j) in sets.w.iter().copied() {
                vars.add_separation(model, instance, i, j, &[]);
            }
        }
        for (i, j) in sets.u.iter().copied() {
            let order = Literal::positive(vars.before[&(i, j)]);
            vars.add_separation(model, instance, i, j, &[order]);
        }

        vars
    }

    /// `same[i][j] <=> runway[i] == runway[j]`, created on first use. `None` on a
    /// single runway, where every pair shares it.
    fn same_runway<M: ConstraintModel>(&mut self, model: &mut M, i: usize, j: usize) -> Option<Literal> {
        if self.assigned.first().map_or(true, |a| a.len() <= 1) {
            return None;
        }
        let key = (i.min(j), i.max(j));
        if let Some(same) = self.same.get(&key) {
            return Some(Literal::positive(*same));
        }

        let (a, b) = key;
        let same = model.new_bool_var(&format!("same_{a}_{b}"));
        for (y_a, y_b) in self.assigned[a].iter().copied().zip(self.assigned[b].iter().copied()) {
            let both = LinearExpr::new().term(y_a, 1.0).term(y_b, 1.0).term(same, -1.0);
            model.add_linear(LinearConstraint::leq(both, 1.0));
        }
        model.add_implication(
            &[Literal::positive(same)],
            LinearConstraint::eq(LinearExpr::difference(self.runway[a], self.runway[b]), 0.0),
        );
        self.same.insert(key, same);
        Some(Literal::positive(same))
    }

    /// `condition => time[j] >= time[i] + sep`, the gap picked by runway equality.
    fn add_separation<M: ConstraintModel>(&mut self, model: &mut M, instance: &Instance, i: usize, j: usize, condition: &[Literal]) {
        let gap = LinearExpr::difference(self.time[j], self.time[i]);
        match self.same_runway(model, i, j) {
            None => {
                model.add_implication(condition, LinearConstraint::geq(gap, instance.same_runway_separation(i, j)));
            }
            Some(same) => {
                let mut on_same = condition.to_vec();
                on_same.push(same);
                model.add_implication(&on_same, LinearConstraint::geq(gap.clone(), instance.same_runway_separation(i, j)));

                let mut on_cross = condition.to_vec();
                on_cross.push(!same);
                model.add_implication(&on_cross, LinearConstraint::geq(gap, instance.cross_runway_separation(i, j)));
            }
        }
    }

    /// `sum coefficient(penalty_early) * alpha + coefficient(penalty_late) * beta`
    pub fn deviation_cost(&self, instance: &Instance, coefficient: impl Fn(f64) -> f64) -> LinearExpr {
        let mut cost = LinearExpr::new();
        for (i, plane) in instance.planes.iter().enumerate() {
            cost.add_term(self.early[i], coefficient(plane.penalty_early));
            cost.add_term(self.late[i], coefficient(plane.penalty_late));
        }
        cost
    }

    pub fn runway_literal(&self, plane: usize, runway: usize) -> Option<Literal> {
        self.assigned.get(plane).and_then(|a| a.get(runway)).map(|y| Literal::positive(*y))
    }

    pub fn before_literal(&self, first: usize, second: usize, value: bool) -> Option<Literal> {
        self.before.get(&(first, second)).map(|var| Literal::with_value(*var, value))
    }

    pub fn decision(&self, solution: &ModelSolution) -> DiscreteDecision {
        let runways = self.assigned.iter()
            .map(|assigned| assigned.iter().position(|y| solution.bool_value(*y)).unwrap_or(0))
            .collect();
        let before = self.before.iter()
            .map(|(pair, var)| (*pair, solution.bool_value(*var)))
            .collect();
        DiscreteDecision { runways, before }
    }

    pub fn times(&self, solution: &ModelSolution) -> Vec<f64> {
        self.time.iter().map(|t| solution.value(*t)).collect()
    }
}
