//! Single-shot model: the whole problem as one mixed integer program, without
//! decomposition. Slower on large instances but a convenient reference.

use crate::error::AlpError;
use crate::instance::Instance;
use crate::model::{ConstraintModel, SolveStatus};

use super::formulation::SequencingVariables;
use super::precedence::PrecedenceSets;
use super::schedule::Schedule;

/// Optimal schedule of `instance`, `None` when it has none.
pub fn solve_direct<M: ConstraintModel + Default>(instance: &Instance) -> Result<Option<Schedule>, AlpError> {
    instance.validate()?;
    let sets = PrecedenceSets::classify(instance)?;

    let mut model = M::default();
    let vars = SequencingVariables::build(&mut model, instance, &sets, true);
    let cost = vars.deviation_cost(instance, |penalty| penalty);
    model.minimize(cost);

    match model.solve()? {
        SolveStatus::Optimal(solution) => {
            let decision = vars.decision(&solution);
            Ok(Some(Schedule::new(&vars.times(&solution), &decision.runways)))
        }
        SolveStatus::Infeasible => Ok(None),
        SolveStatus::Unbounded => Err(AlpError::Backend("direct model reported unbounded".to_string())),
    }
}
