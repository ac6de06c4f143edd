use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::instance::Instance;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landing {
    pub plane: usize,
    pub time: f64,
    pub runway: usize,
}

/// Landing time and runway of every plane, indexed by plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub landings: Vec<Landing>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleViolation {
    #[error("plane {plane} lands at {time} outside of its window")]
    Window { plane: usize, time: f64 },
    #[error("planes {first} and {second} are {gap} apart, {required} required")]
    Separation { first: usize, second: usize, gap: f64, required: f64 },
    #[error("schedule has {found} landings for {expected} planes")]
    Size { found: usize, expected: usize },
}

impl Schedule {
    pub fn new(times: &[f64], runways: &[usize]) -> Self {
        let landings = times.iter().zip(runways.iter())
            .enumerate()
            .map(|(plane, (time, runway))| Landing { plane, time: *time, runway: *runway })
            .collect();
        Schedule { landings }
    }

    pub fn time(&self, plane: usize) -> f64 {
        self.landings[plane].time
    }

    pub fn runway(&self, plane: usize) -> usize {
        self.landings[plane].runway
    }

    /// Total weighted deviation from the targets.
    pub fn cost(&self, instance: &Instance) -> f64 {
        // an empty f64 sum is -0.0
        self.landings.iter()
            .map(|l| instance.planes[l.plane].cost_at(l.time))
            .sum::<f64>() + 0.0
    }

    /// Landings of each runway in landing order.
    pub fn by_runway(&self, nb_runways: usize) -> Vec<Vec<Landing>> {
        let mut runways = vec![vec![]; nb_runways];
        for landing in self.landings.iter() {
            if let Some(runway) = runways.get_mut(landing.runway) {
                runway.push(*landing);
            }
        }
        for runway in runways.iter_mut() {
            runway.sort_by(|a: &Landing, b: &Landing| a.time.total_cmp(&b.time));
        }
        runways
    }

    /// Checks windows and the separation of every pair of planes in the order they land.
    pub fn check(&self, instance: &Instance, tolerance: f64) -> Result<(), ScheduleViolation> {
        if self.landings.len() != instance.nb_planes() {
            return Err(ScheduleViolation::Size { found: self.landings.len(), expected: instance.nb_planes() });
        }
        for l in self.landings.iter() {
            let plane = &instance.planes[l.plane];
            if l.time < plane.earliest - tolerance || l.time > plane.latest + tolerance {
                return Err(ScheduleViolation::Window { plane: l.plane, time: l.time });
            }
        }
        for a in self.landings.iter() {
            for b in self.landings.iter() {
                if a.plane >= b.plane {
                    continue;
                }
                let (first, second) = if a.time <= b.time { (a, b) } else { (b, a) };
                let same = first.runway == second.runway;
                let gap = second.time - first.time;
                let required = instance.separation_between(first.plane, second.plane, same);
                let reverse = instance.separation_between(second.plane, first.plane, same);
                // on a tie either order may be the intended one
                let tie_ok = gap <= tolerance && reverse <= tolerance;
                if gap < required - tolerance && !tie_ok {
                    return Err(ScheduleViolation::Separation { first: first.plane, second: second.plane, gap, required });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Plane, SeparationMatrix};

    fn instance() -> Instance {
        Instance::new(
            vec![Plane::new(0, 0.0, 10.0, 20.0, 1.0, 2.0), Plane::new(1, 0.0, 10.0, 20.0, 3.0, 1.0)],
            SeparationMatrix::uniform(2, 5.0),
        )
        .with_runways(2, Some(SeparationMatrix::uniform(2, 1.0)))
    }

    #[test]
    fn cost_sums_weighted_deviations() {
        let schedule = Schedule::new(&[8.0, 13.0], &[0, 0]);
        assert_eq!(schedule.cost(&instance()), 2.0 + 3.0);
    }

    #[test]
    fn empty_schedule_costs_positive_zero() {
        let empty = Instance::new(vec![], SeparationMatrix::zeros(0));
        let cost = Schedule::new(&[], &[]).cost(&empty);
        assert_eq!(cost, 0.0);
        assert!(cost.is_sign_positive());
    }

    #[test]
    fn separation_depends_on_runways() {
        let inst = instance();
        assert!(Schedule::new(&[10.0, 15.0], &[0, 0]).check(&inst, 1e-6).is_ok());
        assert!(matches!(
            Schedule::new(&[10.0, 12.0], &[0, 0]).check(&inst, 1e-6),
            Err(ScheduleViolation::Separation { first: 0, second: 1, .. })
        ));
        assert!(Schedule::new(&[10.0, 11.0], &[0, 1]).check(&inst, 1e-6).is_ok());
    }

    #[test]
    fn window_violation() {
        assert!(matches!(
            Schedule::new(&[21.0, 10.0], &[0, 1]).check(&instance(), 1e-6),
            Err(ScheduleViolation::Window { plane: 0, .. })
        ));
    }

    #[test]
    fn landings_grouped_per_runway() {
        let schedule = Schedule::new(&[12.0, 10.0, 3.0], &[1, 1, 0]);
        let runways = schedule.by_runway(2);
        assert_eq!(runways[0].iter().map(|l| l.plane).collect::<Vec<_>>(), vec![2]);
        assert_eq!(runways[1].iter().map(|l| l.plane).collect::<Vec<_>>(), vec![1, 0]);
    }
}
