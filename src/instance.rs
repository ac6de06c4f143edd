//! This module defines an abstract representation of a ALP instance.

use serde::{Serialize, Deserialize};

use crate::error::AlpError;

/// One aircraft with its landing window and deviation penalties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub id: usize,
    #[serde(default)]
    pub appearance_time: f64,
    pub earliest: f64,
    pub target: f64,
    pub latest: f64,
    pub penalty_early: f64,
    pub penalty_late: f64,
}

impl Plane {
    pub fn new(id: usize, earliest: f64, target: f64, latest: f64, penalty_early: f64, penalty_late: f64) -> Self {
        Plane { id, appearance_time: earliest, earliest, target, latest, penalty_early, penalty_late }
    }

    /// Weighted deviation of a landing at `time` from the target.
    pub fn cost_at(&self, time: f64) -> f64 {
        if time < self.target {
            self.penalty_early * (self.target - time)
        } else {
            self.penalty_late * (time - self.target)
        }
    }

    pub fn max_early(&self) -> f64 {
        (self.target - self.earliest).max(0.0)
    }

    pub fn max_late(&self) -> f64 {
        (self.latest - self.target).max(0.0)
    }
}

/// Square matrix of minimum separation times, `sep[i][j]` being the gap required
/// when `i` lands before `j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeparationMatrix {
    rows: Vec<Vec<f64>>,
}

impl SeparationMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        SeparationMatrix { rows }
    }

    pub fn zeros(n: usize) -> Self {
        Self::uniform(n, 0.0)
    }

    /// Every off-diagonal entry set to `value`.
    pub fn uniform(n: usize, value: f64) -> Self {
        let rows = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 0.0 } else { value }).collect())
            .collect();
        SeparationMatrix { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }

    pub fn max_value(&self) -> f64 {
        self.rows.iter().flatten().copied().fold(0.0, f64::max)
    }

    fn validate(&self, n: usize, what: &str) -> Result<(), AlpError> {
        if self.rows.len() != n {
            return Err(AlpError::MalformedInstance(format!("{what} has {} rows, expected {n}", self.rows.len())));
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != n {
                return Err(AlpError::MalformedInstance(format!("{what} row {i} has {} entries, expected {n}", row.len())));
            }
            for (j, sep) in row.iter().copied().enumerate() {
                if i != j && !(sep.is_finite() && sep >= 0.0) {
                    return Err(AlpError::MalformedInstance(format!("{what}[{i}][{j}] = {sep} is not a non-negative number")));
                }
            }
        }
        Ok(())
    }
}

fn single_runway() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub planes: Vec<Plane>,
    /// Separation between two aircrafts landing on the same runway
    pub separation: SeparationMatrix,
    /// Separation between two aircrafts landing on different runways
    #[serde(default)]
    pub cross_separation: Option<SeparationMatrix>,
    #[serde(default = "single_runway")]
    pub nb_runways: usize,
}

impl Instance {
    /// A single runway instance.
    pub fn new(planes: Vec<Plane>, separation: SeparationMatrix) -> Self {
        Instance { planes, separation, cross_separation: None, nb_runways: 1 }
    }

    pub fn with_runways(mut self, nb_runways: usize, cross_separation: Option<SeparationMatrix>) -> Self {
        self.nb_runways = nb_runways;
        self.cross_separation = cross_separation;
        self
    }

    pub fn nb_planes(&self) -> usize {
        self.planes.len()
    }

    #[inline]
    pub fn same_runway_separation(&self, i: usize, j: usize) -> f64 {
        self.separation.get(i, j)
    }

    /// Falls back to zero when no cross runway matrix was given.
    #[inline]
    pub fn cross_runway_separation(&self, i: usize, j: usize) -> f64 {
        self.cross_separation.as_ref().map(|m| m.get(i, j)).unwrap_or(0.0)
    }

    #[inline]
    pub fn separation_between(&self, i: usize, j: usize, same_runway: bool) -> f64 {
        if same_runway {
            self.same_runway_separation(i, j)
        } else {
            self.cross_runway_separation(i, j)
        }
    }

    /// Rejects windows violating `earliest <= target <= latest`, negative penalties
    /// and separation matrices that are not square non-negative `n x n` matrices.
    pub fn validate(&self) -> Result<(), AlpError> {
        if self.nb_runways == 0 {
            return Err(AlpError::MalformedInstance("at least one runway is required".to_string()));
        }
        for (i, p) in self.planes.iter().enumerate() {
            let values = [p.earliest, p.target, p.latest, p.penalty_early, p.penalty_late];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(AlpError::MalformedInstance(format!("plane {i} has a non-finite field")));
            }
            if !(p.earliest <= p.target && p.target <= p.latest) {
                return Err(AlpError::MalformedInstance(format!(
                    "plane {i} window [{}, {}, {}] is not ordered", p.earliest, p.target, p.latest
                )));
            }
            if p.penalty_early < 0.0 || p.penalty_late < 0.0 {
                return Err(AlpError::MalformedInstance(format!("plane {i} has a negative penalty")));
            }
        }
        let n = self.nb_planes();
        self.separation.validate(n, "separation")?;
        if let Some(cross) = self.cross_separation.as_ref() {
            cross.validate(n, "cross separation")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_planes() -> Instance {
        Instance::new(
            vec![Plane::new(0, 0.0, 10.0, 20.0, 1.0, 2.0), Plane::new(1, 5.0, 15.0, 30.0, 3.0, 1.0)],
            SeparationMatrix::new(vec![vec![0.0, 4.0], vec![6.0, 0.0]]),
        )
    }

    #[test]
    fn valid_instance_passes() {
        assert!(two_planes().validate().is_ok());
    }

    #[test]
    fn unordered_window_is_rejected() {
        let mut instance = two_planes();
        instance.planes[1].target = 40.0;
        assert!(matches!(instance.validate(), Err(AlpError::MalformedInstance(_))));
    }

    #[test]
    fn non_square_separation_is_rejected() {
        let mut instance = two_planes();
        instance.separation = SeparationMatrix::new(vec![vec![0.0, 4.0]]);
        assert!(matches!(instance.validate(), Err(AlpError::MalformedInstance(_))));

        let mut instance = two_planes();
        instance.separation = SeparationMatrix::new(vec![vec![0.0, 4.0], vec![6.0]]);
        assert!(matches!(instance.validate(), Err(AlpError::MalformedInstance(_))));
    }

    #[test]
    fn negative_cross_separation_is_rejected() {
        let instance = two_planes().with_runways(2, Some(SeparationMatrix::new(vec![vec![0.0, -1.0], vec![1.0, 0.0]])));
        assert!(matches!(instance.validate(), Err(AlpError::MalformedInstance(_))));
    }

    #[test]
    fn zero_runways_is_rejected() {
        let instance = two_planes().with_runways(0, None);
        assert!(instance.validate().is_err());
    }

    #[test]
    fn missing_cross_separation_defaults_to_zero() {
        let instance = two_planes().with_runways(2, None);
        assert_eq!(instance.cross_runway_separation(0, 1), 0.0);
        assert_eq!(instance.separation_between(1, 0, true), 6.0);
    }

    #[test]
    fn cost_is_asymmetric() {
        let plane = Plane::new(0, 0.0, 10.0, 20.0, 1.0, 2.0);
        assert_eq!(plane.cost_at(7.0), 3.0);
        assert_eq!(plane.cost_at(13.0), 6.0);
        assert_eq!(plane.cost_at(10.0), 0.0);
    }

    #[test]
    fn uniform_matrix_has_zero_diagonal() {
        let m = SeparationMatrix::uniform(3, 2.5);
        assert_eq!(m.get(1, 1), 0.0);
        assert_eq!(m.get(0, 2), 2.5);
        assert_eq!(m.max_value(), 2.5);
    }
}
