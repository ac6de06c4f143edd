//! Classification of ordered plane pairs by how much their windows already
//! decide about the landing order.

use std::collections::BTreeSet;

use crate::error::AlpError;
use crate::instance::Instance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecedenceClass {
    /// `i` lands before `j` and the windows alone guarantee the separation.
    Separated,
    /// `i` lands before `j` but the separation must be enforced.
    Ordered,
    /// The windows overlap, the order is left to the master.
    Undetermined,
    /// `j` is forced before `i`; the pair is modelled through its reverse.
    Reversed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecedenceSets {
    pub w: BTreeSet<(usize, usize)>,
    pub v: BTreeSet<(usize, usize)>,
    pub u: BTreeSet<(usize, usize)>,
}

impl PrecedenceSets {
    /// Classifies every ordered pair of distinct planes.
    ///
    /// For `L_i < E_j` the pair goes to `W` when `L_i + S_ij <= E_j` and to `V`
    /// otherwise; the reverse `(j, i)` of such a pair cannot be realised and is
    /// left out. Pairs whose windows intersect go to `U`, which is therefore
    /// symmetric. Anything else breaks the window invariant of the instance.
    pub fn classify(instance: &Instance) -> Result<Self, AlpError> {
        let mut sets = PrecedenceSets::default();
        let planes = &instance.planes;

        for (i, pi) in planes.iter().enumerate() {
            for (j, pj) in planes.iter().enumerate() {
                if i == j {
                    continue;
                }
                let (e_i, l_i) = (pi.earliest, pi.latest);
                let (e_j, l_j) = (pj.earliest, pj.latest);
                let s_ij = instance.same_runway_separation(i, j);

                if l_i < e_j && l_i + s_ij <= e_j {
                    sets.w.insert((i, j));
                } else if l_i < e_j {
                    sets.v.insert((i, j));
                } else if l_j < e_i {
                    // handled when the loop reaches (j, i)
                } else if windows_overlap(e_i, l_i, e_j, l_j) {
                    sets.u.insert((i, j));
                } else {
                    return Err(AlpError::UnclassifiedPair { first: i, second: j });
                }
            }
        }

        Ok(sets)
    }

    pub fn class_of(&self, i: usize, j: usize) -> Option<PrecedenceClass> {
        if self.w.contains(&(i, j)) {
            Some(PrecedenceClass::Separated)
        } else if self.v.contains(&(i, j)) {
            Some(PrecedenceClass::Ordered)
        } else if self.u.contains(&(i, j)) {
            Some(PrecedenceClass::Undetermined)
        } else if self.w.contains(&(j, i)) || self.v.contains(&(j, i)) {
            Some(PrecedenceClass::Reversed)
        } else {
            None
        }
    }

    /// `(i, j)` with `i` forced before `j` by the windows.
    pub fn fixed_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.w.iter().chain(self.v.iter()).copied()
    }

    /// Each unordered pair of `U` once, as `(i, j)` with `i < j`.
    pub fn undetermined_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.u.iter().copied().filter(|(i, j)| i < j)
    }

    pub fn len(&self) -> usize {
        self.w.len() + self.v.len() + self.u.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The four ways two closed intervals can intersect.
fn windows_overlap(e_i: f64, l_i: f64, e_j: f64, l_j: f64) -> bool {
    (e_j <= e_i && e_i <= l_j)
        || (e_j <= l_i && l_i <= l_j)
        || (e_i <= e_j && e_j <= l_i)
        || (e_i <= l_j && l_j <= l_i)
}
