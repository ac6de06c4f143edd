use std::time::{SystemTime, UNIX_EPOCH};

use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use rand_distr::{Uniform, Normal, Exp, Distribution};

use crate::instance::{Instance, Plane, SeparationMatrix};

#[derive(Debug, Clone, Args)]
pub struct InstanceGenerator {
    /// An optional seed to kickstart the instance generation
    #[clap(short='s', long)]
    seed: Option<u128>,
    /// The number of aircrafts
    #[clap(short='n', long, default_value="10")]
    nb_planes: usize,
    /// The number of runways
    #[clap(short='r', long, default_value="1")]
    nb_runways: usize,
    /// The number of aircraft classes
    #[clap(short='k', long, default_value="3")]
    nb_classes: usize,
    /// The average time between two aircraft targets
    #[clap(long, default_value="15")]
    avg_interarrival_time: f64,
    /// The maximum time an aircraft may land before its target
    #[clap(long, default_value="20")]
    max_early_slack: isize,
    /// The maximum time an aircraft may land after its target
    #[clap(long, default_value="60")]
    max_late_slack: isize,
    /// The minimum separation position used to generate the pairwise separation times
    #[clap(long, default_value="3")]
    min_separation_position: isize,
    /// The maximum separation position used to generate the pairwise separation times
    #[clap(long, default_value="12")]
    max_separation_position: isize,
    /// The std deviation of the separation position of a class
    #[clap(long, default_value="2")]
    separation_position_std_dev: f64,
    /// The maximum separation between aircrafts landing on different runways
    #[clap(long, default_value="3")]
    max_cross_separation: isize,
    /// The maximum penalty per time unit of deviation
    #[clap(long, default_value="5")]
    max_penalty: isize,
}

impl Default for InstanceGenerator {
    fn default() -> Self {
        InstanceGenerator {
            seed: None,
            nb_planes: 10,
            nb_runways: 1,
            nb_classes: 3,
            avg_interarrival_time: 15.0,
            max_early_slack: 20,
            max_late_slack: 60,
            min_separation_position: 3,
            max_separation_position: 12,
            separation_position_std_dev: 2.0,
            max_cross_separation: 3,
            max_penalty: 5,
        }
    }
}

impl InstanceGenerator {

    pub fn with_seed(mut self, seed: u128) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_planes(mut self, nb_planes: usize) -> Self {
        self.nb_planes = nb_planes;
        self
    }

    pub fn with_runways(mut self, nb_runways: usize) -> Self {
        self.nb_runways = nb_runways;
        self
    }

    pub fn with_interarrival_time(mut self, avg: f64) -> Self {
        self.avg_interarrival_time = avg;
        self
    }

    /// Generates an instance with integral times, separations and penalties.
    pub fn generate(&self) -> Instance {
        let mut rng = self.rng();

        let classes = self.generate_classes(&mut rng);
        let class_separation = self.generate_class_separation(&mut rng);
        let planes = self.generate_planes(&mut rng);

        let separation = SeparationMatrix::new(
            (0..self.nb_planes)
                .map(|i| (0..self.nb_planes)
                    .map(|j| if i == j { 0.0 } else { class_separation[classes[i]][classes[j]] as f64 })
                    .collect())
                .collect(),
        );

        let cross_separation = if self.nb_runways > 1 {
            Some(self.generate_cross_separation(&mut rng))
        } else {
            None
        };

        Instance::new(planes, separation).with_runways(self.nb_runways, cross_separation)
    }

    fn generate_classes(&self, rng: &mut impl Rng) -> Vec<usize> {
        let rand_class = Uniform::new(0, self.nb_classes.max(1));
        (0..self.nb_planes).map(|_| rand_class.sample(rng)).collect()
    }

    /// Each class gets a position on a line; separating `a` then `b` takes the
    /// position of `b` shifted by how much heavier `a` is.
    fn generate_class_separation(&self, rng: &mut impl Rng) -> Vec<Vec<isize>> {
        let nb_classes = self.nb_classes.max(1);
        let rand_centroid = Uniform::new_inclusive(self.min_separation_position, self.max_separation_position);
        let positions = (0..nb_classes)
            .map(|_| {
                let centroid = rand_centroid.sample(rng) as f64;
                match Normal::new(centroid, self.separation_position_std_dev) {
                    Ok(normal) => normal.sample(rng).round().max(0.0) as isize,
                    Err(_) => centroid as isize,
                }
            })
            .collect::<Vec<isize>>();

        let mut separation = vec![vec![0; nb_classes]; nb_classes];
        for a in 0..nb_classes {
            for b in 0..nb_classes {
                separation[a][b] = positions[b] + (positions[a] - positions[b]).max(0) / 2;
            }
        }
        separation
    }

    fn generate_planes(&self, rng: &mut impl Rng) -> Vec<Plane> {
        let mut planes = vec![];
        let interarrival = Exp::new(1.0 / self.avg_interarrival_time.max(1e-3)).ok();
        let early = Uniform::new_inclusive(0, self.max_early_slack.max(0));
        let late = Uniform::new_inclusive(0, self.max_late_slack.max(0));
        let penalty = Uniform::new_inclusive(1, self.max_penalty.max(1));

        let mut target = 0_isize;
        for i in 0..self.nb_planes {
            if i > 0 {
                let gap = interarrival.as_ref().map(|d| d.sample(rng)).unwrap_or(0.0);
                target += gap.round() as isize;
            }
            let earliest = (target - early.sample(rng)).max(0);
            let latest = target + late.sample(rng);
            let mut plane = Plane::new(i, earliest as f64, target as f64, latest as f64, penalty.sample(rng) as f64, penalty.sample(rng) as f64);
            plane.appearance_time = (earliest - self.max_early_slack).max(0) as f64;
            planes.push(plane);
        }
        planes
    }

    fn generate_cross_separation(&self, rng: &mut impl Rng) -> SeparationMatrix {
        let rand = Uniform::new_inclusive(0, self.max_cross_separation.max(0));
        SeparationMatrix::new(
            (0..self.nb_planes)
                .map(|i| (0..self.nb_planes).map(|j| if i == j { 0.0 } else { rand.sample(rng) as f64 }).collect())
                .collect(),
        )
    }

    fn rng(&self) -> impl Rng {
        let init = self.seed.unwrap_or_else(|| SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0));
        let mut seed = [0_u8; 32];
        seed.iter_mut().zip(init.to_be_bytes().into_iter()).for_each(|(s, i)| *s = i);
        seed.iter_mut().rev().zip(init.to_le_bytes().into_iter()).for_each(|(s, i)| *s = i);
        ChaChaRng::from_seed(seed)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_instances_are_valid() {
        for seed in 0..10 {
            let instance = InstanceGenerator::default().with_seed(seed).with_runways(2).generate();
            assert_eq!(instance.nb_planes(), 10);
            assert_eq!(instance.nb_runways, 2);
            assert!(instance.cross_separation.is_some());
            assert!(instance.validate().is_ok());
        }
    }

    #[test]
    fn same_seed_same_instance() {
        let a = InstanceGenerator::default().with_seed(42).generate();
        let b = InstanceGenerator::default().with_seed(42).generate();
        assert_eq!(a, b);
    }

    #[test]
    fn targets_are_non_decreasing() {
        let instance = InstanceGenerator::default().with_seed(3).with_planes(30).generate();
        for pair in instance.planes.windows(2) {
            assert!(pair[0].target <= pair[1].target);
        }
    }
}
