use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Example indices of the three partitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatasetSplit {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
    pub test: Vec<usize>,
}

impl DatasetSplit {
    pub fn total(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }
}

/// Seeded split stratified on a binary label.
///
/// Each class is shuffled and divided on its own, so every partition keeps
/// the class balance of the whole dataset. The remainder after the training
/// share is halved between validation and test.
#[derive(Debug, Clone)]
pub struct DatasetSplitter {
    pub train_fraction: f64,
    pub seed: u64,
}

impl Default for DatasetSplitter {
    fn default() -> Self {
        Self {
            train_fraction: 0.7,
            seed: 42,
        }
    }
}

impl DatasetSplitter {
    pub fn new(train_fraction: f64, seed: u64) -> Self {
        Self {
            train_fraction,
            seed,
        }
    }

    pub fn split(&self, labels: &[bool]) -> DatasetSplit {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut split = DatasetSplit::default();

        for class in [false, true] {
            let mut indices: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, label)| **label == class)
                .map(|(i, _)| i)
                .collect();
            indices.shuffle(&mut rng);

            let n = indices.len();
            let n_train = ((n as f64 * self.train_fraction).round() as usize).min(n);
            let n_val = (((n - n_train) as f64) * 0.5).round() as usize;

            split.train.extend_from_slice(&indices[..n_train]);
            split.val.extend_from_slice(&indices[n_train..n_train + n_val]);
            split.test.extend_from_slice(&indices[n_train + n_val..]);
        }

        split.train.shuffle(&mut rng);
        split.val.shuffle(&mut rng);
        split.test.shuffle(&mut rng);
        split
    }
}
