use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Train/test membership for one label class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipSplit {
    pub train: Vec<String>,
    pub test: Vec<String>,
}

impl ClipSplit {
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Number of clips held out for testing: `floor(len * fraction)`.
pub fn test_count(len: usize, test_fraction: f64) -> usize {
    // Nudge before flooring so 0.7 * 10 style products don't land on 6.999..
    let n = (len as f64 * test_fraction + 1e-9).floor() as usize;
    n.min(len)
}

/// Randomly hold out `floor(len * test_fraction)` clips for testing.
///
/// The test set comes back in sampling order, the train set in the order of
/// `clips`. Same inputs and seed always give the same split.
pub fn split_clips(clips: &[String], test_fraction: f64, seed: u64) -> ClipSplit {
    let n_test = test_count(clips.len(), test_fraction);
    let mut rng = StdRng::seed_from_u64(seed);
    let picked = rand::seq::index::sample(&mut rng, clips.len(), n_test);

    let test: Vec<String> = picked.iter().map(|i| clips[i].clone()).collect();
    let held_out: HashSet<usize> = picked.iter().collect();
    let train = clips
        .iter()
        .enumerate()
        .filter(|(i, _)| !held_out.contains(i))
        .map(|(_, clip)| clip.clone())
        .collect();

    ClipSplit { train, test }
}
