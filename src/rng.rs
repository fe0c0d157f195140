use getrandom::getrandom;
use log::warn;
use oorandom::Rand64;

/// Source of uniformly distributed floats in [0, 1).
///
/// The search engine draws exactly one value per active ant per step, in ant order,
/// so any source replaying the same sequence reproduces the same run.
pub trait RandomSource {
    fn next_float(&mut self) -> f64;
}

impl RandomSource for Rand64 {
    fn next_float(&mut self) -> f64 {
        self.rand_float()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_float(&mut self) -> f64 {
        (**self).next_float()
    }
}

/// Replays a fixed list of draws, starting over once the list is exhausted.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    draws: Vec<f64>,
    position: usize,
}

impl SequenceSource {
    /// Values outside of [0, 1) are clamped into that range.
    pub fn new(draws: Vec<f64>) -> Self {
        let draws = if draws.is_empty() {
            vec![0.0]
        } else {
            draws
                .into_iter()
                .map(|draw| draw.max(0.0).min(1.0 - f64::EPSILON))
                .collect()
        };

        SequenceSource { draws, position: 0 }
    }

    /// Amount of values drawn so far.
    pub fn consumed(&self) -> usize {
        self.position
    }
}

impl RandomSource for SequenceSource {
    fn next_float(&mut self) -> f64 {
        let draw = self.draws[self.position % self.draws.len()];
        self.position += 1;
        draw
    }
}

pub fn rng64(seed: u128) -> Rand64 {
    Rand64::new(seed)
}

pub fn os_random_seed() -> u128 {
    let mut buf = [0; 16];
    if let Err(err) = getrandom(&mut buf) {
        warn!("could not draw a seed from the OS, using 0: {}", err);
    }
    u128::from_le_bytes(buf)
}
