use rand::Rng;
use rand::RngCore;

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl<R: RngCore + ?Sized> RandomSource for R {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Replays a fixed sequence of draws, wrapping around when exhausted.
///
/// An empty script always yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, cursor: 0 }
    }

    /// Draws consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn scripted_draws_wrap() {
        let mut random = ScriptedRandom::new(vec![0.25, 0.75]);
        let drawn: Vec<f64> = (0..5).map(|_| random.next_f64()).collect();
        assert_eq!(drawn, vec![0.25, 0.75, 0.25, 0.75, 0.25]);
        assert_eq!(random.consumed(), 5);
        assert_eq!(ScriptedRandom::default().next_f64(), 0.0);
    }

    #[test]
    fn seeded_rngs_repeat() {
        let mut first = StdRng::seed_from_u64(7);
        let mut second = StdRng::seed_from_u64(7);
        for _ in 0..16 {
            let value = first.next_f64();
            assert!((0.0..1.0).contains(&value));
            assert_eq!(value, second.next_f64());
        }
    }
}
