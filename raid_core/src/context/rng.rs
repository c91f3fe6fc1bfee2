//! Seedable battle RNG.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// The only source of randomness in a battle.
#[derive(Debug, Clone)]
pub struct BattleRng {
    inner: StdRng,
}

impl BattleRng {
    /// Seeded RNG, or entropy-seeded when `seed` is `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let inner = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { inner }
    }

    /// Uniform roll in `[0, 1)`.
    pub fn roll(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Bernoulli trial. Probabilities outside `(0, 1)` never touch the generator.
    pub fn chance(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            false
        } else if probability >= 1.0 {
            true
        } else {
            self.roll() < probability
        }
    }

    /// Uniform choice from `items`, `None` when empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = BattleRng::new(Some(9));
        let mut b = BattleRng::new(Some(9));
        for _ in 0..16 {
            assert_eq!(a.roll(), b.roll());
        }
    }

    #[test]
    fn test_chance_edges() {
        let mut rng = BattleRng::new(Some(1));
        assert!(!rng.chance(0.0));
        assert!(!rng.chance(-3.0));
        assert!(rng.chance(1.0));
    }

    #[test]
    fn test_pick() {
        let mut rng = BattleRng::new(Some(3));
        let empty: [u8; 0] = [];
        assert_eq!(rng.pick(&empty), None);

        let items = [1, 2, 3];
        let picked = *rng.pick(&items).unwrap();
        assert!(items.contains(&picked));
    }
}
