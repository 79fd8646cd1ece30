//! Exhaustible random draw — pick without replacement from an owned pool.

use rand::Rng;

/// A shrinking pool. Each draw removes a uniformly chosen element.
#[derive(Debug, Clone)]
pub struct ExhaustibleDraw<T> {
    remaining: Vec<T>,
}

impl<T> ExhaustibleDraw<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { remaining: items }
    }

    /// Remove and return a random element, `None` once exhausted.
    pub fn draw(&mut self, rng: &mut impl Rng) -> Option<T> {
        if self.remaining.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.remaining.len());
        Some(self.remaining.swap_remove(idx))
    }
}

impl<T: Clone> From<&[T]> for ExhaustibleDraw<T> {
    fn from(items: &[T]) -> Self {
        Self::new(items.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_draws_each_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pool = ExhaustibleDraw::new((0..20).collect::<Vec<u32>>());
        let mut seen = HashSet::new();
        while let Some(v) = pool.draw(&mut rng) {
            assert!(seen.insert(v), "drew {} twice", v);
        }
        assert_eq!(seen.len(), 20);
        assert!(pool.draw(&mut rng).is_none());
    }

    #[test]
    fn test_empty_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pool: ExhaustibleDraw<u8> = ExhaustibleDraw::new(vec![]);
        assert!(pool.draw(&mut rng).is_none());
    }
}
