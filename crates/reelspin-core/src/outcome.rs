use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Decides winners before any animation starts.
///
/// Simulations never pick their own outcome; they animate toward whatever a
/// resolver chose.
pub trait OutcomeResolver {
    /// Pick an index in `0..pool_size`. `pool_size` is always > 0.
    fn pick(&mut self, pool_size: usize) -> usize;
}

/// Uniform picks from a seeded `StdRng`.
pub struct SeededResolver {
    rng: StdRng,
}

impl SeededResolver {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl OutcomeResolver for SeededResolver {
    fn pick(&mut self, pool_size: usize) -> usize {
        self.rng.random_range(0..pool_size.max(1))
    }
}

/// Replays a scripted list of picks, wrapping each into range. Used for
/// rigged demos and tests.
pub struct FixedResolver {
    picks: Vec<usize>,
    next: usize,
}

impl FixedResolver {
    pub fn new(picks: Vec<usize>) -> Self {
        Self { picks, next: 0 }
    }
}

impl OutcomeResolver for FixedResolver {
    fn pick(&mut self, pool_size: usize) -> usize {
        let pool_size = pool_size.max(1);
        let value = if self.picks.is_empty() {
            0
        } else {
            self.picks[self.next % self.picks.len()]
        };
        self.next += 1;
        value % pool_size
    }
}

/// Pick one winner per column.
pub fn resolve_columns(resolver: &mut dyn OutcomeResolver, pool_sizes: &[usize]) -> Vec<usize> {
    pool_sizes
        .iter()
        .map(|&size| resolver.pick(size))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_resolver_is_deterministic() {
        let mut a = SeededResolver::new(7);
        let mut b = SeededResolver::new(7);
        let picks_a = resolve_columns(&mut a, &[10, 20, 30, 5]);
        let picks_b = resolve_columns(&mut b, &[10, 20, 30, 5]);
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn seeded_resolver_stays_in_range() {
        let mut r = SeededResolver::new(99);
        for size in 1..50 {
            assert!(r.pick(size) < size);
        }
    }

    #[test]
    fn fixed_resolver_replays_and_wraps() {
        let mut r = FixedResolver::new(vec![3, 12]);
        assert_eq!(r.pick(10), 3);
        assert_eq!(r.pick(10), 2);
        assert_eq!(r.pick(10), 3);
    }

    #[test]
    fn fixed_resolver_empty_script_picks_zero() {
        let mut r = FixedResolver::new(Vec::new());
        assert_eq!(r.pick(4), 0);
    }
}
