use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use tracing::warn;

/// Build the RNG used for one quiz.
///
/// A seed gives a reproducible quiz. Without one the generator is seeded from
/// the operating system's entropy source, falling back to the clock if that
/// source is unavailable.
pub fn quiz_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(OsRng).unwrap_or_else(|err| {
            warn!(error = %err, "OS entropy unavailable, seeding quiz RNG from the clock");
            let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
            StdRng::seed_from_u64(nanos as u64)
        }),
    }
}

/// Fisher-Yates shuffle in place.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Shuffle an owned sequence and hand it back.
pub fn shuffled<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    shuffle(&mut items, rng);
    items
}

/// Draw `min(n, pool.len())` distinct elements in random order.
///
/// The pool itself is left untouched; a copy is shuffled and truncated.
pub fn sample<T: Clone, R: Rng + ?Sized>(pool: &[T], n: usize, rng: &mut R) -> Vec<T> {
    if n == 0 || pool.is_empty() {
        return Vec::new();
    }
    let mut picks = shuffled(pool.to_vec(), rng);
    picks.truncate(n.min(pool.len()));
    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut items: Vec<u32> = (0..52).collect();
        shuffle(&mut items, &mut rng);

        let seen: HashSet<u32> = items.iter().copied().collect();
        assert_eq!(seen.len(), 52);
        assert_ne!(items, (0..52).collect::<Vec<_>>(), "52 items should not stay in order");
    }

    #[test]
    fn shuffle_is_deterministic_with_seed() {
        let make = |seed: u64| -> Vec<u32> {
            let mut rng = StdRng::seed_from_u64(seed);
            shuffled((0..20).collect(), &mut rng)
        };
        assert_eq!(make(99), make(99));
        assert_ne!(make(99), make(100));
    }

    #[test]
    fn sample_returns_min_of_n_and_pool_size() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool: Vec<u32> = (0..10).collect();
        for n in [0usize, 1, 5, 10, 11, 500] {
            let picks = sample(&pool, n, &mut rng);
            assert_eq!(picks.len(), n.min(pool.len()), "n={n}");
            let distinct: HashSet<u32> = picks.iter().copied().collect();
            assert_eq!(distinct.len(), picks.len(), "duplicates for n={n}");
            assert!(picks.iter().all(|p| pool.contains(p)));
        }
        assert_eq!(pool, (0..10).collect::<Vec<_>>(), "input pool must not be mutated");
    }

    #[test]
    fn sample_of_empty_pool_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty: Vec<u32> = Vec::new();
        assert!(sample(&empty, 3, &mut rng).is_empty());
    }

    #[test]
    fn sample_reaches_every_element_over_many_draws() {
        let mut rng = StdRng::seed_from_u64(2024);
        let pool = ['a', 'b', 'c', 'd'];
        let mut firsts = HashSet::new();
        for _ in 0..200 {
            firsts.insert(sample(&pool, 1, &mut rng)[0]);
        }
        assert_eq!(firsts.len(), 4, "every element should be drawable first");
    }

    #[test]
    fn entropy_rng_is_usable() {
        let mut rng = quiz_rng(None);
        let picks = sample(&[1, 2, 3], 2, &mut rng);
        assert_eq!(picks.len(), 2);
    }
}
