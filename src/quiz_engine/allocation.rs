//! Turns a quiz request into integer per-pool counts.
//!
//! Three policies live here:
//!
//! - **explicit**: caller-supplied counts, each capped at its pool size.
//! - **round-robin**: proportional floor of `total` by pool size, with the
//!   shortfall handed out one unit at a time in declaration order, skipping
//!   full pools.
//! - **largest remainder** (Hamilton): proportional floor by weight, with the
//!   shortfall handed to the largest fractional remainders first.
//!
//! Round-robin and largest-remainder can disagree on the same input; both are
//! kept and selected through [`AllocationStrategy`].

use tracing::debug;

use crate::quiz_engine::{
    error::{QuizError, Result},
    models::{Allocation, AllocationStrategy, DomainKey, PoolSize},
};

/// Explicit counts. Unknown domains are skipped, counts are capped at the pool
/// size and nothing is redistributed.
pub fn allocate_explicit(counts: &[(DomainKey, usize)], pools: &[PoolSize]) -> Allocation {
    let mut alloc = Allocation::new();
    for (key, requested) in counts {
        let Some(pool) = pools.iter().find(|p| p.key == *key) else {
            debug!(domain = %key, "skipping count for unknown domain");
            continue;
        };
        alloc.set(key.clone(), (*requested).min(pool.size));
    }
    alloc
}

/// Distribute `total` across `pools` with the chosen strategy, by pool size.
pub fn allocate_total(strategy: AllocationStrategy, total: usize, pools: &[PoolSize]) -> Allocation {
    match strategy {
        AllocationStrategy::RoundRobin => allocate_round_robin(total, pools),
        AllocationStrategy::LargestRemainder => {
            let capacity: usize = pools.iter().map(|p| p.size).sum();
            if capacity == 0 {
                return Allocation::new();
            }
            let weights: Vec<(DomainKey, f64)> =
                pools.iter().map(|p| (p.key.clone(), p.size as f64)).collect();
            allocate_by_weight(total.min(capacity), &weights)
        }
    }
}

/// Proportional allocation with round-robin shortfall distribution.
///
/// Returns an empty allocation when the pools hold nothing. Otherwise every
/// count is `<= size` and the counts sum to `min(total, capacity)`.
pub fn allocate_round_robin(total: usize, pools: &[PoolSize]) -> Allocation {
    let capacity: usize = pools.iter().map(|p| p.size).sum();
    if capacity == 0 {
        debug!(total, "no capacity in selected pools");
        return Allocation::new();
    }

    let mut counts: Vec<usize> = pools
        .iter()
        .map(|p| {
            let share = (p.size as u128 * total as u128 / capacity as u128) as usize;
            share.min(p.size)
        })
        .collect();

    let target = total.min(capacity);
    let mut shortfall = target - counts.iter().sum::<usize>();

    while shortfall > 0 {
        let mut progressed = false;
        for (count, pool) in counts.iter_mut().zip(pools) {
            if shortfall == 0 {
                break;
            }
            if *count < pool.size {
                *count += 1;
                shortfall -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    let alloc: Allocation = pools.iter().map(|p| p.key.clone()).zip(counts).collect();
    debug!(total, capacity, %alloc, "round-robin allocation");
    alloc
}

/// Largest-remainder apportionment of `total` by weight.
///
/// Negative or non-finite weights count as zero, and a domain listed twice has
/// its weights added. When no weight is positive every domain gets zero;
/// otherwise the counts sum to exactly `total` and each is `floor(raw)` or
/// `floor(raw) + 1`. Output keeps first-appearance order.
pub fn allocate_by_weight(total: usize, weights: &[(DomainKey, f64)]) -> Allocation {
    let mut merged: Vec<(DomainKey, f64)> = Vec::with_capacity(weights.len());
    for (key, w) in weights {
        let w = if w.is_finite() && *w > 0.0 { *w } else { 0.0 };
        match merged.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 += w,
            None => merged.push((key.clone(), w)),
        }
    }
    let sum_weights: f64 = merged.iter().map(|(_, w)| w).sum();
    if sum_weights <= 0.0 || merged.is_empty() {
        return merged.into_iter().map(|(k, _)| (k, 0)).collect();
    }

    let raws: Vec<f64> = merged.iter().map(|(_, w)| w / sum_weights * total as f64).collect();
    let mut counts: Vec<usize> = raws.iter().map(|r| r.floor() as usize).collect();
    let fracs: Vec<f64> = raws.iter().zip(&counts).map(|(r, c)| r - *c as f64).collect();

    // Descending remainder; the stable sort keeps ties in input order.
    let mut order: Vec<usize> = (0..merged.len()).collect();
    order.sort_by(|&a, &b| fracs[b].total_cmp(&fracs[a]));

    let allocated = counts.iter().fold(0usize, |acc, n| acc.saturating_add(*n));
    if allocated > total {
        // Float rounding pushed a floor up; take units back from the smallest remainders.
        let mut excess = allocated - total;
        for &i in order.iter().rev().cycle() {
            if excess == 0 {
                break;
            }
            if counts[i] > 0 {
                counts[i] -= 1;
                excess -= 1;
            }
        }
    } else {
        let remaining = total - allocated;
        for &i in order.iter().cycle().take(remaining) {
            counts[i] += 1;
        }
    }

    let alloc: Allocation = merged.into_iter().map(|(k, _)| k).zip(counts).collect();
    debug!(total, %alloc, "largest-remainder allocation");
    alloc
}

/// Flag the first domain whose count exceeds what its pool holds.
///
/// Used where truncation would surprise the user, such as a form preview that
/// must be corrected before submission.
pub fn ensure_within_capacity(alloc: &Allocation, pools: &[PoolSize]) -> Result<()> {
    for (domain, requested) in alloc.iter() {
        let available = pools.iter().find(|p| p.key == domain).map_or(0, |p| p.size);
        if requested > available {
            return Err(QuizError::OverRequest {
                domain: domain.to_string(),
                requested,
                available,
            });
        }
    }
    Ok(())
}

/// Weighted allocation checked against pool capacity.
pub fn preview_weighted(total: usize, weights: &[(DomainKey, f64)], pools: &[PoolSize]) -> Result<Allocation> {
    let alloc = allocate_by_weight(total, weights);
    ensure_within_capacity(&alloc, pools)?;
    Ok(alloc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(entries: &[(&str, usize)]) -> Vec<PoolSize> {
        entries.iter().map(|(k, n)| PoolSize::new(*k, *n)).collect()
    }

    fn weights(entries: &[(&str, f64)]) -> Vec<(DomainKey, f64)> {
        entries.iter().map(|(k, w)| (k.to_string(), *w)).collect()
    }

    // ── explicit ─────────────────────────────────────────────────────────────

    #[test]
    fn explicit_caps_at_pool_size() {
        let pools = sizes(&[("domain1", 2)]);
        let alloc = allocate_explicit(&[("domain1".into(), 5)], &pools);
        assert_eq!(alloc.get("domain1"), Some(2));
    }

    #[test]
    fn explicit_skips_unknown_domains() {
        let pools = sizes(&[("domain1", 4)]);
        let alloc = allocate_explicit(&[("domain9".into(), 3), ("domain1".into(), 1)], &pools);
        assert_eq!(alloc.get("domain9"), None);
        assert_eq!(alloc.total(), 1);
    }

    #[test]
    fn explicit_repeated_domain_keeps_last_count() {
        let pools = sizes(&[("domain1", 10)]);
        let alloc = allocate_explicit(&[("domain1".into(), 3), ("domain1".into(), 6)], &pools);
        assert_eq!(alloc.get("domain1"), Some(6));
    }

    // ── round-robin ──────────────────────────────────────────────────────────

    #[test]
    fn round_robin_two_pools_scenario() {
        let alloc = allocate_round_robin(2, &sizes(&[("domain1", 3), ("domain2", 1)]));
        assert_eq!(alloc.total(), 2);
        assert!(alloc.get("domain1").unwrap() >= 1);
        assert!(alloc.get("domain2").unwrap() <= 1);
    }

    #[test]
    fn round_robin_conserves_total_within_capacity() {
        let pools = sizes(&[("a", 7), ("b", 3), ("c", 11), ("d", 0), ("e", 5)]);
        let capacity = 26;
        for total in 0..=capacity {
            let alloc = allocate_round_robin(total, &pools);
            assert_eq!(alloc.total(), total, "total={total}");
            for p in &pools {
                assert!(alloc.get(&p.key).unwrap() <= p.size, "{} over capacity at total={total}", p.key);
            }
        }
    }

    #[test]
    fn round_robin_over_capacity_fills_every_pool() {
        let pools = sizes(&[("a", 3), ("b", 1)]);
        let alloc = allocate_round_robin(8, &pools);
        assert_eq!(alloc.get("a"), Some(3));
        assert_eq!(alloc.get("b"), Some(1));
        assert_eq!(alloc.total(), 4);
    }

    #[test]
    fn round_robin_zero_capacity_is_empty() {
        let alloc = allocate_round_robin(5, &sizes(&[("a", 0), ("b", 0)]));
        assert!(alloc.is_empty());
        assert!(allocate_round_robin(5, &[]).is_empty());
    }

    #[test]
    fn round_robin_shortfall_goes_in_declaration_order() {
        // Floors are 3/3/3 for 10 over three equal pools; the extra unit lands first.
        let alloc = allocate_round_robin(10, &sizes(&[("a", 5), ("b", 5), ("c", 5)]));
        assert_eq!(alloc.get("a"), Some(4));
        assert_eq!(alloc.get("b"), Some(3));
        assert_eq!(alloc.get("c"), Some(3));
    }

    // ── largest remainder ────────────────────────────────────────────────────

    #[test]
    fn largest_remainder_sums_exactly_and_stays_near_raw() {
        let w = weights(&[("d1", 14.0), ("d2", 33.3), ("d3", 7.0), ("d4", 45.7), ("d5", 0.0)]);
        let sum: f64 = w.iter().map(|(_, x)| x).sum();
        for total in 0..=57usize {
            let alloc = allocate_by_weight(total, &w);
            assert_eq!(alloc.total(), total, "total={total}");
            for (k, weight) in &w {
                let raw = weight / sum * total as f64;
                let got = alloc.get(k).unwrap();
                assert!(got == raw.floor() as usize || got == raw.floor() as usize + 1,
                    "{k}: got {got}, raw {raw} at total={total}");
            }
        }
    }

    #[test]
    fn largest_remainder_prefers_biggest_fraction() {
        // raws: 1.2, 1.5, 3.3 → bases 1/1/3, one unit left for b (0.5).
        let alloc = allocate_by_weight(6, &weights(&[("a", 20.0), ("b", 25.0), ("c", 55.0)]));
        assert_eq!(alloc.get("a"), Some(1));
        assert_eq!(alloc.get("b"), Some(2));
        assert_eq!(alloc.get("c"), Some(3));
    }

    #[test]
    fn largest_remainder_ties_break_by_input_order() {
        let alloc = allocate_by_weight(1, &weights(&[("x", 1.0), ("y", 1.0)]));
        assert_eq!(alloc.get("x"), Some(1));
        assert_eq!(alloc.get("y"), Some(0));
    }

    #[test]
    fn largest_remainder_merges_repeated_domains() {
        let alloc = allocate_by_weight(8, &weights(&[("a", 1.0), ("b", 1.0), ("a", 2.0)]));
        assert_eq!(alloc.iter().collect::<Vec<_>>(), vec![("a", 6), ("b", 2)]);
        assert_eq!(alloc.total(), 8);
    }

    #[test]
    fn largest_remainder_without_positive_weight_is_all_zero() {
        let alloc = allocate_by_weight(10, &weights(&[("a", 0.0), ("b", -3.0), ("c", f64::NAN)]));
        assert_eq!(alloc.total(), 0);
        assert_eq!(alloc.get("b"), Some(0));
    }

    #[test]
    fn strategies_disagree_on_the_same_input() {
        // total 7 over sizes 2/3/5: raws 1.4, 2.1, 3.5, floors 1/2/3, one unit short.
        let pools = sizes(&[("a", 2), ("b", 3), ("c", 5)]);
        let rr = allocate_total(AllocationStrategy::RoundRobin, 7, &pools);
        let lr = allocate_total(AllocationStrategy::LargestRemainder, 7, &pools);
        assert_eq!((rr.get("a"), rr.get("b"), rr.get("c")), (Some(2), Some(2), Some(3)));
        assert_eq!((lr.get("a"), lr.get("b"), lr.get("c")), (Some(1), Some(2), Some(4)));
    }

    #[test]
    fn largest_remainder_total_strategy_respects_capacity() {
        let pools = sizes(&[("a", 2), ("b", 1)]);
        let alloc = allocate_total(AllocationStrategy::LargestRemainder, 10, &pools);
        assert_eq!(alloc.total(), 3);
        ensure_within_capacity(&alloc, &pools).unwrap();
    }

    // ── capacity checks ──────────────────────────────────────────────────────

    #[test]
    fn preview_flags_over_request() {
        let pools = sizes(&[("a", 2), ("b", 50)]);
        let err = preview_weighted(20, &weights(&[("a", 50.0), ("b", 50.0)]), &pools).unwrap_err();
        match err {
            QuizError::OverRequest { domain, requested, available } => {
                assert_eq!(domain, "a");
                assert_eq!(requested, 10);
                assert_eq!(available, 2);
            }
            other => panic!("expected OverRequest, got {other:?}"),
        }
    }

    #[test]
    fn preview_accepts_request_within_capacity() {
        let pools = sizes(&[("a", 20), ("b", 20)]);
        let alloc = preview_weighted(10, &weights(&[("a", 30.0), ("b", 70.0)]), &pools).unwrap();
        assert_eq!(alloc.get("a"), Some(3));
        assert_eq!(alloc.get("b"), Some(7));
    }
}
