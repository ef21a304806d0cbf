//! How each allocation policy splits the same request.
//!
//! Run with:
//!   cargo run --example allocations
//!
//! Each block shows the pool sizes, the requested total, and the counts the
//! round-robin and largest-remainder policies produce. The last block shows a
//! weighted form preview flagging a pool that cannot cover its share.

use quiz_runner::quiz_engine::{allocate_total, preview_weighted, AllocationStrategy, PoolSize};

// ── cases ─────────────────────────────────────────────────────────────────────

struct Case {
    label: &'static str,
    total: usize,
    sizes: &'static [(&'static str, usize)],
}

fn cases() -> Vec<Case> {
    vec![
        Case { label: "Uneven pair", total: 2, sizes: &[("domain1", 3), ("domain2", 1)] },
        Case { label: "Policies disagree", total: 7, sizes: &[("a", 2), ("b", 3), ("c", 5)] },
        Case { label: "Equal pools", total: 10, sizes: &[("x", 5), ("y", 5), ("z", 5)] },
        Case { label: "Over capacity", total: 50, sizes: &[("small", 4), ("large", 9)] },
    ]
}

fn pool_sizes(entries: &[(&str, usize)]) -> Vec<PoolSize> {
    entries.iter().map(|(k, n)| PoolSize::new(*k, *n)).collect()
}

fn main() {
    for case in cases() {
        let pools = pool_sizes(case.sizes);
        println!("── {} (total {}) ──", case.label, case.total);
        let sizes: Vec<String> = pools.iter().map(|p| format!("{}:{}", p.key, p.size)).collect();
        println!("  pools:   {}", sizes.join("  "));
        for strategy in [AllocationStrategy::RoundRobin, AllocationStrategy::LargestRemainder] {
            let alloc = allocate_total(strategy, case.total, &pools);
            println!("  {:<18} {}  (sum {})", strategy.to_string(), alloc, alloc.total());
        }
        println!();
    }

    println!("── Weighted preview (total 10, 50% / 50%) ──");
    let pools = pool_sizes(&[("domain1", 2), ("domain2", 20)]);
    let weights = vec![("domain1".to_string(), 50.0), ("domain2".to_string(), 50.0)];
    match preview_weighted(10, &weights, &pools) {
        Ok(alloc) => println!("  ok: {alloc}"),
        Err(err) => println!("  adjust inputs: {err}"),
    }
}
