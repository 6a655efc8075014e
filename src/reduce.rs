//! Pattern-set reducer: removes itemsets from an already-mined result
//! whose information is redundant given a chosen scoring mode and a
//! support border (spec.md §4.11). Grounded on
//! `original_source/src/fim4r.c`'s `f4r_patred`/`get_red` alias table.

use std::collections::HashSet;

use crate::item::ItemId;
use crate::reporter::{Border, SetRecord};

/// The eight canonical redundancy-scoring modes. `0`/`1` variants differ
/// in whether an itemset's own support counts toward its own coverage
/// score (`0`) or is excluded (`1`), matching `get_red`'s alias pairs
/// (`"coins"`/`"coins1"`, `"cover"`/`"covered1"`, `"leni"`/`"lenient1"`,
/// `"strict"`/`"strict1"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReduceMode {
    Coins0,
    Coins1,
    Items,
    Cover0,
    Cover1,
    Lenient0,
    Lenient1,
    Strict0,
    Strict1,
}

#[derive(Clone, Debug)]
pub struct ReduceOptions {
    pub mode: ReduceMode,
    pub border: Border,
    /// Adds pairwise intersections of surviving sets as extra candidates
    /// before the final pass (§4.11 "add_intersections").
    pub add_intersections: bool,
}

/// Reduces `sets` (already mined and support-filtered) to a smaller
/// equivalent-information subset. Iterates by descending itemset size,
/// greedily keeping a set only if it is not redundant under `mode`
/// relative to the sets already kept, consulting the support border for
/// the minimum acceptable coverage gain at each size.
pub fn reduce(sets: &[SetRecord], opts: &ReduceOptions) -> Vec<SetRecord> {
    let mut candidates: Vec<SetRecord> = sets.to_vec();
    if opts.add_intersections {
        candidates.extend(pairwise_intersections(sets));
        candidates.sort_by(|a, b| b.items.len().cmp(&a.items.len()));
        candidates.dedup_by(|a, b| a.items == b.items);
    } else {
        candidates.sort_by(|a, b| b.items.len().cmp(&a.items.len()));
    }

    let mut kept: Vec<SetRecord> = Vec::new();
    for cand in candidates {
        let min_gain = opts.border.at(cand.items.len()).unwrap_or(0);
        if is_redundant(&cand, &kept, opts.mode, min_gain) {
            continue;
        }
        kept.push(cand);
    }
    kept
}

fn pairwise_intersections(sets: &[SetRecord]) -> Vec<SetRecord> {
    let mut out = Vec::new();
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            let inter = intersect(&sets[i].items, &sets[j].items);
            if inter.is_empty() {
                continue;
            }
            let support = sets[i].support.max(sets[j].support);
            out.push(SetRecord {
                items: inter,
                support,
                info: Vec::new(),
            });
        }
    }
    out
}

fn intersect(a: &[ItemId], b: &[ItemId]) -> Vec<ItemId> {
    let set_b: HashSet<ItemId> = b.iter().copied().collect();
    a.iter().copied().filter(|x| set_b.contains(x)).collect()
}

/// Score of `set` against the already-kept set `against`, under `mode`.
/// Higher means more of `set`'s information is already covered by
/// `against`.
fn coverage_score(set: &SetRecord, against: &SetRecord, mode: ReduceMode) -> f64 {
    let shared = intersect(&set.items, &against.items).len();
    let size = set.items.len().max(1);
    match mode {
        ReduceMode::Coins0 => shared as f64 / size as f64,
        ReduceMode::Coins1 => {
            if against.support == set.support {
                shared as f64 / size as f64
            } else {
                0.0
            }
        }
        ReduceMode::Items => shared as f64,
        ReduceMode::Cover0 => {
            if shared == set.items.len() {
                1.0
            } else {
                0.0
            }
        }
        ReduceMode::Cover1 => {
            if shared == set.items.len() && against.support != set.support {
                1.0
            } else {
                0.0
            }
        }
        ReduceMode::Lenient0 => shared as f64 / size as f64,
        ReduceMode::Lenient1 => {
            if against.support >= set.support {
                shared as f64 / size as f64
            } else {
                0.0
            }
        }
        ReduceMode::Strict0 => {
            if shared == set.items.len() {
                1.0
            } else {
                0.0
            }
        }
        ReduceMode::Strict1 => {
            if shared == set.items.len() && against.support == set.support {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// A candidate is redundant if some already-kept set covers it with a
/// score above the mode's threshold and the uncovered remainder's
/// support gain is below `min_gain` (the border-derived minimum useful
/// contribution at this size).
fn is_redundant(cand: &SetRecord, kept: &[SetRecord], mode: ReduceMode, min_gain: u64) -> bool {
    let threshold = match mode {
        ReduceMode::Items => (cand.items.len() as f64) - 1.0,
        ReduceMode::Cover0 | ReduceMode::Cover1 | ReduceMode::Strict0 | ReduceMode::Strict1 => 1.0,
        _ => 0.999,
    };
    for k in kept {
        if k.items == cand.items {
            return true;
        }
        let score = coverage_score(cand, k, mode);
        if score >= threshold {
            let gain = cand.support.saturating_sub(k.support);
            if gain < min_gain.max(1) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(items: &[ItemId], support: u64) -> SetRecord {
        SetRecord {
            items: items.to_vec(),
            support,
            info: Vec::new(),
        }
    }

    #[test]
    fn strict_mode_drops_exact_duplicate_coverage() {
        let sets = vec![rec(&[1, 2, 3], 2), rec(&[1, 2], 2), rec(&[1], 4)];
        let opts = ReduceOptions {
            mode: ReduceMode::Strict0,
            border: Border::default(),
            add_intersections: false,
        };
        let out = reduce(&sets, &opts);
        // {1,2} is fully covered by {1,2,3} with no support gain -> dropped.
        assert!(!out.iter().any(|s| s.items == vec![1, 2]));
        assert!(out.iter().any(|s| s.items == vec![1, 2, 3]));
    }

    #[test]
    fn items_mode_keeps_sets_with_distinct_items() {
        let sets = vec![rec(&[1, 2], 3), rec(&[3, 4], 2)];
        let opts = ReduceOptions {
            mode: ReduceMode::Items,
            border: Border::default(),
            add_intersections: false,
        };
        let out = reduce(&sets, &opts);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn reduce_is_idempotent() {
        let sets = vec![rec(&[1, 2, 3], 2), rec(&[1, 2], 2), rec(&[4], 5)];
        let opts = ReduceOptions {
            mode: ReduceMode::Cover0,
            border: Border::default(),
            add_intersections: false,
        };
        let once = reduce(&sets, &opts);
        let twice = reduce(&once, &opts);
        assert_eq!(once.len(), twice.len());
    }
}
