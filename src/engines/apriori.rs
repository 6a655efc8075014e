//! Breadth-first Apriori: level-wise candidate generation in a prefix
//! tree, with subset pruning and transaction-tree-accelerated counting
//! (spec.md §4.5). Grounded on `fim4r.c::f4r_apriori`.

use std::collections::HashMap;

use crate::bag::TransactionBag;
use crate::error::Result;
use crate::item::ItemId;
use crate::reporter::Reporter;
use crate::tree::Tree;

use super::{AbortCheck, Miner};

#[derive(Clone, Copy, Debug, Default)]
pub struct AprioriOptions {
    /// Count support against the original bag rather than the
    /// recoded/reduced one ("orig-supp" mode).
    pub orig_supp: bool,
    /// Disable perfect-extension pruning (items that occur in every
    /// remaining candidate superset need not be branched on separately).
    pub disable_perfect_extension: bool,
}

pub struct Apriori {
    pub opts: AprioriOptions,
}

impl Apriori {
    pub fn new(opts: AprioriOptions) -> Self {
        Apriori { opts }
    }
}

/// Builds a transaction tree (an FP-tree without header links) to
/// memoize shared prefixes, accelerating repeated candidate counting
/// across levels.
fn build_transaction_tree(bag: &TransactionBag) -> Tree {
    let mut tree = Tree::new(bag.base.len());
    for t in &bag.transactions {
        let items = t.items();
        tree.insert_path(&items, t.weight as u64);
    }
    tree
}

/// Counts the support of `candidate` (sorted ascending, matching the
/// ascending order every transaction path in the tree is built in) by a
/// subset-matching descent: at each node we either consume the next
/// candidate item (if it matches this child) or skip past a non-matching
/// child whose item is still below the next candidate item (since items
/// only increase with depth, a child whose item already exceeds the next
/// candidate item can be pruned entirely). Once every candidate item is
/// matched, the current node's count already equals the support of the
/// full candidate, since it sums the weight of every transaction whose
/// path passes through it regardless of what other items they carry.
fn count_candidate(tree: &Tree, candidate: &[ItemId]) -> u64 {
    count_in_tree(tree, crate::tree::ROOT, candidate, 0)
}

fn count_in_tree(tree: &Tree, node: crate::tree::NodeIdx, candidate: &[ItemId], pos: usize) -> u64 {
    if pos == candidate.len() {
        return tree.node(node).count;
    }
    let target = candidate[pos];
    let mut total = 0u64;
    let mut cur = tree.node(node).first_child;
    while let Some(idx) = cur {
        let n = tree.node(idx);
        if n.item == target {
            total += count_in_tree(tree, idx, candidate, pos + 1);
        } else if n.item < target {
            total += count_in_tree(tree, idx, candidate, pos);
        }
        cur = n.next_sibling;
    }
    total
}

impl<'a> Miner<'a> for Apriori {
    fn mine(
        &mut self,
        bag: &'a TransactionBag,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
    ) -> Result<()> {
        let n_items = bag.base.len();
        let tree = build_transaction_tree(bag);
        let total_weight = bag.total_weight();

        // Perfect-extension items: items that occur in every transaction,
        // so adding any of them to any itemset never changes its support.
        // Excluding them from the level-wise join keeps every intermediate
        // candidate set small; their contribution is reconstructed for
        // free afterward, since `X ∪ p`'s support is always `supp(X)` for
        // any subset `p` of perfect items.
        let (perfect, normal_items): (Vec<ItemId>, Vec<ItemId>) = if self.opts.disable_perfect_extension {
            (Vec::new(), (0..n_items as ItemId).collect())
        } else {
            let mut perfect = Vec::new();
            let mut normal = Vec::new();
            for i in 0..n_items as ItemId {
                if total_weight > 0 && bag.item_support(i) == total_weight {
                    perfect.push(i);
                } else {
                    normal.push(i);
                }
            }
            (perfect, normal)
        };

        // Level 1: frequent singletons among the non-perfect items.
        let mut level: Vec<(Vec<ItemId>, u64)> = normal_items
            .iter()
            .map(|&i| (vec![i], bag.item_support(i)))
            .filter(|(_, s)| *s >= reporter.cfg.smin)
            .collect();
        let mut found: Vec<(Vec<ItemId>, u64)> = level.clone();

        let mut k = 2;
        while !level.is_empty() {
            if abort.tick() {
                return Err(crate::error::FimError::Aborted);
            }
            let frequent_set: std::collections::HashSet<Vec<ItemId>> =
                level.iter().map(|(i, _)| i.clone()).collect();

            let candidates = join_level(&level, k);
            let mut next_level = Vec::new();
            for cand in candidates {
                if !all_subsets_frequent(&cand, &frequent_set) {
                    continue;
                }
                let supp = if self.opts.orig_supp {
                    bag.support(&cand)
                } else {
                    count_candidate(&tree, &cand)
                };
                if supp >= reporter.cfg.smin {
                    found.push((cand.clone(), supp));
                    next_level.push((cand, supp));
                }
            }
            level = next_level;
            k += 1;
        }

        for (items, supp) in &found {
            reporter.report(items, *supp);
        }

        // Close over the perfect-extension items: every subset of
        // `perfect`, combined with every already-found itemset (including
        // the empty one), has the same support as the itemset alone.
        if !perfect.is_empty() {
            for mask in 1u32..(1u32 << perfect.len()) {
                if abort.tick() {
                    return Err(crate::error::FimError::Aborted);
                }
                let extra: Vec<ItemId> = (0..perfect.len())
                    .filter(|b| mask & (1 << b) != 0)
                    .map(|b| perfect[b])
                    .collect();

                let mut alone = extra.clone();
                alone.sort_unstable();
                reporter.report(&alone, total_weight);

                for (items, supp) in &found {
                    let mut combined = items.clone();
                    combined.extend(extra.iter().copied());
                    combined.sort_unstable();
                    reporter.report(&combined, *supp);
                }
            }
        }
        Ok(())
    }
}

/// Joins pairs of frequent (k-1)-itemsets sharing a (k-2)-prefix into
/// candidate k-itemsets.
fn join_level(level: &[(Vec<ItemId>, u64)], k: usize) -> Vec<Vec<ItemId>> {
    let mut by_prefix: HashMap<Vec<ItemId>, Vec<ItemId>> = HashMap::new();
    for (items, _) in level {
        if items.len() != k - 1 {
            continue;
        }
        let prefix = items[..items.len() - 1].to_vec();
        by_prefix
            .entry(prefix)
            .or_default()
            .push(*items.last().unwrap());
    }
    let mut out = Vec::new();
    for (prefix, lasts) in by_prefix {
        for i in 0..lasts.len() {
            for j in (i + 1)..lasts.len() {
                let (a, b) = if lasts[i] < lasts[j] {
                    (lasts[i], lasts[j])
                } else {
                    (lasts[j], lasts[i])
                };
                let mut cand = prefix.clone();
                cand.push(a);
                cand.push(b);
                cand.sort_unstable();
                out.push(cand);
            }
        }
    }
    out
}

fn all_subsets_frequent(cand: &[ItemId], frequent: &std::collections::HashSet<Vec<ItemId>>) -> bool {
    for skip in 0..cand.len() {
        let subset: Vec<ItemId> = cand
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, &x)| x)
            .collect();
        if !frequent.contains(&subset) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::{Transaction, TransactionBag};
    use crate::item::{ItemBase, ItemObj};
    use crate::reporter::{ReporterConfig, Target};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn scenario_bag() -> (TransactionBag, Vec<ItemId>) {
        let mut base = ItemBase::new();
        let mut bag = TransactionBag::new(ItemBase::new());
        let txs = vec![vec![1, 2, 3], vec![1, 2], vec![1, 3], vec![2, 3], vec![1]];
        for t in &txs {
            for &i in t {
                base.add2ta(ItemObj::Int(i)).unwrap();
            }
            let ids = base.finta(1);
            bag.push(Transaction::new(ids, 1));
        }
        let ids: Vec<ItemId> = (1..=3)
            .map(|i| base.add(ItemObj::Int(i)).unwrap())
            .collect();
        bag.base = base;
        (bag, ids)
    }

    #[test]
    fn scenario_a_matches_expected_supports() {
        let (bag, ids) = scenario_bag();
        let mut cfg = ReporterConfig::default();
        cfg.smin = 2;
        cfg.zmin = 1;
        cfg.target = Target::Sets;
        let mut reporter = Reporter::new(&bag, cfg);
        let mut engine = Apriori::new(AprioriOptions::default());
        let mut abort = AbortCheck::new(Arc::new(AtomicBool::new(false)));
        engine.mine(&bag, &mut reporter, &mut abort).unwrap();
        let sets = reporter.finish_sets();

        let expect = |items: &[ItemId], supp: u64| {
            assert!(
                sets.iter().any(|s| s.items == items && s.support == supp),
                "missing {:?}:{}",
                items,
                supp
            );
        };
        expect(&[ids[0]], 4);
        expect(&[ids[1]], 3);
        expect(&[ids[2]], 3);
        expect(&[ids[0], ids[1]], 2);
        expect(&[ids[0], ids[2]], 2);
        expect(&[ids[1], ids[2]], 2);
    }

    #[test]
    fn perfect_extension_items_reach_every_frequent_set() {
        let mut base = ItemBase::new();
        let mut bag = TransactionBag::new(ItemBase::new());
        // Item 9 occurs in every transaction, so it is a perfect
        // extension of every other frequent itemset.
        let txs = vec![
            vec![1, 2, 3, 9],
            vec![1, 2, 9],
            vec![1, 3, 9],
            vec![2, 3, 9],
            vec![1, 9],
        ];
        for t in &txs {
            for &i in t {
                base.add2ta(ItemObj::Int(i)).unwrap();
            }
            let ids = base.finta(1);
            bag.push(Transaction::new(ids, 1));
        }
        let perfect_id = base.add(ItemObj::Int(9)).unwrap();
        bag.base = base;

        let mut cfg = ReporterConfig::default();
        cfg.smin = 2;
        cfg.zmin = 1;
        cfg.target = Target::Sets;
        let mut reporter = Reporter::new(&bag, cfg);
        let mut engine = Apriori::new(AprioriOptions::default());
        let mut abort = AbortCheck::new(Arc::new(AtomicBool::new(false)));
        engine.mine(&bag, &mut reporter, &mut abort).unwrap();
        let sets = reporter.finish_sets();

        // 6 non-perfect frequent sets + {9} alone + 6 combined with {9}.
        assert_eq!(sets.len(), 13);
        assert!(sets
            .iter()
            .any(|s| s.items == vec![perfect_id] && s.support == 5));
    }

    #[test]
    fn disable_perfect_extension_skips_the_closure() {
        let mut base = ItemBase::new();
        let mut bag = TransactionBag::new(ItemBase::new());
        let txs = vec![vec![1, 9], vec![2, 9]];
        for t in &txs {
            for &i in t {
                base.add2ta(ItemObj::Int(i)).unwrap();
            }
            let ids = base.finta(1);
            bag.push(Transaction::new(ids, 1));
        }
        bag.base = base;

        let mut cfg = ReporterConfig::default();
        cfg.smin = 1;
        cfg.zmin = 1;
        cfg.target = Target::Sets;
        let mut reporter = Reporter::new(&bag, cfg);
        let mut engine = Apriori::new(AprioriOptions {
            orig_supp: false,
            disable_perfect_extension: true,
        });
        let mut abort = AbortCheck::new(Arc::new(AtomicBool::new(false)));
        engine.mine(&bag, &mut reporter, &mut abort).unwrap();
        let sets = reporter.finish_sets();
        // With the pruning disabled, item 9 is joined normally rather than
        // closed over separately, but the result set is the same: {1},
        // {2}, {9}, {1,9}, {2,9}.
        assert_eq!(sets.len(), 5);
    }
}
