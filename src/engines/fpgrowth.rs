//! Depth-first FP-growth: build the FP-tree once from the recoded bag,
//! then recursively mine conditional pattern bases ascending by frequency
//! (spec.md §4.7). Grounded on the teacher's `rip_growth`/`FPTree` usage
//! in `src/main.rs`, generalized with the conditional-tree construction
//! shown in `other_examples/.../rust-rule-miner/src/mining/fpgrowth.rs`.

use crate::bag::TransactionBag;
use crate::error::Result;
use crate::item::ItemId;
use crate::reporter::Reporter;
use crate::tree::{NodeIdx, Tree};

use super::{AbortCheck, Miner};

/// Selects which conditional-tree-construction strategy `mine_conditional`
/// uses (spec.md §4.7's complex/simple/top-down/single variant set).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FpGrowthMode {
    /// Builds a full conditional FP-tree at every recursion step.
    #[default]
    Complex,
    /// Skips conditional-tree construction entirely: aggregates item
    /// counts directly off the pattern base's paths and shrinks the base
    /// by filtering, rather than re-encoding it as a tree each time.
    Simple,
    /// Like `Complex`, but mines the top-level header table from least
    /// frequent to most frequent instead of the other way around.
    TopDown,
    /// Reports only the direct one-level extensions of each prefix, with
    /// no recursive conditional mining beyond that.
    Single,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FpGrowthOptions {
    pub mode: FpGrowthMode,
}

pub struct FpGrowth {
    pub opts: FpGrowthOptions,
}

impl FpGrowth {
    pub fn new(opts: FpGrowthOptions) -> Self {
        FpGrowth { opts }
    }
}

fn build_fp_tree(bag: &TransactionBag, order: &[ItemId]) -> Tree {
    let rank: Vec<i64> = {
        let mut r = vec![-1i64; bag.base.len()];
        for (pos, &item) in order.iter().enumerate() {
            r[item as usize] = pos as i64;
        }
        r
    };
    let mut tree = Tree::new(bag.base.len());
    for t in &bag.transactions {
        let mut items = t.items();
        items.retain(|&i| rank[i as usize] >= 0);
        items.sort_by_key(|&i| rank[i as usize]);
        tree.insert_path(&items, t.weight as u64);
    }
    tree
}

/// Extracts, for every node on `item`'s header chain, the root-to-parent
/// path (excluding `item` itself) weighted by the node's count -- the
/// conditional pattern base.
fn conditional_pattern_base(tree: &Tree, item: ItemId) -> Vec<(Vec<ItemId>, u64)> {
    let mut bases = Vec::new();
    let mut cur = tree.header(item);
    while let Some(idx) = cur {
        let node = tree.node(idx);
        let weight = node.count;
        let parent = node.parent;
        if !tree.is_root(parent) {
            let path = tree.path_to_root(parent);
            bases.push((path, weight));
        }
        cur = node.next_same_item;
    }
    bases
}

fn total_header_count(tree: &Tree, item: ItemId) -> u64 {
    let mut total = 0u64;
    let mut cur = tree.header(item);
    while let Some(idx) = cur {
        let node = tree.node(idx);
        total += node.count;
        cur = node.next_same_item;
    }
    total
}

/// Builds a conditional FP-tree from a pattern base, keeping only items
/// frequent (>= smin) within this conditional base.
fn build_conditional_tree(
    base: &[(Vec<ItemId>, u64)],
    smin: u64,
) -> Option<(Tree, Vec<ItemId>, usize)> {
    use std::collections::HashMap;
    let mut counts: HashMap<ItemId, u64> = HashMap::new();
    for (path, w) in base {
        for &item in path {
            *counts.entry(item).or_insert(0) += w;
        }
    }
    let mut order: Vec<ItemId> = counts
        .iter()
        .filter(|(_, &c)| c >= smin)
        .map(|(&i, _)| i)
        .collect();
    if order.is_empty() {
        return None;
    }
    // Ascending frequency for mining order (keeps conditional trees small,
    // spec.md §4.7), but the tree itself stores paths by descending
    // frequency for compactness.
    order.sort_by_key(|i| std::cmp::Reverse(counts[i]));

    let max_id = *order.iter().max().unwrap() as usize;
    let mut tree = Tree::new(max_id + 1);
    let rank: HashMap<ItemId, usize> = order.iter().enumerate().map(|(p, &i)| (i, p)).collect();
    for (path, w) in base {
        let mut items: Vec<ItemId> = path.iter().copied().filter(|i| rank.contains_key(i)).collect();
        items.sort_by_key(|i| rank[i]);
        tree.insert_path(&items, *w);
    }
    order.sort_unstable();
    Some((tree, order, max_id))
}

/// True iff `tree` is a single chain from the root (no branching).
fn is_single_path(tree: &Tree, mut node: NodeIdx) -> bool {
    loop {
        if !tree.has_single_child(node) {
            return false;
        }
        match tree.single_child(node) {
            Some(next) => node = next,
            None => return true,
        }
    }
}

fn chain_items_and_min_count(tree: &Tree) -> (Vec<ItemId>, u64) {
    let mut items = Vec::new();
    let mut min_count = u64::MAX;
    let mut node = crate::tree::ROOT;
    while let Some(child) = tree.single_child(node) {
        let n = tree.node(child);
        items.push(n.item);
        min_count = min_count.min(n.count);
        node = child;
    }
    (items, min_count)
}

impl<'a> Miner<'a> for FpGrowth {
    fn mine(
        &mut self,
        bag: &'a TransactionBag,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
    ) -> Result<()> {
        let n_items = bag.base.len();
        let mut order: Vec<ItemId> = (0..n_items as ItemId)
            .filter(|&i| bag.item_support(i) >= reporter.cfg.smin)
            .collect();
        order.sort_by_key(|&i| std::cmp::Reverse(bag.item_support(i)));
        if self.opts.mode == FpGrowthMode::TopDown {
            order.reverse();
        }

        for &i in &order {
            reporter.report(&[i], bag.item_support(i));
        }

        let tree = build_fp_tree(bag, &order);

        // Mine items in ascending frequency (spec.md §4.7) regardless of
        // the header-build order above, since small conditional trees
        // benefit most from being built last/skipped first.
        let mut mine_order = order.clone();
        mine_order.sort_by_key(|&i| bag.item_support(i));
        let smin = reporter.cfg.smin;

        for &item in &mine_order {
            if abort.tick() {
                return Err(crate::error::FimError::Aborted);
            }
            let base = conditional_pattern_base(&tree, item);
            self.mine_conditional(reporter, abort, vec![item], base, smin)?;
        }
        Ok(())
    }
}

impl FpGrowth {
    fn mine_conditional<'a>(
        &self,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
        prefix: Vec<ItemId>,
        base: Vec<(Vec<ItemId>, u64)>,
        smin: u64,
    ) -> Result<()> {
        match self.opts.mode {
            FpGrowthMode::Simple => self.mine_conditional_simple(reporter, abort, prefix, base, smin),
            FpGrowthMode::Single => self.mine_conditional_single(reporter, abort, prefix, base, smin),
            FpGrowthMode::Complex | FpGrowthMode::TopDown => {
                self.mine_conditional_complex(reporter, abort, prefix, base, smin)
            }
        }
    }

    /// Builds an actual conditional FP-tree at each step, taking the
    /// single-path shortcut when the tree degenerates to one chain.
    fn mine_conditional_complex<'a>(
        &self,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
        prefix: Vec<ItemId>,
        base: Vec<(Vec<ItemId>, u64)>,
        smin: u64,
    ) -> Result<()> {
        let Some((cond_tree, cond_items, _max_id)) = build_conditional_tree(&base, smin) else {
            return Ok(());
        };

        if is_single_path(&cond_tree, crate::tree::ROOT) {
            // Emit every non-empty subset of the chain, each combined
            // with `prefix`, support = chain's minimum count.
            let (chain_items, min_count) = chain_items_and_min_count(&cond_tree);
            for mask in 1u32..(1u32 << chain_items.len()) {
                if abort.tick() {
                    return Err(crate::error::FimError::Aborted);
                }
                let mut items = prefix.clone();
                for (bit, &item) in chain_items.iter().enumerate() {
                    if mask & (1 << bit) != 0 {
                        items.push(item);
                    }
                }
                items.sort_unstable();
                reporter.report(&items, min_count);
            }
            return Ok(());
        }

        let mut mine_order = cond_items.clone();
        mine_order.sort_by_key(|&i| {
            // within the conditional tree, frequency is the header chain
            // total for that item.
            total_header_count(&cond_tree, i)
        });

        for item in mine_order {
            if abort.tick() {
                return Err(crate::error::FimError::Aborted);
            }
            let next_base = conditional_pattern_base(&cond_tree, item);
            let supp = total_header_count(&cond_tree, item);
            let mut next_prefix = prefix.clone();
            next_prefix.push(item);
            next_prefix.sort_unstable();
            reporter.report(&next_prefix, supp);
            self.mine_conditional_complex(reporter, abort, next_prefix, next_base, smin)?;
        }
        Ok(())
    }

    /// Works directly off the grouped pattern-base paths instead of
    /// re-encoding them as a conditional FP-tree: sums item weights
    /// straight off the base, then recurses by filtering the base down to
    /// the paths containing the chosen item.
    fn mine_conditional_simple<'a>(
        &self,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
        prefix: Vec<ItemId>,
        base: Vec<(Vec<ItemId>, u64)>,
        smin: u64,
    ) -> Result<()> {
        let counts = base_item_counts(&base);
        let mut frequent: Vec<(ItemId, u64)> =
            counts.into_iter().filter(|(_, c)| *c >= smin).collect();
        frequent.sort_by_key(|(_, c)| *c);

        for (item, supp) in frequent {
            if abort.tick() {
                return Err(crate::error::FimError::Aborted);
            }
            let mut next_prefix = prefix.clone();
            next_prefix.push(item);
            next_prefix.sort_unstable();
            reporter.report(&next_prefix, supp);

            let next_base: Vec<(Vec<ItemId>, u64)> = base
                .iter()
                .filter(|(path, _)| path.contains(&item))
                .map(|(path, w)| (path.iter().copied().filter(|&x| x != item).collect(), *w))
                .collect();
            self.mine_conditional_simple(reporter, abort, next_prefix, next_base, smin)?;
        }
        Ok(())
    }

    /// Reports only the direct one-level extensions of `prefix`: item
    /// counts aggregated straight off the pattern base, with no further
    /// recursive conditional mining.
    fn mine_conditional_single<'a>(
        &self,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
        prefix: Vec<ItemId>,
        base: Vec<(Vec<ItemId>, u64)>,
        smin: u64,
    ) -> Result<()> {
        for (item, supp) in base_item_counts(&base) {
            if supp < smin {
                continue;
            }
            if abort.tick() {
                return Err(crate::error::FimError::Aborted);
            }
            let mut items = prefix.clone();
            items.push(item);
            items.sort_unstable();
            reporter.report(&items, supp);
        }
        Ok(())
    }
}

/// Sums each item's weight across every path in a conditional pattern
/// base.
fn base_item_counts(base: &[(Vec<ItemId>, u64)]) -> Vec<(ItemId, u64)> {
    use std::collections::HashMap;
    let mut counts: HashMap<ItemId, u64> = HashMap::new();
    for (path, w) in base {
        for &item in path {
            *counts.entry(item).or_insert(0) += w;
        }
    }
    let mut out: Vec<(ItemId, u64)> = counts.into_iter().collect();
    out.sort_unstable_by_key(|(i, _)| *i);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::{Transaction, TransactionBag};
    use crate::item::{ItemBase, ItemObj};
    use crate::reporter::{ReporterConfig, Target};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn matches_expected_supports_on_scenario_a() {
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
        bag.base = base;

        let mut cfg = ReporterConfig::default();
        cfg.smin = 2;
        cfg.zmin = 1;
        cfg.target = Target::Sets;
        let mut reporter = Reporter::new(&bag, cfg);
        let mut engine = FpGrowth::new(FpGrowthOptions::default());
        let mut abort = AbortCheck::new(Arc::new(AtomicBool::new(false)));
        engine.mine(&bag, &mut reporter, &mut abort).unwrap();
        let sets = reporter.finish_sets();
        assert_eq!(sets.len(), 6);
    }

    fn triple_bag() -> (TransactionBag, Vec<ItemId>) {
        let mut base = ItemBase::new();
        let mut bag = TransactionBag::new(ItemBase::new());
        let txs = vec![
            vec![1, 2, 3],
            vec![1, 2, 3],
            vec![1, 2, 3],
            vec![1, 2],
            vec![1, 3],
            vec![2, 3],
        ];
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

    fn mine_with(mode: FpGrowthMode) -> Vec<crate::reporter::SetRecord> {
        let (bag, _ids) = triple_bag();
        let mut cfg = ReporterConfig::default();
        cfg.smin = 3;
        cfg.zmin = 1;
        cfg.target = Target::Sets;
        let mut reporter = Reporter::new(&bag, cfg);
        let mut engine = FpGrowth::new(FpGrowthOptions { mode });
        let mut abort = AbortCheck::new(Arc::new(AtomicBool::new(false)));
        engine.mine(&bag, &mut reporter, &mut abort).unwrap();
        reporter.finish_sets()
    }

    #[test]
    fn complex_mode_recurses_to_the_full_triple() {
        let (_bag, ids) = triple_bag();
        let sets = mine_with(FpGrowthMode::Complex);
        // {1} {2} {3} {1,2} {1,3} {2,3} {1,2,3}, all at or above smin=3.
        assert_eq!(sets.len(), 7);
        assert!(sets
            .iter()
            .any(|s| s.items == vec![ids[0], ids[1], ids[2]] && s.support == 3));
    }

    #[test]
    fn top_down_mode_also_recurses_to_the_full_triple() {
        let (_bag, ids) = triple_bag();
        let sets = mine_with(FpGrowthMode::TopDown);
        assert_eq!(sets.len(), 7);
        assert!(sets
            .iter()
            .any(|s| s.items == vec![ids[0], ids[1], ids[2]] && s.support == 3));
    }

    #[test]
    fn single_mode_stops_after_one_level_of_extension() {
        let (_bag, ids) = triple_bag();
        let sets = mine_with(FpGrowthMode::Single);
        // Only the 3 singles and 3 pairs: no recursion into the triple.
        assert_eq!(sets.len(), 6);
        assert!(!sets
            .iter()
            .any(|s| s.items == vec![ids[0], ids[1], ids[2]]));
    }

    #[test]
    fn simple_mode_matches_complex_on_scenario_a() {
        let (bag, _ids) = triple_bag();
        let mut cfg = ReporterConfig::default();
        cfg.smin = 3;
        cfg.zmin = 1;
        cfg.target = Target::Sets;
        let mut reporter = Reporter::new(&bag, cfg);
        let mut engine = FpGrowth::new(FpGrowthOptions {
            mode: FpGrowthMode::Simple,
        });
        let mut abort = AbortCheck::new(Arc::new(AtomicBool::new(false)));
        engine.mine(&bag, &mut reporter, &mut abort).unwrap();
        let sets = reporter.finish_sets();
        assert_eq!(sets.len(), 7);
    }
}
