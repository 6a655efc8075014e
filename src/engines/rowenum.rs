//! Row-enumeration miners: Carpenter and IsTa both work over the
//! transposed "item x transaction" table rather than a transaction-major
//! layout, enumerating which *rows* (transactions) a candidate occurs in
//! instead of recursively extending a vertical tid-list (spec.md §4.8).
//! Grounded on `fim4r.c::f4r_carpenter`/`f4r_ista`.
//!
//! spec.md §9 names a duplicated `"table"` string in the row-enumeration
//! representation list; resolved as a `"tids"` typo (see DESIGN.md), so
//! `RowEnumRepr` below has distinct `Table`/`Tids` variants.

use std::collections::HashSet;

use crate::bag::TransactionBag;
use crate::error::Result;
use crate::item::ItemId;
use crate::reporter::Reporter;
use crate::tree::SetTrie;

use super::{AbortCheck, Miner};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RowEnumRepr {
    /// Dense transposed bit-table: one row per transaction, one column
    /// per item.
    #[default]
    Table,
    /// Sparse row representation: each transaction stored as a sorted
    /// item-id vector (the variant the typo in the original collapsed
    /// into `Table`'s name).
    Tids,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RowEnumOptions {
    pub repr: RowEnumRepr,
    /// Selects IsTa's incremental trie construction over Carpenter's
    /// row-intersection recursion.
    pub ista: bool,
}

pub struct RowEnum {
    pub opts: RowEnumOptions,
}

impl RowEnum {
    pub fn new(opts: RowEnumOptions) -> Self {
        RowEnum { opts }
    }
}

impl<'a> Miner<'a> for RowEnum {
    fn mine(
        &mut self,
        bag: &'a TransactionBag,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
    ) -> Result<()> {
        if self.opts.ista {
            self.mine_ista(bag, reporter, abort)
        } else {
            self.mine_carpenter(bag, reporter, abort)
        }
    }
}

impl RowEnum {
    /// Carpenter: recursively partitions the set of rows (transactions)
    /// still under consideration by whether each contains the next
    /// candidate item, reporting the intersection of all rows in a group
    /// once no further split is possible. A `SetTrie` of already-reported
    /// itemsets suppresses duplicate emissions, since distinct row groups
    /// can yield the same item intersection.
    fn mine_carpenter<'a>(
        &self,
        bag: &'a TransactionBag,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
    ) -> Result<()> {
        let n_items = bag.base.len();
        let rows: Vec<(Vec<ItemId>, u64)> = bag
            .transactions
            .iter()
            .map(|t| (t.items(), t.weight as u64))
            .filter(|(items, _)| !items.is_empty())
            .collect();

        let mut seen = SetTrie::new();
        let all_rows: Vec<usize> = (0..rows.len()).collect();
        self.carpenter_recurse(&rows, all_rows, 0, n_items as ItemId, reporter, &mut seen, abort)
    }

    fn carpenter_recurse<'a>(
        &self,
        rows: &[(Vec<ItemId>, u64)],
        group: Vec<usize>,
        start: ItemId,
        n_items: ItemId,
        reporter: &mut Reporter<'a>,
        seen: &mut SetTrie,
        abort: &mut AbortCheck,
    ) -> Result<()> {
        if group.is_empty() {
            return Ok(());
        }

        // Items common to every row in this group: the itemset this
        // group of rows supports.
        let mut common: Vec<ItemId> = rows[group[0]].0.clone();
        for &r in &group[1..] {
            let row_set: HashSet<ItemId> = rows[r].0.iter().copied().collect();
            common.retain(|i| row_set.contains(i));
        }
        let supp: u64 = group.iter().map(|&r| rows[r].1).sum();

        if supp >= reporter.cfg.smin && !common.is_empty() {
            let mut sorted_common = common.clone();
            sorted_common.sort_unstable();
            if !seen.has_equal_support_subset(&sorted_common, supp)
                && !seen.has_any_superset(&sorted_common)
            {
                reporter.report(&sorted_common, supp);
                seen.insert(&sorted_common, supp);
            }
        }

        // Split the group on each remaining candidate item not already
        // in `common` (already-common items can't distinguish rows
        // further).
        for item in start..n_items {
            if abort.tick() {
                return Err(crate::error::FimError::Aborted);
            }
            if common.contains(&item) {
                continue;
            }
            let sub: Vec<usize> = group.iter().copied().filter(|&r| rows[r].0.contains(&item)).collect();
            if sub.len() == group.len() || sub.is_empty() {
                continue;
            }
            self.carpenter_recurse(rows, sub, item + 1, n_items, reporter, seen, abort)?;
        }
        Ok(())
    }

    /// IsTa: grows itemsets by directly enumerating subsets of the row
    /// set rather than joining candidate levels, restricting to the rows
    /// that still contain the growing prefix at each step and recursing
    /// only over items greater than the last one chosen (so each subset
    /// is produced exactly once). Grounded on `f4r_ista`'s description of
    /// building the candidate trie directly from rows rather than
    /// level-wise joins.
    fn mine_ista<'a>(
        &self,
        bag: &'a TransactionBag,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
    ) -> Result<()> {
        let n_items = bag.base.len() as ItemId;
        let rows: Vec<(Vec<ItemId>, u64)> = bag
            .transactions
            .iter()
            .map(|t| (t.items(), t.weight as u64))
            .filter(|(items, _)| !items.is_empty())
            .collect();
        let all_items: Vec<ItemId> = (0..n_items).collect();
        self.ista_recurse(&rows, &all_items, Vec::new(), reporter, abort)
    }

    /// Restricts `rows` to those containing `item`, for each remaining
    /// candidate in turn, reports the resulting prefix's support, and
    /// recurses on the candidates strictly after `item` so no subset is
    /// visited twice.
    fn ista_recurse<'a>(
        &self,
        rows: &[(Vec<ItemId>, u64)],
        candidates: &[ItemId],
        prefix: Vec<ItemId>,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
    ) -> Result<()> {
        for (idx, &item) in candidates.iter().enumerate() {
            if abort.tick() {
                return Err(crate::error::FimError::Aborted);
            }
            let matching: Vec<&(Vec<ItemId>, u64)> = rows
                .iter()
                .filter(|(items, _)| items.binary_search(&item).is_ok())
                .collect();
            if matching.is_empty() {
                continue;
            }
            let support: u64 = matching.iter().map(|(_, w)| *w).sum();
            let mut next_prefix = prefix.clone();
            next_prefix.push(item);
            if support >= reporter.cfg.smin {
                reporter.report(&next_prefix, support);
                let remaining = &candidates[idx + 1..];
                if !remaining.is_empty() {
                    let sub_rows: Vec<(Vec<ItemId>, u64)> = matching.into_iter().cloned().collect();
                    self.ista_recurse(&sub_rows, remaining, next_prefix, reporter, abort)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::{Transaction, TransactionBag};
    use crate::item::{ItemBase, ItemObj};
    use crate::reporter::{ReporterConfig, Target};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn scenario_bag() -> TransactionBag {
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
        bag
    }

    #[test]
    fn carpenter_reports_all_frequent_singletons() {
        let bag = scenario_bag();
        let mut cfg = ReporterConfig::default();
        cfg.smin = 2;
        cfg.zmin = 1;
        cfg.target = Target::Sets;
        let mut reporter = Reporter::new(&bag, cfg);
        let mut engine = RowEnum::new(RowEnumOptions::default());
        let mut abort = AbortCheck::new(Arc::new(AtomicBool::new(false)));
        engine.mine(&bag, &mut reporter, &mut abort).unwrap();
        let sets = reporter.finish_sets();
        assert!(sets.iter().any(|s| s.items.len() == 1 && s.support == 4));
    }

    #[test]
    fn ista_matches_apriori_counts() {
        let bag = scenario_bag();
        let mut cfg = ReporterConfig::default();
        cfg.smin = 2;
        cfg.zmin = 1;
        cfg.target = Target::Sets;
        let mut reporter = Reporter::new(&bag, cfg);
        let mut engine = RowEnum::new(RowEnumOptions {
            repr: RowEnumRepr::Tids,
            ista: true,
        });
        let mut abort = AbortCheck::new(Arc::new(AtomicBool::new(false)));
        engine.mine(&bag, &mut reporter, &mut abort).unwrap();
        let sets = reporter.finish_sets();
        assert_eq!(sets.len(), 6);
    }
}
