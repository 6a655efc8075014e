//! Split-and-merge (SaM): depth-first mining over sorted transaction
//! lists, splitting the list by whether each transaction contains the
//! next candidate item and merging survivors back (spec.md §4.8).
//! Grounded on `fim4r.c::f4r_sam`.

use crate::bag::TransactionBag;
use crate::error::Result;
use crate::item::ItemId;
use crate::reporter::Reporter;

use super::{AbortCheck, Miner};

#[derive(Clone, Debug, Default)]
pub struct SamOptions;

pub struct Sam {
    pub opts: SamOptions,
}

impl Sam {
    pub fn new(opts: SamOptions) -> Self {
        Sam { opts }
    }
}

/// A sorted transaction list entry: the items still to be considered
/// (descending-frequency order, matching the teacher's `sort_transaction`
/// convention) and its weight.
type SortedTa = (Vec<ItemId>, u64);

impl<'a> Miner<'a> for Sam {
    fn mine(
        &mut self,
        bag: &'a TransactionBag,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
    ) -> Result<()> {
        let _ = &self.opts;
        let n_items = bag.base.len();
        let mut order: Vec<ItemId> = (0..n_items as ItemId)
            .filter(|&i| bag.item_support(i) >= reporter.cfg.smin)
            .collect();
        order.sort_by_key(|&i| std::cmp::Reverse(bag.item_support(i)));
        let rank: std::collections::HashMap<ItemId, usize> =
            order.iter().enumerate().map(|(p, &i)| (i, p)).collect();

        let tas: Vec<SortedTa> = bag
            .transactions
            .iter()
            .map(|t| {
                let mut items: Vec<ItemId> = t
                    .items()
                    .into_iter()
                    .filter(|i| rank.contains_key(i))
                    .collect();
                items.sort_by_key(|i| rank[i]);
                (items, t.weight as u64)
            })
            .filter(|(items, _)| !items.is_empty())
            .collect();

        self.recurse(reporter, abort, Vec::new(), tas, 0)
    }
}

impl Sam {
    fn recurse<'a>(
        &self,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
        prefix: Vec<ItemId>,
        tas: Vec<SortedTa>,
        depth: usize,
    ) -> Result<()> {
        // Collect all distinct "next" items (position `depth` candidates)
        // across the remaining transactions, in their shared rank order,
        // and their accumulated weight (the split step).
        let mut totals: std::collections::BTreeMap<ItemId, u64> = std::collections::BTreeMap::new();
        for (items, w) in &tas {
            if let Some(&item) = items.first() {
                *totals.entry(item).or_insert(0) += w;
            }
        }

        for (&item, &supp) in &totals {
            if abort.tick() {
                return Err(crate::error::FimError::Aborted);
            }
            if supp < reporter.cfg.smin {
                continue;
            }
            let mut child_prefix = prefix.clone();
            child_prefix.push(item);
            child_prefix.sort_unstable();
            reporter.report(&child_prefix, supp);

            // Merge step: every transaction containing `item` at its
            // current head contributes its remaining tail to the child
            // call; transactions with a different head pass through only
            // if that head still needs to be considered later, but since
            // we iterate `totals` independently per item, each recursive
            // call only needs transactions whose head *was* `item`.
            let child_tas: Vec<SortedTa> = tas
                .iter()
                .filter(|(items, _)| items.first() == Some(&item))
                .map(|(items, w)| (items[1..].to_vec(), *w))
                .filter(|(items, _)| !items.is_empty())
                .collect();

            self.recurse(reporter, abort, child_prefix, child_tas, depth + 1)?;
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
        let mut engine = Sam::new(SamOptions::default());
        let mut abort = AbortCheck::new(Arc::new(AtomicBool::new(false)));
        engine.mine(&bag, &mut reporter, &mut abort).unwrap();
        let sets = reporter.finish_sets();
        assert_eq!(sets.len(), 6);
    }
}
