//! Recursive elimination (RElim): like SaM but keeps one transaction
//! list per distinct leading item instead of a single sorted list,
//! eliminating the leading item from each list before recursing
//! (spec.md §4.8). Grounded on `fim4r.c::f4r_relim`.

use std::collections::BTreeMap;

use crate::bag::TransactionBag;
use crate::error::Result;
use crate::item::ItemId;
use crate::reporter::Reporter;

use super::{AbortCheck, Miner};

#[derive(Clone, Debug, Default)]
pub struct RelimOptions;

pub struct Relim {
    pub opts: RelimOptions,
}

impl Relim {
    pub fn new(opts: RelimOptions) -> Self {
        Relim { opts }
    }
}

/// Remaining items (descending-frequency order) and weight of a
/// transaction, bucketed under its leading item.
type Tail = (Vec<ItemId>, u64);

impl<'a> Miner<'a> for Relim {
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

        // Bucket every transaction's tail under its leading item.
        let mut buckets: BTreeMap<ItemId, Vec<Tail>> = BTreeMap::new();
        for t in &bag.transactions {
            let mut items: Vec<ItemId> = t
                .items()
                .into_iter()
                .filter(|i| rank.contains_key(i))
                .collect();
            if items.is_empty() {
                continue;
            }
            items.sort_by_key(|i| rank[i]);
            let head = items[0];
            buckets
                .entry(head)
                .or_default()
                .push((items[1..].to_vec(), t.weight as u64));
        }

        self.recurse(reporter, abort, Vec::new(), buckets, &order)
    }
}

impl Relim {
    /// Eliminates items in descending `order` from `buckets`: the item
    /// with lowest rank (last in `order`, i.e. least frequent, matching
    /// the teacher-style ascending-support mining order) is reported and
    /// recursed on first, then its transactions are redistributed into
    /// the buckets of their new leading item for the sibling items still
    /// to come.
    fn recurse<'a>(
        &self,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
        prefix: Vec<ItemId>,
        mut buckets: BTreeMap<ItemId, Vec<Tail>>,
        order: &[ItemId],
    ) -> Result<()> {
        // Process items from least to most frequent so the eliminated
        // item's remaining tails get redistributed to buckets that are
        // still pending.
        for &item in order.iter().rev() {
            if abort.tick() {
                return Err(crate::error::FimError::Aborted);
            }
            let Some(tails) = buckets.remove(&item) else {
                continue;
            };
            let supp: u64 = tails.iter().map(|(_, w)| w).sum();
            if supp < reporter.cfg.smin {
                continue;
            }
            let mut child_prefix = prefix.clone();
            child_prefix.push(item);
            child_prefix.sort_unstable();
            reporter.report(&child_prefix, supp);

            let mut child_buckets: BTreeMap<ItemId, Vec<Tail>> = BTreeMap::new();
            for (items, w) in &tails {
                if let Some(&next) = items.first() {
                    child_buckets
                        .entry(next)
                        .or_default()
                        .push((items[1..].to_vec(), *w));
                }
            }
            let child_order: Vec<ItemId> = order.iter().copied().filter(|&i| i != item).collect();
            self.recurse(reporter, abort, child_prefix, child_buckets, &child_order)?;

            // Eliminate `item`: redistribute its tails into the buckets
            // of the items that still precede it in rank so siblings see
            // the merged transactions too (RElim's namesake step).
            for (items, w) in tails {
                if let Some(&next) = items.first() {
                    buckets.entry(next).or_default().push((items[1..].to_vec(), w));
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
        let mut engine = Relim::new(RelimOptions::default());
        let mut abort = AbortCheck::new(Arc::new(AtomicBool::new(false)));
        engine.mine(&bag, &mut reporter, &mut abort).unwrap();
        let sets = reporter.finish_sets();
        assert_eq!(sets.len(), 6);
    }
}
