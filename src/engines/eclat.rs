//! Depth-first Eclat: enumerates extensions of the current prefix using
//! an interchangeable vertical transaction representation per node
//! (spec.md §4.6). Grounded on `fim4r.c::f4r_eclat`.

use std::collections::HashSet;

use crate::bag::TransactionBag;
use crate::error::Result;
use crate::item::ItemId;
use crate::reporter::Reporter;

use super::{AbortCheck, Miner};

/// Which vertical representation each search-tree node uses to track the
/// transactions containing the current prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum VerticalRepr {
    /// Sorted transaction-id list per item.
    #[default]
    Lists,
    /// Bitmap of size |T| per item, packed into `u64` words.
    Bits,
    /// Dense transposed boolean table: one row per item, one column per
    /// transaction.
    Table,
    /// Diffset: tids in the parent not in the child.
    Diffs,
    /// Run-length-encoded inclusive tid ranges per item.
    Ranges,
    /// Tid/weight pairs per item ("occurrence delivery" list), so support
    /// sums directly off the pairs without a separate weight lookup.
    Occdlv,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EclatOptions {
    pub repr: VerticalRepr,
}

pub struct Eclat {
    pub opts: EclatOptions,
}

impl Eclat {
    pub fn new(opts: EclatOptions) -> Self {
        Eclat { opts }
    }
}

/// A vertical occurrence list, one structurally distinct shape per
/// `VerticalRepr` variant.
enum Occurrences {
    Tids(Vec<usize>),
    Bits(Vec<u64>),
    Table(Vec<bool>),
    Diff {
        parent: Vec<usize>,
        removed: Vec<usize>,
    },
    Ranges(Vec<(usize, usize)>),
    Occdlv(Vec<(usize, u32)>),
}

impl Occurrences {
    fn support(&self, parent_support: u64, weights: &[u32]) -> u64 {
        match self {
            Occurrences::Tids(tids) => tids.iter().map(|&t| weights[t] as u64).sum(),
            Occurrences::Bits(bits) => iter_set_bits(bits).iter().map(|&t| weights[t] as u64).sum(),
            Occurrences::Table(row) => row
                .iter()
                .enumerate()
                .filter(|(_, &set)| set)
                .map(|(t, _)| weights[t] as u64)
                .sum(),
            Occurrences::Diff { removed, .. } => {
                let removed_weight: u64 = removed.iter().map(|&t| weights[t] as u64).sum();
                parent_support - removed_weight
            }
            Occurrences::Ranges(ranges) => ranges
                .iter()
                .map(|&(lo, hi)| (lo..=hi).map(|t| weights[t] as u64).sum::<u64>())
                .sum(),
            Occurrences::Occdlv(pairs) => pairs.iter().map(|&(_, w)| w as u64).sum(),
        }
    }

    fn tids(&self) -> Vec<usize> {
        match self {
            Occurrences::Tids(t) => t.clone(),
            Occurrences::Bits(bits) => iter_set_bits(bits),
            Occurrences::Table(row) => row
                .iter()
                .enumerate()
                .filter(|(_, &set)| set)
                .map(|(t, _)| t)
                .collect(),
            Occurrences::Diff { parent, removed } => {
                let removed_set: HashSet<usize> = removed.iter().copied().collect();
                parent.iter().copied().filter(|t| !removed_set.contains(t)).collect()
            }
            Occurrences::Ranges(ranges) => ranges.iter().flat_map(|&(lo, hi)| lo..=hi).collect(),
            Occurrences::Occdlv(pairs) => pairs.iter().map(|&(t, _)| t).collect(),
        }
    }
}

/// Every item's occurrence data precomputed once per `mine()` call, in
/// all five storable shapes, so `extend()` never re-scans
/// `bag.transactions` for an already-seen extension item.
struct VerticalTables {
    tids: Vec<Vec<usize>>,
    bits: Vec<Vec<u64>>,
    table: Vec<Vec<bool>>,
    ranges: Vec<Vec<(usize, usize)>>,
    occdlv: Vec<Vec<(usize, u32)>>,
}

impl VerticalTables {
    fn build(bag: &TransactionBag, n_items: usize) -> Self {
        let n_tx = bag.transactions.len();
        let mut tids: Vec<Vec<usize>> = vec![Vec::new(); n_items];
        for (tid, t) in bag.transactions.iter().enumerate() {
            for item in t.items() {
                tids[item as usize].push(tid);
            }
        }
        let bits: Vec<Vec<u64>> = tids.iter().map(|v| to_bitset(v, n_tx)).collect();
        let table: Vec<Vec<bool>> = tids.iter().map(|v| to_bool_row(v, n_tx)).collect();
        let ranges: Vec<Vec<(usize, usize)>> = tids.iter().map(|v| to_ranges(v)).collect();
        let occdlv: Vec<Vec<(usize, u32)>> = tids
            .iter()
            .map(|v| v.iter().map(|&t| (t, bag.transactions[t].weight)).collect())
            .collect();
        VerticalTables {
            tids,
            bits,
            table,
            ranges,
            occdlv,
        }
    }
}

fn to_bitset(tids: &[usize], n_tx: usize) -> Vec<u64> {
    let words = (n_tx + 63) / 64;
    let mut bits = vec![0u64; words.max(1)];
    for &t in tids {
        bits[t / 64] |= 1u64 << (t % 64);
    }
    bits
}

fn to_bool_row(tids: &[usize], n_tx: usize) -> Vec<bool> {
    let mut row = vec![false; n_tx];
    for &t in tids {
        row[t] = true;
    }
    row
}

/// Collapses a sorted ascending tid list into inclusive `(lo, hi)` runs of
/// consecutive ids.
fn to_ranges(tids: &[usize]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut iter = tids.iter().copied();
    if let Some(first) = iter.next() {
        let (mut lo, mut hi) = (first, first);
        for t in iter {
            if t == hi + 1 {
                hi = t;
            } else {
                ranges.push((lo, hi));
                lo = t;
                hi = t;
            }
        }
        ranges.push((lo, hi));
    }
    ranges
}

fn iter_set_bits(bits: &[u64]) -> Vec<usize> {
    let mut out = Vec::new();
    for (word_idx, &word) in bits.iter().enumerate() {
        let mut w = word;
        while w != 0 {
            let bit = w.trailing_zeros() as usize;
            out.push(word_idx * 64 + bit);
            w &= w - 1;
        }
    }
    out
}

fn intersect_bits(a: &[u64], b: &[u64]) -> Vec<u64> {
    a.iter().zip(b.iter()).map(|(&x, &y)| x & y).collect()
}

fn intersect_table(a: &[bool], b: &[bool]) -> Vec<bool> {
    a.iter().zip(b.iter()).map(|(&x, &y)| x && y).collect()
}

/// Merges two sorted, disjoint, ascending inclusive range lists into their
/// intersection, also sorted and disjoint.
fn intersect_ranges(a: &[(usize, usize)], b: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let (alo, ahi) = a[i];
        let (blo, bhi) = b[j];
        let lo = alo.max(blo);
        let hi = ahi.min(bhi);
        if lo <= hi {
            out.push((lo, hi));
        }
        if ahi < bhi {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

impl<'a> Miner<'a> for Eclat {
    fn mine(
        &mut self,
        bag: &'a TransactionBag,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
    ) -> Result<()> {
        let n_items = bag.base.len();
        let weights: Vec<u32> = bag.transactions.iter().map(|t| t.weight).collect();
        let tables = VerticalTables::build(bag, n_items);

        let mut roots: Vec<(ItemId, Occurrences, u64)> = (0..n_items as ItemId)
            .map(|i| {
                let occ = self.initial_occ(&tables, i as usize);
                let supp = occ.support(0, &weights);
                (i, occ, supp)
            })
            .filter(|(_, _, s)| *s >= reporter.cfg.smin)
            .collect();
        // Ascending support ordering maximizes early pruning when
        // extending (spec.md §4.6).
        roots.sort_by_key(|(_, _, s)| *s);

        for (item, occ, supp) in roots {
            if abort.tick() {
                return Err(crate::error::FimError::Aborted);
            }
            reporter.report(&[item], supp);
            self.extend(
                reporter,
                abort,
                &tables,
                &weights,
                vec![item],
                occ,
                supp,
                item + 1,
                n_items as ItemId,
            )?;
        }
        Ok(())
    }
}

impl Eclat {
    fn initial_occ(&self, tables: &VerticalTables, item: usize) -> Occurrences {
        match self.opts.repr {
            VerticalRepr::Lists | VerticalRepr::Diffs => Occurrences::Tids(tables.tids[item].clone()),
            VerticalRepr::Bits => Occurrences::Bits(tables.bits[item].clone()),
            VerticalRepr::Table => Occurrences::Table(tables.table[item].clone()),
            VerticalRepr::Ranges => Occurrences::Ranges(tables.ranges[item].clone()),
            VerticalRepr::Occdlv => Occurrences::Occdlv(tables.occdlv[item].clone()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn extend<'a>(
        &self,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
        tables: &VerticalTables,
        weights: &[u32],
        prefix: Vec<ItemId>,
        occ: Occurrences,
        supp: u64,
        start: ItemId,
        n_items: ItemId,
    ) -> Result<()> {
        let mut children: Vec<(ItemId, Occurrences, u64)> = Vec::new();
        for ext in start..n_items {
            let child_occ = match self.opts.repr {
                VerticalRepr::Diffs => {
                    let parent_tids = occ.tids();
                    let ext_set: HashSet<usize> = tables.tids[ext as usize].iter().copied().collect();
                    let removed: Vec<usize> = parent_tids
                        .iter()
                        .copied()
                        .filter(|t| !ext_set.contains(t))
                        .collect();
                    Occurrences::Diff {
                        parent: parent_tids,
                        removed,
                    }
                }
                VerticalRepr::Bits => {
                    let Occurrences::Bits(parent_bits) = &occ else {
                        unreachable!("Bits repr always carries Bits occurrences")
                    };
                    Occurrences::Bits(intersect_bits(parent_bits, &tables.bits[ext as usize]))
                }
                VerticalRepr::Table => {
                    let Occurrences::Table(parent_row) = &occ else {
                        unreachable!("Table repr always carries Table occurrences")
                    };
                    Occurrences::Table(intersect_table(parent_row, &tables.table[ext as usize]))
                }
                VerticalRepr::Ranges => {
                    let Occurrences::Ranges(parent_ranges) = &occ else {
                        unreachable!("Ranges repr always carries Ranges occurrences")
                    };
                    Occurrences::Ranges(intersect_ranges(parent_ranges, &tables.ranges[ext as usize]))
                }
                VerticalRepr::Occdlv => {
                    let Occurrences::Occdlv(parent_pairs) = &occ else {
                        unreachable!("Occdlv repr always carries Occdlv occurrences")
                    };
                    let ext_set: HashSet<usize> = tables.tids[ext as usize].iter().copied().collect();
                    Occurrences::Occdlv(
                        parent_pairs
                            .iter()
                            .copied()
                            .filter(|(t, _)| ext_set.contains(t))
                            .collect(),
                    )
                }
                VerticalRepr::Lists => {
                    let parent_tids = occ.tids();
                    let ext_set: HashSet<usize> = tables.tids[ext as usize].iter().copied().collect();
                    Occurrences::Tids(parent_tids.into_iter().filter(|t| ext_set.contains(t)).collect())
                }
            };
            let child_supp = child_occ.support(supp, weights);
            if child_supp >= reporter.cfg.smin {
                children.push((ext, child_occ, child_supp));
            }
        }
        children.sort_by_key(|(_, _, s)| *s);

        for (item, child_occ, child_supp) in children {
            if abort.tick() {
                return Err(crate::error::FimError::Aborted);
            }
            let mut child_prefix = prefix.clone();
            child_prefix.push(item);
            reporter.report(&child_prefix, child_supp);
            self.extend(
                reporter,
                abort,
                tables,
                weights,
                child_prefix,
                child_occ,
                child_supp,
                item + 1,
                n_items,
            )?;
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

    fn mine_with(repr: VerticalRepr) -> Vec<crate::reporter::SetRecord> {
        let bag = scenario_bag();
        let mut cfg = ReporterConfig::default();
        cfg.smin = 2;
        cfg.zmin = 1;
        cfg.target = Target::Sets;
        let mut reporter = Reporter::new(&bag, cfg);
        let mut engine = Eclat::new(EclatOptions { repr });
        let mut abort = AbortCheck::new(Arc::new(AtomicBool::new(false)));
        engine.mine(&bag, &mut reporter, &mut abort).unwrap();
        reporter.finish_sets()
    }

    #[test]
    fn matches_apriori_on_scenario_a() {
        let sets = mine_with(VerticalRepr::Lists);
        assert_eq!(sets.len(), 6);
        assert!(sets.iter().all(|s| s.support >= 2));
    }

    #[test]
    fn all_representations_agree_on_scenario_a() {
        let baseline = mine_with(VerticalRepr::Lists);
        let mut expected: Vec<(Vec<ItemId>, u64)> =
            baseline.iter().map(|s| (s.items.clone(), s.support)).collect();
        expected.sort();
        for repr in [
            VerticalRepr::Bits,
            VerticalRepr::Table,
            VerticalRepr::Diffs,
            VerticalRepr::Ranges,
            VerticalRepr::Occdlv,
        ] {
            let mut got: Vec<(Vec<ItemId>, u64)> =
                mine_with(repr).iter().map(|s| (s.items.clone(), s.support)).collect();
            got.sort();
            assert_eq!(got, expected, "representation {repr:?} disagreed with Lists");
        }
    }

    #[test]
    fn range_encoding_round_trips_through_gaps() {
        let ranges = to_ranges(&[1, 2, 3, 7, 8, 10]);
        assert_eq!(ranges, vec![(1, 3), (7, 8), (10, 10)]);
        let merged = intersect_ranges(&ranges, &[(2, 7)]);
        assert_eq!(merged, vec![(2, 3), (7, 7)]);
    }

    #[test]
    fn bitset_round_trips_tids() {
        let bits = to_bitset(&[0, 3, 64, 130], 200);
        let mut back = iter_set_bits(&bits);
        back.sort_unstable();
        assert_eq!(back, vec![0, 3, 64, 130]);
    }
}
