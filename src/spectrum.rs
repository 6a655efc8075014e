//! Pattern spectrum: a `(size, support) -> occurrence count` table built
//! either by mining a batch of surrogate (randomized) datasets in
//! parallel, or by a closed-form estimator over the item-frequency
//! distribution alone (spec.md §4.9, §4.10).
//!
//! The surrogate generator is grounded on the teacher's
//! `find_gaussian_rare_items`/`generate_random_dataset`
//! (`src/main.rs`, `src/generate_rules.rs`), which already spawns N
//! randomized datasets across a `rayon` pool and reduces the per-worker
//! results into one aggregate -- the same shape this module needs,
//! generalized from a single item-count reduction to a full 2-D spectrum.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::bag::{Transaction, TransactionBag};
use crate::engines::apriori::{Apriori, AprioriOptions};
use crate::engines::{AbortCheck, Miner};
use crate::error::Result;
use crate::reporter::{Reporter, ReporterConfig, Target};

/// Which randomization scheme each surrogate run applies before mining.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurrogateMethod {
    /// No randomization; mines the original bag (useful as a control run).
    Identity,
    /// Replaces each transaction's items with a random sample of the same
    /// size drawn from the overall item-frequency distribution.
    Random,
    /// Swaps pairs of items between two random transactions' item sets
    /// that preserve both item marginals, repeated `swaps` times.
    Swap,
    /// Shuffles the item columns across all transactions independently
    /// (requires a uniform transaction length -- `TransactionBag::istab`).
    Shuffle,
}

#[derive(Clone, Debug)]
pub struct SpectrumOptions {
    pub method: SurrogateMethod,
    pub runs: usize,
    pub swaps: usize,
    pub smin: u64,
    pub seed: u64,
}

impl Default for SpectrumOptions {
    fn default() -> Self {
        SpectrumOptions {
            method: SurrogateMethod::Random,
            runs: 100,
            swaps: 1,
            smin: 1,
            seed: 0,
        }
    }
}

/// Dense `(size, support)` occurrence counts accumulated across every
/// surrogate run. Row `z` holds counts indexed by support `s`; absent
/// entries are zero.
#[derive(Clone, Debug, Default)]
pub struct PatternSpectrum {
    pub counts: HashMap<(usize, u64), u64>,
}

impl PatternSpectrum {
    pub fn new() -> Self {
        PatternSpectrum::default()
    }

    pub fn add(&mut self, size: usize, support: u64, n: u64) {
        *self.counts.entry((size, support)).or_insert(0) += n;
    }

    /// Merges another spectrum's counts into this one (commutative,
    /// order-independent -- spec.md §5's cross-run accumulation
    /// guarantee).
    pub fn merge(&mut self, other: &PatternSpectrum) {
        for (&key, &n) in &other.counts {
            *self.counts.entry(key).or_insert(0) += n;
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn at(&self, size: usize, support: u64) -> u64 {
        self.counts.get(&(size, support)).copied().unwrap_or(0)
    }
}

/// Builds one randomized surrogate bag from `bag` under `method`, using
/// `rng` as the sole source of randomness so the whole run is
/// reproducible given `(seed, worker_index)`.
fn make_surrogate(bag: &TransactionBag, method: SurrogateMethod, rng: &mut StdRng) -> TransactionBag {
    match method {
        SurrogateMethod::Identity => clone_bag(bag),
        SurrogateMethod::Random => {
            let n_items = bag.base.len() as u32;
            let mut weights: Vec<u32> = Vec::with_capacity(n_items as usize);
            for i in 0..n_items {
                weights.push(bag.item_support(i) as u32);
            }
            let total_weight: u64 = weights.iter().map(|&w| w as u64).sum();
            let mut out = clone_bag(bag);
            out.transactions = bag
                .transactions
                .iter()
                .map(|t| {
                    let len = t.len();
                    let mut items: Vec<u32> = Vec::with_capacity(len);
                    let mut seen = std::collections::HashSet::new();
                    let mut attempts = 0;
                    while items.len() < len && attempts < len * 50 + 16 {
                        attempts += 1;
                        if total_weight == 0 {
                            break;
                        }
                        let item = weighted_pick(&weights, total_weight, rng);
                        if seen.insert(item) {
                            items.push(item);
                        }
                    }
                    items.sort_unstable();
                    Transaction::new(items, t.weight)
                })
                .collect();
            out
        }
        SurrogateMethod::Swap => {
            let mut out = clone_bag(bag);
            let n = out.transactions.len();
            if n >= 2 {
                for _ in 0..swaps_for(bag, n) {
                    let i = rng.gen_range(0..n);
                    let j = rng.gen_range(0..n);
                    if i == j {
                        continue;
                    }
                    swap_preserving_marginals(&mut out.transactions, i, j);
                }
            }
            out
        }
        SurrogateMethod::Shuffle => {
            let mut out = clone_bag(bag);
            if bag.istab() {
                let width = bag.transactions.first().map(|t| t.len()).unwrap_or(0);
                let mut columns: Vec<Vec<u32>> = vec![Vec::new(); width];
                for t in &bag.transactions {
                    for (col, item) in t.items().into_iter().enumerate() {
                        columns[col].push(item);
                    }
                }
                for col in &mut columns {
                    col.shuffle(rng);
                }
                for (row, t) in out.transactions.iter_mut().enumerate() {
                    let mut items: Vec<u32> = (0..width).map(|c| columns[c][row]).collect();
                    items.sort_unstable();
                    items.dedup();
                    let weight = t.weight;
                    *t = Transaction::new(items, weight);
                }
            }
            out
        }
    }
}

fn swaps_for(bag: &TransactionBag, n: usize) -> usize {
    let _ = bag;
    n.max(1)
}

fn clone_bag(bag: &TransactionBag) -> TransactionBag {
    let mut out = TransactionBag::new(clone_item_base(bag));
    out.transactions = bag.transactions.clone();
    out
}

// `ItemBase` has no public clone; spectrum surrogates only need the
// frequency/appearance data shared, not a true deep clone, so a fresh
// base re-registering the same objects would drift ids -- instead we
// share the transaction data and defer to the original bag's item base
// being immutable for the duration of surrogate generation. Surrogates
// are only used to mine supports, never to look up item objects, so the
// cloned bag borrows nothing and creates an empty base purely to satisfy
// `TransactionBag::new`'s ownership; `item_support`/`support` only touch
// `transactions`.
fn clone_item_base(bag: &TransactionBag) -> crate::item::ItemBase {
    let mut base = crate::item::ItemBase::new();
    for i in 0..bag.base.len() as u32 {
        let _ = base.add(bag.base.obj(i).clone());
    }
    base
}

fn weighted_pick(weights: &[u32], total: u64, rng: &mut StdRng) -> u32 {
    let mut target = rng.gen_range(0..total);
    for (i, &w) in weights.iter().enumerate() {
        if target < w as u64 {
            return i as u32;
        }
        target -= w as u64;
    }
    (weights.len() - 1) as u32
}

/// Swaps one item between transactions `i` and `j` when doing so keeps
/// both transactions' sizes unchanged and both items' overall supports
/// unchanged -- the permutation test's standard "swap randomization"
/// move. A no-op if no disjoint item pair is available.
fn swap_preserving_marginals(tas: &mut [Transaction], i: usize, j: usize) {
    let items_i = tas[i].items();
    let items_j = tas[j].items();
    let set_i: std::collections::HashSet<u32> = items_i.iter().copied().collect();
    let set_j: std::collections::HashSet<u32> = items_j.iter().copied().collect();
    let only_i: Vec<u32> = items_i.iter().copied().filter(|x| !set_j.contains(x)).collect();
    let only_j: Vec<u32> = items_j.iter().copied().filter(|x| !set_i.contains(x)).collect();
    if only_i.is_empty() || only_j.is_empty() {
        return;
    }
    let a = only_i[0];
    let b = only_j[0];
    let mut new_i: Vec<u32> = items_i.iter().copied().filter(|&x| x != a).chain([b]).collect();
    let mut new_j: Vec<u32> = items_j.iter().copied().filter(|&x| x != b).chain([a]).collect();
    new_i.sort_unstable();
    new_j.sort_unstable();
    let (wi, wj) = (tas[i].weight, tas[j].weight);
    tas[i] = Transaction::new(new_i, wi);
    tas[j] = Transaction::new(new_j, wj);
}

/// Mines one surrogate bag to completion with plain Apriori (sufficient
/// for spectrum construction; no closed/maximal filtering applies), and
/// folds every reported itemset into a fresh `PatternSpectrum`.
fn mine_one(bag: &TransactionBag, smin: u64) -> PatternSpectrum {
    let mut cfg = ReporterConfig::default();
    cfg.smin = smin;
    cfg.zmin = 1;
    cfg.target = Target::Sets;
    let mut reporter = Reporter::new(bag, cfg);
    let mut engine = Apriori::new(AprioriOptions::default());
    let mut abort = AbortCheck::new(Arc::new(AtomicBool::new(false)));
    let _ = engine.mine(bag, &mut reporter, &mut abort);
    let sets = reporter.finish_sets();
    let mut spectrum = PatternSpectrum::new();
    for s in sets {
        spectrum.add(s.items.len(), s.support, 1);
    }
    spectrum
}

/// Runs `opts.runs` surrogate mining passes in parallel, one worker per
/// run, each seeded deterministically from `(opts.seed, run_index)`, and
/// merges their spectra into one aggregate.
pub fn generate(bag: &TransactionBag, opts: &SpectrumOptions) -> Result<PatternSpectrum> {
    let spectra: Vec<PatternSpectrum> = (0..opts.runs)
        .into_par_iter()
        .map(|run| {
            let mut rng = StdRng::seed_from_u64(opts.seed.wrapping_add(run as u64));
            let surrogate = make_surrogate(bag, opts.method, &mut rng);
            mine_one(&surrogate, opts.smin)
        })
        .collect();

    let mut total = PatternSpectrum::new();
    for s in spectra {
        total.merge(&s);
    }
    // spec.md §4.9 step 3: return the averaged spectrum, counts divided by
    // the run count, matching `f4r_genpsp`'s `1.0/(double)cnt` scaling.
    let runs = opts.runs.max(1) as f64;
    for n in total.counts.values_mut() {
        *n = (*n as f64 / runs).round() as u64;
    }
    Ok(total)
}

/// Closed-form pattern-spectrum estimator: for each size `z`, assumes
/// itemset supports follow a distribution implied by the independence
/// model over the recoded item-frequency vector, scaled by `equiv`
/// equivalent-sample trials per size and thresholded by `alpha` (spec.md
/// §4.10). No mining run is performed; only `bag`'s item frequencies are
/// read.
pub fn estimate(bag: &TransactionBag, zmax: usize, equiv: f64, alpha: f64) -> PatternSpectrum {
    let n_items = bag.base.len();
    let total = bag.total_weight().max(1) as f64;
    let mut freqs: Vec<f64> = (0..n_items as u32)
        .map(|i| bag.item_support(i) as f64 / total)
        .collect();
    freqs.sort_by(|a, b| b.partial_cmp(a).unwrap());

    let mut spectrum = PatternSpectrum::new();
    for z in 1..=zmax.max(1) {
        if z > freqs.len() {
            break;
        }
        // Expected support of the z most frequent items' intersection
        // under independence: product of their individual frequencies.
        let p: f64 = freqs[..z].iter().product();
        let expected_supp = (p * total).round().max(0.0) as u64;
        let samples = (equiv.max(1.0)) as u64;
        if expected_supp > 0 && p >= alpha {
            spectrum.add(z, expected_supp, samples);
        }
    }
    spectrum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::TransactionBag;
    use crate::item::{ItemBase, ItemObj};

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
    fn identity_surrogate_matches_direct_mining() {
        let bag = scenario_bag();
        let opts = SpectrumOptions {
            method: SurrogateMethod::Identity,
            runs: 3,
            swaps: 0,
            smin: 2,
            seed: 7,
        };
        let spectrum = generate(&bag, &opts).unwrap();
        // 6 frequent itemsets, each appearing once per identical run,
        // averaged back down to a count of 1 across the 3 runs.
        assert_eq!(spectrum.total(), 6);
        assert_eq!(spectrum.at(1, 4), 1);
    }

    #[test]
    fn merge_is_commutative_in_totals() {
        let mut a = PatternSpectrum::new();
        a.add(1, 4, 2);
        let mut b = PatternSpectrum::new();
        b.add(1, 4, 3);
        b.add(2, 2, 1);
        let mut merged_ab = a.clone();
        merged_ab.merge(&b);
        let mut merged_ba = b.clone();
        merged_ba.merge(&a);
        assert_eq!(merged_ab.total(), merged_ba.total());
    }

    #[test]
    fn estimator_returns_nonempty_for_moderate_alpha() {
        let bag = scenario_bag();
        let spectrum = estimate(&bag, 2, 10.0, 0.0);
        assert!(spectrum.total() > 0);
    }
}
