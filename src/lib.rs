//! Frequent itemset mining and association rule induction over
//! transaction databases: five core mining engines (Apriori, Eclat,
//! FP-growth, SaM, RElim), two row-enumeration engines (Carpenter,
//! IsTa), closed/maximal/generator filtering, rule evaluation, a
//! pattern-spectrum subsystem, and a pattern-set reducer.

pub mod bag;
pub mod engines;
pub mod error;
pub mod eval;
pub mod item;
pub mod options;
pub mod reduce;
pub mod reporter;
pub mod rules;
pub mod spectrum;
pub mod tree;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use bag::TransactionBag;
use engines::apriori::{Apriori, AprioriOptions};
use engines::eclat::{Eclat, EclatOptions};
use engines::fpgrowth::{FpGrowth, FpGrowthOptions};
use engines::relim::{Relim, RelimOptions};
use engines::rowenum::{RowEnum, RowEnumOptions};
use engines::sam::{Sam, SamOptions};
use engines::{AbortCheck, Miner};
use error::Result;
use options::{Algorithm, MineOptions};
use reporter::{Reporter, ReporterConfig, RuleRecord, SetRecord, Target};

/// The result of one mining run: either item sets or rules, depending on
/// `MineOptions::target`.
pub enum MineResult {
    Sets(Vec<SetRecord>),
    Rules(Vec<RuleRecord>),
}

fn reporter_config(opts: &MineOptions) -> ReporterConfig {
    ReporterConfig {
        target: opts.target,
        zmin: opts.zmin,
        zmax: opts.zmax,
        smin: opts.smin,
        border: opts.border.clone(),
        eval: opts.eval,
        thresh: opts.thresh,
        prune: opts.prune,
        conf_min: opts.conf_min,
        agg: opts.agg,
        report: opts.report.clone(),
    }
}

/// Runs the mining engine selected by `opts.algorithm` to completion
/// against `bag`, honoring `abort` as a cooperative cancellation signal,
/// and returns either the accepted item sets or rules per `opts.target`.
pub fn mine(bag: &TransactionBag, opts: &MineOptions, abort: Arc<AtomicBool>) -> Result<MineResult> {
    let cfg = reporter_config(opts);
    let want_rules = opts.target == Target::Rules;
    let mut reporter = Reporter::new(bag, cfg);
    let mut check = AbortCheck::new(abort);

    match opts.algorithm {
        Algorithm::Apriori => {
            let ap_opts = if opts.mode.is_empty() {
                AprioriOptions::default()
            } else {
                options::parse_apriori_mode(&opts.mode)?
            };
            let mut engine = Apriori::new(ap_opts);
            engine.mine(bag, &mut reporter, &mut check)?;
        }
        Algorithm::Eclat => {
            let repr = if opts.mode.is_empty() {
                engines::eclat::VerticalRepr::default()
            } else {
                options::parse_eclat_repr(&opts.mode)?
            };
            let mut engine = Eclat::new(EclatOptions { repr });
            engine.mine(bag, &mut reporter, &mut check)?;
        }
        Algorithm::FpGrowth => {
            let fp_opts = if opts.mode.is_empty() {
                FpGrowthOptions::default()
            } else {
                options::parse_fpgrowth_mode(&opts.mode)?
            };
            let mut engine = FpGrowth::new(fp_opts);
            engine.mine(bag, &mut reporter, &mut check)?;
        }
        Algorithm::Sam => {
            let mut engine = Sam::new(SamOptions::default());
            engine.mine(bag, &mut reporter, &mut check)?;
        }
        Algorithm::Relim => {
            let mut engine = Relim::new(RelimOptions::default());
            engine.mine(bag, &mut reporter, &mut check)?;
        }
        Algorithm::Carpenter => {
            let repr = if opts.mode.is_empty() {
                engines::rowenum::RowEnumRepr::default()
            } else {
                options::parse_rowenum_repr(&opts.mode)?
            };
            let mut engine = RowEnum::new(RowEnumOptions { repr, ista: false });
            engine.mine(bag, &mut reporter, &mut check)?;
        }
        Algorithm::IsTa => {
            let repr = if opts.mode.is_empty() {
                engines::rowenum::RowEnumRepr::Tids
            } else {
                options::parse_rowenum_repr(&opts.mode)?
            };
            let mut engine = RowEnum::new(RowEnumOptions { repr, ista: true });
            engine.mine(bag, &mut reporter, &mut check)?;
        }
    }

    if want_rules {
        Ok(MineResult::Rules(reporter.finish_rules()))
    } else {
        Ok(MineResult::Sets(reporter.finish_sets()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bag::Transaction;
    use item::{ItemBase, ItemObj};
    use reporter::{Border, ReportField};

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

    fn base_opts(algorithm: Algorithm) -> MineOptions {
        MineOptions {
            algorithm,
            target: Target::Sets,
            smin: 2,
            zmin: 1,
            zmax: None,
            conf_min: 0.0,
            eval: eval::EvalMeasure::None,
            agg: reporter::Aggregate::None,
            thresh: 0.0,
            prune: 0,
            border: Border::default(),
            report: ReportField::parse_str("s"),
            mode: String::new(),
        }
    }

    #[test]
    fn all_engines_agree_on_scenario_a_set_count() {
        let bag = scenario_bag();
        let abort = Arc::new(AtomicBool::new(false));
        for algo in [
            Algorithm::Apriori,
            Algorithm::Eclat,
            Algorithm::FpGrowth,
            Algorithm::Sam,
            Algorithm::Relim,
            Algorithm::Carpenter,
            Algorithm::IsTa,
        ] {
            let opts = base_opts(algo);
            let result = mine(&bag, &opts, abort.clone()).unwrap();
            match result {
                MineResult::Sets(sets) => assert_eq!(sets.len(), 6, "algorithm {:?}", algo),
                MineResult::Rules(_) => panic!("expected sets"),
            }
        }
    }

    #[test]
    fn rules_target_returns_rule_records() {
        let bag = scenario_bag();
        let mut opts = base_opts(Algorithm::Apriori);
        opts.target = Target::Rules;
        opts.conf_min = 0.6;
        let abort = Arc::new(AtomicBool::new(false));
        let result = mine(&bag, &opts, abort).unwrap();
        match result {
            MineResult::Rules(rules) => assert!(!rules.is_empty()),
            MineResult::Sets(_) => panic!("expected rules"),
        }
    }
}
