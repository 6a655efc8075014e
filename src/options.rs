//! Parses the host-boundary configuration strings (`target`, `eval`,
//! `agg`, `algo`, `mode`, `report`, `red`) into typed values, and holds
//! the assembled `MineOptions` a CLI or embedder builds before calling
//! `mine(...)` (spec.md §9 "dynamic option strings parsed once at the
//! boundary"). Alias tables grounded on `original_source/src/fim4r.c`'s
//! `get_target`/`get_evalx`/`get_agg`/`get_surr`/`get_red`/`get_app`.

use crate::engines::apriori::AprioriOptions;
use crate::engines::eclat::VerticalRepr;
use crate::engines::fpgrowth::{FpGrowthMode, FpGrowthOptions};
use crate::engines::rowenum::RowEnumRepr;
use crate::error::{FimError, Result};
use crate::eval::EvalMeasure;
use crate::reduce::ReduceMode;
use crate::reporter::{Aggregate, Border, ReportField, Target};
use crate::spectrum::SurrogateMethod;

/// Which mining engine to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Apriori,
    Eclat,
    FpGrowth,
    Sam,
    Relim,
    Carpenter,
    IsTa,
}

pub fn parse_target(s: &str) -> Result<Target> {
    match s {
        "s" | "set" | "sets" | "frequent" => Ok(Target::Sets),
        "c" | "closed" => Ok(Target::Closed),
        "m" | "maximal" | "max" => Ok(Target::Maximal),
        "g" | "gen" | "generators" => Ok(Target::Generators),
        "r" | "rule" | "rules" => Ok(Target::Rules),
        other => Err(FimError::InvalidArgument(format!(
            "unknown target code '{other}'"
        ))),
    }
}

pub fn parse_algorithm(s: &str) -> Result<Algorithm> {
    match s {
        "apriori" | "a" => Ok(Algorithm::Apriori),
        "eclat" | "e" => Ok(Algorithm::Eclat),
        "fpgrowth" | "fp-growth" | "f" => Ok(Algorithm::FpGrowth),
        "sam" => Ok(Algorithm::Sam),
        "relim" => Ok(Algorithm::Relim),
        "carpenter" => Ok(Algorithm::Carpenter),
        "ista" => Ok(Algorithm::IsTa),
        other => Err(FimError::InvalidArgument(format!(
            "unknown algorithm '{other}'"
        ))),
    }
}

pub fn parse_eval(s: &str) -> Result<EvalMeasure> {
    Ok(match s {
        "none" | "x" => EvalMeasure::None,
        "supp" | "support" => EvalMeasure::Support,
        "conf" | "confidence" => EvalMeasure::Confidence,
        "confdiff" => EvalMeasure::ConfidenceDiff,
        "lift" => EvalMeasure::Lift,
        "liftdiff" => EvalMeasure::LiftDiff,
        "liftquot" => EvalMeasure::LiftQuotient,
        "conv" | "conviction" => EvalMeasure::Conviction,
        "convdiff" => EvalMeasure::ConvictionDiff,
        "convquot" => EvalMeasure::ConvictionQuotient,
        "cprob" => EvalMeasure::CondProb,
        "import" | "importance" => EvalMeasure::Importance,
        "cert" | "certainty" => EvalMeasure::Certainty,
        "chi2" => EvalMeasure::Chi2,
        "chi2pval" => EvalMeasure::Chi2Pval,
        "yates" => EvalMeasure::Yates,
        "yatespval" => EvalMeasure::YatesPval,
        "info" => EvalMeasure::Info,
        "infopval" | "gtest" => EvalMeasure::InfoPval,
        "fet" | "fetprob" => EvalMeasure::FetProb,
        "fetchi2" => EvalMeasure::FetChi2,
        "fetinfo" => EvalMeasure::FetInfo,
        "fetsupp" => EvalMeasure::FetSupp,
        other => {
            return Err(FimError::InvalidArgument(format!(
                "unknown evaluation measure '{other}'"
            )))
        }
    })
}

pub fn parse_agg(s: &str) -> Result<Aggregate> {
    match s {
        "none" | "x" => Ok(Aggregate::None),
        "min" => Ok(Aggregate::Min),
        "max" => Ok(Aggregate::Max),
        "avg" | "mean" => Ok(Aggregate::Avg),
        other => Err(FimError::InvalidArgument(format!(
            "unknown aggregation mode '{other}'"
        ))),
    }
}

pub fn parse_surrogate(s: &str) -> Result<SurrogateMethod> {
    match s {
        "ident" | "identity" => Ok(SurrogateMethod::Identity),
        "random" | "rand" => Ok(SurrogateMethod::Random),
        "swap" => Ok(SurrogateMethod::Swap),
        "shuffle" => Ok(SurrogateMethod::Shuffle),
        other => Err(FimError::InvalidArgument(format!(
            "unknown surrogate method '{other}'"
        ))),
    }
}

/// Full alias table for the eight reduction modes, including the `0`/`1`
/// shorthand the original's `get_red` accepts (`"coins"` == `"coins0"`).
pub fn parse_reduce_mode(s: &str) -> Result<ReduceMode> {
    match s {
        "coins" | "coins0" => Ok(ReduceMode::Coins0),
        "coins1" => Ok(ReduceMode::Coins1),
        "items" | "items2" | "neurons" => Ok(ReduceMode::Items),
        "cover" | "cover0" => Ok(ReduceMode::Cover0),
        "covered1" | "cover1" => Ok(ReduceMode::Cover1),
        "leni" | "lenient" | "lenient0" => Ok(ReduceMode::Lenient0),
        "lenient1" => Ok(ReduceMode::Lenient1),
        "strict" | "strict0" => Ok(ReduceMode::Strict0),
        "strict1" => Ok(ReduceMode::Strict1),
        other => Err(FimError::InvalidArgument(format!(
            "unknown reduction mode '{other}'"
        ))),
    }
}

pub fn parse_eclat_repr(s: &str) -> Result<VerticalRepr> {
    match s {
        "lists" | "tids" => Ok(VerticalRepr::Lists),
        "bits" | "bitmap" => Ok(VerticalRepr::Bits),
        "table" | "tables" => Ok(VerticalRepr::Table),
        "diffs" | "diffsets" => Ok(VerticalRepr::Diffs),
        "ranges" => Ok(VerticalRepr::Ranges),
        "occdlv" | "occurrences" => Ok(VerticalRepr::Occdlv),
        other => Err(FimError::InvalidArgument(format!(
            "unknown eclat representation '{other}'"
        ))),
    }
}

/// Parses Apriori's `mode` string: a `+`-separated list of flags, each
/// toggling one `AprioriOptions` field off its default.
pub fn parse_apriori_mode(s: &str) -> Result<AprioriOptions> {
    let mut opts = AprioriOptions::default();
    for tok in s.split('+').map(str::trim).filter(|t| !t.is_empty()) {
        match tok {
            "origsupp" | "orig-supp" => opts.orig_supp = true,
            "noperfect" | "no-perfect" => opts.disable_perfect_extension = true,
            other => {
                return Err(FimError::InvalidArgument(format!(
                    "unknown apriori mode flag '{other}'"
                )))
            }
        }
    }
    Ok(opts)
}

/// Parses FP-growth's `mode` string (spec.md §4.7's
/// complex/simple/top-down/single variant selection).
pub fn parse_fpgrowth_mode(s: &str) -> Result<FpGrowthOptions> {
    if s.is_empty() {
        return Ok(FpGrowthOptions::default());
    }
    let mode = match s {
        "complex" => FpGrowthMode::Complex,
        "simple" => FpGrowthMode::Simple,
        "topdown" | "top-down" => FpGrowthMode::TopDown,
        "single" => FpGrowthMode::Single,
        other => {
            return Err(FimError::InvalidArgument(format!(
                "unknown fpgrowth mode '{other}'"
            )))
        }
    };
    Ok(FpGrowthOptions { mode })
}

/// Parses the row-enumeration representation, resolving spec.md §9's
/// duplicated `"table"` literal as a `"tids"` typo (see DESIGN.md).
pub fn parse_rowenum_repr(s: &str) -> Result<RowEnumRepr> {
    match s {
        "table" => Ok(RowEnumRepr::Table),
        "tids" => Ok(RowEnumRepr::Tids),
        other => Err(FimError::InvalidArgument(format!(
            "unknown row-enumeration representation '{other}'"
        ))),
    }
}

/// Parses a comma-separated border string (e.g. `"2,2,1"`) into a
/// `Border` whose `mins[z]` is the minimum support required at size `z`.
pub fn parse_border(s: &str) -> Result<Border> {
    if s.is_empty() {
        return Ok(Border::default());
    }
    let mut mins = vec![None];
    for part in s.split(',') {
        let v: u64 = part
            .trim()
            .parse()
            .map_err(|_| FimError::InvalidArgument(format!("invalid border value '{part}'")))?;
        mins.push(Some(v));
    }
    Ok(Border { mins })
}

/// Fully assembled options for one mining run, built once at the
/// boundary from whatever strings the host (CLI or embedder) supplies.
pub struct MineOptions {
    pub algorithm: Algorithm,
    pub target: Target,
    pub smin: u64,
    pub zmin: usize,
    pub zmax: Option<usize>,
    pub conf_min: f64,
    pub eval: EvalMeasure,
    pub agg: Aggregate,
    pub thresh: f64,
    pub prune: usize,
    pub border: Border,
    pub report: Vec<ReportField>,
    /// Per-algorithm variant-selection string, parsed by whichever
    /// engine `algorithm` selects (Eclat's representation, FP-growth's
    /// complex/simple/top-down/single choice, Apriori's `+`-joined
    /// flags, or Carpenter/IsTa's row representation). Empty means "use
    /// that engine's default".
    pub mode: String,
}

impl MineOptions {
    pub fn report_string(&mut self, s: &str) {
        self.report = ReportField::parse_str(s);
    }
}
