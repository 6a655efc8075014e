//! Per-rule and per-set evaluation measures (spec.md §4.4), and the full
//! measure-code enumeration carried from `fim4r.c`'s `get_evalx` table
//! (SPEC_FULL.md §4.4).

use fishers_exact::fishers_exact;

/// Evaluation measure selector. All measures return 0 when any marginal
/// (`body`, `head`, or `base`) is 0 -- the "degenerate marginal" clamp
/// spec.md §7 mandates, rather than surfacing NaN/inf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvalMeasure {
    None,
    Support,
    Confidence,
    ConfidenceDiff,
    Lift,
    LiftDiff,
    LiftQuotient,
    Conviction,
    ConvictionDiff,
    ConvictionQuotient,
    CondProb,
    Importance,
    Certainty,
    Chi2,
    Chi2Pval,
    Yates,
    YatesPval,
    Info,
    InfoPval,
    FetProb,
    FetChi2,
    FetInfo,
    FetSupp,
}

impl EvalMeasure {
    /// `true` for measures where smaller values are more significant
    /// (p-values): the reporter's threshold comparison flips to `<=`.
    pub fn is_pvalue(self) -> bool {
        matches!(
            self,
            EvalMeasure::Chi2Pval | EvalMeasure::YatesPval | EvalMeasure::InfoPval
        )
    }
}

/// A 2x2 contingency table of itemset `B` vs item `h`, expressed in
/// absolute support counts, with the total transaction weight `base`.
#[derive(Clone, Copy, Debug)]
pub struct Contingency {
    /// supp(B ∪ {h})
    pub both: u64,
    /// supp(B)
    pub body: u64,
    /// supp({h})
    pub head: u64,
    /// total database weight
    pub base: u64,
}

impl Contingency {
    fn n11(&self) -> f64 {
        self.both as f64
    }
    fn n10(&self) -> f64 {
        (self.body - self.both) as f64
    }
    fn n01(&self) -> f64 {
        (self.head - self.both) as f64
    }
    fn n00(&self) -> f64 {
        (self.base - self.body - self.head + self.both) as f64
    }
}

pub fn confidence(c: &Contingency) -> f64 {
    if c.body == 0 {
        return 0.0;
    }
    c.both as f64 / c.body as f64
}

pub fn lift(c: &Contingency) -> f64 {
    if c.body == 0 || c.head == 0 {
        return 0.0;
    }
    (c.both as f64 * c.base as f64) / (c.body as f64 * c.head as f64)
}

pub fn conviction(c: &Contingency) -> f64 {
    if c.body == 0 || c.base == 0 {
        return 0.0;
    }
    let pb = c.body as f64 / c.base as f64;
    let ph = c.head as f64 / c.base as f64;
    let denom = pb - c.both as f64 / c.base as f64;
    if denom <= 0.0 {
        return 0.0;
    }
    (pb * (1.0 - ph)) / denom
}

/// Pearson's chi-squared statistic over the 2x2 contingency table.
pub fn chi2(c: &Contingency) -> f64 {
    if c.body == 0 || c.head == 0 || c.base == 0 {
        return 0.0;
    }
    let n = c.base as f64;
    let expect = |row: f64, col: f64| row * col / n;
    let e11 = expect(c.body as f64, c.head as f64);
    let e10 = expect(c.body as f64, n - c.head as f64);
    let e01 = expect(n - c.body as f64, c.head as f64);
    let e00 = expect(n - c.body as f64, n - c.head as f64);
    let term = |o: f64, e: f64| if e > 0.0 { (o - e).powi(2) / e } else { 0.0 };
    term(c.n11(), e11) + term(c.n10(), e10) + term(c.n01(), e01) + term(c.n00(), e00)
}

/// Upper-tail p-value of `chi2` under the chi-squared distribution with 1
/// degree of freedom.
pub fn chi2_pvalue(c: &Contingency) -> f64 {
    chi2_upper_tail_df1(chi2(c))
}

/// Yates-corrected chi-squared: each |O-E| term is reduced by 0.5 before
/// squaring, guarding against overestimating significance on small counts.
pub fn yates(c: &Contingency) -> f64 {
    if c.body == 0 || c.head == 0 || c.base == 0 {
        return 0.0;
    }
    let n = c.base as f64;
    let expect = |row: f64, col: f64| row * col / n;
    let e11 = expect(c.body as f64, c.head as f64);
    let e10 = expect(c.body as f64, n - c.head as f64);
    let e01 = expect(n - c.body as f64, c.head as f64);
    let e00 = expect(n - c.body as f64, n - c.head as f64);
    let term = |o: f64, e: f64| {
        if e > 0.0 {
            let d = (o - e).abs() - 0.5;
            let d = d.max(0.0);
            d * d / e
        } else {
            0.0
        }
    };
    term(c.n11(), e11) + term(c.n10(), e10) + term(c.n01(), e01) + term(c.n00(), e00)
}

pub fn yates_pvalue(c: &Contingency) -> f64 {
    chi2_upper_tail_df1(yates(c))
}

/// Mutual information in nats: I = Σ p(x,y) log(p(x,y)/(p(x)p(y))).
pub fn mutual_information(c: &Contingency) -> f64 {
    if c.body == 0 || c.head == 0 || c.base == 0 {
        return 0.0;
    }
    let n = c.base as f64;
    let px = [c.body as f64 / n, (n - c.body as f64) / n];
    let py = [c.head as f64 / n, (n - c.head as f64) / n];
    let joint = [
        [c.n11() / n, c.n10() / n],
        [c.n01() / n, c.n00() / n],
    ];
    let mut info = 0.0;
    for (x, px_val) in px.iter().enumerate() {
        for (y, py_val) in py.iter().enumerate() {
            let p = joint[x][y];
            if p > 0.0 && *px_val > 0.0 && *py_val > 0.0 {
                info += p * (p / (px_val * py_val)).ln();
            }
        }
    }
    info.max(0.0)
}

/// G-test p-value: G = 2*W*I under a chi-squared distribution with 1
/// degree of freedom.
pub fn info_pvalue(c: &Contingency) -> f64 {
    let g = 2.0 * c.base as f64 * mutual_information(c);
    chi2_upper_tail_df1(g)
}

/// Fisher's exact test: probability of the observed table or a table more
/// extreme, summed over the hypergeometric distribution's tail.
pub fn fisher_exact_prob(c: &Contingency) -> f64 {
    if c.body == 0 || c.head == 0 || c.base == 0 {
        return 0.0;
    }
    let a = c.n11() as u32;
    let b = c.n10() as u32;
    let cc = c.n01() as u32;
    let d = c.n00() as u32;
    match fishers_exact(&[a, b, cc, d]) {
        Ok(result) => result.greater_pvalue,
        Err(_) => 0.0,
    }
}

/// Evaluates the selected measure over a contingency table.
pub fn evaluate(measure: EvalMeasure, c: &Contingency) -> f64 {
    match measure {
        EvalMeasure::None => 0.0,
        EvalMeasure::Support => c.both as f64 / c.base.max(1) as f64,
        EvalMeasure::Confidence => confidence(c),
        EvalMeasure::ConfidenceDiff => {
            if c.base == 0 {
                0.0
            } else {
                confidence(c) - (c.head as f64 / c.base as f64)
            }
        }
        EvalMeasure::Lift => lift(c),
        EvalMeasure::LiftDiff => lift(c) - 1.0,
        EvalMeasure::LiftQuotient => {
            if lift(c) < 1.0 {
                0.0
            } else {
                lift(c)
            }
        }
        EvalMeasure::Conviction => conviction(c),
        EvalMeasure::ConvictionDiff => conviction(c) - 1.0,
        EvalMeasure::ConvictionQuotient => conviction(c),
        EvalMeasure::CondProb => confidence(c),
        EvalMeasure::Importance => {
            // Laplace-corrected confidence, as a log-odds-style importance.
            if c.body == 0 {
                0.0
            } else {
                ((c.both as f64 + 1.0) / (c.body as f64 + 2.0)).ln()
                    - ((c.head as f64 + 1.0) / (c.base as f64 + 2.0)).ln()
            }
        }
        EvalMeasure::Certainty => {
            let conf = confidence(c);
            if c.base == 0 {
                0.0
            } else {
                let ph = c.head as f64 / c.base as f64;
                if ph >= 1.0 {
                    0.0
                } else {
                    (conf - ph) / (1.0 - ph)
                }
            }
        }
        EvalMeasure::Chi2 => chi2(c),
        EvalMeasure::Chi2Pval => chi2_pvalue(c),
        EvalMeasure::Yates => yates(c),
        EvalMeasure::YatesPval => yates_pvalue(c),
        EvalMeasure::Info => mutual_information(c),
        EvalMeasure::InfoPval => info_pvalue(c),
        EvalMeasure::FetProb => fisher_exact_prob(c),
        EvalMeasure::FetChi2 => fisher_weighted(chi2(c), c),
        EvalMeasure::FetInfo => fisher_weighted(mutual_information(c), c),
        EvalMeasure::FetSupp => fisher_weighted(c.both as f64 / c.base.max(1) as f64, c),
    }
}

/// Scales a base measure by Fisher's-exact-test confidence
/// (`1 - fisher_exact_prob`), so the `fet`-prefixed chi2/info/support
/// variants rank in the same direction as their base measure but are
/// damped toward zero when the exact test finds the table unremarkable.
fn fisher_weighted(value: f64, c: &Contingency) -> f64 {
    value * (1.0 - fisher_exact_prob(c))
}

/// Regularized upper incomplete gamma function Q(1/2, x/2), which is the
/// upper-tail probability of a chi-squared distribution with 1 degree of
/// freedom -- equivalently `erfc(sqrt(x/2))`.
fn chi2_upper_tail_df1(x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    erfc(( x / 2.0).sqrt())
}

/// Complementary error function via Abramowitz & Stegun 7.1.26, accurate
/// to ~1.5e-7 -- ample precision for a filtering threshold comparison.
fn erfc(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    1.0 - sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_and_lift_match_scenario_d() {
        // {2} -> {1}: supp({1,2})=2, supp({2})=3, supp({1})=4, base=5.
        let c = Contingency {
            both: 2,
            body: 3,
            head: 4,
            base: 5,
        };
        assert!((confidence(&c) - 0.6667).abs() < 1e-3);
        assert!((lift(&c) - (2.0 * 5.0) / (3.0 * 4.0)).abs() < 1e-9);
    }

    #[test]
    fn zero_marginal_clamps_to_zero() {
        let c = Contingency {
            both: 0,
            body: 0,
            head: 5,
            base: 10,
        };
        assert_eq!(confidence(&c), 0.0);
        assert_eq!(lift(&c), 0.0);
        assert_eq!(chi2(&c), 0.0);
    }

    #[test]
    fn chi2_pvalue_in_unit_interval() {
        let c = Contingency {
            both: 2,
            body: 3,
            head: 4,
            base: 5,
        };
        let p = chi2_pvalue(&c);
        assert!((0.0..=1.0).contains(&p));
    }
}
