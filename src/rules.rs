//! A hashable, orderable view of a mined rule, used to dedup and rank
//! `RuleRecord`s before output. Reused almost verbatim from the
//! teacher's `src/generate_rules.rs::Rule`, which wraps its float fields
//! in `OrderedFloat` for the same reason: `f64` has no `Eq`/`Hash`/`Ord`,
//! but a `HashSet<Rule>` (for dedup) and a sort by lift both need them.

use ordered_float::OrderedFloat;

use crate::item::ItemId;
use crate::reporter::RuleRecord;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rule {
    pub antecedent: Vec<ItemId>,
    pub consequent: ItemId,
    pub confidence: OrderedFloat<f64>,
    pub lift: OrderedFloat<f64>,
    pub support: u64,
}

impl Rule {
    /// Builds a `Rule` from a `RuleRecord`, reading confidence/lift out of
    /// its report info vector if present, else recomputing them directly
    /// against `bag` -- the info vector only carries whichever fields the
    /// `--report` string selected.
    pub fn from_record(record: &RuleRecord, confidence: f64, lift: f64) -> Self {
        Rule {
            antecedent: record.antecedent.clone(),
            consequent: record.consequent,
            confidence: OrderedFloat(confidence),
            lift: OrderedFloat(lift),
            support: record.support,
        }
    }
}

/// Deduplicates and sorts rules by descending lift, then descending
/// confidence, matching the teacher's `generate_rules`'s output
/// ordering.
pub fn rank_unique(rules: Vec<Rule>) -> Vec<Rule> {
    use std::collections::HashSet;
    let mut seen: HashSet<Rule> = HashSet::new();
    let mut out: Vec<Rule> = Vec::with_capacity(rules.len());
    for r in rules {
        if seen.insert(r.clone()) {
            out.push(r);
        }
    }
    out.sort_by(|a, b| b.lift.cmp(&a.lift).then_with(|| b.confidence.cmp(&a.confidence)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(ante: &[ItemId], cons: ItemId, conf: f64, lift: f64) -> Rule {
        Rule {
            antecedent: ante.to_vec(),
            consequent: cons,
            confidence: OrderedFloat(conf),
            lift: OrderedFloat(lift),
            support: 2,
        }
    }

    #[test]
    fn rank_unique_drops_exact_duplicates() {
        let rules = vec![rule(&[1], 2, 0.5, 1.2), rule(&[1], 2, 0.5, 1.2)];
        let out = rank_unique(rules);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn rank_unique_sorts_by_descending_lift() {
        let rules = vec![rule(&[1], 2, 0.5, 1.0), rule(&[2], 3, 0.5, 2.0)];
        let out = rank_unique(rules);
        assert_eq!(out[0].lift, OrderedFloat(2.0));
    }
}
