//! Common mining-engine contract. Each of the five core engines, plus the
//! two row-enumeration engines, implements this trait instead of sharing
//! an inheritance hierarchy (spec.md §9 "deep dispatch" design note).

pub mod apriori;
pub mod eclat;
pub mod fpgrowth;
pub mod relim;
pub mod rowenum;
pub mod sam;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bag::TransactionBag;
use crate::reporter::Reporter;

/// Cooperative-abort check, loaded at most once every `INTERVAL` reports
/// to avoid a contended atomic load on every single candidate (spec.md
/// §5: "at least every 20 reported sets").
pub struct AbortCheck {
    flag: Arc<AtomicBool>,
    count: u32,
}

const ABORT_CHECK_INTERVAL: u32 = 20;

impl AbortCheck {
    pub fn new(flag: Arc<AtomicBool>) -> Self {
        AbortCheck { flag, count: 0 }
    }

    /// Returns `true` once the host has requested an abort. Cheap to call
    /// per report; only samples the atomic every `ABORT_CHECK_INTERVAL`
    /// calls.
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count < ABORT_CHECK_INTERVAL {
            return false;
        }
        self.count = 0;
        self.flag.load(Ordering::Relaxed)
    }
}

/// Shared contract for all mining engines: construct against a bag and
/// reporter configuration, run to completion or abort, and yield whatever
/// the reporter accumulated. There is deliberately no separate
/// `create`/`data`/`delete` lifecycle as in the C original (spec.md §9) --
/// ordinary Rust ownership (the engine borrows the bag and owns the
/// reporter for the duration of `mine`) replaces it.
pub trait Miner<'a> {
    /// Runs the engine to completion, feeding every candidate frequent
    /// itemset it discovers into `reporter.report(...)`. Returns `Err` if
    /// the abort flag fires mid-run.
    fn mine(
        &mut self,
        bag: &'a TransactionBag,
        reporter: &mut Reporter<'a>,
        abort: &mut AbortCheck,
    ) -> crate::error::Result<()>;
}
