//! Outcome counters for invocations run through a [`Gateway`](crate::Gateway).

use endorse_types::CommitOutcome;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{InvocationError, TransactionReceipt};

const LABELS: [&str; 8] = [
    "committed_valid",
    "committed_invalid",
    "timed_out",
    "rejected_inconsistent",
    "rejected_no_response",
    "no_satisfying_topology",
    "channel_error",
    "other",
];

/// Thread-safe tally of terminal invocation results.
#[derive(Debug, Default)]
pub struct PipelineStats {
    counters: [AtomicU64; LABELS.len()],
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: &Result<TransactionReceipt, InvocationError>) {
        let label = match result {
            Ok(receipt) => outcome_label(receipt.outcome),
            Err(InvocationError::Selection(_)) => "no_satisfying_topology",
            Err(InvocationError::Channel { .. }) => "channel_error",
            Err(err) => err.outcome().map(outcome_label).unwrap_or("other"),
        };
        self.increment(label);
    }

    pub fn get(&self, label: &str) -> u64 {
        LABELS
            .iter()
            .position(|l| *l == label)
            .map(|i| self.counters[i].load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counters
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        LABELS
            .iter()
            .zip(self.counters.iter())
            .map(|(&label, c)| (label, c.load(Ordering::Relaxed)))
            .collect()
    }

    fn increment(&self, label: &str) {
        if let Some(i) = LABELS.iter().position(|l| *l == label) {
            self.counters[i].fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn outcome_label(outcome: CommitOutcome) -> &'static str {
    match outcome {
        CommitOutcome::CommittedValid => "committed_valid",
        CommitOutcome::CommittedInvalid => "committed_invalid",
        CommitOutcome::TimedOut => "timed_out",
        CommitOutcome::RejectedInconsistent => "rejected_inconsistent",
        CommitOutcome::RejectedNoResponse => "rejected_no_response",
    }
}
