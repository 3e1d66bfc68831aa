//! Commit events and terminal transaction outcomes.

use crate::proposal::TxId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event emitted by the ordering service once a transaction lands in a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEvent {
    pub tx_id: TxId,
    /// Whether the ledger's validation accepted the transaction.
    pub valid: bool,
    pub block_number: u64,
}

/// Terminal classification of a submitted transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitOutcome {
    /// Committed and marked valid.
    CommittedValid,
    /// Ordered into a block but rejected by ledger validation.
    CommittedInvalid,
    /// No commit event within the wait bound. The transaction may still commit.
    TimedOut,
    /// The ordering service refused endorsements that did not agree.
    RejectedInconsistent,
    /// Nothing was available to order.
    RejectedNoResponse,
}

impl CommitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::CommittedValid)
    }

    /// `false` only for [`CommitOutcome::TimedOut`], whose real result is unknown.
    pub fn is_definitive(&self) -> bool {
        !matches!(self, Self::TimedOut)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommittedValid => "COMMITTED_VALID",
            Self::CommittedInvalid => "COMMITTED_INVALID",
            Self::TimedOut => "TIMED_OUT",
            Self::RejectedInconsistent => "REJECTED_INCONSISTENT",
            Self::RejectedNoResponse => "REJECTED_NO_RESPONSE",
        }
    }
}

impl fmt::Display for CommitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
