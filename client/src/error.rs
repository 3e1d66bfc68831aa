use endorse_selection::SelectionError;
use endorse_types::{CommitOutcome, TxId};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Pipeline stage an invocation was in when it stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Assembling,
    SelectingEndorsers,
    Proposing,
    Submitting,
    /// Read-only query outside the transaction pipeline.
    Querying,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assembling => "assembling",
            Self::SelectingEndorsers => "selecting_endorsers",
            Self::Proposing => "proposing",
            Self::Submitting => "submitting",
            Self::Querying => "querying",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures reported by a [`Channel`](crate::Channel) or [`Connector`](crate::Connector).
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("service discovery failed: {0}")]
    Discovery(String),

    #[error("endorsement by {peer} failed: {reason}")]
    Endorsement { peer: String, reason: String },

    #[error("query evaluation failed: {0}")]
    Evaluation(String),

    #[error("submission to ordering service failed: {0}")]
    Submission(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("unknown affiliation '{0}'")]
    UnknownAffiliation(String),

    #[error("enrollment of '{user}' failed: {reason}")]
    Enrollment { user: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Rejections decided from the collected endorsement responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalError {
    #[error("no endorsement responses received within the wait bound")]
    NoResponse,

    #[error("endorsers disagree: {responses} responses fall into {classes} read/write-set classes")]
    InconsistentResults { classes: usize, responses: usize },
}

/// Terminal failure of one invocation.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("channel error while {stage}: {source}")]
    Channel {
        stage: Stage,
        #[source]
        source: ChannelError,
    },

    #[error("endorser selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error("proposal rejected: {0}")]
    Proposal(#[from] ProposalError),

    #[error("transaction {tx_id} not confirmed within {waited:?}; outcome unknown")]
    TimedOut { tx_id: TxId, waited: Duration },

    #[error("transaction {tx_id} was ordered but marked invalid")]
    CommittedInvalid {
        tx_id: TxId,
        block_number: Option<u64>,
    },

    #[error("transaction {tx_id} rejected by the ordering service: {outcome}")]
    Rejected { tx_id: TxId, outcome: CommitOutcome },

    #[error("invocation task failed: {0}")]
    TaskFailed(String),
}

impl InvocationError {
    /// The stage that failed, when known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Identity(_) => Some(Stage::Assembling),
            Self::Channel { stage, .. } => Some(*stage),
            Self::Selection(_) => Some(Stage::SelectingEndorsers),
            Self::Proposal(_) => Some(Stage::Proposing),
            Self::TimedOut { .. } | Self::CommittedInvalid { .. } | Self::Rejected { .. } => {
                Some(Stage::Submitting)
            }
            Self::TaskFailed(_) => None,
        }
    }

    /// The commit classification this failure corresponds to, if any.
    pub fn outcome(&self) -> Option<CommitOutcome> {
        match self {
            Self::Proposal(ProposalError::NoResponse) => Some(CommitOutcome::RejectedNoResponse),
            Self::Proposal(ProposalError::InconsistentResults { .. }) => {
                Some(CommitOutcome::RejectedInconsistent)
            }
            Self::TimedOut { .. } => Some(CommitOutcome::TimedOut),
            Self::CommittedInvalid { .. } => Some(CommitOutcome::CommittedInvalid),
            Self::Rejected { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }
}
