//! Transaction proposals and the responses endorsers return for them.

use crate::identity::Identity;
use crate::layout::Endorser;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

/// Length of the random nonce mixed into every transaction id.
pub const NONCE_LEN: usize = 24;

/// Default bound on waiting for endorsement responses.
pub const DEFAULT_PROPOSAL_WAIT: Duration = Duration::from_millis(120_000);

/// Hex-encoded transaction id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(String);

impl TxId {
    /// Derive the id the ledger expects: `sha256(nonce || msp_id || name)`.
    pub fn derive(nonce: &[u8], creator: &Identity) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(nonce);
        hasher.update(creator.msp_id.as_bytes());
        hasher.update(creator.name.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Derive a fresh id for `creator` using a random nonce.
    pub fn generate(creator: &Identity, rng: &mut dyn RngCore) -> Self {
        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce);
        Self::derive(&nonce, creator)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        self.0
            .char_indices()
            .nth(8)
            .map_or(self.0.as_str(), |(end, _)| &self.0[..end])
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TxId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A request to execute one contract function.
///
/// Immutable once built; consumed by exactly one propose call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionProposal {
    pub tx_id: TxId,
    pub contract: String,
    pub function: String,
    pub args: Vec<String>,
    /// Upper bound on waiting for endorsement responses.
    pub wait_time: Duration,
}

impl TransactionProposal {
    pub fn new(tx_id: TxId, contract: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            tx_id,
            contract: contract.into(),
            function: function.into(),
            args: Vec::new(),
            wait_time: DEFAULT_PROPOSAL_WAIT,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }
}

/// Digest of the read/write set an endorser observed while simulating a proposal.
///
/// Endorsers that computed the same effects against the same state produce
/// the same fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RwSetFingerprint([u8; 32]);

impl RwSetFingerprint {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Fingerprint a serialized read/write set.
    pub fn of(rw_set: &[u8]) -> Self {
        Self(Sha256::digest(rw_set).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for RwSetFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RwSetFingerprint({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for RwSetFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// One endorser's independently computed result for a proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalResponse {
    pub endorser: Endorser,
    pub fingerprint: RwSetFingerprint,
    /// Contract response payload.
    pub payload: Vec<u8>,
}

impl ProposalResponse {
    pub fn new(endorser: Endorser, fingerprint: RwSetFingerprint, payload: Vec<u8>) -> Self {
        Self {
            endorser,
            fingerprint,
            payload,
        }
    }
}
