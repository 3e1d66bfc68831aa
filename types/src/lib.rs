//! Fundamental types for the endorsement client.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! organization ids, endorsing peers and their topologies, transaction proposals,
//! proposal responses, commit events and their terminal outcomes.

pub mod identity;
pub mod layout;
pub mod org;
pub mod outcome;
pub mod proposal;

pub use identity::Identity;
pub use layout::{Endorser, Group, Layout};
pub use org::OrgId;
pub use outcome::{CommitEvent, CommitOutcome};
pub use proposal::{ProposalResponse, RwSetFingerprint, TransactionProposal, TxId};
