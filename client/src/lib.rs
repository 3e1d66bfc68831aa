//! Endorsement-aware transaction client.
//!
//! The [`Gateway`] runs one pipeline per invocation on its own task:
//!
//! 1. ask the significance oracle for a preferred endorsing organization;
//! 2. resolve an [`EndorsementPlan`](endorse_selection::EndorsementPlan) over the
//!    channel's discovered layouts;
//! 3. send the proposal to exactly the planned peers and require that all
//!    responses agree ([`ProposalCoordinator`]);
//! 4. hand the endorsed transaction to the ordering service and wait for the
//!    commit event ([`TransactionSubmitter`]).
//!
//! Transport, identity enrollment and topology discovery are capabilities
//! supplied by the caller through the [`Channel`], [`Connector`] and
//! [`IdentityProvider`] traits.

pub mod channel;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod network_client;
pub mod oracle;
pub mod stats;
pub mod submitter;
pub mod tracing_spans;

pub use channel::{Channel, CommitWatch, Connector};
pub use config::{AffiliationRecord, ClientConfig, DiscoveryPeer, OracleConfig};
pub use coordinator::{check_consistency, ProposalCoordinator};
pub use error::{ChannelError, ConfigError, IdentityError, InvocationError, ProposalError, Stage};
pub use gateway::{Gateway, InvocationHandle, TransactionReceipt};
pub use identity::IdentityProvider;
pub use network_client::NetworkClient;
pub use oracle::SignificanceOracle;
pub use stats::PipelineStats;
pub use submitter::{CommitHandle, CommitStatus, TransactionSubmitter};
