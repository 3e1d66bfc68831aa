//! Capabilities the client needs from a network client library.
//!
//! The client never talks to the wire itself. A [`Connector`] opens a
//! [`Channel`] for a session and the channel performs discovery, endorsement
//! requests, read-only queries and submission to the ordering service.

use async_trait::async_trait;
use endorse_types::{
    CommitEvent, Endorser, Identity, Layout, ProposalResponse, TransactionProposal, TxId,
};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::{ChannelError, DiscoveryPeer};

/// A session-scoped connection to one ledger channel.
///
/// Shared by every in-flight invocation, so implementations must be safe for
/// concurrent use.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Current ledger height.
    async fn height(&self) -> Result<u64, ChannelError>;

    /// Layouts that satisfy the endorsement policy of `contract`.
    async fn discover_layouts(&self, contract: &str) -> Result<Vec<Layout>, ChannelError>;

    /// Ask one peer to simulate and endorse `proposal`.
    async fn send_proposal(
        &self,
        proposal: &TransactionProposal,
        endorser: &Endorser,
    ) -> Result<ProposalResponse, ChannelError>;

    /// Read-only query; `None` when the contract returned no payload.
    async fn evaluate(
        &self,
        contract: &str,
        function: &str,
        args: &[String],
    ) -> Result<Option<Vec<u8>>, ChannelError>;

    /// Forward endorsed responses to the ordering service.
    ///
    /// `None` means the network layer refused to order them (nothing to order,
    /// or endorsements it considers inconsistent).
    async fn submit(
        &self,
        tx_id: &TxId,
        responses: &[ProposalResponse],
    ) -> Result<Option<CommitWatch>, ChannelError>;
}

/// Opens channels on behalf of an identity.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open `channel_name`, bootstrapping discovery from `discovery` when
    /// given and from the connector's own defaults otherwise.
    async fn connect(
        &self,
        channel_name: &str,
        discovery: Option<&DiscoveryPeer>,
        identity: &Identity,
    ) -> Result<Arc<dyn Channel>, ChannelError>;
}

/// Pending commit notification for one submitted transaction.
#[derive(Debug)]
pub struct CommitWatch {
    rx: oneshot::Receiver<CommitEvent>,
}

impl CommitWatch {
    pub fn new(rx: oneshot::Receiver<CommitEvent>) -> Self {
        Self { rx }
    }

    /// A connected sender/watch pair.
    pub fn pair() -> (oneshot::Sender<CommitEvent>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self::new(rx))
    }

    /// Wait for the event. `None` if the sender went away without one.
    pub async fn wait(self) -> Option<CommitEvent> {
        self.rx.await.ok()
    }
}
