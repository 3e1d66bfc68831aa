//! Nullable channel: scripted peers, oracle and ordering service.

use async_trait::async_trait;
use endorse_client::{Channel, ChannelError, CommitWatch, OracleConfig};
use endorse_types::{
    CommitEvent, Endorser, Layout, ProposalResponse, RwSetFingerprint, TransactionProposal, TxId,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

/// How a peer answers endorsement requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerBehavior {
    /// Simulate successfully, producing `rw_set` after `delay`.
    Endorse {
        rw_set: Vec<u8>,
        payload: Vec<u8>,
        delay: Duration,
    },
    /// Refuse to endorse.
    Fail(String),
    /// Never answer.
    Hang,
}

impl PeerBehavior {
    pub fn endorse(rw_set: impl Into<Vec<u8>>) -> Self {
        Self::Endorse {
            rw_set: rw_set.into(),
            payload: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    /// Set the response payload of an `Endorse` behavior.
    pub fn with_payload(self, payload: impl Into<Vec<u8>>) -> Self {
        match self {
            Self::Endorse { rw_set, delay, .. } => Self::Endorse {
                rw_set,
                payload: payload.into(),
                delay,
            },
            other => other,
        }
    }

    /// Set the response delay of an `Endorse` behavior.
    pub fn with_delay(self, delay: Duration) -> Self {
        match self {
            Self::Endorse {
                rw_set, payload, ..
            } => Self::Endorse {
                rw_set,
                payload,
                delay,
            },
            other => other,
        }
    }
}

impl Default for PeerBehavior {
    fn default() -> Self {
        Self::endorse(b"rw-set".to_vec())
    }
}

/// How the significance oracle contract answers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OracleBehavior {
    Suggest(String),
    /// Returns no payload.
    Empty,
    Fail(String),
    Hang,
}

/// How the ordering service treats submissions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderingBehavior {
    /// Deliver a commit event after `delay`.
    Commit { valid: bool, delay: Duration },
    /// Accept the submission but never deliver an event.
    Never,
    /// Refuse to order; no commit handle.
    NoHandle,
    /// Transport failure on submit.
    Fail(String),
}

impl OrderingBehavior {
    pub fn valid() -> Self {
        Self::Commit {
            valid: true,
            delay: Duration::ZERO,
        }
    }

    pub fn invalid() -> Self {
        Self::Commit {
            valid: false,
            delay: Duration::ZERO,
        }
    }
}

impl Default for OrderingBehavior {
    fn default() -> Self {
        Self::valid()
    }
}

/// One recorded endorsement request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedProposal {
    pub tx_id: TxId,
    pub endorser: Endorser,
}

/// One recorded submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedSubmission {
    pub tx_id: TxId,
    pub responses: usize,
}

struct State {
    oracle_script: VecDeque<OracleBehavior>,
    oracle_default: OracleBehavior,
    ordering: OrderingBehavior,
    next_block: u64,
    proposals: Vec<RecordedProposal>,
    submissions: Vec<RecordedSubmission>,
    evaluations: Vec<(String, String)>,
    held: Vec<oneshot::Sender<CommitEvent>>,
}

/// A [`Channel`] whose peers, oracle and ordering service follow a script.
///
/// Safe to share between concurrent invocations. Builder methods configure it
/// before it is wrapped in an `Arc`.
pub struct NullChannel {
    name: String,
    height: u64,
    layouts: Vec<Layout>,
    discovery_error: Option<String>,
    peers: HashMap<String, PeerBehavior>,
    default_peer: PeerBehavior,
    oracle: OracleConfig,
    queries: HashMap<(String, String), Vec<u8>>,
    state: Mutex<State>,
}

impl NullChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            height: 1,
            layouts: Vec::new(),
            discovery_error: None,
            peers: HashMap::new(),
            default_peer: PeerBehavior::default(),
            oracle: OracleConfig::default(),
            queries: HashMap::new(),
            state: Mutex::new(State {
                oracle_script: VecDeque::new(),
                oracle_default: OracleBehavior::Empty,
                ordering: OrderingBehavior::default(),
                next_block: 1,
                proposals: Vec::new(),
                submissions: Vec::new(),
                evaluations: Vec::new(),
                held: Vec::new(),
            }),
        }
    }

    pub fn with_height(mut self, height: u64) -> Self {
        self.height = height;
        self.state_mut().next_block = height;
        self
    }

    pub fn with_layouts(mut self, layouts: Vec<Layout>) -> Self {
        self.layouts = layouts;
        self
    }

    pub fn with_discovery_error(mut self, reason: impl Into<String>) -> Self {
        self.discovery_error = Some(reason.into());
        self
    }

    /// Behavior of the peer at `endpoint`.
    pub fn with_peer(mut self, endpoint: impl Into<String>, behavior: PeerBehavior) -> Self {
        self.peers.insert(endpoint.into(), behavior);
        self
    }

    /// Behavior of peers without an explicit entry.
    pub fn with_default_peer(mut self, behavior: PeerBehavior) -> Self {
        self.default_peer = behavior;
        self
    }

    /// Contract and function treated as the significance oracle.
    pub fn with_oracle_target(mut self, oracle: OracleConfig) -> Self {
        self.oracle = oracle;
        self
    }

    /// Oracle answer once the script is exhausted.
    pub fn with_oracle(mut self, behavior: OracleBehavior) -> Self {
        self.state_mut().oracle_default = behavior;
        self
    }

    /// Answers consumed one per oracle query, before the default applies.
    pub fn with_oracle_script(mut self, script: Vec<OracleBehavior>) -> Self {
        self.state_mut().oracle_script = script.into();
        self
    }

    pub fn with_ordering(mut self, ordering: OrderingBehavior) -> Self {
        self.state_mut().ordering = ordering;
        self
    }

    /// Payload returned by a read-only query of `contract.function`.
    pub fn with_query(
        mut self,
        contract: impl Into<String>,
        function: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        self.queries
            .insert((contract.into(), function.into()), payload.into());
        self
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    /// Change the ordering behavior of an already shared channel.
    pub fn set_ordering(&self, ordering: OrderingBehavior) {
        self.lock().ordering = ordering;
    }

    /// Every endorsement request received, in arrival order.
    pub fn proposals(&self) -> Vec<RecordedProposal> {
        self.lock().proposals.clone()
    }

    /// Endorsers asked to endorse `tx_id`.
    pub fn endorsers_for(&self, tx_id: &TxId) -> Vec<Endorser> {
        self.lock()
            .proposals
            .iter()
            .filter(|p| &p.tx_id == tx_id)
            .map(|p| p.endorser.clone())
            .collect()
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.lock().submissions.clone()
    }

    /// `(contract, function)` of every read-only query.
    pub fn evaluations(&self) -> Vec<(String, String)> {
        self.lock().evaluations.clone()
    }

    /// Release commit events held back by [`OrderingBehavior::Never`].
    pub fn release_held(&self) -> usize {
        let held: Vec<_> = self.lock().held.drain(..).collect();
        held.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut State {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn peer_behavior(&self, endorser: &Endorser) -> PeerBehavior {
        self.peers
            .get(&endorser.endpoint)
            .or_else(|| self.peers.get(&endorser.name))
            .unwrap_or(&self.default_peer)
            .clone()
    }

    fn next_oracle_answer(&self) -> OracleBehavior {
        let mut state = self.lock();
        match state.oracle_script.pop_front() {
            Some(answer) => answer,
            None => state.oracle_default.clone(),
        }
    }
}

#[async_trait]
impl Channel for NullChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn height(&self) -> Result<u64, ChannelError> {
        Ok(self.height)
    }

    async fn discover_layouts(&self, _contract: &str) -> Result<Vec<Layout>, ChannelError> {
        match &self.discovery_error {
            Some(reason) => Err(ChannelError::Discovery(reason.clone())),
            None => Ok(self.layouts.clone()),
        }
    }

    async fn send_proposal(
        &self,
        proposal: &TransactionProposal,
        endorser: &Endorser,
    ) -> Result<ProposalResponse, ChannelError> {
        self.lock().proposals.push(RecordedProposal {
            tx_id: proposal.tx_id.clone(),
            endorser: endorser.clone(),
        });

        match self.peer_behavior(endorser) {
            PeerBehavior::Endorse {
                rw_set,
                payload,
                delay,
            } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(ProposalResponse::new(
                    endorser.clone(),
                    RwSetFingerprint::of(&rw_set),
                    payload,
                ))
            }
            PeerBehavior::Fail(reason) => Err(ChannelError::Endorsement {
                peer: endorser.to_string(),
                reason,
            }),
            PeerBehavior::Hang => std::future::pending().await,
        }
    }

    async fn evaluate(
        &self,
        contract: &str,
        function: &str,
        _args: &[String],
    ) -> Result<Option<Vec<u8>>, ChannelError> {
        self.lock()
            .evaluations
            .push((contract.to_string(), function.to_string()));

        if contract == self.oracle.contract && function == self.oracle.function {
            return match self.next_oracle_answer() {
                OracleBehavior::Suggest(org) => Ok(Some(org.into_bytes())),
                OracleBehavior::Empty => Ok(None),
                OracleBehavior::Fail(reason) => Err(ChannelError::Evaluation(reason)),
                OracleBehavior::Hang => std::future::pending().await,
            };
        }

        Ok(self
            .queries
            .get(&(contract.to_string(), function.to_string()))
            .cloned())
    }

    async fn submit(
        &self,
        tx_id: &TxId,
        responses: &[ProposalResponse],
    ) -> Result<Option<CommitWatch>, ChannelError> {
        let mut state = self.lock();
        state.submissions.push(RecordedSubmission {
            tx_id: tx_id.clone(),
            responses: responses.len(),
        });
        if responses.is_empty() {
            return Ok(None);
        }

        match state.ordering.clone() {
            OrderingBehavior::Commit { valid, delay } => {
                let event = CommitEvent {
                    tx_id: tx_id.clone(),
                    valid,
                    block_number: state.next_block,
                };
                state.next_block += 1;
                let (tx, watch) = CommitWatch::pair();
                if delay.is_zero() {
                    let _ = tx.send(event);
                } else {
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(event);
                    });
                }
                Ok(Some(watch))
            }
            OrderingBehavior::Never => {
                let (tx, watch) = CommitWatch::pair();
                state.held.push(tx);
                Ok(Some(watch))
            }
            OrderingBehavior::NoHandle => Ok(None),
            OrderingBehavior::Fail(reason) => Err(ChannelError::Submission(reason)),
        }
    }
}
