//! Per-invocation pipeline: oracle, selection, endorsement, commit.

use endorse_selection::{EndorsementSelector, RequiredOrgs};
use endorse_types::{CommitOutcome, Endorser, OrgId, TransactionProposal, TxId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};

use crate::tracing_spans::invoke_span;
use crate::{
    ChannelError, InvocationError, NetworkClient, PipelineStats, ProposalCoordinator,
    SignificanceOracle, Stage, TransactionSubmitter,
};

/// Result of an invocation that committed valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionReceipt {
    pub tx_id: TxId,
    pub outcome: CommitOutcome,
    pub block_number: Option<u64>,
    /// Contract response carried by the agreeing endorsements.
    pub payload: Vec<u8>,
    pub endorsers: Vec<Endorser>,
    /// Organization the oracle suggested, if it answered.
    pub suggested_org: Option<OrgId>,
}

/// Entry point for submitting transactions. Cheap to clone; clones share the
/// session and the outcome counters.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<Inner>,
}

struct Inner {
    client: Arc<NetworkClient>,
    oracle: SignificanceOracle,
    selector: EndorsementSelector,
    coordinator: ProposalCoordinator,
    submitter: TransactionSubmitter,
    proposal_wait: Duration,
    include_invoker_org: bool,
    seed: Option<u64>,
    invocations: AtomicU64,
    stats: PipelineStats,
}

impl Gateway {
    pub fn new(client: Arc<NetworkClient>) -> Self {
        let config = client.config();
        let proposal_wait = config.proposal_wait();
        let inner = Inner {
            oracle: SignificanceOracle::new(&config.oracle, proposal_wait),
            selector: EndorsementSelector,
            coordinator: ProposalCoordinator,
            submitter: TransactionSubmitter::new(config.commit_timeout()),
            proposal_wait,
            include_invoker_org: config.include_invoker_org,
            seed: config.selection_seed,
            invocations: AtomicU64::new(0),
            stats: PipelineStats::new(),
            client,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn client(&self) -> &NetworkClient {
        &self.inner.client
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.inner.stats
    }

    /// Start one invocation and return without waiting for it.
    ///
    /// Every call runs on its own task with its own random source and
    /// required-organization set, so concurrent invocations never see each
    /// other's selection state.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn invoke(
        &self,
        contract: impl Into<String>,
        function: impl Into<String>,
        args: Vec<String>,
    ) -> InvocationHandle {
        let n = self.inner.invocations.fetch_add(1, Ordering::Relaxed);
        let mut rng = match self.inner.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_entropy(),
        };
        let tx_id = TxId::generate(self.inner.client.identity(), &mut rng);
        let proposal = TransactionProposal::new(tx_id.clone(), contract, function)
            .with_args(args)
            .with_wait_time(self.inner.proposal_wait);
        let span = invoke_span(&tx_id, &proposal.contract, &proposal.function);

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(
            async move {
                let result = inner.run(proposal, rng).await;
                inner.stats.record(&result);
                match &result {
                    Ok(receipt) => info!(block = ?receipt.block_number, "transaction committed"),
                    Err(e) => warn!(stage = ?e.stage(), "invocation failed: {e}"),
                }
                result
            }
            .instrument(span),
        );

        InvocationHandle { tx_id, task }
    }

    /// Read-only query. No endorsement policy or consistency check applies.
    pub async fn evaluate(
        &self,
        contract: &str,
        function: &str,
        args: &[String],
    ) -> Result<Option<Vec<u8>>, InvocationError> {
        let channel = self.inner.channel(Stage::Assembling).await?;
        let wait = self.inner.proposal_wait;
        match tokio::time::timeout(wait, channel.evaluate(contract, function, args)).await {
            Ok(result) => result.map_err(|source| InvocationError::Channel {
                stage: Stage::Querying,
                source,
            }),
            Err(_) => Err(InvocationError::Channel {
                stage: Stage::Querying,
                source: ChannelError::Timeout(wait),
            }),
        }
    }
}

impl Inner {
    async fn channel(
        &self,
        stage: Stage,
    ) -> Result<Arc<dyn crate::Channel>, InvocationError> {
        self.client
            .channel()
            .await
            .map_err(|source| InvocationError::Channel { stage, source })
    }

    /// The oracle's suggestion plus, when enabled, the invoker's own
    /// organization. `None` when nothing is required.
    fn required_orgs(&self, suggested: Option<&OrgId>) -> Option<RequiredOrgs> {
        let suggested = suggested?;
        let mut orgs = vec![suggested.clone()];
        if self.include_invoker_org {
            orgs.push(self.client.identity().org());
        }
        RequiredOrgs::new(orgs).ok()
    }

    async fn run(
        &self,
        proposal: TransactionProposal,
        mut rng: StdRng,
    ) -> Result<TransactionReceipt, InvocationError> {
        let channel = self.channel(Stage::Assembling).await?;

        let suggested_org = self.oracle.suggest(channel.as_ref()).await;
        let required = self.required_orgs(suggested_org.as_ref());
        match &required {
            Some(required) => info!(required = %required, "significance selection"),
            None => info!("no suggestion; using policy default selection"),
        }

        let layouts = channel
            .discover_layouts(&proposal.contract)
            .await
            .map_err(|source| InvocationError::Channel {
                stage: Stage::SelectingEndorsers,
                source,
            })?;
        let strategy = self.selector.strategy_for(required);
        let plan = self.selector.select(strategy.as_ref(), &layouts, &mut rng)?;
        info!(plan = %plan, "endorsers selected");

        let responses = self
            .coordinator
            .propose(Arc::clone(&channel), &proposal, &plan)
            .await?;
        let payload = responses
            .first()
            .map(|r| r.payload.clone())
            .unwrap_or_default();

        let tx_id = proposal.tx_id;
        let status = self
            .submitter
            .submit(channel, tx_id.clone(), responses)
            .outcome()
            .await;

        match status.outcome {
            CommitOutcome::CommittedValid => Ok(TransactionReceipt {
                tx_id,
                outcome: status.outcome,
                block_number: status.block_number,
                payload,
                endorsers: plan.endorsers().to_vec(),
                suggested_org,
            }),
            CommitOutcome::CommittedInvalid => Err(InvocationError::CommittedInvalid {
                tx_id,
                block_number: status.block_number,
            }),
            CommitOutcome::TimedOut => Err(InvocationError::TimedOut {
                tx_id,
                waited: self.submitter.commit_timeout(),
            }),
            outcome => Err(InvocationError::Rejected { tx_id, outcome }),
        }
    }
}

/// Handle to one in-flight invocation.
#[derive(Debug)]
pub struct InvocationHandle {
    tx_id: TxId,
    task: JoinHandle<Result<TransactionReceipt, InvocationError>>,
}

impl InvocationHandle {
    /// Transaction id, known before the pipeline finishes.
    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> Result<TransactionReceipt, InvocationError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(InvocationError::TaskFailed(e.to_string())),
        }
    }
}
