//! Submission to the ordering service and the bounded wait for the commit event.

use endorse_types::{CommitEvent, CommitOutcome, ProposalResponse, TxId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn, Instrument};

use crate::tracing_spans::commit_wait_span;
use crate::Channel;

/// Default bound on waiting for the commit event.
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Terminal classification of a submission, with the block it landed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CommitStatus {
    pub outcome: CommitOutcome,
    pub block_number: Option<u64>,
}

impl CommitStatus {
    fn unplaced(outcome: CommitOutcome) -> Self {
        Self {
            outcome,
            block_number: None,
        }
    }

    fn from_event(event: &CommitEvent) -> Self {
        let outcome = if event.valid {
            CommitOutcome::CommittedValid
        } else {
            CommitOutcome::CommittedInvalid
        };
        Self {
            outcome,
            block_number: Some(event.block_number),
        }
    }
}

/// Hands endorsed transactions to the ordering service.
#[derive(Clone, Debug)]
pub struct TransactionSubmitter {
    commit_timeout: Duration,
}

impl Default for TransactionSubmitter {
    fn default() -> Self {
        Self::new(DEFAULT_COMMIT_TIMEOUT)
    }
}

impl TransactionSubmitter {
    pub fn new(commit_timeout: Duration) -> Self {
        Self { commit_timeout }
    }

    pub fn commit_timeout(&self) -> Duration {
        self.commit_timeout
    }

    /// Submit `responses` and start waiting for the commit event.
    ///
    /// Returns immediately. The commit timeout covers both the submission call
    /// and the wait; the handle resolves to exactly one outcome.
    pub fn submit(
        &self,
        channel: Arc<dyn Channel>,
        tx_id: TxId,
        responses: Vec<ProposalResponse>,
    ) -> CommitHandle {
        let commit_timeout = self.commit_timeout;
        let deadline = Instant::now() + commit_timeout;
        let span = commit_wait_span(&tx_id);
        let task_tx_id = tx_id.clone();

        let task = tokio::spawn(
            async move {
                let wait = submit_and_wait(channel.as_ref(), &task_tx_id, &responses);
                let status = match tokio::time::timeout_at(deadline, wait).await {
                    Ok(status) => status,
                    Err(_) => {
                        warn!(timeout = ?commit_timeout, "no commit event before timeout; outcome unknown");
                        CommitStatus::unplaced(CommitOutcome::TimedOut)
                    }
                };
                info!(outcome = %status.outcome, block = ?status.block_number, "transaction finished");
                status
            }
            .instrument(span),
        );

        CommitHandle { tx_id, task }
    }
}

async fn submit_and_wait(
    channel: &dyn Channel,
    tx_id: &TxId,
    responses: &[ProposalResponse],
) -> CommitStatus {
    let watch = match channel.submit(tx_id, responses).await {
        Ok(Some(watch)) => watch,
        Ok(None) if responses.is_empty() => {
            warn!("ordering service had nothing to order");
            return CommitStatus::unplaced(CommitOutcome::RejectedNoResponse);
        }
        Ok(None) => {
            warn!(
                responses = responses.len(),
                "ordering service refused the endorsements"
            );
            return CommitStatus::unplaced(CommitOutcome::RejectedInconsistent);
        }
        Err(e) => {
            error!("submission failed: {e}");
            return CommitStatus::unplaced(CommitOutcome::RejectedNoResponse);
        }
    };
    debug!("submitted; waiting for commit event");

    match watch.wait().await {
        Some(event) if &event.tx_id == tx_id => CommitStatus::from_event(&event),
        Some(event) => {
            warn!(got = %event.tx_id.short(), "commit event for another transaction");
            CommitStatus::unplaced(CommitOutcome::TimedOut)
        }
        None => {
            warn!("commit event stream closed before delivery");
            CommitStatus::unplaced(CommitOutcome::TimedOut)
        }
    }
}

/// Resolves once to the outcome of one submitted transaction.
#[derive(Debug)]
pub struct CommitHandle {
    tx_id: TxId,
    task: JoinHandle<CommitStatus>,
}

impl CommitHandle {
    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the outcome. A wait task that died is reported as
    /// [`CommitOutcome::TimedOut`] since the ledger state is unknown.
    pub async fn outcome(self) -> CommitStatus {
        match self.task.await {
            Ok(status) => status,
            Err(e) => {
                warn!(tx = %self.tx_id.short(), "commit wait task failed: {e}");
                CommitStatus::unplaced(CommitOutcome::TimedOut)
            }
        }
    }
}
