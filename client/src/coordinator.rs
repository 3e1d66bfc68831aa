//! Endorsement fan-out and the consistency check over the collected responses.

use endorse_selection::EndorsementPlan;
use endorse_types::{ProposalResponse, RwSetFingerprint, TransactionProposal};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, warn, Instrument};

use crate::tracing_spans::propose_span;
use crate::{Channel, ChannelError, ProposalError};

/// Sends a proposal to the planned endorsers and accepts the result only when
/// every response agrees.
pub struct ProposalCoordinator;

impl ProposalCoordinator {
    /// Request endorsements from exactly the peers in `plan`.
    ///
    /// Peers are asked concurrently. Responses arriving after
    /// `proposal.wait_time` are dropped and their requests cancelled. Failed
    /// peers are logged and skipped.
    pub async fn propose(
        &self,
        channel: Arc<dyn Channel>,
        proposal: &TransactionProposal,
        plan: &EndorsementPlan,
    ) -> Result<Vec<ProposalResponse>, ProposalError> {
        let span = propose_span(&proposal.tx_id, plan.len());
        async {
            let responses = collect_responses(channel, proposal, plan).await;
            debug!(
                received = responses.len(),
                requested = plan.len(),
                "endorsement responses collected"
            );
            check_consistency(responses)
        }
        .instrument(span)
        .await
    }
}

async fn collect_responses(
    channel: Arc<dyn Channel>,
    proposal: &TransactionProposal,
    plan: &EndorsementPlan,
) -> Vec<ProposalResponse> {
    let deadline = Instant::now() + proposal.wait_time;
    let mut handles: Vec<(String, JoinHandle<Result<ProposalResponse, ChannelError>>)> =
        Vec::with_capacity(plan.len());

    for endorser in plan.endorsers() {
        let channel = Arc::clone(&channel);
        let proposal = proposal.clone();
        let endorser = endorser.clone();
        let label = endorser.to_string();
        handles.push((
            label,
            tokio::spawn(async move { channel.send_proposal(&proposal, &endorser).await }),
        ));
    }

    let mut responses = Vec::with_capacity(handles.len());
    let mut pending = handles.into_iter();
    while let Some((peer, mut handle)) = pending.next() {
        match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(Ok(Ok(response))) => responses.push(response),
            Ok(Ok(Err(e))) => warn!(peer = %peer, "endorsement request failed: {e}"),
            Ok(Err(e)) => warn!(peer = %peer, "endorsement task failed: {e}"),
            Err(_) => {
                handle.abort();
                let mut late = 1;
                for (_, rest) in pending.by_ref() {
                    rest.abort();
                    late += 1;
                }
                warn!(
                    late,
                    wait = ?proposal.wait_time,
                    "endorsement wait elapsed; discarding outstanding requests"
                );
            }
        }
    }
    responses
}

/// Accept `responses` only if they all carry the same read/write-set fingerprint.
///
/// An empty collection is [`ProposalError::NoResponse`]. More than one
/// fingerprint class is [`ProposalError::InconsistentResults`]; a divergent
/// endorser is treated the same whether it is faulty or simply read different
/// state.
pub fn check_consistency(
    responses: Vec<ProposalResponse>,
) -> Result<Vec<ProposalResponse>, ProposalError> {
    if responses.is_empty() {
        error!("no endorsement responses to check");
        return Err(ProposalError::NoResponse);
    }

    let mut classes: BTreeMap<RwSetFingerprint, Vec<String>> = BTreeMap::new();
    for response in &responses {
        classes
            .entry(response.fingerprint)
            .or_default()
            .push(response.endorser.to_string());
    }

    if classes.len() > 1 {
        for (fingerprint, peers) in &classes {
            error!(fingerprint = %fingerprint, peers = ?peers, "read/write set class");
        }
        error!(
            classes = classes.len(),
            responses = responses.len(),
            "endorsement responses are inconsistent"
        );
        return Err(ProposalError::InconsistentResults {
            classes: classes.len(),
            responses: responses.len(),
        });
    }

    Ok(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use endorse_types::Endorser;

    fn response(peer: &str, org: &str, rw_set: &[u8]) -> ProposalResponse {
        ProposalResponse::new(
            Endorser::new(peer, format!("grpcs://{peer}:7051"), format!("{org}MSP")),
            RwSetFingerprint::of(rw_set),
            b"ok".to_vec(),
        )
    }

    #[test]
    fn empty_responses_are_no_response() {
        assert_eq!(check_consistency(Vec::new()), Err(ProposalError::NoResponse));
    }

    #[test]
    fn single_response_is_consistent() {
        let responses = vec![response("peer0", "OrgA", b"set")];
        assert_eq!(check_consistency(responses.clone()), Ok(responses));
    }

    #[test]
    fn matching_responses_pass_unchanged() {
        let responses = vec![
            response("peer0", "OrgA", b"set"),
            response("peer1", "OrgB", b"set"),
            response("peer2", "OrgC", b"set"),
        ];
        assert_eq!(check_consistency(responses.clone()), Ok(responses));
    }

    #[test]
    fn divergent_response_rejects_all() {
        let responses = vec![
            response("peer0", "OrgA", b"set"),
            response("peer1", "OrgB", b"other"),
            response("peer2", "OrgC", b"set"),
        ];
        assert_eq!(
            check_consistency(responses),
            Err(ProposalError::InconsistentResults {
                classes: 2,
                responses: 3
            })
        );
    }

    #[test]
    fn payload_differences_alone_do_not_matter() {
        let mut a = response("peer0", "OrgA", b"set");
        let b = response("peer1", "OrgB", b"set");
        a.payload = b"different".to_vec();
        assert!(check_consistency(vec![a, b]).is_ok());
    }
}
