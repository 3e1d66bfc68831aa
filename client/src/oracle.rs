//! Significance oracle: a read-only contract that names the organization whose
//! endorsement should be sought for the next transaction.

use endorse_types::OrgId;
use std::time::Duration;
use tracing::{debug, warn, Instrument};

use crate::tracing_spans::oracle_span;
use crate::{Channel, OracleConfig};

/// Queries the oracle contract. Any failure is reported as "no suggestion" so
/// the caller falls back to policy-default selection.
#[derive(Clone, Debug)]
pub struct SignificanceOracle {
    contract: String,
    function: String,
    timeout: Duration,
}

impl SignificanceOracle {
    pub fn new(config: &OracleConfig, timeout: Duration) -> Self {
        Self {
            contract: config.contract.clone(),
            function: config.function.clone(),
            timeout,
        }
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    /// Ask for the suggested organization.
    ///
    /// `None` when the query fails, times out, or returns an empty payload.
    pub async fn suggest(&self, channel: &dyn Channel) -> Option<OrgId> {
        let query = channel.evaluate(&self.contract, &self.function, &[]);
        let result = tokio::time::timeout(self.timeout, query)
            .instrument(oracle_span(&self.contract, &self.function))
            .await;

        let payload = match result {
            Ok(Ok(Some(payload))) => payload,
            Ok(Ok(None)) => {
                debug!("oracle returned no payload");
                return None;
            }
            Ok(Err(e)) => {
                warn!(contract = %self.contract, "oracle query failed: {e}");
                return None;
            }
            Err(_) => {
                warn!(contract = %self.contract, timeout = ?self.timeout, "oracle query timed out");
                return None;
            }
        };

        let suggestion = parse_suggestion(&payload);
        match &suggestion {
            Some(org) => debug!(org = %org, "oracle suggested organization"),
            None => debug!(bytes = payload.len(), "oracle payload carried no organization"),
        }
        suggestion
    }
}

/// Decode an oracle payload into an organization id.
///
/// Accepts a bare name or a JSON string literal. Blank or non-UTF-8 payloads
/// yield `None`.
pub fn parse_suggestion(payload: &[u8]) -> Option<OrgId> {
    let text = std::str::from_utf8(payload).ok()?;
    let name = text.trim().trim_matches('"').trim();
    if name.is_empty() {
        return None;
    }
    let org = OrgId::new(name);
    (!org.is_empty()).then_some(org)
}
