//! Pre-built [`tracing::Span`] constructors for the invocation pipeline.
//!
//! Using consistent span names and field sets makes it easy to follow one
//! transaction through selection, endorsement and commit in the logs.

use endorse_types::TxId;
use tracing::{info_span, Span};

/// Span covering the full pipeline of one invocation.
pub fn invoke_span(tx_id: &TxId, contract: &str, function: &str) -> Span {
    info_span!("invoke", tx = %tx_id.short(), contract = %contract, function = %function)
}

/// Span covering the endorsement fan-out to the planned peers.
pub fn propose_span(tx_id: &TxId, endorsers: usize) -> Span {
    info_span!("propose", tx = %tx_id.short(), endorsers = %endorsers)
}

/// Span covering submission and the wait for the commit event.
pub fn commit_wait_span(tx_id: &TxId) -> Span {
    info_span!("commit_wait", tx = %tx_id.short())
}

/// Span covering the significance oracle query.
pub fn oracle_span(contract: &str, function: &str) -> Span {
    info_span!("oracle", contract = %contract, function = %function)
}

/// Span covering the first connection to a channel.
pub fn channel_init_span(channel: &str) -> Span {
    info_span!("channel_init", channel = %channel)
}
