//! Nullable connector handing out one shared [`NullChannel`].

use async_trait::async_trait;
use endorse_client::{Channel, ChannelError, Connector, DiscoveryPeer};
use endorse_types::Identity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::NullChannel;

/// Connects every caller to the same channel and counts the connections.
pub struct NullConnector {
    channel: Arc<NullChannel>,
    delay: Duration,
    failure: Option<String>,
    connects: AtomicUsize,
    discovery: Mutex<Option<DiscoveryPeer>>,
}

impl NullConnector {
    pub fn new(channel: Arc<NullChannel>) -> Self {
        Self {
            channel,
            delay: Duration::ZERO,
            failure: None,
            connects: AtomicUsize::new(0),
            discovery: Mutex::new(None),
        }
    }

    /// Take `delay` to open each connection.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail every connection attempt.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    pub fn channel(&self) -> &Arc<NullChannel> {
        &self.channel
    }

    /// Connection attempts so far, failed ones included.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Discovery peer passed to the most recent connection attempt.
    pub fn last_discovery_peer(&self) -> Option<DiscoveryPeer> {
        self.discovery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Connector for NullConnector {
    async fn connect(
        &self,
        channel_name: &str,
        discovery: Option<&DiscoveryPeer>,
        _identity: &Identity,
    ) -> Result<Arc<dyn Channel>, ChannelError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *self.discovery.lock().unwrap_or_else(PoisonError::into_inner) = discovery.cloned();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(reason) = &self.failure {
            return Err(ChannelError::Connection(reason.clone()));
        }
        if channel_name != self.channel.name() {
            return Err(ChannelError::Connection(format!(
                "unknown channel '{channel_name}'"
            )));
        }
        let channel: Arc<dyn Channel> = self.channel.clone();
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new("alice", "hospital1", "Hospital1MSP")
    }

    #[tokio::test]
    async fn connects_to_the_named_channel() {
        let connector = NullConnector::new(Arc::new(NullChannel::new("providerschannel")));
        let channel = connector
            .connect("providerschannel", None, &identity())
            .await
            .unwrap();
        assert_eq!(channel.name(), "providerschannel");
        assert!(connector.connect("other", None, &identity()).await.is_err());
        assert_eq!(connector.connects(), 2);
    }

    #[tokio::test]
    async fn remembers_the_discovery_peer() {
        let connector = NullConnector::new(Arc::new(NullChannel::new("ch")));
        let peer = DiscoveryPeer {
            name: "peer0.hospital1".into(),
            url: "grpcs://localhost:7051".into(),
        };
        connector.connect("ch", Some(&peer), &identity()).await.unwrap();
        assert_eq!(connector.last_discovery_peer(), Some(peer));

        connector.connect("ch", None, &identity()).await.unwrap();
        assert_eq!(connector.last_discovery_peer(), None);
    }

    #[tokio::test]
    async fn failing_connector_reports_connection_error() {
        let connector = NullConnector::new(Arc::new(NullChannel::new("ch"))).failing("refused");
        let err = connector.connect("ch", None, &identity()).await.err().unwrap();
        assert!(matches!(err, ChannelError::Connection(reason) if reason == "refused"));
    }
}
