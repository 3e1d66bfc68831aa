//! Session context: configuration, the invoking identity and the lazily
//! opened channel.

use endorse_types::Identity;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, Instrument};

use crate::tracing_spans::channel_init_span;
use crate::{Channel, ChannelError, ClientConfig, Connector, IdentityError, IdentityProvider};

/// Holds everything invocations share. Read-mostly and safe to share across
/// tasks behind an `Arc`.
pub struct NetworkClient {
    config: ClientConfig,
    identity: Arc<Identity>,
    connector: Arc<dyn Connector>,
    channel: OnceCell<Arc<dyn Channel>>,
}

impl NetworkClient {
    /// Resolve `user` within `affiliation` and build a client for it.
    pub async fn enroll(
        config: ClientConfig,
        provider: &dyn IdentityProvider,
        connector: Arc<dyn Connector>,
        user: &str,
        affiliation: &str,
    ) -> Result<Self, IdentityError> {
        let record = config
            .affiliation(affiliation)
            .ok_or_else(|| IdentityError::UnknownAffiliation(affiliation.to_string()))?;
        let identity = provider.resolve_identity(user, record).await?;
        info!(
            user = %identity.name,
            affiliation = %identity.affiliation,
            msp = %identity.msp_id,
            "user context set"
        );
        Ok(Self::with_identity(config, identity, connector))
    }

    /// Build a client for an already resolved identity.
    pub fn with_identity(
        config: ClientConfig,
        identity: Identity,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            config,
            identity: Arc::new(identity),
            connector,
            channel: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The session channel, connecting on first use.
    ///
    /// Concurrent first callers share one connection attempt. A failed
    /// attempt leaves the client unconnected so a later call can retry.
    pub async fn channel(&self) -> Result<Arc<dyn Channel>, ChannelError> {
        let channel = self
            .channel
            .get_or_try_init(|| {
                let span = channel_init_span(&self.config.channel_name);
                async {
                    let discovery = self.config.discovery_peer.as_ref();
                    if let Some(peer) = discovery {
                        debug!(peer = %peer.name, url = %peer.url, "bootstrapping discovery");
                    }
                    let channel = self
                        .connector
                        .connect(&self.config.channel_name, discovery, &self.identity)
                        .await?;
                    let height = channel.height().await?;
                    info!(channel = %channel.name(), height, "channel initialized");
                    Ok::<_, ChannelError>(channel)
                }
                .instrument(span)
            })
            .await?;
        Ok(Arc::clone(channel))
    }

    pub fn is_connected(&self) -> bool {
        self.channel.initialized()
    }
}
