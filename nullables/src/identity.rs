//! Nullable identity provider: enrollment without a certificate authority.

use async_trait::async_trait;
use endorse_client::{AffiliationRecord, IdentityError, IdentityProvider};
use endorse_types::Identity;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Builds identities straight from the affiliation record.
#[derive(Default)]
pub struct NullIdentityProvider {
    failure: Option<String>,
    resolved: AtomicUsize,
}

impl NullIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every enrollment.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            resolved: AtomicUsize::new(0),
        }
    }

    pub fn resolved(&self) -> usize {
        self.resolved.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for NullIdentityProvider {
    async fn resolve_identity(
        &self,
        name: &str,
        affiliation: &AffiliationRecord,
    ) -> Result<Identity, IdentityError> {
        if let Some(reason) = &self.failure {
            return Err(IdentityError::Enrollment {
                user: name.to_string(),
                reason: reason.clone(),
            });
        }
        self.resolved.fetch_add(1, Ordering::SeqCst);
        let certificate = format!("null-cert:{}:{}", affiliation.msp_id, name).into_bytes();
        Ok(Identity::new(name, &affiliation.name, &affiliation.msp_id).with_certificate(certificate))
    }
}
