//! Identity resolution boundary.

use async_trait::async_trait;
use endorse_types::Identity;

use crate::{AffiliationRecord, IdentityError};

/// Supplies the invoking identity. Enrollment with a certificate authority and
/// any caching of the result are the provider's business.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_identity(
        &self,
        name: &str,
        affiliation: &AffiliationRecord,
    ) -> Result<Identity, IdentityError>;
}
