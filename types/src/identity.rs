//! The invoking party's identity.

use crate::org::OrgId;
use serde::{Deserialize, Serialize};

/// Credentials and organizational affiliation of the invoking user.
///
/// Produced by an identity provider; the client only reads it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub affiliation: String,
    pub msp_id: String,
    /// Enrollment certificate, opaque to the client.
    #[serde(default)]
    pub certificate: Vec<u8>,
}

impl Identity {
    pub fn new(
        name: impl Into<String>,
        affiliation: impl Into<String>,
        msp_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            affiliation: affiliation.into(),
            msp_id: msp_id.into(),
            certificate: Vec::new(),
        }
    }

    pub fn with_certificate(mut self, certificate: Vec<u8>) -> Self {
        self.certificate = certificate;
        self
    }

    /// The organization the invoker belongs to.
    pub fn org(&self) -> OrgId {
        OrgId::new(&self.msp_id)
    }
}
