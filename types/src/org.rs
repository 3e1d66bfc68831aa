//! Organization identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized organization identifier.
///
/// Membership service provider ids carry an `MSP` suffix (`Hospital1MSP`) while
/// contracts and users usually refer to the bare organization (`hospital1`).
/// Both forms normalize to the same lowercase id, so comparisons are
/// case-insensitive and suffix-agnostic.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct OrgId(String);

impl OrgId {
    /// Suffix carried by membership service provider ids.
    pub const MSP_SUFFIX: &'static str = "MSP";

    /// Create an organization id from a bare name or an MSP id.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        let bare = trimmed.strip_suffix(Self::MSP_SUFFIX).unwrap_or(trimmed);
        Self(bare.to_lowercase())
    }

    /// Return the normalized id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An id is empty when the raw input was blank or only the MSP suffix.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrgId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for OrgId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<OrgId> for String {
    fn from(org: OrgId) -> Self {
        org.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msp_suffix_is_stripped() {
        assert_eq!(OrgId::new("Hospital1MSP").as_str(), "hospital1");
    }

    #[test]
    fn comparison_is_case_insensitive() {
        assert_eq!(OrgId::new("ORGA"), OrgId::new("orga"));
        assert_eq!(OrgId::new("OrgAMSP"), OrgId::new("orga"));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(OrgId::new("  orgB \n"), OrgId::new("orgB"));
    }

    #[test]
    fn suffix_only_yields_empty_id() {
        assert!(OrgId::new("MSP").is_empty());
        assert!(OrgId::new("   ").is_empty());
    }

    #[test]
    fn deserialization_normalizes() {
        let org: OrgId = serde_json::from_str("\"Org1MSP\"").unwrap();
        assert_eq!(org, OrgId::new("org1"));
        assert_eq!(serde_json::to_string(&org).unwrap(), "\"org1\"");
    }
}
