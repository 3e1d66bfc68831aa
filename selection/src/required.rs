//! The set of organizations that must endorse a proposal.

use crate::error::SelectionError;
use endorse_types::OrgId;
use serde::Serialize;
use std::fmt;

/// Non-empty, deduplicated organization set, in first-seen order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequiredOrgs(Vec<OrgId>);

impl RequiredOrgs {
    /// Build a requirement, dropping duplicates and blank ids.
    pub fn new<I, T>(orgs: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OrgId>,
    {
        let mut unique: Vec<OrgId> = Vec::new();
        for org in orgs.into_iter().map(Into::into) {
            if !org.is_empty() && !unique.contains(&org) {
                unique.push(org);
            }
        }
        if unique.is_empty() {
            return Err(SelectionError::EmptyRequirement);
        }
        Ok(Self(unique))
    }

    pub fn contains(&self, org: &OrgId) -> bool {
        self.0.contains(org)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrgId> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[OrgId] {
        &self.0
    }
}

impl fmt::Display for RequiredOrgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(OrgId::as_str).collect();
        write!(f, "{}", names.join(", "))
    }
}
