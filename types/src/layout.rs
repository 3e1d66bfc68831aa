//! Endorsing peers and the topologies (layouts) that combine them.
//!
//! A [`Layout`] is one way of satisfying a channel's endorsement policy: a set
//! of [`Group`]s, each holding candidate endorsers. A channel usually exposes
//! several layouts; they are alternatives, not a priority list.

use crate::org::OrgId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A peer able to endorse proposals.
///
/// Two endorsers are the same peer when their endpoints match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Endorser {
    /// Peer host name, e.g. `peer0.hospital1.example.com`.
    pub name: String,
    /// Network endpoint, e.g. `grpcs://10.0.0.4:7051`.
    pub endpoint: String,
    /// Membership service provider id of the owning organization.
    pub msp_id: String,
}

impl Endorser {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        msp_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            msp_id: msp_id.into(),
        }
    }

    /// The organization this peer belongs to.
    pub fn org(&self) -> OrgId {
        OrgId::new(&self.msp_id)
    }
}

impl PartialEq for Endorser {
    fn eq(&self, other: &Self) -> bool {
        self.endpoint == other.endpoint
    }
}

impl Eq for Endorser {}

impl Hash for Endorser {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.endpoint.hash(state);
    }
}

impl fmt::Display for Endorser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.org())
    }
}

/// Candidate endorsers grouped under one policy principal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub endorsers: Vec<Endorser>,
}

impl Group {
    pub fn new(name: impl Into<String>, endorsers: Vec<Endorser>) -> Self {
        Self {
            name: name.into(),
            endorsers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.endorsers.is_empty()
    }
}

/// One combination of groups that satisfies the endorsement policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub groups: Vec<Group>,
}

impl Layout {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// All candidate endorsers, in group traversal order. Peers listed in
    /// several groups appear once per group.
    pub fn endorsers(&self) -> impl Iterator<Item = &Endorser> {
        self.groups.iter().flat_map(|g| g.endorsers.iter())
    }

    /// Organizations with at least one candidate in this layout.
    pub fn orgs(&self) -> BTreeSet<OrgId> {
        self.endorsers().map(Endorser::org).collect()
    }

    /// Whether every organization in `required` has a candidate here.
    pub fn covers<'a>(&self, required: impl IntoIterator<Item = &'a OrgId>) -> bool {
        let orgs = self.orgs();
        required.into_iter().all(|org| orgs.contains(org))
    }
}
