//! The resolved set of peers a proposal will be sent to.

use endorse_types::{Endorser, Layout, OrgId};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Which strategy produced a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Any policy-satisfying layout, chosen uniformly at random.
    PolicyDefault,
    /// One peer per required organization, preferring the suggested one.
    Significance,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PolicyDefault => "policy_default",
            Self::Significance => "significance",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selected endorsers together with the layout that justifies them.
///
/// Built once per proposal and never shared between proposals. The layout is
/// always present: a selection that finds no layout is an error, not a plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EndorsementPlan {
    endorsers: Vec<Endorser>,
    layout: Layout,
    strategy: StrategyKind,
}

impl EndorsementPlan {
    pub fn new(endorsers: Vec<Endorser>, layout: Layout, strategy: StrategyKind) -> Self {
        Self {
            endorsers,
            layout,
            strategy,
        }
    }

    pub fn endorsers(&self) -> &[Endorser] {
        &self.endorsers
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Organizations of the selected endorsers.
    pub fn orgs(&self) -> BTreeSet<OrgId> {
        self.endorsers.iter().map(Endorser::org).collect()
    }

    pub fn len(&self) -> usize {
        self.endorsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endorsers.is_empty()
    }
}

impl fmt::Display for EndorsementPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let peers: Vec<String> = self.endorsers.iter().map(ToString::to_string).collect();
        write!(f, "[{}] via {}", peers.join(", "), self.strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use endorse_types::Group;

    fn plan() -> EndorsementPlan {
        let a = Endorser::new("peer0.orga", "grpcs://peer0.orga:7051", "OrgAMSP");
        let b = Endorser::new("peer0.orgb", "grpcs://peer0.orgb:7051", "OrgBMSP");
        let layout = Layout::new(vec![
            Group::new("G0", vec![a.clone()]),
            Group::new("G1", vec![b.clone()]),
        ]);
        EndorsementPlan::new(vec![a, b], layout, StrategyKind::Significance)
    }

    #[test]
    fn serializes_endorsers_layout_and_strategy() {
        let json = serde_json::to_value(plan()).unwrap();
        assert_eq!(json["strategy"], "significance");
        assert_eq!(json["endorsers"][1]["msp_id"], "OrgBMSP");
        assert_eq!(json["layout"]["groups"][0]["endorsers"][0]["name"], "peer0.orga");
        assert_eq!(json["layout"]["groups"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn display_lists_peers_and_strategy() {
        let shown = plan().to_string();
        assert!(shown.ends_with("via significance"), "{shown}");
        assert_eq!(plan().orgs().len(), 2);
    }
}
