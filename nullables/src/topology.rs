//! TOML description of a simulated channel.
//!
//! ```toml
//! channel = "providerschannel"
//! suggestion = "OrgB"
//! ordering = "valid"
//!
//! [[peers]]
//! name = "peer0.orga"
//! msp_id = "OrgAMSP"
//!
//! [[peers]]
//! name = "peer0.orgb"
//! msp_id = "OrgBMSP"
//! behavior = "fail"
//!
//! [[layouts]]
//! groups = [["peer0.orga"], ["peer0.orgb"]]
//! ```

use endorse_types::{Endorser, Group, Layout};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use crate::{NullChannel, OracleBehavior, OrderingBehavior, PeerBehavior, TopologyError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default = "default_channel")]
    pub channel: String,

    #[serde(default = "default_height")]
    pub height: u64,

    /// What the significance oracle answers. Absent means no suggestion.
    #[serde(default)]
    pub suggestion: Option<String>,

    #[serde(default)]
    pub ordering: OrderingMode,

    #[serde(default)]
    pub peers: Vec<PeerSpec>,

    #[serde(default)]
    pub layouts: Vec<LayoutSpec>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMode {
    #[default]
    Valid,
    Invalid,
    Never,
    NoHandle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerMode {
    #[default]
    Endorse,
    Fail,
    Hang,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSpec {
    pub name: String,
    pub msp_id: String,
    /// Defaults to `grpcs://<name>:7051`.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub behavior: PeerMode,
    /// Read/write set this peer computes. Peers sharing a value agree.
    #[serde(default)]
    pub rw_set: Option<String>,
    #[serde(default)]
    pub delay_ms: u64,
}

/// One layout, as groups of peer names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub groups: Vec<Vec<String>>,
}

fn default_channel() -> String {
    "providerschannel".to_string()
}

fn default_height() -> u64 {
    1
}

const DEFAULT_RW_SET: &str = "rw-set";

impl PeerSpec {
    pub fn endorser(&self) -> Endorser {
        let endpoint = self
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("grpcs://{}:7051", self.name));
        Endorser::new(&self.name, endpoint, &self.msp_id)
    }

    fn behavior(&self) -> PeerBehavior {
        match self.behavior {
            PeerMode::Endorse => {
                let rw_set = self.rw_set.as_deref().unwrap_or(DEFAULT_RW_SET);
                PeerBehavior::endorse(rw_set.as_bytes().to_vec())
                    .with_payload(format!("endorsed by {}", self.name).into_bytes())
                    .with_delay(Duration::from_millis(self.delay_ms))
            }
            PeerMode::Fail => PeerBehavior::Fail(format!("{} refused to endorse", self.name)),
            PeerMode::Hang => PeerBehavior::Hang,
        }
    }
}

impl Topology {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, TopologyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TopologyError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, TopologyError> {
        let topology: Self = toml::from_str(s).map_err(|e| TopologyError::Parse(e.to_string()))?;
        topology.validate()?;
        Ok(topology)
    }

    pub fn validate(&self) -> Result<(), TopologyError> {
        if self.channel.trim().is_empty() {
            return Err(TopologyError::Invalid("channel must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for peer in &self.peers {
            if !seen.insert(peer.name.as_str()) {
                return Err(TopologyError::DuplicatePeer(peer.name.clone()));
            }
        }
        self.layouts().map(|_| ())
    }

    /// Resolve every layout's peer names into endorsers.
    pub fn layouts(&self) -> Result<Vec<Layout>, TopologyError> {
        let by_name: HashMap<&str, &PeerSpec> =
            self.peers.iter().map(|p| (p.name.as_str(), p)).collect();

        self.layouts
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let groups = spec
                    .groups
                    .iter()
                    .enumerate()
                    .map(|(g, names)| {
                        let endorsers = names
                            .iter()
                            .map(|name| {
                                by_name.get(name.as_str()).map(|p| p.endorser()).ok_or_else(
                                    || TopologyError::UnknownPeer {
                                        layout: i,
                                        peer: name.clone(),
                                    },
                                )
                            })
                            .collect::<Result<Vec<_>, TopologyError>>()?;
                        Ok::<_, TopologyError>(Group::new(format!("G{g}"), endorsers))
                    })
                    .collect::<Result<Vec<_>, TopologyError>>()?;
                Ok::<_, TopologyError>(Layout::new(groups))
            })
            .collect()
    }

    /// Build a channel that behaves as described.
    pub fn build_channel(&self) -> Result<NullChannel, TopologyError> {
        let oracle = match &self.suggestion {
            Some(org) => OracleBehavior::Suggest(org.clone()),
            None => OracleBehavior::Empty,
        };
        let ordering = match self.ordering {
            OrderingMode::Valid => OrderingBehavior::valid(),
            OrderingMode::Invalid => OrderingBehavior::invalid(),
            OrderingMode::Never => OrderingBehavior::Never,
            OrderingMode::NoHandle => OrderingBehavior::NoHandle,
        };

        let mut channel = NullChannel::new(&self.channel)
            .with_height(self.height)
            .with_layouts(self.layouts()?)
            .with_oracle(oracle)
            .with_ordering(ordering);
        for peer in &self.peers {
            channel = channel.with_peer(peer.endorser().endpoint, peer.behavior());
        }
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use endorse_types::OrgId;
    use std::io::Write;

    const SAMPLE: &str = r#"
suggestion = "OrgB"

[[peers]]
name = "peer0.orga"
msp_id = "OrgAMSP"

[[peers]]
name = "peer0.orgb"
msp_id = "OrgBMSP"
endpoint = "grpcs://10.0.0.2:7051"

[[layouts]]
groups = [["peer0.orga"], ["peer0.orgb"]]

[[layouts]]
groups = [["peer0.orga", "peer0.orgb"]]
"#;

    #[test]
    fn parses_with_defaults() {
        let topology = Topology::from_toml_str(SAMPLE).unwrap();
        assert_eq!(topology.channel, "providerschannel");
        assert_eq!(topology.ordering, OrderingMode::Valid);
        assert_eq!(topology.peers[0].behavior, PeerMode::Endorse);
        assert_eq!(
            topology.peers[0].endorser().endpoint,
            "grpcs://peer0.orga:7051"
        );
    }

    #[test]
    fn resolves_layouts_by_peer_name() {
        let layouts = Topology::from_toml_str(SAMPLE).unwrap().layouts().unwrap();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].groups.len(), 2);
        assert_eq!(layouts[1].groups[0].endorsers.len(), 2);
        assert!(layouts[1].orgs().contains(&OrgId::new("orgb")));
    }

    #[test]
    fn unknown_peer_is_rejected() {
        let toml = r#"
[[layouts]]
groups = [["ghost"]]
"#;
        let err = Topology::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, TopologyError::UnknownPeer { layout: 0, .. }));
    }

    #[test]
    fn duplicate_peer_is_rejected() {
        let toml = r#"
[[peers]]
name = "p"
msp_id = "OrgAMSP"

[[peers]]
name = "p"
msp_id = "OrgBMSP"
"#;
        assert!(matches!(
            Topology::from_toml_str(toml),
            Err(TopologyError::DuplicatePeer(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let topology = Topology::from_toml_file(file.path()).unwrap();
        let channel = topology.build_channel().unwrap();
        assert_eq!(channel.layouts().len(), 2);
    }
}
