//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use endorse_utils::LogFormat;

use crate::ConfigError;

/// Configuration for a [`NetworkClient`](crate::NetworkClient) and the
/// [`Gateway`](crate::Gateway) built on top of it.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Channel every operation of the session runs on.
    #[serde(default = "default_channel_name")]
    pub channel_name: String,

    /// Upper bound on waiting for endorsement responses, in milliseconds.
    #[serde(default = "default_proposal_wait_ms")]
    pub proposal_wait_ms: u64,

    /// Upper bound on waiting for the commit event, in seconds.
    #[serde(default = "default_commit_timeout_secs")]
    pub commit_timeout_secs: u64,

    /// Whether the invoker's own organization joins the suggested one as a
    /// required endorser.
    #[serde(default = "default_true")]
    pub include_invoker_org: bool,

    /// Fixed seed for endorser selection. Random when unset.
    #[serde(default)]
    pub selection_seed: Option<u64>,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Peer used to bootstrap the channel (discovery, queries, events).
    #[serde(default)]
    pub discovery_peer: Option<DiscoveryPeer>,

    /// Contract queried for the suggested endorsing organization.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Per-affiliation enrollment data.
    #[serde(default)]
    pub affiliations: Vec<AffiliationRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryPeer {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_oracle_contract")]
    pub contract: String,
    #[serde(default = "default_oracle_function")]
    pub function: String,
}

/// Enrollment data for one affiliation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliationRecord {
    pub name: String,
    pub msp_id: String,
    pub ca_name: String,
    pub ca_url: String,
    pub registrar: String,
    pub registrar_secret: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_channel_name() -> String {
    "providerschannel".to_string()
}

fn default_proposal_wait_ms() -> u64 {
    120_000
}

fn default_commit_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_oracle_contract() -> String {
    "IncentiveMechanism".to_string()
}

fn default_oracle_function() -> String {
    "selectEndorser".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Append affiliations from a semicolon-separated file, one
    /// `name;msp_id;ca_name;ca_url;registrar;secret` record per line.
    /// Blank lines and lines starting with `#` are skipped.
    pub fn load_affiliations_file(&mut self, path: impl AsRef<Path>) -> Result<usize, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let records = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(AffiliationRecord::parse_line)
            .collect::<Result<Vec<_>, _>>()?;
        let count = records.len();
        self.affiliations.extend(records);
        Ok(count)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_name.trim().is_empty() {
            return Err(ConfigError::Invalid("channel_name must not be empty".into()));
        }
        if self.proposal_wait_ms == 0 {
            return Err(ConfigError::Invalid("proposal_wait_ms must be positive".into()));
        }
        if self.commit_timeout_secs == 0 {
            return Err(ConfigError::Invalid("commit_timeout_secs must be positive".into()));
        }
        if self.oracle.contract.trim().is_empty() || self.oracle.function.trim().is_empty() {
            return Err(ConfigError::Invalid("oracle contract and function must be set".into()));
        }
        for (i, record) in self.affiliations.iter().enumerate() {
            if self.affiliations[..i]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&record.name))
            {
                return Err(ConfigError::Invalid(format!(
                    "duplicate affiliation '{}'",
                    record.name
                )));
            }
        }
        Ok(())
    }

    /// Look up an affiliation by name, ignoring case.
    pub fn affiliation(&self, name: &str) -> Option<&AffiliationRecord> {
        self.affiliations
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn proposal_wait(&self) -> Duration {
        Duration::from_millis(self.proposal_wait_ms)
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_secs(self.commit_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            channel_name: default_channel_name(),
            proposal_wait_ms: default_proposal_wait_ms(),
            commit_timeout_secs: default_commit_timeout_secs(),
            include_invoker_org: default_true(),
            selection_seed: None,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            discovery_peer: None,
            oracle: OracleConfig::default(),
            affiliations: Vec::new(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            contract: default_oracle_contract(),
            function: default_oracle_function(),
        }
    }
}

impl AffiliationRecord {
    /// Parse one `name;msp_id;ca_name;ca_url;registrar;secret` line.
    pub fn parse_line(line: &str) -> Result<Self, ConfigError> {
        let fields: Vec<&str> = line.split(';').map(str::trim).collect();
        if fields.len() != 6 {
            return Err(ConfigError::Parse(format!(
                "affiliation record needs 6 fields, got {}: '{line}'",
                fields.len()
            )));
        }
        if fields[0].is_empty() || fields[1].is_empty() {
            return Err(ConfigError::Parse(format!(
                "affiliation record is missing name or msp id: '{line}'"
            )));
        }
        Ok(Self {
            name: fields[0].to_string(),
            msp_id: fields[1].to_string(),
            ca_name: fields[2].to_string(),
            ca_url: fields[3].to_string(),
            registrar: fields[4].to_string(),
            registrar_secret: fields[5].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_values() {
        let config = ClientConfig::default();
        assert_eq!(config.channel_name, "providerschannel");
        assert_eq!(config.proposal_wait(), Duration::from_millis(120_000));
        assert_eq!(config.commit_timeout(), Duration::from_secs(60));
        assert_eq!(config.oracle.contract, "IncentiveMechanism");
        assert_eq!(config.oracle.function, "selectEndorser");
        assert!(config.include_invoker_org);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config.channel_name, "providerschannel");
        assert_eq!(config.log_format, LogFormat::Human);
        assert!(config.affiliations.is_empty());
    }

    #[test]
    fn parses_full_toml() {
        let toml = r#"
            channel_name = "records"
            proposal_wait_ms = 5000
            commit_timeout_secs = 30
            include_invoker_org = false
            selection_seed = 42
            log_format = "json"

            [discovery_peer]
            name = "peer0.hospital1.example.com"
            url = "grpcs://172.18.0.40:7051"

            [oracle]
            contract = "Incentives"

            [[affiliations]]
            name = "hospital1"
            msp_id = "Hospital1MSP"
            ca_name = "ca-hospital1"
            ca_url = "https://172.18.0.41:7054"
            registrar = "admin"
            registrar_secret = "adminpw"
        "#;
        let config = ClientConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.channel_name, "records");
        assert_eq!(config.proposal_wait(), Duration::from_secs(5));
        assert!(!config.include_invoker_org);
        assert_eq!(config.selection_seed, Some(42));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.oracle.contract, "Incentives");
        assert_eq!(config.oracle.function, "selectEndorser");
        assert_eq!(config.affiliation("HOSPITAL1").unwrap().msp_id, "Hospital1MSP");
        assert!(config.affiliation("hospital2").is_none());
    }

    #[test]
    fn toml_string_reparses() {
        let mut config = ClientConfig::default();
        config.affiliations.push(
            AffiliationRecord::parse_line("hospital1;Hospital1MSP;ca;https://ca:7054;admin;pw")
                .unwrap(),
        );
        let rendered = config.to_toml_string().unwrap();
        let reparsed = ClientConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(reparsed.affiliations, config.affiliations);
        assert_eq!(reparsed.channel_name, config.channel_name);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = ClientConfig {
            commit_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.commit_timeout_secs = 60;
        let record = AffiliationRecord::parse_line("h1;H1MSP;ca;url;admin;pw").unwrap();
        config.affiliations = vec![record.clone(), AffiliationRecord {
            name: "H1".into(),
            ..record
        }];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate affiliation"));
    }

    #[test]
    fn parse_line_requires_six_fields() {
        assert!(AffiliationRecord::parse_line("h1;H1MSP;ca").is_err());
        assert!(AffiliationRecord::parse_line(";H1MSP;ca;url;admin;pw").is_err());
    }

    #[test]
    fn loads_legacy_affiliations_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# name;msp;ca;url;registrar;secret").unwrap();
        writeln!(file, "hospital1;Hospital1MSP;ca-h1;https://h1:7054;admin;adminpw").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "hospital2;Hospital2MSP;ca-h2;https://h2:7054;admin;adminpw").unwrap();

        let mut config = ClientConfig::default();
        let loaded = config.load_affiliations_file(file.path()).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(config.affiliation("hospital2").unwrap().ca_name, "ca-h2");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ClientConfig::from_toml_file("/nonexistent/endorse.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
