use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse topology: {0}")]
    Parse(String),

    #[error("layout {layout} references unknown peer '{peer}'")]
    UnknownPeer { layout: usize, peer: String },

    #[error("duplicate peer '{0}'")]
    DuplicatePeer(String),

    #[error("invalid topology: {0}")]
    Invalid(String),
}
