//! Nullable network capabilities for deterministic testing.
//!
//! Each type implements one of the client's capability traits without
//! touching the network. Behavior is scripted up front and every request is
//! recorded, so tests can assert on exactly which peers were asked, what was
//! submitted and how many connections were opened.
//!
//! A [`Topology`] describes a whole simulated channel in TOML, which the CLI
//! uses to run the pipeline offline.

pub mod channel;
pub mod connector;
pub mod error;
pub mod identity;
pub mod topology;

pub use channel::{
    NullChannel, OracleBehavior, OrderingBehavior, PeerBehavior, RecordedProposal,
    RecordedSubmission,
};
pub use connector::NullConnector;
pub use error::TopologyError;
pub use identity::NullIdentityProvider;
pub use topology::{LayoutSpec, OrderingMode, PeerMode, PeerSpec, Topology};
