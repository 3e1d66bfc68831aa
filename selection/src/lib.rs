//! Endorser selection.
//!
//! Given the layouts a channel's endorsement policy allows, pick the concrete
//! peers a proposal is sent to. Two strategies exist:
//! - **Policy default** ([`RandomLayoutStrategy`]): any layout, uniformly at random,
//!   with all of its endorsers.
//! - **Significance** ([`SignificanceStrategy`]): one peer per required
//!   organization, all drawn from a single layout, layouts tried in random order.
//!
//! The strategy value carries its own required-organization set, so concurrent
//! selections never observe each other's requirements.

pub mod error;
pub mod plan;
pub mod required;
pub mod selector;
pub mod strategy;

pub use error::SelectionError;
pub use plan::{EndorsementPlan, StrategyKind};
pub use required::RequiredOrgs;
pub use selector::EndorsementSelector;
pub use strategy::{EndorsementStrategy, RandomLayoutStrategy, SignificanceStrategy};
