use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no layout among {layouts} satisfies required organizations [{required}]")]
    NoSatisfyingTopology { required: String, layouts: usize },

    #[error("required organization set is empty")]
    EmptyRequirement,
}
