use crate::fetch::FetchError;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort an operation outright.
///
/// Problems confined to a single mapping rule are not errors; they are
/// reported as [`RuleWarning`][`crate::RuleWarning`]s next to a best-effort
/// result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The supplied text is not valid JSON.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no entity named {0:?}")]
    UnknownEntity(String),

    #[error("no document loaded")]
    NoDocument,

    #[error("no rule at index {0}")]
    NoSuchRule(usize),
}
