use thiserror::Error;

/// Knowledge-graph construction failures. Fatal for the whole run: a partial
/// graph would make downstream consistency checking meaningless.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extraction backend failed: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("malformed extraction response: {0}")]
    Response(String),
}
