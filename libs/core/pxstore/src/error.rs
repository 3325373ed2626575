// -----------------------------------------------------------------------------
// StoreError
// -----------------------------------------------------------------------------
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("persisted record is malformed: {0}")]
    Decode(#[source] serde_json::Error),
}
