use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store {0} is not in the current result set")]
    UnknownStore(String),
}

/// Failure reported by a map widget camera call.
///
/// The synchronizer logs these and carries on; they never reach callers.
#[derive(Debug, Error)]
#[error("map widget error: {0}")]
pub struct MapError(pub String);
