use thiserror::Error;

/// Failure reading or writing the local breed cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
  #[error("storage initialization failed: {0}")]
  Init(String),
  #[error("failed to save data: {0}")]
  Save(String),
  #[error("failed to fetch data: {0}")]
  Fetch(String),
  #[error("failed to delete data: {0}")]
  Delete(String),
  #[error("breed not found: {0}")]
  NotFound(String),
  #[error("storage connection not available")]
  ContextUnavailable,
}
