use thiserror::Error;

/// Failure talking to the remote breed catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
  #[error("invalid url: {0}")]
  InvalidUrl(String),
  #[error("invalid response: {0}")]
  InvalidResponse(String),
  #[error("response contained no data")]
  NoData,
  #[error("server responded with status {0}")]
  ServerStatus(u16),
  #[error("transport error: {0}")]
  Transport(String),
}
