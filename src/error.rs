use thiserror::Error;

/// Result alias used throughout the simulator.
pub type SimResult<T> = Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
  /// An access fell outside `[0, size)` of main memory
  #[error("address {address} out of range for memory of {size} bytes")]
  OutOfRange { address: usize, size: usize },

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error("failed to parse configuration: {0}")]
  Json(#[from] serde_json::Error),
}

impl SimError {
  pub(crate) fn config<S: Into<String>>(msg: S) -> Self { SimError::InvalidConfig(msg.into()) }
}
