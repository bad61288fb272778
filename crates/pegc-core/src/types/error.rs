use std::fmt::Display;

/// Every error a `pegc_core` function can return.
#[derive(Debug)]
pub enum PegcError {
  Io(std::io::Error),
  Fmt(std::fmt::Error),
  /// Builder-protocol violation: a combinator popped from an empty
  /// expression stack. This indicates the front-end fed calls out of
  /// order and is not recoverable.
  BuilderProtocol(String),
  Text(String),
}

pub type PegcResult<T> = Result<T, PegcError>;

use PegcError::*;

impl Display for PegcError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Io(err) => write!(f, "io error: {err}"),
      Fmt(err) => write!(f, "format error: {err}"),
      BuilderProtocol(msg) => write!(f, "builder protocol violation: {msg}"),
      Text(msg) => f.write_str(msg),
    }
  }
}

impl std::error::Error for PegcError {}

impl From<std::io::Error> for PegcError {
  fn from(err: std::io::Error) -> Self {
    Io(err)
  }
}

impl From<std::fmt::Error> for PegcError {
  fn from(err: std::fmt::Error) -> Self {
    Fmt(err)
  }
}

impl From<&str> for PegcError {
  fn from(err: &str) -> Self {
    Text(err.to_string())
  }
}

impl From<String> for PegcError {
  fn from(err: String) -> Self {
    Text(err)
  }
}
