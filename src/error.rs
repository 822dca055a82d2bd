use std::path::PathBuf;

use thiserror::Error;

/// Failures that end an invocation.
///
/// Configuration errors are raised while interpreting the command line, before
/// any directory is created or any collaborator runs. The rest surface during
/// dispatch, after the build directory has been acquired.
#[derive(Debug, Error)]
pub enum F2pyError {
  #[error("{value} is not a valid {what}, choose from {choices:?}")]
  Configuration {
    value: String,
    what: &'static str,
    choices: Vec<String>,
  },

  #[error("{flag}: expected a value")]
  MissingValue { flag: String },

  #[error("{flag}: does not take a value")]
  UnexpectedValue { flag: String },

  #[error("Signature file \"{}\" exists!!! Use --overwrite-signature to overwrite.", path.display())]
  Conflict { path: PathBuf },

  #[error("toolchain {operation} failed: {message}")]
  Collaborator { operation: String, message: String },
}

impl F2pyError {
  pub fn configuration(value: impl Into<String>, what: &'static str, choices: &[&str]) -> Self {
    F2pyError::Configuration {
      value: value.into(),
      what,
      choices: choices.iter().map(|c| c.to_string()).collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn configuration_message_names_value_and_choices() {
    let err = F2pyError::configuration("bogus", "link resource", &["blas", "lapack"]);
    let msg = err.to_string();
    assert!(msg.contains("bogus"));
    assert!(msg.contains("\"blas\""));
    assert!(msg.contains("\"lapack\""));
  }

  #[test]
  fn conflict_message_mentions_overwrite_flag() {
    let err = F2pyError::Conflict { path: PathBuf::from("/tmp/x.pyf") };
    assert!(err.to_string().contains("--overwrite-signature"));
  }
}
