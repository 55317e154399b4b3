use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The three top-level sections of a launch config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
  Environment,
  Registry,
  Builder,
}

impl Section {
  pub fn as_str(&self) -> &'static str {
    match self {
      Section::Environment => "environment",
      Section::Registry => "registry",
      Section::Builder => "builder",
    }
  }
}

impl fmt::Display for Section {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Errors raised while loading or validating launch configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read launch config {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse launch config {origin}: {source}")]
  Parse { origin: String, source: serde_yaml::Error },

  #[error("invalid launch config: expected a mapping at the top level, got {kind}")]
  MalformedDocument { kind: &'static str },

  #[error("invalid {section} config: {value} of type {kind} loaded from launch config, expected a mapping")]
  InvalidSection {
    section: Section,
    value: String,
    kind: &'static str,
  },

  #[error("invalid {section} config: missing field `{field}`")]
  MissingField { section: Section, field: &'static str },

  #[error("invalid {section} config: {source}")]
  InvalidField { section: Section, source: serde_yaml::Error },

  #[error("unsupported {section} config: {message}")]
  Unsupported { section: Section, message: String },
}
