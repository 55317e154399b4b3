//! Host identity and toolchain detection.
//!
//! Recipe composition never reads ambient process state directly: the caller
//! detects a [`HostToolchain`] once (or constructs one by hand in tests) and
//! passes it down.

pub mod paths;

use thiserror::Error;
use tracing::debug;

use crate::util::cmd;

/// Interpreters probed, in order, when no version is given explicitly.
const PYTHON_CANDIDATES: &[&str] = &["python3", "python"];

#[derive(Debug, Error)]
pub enum PlatformError {
  #[error("no python interpreter found on PATH (tried {})", PYTHON_CANDIDATES.join(", "))]
  PythonNotFound,

  #[error("could not parse interpreter version from {0:?}")]
  UnparsableVersion(String),
}

/// The host facts a recipe depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostToolchain {
  /// Full interpreter version of the host, e.g. `3.10.12`.
  pub python_version: String,
  /// Login name of the invoking user.
  pub username: String,
  /// Effective uid of the invoking process.
  pub uid: u32,
}

impl HostToolchain {
  /// Detect the current user and probe the host interpreter version.
  pub fn detect() -> Result<Self, PlatformError> {
    Ok(Self::with_python_version(probe_python_version()?))
  }

  /// Current user with an explicitly supplied interpreter version.
  pub fn with_python_version(python_version: impl Into<String>) -> Self {
    Self {
      python_version: python_version.into(),
      username: current_username(),
      uid: effective_uid(),
    }
  }
}

pub fn current_username() -> String {
  whoami::username()
}

#[cfg(unix)]
pub fn effective_uid() -> u32 {
  rustix::process::geteuid().as_raw()
}

#[cfg(not(unix))]
pub fn effective_uid() -> u32 {
  1000
}

/// Run the first interpreter found on `PATH` with `--version`.
pub fn probe_python_version() -> Result<String, PlatformError> {
  for candidate in PYTHON_CANDIDATES {
    if cmd::find_executable(candidate).is_none() {
      continue;
    }
    // Python 2 prints its version on stderr, so go through the shell to merge streams.
    let script = format!("{candidate} --version 2>&1");
    match cmd::run("sh", ["-c", script.as_str()], &[]) {
      Ok(output) => {
        debug!(interpreter = %candidate, output = %output, "probed interpreter");
        return parse_python_version(&output).ok_or(PlatformError::UnparsableVersion(output));
      }
      Err(e) => debug!(interpreter = %candidate, error = %e, "interpreter probe failed"),
    }
  }
  Err(PlatformError::PythonNotFound)
}

/// Extract `3.10.12` from `Python 3.10.12`.
pub fn parse_python_version(output: &str) -> Option<String> {
  let version = output.trim().strip_prefix("Python ")?.split_whitespace().next()?;
  version
    .split('.')
    .next()
    .filter(|major| !major.is_empty() && major.chars().all(|c| c.is_ascii_digit()))
    .map(|_| version.to_string())
}
