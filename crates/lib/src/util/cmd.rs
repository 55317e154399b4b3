//! Invocation of external build tools.
//!
//! The image-build engines (docker, kaniko) are external programs; this module
//! locates them on `PATH` and runs them, mapping failures to [`ToolError`].

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ToolError {
  #[error("failed to spawn {program}: {source}")]
  Spawn { program: String, source: std::io::Error },

  #[error("command failed with exit code {code:?}: {cmd}")]
  Failed { cmd: String, code: Option<i32>, stderr: String },
}

/// Locate `name` on `PATH`, like `which`.
///
/// Paths containing a separator are checked directly.
pub fn find_executable(name: &str) -> Option<PathBuf> {
  let candidate = Path::new(name);
  if candidate.components().count() > 1 {
    return is_executable(candidate).then(|| candidate.to_path_buf());
  }

  let path_var = std::env::var_os("PATH")?;
  std::env::split_paths(&path_var)
    .map(|dir| dir.join(name))
    .find(|p| is_executable(p))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;
  path
    .metadata()
    .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
    .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
  path.is_file() || path.with_extension("exe").is_file()
}

/// Run `program` with `args`, returning trimmed stdout on success.
pub fn run<I, S>(program: &str, args: I, envs: &[(&str, &str)]) -> Result<String, ToolError>
where
  I: IntoIterator<Item = S>,
  S: AsRef<OsStr>,
{
  let mut command = Command::new(program);
  command.args(args);
  for (key, value) in envs {
    command.env(key, value);
  }

  let cmd_display = display_command(&command);
  info!(cmd = %cmd_display, "executing command");

  let output = command.output().map_err(|e| ToolError::Spawn {
    program: program.to_string(),
    source: e,
  })?;

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

  if !output.status.success() {
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }
    return Err(ToolError::Failed {
      cmd: cmd_display,
      code: output.status.code(),
      stderr,
    });
  }

  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }

  Ok(stdout)
}

/// Run a command only to learn whether it exits successfully.
pub fn succeeds<I, S>(program: &str, args: I) -> bool
where
  I: IntoIterator<Item = S>,
  S: AsRef<OsStr>,
{
  Command::new(program)
    .args(args)
    .output()
    .map(|o| o.status.success())
    .unwrap_or(false)
}

fn display_command(command: &Command) -> String {
  std::iter::once(command.get_program())
    .chain(command.get_args())
    .map(|s| s.to_string_lossy().into_owned())
    .collect::<Vec<_>>()
    .join(" ")
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use super::*;
  use crate::util::testutil::{echo_msg, shell_cmd};

  #[test]
  fn run_returns_trimmed_stdout() {
    let (program, args) = echo_msg("hello");
    assert_eq!(run(program, &args, &[]).unwrap(), "hello");
  }

  #[test]
  fn run_passes_env() {
    let (program, args) = shell_cmd("echo \"$MLAUNCH_TEST_VALUE\"");
    assert_eq!(run(program, &args, &[("MLAUNCH_TEST_VALUE", "42")]).unwrap(), "42");
  }

  #[test]
  fn run_reports_exit_code() {
    let (program, args) = shell_cmd("echo oops >&2; exit 3");
    match run(program, &args, &[]).unwrap_err() {
      ToolError::Failed { code, stderr, .. } => {
        assert_eq!(code, Some(3));
        assert_eq!(stderr, "oops");
      }
      other => panic!("expected Failed, got {other:?}"),
    }
  }

  #[test]
  fn missing_program_is_spawn_error() {
    let err = run("/nonexistent/mlaunch-tool", ["x"], &[]).unwrap_err();
    assert!(matches!(err, ToolError::Spawn { .. }));
  }

  #[test]
  fn finds_sh_on_path() {
    assert!(find_executable("sh").is_some());
    assert!(find_executable("definitely-not-a-real-tool-xyz").is_none());
  }

  #[test]
  fn explicit_path_is_checked_directly() {
    assert!(find_executable("/bin/sh").is_some());
    assert!(find_executable("/nonexistent/bin/sh").is_none());
  }

  #[test]
  fn succeeds_reflects_exit_status() {
    let (program, args) = shell_cmd("exit 0");
    assert!(succeeds(program, &args));
    let (program, args) = shell_cmd("exit 1");
    assert!(!succeeds(program, &args));
  }
}
