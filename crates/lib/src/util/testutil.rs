//! Test utilities for mlaunch-lib.
//!
//! Helpers for building scratch project trees and running shell commands in tests.

use std::path::Path;

use crate::platform::HostToolchain;
use crate::project::{DepsKind, ProjectDescriptor};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Returns the command and args to echo a message.
#[cfg(unix)]
pub fn echo_msg(msg: &str) -> (&'static str, Vec<String>) {
  ("/bin/echo", vec![msg.to_string()])
}

#[cfg(windows)]
pub fn echo_msg(msg: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), format!("echo {}", msg)])
}

/// Write `files` (relative path, content) under `root`, creating parents.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
  for (rel, content) in files {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }
}

/// A project rooted at `dir` with a resolved source identity.
pub fn project_at(dir: &Path, deps: DepsKind) -> ProjectDescriptor {
  ProjectDescriptor {
    project_dir: Some(dir.to_path_buf()),
    deps_type: deps,
    image_source_identity: Some("https://github.com/acme/trainer@0a1b2c3".to_string()),
    target_project: "trainer".to_string(),
    target_entity: "acme".to_string(),
    run_id: "run-1".to_string(),
    ..Default::default()
  }
}

/// A fixed host identity so recipes don't depend on who runs the tests.
pub fn test_host() -> HostToolchain {
  HostToolchain {
    python_version: "3.10.12".to_string(),
    username: "alice".to_string(),
    uid: 1234,
  }
}

/// Write an executable shell script named `name` into `dir`.
///
/// Every invocation appends its arguments to `<dir>/<name>.log` before running `body`.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  let log = dir.join(format!("{name}.log"));
  let script = format!("#!/bin/sh\necho \"$@\" >> '{}'\n{body}\n", log.display());
  std::fs::write(&path, script).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// Invocations recorded by [`fake_tool`], one line per call.
#[cfg(unix)]
pub fn fake_tool_calls(dir: &Path, name: &str) -> Vec<String> {
  std::fs::read_to_string(dir.join(format!("{name}.log")))
    .unwrap_or_default()
    .lines()
    .map(str::to_string)
    .collect()
}
