//! Build context staging.
//!
//! A build context is an ephemeral directory handed to the image-build engine:
//!
//! ```text
//! <root>/
//! ├── Dockerfile.mlaunch-autogenerated
//! ├── _mlaunch_bootstrap.py
//! └── src/               # copy of the project source tree
//!     └── runtime.txt    # only when the project pins an interpreter version
//! ```
//!
//! The directory is owned by the returned [`StagedContext`] and removed when it is
//! dropped. A copy that fails halfway leaves nothing behind for the same reason.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::consts::{BOOTSTRAP_FILENAME, CONTEXT_SRC_DIR, GENERATED_DOCKERFILE_NAME, RUNTIME_PIN_FILENAME};
use crate::project::{ProjectDescriptor, ProjectError};
use crate::recipe::templates::BOOTSTRAP_SCRIPT;

/// Entries never copied into a build context.
///
/// `fsmonitor--daemon.ipc` is git's filesystem monitor socket; it cannot be copied.
const STAGE_EXCLUSIONS: &[&str] = &["fsmonitor--daemon.ipc"];

#[derive(Debug, Error)]
pub enum StageError {
  #[error(transparent)]
  Project(#[from] ProjectError),

  #[error("failed to create build context: {0}")]
  CreateContext(#[source] std::io::Error),

  #[error("failed to walk {}: {source}", root.display())]
  Walk { root: PathBuf, source: walkdir::Error },

  #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
  Copy {
    from: PathBuf,
    to: PathBuf,
    source: std::io::Error,
  },

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },
}

/// A staged build context. Deleted on drop unless [`keep`](Self::keep) is called.
#[derive(Debug)]
pub struct StagedContext {
  dir: TempDir,
}

impl StagedContext {
  pub fn path(&self) -> &Path {
    self.dir.path()
  }

  pub fn dockerfile_path(&self) -> PathBuf {
    self.path().join(GENERATED_DOCKERFILE_NAME)
  }

  pub fn src_path(&self) -> PathBuf {
    self.path().join(CONTEXT_SRC_DIR)
  }

  /// Stop managing the directory; the caller becomes responsible for removing it.
  pub fn keep(self) -> PathBuf {
    self.dir.keep()
  }
}

/// Stage a build context for `project` in the system temp directory.
pub fn stage(project: &ProjectDescriptor, recipe: &str) -> Result<StagedContext, StageError> {
  let dir = tempfile::Builder::new()
    .prefix("mlaunch-ctx-")
    .tempdir()
    .map_err(StageError::CreateContext)?;
  populate(dir, project, recipe)
}

/// Stage a build context for `project` under `parent`.
pub fn stage_in(parent: &Path, project: &ProjectDescriptor, recipe: &str) -> Result<StagedContext, StageError> {
  let dir = tempfile::Builder::new()
    .prefix("mlaunch-ctx-")
    .tempdir_in(parent)
    .map_err(StageError::CreateContext)?;
  populate(dir, project, recipe)
}

fn populate(dir: TempDir, project: &ProjectDescriptor, recipe: &str) -> Result<StagedContext, StageError> {
  let project_dir = project.project_dir()?;
  let ctx = StagedContext { dir };

  let src = ctx.src_path();
  copy_tree(project_dir, &src)?;

  write_file(&ctx.path().join(BOOTSTRAP_FILENAME), BOOTSTRAP_SCRIPT)?;

  if let Some(version) = &project.python_version {
    write_file(&src.join(RUNTIME_PIN_FILENAME), &format!("python-{version}"))?;
  }

  write_file(&ctx.dockerfile_path(), recipe)?;

  info!(path = %ctx.path().display(), "staged build context");
  Ok(ctx)
}

fn write_file(path: &Path, contents: &str) -> Result<(), StageError> {
  fs::write(path, contents).map_err(|e| StageError::Write {
    path: path.to_path_buf(),
    source: e,
  })
}

/// Recursively copy `from` to `to`, keeping symlinks as symlinks.
fn copy_tree(from: &Path, to: &Path) -> Result<(), StageError> {
  let walker = WalkDir::new(from).sort_by_file_name().into_iter().filter_entry(|e| {
    e.file_name()
      .to_str()
      .map(|name| !STAGE_EXCLUSIONS.contains(&name))
      .unwrap_or(true)
  });

  for entry in walker {
    let entry = entry.map_err(|e| StageError::Walk {
      root: from.to_path_buf(),
      source: e,
    })?;
    let rel = entry.path().strip_prefix(from).unwrap_or(entry.path());
    let dest = to.join(rel);
    let copy_err = |e| StageError::Copy {
      from: entry.path().to_path_buf(),
      to: dest.clone(),
      source: e,
    };

    let file_type = entry.file_type();
    if file_type.is_dir() {
      fs::create_dir_all(&dest).map_err(copy_err)?;
    } else if file_type.is_symlink() {
      let target = fs::read_link(entry.path()).map_err(copy_err)?;
      create_symlink(&target, &dest, entry.path()).map_err(copy_err)?;
    } else if file_type.is_file() {
      fs::copy(entry.path(), &dest).map_err(copy_err)?;
    } else {
      debug!(path = %entry.path().display(), "skipping special file");
    }
  }

  Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path, _original: &Path) -> std::io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path, original: &Path) -> std::io::Result<()> {
  if original.is_dir() {
    std::os::windows::fs::symlink_dir(target, link)
  } else {
    std::os::windows::fs::symlink_file(target, link)
  }
}
