//! Content-addressed image tags.
//!
//! An image tag is derived purely from build inputs: the project's image source
//! identity (repository + revision, URI, ...) and the rendered recipe text.
//! Identical inputs always produce the same tag, which lets repeated builds of an
//! unchanged project reuse the image that is already present.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use walkdir::WalkDir;

use crate::consts::{DEFAULT_ENTRYPOINT, IMAGE_TAG_LEN};
use crate::project::{ProjectDescriptor, ProjectError};

/// Entries ignored when fingerprinting a local source tree.
///
/// The entrypoint wrapper is written into the tree by recipe composition and must
/// not change the identity of the sources it was written into.
const TREE_EXCLUSIONS: &[&str] = &[".git", DEFAULT_ENTRYPOINT, "__pycache__"];

#[derive(Debug, Error)]
pub enum TreeHashError {
  #[error("failed to walk source tree: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },
}

/// An 8-character lowercase hex tag, e.g. `"3f9a01bc"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageTag(pub String);

impl std::fmt::Display for ImageTag {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash the source identity followed by the recipe text into an image tag.
pub fn image_tag(image_source_identity: &str, recipe: &str) -> ImageTag {
  let mut hasher = Sha256::new();
  hasher.update(image_source_identity.as_bytes());
  hasher.update(recipe.as_bytes());
  let full = format!("{:x}", hasher.finalize());
  ImageTag(full[..IMAGE_TAG_LEN].to_string())
}

/// Tag for a project whose image source identity has been resolved.
pub fn tag_for_project(project: &ProjectDescriptor, recipe: &str) -> Result<ImageTag, ProjectError> {
  let identity = project.image_source_identity()?;
  Ok(image_tag(identity, recipe))
}

/// Fingerprint a local source tree for use as an image source identity.
///
/// Covers relative paths, file contents and symlink targets. Timestamps and
/// permissions are ignored. Returns `dir:` followed by the full hex digest.
pub fn source_tree_identity(root: &Path) -> Result<String, TreeHashError> {
  let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|e| {
    e.file_name()
      .to_str()
      .map(|name| !TREE_EXCLUSIONS.contains(&name))
      .unwrap_or(true)
  });

  let mut hasher = Sha256::new();
  for entry in walker {
    let entry = entry?;
    let rel = entry.path().strip_prefix(root).unwrap_or(entry.path()).to_string_lossy();
    if rel.is_empty() {
      continue;
    }

    let read_err = |e| TreeHashError::Read {
      path: entry.path().to_path_buf(),
      source: e,
    };
    let file_type = entry.file_type();
    let line = if file_type.is_symlink() {
      let target = fs::read_link(entry.path()).map_err(read_err)?;
      format!("L:{rel}:{}", target.to_string_lossy())
    } else if file_type.is_dir() {
      format!("D:{rel}")
    } else if file_type.is_file() {
      let contents = fs::read(entry.path()).map_err(read_err)?;
      format!("F:{rel}:{:x}", Sha256::digest(&contents))
    } else {
      continue;
    };
    hasher.update(line.as_bytes());
    hasher.update(b"\n");
  }

  Ok(format!("dir:{:x}", hasher.finalize()))
}
