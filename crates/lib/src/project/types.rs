use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{CONDA_ENVIRONMENT_FILE, FROZEN_REQUIREMENTS_FILE, REQUIREMENTS_FILE};
use crate::util::shell;

#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("project directory must be set before building")]
  MissingProjectDir,

  #[error("image source identity must be resolved before tagging")]
  MissingSourceIdentity,

  #[error("unknown dependency manager {0:?} (expected pip, conda or none)")]
  UnknownDepsKind(String),

  #[error("unknown runner {0:?} (expected local, sagemaker, vertex or kubernetes)")]
  UnknownRunner(String),
}

/// How a project declares its dependencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepsKind {
  /// `requirements.txt`, optionally with a `requirements.frozen.txt`.
  Pip,
  /// `environment.yml`.
  Conda,
  /// Nothing to install.
  #[default]
  None,
}

impl DepsKind {
  /// Infer the dependency manager from the files present in `dir`.
  pub fn detect(dir: &Path) -> Self {
    if dir.join(REQUIREMENTS_FILE).exists() || dir.join(FROZEN_REQUIREMENTS_FILE).exists() {
      DepsKind::Pip
    } else if dir.join(CONDA_ENVIRONMENT_FILE).exists() {
      DepsKind::Conda
    } else {
      DepsKind::None
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      DepsKind::Pip => "pip",
      DepsKind::Conda => "conda",
      DepsKind::None => "none",
    }
  }
}

impl FromStr for DepsKind {
  type Err = ProjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pip" => Ok(DepsKind::Pip),
      "conda" => Ok(DepsKind::Conda),
      "none" => Ok(DepsKind::None),
      other => Err(ProjectError::UnknownDepsKind(other.to_string())),
    }
  }
}

impl fmt::Display for DepsKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// The runtime that will execute the built image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
  #[default]
  Local,
  Sagemaker,
  Vertex,
  Kubernetes,
}

impl RunnerKind {
  /// Managed training services that only run containers as root.
  pub fn requires_root(&self) -> bool {
    matches!(self, RunnerKind::Sagemaker)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      RunnerKind::Local => "local",
      RunnerKind::Sagemaker => "sagemaker",
      RunnerKind::Vertex => "vertex",
      RunnerKind::Kubernetes => "kubernetes",
    }
  }
}

impl FromStr for RunnerKind {
  type Err = ProjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "local" | "local-container" => Ok(RunnerKind::Local),
      "sagemaker" => Ok(RunnerKind::Sagemaker),
      "vertex" => Ok(RunnerKind::Vertex),
      "kubernetes" => Ok(RunnerKind::Kubernetes),
      other => Err(ProjectError::UnknownRunner(other.to_string())),
    }
  }
}

impl fmt::Display for RunnerKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// The process invoked inside the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
  pub name: String,
  pub command: Vec<String>,
}

impl EntryPoint {
  pub fn new(name: impl Into<String>, command: Vec<String>) -> Self {
    Self {
      name: name.into(),
      command,
    }
  }

  /// Entry point used when a project declares none: `python main.py`.
  pub fn default_python() -> Self {
    Self::new("main.py", vec!["python".to_string(), "main.py".to_string()])
  }

  /// The command as one shell-escaped line.
  pub fn joined(&self) -> String {
    shell::join(&self.command)
  }
}

/// Everything the build pipeline needs to know about a project.
#[derive(Debug, Clone, Default)]
pub struct ProjectDescriptor {
  /// Root of the source tree. Required before composing or staging.
  pub project_dir: Option<PathBuf>,
  pub deps_type: DepsKind,
  /// Pinned interpreter version, e.g. `3.9.7`. Host version is used when unset.
  pub python_version: Option<String>,
  /// Accelerator base image for stage 2, e.g. `nvidia/cuda:11.8.0-runtime-ubuntu22.04`.
  pub cuda_base_image: Option<String>,
  /// Pre-built image supplied by the user instead of building one.
  pub docker_image: Option<String>,
  /// Explicit uid for the container user.
  pub docker_user_id: Option<u32>,
  pub resource: RunnerKind,
  pub entry_points: BTreeMap<String, EntryPoint>,
  pub override_entrypoint: Option<EntryPoint>,
  pub override_args: Vec<String>,
  pub override_config: serde_json::Map<String, serde_json::Value>,
  pub override_artifacts: serde_json::Map<String, serde_json::Value>,
  pub run_id: String,
  pub name: Option<String>,
  pub target_project: String,
  pub target_entity: String,
  pub launch_spec: serde_json::Map<String, serde_json::Value>,
  /// Job artifact the run was launched from.
  pub job: Option<String>,
  /// Stable fingerprint of the source content (repo + revision, or URI).
  pub image_source_identity: Option<String>,
}

impl ProjectDescriptor {
  pub fn project_dir(&self) -> Result<&Path, ProjectError> {
    self.project_dir.as_deref().ok_or(ProjectError::MissingProjectDir)
  }

  pub fn image_source_identity(&self) -> Result<&str, ProjectError> {
    self
      .image_source_identity
      .as_deref()
      .ok_or(ProjectError::MissingSourceIdentity)
  }

  /// The override entry point, else the only declared one.
  ///
  /// Returns `None` when no override is set and zero or several entry points are declared.
  pub fn single_entry_point(&self) -> Option<&EntryPoint> {
    if let Some(ep) = &self.override_entrypoint {
      return Some(ep);
    }
    match self.entry_points.len() {
      1 => self.entry_points.values().next(),
      _ => None,
    }
  }

  pub fn add_entry_point(&mut self, command: Vec<String>) -> &EntryPoint {
    let name = command.last().cloned().unwrap_or_default();
    self
      .entry_points
      .entry(name.clone())
      .or_insert_with(|| EntryPoint::new(name, command))
  }

  /// Repository name for images built from this project.
  pub fn image_name(&self) -> String {
    let sanitized: String = self
      .target_project
      .to_lowercase()
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '-' })
      .collect();
    let sanitized = sanitized.trim_matches(|c| matches!(c, '.' | '_' | '-'));
    if sanitized.is_empty() {
      "mlaunch-job".to_string()
    } else {
      format!("{sanitized}-launch")
    }
  }
}
