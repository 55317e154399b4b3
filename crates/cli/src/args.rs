//! Project flags shared by every command that works on a source tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use mlaunch_lib::platform::HostToolchain;
use mlaunch_lib::project::{DepsKind, EntryPoint, ProjectDescriptor, RunnerKind};
use mlaunch_lib::util::hash::source_tree_identity;
use mlaunch_lib::util::shell;

#[derive(Debug, Args)]
pub struct ProjectArgs {
  /// Project source directory
  #[arg(default_value = ".")]
  pub path: PathBuf,

  /// Dependency manager (pip, conda, none); detected from the tree when omitted
  #[arg(long)]
  pub deps: Option<DepsKind>,

  /// Python version for the image; the host interpreter's version when omitted
  #[arg(long)]
  pub python_version: Option<String>,

  /// Accelerator base image for the runtime stage
  #[arg(long)]
  pub cuda_image: Option<String>,

  /// Pre-built image to run instead of building one
  #[arg(long)]
  pub docker_image: Option<String>,

  /// Runtime that will execute the image (local, sagemaker, vertex, kubernetes)
  #[arg(long, default_value = "local")]
  pub runner: RunnerKind,

  /// uid of the container user; the invoking user's uid when omitted
  #[arg(long)]
  pub uid: Option<u32>,

  /// Command the container runs, e.g. "python train.py --msg 'hello world'"
  #[arg(short, long)]
  pub entrypoint: Option<String>,

  /// Stable identity of the sources; a fingerprint of the tree when omitted
  #[arg(long)]
  pub source_id: Option<String>,

  /// Target project name
  #[arg(long, default_value = "")]
  pub project: String,

  /// Target entity
  #[arg(long, default_value = "")]
  pub entity: String,

  /// Run id handed to the job
  #[arg(long, default_value = "")]
  pub run_id: String,

  /// Display name of the run
  #[arg(long)]
  pub name: Option<String>,

  /// Arguments appended to the entry point
  #[arg(last = true)]
  pub args: Vec<String>,
}

impl ProjectArgs {
  pub fn descriptor(&self) -> Result<ProjectDescriptor> {
    let dir = dunce::canonicalize(&self.path)
      .with_context(|| format!("Project directory not found: {}", self.path.display()))?;

    let image_source_identity = match &self.source_id {
      Some(id) => id.clone(),
      None => source_tree_identity(&dir).with_context(|| format!("Failed to fingerprint {}", dir.display()))?,
    };

    let override_entrypoint = match self.entrypoint.as_deref() {
      Some(line) => {
        let command = shell::split(line).with_context(|| format!("Invalid entrypoint: {}", line))?;
        let name = command.last().cloned().unwrap_or_default();
        Some(EntryPoint::new(name, command)).filter(|ep| !ep.command.is_empty())
      }
      None => None,
    };

    let target_project = if self.project.is_empty() {
      dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
    } else {
      self.project.clone()
    };

    let deps_type = self.deps.unwrap_or_else(|| DepsKind::detect(&dir));
    debug!(dir = %dir.display(), deps = %deps_type, identity = %image_source_identity, "resolved project");

    Ok(ProjectDescriptor {
      deps_type,
      python_version: self.python_version.clone(),
      cuda_base_image: self.cuda_image.clone(),
      docker_image: self.docker_image.clone(),
      docker_user_id: self.uid,
      resource: self.runner,
      override_entrypoint,
      override_args: self.args.clone(),
      run_id: self.run_id.clone(),
      name: self.name.clone(),
      target_project,
      target_entity: self.entity.clone(),
      image_source_identity: Some(image_source_identity),
      project_dir: Some(dir),
      ..Default::default()
    })
  }

  /// Host facts; a pinned version stands in for probing the host interpreter.
  pub fn host(&self) -> Result<HostToolchain> {
    match &self.python_version {
      Some(version) => Ok(HostToolchain::with_python_version(version.clone())),
      None => HostToolchain::detect().context("Failed to detect host python; pass --python-version"),
    }
  }
}
