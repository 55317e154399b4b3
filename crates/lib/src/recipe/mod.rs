//! Dockerfile generation.
//!
//! A recipe has two stages: `build` installs the project's dependencies into `/env`,
//! and `base` copies that environment into the runtime image together with the
//! project sources and the entrypoint wrapper.
//!
//! Each part is rendered by a small function returning a typed fragment:
//!
//! - [`base`] - stage images, accelerator interpreter setup
//! - [`requirements`] - dependency installation and cache mounts
//! - [`user`] - container user and permissions
//! - [`entrypoint`] - wrapper script and `ENTRYPOINT`
//!
//! [`compose`] stitches them together in a fixed order. Identical inputs always
//! produce byte-identical recipes.

pub mod base;
pub mod entrypoint;
pub mod requirements;
pub mod templates;
pub mod user;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::dispatch::BuilderKind;
use crate::platform::HostToolchain;
use crate::project::{EntryPoint, ProjectDescriptor, ProjectError, RunnerKind};

use base::{PythonVersion, base_setup, build_stage_image};
use entrypoint::entrypoint_setup;
use requirements::requirements_section;
use user::{docker_user, user_setup};

#[derive(Debug, Error)]
pub enum RecipeError {
  #[error(transparent)]
  Project(#[from] ProjectError),

  #[error("failed to read {}: {source}", path.display())]
  ReadManifest { path: PathBuf, source: std::io::Error },

  #[error("failed to write entrypoint script {}: {source}", path.display())]
  WriteEntrypoint { path: PathBuf, source: std::io::Error },

  #[error("failed to serialize entrypoint: {0}")]
  Serialize(#[from] serde_json::Error),
}

/// Non-fatal problems found while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeWarning {
  /// No dependency manifest was found; nothing will be installed.
  NoRequirements,
  /// A line of `requirements.txt` was skipped when building the include-only filter.
  UnparsableRequirement { line: String },
}

impl fmt::Display for RecipeWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RecipeWarning::NoRequirements => write!(f, "no requirements file found, no packages will be installed"),
      RecipeWarning::UnparsableRequirement { line } => write!(f, "unable to parse requirement {line:?}"),
    }
  }
}

/// Everything besides the project that shapes a recipe.
#[derive(Debug, Clone)]
pub struct RecipeContext {
  /// Runtime that will execute the image.
  pub runner: RunnerKind,
  pub builder: BuilderKind,
  /// Whether the build backend advertises persistent cache mounts.
  pub cache_mounts: bool,
  pub host: HostToolchain,
}

/// A rendered recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
  contents: String,
  warnings: Vec<RecipeWarning>,
}

impl Recipe {
  pub fn as_str(&self) -> &str {
    &self.contents
  }

  pub fn warnings(&self) -> &[RecipeWarning] {
    &self.warnings
  }

  pub fn into_string(self) -> String {
    self.contents
  }
}

impl fmt::Display for Recipe {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.contents)
  }
}

/// Render the Dockerfile for `project`.
///
/// Side effect: writes the entrypoint wrapper script into the project's source tree.
/// Concurrent calls against the same source tree must be serialized by the caller.
pub fn compose(project: &ProjectDescriptor, entry_point: &EntryPoint, ctx: &RecipeContext) -> Result<Recipe, RecipeError> {
  let project_dir = project.project_dir()?;
  let python = PythonVersion::resolve(project.python_version.as_deref(), &ctx.host.python_version);

  debug!(
    python = %python.version,
    deps = %project.deps_type,
    runner = %ctx.runner,
    builder = %ctx.builder,
    "composing recipe"
  );

  // ----- stage 1: build -----
  let build_image = build_stage_image(project.deps_type, &python);
  let requirements = requirements_section(project_dir, project.deps_type, ctx.builder, ctx.cache_mounts)?;

  // ----- stage 2: base -----
  let base = base_setup(project.cuda_base_image.as_deref(), &python);

  let user = docker_user(project, ctx.runner, &ctx.host);
  let user_section = user_setup(&user, ctx.runner);
  let workdir = user.workdir();
  let uid = user.uid;

  let entrypoint_section = entrypoint_setup(project_dir, entry_point, &workdir)?;

  let contents = format!(
    r#"
# ----- stage 1: build -----
FROM {build_image} as build

# dependency install, depends on the package manager and cache mount support
{requirements}

# ----- stage 2: base -----
{base}

COPY --from=build /env /env
ENV PATH="/env/bin:$PATH"

ENV SHELL /bin/bash

# root-only runtimes skip user creation
{user_section}

WORKDIR {workdir}
RUN chown -R {uid} {workdir}

# artifact cache lives outside the build layers
RUN mkdir -p {workdir}/.cache && chown -R {uid} {workdir}/.cache

# project sources
COPY --chown={uid} src/ {workdir}

ENV PYTHONUNBUFFERED=1

{entrypoint_section}
"#,
    requirements = requirements.text,
    base = base.text,
  );

  Ok(Recipe {
    contents,
    warnings: requirements.warnings,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consts::DEFAULT_ENTRYPOINT;
  use crate::project::DepsKind;
  use crate::recipe::templates::{CACHE_DISABLED, PIP_CACHE_MOUNT};
  use crate::util::testutil::{project_at, test_host, write_tree};
  use tempfile::tempdir;

  fn ctx(runner: RunnerKind, builder: BuilderKind, cache_mounts: bool) -> RecipeContext {
    RecipeContext {
      runner,
      builder,
      cache_mounts,
      host: test_host(),
    }
  }

  fn train_py() -> EntryPoint {
    EntryPoint::new("train.py", vec!["python".into(), "train.py".into()])
  }

  #[test]
  fn pip_project_end_to_end() {
    let temp = tempdir().unwrap();
    write_tree(temp.path(), &[("requirements.txt", "numpy==1.2\n")]);
    let project = project_at(temp.path(), DepsKind::Pip);

    let recipe = compose(&project, &train_py(), &ctx(RunnerKind::Local, BuilderKind::Docker, false)).unwrap();
    let text = recipe.as_str();

    assert!(text.contains("FROM python:3.10 as build\n"));
    assert!(text.contains("COPY src/requirements.txt ./\n"));
    assert!(text.contains(&format!("{CACHE_DISABLED} pip install -r requirements.txt")));
    assert!(!text.contains("MLAUNCH_ONLY_INCLUDE"));
    assert!(text.contains("FROM python:3.10-buster as base\n"));
    assert!(text.contains("--uid 1234 \\\n    alice || echo \"\"\nUSER alice\n"));
    assert!(text.contains("WORKDIR /home/alice\nRUN chown -R 1234 /home/alice\n"));
    assert!(text.contains("COPY --chown=1234 src/ /home/alice\n"));
    assert!(text.contains(
      "COPY ./src/_mlaunch_default_entrypoint /home/alice\n\
       ENTRYPOINT [\"sh\", \"./_mlaunch_default_entrypoint\", \"python train.py\"]\n"
    ));
    assert!(recipe.warnings().is_empty());
    assert!(temp.path().join(DEFAULT_ENTRYPOINT).exists());
  }

  #[test]
  fn sections_appear_in_fixed_order() {
    let temp = tempdir().unwrap();
    write_tree(temp.path(), &[("requirements.txt", "numpy\n")]);
    let project = project_at(temp.path(), DepsKind::Pip);

    let recipe = compose(&project, &train_py(), &ctx(RunnerKind::Local, BuilderKind::Docker, true)).unwrap();
    let text = recipe.as_str();

    let order = [
      "as build",
      PIP_CACHE_MOUNT,
      "as base",
      "COPY --from=build /env /env",
      "ENV SHELL /bin/bash",
      "USER alice",
      "WORKDIR /home/alice",
      "mkdir -p /home/alice/.cache",
      "COPY --chown=1234 src/",
      "ENV PYTHONUNBUFFERED=1",
      "ENTRYPOINT [",
    ];
    let positions: Vec<usize> = order
      .iter()
      .map(|needle| text.find(needle).unwrap_or_else(|| panic!("missing {needle:?}")))
      .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "out of order: {positions:?}");
  }

  #[test]
  fn compose_is_deterministic() {
    let temp = tempdir().unwrap();
    write_tree(
      temp.path(),
      &[
        ("requirements.txt", "torch\nnumpy\nscipy\npandas\n"),
        ("requirements.frozen.txt", "numpy==1.26.4\n"),
      ],
    );
    let project = project_at(temp.path(), DepsKind::Pip);
    let context = ctx(RunnerKind::Vertex, BuilderKind::Docker, true);

    let first = compose(&project, &train_py(), &context).unwrap();
    let second = compose(&project, &train_py(), &context).unwrap();
    assert_eq!(first.as_str(), second.as_str());
    assert!(first.as_str().contains("MLAUNCH_ONLY_INCLUDE=numpy,pandas,scipy,torch python"));
  }

  #[test]
  fn pinned_version_overrides_host() {
    let temp = tempdir().unwrap();
    let mut project = project_at(temp.path(), DepsKind::None);
    project.python_version = Some("3.8.18".to_string());

    let recipe = compose(&project, &train_py(), &ctx(RunnerKind::Local, BuilderKind::Docker, false)).unwrap();
    assert!(recipe.as_str().contains("FROM python:3.8 as build"));
    assert!(recipe.as_str().contains("FROM python:3.8-buster as base"));
  }

  #[test]
  fn sagemaker_runs_as_root() {
    let temp = tempdir().unwrap();
    let mut project = project_at(temp.path(), DepsKind::None);
    project.docker_user_id = Some(999);

    let recipe = compose(&project, &train_py(), &ctx(RunnerKind::Sagemaker, BuilderKind::Docker, false)).unwrap();
    let text = recipe.as_str();
    assert!(text.contains("\nUSER root\n"));
    assert!(!text.contains("useradd"));
    assert!(text.contains("RUN chown -R 0 /home/alice"));
    assert!(text.contains("COPY --chown=0 src/ /home/alice"));
  }

  #[test]
  fn cuda_project_uses_accelerator_base() {
    let temp = tempdir().unwrap();
    let mut project = project_at(temp.path(), DepsKind::None);
    project.cuda_base_image = Some("nvidia/cuda:11.8.0-runtime-ubuntu22.04".to_string());

    let recipe = compose(&project, &train_py(), &ctx(RunnerKind::Local, BuilderKind::Docker, false)).unwrap();
    assert!(recipe.as_str().contains("FROM nvidia/cuda:11.8.0-runtime-ubuntu22.04 as base"));
    assert!(recipe.as_str().contains("update-alternatives --install /usr/bin/python python /usr/bin/python3.10 1"));
  }

  #[test]
  fn missing_manifest_is_a_warning() {
    let temp = tempdir().unwrap();
    let project = project_at(temp.path(), DepsKind::Pip);

    let recipe = compose(&project, &train_py(), &ctx(RunnerKind::Local, BuilderKind::Docker, true)).unwrap();
    assert!(recipe.as_str().contains("RUN mkdir -p /env/"));
    assert_eq!(recipe.warnings(), &[RecipeWarning::NoRequirements]);
  }

  #[test]
  fn cache_mounts_never_used_without_capability() {
    let temp = tempdir().unwrap();
    write_tree(
      temp.path(),
      &[("requirements.txt", "numpy\n"), ("environment.yml", "name: env\n")],
    );

    for deps in [DepsKind::Pip, DepsKind::Conda, DepsKind::None] {
      let project = project_at(temp.path(), deps);
      for builder in [BuilderKind::Docker, BuilderKind::Kaniko] {
        let recipe = compose(&project, &train_py(), &ctx(RunnerKind::Local, builder, false)).unwrap();
        assert!(!recipe.as_str().contains("--mount=type=cache"), "{deps} / {builder}");
      }
    }
  }

  #[test]
  fn project_dir_is_required() {
    let project = ProjectDescriptor::default();
    let err = compose(&project, &train_py(), &ctx(RunnerKind::Local, BuilderKind::Docker, false)).unwrap_err();
    assert!(matches!(err, RecipeError::Project(ProjectError::MissingProjectDir)));
  }
}
