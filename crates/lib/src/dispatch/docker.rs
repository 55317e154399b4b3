//! Builds with the local docker daemon.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::platform::HostToolchain;
use crate::project::{EntryPoint, ProjectDescriptor};
use crate::recipe::{RecipeContext, compose};
use crate::stage::stage;
use crate::util::cmd::{self, find_executable};
use crate::util::hash::tag_for_project;

use super::{BuildError, Builder, BuilderKind, Environment, Registry};

const DOCKER_INSTALL_HINT: &str = "install docker and make sure the daemon is running (https://docs.docker.com/get-docker/)";

pub struct DockerBuilder {
  program: String,
  environment: Environment,
  registry: Registry,
  host: HostToolchain,
}

impl DockerBuilder {
  pub fn new(environment: Environment, registry: Registry, host: HostToolchain) -> Self {
    Self {
      program: "docker".to_string(),
      environment,
      registry,
      host,
    }
  }

  /// Use a different docker client binary.
  pub fn with_program(mut self, program: impl Into<String>) -> Self {
    self.program = program.into();
    self
  }

  fn image_exists(&self, image_uri: &str) -> bool {
    if self.registry.is_remote() {
      cmd::succeeds(&self.program, ["manifest", "inspect", image_uri])
    } else {
      cmd::succeeds(&self.program, ["image", "inspect", image_uri])
    }
  }
}

/// Fail early when the docker client is missing.
pub fn validate_docker_installation(program: &str) -> Result<PathBuf, BuildError> {
  find_executable(program).ok_or_else(|| BuildError::ToolNotFound {
    tool: program.to_string(),
    hint: DOCKER_INSTALL_HINT,
  })
}

/// Whether `program` has the buildx plugin, and with it persistent cache mounts.
pub fn buildx_available(program: &str) -> bool {
  cmd::succeeds(program, ["buildx", "version"])
}

impl Builder for DockerBuilder {
  fn kind(&self) -> BuilderKind {
    BuilderKind::Docker
  }

  fn build_image(&self, project: &ProjectDescriptor, entry_point: &EntryPoint) -> Result<Option<String>, BuildError> {
    validate_docker_installation(&self.program)?;

    let buildx = buildx_available(&self.program);
    if !buildx {
      warn!("docker buildx is not available, dependency caches will not be persisted between builds");
    }

    let ctx = RecipeContext {
      runner: project.resource,
      builder: BuilderKind::Docker,
      cache_mounts: buildx,
      host: self.host.clone(),
    };
    let recipe = compose(project, entry_point, &ctx)?;
    for warning in recipe.warnings() {
      warn!(%warning, "recipe");
    }

    let tag = tag_for_project(project, recipe.as_str())?;
    let image_uri = format!("{}:{}", self.registry.repository(project), tag);

    if self.image_exists(&image_uri) {
      info!(image = %image_uri, "image already exists, skipping build");
      return Ok(Some(image_uri));
    }

    let context = stage(project, recipe.as_str())?;
    let dockerfile = context.dockerfile_path().to_string_lossy().into_owned();
    let context_dir = context.path().to_string_lossy().into_owned();

    let tool_env = self.environment.tool_env();
    let mut envs: Vec<(&str, &str)> = tool_env.iter().map(|(k, v)| (*k, v.as_str())).collect();
    if buildx {
      envs.push(("DOCKER_BUILDKIT", "1"));
    }

    info!(image = %image_uri, context = %context_dir, "building image");
    cmd::run(
      &self.program,
      [
        "build",
        "-t",
        image_uri.as_str(),
        "-f",
        dockerfile.as_str(),
        context_dir.as_str(),
      ],
      &envs,
    )?;

    if self.registry.is_remote() {
      info!(image = %image_uri, "pushing image");
      cmd::run(&self.program, ["push", image_uri.as_str()], &envs)?;
    }

    Ok(Some(image_uri))
  }
}
