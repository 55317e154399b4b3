use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::project::ProjectError;
use crate::recipe::RecipeError;
use crate::stage::StageError;
use crate::util::cmd::ToolError;

/// The image-build backends mlaunch knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderKind {
  Docker,
  Kaniko,
}

impl BuilderKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      BuilderKind::Docker => "docker",
      BuilderKind::Kaniko => "kaniko",
    }
  }

  /// Whether `RUN --mount=type=cache` is honoured by this backend.
  pub fn supports_cache_mounts(&self) -> bool {
    matches!(self, BuilderKind::Docker)
  }
}

impl fmt::Display for BuilderKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Errors raised by a builder while producing an image.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error("{tool} not found: {hint}")]
  ToolNotFound { tool: String, hint: &'static str },

  #[error(transparent)]
  Project(#[from] ProjectError),

  #[error(transparent)]
  Recipe(#[from] RecipeError),

  #[error(transparent)]
  Stage(#[from] StageError),

  #[error(transparent)]
  Tool(#[from] ToolError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("no builder found: the configured builder does not build images")]
  NoBuilder,

  #[error("builder {builder} did not produce an image")]
  BuildFailed { builder: BuilderKind },

  #[error(transparent)]
  Build(#[from] BuildError),
}
