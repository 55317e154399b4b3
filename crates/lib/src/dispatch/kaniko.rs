//! Daemonless builds with the kaniko executor.
//!
//! Kaniko runs inside its own container image and always pushes, so it is only
//! offered with a remote registry. It has no persistent cache mounts.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::platform::HostToolchain;
use crate::project::{EntryPoint, ProjectDescriptor};
use crate::recipe::{RecipeContext, compose};
use crate::stage::stage;
use crate::util::cmd::{self, find_executable};
use crate::util::hash::tag_for_project;

use super::{BuildError, Builder, BuilderKind, Environment};

pub const DEFAULT_EXECUTOR: &str = "/kaniko/executor";

const KANIKO_HINT: &str = "kaniko builds must run inside the kaniko executor image (gcr.io/kaniko-project/executor)";

pub struct KanikoBuilder {
  executor: PathBuf,
  environment: Environment,
  destination: String,
  host: HostToolchain,
}

impl KanikoBuilder {
  /// `destination` is the remote repository, without tag.
  pub fn new(environment: Environment, destination: String, host: HostToolchain) -> Self {
    Self {
      executor: PathBuf::from(DEFAULT_EXECUTOR),
      environment,
      destination,
      host,
    }
  }

  pub fn with_executor(mut self, executor: impl Into<PathBuf>) -> Self {
    self.executor = executor.into();
    self
  }
}

impl Builder for KanikoBuilder {
  fn kind(&self) -> BuilderKind {
    BuilderKind::Kaniko
  }

  fn build_image(&self, project: &ProjectDescriptor, entry_point: &EntryPoint) -> Result<Option<String>, BuildError> {
    let executor = self.executor.to_string_lossy().into_owned();
    let executor = find_executable(&executor).ok_or_else(|| BuildError::ToolNotFound {
      tool: executor.clone(),
      hint: KANIKO_HINT,
    })?;

    let ctx = RecipeContext {
      runner: project.resource,
      builder: BuilderKind::Kaniko,
      cache_mounts: false,
      host: self.host.clone(),
    };
    let recipe = compose(project, entry_point, &ctx)?;
    for warning in recipe.warnings() {
      warn!(%warning, "recipe");
    }

    let tag = tag_for_project(project, recipe.as_str())?;
    let image_uri = format!("{}:{}", self.destination.trim_end_matches('/'), tag);

    let context = stage(project, recipe.as_str())?;
    let context_arg = format!("dir://{}", context.path().display());
    let dockerfile = context.dockerfile_path().to_string_lossy().into_owned();

    let tool_env = self.environment.tool_env();
    let envs: Vec<(&str, &str)> = tool_env.iter().map(|(k, v)| (*k, v.as_str())).collect();

    info!(image = %image_uri, executor = %executor.display(), "building image with kaniko");
    cmd::run(
      &executor.to_string_lossy(),
      [
        "--context",
        context_arg.as_str(),
        "--dockerfile",
        dockerfile.as_str(),
        "--destination",
        image_uri.as_str(),
      ],
      &envs,
    )?;

    Ok(Some(image_uri))
  }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use super::*;
  use crate::project::DepsKind;
  use crate::util::testutil::{fake_tool, fake_tool_calls, project_at, test_host, write_tree};
  use tempfile::tempdir;

  #[test]
  fn runs_executor_against_staged_context() {
    let src = tempdir().unwrap();
    write_tree(src.path(), &[("main.py", "")]);
    let tools = tempdir().unwrap();
    // $4 is the --dockerfile value
    let executor = fake_tool(tools.path(), "executor", "test -f \"$4\" || exit 3");
    let project = project_at(src.path(), DepsKind::None);

    let builder = KanikoBuilder::new(Environment::Local, "reg.example.com/ml/".to_string(), test_host())
      .with_executor(&executor);
    let uri = builder.build_image(&project, &EntryPoint::default_python()).unwrap().unwrap();
    assert!(uri.starts_with("reg.example.com/ml:"));

    let calls = fake_tool_calls(tools.path(), "executor");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("--context dir://"));
    assert!(calls[0].ends_with(&format!("--destination {uri}")));
  }

  #[test]
  fn kaniko_recipe_has_no_cache_mounts() {
    let src = tempdir().unwrap();
    write_tree(src.path(), &[("main.py", ""), ("requirements.txt", "torch\n")]);
    let tools = tempdir().unwrap();
    // copy the generated Dockerfile out of the context before it is cleaned up
    let out = tools.path().join("Dockerfile.seen");
    let body = format!("/bin/cp \"$4\" '{}'", out.display());
    let executor = fake_tool(tools.path(), "executor", &body);
    let project = project_at(src.path(), DepsKind::Pip);

    KanikoBuilder::new(Environment::Local, "reg.example.com/ml".to_string(), test_host())
      .with_executor(&executor)
      .build_image(&project, &EntryPoint::default_python())
      .unwrap();

    let recipe = std::fs::read_to_string(out).unwrap();
    assert!(!recipe.contains("--mount=type=cache"));
  }

  #[test]
  fn missing_executor_is_reported() {
    let src = tempdir().unwrap();
    let project = project_at(src.path(), DepsKind::None);
    let err = KanikoBuilder::new(Environment::Local, "r".to_string(), test_host())
      .with_executor(src.path().join("nope"))
      .build_image(&project, &EntryPoint::default_python())
      .unwrap_err();
    assert!(matches!(err, BuildError::ToolNotFound { .. }));
  }
}
