//! Container user and permission setup.

use crate::platform::HostToolchain;
use crate::project::{ProjectDescriptor, RunnerKind};

/// The user the job runs as inside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerUser {
  pub username: String,
  pub uid: u32,
}

impl ContainerUser {
  pub fn workdir(&self) -> String {
    format!("/home/{}", self.username)
  }
}

/// Resolve the container user.
///
/// A root-only runtime forces uid 0 unless the user supplied their own image. The
/// host username is kept either way since it names the working directory.
pub fn docker_user(project: &ProjectDescriptor, runner: RunnerKind, host: &HostToolchain) -> ContainerUser {
  let username = host.username.clone();
  if runner.requires_root() && project.docker_image.is_none() {
    return ContainerUser { username, uid: 0 };
  }
  ContainerUser {
    username,
    uid: project.docker_user_id.unwrap_or(host.uid),
  }
}

/// `USER root` for root-only runtimes, otherwise create the user and switch to it.
pub fn user_setup(user: &ContainerUser, runner: RunnerKind) -> String {
  if runner.requires_root() {
    return "USER root".to_string();
  }
  format!(
    r#"RUN useradd \
    --create-home \
    --no-log-init \
    --shell /bin/bash \
    --gid 0 \
    --uid {uid} \
    {user} || echo ""
USER {user}"#,
    uid = user.uid,
    user = user.username,
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::test_host;

  #[test]
  fn host_uid_by_default() {
    let user = docker_user(&ProjectDescriptor::default(), RunnerKind::Local, &test_host());
    assert_eq!(user, ContainerUser { username: "alice".into(), uid: 1234 });
    assert_eq!(user.workdir(), "/home/alice");
  }

  #[test]
  fn explicit_uid_overrides_host() {
    let project = ProjectDescriptor {
      docker_user_id: Some(4242),
      ..Default::default()
    };
    assert_eq!(docker_user(&project, RunnerKind::Kubernetes, &test_host()).uid, 4242);
  }

  #[test]
  fn root_runtime_forces_uid_zero_even_with_override() {
    let project = ProjectDescriptor {
      docker_user_id: Some(4242),
      ..Default::default()
    };
    let user = docker_user(&project, RunnerKind::Sagemaker, &test_host());
    assert_eq!(user.uid, 0);
    assert_eq!(user.username, "alice");
  }

  #[test]
  fn root_runtime_with_own_image_keeps_uid() {
    let project = ProjectDescriptor {
      docker_image: Some("acme/trainer:latest".into()),
      docker_user_id: Some(4242),
      ..Default::default()
    };
    assert_eq!(docker_user(&project, RunnerKind::Sagemaker, &test_host()).uid, 4242);
  }

  #[test]
  fn root_runtime_runs_as_root() {
    let user = ContainerUser { username: "alice".into(), uid: 0 };
    assert_eq!(user_setup(&user, RunnerKind::Sagemaker), "USER root");
  }

  #[test]
  fn other_runtimes_create_user() {
    let user = ContainerUser { username: "alice".into(), uid: 1234 };
    let setup = user_setup(&user, RunnerKind::Local);
    assert!(setup.starts_with("RUN useradd \\\n"));
    assert!(setup.contains("--gid 0 \\\n    --uid 1234 \\\n    alice || echo \"\""));
    assert!(setup.ends_with("\nUSER alice"));
  }
}
