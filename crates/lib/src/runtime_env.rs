//! Environment variables handed to a launched container.
//!
//! The entrypoint wrapper reads `MLAUNCH_ENTRYPOINT_COMMAND` and `MLAUNCH_ARGS`;
//! the rest tell the job where to report.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::consts::JOB_ARTIFACT_SLOT_NAME;
use crate::project::ProjectDescriptor;
use crate::util::shell;

/// Variables for running `project`'s image, keyed by name.
pub fn env_vars(
  project: &ProjectDescriptor,
  base_url: &str,
  api_key: &str,
) -> Result<BTreeMap<String, String>, serde_json::Error> {
  let mut env = BTreeMap::new();
  let mut set = |key: &str, value: String| {
    env.insert(format!("MLAUNCH_{key}"), value);
  };

  set("BASE_URL", base_url.to_string());
  set("API_KEY", api_key.to_string());
  set("PROJECT", project.target_project.clone());
  set("ENTITY", project.target_entity.clone());
  set("LAUNCH", "True".to_string());
  set("RUN_ID", project.run_id.clone());

  if let Some(image) = &project.docker_image {
    set("DOCKER", image.clone());
  }
  if let Some(name) = &project.name {
    set("NAME", name.clone());
  }
  if let Some(author) = project.launch_spec.get("author").and_then(Value::as_str) {
    set("USERNAME", author.to_string());
  }

  set("CONFIG", serde_json::to_string(&project.override_config)?);
  set("ARTIFACTS", serde_json::to_string(&artifacts(project))?);

  if let Some(ep) = &project.override_entrypoint {
    set("ENTRYPOINT_COMMAND", ep.joined());
  }
  if !project.override_args.is_empty() {
    set("ARGS", shell::join(&project.override_args));
  }

  Ok(env)
}

/// Override artifacts, with the job artifact (if any) under its reserved slot.
/// Explicit overrides win.
fn artifacts(project: &ProjectDescriptor) -> Map<String, Value> {
  let mut merged = Map::new();
  if let Some(job) = &project.job {
    merged.insert(JOB_ARTIFACT_SLOT_NAME.to_string(), Value::String(job.clone()));
  }
  for (key, value) in &project.override_artifacts {
    merged.insert(key.clone(), value.clone());
  }
  merged
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::project::EntryPoint;
  use serde_json::json;

  fn project() -> ProjectDescriptor {
    ProjectDescriptor {
      target_project: "trainer".to_string(),
      target_entity: "acme".to_string(),
      run_id: "run-1".to_string(),
      ..Default::default()
    }
  }

  #[test]
  fn always_present_variables() {
    let env = env_vars(&project(), "https://api.example.com", "secret").unwrap();
    assert_eq!(env["MLAUNCH_BASE_URL"], "https://api.example.com");
    assert_eq!(env["MLAUNCH_API_KEY"], "secret");
    assert_eq!(env["MLAUNCH_PROJECT"], "trainer");
    assert_eq!(env["MLAUNCH_ENTITY"], "acme");
    assert_eq!(env["MLAUNCH_LAUNCH"], "True");
    assert_eq!(env["MLAUNCH_RUN_ID"], "run-1");
    assert_eq!(env["MLAUNCH_CONFIG"], "{}");
    assert_eq!(env["MLAUNCH_ARTIFACTS"], "{}");
    for optional in ["DOCKER", "NAME", "USERNAME", "ENTRYPOINT_COMMAND", "ARGS"] {
      assert!(!env.contains_key(&format!("MLAUNCH_{optional}")), "{optional}");
    }
  }

  #[test]
  fn optional_variables() {
    let mut p = project();
    p.docker_image = Some("acme/prebuilt:1".to_string());
    p.name = Some("sweep-7".to_string());
    p.launch_spec = json!({"author": "bob"}).as_object().unwrap().clone();
    p.override_entrypoint = Some(EntryPoint::new("train.py", vec!["python".into(), "train.py".into()]));
    p.override_args = vec!["--lr".into(), "0.1".into(), "it's".into()];

    let env = env_vars(&p, "u", "k").unwrap();
    assert_eq!(env["MLAUNCH_DOCKER"], "acme/prebuilt:1");
    assert_eq!(env["MLAUNCH_NAME"], "sweep-7");
    assert_eq!(env["MLAUNCH_USERNAME"], "bob");
    assert_eq!(env["MLAUNCH_ENTRYPOINT_COMMAND"], "python train.py");
    assert_eq!(env["MLAUNCH_ARGS"], shell::join(&p.override_args));
  }

  #[test]
  fn job_artifact_merges_under_overrides() {
    let mut p = project();
    p.job = Some("acme/trainer/job:v3".to_string());
    p.override_config = json!({"epochs": 3}).as_object().unwrap().clone();
    p.override_artifacts = json!({"dataset": "acme/data:v1"}).as_object().unwrap().clone();

    let env = env_vars(&p, "u", "k").unwrap();
    let artifacts: Value = serde_json::from_str(&env["MLAUNCH_ARTIFACTS"]).unwrap();
    assert_eq!(
      artifacts,
      json!({"_mlaunch_job": "acme/trainer/job:v3", "dataset": "acme/data:v1"})
    );
    assert_eq!(env["MLAUNCH_CONFIG"], r#"{"epochs":3}"#);

    p.override_artifacts = json!({"_mlaunch_job": "pinned:v1"}).as_object().unwrap().clone();
    let env = env_vars(&p, "u", "k").unwrap();
    assert!(env["MLAUNCH_ARTIFACTS"].contains("pinned:v1"));
  }
}
