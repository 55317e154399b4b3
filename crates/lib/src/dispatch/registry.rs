//! The `registry` section: where built images are pushed.

use serde::Deserialize;
use serde_yaml::Mapping;

use crate::config::{ConfigError, Section, parse_section};
use crate::dispatch::Environment;
use crate::project::ProjectDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RegistryConfig {
  #[default]
  Local,
  Remote { uri: String },
  Gcr {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    project: Option<String>,
    repository: String,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Registry {
  /// Images stay in the local daemon.
  #[default]
  Local,
  /// Images are pushed to `uri`.
  Remote { uri: String },
}

impl Registry {
  /// Image repository (without tag) for `project`.
  pub fn repository(&self, project: &ProjectDescriptor) -> String {
    match self {
      Registry::Local => project.image_name(),
      Registry::Remote { uri } => uri.trim_end_matches('/').to_string(),
    }
  }

  pub fn is_remote(&self) -> bool {
    matches!(self, Registry::Remote { .. })
  }
}

/// `host/project/repository`.
pub fn construct_gcp_registry_uri(repository: &str, project: &str, host: &str) -> String {
  [host, project, repository].join("/")
}

/// Build the registry from its config section. A GCP environment supplies the
/// default artifact registry host and project.
pub fn registry_from_config(section: &Mapping, environment: &Environment) -> Result<Registry, ConfigError> {
  let config: RegistryConfig = parse_section(Section::Registry, section)?;
  match config {
    RegistryConfig::Local => Ok(Registry::Local),
    RegistryConfig::Remote { uri } => Ok(Registry::Remote { uri }),
    RegistryConfig::Gcr {
      host,
      project,
      repository,
    } => {
      let (default_host, default_project) = match environment {
        Environment::Gcp { project, region } => (Some(format!("{region}-docker.pkg.dev")), Some(project.clone())),
        _ => (None, None),
      };
      let host = host.or(default_host).ok_or(ConfigError::MissingField {
        section: Section::Registry,
        field: "host",
      })?;
      let project = project.or(default_project).ok_or(ConfigError::MissingField {
        section: Section::Registry,
        field: "project",
      })?;
      Ok(Registry::Remote {
        uri: construct_gcp_registry_uri(&repository, &project, &host),
      })
    }
  }
}
