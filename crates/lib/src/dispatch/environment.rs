//! The `environment` section: where credentials and cloud context come from.

use serde::Deserialize;
use serde_yaml::Mapping;

use crate::config::{ConfigError, Section, parse_section};

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Environment {
  /// Ambient credentials of the host.
  #[default]
  #[serde(alias = "none")]
  Local,
  Aws {
    #[serde(default)]
    region: Option<String>,
  },
  Gcp { project: String, region: String },
}

impl Environment {
  pub fn name(&self) -> &'static str {
    match self {
      Environment::Local => "local",
      Environment::Aws { .. } => "aws",
      Environment::Gcp { .. } => "gcp",
    }
  }

  /// Extra variables handed to build tools running in this environment.
  pub fn tool_env(&self) -> Vec<(&'static str, String)> {
    match self {
      Environment::Aws { region: Some(region) } => vec![("AWS_REGION", region.clone())],
      Environment::Gcp { project, .. } => vec![("CLOUDSDK_CORE_PROJECT", project.clone())],
      _ => Vec::new(),
    }
  }
}

pub fn environment_from_config(section: &Mapping) -> Result<Environment, ConfigError> {
  parse_section(Section::Environment, section)
}
