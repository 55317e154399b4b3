//! The `builder` section and the [`Builder`] seam.

use std::path::PathBuf;

use serde::Deserialize;
use serde_yaml::Mapping;
use tracing::debug;

use crate::config::{ConfigError, Section, parse_section};
use crate::platform::HostToolchain;
use crate::project::{EntryPoint, ProjectDescriptor};

use super::docker::DockerBuilder;
use super::kaniko::KanikoBuilder;
use super::{BuildError, BuilderKind, Environment, Registry};

/// An image-build backend.
pub trait Builder {
  fn kind(&self) -> BuilderKind;

  /// Build (or reuse) an image for `project` and return its URI.
  ///
  /// `Ok(None)` means the backend finished without producing an image.
  fn build_image(&self, project: &ProjectDescriptor, entry_point: &EntryPoint) -> Result<Option<String>, BuildError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum BuilderConfig {
  #[default]
  Docker,
  Kaniko {
    #[serde(default)]
    executor: Option<PathBuf>,
  },
  Noop,
}

/// Construct the configured builder. `noop` yields `None`.
pub fn builder_from_config(
  section: &Mapping,
  environment: &Environment,
  registry: &Registry,
  host: &HostToolchain,
) -> Result<Option<Box<dyn Builder>>, ConfigError> {
  let config: BuilderConfig = parse_section(Section::Builder, section)?;
  debug!(builder = ?config, environment = environment.name(), "selected builder");

  let builder: Box<dyn Builder> = match config {
    BuilderConfig::Noop => return Ok(None),
    BuilderConfig::Docker => Box::new(DockerBuilder::new(environment.clone(), registry.clone(), host.clone())),
    BuilderConfig::Kaniko { executor } => {
      let Registry::Remote { uri } = registry else {
        return Err(ConfigError::Unsupported {
          section: Section::Builder,
          message: "kaniko pushes its result and needs a remote registry".to_string(),
        });
      };
      let mut kaniko = KanikoBuilder::new(environment.clone(), uri.clone(), host.clone());
      if let Some(executor) = executor {
        kaniko = kaniko.with_executor(executor);
      }
      Box::new(kaniko)
    }
  };
  Ok(Some(builder))
}
