//! Launch configuration.
//!
//! A launch config is a YAML mapping with three sections:
//!
//! ```yaml
//! environment:            # credentials / cloud context
//!   type: gcp
//!   project: my-project
//!   region: us-central1
//! registry:               # push target
//!   type: gcr
//!   repository: launch-images
//! builder:                # image-build backend
//!   type: docker
//! ```
//!
//! Sections may come from an explicit config or from the user-level default file
//! (`$XDG_CONFIG_HOME/mlaunch/launch-config.yaml`). An explicit section replaces the
//! default file's section wholesale. Every section must be a mapping; anything else
//! is rejected before it reaches the dispatcher.

mod types;

pub use types::*;

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::platform::paths::launch_config_path;

/// Raw, unvalidated configuration sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchConfig {
  pub environment: Option<Value>,
  pub registry: Option<Value>,
  pub builder: Option<Value>,
}

impl LaunchConfig {
  /// Split a parsed document into its sections. A null document is an empty config.
  pub fn from_value(value: Value) -> Result<Self, ConfigError> {
    let mut doc = match value {
      Value::Null => return Ok(Self::default()),
      Value::Mapping(m) => m,
      other => {
        return Err(ConfigError::MalformedDocument {
          kind: value_kind(&other),
        });
      }
    };
    Ok(Self {
      environment: doc.remove("environment"),
      registry: doc.remove("registry"),
      builder: doc.remove("builder"),
    })
  }

  pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
    let value: Value = serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
      origin: "<inline>".to_string(),
      source: e,
    })?;
    Self::from_value(value)
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;
    let value: Value = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
      origin: path.display().to_string(),
      source: e,
    })?;
    Self::from_value(value)
  }

  /// Load the user-level default file, if there is one.
  pub fn load_user_default() -> Result<Option<Self>, ConfigError> {
    let Some(path) = launch_config_path() else {
      return Ok(None);
    };
    if !path.exists() {
      debug!(path = %path.display(), "no user launch config");
      return Ok(None);
    }
    debug!(path = %path.display(), "loading user launch config");
    Self::load(&path).map(Some)
  }

  /// Fill sections missing here from `defaults`.
  pub fn with_defaults(self, defaults: &LaunchConfig) -> Self {
    Self {
      environment: self.environment.or_else(|| defaults.environment.clone()),
      registry: self.registry.or_else(|| defaults.registry.clone()),
      builder: self.builder.or_else(|| defaults.builder.clone()),
    }
  }

  /// Validate that every section is a mapping. Absent sections are empty mappings.
  pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
    ResolvedConfig::new(
      self.environment.clone().unwrap_or_else(empty_section),
      self.registry.clone().unwrap_or_else(empty_section),
      self.builder.clone().unwrap_or_else(empty_section),
    )
  }
}

fn empty_section() -> Value {
  Value::Mapping(Mapping::new())
}

/// Validated configuration sections. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
  environment: Mapping,
  registry: Mapping,
  builder: Mapping,
}

impl ResolvedConfig {
  pub fn new(environment: Value, registry: Value, builder: Value) -> Result<Self, ConfigError> {
    Ok(Self {
      environment: expect_mapping(Section::Environment, environment)?,
      registry: expect_mapping(Section::Registry, registry)?,
      builder: expect_mapping(Section::Builder, builder)?,
    })
  }

  pub fn environment(&self) -> &Mapping {
    &self.environment
  }

  pub fn registry(&self) -> &Mapping {
    &self.registry
  }

  pub fn builder(&self) -> &Mapping {
    &self.builder
  }
}

fn expect_mapping(section: Section, value: Value) -> Result<Mapping, ConfigError> {
  match value {
    Value::Mapping(m) => Ok(m),
    other => Err(ConfigError::InvalidSection {
      section,
      value: render_value(&other),
      kind: value_kind(&other),
    }),
  }
}

/// Deserialize a section mapping into its typed form.
///
/// An empty mapping deserializes as `T::default()`.
pub fn parse_section<T>(section: Section, mapping: &Mapping) -> Result<T, ConfigError>
where
  T: serde::de::DeserializeOwned + Default,
{
  if mapping.is_empty() {
    return Ok(T::default());
  }
  if !mapping.contains_key("type") {
    return Err(ConfigError::MissingField { section, field: "type" });
  }
  serde_yaml::from_value(Value::Mapping(mapping.clone())).map_err(|e| ConfigError::InvalidField { section, source: e })
}

pub fn value_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Sequence(_) => "sequence",
    Value::Mapping(_) => "mapping",
    Value::Tagged(_) => "tagged",
  }
}

fn render_value(value: &Value) -> String {
  match serde_yaml::to_string(value) {
    Ok(s) => s.trim_end().replace('\n', " "),
    Err(_) => format!("{value:?}"),
  }
}
