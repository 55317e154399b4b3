//! Build dispatch.
//!
//! Resolves the launch config into an [`Environment`], a [`Registry`] and a
//! [`Builder`], then asks the builder for an image URI.

mod builder;
pub mod docker;
mod environment;
pub mod kaniko;
mod registry;
mod types;

pub use builder::*;
pub use environment::*;
pub use registry::*;
pub use types::*;

use tracing::info;

use crate::config::LaunchConfig;
use crate::platform::HostToolchain;
use crate::project::{EntryPoint, ProjectDescriptor};

/// Build an image for `project` with the backend named in `config`.
///
/// Every config section is validated before anything is constructed.
pub fn build_image_from_project(
  project: &ProjectDescriptor,
  config: &LaunchConfig,
  host: &HostToolchain,
) -> Result<String, DispatchError> {
  let resolved = config.resolve()?;
  let environment = environment_from_config(resolved.environment())?;
  let registry = registry_from_config(resolved.registry(), &environment)?;
  let builder =
    builder_from_config(resolved.builder(), &environment, &registry, host)?.ok_or(DispatchError::NoBuilder)?;

  build_with_builder(builder.as_ref(), project)
}

/// Run `builder` for the project's single entry point, or the default one.
pub fn build_with_builder(builder: &dyn Builder, project: &ProjectDescriptor) -> Result<String, DispatchError> {
  let entry_point = project
    .single_entry_point()
    .cloned()
    .unwrap_or_else(EntryPoint::default_python);

  info!(builder = %builder.kind(), entry_point = %entry_point.joined(), "building image");
  let uri = builder
    .build_image(project, &entry_point)?
    .ok_or(DispatchError::BuildFailed { builder: builder.kind() })?;
  info!(image = %uri, "image ready");
  Ok(uri)
}
