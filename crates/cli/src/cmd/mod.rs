mod build;
mod env;
mod info;
mod render;
mod stage;

pub use build::cmd_build;
pub use env::cmd_env;
pub use info::cmd_info;
pub use render::cmd_render;
pub use stage::cmd_stage;

use anyhow::Result;

use mlaunch_lib::dispatch::BuilderKind;
use mlaunch_lib::dispatch::docker::buildx_available;
use mlaunch_lib::project::{EntryPoint, ProjectDescriptor};
use mlaunch_lib::recipe::{Recipe, RecipeContext, compose};

use crate::args::ProjectArgs;
use crate::output::print_warning;

/// Compose the recipe a docker build of `args` would use on this host.
fn compose_for(args: &ProjectArgs) -> Result<(ProjectDescriptor, Recipe)> {
  let project = args.descriptor()?;
  let entry_point = project
    .single_entry_point()
    .cloned()
    .unwrap_or_else(EntryPoint::default_python);
  let ctx = RecipeContext {
    runner: project.resource,
    builder: BuilderKind::Docker,
    cache_mounts: buildx_available("docker"),
    host: args.host()?,
  };
  let recipe = compose(&project, &entry_point, &ctx)?;
  for warning in recipe.warnings() {
    print_warning(&warning.to_string());
  }
  Ok((project, recipe))
}
