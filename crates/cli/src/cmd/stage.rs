//! Implementation of the `mlaunch stage` command.
//!
//! Stages a build context and keeps it on disk so it can be built by hand.

use anyhow::{Context, Result};

use mlaunch_lib::dispatch::Registry;
use mlaunch_lib::stage::stage;
use mlaunch_lib::util::hash::tag_for_project;

use crate::args::ProjectArgs;
use crate::output::{print_stat, print_success};

use super::compose_for;

pub fn cmd_stage(args: &ProjectArgs) -> Result<()> {
  let (project, recipe) = compose_for(args)?;
  let tag = tag_for_project(&project, recipe.as_str())?;

  let context = stage(&project, recipe.as_str()).context("Failed to stage build context")?;
  let dockerfile = context.dockerfile_path();
  let dir = context.keep();

  print_success("Build context staged");
  print_stat("Context", &dir.display().to_string());
  print_stat("Dockerfile", &dockerfile.display().to_string());
  print_stat(
    "Image",
    &format!("{}:{} (local registry)", Registry::Local.repository(&project), tag),
  );
  Ok(())
}
