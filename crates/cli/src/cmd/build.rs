//! Implementation of the `mlaunch build` command.

use std::path::Path;

use anyhow::{Context, Result};

use mlaunch_lib::config::LaunchConfig;
use mlaunch_lib::dispatch::build_image_from_project;

use crate::args::ProjectArgs;
use crate::output::{print_json, print_success};

pub fn cmd_build(args: &ProjectArgs, config: Option<&Path>, json: bool) -> Result<()> {
  let explicit = match config {
    Some(path) => LaunchConfig::load(path)?,
    None => LaunchConfig::default(),
  };
  let config = match LaunchConfig::load_user_default()? {
    Some(defaults) => explicit.with_defaults(&defaults),
    None => explicit,
  };

  let project = args.descriptor()?;
  let host = args.host()?;
  let image = build_image_from_project(&project, &config, &host).context("Image build failed")?;

  if json {
    print_json(&serde_json::json!({ "image": image }))?;
  } else {
    print_success(&format!("Image ready: {}", image));
  }
  Ok(())
}
