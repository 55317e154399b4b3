//! Implementation of the `mlaunch env` command.

use anyhow::Result;

use mlaunch_lib::runtime_env::env_vars;

use crate::args::ProjectArgs;
use crate::output::print_json;

pub fn cmd_env(args: &ProjectArgs, base_url: &str, api_key: &str, json: bool) -> Result<()> {
  let project = args.descriptor()?;
  let env = env_vars(&project, base_url, api_key)?;

  if json {
    return print_json(&env);
  }
  for (key, value) in &env {
    println!("{}={}", key, value);
  }
  Ok(())
}
