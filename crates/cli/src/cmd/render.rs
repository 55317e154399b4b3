//! Implementation of the `mlaunch render` command.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::args::ProjectArgs;
use crate::output::print_success;

use super::compose_for;

pub fn cmd_render(args: &ProjectArgs, output: Option<&Path>) -> Result<()> {
  let (_, recipe) = compose_for(args)?;

  match output {
    Some(path) => {
      fs::write(path, recipe.as_str()).with_context(|| format!("Failed to write {}", path.display()))?;
      print_success(&format!("Wrote {}", path.display()));
    }
    None => print!("{}", recipe),
  }
  Ok(())
}
