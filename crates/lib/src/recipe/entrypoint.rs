//! Entrypoint wrapper script and the recipe section that installs it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::DEFAULT_ENTRYPOINT;
use crate::project::EntryPoint;

use super::RecipeError;
use super::templates::ENTRYPOINT_SCRIPT;

/// Write the wrapper script into `project_dir` under its reserved name.
pub fn write_entrypoint_script(project_dir: &Path) -> Result<PathBuf, RecipeError> {
  let path = project_dir.join(DEFAULT_ENTRYPOINT);
  fs::write(&path, ENTRYPOINT_SCRIPT).map_err(|e| RecipeError::WriteEntrypoint {
    path: path.clone(),
    source: e,
  })?;
  Ok(path)
}

/// Write the wrapper script and return the directives that copy it in and run it.
///
/// The joined entry point command is baked in as the script's first argument.
pub fn entrypoint_setup(project_dir: &Path, entry_point: &EntryPoint, workdir: &str) -> Result<String, RecipeError> {
  write_entrypoint_script(project_dir)?;

  let exec_form = [
    "sh".to_string(),
    format!("./{DEFAULT_ENTRYPOINT}"),
    entry_point.joined(),
  ]
  .iter()
  .map(serde_json::to_string)
  .collect::<Result<Vec<_>, _>>()?
  .join(", ");

  Ok(format!(
    "COPY ./src/{DEFAULT_ENTRYPOINT} {workdir}\nENTRYPOINT [{exec_form}]"
  ))
}
