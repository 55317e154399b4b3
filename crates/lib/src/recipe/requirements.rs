//! Dependency installation for the build stage.
//!
//! # Pip
//!
//! | files present                      | installs                                     |
//! |------------------------------------|----------------------------------------------|
//! | `requirements.frozen.txt` (+ plain)| bootstrap helper, filtered to top-level names |
//! | `requirements.txt` only            | `pip install -r requirements.txt`            |
//! | neither                            | nothing; placeholder `/env` + warning        |
//!
//! The include-only filter keeps the bootstrap from installing packages the project
//! never asked for while transitive dependencies keep their frozen versions.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::consts::{BOOTSTRAP_FILENAME, CONDA_ENVIRONMENT_FILE, FROZEN_REQUIREMENTS_FILE, REQUIREMENTS_FILE};
use crate::dispatch::BuilderKind;
use crate::project::DepsKind;

use super::templates::{CACHE_DISABLED, CONDA_CACHE_MOUNT, EMPTY_ENV_SECTION, PIP_CACHE_MOUNT};
use super::{RecipeError, RecipeWarning};

/// Name, optional extras, then nothing or a version/marker/url clause.
static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^(?P<name>[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:\[[A-Za-z0-9._,\s-]*\])?\s*(?:(?:===|==|>=|<=|!=|~=|<|>|;|@|\().*)?$",
  )
  .expect("requirement regex is valid")
});

/// The stage 1 dependency section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementsSection {
  pub text: String,
  pub warnings: Vec<RecipeWarning>,
}

impl RequirementsSection {
  fn empty() -> Self {
    warn!("no requirements file found, no packages will be installed");
    Self {
      text: EMPTY_ENV_SECTION.to_string(),
      warnings: vec![RecipeWarning::NoRequirements],
    }
  }
}

/// `RUN` prefix for the install command.
///
/// A cache mount is used only when the backend advertises it and the builder kind can
/// use it at all; otherwise caching is disabled for the install step.
pub fn install_prefix(deps: DepsKind, builder: BuilderKind, cache_mounts: bool) -> &'static str {
  if !(cache_mounts && builder.supports_cache_mounts()) {
    return CACHE_DISABLED;
  }
  match deps {
    DepsKind::Pip => PIP_CACHE_MOUNT,
    DepsKind::Conda => CONDA_CACHE_MOUNT,
    DepsKind::None => CACHE_DISABLED,
  }
}

/// Render the dependency section for a project rooted at `project_dir`.
pub fn requirements_section(
  project_dir: &Path,
  deps: DepsKind,
  builder: BuilderKind,
  cache_mounts: bool,
) -> Result<RequirementsSection, RecipeError> {
  let prefix = install_prefix(deps, builder, cache_mounts);
  match deps {
    DepsKind::Pip => pip_section(project_dir, prefix),
    DepsKind::Conda => Ok(conda_section(project_dir, prefix)),
    DepsKind::None => Ok(RequirementsSection::empty()),
  }
}

fn pip_section(project_dir: &Path, prefix: &str) -> Result<RequirementsSection, RecipeError> {
  let plain = project_dir.join(REQUIREMENTS_FILE);
  let frozen = project_dir.join(FROZEN_REQUIREMENTS_FILE);

  let mut files = Vec::new();
  let mut warnings = Vec::new();
  let install = match (plain.exists(), frozen.exists()) {
    (false, false) => return Ok(RequirementsSection::empty()),
    (true, false) => {
      files.push(format!("src/{REQUIREMENTS_FILE}"));
      format!("pip install -r {REQUIREMENTS_FILE}")
    }
    (has_plain, true) => {
      let mut filter = String::new();
      if has_plain {
        files.push(format!("src/{REQUIREMENTS_FILE}"));
        let contents = fs::read_to_string(&plain).map_err(|e| RecipeError::ReadManifest {
          path: plain.clone(),
          source: e,
        })?;
        let parsed = parse_requirement_names(&contents);
        warnings.extend(
          parsed
            .skipped
            .into_iter()
            .map(|line| RecipeWarning::UnparsableRequirement { line }),
        );
        filter = format!("MLAUNCH_ONLY_INCLUDE={} ", include_only_filter(&parsed.names));
      }
      files.push(format!("src/{FROZEN_REQUIREMENTS_FILE}"));
      files.push(BOOTSTRAP_FILENAME.to_string());
      format!("{filter}python {BOOTSTRAP_FILENAME}")
    }
  };

  let text = format!(
    r#"RUN python -m venv /env
# install into the virtualenv
ENV PATH="/env/bin:$PATH"
COPY {files} ./
{prefix} {install}"#,
    files = files.join(" "),
  );

  Ok(RequirementsSection { text, warnings })
}

fn conda_section(project_dir: &Path, prefix: &str) -> RequirementsSection {
  if !project_dir.join(CONDA_ENVIRONMENT_FILE).exists() {
    return RequirementsSection::empty();
  }

  let text = format!(
    r#"COPY src/{CONDA_ENVIRONMENT_FILE} .
{prefix} conda env create -f {CONDA_ENVIRONMENT_FILE} -n env

# pack the environment so stage 2 does not depend on the conda prefix
RUN conda install -c conda-forge conda-pack
RUN conda pack -n env -o /tmp/env.tar && \
    mkdir /env && cd /env && tar xf /tmp/env.tar && \
    rm /tmp/env.tar
RUN /env/bin/conda-unpack"#
  );

  RequirementsSection {
    text,
    warnings: Vec::new(),
  }
}

/// Top-level package names parsed from a plain requirements file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedRequirements {
  /// Lowercased, shell-quoted names.
  pub names: BTreeSet<String>,
  /// Lines that could not be parsed.
  pub skipped: Vec<String>,
}

/// Parse the top-level package names out of `requirements.txt` contents.
///
/// Blank lines and comments are ignored. Anything else that is not a plain
/// requirement (options such as `-r other.txt`, bare URLs, malformed specifiers)
/// is logged and skipped.
pub fn parse_requirement_names(contents: &str) -> ParsedRequirements {
  let mut parsed = ParsedRequirements::default();

  for raw in contents.lines() {
    let line = strip_comment(raw).trim();
    if line.is_empty() {
      continue;
    }
    match REQUIREMENT_RE.captures(line) {
      Some(caps) => {
        let name = caps["name"].to_lowercase();
        parsed.names.insert(crate::util::shell::quote(&name));
      }
      None => {
        warn!(line = %line, "unable to parse requirements.txt line, skipping");
        parsed.skipped.push(line.to_string());
      }
    }
  }

  parsed
}

fn strip_comment(line: &str) -> &str {
  if line.trim_start().starts_with('#') {
    return "";
  }
  // an inline comment starts at a `#` preceded by any whitespace
  let inline = line
    .match_indices('#')
    .map(|(idx, _)| idx)
    .find(|&idx| line[..idx].chars().next_back().is_some_and(char::is_whitespace));
  match inline {
    Some(idx) => &line[..idx],
    None => line,
  }
}

/// Comma-joined include-only filter.
pub fn include_only_filter(names: &BTreeSet<String>) -> String {
  names.iter().cloned().collect::<Vec<_>>().join(",")
}
