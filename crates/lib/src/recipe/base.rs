//! Base image selection for both stages.

use tracing::info;

use crate::project::DepsKind;

use super::templates::CUDA_APT_SETUP;

/// Interpreter version used in image tags, truncated to `major.minor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonVersion {
  /// `major.minor`, e.g. `3.10`.
  pub version: String,
  pub major: String,
}

impl PythonVersion {
  /// Truncate a full version string; a bare major version becomes `N.0`.
  pub fn from_full(full: &str) -> Self {
    let mut parts = full.trim().split('.');
    let major = parts.next().unwrap_or_default().to_string();
    let version = match parts.next() {
      Some(minor) => format!("{major}.{minor}"),
      None => format!("{major}.0"),
    };
    Self { version, major }
  }

  /// The pinned version when given, else the host's.
  pub fn resolve(pinned: Option<&str>, host: &str) -> Self {
    Self::from_full(pinned.unwrap_or(host))
  }
}

/// Stage 1 image: a full interpreter image for pip, a miniconda image for conda.
pub fn build_stage_image(deps: DepsKind, python: &PythonVersion) -> String {
  match deps {
    DepsKind::Pip | DepsKind::None => format!("python:{}", python.version),
    DepsKind::Conda if python.major == "3" => "continuumio/miniconda3:latest".to_string(),
    DepsKind::Conda => "continuumio/miniconda:latest".to_string(),
  }
}

/// Stage 2 of the recipe: the image the job runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSetup {
  pub image: String,
  pub text: String,
}

/// Stage 2 setup.
///
/// Accelerator images get an OS-level interpreter installed and `python` pointed at
/// the resolved version; otherwise a slim interpreter image is used as-is.
pub fn base_setup(cuda_base_image: Option<&str>, python: &PythonVersion) -> BaseSetup {
  let Some(cuda) = cuda_base_image else {
    let image = format!("python:{}-buster", python.version);
    let text = format!("FROM {image} as base");
    return BaseSetup { image, text };
  };

  info!(image = %cuda, "using cuda base image");

  let ver = &python.version;
  let packages = if python.major == "2" {
    [
      format!("python{ver}"),
      format!("libpython{ver}"),
      "python-pip".to_string(),
      "python-setuptools".to_string(),
    ]
  } else {
    [
      format!("python{ver}"),
      format!("libpython{ver}"),
      "python3-pip".to_string(),
      "python3-setuptools".to_string(),
    ]
  };

  let text = format!(
    r#"FROM {cuda} as base
{CUDA_APT_SETUP}

# install the interpreter
RUN apt-get update -qq && apt-get install --no-install-recommends -y \
    {packages} \
    && apt-get -qq purge && apt-get -qq clean \
    && rm -rf /var/lib/apt/lists/*

# point `python` at the resolved version
RUN update-alternatives --install /usr/bin/python python /usr/bin/python{ver} 1 \
    && update-alternatives --install /usr/local/bin/python python /usr/bin/python{ver} 1"#,
    packages = packages.join(" \\\n    "),
  );

  BaseSetup {
    image: cuda.to_string(),
    text,
  }
}
