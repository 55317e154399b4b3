//! Names shared between the recipe, the staging layout and the container runtime.

pub const APP_NAME: &str = "mlaunch";

/// Reserved file name of the generated recipe at the root of a build context.
pub const GENERATED_DOCKERFILE_NAME: &str = "Dockerfile.mlaunch-autogenerated";

/// Reserved file name of the wrapper script written into the project source tree.
pub const DEFAULT_ENTRYPOINT: &str = "_mlaunch_default_entrypoint";

/// Bootstrap helper that installs frozen requirements inside the build stage.
pub const BOOTSTRAP_FILENAME: &str = "_mlaunch_bootstrap.py";

/// Subdirectory of the build context holding the copied source tree.
pub const CONTEXT_SRC_DIR: &str = "src";

/// Runtime pin file written into the copied source tree.
pub const RUNTIME_PIN_FILENAME: &str = "runtime.txt";

/// Length of the content-addressed image tag in hex characters.
pub const IMAGE_TAG_LEN: usize = 8;

/// User-level launch config file, relative to the config directory.
pub const LAUNCH_CONFIG_FILENAME: &str = "launch-config.yaml";

pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const FROZEN_REQUIREMENTS_FILE: &str = "requirements.frozen.txt";
pub const CONDA_ENVIRONMENT_FILE: &str = "environment.yml";

/// Slot name under which a job artifact is exposed to the run.
pub const JOB_ARTIFACT_SLOT_NAME: &str = "_mlaunch_job";
