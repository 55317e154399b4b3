//! Fixed text embedded into generated recipes and build contexts.

/// Wrapper script copied into the image and used as its entrypoint.
///
/// The command comes from `MLAUNCH_ENTRYPOINT_COMMAND` when set, else from the first
/// positional argument baked in at build time. `MLAUNCH_ARGS` is appended. This lets
/// one image be relaunched with a different command without a rebuild.
pub const ENTRYPOINT_SCRIPT: &str = r#"#!/bin/sh
if [ -z "${MLAUNCH_ENTRYPOINT_COMMAND}" ]; then
    CMD="$1"
else
    CMD="${MLAUNCH_ENTRYPOINT_COMMAND}"
fi
CMD="${CMD} ${MLAUNCH_ARGS}"
echo "Running command: ${CMD}"
eval $CMD
"#;

/// Installs `requirements.frozen.txt`, honouring `MLAUNCH_ONLY_INCLUDE`.
pub const BOOTSTRAP_SCRIPT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/_mlaunch_bootstrap.py"));

/// Repository keys and the deadsnakes PPA for accelerator images, which ship without an interpreter.
pub const CUDA_APT_SETUP: &str = r#"RUN apt-key adv --fetch-keys https://developer.download.nvidia.com/compute/cuda/repos/$(cat /etc/os-release | grep ^ID= |  cut -d "=" -f2 )$(cat /etc/os-release | grep ^VERSION_ID= |  cut -d "=" -f2 | sed -e 's/[".]//g' )/$(uname -i)/3bf863cc.pub
RUN apt-key adv --fetch-keys https://developer.download.nvidia.com/compute/machine-learning/repos/$(cat /etc/os-release | grep ^ID= |  cut -d "=" -f2 )$(cat /etc/os-release | grep ^VERSION_ID= |  cut -d "=" -f2 | sed -e 's/[".]//g' )/$(uname -i)/7fa2af80.pub
RUN apt-get update -qq && apt-get install -y software-properties-common && add-apt-repository -y ppa:deadsnakes/ppa"#;

/// Placeholder for stage 1 when there is nothing to install; stage 2 copies `/env`.
pub const EMPTY_ENV_SECTION: &str = "RUN mkdir -p /env/";

pub const PIP_CACHE_MOUNT: &str = "RUN --mount=type=cache,mode=0777,target=/root/.cache/pip";
pub const CONDA_CACHE_MOUNT: &str = "RUN --mount=type=cache,mode=0777,target=/opt/conda/pkgs";
pub const CACHE_DISABLED: &str = "RUN MLAUNCH_DISABLE_CACHE=true";
