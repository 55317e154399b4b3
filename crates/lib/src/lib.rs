//! mlaunch-lib: build orchestration for launching ML jobs in containers
//!
//! This crate turns a declarative project description into container build inputs:
//! - `recipe`: renders the multi-stage Dockerfile and the entrypoint wrapper
//! - `stage`: materializes an ephemeral build context directory
//! - `util::hash`: derives the content-addressed image tag
//! - `dispatch`: resolves environment, registry and builder from config and runs the build
//! - `runtime_env`: the environment variables a launched container expects

pub mod config;
pub mod consts;
pub mod dispatch;
pub mod platform;
pub mod project;
pub mod recipe;
pub mod runtime_env;
pub mod stage;
pub mod util;
