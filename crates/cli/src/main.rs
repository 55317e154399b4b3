//! mlaunch - container image builds for ML jobs.

mod args;
mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use args::ProjectArgs;
use cmd::{cmd_build, cmd_env, cmd_info, cmd_render, cmd_stage};

/// mlaunch - build container images for ML jobs
#[derive(Parser)]
#[command(name = "mlaunch")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the generated Dockerfile for a project
  Render {
    #[command(flatten)]
    project: ProjectArgs,

    /// Write the Dockerfile here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Stage a build context directory and print its path
  Stage {
    #[command(flatten)]
    project: ProjectArgs,
  },

  /// Build (or reuse) the project's image with the configured builder
  Build {
    #[command(flatten)]
    project: ProjectArgs,

    /// Launch config file; sections override the user default config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Print the environment a launched container receives
  Env {
    #[command(flatten)]
    project: ProjectArgs,

    /// Base URL of the tracking server
    #[arg(long, env = "MLAUNCH_BASE_URL", default_value = "https://api.mlaunch.dev")]
    base_url: String,

    /// API key passed to the job
    #[arg(long, env = "MLAUNCH_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Show host toolchain and config locations
  Info,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "mlaunch=debug,mlaunch_lib=debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Render { project, output } => cmd_render(&project, output.as_deref()),
    Commands::Stage { project } => cmd_stage(&project),
    Commands::Build { project, config, json } => cmd_build(&project, config.as_deref(), json),
    Commands::Env {
      project,
      base_url,
      api_key,
      json,
    } => cmd_env(&project, &base_url, &api_key, json),
    Commands::Info => {
      cmd_info();
      Ok(())
    }
  }
}
