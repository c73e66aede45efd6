//! Command-line surface for sitepush.
//!
//! [`Cli`] holds the parsed arguments and [`run`] dispatches them. `run` is
//! async and returns instead of exiting, so integration tests can drive it
//! directly; only `main` turns an error into a non-zero exit.
//!
//! | command   | does |
//! |-----------|------|
//! | `build`   | Markdown + templates → output tree |
//! | `deploy`  | build, then push the output tree over SSH/SCP |
//! | `convert` | render every `.md` in a directory to `.html` beside it |
//! | `titles`  | print the first `<h1>` of every HTML page under a directory |
//! | `tree`    | print the filtered recursive listing of a path |

use crate::build::{build_site, BuildReport};
use crate::config::{DEFAULT_CONFIG_FILE, DEFAULT_ENVIRONMENT};
use crate::deploy::{deploy, DeployOptions, DeployReport};
use crate::links::list_titles;
use crate::load_config::load_config;
use crate::markdown::convert_dir;
use crate::ssh::SshRemote;
use crate::tree::FileTree;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Build a Markdown-and-template website and push it to a host over SSH.
#[derive(Parser)]
#[clap(
    name = "sitepush",
    version,
    about = "Build a static personal website and deploy it over SSH/SCP"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the JSON (or YAML) site config
    #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    /// Environment section to use from the config file
    #[clap(long = "env", default_value = DEFAULT_ENVIRONMENT)]
    pub environment: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the site into the configured output directory
    Build {
        #[clap(flatten)]
        config: ConfigArgs,
        /// Re-render pages even if they look up to date
        #[clap(long)]
        force: bool,
    },
    /// Build the site, then copy changed files to the remote host
    Deploy {
        #[clap(flatten)]
        config: ConfigArgs,
        /// Re-render and re-upload everything
        #[clap(long)]
        force: bool,
        /// Show what would be created and copied without touching the remote
        #[clap(long)]
        dry_run: bool,
        /// Deploy the existing output tree as-is
        #[clap(long)]
        skip_build: bool,
    },
    /// Convert every .md file in a directory into an .html file beside it
    Convert {
        dir: PathBuf,
        #[clap(long)]
        force: bool,
    },
    /// Print the title (first <h1>) of every HTML page under a directory
    Titles { dir: PathBuf },
    /// Print every file under a path, minus those matching an exclusion regex
    Tree {
        path: PathBuf,
        /// Regex of paths to leave out; may be repeated
        #[clap(long, short = 'x')]
        exclude: Vec<String>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let result = dispatch(cli.command).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }

    let exit_span = tracing::info_span!("exit", ok = result.is_ok());
    exit_span.in_scope(|| {
        tracing::info!("exit");
    });

    result
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Build { config, force } => {
            let site = load_config(&config.config, &config.environment)?;
            tracing::info!(command = "build", "Starting build");
            let report = build_site(&site, force).context("Build failed")?;
            print_build(&report);
            Ok(())
        }
        Commands::Deploy {
            config,
            force,
            dry_run,
            skip_build,
        } => {
            let site = load_config(&config.config, &config.environment)?;
            let remote_config = site.remote.as_ref().with_context(|| {
                format!(
                    "Environment {:?} in {:?} has no remote section",
                    config.environment, config.config
                )
            })?;
            if skip_build {
                tracing::info!(command = "deploy", "Skipping build");
            } else {
                let report = build_site(&site, force).context("Build failed")?;
                print_build(&report);
            }
            let remote = SshRemote::new(remote_config);
            tracing::info!(command = "deploy", host = %remote_config.target(), "Starting deploy");
            let report = deploy(&site, &remote, DeployOptions { force, dry_run })
                .await
                .context("Deploy failed")?;
            print_deploy(&report);
            Ok(())
        }
        Commands::Convert { dir, force } => {
            let written = convert_dir(&dir, force)
                .with_context(|| format!("Failed to convert Markdown in {}", dir.display()))?;
            for path in written {
                println!("{}", path.display());
            }
            Ok(())
        }
        Commands::Titles { dir } => {
            let titles = list_titles(&dir)
                .with_context(|| format!("Failed to read pages under {}", dir.display()))?;
            for (path, title) in titles {
                println!("{}\t{}", path.display(), title.unwrap_or_default());
            }
            Ok(())
        }
        Commands::Tree { path, exclude } => {
            let files = FileTree::new(&exclude)?.list(&path)?;
            for file in files {
                println!("{}", file.display());
            }
            Ok(())
        }
    }
}

fn print_build(report: &BuildReport) {
    println!(
        "Build complete: {} rendered, {} up to date, {} static copied",
        report.rendered.len(),
        report.skipped.len(),
        report.copied.len()
    );
}

fn print_deploy(report: &DeployReport) {
    let prefix = if report.dry_run { "[dry run] " } else { "" };
    for dir in &report.created_dirs {
        println!("{prefix}mkdir {dir}");
    }
    for file in &report.uploaded {
        println!("{prefix}upload {file}");
    }
    println!(
        "{prefix}Deploy complete: {} directories created, {} uploaded, {} unchanged",
        report.created_dirs.len(),
        report.uploaded.len(),
        report.unchanged.len()
    );
}
