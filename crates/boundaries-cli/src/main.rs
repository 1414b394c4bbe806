//! boundaries CLI tool.
//!
//! Usage:
//! ```bash
//! boundaries describe-element <PATH>
//! boundaries describe-dependency <FROM> <SOURCE> [--resolved <PATH>]
//! boundaries check <EDGES.json> [--cache <FILE>]
//! boundaries elements [ROOT]
//! boundaries list-rules
//! boundaries init
//! ```

use anyhow::Result;
use boundaries_core::ImportKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Architecture boundaries between the elements of a project
#[derive(Parser)]
#[command(name = "boundaries")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "BOUNDARIES_CONFIG")]
    config: Option<PathBuf>,

    /// Project directory used to look up the configuration
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a project-relative path
    DescribeElement {
        /// Path of the file, relative to the project root
        path: String,
    },

    /// Describe one import of a file
    DescribeDependency {
        /// Path of the importing file
        from: String,

        /// Import specifier as written in source
        source: String,

        /// Path the specifier resolves to
        #[arg(long)]
        resolved: Option<String>,

        /// Import kind
        #[arg(long, default_value = "value")]
        kind: ImportKind,

        /// Imported names (can be specified multiple times)
        #[arg(long = "specifier")]
        specifiers: Vec<String>,
    },

    /// Check a list of dependency edges
    Check {
        /// JSON file with an array of `{file, source, resolved, kind, specifiers}`
        edges: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Cache snapshot to restore before and persist after the check
        #[arg(long)]
        cache: Option<PathBuf>,
    },

    /// Classify every file below a directory
    Elements {
        /// Directory to walk (default: current directory)
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the rules enabled by the configuration
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for command results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let project = cli.project;
    let explicit = cli.config;
    let engine = || config_resolver::resolve_engine(&project, explicit.as_deref());

    match cli.command {
        Commands::DescribeElement { path } => commands::describe::element(&engine()?, &path),
        Commands::DescribeDependency {
            from,
            source,
            resolved,
            kind,
            specifiers,
        } => {
            commands::describe::dependency(&engine()?, &from, &source, resolved, kind, specifiers)
        }
        Commands::Check {
            edges,
            format,
            cache,
        } => commands::check::run(&engine()?, &edges, format, cache.as_deref()),
        Commands::Elements { root, format } => commands::elements::run(&engine()?, &root, format),
        Commands::ListRules => commands::list_rules::run(&engine()?),
        Commands::Init { force } => commands::init::run(&project, force),
    }
}
