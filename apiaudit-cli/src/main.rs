//! apiaudit CLI - Public API change auditing for Python packages
//!
//! Extracts canonical reports of a package's public surface and turns the
//! differences between two reports into a changelog draft.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;
mod provision;
mod pypi;

use commands::report::VersionSelection;
use commands::AuditSettings;
use config::AuditConfig;
use output::{OutputConfig, OutputFormat};

/// Public API change auditing for Python packages.
#[derive(Parser)]
#[command(name = "apiaudit")]
#[command(author, version)]
#[command(about = "Public API change auditing for Python packages")]
#[command(after_help = "Examples:
  apiaudit report azure-mgmt-shop                       Report the installed package
  apiaudit report azure-mgmt-shop --version 1.0.0       Report a provisioned version
  apiaudit changelog old/report.json new/report.json    Changelog between two reports
  apiaudit changelog azure-mgmt-shop:pypi azure-mgmt-shop:latest")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Same as --verbose
    #[arg(long, global = true, hide = true)]
    debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Minified JSON output
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and write public API reports
    Report {
        /// Package name, optionally with a submodule: `package-name#sub.module`
        input: String,

        /// Report this version from its provisioned environment
        #[arg(long)]
        version: Option<String>,

        /// Report every version published on PyPI
        #[arg(long)]
        pypi: bool,

        /// Report the last version published on PyPI
        #[arg(long)]
        last_pypi: bool,

        /// Write one aggregate report.json instead of one file per module
        #[arg(long = "aggregate-report")]
        aggregate: bool,

        /// Also report operation groups and data models
        #[arg(long)]
        groupings: bool,

        /// Directory searched for modules (repeatable)
        #[arg(long = "search-path")]
        search_paths: Vec<PathBuf>,

        /// Module name to skip (repeatable)
        #[arg(long)]
        denylist: Vec<String>,

        /// Directory receiving the reports
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Classify the changes between two reports as a Markdown changelog
    Changelog {
        /// Base: a report file or `<package>:<version>` (version may be `pypi` or `latest`)
        base: String,

        /// Latest: a report file or `<package>:<version>`
        latest: String,

        /// Also compare operation groups and data models
        #[arg(long)]
        groupings: bool,

        /// Directory searched for modules (repeatable)
        #[arg(long = "search-path")]
        search_paths: Vec<PathBuf>,

        /// Module name to skip (repeatable)
        #[arg(long)]
        denylist: Vec<String>,
    },

    /// List published versions of a package
    Versions {
        /// Package name on PyPI
        package: String,
    },
}

/// Initialize logging based on verbosity flags
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose || cli.debug, cli.quiet);

    let config = AuditConfig::load(std::path::Path::new("."));

    // CLI flag > config default > text
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or_default()
    });
    let mut output = OutputConfig::auto_detect(format, config.use_color());
    if cli.compact {
        output = output.compact();
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    match command {
        Commands::Report {
            input,
            version,
            pypi,
            last_pypi,
            aggregate,
            groupings,
            search_paths,
            denylist,
            output_dir,
        } => {
            let settings = AuditSettings::resolve(&config, search_paths, denylist, groupings);
            let output_dir = output_dir.unwrap_or_else(|| config.reports_dir());
            let selection = VersionSelection::from_flags(version, pypi, last_pypi);
            commands::report::run(&input, selection, aggregate, &settings, &output_dir, output).await
        }
        Commands::Changelog {
            base,
            latest,
            groupings,
            search_paths,
            denylist,
        } => {
            let settings = AuditSettings::resolve(&config, search_paths, denylist, groupings);
            commands::changelog::run(&base, &latest, &settings, output).await
        }
        Commands::Versions { package } => {
            let settings = AuditSettings::resolve(&config, Vec::new(), Vec::new(), false);
            commands::versions::run(&package, &settings, output).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_report_flags() {
        let cli = Cli::parse_from([
            "apiaudit",
            "report",
            "azure-mgmt-shop#models",
            "--last-pypi",
            "--aggregate-report",
            "--search-path",
            "a",
            "--search-path",
            "b",
            "--format",
            "json",
        ]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Some(Commands::Report {
                input,
                last_pypi,
                aggregate,
                search_paths,
                ..
            }) => {
                assert_eq!(input, "azure-mgmt-shop#models");
                assert!(last_pypi);
                assert!(aggregate);
                assert_eq!(search_paths, vec![PathBuf::from("a"), PathBuf::from("b")]);
            }
            _ => panic!("expected report command"),
        }
    }
}
