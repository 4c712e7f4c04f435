use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, Level};

use jestcheck::cli::{self, Outcome, Style};
use jestcheck::config::{self, Config, Inputs};
use jestcheck::github::GitHubClient;
use jestcheck::results::RESULTS_FILE;

/// jestcheck — Jest results as GitHub check annotations and coverage comments.
#[derive(Parser)]
#[command(name = "jestcheck", version, about)]
struct Cli {
    /// Log debug output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test command and report its results.
    Run {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// Report an existing results file without running tests.
    Publish {
        #[command(flatten)]
        inputs: Inputs,

        /// Results file (default: jest.results.json in the working directory).
        #[arg(long)]
        results: Option<PathBuf>,

        /// File holding the captured stdout of the test run.
        #[arg(long)]
        stdout: Option<PathBuf>,

        /// File holding the captured stderr of the test run.
        #[arg(long)]
        stderr: Option<PathBuf>,
    },

    /// Print the coverage table of a results file.
    Coverage {
        /// Results file (default: jest.results.json in the working directory).
        results: Option<PathBuf>,

        /// Directory file paths are shown relative to (default: current directory).
        #[arg(long)]
        working_directory: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        style: Style,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match execute(cli.command) {
        Ok(Outcome::Failed) => {
            error!("Some jest tests failed.");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> Result<Outcome> {
    match command {
        Commands::Run { inputs } => {
            let config = Config::resolve(inputs)?;
            let client = GitHubClient::new(&config.token, &config.api_url);
            cli::cmd_run(&config, &client)
        }
        Commands::Publish {
            inputs,
            results,
            stdout,
            stderr,
        } => {
            let config = Config::resolve(inputs)?;
            let client = GitHubClient::new(&config.token, &config.api_url);
            let results = results.unwrap_or_else(|| config.results_file());
            let stdout = read_log(stdout)?;
            let stderr = read_log(stderr)?;
            cli::cmd_publish(&config, &client, &results, &stdout, &stderr)
        }
        Commands::Coverage {
            results,
            working_directory,
            style,
        } => {
            let root = config::resolve_working_directory(working_directory.as_deref())?;
            let results = results.unwrap_or_else(|| root.join(RESULTS_FILE));
            print!("{}", cli::cmd_coverage(&results, &root, &style)?);
            Ok(Outcome::Passed)
        }
    }
}

fn read_log(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(&p)
            .with_context(|| format!("Failed to read {}", p.display())),
        None => Ok(String::new()),
    }
}
