mod commands;
mod helpers;

use clap::Parser;
use space_core::domain::SpaceError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let space_error = error.as_space_error();
            eprintln!("{}", space_error.diagnostic_line());
            if let Some(summary_line) = space_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            space_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("space-rs".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_tracing(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "space-rs",
    version,
    about = "Spectral Analysis Clustering Explorer"
)]
struct Cli {
    /// Log stage details (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Import a spectral library folder and build the aligned data block
    Import(commands::ImportArgs),
    /// Parse one spectrum file and show its header and samples
    Inspect(commands::InspectArgs),
    /// Cluster the data block with k-means
    Kmeans(commands::KmeansArgs),
    /// Cluster the data block with DBSCAN
    Dbscan(commands::DbscanArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Import(args) => commands::run_import_command(args),
        CliCommand::Inspect(args) => commands::run_inspect_command(args),
        CliCommand::Kmeans(args) => commands::run_kmeans_command(args),
        CliCommand::Dbscan(args) => commands::run_dbscan_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Pipeline(SpaceError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<SpaceError> for CliError {
    fn from(error: SpaceError) -> Self {
        Self::Pipeline(error)
    }
}

impl CliError {
    fn as_space_error(&self) -> SpaceError {
        match self {
            Self::Usage(message) => SpaceError::invalid_input("INPUT.CLI_USAGE", message.clone()),
            Self::Pipeline(error) => error.clone(),
            Self::Internal(error) => SpaceError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, run};
    use space_core::domain::{SpaceError, SpaceErrorCategory};

    #[test]
    fn usage_errors_map_to_input_validation() {
        let error = run(["cluster"]).expect_err("unknown subcommand");
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(
            error.as_space_error().category(),
            SpaceErrorCategory::InputValidationError
        );
    }

    #[test]
    fn pipeline_errors_keep_their_placeholder() {
        let error = CliError::from(SpaceError::no_common_range("disjoint"));
        let mapped = error.as_space_error();
        assert_eq!(mapped.placeholder(), "INPUT.NO_COMMON_RANGE");
        assert_eq!(mapped.exit_code(), 2);

        let internal = CliError::from(anyhow::anyhow!("disk full"));
        assert_eq!(internal.as_space_error().exit_code(), 3);
    }

    #[test]
    fn help_is_not_an_error() {
        assert_eq!(run(["--help"]).expect("help should succeed"), 0);
    }
}
