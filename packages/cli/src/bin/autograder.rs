use autograder_cli::logging::init_tracing;
use autograder_config::Config;
use autograder_grade::{ExitStatus, Verbosity};
use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use std::process::ExitCode;
use tracing::debug;

mod cli;

use cli::grade::{GradeCommands, GRADE_LONG_ABOUT};

#[derive(Parser)]
#[command(name = "autograder")]
#[command(about = "Autograder CLI - build and test programming assignment graders")]
#[command(version)]
struct Cli {
    /// Show more output (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade assignments with an autograder container
    #[command(subcommand, long_about = GRADE_LONG_ABOUT)]
    Grade(GradeCommands),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(verbosity, &config);
    debug!(?config, "Loaded configuration");

    match handle_command(cli.command, &config, verbosity).await {
        Ok(status) => status.into(),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn handle_command(
    command: Commands,
    config: &Config,
    verbosity: Verbosity,
) -> anyhow::Result<ExitStatus> {
    match command {
        Commands::Grade(grade_cmd) => grade_cmd.execute(config, verbosity).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&[], Verbosity::Warning)]
    #[case(&["-v"], Verbosity::Info)]
    #[case(&["-vv"], Verbosity::Debug)]
    #[case(&["-q"], Verbosity::Error)]
    fn test_verbosity_flags(#[case] flags: &[&str], #[case] expected: Verbosity) {
        let submission = TempDir::new().unwrap();
        let mut argv = vec!["autograder"];
        argv.extend_from_slice(flags);
        argv.extend(["grade", "local", "img", submission.path().to_str().unwrap(), "{}"]);

        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(Verbosity::from_flags(cli.verbose, cli.quiet), expected);
    }

    #[test]
    fn test_verbose_after_subcommand_is_accepted() {
        let submission = TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "autograder",
            "grade",
            "local",
            "-v",
            "img",
            submission.path().to_str().unwrap(),
            "{}",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let submission = TempDir::new().unwrap();
        let result = Cli::try_parse_from([
            "autograder",
            "-q",
            "-v",
            "grade",
            "local",
            "img",
            submission.path().to_str().unwrap(),
            "{}",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_grade_help_carries_environment_warning() {
        let mut command = Cli::command();
        let grade = command.find_subcommand_mut("grade").unwrap();
        let help = grade.render_long_help().to_string();
        assert!(help.contains("defense-in-depth"));
    }
}
