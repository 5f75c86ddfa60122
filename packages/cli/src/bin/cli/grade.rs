// ABOUTME: CLI commands for grading submissions with an autograder container
// ABOUTME: `grade local` runs the grader image on this machine and reports what it produced

use anyhow::{Context, Result};
use autograder_config::Config;
use autograder_grade::{
    DockerRuntime, ExitStatus, GradeError, GradingRun, Reporter, RunOutcome, Supervisor,
    Verbosity,
};
use clap::{Args, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::utils::fully_qualified_dir;

/// Long help for the `grade` command
pub const GRADE_LONG_ABOUT: &str = "\
Grade assignments with an autograder container.

Beware: the production grading environment uses a defense-in-depth strategy \
to protect against security vulnerabilities. Some of these layers are not \
reproducible outside of that environment.";

/// Longest grading timeout accepted on the command line (one day)
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

#[derive(Subcommand, Debug)]
pub enum GradeCommands {
    /// Grade a submission from the local file system in a local container
    Local(LocalArgs),
}

#[derive(Args, Debug)]
pub struct LocalArgs {
    /// Time out the grader after TIMEOUT seconds [default: 300]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS))]
    pub timeout: Option<u64>,

    /// Memory allocated to the grader in MB, a multiple of 1024 [default: 1024]
    #[arg(long = "mem-limit")]
    pub mem_limit: Option<u64>,

    /// Number of CPUs reserved for the grader (1, 2 or 4)
    #[arg(long)]
    pub cpu: Option<u32>,

    /// Do not clean up the container after grading completes
    #[arg(long)]
    pub no_rm: bool,

    /// Destination directory for the container output
    #[arg(long, default_value = ".", value_parser = fully_qualified_dir)]
    pub dst_dir: PathBuf,

    /// Container image tag or id of the grader
    #[arg(value_name = "containerTag")]
    pub container_tag: String,

    /// Directory containing the submission
    #[arg(value_parser = fully_qualified_dir)]
    pub dir: PathBuf,

    /// JSON environment passed into the container
    #[arg(value_name = "envVar")]
    pub env_var: String,
}

impl LocalArgs {
    /// Flags win over configured defaults
    pub fn grading_run(&self, config: &Config) -> GradingRun {
        GradingRun {
            image: self.container_tag.clone(),
            submission_dir: self.dir.clone(),
            environment: self.env_var.clone(),
            memory_mb: self.mem_limit.unwrap_or(config.grade_mem_limit_mb),
            cpus: self.cpu,
            timeout: Duration::from_secs(self.timeout.unwrap_or(config.grade_timeout_secs)),
            dst_dir: self.dst_dir.clone(),
            keep_container: self.no_rm,
        }
    }
}

impl GradeCommands {
    pub async fn execute(&self, config: &Config, verbosity: Verbosity) -> Result<ExitStatus> {
        match self {
            GradeCommands::Local(args) => local_command(args, config, verbosity).await,
        }
    }
}

async fn local_command(args: &LocalArgs, config: &Config, verbosity: Verbosity) -> Result<ExitStatus> {
    let run = args.grading_run(config);

    let runtime = DockerRuntime::connect(api_timeout(run.timeout, config.docker_api_grace_secs))
        .context("Failed to connect to the Docker daemon")?;
    let result = Supervisor::new(Arc::new(runtime)).run(&run).await;

    let mut stdout = io::stdout().lock();
    conclude(result, &Reporter::new(verbosity), &mut stdout)
}

/// Request timeout for the Docker client: the grading timeout plus a grace period
fn api_timeout(grading_timeout: Duration, grace_secs: u64) -> Duration {
    grading_timeout.saturating_add(Duration::from_secs(grace_secs))
}

/// Map a finished grading run onto the process exit status.
///
/// Only a container creation failure escapes as an error; every other grading
/// error has already been logged by the supervisor and simply fails the run.
fn conclude<W: Write>(
    result: autograder_grade::Result<RunOutcome>,
    reporter: &Reporter,
    out: &mut W,
) -> Result<ExitStatus> {
    match result {
        Ok(outcome) => reporter
            .report(&outcome, out)
            .context("Failed to write the grader output"),
        Err(e @ GradeError::ContainerCreation(_)) => Err(e.into()),
        Err(e) => {
            debug!("Grading run aborted: {:?}", e);
            Ok(ExitStatus::Failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autograder_grade::{translate_memory, FeedbackClass, GradingResult, RuntimeError, Score};
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: GradeCommands,
    }

    fn parse(args: &[&str]) -> Result<LocalArgs, clap::Error> {
        let mut argv = vec!["grade"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).map(|cli| match cli.command {
            GradeCommands::Local(args) => args,
        })
    }

    #[test]
    fn test_defaults_come_from_config() {
        let submission = TempDir::new().unwrap();
        let dir = submission.path().to_str().unwrap();
        let args = parse(&["local", "myimageId", dir, "{}"]).unwrap();

        let run = args.grading_run(&Config::default());

        assert_eq!(run.image, "myimageId");
        assert_eq!(run.submission_dir, submission.path().canonicalize().unwrap());
        assert_eq!(run.environment, "{}");
        assert_eq!(run.memory_mb, 1024);
        assert_eq!(run.timeout, Duration::from_secs(300));
        assert_eq!(run.cpus, None);
        assert!(!run.keep_container);
        assert!(run.dst_dir.is_absolute());
    }

    #[test]
    fn test_flags_override_config() {
        let submission = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let args = parse(&[
            "local",
            "--timeout",
            "60",
            "--mem-limit",
            "2048",
            "--cpu",
            "2",
            "--no-rm",
            "--dst-dir",
            dst.path().to_str().unwrap(),
            "grader:v1",
            submission.path().to_str().unwrap(),
            r#"{"partId":"abc"}"#,
        ])
        .unwrap();

        let config = Config {
            grade_timeout_secs: 900,
            grade_mem_limit_mb: 4096,
            ..Config::default()
        };
        let run = args.grading_run(&config);

        assert_eq!(run.timeout, Duration::from_secs(60));
        assert_eq!(run.memory_mb, 2048);
        assert_eq!(run.cpus, Some(2));
        assert!(run.keep_container);
        assert_eq!(run.dst_dir, dst.path().canonicalize().unwrap());
    }

    #[test]
    fn test_configured_defaults_apply_without_flags() {
        let submission = TempDir::new().unwrap();
        let args = parse(&["local", "img", submission.path().to_str().unwrap(), "{}"]).unwrap();

        let config = Config {
            grade_timeout_secs: 42,
            grade_mem_limit_mb: 3072,
            ..Config::default()
        };
        let run = args.grading_run(&config);

        assert_eq!(run.timeout, Duration::from_secs(42));
        assert_eq!(run.memory_mb, 3072);
    }

    #[test]
    fn test_missing_submission_dir_is_rejected() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("missing");
        assert!(parse(&["local", "img", missing.to_str().unwrap(), "{}"]).is_err());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let submission = TempDir::new().unwrap();
        let result = parse(&[
            "local",
            "--timeout",
            "0",
            "img",
            submission.path().to_str().unwrap(),
            "{}",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_above_one_day_is_rejected() {
        let submission = TempDir::new().unwrap();
        let dir = submission.path().to_str().unwrap();

        let max = MAX_TIMEOUT_SECS.to_string();
        assert!(parse(&["local", "--timeout", max.as_str(), "img", dir, "{}"]).is_ok());

        let above = (MAX_TIMEOUT_SECS + 1).to_string();
        assert!(parse(&["local", "--timeout", above.as_str(), "img", dir, "{}"]).is_err());

        let huge = u64::MAX.to_string();
        assert!(parse(&["local", "--timeout", huge.as_str(), "img", dir, "{}"]).is_err());
    }

    #[test]
    fn test_api_timeout_adds_grace() {
        assert_eq!(api_timeout(Duration::from_secs(300), 30), Duration::from_secs(330));
    }

    #[test]
    fn test_api_timeout_saturates_for_huge_configured_timeouts() {
        let timeout = api_timeout(Duration::from_secs(u64::MAX), 30);
        assert_eq!(timeout, Duration::MAX);
    }

    fn outcome(exit_code: i64, feedback: FeedbackClass) -> RunOutcome {
        RunOutcome {
            exit_code,
            feedback,
            stdout: "grading...\n".to_string(),
            stderr: String::new(),
        }
    }

    fn valid() -> FeedbackClass {
        FeedbackClass::Valid(GradingResult {
            score: Score::Correctness(true),
            feedback: "ok".to_string(),
        })
    }

    #[rstest]
    #[case(outcome(0, valid()), ExitStatus::Success)]
    #[case(outcome(1, valid()), ExitStatus::Failure)]
    #[case(outcome(0, FeedbackClass::Missing("no such file".to_string())), ExitStatus::Failure)]
    fn test_completed_run_is_reported(#[case] run: RunOutcome, #[case] expected: ExitStatus) {
        let mut sink = Vec::new();
        let status = conclude(Ok(run), &Reporter::new(Verbosity::Warning), &mut sink).unwrap();

        assert_eq!(status, expected);
        assert!(String::from_utf8(sink).unwrap().contains("grading...\n"));
    }

    #[rstest]
    #[case(GradeError::Timeout { seconds: 5 })]
    #[case(GradeError::MemoryFormat(translate_memory(1500).unwrap_err()))]
    #[case(GradeError::InvalidEnvironment("not JSON".to_string()))]
    #[case(GradeError::ContainerStart(RuntimeError::Container("exec format error".to_string())))]
    #[case(GradeError::Wait(RuntimeError::Connection("daemon went away".to_string())))]
    fn test_aborted_run_fails_without_output(#[case] error: GradeError) {
        let mut sink = Vec::new();
        let status = conclude(Err(error), &Reporter::new(Verbosity::Debug), &mut sink).unwrap();

        assert_eq!(status, ExitStatus::Failure);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_creation_failure_reaches_main() {
        let mut sink = Vec::new();
        let error = GradeError::ContainerCreation(RuntimeError::NotFound(
            "No such image: myimageId".to_string(),
        ));

        let err = conclude(Err(error), &Reporter::new(Verbosity::Warning), &mut sink).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<GradeError>(),
            Some(GradeError::ContainerCreation(_))
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_env_var_is_required() {
        let submission = TempDir::new().unwrap();
        assert!(parse(&["local", "img", submission.path().to_str().unwrap()]).is_err());
    }
}
