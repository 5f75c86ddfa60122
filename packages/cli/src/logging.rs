// ABOUTME: Tracing subscriber setup for the autograder binary
// ABOUTME: Honours AUTOGRADER_LOG when set, otherwise derives the filter from -v/-q flags

use autograder_config::Config;
use autograder_grade::Verbosity;
use tracing_subscriber::EnvFilter;

/// Crates whose log lines follow the verbosity flags; everything else stays at warn
const OWN_TARGETS: &[&str] = &["autograder", "autograder_cli", "autograder_grade"];

/// Filter directive for a verbosity level.
///
/// Above warning, only our own crates get louder so `-vv` does not flood the
/// terminal with HTTP client chatter.
pub fn filter_directive(verbosity: Verbosity) -> String {
    let level = verbosity.as_filter();
    if verbosity <= Verbosity::Warning {
        return level.to_string();
    }

    let mut directive = String::from("warn");
    for target in OWN_TARGETS {
        directive.push_str(&format!(",{}={}", target, level));
    }
    directive
}

fn env_filter(verbosity: Verbosity, config: &Config) -> EnvFilter {
    config
        .log_filter
        .as_deref()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(filter_directive(verbosity)))
}

/// Install the global subscriber. Logs go to stderr so the transcript on
/// stdout stays clean.
pub fn init_tracing(verbosity: Verbosity, config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity, config))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
