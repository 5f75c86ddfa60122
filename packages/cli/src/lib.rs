// ABOUTME: Shared setup for the autograder command-line tool
// ABOUTME: Installs the tracing subscriber that every subcommand logs through

pub mod logging;
