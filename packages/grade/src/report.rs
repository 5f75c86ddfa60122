// ABOUTME: Turns a grading run outcome into the user-visible transcript and exit status
// ABOUTME: Output gating depends only on the verbosity handed in, never on global logger state

use std::io::{self, Write};
use tracing::{error, warn};

use crate::outcome::{ExitStatus, FeedbackClass, RunOutcome};

const SEPARATOR_WIDTH: usize = 80;

/// How much the user asked to see, from quietest to loudest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Error,
    Warning,
    Info,
    Debug,
}

impl Verbosity {
    /// Map `-q` / `-v` flags onto a level; warning is the default
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Verbosity::Error;
        }
        match verbose {
            0 => Verbosity::Warning,
            1 => Verbosity::Info,
            _ => Verbosity::Debug,
        }
    }

    /// Equivalent tracing filter directive
    pub fn as_filter(&self) -> &'static str {
        match self {
            Verbosity::Error => "error",
            Verbosity::Warning => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }

    pub fn shows(&self, level: Verbosity) -> bool {
        *self >= level
    }
}

pub struct Reporter {
    verbosity: Verbosity,
}

impl Reporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Render the framed transcript for an outcome
    pub fn render(&self, outcome: &RunOutcome) -> String {
        let mut transcript = String::new();

        if self.verbosity.shows(Verbosity::Info) {
            transcript.push_str("Start of standard error:\n");
            push_framed(&mut transcript, '-', &outcome.stderr);
            transcript.push_str("End of standard error\n");
        }

        if self.verbosity.shows(Verbosity::Warning) {
            transcript.push_str("Grader output:\n");
            push_framed(&mut transcript, '=', &outcome.stdout);
        }

        transcript
    }

    /// Log diagnostics, write the transcript and return the exit status
    pub fn report<W: Write>(&self, outcome: &RunOutcome, out: &mut W) -> io::Result<ExitStatus> {
        if outcome.exit_code != 0 {
            warn!(
                "The grade command did not exit cleanly within the container. Exit code: {}",
                outcome.exit_code
            );
        }

        match &outcome.feedback {
            FeedbackClass::Valid(_) => {}
            FeedbackClass::Defective(defect) => error!("{}", defect),
            FeedbackClass::Missing(reason) => {
                error!("The grader did not produce a readable feedback.json: {}", reason)
            }
        }

        out.write_all(self.render(outcome).as_bytes())?;
        out.flush()?;

        Ok(outcome.status())
    }
}

fn push_framed(transcript: &mut String, rule: char, body: &str) {
    let line: String = std::iter::repeat(rule).take(SEPARATOR_WIDTH).collect();
    transcript.push_str(&line);
    transcript.push('\n');
    transcript.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        transcript.push('\n');
    }
    transcript.push_str(&line);
    transcript.push('\n');
}
