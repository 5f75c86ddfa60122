// ABOUTME: Result of a completed grading run and the exit status derived from it
// ABOUTME: Combines the container exit code with the feedback artifact classification

use crate::feedback::{Defect, GradingResult};

/// What became of the feedback artifact
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackClass {
    Valid(GradingResult),
    Defective(Defect),
    /// The artifact could not be copied out of the container
    Missing(String),
}

impl FeedbackClass {
    pub fn is_valid(&self) -> bool {
        matches!(self, FeedbackClass::Valid(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => std::process::ExitCode::SUCCESS,
            ExitStatus::Failure => std::process::ExitCode::FAILURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub exit_code: i64,
    pub feedback: FeedbackClass,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutcome {
    /// Failure on a non-zero exit or anything short of valid feedback
    pub fn status(&self) -> ExitStatus {
        if self.exit_code == 0 && self.feedback.is_valid() {
            ExitStatus::Success
        } else {
            ExitStatus::Failure
        }
    }
}
