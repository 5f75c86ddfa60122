// ABOUTME: Local grading for autograder containers
// ABOUTME: Runs a grader image against a submission, validates feedback.json and reports the outcome

pub mod artifact;
pub mod environment;
pub mod error;
pub mod feedback;
pub mod outcome;
pub mod report;
pub mod resources;
pub mod runtime;
pub mod supervisor;

// Re-export commonly used types
pub use error::{GradeError, Result, RuntimeError};
pub use feedback::{validate, Defect, GradingResult, Score, FEEDBACK_FILE_NAME};
pub use outcome::{ExitStatus, FeedbackClass, RunOutcome};
pub use report::{Reporter, Verbosity};
pub use resources::{translate_cpus, translate_memory, CpuQuota, MemoryLimit};
pub use runtime::{ContainerHandle, ContainerRuntime, DockerRuntime, RuntimeConfig};
pub use supervisor::{GradingRun, Supervisor};
