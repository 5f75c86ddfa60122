// ABOUTME: Error types for local grading runs
// ABOUTME: Separates fatal configuration, container and timeout failures from runtime client errors

use std::time::Duration;
use thiserror::Error;

use crate::resources::{CpuFormatError, MemoryFormatError};

/// Errors raised by a container runtime implementation
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Could not reach the container engine
    #[error("Connection error: {0}")]
    Connection(String),

    /// The engine rejected or failed a container operation
    #[error("Container error: {0}")]
    Container(String),

    /// Container or in-container path does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The container did not stop before the deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Local I/O failure while handling runtime data
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal errors that abort a grading run
#[derive(Error, Debug)]
pub enum GradeError {
    #[error(transparent)]
    MemoryFormat(#[from] MemoryFormatError),

    #[error(transparent)]
    CpuFormat(#[from] CpuFormatError),

    #[error("envVar was not a valid JSON document: {0}")]
    InvalidEnvironment(String),

    #[error("Could not set up the container to run the grade command in: {0}")]
    ContainerCreation(#[source] RuntimeError),

    #[error("Container failed to start: {0}")]
    ContainerStart(#[source] RuntimeError),

    #[error("The grader did not complete within the required timeout of {seconds} seconds.")]
    Timeout { seconds: u64 },

    #[error("Failed while waiting for the grader to finish: {0}")]
    Wait(#[source] RuntimeError),
}

impl GradeError {
    /// True for errors detected before any container was created
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GradeError::MemoryFormat(_)
                | GradeError::CpuFormat(_)
                | GradeError::InvalidEnvironment(_)
        )
    }
}

/// Type alias for Results that return GradeError
pub type Result<T> = std::result::Result<T, GradeError>;
