// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names read by the autograder CLI

// Logging
pub const AUTOGRADER_LOG: &str = "AUTOGRADER_LOG";

// Local grading defaults
pub const AUTOGRADER_GRADE_TIMEOUT_SECS: &str = "AUTOGRADER_GRADE_TIMEOUT_SECS";
pub const AUTOGRADER_GRADE_MEM_LIMIT_MB: &str = "AUTOGRADER_GRADE_MEM_LIMIT_MB";

// Docker client
pub const AUTOGRADER_DOCKER_API_GRACE_SECS: &str = "AUTOGRADER_DOCKER_API_GRACE_SECS";
pub const DOCKER_HOST: &str = "DOCKER_HOST"; // Read by bollard directly
