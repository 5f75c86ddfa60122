// ABOUTME: Container runtime trait and the immutable configuration a grading container runs with
// ABOUTME: Defines abstract interface for the grader container lifecycle

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::RuntimeError;
use crate::resources::{CpuQuota, MemoryLimit};

pub mod docker;

pub use docker::DockerRuntime;

/// Where the submission directory is mounted inside the grader container
pub const SUBMISSION_MOUNT_PATH: &str = "/shared/submission";

/// Directory the grader writes its output into
pub const SHARED_DIR: &str = "/shared";

/// Labels applied to every grading container for tracking
pub const MANAGED_LABEL: &str = "autograder.managed";
pub const IMAGE_LABEL: &str = "autograder.image";

type Result<T> = std::result::Result<T, RuntimeError>;

/// Opaque reference to a created container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle(String);

impl ContainerHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub host_path: PathBuf,
    pub container_path: String,
    pub readonly: bool,
}

impl BindMount {
    /// Docker bind specification, `host:container:mode`
    pub fn to_bind_string(&self) -> String {
        format!(
            "{}:{}:{}",
            self.host_path.display(),
            self.container_path,
            if self.readonly { "ro" } else { "rw" }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMode {
    /// No network interfaces besides loopback
    Isolated,
}

impl NetworkMode {
    pub fn as_docker_mode(&self) -> &'static str {
        match self {
            NetworkMode::Isolated => "none",
        }
    }
}

/// Configuration a grading container is created with.
///
/// Built once per run and only ever handed out by shared reference.
/// `memory_swap` always equals `memory` so the grader cannot swap.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub image: String,
    pub mount: BindMount,
    pub network_mode: NetworkMode,
    pub memory: MemoryLimit,
    pub memory_swap: MemoryLimit,
    pub cpu: Option<CpuQuota>,
    pub environment: BTreeMap<String, String>,
    pub labels: HashMap<String, String>,
}

impl RuntimeConfig {
    pub fn new(
        image: &str,
        submission_dir: PathBuf,
        memory: MemoryLimit,
        cpu: Option<CpuQuota>,
        environment: BTreeMap<String, String>,
    ) -> Self {
        let labels = HashMap::from([
            (MANAGED_LABEL.to_string(), "true".to_string()),
            (IMAGE_LABEL.to_string(), image.to_string()),
        ]);

        Self {
            image: image.to_string(),
            mount: BindMount {
                host_path: submission_dir,
                container_path: SUBMISSION_MOUNT_PATH.to_string(),
                readonly: false,
            },
            network_mode: NetworkMode::Isolated,
            memory,
            memory_swap: memory,
            cpu,
            environment,
            labels,
        }
    }
}

/// Container engine operations a grading run depends on
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create (but do not start) a container
    async fn create(&self, config: &RuntimeConfig) -> Result<ContainerHandle>;

    async fn start(&self, handle: &ContainerHandle) -> Result<()>;

    /// Block until the container stops, returning its exit code.
    ///
    /// Fails with `RuntimeError::Timeout` once `timeout` elapses.
    async fn wait(&self, handle: &ContainerHandle, timeout: Duration) -> Result<i64>;

    async fn kill(&self, handle: &ContainerHandle) -> Result<()>;

    async fn remove(&self, handle: &ContainerHandle) -> Result<()>;

    /// Fetch the container's captured output streams
    async fn logs(&self, handle: &ContainerHandle, stdout: bool, stderr: bool)
        -> Result<Vec<u8>>;

    /// Copy a path out of the container as a tar archive.
    ///
    /// Fails with `RuntimeError::NotFound` when the path does not exist.
    async fn get_archive(&self, handle: &ContainerHandle, path: &str) -> Result<Vec<u8>>;
}
