// ABOUTME: Orchestrates one local grading run through the full container lifecycle
// ABOUTME: Guarantees the container is removed on every path once it has been created

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::artifact;
use crate::environment::parse_environment;
use crate::error::{GradeError, Result, RuntimeError};
use crate::feedback::{validate, FEEDBACK_FILE_NAME};
use crate::outcome::{FeedbackClass, RunOutcome};
use crate::resources::{translate_cpus, translate_memory};
use crate::runtime::{ContainerHandle, ContainerRuntime, RuntimeConfig, SHARED_DIR};

/// One `grade local` invocation
#[derive(Debug, Clone)]
pub struct GradingRun {
    pub image: String,
    pub submission_dir: PathBuf,
    /// JSON payload describing the container environment
    pub environment: String,
    pub memory_mb: u64,
    pub cpus: Option<u32>,
    pub timeout: Duration,
    pub dst_dir: PathBuf,
    /// Leave the container in place for post-mortem inspection
    pub keep_container: bool,
}

impl GradingRun {
    /// Build the runtime configuration; fails before anything is allocated
    pub fn runtime_config(&self) -> Result<RuntimeConfig> {
        let memory = translate_memory(self.memory_mb)?;
        let cpu = self.cpus.map(translate_cpus).transpose()?;
        let environment = parse_environment(&self.environment)?;

        Ok(RuntimeConfig::new(
            &self.image,
            self.submission_dir.clone(),
            memory,
            cpu,
            environment,
        ))
    }
}

pub struct Supervisor {
    runtime: Arc<dyn ContainerRuntime>,
}

impl Supervisor {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Run the grader once and classify what it produced.
    ///
    /// Timeouts, start failures and wait failures are returned as errors after
    /// the container has been killed (timeout only) and removed.
    pub async fn run(&self, run: &GradingRun) -> Result<RunOutcome> {
        let config = run.runtime_config().inspect_err(|e| error!("{}", e))?;
        debug!(?config, "Runtime configuration");

        let handle = self.runtime.create(&config).await.map_err(|e| {
            error!(
                "Could not set up the container to run the grade command in. Most \
                 likely, this means that you specified an inappropriate container id."
            );
            GradeError::ContainerCreation(e)
        })?;

        let result = self.supervise(&handle, run).await;

        if run.keep_container {
            info!("Leaving container {} in place (--no-rm)", handle);
        } else {
            self.cleanup(&handle).await;
        }

        result
    }

    async fn supervise(&self, handle: &ContainerHandle, run: &GradingRun) -> Result<RunOutcome> {
        self.runtime.start(handle).await.map_err(|e| {
            error!("Failed to start container {}: {}", handle, e);
            GradeError::ContainerStart(e)
        })?;

        let exit_code = match self.runtime.wait(handle, run.timeout).await {
            Ok(code) => code,
            Err(RuntimeError::Timeout(_)) => {
                let seconds = run.timeout.as_secs();
                error!(
                    "The grader did not complete within the required timeout of {} seconds.",
                    seconds
                );
                debug!("About to terminate the container: {}", handle);
                match self.runtime.kill(handle).await {
                    Ok(()) => debug!("Successfully killed the container."),
                    Err(e) => error!("Failed to kill container {}: {}", handle, e),
                }
                return Err(GradeError::Timeout { seconds });
            }
            Err(e) => {
                error!("Lost track of container {} while waiting: {}", handle, e);
                return Err(GradeError::Wait(e));
            }
        };
        debug!("Container {} exited with code {}", handle, exit_code);

        let artifact = self.retrieve_feedback(handle, run).await;
        let stderr = self.collect_logs(handle, false, true).await;
        let stdout = self.collect_logs(handle, true, false).await;

        let feedback = match artifact {
            Ok(bytes) => match validate(&bytes) {
                Ok(result) => FeedbackClass::Valid(result),
                Err(defect) => FeedbackClass::Defective(defect),
            },
            Err(reason) => FeedbackClass::Missing(reason),
        };

        Ok(RunOutcome {
            exit_code,
            feedback,
            stdout,
            stderr,
        })
    }

    /// Copy feedback.json out of the container and into the destination directory
    async fn retrieve_feedback(
        &self,
        handle: &ContainerHandle,
        run: &GradingRun,
    ) -> std::result::Result<Vec<u8>, String> {
        let path = format!("{}/{}", SHARED_DIR, FEEDBACK_FILE_NAME);

        let archive = self
            .runtime
            .get_archive(handle, &path)
            .await
            .map_err(|e| e.to_string())?;
        let contents =
            artifact::extract_file(&archive, FEEDBACK_FILE_NAME).map_err(|e| e.to_string())?;
        let written = artifact::persist(&run.dst_dir, FEEDBACK_FILE_NAME, &contents)
            .map_err(|e| format!("could not write to {}: {}", run.dst_dir.display(), e))?;

        debug!("Wrote grader feedback to {}", written.display());
        Ok(contents)
    }

    async fn collect_logs(&self, handle: &ContainerHandle, stdout: bool, stderr: bool) -> String {
        match self.runtime.logs(handle, stdout, stderr).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("Could not read container logs: {}", e);
                String::new()
            }
        }
    }

    async fn cleanup(&self, handle: &ContainerHandle) {
        debug!("About to remove container: {}", handle);
        match self.runtime.remove(handle).await {
            Ok(()) => debug!("Successfully cleaned up the container."),
            Err(e) => error!("Failed to remove container {}: {}", handle, e),
        }
    }
}
