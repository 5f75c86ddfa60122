// ABOUTME: Docker implementation of the container runtime used for local grading
// ABOUTME: Uses bollard to create, wait on, inspect and remove grader containers

use super::{ContainerHandle, ContainerRuntime, Result, RuntimeConfig};
use crate::environment::to_assignments;
use crate::error::RuntimeError;
use async_trait::async_trait;
use bollard::{
    container::{
        Config, CreateContainerOptions, DownloadFromContainerOptions, KillContainerOptions,
        LogOutput, LogsOptions, RemoveContainerOptions, StartContainerOptions,
        WaitContainerOptions,
    },
    errors::Error as BollardError,
    models::HostConfig,
    Docker,
};
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct DockerRuntime {
    client: Docker,
}

impl DockerRuntime {
    /// Connect to the local Docker daemon (honours `DOCKER_HOST`).
    ///
    /// `api_timeout` bounds every HTTP request to the daemon, so it must be
    /// longer than the grading timeout or the wait call is cut short.
    pub fn connect(api_timeout: Duration) -> Result<Self> {
        let client = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::Connection(e.to_string()))?
            .with_timeout(api_timeout);

        Ok(Self { client })
    }

    /// Check that the daemon answers
    pub async fn ping(&self) -> Result<()> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeError::Connection(e.to_string()))?;
        Ok(())
    }

    /// Convert our config to bollard config
    fn to_bollard_config(config: &RuntimeConfig) -> Config<String> {
        let host_config = HostConfig {
            binds: Some(vec![config.mount.to_bind_string()]),
            network_mode: Some(config.network_mode.as_docker_mode().to_string()),
            memory: Some(config.memory.bytes()),
            memory_swap: Some(config.memory_swap.bytes()),
            nano_cpus: config.cpu.map(|cpu| cpu.nano_cpus()),
            cpu_shares: config.cpu.map(|cpu| cpu.reserved_units() as i64),
            ..Default::default()
        };

        Config {
            image: Some(config.image.clone()),
            env: Some(to_assignments(&config.environment)),
            labels: Some(config.labels.clone()),
            host_config: Some(host_config),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            tty: Some(false),
            ..Default::default()
        }
    }
}

fn map_error(e: BollardError) -> RuntimeError {
    match e {
        BollardError::DockerResponseServerError {
            status_code: 404,
            message,
        } => RuntimeError::NotFound(message),
        other => RuntimeError::Container(other.to_string()),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create(&self, config: &RuntimeConfig) -> Result<ContainerHandle> {
        debug!("Creating container from image {}", config.image);

        let response = self
            .client
            .create_container(
                None::<CreateContainerOptions<String>>,
                Self::to_bollard_config(config),
            )
            .await
            .map_err(map_error)?;

        for warning in &response.warnings {
            warn!("Docker: {}", warning);
        }

        info!("Created container {}", response.id);
        Ok(ContainerHandle::new(response.id))
    }

    async fn start(&self, handle: &ContainerHandle) -> Result<()> {
        debug!("Starting container {}", handle);

        self.client
            .start_container(handle.id(), None::<StartContainerOptions<String>>)
            .await
            .map_err(map_error)?;

        Ok(())
    }

    async fn wait(&self, handle: &ContainerHandle, timeout: Duration) -> Result<i64> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };
        let mut stream = Box::pin(self.client.wait_container(handle.id(), Some(options)));

        match tokio::time::timeout(timeout, stream.next()).await {
            Err(_) => Err(RuntimeError::Timeout(timeout)),
            Ok(Some(Ok(response))) => Ok(response.status_code),
            // bollard reports a non-zero exit status as an error
            Ok(Some(Err(BollardError::DockerContainerWaitError { code, .. }))) => Ok(code),
            Ok(Some(Err(e))) => Err(map_error(e)),
            Ok(None) => Err(RuntimeError::Container(format!(
                "wait on container {} returned no status",
                handle
            ))),
        }
    }

    async fn kill(&self, handle: &ContainerHandle) -> Result<()> {
        match self
            .client
            .kill_container(handle.id(), None::<KillContainerOptions<String>>)
            .await
        {
            Ok(_) => Ok(()),
            // Container already stopped
            Err(BollardError::DockerResponseServerError {
                status_code: 409, ..
            }) => {
                debug!("Container {} was not running", handle);
                Ok(())
            }
            Err(e) => Err(map_error(e)),
        }
    }

    async fn remove(&self, handle: &ContainerHandle) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };

        match self.client.remove_container(handle.id(), Some(options)).await {
            Ok(_) => Ok(()),
            Err(BollardError::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                debug!("Container {} already removed", handle);
                Ok(())
            }
            Err(e) => Err(map_error(e)),
        }
    }

    async fn logs(
        &self,
        handle: &ContainerHandle,
        stdout: bool,
        stderr: bool,
    ) -> Result<Vec<u8>> {
        let options = LogsOptions::<String> {
            stdout,
            stderr,
            follow: false,
            tail: "all".to_string(),
            ..Default::default()
        };

        let mut stream = Box::pin(self.client.logs(handle.id(), Some(options)));
        let mut output = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk.map_err(map_error)? {
                LogOutput::StdOut { message }
                | LogOutput::StdErr { message }
                | LogOutput::Console { message } => output.extend_from_slice(&message),
                LogOutput::StdIn { .. } => {}
            }
        }

        Ok(output)
    }

    async fn get_archive(&self, handle: &ContainerHandle, path: &str) -> Result<Vec<u8>> {
        debug!("Copying {}:{} out of the container", handle, path);

        let options = DownloadFromContainerOptions {
            path: path.to_string(),
        };
        let mut stream = Box::pin(self.client.download_from_container(handle.id(), Some(options)));

        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(map_error)?;
            data.extend_from_slice(&bytes);
        }

        Ok(data)
    }
}
