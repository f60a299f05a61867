//! Runtime gateway that shells out to the `docker` CLI.
//!
//! Listings come from `docker ps` JSON lines; single-container queries use
//! `docker inspect`, whose output is the Engine API document and is
//! normalized exactly like the API backend's.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bollard::models::ContainerInspectResponse;
use dockboard_common::constants::DOCKER_BIN;
use dockboard_common::error::{DockboardError, Result};
use dockboard_common::types::{Container, ContainerId};

use super::{ContainerSpec, RuntimeGateway};
use crate::process::{CommandOutput, run_bounded};

/// Gateway backed by the `docker` command-line client.
#[derive(Debug, Clone)]
pub struct DockerCliGateway {
    binary: PathBuf,
    timeout: Duration,
    pull_timeout: Duration,
}

impl DockerCliGateway {
    /// Locates `docker` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeUnavailable` if no `docker` binary is found.
    pub fn new(timeout: Duration, pull_timeout: Duration) -> Result<Self> {
        let binary = which::which(DOCKER_BIN)
            .map_err(|e| DockboardError::runtime(format!("{DOCKER_BIN} not found on PATH: {e}")))?;
        Ok(Self::with_binary(binary, timeout, pull_timeout))
    }

    /// Uses an explicit CLI binary.
    #[must_use]
    pub const fn with_binary(binary: PathBuf, timeout: Duration, pull_timeout: Duration) -> Self {
        Self {
            binary,
            timeout,
            pull_timeout,
        }
    }

    /// Path of the CLI binary in use.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Runs the CLI and returns stdout, classifying a non-zero exit.
    fn docker(&self, args: Vec<String>, subject: &str, timeout: Duration) -> Result<String> {
        let output = run_bounded(&self.binary, &args, timeout)?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(classify_failure(&output, subject))
        }
    }

    fn image_tags(&self, image_id: &str) -> Vec<String> {
        let args = strings(&["image", "inspect", "--format", "{{json .RepoTags}}", "--", image_id]);
        match self.docker(args, image_id, self.timeout) {
            Ok(stdout) => serde_json::from_str::<Option<Vec<String>>>(stdout.trim())
                .ok()
                .flatten()
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(image = %image_id, error = %e, "could not read image tags");
                Vec::new()
            }
        }
    }
}

impl RuntimeGateway for DockerCliGateway {
    fn backend_name(&self) -> &'static str {
        "cli"
    }

    fn list_containers(&self, include_stopped: bool) -> Result<Vec<Container>> {
        let mut args = strings(&["ps", "--no-trunc", "--format", "{{json .}}"]);
        if include_stopped {
            args.push("--all".into());
        }
        let stdout = self.docker(args, "containers", self.timeout)?;
        Ok(crate::parse::parse_ps_output(&stdout))
    }

    fn get_container(&self, id: &str) -> Result<Container> {
        let args = strings(&["inspect", "--type", "container", "--format", "{{json .}}", "--", id]);
        let stdout = self.docker(args, id, self.timeout)?;
        let inspect: ContainerInspectResponse = serde_json::from_str(stdout.trim())
            .map_err(|e| DockboardError::runtime(format!("malformed inspect output for {id}: {e}")))?;
        let tags = inspect
            .image
            .as_deref()
            .map(|image| self.image_tags(image))
            .unwrap_or_default();
        crate::convert::container_from_inspect(inspect, tags)
    }

    fn start(&self, id: &ContainerId) -> Result<()> {
        tracing::info!(id = %id, "starting container (cli)");
        self.docker(strings(&["start", "--", id.as_str()]), id.as_str(), self.timeout)
            .map(drop)
    }

    fn stop(&self, id: &ContainerId) -> Result<()> {
        tracing::info!(id = %id, "stopping container (cli)");
        self.docker(strings(&["stop", "--", id.as_str()]), id.as_str(), self.timeout)
            .map(drop)
    }

    fn restart(&self, id: &ContainerId) -> Result<()> {
        tracing::info!(id = %id, "restarting container (cli)");
        self.docker(strings(&["restart", "--", id.as_str()]), id.as_str(), self.timeout)
            .map(drop)
    }

    fn pull_image(&self, reference: &str) -> Result<()> {
        tracing::info!(image = %reference, "pulling image (cli)");
        self.docker(strings(&["pull", "--", reference]), reference, self.pull_timeout)
            .map(drop)
    }

    fn remove_container(&self, id: &ContainerId) -> Result<()> {
        tracing::info!(id = %id, "removing container (cli)");
        self.docker(strings(&["rm", "--", id.as_str()]), id.as_str(), self.timeout)
            .map(drop)
    }

    fn create_container(&self, spec: &ContainerSpec) -> Result<Container> {
        tracing::info!(name = %spec.name, image = %spec.image, "creating container (cli)");
        let stdout = self.docker(create_args(spec), &spec.name, self.timeout)?;
        let new_id = stdout
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .ok_or_else(|| DockboardError::runtime("docker create printed no container id"))?
            .to_string();
        self.get_container(&new_id)
    }
}

/// Builds the `docker create` argument list for a spec.
///
/// Caller-supplied values that the CLI would read as positionals follow a
/// `--`, so they can never be taken for options.
#[must_use]
pub fn create_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = strings(&["create", "--name", &spec.name]);
    for (port, hosts) in &spec.port_bindings {
        if hosts.is_empty() {
            args.extend(["--expose".to_string(), port.to_string()]);
        }
        for host in hosts {
            let publish = match host.host_ip.as_str() {
                "" => format!("{}:{port}", host.host_port),
                ip if ip.contains(':') => format!("[{ip}]:{}:{port}", host.host_port),
                ip => format!("{ip}:{}:{port}", host.host_port),
            };
            args.extend(["--publish".to_string(), publish]);
        }
    }
    for env in &spec.env {
        args.extend(["--env".to_string(), env.clone()]);
    }
    for bind in &spec.binds {
        args.extend(["--volume".to_string(), bind.clone()]);
    }
    for (key, value) in &spec.labels {
        args.extend(["--label".to_string(), format!("{key}={value}")]);
    }
    args.extend(["--".to_string(), spec.image.clone()]);
    args
}

fn classify_failure(output: &CommandOutput, subject: &str) -> DockboardError {
    let stderr = output.stderr.trim();
    if stderr.contains("No such container") || stderr.contains("No such object") {
        DockboardError::container_not_found(subject)
    } else if stderr.contains("Conflict") {
        DockboardError::Validation {
            message: stderr.to_string(),
        }
    } else if stderr.is_empty() {
        DockboardError::runtime(format!("docker exited with status {}", output.exit_code))
    } else {
        DockboardError::runtime(stderr.to_string())
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(ToString::to_string).collect()
}
