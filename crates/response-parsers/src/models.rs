//! Canonical models decoded from inspect-style JSON
//!
//! Field names follow the PascalCase keys the tools emit. Every struct is
//! lenient: missing keys take their default so one model covers every tool
//! variant after normalization.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `docker inspect <container>` / `podman inspect <container>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerDetails {
    /// Full container id
    pub id: String,
    /// Container name without the leading `/`
    pub name: String,
    /// Creation timestamp as printed
    pub created: String,
    /// Image id the container was created from
    pub image: String,
    /// Runtime state
    pub state: ContainerState,
    /// Creation-time configuration
    pub config: ContainerConfig,
}

/// Runtime state of a container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerState {
    /// `created`, `running`, `exited`, ...
    pub status: String,
    pub running: bool,
    pub paused: bool,
    pub restarting: bool,
    pub pid: i64,
    pub exit_code: i64,
    pub started_at: String,
    pub finished_at: String,
    /// Health check state; `None` when the container has no health check
    pub health: Option<HealthState>,
}

/// Health check state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HealthState {
    /// `starting`, `healthy` or `unhealthy`
    pub status: String,
    pub failing_streak: i64,
}

/// Creation-time configuration of a container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerConfig {
    pub hostname: String,
    pub image: String,
    pub working_dir: String,
    /// Always an array when present, even if the tool printed a bare string
    pub entrypoint: Option<Vec<String>>,
    /// Always an array when present, even if the tool printed a bare string
    pub cmd: Option<Vec<String>>,
    pub env: Option<Vec<String>>,
    pub labels: Option<HashMap<String, String>>,
}

/// `docker volume inspect <volume>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VolumeDetails {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
    pub created_at: String,
    pub scope: String,
    pub labels: Option<HashMap<String, String>>,
    pub options: Option<HashMap<String, String>>,
}

/// `docker network inspect <network>`, without the per-container sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NetworkSummary {
    pub name: String,
    pub id: String,
    pub created: String,
    pub scope: String,
    pub driver: String,
    #[serde(rename = "EnableIPv6")]
    pub enable_ipv6: bool,
    pub internal: bool,
    pub attachable: bool,
    pub labels: Option<HashMap<String, String>>,
}

/// One line of `ps --format` output joined with `;`
///
/// Built by [`DelimitedParser`](crate::DelimitedParser) rather than serde.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    pub image: String,
    pub command: String,
    pub created: String,
    pub status: String,
    pub ports: String,
    /// Names without the leading `/`
    pub names: Vec<String>,
}
