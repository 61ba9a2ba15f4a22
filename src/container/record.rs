use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::hosts;

use super::{ContainerID, K8sInfo, RawContainer, Result};

/// Normalized metadata of one container.
///
/// Records are built by [`ContainerRecord::create_info_detail`] and shared
/// read-only (`Arc<ContainerRecord>`) between the registry and its callers.
/// An update replaces the whole record; only the deletion marker is managed
/// by the registry in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    id: ContainerID,
    /// Display name: the Kubernetes container name when orchestrated, else
    /// the runtime name without its leading `/`.
    pub name: String,
    /// Name exactly as reported by the runtime.
    pub raw_name: String,
    pub image_name: String,
    pub driver: String,
    pub log_path: String,
    pub root_path: String,
    pub hosts_path: String,
    pub hostname: String,
    /// Resolved address; empty if it could not be resolved.
    pub ip: String,
    pub labels: HashMap<String, String>,
    pub env: HashMap<String, String>,
    pub k8s: K8sInfo,
    deleted_at: Option<SystemTime>,
}

impl ContainerRecord {
    /// Builds a record from a runtime inspect document.
    ///
    /// Missing fields default to empty strings and maps. The address is taken
    /// from the runtime's network settings or looked up in the container's
    /// hosts file by hostname (falling back to the short id). With
    /// `prefer_host_network`, or for containers in the host network mode, the
    /// hosts file is consulted first.
    ///
    /// `hosts_path_override` replaces the hosts file path from the document,
    /// e.g. when the host filesystem is mounted under a different root.
    ///
    /// # Errors
    ///
    /// Returns [`super::Error::InvalidContainerID`] if the document carries no
    /// usable id.
    pub fn create_info_detail(
        raw: &RawContainer,
        hosts_path_override: Option<&Path>,
        prefer_host_network: bool,
    ) -> Result<Self> {
        let id = ContainerID::new(&raw.id)?;
        let config = raw.config.clone().unwrap_or_default();
        let labels = config.labels.unwrap_or_default();
        let env = parse_env(config.env.as_deref().unwrap_or_default());
        let k8s = K8sInfo::detect(
            &raw.name,
            &labels,
            raw.k8s_labels.clone().unwrap_or_default(),
        );

        let hosts_file = hosts_path_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&raw.hosts_path));
        let token = if config.hostname.is_empty() {
            id.short_id()
        } else {
            config.hostname.as_str()
        };
        let ip = resolve_ip(
            raw.runtime_ip().unwrap_or_default(),
            || {
                if hosts_file.as_os_str().is_empty() {
                    String::new()
                } else {
                    hosts::resolve_ip(&hosts_file, token)
                }
            },
            prefer_host_network || raw.uses_host_network(),
        );
        if ip.is_empty() {
            log::debug!("no address resolved for container `{}`", id);
        }

        let trimmed_name = raw.name.trim_start_matches('/');
        let name = if k8s.container_name.is_empty() {
            trimmed_name.to_owned()
        } else {
            k8s.container_name.clone()
        };
        let image_name = if config.image.is_empty() {
            raw.image.clone()
        } else {
            config.image
        };

        Ok(Self {
            id,
            name,
            raw_name: raw.name.clone(),
            image_name,
            driver: raw.driver.clone(),
            log_path: raw.log_path.clone(),
            root_path: raw.root_path(),
            hosts_path: raw.hosts_path.clone(),
            hostname: config.hostname,
            ip,
            labels,
            env,
            k8s,
            deleted_at: None,
        })
    }

    pub fn id(&self) -> &ContainerID {
        &self.id
    }

    /// Time the container was first observed missing from a full snapshot.
    pub fn deleted_at(&self) -> Option<SystemTime> {
        self.deleted_at
    }

    pub fn is_pending_deletion(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub(crate) fn set_deleted_at(&mut self, deleted_at: Option<SystemTime>) {
        self.deleted_at = deleted_at;
    }
}

fn resolve_ip(runtime_ip: &str, from_hosts: impl FnOnce() -> String, hosts_first: bool) -> String {
    if hosts_first {
        let ip = from_hosts();
        if ip.is_empty() {
            runtime_ip.to_owned()
        } else {
            ip
        }
    } else if runtime_ip.is_empty() {
        from_hosts()
    } else {
        runtime_ip.to_owned()
    }
}

/// Splits `KEY=VALUE` entries on the first `=`. Entries without a value map
/// to an empty string; later duplicates win.
fn parse_env(entries: &[String]) -> HashMap<String, String> {
    entries
        .iter()
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => (key.to_owned(), value.to_owned()),
            None => (entry.clone(), String::new()),
        })
        .collect()
}
