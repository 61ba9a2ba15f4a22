//! Process configuration, read from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `ROOTFS_MOUNT_PATH` | `/` |
//! | `DOCKER_ROOT` | `/var/lib/docker` |
//! | `CONTAINER_DELETION_GRACE_PERIOD_SECS` | `300` |
//! | `DISCOVERY_INTERVAL_SECS` | `10` |
//! | `PREFER_HOST_NETWORK` | `false` |
//! | `COLLECTION_PROJECT` | empty |
//! | `COLLECTION_CONFIG_NAME` | `default` |
//! | `HOST_IP` | resolved from `<rootfs>/etc/hosts` |
//! | `INCLUDE_LABELS`, `EXCLUDE_LABELS`, `INCLUDE_ENV`, `EXCLUDE_ENV`, `INCLUDE_K8S_LABELS`, `EXCLUDE_K8S_LABELS` | unset |
//!
//! Filter variables hold `;`-separated `key=value` pairs. A value written as
//! `^...$` is matched as a regular expression.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::filter::FilterCriteria;
use crate::hosts;
use crate::registry::DEFAULT_DELETION_GRACE_PERIOD;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("environment variable `{var}` must be a non-negative integer, got `{value}`")]
    InvalidNumber { var: &'static str, value: String },
    #[error("environment variable `{var}` must be `true` or `false`, got `{value}`")]
    InvalidBool { var: &'static str, value: String },
    #[error("environment variable `{var}` contains an invalid `key=value` pair `{pair}`")]
    InvalidPair { var: &'static str, pair: String },
}

pub type Result<T> = std::result::Result<T, Error>;

const DEFAULT_DISCOVERY_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Config {
    /// Mount point of the host's root filesystem.
    pub rootfs: PathBuf,
    /// Docker data root as seen from the host.
    pub docker_root: PathBuf,
    pub deletion_grace_period: Duration,
    pub discovery_interval: Duration,
    pub prefer_host_network: bool,
    pub project: String,
    pub config_name: String,
    pub host_ip: Option<String>,
    pub criteria: FilterCriteria,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let pairs = |var: &'static str| {
            lookup(var)
                .map(|value| parse_pairs(var, &value))
                .transpose()
        };

        let criteria = FilterCriteria::default()
            .with_label_patterns(pairs("INCLUDE_LABELS")?, pairs("EXCLUDE_LABELS")?)
            .with_env_patterns(pairs("INCLUDE_ENV")?, pairs("EXCLUDE_ENV")?)
            .with_k8s_label_patterns(
                pairs("INCLUDE_K8S_LABELS")?,
                pairs("EXCLUDE_K8S_LABELS")?,
            );

        Ok(Self {
            rootfs: lookup("ROOTFS_MOUNT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/")),
            docker_root: lookup("DOCKER_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/var/lib/docker")),
            deletion_grace_period: parse_secs(&lookup, "CONTAINER_DELETION_GRACE_PERIOD_SECS")?
                .unwrap_or(DEFAULT_DELETION_GRACE_PERIOD),
            discovery_interval: parse_secs(&lookup, "DISCOVERY_INTERVAL_SECS")?
                .unwrap_or(DEFAULT_DISCOVERY_INTERVAL),
            prefer_host_network: parse_bool(&lookup, "PREFER_HOST_NETWORK")?.unwrap_or(false),
            project: lookup("COLLECTION_PROJECT").unwrap_or_default(),
            config_name: lookup("COLLECTION_CONFIG_NAME")
                .unwrap_or_else(|| "default".to_owned()),
            host_ip: lookup("HOST_IP").filter(|ip| !ip.is_empty()),
            criteria,
        })
    }

    /// Docker data root below [`Self::rootfs`].
    pub fn docker_state_dir(&self) -> PathBuf {
        join_below(&self.rootfs, &self.docker_root)
    }

    /// The configured host address, else the address of the host's hostname
    /// in the host's hosts file. Empty if neither is available.
    pub fn resolve_host_ip(&self) -> String {
        if let Some(ip) = &self.host_ip {
            return ip.clone();
        }
        let hostname = match std::fs::read_to_string(self.rootfs.join("etc/hostname")) {
            Ok(hostname) => hostname.trim().to_owned(),
            Err(err) => {
                log::warn!("failed to read host name: {}", err);
                return String::new();
            }
        };
        hosts::resolve_ip(self.rootfs.join("etc/hosts"), &hostname)
    }
}

fn join_below(root: &Path, path: &Path) -> PathBuf {
    root.join(path.strip_prefix("/").unwrap_or(path))
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| Error::InvalidNumber { var, value })
        })
        .transpose()
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<bool>> {
    lookup(var)
        .map(|value| {
            let parsed = match value.trim() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            };
            parsed.ok_or(Error::InvalidBool { var, value })
        })
        .transpose()
}

fn parse_pairs(var: &'static str, value: &str) -> Result<HashMap<String, String>> {
    value
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_owned(), value.trim().to_owned()))
            }
            _ => Err(Error::InvalidPair {
                var,
                pair: pair.to_owned(),
            }),
        })
        .collect()
}
