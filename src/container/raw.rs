//! Runtime inspect documents as reported by the container runtime.
//!
//! The layout follows the Docker inspect / `config.v2.json` format. Every field
//! is optional so that partial or malformed input degrades to empty values
//! instead of failing the whole document.
use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RawContainer {
    #[serde(rename = "ID", alias = "Id")]
    pub id: String,
    pub name: String,
    pub image: String,
    pub driver: String,
    pub log_path: String,
    pub hosts_path: String,
    pub hostname_path: String,
    pub config: Option<RawConfig>,
    pub state: Option<RawState>,
    pub network_settings: Option<RawNetworkSettings>,
    pub host_config: Option<RawHostConfig>,
    pub graph_driver: Option<RawGraphDriver>,
    /// Pod labels attached by an orchestrator-aware caller; not part of the
    /// runtime document itself.
    #[serde(rename = "K8sLabels")]
    pub k8s_labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RawConfig {
    pub hostname: String,
    pub image: String,
    pub env: Option<Vec<String>>,
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RawState {
    pub running: bool,
    pub pid: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RawNetworkSettings {
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
    pub networks: Option<HashMap<String, RawNetwork>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RawNetwork {
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RawHostConfig {
    pub network_mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RawGraphDriver {
    pub name: String,
    pub data: Option<HashMap<String, String>>,
}

impl RawContainer {
    /// Minimal document carrying only an id and a name.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the runtime reports the container as running. Documents
    /// without a state section are assumed to be running.
    pub fn is_running(&self) -> bool {
        self.state.as_ref().is_none_or(|state| state.running)
    }

    pub(super) fn uses_host_network(&self) -> bool {
        self.host_config
            .as_ref()
            .is_some_and(|hc| hc.network_mode == "host")
    }

    /// The runtime-reported address: the default bridge address, else the
    /// first non-empty address ordered by network name.
    pub(super) fn runtime_ip(&self) -> Option<&str> {
        let settings = self.network_settings.as_ref()?;
        if !settings.ip_address.is_empty() {
            return Some(&settings.ip_address);
        }
        let networks = settings.networks.as_ref()?;
        let mut names: Vec<&String> = networks.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| networks[name].ip_address.as_str())
            .find(|ip| !ip.is_empty())
    }

    pub(super) fn root_path(&self) -> String {
        self.graph_driver
            .as_ref()
            .and_then(|gd| gd.data.as_ref())
            .and_then(|data| data.get("MergedDir").or_else(|| data.get("UpperDir")))
            .cloned()
            .unwrap_or_default()
    }
}
