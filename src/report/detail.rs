use std::collections::{BTreeMap, HashMap};

use crate::container::{ContainerRecord, short_id};
use crate::error::ResultOkLogExt;

pub const CONTAINER_DATA_TYPE: &str = "container_info";
pub const CONFIG_RESULT_DATA_TYPE: &str = "container_config_result";
pub const DELETE_CONTAINERS_DATA_TYPE: &str = "delete_containers";

/// One outbound telemetry row: a timestamp and ordered key/value contents.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LogEntry {
    pub time: u32,
    pub contents: Vec<(String, String)>,
}

impl LogEntry {
    fn new(time: u32) -> Self {
        Self {
            time,
            contents: Vec::with_capacity(20),
        }
    }

    fn push(&mut self, key: &str, value: impl Into<String>) {
        self.contents.push((key.to_owned(), value.into()));
    }

    fn push_map(&mut self, key: &str, map: &HashMap<String, String>) {
        let sorted: BTreeMap<&String, &String> = map.iter().collect();
        if let Some(json) = serde_json::to_string(&sorted).ok_log() {
            self.push(key, json);
        }
    }

    /// Value of the first content with the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.contents
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Container metadata as reported for a newly matched container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDetail {
    pub data_type: String,
    pub project: String,
    pub container_id: String,
    pub container_ip: String,
    pub container_name: String,
    pub raw_container_name: String,
    pub log_path: String,
    pub driver: String,
    pub namespace: String,
    pub image_name: String,
    pub pod_name: String,
    pub root_path: String,
    pub hostname: String,
    pub hosts_path: String,
    pub env: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub k8s_labels: HashMap<String, String>,
}

impl ContainerDetail {
    pub fn from_record(record: &ContainerRecord, project: &str) -> Self {
        Self {
            data_type: CONTAINER_DATA_TYPE.to_owned(),
            project: project.to_owned(),
            container_id: record.id().to_string(),
            container_ip: record.ip.clone(),
            container_name: record.name.clone(),
            raw_container_name: record.raw_name.clone(),
            log_path: record.log_path.clone(),
            driver: record.driver.clone(),
            namespace: record.k8s.namespace.clone(),
            image_name: record.image_name.clone(),
            pod_name: record.k8s.pod_name.clone(),
            root_path: record.root_path.clone(),
            hostname: record.hostname.clone(),
            hosts_path: record.hosts_path.clone(),
            env: record.env.clone(),
            labels: record.labels.clone(),
            k8s_labels: record.k8s.labels.clone(),
        }
    }

    pub fn to_log_entry(&self, host_ip: &str, time: u32) -> LogEntry {
        let mut entry = LogEntry::new(time);
        entry.push("type", &self.data_type);
        entry.push("project", &self.project);
        entry.push("container_id", short_id(&self.container_id));
        entry.push("container_ip", &self.container_ip);
        entry.push("container_name", &self.container_name);
        entry.push("raw_container_name", &self.raw_container_name);
        entry.push("log_path", &self.log_path);
        entry.push("driver", &self.driver);
        entry.push("namespace", &self.namespace);
        entry.push("image_name", &self.image_name);
        entry.push("pod_name", &self.pod_name);
        entry.push("root_path", &self.root_path);
        entry.push("hostname", &self.hostname);
        entry.push("hosts_path", &self.hosts_path);
        entry.push_map("env", &self.env);
        entry.push_map("labels", &self.labels);
        entry.push_map("k8s_labels", &self.k8s_labels);
        entry.push("ip", host_ip);
        entry
    }
}

/// Outcome of applying one collection config on this host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigResult {
    pub data_type: String,
    pub project: String,
    pub logstore: String,
    /// Config name, optionally prefixed as `<prefix>$<name>`.
    pub config_name: String,
    pub path_not_exist_input_container_ids: String,
    pub path_exist_input_container_ids: String,
    pub source_address: String,
    pub input_type: String,
    pub input_is_container_file: String,
    pub flusher_type: String,
    pub flusher_target_address: String,
}

impl ConfigResult {
    pub fn new(project: &str, config_name: &str) -> Self {
        Self {
            data_type: CONFIG_RESULT_DATA_TYPE.to_owned(),
            project: project.to_owned(),
            config_name: config_name.to_owned(),
            ..Default::default()
        }
    }

    /// The config name without its `<prefix>$` part.
    pub fn display_name(&self) -> &str {
        let mut parts = self.config_name.split('$');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(name), None) => name,
            _ => &self.config_name,
        }
    }

    pub fn to_log_entry(&self, host_ip: &str, time: u32) -> LogEntry {
        let mut entry = LogEntry::new(time);
        entry.push("type", &self.data_type);
        entry.push("project", &self.project);
        entry.push("logstore", &self.logstore);
        entry.push("config_name", self.display_name());
        entry.push("input.source_addresses", &self.source_address);
        entry.push(
            "input.path_exist_container_ids",
            &self.path_exist_input_container_ids,
        );
        entry.push(
            "input.path_not_exist_container_ids",
            &self.path_not_exist_input_container_ids,
        );
        entry.push("input.type", &self.input_type);
        entry.push("input.container_file", &self.input_is_container_file);
        entry.push("flusher.type", &self.flusher_type);
        entry.push("flusher.target_addresses", &self.flusher_target_address);
        entry.push("ip", host_ip);
        entry
    }
}

/// Row announcing containers of `project` that disappeared.
pub(super) fn delete_containers_entry(
    project: &str,
    container_ids: &str,
    host_ip: &str,
    time: u32,
) -> LogEntry {
    let mut entry = LogEntry::new(time);
    entry.push("type", DELETE_CONTAINERS_DATA_TYPE);
    entry.push("project", project);
    entry.push("container_ids", container_ids);
    entry.push("ip", host_ip);
    entry
}

/// Joins ids into the `;`-separated list format used in reports.
pub fn join_ids<S: AsRef<str>>(ids: &[S]) -> String {
    ids.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(";")
}
