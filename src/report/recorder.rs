use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::container::ContainerID;

use super::detail::{ConfigResult, ContainerDetail, LogEntry, delete_containers_entry, join_ids};

#[derive(Debug, Clone)]
pub enum ReportEvent {
    /// A container started matching a collection config. Repeated additions
    /// of a container to the same project before the next drain are reported
    /// once.
    ContainerAdded(ContainerDetail),
    /// Matched containers of a project were purged.
    ContainersDeleted {
        project: String,
        ids: Vec<ContainerID>,
    },
    /// Latest result of a config; replaces earlier results of the same config
    /// until the next [`ReportEvent::ConfigResultSnapshot`].
    ConfigResult(ConfigResult),
    /// A config result that is reported as is.
    ConfigResultIncrement(ConfigResult),
    /// Moves the latest result of every config to the outbound rows.
    ConfigResultSnapshot,
}

/// Creates a bounded reporting channel.
pub fn channel(capacity: usize) -> (Reporter, Recorder) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        Reporter { tx },
        Recorder {
            rx,
            store: Arc::new(RecordStore::default()),
        },
    )
}

/// Sending half of the reporting channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: mpsc::Sender<ReportEvent>,
}

impl Reporter {
    /// Queues an event without waiting. Events that do not fit into the
    /// channel are dropped and logged.
    pub fn send(&self, event: ReportEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                log::warn!("report channel full, dropping event: {:?}", event);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("report channel closed, dropping event");
            }
        }
    }
}

/// Receiving half of the reporting channel.
#[derive(Debug)]
pub struct Recorder {
    rx: mpsc::Receiver<ReportEvent>,
    store: Arc<RecordStore>,
}

impl Recorder {
    pub fn store(&self) -> Arc<RecordStore> {
        Arc::clone(&self.store)
    }

    #[cfg(test)]
    pub(crate) fn try_recv(&mut self) -> Option<ReportEvent> {
        self.rx.try_recv().ok()
    }

    /// Applies events until every [`Reporter`] has been dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.store.apply(event);
        }
        log::debug!("all reporters dropped, recorder stopped");
    }
}

/// Reports accumulated between two exports.
#[derive(Debug, Default)]
pub struct RecordStore {
    containers: Mutex<BTreeMap<(String, String), ContainerDetail>>,
    added_ids: Mutex<BTreeSet<String>>,
    deleted: Mutex<BTreeMap<String, BTreeSet<ContainerID>>>,
    latest_config_results: DashMap<String, ConfigResult>,
    config_results: Mutex<Vec<ConfigResult>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordStore {
    pub fn apply(&self, event: ReportEvent) {
        match event {
            ReportEvent::ContainerAdded(detail) => {
                lock(&self.added_ids).insert(detail.container_id.clone());
                lock(&self.containers)
                    .insert((detail.project.clone(), detail.container_id.clone()), detail);
            }
            ReportEvent::ContainersDeleted { project, ids } => {
                lock(&self.deleted).entry(project).or_default().extend(ids);
            }
            ReportEvent::ConfigResult(result) => {
                self.latest_config_results
                    .insert(result.config_name.clone(), result);
            }
            ReportEvent::ConfigResultIncrement(result) => {
                lock(&self.config_results).push(result);
            }
            ReportEvent::ConfigResultSnapshot => {
                let names: Vec<String> = self
                    .latest_config_results
                    .iter()
                    .map(|entry| entry.key().clone())
                    .collect();
                let mut config_results = lock(&self.config_results);
                for name in names {
                    if let Some((_, result)) = self.latest_config_results.remove(&name) {
                        config_results.push(result);
                    }
                }
            }
        }
    }

    /// Returns the ids of all containers added since the last call, and
    /// clears them.
    pub fn take_added_ids(&self) -> BTreeSet<String> {
        std::mem::take(&mut *lock(&self.added_ids))
    }

    /// Serializes and clears the recorded rows. Added container ids are kept
    /// until [`RecordStore::take_added_ids`].
    pub fn drain(&self, host_ip: &str, time: u32) -> Vec<LogEntry> {
        let mut entries: Vec<LogEntry> = std::mem::take(&mut *lock(&self.containers))
            .into_values()
            .map(|detail| detail.to_log_entry(host_ip, time))
            .collect();

        for (project, ids) in std::mem::take(&mut *lock(&self.deleted)) {
            let ids: Vec<&ContainerID> = ids.iter().collect();
            entries.push(delete_containers_entry(
                &project,
                &join_ids(&ids),
                host_ip,
                time,
            ));
        }

        entries.extend(
            lock(&self.config_results)
                .drain(..)
                .map(|result| result.to_log_entry(host_ip, time)),
        );
        entries
    }
}
