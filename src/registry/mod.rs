//! The registry of containers currently known on this host.
//!
//! The runtime poller feeds snapshots into the registry; collection configs
//! query it incrementally through their own [`DiffSession`]. Every operation
//! takes one exclusive lock for its whole duration, so a query always sees a
//! consistent snapshot. No I/O happens under the lock: records, including
//! their resolved address, are built before they are handed in.
//!
//! Lifecycle of a record:
//!
//! ```text
//! new ──update──▶ active ──missing from full snapshot──▶ pending deletion
//!                   ▲                                         │
//!                   └─────────── reappears ◀──────────────────┤
//!                                                             ▼
//!                                  grace period elapsed at query time: purged
//! ```
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, SystemTime};

use crate::container::{ContainerID, ContainerRecord};
use crate::filter::Filter;

mod session;

pub use session::{DiffSession, MatchDelta};

/// How long a container may be missing from full snapshots before it is
/// purged.
pub const DEFAULT_DELETION_GRACE_PERIOD: Duration = Duration::from_secs(300);

static GLOBAL: OnceLock<ContainerRegistry> = OnceLock::new();

#[derive(Debug)]
struct Inner {
    containers: HashMap<ContainerID, Arc<ContainerRecord>>,
    deletion_grace_period: Duration,
}

/// Thread-safe registry of container records keyed by container id.
#[derive(Debug)]
pub struct ContainerRegistry {
    inner: Mutex<Inner>,
}

impl Default for ContainerRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_DELETION_GRACE_PERIOD)
    }
}

impl ContainerRegistry {
    pub fn new(deletion_grace_period: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                containers: HashMap::new(),
                deletion_grace_period,
            }),
        }
    }

    /// Process-wide registry with the default grace period, constructed on
    /// first access.
    ///
    /// Prefer creating a registry explicitly and sharing it through an
    /// `Arc`; this exists for callers without access to such a handle.
    pub fn global() -> &'static ContainerRegistry {
        GLOBAL.get_or_init(ContainerRegistry::default)
    }

    // Every mutation under the lock is a single insert, remove or marker
    // write, so a poisoned lock still guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn deletion_grace_period(&self) -> Duration {
        self.lock().deletion_grace_period
    }

    pub fn set_deletion_grace_period(&self, period: Duration) {
        self.lock().deletion_grace_period = period;
    }

    /// Inserts or replaces a single record. A record pending deletion is
    /// revived.
    pub fn update_container(&self, record: ContainerRecord) {
        let mut inner = self.lock();
        upsert(&mut inner.containers, record);
    }

    /// Inserts or replaces all given records. Containers not contained in
    /// `records` are left untouched, see [`Self::sync_containers`] for a full
    /// refresh.
    pub fn update_containers(&self, records: impl IntoIterator<Item = ContainerRecord>) {
        let mut inner = self.lock();
        for record in records {
            upsert(&mut inner.containers, record);
        }
    }

    /// Applies a full snapshot of the runtime: every record is upserted and
    /// every known container missing from the snapshot is marked as pending
    /// deletion.
    pub fn sync_containers(&self, snapshot: Vec<ContainerRecord>) {
        self.sync_containers_at(snapshot, SystemTime::now());
    }

    pub fn sync_containers_at(&self, snapshot: Vec<ContainerRecord>, now: SystemTime) {
        let mut inner = self.lock();
        let present: HashSet<ContainerID> = snapshot.iter().map(|r| r.id().clone()).collect();
        for record in snapshot {
            upsert(&mut inner.containers, record);
        }
        for (id, record) in inner.containers.iter_mut() {
            if !present.contains(id) {
                mark_deleted(record, now);
            }
        }
    }

    /// Marks the given containers as pending deletion. Containers that are
    /// already pending keep their original deletion time.
    pub fn mark_missing_at<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ContainerID>,
        now: SystemTime,
    ) {
        let mut inner = self.lock();
        for id in ids {
            if let Some(record) = inner.containers.get_mut(id) {
                mark_deleted(record, now);
            }
        }
    }

    /// Removes a container immediately, bypassing the grace period.
    pub fn remove_container(&self, id: &str) -> Option<Arc<ContainerRecord>> {
        self.lock().containers.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<ContainerRecord>> {
        self.lock().containers.get(id).cloned()
    }

    pub fn container_ids(&self) -> Vec<ContainerID> {
        let mut ids: Vec<ContainerID> = self.lock().containers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.lock().containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().containers.is_empty()
    }

    /// Reports containers that were added or purged since the session's last
    /// query.
    ///
    /// Expired records are purged first. Then every container the session has
    /// not seen yet (including those still within their grace period) is
    /// recorded in the session and evaluated against `filter`; matches are
    /// reported as added. Finally, session entries whose container no longer
    /// exists are dropped, and reported as removed if they had matched.
    ///
    /// A container's filter outcome is decided once, when the session first
    /// sees it. Later updates of its labels or environment do not change
    /// whether it is matched; call [`DiffSession::reset`] to re-evaluate.
    pub fn get_all_accepted(&self, session: &mut DiffSession, filter: &Filter) -> MatchDelta {
        self.get_all_accepted_at(session, filter, SystemTime::now())
    }

    pub fn get_all_accepted_at(
        &self,
        session: &mut DiffSession,
        filter: &Filter,
        now: SystemTime,
    ) -> MatchDelta {
        let mut inner = self.lock();
        let grace = inner.deletion_grace_period;
        inner.containers.retain(|id, record| {
            let Some(deleted_at) = record.deleted_at() else {
                return true;
            };
            let age = now.duration_since(deleted_at).unwrap_or(Duration::ZERO);
            if age >= grace {
                log::debug!("purging container `{}` missing for {:?}", id, age);
                return false;
            }
            true
        });

        let mut delta = MatchDelta::default();
        for (id, record) in inner.containers.iter() {
            if !session.full.insert(id.clone()) {
                continue;
            }
            if filter.matches(record) {
                session.matched.insert(id.clone(), Arc::clone(record));
                delta.added.push(Arc::clone(record));
            }
        }

        session.full.retain(|id| {
            if inner.containers.contains_key(id) {
                return true;
            }
            if session.matched.remove(id).is_some() {
                delta.removed.push(id.clone());
            }
            false
        });
        session.matched.retain(|id, _| session.full.contains(id));

        delta.added.sort_by(|a, b| a.id().cmp(b.id()));
        delta.removed.sort();
        if !delta.is_empty() {
            log::debug!(
                "container match delta: new={}, deleted={}, matched={}",
                delta.new_count(),
                delta.delete_count(),
                session.matched.len()
            );
        }
        delta
    }
}

fn upsert(
    containers: &mut HashMap<ContainerID, Arc<ContainerRecord>>,
    mut record: ContainerRecord,
) {
    record.set_deleted_at(None);
    let id = record.id().clone();
    match containers.insert(id.clone(), Arc::new(record)) {
        Some(previous) if previous.is_pending_deletion() => {
            log::debug!("container `{}` reappeared before being purged", id);
        }
        Some(_) => {}
        None => log::debug!("registered container `{}`", id),
    }
}

fn mark_deleted(record: &mut Arc<ContainerRecord>, now: SystemTime) {
    if record.is_pending_deletion() {
        return;
    }
    log::debug!("container `{}` is missing, pending deletion", record.id());
    Arc::make_mut(record).set_deleted_at(Some(now));
}
