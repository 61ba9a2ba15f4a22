use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::container::{ContainerRecord, RawContainer};
use crate::error::ResultOkLogExt;
use crate::registry::ContainerRegistry;

use super::{Result, RuntimeSource};

/// Periodically applies full runtime listings to the registry.
#[derive(Debug)]
pub struct Poller<S> {
    source: S,
    rootfs: PathBuf,
    prefer_host_network: bool,
}

impl<S: RuntimeSource> Poller<S> {
    /// # Arguments
    ///
    /// * `source` - The runtime to list containers from.
    /// * `rootfs` - Mount point of the host's root filesystem; container hosts
    ///   files are read relative to it.
    /// * `prefer_host_network` - Resolve addresses from hosts files before
    ///   runtime network settings.
    pub fn new(source: S, rootfs: impl Into<PathBuf>, prefer_host_network: bool) -> Self {
        Self {
            source,
            rootfs: rootfs.into(),
            prefer_host_network,
        }
    }

    /// Lists the runtime and syncs the registry with the result. Records are
    /// built before the registry is locked.
    ///
    /// Returns the number of containers in the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the source's error if listing fails; the registry is left
    /// untouched in that case, so no container is marked as missing.
    pub fn refresh(&self, registry: &ContainerRegistry) -> Result<usize> {
        let snapshot: Vec<ContainerRecord> = self
            .source
            .list_containers()?
            .iter()
            .filter_map(|raw| {
                let hosts_path = self.hosts_path_override(raw);
                ContainerRecord::create_info_detail(
                    raw,
                    hosts_path.as_deref(),
                    self.prefer_host_network,
                )
                .ok_log()
            })
            .collect();

        let count = snapshot.len();
        registry.sync_containers(snapshot);
        Ok(count)
    }

    /// Runs [`Poller::refresh`] on the blocking thread pool.
    ///
    /// Listing errors and a panicking refresh are logged; both yield `None`
    /// and leave the caller's loop running.
    pub async fn refresh_in_background(
        self: Arc<Self>,
        registry: Arc<ContainerRegistry>,
    ) -> Option<usize>
    where
        S: Send + Sync + 'static,
    {
        let refresh = tokio::task::spawn_blocking(move || self.refresh(&registry))
            .await
            .map_err(crate::Error::from)
            .ok_log()?;
        match refresh {
            Ok(count) => {
                log::trace!("discovered {} running containers", count);
                Some(count)
            }
            Err(err) => {
                log::error!("container discovery failed: {}", err);
                None
            }
        }
    }

    fn hosts_path_override(&self, raw: &RawContainer) -> Option<PathBuf> {
        if raw.hosts_path.is_empty() || self.rootfs == Path::new("/") {
            return None;
        }
        let hosts_path = Path::new(&raw.hosts_path);
        Some(
            self.rootfs
                .join(hosts_path.strip_prefix("/").unwrap_or(hosts_path)),
        )
    }
}
