//! Creo Discovery: keeps track of the containers running on a host and tells
//! collection configs which of them they should collect from.
//!
//! The library discovers containers from the runtime's state, maintains a
//! registry of their metadata (including addresses resolved from hosts
//! files), matches them against include/exclude filters, and reports newly
//! matched and removed containers.
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use binding::CollectionBinding;
use discovery::{DockerStateSource, Poller};
use error::ResultOkLogExt;
use registry::ContainerRegistry;
use report::ReportEvent;

pub mod binding;
pub mod config;
pub mod container;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod fsutil;
pub mod hosts;
pub mod registry;
pub mod report;

pub use error::{Error, Result};

const REPORT_CHANNEL_CAPACITY: usize = 1024;

/// Runs container discovery.
///
/// Reads the [`config::Config`] from the environment, then on every discovery
/// interval syncs the registry with the runtime, lets the configured binding
/// pick up new and removed containers and exports the accumulated reports.
///
/// # Errors
///
/// Fails only on malformed environment variables; errors during a
/// discovery cycle are logged and the next cycle runs as usual.
pub async fn run() -> Result<()> {
    let config = config::Config::from_env()?;
    log::debug!("Final rootfs: {}", config.rootfs.display());

    let registry = Arc::new(ContainerRegistry::new(config.deletion_grace_period));
    let poller = Arc::new(Poller::new(
        DockerStateSource::new(config.docker_state_dir()),
        config.rootfs.clone(),
        config.prefer_host_network,
    ));
    let host_ip = config.resolve_host_ip();
    log::debug!("Host IP: {}", &host_ip);

    let (reporter, recorder) = report::channel(REPORT_CHANNEL_CAPACITY);
    let store = recorder.store();
    tokio::spawn(recorder.run());

    let mut binding = CollectionBinding::new(
        config.config_name.clone(),
        config.project.clone(),
        &config.criteria,
        reporter.clone(),
    );

    let mut interval = tokio::time::interval(config.discovery_interval);
    loop {
        interval.tick().await;

        Arc::clone(&poller)
            .refresh_in_background(Arc::clone(&registry))
            .await;

        binding.tick(&registry);
        reporter.send(ReportEvent::ConfigResultSnapshot);

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX));
        let added = store.take_added_ids();
        if !added.is_empty() {
            log::debug!(
                "new containers: {}",
                added.into_iter().collect::<Vec<_>>().join(";")
            );
        }
        for entry in store.drain(&host_ip, timestamp) {
            if let Some(line) = serde_json::to_string(&entry).ok_log() {
                log::info!(target: "container report", "{}", line);
            }
        }
    }
}
