use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::container::RawContainer;
use crate::fsutil::{self, JsonFileError};

use super::{Error, Result, RuntimeSource};

const CONTAINER_CONFIG_FILE: &str = "config.v2.json";
const HOST_CONFIG_FILE: &str = "hostconfig.json";

/// Lists containers from the Docker daemon's on-disk state
/// (`<docker-root>/containers/<id>/config.v2.json`).
#[derive(Debug, Clone)]
pub struct DockerStateSource {
    root: PathBuf,
}

impl DockerStateSource {
    /// # Arguments
    ///
    /// * `root` - Docker's data root, usually `/var/lib/docker`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_container(dir: &Path) -> Option<RawContainer> {
        let config_path = dir.join(CONTAINER_CONFIG_FILE);
        let mut raw: RawContainer = match fsutil::read_json_file(&config_path) {
            Ok(raw) => raw,
            Err(JsonFileError::Open(err)) if err.source.kind() == ErrorKind::NotFound => {
                log::trace!("no container config in `{}`", dir.display());
                return None;
            }
            Err(err) => {
                log::warn!("skipping container state: {}", err);
                return None;
            }
        };

        if raw.host_config.is_none() {
            raw.host_config = fsutil::read_json_file(dir.join(HOST_CONFIG_FILE))
                .map_err(|err| log::debug!("no host config: {}", err))
                .ok();
        }
        Some(raw)
    }
}

impl RuntimeSource for DockerStateSource {
    fn list_containers(&self) -> Result<Vec<RawContainer>> {
        let path = self.root.join("containers");
        let entries = fs::read_dir(&path).map_err(|source| Error::ReadDir {
            path: path.clone(),
            source,
        })?;

        let mut containers = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("failed to read entry of `{}`: {}", path.display(), err);
                    continue;
                }
            };
            if !entry.file_type().is_ok_and(|ft| ft.is_dir()) {
                continue;
            }
            if let Some(raw) = Self::read_container(&entry.path()) {
                if raw.is_running() {
                    containers.push(raw);
                }
            }
        }
        log::debug!(
            "found {} running containers in `{}`",
            containers.len(),
            path.display()
        );

        Ok(containers)
    }
}
