//! Discovery of the containers running on this host.
//!
//! A [`RuntimeSource`] lists the runtime's containers; the [`Poller`] turns
//! each listing into records and applies it to the registry as a full
//! snapshot, which is what marks vanished containers for deletion.
mod docker;
mod error;
mod poller;

pub use docker::DockerStateSource;
pub use error::{Error, Result};
pub use poller::Poller;

use crate::container::RawContainer;

/// A container runtime that can list its running containers.
pub trait RuntimeSource {
    /// Returns the inspect documents of all running containers.
    ///
    /// # Errors
    ///
    /// Fails only if the runtime cannot be listed at all; unreadable
    /// individual containers are skipped.
    fn list_containers(&self) -> Result<Vec<RawContainer>>;
}
