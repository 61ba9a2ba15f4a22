//! Container identity and normalized container metadata.
//!
//! A [`ContainerRecord`] is built once from a [`RawContainer`] (the runtime's
//! inspect document) and is immutable afterwards, apart from the deletion
//! marker maintained by the registry.
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

mod error;
mod k8s;
mod raw;
mod record;

pub use error::{Error, Result};
pub use k8s::K8sInfo;
pub use raw::{
    RawConfig, RawContainer, RawGraphDriver, RawHostConfig, RawNetwork, RawNetworkSettings,
    RawState,
};
pub use record::ContainerRecord;

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// Length of the abbreviated id used in reports and as a default hostname.
pub const SHORT_ID_LEN: usize = 12;

/// A validated container identifier.
///
/// # Examples
///
/// ```
/// # use creo_discovery::container::ContainerID;
/// let id = ContainerID::new("8be13ee0dd9e0a0c5d6f8be13ee0dd9e0a0c5d6f").unwrap();
/// assert_eq!(id.short_id(), "8be13ee0dd9e");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the id is empty or longer than
    /// [`CONTAINER_ID_MAX_LEN`].
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first [`SHORT_ID_LEN`] characters of the id, or the whole
    /// id if it is shorter.
    pub fn short_id(&self) -> &str {
        short_id(&self.0)
    }
}

/// Abbreviates a full container id, see [`ContainerID::short_id`].
pub fn short_id(full_id: &str) -> &str {
    match full_id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &full_id[..end],
        None => full_id,
    }
}

impl FromStr for ContainerID {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_rejects_empty_and_oversized() {
        assert!(ContainerID::new("").is_err());
        assert!(ContainerID::new("a".repeat(CONTAINER_ID_MAX_LEN + 1)).is_err());
        assert!(ContainerID::new("a".repeat(CONTAINER_ID_MAX_LEN)).is_ok());
    }

    #[test]
    fn test_short_id() {
        let id = ContainerID::new("8be13ee0dd9e7f0d1c2b3a4").unwrap();
        assert_eq!(id.short_id(), "8be13ee0dd9e");

        let id = ContainerID::new("c1").unwrap();
        assert_eq!(id.short_id(), "c1");
    }

    #[test]
    fn test_lookup_by_str() {
        let mut set = std::collections::HashSet::new();
        set.insert(ContainerID::new("c1").unwrap());
        assert!(set.contains("c1"));
    }
}
