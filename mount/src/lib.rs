//! Translating paths between the host and a container's filesystem.
//!
//! When a pipeline runs inside a container, paths it hands to processes
//! launched on the host (or reads from the host-side config) have to be
//! rewritten through the container's volume mounts. The mount table is read
//! once per run from the container runtime's `inspect` output.

use std::path::{Path, PathBuf};

use util::PathEncodingError;

/// Mount table and prefix lookups
mod mount_map;
pub use mount_map::{normalize_host_path, Mount, MountMap};

/// Reading the mount table from the container runtime
mod inspect;
pub use inspect::{parse_inspect_json, RequiredRoot};

/// Marker file the docker runtime creates at the root of every container.
const DOCKER_ENV_FILE: &str = "/.dockerenv";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to build container volume map: {0}")]
    DockerVolumeCreation(String),
    #[error(transparent)]
    PathEncoding(#[from] PathEncodingError),
}

/// True if this process appears to be running inside a docker container.
pub fn in_docker() -> bool {
    Path::new(DOCKER_ENV_FILE).exists()
}

/// Maps paths between host and container namespaces.
/// Outside a container both directions are the identity.
#[derive(Debug, Clone, Default)]
pub enum PathMapper {
    #[default]
    Identity,
    Container(MountMap),
}

impl PathMapper {
    /// Build a mapper for a container by asking `runtime` for its mount table.
    /// Fails if the table can't be read or doesn't satisfy `required_root`.
    pub fn for_container(
        runtime: &str,
        container_id: &str,
        required_root: RequiredRoot,
    ) -> Result<Self, Error> {
        Ok(Self::Container(MountMap::query(runtime, container_id, required_root)?))
    }

    pub fn in_container(&self) -> bool {
        matches!(self, Self::Container(_))
    }

    pub fn to_container_path(&self, host: &Path) -> Result<PathBuf, Error> {
        match self {
            Self::Identity => Ok(host.to_path_buf()),
            Self::Container(map) => {
                let host = host.to_str().ok_or(PathEncodingError)?;
                Ok(PathBuf::from(map.to_container(host)))
            }
        }
    }

    pub fn to_host_path(&self, container: &Path) -> Result<PathBuf, Error> {
        match self {
            Self::Identity => Ok(container.to_path_buf()),
            Self::Container(map) => {
                let container = container.to_str().ok_or(PathEncodingError)?;
                Ok(PathBuf::from(map.to_host(container)))
            }
        }
    }
}
