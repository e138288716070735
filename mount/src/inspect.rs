use std::process::Command;

use serde::Deserialize;

use crate::{Error, Mount, MountMap};

/// What a container's mount table must provide before paths can be mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRoot<'a> {
    /// A volume mounted at exactly this container path.
    MountedAt(&'a str),
    /// Some volume whose container side holds this path.
    Covering(&'a str),
}

/// The part of `docker inspect` output we care about.
#[derive(Debug, Deserialize)]
struct Inspected {
    #[serde(rename = "Mounts", default)]
    mounts: Vec<InspectedMount>,
}

#[derive(Debug, Deserialize)]
struct InspectedMount {
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Destination")]
    destination: String,
}

/// Build a `MountMap` from `inspect` JSON: an array whose first element has a
/// `Mounts` array of `{Source, Destination}` objects.
pub fn parse_inspect_json(json: &str) -> Result<MountMap, Error> {
    let inspected: Vec<Inspected> = serde_json::from_str(json)
        .map_err(|e| Error::DockerVolumeCreation(format!("unparseable inspect output: {e}")))?;
    let first = inspected
        .into_iter()
        .next()
        .ok_or_else(|| Error::DockerVolumeCreation("inspect output is empty".to_owned()))?;

    let mounts = first
        .mounts
        .iter()
        .map(|m| Mount::new(&m.source, &m.destination))
        .collect();
    Ok(MountMap::new(mounts))
}

impl MountMap {
    /// Ask the container runtime for the mount table of `container_id`.
    ///
    /// Blocks until the runtime returns. The table must satisfy `required_root`.
    pub fn query(
        runtime: &str,
        container_id: &str,
        required_root: RequiredRoot,
    ) -> Result<Self, Error> {
        log::info!("Reading volume mounts with `{runtime} inspect {container_id}`");
        let output = Command::new(runtime)
            .arg("inspect")
            .arg(container_id)
            .output()
            .map_err(|e| Error::DockerVolumeCreation(format!("unable to run {runtime}: {e}")))?;

        if !output.status.success() {
            return Err(Error::DockerVolumeCreation(format!(
                "{runtime} inspect exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim(),
            )));
        }

        let json = String::from_utf8(output.stdout).map_err(|_| {
            Error::DockerVolumeCreation("inspect output is not valid UTF-8".to_owned())
        })?;
        let map = parse_inspect_json(&json)?;
        map.require_root(required_root)?;

        for m in map.mounts() {
            log::debug!("volume {} -> {}", m.host(), m.container());
        }
        Ok(map)
    }

    /// Fail unless the mount table satisfies `required_root`.
    pub fn require_root(&self, required_root: RequiredRoot) -> Result<(), Error> {
        match required_root {
            RequiredRoot::MountedAt(root) if !self.has_container_root(root) => {
                Err(Error::DockerVolumeCreation(format!(
                    "no volume is mounted at the pipeline root \"{root}\""
                )))
            }
            RequiredRoot::Covering(dir) if !self.covers_container(dir) => {
                Err(Error::DockerVolumeCreation(format!(
                    "no volume holds the pipelines dir \"{dir}\"; its outputs would not reach the host"
                )))
            }
            _ => Ok(()),
        }
    }
}
