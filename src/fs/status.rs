//! Status markers.
//!
//! A pipeline or module directory records its status as the presence of at
//! most one marker file. Writers clear every marker before creating the new
//! one, so an interrupted write leaves either the old status or none at all,
//! never two.

use std::fmt;
use std::path::Path;

use anyhow::Result;

use super::Fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    NotStarted,
    Started,
    Failed,
    Complete,
    PrecheckStarted,
    PrecheckComplete,
    PrecheckFailed,
}

/// Every marker, in the order they're scanned.
const MARKERS: [(Status, &str); 6] = [
    (Status::Started, "lockstepStarted"),
    (Status::Failed, "lockstepFailed"),
    (Status::Complete, "lockstepComplete"),
    (Status::PrecheckStarted, "precheckStarted"),
    (Status::PrecheckComplete, "precheckComplete"),
    (Status::PrecheckFailed, "precheckFailed"),
];

impl Status {
    /// File name of the marker for this status; `NotStarted` has none.
    pub fn marker(&self) -> Option<&'static str> {
        MARKERS
            .iter()
            .find(|(status, _)| status == self)
            .map(|(_, marker)| *marker)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// True for the two statuses a finished precheck run leaves behind.
    pub fn is_precheck_terminal(&self) -> bool {
        matches!(self, Self::PrecheckComplete | Self::PrecheckFailed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "NOT STARTED",
            Self::Started => "STARTED",
            Self::Failed => "FAILED",
            Self::Complete => "COMPLETE",
            Self::PrecheckStarted => "PRECHECK STARTED",
            Self::PrecheckComplete => "PRECHECK COMPLETE",
            Self::PrecheckFailed => "PRECHECK FAILED",
        };
        f.write_str(s)
    }
}

/// Find the status marker in `dir`. Scans in fixed order and returns the
/// first marker found; `NotStarted` if there is none (or `dir` doesn't exist).
pub fn scan_status(dir: &Path) -> Status {
    for (status, marker) in MARKERS {
        let path = dir.join(marker);
        if path.exists() {
            return status;
        }
    }
    Status::NotStarted
}

impl Fs {
    /// Status of the pipeline or module directory `dir`.
    pub fn status(&self, dir: &Path) -> Status {
        scan_status(dir)
    }

    /// Replace whatever status `dir` has with `status`.
    pub fn set_status(&self, dir: &Path, status: Status) -> Result<()> {
        for (_, marker) in MARKERS {
            let path = self.marker(dir, marker);
            if self.exists(&path) {
                self.delete_file(&path)?;
            }
        }
        if let Some(marker) = status.marker() {
            self.write_file(self.marker(dir, marker), "")?;
        }
        log::debug!("{:?} is now {}", dir, status);
        Ok(())
    }
}
