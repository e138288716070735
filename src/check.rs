use anyhow::Result;

use crate::config::Config;

/// Check that a module's requested thread count is available on this machine.
pub const MIN_THREADS: &str = "min_threads";

/// Outcome of a check that the user can switch off in the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub would_fail: bool,
    pub is_enabled: bool,
}

impl CheckResult {
    /// Evaluate check `name` for the module labelled `label`.
    /// `<label>.check.<name>` overrides `check.<name>`; checks default to enabled.
    pub fn evaluate(name: &str, label: &str, config: &Config, would_fail: bool) -> Result<Self> {
        let is_enabled = match config.get_bool(&format!("{label}.check.{name}"))? {
            Some(enabled) => enabled,
            None => config.get_bool(&format!("check.{name}"))?.unwrap_or(true),
        };
        Ok(Self {
            would_fail,
            is_enabled,
        })
    }

    /// True if the caller must fail. A failing check that has been
    /// disabled only logs `msg` as a warning.
    pub fn escalate(&self, msg: &str) -> bool {
        match (self.would_fail, self.is_enabled) {
            (true, true) => true,
            (true, false) => {
                log::warn!("{msg} (check disabled; continuing)");
                false
            }
            (false, _) => false,
        }
    }
}

/// Threads this machine can run in parallel.
pub fn available_threads() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}
