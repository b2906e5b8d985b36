//! Environment snapshot captured once at process start.
//!
//! Every environment variable this binary consults is read here, exactly
//! once, and the snapshot is passed explicitly to the code that needs it.
//! Patch rules therefore stay pure functions of (document, snapshot) and can
//! be tested without touching the real process environment.

use std::path::PathBuf;

/// Default browser-binaries root baked into the container image.
pub const DEFAULT_BROWSERS_ROOT: &str = "/ms-playwright";

/// Read-only view of the environment variables the boot sequence consumes.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    /// `OPENCLAW_STATE_DIR` — overrides the default state directory.
    pub state_dir: Option<PathBuf>,
    /// `OPENCLAW_GATEWAY_TOKEN` — gateway access token to sync into the
    /// config. `None` when unset or empty; an absent token never clears a
    /// persisted one.
    pub gateway_token: Option<String>,
    /// `PLAYWRIGHT_BROWSERS_PATH` — root directory of installed browser
    /// builds (default: `/ms-playwright`).
    pub browsers_root: PathBuf,
}

impl EnvSnapshot {
    /// Capture the relevant variables from the live process environment.
    ///
    /// Empty values are treated as unset.
    pub fn capture() -> Self {
        Self {
            state_dir: std::env::var("OPENCLAW_STATE_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            gateway_token: std::env::var("OPENCLAW_GATEWAY_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            browsers_root: std::env::var("PLAYWRIGHT_BROWSERS_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BROWSERS_ROOT)),
        }
    }
}
