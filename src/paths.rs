//! State-directory and config-file path resolution.

use std::path::PathBuf;

use tracing::info;

use crate::envsnap::EnvSnapshot;

/// Name of the persisted configuration file inside the state directory.
pub const CONFIG_FILE_NAME: &str = "openclaw.json";

/// Fixed profile name the browser-automation patch rule writes into the
/// config; the pre-warm profile directory is derived from it.
pub const DEFAULT_PROFILE: &str = "openclaw";

/// Resolved filesystem locations for one boot.
#[derive(Debug, Clone)]
pub struct StatePaths {
    /// Persistent state directory (`$OPENCLAW_STATE_DIR` or `~/.openclaw`).
    pub state_dir: PathBuf,
    /// `state_dir/openclaw.json`.
    pub config_file: PathBuf,
}

impl StatePaths {
    /// Compute the state paths from the environment snapshot.
    ///
    /// Pure path computation — no filesystem access, cannot fail. Falls back
    /// to a relative `.openclaw` if `HOME` is unset (containers always set
    /// it, but the resolver must stay infallible).
    pub fn resolve(env: &EnvSnapshot) -> Self {
        let state_dir = env.state_dir.clone().unwrap_or_else(default_state_dir);
        let config_file = state_dir.join(CONFIG_FILE_NAME);
        info!(
            state_dir = %state_dir.display(),
            config = %config_file.display(),
            "resolved state paths"
        );
        Self {
            state_dir,
            config_file,
        }
    }

    /// Scratch profile directory the pre-warm supervisor hands to the
    /// browser (`state_dir/browser/<profile>/user-data`).
    pub fn browser_profile_dir(&self) -> PathBuf {
        self.state_dir
            .join("browser")
            .join(DEFAULT_PROFILE)
            .join("user-data")
    }
}

fn default_state_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".openclaw");
    }
    PathBuf::from(".openclaw")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_default() {
        let env = EnvSnapshot {
            state_dir: Some(PathBuf::from("/data/openclaw")),
            ..Default::default()
        };
        let paths = StatePaths::resolve(&env);
        assert_eq!(paths.state_dir, PathBuf::from("/data/openclaw"));
        assert_eq!(
            paths.config_file,
            PathBuf::from("/data/openclaw/openclaw.json")
        );
    }

    #[test]
    fn profile_dir_lives_under_state_dir() {
        let env = EnvSnapshot {
            state_dir: Some(PathBuf::from("/data/openclaw")),
            ..Default::default()
        };
        let paths = StatePaths::resolve(&env);
        assert_eq!(
            paths.browser_profile_dir(),
            PathBuf::from("/data/openclaw/browser/openclaw/user-data")
        );
    }
}
