//! Browser executable discovery under the installed-browsers root.
//!
//! Browser builds land under a versioned directory per install
//! (`chromium-1148`, `chromium_headless_shell-1148`, ...) and the binary
//! sits at one of a handful of known relative paths depending on whether the
//! install is a full browser or a headless shell. Discovery picks the first
//! family directory and probes a declarative candidate list — extending it
//! for a new layout means adding one line, not new control flow.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Directory-name prefix shared by every chromium-family install.
const FAMILY_PREFIX: &str = "chromium";

/// Candidate binary locations inside an install directory, in preference
/// order: full browser first, headless shell as fallback, each under both
/// known packaging layouts.
const CANDIDATE_LAYOUTS: &[&str] = &[
    "chrome-linux/chrome",
    "chrome-linux/headless_shell",
    "chrome-headless-shell-linux/headless_shell",
    "chrome-headless-shell-linux64/chrome-headless-shell",
];

/// Locate a browser executable under `browsers_root`.
///
/// Returns `None` when the root does not exist, no chromium-family install
/// is present, or no candidate path is a regular file. Absence is a normal
/// state (the image may ship without a browser), never an error.
pub fn discover_executable(browsers_root: &Path) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(browsers_root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(root = %browsers_root.display(), err = %e, "browsers root not readable — no browser installed");
            return None;
        }
    };

    // Sort so the pick is deterministic regardless of readdir order.
    let mut installs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.is_dir()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(FAMILY_PREFIX))
        })
        .collect();
    installs.sort();

    let Some(install) = installs.into_iter().next() else {
        info!(root = %browsers_root.display(), "no chromium-family install found");
        return None;
    };

    for layout in CANDIDATE_LAYOUTS {
        let candidate = install.join(layout);
        if candidate.is_file() {
            info!(executable = %candidate.display(), "browser executable discovered");
            return Some(candidate);
        }
    }

    info!(install = %install.display(), "install directory has no known binary layout");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn missing_root_returns_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(discover_executable(&dir.path().join("nope")), None);
    }

    #[test]
    fn full_browser_preferred_over_headless_shell() {
        let dir = TempDir::new().unwrap();
        let install = dir.path().join("chromium-1100");
        touch(&install.join("chrome-linux/headless_shell"));
        touch(&install.join("chrome-linux/chrome"));

        assert_eq!(
            discover_executable(dir.path()),
            Some(install.join("chrome-linux/chrome"))
        );
    }

    #[test]
    fn headless_shell_layout_found_as_fallback() {
        let dir = TempDir::new().unwrap();
        let install = dir.path().join("chromium_headless_shell-1100");
        touch(&install.join("chrome-headless-shell-linux64/chrome-headless-shell"));

        assert_eq!(
            discover_executable(dir.path()),
            Some(install.join("chrome-headless-shell-linux64/chrome-headless-shell"))
        );
    }

    #[test]
    fn non_family_directories_ignored() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("firefox-1400/firefox/firefox"));
        assert_eq!(discover_executable(dir.path()), None);
    }

    #[test]
    fn install_without_known_layout_returns_none() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("chromium-1100/weird-layout")).unwrap();
        assert_eq!(discover_executable(dir.path()), None);
    }
}
