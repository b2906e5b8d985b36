//! Profile pre-warm supervisor.
//!
//! Chromium's first launch against a fresh `--user-data-dir` takes several
//! seconds while it writes its profile scaffolding. Doing that once at
//! container boot means the first real browser-tool request doesn't eat the
//! cost. The supervisor launches the discovered executable against the
//! scratch profile, polls for proof of initialization, and unconditionally
//! tears the subprocess down before returning — it never outlives this call.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// File Chromium drops in the user-data dir once first-run setup completes.
const MARKER_FILE: &str = "First Run";
/// Profile subdirectory written alongside the marker.
const PROFILE_SUBDIR: &str = "Default";

/// Fixed remote-debugging port for the pre-warm launch.
const DEBUG_PORT: u16 = 9222;

/// Poll cadence while waiting for the profile to appear.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Hard deadline for the whole pre-warm attempt.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(15);
/// How long to wait after SIGTERM before escalating to SIGKILL.
const KILL_GRACE: Duration = Duration::from_secs(3);

/// What came of a pre-warm attempt. Logged, never persisted, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrewarmOutcome {
    /// Marker and profile subdirectory appeared before the deadline.
    Ready,
    /// Deadline elapsed; the browser was cleaned up anyway.
    TimedOut,
    /// No subprocess was spawned (no executable, already warmed, or the
    /// launch itself failed). The reason is for log narration only.
    Skipped(String),
}

/// True once the profile shows both initialization artifacts.
fn profile_initialized(profile_dir: &Path) -> bool {
    profile_dir.join(MARKER_FILE).is_file() && profile_dir.join(PROFILE_SUBDIR).is_dir()
}

/// Warm up the browser profile at `profile_dir` using `executable`.
///
/// Skips without spawning anything when there is no executable or the
/// profile is already initialized, so container restarts stay fast. All
/// failure paths degrade to a logged skip — a cold profile just means the
/// browser bootstraps lazily on first real use.
pub async fn prewarm(
    executable: Option<&Path>,
    profile_dir: &Path,
    deadline: Duration,
) -> PrewarmOutcome {
    let Some(executable) = executable else {
        debug!("no browser executable — skipping profile pre-warm");
        return PrewarmOutcome::Skipped("no browser executable".to_string());
    };

    if profile_initialized(profile_dir) {
        debug!(profile = %profile_dir.display(), "profile already initialized — skipping pre-warm");
        return PrewarmOutcome::Skipped("profile already initialized".to_string());
    }

    if let Err(e) = std::fs::create_dir_all(profile_dir) {
        warn!(profile = %profile_dir.display(), err = %e, "could not create profile dir — skipping pre-warm");
        return PrewarmOutcome::Skipped(format!("profile dir unavailable: {e}"));
    }

    let mut child = match Command::new(executable)
        .arg("--headless=new")
        .arg("--no-sandbox")
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage")
        .arg(format!("--remote-debugging-port={DEBUG_PORT}"))
        .arg(format!("--user-data-dir={}", profile_dir.display()))
        .arg("about:blank")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            warn!(executable = %executable.display(), err = %e, "browser failed to spawn — skipping pre-warm");
            return PrewarmOutcome::Skipped(format!("spawn failed: {e}"));
        }
    };

    info!(
        executable = %executable.display(),
        profile = %profile_dir.display(),
        "pre-warming browser profile"
    );

    let started = Instant::now();
    let mut outcome = PrewarmOutcome::TimedOut;
    while started.elapsed() < deadline {
        sleep(POLL_INTERVAL).await;
        if profile_initialized(profile_dir) {
            outcome = PrewarmOutcome::Ready;
            break;
        }
    }

    // The subprocess must not outlive the supervisor, whatever happened.
    terminate(&mut child).await;

    match &outcome {
        PrewarmOutcome::Ready => {
            info!(elapsed_ms = started.elapsed().as_millis() as u64, "browser profile pre-warmed");
        }
        _ => {
            warn!(deadline_secs = deadline.as_secs(), "browser profile pre-warm timed out");
        }
    }
    outcome
}

/// Stop the pre-warm subprocess: SIGTERM, a bounded wait for exit, then
/// SIGKILL. A process that already exited is success, not an error.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // ESRCH just means the browser beat us to exiting.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
    }
    #[cfg(not(unix))]
    let _ = child.start_kill();

    if timeout(KILL_GRACE, child.wait()).await.is_err() {
        debug!("browser ignored SIGTERM — sending SIGKILL");
        let _ = child.kill().await;
        let _ = child.wait().await;
    }
}
