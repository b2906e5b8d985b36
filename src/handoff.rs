//! Hand-off to the main process.
//!
//! The entrypoint's last act. On Unix the image replaces itself via
//! `exec(2)` so the main process becomes PID-visible with no supervisor left
//! behind; elsewhere (dev machines) it spawns and forwards the exit status.

use std::process::Command;

use anyhow::{bail, Context as _, Result};
use tracing::info;

/// Replace (or, off Unix, run) the main process.
///
/// # Errors
///
/// This is the only fatal path in the whole boot sequence: if the main
/// process cannot be started there is nothing left to fall through to.
pub fn exec_main(argv: &[String]) -> Result<()> {
    let Some((program, args)) = argv.split_first() else {
        bail!("no main command given — nothing to exec");
    };

    info!(command = %program, "handing off to main process");

    let mut cmd = Command::new(program);
    cmd.args(args);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt as _;
        // exec only returns on failure.
        let err = cmd.exec();
        Err(err).with_context(|| format!("failed to exec main process '{program}'"))
    }

    #[cfg(not(unix))]
    {
        let status = cmd
            .status()
            .with_context(|| format!("failed to start main process '{program}'"))?;
        std::process::exit(status.code().unwrap_or(1));
    }
}
