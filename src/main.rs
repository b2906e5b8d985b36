use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use openclaw_entry::browser::{self, prewarm::DEFAULT_DEADLINE};
use openclaw_entry::envsnap::EnvSnapshot;
use openclaw_entry::handoff;
use openclaw_entry::migrate::{self, RuleCtx};
use openclaw_entry::paths::StatePaths;

#[derive(Parser)]
#[command(
    name = "openclaw-entry",
    about = "OpenClaw container entrypoint — reconcile config, pre-warm browser, exec main process",
    version
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "OPENCLAW_ENTRY_LOG")]
    log: Option<String>,

    /// Log output format: "pretty" (default) | "json" (structured for log aggregators)
    #[arg(long, env = "OPENCLAW_ENTRY_LOG_FORMAT")]
    log_format: Option<String>,

    /// Skip the browser profile pre-warm step
    #[arg(long, env = "OPENCLAW_ENTRY_SKIP_PREWARM")]
    skip_prewarm: bool,

    /// Main process command and arguments to exec after reconciliation
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    command: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args.log.as_deref().unwrap_or("info");
    let log_format = args.log_format.as_deref().unwrap_or("pretty");
    setup_logging(log_level, log_format);

    // Everything this binary consults from the environment, read once.
    let env = EnvSnapshot::capture();
    let paths = StatePaths::resolve(&env);

    // Discovery runs before migration so the browser-automation rule can
    // record the executable path. Absence is normal (image without browser).
    let executable = browser::discover_executable(&env.browsers_root);

    let ctx = RuleCtx {
        gateway_token: env.gateway_token.as_deref(),
        browser_executable: executable.as_deref(),
    };
    match migrate::migrate_config(&paths.config_file, &ctx) {
        Ok(report) => {
            info!(changed = report.changed, outcome = ?report.outcome, "config migration finished");
        }
        // A config we could not rewrite is the host application's problem;
        // boot continues regardless.
        Err(e) => error!(err = %e, "config migration failed — continuing to main process"),
    }

    if args.skip_prewarm {
        info!("browser profile pre-warm skipped by flag");
    } else {
        let outcome = browser::prewarm(
            executable.as_deref(),
            &paths.browser_profile_dir(),
            DEFAULT_DEADLINE,
        )
        .await;
        match outcome {
            browser::PrewarmOutcome::Ready => {}
            browser::PrewarmOutcome::TimedOut => {
                warn!("pre-warm timed out — browser will bootstrap lazily on first use");
            }
            browser::PrewarmOutcome::Skipped(reason) => {
                info!(reason = %reason, "pre-warm skipped");
            }
        }
    }

    handoff::exec_main(&args.command)
}

/// Initialize the tracing subscriber.
///
/// `log_format` may be `"pretty"` (default, human-readable) or `"json"`
/// (structured for log aggregators).
fn setup_logging(log_level: &str, log_format: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    if log_format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
