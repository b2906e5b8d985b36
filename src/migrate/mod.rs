//! Config migration engine.
//!
//! Loads the persisted `openclaw.json`, applies the ordered patch-rule set,
//! and rewrites the file only when something actually changed. Every failure
//! mode here is non-fatal: a missing file means the host application has not
//! run yet, a malformed file is the host application's problem, and in both
//! cases boot continues untouched.

pub mod rules;

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, error, info};

pub use rules::{PatchRule, RuleCtx, RULES};

/// Why a migration run made no changes (or did not run at all).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Rules ran; `changed` says whether the file was rewritten.
    Applied,
    /// Config file does not exist yet — nothing to migrate.
    SkippedNotFound,
    /// Config file exists but could not be parsed; left untouched.
    SkippedMalformed,
}

/// Result of one migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub changed: bool,
    pub outcome: MigrationOutcome,
}

impl MigrationReport {
    fn skipped(outcome: MigrationOutcome) -> Self {
        Self {
            changed: false,
            outcome,
        }
    }
}

/// Errors the engine can hit while persisting a migrated document.
///
/// Read/parse problems never surface here — they downgrade to a skip.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("failed to serialize migrated config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write migrated config: {0}")]
    Write(#[from] io::Error),
}

/// Load the config at `config_file`, apply [`RULES`] in order, and persist
/// the result if — and only if — any rule reported a change.
///
/// # Errors
///
/// Only the final write can fail. The caller is expected to log and continue;
/// a config that could not be rewritten still boots the main process.
pub fn migrate_config(config_file: &Path, ctx: &RuleCtx) -> Result<MigrationReport, MigrateError> {
    let raw = match fs::read_to_string(config_file) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %config_file.display(), "config not found — skipping migration");
            return Ok(MigrationReport::skipped(MigrationOutcome::SkippedNotFound));
        }
        Err(e) => {
            error!(path = %config_file.display(), err = %e, "config unreadable — skipping migration");
            return Ok(MigrationReport::skipped(MigrationOutcome::SkippedMalformed));
        }
    };

    let mut doc: Value = match serde_json::from_str(&raw) {
        Ok(doc) => doc,
        Err(e) => {
            error!(path = %config_file.display(), err = %e, "config is not valid JSON — skipping migration");
            return Ok(MigrationReport::skipped(MigrationOutcome::SkippedMalformed));
        }
    };
    if !doc.is_object() {
        error!(path = %config_file.display(), "config root is not a JSON object — skipping migration");
        return Ok(MigrationReport::skipped(MigrationOutcome::SkippedMalformed));
    }

    let changed = apply_rules(&mut doc, ctx);

    if changed {
        write_atomic(config_file, &doc)?;
        info!(path = %config_file.display(), "config migrated and rewritten");
    } else {
        debug!(path = %config_file.display(), "config already migrated — file untouched");
    }

    Ok(MigrationReport {
        changed,
        outcome: MigrationOutcome::Applied,
    })
}

/// Apply the full rule set to an in-memory document. Returns true if any
/// rule mutated it.
pub fn apply_rules(doc: &mut Value, ctx: &RuleCtx) -> bool {
    let mut changed = false;
    for rule in RULES {
        let rule_changed = (rule.apply)(doc, ctx);
        if rule_changed {
            debug!(rule = rule.name, "patch rule applied");
        }
        changed |= rule_changed;
    }
    changed
}

/// Persist `doc` pretty-printed via write-to-sibling-then-rename, so a kill
/// mid-write never leaves a truncated config behind.
fn write_atomic(path: &Path, doc: &Value) -> Result<(), MigrateError> {
    let mut pretty = serde_json::to_string_pretty(doc)?;
    pretty.push('\n');
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, pretty)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
