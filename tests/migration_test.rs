//! Integration tests for the config migration engine — idempotence,
//! rule independence, ancestor creation, env token sync, and the
//! non-fatal skip paths.

use std::path::PathBuf;

use openclaw_entry::migrate::{self, MigrationOutcome, RuleCtx, RULES};
use serde_json::{json, Value};
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("openclaw.json");
    std::fs::write(&path, contents).unwrap();
    path
}

// ─── Idempotence ─────────────────────────────────────────────────────────────

#[test]
fn full_rule_set_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "commands": {"ownerDisplay": "Claw"},
            "channels": {"telegram": {"streaming": true}},
            "gateway": {"trustedProxies": ["127.0.0.1/32"]}
        }"#,
    );

    let exe = PathBuf::from("/ms-playwright/chromium-1100/chrome-linux/chrome");
    let ctx = RuleCtx {
        gateway_token: Some("tok-abcdef123456"),
        browser_executable: Some(&exe),
    };

    let first = migrate::migrate_config(&path, &ctx).unwrap();
    assert!(first.changed);
    assert_eq!(first.outcome, MigrationOutcome::Applied);
    let after_first = std::fs::read(&path).unwrap();

    let second = migrate::migrate_config(&path, &ctx).unwrap();
    assert!(!second.changed, "second pass must be a fixed point");
    assert_eq!(
        std::fs::read(&path).unwrap(),
        after_first,
        "file must be byte-identical after the second pass"
    );
}

#[test]
fn clean_document_is_not_rewritten() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "{}");

    // First run produces the migrated form.
    migrate::migrate_config(&path, &RuleCtx::default()).unwrap();
    let migrated = std::fs::read(&path).unwrap();

    // Re-running on the already-clean file must not touch it.
    let report = migrate::migrate_config(&path, &RuleCtx::default()).unwrap();
    assert!(!report.changed);
    assert_eq!(std::fs::read(&path).unwrap(), migrated);
}

// ─── Rule independence ───────────────────────────────────────────────────────

/// The structurally-independent rules (everything except token sync and the
/// discovery-dependent browser rule) must converge to the same document in
/// any application order.
#[test]
fn independent_rules_are_order_insensitive() {
    let independent: Vec<usize> = RULES
        .iter()
        .enumerate()
        .filter(|(_, r)| r.name != "sync-gateway-token" && r.name != "enable-browser-automation")
        .map(|(i, _)| i)
        .collect();

    let start = json!({
        "commands": {"ownerDisplay": "Claw", "restart": true},
        "channels": {"telegram": {"streaming": true}, "discord": {}},
        "gateway": {"trustedProxies": ["1.2.3.4/32"]}
    });
    let ctx = RuleCtx::default();

    let apply_in = |order: &[usize]| -> Value {
        let mut doc = start.clone();
        for &i in order {
            (RULES[i].apply)(&mut doc, &ctx);
        }
        doc
    };

    let forward = apply_in(&independent);

    let mut reversed = independent.clone();
    reversed.reverse();
    assert_eq!(apply_in(&reversed), forward, "reversed order diverged");

    let mut rotated = independent.clone();
    rotated.rotate_left(3);
    assert_eq!(apply_in(&rotated), forward, "rotated order diverged");
}

// ─── Ancestor creation ───────────────────────────────────────────────────────

#[test]
fn empty_document_gains_only_required_sections() {
    let mut doc = json!({});
    let changed = migrate::apply_rules(&mut doc, &RuleCtx::default());
    assert!(changed);

    assert!(doc.pointer("/gateway/controlUi").is_some());
    assert_eq!(
        doc.pointer("/gateway/controlUi/dangerouslyAllowHostHeaderOriginFallback"),
        Some(&json!(true))
    );
    assert_eq!(
        doc.pointer("/gateway/controlUi/dangerouslyDisableDeviceAuth"),
        Some(&json!(true))
    );
    assert_eq!(
        doc.pointer("/gateway/trustedProxies"),
        Some(&json!(["10.0.0.0/8", "172.16.0.0/12"]))
    );
    assert_eq!(doc.pointer("/agents/defaults/sandbox/mode"), Some(&json!("off")));
    assert_eq!(
        doc.pointer("/agents/defaults/sandbox/browser/allowHostControl"),
        Some(&json!(true))
    );

    // Without an env token or a discovered browser, only these two top-level
    // sections may be introduced.
    let mut keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["agents", "gateway"]);
}

// ─── Environment synchronizer ────────────────────────────────────────────────

#[test]
fn env_token_overrides_stale_config_token() {
    let mut doc = json!({"gateway": {"auth": {"token": "old", "mode": "password"}}});
    let ctx = RuleCtx {
        gateway_token: Some("new123"),
        ..Default::default()
    };
    migrate::apply_rules(&mut doc, &ctx);
    assert_eq!(doc.pointer("/gateway/auth/token"), Some(&json!("new123")));
    assert_eq!(doc.pointer("/gateway/auth/mode"), Some(&json!("token")));
}

#[test]
fn absent_env_token_leaves_config_token_alone() {
    let mut doc = json!({"gateway": {"auth": {"token": "old"}}});
    migrate::apply_rules(&mut doc, &RuleCtx::default());
    assert_eq!(doc.pointer("/gateway/auth/token"), Some(&json!("old")));
}

// ─── Skip paths ──────────────────────────────────────────────────────────────

#[test]
fn missing_config_is_a_clean_skip() {
    let dir = TempDir::new().unwrap();
    let report =
        migrate::migrate_config(&dir.path().join("openclaw.json"), &RuleCtx::default()).unwrap();
    assert_eq!(report.outcome, MigrationOutcome::SkippedNotFound);
    assert!(!report.changed);
    assert!(
        !dir.path().join("openclaw.json").exists(),
        "skip must not create the file"
    );
}

#[test]
fn malformed_config_raises_no_error_and_keeps_bytes() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "{not json");

    let report = migrate::migrate_config(&path, &RuleCtx::default()).unwrap();
    assert_eq!(report.outcome, MigrationOutcome::SkippedMalformed);
    assert!(!report.changed);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
}

// ─── Deprecated-field removal on a realistic document ────────────────────────

#[test]
fn deprecated_fields_are_removed_and_neighbors_kept() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "commands": {"ownerDisplay": "Claw", "restart": true},
            "channels": {
                "telegram": {"streaming": true, "botToken": "bt"},
                "whatsapp": {"streaming": "partial"}
            },
            "custom": {"untouched": 1}
        }"#,
    );

    migrate::migrate_config(&path, &RuleCtx::default()).unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(doc.pointer("/commands/ownerDisplay").is_none());
    assert_eq!(doc.pointer("/commands/restart"), Some(&json!(true)));
    assert!(doc.pointer("/channels/telegram/streaming").is_none());
    assert!(doc.pointer("/channels/whatsapp/streaming").is_none());
    assert_eq!(doc.pointer("/channels/telegram/botToken"), Some(&json!("bt")));
    assert_eq!(doc.pointer("/custom/untouched"), Some(&json!(1)));
}
