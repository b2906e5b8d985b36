//! The ordered patch-rule registry for config migration.
//!
//! Each rule is a named precondition/effect pair over the JSON document:
//! it checks one path, mutates it only when out of compliance, and reports
//! whether it changed anything. Rules create their own missing ancestors, so
//! every rule converges to the same fixed point from any starting shape and
//! the set as a whole is idempotent.

use std::path::Path;

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::paths::DEFAULT_PROFILE;

/// Fixed trusted reverse-proxy ranges for container networks.
pub const TRUSTED_PROXIES: [&str; 2] = ["10.0.0.0/8", "172.16.0.0/12"];

/// Inputs a rule may need beyond the document itself.
///
/// Captured once at boot and passed in explicitly — rules never read the
/// process environment or the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleCtx<'a> {
    /// Gateway access token from the environment, if set and non-empty.
    pub gateway_token: Option<&'a str>,
    /// Browser executable found by runtime discovery, if any.
    pub browser_executable: Option<&'a Path>,
}

/// A single idempotent corrective transformation.
pub struct PatchRule {
    /// Stable name used in log narration.
    pub name: &'static str,
    /// Applies the rule; returns true if the document was mutated.
    pub apply: fn(&mut Value, &RuleCtx) -> bool,
}

/// The full rule list, in application order.
pub const RULES: &[PatchRule] = &[
    PatchRule {
        name: "remove-owner-display",
        apply: remove_owner_display,
    },
    PatchRule {
        name: "remove-channel-streaming",
        apply: remove_channel_streaming,
    },
    PatchRule {
        name: "control-ui-origin-fallback",
        apply: control_ui_origin_fallback,
    },
    PatchRule {
        name: "disable-device-auth",
        apply: disable_device_auth,
    },
    PatchRule {
        name: "trusted-proxies",
        apply: trusted_proxies,
    },
    PatchRule {
        name: "sync-gateway-token",
        apply: sync_gateway_token,
    },
    PatchRule {
        name: "sandbox-mode-off",
        apply: sandbox_mode_off,
    },
    PatchRule {
        name: "browser-host-control",
        apply: browser_host_control,
    },
    PatchRule {
        name: "enable-browser-automation",
        apply: enable_browser_automation,
    },
];

// ─── Ancestor helpers ────────────────────────────────────────────────────────

/// Descend into `doc` along `path`, creating empty objects for missing or
/// non-object intermediate values. Returns the target map and whether any
/// ancestor had to be created.
///
/// The engine only hands rules documents whose root is an object.
fn ensure_object_mut<'a>(
    doc: &'a mut Value,
    path: &[&str],
) -> (&'a mut Map<String, Value>, bool) {
    let mut created = false;
    let mut cur = doc;
    for key in path {
        let map = cur
            .as_object_mut()
            .expect("ancestor initialized as object");
        if !matches!(map.get(*key), Some(Value::Object(_))) {
            map.insert((*key).to_string(), Value::Object(Map::new()));
            created = true;
        }
        cur = map.get_mut(*key).expect("present after init");
    }
    (
        cur.as_object_mut().expect("ancestor initialized as object"),
        created,
    )
}

/// Set `key` in the object at `path` unless it already holds `value`.
fn set_if_differs(doc: &mut Value, path: &[&str], key: &str, value: Value) -> bool {
    let (map, created) = ensure_object_mut(doc, path);
    if map.get(key) == Some(&value) {
        return created;
    }
    map.insert(key.to_string(), value);
    true
}

/// Mask a secret for logging: keep a short prefix, hide the rest.
fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    if token.chars().count() <= 6 {
        "***".to_string()
    } else {
        format!("{prefix}***")
    }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Rule 1: drop the deprecated `commands.ownerDisplay` field.
fn remove_owner_display(doc: &mut Value, _ctx: &RuleCtx) -> bool {
    match doc.pointer_mut("/commands").and_then(Value::as_object_mut) {
        Some(commands) => commands.remove("ownerDisplay").is_some(),
        None => false,
    }
}

/// Rule 2: drop the deprecated `streaming` flag from every channel block.
///
/// Observed in the wild under `channels.telegram`, but any channel carrying
/// the flag gets the same treatment.
fn remove_channel_streaming(doc: &mut Value, _ctx: &RuleCtx) -> bool {
    let Some(channels) = doc.pointer_mut("/channels").and_then(Value::as_object_mut) else {
        return false;
    };
    let mut changed = false;
    for (name, block) in channels.iter_mut() {
        if let Some(obj) = block.as_object_mut() {
            if obj.remove("streaming").is_some() {
                info!(channel = %name, "removed deprecated channel streaming flag");
                changed = true;
            }
        }
    }
    changed
}

/// Rule 3: make sure `gateway.controlUi` exists and the host-header origin
/// fallback is enabled when the flag is absent. An explicit `false` set by an
/// operator is left alone.
fn control_ui_origin_fallback(doc: &mut Value, _ctx: &RuleCtx) -> bool {
    let (control_ui, created) = ensure_object_mut(doc, &["gateway", "controlUi"]);
    if control_ui.contains_key("dangerouslyAllowHostHeaderOriginFallback") {
        return created;
    }
    control_ui.insert(
        "dangerouslyAllowHostHeaderOriginFallback".to_string(),
        Value::Bool(true),
    );
    true
}

/// Rule 4: force device-pairing auth off for the control UI.
fn disable_device_auth(doc: &mut Value, _ctx: &RuleCtx) -> bool {
    let changed = set_if_differs(
        doc,
        &["gateway", "controlUi"],
        "dangerouslyDisableDeviceAuth",
        Value::Bool(true),
    );
    if changed {
        info!("control UI device pairing auth disabled");
    }
    changed
}

/// Rule 5: pin `gateway.trustedProxies` to the fixed private-range pair.
///
/// Any differing list — including an operator's custom one — is replaced;
/// the old value is logged at warn level so the clobber is visible.
fn trusted_proxies(doc: &mut Value, _ctx: &RuleCtx) -> bool {
    let fixed = json!(TRUSTED_PROXIES);
    let (gateway, created) = ensure_object_mut(doc, &["gateway"]);
    if gateway.get("trustedProxies") == Some(&fixed) {
        return created;
    }
    if let Some(old) = gateway.get("trustedProxies") {
        warn!(old = %old, new = %fixed, "replacing gateway.trustedProxies");
    }
    gateway.insert("trustedProxies".to_string(), fixed);
    true
}

/// Rule 6 (environment synchronizer): copy the gateway access token from the
/// environment over a stale persisted one.
///
/// No-op when the env token is unset — an absent variable never clears a
/// stored token.
fn sync_gateway_token(doc: &mut Value, ctx: &RuleCtx) -> bool {
    let Some(token) = ctx.gateway_token else {
        return false;
    };
    let (auth, created) = ensure_object_mut(doc, &["gateway", "auth"]);
    if auth.get("token").and_then(Value::as_str) == Some(token) {
        return created;
    }
    let old = auth
        .get("token")
        .and_then(Value::as_str)
        .map(mask_token)
        .unwrap_or_else(|| "<unset>".to_string());
    info!(old = %old, new = %mask_token(token), "syncing gateway auth token from environment");
    auth.insert("token".to_string(), Value::String(token.to_string()));
    auth.insert("mode".to_string(), Value::String("token".to_string()));
    true
}

/// Rule 7: agent sandboxing is off inside the container (the container is
/// the sandbox).
fn sandbox_mode_off(doc: &mut Value, _ctx: &RuleCtx) -> bool {
    set_if_differs(
        doc,
        &["agents", "defaults", "sandbox"],
        "mode",
        Value::String("off".to_string()),
    )
}

/// Rule 8: agents may drive the host browser profile.
fn browser_host_control(doc: &mut Value, _ctx: &RuleCtx) -> bool {
    set_if_differs(
        doc,
        &["agents", "defaults", "sandbox", "browser"],
        "allowHostControl",
        Value::Bool(true),
    )
}

/// Rule 9: enable browser automation, but only when discovery actually found
/// an executable — a config pointing at a nonexistent binary is worse than
/// one with automation off.
fn enable_browser_automation(doc: &mut Value, ctx: &RuleCtx) -> bool {
    let Some(exe) = ctx.browser_executable else {
        return false;
    };
    let mut changed = false;
    changed |= set_if_differs(doc, &["browser"], "enabled", Value::Bool(true));
    changed |= set_if_differs(doc, &["browser"], "headless", Value::Bool(true));
    changed |= set_if_differs(doc, &["browser"], "noSandbox", Value::Bool(true));
    changed |= set_if_differs(
        doc,
        &["browser"],
        "defaultProfile",
        Value::String(DEFAULT_PROFILE.to_string()),
    );
    changed |= set_if_differs(
        doc,
        &["browser"],
        "executablePath",
        Value::String(exe.to_string_lossy().into_owned()),
    );
    if changed {
        info!(executable = %exe.display(), "browser automation enabled");
    }
    changed
}
