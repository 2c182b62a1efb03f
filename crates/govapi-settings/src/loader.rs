//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`GovapiSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::GovapiSettings;

/// Env var naming an alternate settings file.
pub const CONFIG_PATH_ENV: &str = "GOVAPI_CONFIG";

/// Resolve the settings file path: `$GOVAPI_CONFIG`, else `./govapi.json`.
pub fn settings_path() -> PathBuf {
    read_env_string(CONFIG_PATH_ENV).map_or_else(|| PathBuf::from("govapi.json"), PathBuf::from)
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults (plus env overrides). If the
/// file contains invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<GovapiSettings> {
    load_with(path, |name| std::env::var(name).ok())
}

/// [`load_settings_from_path`] with an explicit variable lookup.
pub fn load_with<F>(path: &Path, lookup: F) -> Result<GovapiSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(GovapiSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: GovapiSettings = serde_json::from_value(merged)?;
    apply_overrides(&mut settings, lookup);
    validate(&settings)?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply overrides read through `lookup`.
///
/// Each variable has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are ignored with a warning (fall back to file/default)
/// - Empty strings count as unset
pub fn apply_overrides<F>(settings: &mut GovapiSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string("GOVAPI_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.u16("GOVAPI_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.string("GOVAPI_ENVIRONMENT") {
        settings.server.environment = v;
    }
    if let Some(v) = env.u64("GOVAPI_REQUEST_TIMEOUT_SECS", 1, 3600) {
        settings.server.request_timeout_secs = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("GOVAPI_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("GOVAPI_LOG_JSON") {
        settings.logging.json = v;
    }

    // ── Management API ──────────────────────────────────────────────
    if let Some(v) = env.string("GOVAPI_MANAGEMENT_ENDPOINT") {
        settings.management.endpoint = v;
    }

    // ── Security ────────────────────────────────────────────────────
    if let Some(v) = env.string("API_KEY") {
        settings.security.api_key = Some(v);
    }

    // ── Identity ────────────────────────────────────────────────────
    if let Some(v) = env.string("AZURE_TENANT_ID") {
        settings.identity.tenant_id = Some(v);
    }
    if let Some(v) = env.string("AZURE_CLIENT_ID") {
        settings.identity.client_id = Some(v);
    }
    if let Some(v) = env.string("AZURE_CLIENT_SECRET") {
        settings.identity.client_secret = Some(v);
    }
    if let Some(v) = env.string("AZURE_AUTHORITY_HOST") {
        settings.identity.authority_host = v;
    }
    if let Some(v) = env.string("UAMI_CLIENT_ID") {
        settings.identity.managed_identity_client_id = Some(v);
    }
    if let Some(v) = env.string("AZURE_ACCESS_TOKEN") {
        settings.identity.access_token = Some(v);
    }
}

/// Reject values that would make the server unusable.
pub fn validate(settings: &GovapiSettings) -> Result<()> {
    if settings.server.port == 0 {
        return Err(SettingsError::InvalidValue("server.port must be non-zero".into()));
    }
    if settings.server.request_timeout_secs == 0 {
        return Err(SettingsError::InvalidValue(
            "server.requestTimeoutSecs must be at least 1".into(),
        ));
    }
    for (key, url) in [
        ("management.endpoint", &settings.management.endpoint),
        ("identity.authorityHost", &settings.identity.authority_host),
    ] {
        if !is_http_url(url) {
            return Err(SettingsError::InvalidValue(format!(
                "{key} must be an http(s) URL, got '{url}'"
            )));
        }
    }
    if settings.management.api_version.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "management.apiVersion must not be empty".into(),
        ));
    }
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = self.string(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        let val = self.string(name)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn no_vars(_: &str) -> Option<String> {
        None
    }

    fn write_settings(json: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("govapi.json");
        std::fs::write(&path, json).unwrap();
        (dir, path)
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 8080, "host": "localhost"}});
        let source = serde_json::json!({"server": {"port": 9090}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "localhost");
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4, 5]});
        assert_eq!(deep_merge(target, source)["items"], serde_json::json!([4, 5]));
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        assert_eq!(deep_merge(target, source)["a"], 42);
    }

    #[test]
    fn merge_new_keys_added() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"b": 2}));
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    // ── load_with ───────────────────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_with(Path::new("/nonexistent/govapi.json"), no_vars).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.management.endpoint, "https://management.azure.com");
    }

    #[test]
    fn load_partial_json_overrides() {
        let (_dir, path) = write_settings(
            r#"{"server": {"port": 9090, "environment": "Development"}, "logging": {"json": true}}"#,
        );
        let settings = load_with(&path, no_vars).unwrap();
        assert_eq!(settings.server.port, 9090);
        assert!(settings.server.is_development());
        assert!(settings.logging.json);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.request_timeout_secs, 60);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let (_dir, path) = write_settings("not valid json");
        assert_matches!(load_with(&path, no_vars), Err(SettingsError::Json(_)));
    }

    #[test]
    fn load_wrong_type_returns_error() {
        let (_dir, path) = write_settings(r#"{"server": {"port": "eighty"}}"#);
        assert_matches!(load_with(&path, no_vars), Err(SettingsError::Json(_)));
    }

    #[test]
    fn load_rejects_invalid_endpoint() {
        let (_dir, path) = write_settings(r#"{"management": {"endpoint": "ftp://nope"}}"#);
        let err = load_with(&path, no_vars).unwrap_err();
        assert_matches!(err, SettingsError::InvalidValue(ref m) if m.contains("management.endpoint"));
    }

    #[test]
    fn load_rejects_zero_timeout() {
        let (_dir, path) = write_settings(r#"{"server": {"requestTimeoutSecs": 0}}"#);
        assert_matches!(load_with(&path, no_vars), Err(SettingsError::InvalidValue(_)));
    }

    #[test]
    fn env_beats_file() {
        let (_dir, path) = write_settings(r#"{"server": {"port": 9090}, "security": {"apiKey": "from-file"}}"#);
        let settings = load_with(
            &path,
            vars(&[("GOVAPI_PORT", "7000"), ("API_KEY", "from-env")]),
        )
        .unwrap();
        assert_eq!(settings.server.port, 7000);
        assert_eq!(settings.security.api_key.as_deref(), Some("from-env"));
    }

    // ── apply_overrides ─────────────────────────────────────────────

    #[test]
    fn overrides_every_section() {
        let mut settings = GovapiSettings::default();
        apply_overrides(
            &mut settings,
            vars(&[
                ("GOVAPI_HOST", "127.0.0.1"),
                ("GOVAPI_ENVIRONMENT", "Development"),
                ("GOVAPI_REQUEST_TIMEOUT_SECS", "15"),
                ("GOVAPI_LOG_LEVEL", "debug"),
                ("GOVAPI_LOG_JSON", "yes"),
                ("GOVAPI_MANAGEMENT_ENDPOINT", "http://localhost:9999"),
                ("AZURE_TENANT_ID", "tenant"),
                ("AZURE_CLIENT_ID", "client"),
                ("AZURE_CLIENT_SECRET", "secret"),
                ("AZURE_AUTHORITY_HOST", "https://login.example"),
                ("UAMI_CLIENT_ID", "uami"),
                ("AZURE_ACCESS_TOKEN", "tok"),
            ]),
        );
        assert_eq!(settings.server.host, "127.0.0.1");
        assert!(settings.server.is_development());
        assert_eq!(settings.server.request_timeout_secs, 15);
        assert_eq!(settings.logging.level, "debug");
        assert!(settings.logging.json);
        assert_eq!(settings.management.endpoint, "http://localhost:9999");
        assert_eq!(
            settings.identity.client_secret_parts(),
            Some(("tenant", "client", "secret"))
        );
        assert_eq!(settings.identity.authority_host, "https://login.example");
        assert_eq!(settings.identity.managed_identity_client_id.as_deref(), Some("uami"));
        assert_eq!(settings.identity.access_token.as_deref(), Some("tok"));
    }

    #[test]
    fn invalid_values_are_ignored() {
        let mut settings = GovapiSettings::default();
        apply_overrides(
            &mut settings,
            vars(&[
                ("GOVAPI_PORT", "0"),
                ("GOVAPI_REQUEST_TIMEOUT_SECS", "forever"),
                ("GOVAPI_LOG_JSON", "maybe"),
            ]),
        );
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.request_timeout_secs, 60);
        assert!(!settings.logging.json);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let mut settings = GovapiSettings::default();
        apply_overrides(&mut settings, vars(&[("API_KEY", ""), ("GOVAPI_HOST", "")]));
        assert!(settings.security.api_key.is_none());
        assert_eq!(settings.server.host, "0.0.0.0");
    }

    // ── parse helpers ───────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for val in ["true", "1", "yes", "on", "TRUE", "Yes"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
        for val in ["false", "0", "no", "off", "OFF"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn parse_u16_bounds() {
        assert_eq!(parse_u16_range("9090", 1, 65535), Some(9090));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u16_range("99999", 1, 65535), None);
        assert_eq!(parse_u16_range("abc", 1, 65535), None);
    }

    #[test]
    fn parse_u64_bounds() {
        assert_eq!(parse_u64_range("30", 1, 3600), Some(30));
        assert_eq!(parse_u64_range("0", 1, 3600), None);
        assert_eq!(parse_u64_range("3601", 1, 3600), None);
    }
}
