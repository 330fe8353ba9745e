//! tkt-config
//!
//! Layered YAML settings for the ticket gate plus environment overrides.
//!
//! # Contract
//! - YAML documents hold non-secret settings and the env var NAMES that carry
//!   credentials. Key material inside a YAML leaf aborts loading.
//! - Documents merge in order: earlier docs are base, later docs override.
//! - Environment overrides (`SHEET_ID`, `FRONTEND_URL`, ...) are applied once
//!   by the binary at startup via [`TktConfig::apply_env_overrides`].
//! - Credentials are resolved separately by [`secrets::resolve_credentials`].

pub mod secrets;

use std::fmt;
use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Leaf values starting with any of these are treated as inline secrets.
const SECRET_PREFIXES: &[&str] = &[
    "-----BEGIN", // PEM private keys
    "sk-",
    "sk_live",
    "ya29.", // Google OAuth access tokens
    "AKIA",
    "ghp_",
    "glpat-",
    "xoxb-",
];

/// Env var that points at the YAML settings file.
pub const ENV_CONFIG_PATH: &str = "TKT_CONFIG";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Configuration failures. All of these are fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value is absent. `var` names the env var or YAML key.
    Missing { what: &'static str, var: String },
    /// A YAML leaf carries something that looks like key material.
    SecretDetected { pointer: String },
    /// A file could not be read or parsed, or a value is out of range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { what, var } => write!(
                f,
                "CONFIG_MISSING: required value '{var}' ({what}) is not set or empty"
            ),
            ConfigError::SecretDetected { pointer } => {
                write!(f, "CONFIG_SECRET_DETECTED leaf={pointer} value=REDACTED")
            }
            ConfigError::Invalid(msg) => write!(f, "CONFIG_INVALID: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Which backing store the ledger accessor talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMode {
    /// Google Sheets over REST. Needs a sheet id and service credentials.
    Sheets,
    /// In-process demonstration ledger. Nothing persists.
    Demo,
}

impl LedgerMode {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sheets" => Ok(LedgerMode::Sheets),
            "demo" => Ok(LedgerMode::Demo),
            other => Err(ConfigError::Invalid(format!(
                "unknown ledger mode '{other}'; expected one of: sheets | demo"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    pub mode: LedgerMode,
    /// Spreadsheet id. Required in `sheets` mode.
    pub sheet_id: Option<String>,
    /// Tab name used in A1 ranges.
    pub sheet_name: String,
    /// Numeric tab id used by formatting requests.
    pub sheet_gid: i64,
    /// Per-request limit for ledger and token calls.
    pub request_timeout_secs: u64,
    /// How many leading columns the exhausted highlight covers.
    pub highlight_columns: u32,
    pub api_base_url: String,
    pub token_url: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            mode: LedgerMode::Sheets,
            sheet_id: None,
            sheet_name: "Sheet1".to_string(),
            sheet_gid: 0,
            request_timeout_secs: 30,
            highlight_columns: 20,
            api_base_url: "https://sheets.googleapis.com".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
    /// The single browser origin allowed through CORS.
    pub allowed_origin: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            allowed_origin: "http://localhost:5173".to_string(),
        }
    }
}

/// When the exhausted highlight is applied after a redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HighlightPolicy {
    /// After every successful redemption.
    #[default]
    Always,
    /// Only once the last allotted ticket has been used.
    WhenExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineSettings {
    /// Serialize redemptions of the same identifier inside this process.
    pub serialize_redemptions: bool,
    pub highlight: HighlightPolicy,
}

/// Env var NAMES holding the service credentials. Never the values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialEnvNames {
    pub principal_env: String,
    pub private_key_env: String,
}

impl Default for CredentialEnvNames {
    fn default() -> Self {
        Self {
            principal_env: "GOOGLE_SERVICE_ACCOUNT_EMAIL".to_string(),
            private_key_env: "GOOGLE_PRIVATE_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TktConfig {
    pub ledger: LedgerSettings,
    pub server: ServerSettings,
    pub engine: EngineSettings,
    pub credentials: CredentialEnvNames,
}

impl TktConfig {
    /// Apply environment overrides through `lookup`.
    ///
    /// | Var               | Field                    |
    /// |-------------------|--------------------------|
    /// | `SHEET_ID`        | `ledger.sheet_id`        |
    /// | `TKT_LEDGER_MODE` | `ledger.mode`            |
    /// | `FRONTEND_URL`    | `server.allowed_origin`  |
    /// | `TKT_DAEMON_ADDR` | `server.bind_addr`       |
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(id) = get("SHEET_ID") {
            self.ledger.sheet_id = Some(id.trim().to_string());
        }
        if let Some(mode) = get("TKT_LEDGER_MODE") {
            self.ledger.mode = LedgerMode::parse(&mode)?;
        }
        if let Some(origin) = get("FRONTEND_URL") {
            self.server.allowed_origin = origin.trim().to_string();
        }
        if let Some(addr) = get("TKT_DAEMON_ADDR") {
            self.server.bind_addr = addr.trim().to_string();
        }
        Ok(())
    }

    /// Check cross-field requirements. Runs after overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.mode == LedgerMode::Sheets {
            let blank = self
                .ledger
                .sheet_id
                .as_deref()
                .map(|s| s.trim().is_empty())
                .unwrap_or(true);
            if blank {
                return Err(ConfigError::Missing {
                    what: "ledger identifier",
                    var: "SHEET_ID".to_string(),
                });
            }
        }
        if self.ledger.highlight_columns == 0 {
            return Err(ConfigError::Invalid(
                "ledger.highlight_columns must be at least 1".to_string(),
            ));
        }
        if self.ledger.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "ledger.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.ledger.sheet_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "ledger.sheet_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// sha256 of the canonical JSON form; logged at startup.
    pub config_hash: String,
    pub canonical_json: String,
    pub config: TktConfig,
}

impl LoadedConfig {
    fn from_config(config: TktConfig) -> Result<Self, ConfigError> {
        let canonical_json = serde_json::to_string(&config)
            .map_err(|e| ConfigError::Invalid(format!("canonical json serialize failed: {e}")))?;
        let config_hash = sha256_hex(canonical_json.as_bytes());
        Ok(Self {
            config_hash,
            canonical_json,
            config,
        })
    }

    /// Apply env overrides, validate, and refresh the hash.
    pub fn finish<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.config.apply_env_overrides(lookup)?;
        self.config.validate()?;
        Self::from_config(self.config)
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig, ConfigError> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw = fs::read_to_string(p)
            .map_err(|e| ConfigError::Invalid(format!("failed to read yaml path {p}: {e}")))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig, ConfigError> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw)
            .map_err(|e| ConfigError::Invalid(format!("invalid yaml: {e}")))?;
        let v_json = serde_json::to_value(v_yaml)
            .map_err(|e| ConfigError::Invalid(format!("yaml->json conversion failed: {e}")))?;
        // An empty document parses as null; treat it as "no settings".
        if !v_json.is_null() {
            merged = deep_merge(merged, v_json);
        }
    }

    enforce_no_secret_literals(&merged)?;

    let config: TktConfig = serde_json::from_value(merged)
        .map_err(|e| ConfigError::Invalid(format!("settings do not match schema: {e}")))?;
    LoadedConfig::from_config(config)
}

/// Load the file named by `path` (or `TKT_CONFIG`, or nothing) and apply
/// process environment overrides.
pub fn load_from_env(path: Option<&str>) -> Result<LoadedConfig, ConfigError> {
    load_with(path, |name| std::env::var(name).ok())
}

/// [`load_from_env`] with every variable read through `lookup`, including
/// `TKT_CONFIG`.
pub fn load_with<F>(path: Option<&str>, lookup: F) -> Result<LoadedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = lookup(ENV_CONFIG_PATH);
    let path = path.or(from_env.as_deref()).filter(|p| !p.trim().is_empty());

    let loaded = match path {
        Some(p) => load_layered_yaml(&[p])?,
        None => load_layered_yaml_from_strings(&[])?,
    };
    loaded.finish(lookup)
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<(), ConfigError> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        if let Some(s) = v.pointer(&ptr).and_then(Value::as_str) {
            if looks_like_secret(s) {
                return Err(ConfigError::SecretDetected { pointer: ptr });
            }
        }
    }
    Ok(())
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, k.replace('~', "~0").replace('/', "~1"));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                collect_leaf_pointers(vv, &format!("{prefix}/{i}"), out);
            }
        }
        _ => out.push(prefix.to_string()),
    }
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    t.len() >= 8 && SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_defaults() {
        let loaded = load_layered_yaml_from_strings(&[]).unwrap();
        assert_eq!(loaded.config, TktConfig::default());
        assert_eq!(loaded.config.ledger.request_timeout_secs, 30);
        assert_eq!(loaded.config.ledger.highlight_columns, 20);
        assert!(!loaded.config.engine.serialize_redemptions);
    }

    #[test]
    fn later_docs_override_earlier() {
        let base = "ledger:\n  sheet_name: Tickets\n  highlight_columns: 8\n";
        let over = "ledger:\n  highlight_columns: 12\nengine:\n  serialize_redemptions: true\n";
        let cfg = load_layered_yaml_from_strings(&[base, over]).unwrap().config;
        assert_eq!(cfg.ledger.sheet_name, "Tickets");
        assert_eq!(cfg.ledger.highlight_columns, 12);
        assert!(cfg.engine.serialize_redemptions);
    }

    #[test]
    fn hash_is_stable_for_equal_settings() {
        let a = load_layered_yaml_from_strings(&["ledger:\n  sheet_gid: 7\n"]).unwrap();
        let b = load_layered_yaml_from_strings(&["ledger:\n  sheet_gid: 7\n"]).unwrap();
        let c = load_layered_yaml_from_strings(&["ledger:\n  sheet_gid: 8\n"]).unwrap();
        assert_eq!(a.config_hash, b.config_hash);
        assert_ne!(a.config_hash, c.config_hash);
        assert_eq!(a.config_hash.len(), 64);
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = TktConfig::default();
        cfg.apply_env_overrides(|name| match name {
            "SHEET_ID" => Some("  abc123 ".to_string()),
            "FRONTEND_URL" => Some("https://gate.example.org".to_string()),
            "TKT_LEDGER_MODE" => Some("DEMO".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.ledger.sheet_id.as_deref(), Some("abc123"));
        assert_eq!(cfg.server.allowed_origin, "https://gate.example.org");
        assert_eq!(cfg.ledger.mode, LedgerMode::Demo);
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:3001");
    }

    #[test]
    fn sheets_mode_requires_sheet_id() {
        let err = TktConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
        assert!(err.to_string().contains("SHEET_ID"));
    }

    #[test]
    fn demo_mode_needs_no_sheet_id() {
        let mut cfg = TktConfig::default();
        cfg.ledger.mode = LedgerMode::Demo;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_mode_rejected() {
        let mut cfg = TktConfig::default();
        let err = cfg
            .apply_env_overrides(|n| (n == "TKT_LEDGER_MODE").then(|| "excel".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("unknown ledger mode"));
    }

    #[test]
    fn zero_highlight_columns_rejected() {
        let mut cfg = TktConfig::default();
        cfg.ledger.mode = LedgerMode::Demo;
        cfg.ledger.highlight_columns = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_request_timeout_rejected() {
        let mut cfg = TktConfig::default();
        cfg.ledger.mode = LedgerMode::Demo;
        cfg.ledger.request_timeout_secs = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn highlight_policy_parses_snake_case() {
        let cfg = load_layered_yaml_from_strings(&["engine:\n  highlight: when_exhausted\n"])
            .unwrap()
            .config;
        assert_eq!(cfg.engine.highlight, HighlightPolicy::WhenExhausted);
    }
}
