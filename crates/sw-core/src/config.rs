//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. slotwise.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use std::net::SocketAddr;
use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::SlotPolicy;
use crate::time::parse_timezone;

/// Default config file looked up by [`Config::load`]
pub const CONFIG_FILE: &str = "slotwise.toml";

/// Main configuration for slotwise
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Calendar provider configuration
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Bearer-token protection of the HTTP surface
    #[serde(default)]
    pub api: ApiConfig,

    /// Slot computation defaults
    #[serde(default)]
    pub slots: SlotsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Service-account key: a file path or the JSON document itself
    pub credentials: Option<String>,

    /// Calendar to query and book into
    pub calendar_id: Option<String>,

    /// Pre-issued OAuth access token, used instead of the service account
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    /// Provider base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// IANA name of the timezone slots are rendered in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Overall timeout for each provider request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            calendar_id: None,
            access_token: None,
            api_base_url: default_api_base_url(),
            timezone: default_timezone(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Address the HTTP server binds to
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::configuration(format!("Invalid listen address: {}", e)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bearer token required on the tool-manifest routes when set
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Also require the token on the REST endpoints
    #[serde(default)]
    pub protect_tools: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsConfig {
    /// Policy used when a request does not choose one
    #[serde(default)]
    pub policy: SlotPolicy,

    /// Duration used when a request does not give one
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: i64,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            policy: SlotPolicy::default(),
            default_duration_minutes: default_duration_minutes(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_duration_minutes() -> i64 {
    60
}

impl Config {
    /// `${VAR_NAME}` 形式の文字列を `lookup` の値に置換する
    ///
    /// 存在しない変数は空文字列になります。閉じ括弧のない `${` はそのまま残します。
    fn expand_vars(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
        let mut result = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(pos) = rest.find("${") {
            result.push_str(&rest[..pos]);
            let after = &rest[pos + 2..];
            match after.find('}') {
                Some(close) => {
                    let name = &after[..close];
                    if let Some(v) = lookup(name) {
                        result.push_str(&v);
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    result.push_str(&rest[pos..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);

        result
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換され、
    /// その後、環境変数による上書きが適用されます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut cfg = Self::from_toml_str(&toml_content, env_lookup)?;
        cfg.apply_env_overrides();

        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(cfg)
    }

    /// Parse TOML text, expanding `${VAR}` references through `lookup`
    fn from_toml_str(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let expanded = Self::expand_vars(content, lookup);
        let toml: TomlConfig = toml::from_str(&expanded)
            .map_err(|e| Error::configuration(format!("Failed to parse TOML: {}", e)))?;
        Ok(Self::from_toml_config(toml))
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// `./slotwise.toml` があればそれを使い、なければ環境変数のみから構築します。
    pub fn load() -> Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_toml_file(CONFIG_FILE);
        }

        Ok(Self::from_env())
    }

    /// Build configuration from environment variables alone
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        cfg.apply_overrides(lookup);
        cfg
    }

    /// TOML 構造から Config を構築
    fn from_toml_config(toml: TomlConfig) -> Self {
        let calendar = toml.calendar.unwrap_or_default();
        let server = toml.server.unwrap_or_default();
        let api = toml.api.unwrap_or_default();
        let slots = toml.slots.unwrap_or_default();

        Config {
            calendar: CalendarConfig {
                credentials: calendar.credentials.filter(|s| !s.is_empty()),
                calendar_id: calendar.calendar_id.filter(|s| !s.is_empty()),
                access_token: calendar.access_token.filter(|s| !s.is_empty()),
                api_base_url: calendar.api_base_url.unwrap_or_else(default_api_base_url),
                timezone: calendar.timezone.unwrap_or_else(default_timezone),
                timeout_secs: calendar.timeout_secs.unwrap_or_else(default_timeout_secs),
            },
            server: ServerConfig {
                host: server.host.unwrap_or_else(default_host),
                port: server.port.unwrap_or_else(default_port),
            },
            api: ApiConfig {
                token: api.token.filter(|s| !s.is_empty()),
                protect_tools: api.protect_tools.unwrap_or(false),
            },
            slots: SlotsConfig {
                policy: slots.policy.unwrap_or_default(),
                default_duration_minutes: slots
                    .default_duration_minutes
                    .unwrap_or_else(default_duration_minutes),
            },
        }
    }

    /// 環境変数で設定を上書きする
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(env_lookup);
    }

    /// 変数ソースで設定を上書きする（空の値は未設定として扱う）
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // カレンダー設定
        if let Some(credentials) = get("GOOGLE_APPLICATION_CREDENTIALS") {
            self.calendar.credentials = Some(credentials);
        }
        if let Some(calendar_id) = get("GOOGLE_CALENDAR_ID") {
            self.calendar.calendar_id = Some(calendar_id);
        }
        if let Some(token) = get("GOOGLE_ACCESS_TOKEN") {
            self.calendar.access_token = Some(token);
        }
        if let Some(base_url) = get("GOOGLE_API_BASE_URL") {
            self.calendar.api_base_url = base_url;
        }
        if let Some(timezone) = get("DEFAULT_TIMEZONE") {
            self.calendar.timezone = timezone;
        }
        if let Some(secs) = get("CALENDAR_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(s) => self.calendar.timeout_secs = s,
                Err(_) => tracing::warn!(value = %secs, "Ignoring invalid CALENDAR_TIMEOUT_SECS"),
            }
        }

        // サーバー設定
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid PORT"),
            }
        }

        // API 設定
        if let Some(token) = get("API_TOKEN") {
            self.api.token = Some(token);
        }
        if let Some(protect) = get("API_PROTECT_TOOLS") {
            self.api.protect_tools = parse_flag(&protect);
        }

        // スロット設定
        if let Some(policy) = get("SLOT_POLICY") {
            match policy.parse() {
                Ok(p) => self.slots.policy = p,
                Err(_) => tracing::warn!(value = %policy, "Ignoring invalid SLOT_POLICY"),
            }
        }
        if let Some(minutes) = get("DEFAULT_DURATION_MINUTES") {
            match minutes.parse() {
                Ok(m) => self.slots.default_duration_minutes = m,
                Err(_) => tracing::warn!(value = %minutes, "Ignoring invalid DEFAULT_DURATION_MINUTES"),
            }
        }
    }

    /// Resolve the configured default timezone
    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.calendar.timezone)
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

// ============================================================================
// TOML 構造体定義（ファイル解析用）
// ============================================================================

/// TOML ファイル用のトップレベル構造
#[derive(Debug, Deserialize)]
struct TomlConfig {
    calendar: Option<TomlCalendarConfig>,
    server: Option<TomlServerConfig>,
    api: Option<TomlApiConfig>,
    slots: Option<TomlSlotsConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlCalendarConfig {
    credentials: Option<String>,
    calendar_id: Option<String>,
    access_token: Option<String>,
    api_base_url: Option<String>,
    timezone: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlServerConfig {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlApiConfig {
    token: Option<String>,
    protect_tools: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlSlotsConfig {
    policy: Option<SlotPolicy>,
    default_duration_minutes: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.calendar.api_base_url, "https://www.googleapis.com");
        assert_eq!(config.calendar.timezone, "UTC");
        assert_eq!(config.calendar.timeout_secs, 30);
        assert_eq!(config.server.port, 5000);
        assert!(config.api.token.is_none());
        assert!(!config.api.protect_tools);
        assert_eq!(config.slots.policy, SlotPolicy::Gaps);
        assert_eq!(config.slots.default_duration_minutes, 60);
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };
        assert_eq!(server.socket_addr().unwrap().to_string(), "127.0.0.1:8080");

        let bad = ServerConfig {
            host: "not a host".to_string(),
            port: 8080,
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_CALENDAR_ID", "team@example.com"),
            ("DEFAULT_TIMEZONE", "Europe/Stockholm"),
            ("PORT", "8081"),
            ("API_TOKEN", "secret"),
            ("API_PROTECT_TOOLS", "true"),
            ("SLOT_POLICY", "grid"),
            ("DEFAULT_DURATION_MINUTES", "30"),
        ]));

        assert_eq!(config.calendar.calendar_id.as_deref(), Some("team@example.com"));
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Stockholm);
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert!(config.api.protect_tools);
        assert_eq!(config.slots.policy, SlotPolicy::Grid);
        assert_eq!(config.slots.default_duration_minutes, 30);
    }

    #[test]
    fn test_empty_and_invalid_values_are_ignored() {
        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_CALENDAR_ID", "  "),
            ("API_TOKEN", ""),
            ("PORT", "eighty"),
            ("SLOT_POLICY", "hourly"),
        ]));

        assert!(config.calendar.calendar_id.is_none());
        assert!(config.api.token.is_none());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.slots.policy, SlotPolicy::Gaps);
    }

    #[test]
    fn test_unknown_timezone_is_configuration_error() {
        let config = Config::from_lookup(lookup(&[("DEFAULT_TIMEZONE", "Nowhere/Special")]));
        assert!(matches!(config.timezone(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_expand_vars() {
        let vars = lookup(&[("SW_TEST_VAR", "test_value")]);
        assert_eq!(
            Config::expand_vars("prefix_${SW_TEST_VAR}_suffix", &vars),
            "prefix_test_value_suffix"
        );

        // 存在しない変数
        assert_eq!(Config::expand_vars("prefix_${NONEXISTENT}_suffix", &vars), "prefix__suffix");
        assert_eq!(Config::expand_vars("no_vars_here", &vars), "no_vars_here");
        assert_eq!(Config::expand_vars("${}_content", &vars), "_content");
        assert_eq!(Config::expand_vars("cost: $5 ${unclosed", &vars), "cost: $5 ${unclosed");
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
[calendar]
credentials = "${SW_CREDENTIALS}"
calendar_id = "team@example.com"
timezone = "Europe/Stockholm"
timeout_secs = 10

[server]
host = "127.0.0.1"
port = 8080

[api]
token = "api_token"
protect_tools = true

[slots]
policy = "grid"
default_duration_minutes = 45
"#;

        let config =
            Config::from_toml_str(toml_content, lookup(&[("SW_CREDENTIALS", "/etc/sa.json")])).unwrap();

        assert_eq!(config.calendar.credentials.as_deref(), Some("/etc/sa.json"));
        assert_eq!(config.calendar.calendar_id.as_deref(), Some("team@example.com"));
        assert_eq!(config.calendar.timezone, "Europe/Stockholm");
        assert_eq!(config.calendar.timeout_secs, 10);
        assert_eq!(config.calendar.api_base_url, "https://www.googleapis.com");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.api.token.as_deref(), Some("api_token"));
        assert!(config.api.protect_tools);
        assert_eq!(config.slots.policy, SlotPolicy::Grid);
        assert_eq!(config.slots.default_duration_minutes, 45);
    }

    #[test]
    fn test_toml_empty_expansion_is_unset() {
        let config = Config::from_toml_str(
            "[calendar]\ncredentials = \"${MISSING}\"\n",
            lookup(&[]),
        )
        .unwrap();
        assert!(config.calendar.credentials.is_none());
    }

    #[test]
    fn test_env_overrides_toml() {
        let mut config = Config::from_toml_str("[server]\nport = 8080\n", lookup(&[])).unwrap();
        config.apply_overrides(lookup(&[("PORT", "9090")]));
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slotwise.toml");
        std::fs::write(&path, "[slots]\ndefault_duration_minutes = 25\n").unwrap();

        let config = Config::from_toml_file(&path).unwrap();
        assert!(config.slots.default_duration_minutes > 0);

        let missing = Config::from_toml_file(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let result = Config::from_toml_str("[slots\npolicy = ", lookup(&[]));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
