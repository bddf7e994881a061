//! Configuration management for gm-vault.
//!
//! Parses `gmv.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//!
//! [vault]
//! root = "."
//! entry = "Campaign/Index.md"
//!
//! [export]
//! mode = "headings"          # folder | headings | headings-flat
//! ignore_headings = ["Recap", "Notes"]
//!
//! [tunnel]
//! public_url = "https://${TUNNEL_HOST}"
//! ```
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `vault.root`
//! - `vault.entry`
//! - `tunnel.public_url`

mod expand;

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use gmv_tree::{DEFAULT_IGNORE_HEADINGS, ParseStrategy};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override vault root directory.
    pub vault_root: Option<PathBuf>,
    /// Override entry document (vault-relative).
    pub entry: Option<String>,
    /// Override export strategy.
    pub mode: Option<ParseStrategy>,
    /// Override tunnel public URL.
    pub public_url: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "gmv.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Vault configuration (root is a relative string from TOML).
    vault: VaultConfigRaw,
    /// Export configuration.
    pub export: ExportConfig,
    /// Tunnel configuration.
    pub tunnel: TunnelConfig,

    /// Resolved vault configuration (set after loading).
    #[serde(skip)]
    pub vault_resolved: VaultConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Loopback host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
        }
    }
}

/// Raw vault configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct VaultConfigRaw {
    root: Option<String>,
    entry: Option<String>,
}

/// Resolved vault configuration with an absolute root.
#[derive(Debug, Default)]
pub struct VaultConfig {
    /// Vault root directory.
    pub root: PathBuf,
    /// Entry document, relative to the vault root.
    pub entry: Option<String>,
}

/// Export configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Tree extraction strategy.
    pub mode: ParseStrategy,
    /// Headings whose sections are skipped in heading mode.
    pub ignore_headings: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mode: ParseStrategy::default(),
            ignore_headings: DEFAULT_IGNORE_HEADINGS
                .iter()
                .map(|&h| h.to_owned())
                .collect(),
        }
    }
}

/// Tunnel configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// Public URL of a tunnel forwarding to the local server.
    pub public_url: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`tunnel.public_url`").
        field: String,
        /// Error message (e.g., "${`TUNNEL_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Whether `host` names the loopback interface.
#[must_use]
pub fn is_loopback_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `gmv.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated after overrides.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(root) = &settings.vault_root {
            self.vault_resolved.root.clone_from(root);
        }
        if let Some(entry) = &settings.entry {
            self.vault_resolved.entry = Some(entry.clone());
        }
        if let Some(mode) = settings.mode {
            self.export.mode = mode;
        }
        if let Some(public_url) = &settings.public_url {
            self.tunnel.public_url = Some(public_url.clone());
        }
    }

    /// Local server URL, `http://{host}:{port}`.
    #[must_use]
    pub fn local_url(&self) -> String {
        let host = &self.server.host;
        if host.contains(':') && !host.starts_with('[') {
            format!("http://[{host}]:{}", self.server.port)
        } else {
            format!("http://{host}:{}", self.server.port)
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            vault: VaultConfigRaw::default(),
            export: ExportConfig::default(),
            tunnel: TunnelConfig::default(),
            vault_resolved: VaultConfig {
                root: base.to_path_buf(),
                entry: None,
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_vault()?;
        self.validate_tunnel()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if !is_loopback_host(&self.server.host) {
            return Err(ConfigError::Validation(format!(
                "server.host must be a loopback address, got '{}'",
                self.server.host
            )));
        }

        // Port 0 lets the OS pick a port, which the external tool can't guess
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate vault configuration.
    fn validate_vault(&self) -> Result<(), ConfigError> {
        if let Some(entry) = &self.vault_resolved.entry {
            require_non_empty(entry, "vault.entry")?;
            if Path::new(entry).is_absolute() || entry.split(['/', '\\']).any(|c| c == "..") {
                return Err(ConfigError::Validation(
                    "vault.entry must be a path inside the vault".to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// Validate tunnel configuration.
    fn validate_tunnel(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.tunnel.public_url {
            require_non_empty(url, "tunnel.public_url")?;
            require_http_url(url, "tunnel.public_url")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref root) = self.vault.root {
            self.vault.root = Some(expand::expand_env(root, "vault.root")?);
        }
        if let Some(ref entry) = self.vault.entry {
            self.vault.entry = Some(expand::expand_env(entry, "vault.entry")?);
        }
        if let Some(ref url) = self.tunnel.public_url {
            self.tunnel.public_url = Some(expand::expand_env(url, "tunnel.public_url")?);
        }

        Ok(())
    }

    /// Resolve the vault root against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.vault_resolved = VaultConfig {
            root: config_dir.join(self.vault.root.as_deref().unwrap_or(".")),
            entry: self.vault.entry.clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use gmv_tree::HeadingMode;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.vault_resolved.root, PathBuf::from("/test"));
        assert_eq!(config.vault_resolved.entry, None);
        assert_eq!(config.export.mode, ParseStrategy::Folder);
        assert!(config.export.ignore_headings.contains(&"Recap".to_owned()));
        assert_eq!(config.tunnel.public_url, None);
        assert_eq!(config.local_url(), "http://127.0.0.1:3000");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "localhost"
port = 4000

[vault]
root = "notes"
entry = "Campaign/Index.md"

[export]
mode = "headings-flat"
ignore_headings = ["Secrets"]

[tunnel]
public_url = "https://abc.tunnel.example"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.vault_resolved.root, PathBuf::from("/project/notes"));
        assert_eq!(
            config.vault_resolved.entry.as_deref(),
            Some("Campaign/Index.md")
        );
        assert_eq!(config.export.mode, ParseStrategy::Headings(HeadingMode::Flat));
        assert_eq!(config.export.ignore_headings, vec!["Secrets".to_owned()]);
        assert_eq!(
            config.tunnel.public_url.as_deref(),
            Some("https://abc.tunnel.example")
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_unknown_mode_fails() {
        let result: Result<Config, _> = toml::from_str("[export]\nmode = \"tree\"\n");

        assert!(result.is_err());
    }

    #[test]
    fn test_apply_cli_settings_overrides() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            port: Some(9000),
            vault_root: Some(PathBuf::from("/vault")),
            entry: Some("Prep.md".to_owned()),
            mode: Some(ParseStrategy::Headings(HeadingMode::Structured)),
            public_url: Some("https://t.example".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1"); // Unchanged
        assert_eq!(config.vault_resolved.root, PathBuf::from("/vault"));
        assert_eq!(config.vault_resolved.entry.as_deref(), Some("Prep.md"));
        assert_eq!(
            config.export.mode,
            ParseStrategy::Headings(HeadingMode::Structured)
        );
        assert_eq!(config.tunnel.public_url.as_deref(), Some("https://t.example"));
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.vault_resolved.root, PathBuf::from("/test"));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("GMV_TEST_TUNNEL", "abc.tunnel.example");
        }

        let toml = r#"
[tunnel]
public_url = "https://${GMV_TEST_TUNNEL}"

[vault]
entry = "${GMV_TEST_ENTRY_UNSET:-Index.md}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(
            config.tunnel.public_url.as_deref(),
            Some("https://abc.tunnel.example")
        );
        assert_eq!(config.vault.entry.as_deref(), Some("Index.md"));

        unsafe {
            std::env::remove_var("GMV_TEST_TUNNEL");
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        Config::default_with_base(Path::new("/test")).validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_non_loopback_host() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.host = "0.0.0.0".to_owned();

        let err = config.validate().unwrap_err();

        assert_eq!(
            err.to_string(),
            "Configuration error: server.host must be a loopback address, got '0.0.0.0'"
        );
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;

        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_tunnel_url_scheme() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.tunnel.public_url = Some("abc.tunnel.example".to_owned());

        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_entry_inside_vault() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.vault_resolved.entry = Some("../outside.md".to_owned());

        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_is_loopback_host() {
        assert!(is_loopback_host("127.0.0.1"));
        assert!(is_loopback_host("127.1.2.3"));
        assert!(is_loopback_host("localhost"));
        assert!(is_loopback_host("::1"));
        assert!(is_loopback_host("[::1]"));
        assert!(!is_loopback_host("0.0.0.0"));
        assert!(!is_loopback_host("192.168.1.10"));
        assert!(!is_loopback_host("example.com"));
    }

    #[test]
    fn test_local_url_ipv6() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.host = "::1".to_owned();

        assert_eq!(config.local_url(), "http://[::1]:3000");
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gmv.toml");
        std::fs::write(&path, "[vault]\nroot = \"vault\"\nentry = \"Index.md\"\n").unwrap();

        let config = Config::load(Some(path.as_path()), None).unwrap();

        assert_eq!(config.vault_resolved.root, dir.path().join("vault"));
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/gmv.toml")), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_validates_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gmv.toml");
        std::fs::write(&path, "").unwrap();
        let overrides = CliSettings {
            host: Some("10.0.0.1".to_owned()),
            ..Default::default()
        };

        let err = Config::load(Some(path.as_path()), Some(&overrides)).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_discover_from_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("gmv.toml"), "").unwrap();

        let found = Config::discover_from(&nested).unwrap();

        assert_eq!(found, dir.path().join("gmv.toml"));
    }
}
