//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux: `~/.config/sfcost/config.toml`
//! - macOS: `~/Library/Application Support/com.sfcost.sfcost/config.toml`
//! - Windows: `%APPDATA%/sfcost/sfcost/config/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `SFCOST_ACCOUNT_URL`: Account URL
//! - `SFCOST_TOKEN`: Bearer token (never logged)
//! - `SFCOST_TOKEN_TYPE`: oauth, keypair_jwt or pat
//! - `SFCOST_WAREHOUSE`, `SFCOST_ROLE`: Statement context
//! - `SFCOST_FORMAT`: Output format (human, json, md)
//! - `SFCOST_TIMEOUT`: Statement timeout in seconds
//! - `SFCOST_NO_COLOR` or `NO_COLOR`: Disable colors
//! - `SFCOST_PRETTY`: Pretty-print JSON output (1, true, yes)
//! - `SFCOST_CONFIG`: Override config file path

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use super::paths::expand_home;
use crate::cli::args::{Cli, OutputFormat};
use crate::core::date_range::{DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS};
use crate::core::session::{AccessToken, SessionSettings, TokenType};
use crate::core::views::{DEFAULT_USAGE_SCHEMA, UsageViews, is_valid_identifier};
use crate::error::{Result, SfcostError};
use crate::util::env::{non_empty_var, parse_bool_flag};

// =============================================================================
// Environment Variable Names
// =============================================================================

pub const ENV_ACCOUNT_URL: &str = "SFCOST_ACCOUNT_URL";
pub const ENV_TOKEN: &str = "SFCOST_TOKEN";
pub const ENV_TOKEN_TYPE: &str = "SFCOST_TOKEN_TYPE";
pub const ENV_WAREHOUSE: &str = "SFCOST_WAREHOUSE";
pub const ENV_ROLE: &str = "SFCOST_ROLE";
pub const ENV_FORMAT: &str = "SFCOST_FORMAT";
pub const ENV_TIMEOUT: &str = "SFCOST_TIMEOUT";
pub const ENV_NO_COLOR: &str = "SFCOST_NO_COLOR";
/// Standard environment variable to disable colors.
pub const ENV_NO_COLOR_STD: &str = "NO_COLOR";
pub const ENV_PRETTY: &str = "SFCOST_PRETTY";
pub const ENV_CONFIG: &str = "SFCOST_CONFIG";

/// Keyring service name for stored tokens; the entry user is the account URL.
pub const KEYRING_SERVICE: &str = "sfcost";

const MAX_TIMEOUT_SECONDS: u64 = 3600;

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub format: OutputFormat,
    /// Per-statement timeout.
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub no_color: bool,
    pub pretty: bool,
    /// Log level from the config file, used when no flag or env sets one.
    pub log_level: Option<String>,
    pub account_url: Option<String>,
    pub token_type: TokenType,
    pub token_file: Option<PathBuf>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    pub database: Option<String>,
    pub lookback_days: u32,
    pub usage_schema: String,
    pub duration_function: Option<String>,
    /// Source of each setting for debugging.
    pub sources: ConfigSources,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub format: ConfigSource,
    pub timeout: ConfigSource,
    pub no_color: ConfigSource,
    pub pretty: ConfigSource,
    pub account_url: ConfigSource,
    pub token_type: ConfigSource,
    pub warehouse: ConfigSource,
    pub role: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl ResolvedConfig {
    /// Resolve final configuration from CLI args, environment variables, and config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid, or any
    /// resolved value is out of range.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let config = Self::load_config(cli)?;
        config.validate()?;

        let mut sources = ConfigSources::default();

        let format = Self::resolve_format(cli, &config, &mut sources.format)?;
        let timeout = Self::resolve_timeout(cli, &config, &mut sources.timeout)?;
        let no_color = Self::resolve_no_color(cli, &config, &mut sources.no_color);
        let pretty = Self::resolve_pretty(cli, &config, &mut sources.pretty);
        let account_url = pick(
            cli.account_url.clone(),
            ENV_ACCOUNT_URL,
            config.connection.account_url.clone(),
            &mut sources.account_url,
        );
        let token_type = Self::resolve_token_type(&config, &mut sources.token_type)?;
        let warehouse = pick(
            cli.warehouse.clone(),
            ENV_WAREHOUSE,
            config.connection.warehouse.clone(),
            &mut sources.warehouse,
        );
        let role = pick(
            cli.role.clone(),
            ENV_ROLE,
            config.connection.role.clone(),
            &mut sources.role,
        );

        if let Some(url) = &account_url {
            validate_account_url(url)?;
        }

        Ok(Self {
            format,
            timeout,
            poll_interval: Duration::from_millis(config.general.poll_interval_millis),
            no_color,
            pretty,
            log_level: config.general.log_level,
            account_url,
            token_type,
            token_file: config.connection.token_file,
            warehouse,
            role,
            database: config.connection.database,
            lookback_days: config.report.lookback_days,
            usage_schema: config.report.usage_schema,
            duration_function: config.report.duration_function,
            sources,
        })
    }

    /// Load config file: `--config`, then `SFCOST_CONFIG`, then the default path.
    fn load_config(cli: &Cli) -> Result<Config> {
        if let Some(path) = &cli.config {
            Config::load_from(path)
        } else if let Some(path) = non_empty_var(ENV_CONFIG) {
            Config::load_from(Path::new(&path))
        } else {
            Config::load()
        }
    }

    /// Resolve output format setting.
    fn resolve_format(
        cli: &Cli,
        config: &Config,
        source: &mut ConfigSource,
    ) -> Result<OutputFormat> {
        // 1. CLI --json flag (shorthand)
        if cli.json {
            *source = ConfigSource::Cli;
            return Ok(OutputFormat::Json);
        }

        // clap fills --format with its default, so a non-default value is
        // the only sign the flag was passed
        if cli.format != OutputFormat::Human {
            *source = ConfigSource::Cli;
            return Ok(cli.format);
        }

        // 2. Environment variable
        if let Some(format_env) = non_empty_var(ENV_FORMAT) {
            *source = ConfigSource::Env;
            return parse_format(&format_env);
        }

        // 3. Config file
        if let Some(ref format_str) = config.output.format {
            *source = ConfigSource::ConfigFile;
            return parse_format(format_str);
        }

        // 4. Default
        *source = ConfigSource::Default;
        Ok(OutputFormat::Human)
    }

    /// Resolve statement timeout.
    fn resolve_timeout(cli: &Cli, config: &Config, source: &mut ConfigSource) -> Result<Duration> {
        let (seconds, origin) = if let Some(timeout) = cli.timeout {
            (timeout, ConfigSource::Cli)
        } else if let Some(timeout_env) = non_empty_var(ENV_TIMEOUT) {
            let parsed = timeout_env
                .parse::<u64>()
                .map_err(|_| SfcostError::ConfigInvalid {
                    key: ENV_TIMEOUT.to_string(),
                    value: timeout_env.clone(),
                    message: "expected a whole number of seconds".to_string(),
                })?;
            (parsed, ConfigSource::Env)
        } else if config.general.timeout_seconds == GeneralConfig::default().timeout_seconds {
            (config.general.timeout_seconds, ConfigSource::Default)
        } else {
            (config.general.timeout_seconds, ConfigSource::ConfigFile)
        };

        validate_timeout(seconds)?;
        *source = origin;
        Ok(Duration::from_secs(seconds))
    }

    /// Resolve no_color setting.
    fn resolve_no_color(cli: &Cli, config: &Config, source: &mut ConfigSource) -> bool {
        // 1. CLI --no-color flag
        if cli.no_color {
            *source = ConfigSource::Cli;
            return true;
        }

        // 2. Environment variable (SFCOST_NO_COLOR or standard NO_COLOR)
        if is_env_truthy(ENV_NO_COLOR) || std::env::var(ENV_NO_COLOR_STD).is_ok() {
            *source = ConfigSource::Env;
            return true;
        }

        // 3. Config file (inverted: config.output.color = false means no_color = true)
        if !config.output.color {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        // 4. Default
        *source = ConfigSource::Default;
        false
    }

    /// Resolve pretty setting.
    fn resolve_pretty(cli: &Cli, config: &Config, source: &mut ConfigSource) -> bool {
        if cli.pretty {
            *source = ConfigSource::Cli;
            return true;
        }

        if is_env_truthy(ENV_PRETTY) {
            *source = ConfigSource::Env;
            return true;
        }

        if config.output.pretty {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    fn resolve_token_type(config: &Config, source: &mut ConfigSource) -> Result<TokenType> {
        if let Some(value) = non_empty_var(ENV_TOKEN_TYPE) {
            *source = ConfigSource::Env;
            return value.parse();
        }
        if let Some(value) = &config.connection.token_type {
            *source = ConfigSource::ConfigFile;
            return value.parse();
        }
        *source = ConfigSource::Default;
        Ok(TokenType::default())
    }

    /// The account URL, or the error naming the missing setting.
    ///
    /// # Errors
    ///
    /// Returns [`SfcostError::ConfigMissing`] when no source set it.
    pub fn require_account_url(&self) -> Result<&str> {
        self.account_url
            .as_deref()
            .ok_or_else(|| SfcostError::ConfigMissing {
                key: "connection.account_url".to_string(),
            })
    }

    /// Find the bearer token: `SFCOST_TOKEN`, then the token file, then the keyring.
    ///
    /// # Errors
    ///
    /// Returns [`SfcostError::AuthNotConfigured`] when no source has one, or
    /// an I/O error if a configured token file cannot be read.
    pub fn resolve_token(&self) -> Result<AccessToken> {
        let account = self.require_account_url()?;

        if let Some(token) = non_empty_var(ENV_TOKEN) {
            tracing::debug!(source = "env", "using access token");
            return Ok(AccessToken::new(token));
        }

        if let Some(path) = &self.token_file {
            let path = expand_home(path);
            let token = AccessToken::new(fs::read_to_string(&path)?);
            if !token.is_empty() {
                tracing::debug!(source = "file", ?path, "using access token");
                return Ok(token);
            }
        }

        match keyring::Entry::new(KEYRING_SERVICE, account).and_then(|e| e.get_password()) {
            Ok(token) if !token.trim().is_empty() => {
                tracing::debug!(source = "keyring", "using access token");
                Ok(AccessToken::new(token))
            }
            Ok(_) | Err(_) => Err(SfcostError::AuthNotConfigured {
                account: account.to_string(),
            }),
        }
    }

    /// Settings for a SQL API session with the given token.
    ///
    /// # Errors
    ///
    /// Returns [`SfcostError::ConfigMissing`] without an account URL.
    pub fn session_settings(&self, token: AccessToken) -> Result<SessionSettings> {
        Ok(SessionSettings {
            account_url: self.require_account_url()?.to_string(),
            token,
            token_type: self.token_type,
            warehouse: self.warehouse.clone(),
            role: self.role.clone(),
            database: self.database.clone(),
            timeout: self.timeout,
            poll_interval: self.poll_interval,
        })
    }

    /// Where the views live.
    #[must_use]
    pub fn views(&self) -> UsageViews {
        UsageViews::new(self.usage_schema.clone(), self.duration_function.clone())
    }
}

/// CLI value, then env var, then config file value.
fn pick(
    cli: Option<String>,
    env: &str,
    file: Option<String>,
    source: &mut ConfigSource,
) -> Option<String> {
    if let Some(value) = cli.filter(|v| !v.trim().is_empty()) {
        *source = ConfigSource::Cli;
        return Some(value);
    }
    if let Some(value) = non_empty_var(env) {
        *source = ConfigSource::Env;
        return Some(value);
    }
    if let Some(value) = file.filter(|v| !v.trim().is_empty()) {
        *source = ConfigSource::ConfigFile;
        return Some(value);
    }
    *source = ConfigSource::Default;
    None
}

/// Parse a format string into `OutputFormat`.
fn parse_format(s: &str) -> Result<OutputFormat> {
    match s.to_lowercase().as_str() {
        "human" => Ok(OutputFormat::Human),
        "json" => Ok(OutputFormat::Json),
        "md" | "markdown" => Ok(OutputFormat::Md),
        _ => Err(SfcostError::ConfigInvalid {
            key: "output.format".to_string(),
            value: s.to_string(),
            message: "valid formats: human, json, md".to_string(),
        }),
    }
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var: &str) -> bool {
    non_empty_var(var)
        .and_then(|v| parse_bool_flag(&v))
        .unwrap_or(false)
}

fn validate_timeout(seconds: u64) -> Result<()> {
    if seconds == 0 || seconds > MAX_TIMEOUT_SECONDS {
        return Err(SfcostError::ConfigInvalid {
            key: "general.timeout_seconds".to_string(),
            value: seconds.to_string(),
            message: format!("must be between 1 and {MAX_TIMEOUT_SECONDS} seconds"),
        });
    }
    Ok(())
}

fn validate_account_url(url: &str) -> Result<()> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(SfcostError::ConfigInvalid {
            key: "connection.account_url".to_string(),
            value: url.to_string(),
            message: "must start with https://".to_string(),
        })
    }
}

// =============================================================================
// Config File
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub general: GeneralConfig,
    pub report: ReportConfig,
    pub output: OutputConfig,
}

/// How to reach the account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub account_url: Option<String>,
    /// oauth, keypair_jwt or pat.
    pub token_type: Option<String>,
    /// File holding the bearer token; `~/` is expanded.
    pub token_file: Option<PathBuf>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    pub database: Option<String>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Per-statement timeout in seconds.
    pub timeout_seconds: u64,
    /// Delay between status polls for a running statement.
    pub poll_interval_millis: u64,
    /// Default log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
}

/// What the page reports on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Days between the default start date and today.
    pub lookback_days: u32,
    /// Schema holding the account usage views.
    pub usage_schema: String,
    /// Optional SQL function that formats elapsed milliseconds.
    pub duration_function: Option<String>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (human, json, md).
    pub format: Option<String>,
    /// Whether to use colors in output.
    pub color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            poll_interval_millis: 500,
            log_level: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            usage_schema: DEFAULT_USAGE_SCHEMA.to_string(),
            duration_function: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            pretty: false,
        }
    }
}

impl Config {
    /// Load configuration from the default config file path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().config_file())
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SfcostError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`SfcostError::ConfigInvalid`] naming the first bad key.
    pub fn validate(&self) -> Result<()> {
        if let Some(format) = &self.output.format {
            parse_format(format)?;
        }

        validate_timeout(self.general.timeout_seconds)?;

        if self.general.poll_interval_millis == 0 {
            return Err(SfcostError::ConfigInvalid {
                key: "general.poll_interval_millis".to_string(),
                value: "0".to_string(),
                message: "must be positive".to_string(),
            });
        }

        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.report.lookback_days) {
            return Err(SfcostError::ConfigInvalid {
                key: "report.lookback_days".to_string(),
                value: self.report.lookback_days.to_string(),
                message: format!("must be between 1 and {MAX_LOOKBACK_DAYS} days"),
            });
        }

        if !is_valid_identifier(&self.report.usage_schema) {
            return Err(SfcostError::ConfigInvalid {
                key: "report.usage_schema".to_string(),
                value: self.report.usage_schema.clone(),
                message: "must be a plain dotted identifier such as SNOWFLAKE.ACCOUNT_USAGE"
                    .to_string(),
            });
        }

        if let Some(func) = &self.report.duration_function {
            if !is_valid_identifier(func) {
                return Err(SfcostError::ConfigInvalid {
                    key: "report.duration_function".to_string(),
                    value: func.clone(),
                    message: "must be a plain dotted identifier such as DB.SCHEMA.FUNC"
                        .to_string(),
                });
            }
        }

        if let Some(token_type) = &self.connection.token_type {
            token_type.parse::<TokenType>()?;
        }

        if let Some(url) = &self.connection.account_url {
            validate_account_url(url)?;
        }

        Ok(())
    }
}
