//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/fsales/config.toml.

use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use fieldsales_sync::MergePrecedence;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Minimum token length to apply masking (show first and last N characters).
const TOKEN_MASK_MIN_LENGTH: usize = 8;

/// Number of characters to show at start/end of a masked token.
const TOKEN_MASK_VISIBLE_CHARS: usize = 4;

/// Default seconds between polls of the reported collection.
const DEFAULT_POLL_SECONDS: u64 = 60;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECONDS: u64 = fieldsales_api::client::DEFAULT_TIMEOUT_SECS;

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Base URL of the document store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    /// ID of the signed-in user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Store token (optional, can use FSALES_TOKEN instead).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Sync settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Merge settings.
    #[serde(default)]
    pub merge: MergeConfig,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server_url: None,
            user_id: None,
            token: None,
            sync: SyncConfig::default(),
            merge: MergeConfig::default(),
        }
    }
}

/// Sync configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between polls of the reported collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_seconds: Option<u64>,

    /// Request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl SyncConfig {
    pub fn poll_seconds(&self) -> u64 {
        self.poll_seconds.unwrap_or(DEFAULT_POLL_SECONDS).max(1)
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS).max(1)
    }
}

/// Merge configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Which side wins when reported and saved information disagree.
    /// Overrides the stored merge preference when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precedence: Option<MergePrecedence>,
}

impl Config {
    /// Returns the store URL or a configuration error telling how to set it.
    pub fn require_server_url(&self) -> Result<&str> {
        self.server_url.as_deref().ok_or_else(|| {
            CommandError::Config(
                "No server_url configured. Run 'fsales config set server_url <url>'.".to_string(),
            )
        })
    }

    /// Returns the user ID or a configuration error telling how to set it.
    pub fn require_user_id(&self) -> Result<&str> {
        self.user_id.as_deref().ok_or_else(|| {
            CommandError::Config(
                "No user_id configured. Run 'fsales config set user_id <id>'.".to_string(),
            )
        })
    }
}

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/fsales/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("fsales"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("fsales"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("FSALES_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    Ok(get_config_dir()?.join("config.toml"))
}

/// Loads the configuration from disk.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let mut config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    // Version 1 is the only schema so far.
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Saves the configuration to disk.
fn save_config(config: &Config) -> Result<()> {
    let path = get_config_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CommandError::Config(format!("Failed to create config directory: {}", e)))?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&path, content)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let mut shown = serde_json::to_value(&config)?;
        if let Some(token) = &config.token {
            shown["token"] = serde_json::Value::String(mask_token(token));
        }
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": shown,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        if path.exists() {
            println!("Settings:");
            if let Some(ref url) = config.server_url {
                println!("  server_url: {}", url);
            }
            if let Some(ref user) = config.user_id {
                println!("  user_id: {}", user);
            }
            if let Some(ref token) = config.token {
                println!("  token: {}", mask_token(token));
            }

            println!("\n[sync]");
            println!("  poll_seconds: {}", config.sync.poll_seconds());
            println!("  timeout_seconds: {}", config.sync.timeout_seconds());

            println!("\n[merge]");
            if let Some(precedence) = config.merge.precedence {
                println!("  precedence: {}", precedence_name(precedence));
            }
        } else {
            println!("(No config file exists. Run 'fsales config set <key> <value>' to create one.)");
        }
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Executes the config set command.
pub fn execute_set(ctx: &CommandContext, opts: &ConfigSetOptions) -> Result<()> {
    let mut config = load_config()?;
    let path = get_config_path()?;

    apply_setting(&mut config, &opts.key, &opts.value)?;
    save_config(&config)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "key": opts.key,
            "value": if opts.key == "token" { mask_token(&opts.value) } else { opts.value.clone() },
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        if opts.key == "token" {
            println!("Set token = {}", mask_token(&opts.value));
        } else {
            println!("Set {} = {}", opts.key, opts.value);
        }
    }

    Ok(())
}

/// Applies one `key = value` setting to a config.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let (section, field) = match key.split_once('.') {
        Some((section, field)) => (Some(section), field),
        None => (None, key),
    };

    match (section, field) {
        (None, "server_url") => config.server_url = Some(value.trim_end_matches('/').to_string()),
        (None, "user_id") => config.user_id = Some(value.to_string()),
        (None, "token") => config.token = Some(value.to_string()),
        (Some("sync"), "poll_seconds") => config.sync.poll_seconds = Some(parse_seconds(value)?),
        (Some("sync"), "timeout_seconds") => {
            config.sync.timeout_seconds = Some(parse_seconds(value)?)
        }
        (Some("merge"), "precedence") => {
            config.merge.precedence = Some(parse_precedence(value)?);
        }
        _ => {
            return Err(CommandError::Config(format!(
                "Unknown config key '{}'. Valid keys: server_url, user_id, token, sync.poll_seconds, sync.timeout_seconds, merge.precedence",
                key
            )));
        }
    }
    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Masks a token for display, showing only the first and last N characters.
///
/// Uses character-based (not byte-based) indexing to safely handle
/// multi-byte UTF-8 characters.
fn mask_token(token: &str) -> String {
    let char_count = token.chars().count();
    if char_count > TOKEN_MASK_MIN_LENGTH {
        let prefix: String = token.chars().take(TOKEN_MASK_VISIBLE_CHARS).collect();
        let suffix: String = token
            .chars()
            .skip(char_count - TOKEN_MASK_VISIBLE_CHARS)
            .collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "****".to_string()
    }
}

fn parse_seconds(s: &str) -> Result<u64> {
    match s.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(CommandError::Config(format!(
            "Invalid number of seconds '{}'. Use a whole number greater than 0",
            s
        ))),
    }
}

fn parse_precedence(s: &str) -> Result<MergePrecedence> {
    match s.trim().to_lowercase().replace('-', "_").as_str() {
        "prefer_reported" | "reported" => Ok(MergePrecedence::PreferReported),
        "prefer_saved" | "saved" => Ok(MergePrecedence::PreferSaved),
        _ => Err(CommandError::Config(format!(
            "Invalid precedence value '{}'. Valid values: prefer_reported, prefer_saved",
            s
        ))),
    }
}

fn precedence_name(precedence: MergePrecedence) -> &'static str {
    match precedence {
        MergePrecedence::PreferReported => "prefer_reported",
        MergePrecedence::PreferSaved => "prefer_saved",
    }
}
