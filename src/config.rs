use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::duration::deserialize_duration;
use crate::models::{Asset, SourceType};
use crate::portfolio::DEFAULT_FETCH_TIMEOUT;

fn default_timezone() -> String {
    "Asia/Tokyo".to_string()
}

fn default_fetch_timeout() -> Duration {
    DEFAULT_FETCH_TIMEOUT
}

fn default_currency_decimals() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn deserialize_secret_opt<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(SecretString::from))
}

/// Report formatting settings. These never affect calculations.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_currency_decimals")]
    pub currency_decimals: u32,

    /// Render thousands separators.
    #[serde(default = "default_true")]
    pub currency_grouping: bool,

    /// Optional prefix such as "¥".
    #[serde(default)]
    pub currency_symbol: Option<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_decimals: default_currency_decimals(),
            currency_grouping: true,
            currency_symbol: None,
        }
    }
}

/// One upstream quote provider.
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    /// URL of the provider. For code-keyed providers this is a prefix that
    /// the asset code is appended to.
    pub endpoint: String,

    /// Sent as a bearer token when present.
    #[serde(default, deserialize_with = "deserialize_secret_opt")]
    pub api_key: Option<SecretString>,
}

/// Provider per source type. Missing entries leave that type unroutable.
#[derive(Debug, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub crypto: Option<ProviderConfig>,
    #[serde(default)]
    pub fund_index: Option<ProviderConfig>,
    #[serde(default)]
    pub stock: Option<ProviderConfig>,
    #[serde(default)]
    pub gold: Option<ProviderConfig>,
}

impl ProvidersConfig {
    pub fn get(&self, source_type: SourceType) -> Option<&ProviderConfig> {
        match source_type {
            SourceType::Crypto => self.crypto.as_ref(),
            SourceType::FundIndex => self.fund_index.as_ref(),
            SourceType::Stock => self.stock.as_ref(),
            SourceType::Gold => self.gold.as_ref(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AssetsFile {
    #[serde(default)]
    assets: Vec<Asset>,
}

/// Application configuration as written in `assetbook.toml`.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// IANA timezone used for report timestamps.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Upper bound for each price fetch.
    #[serde(
        default = "default_fetch_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub fetch_timeout: Duration,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Separate TOML file with `[[assets]]`. Relative paths are resolved
    /// from the config file's directory.
    #[serde(default)]
    pub assets_file: Option<PathBuf>,

    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            fetch_timeout: default_fetch_timeout(),
            display: DisplayConfig::default(),
            providers: ProvidersConfig::default(),
            assets_file: None,
            assets: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn resolve_assets_file(&self, config_dir: &Path) -> Option<PathBuf> {
        self.assets_file.as_ref().map(|file| {
            if file.is_absolute() {
                file.clone()
            } else {
                config_dir.join(file)
            }
        })
    }
}

/// Loaded configuration with the timezone parsed and every asset collected.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub timezone: Tz,
    pub fetch_timeout: Duration,
    pub display: DisplayConfig,
    pub providers: ProvidersConfig,
    /// Inline assets first, then those from `assets_file`.
    pub assets: Vec<Asset>,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./assetbook.toml` if it exists in current directory
/// 2. `~/.local/share/assetbook/assetbook.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("assetbook.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("assetbook").join("assetbook.toml");
    }

    local_config
}

impl ResolvedConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;
        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;
        Self::resolve(config, config_dir)
    }

    /// Load config, or fall back to defaults (and no assets) if the file
    /// doesn't exist.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            Self::resolve(Config::default(), &cwd)
        }
    }

    fn resolve(config: Config, config_dir: &Path) -> Result<Self> {
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|e| anyhow!("Unknown timezone {:?}: {e}", config.timezone))?;

        let assets_path = config.resolve_assets_file(config_dir);
        let mut assets = config.assets;
        if let Some(path) = assets_path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read assets file: {}", path.display()))?;
            let file: AssetsFile = toml::from_str(&content)
                .with_context(|| format!("Failed to parse assets file: {}", path.display()))?;
            assets.extend(file.assets);
        }

        Ok(Self {
            timezone,
            fetch_timeout: config.fetch_timeout,
            display: config.display,
            providers: config.providers,
            assets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use secrecy::ExposeSecret;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_empty() -> Result<()> {
        let config: Config = toml::from_str("")?;
        assert_eq!(config.timezone, "Asia/Tokyo");
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.display.currency_decimals, 2);
        assert!(config.display.currency_grouping);
        assert!(config.providers.crypto.is_none());
        assert!(config.assets.is_empty());
        Ok(())
    }

    #[test]
    fn parses_full_config() -> Result<()> {
        let config: Config = toml::from_str(
            r#"
timezone = "UTC"
fetch_timeout = "1500ms"

[display]
currency_decimals = 0
currency_symbol = "¥"

[providers.crypto]
endpoint = "https://api.bitflyer.com/v1/ticker?product_code="

[providers.gold]
endpoint = "https://gold.example/bid"
api_key = "s3cret"

[[assets]]
name = "Bitcoin"
source = "crypto"
code = "BTC_JPY"
lot = "0.1"
purchased_cost = 500000

[[assets]]
name = "Gold"
source = "SBI_GOLD"
lot = 10
purchased_cost = 90000
tag = "metal"
"#,
        )?;

        assert_eq!(config.fetch_timeout, Duration::from_millis(1500));
        assert_eq!(config.display.currency_symbol.as_deref(), Some("¥"));
        assert!(config.providers.get(SourceType::Crypto).is_some());
        assert!(config.providers.get(SourceType::Stock).is_none());
        let gold = config.providers.get(SourceType::Gold).unwrap();
        assert_eq!(gold.api_key.as_ref().unwrap().expose_secret(), "s3cret");
        assert_eq!(config.assets.len(), 2);
        assert_eq!(config.assets[0].lot, dec!(0.1));
        assert_eq!(config.assets[1].source_type(), Ok(SourceType::Gold));
        Ok(())
    }

    #[test]
    fn empty_api_key_counts_as_absent() -> Result<()> {
        let providers: ProvidersConfig = toml::from_str(
            r#"
[stock]
endpoint = "https://stock.example/"
api_key = ""
"#,
        )?;
        assert!(providers.stock.unwrap().api_key.is_none());
        Ok(())
    }

    #[test]
    fn resolved_config_merges_assets_file() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("assetbook.toml"),
            r#"
assets_file = "holdings.toml"

[[assets]]
name = "Inline"
source = "gold"
lot = 1
purchased_cost = 1
"#,
        )?;
        fs::write(
            dir.path().join("holdings.toml"),
            r#"
[[assets]]
name = "FromFile"
source = "stock"
code = "7203"
lot = 100
purchased_cost = 250000
"#,
        )?;

        let resolved = ResolvedConfig::load(&dir.path().join("assetbook.toml"))?;
        let names: Vec<_> = resolved.assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Inline", "FromFile"]);
        assert_eq!(resolved.timezone, chrono_tz::Asia::Tokyo);
        Ok(())
    }

    #[test]
    fn unknown_timezone_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("assetbook.toml");
        fs::write(&path, r#"timezone = "Mars/Olympus""#)?;

        let err = ResolvedConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Unknown timezone"));
        Ok(())
    }

    #[test]
    fn missing_file_loads_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let resolved = ResolvedConfig::load_or_default(&dir.path().join("nope.toml"))?;
        assert!(resolved.assets.is_empty());
        assert_eq!(resolved.fetch_timeout, DEFAULT_FETCH_TIMEOUT);
        Ok(())
    }

    #[test]
    fn missing_assets_file_is_an_error() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("assetbook.toml");
        fs::write(&path, r#"assets_file = "missing.toml""#)?;

        let err = ResolvedConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read assets file"));
        Ok(())
    }
}
