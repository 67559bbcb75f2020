// ⚙️ Configuration - demo constants as data
//
// Every field has a default, so an empty JSON object (or no file at all) is a
// valid configuration. The generator API key is never written back out.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Credits granted at the start of every session
    pub starting_credits: u32,

    /// Expiry sweep cadence
    pub sweep_interval_ms: u64,

    /// Identities entitled to the top tier
    pub allow_list: Vec<String>,

    /// The one identity allowed to use the account generator
    pub canonical_identity: String,

    pub demo_identity: String,
    pub demo_secret: String,

    /// Secret shared by every generated account
    pub generated_secret: String,

    pub generator: GeneratorConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,

    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for Config {
    fn default() -> Self {
        let canonical = "lifetime@user.com".to_string();
        let mut allow_list = vec![canonical.clone()];
        allow_list.extend((1..=10).map(|i| format!("lifetime{}@user.com", i)));

        Config {
            starting_credits: 10,
            sweep_interval_ms: 1000,
            allow_list,
            canonical_identity: canonical,
            demo_identity: "user@example.com".to_string(),
            demo_secret: "password123".to_string(),
            generated_secret: "password123".to_string(),
            generator: GeneratorConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Config::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_ms == 0 {
            bail!("sweep_interval_ms must be greater than 0");
        }
        Ok(())
    }

    /// Optional file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// `API_KEY` (or `GEMINI_API_KEY`) supplies the generator key
    pub fn with_env_overrides(mut self) -> Self {
        let key = env::var("API_KEY")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        if key.is_some() {
            self.generator.api_key = key;
        }
        self
    }
}
