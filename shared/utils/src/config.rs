use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{PartPalError, PartPalResult};

pub const DEFAULT_CONFIG_PATH: &str = "partpal.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub distributors: DistributorsConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub bom: BomConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Credentials per distributor. An absent section disables that distributor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributorsConfig {
    pub digikey: Option<DigiKeyConfig>,
    pub mouser: Option<MouserConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigiKeyConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub sandbox: bool,
    /// Overrides the production/sandbox endpoint
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MouserConfig {
    pub api_key: String,
    pub base_url: Option<String>,
}

/// What to do when a distributor fails to authenticate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailurePolicy {
    /// Leave the distributor out of the run and keep going
    #[default]
    Skip,
    /// Fail the whole optimization run
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub max_concurrent_lookups: usize,
    pub lookup_timeout_seconds: u64,
    pub on_auth_failure: AuthFailurePolicy,
    pub token_refresh_margin_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BomConfig {
    /// Canonical field name -> additional raw header synonyms
    pub extra_synonyms: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 8,
            lookup_timeout_seconds: 30,
            on_auth_failure: AuthFailurePolicy::Skip,
            token_refresh_margin_seconds: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, then `PARTPAL__*` environment overrides.
    ///
    /// The file is required. The result is validated before it is returned.
    pub fn load(path: &Path) -> PartPalResult<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        if !path.exists() {
            return Err(PartPalError::configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let config = Config::builder()
            .add_source(File::from(path).required(true))
            // Add environment variables with PARTPAL prefix
            .add_source(
                Environment::with_prefix("PARTPAL")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AppConfig = config.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document directly
    pub fn from_json(json: &str) -> PartPalResult<Self> {
        let config: AppConfig = serde_json::from_str(json)
            .map_err(|e| PartPalError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on credentials a distributor cannot work without
    pub fn validate(&self) -> PartPalResult<()> {
        if let Some(digikey) = &self.distributors.digikey {
            require("distributors.digikey.client_id", &digikey.client_id)?;
            require("distributors.digikey.client_secret", &digikey.client_secret)?;
        }

        if let Some(mouser) = &self.distributors.mouser {
            require("distributors.mouser.api_key", &mouser.api_key)?;
        }

        if self.optimizer.max_concurrent_lookups == 0 {
            return Err(PartPalError::configuration(
                "optimizer.max_concurrent_lookups must be at least 1",
            ));
        }

        if self.optimizer.lookup_timeout_seconds == 0 {
            return Err(PartPalError::configuration(
                "optimizer.lookup_timeout_seconds must be at least 1",
            ));
        }

        Ok(())
    }

    pub fn has_distributors(&self) -> bool {
        self.distributors.digikey.is_some() || self.distributors.mouser.is_some()
    }
}

fn require(field: &str, value: &str) -> PartPalResult<()> {
    if value.trim().is_empty() {
        return Err(PartPalError::configuration(format!("{} is required", field)));
    }
    Ok(())
}
