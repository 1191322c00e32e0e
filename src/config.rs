use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::TargetFactors;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub reference_data: ReferenceDataSettings,
    #[serde(default)]
    pub clinical: ClinicalSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

fn default_token_ttl() -> u64 { 8 * 60 * 60 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_formula_cache_size")]
    pub formula_cache_size: u64,
    #[serde(default = "default_formula_ttl")]
    pub formula_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            formula_cache_size: default_formula_cache_size(),
            formula_ttl_secs: default_formula_ttl(),
        }
    }
}

fn default_formula_cache_size() -> u64 { 500 }
fn default_formula_ttl() -> u64 { 3600 }

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceDataSettings {
    #[serde(default = "default_reference_path")]
    pub path: String,
    #[serde(default = "default_true")]
    pub seed_on_startup: bool,
}

impl Default for ReferenceDataSettings {
    fn default() -> Self {
        Self {
            path: default_reference_path(),
            seed_on_startup: true,
        }
    }
}

fn default_reference_path() -> String { "data/reference_formulas.toml".to_string() }
fn default_true() -> bool { true }

/// Look-back intervals and per-kilogram target factors
#[derive(Debug, Clone, Deserialize)]
pub struct ClinicalSettings {
    #[serde(default = "default_intervals")]
    pub intervals: Vec<u32>,
    #[serde(default)]
    pub targets: TargetFactorsConfig,
}

impl Default for ClinicalSettings {
    fn default() -> Self {
        Self {
            intervals: default_intervals(),
            targets: TargetFactorsConfig::default(),
        }
    }
}

fn default_intervals() -> Vec<u32> { vec![1, 3, 6, 12] }

#[derive(Debug, Clone, Deserialize)]
pub struct TargetFactorsConfig {
    #[serde(default = "default_kcal_per_kg")]
    pub kcal_per_kg: [f64; 2],
    #[serde(default = "default_protein_per_kg")]
    pub protein_g_per_kg: [f64; 2],
    #[serde(default = "default_fluid_per_kg")]
    pub fluid_ml_per_kg: [f64; 2],
}

impl Default for TargetFactorsConfig {
    fn default() -> Self {
        Self {
            kcal_per_kg: default_kcal_per_kg(),
            protein_g_per_kg: default_protein_per_kg(),
            fluid_ml_per_kg: default_fluid_per_kg(),
        }
    }
}

impl From<&TargetFactorsConfig> for TargetFactors {
    fn from(config: &TargetFactorsConfig) -> Self {
        TargetFactors {
            kcal_per_kg: (config.kcal_per_kg[0], config.kcal_per_kg[1]),
            protein_g_per_kg: (config.protein_g_per_kg[0], config.protein_g_per_kg[1]),
            fluid_ml_per_kg: (config.fluid_ml_per_kg[0], config.fluid_ml_per_kg[1]),
        }
    }
}

fn default_kcal_per_kg() -> [f64; 2] { [25.0, 30.0] }
fn default_protein_per_kg() -> [f64; 2] { [1.2, 1.5] }
fn default_fluid_per_kg() -> [f64; 2] { [30.0, 35.0] }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with NUTRI_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., NUTRI__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("NUTRI")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_env_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("NUTRI")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Check values the type system cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.len() < 32 {
            return Err(ConfigError::Message(
                "auth.jwt_secret must be at least 32 characters".to_string(),
            ));
        }
        if self.clinical.intervals.is_empty() || self.clinical.intervals.contains(&0) {
            return Err(ConfigError::Message(
                "clinical.intervals must list positive month counts".to_string(),
            ));
        }
        Ok(())
    }
}

/// Apply the conventional unprefixed environment variables
///
/// `DATABASE_URL` sets `database.url` and `NUTRI_JWT_SECRET` sets
/// `auth.jwt_secret` when present.
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(secret) = env::var("NUTRI_JWT_SECRET") {
        builder = builder.set_override("auth.jwt_secret", secret)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target_factors() {
        let factors = TargetFactors::from(&TargetFactorsConfig::default());
        assert_eq!(factors, TargetFactors::default());
    }

    #[test]
    fn test_default_clinical_intervals() {
        assert_eq!(ClinicalSettings::default().intervals, vec![1, 3, 6, 12]);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("nutri-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 8081

[database]
url = "postgres://localhost/test"

[auth]
jwt_secret = "0123456789abcdef0123456789abcdef"

[clinical]
intervals = [1, 2]
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.server.port, 8081);
        assert_eq!(settings.auth.token_ttl_secs, 8 * 60 * 60);
        assert_eq!(settings.clinical.intervals, vec![1, 2]);
        assert_eq!(settings.cache.formula_cache_size, 500);
        assert!(settings.validate().is_ok());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut settings = Settings {
            server: ServerSettings { host: "0.0.0.0".to_string(), port: 8080, workers: None },
            database: DatabaseSettings {
                url: "postgres://localhost/test".to_string(),
                max_connections: None,
                min_connections: None,
                acquire_timeout_secs: None,
                idle_timeout_secs: None,
            },
            auth: AuthSettings { jwt_secret: "short".to_string(), token_ttl_secs: 60 },
            cache: CacheSettings::default(),
            reference_data: ReferenceDataSettings::default(),
            clinical: ClinicalSettings::default(),
            logging: LoggingSettings::default(),
        };
        assert!(settings.validate().is_err());

        settings.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
        settings.clinical.intervals = vec![1, 0];
        assert!(settings.validate().is_err());
    }
}
