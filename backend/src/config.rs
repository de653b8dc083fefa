//! Configuration for the TokoBoost backend.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure.
///
/// Loaded from an optional `config.toml` with a `TOKOBOOST__`-prefixed
/// environment overlay, e.g. `TOKOBOOST__MIDTRANS__SERVER_KEY`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub generator: GeneratorConfig,
    pub midtrans: MidtransConfig,
    #[serde(default)]
    pub credits: CreditsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// Firebase ID tokens are ordinary OIDC JWTs.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Issuer URL, e.g. `https://securetoken.google.com/<project-id>`.
    pub issuer: String,
    /// Expected audience (the Firebase project id).
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite:./data/tokoboost.db".to_string() }
    }
}

/// The Genkit flow server hosting the generation flows.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    pub base_url: String,
    /// Generation can run for tens of seconds; requests time out after this.
    #[serde(default = "default_generator_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MidtransConfig {
    pub server_key: String,
    #[serde(default = "default_snap_base_url")]
    pub snap_base_url: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

/// Credit constants. Defaults match the launch pricing.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditsConfig {
    /// Credits granted when an account is first created.
    #[serde(default = "default_initial_grant")]
    pub initial_grant: i64,
    /// Credits deducted per generation.
    #[serde(default = "default_generation_cost")]
    pub generation_cost: i64,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            initial_grant: default_initial_grant(),
            generation_cost: default_generation_cost(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_cors_origins")]
    pub origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { origins: default_cors_origins() }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_generator_timeout_secs() -> u64 {
    120
}

fn default_snap_base_url() -> String {
    "https://app.midtrans.com".to_string()
}

fn default_api_base_url() -> String {
    "https://api.midtrans.com".to_string()
}

fn default_initial_grant() -> i64 {
    10
}

fn default_generation_cost() -> i64 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cors_origins() -> String {
    "*".to_string()
}

impl Config {
    /// Load configuration from `config.toml` (optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("TOKOBOOST").separator("__"))
            .build()?
            .try_deserialize()
    }
}
