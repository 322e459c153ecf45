use thiserror::Error;

mod app_config;
mod catalog;
mod config;

pub use app_config::{AppConfig, Environment};
pub use catalog::{
    parse_price, ExternalImage, ExternalProduct, ExternalVariant, DEFAULT_STOREFRONT,
};
pub use config::{load_app_config, load_app_config_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
