//! `APP_*` environment configuration for the registry service.

mod configs;
mod defaults;
mod envconfig;
mod validate;

pub use configs::{AppConfig, AuthConfig, DatabaseConfig, GeneralConfig, LoggingConfig};
pub use envconfig::EnvConfig;
