use std::path::Path;

use ::config as config_rs;
use anyhow::{Context, Result};
use config_rs::{Environment, Map};
use serde::de::DeserializeOwned;

/// Typed settings read from `{PREFIX}_SECTION__KEY` variables, e.g.
/// `APP_AUTH__JWT_SECRET` lands in `auth.jwt_secret`.
pub trait EnvConfig: Sized + DeserializeOwned {
    const PREFIX: &'static str = "APP";
    const SEPARATOR: &'static str = "__";

    /// Checked after deserialization; the default accepts everything.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Process environment, topped up from a `.env` file when one exists.
    fn from_env() -> Result<Self> {
        load_dotenv();
        Self::from_environment(None)
    }

    /// Same parsing as [`EnvConfig::from_env`] over an explicit variable set.
    fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::from_environment(Some(vars))
    }

    fn from_environment(vars: Option<Map<String, String>>) -> Result<Self> {
        let source = Environment::with_prefix(Self::PREFIX)
            .prefix_separator("_")
            .separator(Self::SEPARATOR)
            .try_parsing(true)
            .source(vars);

        let cfg = config_rs::Config::builder()
            .add_source(source)
            .build()
            .context("failed to collect config variables")?
            .try_deserialize::<Self>()
            .with_context(|| format!("failed to parse {}_* variables", Self::PREFIX))?;

        cfg.validate()?;
        Ok(cfg)
    }
}

/// Variables already set in the process are never overwritten.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }
    let package_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if let Err(err) = dotenvy::from_path(&package_env) {
        tracing::debug!(path = %package_env.display(), error = %err, "no .env file loaded");
    }
}

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;

    use super::EnvConfig;

    #[test]
    fn nested_sections_come_from_double_underscore_keys() {
        let cfg = AppConfig::from_vars([
            ("APP_GENERAL__PORT", "9000"),
            ("APP_DATABASE__URL", "postgres://localhost/users"),
            ("APP_AUTH__JWT_SECRET", "secret"),
            ("APP_AUTH__ADMIN_EMAIL", "admin@example.com"),
            ("APP_AUTH__ADMIN_PASSWORD", "adminpassword"),
        ])
        .expect("config should load");

        assert_eq!(cfg.general.port, 9000);
        let database = cfg.database.expect("database section");
        assert_eq!(database.url, "postgres://localhost/users");
        assert_eq!(database.max_connections, 10);
        let auth = cfg.auth.expect("auth section");
        assert_eq!(auth.token_ttl_days, 30);
        assert_eq!(auth.admin_full_name, "Administrator");
    }

    #[test]
    fn missing_sections_stay_empty() {
        let cfg = AppConfig::from_vars(Vec::<(String, String)>::new()).expect("config should load");

        assert!(cfg.database.is_none());
        assert!(cfg.auth.is_none());
        assert_eq!(cfg.general.host, AppConfig::default().general.host);
    }

    #[test]
    fn validation_runs_after_parsing() {
        let err = AppConfig::from_vars([
            ("APP_AUTH__JWT_SECRET", "secret"),
            ("APP_AUTH__ADMIN_EMAIL", "admin@example.com"),
            ("APP_AUTH__ADMIN_PASSWORD", "short"),
        ])
        .expect_err("short admin password should be rejected");

        assert!(err.to_string().contains("auth.admin_password"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = AppConfig::from_vars([("APP_GENERAL__HOSTNAME", "example.com")]);

        assert!(result.is_err());
    }
}
