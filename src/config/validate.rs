use anyhow::{Result, bail};

use super::AppConfig;

const MIN_ADMIN_PASSWORD_LEN: usize = 8;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if let Some(auth) = cfg.auth.as_ref() {
        if auth.admin_email.trim().is_empty() {
            errors.push("auth.admin_email must not be empty".to_string());
        }

        if auth.admin_password.len() < MIN_ADMIN_PASSWORD_LEN {
            errors.push(format!(
                "auth.admin_password must be at least {MIN_ADMIN_PASSWORD_LEN} characters"
            ));
        }

        if auth.jwt_secret.trim().is_empty() {
            errors.push("auth.jwt_secret must not be empty".to_string());
        }

        if auth.token_ttl_days == 0 {
            errors.push("auth.token_ttl_days must be > 0".to_string());
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}

#[cfg(test)]
mod tests {
    use crate::config::{AppConfig, AuthConfig, DatabaseConfig};

    use super::validate;

    fn auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "secret".to_string(),
            token_ttl_days: 30,
            admin_email: "admin@example.com".to_string(),
            admin_password: "adminpassword".to_string(),
            admin_full_name: "Administrator".to_string(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_problem_into_one_error() {
        let mut auth = auth_config();
        auth.jwt_secret = "  ".to_string();
        auth.admin_password = "short".to_string();
        auth.token_ttl_days = 0;
        let cfg = AppConfig {
            database: Some(DatabaseConfig {
                url: "postgres://localhost/users".to_string(),
                max_connections: 2,
                min_idle: 5,
            }),
            auth: Some(auth),
            ..AppConfig::default()
        };

        let message = validate(&cfg).expect_err("config should be rejected").to_string();

        assert!(message.contains("database.min_idle (5)"));
        assert!(message.contains("auth.jwt_secret"));
        assert!(message.contains("auth.admin_password"));
        assert!(message.contains("auth.token_ttl_days"));
    }

    #[test]
    fn accepts_complete_auth_section() {
        let cfg = AppConfig {
            auth: Some(auth_config()),
            ..AppConfig::default()
        };

        assert!(validate(&cfg).is_ok());
    }
}
