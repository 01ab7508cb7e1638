use anyhow::{Result, bail};

use super::{
    AppConfig,
    defaults::{MAX_TTL_SECS, MIN_SECRET_KEY_LEN},
};

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if cfg.database.url.trim().is_empty() {
        errors.push("database.url must not be empty".to_string());
    } else if !cfg.database.url.trim().to_ascii_lowercase().starts_with("sqlite:") {
        errors.push("database.url must use the sqlite: scheme".to_string());
    }

    if cfg.database.max_connections == 0 {
        errors.push("database.max_connections must be > 0".to_string());
    }

    if cfg.database.min_idle > cfg.database.max_connections {
        errors.push(format!(
            "database.min_idle ({}) must be <= database.max_connections ({})",
            cfg.database.min_idle, cfg.database.max_connections
        ));
    }

    if let Some(auth) = cfg.auth.as_ref() {
        if auth.secret_key.trim().len() < MIN_SECRET_KEY_LEN {
            errors.push(format!(
                "auth.secret_key must be at least {MIN_SECRET_KEY_LEN} characters"
            ));
        }

        if auth.session_ttl_secs == 0 {
            errors.push("auth.session_ttl_secs must be > 0".to_string());
        }

        if auth.remember_ttl_secs < auth.session_ttl_secs {
            errors.push(
                "auth.remember_ttl_secs must be >= auth.session_ttl_secs".to_string(),
            );
        }

        if auth.reset_ttl_secs == 0 {
            errors.push("auth.reset_ttl_secs must be > 0".to_string());
        }

        for (name, secs) in [
            ("session_ttl_secs", auth.session_ttl_secs),
            ("remember_ttl_secs", auth.remember_ttl_secs),
            ("reset_ttl_secs", auth.reset_ttl_secs),
        ] {
            if secs > MAX_TTL_SECS {
                errors.push(format!("auth.{name} must be <= {MAX_TTL_SECS}"));
            }
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}

#[cfg(test)]
mod tests {
    use super::validate;
    use crate::config::{AppConfig, AuthConfig};

    #[test]
    fn default_config_without_auth_is_valid() {
        assert!(validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn rejects_short_secret_key() {
        let cfg = AppConfig {
            auth: Some(AuthConfig::with_secret("short")),
            ..AppConfig::default()
        };

        let err = validate(&cfg).expect_err("short secret should fail");
        assert!(err.to_string().contains("auth.secret_key"));
    }

    #[test]
    fn rejects_lifetimes_beyond_a_year() {
        let mut auth = AuthConfig::with_secret("a-long-enough-secret");
        auth.remember_ttl_secs = u64::MAX;
        auth.reset_ttl_secs = u64::MAX / 2;
        let cfg = AppConfig {
            auth: Some(auth),
            ..AppConfig::default()
        };

        let message = validate(&cfg).expect_err("huge ttl should fail").to_string();
        assert!(message.contains("auth.remember_ttl_secs must be <="));
        assert!(message.contains("auth.reset_ttl_secs must be <="));
        assert!(!message.contains("auth.session_ttl_secs"));
    }

    #[test]
    fn rejects_non_sqlite_url_and_bad_pool_sizes() {
        let mut cfg = AppConfig::default();
        cfg.database.url = "postgres://localhost/dormcart".to_string();
        cfg.database.max_connections = 1;
        cfg.database.min_idle = 4;

        let message = validate(&cfg).expect_err("config should fail").to_string();
        assert!(message.contains("sqlite: scheme"));
        assert!(message.contains("database.min_idle (4)"));
    }

    #[test]
    fn require_auth_fails_when_secret_missing() {
        let err = AppConfig::default()
            .require_auth()
            .expect_err("missing auth should be fatal");
        assert!(err.to_string().contains("APP_AUTH__SECRET_KEY"));
    }
}
