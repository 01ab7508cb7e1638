pub mod notifier;
pub mod password;
pub mod policy;
pub mod session;
pub mod tokens;
pub mod types;

use std::sync::Arc;

use chrono::Duration;

use crate::config::{AuthConfig, defaults::MAX_TTL_SECS};

pub use notifier::{LoggingResetNotifier, ResetNotifier};
pub use session::{InMemorySessionStore, SessionRecord, SessionStore};
pub use tokens::{JwtKeys, ResetClaims, SessionClaims};
pub use types::Identity;

/// Lifetimes and links derived from `AuthConfig`.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub session_ttl: Duration,
    pub remember_ttl: Duration,
    pub reset_ttl: Duration,
    pub reset_base_url: String,
}

impl From<&AuthConfig> for AuthSettings {
    fn from(cfg: &AuthConfig) -> Self {
        Self {
            session_ttl: ttl(cfg.session_ttl_secs),
            remember_ttl: ttl(cfg.remember_ttl_secs),
            reset_ttl: ttl(cfg.reset_ttl_secs),
            reset_base_url: cfg.reset_base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Clamped to `MAX_TTL_SECS` so `issued_at + ttl` cannot overflow even when
/// the config skipped validation.
fn ttl(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_TTL_SECS) as i64)
}

/// Process-wide auth collaborators shared through `AppState`.
#[derive(Clone)]
pub struct AuthState {
    pub keys: JwtKeys,
    pub sessions: Arc<dyn SessionStore>,
    pub notifier: Arc<dyn ResetNotifier>,
    pub settings: AuthSettings,
}

impl AuthState {
    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self {
            keys: JwtKeys::from_secret(cfg.secret_key.as_bytes()),
            sessions: Arc::new(InMemorySessionStore::default()),
            notifier: Arc::new(LoggingResetNotifier),
            settings: AuthSettings::from(cfg),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ResetNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::AuthSettings;
    use crate::config::{AuthConfig, defaults::MAX_TTL_SECS};

    #[test]
    fn oversized_lifetimes_are_clamped() {
        let mut cfg = AuthConfig::with_secret("a-long-enough-secret");
        cfg.remember_ttl_secs = u64::MAX;

        let settings = AuthSettings::from(&cfg);
        assert_eq!(settings.remember_ttl, Duration::seconds(MAX_TTL_SECS as i64));
        assert!(Utc::now().checked_add_signed(settings.remember_ttl).is_some());
    }
}
