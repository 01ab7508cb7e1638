use async_trait::async_trait;

use crate::db::entities::user;

/// Delivers a password reset link. Callers never learn whether delivery happened.
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn send_reset_link(&self, user: &user::Model, link: &str);
}

/// Writes the link to the log instead of mailing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingResetNotifier;

#[async_trait]
impl ResetNotifier for LoggingResetNotifier {
    async fn send_reset_link(&self, user: &user::Model, link: &str) {
        tracing::info!(user_id = user.id, reset_link = %link, "password reset link issued");
    }
}
