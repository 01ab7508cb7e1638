use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    auth::{
        AuthState, Identity, ResetClaims, SessionClaims,
        password::{dummy_verify, hash_password, verify_password},
        policy::{check_password, normalize_email, normalize_username},
        tokens::{RESET_AUDIENCE, SESSION_AUDIENCE, decode_token, encode_token},
    },
    db::{
        dao::{DaoLayerError, UserDao, is_unique_violation},
        entities::user,
    },
    error::AppError,
};

pub const RESET_REQUESTED_MESSAGE: &str =
    "If that email exists, you'll receive a reset link shortly.";
const INVALID_RESET_LINK: &str = "That reset link is invalid or has expired.";
const SESSION_INVALID: &str = "Session expired or invalid";
const ACCOUNT_TAKEN: &str = "Username or email is already taken";

/// A freshly started session and the account it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: user::Model,
    pub identity: Identity,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService<'a> {
    users: UserDao,
    auth: &'a AuthState,
}

impl<'a> AuthService<'a> {
    pub fn new(users: UserDao, auth: &'a AuthState) -> Self {
        Self { users, auth }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        self.register_with_display_name(username, email, password, None)
            .await
    }

    /// Creates the account and logs it in.
    pub async fn register_with_display_name(
        &self,
        username: &str,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthSession, AppError> {
        let username = normalize_username(username)?;
        let email = normalize_email(email)?;
        check_password(password)?;
        let display_name = display_name.map(str::trim).filter(|name| !name.is_empty());

        if self.users.username_or_email_taken(&username, &email).await? {
            return Err(AppError::validation(ACCOUNT_TAKEN));
        }

        let password_hash = hash_password(password)?;
        let user = match self
            .users
            .create_user(&username, &email, &password_hash, display_name)
            .await
        {
            Ok(user) => user,
            Err(DaoLayerError::Db(err)) if is_unique_violation(&err) => {
                return Err(AppError::validation(ACCOUNT_TAKEN));
            }
            Err(err) => return Err(err.into()),
        };

        info!(user_id = user.id, "account registered");
        self.start_session(user, false).await
    }

    /// Looks the identifier up as username or email. Every failure reads the same.
    pub async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
        remember: bool,
    ) -> Result<AuthSession, AppError> {
        let identifier = identifier.trim();
        let Some(user) = self.users.find_by_identifier(identifier).await? else {
            dummy_verify(password);
            debug!("login rejected");
            return Err(AppError::invalid_credentials());
        };

        if !verify_password(password, &user.password_hash) {
            debug!(user_id = user.id, "login rejected");
            return Err(AppError::invalid_credentials());
        }

        let purged = self.auth.sessions.purge_expired().await;
        if purged > 0 {
            debug!(purged, "dropped expired sessions");
        }

        info!(user_id = user.id, remember, "login succeeded");
        self.start_session(user, remember).await
    }

    /// Destroys the session. Repeating it is harmless.
    pub async fn logout(&self, identity: &Identity) {
        if self.auth.sessions.destroy(identity.session_id).await {
            info!(user_id = identity.user_id, "logged out");
        }
    }

    /// Turns a presented session token into an identity. The signature, the
    /// expiry and the server-side record must all check out.
    pub async fn resolve(&self, token: &str) -> Result<Identity, AppError> {
        let claims: SessionClaims = decode_token(&self.auth.keys, token, SESSION_AUDIENCE)
            .map_err(|_| AppError::auth(SESSION_INVALID))?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| AppError::auth(SESSION_INVALID))?;

        let record = self
            .auth
            .sessions
            .get(claims.sid)
            .await
            .ok_or_else(|| AppError::auth(SESSION_INVALID))?;
        if record.user_id != user_id {
            return Err(AppError::auth(SESSION_INVALID));
        }

        Ok(Identity {
            user_id,
            session_id: claims.sid,
        })
    }

    /// Always answers with the same message, whether or not the email is known.
    pub async fn request_password_reset(&self, email: &str) -> Result<&'static str, AppError> {
        let Ok(email) = normalize_email(email) else {
            return Ok(RESET_REQUESTED_MESSAGE);
        };

        if let Some(user) = self.users.find_by_email(&email).await? {
            let token = self.issue_reset_token(user.id, Utc::now())?;
            let link = format!("{}/{}", self.auth.settings.reset_base_url, token);
            self.auth.notifier.send_reset_link(&user, &link).await;
        }

        Ok(RESET_REQUESTED_MESSAGE)
    }

    pub fn issue_reset_token(
        &self,
        user_id: i64,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = ResetClaims::new(
            user_id,
            issued_at,
            issued_at + self.auth.settings.reset_ttl,
        );
        encode_token(&self.auth.keys, &claims)
    }

    /// Replaces the password and ends every session of that user.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let claims: ResetClaims = decode_token(&self.auth.keys, token, RESET_AUDIENCE)
            .map_err(|_| AppError::token(INVALID_RESET_LINK))?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| AppError::token(INVALID_RESET_LINK))?;

        check_password(new_password)?;

        let password_hash = hash_password(new_password)?;
        match self.users.set_password_hash(user_id, &password_hash).await {
            Ok(()) => {}
            Err(DaoLayerError::NotFound { .. }) => {
                return Err(AppError::token(INVALID_RESET_LINK));
            }
            Err(err) => return Err(err.into()),
        }

        let revoked = self.auth.sessions.revoke_user(user_id).await;
        info!(user_id, revoked, "password reset");
        Ok(())
    }

    async fn start_session(&self, user: user::Model, remember: bool) -> Result<AuthSession, AppError> {
        let settings = &self.auth.settings;
        let ttl = if remember {
            settings.remember_ttl
        } else {
            settings.session_ttl
        };
        let issued_at = Utc::now();
        let expires_at = issued_at + ttl;

        let session_id = self.auth.sessions.create(user.id, expires_at).await;
        let claims = SessionClaims::new(user.id, session_id, issued_at, expires_at);
        let token = match encode_token(&self.auth.keys, &claims) {
            Ok(token) => token,
            Err(err) => {
                self.auth.sessions.destroy(session_id).await;
                return Err(err);
            }
        };

        Ok(AuthSession {
            identity: Identity {
                user_id: user.id,
                session_id,
            },
            user,
            token,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{ACCOUNT_TAKEN, INVALID_RESET_LINK, RESET_REQUESTED_MESSAGE};
    use crate::{
        auth::{ResetClaims, tokens::encode_token},
        error::{AppError, INVALID_CREDENTIALS},
        test_helpers::test_app,
    };

    #[tokio::test]
    async fn register_normalizes_and_logs_in() {
        let app = test_app().await;
        let services = app.services();
        let auth = services.auth(app.auth());

        let session = auth
            .register_with_display_name("  Maya_R ", "Maya@Example.COM", "hunter2hunter", Some("Maya"))
            .await
            .expect("registration should succeed");

        assert_eq!(session.user.username, "Maya_R");
        assert_eq!(session.user.email, "maya@example.com");
        assert_eq!(session.user.display_name(), "Maya");
        assert_ne!(session.user.password_hash, "hunter2hunter");

        let identity = auth.resolve(&session.token).await.expect("token resolves");
        assert_eq!(identity, session.identity);
    }

    #[tokio::test]
    async fn duplicate_username_or_email_is_rejected() {
        let app = test_app().await;
        let services = app.services();
        let auth = services.auth(app.auth());
        auth.register("maya", "maya@example.com", "hunter2hunter")
            .await
            .expect("first registration should succeed");

        let same_email = auth
            .register("someone", "MAYA@example.com", "hunter2hunter")
            .await
            .expect_err("email is taken");
        let same_name = auth
            .register("MAYA", "other@example.com", "hunter2hunter")
            .await
            .expect_err("username is taken");

        assert_eq!(same_email, AppError::validation(ACCOUNT_TAKEN));
        assert_eq!(same_name, AppError::validation(ACCOUNT_TAKEN));
    }

    #[tokio::test]
    async fn weak_password_is_rejected() {
        let app = test_app().await;
        let services = app.services();

        let err = services
            .auth(app.auth())
            .register("maya", "maya@example.com", "short")
            .await
            .expect_err("weak password should fail");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let app = test_app().await;
        let services = app.services();
        let auth = services.auth(app.auth());
        auth.register("maya", "maya@example.com", "hunter2hunter")
            .await
            .expect("registration should succeed");

        let unknown = auth
            .authenticate("nobody", "hunter2hunter", false)
            .await
            .expect_err("unknown user");
        let wrong = auth
            .authenticate("maya", "wrongpass99", false)
            .await
            .expect_err("wrong password");

        assert_eq!(unknown, wrong);
        assert_eq!(unknown.message(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn login_accepts_email_and_remember_extends_expiry() {
        let app = test_app().await;
        let services = app.services();
        let auth = services.auth(app.auth());
        auth.register("maya", "maya@example.com", "hunter2hunter")
            .await
            .expect("registration should succeed");

        let short = auth
            .authenticate("Maya@Example.com", "hunter2hunter", false)
            .await
            .expect("login by email");
        let long = auth
            .authenticate("maya", "hunter2hunter", true)
            .await
            .expect("login by username");

        assert!(long.expires_at - short.expires_at > Duration::days(1));
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let app = test_app().await;
        let services = app.services();
        let auth = services.auth(app.auth());
        let session = auth
            .register("maya", "maya@example.com", "hunter2hunter")
            .await
            .expect("registration should succeed");

        auth.logout(&session.identity).await;
        auth.logout(&session.identity).await;

        let err = auth.resolve(&session.token).await.expect_err("session is gone");
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn reset_request_looks_the_same_for_unknown_emails() {
        let app = test_app().await;
        let services = app.services();
        let auth = services.auth(app.auth());
        auth.register("maya", "maya@example.com", "hunter2hunter")
            .await
            .expect("registration should succeed");

        let known = auth
            .request_password_reset("maya@example.com")
            .await
            .expect("known email");
        let unknown = auth
            .request_password_reset("ghost@example.com")
            .await
            .expect("unknown email");
        let garbage = auth
            .request_password_reset("not an email")
            .await
            .expect("malformed email");

        assert_eq!(known, RESET_REQUESTED_MESSAGE);
        assert_eq!(unknown, known);
        assert_eq!(garbage, known);
        assert_eq!(app.notifier.links().len(), 1);
    }

    #[tokio::test]
    async fn reset_replaces_password_and_ends_sessions() {
        let app = test_app().await;
        let services = app.services();
        let auth = services.auth(app.auth());
        let session = auth
            .register("maya", "maya@example.com", "hunter2hunter")
            .await
            .expect("registration should succeed");
        auth.request_password_reset("maya@example.com")
            .await
            .expect("reset request");
        let token = app.notifier.last_token().expect("link was sent");

        auth.reset_password(&token, "newpass2024")
            .await
            .expect("reset should succeed");

        assert!(auth.resolve(&session.token).await.is_err());
        assert!(auth.authenticate("maya", "hunter2hunter", false).await.is_err());
        auth.authenticate("maya", "newpass2024", false)
            .await
            .expect("new password works");
    }

    #[tokio::test]
    async fn expired_or_tampered_reset_tokens_are_rejected() {
        let app = test_app().await;
        let services = app.services();
        let auth = services.auth(app.auth());
        let session = auth
            .register("maya", "maya@example.com", "hunter2hunter")
            .await
            .expect("registration should succeed");
        let user_id = session.user.id;

        let expired = auth
            .issue_reset_token(user_id, Utc::now() - Duration::hours(2))
            .expect("token encodes");
        let mut tampered = auth
            .issue_reset_token(user_id, Utc::now())
            .expect("token encodes");
        tampered.push('x');

        for token in [expired, tampered] {
            let err = auth
                .reset_password(&token, "newpass2024")
                .await
                .expect_err("token should be rejected");
            assert_eq!(err, AppError::token(INVALID_RESET_LINK));
        }
        auth.resolve(&session.token)
            .await
            .expect("failed resets leave sessions alone");
    }

    #[tokio::test]
    async fn reset_token_for_missing_user_is_a_token_error() {
        let app = test_app().await;
        let services = app.services();
        let auth = services.auth(app.auth());
        let now = Utc::now();
        let token = encode_token(
            &app.auth().keys,
            &ResetClaims::new(4_242, now, now + Duration::minutes(10)),
        )
        .expect("token encodes");

        let err = auth
            .reset_password(&token, "newpass2024")
            .await
            .expect_err("unknown user");
        assert_eq!(err, AppError::token(INVALID_RESET_LINK));
    }

    #[tokio::test]
    async fn session_token_is_not_a_reset_token() {
        let app = test_app().await;
        let services = app.services();
        let auth = services.auth(app.auth());
        let session = auth
            .register("maya", "maya@example.com", "hunter2hunter")
            .await
            .expect("registration should succeed");

        let err = auth
            .reset_password(&session.token, "newpass2024")
            .await
            .expect_err("wrong audience");
        assert!(matches!(err, AppError::Token(_)));
    }
}
