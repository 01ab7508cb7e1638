use crate::db::{dao::DaoLayerError, schema::SchemaError};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const CHECKOUT_UNAVAILABLE: &str = "Checkout is unavailable right now.";
const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Validation(String),
    Auth(String),
    Forbidden(String),
    NotFound(String),
    InvalidTransition(String),
    Token(String),
    CheckoutDisabled(String),
    Schema(String),
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Generic credential failure. Identical for unknown users and bad passwords.
    pub fn invalid_credentials() -> Self {
        Self::Auth(INVALID_CREDENTIALS.to_string())
    }

    pub fn unauthenticated() -> Self {
        Self::Auth("Login required".to_string())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::InvalidTransition(message.into())
    }

    pub fn token(message: impl Into<String>) -> Self {
        Self::Token(message.into())
    }

    pub fn checkout_disabled() -> Self {
        Self::CheckoutDisabled(CHECKOUT_UNAVAILABLE.to_string())
    }

    pub fn internal() -> Self {
        Self::Internal(INTERNAL_MESSAGE.to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(message)
            | Self::Auth(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::InvalidTransition(message)
            | Self::Token(message)
            | Self::CheckoutDisabled(message)
            | Self::Schema(message)
            | Self::Internal(message) => message.as_str(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Auth(_) => "auth_error",
            Self::Forbidden(_) => "forbidden_error",
            Self::NotFound(_) => "not_found_error",
            Self::InvalidTransition(_) => "invalid_transition_error",
            Self::Token(_) => "token_error",
            Self::CheckoutDisabled(_) => "checkout_disabled_error",
            Self::Schema(_) => "schema_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

impl From<DaoLayerError> for AppError {
    fn from(err: DaoLayerError) -> Self {
        match err {
            DaoLayerError::NotFound { entity, .. } => {
                AppError::not_found(format!("{entity} not found"))
            }
            DaoLayerError::InvalidPagination { .. } => AppError::validation(err.to_string()),
            DaoLayerError::Db(db_err) => {
                tracing::error!(error = %db_err, "database operation failed");
                AppError::internal()
            }
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        DaoLayerError::Db(err).into()
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::Schema(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;

    use super::*;

    #[test]
    fn database_errors_do_not_leak_details() {
        let err = AppError::from(DaoLayerError::Db(DbErr::Custom(
            "UNIQUE constraint failed: users.email".to_string(),
        )));

        assert_eq!(err, AppError::internal());
        assert!(!err.message().contains("users.email"));
    }

    #[test]
    fn not_found_keeps_entity_name_only() {
        let err = AppError::from(DaoLayerError::NotFound {
            entity: "listing",
            id: 42,
        });

        assert_eq!(err.message(), "listing not found");
        assert_eq!(err.kind(), "not_found_error");
    }

    #[test]
    fn credential_failures_share_one_message() {
        assert_eq!(
            AppError::invalid_credentials().message(),
            INVALID_CREDENTIALS
        );
    }
}
