use std::sync::Arc;

use axum::{extract::FromRequestParts, http::header, http::request::Parts};

use crate::{auth::Identity, error::AppError, services::ServiceContext, state::AppState};

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// Session guard: resolve the bearer token against the session store.
impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>().copied() {
            return Ok(identity);
        }

        let token = bearer_token(parts).ok_or_else(AppError::unauthenticated)?;
        let identity = ServiceContext::from_state(state)
            .auth(&state.auth)
            .resolve(token)
            .await?;

        parts.extensions.insert(identity);
        Ok(identity)
    }
}

/// Identity when a valid session is attached, otherwise anonymous.
#[derive(Debug, Clone, Copy)]
pub struct MaybeIdentity(pub Option<Identity>);

impl FromRequestParts<Arc<AppState>> for MaybeIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(Identity::from_request_parts(parts, state).await.ok()))
    }
}
