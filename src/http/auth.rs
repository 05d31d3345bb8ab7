use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::domain::profile::{Profile, Viewer};
use crate::http::AppError;
use crate::AppState;

/// The signed-in caller, resolved to their portal profile.
#[derive(Debug, Clone)]
pub struct AuthViewer {
    pub profile: Profile,
}

impl AuthViewer {
    pub fn viewer(&self) -> Viewer {
        self.profile.viewer()
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthViewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("invalid Authorization header"))?;

        let user_id = state
            .tokens
            .verify(token)
            .map_err(|err| {
                tracing::error!(error = ?err, "failed to authenticate");
                AppError::internal("failed to authenticate")
            })?
            .ok_or_else(|| AppError::unauthorized("invalid token"))?;

        let profile = tokio::time::timeout(state.store_timeout, state.profiles.profile(user_id))
            .await
            .map_err(|_| {
                tracing::error!(user_id = %user_id, "profile lookup timed out");
                AppError::internal("failed to authenticate")
            })?
            .map_err(|err| {
                tracing::error!(error = ?err, user_id = %user_id, "failed to load profile");
                AppError::internal("failed to authenticate")
            })?
            .ok_or_else(|| AppError::unauthorized("profile not found"))?;

        Ok(AuthViewer { profile })
    }
}
