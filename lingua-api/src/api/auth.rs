//! Bearer-token authentication
//!
//! Protected handlers take a [`CurrentUser`] extractor argument. The
//! extractor validates the JWT, loads the user row, and applies the
//! per-user request quota; any failure rejects the request before the
//! handler runs.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use lingua_common::auth::verify_token;
use lingua_common::db;
use lingua_common::models::user::User;

use super::AppState;
use crate::error::ApiError;

/// The authenticated user behind the current request
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        let claims = verify_token(token, &state.settings.jwt_secret)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        if state.api_limiter.check_key(&claims.sub).is_err() {
            return Err(ApiError::RateLimited);
        }

        let user = db::users::load_user_by_id(&state.db, &claims.sub)
            .await
            .map_err(ApiError::Common)?
            .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

        Ok(CurrentUser(user))
    }
}

/// The token from an `Authorization: Bearer` header
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/users/me");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn bearer_token_requires_the_scheme_prefix() {
        assert_eq!(
            bearer_token(&parts_with_auth(Some("Bearer abc.def.ghi"))),
            Some("abc.def.ghi")
        );
        assert_eq!(bearer_token(&parts_with_auth(Some("Basic dXNlcg=="))), None);
        assert_eq!(bearer_token(&parts_with_auth(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with_auth(None)), None);
    }
}
