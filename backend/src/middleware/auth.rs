//! Authentication middleware
//!
//! Verifies the bearer access token and makes the caller's identity available
//! to handlers through the [`CurrentUser`] extractor.

use axum::{
    extract::{Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::error::{AppError, AppResult};
use crate::models::Role;
use crate::AppState;

/// Authenticated caller extracted from the access token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
    pub role: Role,
}

/// Read the bearer token from the Authorization header
fn bearer_token(request: &Request) -> AppResult<String> {
    match request.headers().typed_try_get::<Authorization<Bearer>>() {
        Ok(Some(Authorization(bearer))) => Ok(bearer.token().to_string()),
        Ok(None) => Err(AppError::MissingToken),
        Err(_) => Err(AppError::MalformedToken),
    }
}

/// Authentication middleware that validates JWT access tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let token = bearer_token(&request)?;
    let auth_user = state.auth.verify_access_token(&token)?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::AuthenticationRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::AUTHORIZATION;

    fn request_with(header: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_extracted() {
        let token = bearer_token(&request_with(Some("Bearer abc.def.ghi"))).unwrap();
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            bearer_token(&request_with(None)),
            Err(AppError::MissingToken)
        ));
    }

    #[test]
    fn test_wrong_scheme_is_malformed() {
        assert!(matches!(
            bearer_token(&request_with(Some("Basic dXNlcjpwYXNz"))),
            Err(AppError::MalformedToken)
        ));
    }
}
