//! Request-scoped identity resolution.
//!
//! [`resolve_identity`] runs in front of every route. It reads `Authorization: Bearer <token>`,
//! verifies the token and checks that the user it names still exists and is active. When all of
//! that holds, an [`Identity`] is stored in the request extensions; otherwise the request continues
//! anonymously and the route's policies decide what to do with it. Handlers read the result
//! through the [`Caller`] extractor.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    auth::{
        policies::{PathScope, Policy},
        session,
    },
    db::handlers::Users,
    errors::{Error, Result},
    types::{CompanyId, UserId},
};

/// An authenticated caller, as carried by a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub is_admin: bool,
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolve a raw token to an identity. Bad tokens and missing or inactive users resolve to `None`;
/// only storage failures are errors.
#[instrument(skip(state, token), err)]
pub async fn resolve(state: &AppState, token: &str) -> Result<Option<Identity>> {
    let identity = match session::verify_token(token, &state.config) {
        Ok(identity) => identity,
        Err(e @ Error::Internal { .. }) => return Err(e),
        Err(e) => {
            trace!("Ignoring invalid bearer token: {}", e);
            return Ok(None);
        }
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_by_id(identity.user_id).await?;

    match user {
        Some(user) if !user.inactive => Ok(Some(identity)),
        Some(_) => {
            debug!("Token for inactive user {} ignored", identity.user_id);
            Ok(None)
        }
        None => {
            debug!("Token for unknown user {} ignored", identity.user_id);
            Ok(None)
        }
    }
}

/// Middleware attaching the caller's [`Identity`] to the request when the bearer token resolves.
pub async fn resolve_identity(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response> {
    let token = bearer_token(request.headers()).map(str::to_owned);
    if let Some(token) = token {
        if let Some(identity) = resolve(&state, &token).await? {
            request.extensions_mut().insert(identity);
        }
    }
    Ok(next.run(request).await)
}

/// The resolved caller of a request, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct Caller(pub Option<Identity>);

impl Caller {
    /// Run `policy` against this caller and hand back the identity it admitted.
    pub fn authorize(&self, policy: impl Policy, scope: &PathScope) -> Result<Identity> {
        policy.check(self.0.as_ref(), scope)?;
        // Every policy starts from an authenticated caller
        self.0.ok_or_else(Error::unauthorized)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(Caller(parts.extensions.get::<Identity>().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("abc.def.ghi")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_caller_reads_extension() {
        let identity = Identity {
            user_id: 1,
            company_id: 2,
            is_admin: false,
        };
        let mut request = axum::http::Request::builder().uri("/").body(()).unwrap();
        request.extensions_mut().insert(identity);
        let (mut parts, _) = request.into_parts();

        let Caller(found) = Caller::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, Some(identity));
    }

    #[tokio::test]
    async fn test_caller_absent_without_extension() {
        let (mut parts, _) = axum::http::Request::builder().uri("/").body(()).unwrap().into_parts();
        let Caller(found) = Caller::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(found.is_none());
    }
}
