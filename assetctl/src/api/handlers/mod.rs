//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for:
//! - Running its authorization guard against the ids in the path
//! - Request validation, reporting the first failing rule per field
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`auth`]: Sign-in
//! - [`companies`]: Company registration, profile, rename and teardown
//! - [`users`]: User CRUD, password changes and reactivation
//! - [`asset_groups`]: Asset group CRUD and the assets filed under a group
//! - [`assets`]: Asset CRUD with status and vendor links
//! - [`vendors`]: Vendor CRUD and the assets bought from a vendor
//! - [`statuses`]: Asset statuses and the assets in each
//!
//! # Authentication
//!
//! Handlers take a [`crate::auth::identity::Caller`] and call `authorize` with the policy for the
//! route before touching the database. The identity it returns is the only source of the caller's
//! company and admin flag.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the status code and JSON error body.
//! Bodies are taken through [`JsonBody`]: a missing body, or one not sent as JSON, reads as `{}` so
//! every required field reports its own validation message, and unparsable JSON is a `400`.

pub mod asset_groups;
pub mod assets;
pub mod auth;
pub mod companies;
pub mod statuses;
pub mod users;
pub mod vendors;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{HeaderMap, header::CONTENT_TYPE},
};
use serde::de::DeserializeOwned;

use crate::{
    errors::{Error, Result},
    types::parse_id,
};

/// JSON request body. An empty body, or one without a JSON content type, deserializes as `{}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().to_ascii_lowercase())
        .is_some_and(|mime| mime == "application/json" || mime.ends_with("+json"))
}

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self> {
        let json = is_json(request.headers());
        let bytes = Bytes::from_request(request, state).await.map_err(|e| Error::BadRequest {
            message: format!("Invalid request body: {}", e.body_text()),
        })?;

        let raw: &[u8] = if json && !bytes.trim_ascii().is_empty() { &bytes[..] } else { b"{}" };
        serde_json::from_slice(raw).map(JsonBody).map_err(|e| Error::BadRequest {
            message: format!("Invalid request body: {e}"),
        })
    }
}

/// Fallback for routes that do not exist.
pub async fn not_found() -> Error {
    Error::NotFound { resource: "Resource" }
}

/// Entity id from a path segment. A malformed id is reported as the entity not existing.
pub(crate) fn entity_id(raw: &str, resource: &'static str) -> Result<i32> {
    parse_id(raw).ok_or(Error::NotFound { resource })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::HeaderValue};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Named {
        name: Option<String>,
    }

    fn request(content_type: Option<&'static str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_json_body_missing_reads_as_empty_object() {
        for req in [request(None, ""), request(Some("application/json"), "  "), request(Some("text/plain"), "name")] {
            let JsonBody(named) = JsonBody::<Named>::from_request(req, &()).await.unwrap();
            assert!(named.name.is_none());
        }
    }

    #[tokio::test]
    async fn test_json_body_parses_json() {
        let req = request(Some("application/json; charset=utf-8"), r#"{"name":"laptops"}"#);
        let JsonBody(named) = JsonBody::<Named>::from_request(req, &()).await.unwrap();
        assert_eq!(named.name.as_deref(), Some("laptops"));

        let broken = request(Some("application/json"), "{\"name\":");
        match JsonBody::<Named>::from_request(broken, &()).await {
            Err(Error::BadRequest { .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_entity_id() {
        assert_eq!(entity_id("12", "Vendor").unwrap(), 12);
        match entity_id("twelve", "Vendor") {
            Err(Error::NotFound { resource }) => assert_eq!(resource, "Vendor"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
