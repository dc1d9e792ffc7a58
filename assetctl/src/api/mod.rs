//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Everything is mounted under `/api/1.0`:
//!
//! - **Authentication** (`/auth`): exchange e-mail and password for a bearer token
//! - **Companies** (`/companies/*`): registration, company profile, teardown
//! - **Users** (`/companies/{id}/users/*`): user management, password changes, reactivation
//! - **Inventory** (`/companies/{id}/assets`, `asset-groups`, `vendors`, `asset-status`)
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa`; the document is served at
//! `/api/1.0/openapi.json`.

pub mod handlers;
pub mod models;
