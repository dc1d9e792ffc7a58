//! Database models for users.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{CompanyId, UserId};

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub company_id: CompanyId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub password_hash: String,
}

/// Database request for updating a user. `None` leaves a column untouched; `full_name` uses
/// `Some(None)` to clear it.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<Option<String>>,
    pub password_hash: Option<String>,
}

/// Database response for a user. `is_admin` is derived from the admin relation.
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub company_id: CompanyId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub password_hash: String,
    pub inactive: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
