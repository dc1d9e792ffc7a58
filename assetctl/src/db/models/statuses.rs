//! Database models for asset statuses.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{CompanyId, StatusId, UserId};

#[derive(Debug, Clone)]
pub struct StatusCreateDBRequest {
    pub user_id: Option<UserId>,
    pub status_name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct StatusDBResponse {
    pub id: StatusId,
    pub company_id: CompanyId,
    pub user_id: Option<UserId>,
    pub status_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
