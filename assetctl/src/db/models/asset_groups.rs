//! Database models for asset groups.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{AssetGroupId, CompanyId, UserId};

#[derive(Debug, Clone)]
pub struct AssetGroupCreateDBRequest {
    pub user_id: Option<UserId>,
    pub asset_group_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct AssetGroupUpdateDBRequest {
    pub asset_group_name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AssetGroupDBResponse {
    pub id: AssetGroupId,
    pub company_id: CompanyId,
    pub user_id: Option<UserId>,
    pub asset_group_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
