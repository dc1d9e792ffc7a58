//! Database models for vendors.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{CompanyId, UserId, VendorId};

#[derive(Debug, Clone)]
pub struct VendorCreateDBRequest {
    pub user_id: Option<UserId>,
    pub vendor_name: String,
    pub contact_person: String,
    pub email: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VendorUpdateDBRequest {
    pub vendor_name: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct VendorDBResponse {
    pub id: VendorId,
    pub company_id: CompanyId,
    pub user_id: Option<UserId>,
    pub vendor_name: String,
    pub contact_person: String,
    pub email: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
