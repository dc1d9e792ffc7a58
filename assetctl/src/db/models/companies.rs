//! Database models for companies.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::CompanyId;

#[derive(Debug, Clone)]
pub struct CompanyCreateDBRequest {
    pub company_name: String,
}

#[derive(Debug, Clone)]
pub struct CompanyUpdateDBRequest {
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CompanyDBResponse {
    pub id: CompanyId,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
