//! Database models for assets and their status and vendor links.

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{AssetGroupId, AssetId, CompanyId, StatusId, UserId, VendorId};

/// Database request for creating an asset together with its status link and optional vendor link
#[derive(Debug, Clone)]
pub struct AssetCreateDBRequest {
    pub user_id: Option<UserId>,
    pub asset_name: String,
    pub asset_group_id: AssetGroupId,
    pub serial_code: Option<String>,
    pub purchasing_cost: Option<f64>,
    pub current_value: Option<f64>,
    pub acquisition_date: Option<NaiveDate>,
    pub sale_date: Option<NaiveDate>,
    pub status_id: StatusId,
    pub vendor_id: Option<VendorId>,
}

/// Partial asset update. `vendor_id: Some(None)` drops the vendor link.
#[derive(Debug, Clone, Default)]
pub struct AssetUpdateDBRequest {
    pub asset_name: Option<String>,
    pub asset_group_id: Option<AssetGroupId>,
    pub serial_code: Option<String>,
    pub purchasing_cost: Option<f64>,
    pub current_value: Option<f64>,
    pub acquisition_date: Option<NaiveDate>,
    pub sale_date: Option<NaiveDate>,
    pub status_id: Option<StatusId>,
    pub vendor_id: Option<Option<VendorId>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetGroupSummary {
    pub id: AssetGroupId,
    pub asset_group_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusSummary {
    pub id: StatusId,
    pub status_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VendorSummary {
    pub id: VendorId,
    pub vendor_name: String,
    pub contact_person: String,
    pub email: String,
    pub notes: Option<String>,
}

/// An asset with its group, status and vendor resolved
#[derive(Debug, Clone)]
pub struct AssetDBResponse {
    pub id: AssetId,
    pub company_id: CompanyId,
    pub user_id: Option<UserId>,
    pub asset_name: String,
    pub serial_code: Option<String>,
    pub purchasing_cost: Option<f64>,
    pub current_value: Option<f64>,
    pub acquisition_date: Option<NaiveDate>,
    pub sale_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub asset_group: AssetGroupSummary,
    pub status: Option<StatusSummary>,
    pub vendor: Option<VendorSummary>,
}
