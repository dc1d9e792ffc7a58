//! API request/response models for companies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::{AssetRef, lenient_text},
    db::models::NamedRef,
    types::{AssetGroupId, CompanyId, UserId, VendorId},
};

/// Company registration: the company and its founding admin in one request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCreate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCreateResponse {
    pub company_id: CompanyId,
    pub user_id: UserId,
    pub token: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyUpdate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyUpdateResponse {
    pub id: CompanyId,
    pub company_name: String,
    pub company_admin: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRef {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroupRef {
    pub id: AssetGroupId,
    pub asset_group_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorRef {
    pub id: VendorId,
    pub vendor_name: String,
}

/// A company with everything it owns, reduced to ids and names.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    pub id: CompanyId,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub users: Vec<UserRef>,
    pub assets: Vec<AssetRef>,
    pub asset_groups: Vec<AssetGroupRef>,
    pub vendors: Vec<VendorRef>,
}

impl From<NamedRef> for UserRef {
    fn from(r: NamedRef) -> Self {
        Self { id: r.id, username: r.name }
    }
}

impl From<NamedRef> for AssetGroupRef {
    fn from(r: NamedRef) -> Self {
        Self {
            id: r.id,
            asset_group_name: r.name,
        }
    }
}

impl From<NamedRef> for VendorRef {
    fn from(r: NamedRef) -> Self {
        Self {
            id: r.id,
            vendor_name: r.name,
        }
    }
}
