//! API request/response models for vendors.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::{AssetRef, lenient_text, pagination::Counted},
    db::models::vendors::VendorDBResponse,
    types::{CompanyId, UserId, VendorId},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorCreate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub vendor_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub contact_person: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorUpdate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub vendor_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub contact_person: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorResponse {
    pub id: VendorId,
    pub vendor_name: String,
    pub contact_person: String,
    pub email: String,
    pub notes: Option<String>,
    pub company_id: CompanyId,
    pub user_id: Option<UserId>,
    /// Assets supplied by this vendor (unpaged listing only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<AssetRef>>,
}

impl Counted for VendorResponse {
    const TOTAL_FIELD: &'static str = "totalVendors";
}

impl From<VendorDBResponse> for VendorResponse {
    fn from(db: VendorDBResponse) -> Self {
        Self {
            id: db.id,
            vendor_name: db.vendor_name,
            contact_person: db.contact_person,
            email: db.email,
            notes: db.notes,
            company_id: db.company_id,
            user_id: db.user_id,
            assets: None,
        }
    }
}

impl VendorResponse {
    pub fn with_assets(mut self, assets: Vec<AssetRef>) -> Self {
        self.assets = Some(assets);
        self
    }
}

/// Unpaged listing, `?pagination=false`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VendorList {
    pub vendors: Vec<VendorResponse>,
}
