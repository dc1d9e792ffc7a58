//! API request/response models for asset statuses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::{AssetRef, lenient_text},
    db::models::statuses::StatusDBResponse,
    types::{CompanyId, StatusId, UserId},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCreate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub status_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub id: StatusId,
    pub status_name: String,
    pub company_id: CompanyId,
    pub user_id: Option<UserId>,
    /// Assets currently in this status (listing only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<AssetRef>>,
}

impl From<StatusDBResponse> for StatusResponse {
    fn from(db: StatusDBResponse) -> Self {
        Self {
            id: db.id,
            status_name: db.status_name,
            company_id: db.company_id,
            user_id: db.user_id,
            assets: None,
        }
    }
}

impl StatusResponse {
    pub fn with_assets(mut self, assets: Vec<AssetRef>) -> Self {
        self.assets = Some(assets);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusList {
    pub asset_statuses: Vec<StatusResponse>,
}
