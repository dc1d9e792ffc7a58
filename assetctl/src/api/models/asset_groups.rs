//! API request/response models for asset groups.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::{AssetRef, lenient_text, pagination::Counted},
    db::models::asset_groups::AssetGroupDBResponse,
    types::{AssetGroupId, CompanyId, UserId},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroupCreate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub asset_group_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroupUpdate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub asset_group_name: Option<String>,
}

/// An asset group with the assets filed under it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroupResponse {
    pub id: AssetGroupId,
    pub asset_group_name: String,
    pub company_id: CompanyId,
    pub user_id: Option<UserId>,
    pub assets: Vec<AssetRef>,
}

impl Counted for AssetGroupResponse {
    const TOTAL_FIELD: &'static str = "totalAssetGroups";
}

impl AssetGroupResponse {
    pub fn new(db: AssetGroupDBResponse, assets: Vec<AssetRef>) -> Self {
        Self {
            id: db.id,
            asset_group_name: db.asset_group_name,
            company_id: db.company_id,
            user_id: db.user_id,
            assets,
        }
    }
}

/// Unpaged listing, `?pagination=false`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroupList {
    pub asset_groups: Vec<AssetGroupResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroupUpdateResponse {
    pub id: AssetGroupId,
    pub asset_group_name: String,
    pub company_id: CompanyId,
    pub user_id: Option<UserId>,
}

impl From<AssetGroupDBResponse> for AssetGroupUpdateResponse {
    fn from(db: AssetGroupDBResponse) -> Self {
        Self {
            id: db.id,
            asset_group_name: db.asset_group_name,
            company_id: db.company_id,
            user_id: db.user_id,
        }
    }
}
