//! API request/response models for assets.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    api::models::{lenient_text, pagination::Counted},
    db::models::assets::{AssetDBResponse, AssetGroupSummary, StatusSummary, VendorSummary},
    types::{AssetGroupId, AssetId, CompanyId, StatusId, UserId, VendorId},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetCreate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub asset_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub serial_code: Option<String>,
    /// Id of the asset's status
    #[schema(value_type = Option<i32>)]
    pub status_code: Option<Value>,
    #[schema(value_type = Option<i32>)]
    pub vendor_id: Option<Value>,
    #[serde(rename = "assetgroupId")]
    #[schema(value_type = Option<i32>)]
    pub assetgroup_id: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub purchasing_cost: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub current_value: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub acquisition_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sale_date: Option<String>,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetUpdate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub asset_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub serial_code: Option<String>,
    #[schema(value_type = Option<i32>)]
    pub status_code: Option<Value>,
    /// `null` or `""` removes the vendor
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub vendor_id: Option<Option<Value>>,
    #[serde(rename = "assetgroupId")]
    #[schema(value_type = Option<i32>)]
    pub assetgroup_id: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub purchasing_cost: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub current_value: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub acquisition_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sale_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroupInfo {
    pub id: AssetGroupId,
    pub asset_group_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub id: StatusId,
    pub status_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorInfo {
    pub id: VendorId,
    pub vendor_name: String,
    pub contact_person: String,
    pub email: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetResponse {
    pub id: AssetId,
    pub asset_name: String,
    #[serde(rename = "assetgroupId")]
    pub assetgroup_id: AssetGroupId,
    pub company_id: CompanyId,
    pub serial_code: Option<String>,
    pub user_id: Option<UserId>,
    pub purchasing_cost: Option<f64>,
    pub current_value: Option<f64>,
    pub acquisition_date: Option<NaiveDate>,
    pub sale_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assetgroup: AssetGroupInfo,
    /// Always exactly one entry for a well-formed asset
    pub status: Vec<StatusInfo>,
    /// Empty, or the single vendor the asset came from
    pub vendor: Vec<VendorInfo>,
}

impl Counted for AssetResponse {
    const TOTAL_FIELD: &'static str = "totalAssets";
}

impl From<AssetGroupSummary> for AssetGroupInfo {
    fn from(s: AssetGroupSummary) -> Self {
        Self {
            id: s.id,
            asset_group_name: s.asset_group_name,
        }
    }
}

impl From<StatusSummary> for StatusInfo {
    fn from(s: StatusSummary) -> Self {
        Self {
            id: s.id,
            status_name: s.status_name,
        }
    }
}

impl From<VendorSummary> for VendorInfo {
    fn from(s: VendorSummary) -> Self {
        Self {
            id: s.id,
            vendor_name: s.vendor_name,
            contact_person: s.contact_person,
            email: s.email,
            notes: s.notes,
        }
    }
}

impl From<AssetDBResponse> for AssetResponse {
    fn from(db: AssetDBResponse) -> Self {
        Self {
            id: db.id,
            asset_name: db.asset_name,
            assetgroup_id: db.asset_group.id,
            company_id: db.company_id,
            serial_code: db.serial_code,
            user_id: db.user_id,
            purchasing_cost: db.purchasing_cost,
            current_value: db.current_value,
            acquisition_date: db.acquisition_date,
            sale_date: db.sale_date,
            created_at: db.created_at,
            updated_at: db.updated_at,
            assetgroup: db.asset_group.into(),
            status: db.status.into_iter().map(StatusInfo::from).collect(),
            vendor: db.vendor.into_iter().map(VendorInfo::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vendor_id_tristate() {
        let absent: AssetUpdate = serde_json::from_value(json!({})).unwrap();
        assert!(absent.vendor_id.is_none());

        let cleared: AssetUpdate = serde_json::from_value(json!({ "vendorId": null })).unwrap();
        assert_eq!(cleared.vendor_id, Some(None));

        let set: AssetUpdate = serde_json::from_value(json!({ "vendorId": 4, "assetgroupId": "2" })).unwrap();
        assert_eq!(set.vendor_id, Some(Some(json!(4))));
        assert_eq!(set.assetgroup_id, Some(json!("2")));
    }

    #[test]
    fn test_response_shape() {
        let now = Utc::now();
        let db = AssetDBResponse {
            id: 1,
            company_id: 2,
            user_id: Some(3),
            asset_name: "Laptop".to_string(),
            serial_code: None,
            purchasing_cost: Some(10.5),
            current_value: None,
            acquisition_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            sale_date: None,
            created_at: now,
            updated_at: now,
            asset_group: AssetGroupSummary {
                id: 9,
                asset_group_name: "miscellaneous".to_string(),
            },
            status: Some(StatusSummary {
                id: 4,
                status_name: "In Use".to_string(),
            }),
            vendor: None,
        };

        let json = serde_json::to_value(AssetResponse::from(db)).unwrap();
        assert_eq!(json["assetgroupId"], 9);
        assert_eq!(json["assetgroup"]["assetGroupName"], "miscellaneous");
        assert_eq!(json["status"][0]["statusName"], "In Use");
        assert_eq!(json["vendor"], json!([]));
        assert_eq!(json["acquisitionDate"], "2024-05-01");
        assert!(json.get("asset_group").is_none());
    }
}
