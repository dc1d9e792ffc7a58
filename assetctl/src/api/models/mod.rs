//! API request and response data models.
//!
//! Request bodies are deliberately loose: text fields are `Option<String>` read through
//! [`lenient_text`], and ids or numbers are raw JSON values, so that a missing or malformed field is reported as a field-level validation
//! error rather than a deserialization failure. Responses are fixed allowlists of camelCase fields;
//! password hashes and other internal columns never reach them.

pub mod asset_groups;
pub mod assets;
pub mod auth;
pub mod companies;
pub mod pagination;
pub mod statuses;
pub mod users;
pub mod vendors;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::db::models::{NamedRef, OwnedAssetRef};

/// Plain acknowledgement, e.g. `{"message": "Vendor is created"}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// An asset reduced to id and name, as nested in groups, statuses and vendors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    pub id: i32,
    pub asset_name: String,
}

impl From<OwnedAssetRef> for AssetRef {
    fn from(r: OwnedAssetRef) -> Self {
        Self {
            id: r.id,
            asset_name: r.asset_name,
        }
    }
}

impl From<NamedRef> for AssetRef {
    fn from(r: NamedRef) -> Self {
        Self { id: r.id, asset_name: r.name }
    }
}

/// Split owned refs into the assets belonging to `owner_id`, preserving order.
pub fn assets_of(refs: &[OwnedAssetRef], owner_id: i32) -> Vec<AssetRef> {
    refs.iter().filter(|r| r.owner_id == owner_id).cloned().map(AssetRef::from).collect()
}

/// Text field that also takes numbers, booleans and other JSON values, read as their JSON text so
/// the field's own rules judge them. `null` is absent.
pub fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}
