//! Database record models.
//!
//! Each module holds the request structs a repository accepts and the response structs it returns.
//! They are kept apart from the API models in [`crate::api::models`], which decide what actually
//! reaches the wire.

pub mod asset_groups;
pub mod assets;
pub mod companies;
pub mod statuses;
pub mod users;
pub mod vendors;

use sqlx::FromRow;

/// An asset reduced to its name, tagged with the row it hangs off (group, status, vendor).
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OwnedAssetRef {
    pub owner_id: i32,
    pub id: i32,
    pub asset_name: String,
}

/// Id and display name of any company-owned row.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct NamedRef {
    pub id: i32,
    pub name: String,
}
