//! API request/response models for users.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::{lenient_text, pagination::Counted},
    db::models::users::UserDBResponse,
    types::{CompanyId, UserId},
};

// User request models
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub old_password: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub new_password: Option<String>,
}

// User response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreateResponse {
    pub token: String,
    pub message: String,
}

/// A user as listed for their company
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub inactive: bool,
    pub is_admin: bool,
}

impl Counted for UserListItem {
    const TOTAL_FIELD: &'static str = "totalUser";
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub company_id: CompanyId,
    pub inactive: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserActivationResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub company_id: CompanyId,
}

impl From<UserDBResponse> for UserListItem {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            full_name: db.full_name,
            inactive: db.inactive,
            is_admin: db.is_admin,
        }
    }
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            full_name: db.full_name,
            company_id: db.company_id,
            inactive: db.inactive,
            is_admin: db.is_admin,
        }
    }
}

impl From<UserDBResponse> for UserActivationResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            company_id: db.company_id,
        }
    }
}
