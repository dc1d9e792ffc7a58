//! API request/response models for signing in.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::lenient_text,
    types::{CompanyId, UserId},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AuthRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: UserId,
    pub username: String,
    pub company_id: CompanyId,
    pub is_admin: bool,
    pub token: String,
}
