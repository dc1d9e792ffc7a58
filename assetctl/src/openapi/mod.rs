//! OpenAPI document for the `/api/1.0` surface, served at `/api/1.0/openapi.json`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Bearer credential issued by sign-in and registration.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Token returned by `POST /auth` or company registration. Send it in the \
                            `Authorization` header:\n\n```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "assetctl", description = "Multi-tenant asset management API"),
    servers(
        (url = "/api/1.0", description = "Asset management API")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::authenticate,
        api::handlers::companies::register_company,
        api::handlers::companies::get_company,
        api::handlers::companies::update_company,
        api::handlers::companies::delete_company,
        api::handlers::users::create_user,
        api::handlers::users::list_users,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::users::update_password,
        api::handlers::users::activate_user,
        api::handlers::users::delete_user,
        api::handlers::asset_groups::create_asset_group,
        api::handlers::asset_groups::list_asset_groups,
        api::handlers::asset_groups::get_asset_group,
        api::handlers::asset_groups::list_asset_group_assets,
        api::handlers::asset_groups::update_asset_group,
        api::handlers::asset_groups::delete_asset_group,
        api::handlers::assets::create_asset,
        api::handlers::assets::list_assets,
        api::handlers::assets::get_asset,
        api::handlers::assets::update_asset,
        api::handlers::assets::delete_asset,
        api::handlers::vendors::create_vendor,
        api::handlers::vendors::list_vendors,
        api::handlers::vendors::get_vendor,
        api::handlers::vendors::list_vendor_assets,
        api::handlers::vendors::update_vendor,
        api::handlers::vendors::delete_vendor,
        api::handlers::statuses::list_statuses,
        api::handlers::statuses::create_status,
        api::handlers::statuses::get_status,
        api::handlers::statuses::list_status_assets,
    ),
    components(
        schemas(
            api::models::MessageResponse,
            api::models::AssetRef,
            api::models::auth::AuthRequest,
            api::models::auth::AuthResponse,
            api::models::companies::CompanyCreate,
            api::models::companies::CompanyCreateResponse,
            api::models::companies::CompanyUpdate,
            api::models::companies::CompanyUpdateResponse,
            api::models::companies::CompanyResponse,
            api::models::companies::UserRef,
            api::models::companies::AssetGroupRef,
            api::models::companies::VendorRef,
            api::models::users::UserCreate,
            api::models::users::UserUpdate,
            api::models::users::PasswordUpdate,
            api::models::users::UserCreateResponse,
            api::models::users::UserListItem,
            api::models::users::UserResponse,
            api::models::users::UserActivationResponse,
            api::models::asset_groups::AssetGroupCreate,
            api::models::asset_groups::AssetGroupUpdate,
            api::models::asset_groups::AssetGroupResponse,
            api::models::asset_groups::AssetGroupList,
            api::models::asset_groups::AssetGroupUpdateResponse,
            api::models::assets::AssetCreate,
            api::models::assets::AssetUpdate,
            api::models::assets::AssetResponse,
            api::models::assets::AssetGroupInfo,
            api::models::assets::StatusInfo,
            api::models::assets::VendorInfo,
            api::models::vendors::VendorCreate,
            api::models::vendors::VendorUpdate,
            api::models::vendors::VendorResponse,
            api::models::vendors::VendorList,
            api::models::statuses::StatusCreate,
            api::models::statuses::StatusResponse,
            api::models::statuses::StatusList,
        )
    ),
    tags(
        (name = "auth", description = "Sign-in"),
        (name = "companies", description = "Company registration and administration"),
        (name = "users", description = "Users of a company"),
        (name = "asset-groups", description = "Groups that assets are filed under"),
        (name = "assets", description = "Company assets"),
        (name = "vendors", description = "Vendors assets are bought from"),
        (name = "asset-status", description = "Asset lifecycle statuses"),
    )
)]
pub struct ApiDoc;
