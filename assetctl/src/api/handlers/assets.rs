use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::Value;
use sqlx::PgConnection;
use tracing::info;

use crate::{
    AppState,
    api::{
        handlers::{JsonBody, entity_id},
        models::{
            MessageResponse,
            assets::{AssetCreate, AssetResponse, AssetUpdate},
            pagination::{ListQuery, Paginated},
        },
    },
    auth::{
        identity::Caller,
        policies::{self, PathScope},
    },
    db::{
        handlers::{AssetGroups, Assets, Repository, Statuses, Vendors, assets::AssetFilter},
        models::assets::{AssetCreateDBRequest, AssetUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{AssetGroupId, CompanyId, StatusId, VendorId},
    validation::{FieldErrors, NAME_LENGTH_32, as_id, is_blank, optional_date, optional_number, present, required_text},
};

pub const ASSET_NAME_NULL: &str = "Asset name cannot be null";
pub const SERIAL_CODE_IN_USE: &str = "Asset with given serial code already exists";
pub const STATUS_NULL: &str = "Status cannot be null";
pub const STATUS_MISSING: &str = "Status does not exist";
pub const VENDOR_MISSING: &str = "Vendor does not exist";
pub const ASSET_GROUP_NULL: &str = "Asset Group cannot be null";
pub const ASSET_GROUP_MISSING: &str = "Asset Group does not exist";

const ASSET: &str = "Asset";

/// One page of the company's assets matching `filter`.
pub(crate) async fn asset_page(conn: &mut PgConnection, company_id: CompanyId, filter: AssetFilter, query: &ListQuery) -> Result<Paginated<AssetResponse>> {
    let mut repo = Assets::new(conn, company_id);
    let assets = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(Paginated::new(assets, query, total).map(AssetResponse::from))
}

async fn find_status(conn: &mut PgConnection, company_id: CompanyId, value: &Value) -> Result<Option<StatusId>> {
    let Some(id) = as_id(value) else {
        return Ok(None);
    };
    Ok(Statuses::new(conn, company_id).get_by_id(id).await?.map(|s| s.id))
}

async fn find_vendor(conn: &mut PgConnection, company_id: CompanyId, value: &Value) -> Result<Option<VendorId>> {
    let Some(id) = as_id(value) else {
        return Ok(None);
    };
    Ok(Vendors::new(conn, company_id).get_by_id(id).await?.map(|v| v.id))
}

async fn find_asset_group(conn: &mut PgConnection, company_id: CompanyId, value: &Value) -> Result<Option<AssetGroupId>> {
    let Some(id) = as_id(value) else {
        return Ok(None);
    };
    Ok(AssetGroups::new(conn, company_id).get_by_id(id).await?.map(|g| g.id))
}

/// Create an asset
///
/// The asset row, its status link and its vendor link are written together.
#[utoipa::path(
    post,
    path = "/companies/{company_id}/assets",
    request_body = AssetCreate,
    tag = "assets",
    params(("company_id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Asset is created", body = MessageResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_asset(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    caller: Caller,
    JsonBody(request): JsonBody<AssetCreate>,
) -> Result<Json<MessageResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let company_id = identity.company_id;

    let mut errors = FieldErrors::new();
    let asset_name = required_text(&mut errors, "assetName", request.asset_name.as_deref(), ASSET_NAME_NULL, (1, 32), NAME_LENGTH_32);
    let serial_code = present(request.serial_code.as_deref());
    let purchasing_cost = optional_number(&mut errors, "purchasingCost", request.purchasing_cost.as_ref());
    let current_value = optional_number(&mut errors, "currentValue", request.current_value.as_ref());
    let acquisition_date = optional_date(&mut errors, "acquisitionDate", request.acquisition_date.as_deref());
    let sale_date = optional_date(&mut errors, "saleDate", request.sale_date.as_deref());

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    if let Some(serial_code) = serial_code
        && Assets::new(&mut tx, company_id).serial_code_taken(serial_code, None).await?
    {
        errors.add("serialCode", SERIAL_CODE_IN_USE);
    }

    let status_id = match request.status_code.as_ref().filter(|v| !is_blank(v)) {
        None => {
            errors.add("statusCode", STATUS_NULL);
            None
        }
        Some(value) => {
            let found = find_status(&mut tx, company_id, value).await?;
            if found.is_none() {
                errors.add("statusCode", STATUS_MISSING);
            }
            found
        }
    };

    let vendor_id = match request.vendor_id.as_ref().filter(|v| !is_blank(v)) {
        None => None,
        Some(value) => {
            let found = find_vendor(&mut tx, company_id, value).await?;
            if found.is_none() {
                errors.add("vendorId", VENDOR_MISSING);
            }
            found
        }
    };

    let asset_group_id = match request.assetgroup_id.as_ref().filter(|v| !is_blank(v)) {
        None => {
            errors.add("assetgroupId", ASSET_GROUP_NULL);
            None
        }
        Some(value) => {
            let found = find_asset_group(&mut tx, company_id, value).await?;
            if found.is_none() {
                errors.add("assetgroupId", ASSET_GROUP_MISSING);
            }
            found
        }
    };

    let (Some(asset_name), Some(status_id), Some(asset_group_id)) = (asset_name, status_id, asset_group_id) else {
        return Err(Error::Validation { errors });
    };
    errors.into_result()?;

    let asset = Assets::new(&mut tx, company_id)
        .create(&AssetCreateDBRequest {
            user_id: Some(identity.user_id),
            asset_name: asset_name.to_string(),
            asset_group_id,
            serial_code: serial_code.map(str::to_owned),
            purchasing_cost,
            current_value,
            acquisition_date,
            sale_date,
            status_id,
            vendor_id,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    info!(company_id, asset_id = asset.id, "Asset created");

    Ok(Json(MessageResponse::new("Asset is created")))
}

/// List the company's assets
#[utoipa::path(
    get,
    path = "/companies/{company_id}/assets",
    tag = "assets",
    params(("company_id" = i32, Path, description = "Company ID"), ListQuery),
    responses(
        (status = 200, description = "Page of assets: {content, page, size, totalPages, totalAssets}"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_assets(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Query(query): Query<ListQuery>,
    caller: Caller,
) -> Result<Json<Paginated<AssetResponse>>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;

    let filter = AssetFilter::new(query.skip(), query.size()).with_search(query.search());
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(asset_page(&mut conn, identity.company_id, filter, &query).await?))
}

/// Get an asset
#[utoipa::path(
    get,
    path = "/companies/{company_id}/assets/{asset_id}",
    tag = "assets",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("asset_id" = i32, Path, description = "Asset ID"),
    ),
    responses(
        (status = 200, description = "Asset", body = AssetResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Asset not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_asset(
    State(state): State<AppState>,
    Path((company_id, asset_id)): Path<(String, String)>,
    caller: Caller,
) -> Result<Json<AssetResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let asset_id = entity_id(&asset_id, ASSET)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let asset = Assets::new(&mut conn, identity.company_id)
        .get_by_id(asset_id)
        .await?
        .ok_or(Error::NotFound { resource: ASSET })?;

    Ok(Json(AssetResponse::from(asset)))
}

/// Update an asset
///
/// Absent fields keep their value. `vendorId` set to `null` or `""` detaches the vendor.
#[utoipa::path(
    patch,
    path = "/companies/{company_id}/assets/{asset_id}",
    request_body = AssetUpdate,
    tag = "assets",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("asset_id" = i32, Path, description = "Asset ID"),
    ),
    responses(
        (status = 200, description = "Updated asset", body = AssetResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Asset not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_asset(
    State(state): State<AppState>,
    Path((company_id, asset_id)): Path<(String, String)>,
    caller: Caller,
    JsonBody(request): JsonBody<AssetUpdate>,
) -> Result<Json<AssetResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let company_id = identity.company_id;
    let asset_id = entity_id(&asset_id, ASSET)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let target = Assets::new(&mut tx, company_id).get_by_id(asset_id).await?;

    let mut errors = FieldErrors::new();
    let asset_name = match request.asset_name.as_deref() {
        Some(name) => required_text(&mut errors, "assetName", Some(name), ASSET_NAME_NULL, (1, 32), NAME_LENGTH_32),
        None => None,
    };
    let serial_code = present(request.serial_code.as_deref());
    let purchasing_cost = optional_number(&mut errors, "purchasingCost", request.purchasing_cost.as_ref());
    let current_value = optional_number(&mut errors, "currentValue", request.current_value.as_ref());
    let acquisition_date = optional_date(&mut errors, "acquisitionDate", request.acquisition_date.as_deref());
    let sale_date = optional_date(&mut errors, "saleDate", request.sale_date.as_deref());

    if let (Some(serial_code), Some(target)) = (serial_code, target.as_ref())
        && target.serial_code.as_deref() != Some(serial_code)
        && Assets::new(&mut tx, company_id).serial_code_taken(serial_code, Some(target.id)).await?
    {
        errors.add("serialCode", SERIAL_CODE_IN_USE);
    }

    let status_id = match request.status_code.as_ref() {
        None => None,
        Some(value) if is_blank(value) => {
            errors.add("statusCode", STATUS_NULL);
            None
        }
        Some(value) => {
            let found = find_status(&mut tx, company_id, value).await?;
            if found.is_none() {
                errors.add("statusCode", STATUS_MISSING);
            }
            found
        }
    };

    let vendor_id = match request.vendor_id.as_ref() {
        None => None,
        Some(None) => Some(None),
        Some(Some(value)) if is_blank(value) => Some(None),
        Some(Some(value)) => {
            let found = find_vendor(&mut tx, company_id, value).await?;
            if found.is_none() {
                errors.add("vendorId", VENDOR_MISSING);
            }
            found.map(Some)
        }
    };

    let asset_group_id = match request.assetgroup_id.as_ref() {
        None => None,
        Some(value) if is_blank(value) => {
            errors.add("assetgroupId", ASSET_GROUP_NULL);
            None
        }
        Some(value) => {
            let found = find_asset_group(&mut tx, company_id, value).await?;
            if found.is_none() {
                errors.add("assetgroupId", ASSET_GROUP_MISSING);
            }
            found
        }
    };
    errors.into_result()?;

    let target = target.ok_or(Error::NotFound { resource: ASSET })?;
    let asset = Assets::new(&mut tx, company_id)
        .update(
            target.id,
            &AssetUpdateDBRequest {
                asset_name: asset_name.map(str::to_owned),
                asset_group_id,
                serial_code: serial_code.map(str::to_owned),
                purchasing_cost,
                current_value,
                acquisition_date,
                sale_date,
                status_id,
                vendor_id,
            },
        )
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(AssetResponse::from(asset)))
}

/// Delete an asset
#[utoipa::path(
    delete,
    path = "/companies/{company_id}/assets/{asset_id}",
    tag = "assets",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("asset_id" = i32, Path, description = "Asset ID"),
    ),
    responses(
        (status = 200, description = "Asset is deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Asset not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_asset(
    State(state): State<AppState>,
    Path((company_id, asset_id)): Path<(String, String)>,
    caller: Caller,
) -> Result<Json<MessageResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let asset_id = entity_id(&asset_id, ASSET)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Assets::new(&mut conn, identity.company_id).delete(asset_id).await? {
        return Err(Error::NotFound { resource: ASSET });
    }
    info!(company_id = identity.company_id, asset_id, "Asset deleted");

    Ok(Json(MessageResponse::new("Asset is deleted")))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    async fn create_vendor(server: &TestServer, company: &TestCompany, name: &str) -> i64 {
        server
            .post(&company.path("/vendors"))
            .add_header("authorization", bearer(&company.admin_token))
            .json(&json!({ "vendorName": name, "contactPerson": "Jane", "email": format!("{name}@vendor.com") }))
            .await
            .assert_status_ok();

        let listed: Value = server
            .get(&company.path("/vendors"))
            .add_query_param("search", name)
            .add_header("authorization", bearer(&company.admin_token))
            .await
            .json();
        listed["content"][0]["id"].as_i64().expect("vendor was created")
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_asset(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        let vendor = create_vendor(&server, &company, "Dell").await;

        let id = create_asset(
            &server,
            &company,
            "Laptop",
            json!({
                "serialCode": "SN-1",
                "vendorId": vendor,
                "purchasingCost": "1200.50",
                "currentValue": 900,
                "acquisitionDate": "2024-05-01",
            }),
        )
        .await;

        let response = server
            .get(&company.path(&format!("/assets/{id}")))
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["assetName"], "Laptop");
        assert_eq!(body["serialCode"], "SN-1");
        assert_eq!(body["purchasingCost"], 1200.5);
        assert_eq!(body["acquisitionDate"], "2024-05-01");
        assert_eq!(body["saleDate"], Value::Null);
        assert_eq!(body["userId"], company.admin_id);
        assert_eq!(body["assetgroup"]["assetGroupName"], "miscellaneous");
        assert_eq!(body["status"][0]["statusName"], "In Use");
        assert_eq!(body["vendor"][0]["id"], vendor);
        assert_eq!(body["vendor"][0]["vendorName"], "Dell");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_asset_validation(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        create_asset(&server, &company, "Laptop", json!({ "serialCode": "SN-1" })).await;

        let response = server
            .post(&company.path("/assets"))
            .add_header("authorization", bearer(&company.admin_token))
            .json(&json!({ "serialCode": "SN-1", "purchasingCost": "cheap", "saleDate": "someday" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        let errors = &body["validationErrors"];
        assert_eq!(errors["assetName"], "Asset name cannot be null");
        assert_eq!(errors["serialCode"], "Asset with given serial code already exists");
        assert_eq!(errors["statusCode"], "Status cannot be null");
        assert_eq!(errors["assetgroupId"], "Asset Group cannot be null");
        assert_eq!(errors["purchasingCost"], "Must be a number");
        assert_eq!(errors["saleDate"], "Date is not valid");
        assert!(errors.get("vendorId").is_none());

        let response = server
            .post(&company.path("/assets"))
            .add_header("authorization", bearer(&company.admin_token))
            .json(&json!({
                "assetName": "x".repeat(33),
                "statusCode": 99999,
                "vendorId": "99999",
                "assetgroupId": "abc",
            }))
            .await;
        let body: Value = response.json();
        let errors = &body["validationErrors"];
        assert_eq!(errors["assetName"], "Must have min 1 and max 32 characters");
        assert_eq!(errors["statusCode"], "Status does not exist");
        assert_eq!(errors["vendorId"], "Vendor does not exist");
        assert_eq!(errors["assetgroupId"], "Asset Group does not exist");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_references_are_company_scoped(pool: PgPool) {
        let server = create_test_app(pool).await;
        let acme = register_company(&server, "acme").await;
        let globex = register_company(&server, "globex").await;
        let foreign_status = status_id(&server, &globex, "In Use").await;
        let foreign_group = asset_group_id(&server, &globex, "miscellaneous").await;
        let foreign_asset = create_asset(&server, &globex, "Server", json!({})).await;

        let response = server
            .post(&acme.path("/assets"))
            .add_header("authorization", bearer(&acme.admin_token))
            .json(&json!({ "assetName": "Desk", "statusCode": foreign_status, "assetgroupId": foreign_group }))
            .await;
        let body: Value = response.json();
        assert_eq!(body["validationErrors"]["statusCode"], "Status does not exist");
        assert_eq!(body["validationErrors"]["assetgroupId"], "Asset Group does not exist");

        let response = server
            .get(&acme.path(&format!("/assets/{foreign_asset}")))
            .add_header("authorization", bearer(&acme.admin_token))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_message(&response.json(), "Asset not found");

        // Same serial code in another company is fine
        create_asset(&server, &globex, "Rack", json!({ "serialCode": "SN-9" })).await;
        create_asset(&server, &acme, "Rack", json!({ "serialCode": "SN-9" })).await;
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_asset(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        let vendor = create_vendor(&server, &company, "Dell").await;
        let id = create_asset(&server, &company, "Laptop", json!({ "serialCode": "SN-1", "vendorId": vendor })).await;
        create_asset(&server, &company, "Phone", json!({ "serialCode": "SN-2" })).await;
        let in_repair = status_id(&server, &company, "In Repair").await;
        let path = company.path(&format!("/assets/{id}"));

        // Keeping its own serial code is not a duplicate
        let response = server
            .patch(&path)
            .add_header("authorization", bearer(&company.admin_token))
            .json(&json!({ "serialCode": "SN-1", "statusCode": in_repair, "currentValue": "10" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"][0]["statusName"], "In Repair");
        assert_eq!(body["currentValue"], 10.0);
        assert_eq!(body["assetName"], "Laptop");
        assert_eq!(body["vendor"][0]["id"], vendor);

        let response = server
            .patch(&path)
            .add_header("authorization", bearer(&company.admin_token))
            .json(&json!({ "serialCode": "SN-2", "assetName": "" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["validationErrors"]["serialCode"], "Asset with given serial code already exists");
        assert_eq!(body["validationErrors"]["assetName"], "Asset name cannot be null");

        let response = server
            .patch(&path)
            .add_header("authorization", bearer(&company.admin_token))
            .json(&json!({ "vendorId": null }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["vendor"], json!([]));

        let response = server
            .patch(&company.path("/assets/99999"))
            .add_header("authorization", bearer(&company.admin_token))
            .json(&json!({ "assetName": "Ghost" }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_and_delete_assets(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        let member = create_user(&server, &company, "worker").await;
        for name in ["Laptop 1", "Laptop 2", "Monitor"] {
            create_asset(&server, &company, name, json!({})).await;
        }

        // Any member of the company may manage assets
        let response = server
            .get(&company.path("/assets"))
            .add_query_param("search", "laptop")
            .add_header("authorization", bearer(&member.token))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["totalAssets"], 2);
        assert_eq!(body["totalPages"], 1);
        let id = body["content"][0]["id"].as_i64().unwrap();

        let response = server
            .delete(&company.path(&format!("/assets/{id}")))
            .add_header("authorization", bearer(&member.token))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["message"], "Asset is deleted");

        server
            .delete(&company.path(&format!("/assets/{id}")))
            .add_header("authorization", bearer(&member.token))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let body: Value = server
            .get(&company.path("/assets"))
            .add_header("authorization", bearer(&member.token))
            .await
            .json();
        assert_eq!(body["totalAssets"], 2);
    }
}
