use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::info;

use crate::{
    AppState,
    api::{
        handlers::{assets::asset_page, JsonBody, entity_id},
        models::{
            MessageResponse,
            assets::AssetResponse,
            assets_of,
            pagination::{ListQuery, Paginated},
            statuses::{StatusCreate, StatusList, StatusResponse},
        },
    },
    auth::{
        identity::Caller,
        policies::{self, PathScope},
    },
    db::{
        handlers::{
            Assets, Statuses,
            assets::{AssetFilter, AssetOwner},
        },
        models::statuses::StatusCreateDBRequest,
    },
    errors::{Error, Result},
    validation::{FieldErrors, NAME_LENGTH_32, required_text},
};

pub const STATUS_NAME_NULL: &str = "Status Name cannot be null";
pub const STATUS_NAME_IN_USE: &str = "Status Name in use";

const STATUS: &str = "Status";

/// List the company's asset statuses, each with its assets
#[utoipa::path(
    get,
    path = "/companies/{company_id}/asset-status",
    tag = "asset-status",
    params(("company_id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Every status of the company", body = StatusList),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_statuses(State(state): State<AppState>, Path(company_id): Path<String>, caller: Caller) -> Result<Json<StatusList>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let statuses = Statuses::new(&mut conn, identity.company_id).list().await?;
    let assets = Assets::new(&mut conn, identity.company_id).owned_refs(AssetOwner::Status).await?;

    let asset_statuses = statuses
        .into_iter()
        .map(|status| {
            let in_status = assets_of(&assets, status.id);
            StatusResponse::from(status).with_assets(in_status)
        })
        .collect();

    Ok(Json(StatusList { asset_statuses }))
}

/// Add an asset status
#[utoipa::path(
    post,
    path = "/companies/{company_id}/asset-status",
    request_body = StatusCreate,
    tag = "asset-status",
    params(("company_id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Status is created", body = MessageResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_status(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    caller: Caller,
    JsonBody(request): JsonBody<StatusCreate>,
) -> Result<Json<MessageResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;

    let mut errors = FieldErrors::new();
    let name = required_text(&mut errors, "statusName", request.status_name.as_deref(), STATUS_NAME_NULL, (1, 32), NAME_LENGTH_32);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Statuses::new(&mut conn, identity.company_id);

    if let Some(name) = name
        && repo.get_by_name(name).await?.is_some()
    {
        errors.add("statusName", STATUS_NAME_IN_USE);
    }
    let Some(name) = name else {
        return Err(Error::Validation { errors });
    };
    errors.into_result()?;

    let status = repo
        .create(&StatusCreateDBRequest {
            user_id: Some(identity.user_id),
            status_name: name.to_string(),
        })
        .await?;
    info!(company_id = identity.company_id, status_id = status.id, "Status created");

    Ok(Json(MessageResponse::new("Status is created")))
}

/// Get an asset status
#[utoipa::path(
    get,
    path = "/companies/{company_id}/asset-status/{status_id}",
    tag = "asset-status",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("status_id" = i32, Path, description = "Status ID"),
    ),
    responses(
        (status = 200, description = "Status", body = StatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Status not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_status(
    State(state): State<AppState>,
    Path((company_id, status_id)): Path<(String, String)>,
    caller: Caller,
) -> Result<Json<StatusResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let status_id = entity_id(&status_id, STATUS)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let status = Statuses::new(&mut conn, identity.company_id)
        .get_by_id(status_id)
        .await?
        .ok_or(Error::NotFound { resource: STATUS })?;

    Ok(Json(StatusResponse::from(status)))
}

/// Page through the assets in a status
#[utoipa::path(
    get,
    path = "/companies/{company_id}/asset-status/{status_id}/assets",
    tag = "asset-status",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("status_id" = i32, Path, description = "Status ID"),
        ListQuery,
    ),
    responses(
        (status = 200, description = "Page of assets: {content, page, size, totalPages, totalAssets}"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Status not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_status_assets(
    State(state): State<AppState>,
    Path((company_id, status_id)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
    caller: Caller,
) -> Result<Json<Paginated<AssetResponse>>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let status_id = entity_id(&status_id, STATUS)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Statuses::new(&mut conn, identity.company_id)
        .get_by_id(status_id)
        .await?
        .ok_or(Error::NotFound { resource: STATUS })?;

    let filter = AssetFilter::new(query.skip(), query.size()).with_status(status_id);
    Ok(Json(asset_page(&mut conn, identity.company_id, filter, &query).await?))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_seeded_statuses(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        create_asset(&server, &company, "Laptop", json!({})).await;

        let response = server
            .get(&company.path("/asset-status"))
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        let names: Vec<&str> = body["assetStatuses"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|s| s["statusName"].as_str())
            .collect();
        assert_eq!(names, ["Disposed", "Expired", "In Repair", "In Store", "In Use"]);
        assert_eq!(body["assetStatuses"][4]["assets"][0]["assetName"], "Laptop");
        assert_eq!(body["assetStatuses"][0]["assets"], json!([]));
        assert_eq!(body["assetStatuses"][0]["companyId"], company.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_status(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        let member = create_user(&server, &company, "worker").await;

        let response = server
            .post(&company.path("/asset-status"))
            .add_header("authorization", bearer(&member.token))
            .json(&json!({ "statusName": "Lost" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["message"], "Status is created");

        for (name, message) in [
            (json!(""), "Status Name cannot be null"),
            (json!("s".repeat(33)), "Must have min 1 and max 32 characters"),
            (json!("Lost"), "Status Name in use"),
            (json!("In Use"), "Status Name in use"),
        ] {
            let response = server
                .post(&company.path("/asset-status"))
                .add_header("authorization", bearer(&member.token))
                .json(&json!({ "statusName": name }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(response.json::<Value>()["validationErrors"]["statusName"], message);
        }

        // Another company may reuse the name
        let other = register_company(&server, "globex").await;
        server
            .post(&other.path("/asset-status"))
            .add_header("authorization", bearer(&other.admin_token))
            .json(&json!({ "statusName": "Lost" }))
            .await
            .assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_status_and_its_assets(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        let other = register_company(&server, "globex").await;
        let in_store = status_id(&server, &company, "In Store").await;
        create_asset(&server, &company, "Spare", json!({ "statusCode": in_store })).await;
        create_asset(&server, &company, "Laptop", json!({})).await;

        let response = server
            .get(&company.path(&format!("/asset-status/{in_store}")))
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["statusName"], "In Store");
        assert!(body.get("assets").is_none());

        let body: Value = server
            .get(&company.path(&format!("/asset-status/{in_store}/assets")))
            .add_header("authorization", bearer(&company.admin_token))
            .await
            .json();
        assert_eq!(body["totalAssets"], 1);
        assert_eq!(body["content"][0]["assetName"], "Spare");

        let response = server
            .get(&other.path(&format!("/asset-status/{in_store}")))
            .add_header("authorization", bearer(&other.admin_token))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_message(&response.json(), "Status not found");
    }
}
