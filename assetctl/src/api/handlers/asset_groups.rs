use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::{
    AppState,
    api::{
        handlers::{assets::asset_page, JsonBody, entity_id},
        models::{
            MessageResponse,
            asset_groups::{AssetGroupCreate, AssetGroupList, AssetGroupResponse, AssetGroupUpdate, AssetGroupUpdateResponse},
            assets::AssetResponse,
            assets_of,
            pagination::{ListQuery, Paginated},
        },
    },
    auth::{
        identity::Caller,
        policies::{self, PathScope},
    },
    db::{
        handlers::{
            AssetGroups, Assets, Repository,
            asset_groups::AssetGroupFilter,
            assets::{AssetFilter, AssetOwner},
        },
        models::asset_groups::{AssetGroupCreateDBRequest, AssetGroupUpdateDBRequest},
        seeds::DEFAULT_ASSET_GROUP,
    },
    errors::{Error, Result},
    validation::{FieldErrors, NAME_LENGTH_32, required_text},
};

pub const ASSET_GROUP_NAME_NULL: &str = "Asset Group Name cannot be null";
pub const ASSET_GROUP_NAME_IN_USE: &str = "Asset Group Name in use";
pub const DEFAULT_GROUP_UNDELETABLE: &str = "miscellaneous category cannot be deleted";
pub const DEFAULT_GROUP_UNRENAMEABLE: &str = "miscellaneous category's asset group name cannot be updated";

const ASSET_GROUP: &str = "Asset Group";

/// Create an asset group
#[utoipa::path(
    post,
    path = "/companies/{company_id}/asset-groups",
    request_body = AssetGroupCreate,
    tag = "asset-groups",
    params(("company_id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Asset Group is created", body = MessageResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_asset_group(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    caller: Caller,
    JsonBody(request): JsonBody<AssetGroupCreate>,
) -> Result<Json<MessageResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;

    let mut errors = FieldErrors::new();
    let name = required_text(
        &mut errors,
        "assetGroupName",
        request.asset_group_name.as_deref(),
        ASSET_GROUP_NAME_NULL,
        (1, 32),
        NAME_LENGTH_32,
    );

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = AssetGroups::new(&mut conn, identity.company_id);

    if let Some(name) = name
        && repo.get_by_name(name).await?.is_some()
    {
        errors.add("assetGroupName", ASSET_GROUP_NAME_IN_USE);
    }
    let Some(name) = name else {
        return Err(Error::Validation { errors });
    };
    errors.into_result()?;

    let group = repo
        .create(&AssetGroupCreateDBRequest {
            user_id: Some(identity.user_id),
            asset_group_name: name.to_string(),
        })
        .await?;
    info!(company_id = identity.company_id, asset_group_id = group.id, "Asset group created");

    Ok(Json(MessageResponse::new("Asset Group is created")))
}

/// List the company's asset groups with their assets
///
/// `pagination=false` returns every match as `{assetGroups}`.
#[utoipa::path(
    get,
    path = "/companies/{company_id}/asset-groups",
    tag = "asset-groups",
    params(("company_id" = i32, Path, description = "Company ID"), ListQuery),
    responses(
        (status = 200, description = "Page of asset groups: {content, page, size, totalPages, totalAssetGroups}, or {assetGroups} unpaged"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_asset_groups(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Query(query): Query<ListQuery>,
    caller: Caller,
) -> Result<Response> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;

    let filter = if query.paginated() {
        AssetGroupFilter::new(query.skip(), query.size())
    } else {
        AssetGroupFilter::all()
    }
    .with_search(query.search());

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = AssetGroups::new(&mut conn, identity.company_id);
    let groups = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    let assets = Assets::new(&mut conn, identity.company_id).owned_refs(AssetOwner::Group).await?;

    let groups: Vec<AssetGroupResponse> = groups
        .into_iter()
        .map(|group| {
            let group_assets = assets_of(&assets, group.id);
            AssetGroupResponse::new(group, group_assets)
        })
        .collect();

    if query.paginated() {
        Ok(Json(Paginated::new(groups, &query, total)).into_response())
    } else {
        Ok(Json(AssetGroupList { asset_groups: groups }).into_response())
    }
}

/// Get an asset group with its assets
#[utoipa::path(
    get,
    path = "/companies/{company_id}/asset-groups/{asset_group_id}",
    tag = "asset-groups",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("asset_group_id" = i32, Path, description = "Asset group ID"),
    ),
    responses(
        (status = 200, description = "Asset group", body = AssetGroupResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Asset Group not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_asset_group(
    State(state): State<AppState>,
    Path((company_id, group_id)): Path<(String, String)>,
    caller: Caller,
) -> Result<Json<AssetGroupResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let group_id = entity_id(&group_id, ASSET_GROUP)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let group = AssetGroups::new(&mut conn, identity.company_id)
        .get_by_id(group_id)
        .await?
        .ok_or(Error::NotFound { resource: ASSET_GROUP })?;
    let assets = Assets::new(&mut conn, identity.company_id).owned_refs(AssetOwner::Group).await?;

    let group_assets = assets_of(&assets, group.id);
    Ok(Json(AssetGroupResponse::new(group, group_assets)))
}

/// Page through the assets filed under a group
#[utoipa::path(
    get,
    path = "/companies/{company_id}/asset-groups/{asset_group_id}/assets",
    tag = "asset-groups",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("asset_group_id" = i32, Path, description = "Asset group ID"),
        ListQuery,
    ),
    responses(
        (status = 200, description = "Page of assets: {content, page, size, totalPages, totalAssets}"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Asset Group not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_asset_group_assets(
    State(state): State<AppState>,
    Path((company_id, group_id)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
    caller: Caller,
) -> Result<Json<Paginated<AssetResponse>>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let group_id = entity_id(&group_id, ASSET_GROUP)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    AssetGroups::new(&mut conn, identity.company_id)
        .get_by_id(group_id)
        .await?
        .ok_or(Error::NotFound { resource: ASSET_GROUP })?;

    let filter = AssetFilter::new(query.skip(), query.size()).in_group(group_id);
    Ok(Json(asset_page(&mut conn, identity.company_id, filter, &query).await?))
}

/// Rename an asset group
#[utoipa::path(
    patch,
    path = "/companies/{company_id}/asset-groups/{asset_group_id}",
    request_body = AssetGroupUpdate,
    tag = "asset-groups",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("asset_group_id" = i32, Path, description = "Asset group ID"),
    ),
    responses(
        (status = 200, description = "Updated asset group", body = AssetGroupUpdateResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "The default group cannot be renamed"),
        (status = 404, description = "Asset Group not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_asset_group(
    State(state): State<AppState>,
    Path((company_id, group_id)): Path<(String, String)>,
    caller: Caller,
    JsonBody(request): JsonBody<AssetGroupUpdate>,
) -> Result<Json<AssetGroupUpdateResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let group_id = entity_id(&group_id, ASSET_GROUP)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = AssetGroups::new(&mut conn, identity.company_id);
    let group = repo.get_by_id(group_id).await?;

    let mut errors = FieldErrors::new();
    let name = match request.asset_group_name.as_deref() {
        Some(name) => required_text(&mut errors, "assetGroupName", Some(name), ASSET_GROUP_NAME_NULL, (1, 32), NAME_LENGTH_32),
        None => None,
    };
    let renamed = name.filter(|name| group.as_ref().is_none_or(|group| *name != group.asset_group_name));

    if let Some(name) = renamed
        && repo.get_by_name(name).await?.is_some()
    {
        errors.add("assetGroupName", ASSET_GROUP_NAME_IN_USE);
    }
    errors.into_result()?;

    let group = group.ok_or(Error::NotFound { resource: ASSET_GROUP })?;

    if renamed.is_some() && group.asset_group_name == DEFAULT_ASSET_GROUP {
        return Err(Error::forbidden(DEFAULT_GROUP_UNRENAMEABLE));
    }

    let group = repo
        .update(
            group.id,
            &AssetGroupUpdateDBRequest {
                asset_group_name: renamed.map(str::to_owned),
            },
        )
        .await?;

    Ok(Json(AssetGroupUpdateResponse::from(group)))
}

/// Delete an asset group
///
/// Its assets move to the company's default group first. The default group itself cannot be
/// deleted.
#[utoipa::path(
    delete,
    path = "/companies/{company_id}/asset-groups/{asset_group_id}",
    tag = "asset-groups",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("asset_group_id" = i32, Path, description = "Asset group ID"),
    ),
    responses(
        (status = 200, description = "Asset Group is deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "The default group cannot be deleted"),
        (status = 404, description = "Asset Group not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_asset_group(
    State(state): State<AppState>,
    Path((company_id, group_id)): Path<(String, String)>,
    caller: Caller,
) -> Result<Json<MessageResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let group_id = entity_id(&group_id, ASSET_GROUP)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = AssetGroups::new(&mut tx, identity.company_id);

    let group = repo.get_by_id(group_id).await?.ok_or(Error::NotFound { resource: ASSET_GROUP })?;
    if group.asset_group_name == DEFAULT_ASSET_GROUP {
        return Err(Error::forbidden(DEFAULT_GROUP_UNDELETABLE));
    }

    let fallback = repo.get_by_name(DEFAULT_ASSET_GROUP).await?.ok_or_else(|| Error::Internal {
        operation: format!("find the default asset group of company {}", identity.company_id),
    })?;
    let moved = repo.reassign_assets(group.id, fallback.id).await?;
    repo.delete(group.id).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    info!(company_id = identity.company_id, asset_group_id = group.id, moved, "Asset group deleted");

    Ok(Json(MessageResponse::new("Asset Group is deleted")))
}
