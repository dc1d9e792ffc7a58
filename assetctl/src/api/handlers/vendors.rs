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
            assets::AssetResponse,
            assets_of,
            pagination::{ListQuery, Paginated},
            vendors::{VendorCreate, VendorList, VendorResponse, VendorUpdate},
        },
    },
    auth::{
        identity::Caller,
        policies::{self, PathScope},
    },
    db::{
        handlers::{
            Assets, Repository, Vendors,
            assets::{AssetFilter, AssetOwner},
            vendors::VendorFilter,
        },
        models::vendors::{VendorCreateDBRequest, VendorUpdateDBRequest},
    },
    errors::{Error, Result},
    validation::{FieldErrors, NAME_LENGTH_32, optional_text, required_email, required_text},
};

pub const VENDOR_NAME_NULL: &str = "Vendor Name cannot be null";
pub const VENDOR_NAME_IN_USE: &str = "Vendor Name already exists";
pub const CONTACT_PERSON_NULL: &str = "Contact Person cannot be null";
pub const CONTACT_PERSON_LENGTH: &str = "Must have max 50 characters";
pub const NOTES_LENGTH: &str = "Must have max 300 characters";

const VENDOR: &str = "Vendor";

fn vendor_name<'a>(errors: &mut FieldErrors, value: Option<&'a str>) -> Option<&'a str> {
    required_text(errors, "vendorName", value, VENDOR_NAME_NULL, (1, 32), NAME_LENGTH_32)
}

fn contact_person<'a>(errors: &mut FieldErrors, value: Option<&'a str>) -> Option<&'a str> {
    required_text(errors, "contactPerson", value, CONTACT_PERSON_NULL, (1, 50), CONTACT_PERSON_LENGTH)
}

/// Register a vendor
#[utoipa::path(
    post,
    path = "/companies/{company_id}/vendors",
    request_body = VendorCreate,
    tag = "vendors",
    params(("company_id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Vendor is created", body = MessageResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_vendor(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    caller: Caller,
    JsonBody(request): JsonBody<VendorCreate>,
) -> Result<Json<MessageResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;

    let mut errors = FieldErrors::new();
    let name = vendor_name(&mut errors, request.vendor_name.as_deref());
    let email = required_email(&mut errors, "email", request.email.as_deref());
    let contact = contact_person(&mut errors, request.contact_person.as_deref());
    let notes = optional_text(&mut errors, "notes", request.notes.as_deref(), 300, NOTES_LENGTH);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Vendors::new(&mut conn, identity.company_id);

    if let Some(name) = name
        && repo.get_by_name(name).await?.is_some()
    {
        errors.add("vendorName", VENDOR_NAME_IN_USE);
    }
    let (Some(name), Some(email), Some(contact)) = (name, email, contact) else {
        return Err(Error::Validation { errors });
    };
    errors.into_result()?;

    let vendor = repo
        .create(&VendorCreateDBRequest {
            user_id: Some(identity.user_id),
            vendor_name: name.to_string(),
            contact_person: contact.to_string(),
            email: email.to_string(),
            notes: notes.map(str::to_owned),
        })
        .await?;
    info!(company_id = identity.company_id, vendor_id = vendor.id, "Vendor created");

    Ok(Json(MessageResponse::new("Vendor is created")))
}

/// List the company's vendors
///
/// `pagination=false` returns every match as `{vendors}`, each with the assets it supplied.
#[utoipa::path(
    get,
    path = "/companies/{company_id}/vendors",
    tag = "vendors",
    params(("company_id" = i32, Path, description = "Company ID"), ListQuery),
    responses(
        (status = 200, description = "Page of vendors: {content, page, size, totalPages, totalVendors}, or {vendors} unpaged"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_vendors(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Query(query): Query<ListQuery>,
    caller: Caller,
) -> Result<Response> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if query.paginated() {
        let filter = VendorFilter::new(query.skip(), query.size()).with_search(query.search());
        let mut repo = Vendors::new(&mut conn, identity.company_id);
        let vendors = repo.list(&filter).await?;
        let total = repo.count(&filter).await?;

        return Ok(Json(Paginated::new(vendors, &query, total).map(VendorResponse::from)).into_response());
    }

    let filter = VendorFilter::all().with_search(query.search());
    let vendors = Vendors::new(&mut conn, identity.company_id).list(&filter).await?;
    let assets = Assets::new(&mut conn, identity.company_id).owned_refs(AssetOwner::Vendor).await?;

    let vendors = vendors
        .into_iter()
        .map(|vendor| {
            let supplied = assets_of(&assets, vendor.id);
            VendorResponse::from(vendor).with_assets(supplied)
        })
        .collect();

    Ok(Json(VendorList { vendors }).into_response())
}

/// Get a vendor
#[utoipa::path(
    get,
    path = "/companies/{company_id}/vendors/{vendor_id}",
    tag = "vendors",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("vendor_id" = i32, Path, description = "Vendor ID"),
    ),
    responses(
        (status = 200, description = "Vendor", body = VendorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Vendor not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_vendor(
    State(state): State<AppState>,
    Path((company_id, vendor_id)): Path<(String, String)>,
    caller: Caller,
) -> Result<Json<VendorResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let vendor_id = entity_id(&vendor_id, VENDOR)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let vendor = Vendors::new(&mut conn, identity.company_id)
        .get_by_id(vendor_id)
        .await?
        .ok_or(Error::NotFound { resource: VENDOR })?;

    Ok(Json(VendorResponse::from(vendor)))
}

/// Page through the assets bought from a vendor
#[utoipa::path(
    get,
    path = "/companies/{company_id}/vendors/{vendor_id}/assets",
    tag = "vendors",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("vendor_id" = i32, Path, description = "Vendor ID"),
        ListQuery,
    ),
    responses(
        (status = 200, description = "Page of assets: {content, page, size, totalPages, totalAssets}"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Vendor not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_vendor_assets(
    State(state): State<AppState>,
    Path((company_id, vendor_id)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
    caller: Caller,
) -> Result<Json<Paginated<AssetResponse>>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let vendor_id = entity_id(&vendor_id, VENDOR)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Vendors::new(&mut conn, identity.company_id)
        .get_by_id(vendor_id)
        .await?
        .ok_or(Error::NotFound { resource: VENDOR })?;

    let filter = AssetFilter::new(query.skip(), query.size()).from_vendor(vendor_id);
    Ok(Json(asset_page(&mut conn, identity.company_id, filter, &query).await?))
}

/// Update a vendor
#[utoipa::path(
    patch,
    path = "/companies/{company_id}/vendors/{vendor_id}",
    request_body = VendorUpdate,
    tag = "vendors",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("vendor_id" = i32, Path, description = "Vendor ID"),
    ),
    responses(
        (status = 200, description = "Updated vendor", body = VendorResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Vendor not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_vendor(
    State(state): State<AppState>,
    Path((company_id, vendor_id)): Path<(String, String)>,
    caller: Caller,
    JsonBody(request): JsonBody<VendorUpdate>,
) -> Result<Json<VendorResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let vendor_id = entity_id(&vendor_id, VENDOR)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Vendors::new(&mut conn, identity.company_id);
    let vendor = repo.get_by_id(vendor_id).await?;

    let mut errors = FieldErrors::new();
    let name = request.vendor_name.as_deref().and_then(|name| vendor_name(&mut errors, Some(name)));
    let email = request.email.as_deref().and_then(|email| required_email(&mut errors, "email", Some(email)));
    let contact = request.contact_person.as_deref().and_then(|contact| contact_person(&mut errors, Some(contact)));
    let notes = optional_text(&mut errors, "notes", request.notes.as_deref(), 300, NOTES_LENGTH);

    let renamed = name.filter(|name| vendor.as_ref().is_none_or(|vendor| *name != vendor.vendor_name));
    if let Some(name) = renamed
        && repo.get_by_name(name).await?.is_some()
    {
        errors.add("vendorName", VENDOR_NAME_IN_USE);
    }
    errors.into_result()?;

    let vendor = vendor.ok_or(Error::NotFound { resource: VENDOR })?;

    let vendor = repo
        .update(
            vendor.id,
            &VendorUpdateDBRequest {
                vendor_name: renamed.map(str::to_owned),
                contact_person: contact.map(str::to_owned),
                email: email.map(str::to_owned),
                notes: notes.map(str::to_owned),
            },
        )
        .await?;

    Ok(Json(VendorResponse::from(vendor)))
}

/// Delete a vendor
///
/// Assets bought from the vendor are kept and lose their vendor link.
#[utoipa::path(
    delete,
    path = "/companies/{company_id}/vendors/{vendor_id}",
    tag = "vendors",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("vendor_id" = i32, Path, description = "Vendor ID"),
    ),
    responses(
        (status = 200, description = "Vendor is deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Vendor not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_vendor(
    State(state): State<AppState>,
    Path((company_id, vendor_id)): Path<(String, String)>,
    caller: Caller,
) -> Result<Json<MessageResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let vendor_id = entity_id(&vendor_id, VENDOR)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Vendors::new(&mut conn, identity.company_id).delete(vendor_id).await? {
        return Err(Error::NotFound { resource: VENDOR });
    }
    info!(company_id = identity.company_id, vendor_id, "Vendor deleted");

    Ok(Json(MessageResponse::new("Vendor is deleted")))
}
