use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use crate::{
    AppState,
    api::handlers::JsonBody,
    api::models::{
        AssetRef, MessageResponse,
        companies::{CompanyCreate, CompanyCreateResponse, CompanyResponse, CompanyUpdate, CompanyUpdateResponse},
    },
    auth::{
        identity::Caller,
        password::{self, Argon2Params},
        policies::{self, PathScope},
        session,
    },
    db::{
        handlers::{Admins, AssetGroups, Assets, Companies, Users, Vendors},
        models::{
            companies::{CompanyCreateDBRequest, CompanyUpdateDBRequest},
            users::UserCreateDBRequest,
        },
        seeds,
    },
    errors::{Error, Result},
    validation::{
        EMAIL_IN_USE, FULL_NAME_LENGTH, FieldErrors, USERNAME_LENGTH, USERNAME_NULL, optional_text, required_email, required_password,
        required_text,
    },
};

pub const COMPANY_NAME_NULL: &str = "Company name cannot be null";
pub const COMPANY_NAME_LENGTH: &str = "Must have min 1 and max 50 characters";

fn company_name<'a>(errors: &mut FieldErrors, value: Option<&'a str>) -> Option<&'a str> {
    required_text(errors, "companyName", value, COMPANY_NAME_NULL, (1, 50), COMPANY_NAME_LENGTH)
}

/// Register a company together with its founding admin
#[utoipa::path(
    post,
    path = "/companies",
    request_body = CompanyCreate,
    tag = "companies",
    responses(
        (status = 200, description = "Account is created", body = CompanyCreateResponse),
        (status = 400, description = "Validation failure"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register_company(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CompanyCreate>,
) -> Result<Json<CompanyCreateResponse>> {

    let mut errors = FieldErrors::new();
    let company_name = company_name(&mut errors, request.company_name.as_deref());
    let username = required_text(&mut errors, "username", request.username.as_deref(), USERNAME_NULL, (4, 32), USERNAME_LENGTH);
    let email = required_email(&mut errors, "email", request.email.as_deref());
    let password = required_password(&mut errors, "password", request.password.as_deref());
    let full_name = optional_text(&mut errors, "fullName", request.full_name.as_deref(), 70, FULL_NAME_LENGTH);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    if let Some(email) = email
        && Users::new(&mut tx).email_taken(email, None).await?
    {
        errors.add("email", EMAIL_IN_USE);
    }

    let (Some(company_name), Some(username), Some(email), Some(password)) = (company_name, username, email, password) else {
        return Err(Error::Validation { errors });
    };
    errors.into_result()?;

    let password_hash = password::hash_password(password.to_string(), Argon2Params::from(&state.config.auth.password)).await?;

    let company = Companies::new(&mut tx)
        .create(&CompanyCreateDBRequest {
            company_name: company_name.to_string(),
        })
        .await?;
    let founder = Users::new(&mut tx)
        .create(&UserCreateDBRequest {
            company_id: company.id,
            username: username.to_string(),
            email: email.to_string(),
            full_name: full_name.map(str::to_owned),
            password_hash,
        })
        .await?;
    Admins::new(&mut tx).create(founder.id, company.id).await?;
    seeds::seed_company(&mut tx, company.id, founder.id).await?;

    let token = session::issue_for_user(&mut tx, founder.id, company.id, &state.config).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    info!(company_id = company.id, user_id = founder.id, "Company registered");

    Ok(Json(CompanyCreateResponse {
        company_id: company.id,
        user_id: founder.id,
        token,
        message: "Account is created".to_string(),
    }))
}

/// Get a company with its users, assets, asset groups and vendors
#[utoipa::path(
    get,
    path = "/companies/{company_id}",
    tag = "companies",
    params(("company_id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company", body = CompanyResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_company(State(state): State<AppState>, Path(company_id): Path<String>, caller: Caller) -> Result<Json<CompanyResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;
    let company_id = identity.company_id;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let company = Companies::new(&mut conn)
        .get_by_id(company_id)
        .await?
        .ok_or(Error::NotFound { resource: "Company" })?;
    let users = Users::new(&mut conn).refs(company_id).await?;
    let assets = Assets::new(&mut conn, company_id).refs().await?;
    let asset_groups = AssetGroups::new(&mut conn, company_id).refs().await?;
    let vendors = Vendors::new(&mut conn, company_id).refs().await?;

    Ok(Json(CompanyResponse {
        id: company.id,
        company_name: company.company_name,
        created_at: company.created_at,
        updated_at: company.updated_at,
        users: users.into_iter().map(Into::into).collect(),
        assets: assets.into_iter().map(AssetRef::from).collect(),
        asset_groups: asset_groups.into_iter().map(Into::into).collect(),
        vendors: vendors.into_iter().map(Into::into).collect(),
    }))
}

/// Rename a company
#[utoipa::path(
    patch,
    path = "/companies/{company_id}",
    request_body = CompanyUpdate,
    tag = "companies",
    params(("company_id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company updated", body = CompanyUpdateResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not the company's system admin"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_company(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    caller: Caller,
    JsonBody(request): JsonBody<CompanyUpdate>,
) -> Result<Json<CompanyUpdateResponse>> {
    let identity = caller.authorize(policies::company_admin(), &PathScope::company(&company_id))?;

    let mut errors = FieldErrors::new();
    let company_name = match request.company_name.as_deref() {
        Some(name) => company_name(&mut errors, Some(name)),
        None => None,
    };
    errors.into_result()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    if !Admins::new(&mut tx).is_admin_of(identity.user_id, identity.company_id).await? {
        return Err(Error::Forbidden { message: None });
    }

    let company = Companies::new(&mut tx)
        .update(
            identity.company_id,
            &CompanyUpdateDBRequest {
                company_name: company_name.map(str::to_owned),
            },
        )
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(CompanyUpdateResponse {
        id: company.id,
        company_name: company.company_name,
        company_admin: identity.user_id,
    }))
}

/// Delete a company and everything it owns
#[utoipa::path(
    delete,
    path = "/companies/{company_id}",
    tag = "companies",
    params(("company_id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company is deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not the company's system admin"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_company(State(state): State<AppState>, Path(company_id): Path<String>, caller: Caller) -> Result<Json<MessageResponse>> {
    let identity = caller.authorize(policies::company_admin(), &PathScope::company(&company_id))?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    if !Admins::new(&mut tx).is_admin_of(identity.user_id, identity.company_id).await? {
        return Err(Error::Forbidden { message: None });
    }
    if !Companies::new(&mut tx).delete(identity.company_id).await? {
        return Err(Error::NotFound { resource: "Company" });
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    info!(company_id = identity.company_id, "Company deleted");

    Ok(Json(MessageResponse::new("Company is deleted")))
}

#[cfg(test)]
mod tests {
    use crate::db::seeds::{DEFAULT_ASSET_GROUP, DEFAULT_STATUSES};
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_registration_seeds_company(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let company = register_company(&server, "acme").await;

        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE company_id = $1 AND user_id = $2")
            .bind(company.id)
            .bind(company.admin_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(admins, 1);

        let response = server
            .get(&company.path(&format!("/users/{}", company.admin_id)))
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        response.assert_status_ok();
        let admin: Value = response.json();
        assert_eq!(admin["isAdmin"], true);
        assert_eq!(admin["inactive"], false);

        let response = server
            .get(&company.path("/asset-groups"))
            .add_query_param("pagination", "false")
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        let groups: Value = response.json();
        assert_eq!(groups["assetGroups"].as_array().unwrap().len(), 1);
        assert_eq!(groups["assetGroups"][0]["assetGroupName"], DEFAULT_ASSET_GROUP);

        let response = server
            .get(&company.path("/asset-status"))
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        let statuses: Value = response.json();
        let names: Vec<&str> = statuses["assetStatuses"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|s| s["statusName"].as_str())
            .collect();
        assert_eq!(names, DEFAULT_STATUSES);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_registration_validation(pool: PgPool) {
        let server = create_test_app(pool).await;
        register_company(&server, "acme").await;

        let response = server
            .post("/api/1.0/companies")
            .json(&json!({
                "companyName": "",
                "username": "abc",
                "email": "acme@example.com",
                "password": "alllowercase1",
                "fullName": "x".repeat(71),
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_message(&body, "Validation Failure");
        let errors = &body["validationErrors"];
        assert_eq!(errors["companyName"], "Company name cannot be null");
        assert_eq!(errors["username"], "Must have min 4 and max 32 characters");
        assert_eq!(errors["email"], "E-mail in use");
        assert_eq!(
            errors["password"],
            "Password must have at least 1 uppercase, 1 lowercase letter and 1 number"
        );
        assert_eq!(errors["fullName"], "Must have max 70 characters");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_registration_missing_fields(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.post("/api/1.0/companies").json(&json!({})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        let errors = &body["validationErrors"];
        assert_eq!(errors["companyName"], "Company name cannot be null");
        assert_eq!(errors["username"], "Username cannot be null");
        assert_eq!(errors["email"], "E-mail cannot be null");
        assert_eq!(errors["password"], "Password cannot be null");
        assert!(errors.get("fullName").is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_registration_without_body(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.post("/api/1.0/companies").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_message(&body, "Validation Failure");
        assert_eq!(body["path"], "/api/1.0/companies");
        let errors = &body["validationErrors"];
        assert_eq!(errors["companyName"], "Company name cannot be null");
        assert_eq!(errors["username"], "Username cannot be null");
        assert_eq!(errors["email"], "E-mail cannot be null");
        assert_eq!(errors["password"], "Password cannot be null");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_registration_coerces_scalar_fields(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/1.0/companies")
            .json(&json!({
                "companyName": 42,
                "username": 123,
                "email": true,
                "password": 123456,
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        let errors = &body["validationErrors"];
        assert!(errors.get("companyName").is_none());
        assert_eq!(errors["username"], "Must have min 4 and max 32 characters");
        assert_eq!(errors["email"], "E-mail is not valid");
        assert_eq!(
            errors["password"],
            "Password must have at least 1 uppercase, 1 lowercase letter and 1 number"
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_company(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        let user = create_user(&server, &company, "worker").await;
        create_asset(&server, &company, "Laptop", json!({})).await;

        let response = server
            .get(&company.path(""))
            .add_header("authorization", bearer(&user.token))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["id"], company.id);
        assert_eq!(body["companyName"], "acme Ltd");
        assert_eq!(body["users"].as_array().unwrap().len(), 2);
        assert_eq!(body["users"][0]["username"], "acmeadmin");
        assert_eq!(body["assets"][0]["assetName"], "Laptop");
        assert_eq!(body["assetGroups"][0]["assetGroupName"], "miscellaneous");
        assert_eq!(body["vendors"], json!([]));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_tenancy_guards(pool: PgPool) {
        let server = create_test_app(pool).await;
        let acme = register_company(&server, "acme").await;
        let other = register_company(&server, "globex").await;
        let user = create_user(&server, &acme, "worker").await;

        // No token
        let response = server.get(&acme.path("")).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_message(&response.json(), "Unauthorized");

        // Garbage token
        let response = server.get(&acme.path("")).add_header("authorization", "Bearer not.a.token").await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // Another company's admin: 401, never 403 or 404
        let response = server
            .patch(&acme.path(""))
            .add_header("authorization", bearer(&other.admin_token))
            .json(&json!({ "companyName": "Hijacked" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // Unparsable company id never matches
        let response = server
            .get("/api/1.0/companies/abc")
            .add_header("authorization", bearer(&acme.admin_token))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // Same company, not an admin
        let response = server
            .patch(&acme.path(""))
            .add_header("authorization", bearer(&user.token))
            .json(&json!({ "companyName": "Renamed" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert_message(&response.json(), "You are not allowed to perform this operation");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_company(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;

        let response = server
            .patch(&company.path(""))
            .add_header("authorization", bearer(&company.admin_token))
            .json(&json!({ "companyName": "Acme Holdings" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["id"], company.id);
        assert_eq!(body["companyName"], "Acme Holdings");
        assert_eq!(body["companyAdmin"], company.admin_id);

        let response = server
            .patch(&company.path(""))
            .add_header("authorization", bearer(&company.admin_token))
            .json(&json!({ "companyName": "x".repeat(51) }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["validationErrors"]["companyName"], "Must have min 1 and max 50 characters");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_company_cascades(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let company = register_company(&server, "acme").await;
        let user = create_user(&server, &company, "worker").await;
        create_asset(&server, &company, "Laptop", json!({})).await;

        // A plain user cannot tear the company down
        server
            .delete(&company.path(""))
            .add_header("authorization", bearer(&user.token))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server
            .delete(&company.path(""))
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["message"], "Company is deleted");

        for table in ["companies", "users", "admins", "assets", "asset_groups", "statuses", "assets_statuses"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(count, 0, "{table} should be empty");
        }

        // The admin's token no longer resolves
        server
            .get(&company.path(""))
            .add_header("authorization", bearer(&company.admin_token))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
