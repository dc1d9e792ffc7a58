use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::info;

use crate::{
    AppState,
    api::{
        handlers::{auth::USER_INACTIVE, JsonBody, entity_id},
        models::{
            MessageResponse,
            pagination::{ListQuery, Paginated},
            users::{PasswordUpdate, UserActivationResponse, UserCreate, UserCreateResponse, UserListItem, UserResponse, UserUpdate},
        },
    },
    auth::{
        identity::Caller,
        password::{self, Argon2Params},
        policies::{self, PathScope},
        session,
    },
    db::{
        handlers::{Admins, Companies, users::UserFilter, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    validation::{
        EMAIL_IN_USE, FULL_NAME_LENGTH, FieldErrors, PASSWORD_NULL, USERNAME_IN_USE, USERNAME_LENGTH, USERNAME_NULL, char_len, optional_text,
        password_failure, present, required_email, required_password, required_text,
    },
};

pub const PASSWORD_INCORRECT: &str = "Password is incorrect";
pub const PASSWORD_UNCHANGED: &str = "New password must be different than the previous one";
pub const USER_ALREADY_ACTIVE: &str = "User is already active";

const USER: &str = "User";

/// Create a user in the company
#[utoipa::path(
    post,
    path = "/companies/{company_id}/users",
    request_body = UserCreate,
    tag = "users",
    params(("company_id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "User is created", body = UserCreateResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    caller: Caller,
    JsonBody(request): JsonBody<UserCreate>,
) -> Result<Json<UserCreateResponse>> {
    let identity = caller.authorize(policies::company_admin(), &PathScope::company(&company_id))?;
    let company_id = identity.company_id;

    let mut errors = FieldErrors::new();
    let username = required_text(&mut errors, "username", request.username.as_deref(), USERNAME_NULL, (4, 32), USERNAME_LENGTH);
    let email = required_email(&mut errors, "email", request.email.as_deref());
    let password = required_password(&mut errors, "password", request.password.as_deref());
    let full_name = optional_text(&mut errors, "fullName", request.full_name.as_deref(), 70, FULL_NAME_LENGTH);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    {
        let mut users = Users::new(&mut tx);
        if let Some(username) = username
            && users.username_taken(company_id, username, None).await?
        {
            errors.add("username", USERNAME_IN_USE);
        }
        if let Some(email) = email
            && users.email_taken(email, None).await?
        {
            errors.add("email", EMAIL_IN_USE);
        }
    }

    let (Some(username), Some(email), Some(password)) = (username, email, password) else {
        return Err(Error::Validation { errors });
    };
    errors.into_result()?;

    let password_hash = password::hash_password(password.to_string(), Argon2Params::from(&state.config.auth.password)).await?;

    let user = Users::new(&mut tx)
        .create(&UserCreateDBRequest {
            company_id,
            username: username.to_string(),
            email: email.to_string(),
            full_name: full_name.map(str::to_owned),
            password_hash,
        })
        .await?;
    let token = session::issue_for_user(&mut tx, user.id, company_id, &state.config).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    info!(company_id, user_id = user.id, "User created");

    Ok(Json(UserCreateResponse {
        token,
        message: "User is created".to_string(),
    }))
}

/// List the company's users
///
/// Admins also see inactive users, listed after the active ones.
#[utoipa::path(
    get,
    path = "/companies/{company_id}/users",
    tag = "users",
    params(("company_id" = i32, Path, description = "Company ID"), ListQuery),
    responses(
        (status = 200, description = "Page of users: {content, page, size, totalUser, totalPages}"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Query(query): Query<ListQuery>,
    caller: Caller,
) -> Result<Json<Paginated<UserListItem>>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::company(&company_id))?;

    let filter = UserFilter::new(query.skip(), query.size())
        .with_search(query.search())
        .include_inactive(identity.is_admin);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);
    let users = repo.list(identity.company_id, &filter).await?;
    let total = repo.count(identity.company_id, &filter).await?;

    Ok(Json(Paginated::new(users, &query, total).map(UserListItem::from)))
}

/// Get a user of the company
#[utoipa::path(
    get,
    path = "/companies/{company_id}/users/{user_id}",
    tag = "users",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    Path((company_id, user_id)): Path<(String, String)>,
    caller: Caller,
) -> Result<Json<UserResponse>> {
    let identity = caller.authorize(policies::same_company(), &PathScope::user(&company_id, &user_id))?;
    let user_id = entity_id(&user_id, USER)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_in_company(identity.company_id, user_id)
        .await?
        .ok_or(Error::NotFound { resource: USER })?;

    Ok(Json(UserResponse::from(user)))
}

/// Update a user's profile
///
/// Users may edit themselves; admins may edit anyone in the company. A non-admin cannot edit an
/// inactive account.
#[utoipa::path(
    patch,
    path = "/companies/{company_id}/users/{user_id}",
    request_body = UserUpdate,
    tag = "users",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not this user or an admin, or the user is inactive"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    Path((company_id, user_id)): Path<(String, String)>,
    caller: Caller,
    JsonBody(request): JsonBody<UserUpdate>,
) -> Result<Json<UserResponse>> {
    let identity = caller.authorize(policies::self_or_admin(), &PathScope::user(&company_id, &user_id))?;
    let user_id = entity_id(&user_id, USER)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let target = Users::new(&mut tx).get_in_company(identity.company_id, user_id).await?;

    let mut errors = FieldErrors::new();
    let email = match request.email.as_deref() {
        Some(email) => required_email(&mut errors, "email", Some(email)),
        None => None,
    };
    let username = match request.username.as_deref() {
        Some(username) => required_text(&mut errors, "username", Some(username), USERNAME_NULL, (4, 32), USERNAME_LENGTH),
        None => None,
    };
    let full_name = request.full_name.as_deref().map(str::trim).and_then(|name| {
        if char_len(name) > 70 {
            errors.add("fullName", FULL_NAME_LENGTH);
            None
        } else {
            // An empty name clears it
            Some((!name.is_empty()).then(|| name.to_owned()))
        }
    });
    let password = match request.password.as_deref() {
        Some(password) => required_password(&mut errors, "password", Some(password)),
        None => None,
    };

    {
        let mut users = Users::new(&mut tx);
        if let Some(email) = email
            && users.email_taken(email, Some(user_id)).await?
        {
            errors.add("email", EMAIL_IN_USE);
        }
        if let (Some(username), Some(target)) = (username, target.as_ref())
            && username != target.username
            && users.username_taken(identity.company_id, username, Some(user_id)).await?
        {
            errors.add("username", USERNAME_IN_USE);
        }
    }
    errors.into_result()?;

    let target = target.ok_or(Error::NotFound { resource: USER })?;
    if !identity.is_admin && target.inactive {
        return Err(Error::forbidden(USER_INACTIVE));
    }

    let password_hash = match password {
        Some(password) => Some(password::hash_password(password.to_string(), Argon2Params::from(&state.config.auth.password)).await?),
        None => None,
    };

    let user = Users::new(&mut tx)
        .update(
            target.id,
            &UserUpdateDBRequest {
                username: username.map(str::to_owned),
                email: email.map(str::to_owned),
                full_name,
                password_hash,
            },
        )
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(UserResponse::from(user)))
}

/// Change a user's password
#[utoipa::path(
    patch,
    path = "/companies/{company_id}/users/{user_id}/password",
    request_body = PasswordUpdate,
    tag = "users",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Password is changed successfully", body = MessageResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not this user or an admin, or the user is inactive"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_password(
    State(state): State<AppState>,
    Path((company_id, user_id)): Path<(String, String)>,
    caller: Caller,
    JsonBody(request): JsonBody<PasswordUpdate>,
) -> Result<Json<MessageResponse>> {
    let identity = caller.authorize(policies::self_or_admin(), &PathScope::user(&company_id, &user_id))?;
    let user_id = entity_id(&user_id, USER)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let target = Users::new(&mut tx).get_in_company(identity.company_id, user_id).await?;

    let mut errors = FieldErrors::new();
    match (present(request.old_password.as_deref()), target.as_ref()) {
        (None, _) => errors.add("oldPassword", PASSWORD_NULL),
        (Some(old), Some(target)) => {
            if !password::verify_password(old.to_string(), target.password_hash.clone()).await? {
                errors.add("oldPassword", PASSWORD_INCORRECT);
            }
        }
        (Some(_), None) => {}
    }

    let new_password = present(request.new_password.as_deref());
    match (password_failure(new_password), new_password, target.as_ref()) {
        (Some(message), _, _) => errors.add("newPassword", message),
        (None, Some(new), Some(target)) => {
            if password::verify_password(new.to_string(), target.password_hash.clone()).await? {
                errors.add("newPassword", PASSWORD_UNCHANGED);
            }
        }
        _ => {}
    }
    errors.into_result()?;

    let target = target.ok_or(Error::NotFound { resource: USER })?;
    if target.inactive {
        return Err(Error::forbidden(USER_INACTIVE));
    }
    let Some(new_password) = new_password else {
        return Err(Error::Validation {
            errors: FieldErrors::from(("newPassword", PASSWORD_NULL)),
        });
    };

    let password_hash = password::hash_password(new_password.to_string(), Argon2Params::from(&state.config.auth.password)).await?;
    Users::new(&mut tx)
        .update(
            target.id,
            &UserUpdateDBRequest {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    info!(user_id = target.id, "Password changed");

    Ok(Json(MessageResponse::new("Password is changed successfully")))
}

/// Reactivate a user that was deleted
#[utoipa::path(
    patch,
    path = "/companies/{company_id}/users/{user_id}/activate",
    tag = "users",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Reactivated user", body = UserActivationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not an admin, or the user is already active"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn activate_user(
    State(state): State<AppState>,
    Path((company_id, user_id)): Path<(String, String)>,
    caller: Caller,
) -> Result<Json<UserActivationResponse>> {
    let identity = caller.authorize(policies::company_admin(), &PathScope::user(&company_id, &user_id))?;
    let user_id = entity_id(&user_id, USER)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let target = repo
        .get_in_company(identity.company_id, user_id)
        .await?
        .ok_or(Error::NotFound { resource: USER })?;
    if !target.inactive {
        return Err(Error::forbidden(USER_ALREADY_ACTIVE));
    }

    let user = repo.set_inactive(target.id, false).await?;
    info!(user_id = user.id, "User reactivated");

    Ok(Json(UserActivationResponse::from(user)))
}

/// Delete a user
///
/// Deleting the company's system admin deletes the whole company. Anyone else is deactivated and
/// can be brought back with `activate`.
#[utoipa::path(
    delete,
    path = "/companies/{company_id}/users/{user_id}",
    tag = "users",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User is deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not an admin, or the user is already inactive"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path((company_id, user_id)): Path<(String, String)>,
    caller: Caller,
) -> Result<Json<MessageResponse>> {
    let identity = caller.authorize(policies::company_admin(), &PathScope::user(&company_id, &user_id))?;
    let user_id = entity_id(&user_id, USER)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let target = Users::new(&mut tx)
        .get_in_company(identity.company_id, user_id)
        .await?
        .ok_or(Error::NotFound { resource: USER })?;

    if Admins::new(&mut tx).is_admin_of(target.id, identity.company_id).await? {
        Companies::new(&mut tx).delete(identity.company_id).await?;
        info!(company_id = identity.company_id, "System admin deleted, company removed");
    } else if target.inactive {
        return Err(Error::forbidden(USER_INACTIVE));
    } else {
        Users::new(&mut tx).set_inactive(target.id, true).await?;
        info!(user_id = target.id, "User deactivated");
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse::new("User is deleted")))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_user(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;

        let response = server
            .post(&company.path("/users"))
            .add_header("authorization", bearer(&company.admin_token))
            .json(&json!({
                "username": "worker",
                "email": "worker@example.com",
                "password": TEST_PASSWORD,
                "fullName": "",
            }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "User is created");
        assert!(body["token"].is_string());

        let response = server
            .get(&company.path("/users"))
            .add_query_param("search", "WORK")
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        let body: Value = response.json();
        assert_eq!(body["totalUser"], 1);
        assert_eq!(body["content"][0]["username"], "worker");
        assert_eq!(body["content"][0]["fullName"], Value::Null);
        assert_eq!(body["content"][0]["isAdmin"], false);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_user_duplicates(pool: PgPool) {
        let server = create_test_app(pool).await;
        let acme = register_company(&server, "acme").await;
        let globex = register_company(&server, "globex").await;
        create_user(&server, &acme, "worker").await;

        // Username is unique per company, e-mail globally
        let response = server
            .post(&acme.path("/users"))
            .add_header("authorization", bearer(&acme.admin_token))
            .json(&json!({ "username": "worker", "email": "globex@example.com", "password": TEST_PASSWORD }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["validationErrors"]["username"], "Username in use");
        assert_eq!(body["validationErrors"]["email"], "E-mail in use");

        let response = server
            .post(&globex.path("/users"))
            .add_header("authorization", bearer(&globex.admin_token))
            .json(&json!({ "username": "worker", "email": "worker2@example.com", "password": TEST_PASSWORD }))
            .await;
        response.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_user_requires_admin(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        let user = create_user(&server, &company, "worker").await;

        let response = server
            .post(&company.path("/users"))
            .add_header("authorization", bearer(&user.token))
            .json(&json!({ "username": "another", "email": "another@example.com", "password": TEST_PASSWORD }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert_message(&response.json(), "You are not allowed to perform this operation");

        let response = server
            .post(&company.path("/users"))
            .json(&json!({ "username": "another", "email": "another@example.com", "password": TEST_PASSWORD }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_message(&response.json(), "Unauthorized");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_pagination(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        for i in 0..21 {
            create_user(&server, &company, &format!("user{i:02}")).await;
        }

        let response = server
            .get(&company.path("/users"))
            .add_query_param("size", "1000")
            .add_query_param("page", "-2")
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["content"].as_array().unwrap().len(), 10);
        assert_eq!(body["size"], 10);
        assert_eq!(body["page"], 0);
        assert_eq!(body["totalUser"], 22);
        assert_eq!(body["totalPages"], 3);

        let response = server
            .get(&company.path("/users"))
            .add_query_param("page", "2")
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        let body: Value = response.json();
        assert_eq!(body["content"].as_array().unwrap().len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_inactive_users_hidden_from_non_admins(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        let viewer = create_user(&server, &company, "viewer").await;
        let leaver = create_user(&server, &company, "leaver").await;

        server
            .delete(&company.path(&format!("/users/{}", leaver.id)))
            .add_header("authorization", bearer(&company.admin_token))
            .await
            .assert_status_ok();

        let as_admin: Value = server
            .get(&company.path("/users"))
            .add_header("authorization", bearer(&company.admin_token))
            .await
            .json();
        assert_eq!(as_admin["totalUser"], 3);
        // inactive users come last
        assert_eq!(as_admin["content"][2]["id"], leaver.id);
        assert_eq!(as_admin["content"][2]["inactive"], true);

        let as_viewer: Value = server
            .get(&company.path("/users"))
            .add_header("authorization", bearer(&viewer.token))
            .await
            .json();
        assert_eq!(as_viewer["totalUser"], 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_user_not_found(pool: PgPool) {
        let server = create_test_app(pool).await;
        let acme = register_company(&server, "acme").await;
        let globex = register_company(&server, "globex").await;

        for path in ["/users/abc".to_string(), "/users/99999".to_string(), format!("/users/{}", globex.admin_id)] {
            let response = server
                .get(&acme.path(&path))
                .add_header("authorization", bearer(&acme.admin_token))
                .await;
            response.assert_status(StatusCode::NOT_FOUND);
            assert_message(&response.json(), "User not found");
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_user(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        let user = create_user(&server, &company, "worker").await;
        let other = create_user(&server, &company, "other").await;

        let response = server
            .patch(&company.path(&format!("/users/{}", user.id)))
            .add_header("authorization", bearer(&user.token))
            .json(&json!({ "fullName": "Work Er", "username": "worker" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["fullName"], "Work Er");
        assert_eq!(body["username"], "worker");
        assert_eq!(body["companyId"], company.id);
        assert!(body.get("password").is_none());

        // Another user's name and e-mail are taken
        let response = server
            .patch(&company.path(&format!("/users/{}", user.id)))
            .add_header("authorization", bearer(&user.token))
            .json(&json!({ "username": "other", "email": other.email }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["validationErrors"]["username"], "Username in use");
        assert_eq!(body["validationErrors"]["email"], "E-mail in use");

        // A plain user cannot edit someone else
        let response = server
            .patch(&company.path(&format!("/users/{}", other.id)))
            .add_header("authorization", bearer(&user.token))
            .json(&json!({ "fullName": "Nope" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        // Clearing the name
        let response = server
            .patch(&company.path(&format!("/users/{}", user.id)))
            .add_header("authorization", bearer(&company.admin_token))
            .json(&json!({ "fullName": "" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["fullName"], Value::Null);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_password(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        let user = create_user(&server, &company, "worker").await;
        let path = company.path(&format!("/users/{}/password", user.id));

        let response = server
            .patch(&path)
            .add_header("authorization", bearer(&user.token))
            .json(&json!({ "oldPassword": "Wrong1234", "newPassword": TEST_PASSWORD }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["validationErrors"]["oldPassword"], "Password is incorrect");
        assert_eq!(
            body["validationErrors"]["newPassword"],
            "New password must be different than the previous one"
        );

        let response = server
            .patch(&path)
            .add_header("authorization", bearer(&user.token))
            .json(&json!({ "newPassword": "short" }))
            .await;
        let body: Value = response.json();
        assert_eq!(body["validationErrors"]["oldPassword"], "Password cannot be null");
        assert_eq!(body["validationErrors"]["newPassword"], "Password must be at least 6 characters");

        let response = server
            .patch(&path)
            .add_header("authorization", bearer(&user.token))
            .json(&json!({ "oldPassword": TEST_PASSWORD, "newPassword": "N3wPassword" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["message"], "Password is changed successfully");

        server
            .post("/api/1.0/auth")
            .json(&json!({ "email": user.email, "password": "N3wPassword" }))
            .await
            .assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_soft_delete_and_reactivate(pool: PgPool) {
        let server = create_test_app(pool).await;
        let company = register_company(&server, "acme").await;
        let user = create_user(&server, &company, "worker").await;
        let user_path = company.path(&format!("/users/{}", user.id));

        // Reactivating an active user
        let response = server
            .patch(&format!("{user_path}/activate"))
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert_message(&response.json(), "User is already active");

        server
            .delete(&user_path)
            .add_header("authorization", bearer(&company.admin_token))
            .await
            .assert_status_ok();

        let fetched: Value = server
            .get(&user_path)
            .add_header("authorization", bearer(&company.admin_token))
            .await
            .json();
        assert_eq!(fetched["inactive"], true);

        // A deactivated user's token stops resolving
        server
            .get(&user_path)
            .add_header("authorization", bearer(&user.token))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .delete(&user_path)
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert_message(&response.json(), "User is inactive");

        let response = server
            .patch(&format!("{user_path}/deactivate"))
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["id"], user.id);
        assert_eq!(body["email"], user.email);

        let fetched: Value = server
            .get(&user_path)
            .add_header("authorization", bearer(&company.admin_token))
            .await
            .json();
        assert_eq!(fetched["inactive"], false);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleting_system_admin_removes_company(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let company = register_company(&server, "acme").await;
        let survivor = register_company(&server, "globex").await;
        for name in ["one1", "two2", "three"] {
            create_user(&server, &company, name).await;
        }

        let response = server
            .delete(&company.path(&format!("/users/{}", company.admin_id)))
            .add_header("authorization", bearer(&company.admin_token))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["message"], "User is deleted");

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE company_id = $1")
            .bind(company.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(users, 0);
        let companies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies").fetch_one(&pool).await.unwrap();
        assert_eq!(companies, 1);

        server
            .get(&survivor.path(""))
            .add_header("authorization", bearer(&survivor.admin_token))
            .await
            .assert_status_ok();
    }
}
