use axum::{
    Json,
    extract::State,
};

use crate::{
    AppState,
    api::handlers::JsonBody,
    api::models::auth::{AuthRequest, AuthResponse},
    auth::{password, session},
    db::handlers::Users,
    errors::{Error, Result},
    validation::{is_email, present},
};

pub const INCORRECT_CREDENTIALS: &str = "Incorrect credentials";
pub const USER_INACTIVE: &str = "User is inactive";

fn incorrect_credentials() -> Error {
    Error::Unauthenticated {
        message: Some(INCORRECT_CREDENTIALS.to_string()),
    }
}

/// Sign in with e-mail and password
#[utoipa::path(
    post,
    path = "/auth",
    request_body = AuthRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Incorrect credentials"),
        (status = 403, description = "User is inactive"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn authenticate(State(state): State<AppState>, payload: std::result::Result<JsonBody<AuthRequest>, Error>) -> Result<Json<AuthResponse>> {
    // Anything unreadable is a failed sign-in, never a validation report
    let Ok(JsonBody(request)) = payload else {
        return Err(incorrect_credentials());
    };
    let email = present(request.email.as_deref()).filter(|e| is_email(e)).ok_or_else(incorrect_credentials)?;
    let password = request.password.filter(|p| !p.trim().is_empty()).ok_or_else(incorrect_credentials)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut conn).get_by_email(email).await?.ok_or_else(incorrect_credentials)?;

    if !password::verify_password(password, user.password_hash.clone()).await? {
        return Err(incorrect_credentials());
    }
    if user.inactive {
        return Err(Error::forbidden(USER_INACTIVE));
    }

    let token = session::issue_for_user(&mut conn, user.id, user.company_id, &state.config).await?;

    Ok(Json(AuthResponse {
        id: user.id,
        username: user.username,
        company_id: user.company_id,
        is_admin: user.is_admin,
        token,
    }))
}
