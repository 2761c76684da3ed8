//! User management endpoints. All of them require a bearer access token.
//!
//! - GET `/` - List users
//! - GET `/{id}` - Fetch one user
//! - DELETE `/{id}` - Delete a user
//! - PUT `/` - Insert a user
//! - PATCH `/` - Update a user's identity fields and admin flag

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::{error, info};

use super::ApiState;
use super::error::{ApiError, ResultExt, parse_user_id};
use crate::auth::{BearerAuth, password::hash_password_async, require_bearer, with_deadline};
use crate::db::{NewUser, UserUpdate};

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(all_users).put(insert_user).patch(update_user))
        .route("/{id}", get(get_user).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer::<ApiState>,
        ))
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct InsertUserRequest {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    #[serde(default)]
    is_admin: bool,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

async fn all_users(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let users = with_deadline(state.store_timeout, state.users.all())
        .await
        .db_err("Failed to list users")?;

    Ok(Json(users))
}

async fn get_user(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_user_id(&id)?;

    let user = with_deadline(state.store_timeout, state.users.get_by_id(id))
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::bad_request("unknown user"))?;

    Ok(Json(user))
}

async fn insert_user(
    State(state): State<ApiState>,
    payload: Result<Json<InsertUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;

    if request.email.trim().is_empty() {
        return Err(ApiError::bad_request("Email cannot be empty"));
    }
    if request.password.is_empty() {
        return Err(ApiError::bad_request("Password cannot be empty"));
    }

    let password_hash = hash_password_async(request.password).await.map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to hash password")
    })?;

    let new_user = NewUser {
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email.trim().to_string(),
        password_hash,
        is_admin: request.is_admin,
    };

    let id = with_deadline(state.store_timeout, state.users.insert(new_user))
        .await
        .db_err("Failed to insert user")?;
    info!(user_id = %id, "Inserted user");

    Ok(StatusCode::NO_CONTENT)
}

async fn update_user(
    State(state): State<ApiState>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let update = json_body(payload)?;

    let updated = with_deadline(state.store_timeout, state.users.update(&update))
        .await
        .db_err("Failed to update user")?;

    if !updated {
        return Err(ApiError::bad_request("unknown user"));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    State(state): State<ApiState>,
    auth: BearerAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_user_id(&id)?;

    let deleted = with_deadline(state.store_timeout, state.users.delete(id))
        .await
        .db_err("Failed to delete user")?;

    if !deleted {
        return Err(ApiError::bad_request("unknown user"));
    }

    info!(user_id = %id, deleted_by = ?auth.user_id(), "Deleted user");
    Ok(StatusCode::NO_CONTENT)
}
