//! Token endpoints.
//!
//! - POST `/auth` - Exchange email and password for a token pair
//! - POST `/refresh-token` - Rotate a refresh token that is about to expire

use axum::{
    Form, Json, Router,
    extract::{
        State,
        rejection::{FormRejection, JsonRejection},
    },
    http::{StatusCode, header::SET_COOKIE},
    middleware,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::ApiState;
use crate::auth::{self, AuthError};
use crate::rate_limit::rate_limit_login;

pub fn router(state: ApiState) -> Router {
    let login_router = Router::new()
        .route("/auth", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit.clone(),
            rate_limit_login,
        ));

    let refresh_router = Router::new()
        .route("/refresh-token", post(refresh_token))
        .with_state(state);

    Router::new().merge(login_router).merge(refresh_router)
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn login(
    State(state): State<ApiState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(creds) = payload.map_err(|e| {
        warn!(reason = %e, "Rejected login payload");
        AuthError::Unauthorized
    })?;

    let pair = auth::authenticate(&state, &creds.email, &creds.password).await?;
    info!("Issued token pair");

    Ok(Json(pair))
}

#[derive(Deserialize)]
struct RefreshRequest {
    #[serde(default)]
    refresh_token: String,
}

async fn refresh_token(
    State(state): State<ApiState>,
    form: Result<Form<RefreshRequest>, FormRejection>,
) -> Response {
    let Form(request) = match form {
        Ok(form) => form,
        Err(e) => {
            warn!(reason = %e, "Rejected refresh form");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match auth::refresh(&state, &request.refresh_token).await {
        Ok(outcome) => (
            StatusCode::OK,
            [(SET_COOKIE, outcome.cookie)],
            Json(outcome.tokens),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
