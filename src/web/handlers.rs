use axum::{
    Extension, Form,
    extract::{State, rejection::FormRejection},
    http::{HeaderMap, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use html_escape::encode_text;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::session::{SESSION_COOKIE_NAME, clear_session_cookie, session_cookie};
use super::{ClientIp, WebState};
use crate::auth::{check_credentials, get_cookie, with_deadline};

const HOME_PAGE: &str = include_str!("pages/home.html");
const PROFILE_PAGE: &str = include_str!("pages/profile.html");

const PROFILE_PATH: &str = "/user/profile";

pub async fn home(Extension(ClientIp(ip)): Extension<ClientIp>) -> Html<String> {
    Html(HOME_PAGE.replace("{{ip}}", &encode_text(&ip)))
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn login(
    State(state): State<WebState>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = form else {
        warn!(ip = %ip, "Rejected login form");
        return Redirect::to("/").into_response();
    };

    let user = match check_credentials(
        state.users.as_ref(),
        state.store_timeout,
        &form.email,
        &form.password,
    )
    .await
    {
        Ok(user) => user,
        Err(_) => return Redirect::to("/").into_response(),
    };

    let id = state.sessions.create(user.id, &ip).await;
    info!(user_id = %user.id, ip = %ip, "Web session started");

    (
        [(SET_COOKIE, session_cookie(&id, state.sessions.lifetime()))],
        Redirect::to(PROFILE_PATH),
    )
        .into_response()
}

pub async fn profile(State(state): State<WebState>, headers: HeaderMap) -> Response {
    let Some(id) = get_cookie(&headers, SESSION_COOKIE_NAME) else {
        return Redirect::to("/").into_response();
    };
    let Some(session) = state.sessions.get(id).await else {
        return Redirect::to("/").into_response();
    };

    let user = match with_deadline(state.store_timeout, state.users.get_by_id(session.user_id)).await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            state.sessions.destroy(id).await;
            return ([(SET_COOKIE, clear_session_cookie())], Redirect::to("/")).into_response();
        }
        Err(e) => {
            error!(user_id = %session.user_id, error = %e, "Failed to load profile");
            return Redirect::to("/").into_response();
        }
    };

    let name = format!("{} {}", user.first_name, user.last_name);
    Html(
        PROFILE_PAGE
            .replace("{{name}}", &encode_text(&name))
            .replace("{{email}}", &encode_text(&user.email))
            .replace("{{ip}}", &encode_text(&session.ip)),
    )
    .into_response()
}

pub async fn logout(State(state): State<WebState>, headers: HeaderMap) -> Response {
    if let Some(id) = get_cookie(&headers, SESSION_COOKIE_NAME) {
        if state.sessions.destroy(id).await {
            info!("Web session ended");
        }
    }

    ([(SET_COOKIE, clear_session_cookie())], Redirect::to("/")).into_response()
}
