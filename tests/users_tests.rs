mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{TestApi, body_json};
use std::time::Duration;
use userhub::db::UserRepository;
use userhub::jwt::TokenSettings;

fn authed(method: &str, uri: &str, token: &str, json: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match json {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_users_require_bearer() {
    let api = TestApi::new().await;

    let response = api
        .send(Request::builder().uri("/users").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get(header::VARY).unwrap(), "Authorization");
    let json = body_json(response).await;
    assert_eq!(json["error"], "missing Authorization header");
}

#[tokio::test]
async fn test_malformed_authorization_headers() {
    let api = TestApi::new().await;
    let token = api.admin_token().await;

    let cases = [
        (format!("Basic {}", token), "unauthorized header: no Bearer found"),
        (format!("Bearer {} extra", token), "invalid Authorization header"),
        ("Bearer".to_string(), "invalid Authorization header"),
        ("Bearer not.a.token".to_string(), "malformed token"),
    ];

    for (value, expected) in cases {
        let response = api
            .send(
                Request::builder()
                    .uri("/users")
                    .header(header::AUTHORIZATION, value.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", value);
        let json = body_json(response).await;
        assert_eq!(json["error"], expected, "{}", value);
    }
}

#[tokio::test]
async fn test_expired_access_token() {
    let api = TestApi::with_settings(
        TokenSettings::new("example.com").with_lifetimes(Duration::ZERO, Duration::from_secs(60)),
    )
    .await;
    let token = api.admin_token().await;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = api.send(authed("GET", "/users", &token, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "expired token");
}

#[tokio::test]
async fn test_list_users() {
    let api = TestApi::new().await;
    let token = api.admin_token().await;

    let response = api.send(authed("GET", "/users", &token, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::VARY).unwrap(), "Authorization");

    let json = body_json(response).await;
    let users = json.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "admin@example.com");
    assert_eq!(users[0]["is_admin"], true);
    assert!(users[0].get("password").is_none());
}

#[tokio::test]
async fn test_get_user() {
    let api = TestApi::new().await;
    let token = api.admin_token().await;

    let uri = format!("/users/{}", api.admin_id);
    let response = api.send(authed("GET", &uri, &token, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["first_name"], "Admin");

    let response = api.send(authed("GET", "/users/999", &token, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = api.send(authed("GET", "/users/Y", &token, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_user() {
    let api = TestApi::new().await;
    let token = api.admin_token().await;

    let response = api.send(authed("DELETE", "/users/Y", &token, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/users/{}", api.admin_id);
    let response = api.send(authed("DELETE", &uri, &token, None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(api.users.get_by_id(api.admin_id).await.unwrap().is_none());

    let response = api.send(authed("DELETE", &uri, &token, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_insert_user() {
    let api = TestApi::new().await;
    let token = api.admin_token().await;

    let valid = r#"{"email":"jane@example.com","first_name":"Jane","last_name":"Doe","password":"hunter22"}"#;
    let response = api.send(authed("PUT", "/users", &token, Some(valid))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let jane = api
        .users
        .get_by_email("jane@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(!jane.is_admin);
    assert_ne!(jane.password, "hunter22");

    let cases = [
        ("duplicate email", valid),
        (
            "unknown field",
            r#"{"foo":"bar","email":"x@example.com","first_name":"X","last_name":"Y","password":"pw"}"#,
        ),
        (
            "invalid json",
            r#"{email":"x@example.com","first_name":"X","last_name":"Y","password":"pw"}"#,
        ),
        (
            "missing password",
            r#"{"email":"x@example.com","first_name":"X","last_name":"Y"}"#,
        ),
    ];

    for (name, body) in cases {
        let response = api.send(authed("PUT", "/users", &token, Some(body))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", name);
    }
}

#[tokio::test]
async fn test_update_user() {
    let api = TestApi::new().await;
    let token = api.admin_token().await;

    let valid = format!(
        r#"{{"id":{},"email":"admin@example.com","first_name":"Ada","last_name":"User"}}"#,
        api.admin_id
    );
    let response = api.send(authed("PATCH", "/users", &token, Some(&valid))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let admin = api.users.get_by_id(api.admin_id).await.unwrap().unwrap();
    assert_eq!(admin.first_name, "Ada");
    assert!(!admin.is_admin);

    let invalid = r#"{"id":1,"email":"admin@example.com",first_name":"Admin","last_name":"User"}"#;
    let response = api.send(authed("PATCH", "/users", &token, Some(invalid))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unknown = r#"{"id":999,"email":"ghost@example.com","first_name":"G","last_name":"H"}"#;
    let response = api.send(authed("PATCH", "/users", &token, Some(unknown))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
