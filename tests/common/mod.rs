#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use userhub::auth::IpExtractor;
use userhub::auth::password::hash_password;
use userhub::db::{MemoryUserRepository, NewUser, UserRepository};
use userhub::jwt::{JwtConfig, TokenSettings};
use userhub::web::SessionStore;
use userhub::{ServerConfig, WebConfig, create_app, create_web_app};

pub const SECRET: &str = "2dce505d96a53c5768052ee90f3df2055657518dad489160df9913f66042e160";
pub const DOMAIN: &str = "example.com";

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "secret";

/// A user repository holding admin@example.com / "secret".
pub async fn seeded_users() -> (Arc<dyn UserRepository>, i64) {
    let users = MemoryUserRepository::new();
    let id = users
        .insert(NewUser {
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            email: ADMIN_EMAIL.to_string(),
            password_hash: hash_password(ADMIN_PASSWORD).expect("Failed to hash password"),
            is_admin: true,
        })
        .await
        .expect("Failed to seed user");
    (Arc::new(users), id)
}

pub struct TestApi {
    pub app: Router,
    pub jwt: Arc<JwtConfig>,
    pub users: Arc<dyn UserRepository>,
    pub admin_id: i64,
}

impl TestApi {
    pub async fn new() -> Self {
        Self::with_settings(TokenSettings::new(DOMAIN)).await
    }

    pub async fn with_settings(settings: TokenSettings) -> Self {
        let (users, admin_id) = seeded_users().await;
        let jwt = Arc::new(JwtConfig::new(SECRET.as_bytes(), settings).expect("Invalid settings"));
        let config = ServerConfig {
            users: users.clone(),
            jwt: jwt.clone(),
            login_burst: 100,
            store_timeout: Duration::from_secs(1),
            ip_extractor: None,
        };

        Self {
            app: create_app(&config),
            jwt,
            users,
            admin_id,
        }
    }

    /// Access token for the seeded admin.
    pub async fn admin_token(&self) -> String {
        let user = self
            .users
            .get_by_id(self.admin_id)
            .await
            .expect("Store failed")
            .expect("Admin missing");
        self.jwt
            .issue_access_token(&user)
            .expect("Failed to issue token")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed")
    }
}

pub struct TestWeb {
    pub app: Router,
    pub sessions: SessionStore,
    pub users: Arc<dyn UserRepository>,
    pub admin_id: i64,
}

impl TestWeb {
    pub async fn new() -> Self {
        Self::with_ip_header(None).await
    }

    /// Web app reading the client IP from `ip_extractor` instead of the socket.
    pub async fn with_ip_header(ip_extractor: Option<IpExtractor>) -> Self {
        let (users, admin_id) = seeded_users().await;
        let sessions = SessionStore::default();
        let config = WebConfig {
            users: users.clone(),
            sessions: sessions.clone(),
            login_burst: 100,
            store_timeout: Duration::from_secs(1),
            ip_extractor,
        };

        Self {
            app: create_web_app(&config),
            sessions,
            users,
            admin_id,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed")
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Body is not JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("Body is not UTF-8")
}
