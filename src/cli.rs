//! CLI argument parsing, validation, and startup helpers.

use clap::{Args, Parser};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::auth::IpExtractor;
use crate::auth::password::hash_password_async;
use crate::db::{Database, NewUser, UserRepository};
use crate::jwt::{JwtConfig, TokenSettings};
use crate::rate_limit::DEFAULT_LOGIN_BURST;
use crate::web::SessionStore;
use crate::{ServerConfig, WebConfig};

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ADMIN_PASSWORD_LENGTH: usize = 8;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Options shared by both servers.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to SQLite database file
    #[arg(short, long, default_value = "userhub.db")]
    pub database: String,

    /// Login attempts allowed per IP before throttling kicks in
    #[arg(long, default_value_t = DEFAULT_LOGIN_BURST)]
    pub login_burst: u32,

    /// Deadline for a single user store call, in milliseconds
    #[arg(long, default_value = "5000")]
    pub store_timeout_ms: u64,

    /// Read the client IP from this proxy header instead of the socket.
    /// Only use behind a reverse proxy that sets the header
    #[arg(long, value_enum)]
    pub ip_header: Option<IpExtractor>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

impl CommonArgs {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "userhub-api", about = "User API with JWT access and refresh tokens")]
pub struct ApiArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8090")]
    pub port: u16,

    /// Domain used as token issuer and audience
    #[arg(long, default_value = "example.com")]
    pub domain: String,

    /// Access token lifetime in seconds
    #[arg(long, default_value = "900")]
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in seconds, must exceed the access token lifetime
    #[arg(long, default_value = "86400")]
    pub refresh_ttl_secs: u64,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Create an admin user with this email on startup. Password is read from ADMIN_PASSWORD
    #[arg(long, value_name = "EMAIL")]
    pub create_admin: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ApiArgs {
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings::new(self.domain.clone()).with_lifetimes(
            Duration::from_secs(self.access_ttl_secs),
            Duration::from_secs(self.refresh_ttl_secs),
        )
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "userhub-web", about = "Session-based web frontend for userhub")]
pub struct WebArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    validate_jwt_secret(secret)
}

fn validate_jwt_secret(secret: String) -> Option<String> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Build the token codec, logging errors if the lifetimes are inconsistent.
pub fn build_jwt(secret: &str, settings: TokenSettings) -> Option<JwtConfig> {
    match JwtConfig::new(secret.as_bytes(), settings) {
        Ok(jwt) => Some(jwt),
        Err(e) => {
            error!(error = %e, "Invalid token configuration");
            None
        }
    }
}

/// Handle the --create-admin flag: create an admin user unless the email is taken.
pub async fn handle_create_admin(db: &Database, email: &str) {
    let users = db.users();

    match users.get_by_email(email).await {
        Ok(Some(existing)) => {
            info!(user_id = %existing.id, "User already exists, not creating admin");
            println!();
            println!("User already exists: {}", existing.email);
            println!();
            return;
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check for existing user");
            std::process::exit(1);
        }
    }

    let Some(password) = admin_password_from_env() else {
        std::process::exit(1);
    };

    let password_hash = match hash_password_async(password).await {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash admin password");
            std::process::exit(1);
        }
    };

    let new_user = NewUser {
        first_name: "Admin".to_string(),
        last_name: "User".to_string(),
        email: email.to_string(),
        password_hash,
        is_admin: true,
    };

    match users.insert(new_user).await {
        Ok(id) => {
            info!(user_id = %id, "Admin user created");
            println!();
            println!("Admin user created: {}", email);
            println!();
        }
        Err(e) => {
            error!(error = %e, "Failed to create admin user");
            std::process::exit(1);
        }
    }
}

fn admin_password_from_env() -> Option<String> {
    let Ok(password) = std::env::var("ADMIN_PASSWORD") else {
        error!("ADMIN_PASSWORD environment variable is required with --create-admin");
        return None;
    };
    // SAFETY: Called during single-threaded startup before the server runs.
    unsafe { std::env::remove_var("ADMIN_PASSWORD") };

    if password.len() < MIN_ADMIN_PASSWORD_LENGTH {
        error!(
            "ADMIN_PASSWORD is shorter than {} characters",
            MIN_ADMIN_PASSWORD_LENGTH
        );
        return None;
    }

    Some(password)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(db: Database, jwt: JwtConfig, common: &CommonArgs) -> ServerConfig {
    ServerConfig {
        users: Arc::new(db.users()),
        jwt: Arc::new(jwt),
        login_burst: common.login_burst,
        store_timeout: common.store_timeout(),
        ip_extractor: common.ip_header,
    }
}

/// Build WebConfig from validated arguments.
pub fn build_web_config(db: Database, common: &CommonArgs) -> WebConfig {
    WebConfig {
        users: Arc::new(db.users()),
        sessions: SessionStore::default(),
        login_burst: common.login_burst,
        store_timeout: common.store_timeout(),
        ip_extractor: common.ip_header,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
