use clap::Parser;
use tracing::{error, info};
use userhub::cli::{
    ApiArgs, build_config, build_jwt, handle_create_admin, init_logging, load_jwt_secret,
    open_database,
};
use userhub::run_server;

#[tokio::main]
async fn main() {
    let args = ApiArgs::parse();

    init_logging(&args.common.log_format);

    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(jwt) = build_jwt(&jwt_secret, args.token_settings()) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.common.database).await else {
        std::process::exit(1);
    };

    if let Some(email) = args.create_admin.as_deref() {
        handle_create_admin(&db, email).await;
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    info!(address = %addr, domain = %jwt.domain(), "Starting API server");

    let config = build_config(db, jwt, &args.common);
    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
