use clap::Parser;
use tracing::{error, info};
use userhub::cli::{WebArgs, build_web_config, init_logging, open_database};
use userhub::{init_cleanup, run_web_server};

#[tokio::main]
async fn main() {
    let args = WebArgs::parse();

    init_logging(&args.common.log_format);

    let Some(db) = open_database(&args.common.database).await else {
        std::process::exit(1);
    };

    let config = build_web_config(db, &args.common);
    init_cleanup(&config.sessions).await;

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    info!(address = %addr, "Starting web server");

    if let Err(e) = run_web_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
