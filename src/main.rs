use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use axum::routing::{get, post};
use tracing as log;

use assignbot::github::{GithubClient, webhook};
use assignbot::handlers::Context;
use assignbot::logger;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logger::init();

    let ctx = Arc::new(Context {
        github: GithubClient::new_from_env(),
    });

    let app = Router::new()
        .route("/", get(|| async { "Assignbot is awaiting pull requests." }))
        .route("/github-hook", post(webhook))
        .with_state(ctx);

    let port = std::env::var("PORT")
        .ok()
        .map(|p| p.parse::<u16>().expect("PORT must be a number"))
        .unwrap_or(8000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    log::info!("listening on 0.0.0.0:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
