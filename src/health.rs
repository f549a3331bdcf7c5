//! Liveness probe endpoint.
//!
//! A fixed 200 "OK" at `/`, served from a background task so hosting
//! platforms can keep the process alive. Its lifecycle is independent of the
//! bot dispatcher.

use axum::{routing::get, Router};
use tracing::{error, info};

async fn home() -> &'static str {
    "OK"
}

pub fn router() -> Router {
    Router::new().route("/", get(home))
}

/// Bind the liveness listener and serve it on a spawned task.
pub async fn spawn(port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "Liveness endpoint started");

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router()).await {
            error!(error = %error, "Liveness endpoint terminated unexpectedly");
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_home_returns_ok() {
        assert_eq!(home().await, "OK");
    }
}
