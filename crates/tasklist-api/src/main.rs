//! tasklist-api: REST API server for tasklist items

use tasklist_api::{ItemRepository, app};

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let data = std::env::var("TASKLIST_DATA").unwrap_or_else(|_| "items.jsonl".to_string());
    let repo = ItemRepository::open(&data)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", data, e))?;

    // Get port from env or default
    let port: u16 = std::env::var("TASKLIST_API_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Starting tasklist-api on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(repo)).await?;

    Ok(())
}
