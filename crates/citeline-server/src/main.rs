//! Citeline: citation timeline server.

use std::path::PathBuf;
use std::sync::Arc;

use citeline_core::CitelineConfig;
use citeline_runtime::Session;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

fn resolve_config_path(args: &[String]) -> Option<PathBuf> {
    args.get(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var("CITELINE_CONFIG").ok().map(PathBuf::from))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if let Some("--help" | "-h" | "help") = args.get(1).map(String::as_str) {
        println!("Citeline: citation timeline server");
        println!();
        println!("Usage: citeline [config.json]");
        println!();
        println!("Environment:");
        println!("  PORT                       HTTP port (default 3004)");
        println!("  CITELINE_CONFIG            Configuration file path");
        println!("  CITELINE_TRAVERSAL_DEPTH   Reference hops to expand (default 1)");
        println!("  CROSSREF_MAILTO            Contact address sent to Crossref");
        println!("  RUST_LOG                   Log filter (default info)");
        return Ok(());
    }

    let config = match resolve_config_path(&args) {
        Some(path) => CitelineConfig::load(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?,
        None => CitelineConfig::from_env(),
    };
    let port = config.port;

    let resolver = citeline_resolve::create_resolver(&config.crossref)
        .map_err(|e| anyhow::anyhow!("Failed to create resolver: {}", e))?;
    let session = Session::new(&config, resolver);
    let state = Arc::new(AppState::new(config, session));

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Citeline server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
