use std::sync::Arc;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use zipserve::{Config, Router, Server, download, pages};

#[tokio::main]
async fn main() -> Result<(), zipserve::Error> {
    let config = Config::parse();
    init_tracing(config.debug);

    if !config.photos_dir.is_dir() {
        warn!(
            "photos directory {} does not exist, every download will 404",
            config.photos_dir.display()
        );
    }

    let config = Arc::new(config);
    let app = Router::new()
        .get("/", {
            let config = Arc::clone(&config);
            move |req| pages::index(req, Arc::clone(&config))
        })
        .get("/archive/{archive_hash}/", {
            let config = Arc::clone(&config);
            move |req| download::archive(req, Arc::clone(&config))
        })
        .not_found({
            let config = Arc::clone(&config);
            move |req| pages::fallback(req, Arc::clone(&config))
        });

    Server::bind(&config.listen).serve(app).await
}

fn init_tracing(debug: bool) {
    let default = if debug { "zipserve=debug" } else { "zipserve=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}
