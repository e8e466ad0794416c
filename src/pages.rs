//! Static index and not-found pages.
//!
//! Pages are read from the configured pages directory on every request, so
//! editing them does not need a restart. When a file is absent the built-in
//! fallback keeps the service answering instead of turning a missing asset
//! into a 500.

use std::path::Path;
use std::sync::Arc;

use http::StatusCode;
use tracing::debug;

use crate::config::Config;
use crate::request::Request;
use crate::response::Response;

const FALLBACK_INDEX: &str = "<!doctype html>\n<html><body>\
<h1>Photo archive</h1>\
<p>Download a folder as a zip at <code>/archive/&lt;id&gt;/</code>.</p>\
</body></html>\n";

const FALLBACK_NOT_FOUND: &str = "<!doctype html>\n<html><body>\
<h1>404 &mdash; archive not found</h1>\
<p>No such archive, or it has been removed.</p>\
</body></html>\n";

/// `GET /` — the service landing page.
pub async fn index(_req: Request, config: Arc<Config>) -> Response {
    Response::html(load(&config.pages_dir, "index.html", FALLBACK_INDEX).await)
}

/// Router fallback for paths that match nothing.
pub async fn fallback(_req: Request, config: Arc<Config>) -> Response {
    not_found(&config).await
}

/// The 404 response shared by unresolvable archives and unmatched routes.
pub(crate) async fn not_found(config: &Config) -> Response {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .html(load(&config.pages_dir, "404.html", FALLBACK_NOT_FOUND).await)
}

async fn load(dir: &Path, name: &str, fallback: &str) -> String {
    match tokio::fs::read_to_string(dir.join(name)).await {
        Ok(contents) => contents,
        Err(e) => {
            debug!("serving built-in {name}: {e}");
            fallback.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pages_dir: &Path) -> Arc<Config> {
        Arc::new(Config {
            listen: "127.0.0.1:0".to_owned(),
            photos_dir: "unused".into(),
            delay: std::time::Duration::ZERO,
            pages_dir: pages_dir.to_path_buf(),
            debug: false,
        })
    }

    #[tokio::test]
    async fn index_prefers_the_on_disk_page() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>custom</p>").unwrap();

        let config = config(dir.path());
        let res = index(Request::test("/", &[]), config).await;
        assert_eq!(res.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn not_found_is_404_even_without_a_page_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let res = not_found(&config).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }
}
