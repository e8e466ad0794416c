//! Startup configuration.
//!
//! Parsed once in `main` and shared with every handler behind an `Arc`.
//! Flags take precedence over environment variables, which take precedence
//! over the built-in defaults — clap's `env` attribute implements exactly
//! that ordering.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Immutable runtime configuration for the whole service.
#[derive(Debug, Clone, Parser)]
#[command(name = "zipserve", about = "Streams throttled zip archives of photo folders over HTTP")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "ZIPSERVE_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Root directory containing one folder per downloadable archive.
    #[arg(long, env = "ZIPSERVE_PHOTOS_DIR", default_value = "test_photos")]
    pub photos_dir: PathBuf,

    /// Seconds to pause between archive chunks. 0 disables throttling.
    #[arg(long, env = "ZIPSERVE_DELAY", default_value = "0", value_parser = parse_delay)]
    pub delay: Duration,

    /// Directory holding index.html and 404.html.
    #[arg(long, env = "ZIPSERVE_PAGES_DIR", default_value = "static")]
    pub pages_dir: PathBuf,

    /// Log at debug level (overridden by RUST_LOG when set).
    #[arg(long, env = "ZIPSERVE_DEBUG")]
    pub debug: bool,
}

fn parse_delay(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw.parse().map_err(|e| format!("not a number: {e}"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err("delay must be a non-negative number of seconds".to_owned());
    }
    Ok(Duration::from_secs_f64(secs))
}
