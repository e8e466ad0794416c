//! # zipserve
//!
//! A small HTTP service that zips photo folders on demand and streams the
//! archive to the client, optionally throttled to a fixed bandwidth.
//!
//! ## How a download works
//!
//! `GET /archive/{archive_hash}/` names a folder under the configured photos
//! root. The handler:
//!
//! 1. Resolves the identifier ([`resolve`]), rejecting `..` traversal and
//!    folders that don't exist — those get the static 404 page.
//! 2. Spawns `zip` scoped to the folder ([`archive`]), stdout piped.
//! 3. Returns a chunked response immediately; a detached task pumps process
//!    output into the body in 1 KiB chunks with a configurable pause between
//!    them ([`stream`]).
//! 4. Tears down unconditionally ([`download`]): kill the process if the
//!    client went away mid-stream, reap it in every case, close the body
//!    last.
//!
//! The archive is produced and consumed in constant memory — nothing is
//! buffered to disk, and a folder of any size starts downloading instantly.
//!
//! ## What the proxy owns
//!
//! zipserve is meant to sit behind nginx. TLS, rate limiting and slow-client
//! protection stay there; the service only does the part that can't be
//! configured into a proxy: producing and throttling the archive stream.

pub mod archive;
pub mod config;
pub mod download;
pub mod error;
mod handler;
pub mod pages;
mod request;
pub mod resolve;
pub mod response;
mod router;
pub mod server;
pub mod stream;

pub use config::Config;
pub use error::Error;
pub use handler::Handler;
pub use request::Request;
pub use response::{IntoResponse, Response};
pub use router::Router;
pub use server::Server;
