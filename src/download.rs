//! The archive download handler: resolve, spawn, stream, tear down.
//!
//! The handler answers as soon as the process is up; the bytes flow through
//! a detached pump task that owns the child exclusively. Running the pump
//! outside the connection task is what makes the teardown unconditional —
//! hyper dropping the response body cannot cancel it, it only closes the
//! channel, which the pump observes and cleans up after.

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::archive::{ZipCommand, ZipProcess};
use crate::config::Config;
use crate::pages;
use crate::request::Request;
use crate::resolve;
use crate::response::{BodyFrame, Response};
use crate::stream::{PumpError, pump};

/// Bytes per response chunk.
const CHUNK_SIZE: usize = 1024;

/// `GET /archive/{archive_hash}/` — streams the folder as `archive.zip`.
pub async fn archive(req: Request, config: Arc<Config>) -> Response {
    let Some(hash) = req.param("archive_hash") else {
        return pages::not_found(&config).await;
    };

    debug!(archive_hash = hash, root = %config.photos_dir.display(), "searching for archive folder");
    let Some(dir) = resolve::resolve(&config.photos_dir, hash) else {
        debug!(archive_hash = hash, "folder does not exist or identifier is invalid");
        return pages::not_found(&config).await;
    };

    let proc = match ZipCommand::new(&dir).spawn() {
        Ok(proc) => proc,
        Err(e) => {
            error!(archive_hash = hash, "cannot start archiver: {e}");
            return Response::status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    debug!(pid = proc.pid(), delay = ?config.delay, "starting download");

    // Capacity 1: the client's consumption rate is the only buffer.
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(run_stream(proc, tx, config.delay));

    Response::builder()
        .header("content-disposition", "attachment; filename=\"archive.zip\"")
        .stream(rx)
}

/// Pumps the process output into the body channel, then tears down.
///
/// The teardown sequence holds on every exit path: kill only when the
/// stream was cut short, wait in every case, and drop the sender last so
/// the body never outlives the reaped process.
async fn run_stream(mut proc: ZipProcess, tx: mpsc::Sender<BodyFrame>, delay: Duration) {
    let result = pump(proc.output(), &tx, CHUNK_SIZE, delay).await;

    match &result {
        Ok(total) => debug!(pid = proc.pid(), bytes = total, "archive sent"),
        Err(PumpError::ClientGone) => {
            debug!(pid = proc.pid(), "download was interrupted, killing process");
            proc.kill();
        }
        Err(PumpError::Read(e)) => {
            debug!(pid = proc.pid(), "archive output read failed, killing process: {e}");
            proc.kill();
        }
    }

    match proc.wait().await {
        Ok(status) => debug!(pid = proc.pid(), %status, "archiver reaped"),
        Err(e) => error!(pid = proc.pid(), "failed to reap archiver: {e}"),
    }

    drop(tx);
}

#[cfg(test)]
mod tests {
    use tokio::process::Command;

    use super::*;

    async fn collect(mut rx: mpsc::Receiver<BodyFrame>) -> Vec<u8> {
        let mut body = Vec::new();
        while let Some(frame) = rx.recv().await {
            body.extend_from_slice(&frame.unwrap().into_data().unwrap());
        }
        body
    }

    #[tokio::test]
    async fn run_stream_delivers_everything_and_reaps() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.bin");
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 253) as u8).collect();
        std::fs::write(&file, &data).unwrap();

        let mut cmd = Command::new("cat");
        cmd.arg(&file);
        let proc = ZipProcess::spawn("cat", cmd).expect("cat should spawn");

        let (tx, rx) = mpsc::channel(1);
        let streamer = tokio::spawn(run_stream(proc, tx, Duration::ZERO));

        let body = collect(rx).await;
        assert_eq!(body, data);
        // run_stream returning means the child was waited on.
        tokio::time::timeout(Duration::from_secs(5), streamer)
            .await
            .expect("teardown should not hang")
            .expect("teardown should not panic");
    }

    #[tokio::test]
    async fn client_gone_kills_and_reaps_the_process() {
        // `yes` writes forever; only a kill can end this stream.
        let cmd = Command::new("yes");
        let proc = ZipProcess::spawn("yes", cmd).expect("yes should spawn");

        let (tx, mut rx) = mpsc::channel::<BodyFrame>(1);
        let streamer = tokio::spawn(run_stream(proc, tx, Duration::ZERO));

        let first = rx.recv().await.expect("one chunk should arrive");
        assert!(!first.unwrap().into_data().unwrap().is_empty());
        drop(rx);

        // Completion proves the kill-then-wait sequence ran.
        tokio::time::timeout(Duration::from_secs(5), streamer)
            .await
            .expect("kill and reap should not hang")
            .expect("teardown should not panic");
    }
}
