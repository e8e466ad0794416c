//! Moves bytes from the archive process to the response body, one bounded
//! chunk at a time, with an optional pause between chunks.
//!
//! The pump is generic over any async reader, so everything here is
//! testable with in-memory data — no process required.

use std::time::Duration;

use bytes::Bytes;
use http_body::Frame;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::trace;

use crate::response::BodyFrame;

/// Why a pump loop stopped before the source was exhausted.
#[derive(Debug, Error)]
pub enum PumpError {
    /// The body receiver went away: the client disconnected or the
    /// connection was torn down mid-stream.
    #[error("client went away mid-stream")]
    ClientGone,

    /// Reading the process output failed.
    #[error("reading archive output failed: {0}")]
    Read(#[from] std::io::Error),
}

/// Copies `reader` into `sender` in chunks of at most `chunk_size` bytes,
/// sleeping `delay` after each sent chunk. Returns the total byte count on
/// end-of-stream. A zero `delay` never sleeps.
///
/// Chunks are sent in read order, and their concatenation is byte-for-byte
/// the reader's output. Cancellation is observed at every suspension point:
/// a closed channel interrupts a blocked read, a pending send, and the
/// inter-chunk delay alike, and surfaces as [`PumpError::ClientGone`]
/// without reading further.
pub async fn pump<R>(
    reader: &mut R,
    sender: &mpsc::Sender<BodyFrame>,
    chunk_size: usize,
    delay: Duration,
) -> Result<u64, PumpError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; chunk_size];
    let mut total = 0u64;

    loop {
        let n = tokio::select! {
            res = reader.read(&mut buf) => res?,
            () = sender.closed() => return Err(PumpError::ClientGone),
        };
        if n == 0 {
            return Ok(total);
        }

        let chunk = Bytes::copy_from_slice(&buf[..n]);
        if sender.send(Ok(Frame::data(chunk))).await.is_err() {
            return Err(PumpError::ClientGone);
        }
        total += n as u64;
        trace!(bytes = n, "sent archive chunk");

        if !delay.is_zero() {
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = sender.closed() => return Err(PumpError::ClientGone),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Collects every data frame currently buffered plus all that follow
    /// until the channel closes.
    async fn collect(mut rx: mpsc::Receiver<BodyFrame>) -> Vec<Bytes> {
        let mut chunks = Vec::new();
        while let Some(frame) = rx.recv().await {
            let frame = frame.expect("pump only sends Ok frames");
            chunks.push(frame.into_data().expect("pump only sends data frames"));
        }
        chunks
    }

    #[tokio::test]
    async fn chunks_are_bounded_ordered_and_lossless() {
        let data: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        let (tx, rx) = mpsc::channel(64);

        let mut reader = Cursor::new(data.clone());
        let total = pump(&mut reader, &tx, 1024, Duration::ZERO)
            .await
            .expect("pump should run to EOF");
        drop(tx);

        assert_eq!(total, data.len() as u64);
        let chunks = collect(rx).await;
        assert!(chunks.iter().all(|c| c.len() <= 1024));
        let rejoined: Vec<u8> = chunks.concat();
        assert_eq!(rejoined, data);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_never_sleeps() {
        let data = vec![7u8; 4096];
        let (tx, rx) = mpsc::channel(64);
        let start = tokio::time::Instant::now();

        let mut reader = Cursor::new(data);
        pump(&mut reader, &tx, 512, Duration::ZERO).await.unwrap();
        drop(tx);
        collect(rx).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_throttles_each_chunk_boundary() {
        // 5 chunks of 10 bytes with a 20ms delay: at least 4 waits elapse.
        let data = vec![1u8; 50];
        let delay = Duration::from_millis(20);
        let (tx, rx) = mpsc::channel(64);
        let start = tokio::time::Instant::now();

        let mut reader = Cursor::new(data);
        let total = pump(&mut reader, &tx, 10, delay).await.unwrap();
        drop(tx);

        assert_eq!(total, 50);
        assert_eq!(collect(rx).await.len(), 5);
        assert!(start.elapsed() >= 4 * delay, "elapsed {:?}", start.elapsed());
    }

    #[tokio::test]
    async fn dropped_receiver_stops_the_pump() {
        // Capacity 1 and plenty of data: the pump blocks on send, the
        // receiver disappears after one chunk, the pump must bail out.
        let data = vec![9u8; 1024 * 1024];
        let (tx, mut rx) = mpsc::channel(1);

        let handle = tokio::spawn(async move {
            let mut reader = Cursor::new(data);
            pump(&mut reader, &tx, 1024, Duration::ZERO).await
        });

        let first = rx.recv().await.expect("one chunk should arrive");
        assert_eq!(first.unwrap().into_data().unwrap().len(), 1024);
        drop(rx);

        let result = handle.await.expect("pump task should not panic");
        assert!(matches!(result, Err(PumpError::ClientGone)));
    }

    #[tokio::test(start_paused = true)]
    async fn receiver_dropped_during_delay_interrupts_the_wait() {
        let data = vec![3u8; 128];
        let delay = Duration::from_secs(3600);
        let (tx, mut rx) = mpsc::channel(1);

        let handle = tokio::spawn(async move {
            let mut reader = Cursor::new(data);
            pump(&mut reader, &tx, 64, delay).await
        });

        // One chunk arrives, then the pump sits in its hour-long delay.
        rx.recv().await.expect("chunk");
        drop(rx);

        // `sender.closed()` fires without the clock ever reaching the delay.
        let result = handle.await.expect("pump task should not panic");
        assert!(matches!(result, Err(PumpError::ClientGone)));
    }
}
