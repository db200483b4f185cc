//! Bounded-memory response bodies for archive entries.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use futures_util::stream;
use log::{debug, error};
use tokio::sync::mpsc;
use warp::hyper::Body;
use warp::hyper::body::Bytes;

use crate::zip::EntryReader;

/// Bytes read from the archive per chunk
const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the reader and the connection
const CHANNEL_DEPTH: usize = 4;

/// Stream `reader` into a response body.
///
/// Decompression runs on the blocking pool and hands chunks over a bounded
/// channel, so at most a few chunks are in memory at a time. When the client
/// disconnects the channel closes, the copy stops, and the archive handle is
/// dropped with the reader.
///
/// The entry is only verified once its data is exhausted, so the last chunk
/// is held back until the reader reports a clean end. A failed check sends
/// an error instead of that chunk; the body then ends short of its
/// `Content-Length` and hyper aborts the connection.
pub fn stream_entry(reader: EntryReader, archive: PathBuf) -> Body {
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(CHANNEL_DEPTH);

    tokio::task::spawn_blocking(move || copy_chunks(reader, &archive, &tx));

    let chunks = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });
    Body::wrap_stream(chunks)
}

fn copy_chunks(mut reader: EntryReader, archive: &Path, tx: &mpsc::Sender<io::Result<Bytes>>) {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut held: Option<Bytes> = None;
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                if let Some(last) = held.take() {
                    send(tx, Ok(last), &reader, archive);
                }
                return;
            }
            Ok(n) => {
                let chunk = Bytes::copy_from_slice(&buf[..n]);
                if let Some(previous) = held.replace(chunk) {
                    if !send(tx, Ok(previous), &reader, archive) {
                        return;
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!(
                    "Failed streaming entry {} from {}: {}",
                    reader.name(),
                    archive.display(),
                    e
                );
                drop(held);
                let _ = tx.blocking_send(Err(e));
                return;
            }
        }
    }
}

/// False once the receiving side is gone
fn send(
    tx: &mpsc::Sender<io::Result<Bytes>>,
    chunk: io::Result<Bytes>,
    reader: &EntryReader,
    archive: &Path,
) -> bool {
    if tx.blocking_send(chunk).is_err() {
        debug!(
            "Client went away while streaming {} from {}",
            reader.name(),
            archive.display()
        );
        return false;
    }
    true
}
