use bytes::Bytes;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Outcome of offering a frame to one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Queued,
    /// The client's queue is full.
    Slow,
    /// The writer has stopped, normally after a write error.
    Gone,
}

/// Hub-side handle of one subscriber. Dropping it closes the queue; the
/// writer then drains what is left and shuts the stream down.
#[derive(Debug)]
pub(crate) struct ClientConnection {
    id: u64,
    peer: SocketAddr,
    queue: mpsc::Sender<Bytes>,
    evict: CancellationToken,
}

impl ClientConnection {
    pub(crate) fn new(id: u64, peer: SocketAddr, stream: TcpStream, capacity: usize) -> (Self, ClientWriter) {
        let (queue, frames) = mpsc::channel(capacity);
        let evict = CancellationToken::new();

        let connection = Self {
            id,
            peer,
            queue,
            evict: evict.clone(),
        };
        let writer = ClientWriter {
            id,
            peer,
            stream,
            frames,
            evict,
        };
        (connection, writer)
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Never blocks.
    pub(crate) fn offer(&self, frame: Bytes) -> Delivery {
        match self.queue.try_send(frame) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => Delivery::Slow,
            Err(TrySendError::Closed(_)) => Delivery::Gone,
        }
    }

    /// Stops the writer without draining, even mid-write.
    pub(crate) fn evict(&self) {
        self.evict.cancel();
    }
}

/// Independent send path of one client; runs on the hub runtime.
pub(crate) struct ClientWriter {
    id: u64,
    peer: SocketAddr,
    stream: TcpStream,
    frames: mpsc::Receiver<Bytes>,
    evict: CancellationToken,
}

impl ClientWriter {
    pub(crate) async fn run(mut self) {
        loop {
            let frame = tokio::select! {
                biased;
                () = self.evict.cancelled() => {
                    debug!(client = self.id, peer = %self.peer, "writer evicted");
                    return;
                }
                frame = self.frames.recv() => frame,
            };

            let Some(frame) = frame else {
                break;
            };

            tokio::select! {
                biased;
                () = self.evict.cancelled() => {
                    debug!(client = self.id, peer = %self.peer, "writer evicted mid-write");
                    return;
                }
                written = self.stream.write_all(&frame) => {
                    if let Err(e) = written {
                        warn!(client = self.id, peer = %self.peer, error = %e, "write to client failed");
                        return;
                    }
                }
            }
        }

        if let Err(e) = self.stream.shutdown().await {
            debug!(client = self.id, peer = %self.peer, error = %e, "client shutdown failed");
        }
        debug!(client = self.id, peer = %self.peer, "writer finished");
    }
}
