use super::client::{ClientConnection, Delivery};
use crate::appender::AppenderError;
use bytes::Bytes;
use std::net::SocketAddr;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

// Pause after a failed accept (e.g. out of file descriptors) before retrying.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Settings the hub thread is started with.
#[derive(Debug, Clone)]
pub(crate) struct ServerSettings {
    pub bind: SocketAddr,
    pub client_queue_capacity: usize,
    pub shutdown_grace: Duration,
}

/// A running hub: the listening socket, its accept duty and the client set.
///
/// The accept duty and every client writer run on a current-thread tokio
/// runtime owned by a dedicated OS thread. New connections reach the
/// dispatch side through `arrivals` and are admitted before each
/// broadcast, so only the dispatch side ever touches `clients`.
pub(crate) struct HubServer {
    appender: String,
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    thread: Option<JoinHandle<()>>,
    arrivals: mpsc::UnboundedReceiver<ClientConnection>,
    clients: Vec<ClientConnection>,
}

impl HubServer {
    /// Binds synchronously so bind errors surface to the caller.
    pub(crate) fn start(appender: &str, settings: ServerSettings) -> Result<Self, AppenderError> {
        let listener = std::net::TcpListener::bind(settings.bind).map_err(|source| AppenderError::Bind {
            address: settings.bind.to_string(),
            source,
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AppenderError::Spawn(format!("hub runtime: {e}")))?;

        let shutdown = CancellationToken::new();
        let (arrivals_tx, arrivals) = mpsc::unbounded_channel();

        let accept_shutdown = shutdown.clone();
        let accept_name = appender.to_string();
        let thread = std::thread::Builder::new()
            .name("broadcast-hub".to_string())
            .spawn(move || {
                runtime.block_on(accept_loop(
                    accept_name,
                    listener,
                    arrivals_tx,
                    accept_shutdown,
                    settings.client_queue_capacity,
                    settings.shutdown_grace,
                ));
            })
            .map_err(|e| AppenderError::Spawn(format!("hub thread: {e}")))?;

        Ok(Self {
            appender: appender.to_string(),
            local_addr,
            shutdown,
            thread: Some(thread),
            arrivals,
            clients: Vec::new(),
        })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Moves connections accepted since the last call into the client set.
    pub(crate) fn admit_arrivals(&mut self) {
        while let Ok(client) = self.arrivals.try_recv() {
            self.clients.push(client);
        }
    }

    pub(crate) fn client_count(&mut self) -> usize {
        self.admit_arrivals();
        self.clients.len()
    }

    /// Offers `frame` to every client. Full or closed queues cost the
    /// owning client its place; everyone else still gets the frame.
    pub(crate) fn broadcast(&mut self, frame: &Bytes) {
        let appender = &self.appender;
        self.clients.retain(|client| match client.offer(frame.clone()) {
            Delivery::Queued => true,
            Delivery::Slow => {
                warn!(
                    appender = %appender,
                    client = client.id(),
                    peer = %client.peer(),
                    "client queue full, disconnecting slow client"
                );
                client.evict();
                false
            }
            Delivery::Gone => {
                info!(
                    appender = %appender,
                    client = client.id(),
                    peer = %client.peer(),
                    "client disconnected"
                );
                false
            }
        });
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        self.shutdown.cancel();

        // Dropping the queues lets each writer drain and exit.
        self.clients.clear();
        self.arrivals.close();
        while self.arrivals.try_recv().is_ok() {}

        if thread.join().is_err() {
            error!(appender = %self.appender, "broadcast hub thread panicked");
        }
        info!(appender = %self.appender, addr = %self.local_addr, "broadcast hub stopped");
    }
}

impl Drop for HubServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn accept_loop(
    appender: String,
    listener: std::net::TcpListener,
    arrivals: mpsc::UnboundedSender<ClientConnection>,
    shutdown: CancellationToken,
    queue_capacity: usize,
    grace: Duration,
) {
    let listener = match TcpListener::from_std(listener) {
        Ok(listener) => listener,
        Err(e) => {
            error!(appender = %appender, error = %e, "failed to register listener with runtime");
            return;
        }
    };

    let writers = TaskTracker::new();
    let mut next_id: u64 = 0;

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    next_id += 1;
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(appender = %appender, peer = %peer, error = %e, "failed to set TCP_NODELAY");
                    }

                    let (connection, writer) = ClientConnection::new(next_id, peer, stream, queue_capacity);
                    writers.spawn(writer.run());

                    if arrivals.send(connection).is_err() {
                        // The dispatch side is gone; the hub is shutting down.
                        break;
                    }
                    info!(appender = %appender, client = next_id, peer = %peer, "client connected");
                }
                Err(e) => {
                    warn!(appender = %appender, error = %e, "accept failed");
                    tokio::select! {
                        () = shutdown.cancelled() => break,
                        () = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                    }
                }
            }
        }
    }

    // No connection is accepted past this point.
    drop(listener);

    writers.close();
    if tokio::time::timeout(grace, writers.wait()).await.is_err() {
        warn!(
            appender = %appender,
            pending = writers.len(),
            "client writers did not drain within the grace period"
        );
    }
}
