//! Transport channel
//!
//! Thin wrapper over a `wayland-client` connection and its single event
//! queue. Handlers run synchronously on the calling thread while
//! `dispatch_blocking` or `round_trip` is executing.

use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use log::{debug, info};
use wayland_client::{Connection, DispatchError, EventQueue, QueueHandle};

use crate::error::{LogoError, LogoResult};

/// Resolve an endpoint to a socket path
///
/// Absolute paths are taken as-is; anything else is a socket name under
/// `runtime_dir`.
pub fn resolve_endpoint(endpoint: &str, runtime_dir: Option<&Path>) -> LogoResult<PathBuf> {
    let endpoint_path = Path::new(endpoint);
    if endpoint_path.is_absolute() {
        return Ok(endpoint_path.to_path_buf());
    }

    match runtime_dir {
        Some(dir) => Ok(dir.join(endpoint)),
        None => Err(LogoError::EndpointNotFound {
            endpoint: endpoint.to_string(),
            reason: "XDG_RUNTIME_DIR is not set".to_string(),
        }),
    }
}

/// Event delivery seen from the event loop
///
/// Implemented by [`Transport`]; the loop and teardown only need these two
/// operations, so they can be driven by scripted events in tests.
pub trait Dispatcher<D> {
    /// Block until at least one event arrives, then dispatch everything queued
    fn dispatch_blocking(&mut self, state: &mut D) -> LogoResult<usize>;

    /// Push queued requests to the socket
    fn flush(&mut self) -> LogoResult<()>;
}

/// Connection plus the queue all proxies are created on
pub struct Transport<D> {
    conn: Connection,
    queue: EventQueue<D>,
}

impl<D: 'static> Transport<D> {
    /// Connect to `endpoint` (see [`resolve_endpoint`])
    pub fn connect(endpoint: &str) -> LogoResult<Self> {
        let runtime_dir = std::env::var_os("XDG_RUNTIME_DIR").map(PathBuf::from);
        let path = resolve_endpoint(endpoint, runtime_dir.as_deref())?;

        let stream = UnixStream::connect(&path).map_err(|e| LogoError::EndpointNotFound {
            endpoint: endpoint.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;

        let conn = Connection::from_socket(stream).map_err(|e| LogoError::EndpointNotFound {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        info!("Connected to wayland display {}", path.display());
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        let queue = conn.new_event_queue();
        Self { conn, queue }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn handle(&self) -> QueueHandle<D> {
        self.queue.handle()
    }

    /// Flush requests and wait until the server has processed all of them
    pub fn round_trip(&mut self, state: &mut D) -> LogoResult<usize> {
        Ok(self.queue.roundtrip(state)?)
    }

    /// Flush and close the connection; every proxy becomes inert
    pub fn disconnect(self) {
        if let Err(e) = self.conn.flush() {
            debug!("Flush on disconnect failed: {}", e);
        }
        drop(self.queue);
        drop(self.conn);
        info!("Disconnected from wayland display");
    }
}

impl<D: 'static> Dispatcher<D> for Transport<D> {
    fn dispatch_blocking(&mut self, state: &mut D) -> LogoResult<usize> {
        Ok(self.queue.blocking_dispatch(state)?)
    }

    fn flush(&mut self) -> LogoResult<()> {
        self.conn
            .flush()
            .map_err(|e| LogoError::Transport(DispatchError::Backend(e)))
    }
}
