//! The accessory server: listening lifecycle and the cooperative
//! accept/process loop.
//!
//! The server owns the listening socket, the connection registry, and
//! the multiplexer, and exposes exactly two step functions.  It never
//! spawns a thread or blocks beyond the poll interval: an external
//! scheduler calls [`AccessoryServer::accept_step`] and
//! [`AccessoryServer::process_step`] in a loop, and the short
//! readiness wait inside each step doubles as the loop's yield point.
//!
//! ```text
//! caller loop
//!  ├─ accept_step()   wait on listening fd ─► accept ─► registry.insert
//!  └─ process_step()  idle sweep ─► wait on connection fds
//!                       ─► read ─► frame ─► handler   (per ready fd)
//!                       ─► on failure: close + remove (that fd only)
//! ```
//!
//! Error policy per step: `Timeout` is the steady state and silent;
//! per-connection read failures evict that connection and the step
//! continues; registry corruption aborts the step and is fatal to the
//! whole loop.

use crate::application::handler::ProtocolHandler;
use crate::error::ServerError;
use crate::infrastructure::network::discovery::DiscoveryService;
use crate::infrastructure::network::listener::Listener;
use crate::infrastructure::network::multiplexer::Multiplexer;
use crate::infrastructure::network::registry::ConnectionRegistry;
use crate::infrastructure::storage::config::AppConfig;
use hap_core::protocol::request::parse_request_line;
use hap_core::TxtRecordSet;
use std::io::{self, Read};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Service type advertised through the discovery service.
const SERVICE_TYPE: &str = "_hap";
/// Transport protocol label of the advertisement.
const SERVICE_PROTOCOL: &str = "_tcp";

/// Per-read buffer size.  A request line longer than this is truncated
/// at the read boundary; the framer degrades accordingly.
const READ_BUFFER_SIZE: usize = 255;

/// The network front-end of the accessory server.
pub struct AccessoryServer {
    listener: Option<Listener>,
    registry: ConnectionRegistry,
    multiplexer: Multiplexer,
    discovery: Box<dyn DiscoveryService>,
    handler: Box<dyn ProtocolHandler>,
    txt: TxtRecordSet,
    instance_name: String,
    poll_interval: Duration,
    idle_timeout: Duration,
}

impl AccessoryServer {
    /// Creates an uninitialized server.  Nothing is bound and nothing
    /// is advertised until [`AccessoryServer::listen`].
    ///
    /// # Errors
    ///
    /// [`ServerError::Io`] if the multiplexer cannot be created.
    pub fn new(
        config: &AppConfig,
        discovery: Box<dyn DiscoveryService>,
        handler: Box<dyn ProtocolHandler>,
    ) -> Result<Self, ServerError> {
        Ok(Self {
            listener: None,
            registry: ConnectionRegistry::new(config.server.max_connections),
            multiplexer: Multiplexer::new()?,
            discovery,
            handler,
            txt: config.txt_records(),
            instance_name: config.server.instance_name.clone(),
            poll_interval: config.timing.poll_interval(),
            idle_timeout: config.timing.idle_timeout(),
        })
    }

    /// Binds `port` and publishes the discovery advertisement (service
    /// registration, TXT records, instance name).
    ///
    /// # Errors
    ///
    /// [`ServerError::AlreadyListening`] if a listening descriptor
    /// already exists — prior state is left unchanged.  A bind or
    /// discovery failure leaves the server in the not-listening state
    /// (the partially set up socket is closed on the way out).
    pub fn listen(&mut self, port: u16) -> Result<(), ServerError> {
        if self.listener.is_some() {
            return Err(ServerError::AlreadyListening);
        }

        let listener = Listener::bind(port)?;
        let bound_port = listener.local_addr()?.port();

        self.discovery
            .register_service(SERVICE_TYPE, SERVICE_PROTOCOL, bound_port)?;
        self.discovery
            .set_txt_records(SERVICE_TYPE, SERVICE_PROTOCOL, &self.txt.pairs())?;
        self.discovery.set_instance_name(&self.instance_name)?;

        self.listener = Some(listener);
        info!(port = bound_port, "accessory server listening");
        Ok(())
    }

    /// Withdraws the discovery advertisement and closes the listening
    /// descriptor.  Open connections are left alone; dropping the
    /// server closes them.
    ///
    /// # Errors
    ///
    /// [`ServerError::NotListening`] if the server was never bound.  A
    /// discovery failure aborts the call with the listener still open.
    pub fn stop(&mut self) -> Result<(), ServerError> {
        if self.listener.is_none() {
            return Err(ServerError::NotListening);
        }
        self.discovery
            .unregister_service(SERVICE_TYPE, SERVICE_PROTOCOL)?;
        self.listener = None;
        info!("accessory server stopped");
        Ok(())
    }

    /// The port actually bound, while listening.
    pub fn local_port(&self) -> Option<u16> {
        self.listener
            .as_ref()
            .and_then(|l| l.local_addr().ok())
            .map(|addr| addr.port())
    }

    /// Number of currently open connections.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// One accept step: waits up to the poll interval for the
    /// listening descriptor, then accepts a single connection and
    /// registers it with a fresh activity timestamp.
    ///
    /// # Errors
    ///
    /// [`ServerError::Timeout`] if no connection arrived in the window
    /// (the steady-state, non-error case);
    /// [`ServerError::NotListening`] before `listen`;
    /// [`ServerError::ResourceExhausted`] if the registry is full (the
    /// accepted socket is closed);
    /// [`ServerError::Io`] if the wait or accept syscall fails.
    pub fn accept_step(&mut self) -> Result<RawFd, ServerError> {
        let listening_fd = self
            .listener
            .as_ref()
            .ok_or(ServerError::NotListening)?
            .as_raw_fd();

        self.multiplexer
            .wait_readable(&[listening_fd], self.poll_interval)?;

        let (stream, peer) = self
            .listener
            .as_ref()
            .ok_or(ServerError::NotListening)?
            .accept()?;
        let descriptor = self.registry.insert(stream, Instant::now())?;
        info!(descriptor, peer = %peer, "accepted new connection");
        Ok(descriptor)
    }

    /// One process step: evict idle connections, wait up to the poll
    /// interval for readable ones, then read+frame+dispatch each and
    /// evict any that fail.
    ///
    /// Eviction happens before the readiness wait, so an
    /// already-expired connection is never waited on.  Both sweeps
    /// traverse a snapshot of the registry keys, which is what makes
    /// removal during the sweep safe.
    ///
    /// # Errors
    ///
    /// [`ServerError::Timeout`] if no connection was readable (steady
    /// state); [`ServerError::NotListening`] before `listen`; fatal
    /// [`ServerError::RegistryCorrupted`] aborts the step immediately.
    pub fn process_step(&mut self) -> Result<(), ServerError> {
        if self.listener.is_none() {
            return Err(ServerError::NotListening);
        }

        let now = Instant::now();

        for descriptor in self.registry.descriptors() {
            let Some(last_activity) = self.registry.last_activity(descriptor) else {
                continue;
            };
            if now.saturating_duration_since(last_activity) > self.idle_timeout {
                info!(descriptor, "closing idle connection");
                self.remove_connection(descriptor)?;
            }
        }

        let candidates = self.registry.descriptors();
        // An empty candidate set comes back as an empty ready set
        // without any wait; the step then reports success.
        let ready = self
            .multiplexer
            .wait_readable(&candidates, self.poll_interval)?;

        for descriptor in ready {
            if let Err(e) = self.service_connection(descriptor, now) {
                if e.is_fatal() {
                    return Err(e);
                }
                info!(descriptor, error = %e, "closing connection after failed read");
                self.remove_connection(descriptor)?;
            }
        }

        Ok(())
    }

    /// Reads once from a ready connection and dispatches the framed
    /// request.  The idle clock is reset *before* the read, so even a
    /// read that fails counts as activity.
    fn service_connection(&mut self, descriptor: RawFd, now: Instant) -> Result<(), ServerError> {
        self.registry.touch(descriptor, now)?;

        let mut buffer = [0u8; READ_BUFFER_SIZE];
        let stream = self.registry.stream_mut(descriptor)?;
        let read = stream
            .read(&mut buffer)
            .map_err(|e| ServerError::io("read", e))?;
        if read == 0 {
            // Peer closed; treated the same as a failed read.
            return Err(ServerError::io(
                "read",
                io::Error::new(io::ErrorKind::UnexpectedEof, "peer closed the connection"),
            ));
        }

        let frame = parse_request_line(&buffer[..read]);
        self.handler
            .handle_request(frame.method, frame.path, descriptor);
        Ok(())
    }

    /// Close-and-remove with the step's error policy applied: registry
    /// corruption propagates (fatal), a failed close syscall is logged
    /// and swallowed (the entry is already detached, nothing leaked).
    fn remove_connection(&mut self, descriptor: RawFd) -> Result<(), ServerError> {
        match self.registry.remove(descriptor) {
            Ok(()) => Ok(()),
            Err(e @ ServerError::RegistryCorrupted(_)) => Err(e),
            Err(e) => {
                warn!(descriptor, error = %e, "close failed; connection detached anyway");
                Ok(())
            }
        }
    }
}
