//! Listening socket: bind, non-blocking accept.
//!
//! The listener is deliberately dumb.  It never waits — readiness is
//! the multiplexer's job — and it accepts at most one connection per
//! call, so the caller stays in control of pacing.

use crate::error::ServerError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::debug;

/// Accept queue depth requested from the kernel.
const ACCEPT_BACKLOG: i32 = 3;

/// A bound, listening, non-blocking TCP socket.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Binds the wildcard IPv4 address on `port`, sets the socket
    /// non-blocking, and starts listening with a small backlog.
    ///
    /// Pass port `0` to let the kernel pick one; [`Listener::local_addr`]
    /// reports the result.
    ///
    /// # Errors
    ///
    /// [`ServerError::Io`] if any of the socket syscalls fail.
    pub fn bind(port: u16) -> Result<Self, ServerError> {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| ServerError::io("socket", e))?;
        let address = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
        socket
            .bind(&address.into())
            .map_err(|e| ServerError::io("bind", e))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| ServerError::io("set_nonblocking", e))?;
        socket
            .listen(ACCEPT_BACKLOG)
            .map_err(|e| ServerError::io("listen", e))?;

        let inner: TcpListener = socket.into();
        debug!(port, "listener bound");
        Ok(Self { inner })
    }

    /// Performs one non-blocking accept and makes the new stream
    /// non-blocking as well.
    ///
    /// Call only after the listening descriptor reported readable; a
    /// `WouldBlock` here (e.g. the peer vanished between readiness and
    /// accept) surfaces as an ordinary [`ServerError::Io`].
    pub fn accept(&self) -> Result<(TcpStream, SocketAddr), ServerError> {
        let (stream, peer) = self
            .inner
            .accept()
            .map_err(|e| ServerError::io("accept", e))?;
        stream
            .set_nonblocking(true)
            .map_err(|e| ServerError::io("set_nonblocking", e))?;
        Ok((stream, peer))
    }

    /// The address the kernel actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.inner
            .local_addr()
            .map_err(|e| ServerError::io("getsockname", e))
    }
}

impl AsRawFd for Listener {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}
