//! Readiness multiplexing: bounded wait for readable descriptors.
//!
//! Each call builds the interest set from scratch, waits once, and
//! tears the set down again.  That matches how the server loop uses it
//! (the candidate set changes every step as connections come and go)
//! and keeps the poller free of stale registrations.

use crate::error::ServerError;
use polling::{Event, Poller};
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Waits on a set of descriptors for any to become readable within a
/// bounded time.
pub struct Multiplexer {
    poller: Poller,
}

impl Multiplexer {
    pub fn new() -> Result<Self, ServerError> {
        Poller::new()
            .map(|poller| Self { poller })
            .map_err(|e| ServerError::io("poller", e))
    }

    /// Returns the subset of `descriptors` that became readable within
    /// `timeout`.
    ///
    /// An empty candidate set short-circuits to `Ok(empty)` without
    /// touching the poller at all.
    ///
    /// # Errors
    ///
    /// [`ServerError::Timeout`] if no descriptor became readable in the
    /// window (the steady-state outcome), [`ServerError::Io`] if
    /// registration or the wait itself fails.
    pub fn wait_readable(
        &self,
        descriptors: &[RawFd],
        timeout: Duration,
    ) -> Result<Vec<RawFd>, ServerError> {
        if descriptors.is_empty() {
            return Ok(Vec::new());
        }

        let mut added = 0;
        let result = (|| {
            for &fd in descriptors {
                self.poller
                    .add(fd, Event::readable(fd as usize))
                    .map_err(|e| ServerError::io("poll add", e))?;
                added += 1;
            }

            let mut events = Vec::with_capacity(descriptors.len());
            let count = self
                .poller
                .wait(&mut events, Some(timeout))
                .map_err(|e| ServerError::io("poll wait", e))?;
            if count == 0 {
                return Err(ServerError::Timeout);
            }

            Ok(events
                .into_iter()
                .filter(|event| event.readable)
                .map(|event| event.key as RawFd)
                .collect())
        })();

        // Deregister everything that made it in, including on the
        // error paths, so the next call starts from a clean poller.
        for &fd in &descriptors[..added] {
            let _ = self.poller.delete(fd);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::{TcpListener, TcpStream};
    use std::os::unix::io::AsRawFd;
    use std::time::Instant;

    const TEST_TIMEOUT: Duration = Duration::from_millis(200);

    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    #[test]
    fn test_empty_candidate_set_short_circuits() {
        let mux = Multiplexer::new().unwrap();
        let start = Instant::now();
        let ready = mux.wait_readable(&[], Duration::from_secs(10)).unwrap();
        assert!(ready.is_empty());
        // No syscall means no wait: far below the requested timeout.
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_no_data_yields_timeout() {
        let mux = Multiplexer::new().unwrap();
        let (_client, server) = tcp_pair();
        let result = mux.wait_readable(&[server.as_raw_fd()], Duration::from_micros(250));
        assert!(matches!(result, Err(ServerError::Timeout)));
    }

    #[test]
    fn test_readable_descriptor_is_reported() {
        let mux = Multiplexer::new().unwrap();
        let (mut client, server) = tcp_pair();
        client.write_all(b"ping").unwrap();

        let ready = mux
            .wait_readable(&[server.as_raw_fd()], TEST_TIMEOUT)
            .unwrap();
        assert_eq!(ready, vec![server.as_raw_fd()]);
    }

    #[test]
    fn test_only_readable_subset_is_reported() {
        let mux = Multiplexer::new().unwrap();
        let (mut client_a, server_a) = tcp_pair();
        let (_client_b, server_b) = tcp_pair();
        client_a.write_all(b"ping").unwrap();

        let ready = mux
            .wait_readable(&[server_a.as_raw_fd(), server_b.as_raw_fd()], TEST_TIMEOUT)
            .unwrap();
        assert_eq!(ready, vec![server_a.as_raw_fd()]);
    }

    #[test]
    fn test_peer_close_is_reported_as_readable() {
        let mux = Multiplexer::new().unwrap();
        let (client, server) = tcp_pair();
        drop(client);

        let ready = mux
            .wait_readable(&[server.as_raw_fd()], TEST_TIMEOUT)
            .unwrap();
        assert_eq!(ready, vec![server.as_raw_fd()]);
    }

    #[test]
    fn test_poller_is_reusable_across_calls() {
        let mux = Multiplexer::new().unwrap();
        let (mut client, server) = tcp_pair();

        let result = mux.wait_readable(&[server.as_raw_fd()], Duration::from_micros(250));
        assert!(matches!(result, Err(ServerError::Timeout)));

        client.write_all(b"ping").unwrap();
        let ready = mux
            .wait_readable(&[server.as_raw_fd()], TEST_TIMEOUT)
            .unwrap();
        assert_eq!(ready, vec![server.as_raw_fd()]);
    }
}
