//! Connection registry: every open connection, keyed by descriptor.
//!
//! The registry is the sole owner of each accepted [`TcpStream`]; the
//! rest of the server refers to connections only by raw descriptor and
//! borrows the stream for at most one read.
//!
//! # Removal during traversal
//!
//! The server loop removes connections *while sweeping them* (idle
//! eviction, read-failure eviction).  Traversal therefore happens over
//! a snapshot of the keys ([`ConnectionRegistry::descriptors`]) while
//! removal mutates the backing map — removing the entry under the
//! cursor can neither skip its neighbor nor leave the structure
//! malformed.  This is the central correctness property of the
//! component; see the tests at the bottom.
//!
//! # Removal and closure are atomic
//!
//! [`ConnectionRegistry::remove`] detaches the entry and shuts the
//! socket down in the same call.  There is no window in which a closed
//! descriptor remains registered, nor one in which a registered
//! descriptor has already been closed: nobody else ever closes a
//! registered stream.

use crate::error::ServerError;
use std::collections::HashMap;
use std::net::{Shutdown, TcpStream};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Instant;

/// One open connection: the owned stream and its idle clock.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    last_activity: Instant,
}

impl Connection {
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }
}

/// Unordered collection of open connections, keyed by descriptor.
///
/// Iteration order carries no meaning; descriptor identity does.  The
/// kernel never reuses a descriptor value while the stream owning it is
/// alive, so a key uniquely names a connection for its whole lifetime.
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: HashMap<RawFd, Connection>,
    capacity: usize,
}

impl ConnectionRegistry {
    /// Creates a registry that will hold at most `capacity` connections.
    pub fn new(capacity: usize) -> Self {
        Self {
            connections: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn contains(&self, descriptor: RawFd) -> bool {
        self.connections.contains_key(&descriptor)
    }

    /// Takes ownership of `stream` and registers it with `now` as its
    /// initial activity timestamp.  Returns the descriptor that now
    /// identifies the connection.
    ///
    /// On a capacity error the stream is dropped (closed) here, so the
    /// caller never holds a socket the registry refused.
    ///
    /// # Errors
    ///
    /// [`ServerError::ResourceExhausted`] at capacity;
    /// [`ServerError::RegistryCorrupted`] if the descriptor is somehow
    /// already present (the kernel handed out a descriptor we believe
    /// is still open — not recoverable).
    pub fn insert(&mut self, stream: TcpStream, now: Instant) -> Result<RawFd, ServerError> {
        if self.connections.len() >= self.capacity {
            return Err(ServerError::ResourceExhausted(self.capacity));
        }
        let descriptor = stream.as_raw_fd();
        if self.connections.contains_key(&descriptor) {
            return Err(ServerError::RegistryCorrupted(
                "descriptor already registered",
            ));
        }
        self.connections.insert(
            descriptor,
            Connection {
                stream,
                last_activity: now,
            },
        );
        Ok(descriptor)
    }

    /// Snapshot of the registered descriptors, for removal-safe
    /// traversal.
    pub fn descriptors(&self) -> Vec<RawFd> {
        self.connections.keys().copied().collect()
    }

    /// Resets the idle clock of `descriptor` to `now`.
    ///
    /// # Errors
    ///
    /// [`ServerError::RegistryCorrupted`] if the descriptor is not
    /// registered.
    pub fn touch(&mut self, descriptor: RawFd, now: Instant) -> Result<(), ServerError> {
        let connection = self
            .connections
            .get_mut(&descriptor)
            .ok_or(ServerError::RegistryCorrupted("touch of unknown descriptor"))?;
        connection.last_activity = now;
        Ok(())
    }

    pub fn last_activity(&self, descriptor: RawFd) -> Option<Instant> {
        self.connections.get(&descriptor).map(|c| c.last_activity)
    }

    /// Borrows the stream of `descriptor` for a single read.
    ///
    /// # Errors
    ///
    /// [`ServerError::RegistryCorrupted`] if the descriptor is not
    /// registered.
    pub fn stream_mut(&mut self, descriptor: RawFd) -> Result<&mut TcpStream, ServerError> {
        self.connections
            .get_mut(&descriptor)
            .map(|c| &mut c.stream)
            .ok_or(ServerError::RegistryCorrupted("read of unknown descriptor"))
    }

    /// Closes `descriptor` and detaches it from the registry.
    ///
    /// The entry is detached unconditionally — a failing shutdown
    /// syscall is reported, but the connection is never leaked and the
    /// descriptor is closed exactly once (by dropping the owned
    /// stream).
    ///
    /// # Errors
    ///
    /// [`ServerError::RegistryCorrupted`] if the descriptor is not
    /// registered (a double remove is a programming error, not a
    /// recoverable condition); [`ServerError::Io`] if the shutdown
    /// syscall failed, *after* the entry is already detached.
    pub fn remove(&mut self, descriptor: RawFd) -> Result<(), ServerError> {
        let connection = self.connections.remove(&descriptor).ok_or(
            ServerError::RegistryCorrupted("remove of unknown descriptor"),
        )?;
        let shutdown = connection.stream.shutdown(Shutdown::Both);
        drop(connection);
        match shutdown {
            // The peer may already have torn the connection down;
            // that is not a failure to close.
            Err(e) if e.kind() != std::io::ErrorKind::NotConnected => {
                Err(ServerError::io("shutdown", e))
            }
            _ => Ok(()),
        }
    }
}

// Dropping the registry drops every owned stream, closing any
// still-open connection.

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::{ErrorKind, Read};
    use std::net::TcpListener;
    use std::time::Duration;

    /// A loopback connection pair.  The client end is returned so tests
    /// control peer-side behavior (and so it is not closed early).
    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    fn registry_with(n: usize) -> (ConnectionRegistry, Vec<TcpStream>, Vec<RawFd>) {
        let mut registry = ConnectionRegistry::new(16);
        let mut clients = Vec::new();
        let mut descriptors = Vec::new();
        for _ in 0..n {
            let (client, server) = tcp_pair();
            descriptors.push(registry.insert(server, Instant::now()).unwrap());
            clients.push(client);
        }
        (registry, clients, descriptors)
    }

    #[test]
    fn test_insert_keys_by_descriptor() {
        let (registry, _clients, descriptors) = registry_with(3);
        assert_eq!(registry.len(), 3);
        for fd in descriptors {
            assert!(registry.contains(fd));
        }
    }

    #[test]
    fn test_insert_beyond_capacity_is_resource_exhausted() {
        let mut registry = ConnectionRegistry::new(1);
        let (_c1, s1) = tcp_pair();
        let (_c2, s2) = tcp_pair();
        registry.insert(s1, Instant::now()).unwrap();
        let result = registry.insert(s2, Instant::now());
        assert!(matches!(result, Err(ServerError::ResourceExhausted(1))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_mid_traversal_visits_others_exactly_once() {
        // A, B, C registered; removing B while sweeping must still
        // visit A and C exactly once, and leave exactly {A, C}.
        let (mut registry, _clients, descriptors) = registry_with(3);
        let victim = descriptors[1];

        let mut visited = Vec::new();
        for fd in registry.descriptors() {
            visited.push(fd);
            if fd == victim {
                registry.remove(fd).unwrap();
            }
        }

        assert_eq!(visited.len(), 3, "every element visited exactly once");
        assert_eq!(
            visited.iter().collect::<HashSet<_>>().len(),
            3,
            "no element visited twice"
        );
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(victim));
        for &fd in &descriptors {
            if fd != victim {
                assert!(registry.contains(fd));
            }
        }
    }

    #[test]
    fn test_remove_every_position_during_traversal() {
        // Removing the first-, middle-, or last-visited element must
        // never disturb the others' visitation.
        for victim_position in 0..3 {
            let (mut registry, _clients, _descriptors) = registry_with(3);

            let snapshot = registry.descriptors();
            let victim = snapshot[victim_position];
            let mut visited = Vec::new();
            for fd in snapshot {
                visited.push(fd);
                if fd == victim {
                    registry.remove(fd).unwrap();
                }
            }

            assert_eq!(visited.len(), 3);
            assert_eq!(registry.len(), 2);
            assert!(!registry.contains(victim));
        }
    }

    #[test]
    fn test_batched_removals_over_repeated_traversals() {
        // 12 connections, then several removal sweeps with no inserts
        // in between (the kernel may reuse a closed descriptor number
        // for a *new* socket, so reuse-free bookkeeping only holds
        // within a batch — exactly how the server loop uses it).
        let (mut registry, _clients, _descriptors) = registry_with(12);
        let mut removed = HashSet::new();
        let mut expected_len = registry.len();

        for stride in [3, 2] {
            for (i, fd) in registry.descriptors().into_iter().enumerate() {
                assert!(!removed.contains(&fd), "removed descriptor re-visited");
                if i % stride == 0 {
                    registry.remove(fd).unwrap();
                    assert!(removed.insert(fd), "descriptor {fd} removed twice");
                    expected_len -= 1;
                }
            }
            // Size after a batch equals insertions minus removals.
            assert_eq!(registry.len(), expected_len);
        }

        for fd in registry.descriptors() {
            assert!(!removed.contains(&fd));
        }
    }

    #[test]
    fn test_remove_unknown_descriptor_is_registry_corruption() {
        let (mut registry, _clients, descriptors) = registry_with(1);
        registry.remove(descriptors[0]).unwrap();
        let result = registry.remove(descriptors[0]);
        assert!(matches!(result, Err(ServerError::RegistryCorrupted(_))));
        assert!(result.unwrap_err().is_fatal());
    }

    #[test]
    fn test_remove_shuts_the_peer_side_down() {
        let (mut registry, mut clients, descriptors) = registry_with(1);
        registry.remove(descriptors[0]).unwrap();

        // The peer observes EOF once the registry side is closed.
        let client = &mut clients[0];
        client
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let mut buf = [0u8; 1];
        match client.read(&mut buf) {
            Ok(0) => {}
            Ok(n) => panic!("expected EOF, read {n} bytes"),
            Err(e) if e.kind() == ErrorKind::ConnectionReset => {}
            Err(e) => panic!("expected EOF or reset, got {e:?}"),
        }
    }

    #[test]
    fn test_touch_resets_the_idle_clock() {
        let (mut registry, _clients, descriptors) = registry_with(1);
        let fd = descriptors[0];
        let old = registry.last_activity(fd).unwrap();
        let later = old + Duration::from_secs(5);
        registry.touch(fd, later).unwrap();
        assert_eq!(registry.last_activity(fd), Some(later));
    }

    #[test]
    fn test_touch_unknown_descriptor_is_registry_corruption() {
        let mut registry = ConnectionRegistry::new(4);
        let result = registry.touch(12345, Instant::now());
        assert!(matches!(result, Err(ServerError::RegistryCorrupted(_))));
    }
}
