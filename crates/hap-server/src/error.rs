//! Error taxonomy for the network front-end.
//!
//! One enum covers every component of the server loop so the caller can
//! apply a single policy:
//!
//! - [`ServerError::Timeout`] is the steady-state outcome of every poll
//!   step.  It is expected, frequent, and must never be logged as a
//!   failure.
//! - [`ServerError::RegistryCorrupted`] is a programming-error class
//!   failure.  It aborts the current step and should stop the server
//!   loop entirely rather than retry into a known-corrupt state.
//! - Everything else is logged and the loop continues.

use crate::infrastructure::network::discovery::DiscoveryError;
use std::io;
use thiserror::Error;

/// Errors produced by the listener, registry, multiplexer, and server
/// loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `listen` was called while the server already holds a listening
    /// descriptor.
    #[error("server is already listening")]
    AlreadyListening,

    /// A lifecycle operation requiring a listening descriptor was
    /// called before `listen` (or after `stop`).
    #[error("server is not listening")]
    NotListening,

    /// The connection registry and its callers disagree about which
    /// descriptors exist.  Fatal: the current step is aborted and the
    /// loop must not continue.
    #[error("connection registry corrupted: {0}")]
    RegistryCorrupted(&'static str),

    /// The connection table is at its configured capacity.
    #[error("connection table full ({0} open connections)")]
    ResourceExhausted(usize),

    /// No descriptor became readable within the poll window.  The
    /// normal, silent outcome of a step.
    #[error("no descriptor became readable within the poll window")]
    Timeout,

    /// A socket syscall failed.
    #[error("{op} failed")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// The discovery service rejected an advertisement operation.
    /// Fatal to the `listen`/`stop` call that triggered it.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

impl ServerError {
    pub(crate) fn io(op: &'static str, source: io::Error) -> Self {
        ServerError::Io { op, source }
    }

    /// Whether this is the expected nothing-was-ready outcome.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ServerError::Timeout)
    }

    /// Whether the server loop must stop instead of retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServerError::RegistryCorrupted(_))
    }
}
