//! Protocol-handler seam between the network front-end and the
//! accessory protocol.
//!
//! The server loop frames a request well enough to name it — method,
//! path, originating descriptor — and hands it off here.  Pairing,
//! session encryption, and characteristic semantics all live behind
//! this trait, outside this crate.

use mockall::automock;
use std::os::unix::io::RawFd;
use tracing::info;

/// Receives one framed request per successful read.
///
/// `method` and `path` borrow the read buffer and are only valid for
/// the duration of the call; an implementation that needs to keep them
/// must copy.  Either token may be empty — the framer degrades rather
/// than fails on malformed input, and it is the handler's choice
/// whether to validate (see `RequestFrame::validated` in `hap-core`).
#[automock]
pub trait ProtocolHandler {
    fn handle_request(&mut self, method: &[u8], path: &[u8], descriptor: RawFd);
}

/// Handler that only logs the framed request.
///
/// This is the whole of the observed dispatch behavior; real request
/// handling replaces this implementation.
#[derive(Debug, Default)]
pub struct LoggingHandler;

impl ProtocolHandler for LoggingHandler {
    fn handle_request(&mut self, method: &[u8], path: &[u8], descriptor: RawFd) {
        info!(
            descriptor,
            method = %String::from_utf8_lossy(method),
            path = %String::from_utf8_lossy(path),
            "request"
        );
    }
}
