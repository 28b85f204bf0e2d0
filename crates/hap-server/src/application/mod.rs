//! Application layer seams.
//!
//! The network front-end does not interpret the accessory protocol; it
//! frames requests and hands them across the [`handler`] boundary.
//! Everything protocol-specific (pairing, sessions, characteristics)
//! plugs in behind that trait without touching the socket code.

pub mod handler;

pub use handler::{LoggingHandler, ProtocolHandler};
