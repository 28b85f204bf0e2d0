//! Network infrastructure: everything that touches a socket.
//!
//! # Sub-modules
//!
//! - **`listener`** – The bound, listening, non-blocking socket and its
//!   single-shot accept.
//!
//! - **`registry`** – Ownership of every open connection, keyed by
//!   descriptor, with the removal-safe traversal the eviction sweeps
//!   depend on.
//!
//! - **`multiplexer`** – Bounded readiness wait over an arbitrary set
//!   of descriptors.
//!
//! - **`discovery`** – The advertisement interface to the platform's
//!   discovery daemon, plus a log-only stand-in and a test mock.
//!
//! - **`server`** – Ties the above together into the two-step
//!   cooperative server loop.

pub mod discovery;
pub mod listener;
pub mod multiplexer;
pub mod registry;
pub mod server;

pub use server::AccessoryServer;
