//! hap-server library entry point.
//!
//! Re-exports the module tree so integration tests in `tests/` and the
//! binary entry point in `main.rs` share it.

pub mod application;
pub mod error;
pub mod infrastructure;

pub use error::ServerError;
pub use infrastructure::network::AccessoryServer;
