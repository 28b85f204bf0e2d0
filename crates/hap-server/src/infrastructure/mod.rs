//! Infrastructure layer: OS-facing adapters.
//!
//! Contains the socket plumbing (`network`) and configuration storage
//! (`storage`).  The application layer depends on abstractions only;
//! this layer provides the concrete pieces.

pub mod network;
pub mod storage;
