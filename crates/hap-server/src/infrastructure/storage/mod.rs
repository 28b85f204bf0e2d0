//! Storage infrastructure: configuration file access.
//!
//! A thin adapter between the server and the file system.  Keeping it
//! here means the file format can change without touching the network
//! code.

pub mod config;
