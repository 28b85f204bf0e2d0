//! # hap-core
//!
//! Shared library for the accessory server containing the request-line
//! framer and the accessory metadata (TXT record) types.
//!
//! This crate is pure: it has zero dependencies on OS APIs or network
//! sockets, so everything in it can be unit-tested without opening a
//! single descriptor.
//!
//! # Overview
//!
//! The accessory server advertises itself over a discovery service and
//! accepts plain TCP connections from controllers.  This crate defines:
//!
//! - **`protocol`** – The request framer: extracts the method and path
//!   tokens from the first line of an inbound request buffer.  It is a
//!   tokenizer, not an HTTP parser — headers and bodies are someone
//!   else's problem.
//!
//! - **`domain`** – Accessory identity and the TXT metadata records
//!   (`c#`, `ff`, `id`, `md`, `pv`, `s#`, `sf`, `ci`) published
//!   alongside the discovery advertisement so controllers can find and
//!   classify the accessory before connecting.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `hap_core::RequestFrame` instead of the full path.
pub use domain::accessory::{AccessoryCategory, DeviceId, FeatureFlags, StatusFlags};
pub use domain::txt::TxtRecordSet;
pub use protocol::request::{parse_request_line, FrameError, RequestFrame};
