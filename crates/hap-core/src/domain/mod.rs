//! Accessory domain types: identity, classification flags, and the TXT
//! metadata records published with the discovery advertisement.
//!
//! Everything here is pure data — no sockets, no OS calls — so the
//! server crate can build and test its advertisement payload without
//! touching the network.

pub mod accessory;
pub mod txt;
