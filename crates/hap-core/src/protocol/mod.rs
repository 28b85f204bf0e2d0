//! Protocol module containing the request-line framer.

pub mod request;

pub use request::{parse_request_line, FrameError, RequestFrame};
