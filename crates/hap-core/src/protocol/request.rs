//! Request-line tokenizer.
//!
//! Extracts the method and path tokens from the first line of an
//! inbound request buffer:
//!
//! ```text
//! GET /accessories HTTP/1.1\r\n
//! ^~^ ^~~~~~~~~~~^ discarded
//! ```
//!
//! This is deliberately *not* an HTTP parser.  It scans for the first
//! space to delimit the method, the next space to delimit the path, and
//! discards the rest of the line (the protocol version is not
//! validated).  Headers and bodies are never touched.
//!
//! # Degradation policy
//!
//! The tokenizer never fails.  Malformed input degrades instead:
//!
//! - no space anywhere → the method token is the whole buffer and the
//!   path token is empty;
//! - buffer ends before a second space → the path token extends to the
//!   end of the buffer.
//!
//! Callers that need well-formed input must opt in via
//! [`RequestFrame::validated`], which rejects empty tokens.  Changing
//! the raw behaviour would change what reaches the dispatch layer, so
//! the lenient path is kept as-is.

use thiserror::Error;

/// Error returned by the strict validation layer.
///
/// The raw tokenizer itself never produces these; see
/// [`RequestFrame::validated`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The method token is empty (e.g. the buffer started with a space).
    #[error("request line has an empty method token")]
    EmptyMethod,

    /// The path token is empty (e.g. nothing followed the method).
    #[error("request line has an empty path token")]
    EmptyPath,
}

/// The method and path tokens of one request line.
///
/// Both slices borrow from the buffer passed to
/// [`parse_request_line`]; a frame is only valid for the duration of
/// the read that owns that buffer and cannot be retained past it — the
/// lifetime parameter enforces this at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFrame<'a> {
    /// Method token, e.g. `b"GET"`.  May be empty or the whole buffer
    /// on malformed input.
    pub method: &'a [u8],
    /// Path token, e.g. `b"/accessories"`.  May be empty on malformed
    /// input.
    pub path: &'a [u8],
}

impl<'a> RequestFrame<'a> {
    /// Strict validation layer over the lenient tokenizer.
    ///
    /// Returns the frame unchanged if both tokens are non-empty.
    ///
    /// # Errors
    ///
    /// [`FrameError::EmptyMethod`] or [`FrameError::EmptyPath`] if the
    /// corresponding token is empty.
    pub fn validated(self) -> Result<RequestFrame<'a>, FrameError> {
        if self.method.is_empty() {
            return Err(FrameError::EmptyMethod);
        }
        if self.path.is_empty() {
            return Err(FrameError::EmptyPath);
        }
        Ok(self)
    }
}

/// Tokenizes the request line at the start of `buffer`.
///
/// Never fails; see the module docs for the degradation policy on
/// malformed input.
///
/// # Examples
///
/// ```rust
/// use hap_core::protocol::request::parse_request_line;
///
/// let frame = parse_request_line(b"GET /accessories HTTP/1.1\r\n");
/// assert_eq!(frame.method, b"GET");
/// assert_eq!(frame.path, b"/accessories");
/// ```
pub fn parse_request_line(buffer: &[u8]) -> RequestFrame<'_> {
    let method_end = buffer
        .iter()
        .position(|&b| b == b' ')
        .unwrap_or(buffer.len());
    let method = &buffer[..method_end];

    // Skip the delimiting space, saturating at the end of the buffer
    // so a missing space yields an empty remainder rather than a panic.
    let rest = &buffer[(method_end + 1).min(buffer.len())..];
    let path_end = rest.iter().position(|&b| b == b' ').unwrap_or(rest.len());
    let path = &rest[..path_end];

    // Everything after the path up to the first CR or LF is the
    // protocol version.  It is discarded, not validated.

    RequestFrame { method, path }
}
