//! Events Module
//!
//! Outcome of a dispatched event and the sink for asynchronous protocol
//! errors.

use tracing::error;
use x11rb::x11_utils::X11Error;

/// Result of event handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Keep reading events
    Continue,
    /// User asked the window manager to exit
    Shutdown,
}

/// Receives errors the server reports for earlier unchecked requests
pub trait ProtocolErrorHandler {
    fn report(&self, error: &X11Error);
}

/// Logs protocol errors and otherwise ignores them
#[derive(Debug, Default)]
pub struct LogProtocolErrors;

impl ProtocolErrorHandler for LogProtocolErrors {
    fn report(&self, err: &X11Error) {
        error!(
            "X11 error: {:?} in {} (resource 0x{:x}, sequence {})",
            err.error_kind,
            err.request_name.unwrap_or("unknown request"),
            err.bad_value,
            err.sequence
        );
    }
}
