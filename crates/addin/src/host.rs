//! The callback-style API offered by an add-in host.

use serde_json::Value;

/// Called with the raw response body when the host completes a command.
pub type SuccessCallback = Box<dyn FnOnce(Value) + Send + 'static>;

/// Called with the host's failure text.
pub type ErrorCallback = Box<dyn FnOnce(String) + Send + 'static>;

/// A host-provided bridge to the KKM Server that does not travel over HTTP.
///
/// Implementations hand the encoded command to the host and arrange for one
/// of the two callbacks to be invoked later, possibly from another thread.
/// Implementations must not block the caller while the device works.
///
/// Hosts that misbehave are tolerated by the executor: a second callback is
/// ignored, and a host that never calls back runs into the call deadline.
pub trait AddInHost: Send + Sync {
    /// Submits `command` (the JSON object sent as-is to the server).
    fn execute(&self, command: Value, on_success: SuccessCallback, on_error: ErrorCallback);
}
