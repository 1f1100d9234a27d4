//! Request deadline computation.

use std::time::Duration;

use crate::Command;

/// Deadline applied when the caller does not pass one.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Device timeouts at or below this many seconds fit inside the caller's
/// deadline and are ignored.
const DEVICE_TIMEOUT_THRESHOLD_SECS: u64 = 60;

/// Slack added on top of the device timeout so the server can answer before
/// the client gives up.
const DEVICE_TIMEOUT_SLACK_SECS: u64 = 20;

/// Returns the deadline for one transport call.
///
/// A command that asks the device for more than 60 seconds (`Timeout`) gets
/// `Timeout + 20` seconds, unless the caller already allows more. Any other
/// command uses `caller`.
pub fn effective_timeout(command: &Command, caller: Duration) -> Duration {
    match command.timeout_secs {
        Some(secs) if secs > DEVICE_TIMEOUT_THRESHOLD_SECS => {
            let device = Duration::from_secs(secs.saturating_add(DEVICE_TIMEOUT_SLACK_SECS));
            caller.max(device)
        }
        _ => caller,
    }
}
