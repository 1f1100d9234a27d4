//! Status Classifier: maps the numeric `Status` field of a device-server
//! response to a semantic outcome and a human-readable description.
//!
//! The mapping is pure. The polling engine branches on [`KkmStatus`]; callers
//! use [`status_text`] for display.

use serde::{Deserialize, Serialize};

/// The five status codes defined by the KKM Server protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum KkmStatus {
    /// `0`: the command finished without errors.
    Ok,
    /// `1`: the command was started but has not finished yet.
    Run,
    /// `2`: the command finished with an error; see the response `Error` field.
    Error,
    /// `3`: no previously started command carries the queried identifier.
    NotFound,
    /// `4`: the command is queued and waits for the device to become ready.
    NotRun,
}

impl KkmStatus {
    /// Returns the status for a raw wire code, or `None` if the code is not
    /// part of the protocol.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::Run),
            2 => Some(Self::Error),
            3 => Some(Self::NotFound),
            4 => Some(Self::NotRun),
            _ => None,
        }
    }

    /// Returns the raw wire code.
    pub fn code(self) -> i64 {
        match self {
            Self::Ok => 0,
            Self::Run => 1,
            Self::Error => 2,
            Self::NotFound => 3,
            Self::NotRun => 4,
        }
    }

    /// Returns the semantic outcome this status represents.
    pub fn outcome(self) -> StatusOutcome {
        match self {
            Self::Ok => StatusOutcome::DoneOk,
            Self::Error => StatusOutcome::DoneError,
            Self::Run => StatusOutcome::Running,
            Self::NotRun => StatusOutcome::NotYetRun,
            Self::NotFound => StatusOutcome::NotFound,
        }
    }

    /// Returns `true` for statuses after which the device will not change
    /// the command's result any more (`Ok` and `Error`).
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Ok | Self::Error)
    }

    /// Returns `true` for statuses that require tracking the command by its
    /// identifier (`Run` and `NotRun`).
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Run | Self::NotRun)
    }

    /// Human-readable description of this status.
    pub fn text(self) -> &'static str {
        match self {
            Self::Ok => "done, success",
            Self::Run => "in progress",
            Self::Error => "done, failed",
            Self::NotFound => "unknown command id",
            Self::NotRun => "queued, not yet started",
        }
    }
}

impl std::fmt::Display for KkmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

impl TryFrom<i64> for KkmStatus {
    type Error = UnknownStatus;

    fn try_from(code: i64) -> Result<Self, UnknownStatus> {
        Self::from_code(code).ok_or(UnknownStatus(code))
    }
}

impl From<KkmStatus> for i64 {
    fn from(status: KkmStatus) -> Self {
        status.code()
    }
}

/// A status code outside the protocol's value domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub i64);

/// Semantic outcome of a status code, independent of its wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusOutcome {
    /// Finished successfully.
    DoneOk,
    /// Finished with a device-reported error.
    DoneError,
    /// Executing on the device.
    Running,
    /// Accepted but not started yet.
    NotYetRun,
    /// The server does not know the command identifier.
    NotFound,
    /// The code is outside the protocol's value domain.
    Unknown(i64),
}

/// Classifies a raw status code.
pub fn classify(code: i64) -> StatusOutcome {
    KkmStatus::from_code(code).map_or(StatusOutcome::Unknown(code), KkmStatus::outcome)
}

/// Human-readable text for a raw status code.
///
/// Codes outside the protocol produce `"unknown status: <code>"`.
pub fn status_text(code: i64) -> String {
    match KkmStatus::from_code(code) {
        Some(status) => status.text().to_string(),
        None => UnknownStatus(code).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_codes_map_to_documented_text() {
        assert_eq!(status_text(0), "done, success");
        assert_eq!(status_text(1), "in progress");
        assert_eq!(status_text(2), "done, failed");
        assert_eq!(status_text(3), "unknown command id");
        assert_eq!(status_text(4), "queued, not yet started");
    }

    #[test]
    fn unrecognised_code_text_contains_the_code() {
        let text = status_text(17);
        assert!(text.contains("unknown status"), "{text}");
        assert!(text.contains("17"), "{text}");
        assert!(status_text(-1).contains("-1"));
    }

    #[test]
    fn classify_covers_every_outcome() {
        assert_eq!(classify(0), StatusOutcome::DoneOk);
        assert_eq!(classify(1), StatusOutcome::Running);
        assert_eq!(classify(2), StatusOutcome::DoneError);
        assert_eq!(classify(3), StatusOutcome::NotFound);
        assert_eq!(classify(4), StatusOutcome::NotYetRun);
        assert_eq!(classify(99), StatusOutcome::Unknown(99));
    }

    #[test]
    fn codes_round_trip_through_the_enum() {
        for code in 0..=4 {
            let status = KkmStatus::from_code(code).expect("protocol code");
            assert_eq!(status.code(), code);
        }
        assert!(KkmStatus::from_code(5).is_none());
    }

    #[test]
    fn complete_and_pending_partition_the_polling_states() {
        assert!(KkmStatus::Ok.is_complete());
        assert!(KkmStatus::Error.is_complete());
        assert!(KkmStatus::Run.is_pending());
        assert!(KkmStatus::NotRun.is_pending());
        assert!(!KkmStatus::NotFound.is_complete());
        assert!(!KkmStatus::NotFound.is_pending());
    }

    #[test]
    fn status_deserialises_from_integer() {
        let status: KkmStatus = serde_json::from_str("4").expect("valid code");
        assert_eq!(status, KkmStatus::NotRun);
        assert!(serde_json::from_str::<KkmStatus>("9").is_err());
    }
}
