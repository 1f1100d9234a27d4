//! Connection configuration value types.
//!
//! [`ConnectionConfig`] is a plain value: the `client` crate owns the live
//! copy and hands snapshots to executors, which read it at call time.

use serde::{Deserialize, Serialize};

use crate::KkmError;

/// Endpoint used when nothing is configured or persisted.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5893/";

/// How commands reach the device server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportMode {
    /// Through a host-provided add-in bridge.
    AddIn,
    /// Over HTTP to `<endpoint>/Execute`.
    #[default]
    #[serde(rename = "HTTP")]
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AddIn => f.write_str("AddIn"),
            Self::Http => f.write_str("HTTP"),
        }
    }
}

impl std::str::FromStr for TransportMode {
    type Err = KkmError;

    fn from_str(s: &str) -> Result<Self, KkmError> {
        match s.to_ascii_lowercase().as_str() {
            "addin" => Ok(Self::AddIn),
            "http" => Ok(Self::Http),
            other => Err(KkmError::Configuration {
                message: format!("unknown transport mode '{other}' (expected AddIn or HTTP)"),
            }),
        }
    }
}

/// HTTP Basic credentials for the device server.
///
/// `Debug` never prints the password.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// `true` when neither part is set; no `Authorization` header is sent then.
    pub fn is_empty(&self) -> bool {
        self.user.is_empty() && self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Transport mode, endpoint and credentials in effect for the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub mode: TransportMode,
    /// Base URL of the device server. Only meaningful in HTTP mode.
    pub endpoint: Option<String>,
    pub credentials: Option<Credentials>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::Http,
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            credentials: None,
        }
    }
}

impl ConnectionConfig {
    /// Builds the live configuration from persisted settings.
    pub fn from_stored(stored: &StoredSettings) -> Self {
        Self {
            mode: stored.mode,
            endpoint: Some(
                stored
                    .endpoint
                    .clone()
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            ),
            credentials: None,
        }
    }

    /// Returns the credentials to send, if any part of them is set.
    pub fn active_credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref().filter(|c| !c.is_empty())
    }

    /// Returns `<endpoint>/Execute`, inserting the separating slash when the
    /// endpoint lacks a trailing one.
    ///
    /// # Errors
    ///
    /// [`KkmError::Configuration`] when no endpoint is set.
    pub fn execute_url(&self) -> Result<String, KkmError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| KkmError::Configuration {
                message: "no endpoint configured for HTTP transport".to_string(),
            })?;
        if endpoint.ends_with('/') {
            Ok(format!("{endpoint}Execute"))
        } else {
            Ok(format!("{endpoint}/Execute"))
        }
    }
}

/// The subset of [`ConnectionConfig`] that is persisted between runs.
///
/// Credentials are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSettings {
    pub mode: TransportMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_http_on_localhost() {
        let cfg = ConnectionConfig::default();
        assert_eq!(cfg.mode, TransportMode::Http);
        assert_eq!(
            cfg.execute_url().expect("endpoint set"),
            "http://localhost:5893/Execute"
        );
    }

    #[test]
    fn execute_url_adds_missing_slash() {
        let cfg = ConnectionConfig {
            endpoint: Some("http://kkm.local:5893".into()),
            ..ConnectionConfig::default()
        };
        assert_eq!(
            cfg.execute_url().expect("endpoint set"),
            "http://kkm.local:5893/Execute"
        );
    }

    #[test]
    fn execute_url_requires_endpoint() {
        let cfg = ConnectionConfig {
            endpoint: None,
            ..ConnectionConfig::default()
        };
        assert!(matches!(
            cfg.execute_url(),
            Err(KkmError::Configuration { .. })
        ));
    }

    #[test]
    fn empty_credentials_are_not_active() {
        let mut cfg = ConnectionConfig {
            credentials: Some(Credentials::default()),
            ..ConnectionConfig::default()
        };
        assert!(cfg.active_credentials().is_none());
        cfg.credentials = Some(Credentials::new("", "secret"));
        assert!(cfg.active_credentials().is_some());
    }

    #[test]
    fn credentials_debug_hides_password() {
        let rendered = format!("{:?}", Credentials::new("admin", "hunter2"));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn transport_mode_parses_case_insensitively() {
        assert_eq!("addin".parse::<TransportMode>().ok(), Some(TransportMode::AddIn));
        assert_eq!("HTTP".parse::<TransportMode>().ok(), Some(TransportMode::Http));
        assert!("serial".parse::<TransportMode>().is_err());
    }

    #[test]
    fn stored_settings_use_protocol_mode_names() {
        let stored = StoredSettings {
            mode: TransportMode::Http,
            endpoint: Some("http://x/".into()),
        };
        let text = serde_json::to_string(&stored).expect("serialise");
        assert_eq!(text, r#"{"mode":"HTTP","endpoint":"http://x/"}"#);
    }

    #[test]
    fn missing_stored_endpoint_falls_back_to_default() {
        let cfg = ConnectionConfig::from_stored(&StoredSettings {
            mode: TransportMode::AddIn,
            endpoint: None,
        });
        assert_eq!(cfg.mode, TransportMode::AddIn);
        assert_eq!(cfg.endpoint.as_deref(), Some(DEFAULT_ENDPOINT));
    }
}
