//! Connection settings: the live [`ConnectionConfig`] plus its persistence.
//!
//! [`ConnectionSettings`] is the single owner of the configuration in effect.
//! It is injected into [`crate::KkmClient`] rather than held in a process-wide
//! global. Executors never see it directly: each call reads a snapshot with
//! [`ConnectionSettings::get`], so a change takes effect on the next call.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use protocol::{ConnectionConfig, Credentials, KkmError, SettingsStore, StoredSettings, TransportMode};
use tracing::{debug, info};

/// Live connection configuration with explicit get/set.
pub struct ConnectionSettings {
    current: RwLock<ConnectionConfig>,
    store: Arc<dyn SettingsStore>,
}

impl ConnectionSettings {
    /// Loads persisted settings from `store`, falling back to
    /// [`ConnectionConfig::default`] when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// [`KkmError::Settings`] if the store exists but cannot be read.
    pub async fn load(store: Arc<dyn SettingsStore>) -> Result<Self, KkmError> {
        let config = match store.load().await? {
            Some(stored) => {
                debug!(mode = %stored.mode, endpoint = ?stored.endpoint, "loaded connection settings");
                ConnectionConfig::from_stored(&stored)
            }
            None => {
                debug!("no saved connection settings, using defaults");
                ConnectionConfig::default()
            }
        };
        Ok(Self {
            current: RwLock::new(config),
            store,
        })
    }

    /// Wraps `config` with a throw-away in-memory store.
    pub fn in_memory(config: ConnectionConfig) -> Self {
        Self {
            current: RwLock::new(config),
            store: Arc::new(MemorySettingsStore::default()),
        }
    }

    /// Returns a snapshot of the configuration in effect.
    pub fn get(&self) -> ConnectionConfig {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switches transport mode and persists the choice.
    ///
    /// The endpoint is only kept for HTTP; selecting AddIn clears it from the
    /// live configuration. The persisted endpoint is only overwritten when an
    /// HTTP endpoint is given, so switching back to HTTP later can restore it.
    ///
    /// # Errors
    ///
    /// [`KkmError::Settings`] if persisting fails. The live configuration is
    /// updated regardless.
    pub async fn set_connection(
        &self,
        mode: TransportMode,
        endpoint: Option<String>,
    ) -> Result<(), KkmError> {
        let endpoint = match mode {
            TransportMode::Http => endpoint.filter(|e| !e.is_empty()),
            TransportMode::AddIn => None,
        };
        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            current.mode = mode;
            current.endpoint = endpoint.clone();
        }
        info!(mode = %mode, endpoint = ?endpoint, "connection settings changed");

        let mut stored = self.store.load().await?.unwrap_or_default();
        stored.mode = mode;
        if endpoint.is_some() {
            stored.endpoint = endpoint;
        }
        self.store.save(&stored).await
    }

    /// Sets the HTTP Basic credentials. Credentials are never persisted.
    pub fn set_credentials(&self, user: impl Into<String>, password: impl Into<String>) {
        let credentials = Credentials::new(user, password);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        current.credentials = Some(credentials);
    }
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("current", &self.get())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Keeps settings in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    saved: Mutex<Option<StoredSettings>>,
}

impl MemorySettingsStore {
    /// Creates a store that already holds `settings`.
    pub fn with(settings: StoredSettings) -> Self {
        Self {
            saved: Mutex::new(Some(settings)),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Option<StoredSettings>, KkmError> {
        Ok(self.saved.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn save(&self, settings: &StoredSettings) -> Result<(), KkmError> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(settings.clone());
        Ok(())
    }
}

/// Persists settings as a JSON document on disk.
///
/// A missing file means "nothing saved yet". The parent directory is created
/// on first save.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn settings_error(&self, action: &str, err: impl std::fmt::Display) -> KkmError {
        KkmError::Settings {
            message: format!("failed to {action} {}: {err}", self.path.display()),
        }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<Option<StoredSettings>, KkmError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|e| self.settings_error("parse", e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.settings_error("read", e)),
        }
    }

    async fn save(&self, settings: &StoredSettings) -> Result<(), KkmError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| self.settings_error("create directory for", e))?;
        }
        let body =
            serde_json::to_string_pretty(settings).map_err(|e| self.settings_error("encode", e))?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| self.settings_error("write", e))?;
        debug!(path = %self.path.display(), "saved connection settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use protocol::DEFAULT_ENDPOINT;

    use super::*;

    #[tokio::test]
    async fn empty_store_yields_defaults() {
        let settings = ConnectionSettings::load(Arc::new(MemorySettingsStore::default()))
            .await
            .expect("load");
        assert_eq!(settings.get(), ConnectionConfig::default());
    }

    #[tokio::test]
    async fn stored_values_are_loaded() {
        let store = MemorySettingsStore::with(StoredSettings {
            mode: TransportMode::AddIn,
            endpoint: Some("http://kkm:5893/".into()),
        });
        let settings = ConnectionSettings::load(Arc::new(store)).await.expect("load");
        let cfg = settings.get();
        assert_eq!(cfg.mode, TransportMode::AddIn);
        assert_eq!(cfg.endpoint.as_deref(), Some("http://kkm:5893/"));
    }

    #[tokio::test]
    async fn set_connection_updates_live_config_and_store() {
        let store = Arc::new(MemorySettingsStore::default());
        let settings = ConnectionSettings::load(store.clone()).await.expect("load");

        settings
            .set_connection(TransportMode::Http, Some("http://remote:5893".into()))
            .await
            .expect("save");

        assert_eq!(settings.get().endpoint.as_deref(), Some("http://remote:5893"));
        let saved = store.load().await.expect("load").expect("saved");
        assert_eq!(saved.endpoint.as_deref(), Some("http://remote:5893"));
    }

    #[tokio::test]
    async fn switching_to_addin_keeps_persisted_endpoint() {
        let store = Arc::new(MemorySettingsStore::with(StoredSettings {
            mode: TransportMode::Http,
            endpoint: Some("http://remote:5893/".into()),
        }));
        let settings = ConnectionSettings::load(store.clone()).await.expect("load");

        settings
            .set_connection(TransportMode::AddIn, Some("ignored".into()))
            .await
            .expect("save");

        assert_eq!(settings.get().mode, TransportMode::AddIn);
        assert!(settings.get().endpoint.is_none());
        let saved = store.load().await.expect("load").expect("saved");
        assert_eq!(saved.mode, TransportMode::AddIn);
        assert_eq!(saved.endpoint.as_deref(), Some("http://remote:5893/"));
    }

    #[tokio::test]
    async fn credentials_survive_mode_changes_but_are_not_saved() {
        let store = Arc::new(MemorySettingsStore::default());
        let settings = ConnectionSettings::load(store.clone()).await.expect("load");
        settings.set_credentials("admin", "secret");
        settings
            .set_connection(TransportMode::Http, Some(DEFAULT_ENDPOINT.into()))
            .await
            .expect("save");

        assert_eq!(
            settings.get().credentials,
            Some(Credentials::new("admin", "secret"))
        );
        let persisted = serde_json::to_string(&store.load().await.expect("load")).expect("json");
        assert!(!persisted.contains("secret"));
    }

    #[tokio::test]
    async fn file_store_round_trips_and_treats_missing_file_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSettingsStore::new(dir.path().join("nested").join("kkm.json"));

        assert!(store.load().await.expect("load").is_none());

        let settings = StoredSettings {
            mode: TransportMode::Http,
            endpoint: Some("http://10.0.0.5:5893/".into()),
        };
        store.save(&settings).await.expect("save");
        assert_eq!(store.load().await.expect("load"), Some(settings));
    }

    #[tokio::test]
    async fn file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("kkm.json");
        std::fs::write(&path, "{not json").expect("write");

        let err = FileSettingsStore::new(&path).load().await.expect_err("corrupt");
        assert!(matches!(err, KkmError::Settings { .. }), "{err}");
    }
}
