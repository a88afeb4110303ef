//! Persisted check state.
//!
//! The notifier remembers a handful of values between launches: when a prompt
//! was last shown, which version the user chose to skip, and the previously
//! seen installed version. [`SettingsStore`] is the key-value backing seam;
//! [`StateStore`] layers the named mutators and typed getters on top.

pub mod file;
pub mod memory;

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Keys used in the backing store. All values are strings.
pub mod keys {
    /// RFC3339 timestamp of the last successful presentation.
    pub const LAST_PROMPT_DATE: &str = "last_prompt_date";
    /// Version the user explicitly chose to skip.
    pub const SKIPPED_VERSION: &str = "skipped_version";
    /// Installed version observed on the most recent check.
    pub const CURRENT_INSTALLED_VERSION: &str = "current_installed_version";
    /// Installed version observed before the most recent one.
    pub const PREVIOUS_INSTALLED_VERSION: &str = "previous_installed_version";
}

/// Errors that can occur while reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No suitable base config directory could be resolved.
    #[error("No suitable base config directory available for update state")]
    NoBaseDir,
    /// Failed to create the state directory.
    #[error("Failed to create state directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to read the state file.
    #[error("Failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to write the state file.
    #[error("Failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        source: io::Error,
    },
    /// The state file exists but is not valid TOML.
    #[error("Failed to parse state file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// The in-memory state could not be serialized.
    #[error("Failed to serialize state for {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: toml::ser::Error,
    },
    /// A timestamp could not be formatted for storage.
    #[error("Failed to format timestamp: {0}")]
    FormatTime(#[from] time::error::Format),
}

/// Key-value backing for persisted check state.
///
/// `set` must durably flush before returning so that a crash immediately after
/// a skip choice cannot lose the record. Writes are last-write-wins; the store
/// is designed for single-process, effectively single-writer use.
pub trait SettingsStore: Send + Sync {
    /// Read a value. Missing keys (and unreadable backings) yield `None`.
    fn get(&self, key: &str) -> Option<String>;
    /// Durably persist `value` under `key` before returning.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Remove `key`, flushing the removal.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    /// Drop every stored value. Intended for tests and explicit user resets.
    fn reset(&self) -> Result<(), StoreError>;
}

/// Typed access to the persisted notifier state.
pub struct StateStore {
    backing: Box<dyn SettingsStore>,
}

impl StateStore {
    /// Wrap a key-value backing.
    pub fn new(backing: Box<dyn SettingsStore>) -> Self {
        Self { backing }
    }

    /// When a prompt was last shown, if ever recorded.
    pub fn last_prompt_date(&self) -> Option<OffsetDateTime> {
        let value = self.backing.get(keys::LAST_PROMPT_DATE)?;
        match OffsetDateTime::parse(&value, &Rfc3339) {
            Ok(timestamp) => Some(timestamp),
            Err(err) => {
                tracing::warn!("Ignoring malformed last prompt date '{value}': {err}");
                None
            }
        }
    }

    /// The version the user explicitly chose to skip, if any.
    pub fn skipped_version(&self) -> Option<String> {
        self.backing.get(keys::SKIPPED_VERSION)
    }

    /// Installed version observed on the most recent check.
    pub fn installed_version(&self) -> Option<String> {
        self.backing.get(keys::CURRENT_INSTALLED_VERSION)
    }

    /// Installed version observed before the most recent one.
    pub fn previous_installed_version(&self) -> Option<String> {
        self.backing.get(keys::PREVIOUS_INSTALLED_VERSION)
    }

    /// Record that a prompt was shown at `now`.
    ///
    /// Called exactly once per successful presentation, never for suppressed
    /// decisions.
    pub fn record_prompt_shown(&self, now: OffsetDateTime) -> Result<(), StoreError> {
        let formatted = now.format(&Rfc3339)?;
        self.backing.set(keys::LAST_PROMPT_DATE, &formatted)
    }

    /// Record the version the user chose to skip.
    pub fn record_skipped_version(&self, version: &str) -> Result<(), StoreError> {
        self.backing.set(keys::SKIPPED_VERSION, version)
    }

    /// Forget the skipped version. Never called by the core; exposed for
    /// embedders that want to re-prompt (e.g. after a settings change).
    pub fn clear_skipped_version(&self) -> Result<(), StoreError> {
        self.backing.remove(keys::SKIPPED_VERSION)
    }

    /// Track the installed version pair used to tell fresh installs from
    /// upgrades. When `version` differs from the stored one, the stored value
    /// becomes the previous version.
    pub fn record_installed_version(&self, version: &str) -> Result<(), StoreError> {
        match self.backing.get(keys::CURRENT_INSTALLED_VERSION) {
            Some(stored) if stored == version => Ok(()),
            Some(stored) => {
                self.backing.set(keys::PREVIOUS_INSTALLED_VERSION, &stored)?;
                self.backing.set(keys::CURRENT_INSTALLED_VERSION, version)
            }
            None => self.backing.set(keys::CURRENT_INSTALLED_VERSION, version),
        }
    }

    /// Drop all persisted state. Intended for tests and explicit user resets.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.backing.reset()
    }
}
