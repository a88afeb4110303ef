//! TOML-file settings store under the platform config directory.
//!
//! State lives in a single small file, defaulting to the OS config root (e.g.
//! `%APPDATA%` on Windows) under a per-app dot-folder, with an
//! `UPDATE_NUDGE_CONFIG_HOME` override for tests or portable setups. Writes go
//! through a temp file, fsync, and rename so a crash cannot leave a torn
//! record.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

use directories::BaseDirs;

use super::{SettingsStore, StoreError};

/// Filename used for the persisted state document.
pub const STATE_FILE_NAME: &str = "update-state.toml";

/// Environment variable overriding the base config directory.
pub const CONFIG_HOME_ENV: &str = "UPDATE_NUDGE_CONFIG_HOME";

static CONFIG_BASE_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));

type StateMap = BTreeMap<String, String>;

/// Settings store backed by a TOML file, loaded lazily on first access.
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<Option<StateMap>>,
}

impl FileStore {
    /// Store under `<config-dir>/.<app_dir_name>/update-state.toml`, creating
    /// the directory if needed.
    pub fn for_app(app_dir_name: &str) -> Result<Self, StoreError> {
        let base = config_base_dir().ok_or(StoreError::NoBaseDir)?;
        let dir = base.join(format!(".{app_dir_name}"));
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self::at_path(dir.join(STATE_FILE_NAME)))
    }

    /// Store at an explicit path (tests, portable installs).
    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            cache: Mutex::new(None),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_cache(&self) -> MutexGuard<'_, Option<StateMap>> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ensure the cache is populated from disk, returning a view into it.
    fn load<'a>(
        &self,
        guard: &'a mut MutexGuard<'_, Option<StateMap>>,
    ) -> Result<&'a mut StateMap, StoreError> {
        if guard.is_none() {
            **guard = Some(self.read_from_disk()?);
        }
        Ok(guard.as_mut().expect("cache populated above"))
    }

    fn read_from_disk(&self) -> Result<StateMap, StoreError> {
        if !self.path.exists() {
            return Ok(StateMap::new());
        }
        let text = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn flush(&self, map: &StateMap) -> Result<(), StoreError> {
        let data = toml::to_string_pretty(map).map_err(|source| StoreError::Serialize {
            path: self.path.clone(),
            source,
        })?;
        atomic_write(&self.path, data.as_bytes())
    }
}

impl SettingsStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let mut guard = self.lock_cache();
        match self.load(&mut guard) {
            Ok(map) => map.get(key).cloned(),
            Err(err) => {
                tracing::warn!("Could not read update state: {err}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut guard = self.lock_cache();
        let map = self.load(&mut guard)?;
        map.insert(key.to_string(), value.to_string());
        self.flush(map)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut guard = self.lock_cache();
        let map = self.load(&mut guard)?;
        if map.remove(key).is_none() {
            return Ok(());
        }
        self.flush(map)
    }

    fn reset(&self) -> Result<(), StoreError> {
        let mut guard = self.lock_cache();
        *guard = Some(StateMap::new());
        // Removing the file (rather than writing an empty document) keeps a
        // never-written store from leaving artifacts on disk.
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
                sync_parent_dir(parent)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Write `data` to `path` through a synced temp file and rename, creating
/// parent directories as needed.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;
    let mut temp =
        tempfile::NamedTempFile::new_in(parent).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    temp.write_all(data).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    temp.as_file().sync_all().map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    temp.persist(path).map_err(|err| StoreError::Write {
        path: path.to_path_buf(),
        source: err.error,
    })?;
    sync_parent_dir(parent)
}

fn sync_parent_dir(dir: &Path) -> Result<(), StoreError> {
    #[cfg(unix)]
    {
        let handle = std::fs::File::open(dir).map_err(|source| StoreError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        handle.sync_all().map_err(|source| StoreError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    #[cfg(not(unix))]
    {
        let _ = dir;
    }
    Ok(())
}

fn config_base_dir() -> Option<PathBuf> {
    if let Some(path) = CONFIG_BASE_OVERRIDE
        .lock()
        .ok()
        .and_then(|guard| guard.clone())
    {
        return Some(path);
    }
    if let Ok(path) = std::env::var(CONFIG_HOME_ENV) {
        return Some(PathBuf::from(path));
    }
    BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
}

#[cfg(test)]
fn set_config_base_override(path: PathBuf) {
    let mut guard = CONFIG_BASE_OVERRIDE
        .lock()
        .expect("config base override mutex poisoned");
    *guard = Some(path);
}

#[cfg(test)]
fn clear_config_base_override() {
    let mut guard = CONFIG_BASE_OVERRIDE
        .lock()
        .expect("config base override mutex poisoned");
    *guard = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct OverrideGuard;

    impl OverrideGuard {
        fn set(path: PathBuf) -> Self {
            set_config_base_override(path);
            Self
        }
    }

    impl Drop for OverrideGuard {
        fn drop(&mut self) {
            clear_config_base_override();
        }
    }

    #[test]
    fn values_survive_a_fresh_store_instance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STATE_FILE_NAME);
        let store = FileStore::at_path(path.clone());
        store.set("skipped_version", "2.3.0").unwrap();
        drop(store);

        let reopened = FileStore::at_path(path);
        assert_eq!(reopened.get("skipped_version").as_deref(), Some("2.3.0"));
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::at_path(dir.path().join(STATE_FILE_NAME));
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn remove_and_reset_are_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STATE_FILE_NAME);
        let store = FileStore::at_path(path.clone());
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();
        assert!(store.get("a").is_none());
        assert_eq!(store.get("b").as_deref(), Some("2"));

        store.reset().unwrap();
        let reopened = FileStore::at_path(path);
        assert!(reopened.get("b").is_none());
    }

    #[test]
    fn reset_of_an_untouched_store_leaves_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(STATE_FILE_NAME);
        let store = FileStore::at_path(path);
        store.reset().unwrap();
        assert!(!store.path().exists());
        assert!(!store.path().parent().unwrap().exists());
    }

    #[test]
    fn reset_removes_the_state_file() {
        let dir = tempdir().unwrap();
        let store = FileStore::at_path(dir.path().join(STATE_FILE_NAME));
        store.set("skipped_version", "2.3.0").unwrap();
        assert!(store.path().is_file());
        store.reset().unwrap();
        assert!(!store.path().exists());
        assert!(store.get("skipped_version").is_none());
    }

    #[test]
    fn removing_an_absent_key_is_a_no_op() {
        let dir = tempdir().unwrap();
        let store = FileStore::at_path(dir.path().join(STATE_FILE_NAME));
        store.remove("nothing").unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_file_fails_writes_loudly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STATE_FILE_NAME);
        std::fs::write(&path, "not [valid toml").unwrap();
        let store = FileStore::at_path(path);
        assert!(store.get("anything").is_none());
        let err = store.set("a", "1").unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn for_app_uses_the_override_directory() {
        let base = tempdir().unwrap();
        let _guard = OverrideGuard::set(base.path().to_path_buf());
        let store = FileStore::for_app("demo-app").unwrap();
        assert_eq!(
            store.path(),
            base.path().join(".demo-app").join(STATE_FILE_NAME)
        );
        store.set("k", "v").unwrap();
        assert!(store.path().is_file());
    }
}
