//! Key-value persistence for high scores and settings
//!
//! Backends:
//! - `MemoryStore` (tests, headless runs)
//! - `FileStore` (native; one JSON file per key, written via tmp + rename)
//! - `LocalStore` (wasm32; browser LocalStorage)
//!
//! The [`Persistence`] facade never fails: storage errors are logged and the
//! caller gets defaults.

use std::collections::HashMap;

use crate::highscores::HighScores;
use crate::settings::Settings;

pub const HIGH_SCORES_KEY: &str = "shmup_zero_highscores";
pub const SETTINGS_KEY: &str = "shmup_zero_settings";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored record is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// String key-value storage
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn store(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn store(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::path::PathBuf;

    use super::{KeyValueStore, Result};

    /// Directory of `<key>.json` files
    #[derive(Debug, Clone)]
    pub struct FileStore {
        dir: PathBuf,
    }

    impl FileStore {
        pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
            let dir = dir.into();
            fs::create_dir_all(&dir)?;
            Ok(Self { dir })
        }

        fn path(&self, key: &str) -> PathBuf {
            self.dir.join(format!("{key}.json"))
        }
    }

    impl KeyValueStore for FileStore {
        fn load(&self, key: &str) -> Result<Option<String>> {
            match fs::read_to_string(self.path(key)) {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }

        fn store(&mut self, key: &str, value: &str) -> Result<()> {
            let path = self.path(key);
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, value)?;
            fs::rename(&tmp, &path)?;
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;

#[cfg(target_arch = "wasm32")]
mod local {
    use super::{KeyValueStore, PersistenceError, Result};

    /// Browser LocalStorage
    pub struct LocalStore {
        storage: web_sys::Storage,
    }

    impl LocalStore {
        pub fn open() -> Result<Self> {
            let storage = web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
                .ok_or_else(|| PersistenceError::Unavailable("no LocalStorage".into()))?;
            Ok(Self { storage })
        }
    }

    impl KeyValueStore for LocalStore {
        fn load(&self, key: &str) -> Result<Option<String>> {
            self.storage
                .get_item(key)
                .map_err(|e| PersistenceError::Unavailable(format!("{e:?}")))
        }

        fn store(&mut self, key: &str, value: &str) -> Result<()> {
            self.storage
                .set_item(key, value)
                .map_err(|e| PersistenceError::Unavailable(format!("{e:?}")))
        }
    }
}

/// Typed records on top of a store; errors fall back to defaults
#[derive(Debug, Clone)]
pub struct Persistence<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.load(key)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn write<T: serde::Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.store.store(key, &text)
    }

    pub fn load_high_scores(&self) -> HighScores {
        match self.read::<HighScores>(HIGH_SCORES_KEY) {
            Ok(Some(scores)) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Ok(None) => HighScores::new(),
            Err(e) => {
                log::warn!("Failed to load high scores: {}", e);
                HighScores::new()
            }
        }
    }

    /// Best stored score, 0 when nothing is stored
    pub fn load_high_score(&self) -> u64 {
        self.load_high_scores().top_score()
    }

    /// Record a finished run. Returns its rank if it made the table.
    pub fn save_high_score(&mut self, score: u64, stage: u32, timestamp: f64) -> Option<usize> {
        let mut scores = self.load_high_scores();
        let rank = scores.add_score(score, stage, timestamp)?;
        if let Err(e) = self.write(HIGH_SCORES_KEY, &scores) {
            log::warn!("Failed to save high scores: {}", e);
            return None;
        }
        log::info!("High score {} saved at rank {}", score, rank);
        Some(rank)
    }

    pub fn load_settings(&self) -> Settings {
        match self.read::<Settings>(SETTINGS_KEY) {
            Ok(Some(settings)) => settings.sanitized(),
            Ok(None) => Settings::default(),
            Err(e) => {
                log::warn!("Failed to load settings, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    pub fn save_settings(&mut self, settings: &Settings) -> bool {
        match self.write(SETTINGS_KEY, settings) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save settings: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::QualityPreset;

    /// Store whose every call fails
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<String>> {
            Err(PersistenceError::Unavailable("broken".into()))
        }
        fn store(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(PersistenceError::Unavailable("broken".into()))
        }
    }

    #[test]
    fn test_high_score_round_trip() {
        let mut persistence = Persistence::new(MemoryStore::new());
        assert_eq!(persistence.load_high_score(), 0);
        assert_eq!(persistence.save_high_score(1200, 2, 0.0), Some(1));
        assert_eq!(persistence.save_high_score(800, 1, 1.0), Some(2));
        assert_eq!(persistence.load_high_score(), 1200);
        assert_eq!(persistence.load_high_scores().entries.len(), 2);
    }

    #[test]
    fn test_settings_round_trip() {
        let mut persistence = Persistence::new(MemoryStore::new());
        let settings = Settings::from_preset(QualityPreset::High);
        assert!(persistence.save_settings(&settings));
        assert_eq!(persistence.load_settings(), settings);
    }

    #[test]
    fn test_corrupt_record_falls_back() {
        let mut store = MemoryStore::new();
        store.store(SETTINGS_KEY, "{ nope").unwrap();
        store.store(HIGH_SCORES_KEY, "[1, 2").unwrap();
        let persistence = Persistence::new(store);
        assert_eq!(persistence.load_settings(), Settings::default());
        assert_eq!(persistence.load_high_score(), 0);
    }

    #[test]
    fn test_broken_store_falls_back() {
        let mut persistence = Persistence::new(BrokenStore);
        assert_eq!(persistence.load_high_score(), 0);
        assert_eq!(persistence.load_settings(), Settings::default());
        assert_eq!(persistence.save_high_score(500, 1, 0.0), None);
        assert!(!persistence.save_settings(&Settings::default()));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store() {
        let dir = std::env::temp_dir().join(format!("shmup_zero_store_{}", std::process::id()));
        let mut store = FileStore::new(&dir).unwrap();
        assert_eq!(store.load("missing").unwrap(), None);
        store.store("key", "{\"a\":1}").unwrap();
        assert_eq!(store.load("key").unwrap().as_deref(), Some("{\"a\":1}"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
