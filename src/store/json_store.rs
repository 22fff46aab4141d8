use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::store::schema::{SlotProgress, UiStateData};
use crate::store::{ProgressBackend, StoreError};

const UI_STATE_FILE: &str = "ui_state.json";

/// Local JSON files under the data directory, one per save slot plus one for
/// view state.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self, StoreError> {
        Self::with_base_dir(Self::default_dir())
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&base_dir).map_err(|e| StoreError::io(&base_dir, e))?;
        Ok(Self { base_dir })
    }

    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shrinetrack")
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn slot_file(slot: u8) -> String {
        format!("slot-{slot}.json")
    }

    /// Missing files load as defaults. So do corrupt ones: the next save
    /// overwrites them.
    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, StoreError> {
        let path = self.file_path(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        match serde_json::from_str(&content) {
            Ok(data) => Ok(data),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "discarding unreadable file");
                Ok(T::default())
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<(), StoreError> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::io(&path, e)
        })
    }

    pub fn load_ui_state(&self) -> UiStateData {
        match self.load::<UiStateData>(UI_STATE_FILE) {
            Ok(state) if !state.needs_reset() => state,
            Ok(_) => {
                tracing::info!("ui state schema changed, starting fresh");
                UiStateData::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "ui state unavailable");
                UiStateData::default()
            }
        }
    }

    pub fn save_ui_state(&self, data: &UiStateData) -> Result<(), StoreError> {
        self.save(UI_STATE_FILE, data)
    }
}

impl ProgressBackend for JsonStore {
    fn label(&self) -> &'static str {
        "local"
    }

    fn load_progress(&self, slot: u8) -> Result<SlotProgress, StoreError> {
        let progress: SlotProgress = self.load(&Self::slot_file(slot))?;
        if progress.needs_reset() {
            tracing::info!(slot, "slot schema changed, starting fresh");
            return Ok(SlotProgress::default());
        }
        Ok(progress)
    }

    fn save_progress(&self, slot: u8, progress: &SlotProgress) -> Result<(), StoreError> {
        self.save(&Self::slot_file(slot), progress)
    }
}
