//! Snapshot persistence and settings.
//!
//! Snapshots are whole-model JSON files in the data directory
//! (`~/.c4nav/` unless `C4NAV_HOME` is set). Loading a snapshot restores the
//! store exactly as saved: ids, child order and accumulated relationships are
//! kept, nothing is re-created.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{C4Model, Error, LayoutConfig, Result};

const SNAPSHOT_EXT: &str = ".json";
const SETTINGS_FILE: &str = "settings.json";

/// Resolve the data directory: `$C4NAV_HOME`, else `~/.c4nav/`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("C4NAV_HOME") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".c4nav")
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Snapshot name written after every successful mutation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autosave: Option<String>,
    pub layout: LayoutConfig,
}

/// File-backed snapshot and settings store rooted at one directory.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new(data_dir())
    }
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a snapshot. Names that could leave the data directory or
    /// shadow the settings file are rejected.
    fn snapshot_path(&self, name: &str) -> Result<PathBuf> {
        validate_snapshot_name(name)?;
        Ok(self.dir.join(format!("{name}{SNAPSHOT_EXT}")))
    }

    /// List all snapshot names (without extension), sorted.
    pub fn list_snapshots(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }
        let mut names: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let name = entry.file_name().to_string_lossy().to_string();
                name.strip_suffix(SNAPSHOT_EXT)
                    .filter(|n| !n.starts_with('.') && *n != "settings")
                    .map(|n| n.to_string())
            })
            .collect();
        names.sort();
        Ok(names)
    }

    /// Write the model under `name`.
    ///
    /// Uses a temp file and rename so a reader never sees a half-written
    /// snapshot.
    pub fn save_snapshot(&self, name: &str, model: &C4Model) -> Result<()> {
        let path = self.snapshot_path(name)?;
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(model)?;
        let tmp = self.dir.join(format!(".{name}{SNAPSHOT_EXT}.tmp"));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        info!(name, elements = model.element_count(), diagrams = model.diagram_count(); "Saved snapshot");
        Ok(())
    }

    pub fn load_snapshot(&self, name: &str) -> Result<C4Model> {
        let model: C4Model = read_json(&self.snapshot_path(name)?)?;
        for problem in model.hierarchy_violations() {
            warn!(name; "Snapshot hierarchy problem: {problem}");
        }
        info!(name, elements = model.element_count(), diagrams = model.diagram_count(); "Loaded snapshot");
        Ok(model)
    }

    /// Delete a snapshot. Deleting a missing snapshot is not an error.
    pub fn delete_snapshot(&self, name: &str) -> Result<()> {
        let path = self.snapshot_path(name)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Read settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn read_settings(&self) -> Settings {
        let path = self.dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Settings::default();
        }
        match read_json::<Settings>(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unreadable settings {}: {e}", path.display());
                Settings::default()
            }
        }
    }

    pub fn write_settings(&self, settings: &Settings) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(self.dir.join(SETTINGS_FILE), json)?;
        Ok(())
    }
}

/// Snapshot names are file stems: ASCII letters, digits, `-` and `_`.
pub fn validate_snapshot_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "settings"
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
