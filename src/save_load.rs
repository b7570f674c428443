use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SAVE_FOLDER;

pub struct SaveLoadPlugin;

impl Plugin for SaveLoadPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreStartup, load_save_data);
    }
}

/// What survives between runs of the game.
///
/// Stored as RON. New fields need `#[serde(default)]` so save files written
/// by older builds still load.
#[derive(Resource, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SaveData {
    /// Longest distance ever travelled.
    #[serde(default)]
    pub highscore: f32,
}

impl SaveData {
    /// Keep the better of the stored record and `distance`.
    /// Returns true if the record changed.
    pub fn record_distance(&mut self, distance: f32) -> bool {
        if distance > self.highscore {
            self.highscore = distance;
            true
        } else {
            false
        }
    }
}

/// Where the save file lives.
#[derive(Resource, Debug, Clone)]
pub struct SaveFile(pub PathBuf);

impl Default for SaveFile {
    fn default() -> Self {
        SaveFile(default_save_path())
    }
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("save file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("save file is not valid RON: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("could not serialize save data: {0}")]
    Serialize(#[from] ron::Error),
}

/// `<data dir>/dark-matter/save.ron`, or `save.ron` in the working directory
/// on platforms without a data dir.
pub fn default_save_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join(SAVE_FOLDER).join("save.ron"),
        None => PathBuf::from("save.ron"),
    }
}

/// `Ok(None)` when there is no save file yet.
pub fn load_from(path: &Path) -> Result<Option<SaveData>, SaveError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(Some(ron::from_str(&contents)?))
}

/// Write `save_data` to `path`, creating parent directories as needed.
pub fn save_to(path: &Path, save_data: &SaveData) -> Result<(), SaveError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized = ron::ser::to_string_pretty(save_data, ron::ser::PrettyConfig::default())?;
    std::fs::write(path, serialized)?;
    Ok(())
}

/// Startup system: read the save file, falling back to defaults.
///
/// A broken file is not fatal; it gets overwritten on the next save.
fn load_save_data(mut commands: Commands) {
    let file = SaveFile::default();
    let save_data = match load_from(&file.0) {
        Ok(Some(data)) => {
            info!("Loaded save data from {:?}: {:?}", file.0, data);
            data
        }
        Ok(None) => {
            info!("No save file found at {:?}. Starting fresh.", file.0);
            SaveData::default()
        }
        Err(e) => {
            error!("Failed to load save file {:?}: {}. Using defaults.", file.0, e);
            SaveData::default()
        }
    };
    commands.insert_resource(save_data);
    commands.insert_resource(file);
}

/// Flush `save_data` now. Failures are logged; the game keeps running.
pub fn save_to_disk(file: &SaveFile, save_data: &SaveData) {
    match save_to(&file.0, save_data) {
        Ok(()) => info!("Game saved to {:?}", file.0),
        Err(e) => error!("Failed to write save file {:?}: {}", file.0, e),
    }
}
