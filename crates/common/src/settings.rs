use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const SETTINGS_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    pub label: String,
    pub field: String,
    pub visible: bool,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            label: String::new(),
            field: String::new(),
            visible: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub version: u32,
    pub search_roots: Vec<String>,
    pub shuffle: bool,
    pub repeat: bool,
    pub columns: Vec<ColumnSpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            search_roots: Vec::new(),
            shuffle: false,
            repeat: false,
            columns: default_columns(),
        }
    }
}

pub fn default_columns() -> Vec<ColumnSpec> {
    const LAYOUT: &[(&str, &str)] = &[
        ("Title", "title"),
        ("Artist", "artist"),
        ("Album", "album"),
        ("Year", "year"),
        ("Genre", "genre"),
        ("Track Number", "track_number"),
        ("Total Tracks", "total_tracks"),
        ("Disc Number", "disc_number"),
        ("Total Discs", "total_discs"),
        ("Album Artist", "album_artist"),
        ("Publisher", "publisher"),
        ("File Path", "path"),
        ("Time", "duration_secs"),
        ("Plays", "play_count"),
        ("Comment", "comment"),
        ("Date Added", "date_added"),
        ("Composer", "composer"),
        ("BPM", "bpm"),
        ("Date Modified", "date_modified"),
        ("Size", "size"),
        ("Bit Rate", "bit_rate"),
        ("Sample Rate", "sample_rate"),
        ("Format", "format"),
        ("Channels", "channels"),
    ];
    LAYOUT
        .iter()
        .map(|(label, field)| ColumnSpec {
            label: label.to_string(),
            field: field.to_string(),
            visible: true,
        })
        .collect()
}

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(err) => write!(f, "io error: {}", err),
            SettingsError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Io(err)
    }
}

impl From<serde_yaml::Error> for SettingsError {
    fn from(err: serde_yaml::Error) -> Self {
        SettingsError::Yaml(err)
    }
}

// creates the file with defaults when absent; the bool is true when a
// fresh file was written
pub fn load_or_create_settings(path: &Path) -> Result<(Settings, bool), SettingsError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut settings: Settings = serde_yaml::from_str(&contents)?;
        if settings.version < SETTINGS_VERSION {
            settings.version = SETTINGS_VERSION;
        }
        if settings.columns.is_empty() {
            settings.columns = default_columns();
        }
        return Ok((settings, false));
    }

    let settings = Settings::default();
    save_settings(path, &settings)?;
    Ok((settings, true))
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(settings)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{default_columns, load_or_create_settings, save_settings, Settings};

    #[test]
    fn creates_defaults_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let (settings, created) = load_or_create_settings(&path).unwrap();
        assert!(created);
        assert!(path.exists());
        assert!(!settings.shuffle);
        assert_eq!(settings.columns.len(), default_columns().len());
    }

    #[test]
    fn round_trips_saved_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut settings = Settings::default();
        settings.search_roots.push("/music".to_string());
        settings.shuffle = true;
        save_settings(&path, &settings).unwrap();

        let (loaded, created) = load_or_create_settings(&path).unwrap();
        assert!(!created);
        assert!(loaded.shuffle);
        assert_eq!(loaded.search_roots, vec!["/music".to_string()]);
    }

    #[test]
    fn empty_column_list_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "version: 1\ncolumns: []\n").unwrap();
        let (settings, _) = load_or_create_settings(&path).unwrap();
        assert_eq!(settings.columns.len(), default_columns().len());
    }
}
