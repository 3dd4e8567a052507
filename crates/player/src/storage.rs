use std::fs;
use std::path::Path;

use common::PlaylistEntry;

#[derive(Debug)]
pub enum PlaylistError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for PlaylistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaylistError::Io(err) => write!(f, "io error: {}", err),
            PlaylistError::Json(err) => write!(f, "json error: {}", err),
        }
    }
}

impl std::error::Error for PlaylistError {}

impl From<std::io::Error> for PlaylistError {
    fn from(err: std::io::Error) -> Self {
        PlaylistError::Io(err)
    }
}

impl From<serde_json::Error> for PlaylistError {
    fn from(err: serde_json::Error) -> Self {
        PlaylistError::Json(err)
    }
}

pub fn save_playlist(path: &Path, entries: &[PlaylistEntry]) -> Result<(), PlaylistError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_json::to_string_pretty(entries)?;
    fs::write(path, contents)?;
    Ok(())
}

// a missing file is an empty playlist, not an error
pub fn load_playlist(path: &Path) -> Result<Vec<PlaylistEntry>, PlaylistError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use common::PlaylistEntry;

    use super::{load_playlist, save_playlist, PlaylistError};

    #[test]
    fn round_trips_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlist.json");
        let entries = vec![
            PlaylistEntry {
                path: "/music/a.mp3".to_string(),
                artist: "Artist".to_string(),
                title: "Song".to_string(),
            },
            PlaylistEntry {
                path: "/music/b.flac".to_string(),
                artist: String::new(),
                title: String::new(),
            },
        ];
        save_playlist(&path, &entries).unwrap();
        assert_eq!(load_playlist(&path).unwrap(), entries);
    }

    #[test]
    fn saved_records_use_the_file_path_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlist.json");
        save_playlist(
            &path,
            &[PlaylistEntry {
                path: "/music/a.mp3".to_string(),
                artist: String::new(),
                title: String::new(),
            }],
        )
        .unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"file_path\""));
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_playlist(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlist.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_playlist(&path),
            Err(PlaylistError::Json(_))
        ));
    }
}
