use serde::{Deserialize, Serialize};

pub mod settings;

pub use settings::{load_or_create_settings, save_settings, ColumnSpec, Settings, SettingsError};

// All tag-sourced fields are strings defaulting to empty; a missing tag is
// indistinguishable from an empty one.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Track {
    pub path: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde(default)]
    pub album_artist: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub track_number: String,
    #[serde(default)]
    pub total_tracks: String,
    #[serde(default)]
    pub disc_number: String,
    #[serde(default)]
    pub total_discs: String,
    #[serde(default)]
    pub composer: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub bpm: String,
    #[serde(default)]
    pub duration_secs: f64,
    #[serde(default)]
    pub play_count: u32,
    #[serde(default)]
    pub date_added: String,
    #[serde(default)]
    pub date_modified: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub bit_rate: String,
    #[serde(default)]
    pub sample_rate: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub channels: String,
    // display-only, never persisted
    #[serde(skip)]
    pub rating: String,
}

#[derive(Clone, Debug)]
pub struct CatalogRow {
    pub track: Track,
    pub available: bool,
}

// display fields are cached so a playlist renders without touching the files
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    #[serde(rename = "file_path")]
    pub path: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
}

pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|value| value.as_secs())
        .unwrap_or(0)
}

pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::{format_duration, PlaylistEntry, Track};

    #[test]
    fn track_fields_default_to_empty() {
        let track = Track::default();
        assert_eq!(track.title, "");
        assert_eq!(track.total_tracks, "");
        assert_eq!(track.play_count, 0);
    }

    #[test]
    fn playlist_entry_uses_file_path_key() {
        let entry = PlaylistEntry {
            path: "/music/a.mp3".to_string(),
            artist: "Artist".to_string(),
            title: "Title".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"file_path\""));
        let back: PlaylistEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(61), "1:01");
        assert_eq!(format_duration(3661), "1:01:01");
    }
}
