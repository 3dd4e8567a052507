use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use codecs::{FormatError, TagField};
use common::Track;

pub mod cover;

pub use cover::resolve_cover;

// None leaves a field untouched; empty strings are skipped on write.
#[derive(Clone, Debug, Default)]
pub struct FieldUpdates {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub track_number: Option<String>,
    pub total_tracks: Option<String>,
    pub disc_number: Option<String>,
    pub total_discs: Option<String>,
    pub composer: Option<String>,
    pub publisher: Option<String>,
    pub comment: Option<String>,
}

impl FieldUpdates {
    fn entries(&self) -> Vec<(TagField, String)> {
        let fields = [
            (TagField::Title, &self.title),
            (TagField::Artist, &self.artist),
            (TagField::Album, &self.album),
            (TagField::AlbumArtist, &self.album_artist),
            (TagField::Genre, &self.genre),
            (TagField::Year, &self.year),
            (TagField::TrackNumber, &self.track_number),
            (TagField::TotalTracks, &self.total_tracks),
            (TagField::DiscNumber, &self.disc_number),
            (TagField::TotalDiscs, &self.total_discs),
            (TagField::Composer, &self.composer),
            (TagField::Publisher, &self.publisher),
            (TagField::Comment, &self.comment),
        ];
        fields
            .into_iter()
            .filter_map(|(field, value)| {
                let value = value.as_deref()?.trim();
                if value.is_empty() {
                    None
                } else {
                    Some((field, value.to_string()))
                }
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

// Missing tags resolve to empty strings; a missing title falls back to the
// file's base name.
pub fn normalize_for_display(path: &Path) -> Result<Track, FormatError> {
    let raw = codecs::read(path)?;

    let mut track = Track {
        path: path.display().to_string(),
        ..Track::default()
    };

    track.title = raw.get(TagField::Title).unwrap_or_default();
    if track.title.is_empty() {
        track.title = base_name(path);
    }
    track.artist = raw.get(TagField::Artist).unwrap_or_default();
    track.album = raw.get(TagField::Album).unwrap_or_default();
    track.album_artist = raw.get(TagField::AlbumArtist).unwrap_or_default();
    track.genre = raw.get(TagField::Genre).unwrap_or_default();
    track.year = raw.get(TagField::Year).unwrap_or_default();
    track.track_number = raw.get(TagField::TrackNumber).unwrap_or_default();
    track.total_tracks = raw.get(TagField::TotalTracks).unwrap_or_default();
    track.disc_number = raw.get(TagField::DiscNumber).unwrap_or_default();
    track.total_discs = raw.get(TagField::TotalDiscs).unwrap_or_default();
    track.composer = raw.get(TagField::Composer).unwrap_or_default();
    track.publisher = raw.get(TagField::Publisher).unwrap_or_default();
    track.comment = raw.get(TagField::Comment).unwrap_or_default();
    track.bpm = raw.get(TagField::Bpm).unwrap_or_default();
    track.rating = raw.get(TagField::Rating).unwrap_or_default();
    track.format = raw.container().label().to_string();

    let properties = raw.properties();
    track.duration_secs = properties.duration().as_secs_f64();
    track.bit_rate = match properties
        .audio_bitrate()
        .or(properties.overall_bitrate())
    {
        Some(kbps) if kbps > 0 => format!("{} kbps", kbps),
        _ => "Unknown".to_string(),
    };
    track.sample_rate = match properties.sample_rate() {
        Some(hz) if hz > 0 => format!("{} Hz", hz),
        _ => "Unknown".to_string(),
    };
    track.channels = match properties.channels() {
        Some(1) => "Mono".to_string(),
        Some(2) => "Stereo".to_string(),
        Some(n) if n > 0 => format!("{} channels", n),
        _ => "Unknown".to_string(),
    };

    let meta = fs::metadata(path)?;
    track.size = format!("{:.2} MB", meta.len() as f64 / (1024.0 * 1024.0));
    track.date_modified = meta
        .modified()
        .ok()
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_secs().to_string())
        .unwrap_or_default();

    Ok(track)
}

// Write, then re-read: callers always see what a subsequent read would see.
pub fn apply_update(path: &Path, updates: &FieldUpdates) -> Result<Track, FormatError> {
    let entries = updates.entries();
    if !entries.is_empty() {
        codecs::write(path, &entries)?;
    }
    normalize_for_display(path)
}

fn base_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string()
}

// A valid FLAC stream with an empty STREAMINFO, a trailing PADDING block
// and no audio frames, enough for tag round-trips in tests.
#[cfg(test)]
pub(crate) fn minimal_flac_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"fLaC");
    // STREAMINFO, 34-byte body, not the last metadata block
    bytes.extend_from_slice(&[0x00, 0, 0, 34]);
    bytes.extend_from_slice(&4096u16.to_be_bytes());
    bytes.extend_from_slice(&4096u16.to_be_bytes());
    bytes.extend_from_slice(&[0; 3]);
    bytes.extend_from_slice(&[0; 3]);
    // 44100 Hz, 2 channels, 16 bits per sample, 0 total samples
    let packed: u64 = (44100u64 << 44) | (1u64 << 41) | (15u64 << 36);
    bytes.extend_from_slice(&packed.to_be_bytes());
    bytes.extend_from_slice(&[0; 16]);
    // PADDING, last metadata block
    bytes.extend_from_slice(&[0x81, 0, 0, 16]);
    bytes.extend_from_slice(&[0; 16]);
    bytes
}

// Two bare CBR frames, 128 kbps at 44100 Hz; no audio payload needed for
// tag round-trips.
#[cfg(test)]
pub(crate) fn minimal_mp3_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    for _ in 0..2 {
        let start = bytes.len();
        bytes.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        bytes.resize(start + 417, 0);
    }
    bytes
}
