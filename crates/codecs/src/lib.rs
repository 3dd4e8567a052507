use std::path::{Path, PathBuf};

use lofty::config::WriteOptions;
use lofty::error::LoftyError;
use lofty::prelude::{AudioFile, ItemKey, TagExt, TaggedFileExt};
use lofty::properties::FileProperties;
use lofty::tag::{Tag, TagType};

#[derive(Debug)]
pub enum FormatError {
    Unsupported(String),
    MissingFile(PathBuf),
    Unreadable(LoftyError),
    Io(std::io::Error),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Unsupported(ext) => write!(f, "unsupported format: {}", ext),
            FormatError::MissingFile(path) => write!(f, "missing file: {}", path.display()),
            FormatError::Unreadable(err) => write!(f, "unreadable file: {}", err),
            FormatError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<LoftyError> for FormatError {
    fn from(err: LoftyError) -> Self {
        FormatError::Unreadable(err)
    }
}

impl From<std::io::Error> for FormatError {
    fn from(err: std::io::Error) -> Self {
        FormatError::Io(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Mpeg,
    Flac,
    Vorbis,
    Mp4,
    WavPack,
}

impl Container {
    pub fn from_path(path: &Path) -> Result<Container, FormatError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "mp3" => Ok(Container::Mpeg),
            "flac" => Ok(Container::Flac),
            "ogg" => Ok(Container::Vorbis),
            "m4a" => Ok(Container::Mp4),
            "wv" => Ok(Container::WavPack),
            _ => Err(FormatError::Unsupported(path.display().to_string())),
        }
    }

    pub fn tag_type(&self) -> TagType {
        match self {
            Container::Mpeg => TagType::Id3v2,
            Container::Flac | Container::Vorbis => TagType::VorbisComments,
            Container::Mp4 => TagType::Mp4Ilst,
            Container::WavPack => TagType::Ape,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Container::Mpeg => "mp3",
            Container::Flac => "flac",
            Container::Vorbis => "ogg",
            Container::Mp4 => "m4a",
            Container::WavPack => "wv",
        }
    }
}

pub fn is_valid_file(path: &Path) -> bool {
    Container::from_path(path).is_ok()
}

// Raw key names never leave this crate; callers work in these fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagField {
    Title,
    Artist,
    Album,
    AlbumArtist,
    Genre,
    Year,
    TrackNumber,
    TotalTracks,
    DiscNumber,
    TotalDiscs,
    Composer,
    Publisher,
    Comment,
    Bpm,
    Rating,
}

// Canonical key first (it is also the write target), legacy spellings after.
fn candidate_keys(container: Container, field: TagField) -> Vec<ItemKey> {
    use TagField::*;
    match field {
        Title => vec![ItemKey::TrackTitle],
        Artist => vec![ItemKey::TrackArtist],
        Album => vec![ItemKey::AlbumTitle],
        Genre => vec![ItemKey::Genre],
        TrackNumber => vec![ItemKey::TrackNumber],
        DiscNumber => vec![ItemKey::DiscNumber],
        Composer => vec![ItemKey::Composer],
        Comment => vec![ItemKey::Comment],
        Bpm => vec![ItemKey::Bpm],
        AlbumArtist => match container {
            Container::Flac | Container::Vorbis => vec![
                ItemKey::AlbumArtist,
                ItemKey::Unknown("ALBUM ARTIST".to_string()),
            ],
            _ => vec![ItemKey::AlbumArtist],
        },
        Year => match container {
            Container::WavPack => vec![ItemKey::Year, ItemKey::RecordingDate],
            _ => vec![ItemKey::RecordingDate, ItemKey::Year],
        },
        TotalTracks => match container {
            Container::Flac | Container::Vorbis => vec![
                ItemKey::TrackTotal,
                ItemKey::Unknown("TOTALTRACKS".to_string()),
            ],
            _ => vec![ItemKey::TrackTotal],
        },
        TotalDiscs => match container {
            Container::Flac | Container::Vorbis => vec![
                ItemKey::DiscTotal,
                ItemKey::Unknown("TOTALDISCS".to_string()),
            ],
            _ => vec![ItemKey::DiscTotal],
        },
        Publisher => match container {
            Container::Flac | Container::Vorbis => vec![
                ItemKey::Label,
                ItemKey::Unknown("PUBLISHER".to_string()),
            ],
            Container::WavPack => vec![
                ItemKey::Label,
                ItemKey::Unknown("Publisher".to_string()),
            ],
            _ => vec![ItemKey::Label],
        },
        Rating => match container {
            Container::Mpeg => vec![ItemKey::Popularimeter],
            Container::Flac | Container::Vorbis => vec![
                ItemKey::Unknown("RATING".to_string()),
                ItemKey::Popularimeter,
            ],
            Container::Mp4 => vec![ItemKey::Unknown(
                "----:com.apple.iTunes:RATING".to_string(),
            )],
            Container::WavPack => vec![ItemKey::Unknown("Rating".to_string())],
        },
    }
}

fn primary_key(container: Container, field: TagField) -> Option<ItemKey> {
    candidate_keys(container, field).into_iter().next()
}

// An absent denominator is empty text, not an error.
fn split_pair(value: &str) -> (&str, &str) {
    match value.split_once('/') {
        Some((numerator, denominator)) => (numerator.trim(), denominator.trim()),
        None => (value.trim(), ""),
    }
}

fn raw_chain_value(tag: &Tag, container: Container, field: TagField) -> Option<String> {
    for key in candidate_keys(container, field) {
        if let Some(value) = tag.get_string(&key) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

pub struct RawTagSet {
    container: Container,
    tag: Tag,
    properties: FileProperties,
}

impl RawTagSet {
    pub fn container(&self) -> Container {
        self.container
    }

    pub fn properties(&self) -> &FileProperties {
        &self.properties
    }

    pub fn get(&self, field: TagField) -> Option<String> {
        if let Some(value) = raw_chain_value(&self.tag, self.container, field) {
            return Some(match field {
                TagField::TrackNumber | TagField::DiscNumber => {
                    split_pair(&value).0.to_string()
                }
                _ => value,
            });
        }
        // A combined "N/M" numerator cell carries the denominator when no
        // dedicated total key is present.
        match field {
            TagField::TotalTracks => self.pair_denominator(TagField::TrackNumber),
            TagField::TotalDiscs => self.pair_denominator(TagField::DiscNumber),
            _ => None,
        }
    }

    fn pair_denominator(&self, numerator: TagField) -> Option<String> {
        let value = raw_chain_value(&self.tag, self.container, numerator)?;
        let denominator = split_pair(&value).1;
        if denominator.is_empty() {
            None
        } else {
            Some(denominator.to_string())
        }
    }
}

// A file with no tag at all yields an empty tag set, not an error.
pub fn read(path: &Path) -> Result<RawTagSet, FormatError> {
    let container = Container::from_path(path)?;
    if !path.exists() {
        return Err(FormatError::MissingFile(path.to_path_buf()));
    }
    let tagged_file = lofty::read_from_path(path)?;
    let properties = tagged_file.properties().clone();
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
        .cloned()
        .unwrap_or_else(|| Tag::new(container.tag_type()));
    Ok(RawTagSet {
        container,
        tag,
        properties,
    })
}

// Read-modify-write: only the supplied fields touch their keys; every other
// tag item, including pictures, is preserved. Empty values are skipped.
pub fn write(path: &Path, updates: &[(TagField, String)]) -> Result<(), FormatError> {
    let container = Container::from_path(path)?;
    if !path.exists() {
        return Err(FormatError::MissingFile(path.to_path_buf()));
    }
    let mut tagged_file = lofty::read_from_path(path)?;
    let tag_type = container.tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let staged = match tagged_file.tag(tag_type) {
        Some(tag) => stage_updates(tag, container, updates),
        None => return Err(FormatError::Unsupported(container.label().to_string())),
    };
    if staged.is_empty() {
        return Ok(());
    }
    let tag = match tagged_file.tag_mut(tag_type) {
        Some(tag) => tag,
        None => return Err(FormatError::Unsupported(container.label().to_string())),
    };
    for (key, value) in staged {
        tag.insert_text(key, value);
    }
    tag.save_to_path(path, WriteOptions::default())?;
    Ok(())
}

fn stage_updates(
    tag: &Tag,
    container: Container,
    updates: &[(TagField, String)],
) -> Vec<(ItemKey, String)> {
    let mut staged = Vec::new();
    let mut track_pair: (Option<String>, Option<String>) = (None, None);
    let mut disc_pair: (Option<String>, Option<String>) = (None, None);
    for (field, value) in updates {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match field {
            TagField::TrackNumber => track_pair.0 = Some(value.to_string()),
            TagField::TotalTracks => track_pair.1 = Some(value.to_string()),
            TagField::DiscNumber => disc_pair.0 = Some(value.to_string()),
            TagField::TotalDiscs => disc_pair.1 = Some(value.to_string()),
            _ => {
                if let Some(key) = primary_key(container, *field) {
                    staged.push((key, value.to_string()));
                }
            }
        }
    }
    stage_pair(
        tag,
        container,
        TagField::TrackNumber,
        TagField::TotalTracks,
        track_pair,
        &mut staged,
    );
    stage_pair(
        tag,
        container,
        TagField::DiscNumber,
        TagField::TotalDiscs,
        disc_pair,
        &mut staged,
    );
    staged
}

// A numerator cell holding a combined "N/M" carries both sides of the pair.
// A one-sided update must merge with the stored counterpart, never overwrite
// it.
fn stage_pair(
    tag: &Tag,
    container: Container,
    numerator_field: TagField,
    total_field: TagField,
    update: (Option<String>, Option<String>),
    staged: &mut Vec<(ItemKey, String)>,
) {
    let (numerator, total) = update;
    if numerator.is_none() && total.is_none() {
        return;
    }
    let existing = raw_chain_value(tag, container, numerator_field);
    let (old_numerator, old_denominator) = match existing.as_deref() {
        Some(value) => split_pair(value),
        None => ("", ""),
    };
    if !old_denominator.is_empty() {
        let merged_numerator = numerator.as_deref().unwrap_or(old_numerator);
        let merged_denominator = total.as_deref().unwrap_or(old_denominator);
        if let Some(key) = primary_key(container, numerator_field) {
            staged.push((key, format!("{}/{}", merged_numerator, merged_denominator)));
        }
        // a dedicated total item, if present, must not go stale
        if total.is_some() && raw_chain_value(tag, container, total_field).is_some() {
            if let (Some(value), Some(key)) = (total, primary_key(container, total_field)) {
                staged.push((key, value));
            }
        }
        return;
    }
    if let Some(value) = numerator {
        if let Some(key) = primary_key(container, numerator_field) {
            staged.push((key, value));
        }
    }
    if let Some(value) = total {
        if let Some(key) = primary_key(container, total_field) {
            staged.push((key, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use lofty::prelude::ItemKey;
    use lofty::properties::FileProperties;
    use lofty::tag::{ItemValue, Tag, TagItem};

    use super::{
        candidate_keys, is_valid_file, split_pair, stage_updates, Container, FormatError,
        RawTagSet, TagField,
    };

    fn tag_set(container: Container, items: &[(ItemKey, &str)]) -> RawTagSet {
        let mut tag = Tag::new(container.tag_type());
        for (key, value) in items {
            tag.insert_unchecked(TagItem::new(
                key.clone(),
                ItemValue::Text(value.to_string()),
            ));
        }
        RawTagSet {
            container,
            tag,
            properties: FileProperties::default(),
        }
    }

    #[test]
    fn extension_mapping_is_case_insensitive() {
        assert_eq!(
            Container::from_path(Path::new("a.MP3")).unwrap(),
            Container::Mpeg
        );
        assert_eq!(
            Container::from_path(Path::new("a.Flac")).unwrap(),
            Container::Flac
        );
        assert_eq!(
            Container::from_path(Path::new("a.wv")).unwrap(),
            Container::WavPack
        );
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        assert!(matches!(
            Container::from_path(Path::new("a.wav")),
            Err(FormatError::Unsupported(_))
        ));
        assert!(!is_valid_file(Path::new("notes.txt")));
        assert!(!is_valid_file(Path::new("no_extension")));
        assert!(is_valid_file(Path::new("song.ogg")));
    }

    #[test]
    fn pair_splitting() {
        assert_eq!(split_pair("3/12"), ("3", "12"));
        assert_eq!(split_pair(" 3 / 12 "), ("3", "12"));
        assert_eq!(split_pair("7"), ("7", ""));
        assert_eq!(split_pair("7/"), ("7", ""));
    }

    #[test]
    fn canonical_key_leads_every_chain() {
        let chain = candidate_keys(Container::Flac, TagField::AlbumArtist);
        assert_eq!(chain[0], ItemKey::AlbumArtist);
        assert_eq!(chain[1], ItemKey::Unknown("ALBUM ARTIST".to_string()));

        let chain = candidate_keys(Container::Vorbis, TagField::Publisher);
        assert_eq!(chain[0], ItemKey::Label);
    }

    #[test]
    fn legacy_key_resolves_when_canonical_absent() {
        let set = tag_set(
            Container::Flac,
            &[(ItemKey::Unknown("ALBUM ARTIST".to_string()), "Various")],
        );
        assert_eq!(set.get(TagField::AlbumArtist).as_deref(), Some("Various"));
    }

    #[test]
    fn canonical_key_wins_over_legacy() {
        let set = tag_set(
            Container::Flac,
            &[
                (ItemKey::AlbumArtist, "Canonical"),
                (ItemKey::Unknown("ALBUM ARTIST".to_string()), "Legacy"),
            ],
        );
        assert_eq!(set.get(TagField::AlbumArtist).as_deref(), Some("Canonical"));
    }

    #[test]
    fn combined_pair_splits_into_both_fields() {
        let set = tag_set(Container::Mpeg, &[(ItemKey::TrackNumber, "3/12")]);
        assert_eq!(set.get(TagField::TrackNumber).as_deref(), Some("3"));
        assert_eq!(set.get(TagField::TotalTracks).as_deref(), Some("12"));
    }

    #[test]
    fn dedicated_total_key_wins_over_pair_denominator() {
        let set = tag_set(
            Container::Mpeg,
            &[
                (ItemKey::TrackNumber, "3/12"),
                (ItemKey::TrackTotal, "14"),
            ],
        );
        assert_eq!(set.get(TagField::TotalTracks).as_deref(), Some("14"));
    }

    #[test]
    fn lone_numerator_has_empty_denominator() {
        let set = tag_set(Container::Mpeg, &[(ItemKey::DiscNumber, "1")]);
        assert_eq!(set.get(TagField::DiscNumber).as_deref(), Some("1"));
        assert_eq!(set.get(TagField::TotalDiscs), None);
    }

    #[test]
    fn numerator_update_merges_into_a_combined_cell() {
        let set = tag_set(Container::Flac, &[(ItemKey::TrackNumber, "3/12")]);
        let staged = stage_updates(
            &set.tag,
            Container::Flac,
            &[(TagField::TrackNumber, "5".to_string())],
        );
        assert_eq!(staged, vec![(ItemKey::TrackNumber, "5/12".to_string())]);
    }

    #[test]
    fn total_update_merges_into_a_combined_cell() {
        let set = tag_set(Container::Flac, &[(ItemKey::TrackNumber, "3/12")]);
        let staged = stage_updates(
            &set.tag,
            Container::Flac,
            &[(TagField::TotalTracks, "14".to_string())],
        );
        assert_eq!(staged, vec![(ItemKey::TrackNumber, "3/14".to_string())]);
    }

    #[test]
    fn both_sides_supplied_replace_the_combined_cell() {
        let set = tag_set(Container::Flac, &[(ItemKey::TrackNumber, "3/12")]);
        let staged = stage_updates(
            &set.tag,
            Container::Flac,
            &[
                (TagField::TrackNumber, "5".to_string()),
                (TagField::TotalTracks, "14".to_string()),
            ],
        );
        assert_eq!(staged, vec![(ItemKey::TrackNumber, "5/14".to_string())]);
    }

    #[test]
    fn separate_pair_items_stay_separate() {
        let set = tag_set(
            Container::Mpeg,
            &[(ItemKey::TrackNumber, "3"), (ItemKey::TrackTotal, "12")],
        );
        let staged = stage_updates(
            &set.tag,
            Container::Mpeg,
            &[(TagField::TrackNumber, "5".to_string())],
        );
        assert_eq!(staged, vec![(ItemKey::TrackNumber, "5".to_string())]);
    }

    #[test]
    fn missing_file_is_distinct_from_unreadable() {
        assert!(matches!(
            super::read(Path::new("/nonexistent/file.mp3")),
            Err(FormatError::MissingFile(_))
        ));
    }
}
