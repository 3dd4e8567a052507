use std::fs;
use std::path::Path;

use codecs::{Container, FormatError};
use lofty::picture::{Picture, PictureType};
use lofty::prelude::TaggedFileExt;

const SIBLING_NAMES: &[&str] = &["cover.jpg", "front.jpg", "folder.jpg"];

// embedded front cover first, then a sibling image file, then none
pub fn resolve_cover(path: &Path) -> Result<Option<Vec<u8>>, FormatError> {
    Container::from_path(path)?;
    if !path.exists() {
        return Err(FormatError::MissingFile(path.to_path_buf()));
    }

    let tagged_file = lofty::read_from_path(path)?;
    if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        if let Some(picture) = pick_picture(tag.pictures()) {
            if !picture.data().is_empty() {
                return Ok(Some(picture.data().to_vec()));
            }
        }
    }

    sibling_cover(path)
}

fn pick_picture(pictures: &[Picture]) -> Option<&Picture> {
    pictures
        .iter()
        .find(|picture| picture.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())
}

fn sibling_cover(path: &Path) -> Result<Option<Vec<u8>>, FormatError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => return Ok(None),
    };
    for name in SIBLING_NAMES {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_ascii_lowercase();
            if file_name == *name {
                return Ok(Some(fs::read(entry.path())?));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use codecs::FormatError;

    use super::resolve_cover;
    use crate::minimal_flac_bytes;

    fn fixture(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("track.flac");
        std::fs::write(&path, minimal_flac_bytes()).unwrap();
        path
    }

    #[test]
    fn no_art_anywhere_resolves_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(&dir);
        assert_eq!(resolve_cover(&path).unwrap(), None);
    }

    #[test]
    fn sibling_cover_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(&dir);
        std::fs::write(dir.path().join("cover.jpg"), [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
        assert_eq!(
            resolve_cover(&path).unwrap(),
            Some(vec![0xFF, 0xD8, 0xFF, 0xD9])
        );
    }

    #[test]
    fn sibling_match_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(&dir);
        std::fs::write(dir.path().join("Folder.JPG"), [1, 2, 3]).unwrap();
        assert_eq!(resolve_cover(&path).unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn cover_name_outranks_folder_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(&dir);
        std::fs::write(dir.path().join("folder.jpg"), [9]).unwrap();
        std::fs::write(dir.path().join("cover.jpg"), [1]).unwrap();
        assert_eq!(resolve_cover(&path).unwrap(), Some(vec![1]));
    }

    #[test]
    fn unsupported_extension_is_rejected_before_lookup() {
        let err = resolve_cover(&PathBuf::from("/music/a.wav")).unwrap_err();
        assert!(matches!(err, FormatError::Unsupported(_)));
    }
}
