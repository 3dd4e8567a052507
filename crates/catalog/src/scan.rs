use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::warn;
use walkdir::WalkDir;

// output is sorted and duplicate-free, so a scan over a fixed filesystem
// state is deterministic
pub struct LibraryScanner {
    roots: Vec<PathBuf>,
}

impl LibraryScanner {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn scan(&self) -> Vec<PathBuf> {
        let mut found = BTreeSet::new();
        for root in &self.roots {
            for entry in WalkDir::new(root).follow_links(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!("scan error under {:?}: {}", root, err);
                        continue;
                    }
                };
                if entry.file_type().is_file() && codecs::is_valid_file(entry.path()) {
                    found.insert(entry.path().to_path_buf());
                }
            }
        }
        found.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::LibraryScanner;

    #[test]
    fn finds_supported_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("one.mp3"), b"x").unwrap();
        fs::write(dir.path().join("a/two.FLAC"), b"x").unwrap();
        fs::write(dir.path().join("a/b/three.wv"), b"x").unwrap();
        fs::write(dir.path().join("a/notes.txt"), b"x").unwrap();
        fs::write(dir.path().join("a/four.wav"), b"x").unwrap();

        let scanner = LibraryScanner::new(vec![dir.path().to_path_buf()]);
        let found = scanner.scan();
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|p| p.is_file()));
    }

    #[test]
    fn overlapping_roots_do_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/song.ogg"), b"x").unwrap();

        let scanner = LibraryScanner::new(vec![
            dir.path().to_path_buf(),
            dir.path().join("sub"),
        ]);
        assert_eq!(scanner.scan().len(), 1);
    }

    #[test]
    fn repeated_scans_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.mp3"), b"x").unwrap();
        fs::write(dir.path().join("a.mp3"), b"x").unwrap();

        let scanner = LibraryScanner::new(vec![dir.path().to_path_buf()]);
        let first = scanner.scan();
        let second = scanner.scan();
        assert_eq!(first, second);
        assert!(first[0] < first[1]);
    }

    #[test]
    fn missing_root_yields_no_files() {
        let scanner = LibraryScanner::new(vec!["/nonexistent/root".into()]);
        assert!(scanner.scan().is_empty());
    }
}
