use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{now_secs, CatalogRow, Track};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::scan::LibraryScanner;
use crate::store::{CatalogError, CatalogStore};

// checked between files during a sync
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// scanned counts every processed candidate, failures included
#[derive(Clone, Copy, Debug)]
pub struct SyncProgress {
    pub scanned: usize,
    pub total: usize,
    pub added: usize,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub added: Vec<Track>,
    pub unreadable: Vec<PathBuf>,
}

#[derive(Debug)]
pub enum SyncError {
    Busy,
    Catalog(CatalogError),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Busy => write!(f, "a sync is already in progress"),
            SyncError::Catalog(err) => write!(f, "catalog error: {}", err),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<CatalogError> for SyncError {
    fn from(err: CatalogError) -> Self {
        SyncError::Catalog(err)
    }
}

// Add-only: rows are never modified or removed here, even when a backing
// file has changed or disappeared.
pub struct CatalogSynchronizer {
    store: CatalogStore,
    scanner: LibraryScanner,
    guard: Arc<Mutex<()>>,
}

impl CatalogSynchronizer {
    pub fn new(store: CatalogStore, roots: Vec<PathBuf>) -> Self {
        Self {
            store,
            scanner: LibraryScanner::new(roots),
            guard: Arc::new(Mutex::new(())),
        }
    }

    // unreadable files are recorded and skipped; a second concurrent call
    // is rejected with Busy
    pub fn sync<F>(&self, cancel: &CancelFlag, mut progress: F) -> Result<SyncReport, SyncError>
    where
        F: FnMut(SyncProgress),
    {
        let _guard = match self.guard.try_lock() {
            Some(guard) => guard,
            None => return Err(SyncError::Busy),
        };

        let known: HashSet<String> = self.store.all_paths()?.into_iter().collect();
        let candidates: Vec<PathBuf> = self
            .scanner
            .scan()
            .into_iter()
            .filter(|path| !known.contains(&path.display().to_string()))
            .collect();
        let total = candidates.len();
        info!("catalog sync: {} candidate files", total);

        let mut report = SyncReport::default();
        for (index, path) in candidates.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("catalog sync cancelled after {} of {} files", index, total);
                break;
            }
            match metadata::normalize_for_display(path) {
                Ok(mut track) => {
                    track.play_count = 0;
                    track.date_added = now_secs().to_string();
                    report.added.push(track);
                }
                Err(err) => {
                    warn!("skipping {}: {}", path.display(), err);
                    report.unreadable.push(path.clone());
                }
            }
            progress(SyncProgress {
                scanned: index + 1,
                total,
                added: report.added.len(),
            });
        }

        self.store.bulk_insert(&report.added)?;
        info!(
            "catalog sync finished: {} added, {} unreadable",
            report.added.len(),
            report.unreadable.len()
        );
        Ok(report)
    }

    // a track on unplugged removable media stays in the catalog
    pub fn check_availability(&self) -> Result<Vec<CatalogRow>, SyncError> {
        let rows = self
            .store
            .select_all()?
            .into_iter()
            .map(|track| {
                let available = Path::new(&track.path).exists();
                CatalogRow { track, available }
            })
            .collect();
        Ok(rows)
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }
}
