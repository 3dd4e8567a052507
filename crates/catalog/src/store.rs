use std::fs;
use std::path::Path;
use std::sync::Arc;

use common::Track;
use redb::{
    CommitError, Database, DatabaseError, ReadableTable, StorageError, TableDefinition, TableError,
    TransactionError, WriteTransaction,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const CATALOG_VERSION: u32 = 1;

const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");
const TRACKS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tracks");

const META_VERSION_KEY: &str = "version";
const META_SEQ_KEY: &str = "next_seq";

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Redb(redb::Error),
    Bincode(Box<bincode::ErrorKind>),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "io error: {}", err),
            CatalogError::Redb(err) => write!(f, "storage error: {}", err),
            CatalogError::Bincode(err) => write!(f, "encoding error: {}", err),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<redb::Error> for CatalogError {
    fn from(err: redb::Error) -> Self {
        CatalogError::Redb(err)
    }
}

impl From<DatabaseError> for CatalogError {
    fn from(err: DatabaseError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<TableError> for CatalogError {
    fn from(err: TableError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<TransactionError> for CatalogError {
    fn from(err: TransactionError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<StorageError> for CatalogError {
    fn from(err: StorageError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<CommitError> for CatalogError {
    fn from(err: CommitError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<Box<bincode::ErrorKind>> for CatalogError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        CatalogError::Bincode(err)
    }
}

// the insertion sequence is the final sort tie-break
#[derive(Serialize, Deserialize)]
struct StoredTrack {
    seq: u64,
    track: Track,
}

// Persisted track catalog, keyed by path. One write transaction at a time;
// reads see a consistent snapshot.
#[derive(Clone)]
pub struct CatalogStore {
    db: Arc<Database>,
}

impl CatalogStore {
    pub fn open(path: &Path) -> Result<CatalogStore, CatalogError> {
        let db = open_or_create_db(path)?;
        let store = CatalogStore { db: Arc::new(db) };
        match store.read_version()? {
            Some(version) if version == CATALOG_VERSION => {
                info!("Opened catalog at {:?}", path);
            }
            Some(version) => {
                warn!("Catalog version mismatch ({}); resetting", version);
                store.reset()?;
            }
            None => {
                store.reset()?;
            }
        }
        Ok(store)
    }

    // existing rows are left untouched, so re-inserting is a no-op
    pub fn bulk_insert(&self, tracks: &[Track]) -> Result<usize, CatalogError> {
        let write_txn = self.db.begin_write()?;
        let inserted = {
            let mut meta_table = write_txn.open_table(META_TABLE)?;
            let mut tracks_table = write_txn.open_table(TRACKS_TABLE)?;
            let mut next_seq: u64 = match meta_table.get(META_SEQ_KEY)? {
                Some(value) => decode_value(value.value())?,
                None => 0,
            };
            let mut inserted = 0usize;
            for track in tracks {
                if tracks_table.get(track.path.as_str())?.is_some() {
                    continue;
                }
                let stored = StoredTrack {
                    seq: next_seq,
                    track: track.clone(),
                };
                let bytes = encode_value(&stored)?;
                tracks_table.insert(track.path.as_str(), bytes.as_slice())?;
                next_seq += 1;
                inserted += 1;
            }
            meta_table.insert(META_SEQ_KEY, encode_value(&next_seq)?.as_slice())?;
            inserted
        };
        write_txn.commit()?;
        Ok(inserted)
    }

    // display order: artist, album, disc, track; text keys case-insensitive,
    // absent numbers last, ties broken by insertion order
    pub fn select_all(&self) -> Result<Vec<Track>, CatalogError> {
        let mut rows = self.stored_rows()?;
        rows.sort_by(|a, b| {
            a.track
                .artist
                .to_lowercase()
                .cmp(&b.track.artist.to_lowercase())
                .then_with(|| {
                    a.track
                        .album
                        .to_lowercase()
                        .cmp(&b.track.album.to_lowercase())
                })
                .then_with(|| {
                    sort_number(&a.track.disc_number).cmp(&sort_number(&b.track.disc_number))
                })
                .then_with(|| {
                    sort_number(&a.track.track_number).cmp(&sort_number(&b.track.track_number))
                })
                .then_with(|| a.seq.cmp(&b.seq))
        });
        Ok(rows.into_iter().map(|stored| stored.track).collect())
    }

    pub fn select_by_path(&self, path: &str) -> Result<Option<Track>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(TRACKS_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let track = match table.get(path)? {
            Some(value) => {
                let stored: StoredTrack = decode_value(value.value())?;
                Some(stored.track)
            }
            None => None,
        };
        Ok(track)
    }

    // path, play count, date added and insertion sequence all survive;
    // false when the path is not in the catalog
    pub fn update_fields(&self, path: &str, changed: &Track) -> Result<bool, CatalogError> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut tracks_table = write_txn.open_table(TRACKS_TABLE)?;
            let existing: Option<StoredTrack> = match tracks_table.get(path)? {
                Some(value) => Some(decode_value(value.value())?),
                None => None,
            };
            match existing {
                Some(stored) => {
                    let mut track = changed.clone();
                    track.path = stored.track.path.clone();
                    track.play_count = stored.track.play_count;
                    track.date_added = stored.track.date_added.clone();
                    let bytes = encode_value(&StoredTrack {
                        seq: stored.seq,
                        track,
                    })?;
                    tracks_table.insert(path, bytes.as_slice())?;
                    true
                }
                None => false,
            }
        };
        write_txn.commit()?;
        Ok(updated)
    }

    pub fn increment_play_count(&self, path: &str) -> Result<bool, CatalogError> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut tracks_table = write_txn.open_table(TRACKS_TABLE)?;
            let existing: Option<StoredTrack> = match tracks_table.get(path)? {
                Some(value) => Some(decode_value(value.value())?),
                None => None,
            };
            match existing {
                Some(mut stored) => {
                    stored.track.play_count = stored.track.play_count.saturating_add(1);
                    let bytes = encode_value(&stored)?;
                    tracks_table.insert(path, bytes.as_slice())?;
                    true
                }
                None => false,
            }
        };
        write_txn.commit()?;
        Ok(updated)
    }

    // the only operation that ever removes a row
    pub fn delete_by_paths(&self, paths: &[String]) -> Result<usize, CatalogError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut tracks_table = write_txn.open_table(TRACKS_TABLE)?;
            let mut removed = 0usize;
            for path in paths {
                if tracks_table.remove(path.as_str())?.is_some() {
                    removed += 1;
                }
            }
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    pub fn all_paths(&self) -> Result<Vec<String>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(TRACKS_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut paths = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            paths.push(entry.0.value().to_string());
        }
        Ok(paths)
    }

    fn stored_rows(&self) -> Result<Vec<StoredTrack>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(TRACKS_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut rows = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            rows.push(decode_value(entry.1.value())?);
        }
        Ok(rows)
    }

    fn read_version(&self) -> Result<Option<u32>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(META_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let version = match table.get(META_VERSION_KEY)? {
            Some(value) => Some(decode_value(value.value())?),
            None => None,
        };
        Ok(version)
    }

    fn reset(&self) -> Result<(), CatalogError> {
        let write_txn = self.db.begin_write()?;
        clear_table(&write_txn, META_TABLE)?;
        clear_table(&write_txn, TRACKS_TABLE)?;
        {
            let mut meta_table = write_txn.open_table(META_TABLE)?;
            meta_table.insert(
                META_VERSION_KEY,
                encode_value(&CATALOG_VERSION)?.as_slice(),
            )?;
            meta_table.insert(META_SEQ_KEY, encode_value(&0u64)?.as_slice())?;
            let _ = write_txn.open_table(TRACKS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

// missing or malformed numbers sort after everything else
fn sort_number(value: &str) -> u32 {
    value.trim().parse().unwrap_or(u32::MAX)
}

fn open_or_create_db(path: &Path) -> Result<Database, CatalogError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

fn clear_table(
    txn: &WriteTransaction,
    table: TableDefinition<&str, &[u8]>,
) -> Result<(), CatalogError> {
    match txn.delete_table(table) {
        Ok(_) => Ok(()),
        Err(TableError::TableDoesNotExist(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, CatalogError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, CatalogError> {
    Ok(bincode::deserialize(bytes)?)
}
