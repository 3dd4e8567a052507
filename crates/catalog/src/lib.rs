pub mod scan;
pub mod store;
pub mod sync;

pub use scan::LibraryScanner;
pub use store::{CatalogError, CatalogStore};
pub use sync::{CancelFlag, CatalogSynchronizer, SyncError, SyncProgress, SyncReport};
