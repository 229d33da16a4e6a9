//! Local persistence of the last executed script
//!
//! A cached entry is two independent string slots, one for the code and one
//! for its version tag, addressed by keys derived from the source identity.
//!
//! # Slot Pairing
//!
//! | Code slot | Version slot | Treated as |
//! |-----------|--------------|------------|
//! | present | present | cache hit |
//! | absent | any | cache miss |
//! | any | absent | cache miss |
//!
//! Writers always store the code first and the version second; readers
//! take the version first and the code second. A read racing a write can
//! therefore only pair newer code with an older tag, which the next
//! revalidation repairs, never older code with a newer tag. Two loaders
//! for the same identity racing each other is last-write-wins.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::LoaderResult;
use crate::resolver::VersionTag;
use crate::source::SourceIdentity;
use tracing::debug;

/// Key/value persistence on string keys
///
/// Reads never fail: a storage error on read is reported by the store and
/// surfaces as absence.
pub trait CacheStore: Send + Sync {
    /// Read a slot
    fn get(&self, key: &str) -> Option<String>;

    /// Overwrite a slot
    fn set(&self, key: &str, value: &str) -> LoaderResult<()>;
}

/// Pair of slot keys for one (owner, repo, file) triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    pub code: String,
    pub version: String,
}

impl CacheKeys {
    /// Derive keys for a source
    ///
    /// Owner and repo never contain `/`, so the path suffix is unambiguous
    /// and distinct identities never share keys. Branch is not part of the
    /// key.
    pub fn for_source(source: &SourceIdentity) -> Self {
        let path = format!("{}/{}/{}", source.owner(), source.repo(), source.file());
        Self {
            code: format!("gh-cache:code:{}", path),
            version: format!("gh-cache:version:{}", path),
        }
    }
}

/// Code together with the version it was fetched at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub code: String,
    pub version: VersionTag,
}

/// Read both slots, version first; either one missing is a miss
pub fn read_entry(store: &dyn CacheStore, keys: &CacheKeys) -> Option<CachedEntry> {
    let version = store.get(&keys.version);
    let code = store.get(&keys.code);

    match (code, version) {
        (Some(code), Some(version)) => Some(CachedEntry {
            code,
            version: VersionTag::new(version),
        }),
        (code, version) => {
            debug!(
                "Cache miss for {} (code: {}, version: {})",
                keys.code,
                code.is_some(),
                version.is_some()
            );
            None
        }
    }
}

/// Overwrite both slots, code first
///
/// Returns early without touching the version slot if the code write
/// fails.
pub fn write_entry(store: &dyn CacheStore, keys: &CacheKeys, entry: &CachedEntry) -> LoaderResult<()> {
    store.set(&keys.code, &entry.code)?;
    store.set(&keys.version, entry.version.as_str())?;
    debug!("Cached {} at {}", keys.code, entry.version);
    Ok(())
}
