//! Stale-while-revalidate update orchestration
//!
//! One [`Loader::load`] call is one load cycle:
//!
//! | Cache | Critical path | Afterwards |
//! |-------|---------------|------------|
//! | hit | execute cached code | detached check; new code is cached, not run |
//! | miss | resolve, fetch, execute, cache | nothing |
//!
//! Freshness therefore lags by exactly one cycle on the hit path, and the
//! critical path of a hit never touches the network.

use crate::error::{LoaderError, LoaderResult};
use crate::executor::Executor;
use crate::fetcher::ContentFetcher;
use crate::resolver::{VersionResolver, VersionTag};
use crate::source::SourceIdentity;
use crate::store::{read_entry, write_entry, CacheKeys, CacheStore, CachedEntry};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Orchestrator state, logged on each transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Idle,
    Bootstrapping,
    ServingCached,
    BackgroundChecking,
}

impl fmt::Display for LoaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Bootstrapping => "bootstrapping",
            Self::ServingCached => "serving-cached",
            Self::BackgroundChecking => "background-checking",
        };
        f.write_str(name)
    }
}

/// What the critical path of a load cycle ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Cached code was executed; a revalidation was started
    ServedCached { version: VersionTag },
    /// Nothing was cached; fresh code was fetched, executed and cached
    Bootstrapped { version: VersionTag },
}

/// Result of one load cycle
#[derive(Debug)]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    /// Present on a cache hit
    pub revalidation: Option<Revalidation>,
}

/// Detached background revalidation
///
/// Its result is reported only through logs. Dropping this handle does not
/// cancel the task.
#[derive(Debug)]
pub struct Revalidation {
    handle: JoinHandle<()>,
}

impl Revalidation {
    /// Wait up to `grace` for the revalidation to finish
    ///
    /// Returns whether it finished in time. Embedders that are about to
    /// exit use this to give the check a chance to complete.
    pub async fn settle(self, grace: Duration) -> bool {
        match tokio::time::timeout(grace, self.handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!("Background revalidation aborted: {}", e);
                true
            }
            Err(_) => {
                debug!("Background revalidation still running after {:?}", grace);
                false
            }
        }
    }
}

/// Update orchestrator for a single source identity
pub struct Loader {
    source: SourceIdentity,
    keys: CacheKeys,
    store: Arc<dyn CacheStore>,
    resolver: Arc<dyn VersionResolver>,
    fetcher: Arc<dyn ContentFetcher>,
    executor: Arc<dyn Executor>,
}

impl Loader {
    pub fn new(
        source: SourceIdentity,
        store: Arc<dyn CacheStore>,
        resolver: Arc<dyn VersionResolver>,
        fetcher: Arc<dyn ContentFetcher>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let keys = CacheKeys::for_source(&source);
        Self {
            source,
            keys,
            store,
            resolver,
            fetcher,
            executor,
        }
    }

    pub fn source(&self) -> &SourceIdentity {
        &self.source
    }

    /// Run one load cycle
    ///
    /// Errors only when nothing was cached and the remote could not supply
    /// code; in that case nothing was executed and the cache is untouched.
    pub async fn load(&self) -> LoaderResult<LoadReport> {
        self.transition(LoaderState::Idle);

        match read_entry(self.store.as_ref(), &self.keys) {
            Some(entry) => Ok(self.serve_cached(entry)),
            None => self.bootstrap().await,
        }
    }

    fn serve_cached(&self, entry: CachedEntry) -> LoadReport {
        self.transition(LoaderState::ServingCached);
        info!("Running cached {} ({})", self.source, entry.version);
        self.executor.execute(&entry.code);

        // Spawned only after execution returned, so no request is issued
        // before the cached script has run
        let check = BackgroundCheck {
            source: self.source.clone(),
            keys: self.keys.clone(),
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
            fetcher: Arc::clone(&self.fetcher),
        };
        let cached = entry.version.clone();
        let handle = tokio::spawn(async move { check.run(cached).await });

        LoadReport {
            outcome: LoadOutcome::ServedCached {
                version: entry.version,
            },
            revalidation: Some(Revalidation { handle }),
        }
    }

    async fn bootstrap(&self) -> LoaderResult<LoadReport> {
        self.transition(LoaderState::Bootstrapping);
        info!("No cached copy of {}, fetching", self.source);

        let failed = || LoaderError::BootstrapFailed(self.source.to_string());

        let version = self
            .resolver
            .latest_version(&self.source)
            .await
            .ok_or_else(failed)?;
        let code = self
            .fetcher
            .fetch(&self.source, &version)
            .await
            .ok_or_else(failed)?;

        self.executor.execute(&code);

        let entry = CachedEntry {
            code,
            version: version.clone(),
        };
        if let Err(e) = write_entry(self.store.as_ref(), &self.keys, &entry) {
            error!("Failed to cache {}: {}", self.source, e);
        }

        self.transition(LoaderState::Idle);
        Ok(LoadReport {
            outcome: LoadOutcome::Bootstrapped { version },
            revalidation: None,
        })
    }

    fn transition(&self, state: LoaderState) {
        debug!("{}: {}", self.source, state);
    }
}

/// Everything the detached check needs, owned
struct BackgroundCheck {
    source: SourceIdentity,
    keys: CacheKeys,
    store: Arc<dyn CacheStore>,
    resolver: Arc<dyn VersionResolver>,
    fetcher: Arc<dyn ContentFetcher>,
}

impl BackgroundCheck {
    async fn run(self, cached: VersionTag) {
        debug!("{}: {}", self.source, LoaderState::BackgroundChecking);

        let Some(latest) = self.resolver.latest_version(&self.source).await else {
            warn!("Could not check {} for updates, keeping {}", self.source, cached);
            return;
        };

        if latest == cached {
            debug!("{} is up to date at {}", self.source, cached);
            return;
        }

        let Some(code) = self.fetcher.fetch(&self.source, &latest).await else {
            warn!("Update of {} to {} not cached", self.source, latest);
            return;
        };

        let entry = CachedEntry {
            code,
            version: latest,
        };
        match write_entry(self.store.as_ref(), &self.keys, &entry) {
            Ok(()) => info!(
                "{} updated in cache ({} -> {}), will apply on next load",
                self.source.file(),
                cached,
                entry.version
            ),
            Err(e) => error!("Failed to cache update of {}: {}", self.source, e),
        }

        debug!("{}: {}", self.source, LoaderState::Idle);
    }
}
