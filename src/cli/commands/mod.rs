//! CLI command implementations

pub mod config;
pub mod run;
pub mod status;

pub use config::execute as config;
pub use run::execute as run;
pub use status::execute as status;

use crate::cli::args::TargetArgs;
use crate::config::{Config, ConfigManager};
use crate::error::LoaderResult;
use crate::source::{ArgsProvider, SettingsProvider, SourceIdentity, SourceProvider};
use std::path::PathBuf;
use tracing::debug;

/// Resolve the source identity from command arguments, or from the
/// `[source]` config table when no target was given
pub(crate) fn resolve_source(target: &TargetArgs, config: &Config) -> LoaderResult<SourceIdentity> {
    let provider: Box<dyn SourceProvider> = match &target.target {
        Some(slug) => Box::new(ArgsProvider::new(
            slug.clone(),
            target.file.clone(),
            target.branch.clone(),
        )),
        None => {
            let mut source = config.source.clone();
            if let Some(file) = &target.file {
                source.file = file.clone();
            }
            if let Some(branch) = &target.branch {
                source.branch = branch.clone();
            }
            Box::new(SettingsProvider::new(&source))
        }
    };

    debug!("Resolving source from {}", provider.label());
    SourceIdentity::from_provider(provider.as_ref())
}

/// Cache directory from the flag, else from config
pub(crate) fn cache_dir(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.unwrap_or_else(|| ConfigManager::cache_dir(config))
}
