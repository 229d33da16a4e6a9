//! Source identity and how it is resolved
//!
//! A loader only ever needs owner, repo, file and branch. Where those come
//! from is up to the embedding context: the `[source]` table of the config
//! file, or attributes given on a single invocation. Both are expressed as
//! a [`SourceProvider`] producing a [`RawSource`], which
//! [`SourceIdentity::resolve`] validates and fills with defaults.

use crate::config::schema::SourceConfig;
use crate::error::{LoaderError, LoaderResult};
use std::fmt;

/// File loaded when none is configured
pub const DEFAULT_FILE: &str = "main.js";

/// Branch tracked when none is configured
pub const DEFAULT_BRANCH: &str = "main";

/// Unvalidated source fields, as handed over by a provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSource {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub file: Option<String>,
    pub branch: Option<String>,
}

/// Strategy for obtaining the source fields
pub trait SourceProvider {
    /// Short label used in diagnostics
    fn label(&self) -> &'static str;

    /// Produce the raw, unvalidated fields
    fn raw_source(&self) -> RawSource;
}

/// Reads the `[source]` table of the configuration file
pub struct SettingsProvider {
    source: SourceConfig,
}

impl SettingsProvider {
    pub fn new(source: &SourceConfig) -> Self {
        Self {
            source: source.clone(),
        }
    }
}

impl SourceProvider for SettingsProvider {
    fn label(&self) -> &'static str {
        "settings"
    }

    fn raw_source(&self) -> RawSource {
        RawSource {
            owner: self.source.owner.clone(),
            repo: self.source.repo.clone(),
            file: Some(self.source.file.clone()),
            branch: Some(self.source.branch.clone()),
        }
    }
}

/// Reads per-invocation attributes: an `OWNER/REPO[@BRANCH]` target plus
/// optional file and branch overrides
pub struct ArgsProvider {
    target: String,
    file: Option<String>,
    branch: Option<String>,
}

impl ArgsProvider {
    pub fn new(target: impl Into<String>, file: Option<String>, branch: Option<String>) -> Self {
        Self {
            target: target.into(),
            file,
            branch,
        }
    }
}

impl SourceProvider for ArgsProvider {
    fn label(&self) -> &'static str {
        "arguments"
    }

    fn raw_source(&self) -> RawSource {
        let (slug, pinned_branch) = match self.target.split_once('@') {
            Some((slug, branch)) => (slug, Some(branch.to_string())),
            None => (self.target.as_str(), None),
        };

        // "owner/repo"; anything after a second slash is left on the repo
        // so identity validation can reject it
        let (owner, repo) = match slug.split_once('/') {
            Some((owner, repo)) => (Some(owner.to_string()), Some(repo.to_string())),
            None => (Some(slug.to_string()), None),
        };

        RawSource {
            owner,
            repo,
            file: self.file.clone(),
            branch: self.branch.clone().or(pinned_branch),
        }
    }
}

/// Fully resolved identity of the remote script
///
/// Immutable for the lifetime of a loader; two loaders with equal identity
/// share a cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceIdentity {
    owner: String,
    repo: String,
    file: String,
    branch: String,
}

impl SourceIdentity {
    /// Validate raw fields and apply defaults
    pub fn resolve(raw: RawSource) -> LoaderResult<Self> {
        let owner = required_segment(raw.owner, "owner")?;
        let repo = required_segment(raw.repo, "repo")?;

        let file = trimmed(raw.file).unwrap_or_else(|| DEFAULT_FILE.to_string());
        let file = file.trim_start_matches('/').to_string();
        if file.is_empty() {
            return Err(LoaderError::ConfigInvalid("file path is empty".to_string()));
        }

        let branch = trimmed(raw.branch).unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        Ok(Self {
            owner,
            repo,
            file,
            branch,
        })
    }

    /// Resolve using the given provider
    pub fn from_provider(provider: &dyn SourceProvider) -> LoaderResult<Self> {
        Self::resolve(provider.raw_source()).map_err(|e| match e {
            LoaderError::ConfigInvalid(reason) => {
                LoaderError::ConfigInvalid(format!("{} (from {})", reason, provider.label()))
            }
            other => other,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.owner, self.repo, self.file, self.branch
        )
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_segment(value: Option<String>, field: &str) -> LoaderResult<String> {
    let value =
        trimmed(value).ok_or_else(|| LoaderError::ConfigInvalid(format!("{} is missing", field)))?;

    if value.contains('/') {
        return Err(LoaderError::ConfigInvalid(format!(
            "{} '{}' must not contain '/'",
            field, value
        )));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(owner: Option<&str>, repo: Option<&str>) -> RawSource {
        RawSource {
            owner: owner.map(String::from),
            repo: repo.map(String::from),
            file: None,
            branch: None,
        }
    }

    #[test]
    fn resolve_applies_defaults() {
        let id = SourceIdentity::resolve(raw(Some("acme"), Some("widget"))).unwrap();
        assert_eq!(id.file(), "main.js");
        assert_eq!(id.branch(), "main");
        assert_eq!(id.to_string(), "acme/widget/main.js@main");
    }

    #[test]
    fn resolve_rejects_missing_owner_or_repo() {
        assert!(matches!(
            SourceIdentity::resolve(raw(None, Some("widget"))),
            Err(LoaderError::ConfigInvalid(_))
        ));
        assert!(matches!(
            SourceIdentity::resolve(raw(Some("acme"), Some("  "))),
            Err(LoaderError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn resolve_rejects_slash_in_repo() {
        let err = SourceIdentity::resolve(raw(Some("acme"), Some("widget/extra"))).unwrap_err();
        assert!(err.to_string().contains("must not contain '/'"));
    }

    #[test]
    fn empty_file_falls_back_to_default() {
        let mut source = raw(Some("acme"), Some("widget"));
        source.file = Some("".to_string());
        let id = SourceIdentity::resolve(source).unwrap();
        assert_eq!(id.file(), "main.js");
    }

    #[test]
    fn args_provider_parses_target() {
        let provider = ArgsProvider::new("acme/widget@dev", Some("dist/app.js".to_string()), None);
        let id = SourceIdentity::from_provider(&provider).unwrap();
        assert_eq!(id.owner(), "acme");
        assert_eq!(id.repo(), "widget");
        assert_eq!(id.file(), "dist/app.js");
        assert_eq!(id.branch(), "dev");
    }

    #[test]
    fn args_provider_branch_flag_wins_over_pin() {
        let provider = ArgsProvider::new("acme/widget@dev", None, Some("release".to_string()));
        let id = SourceIdentity::from_provider(&provider).unwrap();
        assert_eq!(id.branch(), "release");
    }

    #[test]
    fn args_provider_without_repo_is_invalid() {
        let provider = ArgsProvider::new("acme", None, None);
        let err = SourceIdentity::from_provider(&provider).unwrap_err();
        assert!(err.to_string().contains("repo is missing"));
        assert!(err.to_string().contains("arguments"));
    }

    #[test]
    fn settings_provider_uses_config_table() {
        let config = SourceConfig {
            owner: Some("acme".to_string()),
            repo: Some("widget".to_string()),
            ..SourceConfig::default()
        };
        let id = SourceIdentity::from_provider(&SettingsProvider::new(&config)).unwrap();
        assert_eq!(id.to_string(), "acme/widget/main.js@main");
    }

    #[test]
    fn settings_provider_without_owner_is_invalid() {
        let err = SourceIdentity::from_provider(&SettingsProvider::new(&SourceConfig::default()))
            .unwrap_err();
        assert!(err.to_string().contains("owner is missing"));
    }
}
