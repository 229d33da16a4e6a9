//! ghload - Stale-while-revalidate script loader
//!
//! Runs a script hosted in a GitHub repository from a local cache, and
//! refreshes that cache in the background so the next run picks up the
//! latest commit on the tracked branch.

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod fetcher;
pub mod http;
pub mod loader;
pub mod resolver;
pub mod source;
pub mod store;

pub use error::{LoaderError, LoaderResult};
pub use loader::{LoadOutcome, LoadReport, Loader};
pub use source::SourceIdentity;
