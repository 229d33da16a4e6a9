//! Run command - one load cycle for a script

use crate::cli::args::RunArgs;
use crate::cli::commands::{cache_dir, resolve_source};
use crate::config::schema::ExecutorConfig;
use crate::config::Config;
use crate::error::LoaderResult;
use crate::executor::InterpreterExecutor;
use crate::fetcher::GithubFetcher;
use crate::http::{Endpoints, HttpTransport, UreqTransport};
use crate::loader::{LoadOutcome, Loader};
use crate::resolver::GithubResolver;
use crate::store::FileStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Execute the run command
pub async fn execute(args: RunArgs, config: &Config) -> LoaderResult<()> {
    // Identity is validated before touching the cache or the network
    let source = resolve_source(&args.target, config)?;
    let store = FileStore::open(cache_dir(args.cache_dir, config))?;
    debug!("Using cache at {}", store.dir().display());

    let transport: Arc<dyn HttpTransport> = Arc::new(UreqTransport::new(&config.http));
    let endpoints = Endpoints::new(&config.endpoints, &config.http);
    let executor = InterpreterExecutor::from_config(&executor_config(
        &config.executor,
        args.interpreter,
        args.interpreter_args,
    ));

    let loader = Loader::new(
        source,
        Arc::new(store),
        Arc::new(GithubResolver::new(transport.clone(), endpoints.clone())),
        Arc::new(GithubFetcher::new(transport, endpoints)),
        Arc::new(executor),
    );

    let report = loader.load().await?;
    match &report.outcome {
        LoadOutcome::ServedCached { version } => {
            info!("Ran cached {} at {}", loader.source(), version)
        }
        LoadOutcome::Bootstrapped { version } => {
            info!("Ran {} at {}", loader.source(), version)
        }
    }

    if let Some(revalidation) = report.revalidation {
        if args.no_wait {
            debug!("Not waiting for background update (--no-wait)");
        } else {
            let grace = Duration::from_secs(config.loader.revalidate_grace_secs);
            if !revalidation.settle(grace).await {
                info!("Background update still running after {:?}, abandoning it", grace);
            }
        }
    }

    Ok(())
}

/// Interpreter settings with command-line overrides applied
fn executor_config(
    base: &ExecutorConfig,
    interpreter: Option<String>,
    args: Vec<String>,
) -> ExecutorConfig {
    let mut config = base.clone();
    if let Some(interpreter) = interpreter {
        config.interpreter = interpreter;
        config.args.clear();
    }
    if !args.is_empty() {
        config.args = args;
    }
    config
}
