use crate::cache::DatasetCache;
use crate::cli::CommandLineArgs;
use crate::s3_client::S3Fetcher;

use std::sync::Arc;
use std::time::Duration;

/// Shared application state passed to each request handler.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// TTL cache of decoded dataset tables.
    pub cache: DatasetCache,
}

impl AppState {
    /// Create and return an [AppState].
    pub fn new(args: &CommandLineArgs) -> Self {
        let fetcher = S3Fetcher::new(args);
        let cache = DatasetCache::new(Box::new(fetcher), Duration::from_secs(args.cache_ttl));

        Self {
            args: args.clone(),
            cache,
        }
    }

    /// Create an [AppState] over an arbitrary cache. Used by tests to stub
    /// out object storage.
    pub fn with_cache(args: &CommandLineArgs, cache: DatasetCache) -> Self {
        Self {
            args: args.clone(),
            cache,
        }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
