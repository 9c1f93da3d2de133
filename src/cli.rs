//! Command Line Interface (CLI) arguments.

use clap::Parser;
use url::Url;

/// Radiant command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "RADIANT_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8080, env = "RADIANT_PORT")]
    pub port: u16,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "RADIANT_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Object storage API URL
    #[arg(long, default_value = "http://localhost:9000", env = "RADIANT_S3_URL")]
    pub s3_url: Url,
    /// Object storage access key. Fetches fail when credentials are unset.
    #[arg(long, env = "RADIANT_S3_ACCESS_KEY")]
    pub access_key: Option<String>,
    /// Object storage secret key
    #[arg(long, env = "RADIANT_S3_SECRET_KEY")]
    pub secret_key: Option<String>,
    /// Bucket holding the dataset objects
    #[arg(long, default_value = "radianza", env = "RADIANT_S3_BUCKET")]
    pub bucket: String,
    /// Object key of the radiance dataset CSV
    #[arg(
        long,
        default_value = "municipios_completos_limpio.csv",
        env = "RADIANT_RADIANCE_OBJECT"
    )]
    pub radiance_object: String,
    /// Object key of the municipal GDP dataset CSV
    #[arg(long, default_value = "pib_municipal.csv", env = "RADIANT_GDP_OBJECT")]
    pub gdp_object: String,
    /// Seconds a cached dataset stays fresh before it is fetched again
    #[arg(long, default_value_t = 300, env = "RADIANT_CACHE_TTL")]
    pub cache_ttl: u64,
    /// Allowed CORS origins, comma separated; `*` allows any origin
    #[arg(
        long,
        default_value = "*",
        value_delimiter = ',',
        env = "RADIANT_CORS_ORIGINS"
    )]
    pub cors_origins: Vec<String>,
    /// Whether to include diagnostic detail in error responses
    #[arg(long, default_value_t = false, env = "RADIANT_DEBUG")]
    pub debug: bool,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
