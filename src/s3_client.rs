//! A simplified S3 client that supports downloading the dataset objects.
//! It attempts to hide the complexities of working with the AWS SDK for S3.

use crate::cache::BlobFetcher;
use crate::cli::CommandLineArgs;
use crate::dataset::DatasetId;
use crate::error::RadiantError;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use bytes::Bytes;
use tracing::Instrument;
use url::Url;

/// Fetches dataset CSV objects from an S3-compatible store.
///
/// The server starts without credentials; the client stays unconfigured and
/// every fetch fails with a credentials error until keys are provided.
pub struct S3Fetcher {
    client: Option<Client>,
    bucket: String,
    radiance_object: String,
    gdp_object: String,
}

impl S3Fetcher {
    /// Build a fetcher from the command line arguments.
    pub fn new(args: &CommandLineArgs) -> Self {
        let client = match (&args.access_key, &args.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                Some(build_client(&args.s3_url, access_key, secret_key))
            }
            _ => {
                tracing::warn!("S3 credentials not configured; dataset fetches will fail");
                None
            }
        };
        S3Fetcher {
            client,
            bucket: args.bucket.clone(),
            radiance_object: args.radiance_object.clone(),
            gdp_object: args.gdp_object.clone(),
        }
    }

    fn object_key(&self, dataset: DatasetId) -> &str {
        match dataset {
            DatasetId::Radiance => &self.radiance_object,
            DatasetId::Gdp => &self.gdp_object,
        }
    }
}

fn build_client(url: &Url, access_key: &str, secret_key: &str) -> Client {
    let credentials = Credentials::from_keys(access_key, secret_key, None);
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .credentials_provider(credentials)
        .region(Some(Region::new("us-east-1")))
        .endpoint_url(url.to_string())
        .force_path_style(true)
        .build();
    Client::from_conf(config)
}

#[async_trait]
impl BlobFetcher for S3Fetcher {
    async fn fetch(&self, dataset: DatasetId) -> Result<Bytes, RadiantError> {
        let client = self.client.as_ref().ok_or(RadiantError::CredentialsMissing)?;
        let key = self.object_key(dataset);
        tracing::debug!(dataset = %dataset, bucket = %self.bucket, key = %key, "downloading object");
        let response = client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .instrument(tracing::Span::current())
            .await?;
        let data = response
            .body
            .collect()
            .instrument(tracing::Span::current())
            .await?;
        Ok(data.into_bytes())
    }
}
