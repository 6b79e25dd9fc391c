//! Object-store roots and their up-front listing
//!
//! Every declared object-store root is listed exactly once, before any
//! classification starts. Listings run concurrently on a bounded pool; one
//! failure or timeout aborts the whole batch.

use super::error::{DiscoveryError, Result};
use super::vfs::{Entry, VirtualTree};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

static OBJECT_STORE_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^s3://([^/]+)/?(.*?)$").expect("valid object store uri regex"));

/// `s3://bucket/key/prefix` split into its parts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectStoreUri {
    pub bucket: String,
    /// Key prefix without leading or trailing `/`; may be empty
    pub prefix: String,
}

impl ObjectStoreUri {
    pub const SCHEME: &'static str = "s3";

    /// Parse an `s3://` URI. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let captures = OBJECT_STORE_URI.captures(raw)?;
        Some(Self {
            bucket: captures[1].to_string(),
            prefix: captures[2].trim_matches('/').to_string(),
        })
    }

    /// Path of the root directory inside the virtual tree.
    pub fn root_path(&self) -> String {
        if self.prefix.is_empty() {
            format!("{}://{}/", Self::SCHEME, self.bucket)
        } else {
            format!("{}://{}/{}/", Self::SCHEME, self.bucket, self.prefix)
        }
    }

    /// Prefix passed to the listing call. Directory-scoped so that a sibling
    /// such as `run_one_old/` is not listed for `run_one`.
    pub fn list_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        }
    }
}

impl fmt::Display for ObjectStoreUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}://{}", Self::SCHEME, self.bucket)
        } else {
            write!(f, "{}://{}/{}", Self::SCHEME, self.bucket, self.prefix)
        }
    }
}

/// Flat key listing for one bucket prefix.
#[async_trait]
pub trait ObjectLister: Send + Sync {
    /// Every object key under `prefix`, following pagination to the end.
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;
}

/// Listing served from memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLister {
    buckets: HashMap<String, Vec<String>>,
}

impl InMemoryLister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects<I, S>(mut self, bucket: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buckets
            .entry(bucket.to_string())
            .or_default()
            .extend(keys.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl ObjectLister for InMemoryLister {
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let keys = self.buckets.get(bucket).ok_or_else(|| DiscoveryError::Listing {
            uri: format!("{}://{}", ObjectStoreUri::SCHEME, bucket),
            message: "NoSuchBucket".to_string(),
        })?;
        Ok(keys.iter().filter(|k| k.starts_with(prefix)).cloned().collect())
    }
}

#[cfg(feature = "s3")]
pub use self::s3::S3Lister;

#[cfg(feature = "s3")]
mod s3 {
    use super::{ObjectLister, ObjectStoreUri};
    use crate::discovery::error::{DiscoveryError, Result};
    use async_trait::async_trait;

    /// Listing through the AWS S3 API
    pub struct S3Lister {
        client: aws_sdk_s3::Client,
    }

    impl S3Lister {
        /// Build a client from the standard AWS environment chain.
        ///
        /// `WOOF_S3_ENDPOINT_URL` points the client at another endpoint and
        /// switches to path-style addressing.
        pub async fn from_env() -> Self {
            let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let mut builder = aws_sdk_s3::config::Builder::from(&shared);
            if let Ok(url) = std::env::var("WOOF_S3_ENDPOINT_URL") {
                builder = builder.endpoint_url(url).force_path_style(true);
            }
            Self {
                client: aws_sdk_s3::Client::from_conf(builder.build()),
            }
        }
    }

    #[async_trait]
    impl ObjectLister for S3Lister {
        async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
            let mut keys = Vec::new();
            let mut token: Option<String> = None;
            loop {
                let mut request = self.client.list_objects_v2().bucket(bucket);
                if !prefix.is_empty() {
                    request = request.prefix(prefix);
                }
                if let Some(t) = token.as_deref() {
                    request = request.continuation_token(t);
                }
                let response = request.send().await.map_err(|e| DiscoveryError::Listing {
                    uri: format!("{}://{}/{}", ObjectStoreUri::SCHEME, bucket, prefix),
                    message: format!("list_objects_v2 failed: {e:?}"),
                })?;

                keys.extend(response.contents().iter().filter_map(|obj| obj.key().map(str::to_string)));

                if response.is_truncated().unwrap_or(false) {
                    token = response.next_continuation_token().map(str::to_string);
                    if token.is_none() {
                        return Err(DiscoveryError::Listing {
                            uri: format!("{}://{}/{}", ObjectStoreUri::SCHEME, bucket, prefix),
                            message: "truncated response without continuation token".to_string(),
                        });
                    }
                } else {
                    break;
                }
            }
            Ok(keys)
        }
    }
}

/// List every root and build its virtual tree.
///
/// Returns one root entry per URI, in input order. At most `concurrency`
/// listings are in flight; the first failure or timeout cancels the rest.
pub async fn list_roots(
    lister: Arc<dyn ObjectLister>,
    uris: &[ObjectStoreUri],
    concurrency: usize,
    timeout: Duration,
) -> Result<Vec<Entry>> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, uri) in uris.iter().cloned().enumerate() {
        let lister = Arc::clone(&lister);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| DiscoveryError::InvalidState(format!("listing pool closed: {e}")))?;
            let entry = list_root(lister.as_ref(), &uri, timeout).await?;
            Ok::<_, DiscoveryError>((index, entry))
        });
    }

    let mut roots: Vec<Option<Entry>> = vec![None; uris.len()];
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined
            .map_err(|e| DiscoveryError::InvalidState(format!("listing task failed: {e}")))
            .and_then(|result| result);
        match outcome {
            Ok((index, entry)) => roots[index] = Some(entry),
            Err(err) => {
                tasks.abort_all();
                return Err(err);
            }
        }
    }

    roots
        .into_iter()
        .zip(uris)
        .map(|(entry, uri)| {
            entry.ok_or_else(|| DiscoveryError::InvalidState(format!("no listing recorded for {uri}")))
        })
        .collect()
}

async fn list_root(lister: &dyn ObjectLister, uri: &ObjectStoreUri, timeout: Duration) -> Result<Entry> {
    debug!(uri = %uri, "Listing object store prefix");
    let keys = tokio::time::timeout(timeout, lister.list_keys(&uri.bucket, &uri.list_prefix()))
        .await
        .map_err(|_| DiscoveryError::ListingTimeout {
            uri: uri.to_string(),
            secs: timeout.as_secs(),
        })??;

    let tree = match VirtualTree::from_keys(ObjectStoreUri::SCHEME, &uri.bucket, &keys) {
        Ok(tree) => Arc::new(tree),
        Err(DiscoveryError::VirtualRoot { count: 0, .. }) => {
            return Err(DiscoveryError::RootNotFound(uri.to_string()))
        }
        Err(err) => return Err(err),
    };
    info!(uri = %uri, objects = tree.object_count(), "Listed object store prefix");

    tree.directory(&uri.root_path())
        .ok_or_else(|| DiscoveryError::RootNotFound(uri.to_string()))
}
