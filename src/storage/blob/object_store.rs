// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use super::service::{
    BlobItem, BlobService, BlobServiceError, PublicAccess, ServiceResult,
};
use crate::storage::config::{StorageConfig, StorageType};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::pagination::Page;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use object_store::{
    aws::AmazonS3Builder, azure::MicrosoftAzureBuilder, gcp::GoogleCloudStorageBuilder,
    memory::InMemory, path::Path, ClientOptions, ObjectMeta, ObjectStore, ObjectStoreExt,
    PutPayload, RetryConfig,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default number of entries returned by one listing segment.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Key namespace holding one metadata document per container.
///
/// `_` is not a legal container name character, so it never collides with blob keys.
const CONTAINERS_PREFIX: &str = "_containers";

/// Options consumed outside the provider-specific builders.
const SHARED_OPTIONS: &[&str] = &[
    "timeout",
    "connect_timeout",
    "max_retries",
    "retry_timeout",
    "pool_idle_timeout",
    "pool_max_idle_per_host",
    "url_base",
    "page_size",
    "max_pages",
];

#[derive(Debug, Default, Serialize, Deserialize)]
struct ContainerMetadata {
    #[serde(default)]
    public_access: PublicAccess,
}

/// [`BlobService`] over any `object_store` backend.
///
/// Containers are top-level key prefixes (`<container>/<key>`); their access
/// level is stored in `_containers/<container>.json`. Listing segments are
/// produced with `list_with_offset`, the continuation token being the last
/// key of the previous segment.
pub struct ObjectStoreBlobService {
    store: Arc<dyn ObjectStore>,
    base_url: String,
    page_size: usize,
    storage_type: StorageType,
}

impl ObjectStoreBlobService {
    /// Create a new blob service from configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Storage configuration of one of the object store types
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(ObjectStoreBlobService)` - A configured service ready to use
    /// * `Err(StorageError)` - If the object store cannot be initialized
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The storage type is not an object store type
    /// * Required configuration options are missing
    /// * The object store backend cannot be created (e.g., invalid credentials format)
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        let (store, derived_base_url) = Self::build_store(config)?;
        let base_url = match config.get_option("url_base") {
            Some(url_base) => url_base.trim_end_matches('/').to_string(),
            None => derived_base_url,
        };

        Ok(Self {
            store: Arc::from(store),
            base_url,
            page_size: config.get_usize_option("page_size", DEFAULT_PAGE_SIZE),
            storage_type: config.storage_type,
        })
    }

    /// Wrap an already built store.
    pub fn with_store(store: Arc<dyn ObjectStore>, base_url: impl Into<String>) -> Self {
        Self {
            store,
            base_url: base_url.into(),
            page_size: DEFAULT_PAGE_SIZE,
            storage_type: StorageType::Memory,
        }
    }

    /// Set the number of entries per listing segment (at least 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Build the appropriate object store based on configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok((Box<dyn ObjectStore>, String))` - A tuple of the object store and its base URL
    /// * `Err(StorageError)` - If the object store cannot be built
    fn build_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        match config.storage_type {
            StorageType::Memory => Ok((Box::new(InMemory::new()), "memory://store".to_string())),
            StorageType::Aws => Self::build_aws_store(config),
            StorageType::Azure => Self::build_azure_store(config),
            StorageType::Gcs => Self::build_gcs_store(config),
            StorageType::FileSystem => Err(StorageError::ConfigError(format!(
                "Storage type '{}' is not an object store",
                config.storage_type_str()
            ))),
        }
    }

    /// Build connection options from configuration.
    ///
    /// # Returns
    ///
    /// A `ClientOptions` instance configured with timeout and connection settings from the config.
    fn build_connection_options(config: &StorageConfig) -> ClientOptions {
        let mut client_options = ClientOptions::default();
        if let Some(timeout_str) = config.options.get("timeout") {
            if timeout_str == "0" || timeout_str == "disabled" {
                client_options = client_options.with_timeout_disabled();
            } else if let Ok(sec) = timeout_str.parse::<u64>() {
                client_options = client_options.with_timeout(Duration::from_secs(sec))
            }
        };
        if let Some(connect_timeout_str) = config.options.get("connect_timeout") {
            if connect_timeout_str == "0" || connect_timeout_str == "disabled" {
                client_options = client_options.with_connect_timeout_disabled();
            } else if let Ok(sec) = connect_timeout_str.parse::<u64>() {
                client_options = client_options.with_connect_timeout(Duration::from_secs(sec))
            }
        }
        if let Some(pool_idle_timeout_str) = config.options.get("pool_idle_timeout") {
            if let Ok(sec) = pool_idle_timeout_str.parse::<u64>() {
                client_options = client_options.with_pool_idle_timeout(Duration::from_secs(sec))
            }
        }
        if let Some(pool_max_idle_per_host_str) = config.options.get("pool_max_idle_per_host") {
            if let Ok(max_idle) = pool_max_idle_per_host_str.parse::<usize>() {
                client_options = client_options.with_pool_max_idle_per_host(max_idle)
            }
        }
        client_options
    }

    /// Build retry options from configuration.
    ///
    /// Client retries are off unless `max_retries` is set; failures surface to the caller.
    fn build_retry_options(config: &StorageConfig) -> RetryConfig {
        let default_retry_config = RetryConfig::default();
        let max_retries = config
            .options
            .get("max_retries")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(0);
        let retry_timeout = config
            .options
            .get("retry_timeout")
            .and_then(|s| Some(Duration::from_secs(s.parse::<u64>().ok()?)))
            .unwrap_or(default_retry_config.retry_timeout);
        RetryConfig {
            backoff: Default::default(),
            max_retries,
            retry_timeout,
        }
    }

    /// Build an AWS S3 store.
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok((Box<dyn ObjectStore>, String))` - A tuple of the S3 store and base S3 URL
    /// * `Err(StorageError)` - If the S3 store cannot be created
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The bucket is missing
    /// * The S3 store cannot be initialized
    fn build_aws_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let mut builder = AmazonS3Builder::new()
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options(config));
        let mut bucket: Option<&String> = None;
        let mut endpoint: Option<&String> = None;

        for (key, value) in &config.options {
            match key.as_str() {
                "bucket" => {
                    bucket = Some(value);
                    builder = builder.with_bucket_name(value);
                }
                "region" => builder = builder.with_region(value),
                "access_key_id" => builder = builder.with_access_key_id(value),
                "secret_access_key" => builder = builder.with_secret_access_key(value),
                "session_token" | "token" => builder = builder.with_token(value),
                "endpoint" => {
                    endpoint = Some(value);
                    builder = builder.with_endpoint(value);
                }
                "allow_http" => {
                    if value.to_lowercase() == "true" {
                        builder = builder.with_allow_http(true);
                    }
                }
                key if SHARED_OPTIONS.contains(&key) => (),
                _ => {
                    tracing::warn!("Unknown AWS S3 option: {}", key);
                }
            }
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create S3 store: {}", e)))?;

        let base_url = match (endpoint, bucket) {
            (Some(endpoint_url), Some(bucket_name)) => {
                format!("{}/{}", endpoint_url.trim_end_matches('/'), bucket_name)
            }
            (Some(endpoint_url), None) => endpoint_url.trim_end_matches('/').to_string(),
            (None, Some(bucket_name)) => format!("s3://{}", bucket_name),
            (None, None) => "s3://".to_string(),
        };

        Ok((Box::new(store), base_url))
    }

    /// Build an Azure store.
    ///
    /// Every stowage container is a prefix inside the one Azure container named by `container`.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * `account_name` or `container` is missing
    /// * The Azure store cannot be initialized
    fn build_azure_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let mut builder = MicrosoftAzureBuilder::new()
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options(config));

        let account_name = config.get_option("account_name").ok_or_else(|| {
            StorageError::ConfigError("Azure requires 'account_name' option".to_string())
        })?;
        let container = config.get_option("container").ok_or_else(|| {
            StorageError::ConfigError("Azure requires 'container' option".to_string())
        })?;

        let mut use_fabric_endpoint = false;
        let mut custom_endpoint: Option<&String> = None;

        for (key, value) in &config.options {
            match key.as_str() {
                "container" => builder = builder.with_container_name(value),
                "account_name" => builder = builder.with_account(value),
                "access_key" | "account_key" => builder = builder.with_access_key(value),
                "sas_token" => {
                    let pairs: Vec<(String, String)> = value
                        .trim_start_matches('?')
                        .split('&')
                        .filter_map(|pair| {
                            let (k, v) = pair.split_once('=')?;
                            Some((k.to_string(), v.to_string()))
                        })
                        .collect();
                    builder = builder.with_sas_authorization(pairs);
                }
                "tenant_id" => builder = builder.with_tenant_id(value),
                "client_id" => builder = builder.with_client_id(value),
                "client_secret" => builder = builder.with_client_secret(value),
                "use_fabric_endpoint" => {
                    use_fabric_endpoint = value.to_lowercase() == "true";
                    builder = builder.with_use_fabric_endpoint(use_fabric_endpoint);
                }
                "endpoint" => {
                    custom_endpoint = Some(value);
                    builder = builder.with_endpoint(value.clone());
                }
                key if SHARED_OPTIONS.contains(&key) => (),
                _ => {
                    tracing::warn!("Unknown Azure option: {}", key);
                }
            }
        }

        let store = builder.build().map_err(|e| {
            StorageError::ConfigError(format!("Failed to create Azure store: {}", e))
        })?;

        // abfss://<container>@<account>.<endpoint>
        let base_url = if let Some(endpoint) = custom_endpoint {
            endpoint.trim_end_matches('/').to_string()
        } else {
            let endpoint_domain = if use_fabric_endpoint {
                "dfs.fabric.microsoft.com"
            } else {
                "dfs.core.windows.net"
            };
            format!("abfss://{}@{}.{}", container, account_name, endpoint_domain)
        };

        Ok((Box::new(store), base_url))
    }

    /// Build a GCS store.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The bucket is missing
    /// * The GCS store cannot be initialized
    fn build_gcs_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let mut builder = GoogleCloudStorageBuilder::new()
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options(config));
        let mut bucket: Option<&String> = None;

        for (key, value) in &config.options {
            match key.as_str() {
                "bucket" => {
                    bucket = Some(value);
                    builder = builder.with_bucket_name(value);
                }
                "service_account_key_path" => builder = builder.with_service_account_path(value),
                "service_account_key" => builder = builder.with_service_account_key(value),
                key if SHARED_OPTIONS.contains(&key) => (),
                _ => {
                    tracing::warn!("Unknown GCS option: {}", key);
                }
            }
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create GCS store: {}", e)))?;

        let base_url = match bucket {
            Some(bucket_name) => format!("gs://{}", bucket_name),
            None => "gs://".to_string(),
        };

        Ok((Box::new(store), base_url))
    }

    fn metadata_path(container: &str) -> ServiceResult<Path> {
        Ok(Path::parse(format!(
            "{}/{}.json",
            CONTAINERS_PREFIX, container
        ))?)
    }

    fn blob_path(container: &str, key: &str) -> ServiceResult<Path> {
        Ok(Path::parse(format!("{}/{}", container, key))?)
    }

    /// `container/prefix` with the trailing separator dropped.
    fn prefix_path(container: &str, prefix: &str) -> ServiceResult<Path> {
        Ok(Path::parse(format!("{}/{}", container, prefix))?)
    }

    /// Key of `location` relative to the container.
    fn relative_name(container: &str, location: &Path) -> String {
        let location = location.as_ref();
        location
            .strip_prefix(container)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(location)
            .to_string()
    }

    fn list_from(
        &self,
        prefix: &Path,
        continuation: Option<String>,
    ) -> ServiceResult<BoxStream<'static, object_store::Result<ObjectMeta>>> {
        Ok(match continuation {
            Some(token) => self.store.list_with_offset(Some(prefix), &Path::parse(token)?),
            None => self.store.list(Some(prefix)),
        })
    }

    /// Drain at most `page_size` entries. Returns the entries and whether the segment is full.
    async fn take_segment(
        &self,
        mut stream: BoxStream<'static, object_store::Result<ObjectMeta>>,
    ) -> ServiceResult<(Vec<ObjectMeta>, Option<String>)> {
        let mut entries = Vec::new();
        while let Some(meta) = stream.next().await {
            entries.push(meta?);
            if entries.len() == self.page_size {
                break;
            }
        }

        let continuation = if entries.len() == self.page_size {
            entries.last().map(|meta| meta.location.to_string())
        } else {
            None
        };
        Ok((entries, continuation))
    }

    async fn read_metadata(&self, container: &str) -> ServiceResult<ContainerMetadata> {
        let path = Self::metadata_path(container)?;
        let bytes = match self.store.get(&path).await {
            Ok(result) => result.bytes().await?,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(BlobServiceError::ContainerNotFound(container.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_metadata(
        &self,
        container: &str,
        metadata: &ContainerMetadata,
    ) -> ServiceResult<()> {
        let path = Self::metadata_path(container)?;
        let payload = PutPayload::from(serde_json::to_vec(metadata)?);
        self.store.put(&path, payload).await?;
        Ok(())
    }

    async fn ensure_container(&self, container: &str) -> ServiceResult<()> {
        if self.container_exists(container).await? {
            Ok(())
        } else {
            Err(BlobServiceError::ContainerNotFound(container.to_string()))
        }
    }
}

#[async_trait]
impl BlobService for ObjectStoreBlobService {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_containers_segmented(
        &self,
        continuation: Option<String>,
    ) -> ServiceResult<Page<String>> {
        let root = Path::from(CONTAINERS_PREFIX);
        let stream = self.list_from(&root, continuation)?;
        let (entries, continuation) = self.take_segment(stream).await?;

        let names = entries
            .iter()
            .filter_map(|meta| meta.location.filename()?.strip_suffix(".json"))
            .map(str::to_string)
            .collect();

        Ok(Page::new(names, continuation))
    }

    async fn create_container_if_not_exists(&self, container: &str) -> ServiceResult<bool> {
        if self.container_exists(container).await? {
            return Ok(false);
        }
        self.write_metadata(container, &ContainerMetadata::default())
            .await?;
        Ok(true)
    }

    async fn container_exists(&self, container: &str) -> ServiceResult<bool> {
        let path = Self::metadata_path(container)?;
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_container_if_exists(&self, container: &str) -> ServiceResult<bool> {
        if !self.container_exists(container).await? {
            return Ok(false);
        }

        let root = Path::parse(container)?;
        let mut stream = self.store.list(Some(&root));
        let mut deleted = 0usize;
        while let Some(meta) = stream.next().await {
            let meta = meta?;
            match self.store.delete(&meta.location).await {
                Ok(()) | Err(object_store::Error::NotFound { .. }) => deleted += 1,
                Err(e) => return Err(e.into()),
            }
        }

        self.store.delete(&Self::metadata_path(container)?).await?;
        debug!(
            "Deleted container={} with blob_count={}",
            container, deleted
        );
        Ok(true)
    }

    async fn get_public_access(&self, container: &str) -> ServiceResult<PublicAccess> {
        Ok(self.read_metadata(container).await?.public_access)
    }

    async fn set_public_access(&self, container: &str, access: PublicAccess) -> ServiceResult<()> {
        let mut metadata = self.read_metadata(container).await?;
        metadata.public_access = access;
        self.write_metadata(container, &metadata).await
    }

    async fn list_blobs_segmented(
        &self,
        container: &str,
        prefix: &str,
        flat: bool,
        continuation: Option<String>,
    ) -> ServiceResult<Page<BlobItem>> {
        if continuation.is_none() {
            self.ensure_container(container).await?;
        }
        let prefix_path = Self::prefix_path(container, prefix)?;

        // list_with_delimiter has no offset, so the whole level is one page.
        if !flat {
            let listing = self.store.list_with_delimiter(Some(&prefix_path)).await?;
            let mut items: Vec<BlobItem> = listing
                .common_prefixes
                .iter()
                .map(|location| BlobItem::Directory {
                    prefix: format!("{}/", Self::relative_name(container, location)),
                })
                .collect();
            items.extend(listing.objects.iter().map(|meta| BlobItem::Blob {
                name: Self::relative_name(container, &meta.location),
            }));
            return Ok(Page::last(items));
        }

        let stream = self.list_from(&prefix_path, continuation)?;
        let (entries, continuation) = self.take_segment(stream).await?;
        let items = entries
            .iter()
            .map(|meta| BlobItem::Blob {
                name: Self::relative_name(container, &meta.location),
            })
            .collect();

        Ok(Page::new(items, continuation))
    }

    async fn upload(&self, container: &str, key: &str, data: Bytes) -> ServiceResult<()> {
        self.ensure_container(container).await?;
        let path = Self::blob_path(container, key)?;
        self.store.put(&path, PutPayload::from(data)).await?;
        Ok(())
    }

    async fn download(&self, container: &str, key: &str) -> ServiceResult<Bytes> {
        let path = Self::blob_path(container, key)?;
        let result = self.store.get(&path).await?;
        Ok(result.bytes().await?)
    }

    async fn delete_blob_if_exists(&self, container: &str, key: &str) -> ServiceResult<bool> {
        let path = Self::blob_path(container, key)?;
        match self.store.head(&path).await {
            Ok(_) => {}
            Err(object_store::Error::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e.into()),
        }
        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(true),
            Err(e) => Err(e.into()),
        }
    }
}

impl Debug for ObjectStoreBlobService {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BlobService(type={}, base_url={}, page_size={})",
            self.storage_type.as_str(),
            self.base_url,
            self.page_size
        )
    }
}
