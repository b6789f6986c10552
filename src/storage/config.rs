// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use super::error::{StorageError, StorageResult};

/// Storage backend type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Hierarchical local filesystem, one directory per container
    FileSystem,
    /// In-process object store, mostly useful for tests
    Memory,
    /// AWS S3 storage
    Aws,
    /// Azure Blob Storage
    Azure,
    /// Google Cloud Storage
    Gcs,
}

impl StorageType {
    /// `true` for the flat key-space backends built on `object_store`.
    pub fn is_object_store(self) -> bool {
        !matches!(self, StorageType::FileSystem)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StorageType::FileSystem => "filesystem",
            StorageType::Memory => "memory",
            StorageType::Aws => "aws",
            StorageType::Azure => "azure",
            StorageType::Gcs => "gcs",
        }
    }
}

impl FromStr for StorageType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "filesystem" | "fs" | "file" => Ok(StorageType::FileSystem),
            "memory" | "inmemory" => Ok(StorageType::Memory),
            "aws" | "s3" => Ok(StorageType::Aws),
            "azure" | "blob" => Ok(StorageType::Azure),
            "gcs" | "gcp" => Ok(StorageType::Gcs),
            _ => Err(StorageError::ConfigError(format!(
                "Unknown storage type: {}",
                s
            ))),
        }
    }
}

/// Generic configuration for storage backends
///
/// Provider-specific options are kept in a map and interpreted by the backend
/// that is built from this configuration (see [`StorageFactory`](super::StorageFactory)).
///
/// # Examples
///
/// ## Local filesystem
/// ```
/// use stowage::storage::StorageConfig;
///
/// let config = StorageConfig::filesystem()
///     .with_option("path", "/srv/warehouse")
///     .with_option("url_base", "https://files.example.com");
/// ```
///
/// ## AWS S3
/// ```
/// use stowage::storage::StorageConfig;
///
/// let config = StorageConfig::aws()
///     .with_option("bucket", "my-bucket")
///     .with_option("region", "us-east-1")
///     .with_option("access_key_id", "ACCESS_KEY")
///     .with_option("secret_access_key", "SECRET_ACCESS_KEY");
/// ```
///
/// ## Connection string
/// ```
/// use stowage::storage::{StorageConfig, StorageType};
///
/// let config = StorageConfig::from_connection_string("type=azure;account_name=acc;container=data")
///     .unwrap();
/// assert_eq!(config.storage_type, StorageType::Azure);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend type
    #[serde(rename = "type")]
    pub storage_type: StorageType,

    /// Provider-specific configuration options
    ///
    /// FileSystem:
    /// - path: Root directory, must exist
    /// - url_base: Base URL used by `url_for_file` (optional)
    ///
    /// Object stores (memory, aws, azure, gcs):
    /// - url_base: Overrides the base URL derived from the provider options
    /// - page_size: Number of entries per listing segment (default 1000)
    /// - max_pages: Upper bound on segments drained per listing (default 100000)
    /// - timeout, connect_timeout, pool_idle_timeout, pool_max_idle_per_host: HTTP client settings
    /// - max_retries, retry_timeout: Client-level retries, disabled unless set
    ///
    /// AWS S3:
    /// - bucket, region, access_key_id, secret_access_key, session_token, endpoint, allow_http
    ///
    /// Azure:
    /// - container, account_name, access_key, sas_token, tenant_id, client_id, client_secret,
    ///   use_fabric_endpoint, endpoint
    ///
    /// GCS:
    /// - bucket, service_account_key_path, service_account_key
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl StorageConfig {
    /// Create a new storage configuration.
    ///
    /// # Arguments
    ///
    /// * `storage_type` - The type of storage backend
    ///
    /// # Returns
    ///
    /// A new `StorageConfig` instance with default options for the specified storage type.
    pub fn new(storage_type: StorageType) -> Self {
        let options = if storage_type.is_object_store() && storage_type != StorageType::Memory {
            Self::default_options()
        } else {
            HashMap::new()
        };

        Self {
            storage_type,
            options,
        }
    }

    /// Create a local filesystem storage configuration.
    pub fn filesystem() -> Self {
        Self::new(StorageType::FileSystem)
    }

    /// Create an in-memory object store configuration.
    pub fn memory() -> Self {
        Self::new(StorageType::Memory)
    }

    /// Create an AWS S3 storage configuration.
    pub fn aws() -> Self {
        Self::new(StorageType::Aws)
    }

    /// Create an Azure storage configuration.
    pub fn azure() -> Self {
        Self::new(StorageType::Azure)
    }

    /// Create a GCS storage configuration.
    pub fn gcs() -> Self {
        Self::new(StorageType::Gcs)
    }

    /// Parse a `key=value;key=value` connection string.
    ///
    /// The `type` key selects the backend, every other pair becomes an option.
    /// Values may contain `=`; empty segments are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ConfigError`] if `type` is missing or unknown,
    /// or a segment has no `=`.
    pub fn from_connection_string(connection_string: &str) -> StorageResult<Self> {
        let mut storage_type: Option<StorageType> = None;
        let mut options = HashMap::new();

        for segment in connection_string.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                StorageError::ConfigError(format!(
                    "Malformed connection string segment: {}",
                    segment
                ))
            })?;
            let key = key.trim();
            if key.eq_ignore_ascii_case("type") {
                storage_type = Some(value.parse()?);
            } else {
                options.insert(key.to_string(), value.trim().to_string());
            }
        }

        let storage_type = storage_type.ok_or_else(|| {
            StorageError::ConfigError("Connection string requires a 'type' key".to_string())
        })?;

        Ok(Self::new(storage_type).with_options(options))
    }

    /// Get default HTTP client options for the cloud storage types.
    ///
    /// # Returns
    ///
    /// A HashMap containing default timeout and connection pool settings.
    pub fn default_options() -> HashMap<String, String> {
        [
            ("timeout", "1200"),
            ("connect_timeout", "30"),
            ("pool_idle_timeout", "15"),
            ("pool_max_idle_per_host", "5"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Add a configuration option.
    ///
    /// # Returns
    ///
    /// The `StorageConfig` instance with the added option (for method chaining).
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add multiple configuration options.
    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    /// Get a configuration option.
    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.options.get(key)
    }

    /// Get a numeric option, falling back to `default` when absent or unparsable.
    pub fn get_usize_option(&self, key: &str, default: usize) -> usize {
        self.options
            .get(key)
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(default)
    }

    /// Get the storage type as a string.
    pub fn storage_type_str(&self) -> &str {
        self.storage_type.as_str()
    }
}
