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

use std::sync::Arc;
use tracing::info;

use super::blob::{BlobStorage, ObjectStoreBlobService};
use super::config::{StorageConfig, StorageType};
use super::error::StorageResult;
use super::filesystem::FileSystemStorage;
use super::pagination::DEFAULT_MAX_PAGES;
use super::provider::Storage;

/// Factory for creating storage backends
pub struct StorageFactory;

impl StorageFactory {
    /// Create a storage backend from a configuration.
    ///
    /// `filesystem` builds a [`FileSystemStorage`]; every other type builds a
    /// [`BlobStorage`] over an `object_store` backend.
    ///
    /// # Arguments
    ///
    /// * `config` - The storage configuration specifying the backend type and options
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(Arc<dyn Storage>)` - A thread-safe reference to the initialized storage
    /// * `Err(StorageError)` - If the backend cannot be created
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * Required configuration options are missing
    /// * The filesystem root does not exist
    /// * The object store cannot be initialized
    pub fn from_config(config: StorageConfig) -> StorageResult<Arc<dyn Storage>> {
        let storage: Arc<dyn Storage> = match config.storage_type {
            StorageType::FileSystem => Arc::new(FileSystemStorage::from_config(&config)?),
            StorageType::Memory | StorageType::Aws | StorageType::Azure | StorageType::Gcs => {
                let service = ObjectStoreBlobService::new(&config)?;
                Arc::new(
                    BlobStorage::new(Arc::new(service))
                        .with_max_pages(config.get_usize_option("max_pages", DEFAULT_MAX_PAGES)),
                )
            }
        };

        info!(
            "Created storage={:?} for type={}",
            storage,
            config.storage_type_str()
        );
        Ok(storage)
    }

    /// Create a storage backend from a `key=value;...` connection string.
    pub fn from_connection_string(connection_string: &str) -> StorageResult<Arc<dyn Storage>> {
        Self::from_config(StorageConfig::from_connection_string(connection_string)?)
    }
}
