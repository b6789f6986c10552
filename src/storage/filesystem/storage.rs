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

use async_trait::async_trait;
use std::fmt::{Debug, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use super::container::FileSystemStorageContainer;
use crate::storage::config::{StorageConfig, StorageType};
use crate::storage::error::{ResultExt, StorageError, StorageResult, ensure_not_empty};
use crate::storage::provider::{Container, ContainerPermission, Storage};

/// Check a container name: one non-empty directory name, no separators.
///
/// Names keep their case; the surrounding whitespace is trimmed.
pub fn validate_container_name(name: &str) -> StorageResult<String> {
    ensure_not_empty("name", name)?;
    let name = name.trim();

    if name.contains(['/', '\\', '\0']) {
        return Err(StorageError::invalid_argument(
            "name",
            format!("container names cannot contain separators: {:?}", name),
        ));
    }
    if name == "." || name == ".." {
        return Err(StorageError::invalid_argument(
            "name",
            format!("container names cannot be relative references: {}", name),
        ));
    }
    Ok(name.to_string())
}

/// [`Storage`] over a root directory of the local filesystem.
///
/// Each container is a direct sub-directory of the root.
pub struct FileSystemStorage {
    root: PathBuf,
    url_base: Option<String>,
}

impl FileSystemStorage {
    /// Create a filesystem storage rooted at `root`.
    ///
    /// # Arguments
    ///
    /// * `root` - Existing directory holding the containers
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The path cannot be canonicalized (doesn't exist or permission denied)
    /// * The path is not a directory
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref();

        // Canonicalize the path (handles both relative and absolute paths, resolves symlinks)
        let canonical_root = root.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to resolve path '{}': {} (path must exist)",
                root.display(),
                e
            ))
        })?;

        if !canonical_root.is_dir() {
            return Err(StorageError::ConfigError(format!(
                "Base path is not a directory: {}",
                canonical_root.display()
            )));
        }

        Ok(Self {
            root: canonical_root,
            url_base: None,
        })
    }

    /// Create a filesystem storage from configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration with the 'path' option and an optional 'url_base'
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The configuration is not of type `filesystem`
    /// * The 'path' option is missing or does not name an existing directory
    pub fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        if config.storage_type != StorageType::FileSystem {
            return Err(StorageError::ConfigError(format!(
                "Storage type '{}' is not a filesystem",
                config.storage_type_str()
            )));
        }
        let path = config.get_option("path").ok_or_else(|| {
            StorageError::ConfigError("FileSystem storage requires 'path' option".to_string())
        })?;

        let storage = Self::new(path)?;
        Ok(match config.get_option("url_base") {
            Some(url_base) => storage.with_url_base(url_base),
            None => storage,
        })
    }

    /// Base URL under which the root directory is published.
    pub fn with_url_base(mut self, url_base: impl Into<String>) -> Self {
        let url_base = url_base.into().trim().trim_end_matches('/').to_string();
        self.url_base = if url_base.is_empty() {
            None
        } else {
            Some(url_base)
        };
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container(&self, name: String) -> Container {
        let root = self.root.join(&name);
        Container::FileSystem(FileSystemStorageContainer::new(
            name,
            root,
            self.url_base.clone(),
        ))
    }

    async fn is_directory(path: &Path) -> io::Result<bool> {
        match fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Storage for FileSystemStorage {
    fn backend_name(&self) -> &str {
        "filesystem"
    }

    async fn list_containers(&self, mask: Option<&str>) -> StorageResult<Vec<String>> {
        let mask = mask
            .map(|mask| mask.trim().to_lowercase())
            .filter(|mask| !mask.is_empty());
        let root = self.root.to_string_lossy();

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root)
            .await
            .or_operation_failed("list the containers", &root)?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .or_operation_failed("list the containers", &root)?
        {
            let file_type = entry
                .file_type()
                .await
                .or_operation_failed("list the containers", &root)?;
            if !file_type.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let matches = match &mask {
                Some(mask) => name.to_lowercase().contains(mask.as_str()),
                None => true,
            };
            if !name.is_empty() && matches {
                names.push(name);
            }
        }

        Ok(names)
    }

    async fn create_or_get_container(
        &self,
        name: &str,
        permission: ContainerPermission,
        fail_if_exists: bool,
    ) -> StorageResult<Container> {
        let name = validate_container_name(name)?;
        permission.ensure_specified()?;

        let directory = self.root.join(&name);
        let exists = Self::is_directory(&directory)
            .await
            .or_operation_failed("create the container", &name)?;

        if exists {
            if fail_if_exists {
                return Err(StorageError::ContainerExistAlready(name));
            }
        } else {
            fs::create_dir_all(&directory)
                .await
                .or_operation_failed("create the container", &name)?;
            info!(
                "Created container={} at path={}",
                name,
                directory.display()
            );
        }

        Ok(self.container(name))
    }

    async fn get_container(&self, name: &str) -> StorageResult<Container> {
        let name = validate_container_name(name)?;
        let exists = Self::is_directory(&self.root.join(&name))
            .await
            .or_operation_failed("get the container", &name)?;

        if !exists {
            return Err(StorageError::ContainerNotFound(name));
        }
        Ok(self.container(name))
    }

    async fn delete_container(&self, name: &str) -> StorageResult<()> {
        let name = validate_container_name(name)?;
        match fs::remove_dir_all(self.root.join(&name)).await {
            Ok(()) => {
                info!("Deleted container={}", name);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::operation_failed(
                "delete the container",
                &name,
                e,
            )),
        }
    }
}

impl Debug for FileSystemStorage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FileSystemStorage(root={}, url_base={:?})",
            self.root.display(),
            self.url_base
        )
    }
}
