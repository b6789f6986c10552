// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::ops::{BitOr, BitOrAssign};

use super::blob::BlobStorageContainer;
use super::error::{StorageError, StorageResult};
use super::filesystem::FileSystemStorageContainer;
use crate::util::stream::{FileStream, ReadSource, WriteSink};

/// Access level of a container.
///
/// `Unspecified` only exists as an unset default. It is rejected as an input
/// and never returned by [`StorageContainer::get_permission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ContainerPermission {
    #[default]
    Unspecified = 0,
    Private = 1,
    Public = 2,
}

impl ContainerPermission {
    pub fn is_public(self) -> bool {
        self == ContainerPermission::Public
    }

    /// Fail with a precondition error for `Unspecified`.
    pub(crate) fn ensure_specified(self) -> StorageResult<Self> {
        match self {
            ContainerPermission::Unspecified => Err(StorageError::invalid_argument(
                "permission",
                "must be Private or Public, got Unspecified",
            )),
            specified => Ok(specified),
        }
    }
}

/// Flags controlling [`StorageContainer::list_files`].
///
/// Combinable with `|`: `SearchOptions::ALL_DIRECTORIES | SearchOptions::STRIP_PATHS`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SearchOptions(u8);

impl SearchOptions {
    /// Immediate level only, paths relative to the container root.
    pub const DEFAULT: Self = Self(0x00);
    /// Recurse into every sub-directory.
    pub const ALL_DIRECTORIES: Self = Self(0x01);
    /// Return bare file names instead of root-relative paths.
    pub const STRIP_PATHS: Self = Self(0x02);

    const ALL: u8 = 0x03;

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build from raw bits, dropping unknown flags.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_recursive(self) -> bool {
        self.contains(Self::ALL_DIRECTORIES)
    }

    pub fn strips_paths(self) -> bool {
        self.contains(Self::STRIP_PATHS)
    }
}

impl BitOr for SearchOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SearchOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Debug for SearchOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut flags = Vec::new();
        if self.is_recursive() {
            flags.push("AllDirectories");
        }
        if self.strips_paths() {
            flags.push("StripPaths");
        }
        if flags.is_empty() {
            flags.push("Default");
        }
        write!(f, "SearchOptions({})", flags.join(" | "))
    }
}

/// Entry point of a storage backend: enumerates, creates, fetches and deletes containers.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend identifier used in logs and `Debug` output.
    fn backend_name(&self) -> &str;

    /// List the containers whose name contains `mask` (case-insensitive).
    ///
    /// # Arguments
    ///
    /// * `mask` - Substring filter. `None` or an empty string returns every container.
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(Vec<String>)` - The container names, fully collected
    /// * `Err(StorageError)` - If the backend cannot be listed
    ///
    /// # Errors
    ///
    /// * [`StorageError::OperationFailed`] if the backend is unreachable or the listing fails
    async fn list_containers(&self, mask: Option<&str>) -> StorageResult<Vec<String>>;

    /// Create a container, or return the existing one.
    ///
    /// Creation and permission assignment are two backend calls. If the
    /// permission call fails for a container created by this call, the
    /// container is removed again before the error is returned.
    ///
    /// # Arguments
    ///
    /// * `name` - The container name
    /// * `permission` - Access level to apply; must not be `Unspecified`
    /// * `fail_if_exists` - Return [`StorageError::ContainerExistAlready`] when the container exists
    ///
    /// # Errors
    ///
    /// * [`StorageError::InvalidArgument`] for an empty or invalid name, or an `Unspecified` permission
    /// * [`StorageError::ContainerExistAlready`] if `fail_if_exists` is set and the container exists
    /// * [`StorageError::OperationFailed`] for any backend failure
    async fn create_or_get_container(
        &self,
        name: &str,
        permission: ContainerPermission,
        fail_if_exists: bool,
    ) -> StorageResult<Container>;

    /// Get an existing container.
    ///
    /// # Errors
    ///
    /// * [`StorageError::InvalidArgument`] for an empty or invalid name
    /// * [`StorageError::ContainerNotFound`] if the container does not exist
    /// * [`StorageError::OperationFailed`] for any backend failure
    async fn get_container(&self, name: &str) -> StorageResult<Container>;

    /// Delete a container and everything in it.
    ///
    /// Deleting a container that does not exist succeeds without doing anything.
    async fn delete_container(&self, name: &str) -> StorageResult<()>;
}

impl Debug for dyn Storage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Storage(backend={})", self.backend_name())
    }
}

/// Operations on a single container. All paths are relative to the container root.
#[async_trait]
pub trait StorageContainer: Send + Sync {
    /// The container name.
    fn name(&self) -> &str;

    /// Get the container permission. Never returns `Unspecified`.
    async fn get_permission(&self) -> StorageResult<ContainerPermission>;

    /// Set the container permission.
    ///
    /// # Errors
    ///
    /// * [`StorageError::InvalidArgument`] for `Unspecified`
    /// * [`StorageError::OperationFailed`] if the backend rejects the change
    async fn set_permission(&self, permission: ContainerPermission) -> StorageResult<()>;

    /// Create a directory. Succeeds on backends without native directories.
    async fn create_directory(&self, path: &str) -> StorageResult<()>;

    /// Recursively delete a directory and everything under it.
    ///
    /// # Errors
    ///
    /// * [`StorageError::InvalidArgument`] if `path` is empty or denotes the container root
    /// * [`StorageError::OperationFailed`] for any backend failure
    async fn delete_directory(&self, path: &str) -> StorageResult<()>;

    /// List the directories one level below `path` (`""` for the root).
    ///
    /// # Returns
    ///
    /// The trailing segment of each directory, never the full path.
    async fn list_directories(&self, path: &str) -> StorageResult<Vec<String>>;

    /// Write `source` to `path`, replacing any existing content.
    ///
    /// The source is read from offset 0 and its position is restored afterwards,
    /// so the same source can be written repeatedly. It is not closed.
    async fn write_file(&self, source: &mut dyn ReadSource, path: &str) -> StorageResult<()>;

    /// Open the file for reading. The caller owns the returned stream.
    ///
    /// # Errors
    ///
    /// * [`StorageError::OperationFailed`] if the file does not exist
    async fn read_file(&self, path: &str) -> StorageResult<FileStream>;

    /// Copy the file content into `sink` and restore the sink position afterwards.
    ///
    /// # Errors
    ///
    /// * [`StorageError::OperationFailed`] if the file does not exist
    async fn read_file_into(&self, sink: &mut dyn WriteSink, path: &str) -> StorageResult<()>;

    /// Delete exactly one file.
    async fn delete_file(&self, path: &str) -> StorageResult<()>;

    /// List the files under `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory to scan (`""` for the root)
    /// * `options` - [`SearchOptions::ALL_DIRECTORIES`] recurses,
    ///   [`SearchOptions::STRIP_PATHS`] returns bare file names
    ///
    /// # Returns
    ///
    /// File names, or paths relative to the container root which can be passed
    /// back to [`StorageContainer::read_file`].
    async fn list_files(&self, path: &str, options: SearchOptions) -> StorageResult<Vec<String>>;

    /// Absolute URL of a file.
    ///
    /// # Errors
    ///
    /// * [`StorageError::Unsupported`] if the backend has no public addressing configured
    fn url_for_file(&self, path: &str) -> StorageResult<String>;
}

/// A container handle produced by a [`Storage`].
///
/// Handles are cheap and can be dropped at any time without side effects.
pub enum Container {
    /// Flat key-space object store, directories are key prefixes.
    Blob(BlobStorageContainer),
    /// Hierarchical local filesystem.
    FileSystem(FileSystemStorageContainer),
}

impl Container {
    fn inner(&self) -> &dyn StorageContainer {
        match self {
            Container::Blob(container) => container,
            Container::FileSystem(container) => container,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Container::Blob(_) => "blob",
            Container::FileSystem(_) => "filesystem",
        }
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Container(backend={}, name={})",
            self.backend_name(),
            self.name()
        )
    }
}

#[async_trait]
impl StorageContainer for Container {
    fn name(&self) -> &str {
        self.inner().name()
    }

    async fn get_permission(&self) -> StorageResult<ContainerPermission> {
        self.inner().get_permission().await
    }

    async fn set_permission(&self, permission: ContainerPermission) -> StorageResult<()> {
        self.inner().set_permission(permission).await
    }

    async fn create_directory(&self, path: &str) -> StorageResult<()> {
        self.inner().create_directory(path).await
    }

    async fn delete_directory(&self, path: &str) -> StorageResult<()> {
        self.inner().delete_directory(path).await
    }

    async fn list_directories(&self, path: &str) -> StorageResult<Vec<String>> {
        self.inner().list_directories(path).await
    }

    async fn write_file(&self, source: &mut dyn ReadSource, path: &str) -> StorageResult<()> {
        self.inner().write_file(source, path).await
    }

    async fn read_file(&self, path: &str) -> StorageResult<FileStream> {
        self.inner().read_file(path).await
    }

    async fn read_file_into(&self, sink: &mut dyn WriteSink, path: &str) -> StorageResult<()> {
        self.inner().read_file_into(sink, path).await
    }

    async fn delete_file(&self, path: &str) -> StorageResult<()> {
        self.inner().delete_file(path).await
    }

    async fn list_files(&self, path: &str, options: SearchOptions) -> StorageResult<Vec<String>> {
        self.inner().list_files(path, options).await
    }

    fn url_for_file(&self, path: &str) -> StorageResult<String> {
        self.inner().url_for_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_values() {
        assert_eq!(ContainerPermission::Unspecified as u8, 0);
        assert_eq!(ContainerPermission::Private as u8, 1);
        assert_eq!(ContainerPermission::Public as u8, 2);
        assert_eq!(ContainerPermission::default(), ContainerPermission::Unspecified);
    }

    #[test]
    fn test_permission_ensure_specified() {
        assert_eq!(
            ContainerPermission::Public.ensure_specified().unwrap(),
            ContainerPermission::Public
        );
        assert_eq!(
            ContainerPermission::Private.ensure_specified().unwrap(),
            ContainerPermission::Private
        );

        let error = ContainerPermission::Unspecified
            .ensure_specified()
            .unwrap_err();
        assert!(error.is_precondition());
        assert!(error.to_string().contains("permission"));
    }

    #[test]
    fn test_permission_serialization() {
        assert_eq!(
            serde_json::to_string(&ContainerPermission::Public).unwrap(),
            "\"public\""
        );
        let private: ContainerPermission = serde_json::from_str("\"private\"").unwrap();
        assert_eq!(private, ContainerPermission::Private);
    }

    #[test]
    fn test_search_options_bits() {
        assert_eq!(SearchOptions::DEFAULT.bits(), 0);
        assert_eq!(SearchOptions::ALL_DIRECTORIES.bits(), 1);
        assert_eq!(SearchOptions::STRIP_PATHS.bits(), 2);
        assert_eq!(SearchOptions::default(), SearchOptions::DEFAULT);
    }

    #[test]
    fn test_search_options_combination() {
        let options = SearchOptions::ALL_DIRECTORIES | SearchOptions::STRIP_PATHS;
        assert_eq!(options.bits(), 3);
        assert!(options.is_recursive());
        assert!(options.strips_paths());
        assert!(options.contains(SearchOptions::STRIP_PATHS));

        let mut options = SearchOptions::DEFAULT;
        assert!(!options.is_recursive());
        assert!(!options.strips_paths());
        options |= SearchOptions::STRIP_PATHS;
        assert!(options.strips_paths());
        assert!(!options.is_recursive());
    }

    #[test]
    fn test_search_options_from_bits_truncate() {
        assert_eq!(SearchOptions::from_bits_truncate(0xFF).bits(), 3);
        assert_eq!(
            SearchOptions::from_bits_truncate(1),
            SearchOptions::ALL_DIRECTORIES
        );
    }

    #[test]
    fn test_search_options_debug() {
        assert_eq!(
            format!("{:?}", SearchOptions::DEFAULT),
            "SearchOptions(Default)"
        );
        assert_eq!(
            format!("{:?}", SearchOptions::ALL_DIRECTORIES | SearchOptions::STRIP_PATHS),
            "SearchOptions(AllDirectories | StripPaths)"
        );
    }

    #[test]
    fn test_storage_debug() {
        struct NullStorage;

        #[async_trait]
        impl Storage for NullStorage {
            fn backend_name(&self) -> &str {
                "null"
            }

            async fn list_containers(&self, _mask: Option<&str>) -> StorageResult<Vec<String>> {
                Ok(vec![])
            }

            async fn create_or_get_container(
                &self,
                name: &str,
                _permission: ContainerPermission,
                _fail_if_exists: bool,
            ) -> StorageResult<Container> {
                Err(StorageError::ContainerNotFound(name.to_string()))
            }

            async fn get_container(&self, name: &str) -> StorageResult<Container> {
                Err(StorageError::ContainerNotFound(name.to_string()))
            }

            async fn delete_container(&self, _name: &str) -> StorageResult<()> {
                Ok(())
            }
        }

        let storage: &dyn Storage = &NullStorage;
        assert_eq!(format!("{:?}", storage), "Storage(backend=null)");
    }
}
