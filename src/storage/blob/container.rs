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
use bytes::Bytes;
use std::fmt::{Debug, Formatter};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

use super::service::{BlobItem, BlobService, BlobServiceError, PublicAccess};
use crate::storage::error::{ResultExt, StorageError, StorageResult, ensure_not_empty};
use crate::storage::pagination::collect_pages;
use crate::storage::path::{
    ensure_within_root, join_url, last_segment, normalize_directory, normalize_file,
};
use crate::storage::provider::{ContainerPermission, SearchOptions, StorageContainer};
use crate::util::stream::{
    FileStream, ReadSource, WriteSink, copy_preserving_position, read_from_start,
};

impl From<PublicAccess> for ContainerPermission {
    fn from(access: PublicAccess) -> Self {
        match access {
            PublicAccess::Blob => ContainerPermission::Public,
            PublicAccess::Off => ContainerPermission::Private,
        }
    }
}

/// Public read maps to blob-level access, everything else to off.
fn public_access_for(permission: ContainerPermission) -> PublicAccess {
    if permission.is_public() {
        PublicAccess::Blob
    } else {
        PublicAccess::Off
    }
}

/// Container on a flat key-space blob service.
///
/// Directories only exist as key prefixes: creating one is a no-op and a
/// directory disappears with its last blob.
#[derive(Clone)]
pub struct BlobStorageContainer {
    service: Arc<dyn BlobService>,
    name: String,
    max_pages: usize,
}

impl BlobStorageContainer {
    pub(crate) fn new(service: Arc<dyn BlobService>, name: String, max_pages: usize) -> Self {
        Self {
            service,
            name,
            max_pages,
        }
    }

    fn checked_file(&self, path: &str) -> StorageResult<String> {
        ensure_not_empty("path", path)?;
        ensure_within_root("path", path)?;
        let key = normalize_file(path);
        if key.is_empty() {
            return Err(StorageError::invalid_argument(
                "path",
                format!("does not name a file: {:?}", path),
            ));
        }
        Ok(key)
    }

    fn checked_directory(&self, path: &str) -> StorageResult<String> {
        ensure_within_root("path", path)?;
        Ok(normalize_directory(path))
    }

    /// Every blob key below `prefix`, drained over all listing segments.
    async fn collect_blob_names(&self, operation: &str, prefix: &str) -> StorageResult<Vec<String>> {
        let service = &self.service;
        let container = self.name.as_str();
        let items = collect_pages(operation, prefix, self.max_pages, move |token| {
            service.list_blobs_segmented(container, prefix, true, token)
        })
        .await?;

        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                BlobItem::Blob { name } if !name.is_empty() => Some(name),
                _ => None,
            })
            .collect())
    }
}

#[async_trait]
impl StorageContainer for BlobStorageContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_permission(&self) -> StorageResult<ContainerPermission> {
        let access = self
            .service
            .get_public_access(&self.name)
            .await
            .or_operation_failed("get the container permission", &self.name)?;
        Ok(access.into())
    }

    async fn set_permission(&self, permission: ContainerPermission) -> StorageResult<()> {
        let permission = permission.ensure_specified()?;
        self.service
            .set_public_access(&self.name, public_access_for(permission))
            .await
            .or_operation_failed("set the container permission", &self.name)?;
        debug!(
            "Set permission={:?} on container={}",
            permission, self.name
        );
        Ok(())
    }

    async fn create_directory(&self, path: &str) -> StorageResult<()> {
        ensure_not_empty("path", path)?;
        self.checked_directory(path)?;
        Ok(())
    }

    async fn delete_directory(&self, path: &str) -> StorageResult<()> {
        ensure_not_empty("path", path)?;
        let prefix = self.checked_directory(path)?;
        if prefix.is_empty() {
            return Err(StorageError::invalid_argument(
                "path",
                "the container root cannot be deleted as a directory",
            ));
        }

        let names = self.collect_blob_names("list the directory", &prefix).await?;
        for name in &names {
            self.service
                .delete_blob_if_exists(&self.name, name)
                .await
                .or_operation_failed("delete the directory", &prefix)?;
        }

        debug!(
            "Deleted directory={} with blob_count={} in container={}",
            prefix,
            names.len(),
            self.name
        );
        Ok(())
    }

    async fn list_directories(&self, path: &str) -> StorageResult<Vec<String>> {
        let prefix = self.checked_directory(path)?;
        let service = &self.service;
        let container = self.name.as_str();
        let prefix_ref = prefix.as_str();
        let items = collect_pages("list the directories", &prefix, self.max_pages, move |token| {
            service.list_blobs_segmented(container, prefix_ref, false, token)
        })
        .await?;

        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                BlobItem::Directory { prefix } => Some(last_segment(&prefix).to_string()),
                BlobItem::Blob { .. } => None,
            })
            .filter(|name| !name.is_empty())
            .collect())
    }

    async fn write_file(&self, source: &mut dyn ReadSource, path: &str) -> StorageResult<()> {
        let key = self.checked_file(path)?;
        let data = read_from_start(source)
            .await
            .or_operation_failed("read the source stream", &key)?;
        let size = data.len();

        self.service
            .upload(&self.name, &key, Bytes::from(data))
            .await
            .or_operation_failed("write the file", &key)?;

        debug!(
            "Wrote file={} size={} in container={}",
            key, size, self.name
        );
        Ok(())
    }

    async fn read_file(&self, path: &str) -> StorageResult<FileStream> {
        let key = self.checked_file(path)?;
        let data = self
            .service
            .download(&self.name, &key)
            .await
            .or_operation_failed("read the file", &key)?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn read_file_into(&self, sink: &mut dyn WriteSink, path: &str) -> StorageResult<()> {
        let key = self.checked_file(path)?;
        let data = self
            .service
            .download(&self.name, &key)
            .await
            .or_operation_failed("read the file", &key)?;

        let mut reader: &[u8] = &data;
        copy_preserving_position(&mut reader, sink)
            .await
            .or_operation_failed("copy the file into the sink", &key)?;
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> StorageResult<()> {
        let key = self.checked_file(path)?;
        let existed = self
            .service
            .delete_blob_if_exists(&self.name, &key)
            .await
            .or_operation_failed("delete the file", &key)?;
        if !existed {
            return Err(StorageError::operation_failed(
                "delete the file",
                &key,
                BlobServiceError::BlobNotFound(key.clone()),
            ));
        }
        Ok(())
    }

    async fn list_files(&self, path: &str, options: SearchOptions) -> StorageResult<Vec<String>> {
        let prefix = self.checked_directory(path)?;

        let names = if options.is_recursive() {
            self.collect_blob_names("list the files", &prefix).await?
        } else {
            let service = &self.service;
            let container = self.name.as_str();
            let prefix_ref = prefix.as_str();
            collect_pages("list the files", &prefix, self.max_pages, move |token| {
                service.list_blobs_segmented(container, prefix_ref, false, token)
            })
            .await?
            .into_iter()
            .filter_map(|item| match item {
                BlobItem::Blob { name } if !name.is_empty() => Some(name),
                _ => None,
            })
            .collect()
        };

        if options.strips_paths() {
            Ok(names
                .iter()
                .map(|name| last_segment(name).to_string())
                .filter(|name| !name.is_empty())
                .collect())
        } else {
            Ok(names)
        }
    }

    fn url_for_file(&self, path: &str) -> StorageResult<String> {
        let key = self.checked_file(path)?;
        join_url(
            self.service.base_url(),
            std::iter::once(self.name.as_str()).chain(key.split('/')),
        )
        .or_operation_failed("build the file url", &key)
    }
}

impl Debug for BlobStorageContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BlobStorageContainer(name={}, base_url={})",
            self.name,
            self.service.base_url()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::blob::object_store::ObjectStoreBlobService;
    use crate::storage::error::StorageErrorReason;
    use crate::storage::pagination::DEFAULT_MAX_PAGES;
    use object_store::memory::InMemory;
    use std::error::Error;
    use tokio::io::AsyncReadExt;

    async fn container(name: &str, page_size: usize) -> BlobStorageContainer {
        let service: Arc<dyn BlobService> = Arc::new(
            ObjectStoreBlobService::with_store(Arc::new(InMemory::new()), "memory://store")
                .with_page_size(page_size),
        );
        service.create_container_if_not_exists(name).await.unwrap();
        BlobStorageContainer::new(service, name.to_string(), DEFAULT_MAX_PAGES)
    }

    async fn write(container: &BlobStorageContainer, path: &str, content: &[u8]) {
        let mut source = Cursor::new(content.to_vec());
        container.write_file(&mut source, path).await.unwrap();
    }

    #[test]
    fn test_permission_mapping() {
        assert_eq!(
            public_access_for(ContainerPermission::Public),
            PublicAccess::Blob
        );
        assert_eq!(
            public_access_for(ContainerPermission::Private),
            PublicAccess::Off
        );
        assert_eq!(
            ContainerPermission::from(PublicAccess::Blob),
            ContainerPermission::Public
        );
        assert_eq!(
            ContainerPermission::from(PublicAccess::Off),
            ContainerPermission::Private
        );
    }

    #[tokio::test]
    async fn test_permission_round_trip() {
        let container = container("photos", 1000).await;

        assert_eq!(
            container.get_permission().await.unwrap(),
            ContainerPermission::Private
        );
        container
            .set_permission(ContainerPermission::Public)
            .await
            .unwrap();
        assert_eq!(
            container.get_permission().await.unwrap(),
            ContainerPermission::Public
        );

        let error = container
            .set_permission(ContainerPermission::Unspecified)
            .await
            .unwrap_err();
        assert!(error.is_precondition());
    }

    #[tokio::test]
    async fn test_write_read_round_trip_with_backslashes() {
        let container = container("data", 1000).await;
        let content: Vec<u8> = (0..=254u8).collect();

        let mut source = Cursor::new(content.clone());
        source.set_position(17);
        container
            .write_file(&mut source, "\\folder1\\subfolder\\fileText1.dat")
            .await
            .unwrap();
        assert_eq!(source.position(), 17);

        let mut stream = container
            .read_file("folder1/subfolder/fileText1.dat")
            .await
            .unwrap();
        let mut read_back = Vec::new();
        stream.read_to_end(&mut read_back).await.unwrap();
        assert_eq!(read_back, content);
    }

    #[tokio::test]
    async fn test_read_file_into_restores_sink_position() {
        let container = container("data", 1000).await;
        write(&container, "a.txt", b"payload").await;

        let mut sink = Cursor::new(Vec::new());
        container.read_file_into(&mut sink, "a.txt").await.unwrap();

        assert_eq!(sink.position(), 0);
        assert_eq!(sink.into_inner(), b"payload");
    }

    #[tokio::test]
    async fn test_read_missing_file_fails() {
        let container = container("data", 1000).await;

        let error = container.read_file("missing.txt").await.err().unwrap();
        assert_eq!(
            error.reason(),
            Some(StorageErrorReason::StorageOperationFailed)
        );
        assert!(error.to_string().contains("missing.txt"));

        let mut sink = Cursor::new(Vec::new());
        let error = container
            .read_file_into(&mut sink, "missing.txt")
            .await
            .unwrap_err();
        assert_eq!(
            error.reason(),
            Some(StorageErrorReason::StorageOperationFailed)
        );
    }

    #[tokio::test]
    async fn test_list_files_modes() {
        let container = container("data", 2).await;
        for path in ["top.txt", "d/one.txt", "d/two.txt", "d/e/three.txt"] {
            write(&container, path, b"x").await;
        }

        let mut flat = container
            .list_files("d", SearchOptions::DEFAULT)
            .await
            .unwrap();
        flat.sort();
        assert_eq!(flat, vec!["d/one.txt", "d/two.txt"]);

        let mut recursive = container
            .list_files("/d/", SearchOptions::ALL_DIRECTORIES)
            .await
            .unwrap();
        recursive.sort();
        assert_eq!(recursive, vec!["d/e/three.txt", "d/one.txt", "d/two.txt"]);

        let mut stripped = container
            .list_files("d", SearchOptions::ALL_DIRECTORIES | SearchOptions::STRIP_PATHS)
            .await
            .unwrap();
        stripped.sort();
        assert_eq!(stripped, vec!["one.txt", "three.txt", "two.txt"]);

        let root = container
            .list_files("", SearchOptions::STRIP_PATHS)
            .await
            .unwrap();
        assert_eq!(root, vec!["top.txt"]);
    }

    #[tokio::test]
    async fn test_list_directories() {
        let container = container("data", 1000).await;
        write(&container, "folder1/subfolder/fileText1.dat", b"x").await;
        write(&container, "folder2/file.dat", b"x").await;

        let mut top = container.list_directories("").await.unwrap();
        top.sort();
        assert_eq!(top, vec!["folder1", "folder2"]);
        assert_eq!(
            container.list_directories("folder1").await.unwrap(),
            vec!["subfolder"]
        );
        assert!(
            container
                .list_directories("folder1/subfolder")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_delete_directory() {
        let container = container("data", 2).await;
        for path in ["keep.txt", "gone/a", "gone/b", "gone/c/d", "gone-not/x"] {
            write(&container, path, b"x").await;
        }

        container.delete_directory("gone").await.unwrap();

        let mut remaining = container
            .list_files("", SearchOptions::ALL_DIRECTORIES)
            .await
            .unwrap();
        remaining.sort();
        assert_eq!(remaining, vec!["gone-not/x", "keep.txt"]);
    }

    #[tokio::test]
    async fn test_delete_directory_rejects_root() {
        let container = container("data", 1000).await;
        for path in ["", "/", "\\", "//"] {
            let error = container.delete_directory(path).await.unwrap_err();
            assert!(error.is_precondition(), "path {:?}", path);
        }
    }

    #[tokio::test]
    async fn test_create_directory_is_noop() {
        let container = container("data", 1000).await;
        container.create_directory("a/b/c").await.unwrap();
        assert!(container.list_directories("").await.unwrap().is_empty());
        assert!(container.create_directory("").await.unwrap_err().is_precondition());
    }

    #[tokio::test]
    async fn test_delete_file() {
        let container = container("data", 1000).await;
        write(&container, "f.txt", b"x").await;

        container.delete_file("/f.txt").await.unwrap();
        assert!(
            container
                .list_files("", SearchOptions::DEFAULT)
                .await
                .unwrap()
                .is_empty()
        );

        let error = container.delete_file("f.txt").await.unwrap_err();
        assert_eq!(
            error.reason(),
            Some(StorageErrorReason::StorageOperationFailed)
        );
        assert!(error.source().unwrap().to_string().contains("f.txt"));
    }

    #[tokio::test]
    async fn test_preconditions() {
        let container = container("data", 1000).await;
        let mut source = Cursor::new(b"x".to_vec());

        assert!(
            container
                .write_file(&mut source, "")
                .await
                .unwrap_err()
                .is_precondition()
        );
        assert!(
            container
                .write_file(&mut source, "../escape.txt")
                .await
                .unwrap_err()
                .is_precondition()
        );
        assert!(container.read_file("/").await.err().unwrap().is_precondition());
        assert!(container.delete_file("  ").await.unwrap_err().is_precondition());
        assert!(
            container
                .list_files("a/../..", SearchOptions::DEFAULT)
                .await
                .unwrap_err()
                .is_precondition()
        );
    }

    #[tokio::test]
    async fn test_url_for_file() {
        let container = container("photos", 1000).await;

        assert_eq!(
            container.url_for_file("\\2024\\summer beach.jpg").unwrap(),
            "memory://store/photos/2024/summer%20beach.jpg"
        );
    }

    #[tokio::test]
    async fn test_debug_format() {
        let container = container("photos", 1000).await;
        let debug_str = format!("{:?}", container);
        assert!(debug_str.contains("photos"));
        assert!(debug_str.contains("memory://store"));
    }
}
