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
use tracing::debug;

use crate::storage::error::{ResultExt, StorageError, StorageResult, ensure_not_empty};
use crate::storage::path::{
    SEPARATOR, ensure_within_root, join_url, normalize_directory, normalize_file,
};
use crate::storage::provider::{ContainerPermission, SearchOptions, StorageContainer};
use crate::util::stream::{
    FileStream, ReadSource, WriteSink, copy_from_start, copy_preserving_position,
};

/// Container backed by one directory of the local filesystem.
///
/// Permissions are not modelled: every container reports `Private` and
/// permission changes are accepted without effect.
#[derive(Clone)]
pub struct FileSystemStorageContainer {
    name: String,
    root: PathBuf,
    url_base: Option<String>,
}

impl FileSystemStorageContainer {
    pub(crate) fn new(name: String, root: PathBuf, url_base: Option<String>) -> Self {
        Self {
            name,
            root,
            url_base,
        }
    }

    /// The directory holding this container's files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a normalized relative path onto the container root.
    fn resolve(&self, normalized: &str) -> PathBuf {
        normalized
            .split(SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    fn checked_file(&self, path: &str) -> StorageResult<String> {
        ensure_not_empty("path", path)?;
        ensure_within_root("path", path)?;
        let normalized = normalize_file(path);
        if normalized.is_empty() {
            return Err(StorageError::invalid_argument(
                "path",
                format!("does not name a file: {:?}", path),
            ));
        }
        Ok(normalized)
    }

    fn checked_directory(&self, path: &str) -> StorageResult<String> {
        ensure_within_root("path", path)?;
        Ok(normalize_directory(path))
    }

    /// `/`-separated path of `full` relative to the container root.
    fn relative_to_root(&self, full: &Path) -> String {
        let relative = full.strip_prefix(&self.root).unwrap_or(full);
        relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Files below `directory`, descending into sub-directories when `recursive`.
    async fn walk_files(&self, directory: PathBuf, recursive: bool) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![directory];

        while let Some(current) = pending.pop() {
            let mut entries = fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    if recursive {
                        pending.push(entry.path());
                    }
                } else if file_type.is_symlink() {
                    // Links to directories and dangling links are not listed.
                    match fs::metadata(entry.path()).await {
                        Ok(target) if target.is_file() => files.push(entry.path()),
                        _ => {}
                    }
                } else {
                    files.push(entry.path());
                }
            }
        }

        Ok(files)
    }
}

#[async_trait]
impl StorageContainer for FileSystemStorageContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_permission(&self) -> StorageResult<ContainerPermission> {
        Ok(ContainerPermission::Private)
    }

    async fn set_permission(&self, permission: ContainerPermission) -> StorageResult<()> {
        permission.ensure_specified()?;
        Ok(())
    }

    async fn create_directory(&self, path: &str) -> StorageResult<()> {
        ensure_not_empty("path", path)?;
        let normalized = self.checked_directory(path)?;
        fs::create_dir_all(self.resolve(&normalized))
            .await
            .or_operation_failed("create the directory", &normalized)
    }

    async fn delete_directory(&self, path: &str) -> StorageResult<()> {
        ensure_not_empty("path", path)?;
        let normalized = self.checked_directory(path)?;
        if normalized.is_empty() {
            return Err(StorageError::invalid_argument(
                "path",
                "the container root cannot be deleted as a directory",
            ));
        }

        fs::remove_dir_all(self.resolve(&normalized))
            .await
            .or_operation_failed("delete the directory", &normalized)?;
        debug!(
            "Deleted directory={} in container={}",
            normalized, self.name
        );
        Ok(())
    }

    async fn list_directories(&self, path: &str) -> StorageResult<Vec<String>> {
        let normalized = self.checked_directory(path)?;
        let directory = self.resolve(&normalized);

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&directory)
            .await
            .or_operation_failed("list the directories", &normalized)?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .or_operation_failed("list the directories", &normalized)?
        {
            let file_type = entry
                .file_type()
                .await
                .or_operation_failed("list the directories", &normalized)?;
            if file_type.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.is_empty() {
                    names.push(name);
                }
            }
        }

        Ok(names)
    }

    async fn write_file(&self, source: &mut dyn ReadSource, path: &str) -> StorageResult<()> {
        let normalized = self.checked_file(path)?;
        let target = self.resolve(&normalized);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .or_operation_failed("write the file", &normalized)?;
        }
        let mut file = fs::File::create(&target)
            .await
            .or_operation_failed("write the file", &normalized)?;
        let size = copy_from_start(source, &mut file)
            .await
            .or_operation_failed("write the file", &normalized)?;

        debug!(
            "Wrote file={} size={} in container={}",
            normalized, size, self.name
        );
        Ok(())
    }

    async fn read_file(&self, path: &str) -> StorageResult<FileStream> {
        let normalized = self.checked_file(path)?;
        let file = fs::File::open(self.resolve(&normalized))
            .await
            .or_operation_failed("read the file", &normalized)?;
        Ok(Box::new(file))
    }

    async fn read_file_into(&self, sink: &mut dyn WriteSink, path: &str) -> StorageResult<()> {
        let normalized = self.checked_file(path)?;
        let mut file = fs::File::open(self.resolve(&normalized))
            .await
            .or_operation_failed("read the file", &normalized)?;
        copy_preserving_position(&mut file, sink)
            .await
            .or_operation_failed("copy the file into the sink", &normalized)?;
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> StorageResult<()> {
        let normalized = self.checked_file(path)?;
        fs::remove_file(self.resolve(&normalized))
            .await
            .or_operation_failed("delete the file", &normalized)
    }

    async fn list_files(&self, path: &str, options: SearchOptions) -> StorageResult<Vec<String>> {
        let normalized = self.checked_directory(path)?;
        let files = self
            .walk_files(self.resolve(&normalized), options.is_recursive())
            .await
            .or_operation_failed("list the files", &normalized)?;

        let names = files.iter().map(|file| {
            if options.strips_paths() {
                file.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            } else {
                self.relative_to_root(file)
            }
        });

        Ok(names.filter(|name| !name.is_empty()).collect())
    }

    fn url_for_file(&self, path: &str) -> StorageResult<String> {
        let normalized = self.checked_file(path)?;
        let url_base = self.url_base.as_deref().ok_or_else(|| {
            StorageError::Unsupported(format!(
                "file URLs for container '{}' require the 'url_base' option",
                self.name
            ))
        })?;

        join_url(
            url_base,
            std::iter::once(self.name.as_str()).chain(normalized.split(SEPARATOR)),
        )
        .or_operation_failed("build the file url", &normalized)
    }
}

impl Debug for FileSystemStorageContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FileSystemStorageContainer(name={}, root={})",
            self.name,
            self.root.display()
        )
    }
}
