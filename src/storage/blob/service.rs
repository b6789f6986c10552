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
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::pagination::Page;

/// Public read access level of a blob container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicAccess {
    /// No anonymous access.
    #[default]
    Off,
    /// Anonymous read access to individual blobs.
    Blob,
}

/// One entry of a blob listing. Names are relative to the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobItem {
    Blob { name: String },
    /// Virtual directory produced by a delimiter listing, ends with `/`.
    Directory { prefix: String },
}

/// Failures raised by a [`BlobService`].
#[derive(Error, Debug)]
pub enum BlobServiceError {
    #[error("container '{0}' not found")]
    ContainerNotFound(String),

    #[error("blob '{0}' not found")]
    BlobNotFound(String),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Invalid object path: {0}")]
    InvalidPath(#[from] object_store::path::Error),

    #[error("Invalid container metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

pub type ServiceResult<T> = Result<T, BlobServiceError>;

/// Client for a flat key-space blob service.
///
/// This is the boundary to the backend SDK. Listings return one [`Page`] per
/// call and an optional continuation token for the next one.
#[async_trait]
pub trait BlobService: Send + Sync {
    /// Base URL under which containers are addressed.
    fn base_url(&self) -> &str;

    /// One segment of the container listing.
    async fn list_containers_segmented(
        &self,
        continuation: Option<String>,
    ) -> ServiceResult<Page<String>>;

    /// Create the container with public access off. Returns `false` if it already existed.
    async fn create_container_if_not_exists(&self, container: &str) -> ServiceResult<bool>;

    async fn container_exists(&self, container: &str) -> ServiceResult<bool>;

    /// Delete the container and its blobs. Returns `false` if it did not exist.
    async fn delete_container_if_exists(&self, container: &str) -> ServiceResult<bool>;

    async fn get_public_access(&self, container: &str) -> ServiceResult<PublicAccess>;

    async fn set_public_access(&self, container: &str, access: PublicAccess) -> ServiceResult<()>;

    /// One segment of the blobs under `prefix`.
    ///
    /// With `flat` every blob below the prefix is returned, in segments of at
    /// most the service page size. Without it only the blobs directly under the
    /// prefix are returned, together with one [`BlobItem::Directory`] per virtual
    /// sub-directory; services whose delimiter listing is unpaged return it as a
    /// single last page.
    async fn list_blobs_segmented(
        &self,
        container: &str,
        prefix: &str,
        flat: bool,
        continuation: Option<String>,
    ) -> ServiceResult<Page<BlobItem>>;

    /// Upload `data` as the blob `key`, replacing existing content.
    async fn upload(&self, container: &str, key: &str, data: Bytes) -> ServiceResult<()>;

    async fn download(&self, container: &str, key: &str) -> ServiceResult<Bytes>;

    /// Returns `false` if the blob did not exist.
    async fn delete_blob_if_exists(&self, container: &str, key: &str) -> ServiceResult<bool>;
}
