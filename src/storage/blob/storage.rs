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
use regex::Regex;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

use super::container::BlobStorageContainer;
use super::service::BlobService;
use crate::storage::error::{ResultExt, StorageError, StorageResult, ensure_not_empty};
use crate::storage::pagination::{DEFAULT_MAX_PAGES, collect_pages};
use crate::storage::provider::{Container, ContainerPermission, Storage, StorageContainer};

const MIN_CONTAINER_NAME_LEN: usize = 3;
const MAX_CONTAINER_NAME_LEN: usize = 63;

static CONTAINER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("container name pattern is valid")
});

/// Lowercase `name` and check it against the blob container naming rules.
///
/// Names are 3 to 63 characters of lowercase letters, digits and single
/// hyphens, starting and ending with a letter or digit.
pub fn normalize_container_name(name: &str) -> StorageResult<String> {
    ensure_not_empty("name", name)?;
    let normalized = name.trim().to_lowercase();

    let length = normalized.chars().count();
    if !(MIN_CONTAINER_NAME_LEN..=MAX_CONTAINER_NAME_LEN).contains(&length) {
        return Err(StorageError::invalid_argument(
            "name",
            format!(
                "container names must be {} to {} characters long: {}",
                MIN_CONTAINER_NAME_LEN, MAX_CONTAINER_NAME_LEN, name
            ),
        ));
    }
    if !CONTAINER_NAME.is_match(&normalized) {
        return Err(StorageError::invalid_argument(
            "name",
            format!(
                "container names may only contain letters, digits and single hyphens: {}",
                name
            ),
        ));
    }
    Ok(normalized)
}

/// [`Storage`] over a flat key-space [`BlobService`].
pub struct BlobStorage {
    service: Arc<dyn BlobService>,
    max_pages: usize,
}

impl BlobStorage {
    pub fn new(service: Arc<dyn BlobService>) -> Self {
        Self {
            service,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Bound the number of listing segments drained per call (at least 1).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    fn container(&self, name: String) -> Container {
        Container::Blob(BlobStorageContainer::new(
            Arc::clone(&self.service),
            name,
            self.max_pages,
        ))
    }

    /// Remove a container created by the current call after a failed follow-up step.
    async fn roll_back_creation(&self, name: &str) {
        match self.service.delete_container_if_exists(name).await {
            Ok(_) => info!("Rolled back creation of container={}", name),
            Err(e) => warn!(
                "Failed to roll back creation of container={}, error={}",
                name, e
            ),
        }
    }
}

#[async_trait]
impl Storage for BlobStorage {
    fn backend_name(&self) -> &str {
        "blob"
    }

    async fn list_containers(&self, mask: Option<&str>) -> StorageResult<Vec<String>> {
        let mask = mask
            .map(|mask| mask.trim().to_lowercase())
            .filter(|mask| !mask.is_empty());

        let service = &self.service;
        let names = collect_pages("list the containers", "", self.max_pages, move |token| {
            service.list_containers_segmented(token)
        })
        .await?;

        Ok(names
            .into_iter()
            .filter(|name| !name.is_empty())
            .filter(|name| match &mask {
                Some(mask) => name.to_lowercase().contains(mask.as_str()),
                None => true,
            })
            .collect())
    }

    async fn create_or_get_container(
        &self,
        name: &str,
        permission: ContainerPermission,
        fail_if_exists: bool,
    ) -> StorageResult<Container> {
        let name = normalize_container_name(name)?;
        let permission = permission.ensure_specified()?;

        let created = self
            .service
            .create_container_if_not_exists(&name)
            .await
            .or_operation_failed("create the container", &name)?;

        if !created && fail_if_exists {
            return Err(StorageError::ContainerExistAlready(name));
        }

        let container = self.container(name);
        if let Err(e) = container.set_permission(permission).await {
            if created {
                self.roll_back_creation(container.name()).await;
            }
            return Err(e);
        }

        if created {
            info!(
                "Created container={} with permission={:?}",
                container.name(),
                permission
            );
        }
        Ok(container)
    }

    async fn get_container(&self, name: &str) -> StorageResult<Container> {
        let name = normalize_container_name(name)?;
        let exists = self
            .service
            .container_exists(&name)
            .await
            .or_operation_failed("get the container", &name)?;

        if !exists {
            return Err(StorageError::ContainerNotFound(name));
        }
        Ok(self.container(name))
    }

    async fn delete_container(&self, name: &str) -> StorageResult<()> {
        let name = normalize_container_name(name)?;
        let deleted = self
            .service
            .delete_container_if_exists(&name)
            .await
            .or_operation_failed("delete the container", &name)?;

        if deleted {
            info!("Deleted container={}", name);
        }
        Ok(())
    }
}

impl Debug for BlobStorage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BlobStorage(base_url={}, max_pages={})",
            self.service.base_url(),
            self.max_pages
        )
    }
}
