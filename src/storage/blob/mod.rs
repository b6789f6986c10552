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

//! Flat key-space backend.
//!
//! [`BlobStorage`] and [`BlobStorageContainer`] implement the storage contract
//! on top of a [`BlobService`], the segmented client of the underlying object
//! store. [`ObjectStoreBlobService`] provides that client for every
//! `object_store` backend (in-memory, S3, Azure, GCS).

pub mod container;
pub mod object_store;
pub mod service;
pub mod storage;

pub use container::BlobStorageContainer;
pub use object_store::ObjectStoreBlobService;
pub use service::{BlobItem, BlobService, BlobServiceError, PublicAccess};
pub use storage::{BlobStorage, normalize_container_name};
