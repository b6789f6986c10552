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

//! Container-oriented storage abstraction layer
//!
//! This module provides one contract ([`Storage`] and [`StorageContainer`]) for
//! two structurally different backends:
//!
//! - [`blob`]: a flat key-space object store where directories are key prefixes
//!   and flat listings are paged with continuation tokens (in-memory, AWS S3, Azure, GCS
//!   through the `object_store` crate)
//! - [`filesystem`]: a real directory tree on the local disk
//!
//! Paths are normalized by [`path`], segmented listings are drained by
//! [`pagination`] and every backend failure is translated into a [`StorageError`].

pub mod blob;
pub mod config;
pub mod error;
pub mod factory;
pub mod filesystem;
pub mod pagination;
pub mod path;
pub mod provider;

// Public exports
pub use blob::{BlobStorage, BlobStorageContainer};
pub use config::{StorageConfig, StorageType};
pub use error::{StorageError, StorageErrorReason, StorageResult};
pub use factory::StorageFactory;
pub use filesystem::{FileSystemStorage, FileSystemStorageContainer};
pub use provider::{Container, ContainerPermission, SearchOptions, Storage, StorageContainer};
