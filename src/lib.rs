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

//! # Stowage
//!
//! A container-oriented storage abstraction for Rust.
//!
//! Stowage exposes one contract for storing files in named containers and
//! satisfies it with structurally different backends: flat key-space object
//! stores (AWS S3, Azure Blob Storage, Google Cloud Storage, in-memory) and
//! the hierarchical local filesystem. Callers never see backend pagination,
//! path syntax or permission models.
//!
//! ## Features
//!
//! - **One contract**: [`Storage`] manages containers, [`StorageContainer`] manages directories and files
//! - **Path normalization**: `\` and `/` separated paths, with or without leading separators
//! - **Eager listings**: continuation-token pages are drained into one ordered `Vec`
//! - **Uniform errors**: every backend failure becomes a [`StorageError`] with the operation and path
//!
//! ## Quick Start
//!
//! ### Local Filesystem Example
//!
//! ```rust,no_run
//! use std::io::Cursor;
//! use stowage::{
//!     ContainerPermission, SearchOptions, Storage, StorageConfig, StorageContainer, StorageFactory,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = StorageConfig::filesystem()
//!     .with_option("path", "/srv/warehouse")
//!     .with_option("url_base", "https://files.example.com");
//! let storage = StorageFactory::from_config(config)?;
//!
//! let container = storage
//!     .create_or_get_container("reports", ContainerPermission::Private, false)
//!     .await?;
//! container
//!     .write_file(&mut Cursor::new(b"quarterly numbers".to_vec()), "2024/q1.txt")
//!     .await?;
//!
//! let files = container.list_files("2024", SearchOptions::STRIP_PATHS).await?;
//! println!("{:?} at {}", files, container.url_for_file("2024/q1.txt")?);
//! # Ok(())
//! # }
//! ```
//!
//! ### AWS S3 Example
//!
//! ```rust,no_run
//! use stowage::{ContainerPermission, Storage, StorageConfig, StorageContainer, StorageFactory};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = StorageConfig::aws()
//!     .with_option("bucket", "my-bucket")
//!     .with_option("region", "us-east-1")
//!     .with_option("access_key_id", "ACCESS_KEY")
//!     .with_option("secret_access_key", "SECRET_KEY");
//! let storage = StorageFactory::from_config(config)?;
//!
//! let container = storage
//!     .create_or_get_container("images", ContainerPermission::Public, false)
//!     .await?;
//! println!("{:?}", container.list_directories("").await?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Azure Example
//!
//! ```rust,no_run
//! use stowage::{Storage, StorageConfig, StorageFactory};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = StorageConfig::azure()
//!     .with_option("container", "my-container")
//!     .with_option("account_name", "my-account")
//!     .with_option("tenant_id", "TENANT_ID")
//!     .with_option("client_id", "CLIENT_ID")
//!     .with_option("client_secret", "CLIENT_SECRET");
//! let storage = StorageFactory::from_config(config)?;
//!
//! println!("{:?}", storage.list_containers(Some("logs")).await?);
//! # Ok(())
//! # }
//! ```
//!
//! For runnable programs, see the `demos/` directory.
//!
//! ## Modules
//!
//! - [`storage`] - The storage contract, both backends, configuration and errors
//! - [`util`] - Utility functions and helpers

pub mod storage;
pub mod util;

// Re-export commonly used types
pub use storage::{
    Container, ContainerPermission, SearchOptions, Storage, StorageConfig, StorageContainer,
    StorageError, StorageErrorReason, StorageFactory, StorageResult, StorageType,
};
pub use util::stream::{FileStream, ReadSource, WriteSink};
