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

use std::io::Cursor;

use stowage::{
    ContainerPermission, SearchOptions, Storage, StorageConfig, StorageContainer, StorageFactory,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // A tiny page size makes every listing span several pages
    let storage_config = StorageConfig::memory().with_option("page_size", "2");
    let storage = StorageFactory::from_config(storage_config).unwrap();

    let images = storage
        .create_or_get_container("Images", ContainerPermission::Public, false)
        .await
        .unwrap();
    println!(
        "container {} permission={:?}",
        images.name(),
        images.get_permission().await.unwrap()
    );

    for index in 0..5 {
        images
            .write_file(
                &mut Cursor::new(vec![index as u8; 255]),
                &format!("gallery/{}/photo-{}.jpg", 2020 + index % 2, index),
            )
            .await
            .unwrap();
    }

    println!(
        "top level:   {:?}",
        images.list_directories("").await.unwrap()
    );
    println!(
        "years:       {:?}",
        images.list_directories("gallery").await.unwrap()
    );
    println!(
        "recursive:   {:?}",
        images
            .list_files("gallery", SearchOptions::ALL_DIRECTORIES | SearchOptions::STRIP_PATHS)
            .await
            .unwrap()
    );
    println!(
        "url:         {}",
        images.url_for_file("gallery/2020/photo-0.jpg").unwrap()
    );

    images.delete_directory("gallery/2021").await.unwrap();
    println!(
        "after prune: {:?}",
        images
            .list_files("", SearchOptions::ALL_DIRECTORIES)
            .await
            .unwrap()
    );

    match storage.get_container("missing").await {
        Ok(_) => println!("unexpected container"),
        Err(e) => println!("lookup failed: {} (reason={:?})", e, e.reason()),
    }
}
