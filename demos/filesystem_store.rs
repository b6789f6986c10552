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
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Root directory: first argument, or a scratch directory under the system temp dir
    let root = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("stowage-demo"));
    std::fs::create_dir_all(&root).unwrap();

    let storage_config = StorageConfig::filesystem()
        .with_option("path", root.to_str().unwrap())
        .with_option("url_base", "https://files.example.com");
    let storage = StorageFactory::from_config(storage_config).unwrap();

    let container = storage
        .create_or_get_container("demo", ContainerPermission::Private, false)
        .await
        .unwrap();

    for (path, body) in [
        ("reports/2024/q1.txt", "first quarter"),
        ("reports/2024/q2.txt", "second quarter"),
        ("reports\\2023\\q4.txt", "last year"),
    ] {
        container
            .write_file(&mut Cursor::new(body.as_bytes().to_vec()), path)
            .await
            .unwrap();
    }

    println!("containers:  {:?}", storage.list_containers(None).await.unwrap());
    println!(
        "directories: {:?}",
        container.list_directories("reports").await.unwrap()
    );
    println!(
        "all files:   {:?}",
        container
            .list_files("", SearchOptions::ALL_DIRECTORIES)
            .await
            .unwrap()
    );
    println!(
        "2024 names:  {:?}",
        container
            .list_files("reports/2024", SearchOptions::STRIP_PATHS)
            .await
            .unwrap()
    );

    let mut contents = String::new();
    container
        .read_file("/reports/2024/q1.txt")
        .await
        .unwrap()
        .read_to_string(&mut contents)
        .await
        .unwrap();
    println!("q1 contents: {}", contents);
    println!(
        "q1 url:      {}",
        container.url_for_file("reports/2024/q1.txt").unwrap()
    );

    storage.delete_container("demo").await.unwrap();
}
