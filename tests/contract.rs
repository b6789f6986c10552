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

//! Behaviour every backend shares, exercised through the factory.

use std::io::Cursor;
use std::sync::Arc;

use stowage::{
    ContainerPermission, SearchOptions, Storage, StorageConfig, StorageContainer, StorageError,
    StorageErrorReason, StorageFactory,
};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

struct Backend {
    storage: Arc<dyn Storage>,
    // Keeps the filesystem root alive for the duration of a test
    _root: Option<TempDir>,
}

fn memory_backend() -> Backend {
    let config = StorageConfig::memory().with_option("page_size", "2");
    Backend {
        storage: StorageFactory::from_config(config).unwrap(),
        _root: None,
    }
}

fn filesystem_backend() -> Backend {
    let root = TempDir::new().unwrap();
    let config = StorageConfig::filesystem()
        .with_option("path", root.path().to_str().unwrap())
        .with_option("url_base", "https://files.example.com");
    Backend {
        storage: StorageFactory::from_config(config).unwrap(),
        _root: Some(root),
    }
}

fn backends() -> Vec<Backend> {
    vec![memory_backend(), filesystem_backend()]
}

fn sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values
}

async fn read_all(container: &impl StorageContainer, path: &str) -> Vec<u8> {
    let mut buffer = Vec::new();
    container
        .read_file(path)
        .await
        .unwrap()
        .read_to_end(&mut buffer)
        .await
        .unwrap();
    buffer
}

#[tokio::test]
async fn test_write_read_round_trip() {
    for backend in backends() {
        let container = backend
            .storage
            .create_or_get_container("roundtrip", ContainerPermission::Private, false)
            .await
            .unwrap();

        let payload = b"The quick brown fox".to_vec();
        container
            .write_file(&mut Cursor::new(payload.clone()), "\\docs\\fox.txt")
            .await
            .unwrap();

        assert_eq!(read_all(&container, "docs/fox.txt").await, payload);
        assert_eq!(read_all(&container, "/docs/fox.txt").await, payload);

        let mut sink = Cursor::new(Vec::new());
        container.read_file_into(&mut sink, "docs/fox.txt").await.unwrap();
        assert_eq!(sink.into_inner(), payload, "backend={}", backend.storage.backend_name());
    }
}

#[tokio::test]
async fn test_write_rewinds_source() {
    for backend in backends() {
        let container = backend
            .storage
            .create_or_get_container("rewind", ContainerPermission::Private, false)
            .await
            .unwrap();

        let mut source = Cursor::new(b"0123456789".to_vec());
        source.set_position(6);
        container.write_file(&mut source, "digits.txt").await.unwrap();

        assert_eq!(read_all(&container, "digits.txt").await, b"0123456789".to_vec());
    }
}

#[tokio::test]
async fn test_nested_file_lifecycle() {
    for backend in backends() {
        let name = backend.storage.backend_name().to_string();
        let container = backend
            .storage
            .create_or_get_container("lifecycle", ContainerPermission::Private, false)
            .await
            .unwrap();

        container
            .write_file(&mut Cursor::new(vec![7u8; 255]), "folder1/subfolder/fileText1.dat")
            .await
            .unwrap();

        assert_eq!(
            container
                .list_files("folder1/subfolder/", SearchOptions::STRIP_PATHS)
                .await
                .unwrap(),
            vec!["fileText1.dat"],
            "backend={}",
            name
        );
        assert_eq!(container.list_directories("").await.unwrap(), vec!["folder1"]);
        assert_eq!(
            container.list_directories("folder1").await.unwrap(),
            vec!["subfolder"]
        );
        assert_eq!(
            read_all(&container, "folder1/subfolder/fileText1.dat").await.len(),
            255
        );

        container
            .delete_file("folder1/subfolder/fileText1.dat")
            .await
            .unwrap();
        assert!(
            container
                .list_files("folder1/subfolder/", SearchOptions::STRIP_PATHS)
                .await
                .unwrap()
                .is_empty(),
            "backend={}",
            name
        );
    }
}

#[tokio::test]
async fn test_listing_modes() {
    for backend in backends() {
        let name = backend.storage.backend_name().to_string();
        let container = backend
            .storage
            .create_or_get_container("listing", ContainerPermission::Private, false)
            .await
            .unwrap();

        for path in ["a/top.txt", "a/b/middle.txt", "a/b/c/bottom.txt", "root.txt"] {
            container
                .write_file(&mut Cursor::new(path.as_bytes().to_vec()), path)
                .await
                .unwrap();
        }

        assert_eq!(
            sorted(container.list_files("a", SearchOptions::DEFAULT).await.unwrap()),
            vec!["a/top.txt"],
            "backend={}",
            name
        );
        assert_eq!(
            sorted(container.list_files("", SearchOptions::DEFAULT).await.unwrap()),
            vec!["root.txt"]
        );

        let recursive = sorted(
            container
                .list_files("a", SearchOptions::ALL_DIRECTORIES)
                .await
                .unwrap(),
        );
        assert_eq!(
            recursive,
            vec!["a/b/c/bottom.txt", "a/b/middle.txt", "a/top.txt"],
            "backend={}",
            name
        );
        for path in &recursive {
            assert_eq!(read_all(&container, path).await, path.as_bytes().to_vec());
        }

        assert_eq!(
            sorted(
                container
                    .list_files("a", SearchOptions::ALL_DIRECTORIES | SearchOptions::STRIP_PATHS)
                    .await
                    .unwrap()
            ),
            vec!["bottom.txt", "middle.txt", "top.txt"]
        );
    }
}

#[tokio::test]
async fn test_delete_directory() {
    for backend in backends() {
        let container = backend
            .storage
            .create_or_get_container("pruning", ContainerPermission::Private, false)
            .await
            .unwrap();

        for path in ["keep/one.txt", "drop/two.txt", "drop/deeper/three.txt"] {
            container
                .write_file(&mut Cursor::new(b"x".to_vec()), path)
                .await
                .unwrap();
        }

        container.delete_directory("drop").await.unwrap();
        assert_eq!(
            sorted(
                container
                    .list_files("", SearchOptions::ALL_DIRECTORIES)
                    .await
                    .unwrap()
            ),
            vec!["keep/one.txt"]
        );
        assert_eq!(container.list_directories("").await.unwrap(), vec!["keep"]);

        let error = container.delete_directory("/").await.unwrap_err();
        assert!(matches!(error, StorageError::InvalidArgument { .. }));
    }
}

#[tokio::test]
async fn test_missing_container() {
    for backend in backends() {
        let error = backend.storage.get_container("nowhere").await.unwrap_err();
        assert!(matches!(error, StorageError::ContainerNotFound(_)));
        assert_eq!(error.reason(), Some(StorageErrorReason::ContainerNotFound));

        backend.storage.delete_container("nowhere").await.unwrap();
    }
}

#[tokio::test]
async fn test_fail_if_exists() {
    for backend in backends() {
        backend
            .storage
            .create_or_get_container("unique", ContainerPermission::Private, true)
            .await
            .unwrap();

        let error = backend
            .storage
            .create_or_get_container("unique", ContainerPermission::Private, true)
            .await
            .unwrap_err();
        assert!(matches!(error, StorageError::ContainerExistAlready(_)));
        assert_eq!(error.reason(), Some(StorageErrorReason::ContainerExistAlready));

        let container = backend
            .storage
            .create_or_get_container("unique", ContainerPermission::Private, false)
            .await
            .unwrap();
        assert_eq!(container.name(), "unique");
    }
}

#[tokio::test]
async fn test_list_and_delete_containers() {
    for backend in backends() {
        for name in ["logs-2023", "logs-2024", "images"] {
            backend
                .storage
                .create_or_get_container(name, ContainerPermission::Private, false)
                .await
                .unwrap();
        }

        assert_eq!(
            sorted(backend.storage.list_containers(Some("logs")).await.unwrap()),
            vec!["logs-2023", "logs-2024"]
        );

        backend.storage.delete_container("logs-2023").await.unwrap();
        assert_eq!(
            sorted(backend.storage.list_containers(None).await.unwrap()),
            vec!["images", "logs-2024"]
        );
    }
}

#[tokio::test]
async fn test_missing_file() {
    for backend in backends() {
        let container = backend
            .storage
            .create_or_get_container("sparse", ContainerPermission::Private, false)
            .await
            .unwrap();

        let error = container.read_file("absent.txt").await.err().unwrap();
        assert_eq!(error.reason(), Some(StorageErrorReason::StorageOperationFailed));

        let error = container.delete_file("absent.txt").await.unwrap_err();
        assert_eq!(error.reason(), Some(StorageErrorReason::StorageOperationFailed));
    }
}

#[tokio::test]
async fn test_invalid_paths_are_preconditions() {
    for backend in backends() {
        let container = backend
            .storage
            .create_or_get_container("guarded", ContainerPermission::Private, false)
            .await
            .unwrap();

        for path in ["", "  ", "../escape.txt", "a/../../escape.txt"] {
            let error = container
                .write_file(&mut Cursor::new(b"x".to_vec()), path)
                .await
                .unwrap_err();
            assert!(error.is_precondition(), "path={:?}", path);
        }

        let error = backend
            .storage
            .create_or_get_container("other", ContainerPermission::Unspecified, false)
            .await
            .unwrap_err();
        assert!(error.is_precondition());
    }
}

#[tokio::test]
async fn test_blob_permissions() {
    let backend = memory_backend();
    let container = backend
        .storage
        .create_or_get_container("gallery", ContainerPermission::Public, false)
        .await
        .unwrap();
    assert_eq!(
        container.get_permission().await.unwrap(),
        ContainerPermission::Public
    );

    container
        .set_permission(ContainerPermission::Private)
        .await
        .unwrap();
    let reopened = backend.storage.get_container("gallery").await.unwrap();
    assert_eq!(
        reopened.get_permission().await.unwrap(),
        ContainerPermission::Private
    );
}

#[tokio::test]
async fn test_filesystem_containers_are_private() {
    let backend = filesystem_backend();
    let container = backend
        .storage
        .create_or_get_container("shared", ContainerPermission::Public, false)
        .await
        .unwrap();
    assert_eq!(
        container.get_permission().await.unwrap(),
        ContainerPermission::Private
    );
}

#[tokio::test]
async fn test_file_urls() {
    let memory = memory_backend();
    let container = memory
        .storage
        .create_or_get_container("photos", ContainerPermission::Private, false)
        .await
        .unwrap();
    assert_eq!(
        container.url_for_file("\\2024\\beach.jpg").unwrap(),
        "memory://store/photos/2024/beach.jpg"
    );

    let filesystem = filesystem_backend();
    let container = filesystem
        .storage
        .create_or_get_container("photos", ContainerPermission::Private, false)
        .await
        .unwrap();
    assert_eq!(
        container.url_for_file("2024/beach.jpg").unwrap(),
        "https://files.example.com/photos/2024/beach.jpg"
    );
}

#[tokio::test]
async fn test_every_listed_path_reads_back() {
    for backend in backends() {
        let name = backend.storage.backend_name().to_string();
        let container = backend
            .storage
            .create_or_get_container("readback", ContainerPermission::Private, false)
            .await
            .unwrap();

        for path in ["notes.txt", "notes.txt ", "dir /inner.txt", " lead/x.txt"] {
            container
                .write_file(&mut Cursor::new(path.as_bytes().to_vec()), path)
                .await
                .unwrap();
        }

        let top = sorted(container.list_files("", SearchOptions::DEFAULT).await.unwrap());
        assert_eq!(top, vec!["notes.txt", "notes.txt "], "backend={}", name);

        let all = sorted(
            container
                .list_files("", SearchOptions::ALL_DIRECTORIES)
                .await
                .unwrap(),
        );
        assert_eq!(
            all,
            vec![" lead/x.txt", "dir /inner.txt", "notes.txt", "notes.txt "],
            "backend={}",
            name
        );
        for path in &all {
            assert_eq!(
                read_all(&container, path).await,
                path.as_bytes().to_vec(),
                "backend={}, path={:?}",
                name,
                path
            );
        }
    }
}

#[tokio::test]
async fn test_control_characters_are_preconditions() {
    for backend in backends() {
        let container = backend
            .storage
            .create_or_get_container("controls", ContainerPermission::Private, false)
            .await
            .unwrap();

        for path in ["line\nbreak.txt", "tab\there.txt", "bell\u{7}.txt"] {
            let error = container
                .write_file(&mut Cursor::new(b"x".to_vec()), path)
                .await
                .unwrap_err();
            assert!(error.is_precondition(), "path={:?}", path);
            assert!(error.reason().is_none());
        }
        assert!(
            container
                .list_files("", SearchOptions::ALL_DIRECTORIES)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
