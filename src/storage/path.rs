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

//! Path normalization shared by every backend.
//!
//! Callers may pass `\` or `/` separated paths, with or without a leading
//! separator. Backends only ever see the canonical form:
//!
//! - segments are joined with `/`, empty and `.` segments are dropped
//! - whitespace inside a segment is part of the name and kept as is
//! - no leading `/`
//! - directories end with exactly one `/`, except the root which is `""`

use url::Url;

use super::error::{StorageError, StorageResult};

pub const SEPARATOR: char = '/';

/// Whether a path names a directory or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Directory,
    File,
}

/// Convert a caller supplied path into its canonical form.
///
/// The transform is idempotent: `normalize(normalize(p, k), k) == normalize(p, k)`.
pub fn normalize(path: &str, kind: PathKind) -> String {
    let replaced = path.replace('\\', "/");
    let mut normalized = replaced
        .split(SEPARATOR)
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");

    if kind == PathKind::Directory && !normalized.is_empty() {
        normalized.push(SEPARATOR);
    }
    normalized
}

/// Canonical form of a directory path (`""` for the root).
pub fn normalize_directory(path: &str) -> String {
    normalize(path, PathKind::Directory)
}

/// Canonical form of a file path.
pub fn normalize_file(path: &str) -> String {
    normalize(path, PathKind::File)
}

/// Reject paths that could resolve outside the container root.
pub(crate) fn ensure_within_root(argument: &'static str, path: &str) -> StorageResult<()> {
    if path.chars().any(char::is_control) {
        return Err(StorageError::invalid_argument(
            argument,
            format!("contains a control character: {:?}", path),
        ));
    }
    if path
        .split(['/', '\\'])
        .any(|segment| segment.trim() == "..")
    {
        return Err(StorageError::invalid_argument(
            argument,
            format!("contains path traversal sequence '..': {}", path),
        ));
    }
    Ok(())
}

/// The last segment of a path, ignoring trailing separators.
pub fn last_segment(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    }
}

/// `full` with the leading `root` (and the separator after it) removed.
///
/// Returns `full` unchanged when it does not live under `root`.
pub fn strip_root<'a>(full: &'a str, root: &str) -> &'a str {
    match full.strip_prefix(root) {
        Some(rest) => rest.trim_start_matches(['/', '\\']),
        None => full,
    }
}

/// Append `segments` to `base` as percent-encoded path segments.
pub fn join_url<'a>(
    base: &str,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
        path.pop_if_empty();
        for segment in segments {
            if !segment.is_empty() {
                path.push(segment);
            }
        }
    }
    Ok(url.to_string())
}
