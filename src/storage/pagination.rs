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

use thiserror::Error;
use tracing::debug;

use super::error::{BoxError, ResultExt, StorageResult};

/// Upper bound on the number of pages drained by [`collect_pages`].
pub const DEFAULT_MAX_PAGES: usize = 100_000;

/// One segment of a continuation-token listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the next segment, `None` on the last one.
    pub continuation: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, continuation: Option<String>) -> Self {
        Self {
            items,
            continuation,
        }
    }

    /// A page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

/// The backend kept returning continuation tokens past the configured bound.
#[derive(Error, Debug)]
#[error("listing did not complete after max_pages={0} pages")]
pub struct PageLimitExceeded(pub usize);

/// Drain a segmented listing into one ordered vector.
///
/// `fetch` is invoked with `None` first and then with each returned token until
/// a page comes back without one. Items keep the order the backend produced;
/// nothing is sorted or deduplicated. Backend failures are translated into
/// [`StorageError::OperationFailed`](super::error::StorageError::OperationFailed)
/// carrying `operation` and `path`.
pub async fn collect_pages<T, E, F, Fut>(
    operation: &str,
    path: &str,
    max_pages: usize,
    mut fetch: F,
) -> StorageResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
    E: Into<BoxError>,
{
    let mut items = Vec::new();
    let mut continuation: Option<String> = None;

    for page_number in 1..=max_pages {
        let page = fetch(continuation.take())
            .await
            .or_operation_failed(operation, path)?;
        items.extend(page.items);

        match page.continuation {
            Some(token) => continuation = Some(token),
            None => {
                debug!(
                    "Collected count={} items in pages={} for operation={}, path={}",
                    items.len(),
                    page_number,
                    operation,
                    path
                );
                return Ok(items);
            }
        }
    }

    Err(PageLimitExceeded(max_pages)).or_operation_failed(operation, path)
}
