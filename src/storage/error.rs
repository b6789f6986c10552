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

use std::error::Error as StdError;
use thiserror::Error;

/// Boxed backend failure carried as the cause of [`StorageError::OperationFailed`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The operational failure reasons a caller can observe.
///
/// Precondition violations ([`StorageError::InvalidArgument`], [`StorageError::Unsupported`])
/// and configuration problems are deliberately not part of this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorReason {
    ContainerNotFound,
    ContainerExistAlready,
    StorageOperationFailed,
}

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Container '{0}' does not exist")]
    ContainerNotFound(String),

    #[error("Container '{0}' exists already")]
    ContainerExistAlready(String),

    /// Any backend failure. The original backend error is kept as `source`.
    #[error("{message}")]
    OperationFailed {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Wrap a backend failure, embedding the operation and the path in the message.
    pub fn operation_failed(operation: &str, path: &str, source: impl Into<BoxError>) -> Self {
        StorageError::OperationFailed {
            message: format!("Unable to {}. path={}", operation, path),
            source: source.into(),
        }
    }

    pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        StorageError::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// The operational reason of this error, or `None` for precondition and configuration errors.
    pub fn reason(&self) -> Option<StorageErrorReason> {
        match self {
            StorageError::ContainerNotFound(_) => Some(StorageErrorReason::ContainerNotFound),
            StorageError::ContainerExistAlready(_) => {
                Some(StorageErrorReason::ContainerExistAlready)
            }
            StorageError::OperationFailed { .. } => Some(StorageErrorReason::StorageOperationFailed),
            StorageError::InvalidArgument { .. }
            | StorageError::Unsupported(_)
            | StorageError::ConfigError(_) => None,
        }
    }

    /// `true` for programming errors detected before any backend call was made.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            StorageError::InvalidArgument { .. } | StorageError::Unsupported(_)
        )
    }
}

/// Classifies raw backend results into [`StorageError::OperationFailed`].
pub(crate) trait ResultExt<T> {
    fn or_operation_failed(self, operation: &str, path: &str) -> StorageResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<BoxError>,
{
    fn or_operation_failed(self, operation: &str, path: &str) -> StorageResult<T> {
        self.map_err(|e| StorageError::operation_failed(operation, path, e))
    }
}

/// Reject an empty required argument.
pub(crate) fn ensure_not_empty(argument: &'static str, value: &str) -> StorageResult<()> {
    if value.trim().is_empty() {
        return Err(StorageError::invalid_argument(argument, "must not be empty"));
    }
    Ok(())
}
