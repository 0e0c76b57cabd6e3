//! External data source seam.
//!
//! Each view talks to its backing collection through [`DataSource`]: an
//! ordered fetch, a create, and a bulk import. The core treats all three as
//! opaque remote calls resolving to a success payload or a typed failure;
//! retry policy belongs to the calling view, never to the engine.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpDataSource;

#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// A required field is missing; raised before the remote call is made.
    #[error("required field missing: {field}")]
    Validation { field: String },
    /// Network or server failure. Carries the server-provided message when
    /// one exists, otherwise a generic fallback.
    #[error("{message}")]
    Transport { message: String },
    /// The import call succeeded at the transport level but processed zero
    /// rows; treated as a user-visible failure.
    #[error("import completed without processing any rows")]
    ImportEmpty,
}

/// Outcome of a successful import call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacts_created: Option<u64>,
}

impl ImportReport {
    /// One-line summary rendered in the success notification.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Processed: {} | Created: {} | Updated: {}",
            self.processed, self.created, self.updated
        );
        if let Some(contacts) = self.contacts_created {
            summary.push_str(&format!(" | Contacts: {contacts}"));
        }
        summary
    }
}

/// File payload handed to an import call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPayload {
    pub file_name: String,
    pub data: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Update rows matching an existing identifier instead of skipping them.
    pub update_existing: bool,
}

/// Remote collection backing one view.
#[async_trait]
pub trait DataSource<R>: Send + Sync {
    /// Fetch the full ordered row set.
    async fn fetch(&self) -> Result<Vec<R>, SourceError>;

    /// Create one row, returning the server's version of it.
    async fn create(&self, row: R) -> Result<R, SourceError>;

    /// Bulk-import rows from an uploaded file.
    async fn import(
        &self,
        payload: ImportPayload,
        options: ImportOptions,
    ) -> Result<ImportReport, SourceError>;
}
