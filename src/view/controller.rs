use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::bus::CommandKey;
use crate::channel::Severity;
use crate::notify::Notification;
use crate::source::{DataSource, ImportOptions, ImportPayload, ImportReport, SourceError};

use super::engine::ListViewEngine;
use super::record::Record;
use super::state::SortSpec;

/// A secondary surface the UI shell opens in response to a command.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceRequest {
    /// Record-creation form.
    Create,
    /// Sort configuration, seeded with the current spec.
    SortConfig { current: Option<SortSpec> },
    /// Column visibility management, seeded with the current map.
    ManageColumns { current: BTreeMap<String, bool> },
    ChartStats,
    Filter,
}

/// Binds one view's engine to its data source and the notification queue.
///
/// Expected failures (validation, transport, empty import) resolve to results
/// and notifications rather than propagating; the engine's state is never
/// partially mutated by a failed call.
pub struct ViewController<R: Record> {
    engine: ListViewEngine<R>,
    source: Arc<dyn DataSource<R>>,
    surfaces: mpsc::UnboundedSender<SurfaceRequest>,
    notifications: mpsc::UnboundedSender<Notification>,
    required_fields: Vec<String>,
}

impl<R: Record> ViewController<R> {
    pub fn new(
        engine: ListViewEngine<R>,
        source: Arc<dyn DataSource<R>>,
        surfaces: mpsc::UnboundedSender<SurfaceRequest>,
        notifications: mpsc::UnboundedSender<Notification>,
    ) -> Self {
        Self {
            engine,
            source,
            surfaces,
            notifications,
            required_fields: Vec::new(),
        }
    }

    /// Fields checked before create/import calls leave the client.
    pub fn with_required_fields(mut self, fields: Vec<String>) -> Self {
        self.required_fields = fields;
        self
    }

    pub fn engine(&self) -> &ListViewEngine<R> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ListViewEngine<R> {
        &mut self.engine
    }

    /// React to a toolbar command routed through the bus.
    pub async fn handle_command(&mut self, key: &CommandKey) {
        match key {
            CommandKey::Refresh => self.refresh().await,
            CommandKey::AddNew => self.open(SurfaceRequest::Create),
            CommandKey::Sort => self.open(SurfaceRequest::SortConfig {
                current: self.engine.state().sort.clone(),
            }),
            CommandKey::ManageColumns => self.open(SurfaceRequest::ManageColumns {
                current: self.engine.state().column_visibility.clone(),
            }),
            CommandKey::ChartStats => self.open(SurfaceRequest::ChartStats),
            CommandKey::Filter => self.open(SurfaceRequest::Filter),
            CommandKey::Custom(label) => {
                tracing::debug!(
                    "view '{}' ignoring unrecognized command '{label}'",
                    self.engine.view_key()
                );
            }
        }
    }

    /// Refetch rows and re-initialize them at page 1, preserving search, sort,
    /// and column visibility. On failure the view state is left unchanged and
    /// the error becomes a dismissible notification.
    pub async fn refresh(&mut self) {
        match self.source.fetch().await {
            Ok(rows) => {
                tracing::debug!(
                    "view '{}' refreshed with {} rows",
                    self.engine.view_key(),
                    rows.len()
                );
                self.engine.replace_rows(rows);
            }
            Err(e) => {
                tracing::warn!("refresh failed for view '{}': {e}", self.engine.view_key());
                self.notify(Severity::Error, e.to_string());
            }
        }
    }

    /// Create one record. Required-field validation happens synchronously
    /// before the remote call; transport failures are also surfaced as an
    /// error notification.
    pub async fn create(&mut self, row: R) -> Result<R, SourceError> {
        for field in &self.required_fields {
            if row.field(field).as_text().trim().is_empty() {
                return Err(SourceError::Validation {
                    field: field.clone(),
                });
            }
        }

        match self.source.create(row).await {
            Ok(created) => Ok(created),
            Err(e) => {
                self.notify(Severity::Error, e.to_string());
                Err(e)
            }
        }
    }

    /// Bulk-import rows. A report with zero processed rows is a user-visible
    /// failure even though the call itself succeeded.
    pub async fn import(
        &mut self,
        payload: ImportPayload,
        options: ImportOptions,
    ) -> Result<ImportReport, SourceError> {
        match self.source.import(payload, options).await {
            Ok(report) if report.processed == 0 => {
                let e = SourceError::ImportEmpty;
                self.notify(Severity::Error, e.to_string());
                Err(e)
            }
            Ok(report) => {
                self.notify(Severity::Success, report.summary());
                Ok(report)
            }
            Err(e) => {
                self.notify(Severity::Error, e.to_string());
                Err(e)
            }
        }
    }

    fn open(&self, request: SurfaceRequest) {
        if self.surfaces.send(request).is_err() {
            tracing::warn!(
                "surface request dropped: view '{}' has no shell attached",
                self.engine.view_key()
            );
        }
    }

    fn notify(&self, severity: Severity, message: impl Into<String>) {
        let _ = self.notifications.send(Notification::new(severity, message));
    }
}
