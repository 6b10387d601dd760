//! Shared dependencies of the repositories.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use procura_core::notification::{Notification, Notifier, NotifyError};
use procura_shared::ProcurementConfig;

/// Connection, notifier and settings handed to every repository.
#[derive(Clone)]
pub struct EngineContext {
    /// Database connection pool.
    pub db: DatabaseConnection,
    /// Outbound notification sink.
    pub notifier: Arc<dyn Notifier>,
    /// Procurement policy settings.
    pub settings: Arc<ProcurementConfig>,
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl EngineContext {
    /// Creates a context.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        notifier: Arc<dyn Notifier>,
        settings: ProcurementConfig,
    ) -> Self {
        Self {
            db,
            notifier,
            settings: Arc::new(settings),
        }
    }

    /// Sends notifications after a commit. Failures are logged, never returned.
    pub async fn dispatch(&self, outbox: Vec<Notification>) {
        for notification in outbox {
            let recipient = notification.recipient_id;
            let kind = notification.kind;
            if let Err(err) = self.notifier.notify(notification).await {
                tracing::warn!(
                    recipient_id = %recipient,
                    kind = %kind,
                    error = %err,
                    "notification delivery failed"
                );
            }
        }
    }
}

/// Notifier that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::info!(
            recipient_id = %notification.recipient_id,
            kind = %notification.kind,
            title = %notification.title,
            "notification"
        );
        Ok(())
    }
}
