use std::sync::Arc;
use std::time::Duration;

use bson::DateTime;
use tracing::{debug, error, info};

use super::NotificationStore;
use super::dispatch::DispatchEngine;
use crate::dao::base::DaoResult;

/// Periodic pass over due notifications. Items are isolated: one bad
/// row never stops the rest of the batch.
pub struct Sweeper {
    store: Arc<dyn NotificationStore>,
    engine: Arc<DispatchEngine>,
}

impl Sweeper {
    pub fn new(store: Arc<dyn NotificationStore>, engine: Arc<DispatchEngine>) -> Self {
        Self { store, engine }
    }

    /// One pass. Returns how many due notifications were considered,
    /// not how many went out; callers wanting delivery figures inspect
    /// the persisted status.
    pub async fn sweep_once(&self) -> DaoResult<usize> {
        let due = self.store.find_due(DateTime::now()).await?;

        for item in &due {
            if let Err(error) = self.engine.dispatch_due(item).await {
                let id = item
                    .notification
                    .id
                    .map(|id| id.to_hex())
                    .unwrap_or_default();
                error!(notification_id = %id, %error, "Sweep item failed");
            }
        }

        Ok(due.len())
    }

    /// Runs `sweep_once` on a fixed interval until the handle is
    /// aborted. The first tick fires immediately.
    pub fn spawn(self: Arc<Self>, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        let secs = interval_secs.max(1);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(secs));
            loop {
                interval.tick().await;
                match self.sweep_once().await {
                    Ok(0) => debug!("Sweep pass: nothing due"),
                    Ok(count) => info!(count, "Sweep pass considered due notifications"),
                    Err(error) => error!(%error, "Sweep pass failed"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testkit::{
        MemoryBackend, StubEmail, StubSms, pending_notification, recipient,
    };
    use bson::oid::ObjectId;
    use traino_config::NotifierSettings;
    use traino_db::models::{ChannelSet, NotificationStatus};

    fn sweeper(backend: &Arc<MemoryBackend>) -> Sweeper {
        let settings = NotifierSettings {
            base_url: "https://app.traino.io".to_string(),
            brand: "Traino".to_string(),
            sweep_interval_secs: 60,
        };
        let engine = Arc::new(DispatchEngine::new(
            backend.clone(),
            backend.clone(),
            Arc::new(StubEmail::ok()),
            Arc::new(StubSms::unconfigured()),
            &settings,
        ));
        Sweeper::new(backend.clone(), engine)
    }

    #[tokio::test]
    async fn empty_store_sweeps_nothing() {
        let backend = Arc::new(MemoryBackend::new());
        assert_eq!(sweeper(&backend).sweep_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn dispatches_every_due_notification_and_returns_the_fetched_count() {
        let backend = Arc::new(MemoryBackend::new());
        let rid = backend.add_recipient(recipient("jane@example.com", None));
        let a = backend.add_notification(pending_notification(
            rid,
            ChannelSet::with_enabled(true, false, true),
        ));
        let b = backend.add_notification(pending_notification(
            rid,
            ChannelSet::with_enabled(false, false, true),
        ));
        let mut future = pending_notification(rid, ChannelSet::with_enabled(true, false, true));
        future.scheduled_for =
            DateTime::from_millis(DateTime::now().timestamp_millis() + 3_600_000);
        let c = backend.add_notification(future);

        let considered = sweeper(&backend).sweep_once().await.unwrap();

        assert_eq!(considered, 2);
        assert_eq!(backend.notification(a).status, NotificationStatus::Sent);
        assert_eq!(backend.notification(b).status, NotificationStatus::Sent);
        assert_eq!(backend.notification(c).status, NotificationStatus::Pending);
    }

    #[tokio::test]
    async fn store_failure_on_one_item_does_not_stop_the_rest() {
        let backend = Arc::new(MemoryBackend::new());
        let rid = backend.add_recipient(recipient("jane@example.com", None));
        let now = DateTime::now();

        let mut first = pending_notification(rid, ChannelSet::with_enabled(false, false, true));
        first.scheduled_for = DateTime::from_millis(now.timestamp_millis() - 2_000);
        let failing = backend.add_notification(first);

        let mut second = pending_notification(rid, ChannelSet::with_enabled(false, false, true));
        second.scheduled_for = DateTime::from_millis(now.timestamp_millis() - 1_000);
        let ok = backend.add_notification(second);

        *backend.fail_outcome_for.lock().unwrap() = Some(failing);

        let considered = sweeper(&backend).sweep_once().await.unwrap();

        assert_eq!(considered, 2);
        assert_eq!(backend.notification(ok).status, NotificationStatus::Sent);
        assert_ne!(
            backend.notification(failing).status,
            NotificationStatus::Sent
        );
    }

    #[tokio::test]
    async fn rows_without_a_recipient_are_counted_but_not_dispatched() {
        let backend = Arc::new(MemoryBackend::new());
        let orphan = backend.add_notification(pending_notification(
            ObjectId::new(),
            ChannelSet::with_enabled(true, false, true),
        ));
        let rid = backend.add_recipient(recipient("jane@example.com", None));
        let ok = backend.add_notification(pending_notification(
            rid,
            ChannelSet::with_enabled(false, false, true),
        ));

        let considered = sweeper(&backend).sweep_once().await.unwrap();

        assert_eq!(considered, 2);
        assert_eq!(backend.notification(ok).status, NotificationStatus::Sent);
        assert_eq!(
            backend.notification(orphan).status,
            NotificationStatus::Pending
        );
    }
}
