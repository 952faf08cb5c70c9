//! Email batches: soft-deleted list plus sending through the campaign
//! function.

use std::sync::Arc;
use std::time::Duration;

use crate::campaign::{CampaignSender, SendCampaignRequest};
use crate::errors::{AppError, AppResult};
use crate::models::EmailBatch;
use crate::notify::Notifier;
use crate::store::Collection;

use super::RecordList;

pub struct EmailPanel {
    list: RecordList<EmailBatch>,
    sender: Arc<dyn CampaignSender>,
}

impl EmailPanel {
    pub fn new(
        records: Collection<EmailBatch>,
        notifier: Notifier,
        sender: Arc<dyn CampaignSender>,
    ) -> Self {
        Self {
            list: RecordList::new(records, notifier),
            sender,
        }
    }

    pub fn list(&self) -> &RecordList<EmailBatch> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut RecordList<EmailBatch> {
        &mut self.list
    }

    pub async fn load(&mut self) -> AppResult<()> {
        self.list.load().await
    }

    /// Queue a loaded batch for delivery. A failure message from the
    /// function goes to the banner as is.
    pub async fn send(&mut self, batch_id: &str) -> AppResult<()> {
        let batch = self.list.item(batch_id).cloned().ok_or_else(|| {
            self.list.report(AppError::NotFound(format!(
                "Email batch {} not loaded",
                batch_id
            )))
        })?;

        if batch.template_id.trim().is_empty() {
            return Err(self
                .list
                .report(AppError::Validation("Template is required".to_string())));
        }

        let request = SendCampaignRequest {
            batch_id: batch.id.clone(),
            template_id: batch.template_id.clone(),
        };
        if let Err(e) = self.sender.send(&request).await {
            return Err(self.list.report(e));
        }

        self.list
            .notifier()
            .show_success(format!("Batch \"{}\" queued for sending", batch.name));
        self.refresh_batch(batch_id).await.map(|_| ())
    }

    /// Re-read one batch for its delivery status.
    pub async fn refresh_batch(&mut self, batch_id: &str) -> AppResult<EmailBatch> {
        match self.list.records().fetch_by_id(batch_id).await {
            Ok(Some(batch)) => {
                self.list.replace_item(batch.clone());
                Ok(batch)
            }
            Ok(None) => Err(self.list.report(AppError::NotFound(format!(
                "Email batch {} not found",
                batch_id
            )))),
            Err(e) => Err(self.list.report(e)),
        }
    }

    /// Poll until the batch reaches a terminal status or `attempts` run out.
    /// Returns the last state seen either way.
    pub async fn wait_for_delivery(
        &mut self,
        batch_id: &str,
        interval: Duration,
        attempts: u32,
    ) -> AppResult<EmailBatch> {
        let mut batch = self.refresh_batch(batch_id).await?;
        for _ in 1..attempts {
            if batch.status.is_terminal() {
                break;
            }
            tokio::time::sleep(interval).await;
            batch = self.refresh_batch(batch_id).await?;
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_database, Repository};
    use crate::models::{BatchStatus, NewEmailBatch, Patch};
    use crate::store::SharedStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Marks the batch sent in the store, or fails with a fixed message.
    struct FakeSender {
        records: Collection<EmailBatch>,
        failure: Option<String>,
        sent: Mutex<Vec<SendCampaignRequest>>,
    }

    #[async_trait]
    impl CampaignSender for FakeSender {
        async fn send(&self, request: &SendCampaignRequest) -> AppResult<()> {
            self.sent.lock().unwrap().push(request.clone());
            if let Some(message) = &self.failure {
                return Err(AppError::Store {
                    status: 400,
                    message: message.clone(),
                });
            }
            self.records
                .update(&request.batch_id, Patch::new().set("status", json!("sent")))
                .await
                .map(|_| ())
        }
    }

    async fn panel(failure: Option<&str>) -> (EmailPanel, Arc<FakeSender>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        let store: SharedStore = Arc::new(Repository::new(pool));
        let records = Collection::<EmailBatch>::new(store);

        records
            .insert(&NewEmailBatch {
                name: "Spring newsletter".to_string(),
                template_id: "tmpl-1".to_string(),
                recipients: vec!["a@example.com".to_string()],
                ..Default::default()
            })
            .await
            .unwrap();

        let sender = Arc::new(FakeSender {
            records: records.clone(),
            failure: failure.map(|f| f.to_string()),
            sent: Mutex::new(Vec::new()),
        });
        let mut panel = EmailPanel::new(records, Notifier::new(), sender.clone());
        panel.load().await.unwrap();
        (panel, sender, temp_dir)
    }

    #[tokio::test]
    async fn test_send_queues_and_refreshes_status() {
        let (mut panel, sender, _dir) = panel(None).await;
        let id = panel.list().items()[0].id.clone();

        panel.send(&id).await.unwrap();

        let sent = sender.sent.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![SendCampaignRequest {
                batch_id: id.clone(),
                template_id: "tmpl-1".to_string()
            }]
        );
        assert_eq!(panel.list().item(&id).unwrap().status, BatchStatus::Sent);

        let batch = panel
            .wait_for_delivery(&id, Duration::from_millis(5), 3)
            .await
            .unwrap();
        assert!(batch.status.is_terminal());
    }

    #[tokio::test]
    async fn test_send_failure_is_shown_verbatim() {
        let (mut panel, _sender, _dir) = panel(Some("Template tmpl-1 does not exist")).await;
        let id = panel.list().items()[0].id.clone();

        assert!(panel.send(&id).await.is_err());
        assert_eq!(
            panel.list().error().as_deref(),
            Some("Template tmpl-1 does not exist")
        );
        assert_eq!(panel.list().item(&id).unwrap().status, BatchStatus::Draft);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_but_keeps_row() {
        let (mut panel, _sender, _dir) = panel(None).await;
        let id = panel.list().items()[0].id.clone();

        panel.list_mut().request_delete(&id);
        panel.list_mut().confirm_delete().await.unwrap();
        assert!(panel.list().items().is_empty());

        let kept = panel.list().records().fetch_by_id(&id).await.unwrap().unwrap();
        assert!(kept.is_deleted);
    }
}
