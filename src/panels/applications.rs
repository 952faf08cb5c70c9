//! Recruitment applications: paginated, filtered by status, searchable.

use std::time::Duration;

use serde_json::Value;

use crate::errors::AppResult;
use crate::models::{ApplicationStatus, Patch, RecruitmentApplication};
use crate::notify::Notifier;
use crate::store::Collection;

use super::RecordList;

pub struct ApplicationsPanel {
    list: RecordList<RecruitmentApplication>,
}

impl ApplicationsPanel {
    pub fn new(
        records: Collection<RecruitmentApplication>,
        notifier: Notifier,
        search_delay: Duration,
    ) -> Self {
        Self {
            list: RecordList::new(records, notifier)
                .paginated()
                .searchable(search_delay),
        }
    }

    pub fn list(&self) -> &RecordList<RecruitmentApplication> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut RecordList<RecruitmentApplication> {
        &mut self.list
    }

    pub async fn load(&mut self) -> AppResult<()> {
        self.list.load().await
    }

    /// `None` shows every status. Changing the filter returns to page 1.
    pub async fn set_status_filter(&mut self, status: Option<ApplicationStatus>) -> AppResult<()> {
        let value = status.map(|s| Value::String(s.as_str().to_string()));
        self.list.set_filter("status", value).await
    }

    pub fn status_filter(&self) -> Option<ApplicationStatus> {
        self.list
            .filter("status")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }

    /// Update only `status`; the row changes locally once the store confirms.
    pub async fn set_status(
        &mut self,
        id: &str,
        status: ApplicationStatus,
    ) -> AppResult<RecruitmentApplication> {
        let patch = Patch::new().set("status", Value::String(status.as_str().to_string()));
        let updated = self.list.patch_item(id, patch).await?;
        self.list
            .notifier()
            .show_success(format!("Status changed to {}", status));
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_database, Repository};
    use crate::models::NewRecruitmentApplication;
    use crate::store::SharedStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn panel_with(count: usize) -> (ApplicationsPanel, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        let store: SharedStore = Arc::new(Repository::new(pool));
        let records = Collection::<RecruitmentApplication>::new(store);

        for i in 0..count {
            records
                .insert(&NewRecruitmentApplication {
                    full_name: format!("Applicant {}", i),
                    email: format!("applicant{}@example.com", i),
                    position: if i % 3 == 0 { "Designer" } else { "Engineer" }.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let panel = ApplicationsPanel::new(records, Notifier::new(), Duration::from_millis(20));
        (panel, temp_dir)
    }

    #[tokio::test]
    async fn test_status_change_reflects_locally() {
        let (mut panel, _dir) = panel_with(3).await;
        panel.load().await.unwrap();
        let id = panel.list().items()[0].id.clone();

        let updated = panel.set_status(&id, ApplicationStatus::Contacted).await.unwrap();
        assert_eq!(updated.status, ApplicationStatus::Contacted);
        assert_eq!(
            panel.list().item(&id).unwrap().status,
            ApplicationStatus::Contacted
        );
        // Other fields were not touched.
        assert_eq!(updated.full_name, panel.list().item(&id).unwrap().full_name);
    }

    #[tokio::test]
    async fn test_status_filter_resets_to_first_page() {
        let (mut panel, _dir) = panel_with(25).await;
        panel.load().await.unwrap();
        panel.list_mut().set_page(3).await.unwrap();
        assert_eq!(panel.list().pagination().unwrap().page, 3);

        let id = panel.list().items()[0].id.clone();
        panel.set_status(&id, ApplicationStatus::Rejected).await.unwrap();
        panel
            .set_status_filter(Some(ApplicationStatus::Rejected))
            .await
            .unwrap();

        assert_eq!(panel.status_filter(), Some(ApplicationStatus::Rejected));
        let pagination = panel.list().pagination().unwrap();
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.total, 1);
        assert_eq!(panel.list().items()[0].id, id);
    }

    #[tokio::test]
    async fn test_search_settles_to_first_page() {
        let (mut panel, _dir) = panel_with(30).await;
        panel.load().await.unwrap();
        panel.list_mut().set_page(2).await.unwrap();

        panel.list_mut().type_search("designer");
        assert_eq!(panel.list().search_text(), "designer");
        panel.list_mut().settle_search().await.unwrap();

        let pagination = panel.list().pagination().unwrap();
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.total, 10);
        assert!(panel
            .list()
            .items()
            .iter()
            .all(|a| a.position == "Designer"));
    }
}
