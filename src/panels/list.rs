//! Listed record panel: add, edit, delete and reorder rows of a collection,
//! optionally with server-side pagination, equality filters and debounced
//! search.

use std::time::Duration;

use serde_json::Value;

use crate::errors::{AppError, AppResult};
use crate::models::{NewRecord, Patch, Record};
use crate::notify::Notifier;
use crate::store::{Collection, Page, Query};

use super::{Debouncer, EditingTarget};

/// Page sizes offered by paginated panels.
pub const PAGE_SIZES: [u64; 3] = [10, 20, 50];

/// One-based page position over `total` matching rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
}

impl Pagination {
    pub fn new(page_size: u64) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    /// `max(1, ceil(total / page_size))`
    pub fn page_count(&self) -> u64 {
        self.total.div_ceil(self.page_size).max(1)
    }

    /// Pull `page` back into `[1, page_count]`. Returns whether it moved.
    pub fn clamp(&mut self) -> bool {
        let clamped = self.page.clamp(1, self.page_count());
        let moved = clamped != self.page;
        self.page = clamped;
        moved
    }

    /// Inclusive zero-based row range of the current page.
    pub fn range(&self) -> (u64, u64) {
        let start = self.page.saturating_sub(1).saturating_mul(self.page_size);
        (start, start.saturating_add(self.page_size.saturating_sub(1)))
    }
}

pub struct RecordList<R: Record> {
    records: Collection<R>,
    notifier: Notifier,
    banner: Notifier,
    items: Vec<R>,
    form: R::New,
    editing: EditingTarget<String>,
    draft: Option<R>,
    pending_delete: Option<String>,
    filters: Vec<(String, Value)>,
    search: Option<Debouncer<String>>,
    applied_search: String,
    pagination: Option<Pagination>,
    loading: bool,
}

impl<R: Record> RecordList<R> {
    pub fn new(records: Collection<R>, notifier: Notifier) -> Self {
        Self {
            records,
            notifier,
            banner: Notifier::new(),
            items: Vec::new(),
            form: Default::default(),
            editing: EditingTarget::None,
            draft: None,
            pending_delete: None,
            filters: Vec::new(),
            search: None,
            applied_search: String::new(),
            pagination: None,
            loading: false,
        }
    }

    /// Fetch one page at a time, starting at page 1 with the smallest size.
    pub fn paginated(mut self) -> Self {
        self.pagination = Some(Pagination::new(PAGE_SIZES[0]));
        self
    }

    /// Enable free-text search over the record type's search fields.
    pub fn searchable(mut self, delay: Duration) -> Self {
        self.search = Some(Debouncer::new(String::new(), delay));
        self
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn records(&self) -> &Collection<R> {
        &self.records
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// The query the next load will run.
    pub fn query(&self) -> Query {
        let mut query = self.records.query();
        for (column, value) in &self.filters {
            query = query.eq(column, value.clone());
        }
        query = query.search(&self.applied_search, R::SEARCH_FIELDS);
        if let Some(pagination) = &self.pagination {
            let (start, end) = pagination.range();
            query = query.range(start, end).with_count();
        }
        query
    }

    /// Fetch the current page. When the total shrank under the current page
    /// the page is clamped and fetched again.
    pub async fn load(&mut self) -> AppResult<()> {
        self.loading = true;
        let result = self.fetch().await;
        self.loading = false;
        result.map_err(|e| self.report(e))
    }

    async fn fetch(&mut self) -> AppResult<()> {
        let mut page = self.records.fetch_many(&self.query()).await?;
        if self.apply_total(&page) {
            page = self.records.fetch_many(&self.query()).await?;
            self.apply_total(&page);
        }
        self.items = page.rows;
        Ok(())
    }

    /// Record the new total and clamp the page. Returns whether the page
    /// moved and the rows fetched are for the wrong page.
    fn apply_total(&mut self, page: &Page<R>) -> bool {
        let Some(pagination) = self.pagination.as_mut() else {
            return false;
        };
        pagination.total = page.total.unwrap_or(page.rows.len() as u64);
        let moved = pagination.clamp();
        if moved {
            tracing::debug!(
                "{} page clamped to {}, refetching",
                R::COLLECTION,
                pagination.page
            );
        }
        moved
    }

    /// Set or clear an equality filter. Filtering starts again at page 1.
    pub async fn set_filter(&mut self, column: &str, value: Option<Value>) -> AppResult<()> {
        self.filters.retain(|(c, _)| c != column);
        if let Some(value) = value {
            self.filters.push((column.to_string(), value));
        }
        self.reset_page();
        self.load().await
    }

    pub fn filter(&self, column: &str) -> Option<&Value> {
        self.filters
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, value)| value)
    }

    pub async fn set_page(&mut self, page: u64) -> AppResult<()> {
        let Some(pagination) = self.pagination.as_mut() else {
            return Err(AppError::Validation("This list is not paginated".to_string()));
        };
        pagination.page = page;
        pagination.clamp();
        self.load().await
    }

    pub async fn set_page_size(&mut self, page_size: u64) -> AppResult<()> {
        if !PAGE_SIZES.contains(&page_size) {
            return Err(self.report(AppError::Validation(format!(
                "Page size must be one of {:?}",
                PAGE_SIZES
            ))));
        }
        let Some(pagination) = self.pagination.as_mut() else {
            return Err(AppError::Validation("This list is not paginated".to_string()));
        };
        pagination.page_size = page_size;
        pagination.clamp();
        self.load().await
    }

    /// Record a keystroke in the search box. Nothing is queried until the
    /// input settles.
    pub fn type_search(&mut self, text: &str) {
        if let Some(search) = self.search.as_mut() {
            search.set(text.to_string());
        }
    }

    /// What the search box shows.
    pub fn search_text(&self) -> &str {
        self.search.as_ref().map(|s| s.typed().as_str()).unwrap_or("")
    }

    /// Wait for the search input to settle, then query once if the settled
    /// term differs from the one last applied. A new term starts at page 1.
    pub async fn settle_search(&mut self) -> AppResult<()> {
        let Some(search) = self.search.as_mut() else {
            return Ok(());
        };
        let term = search.settled().await;
        if term == self.applied_search {
            return Ok(());
        }
        self.applied_search = term;
        self.reset_page();
        self.load().await
    }

    pub fn form(&self) -> &R::New {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut R::New {
        &mut self.form
    }

    /// `max(order_index) + 1` over the loaded items, or 1 when empty.
    pub fn next_order_index(&self) -> i64 {
        self.items
            .iter()
            .filter_map(|item| item.order_index())
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Validate and insert the form, then reset it and reload.
    pub async fn submit(&mut self) -> AppResult<R> {
        if let Err(e) = self.form.validate() {
            return Err(self.report(e));
        }

        let mut attributes = self.form.clone();
        attributes.set_order_index(self.next_order_index());

        let created = match self.records.insert(&attributes).await {
            Ok(created) => created,
            Err(e) => return Err(self.report(e)),
        };

        self.form = Default::default();
        self.notifier.show_success("Added successfully");
        // The row exists; a failed reload only shows in the banner.
        let _ = self.load().await;
        Ok(created)
    }

    pub fn begin_edit(&mut self, id: &str) -> AppResult<()> {
        let item = self
            .item(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("{} record {} not loaded", R::COLLECTION, id)))?;
        self.draft = Some(item);
        self.editing = EditingTarget::Section(id.to_string());
        Ok(())
    }

    pub fn editing(&self) -> &EditingTarget<String> {
        &self.editing
    }

    pub fn draft(&self) -> Option<&R> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut R> {
        self.draft.as_mut()
    }

    /// Send the edited item; on failure the draft is kept for another try.
    pub async fn save_edit(&mut self) -> AppResult<R> {
        let (EditingTarget::Section(id), Some(draft)) = (&self.editing, &self.draft) else {
            return Err(AppError::Validation("No item is being edited".to_string()));
        };
        let id = id.clone();
        let patch = match self.item(&id) {
            Some(original) => Patch::from_edit(original, draft),
            None => Patch::from_edit(draft, draft),
        };
        let patch = match patch {
            Ok(patch) => patch,
            Err(e) => return Err(self.report(e)),
        };

        match self.records.update(&id, patch).await {
            Ok(updated) => {
                self.editing = EditingTarget::None;
                self.draft = None;
                self.notifier.show_success("Updated successfully");
                let _ = self.load().await;
                Ok(updated)
            }
            Err(e) => Err(self.report(e)),
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = EditingTarget::None;
        self.draft = None;
    }

    /// First step of a delete; nothing is removed until confirmed.
    pub fn request_delete(&mut self, id: &str) {
        self.pending_delete = Some(id.to_string());
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Remove the pending item, drop it locally, then reload.
    pub async fn confirm_delete(&mut self) -> AppResult<()> {
        let Some(id) = self.pending_delete.take() else {
            return Err(AppError::Validation("No deletion is pending".to_string()));
        };

        if let Err(e) = self.records.remove(&id).await {
            return Err(self.report(e));
        }

        self.items.retain(|item| item.id() != id);
        if self.editing.key() == Some(&id) {
            self.cancel_edit();
        }
        self.notifier.show_success("Deleted successfully");
        let _ = self.load().await;
        Ok(())
    }

    /// Update some attributes of one item and reflect the result locally.
    pub async fn patch_item(&mut self, id: &str, patch: Patch) -> AppResult<R> {
        match self.records.update(id, patch).await {
            Ok(updated) => {
                self.replace_item(updated.clone());
                Ok(updated)
            }
            Err(e) => Err(self.report(e)),
        }
    }

    pub(crate) fn replace_item(&mut self, record: R) {
        if let Some(slot) = self.items.iter_mut().find(|item| item.id() == record.id()) {
            *slot = record;
        }
    }

    /// Message in the panel's error banner.
    pub fn error(&self) -> Option<String> {
        self.banner.current().map(|n| n.message)
    }

    pub fn dismiss_error(&self) {
        self.banner.dismiss();
    }

    pub(crate) fn report(&self, error: AppError) -> AppError {
        self.banner.show_error(error.message());
        error
    }

    fn reset_page(&mut self) {
        if let Some(pagination) = self.pagination.as_mut() {
            pagination.page = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_database, Repository};
    use crate::models::{Faq, Job, NewFaq, NewJob, NewPressArticle, PressArticle};
    use crate::store::SharedStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn store() -> (SharedStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        (Arc::new(Repository::new(pool)), temp_dir)
    }

    #[test]
    fn test_pagination_clamp() {
        let mut pagination = Pagination {
            page: 3,
            page_size: 20,
            total: 45,
        };
        assert!(!pagination.clamp());
        assert_eq!(pagination.range(), (40, 59));

        pagination.page_size = 50;
        assert!(pagination.clamp());
        assert_eq!(pagination.page, 1);

        pagination.total = 0;
        assert_eq!(pagination.page_count(), 1);
        assert!(!pagination.clamp());
    }

    #[tokio::test]
    async fn test_submit_validates_before_any_store_call() {
        let (store, _dir) = store().await;
        let mut jobs = RecordList::new(Collection::<Job>::new(store), Notifier::new());

        jobs.form_mut().title = "Engineer".to_string();
        let err = jobs.submit().await.unwrap_err();
        assert_eq!(err, AppError::Validation("Department is required".to_string()));
        assert_eq!(jobs.error().as_deref(), Some("Department is required"));
        // Form is kept for correction.
        assert_eq!(jobs.form().title, "Engineer");

        jobs.load().await.unwrap();
        assert!(jobs.items().is_empty());
    }

    #[tokio::test]
    async fn test_submit_inserts_resets_form_and_reloads() {
        let (store, _dir) = store().await;
        let mut jobs = RecordList::new(Collection::<Job>::new(store), Notifier::new());

        *jobs.form_mut() = NewJob {
            title: "Engineer".to_string(),
            department: "R&D".to_string(),
            location: "Remote".to_string(),
            ..Default::default()
        };
        let created = jobs.submit().await.unwrap();

        assert_eq!(jobs.items().len(), 1);
        assert_eq!(jobs.items()[0].id, created.id);
        assert_eq!(jobs.form(), &NewJob::default());
        assert_eq!(jobs.notifier().current().unwrap().message, "Added successfully");
    }

    #[tokio::test]
    async fn test_order_index_appends_and_is_not_renumbered() {
        let (store, _dir) = store().await;
        let mut faqs = RecordList::new(Collection::<Faq>::new(store), Notifier::new());
        faqs.load().await.unwrap();
        assert_eq!(faqs.next_order_index(), 1);

        for question in ["First?", "Second?", "Third?"] {
            *faqs.form_mut() = NewFaq {
                question: question.to_string(),
                answer: "Yes".to_string(),
                order_index: 0,
            };
            faqs.submit().await.unwrap();
        }
        let indexes: Vec<i64> = faqs.items().iter().map(|f| f.order_index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);

        let second = faqs.items()[1].id.clone();
        faqs.request_delete(&second);
        faqs.confirm_delete().await.unwrap();

        let indexes: Vec<i64> = faqs.items().iter().map(|f| f.order_index).collect();
        assert_eq!(indexes, vec![1, 3]);
        assert_eq!(faqs.next_order_index(), 4);
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let (store, _dir) = store().await;
        let mut faqs = RecordList::new(Collection::<Faq>::new(store), Notifier::new());
        *faqs.form_mut() = NewFaq {
            question: "Q?".to_string(),
            answer: "A".to_string(),
            order_index: 0,
        };
        let created = faqs.submit().await.unwrap();

        faqs.request_delete(&created.id);
        faqs.cancel_delete();
        assert!(faqs.confirm_delete().await.is_err());
        faqs.load().await.unwrap();
        assert_eq!(faqs.items().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_save_and_cancel() {
        let (store, _dir) = store().await;
        let mut faqs = RecordList::new(Collection::<Faq>::new(store), Notifier::new());
        *faqs.form_mut() = NewFaq {
            question: "Old?".to_string(),
            answer: "A".to_string(),
            order_index: 0,
        };
        let created = faqs.submit().await.unwrap();

        faqs.begin_edit(&created.id).unwrap();
        faqs.draft_mut().unwrap().question = "Scratch?".to_string();
        faqs.cancel_edit();
        assert_eq!(faqs.items()[0].question, "Old?");

        faqs.begin_edit(&created.id).unwrap();
        faqs.draft_mut().unwrap().question = "New?".to_string();
        faqs.save_edit().await.unwrap();
        assert_eq!(faqs.items()[0].question, "New?");
        assert_eq!(faqs.items()[0].order_index, 1);
        assert_eq!(faqs.editing(), &EditingTarget::None);
    }

    #[tokio::test]
    async fn test_update_of_vanished_row_reports_not_found() {
        let (store, _dir) = store().await;
        let records = Collection::<Faq>::new(store);
        let mut faqs = RecordList::new(records.clone(), Notifier::new());
        *faqs.form_mut() = NewFaq {
            question: "Q?".to_string(),
            answer: "A".to_string(),
            order_index: 0,
        };
        let created = faqs.submit().await.unwrap();
        records.remove(&created.id).await.unwrap();

        faqs.begin_edit(&created.id).unwrap();
        let err = faqs.save_edit().await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(faqs.error().is_some());
        // Still editing so the change can be retried or cancelled.
        assert!(faqs.editing().is_editing());
    }

    #[tokio::test]
    async fn test_clearing_optional_field_is_saved() {
        let (store, _dir) = store().await;
        let records = Collection::<PressArticle>::new(store);
        let mut press = RecordList::new(records.clone(), Notifier::new());
        *press.form_mut() = NewPressArticle {
            title: "Launch".to_string(),
            source: "Wire".to_string(),
            url: "https://news.example.com/launch".to_string(),
            summary: Some("old summary".to_string()),
            published_at: Some("2024-03-01".to_string()),
        };
        let created = press.submit().await.unwrap();

        press.begin_edit(&created.id).unwrap();
        press.draft_mut().unwrap().summary = None;
        let updated = press.save_edit().await.unwrap();
        assert_eq!(updated.summary, None);
        assert_eq!(updated.published_at.as_deref(), Some("2024-03-01"));

        press.load().await.unwrap();
        assert_eq!(press.item(&created.id).unwrap().summary, None);
        let stored = records.fetch_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.summary, None);
        assert_eq!(stored.title, "Launch");
    }
}
