//! Single-record editor for the page-content singletons.
//!
//! The record is edited one section at a time. Field edits only touch the
//! draft; saving sends exactly the section's fields and then re-fetches.

use crate::errors::{AppError, AppResult};
use crate::models::{Patch, Sectioned};
use crate::notify::Notifier;
use crate::store::Collection;

use super::EditingTarget;

/// Where a section editor is in its save cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    Viewing,
    Editing(&'static str),
    Saving(&'static str),
}

pub struct RecordEditor<R: Sectioned> {
    records: Collection<R>,
    notifier: Notifier,
    banner: Notifier,
    record: Option<R>,
    draft: Option<R>,
    editing: EditingTarget<&'static str>,
    loading: bool,
    saving: bool,
}

impl<R: Sectioned> RecordEditor<R> {
    pub fn new(records: Collection<R>, notifier: Notifier) -> Self {
        Self {
            records,
            notifier,
            banner: Notifier::new(),
            record: None,
            draft: None,
            editing: EditingTarget::None,
            loading: false,
            saving: false,
        }
    }

    /// Fetch the record, inserting the type's default row when the
    /// collection is empty.
    pub async fn load(&mut self) -> AppResult<()> {
        self.loading = true;
        let result = self.fetch().await;
        self.loading = false;

        match result {
            Ok(record) => {
                self.record = record;
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    async fn fetch(&self) -> AppResult<Option<R>> {
        if let Some(record) = self.records.fetch_one(&self.records.query()).await? {
            return Ok(Some(record));
        }
        match R::default_row() {
            Some(row) => {
                tracing::info!("Creating default {} row", R::COLLECTION);
                self.records.insert(&row).await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Start editing `section`. Any other section's draft is discarded.
    pub fn begin_edit(&mut self, section: &str) -> AppResult<()> {
        let section = R::section(section)
            .ok_or_else(|| AppError::Validation(format!("Unknown section: {}", section)))?;
        let record = self
            .record
            .as_ref()
            .ok_or_else(|| AppError::NotFound(format!("No {} record loaded", R::COLLECTION)))?;

        self.draft = Some(record.clone());
        self.editing = EditingTarget::Section(section.key);
        Ok(())
    }

    /// Mutable draft while a section is being edited.
    pub fn draft_mut(&mut self) -> Option<&mut R> {
        if self.editing.is_editing() && !self.saving {
            self.draft.as_mut()
        } else {
            None
        }
    }

    pub fn draft(&self) -> Option<&R> {
        self.draft.as_ref()
    }

    /// The last fetched record.
    pub fn record(&self) -> Option<&R> {
        self.record.as_ref()
    }

    /// What the screen shows: the draft while editing, else the record.
    pub fn displayed(&self) -> Option<&R> {
        self.draft.as_ref().or(self.record.as_ref())
    }

    /// Send the edited section. On failure the panel stays in editing mode
    /// with the draft intact.
    pub async fn save(&mut self) -> AppResult<()> {
        let EditingTarget::Section(key) = self.editing else {
            return Err(AppError::Validation("No section is being edited".to_string()));
        };
        let section = R::section(key)
            .ok_or_else(|| AppError::Validation(format!("Unknown section: {}", key)))?;
        let Some(draft) = self.draft.as_ref() else {
            return Err(AppError::Validation("No section is being edited".to_string()));
        };

        let id = draft.id().to_string();
        let patch = Patch::from_fields(draft, section.fields)?;

        self.saving = true;
        let result = self.records.update(&id, patch).await;
        self.saving = false;

        match result {
            Ok(_) => {
                self.editing = EditingTarget::None;
                self.draft = None;
                self.notifier
                    .show_success(format!("{} updated successfully", section.label));
                // The write landed; a failed reload only shows in the banner.
                let _ = self.load().await;
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// Discard the draft and re-fetch.
    pub async fn cancel(&mut self) -> AppResult<()> {
        self.editing = EditingTarget::None;
        self.draft = None;
        self.load().await
    }

    pub fn editing(&self) -> &EditingTarget<&'static str> {
        &self.editing
    }

    pub fn phase(&self) -> EditorPhase {
        match self.editing {
            EditingTarget::Section(key) if self.saving => EditorPhase::Saving(key),
            EditingTarget::Section(key) => EditorPhase::Editing(key),
            EditingTarget::None => EditorPhase::Viewing,
        }
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Message in the panel's error banner.
    pub fn error(&self) -> Option<String> {
        self.banner.current().map(|n| n.message)
    }

    pub fn dismiss_error(&self) {
        self.banner.dismiss();
    }

    fn report(&self, error: AppError) -> AppError {
        self.banner.show_error(error.message());
        error
    }
}
