//! Application-level context shared by the admin views.
//!
//! Owns the store handle, the session storage and the notifier, and hands
//! panels what they need. `init` restores a persisted session, `teardown`
//! signs out and clears pending notifications.

use std::sync::Arc;
use std::time::Duration;

use crate::campaign::{CampaignSender, HttpCampaignSender};
use crate::config::Config;
use crate::errors::AppResult;
use crate::models::{AdminUser, EmailBatch, Record, RecruitmentApplication, Sectioned};
use crate::notify::Notifier;
use crate::panels::{ApplicationsPanel, EmailPanel, RecordEditor, RecordList};
use crate::session::{
    inspect, now_ms, sign_in, sign_out, FileStorage, Session, SessionGuard, SessionStorage,
};
use crate::store::{Collection, RestStore, SharedStore};

pub struct AdminContext {
    store: SharedStore,
    storage: Arc<dyn SessionStorage>,
    campaigns: Arc<dyn CampaignSender>,
    notifier: Notifier,
    session: Option<Session>,
    session_ttl: Duration,
    search_debounce: Duration,
}

impl AdminContext {
    pub fn new(
        store: SharedStore,
        storage: Arc<dyn SessionStorage>,
        campaigns: Arc<dyn CampaignSender>,
    ) -> Self {
        Self {
            store,
            storage,
            campaigns,
            notifier: Notifier::new(),
            session: None,
            session_ttl: Duration::from_secs(24 * 3600),
            search_debounce: crate::panels::DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }

    /// Wire the REST store, file-backed session and campaign client.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let key = config.api_key.as_deref();
        let store: SharedStore = Arc::new(RestStore::new(config.store_url.as_str(), key)?);
        let storage = Arc::new(FileStorage::open(&config.session_path)?);
        let campaigns = Arc::new(HttpCampaignSender::new(&config.store_url, key)?);

        Ok(Self::new(store, storage, campaigns)
            .with_session_ttl(config.session_ttl)
            .with_search_debounce(config.search_debounce))
    }

    /// Restore the persisted session, if it is still valid.
    pub fn init(&mut self) -> Option<&Session> {
        self.session = match inspect(self.storage.as_ref(), now_ms()) {
            Ok(session) => {
                tracing::info!("Restored admin session for {}", session.user.email);
                Some(session)
            }
            Err(e) => {
                tracing::debug!("No admin session restored: {}", e);
                None
            }
        };
        self.session.as_ref()
    }

    /// Sign out and clear any visible notification.
    pub fn teardown(&mut self) -> AppResult<()> {
        self.notifier.dismiss();
        self.sign_out()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// A fresh guard for a navigation to `requested`.
    pub fn guard(&self, requested: &str) -> SessionGuard {
        SessionGuard::new(Arc::clone(&self.storage), requested)
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> AppResult<&Session> {
        let users = self.collection::<AdminUser>();
        let session = sign_in(&users, self.storage.as_ref(), email, password, self.session_ttl).await?;
        Ok(self.session.insert(session))
    }

    pub fn sign_out(&mut self) -> AppResult<()> {
        self.session = None;
        sign_out(self.storage.as_ref())
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn collection<R: Record>(&self) -> Collection<R> {
        Collection::new(Arc::clone(&self.store))
    }

    pub fn editor<R: Sectioned>(&self) -> RecordEditor<R> {
        RecordEditor::new(self.collection(), self.notifier.clone())
    }

    pub fn list<R: Record>(&self) -> RecordList<R> {
        RecordList::new(self.collection(), self.notifier.clone())
    }

    pub fn applications(&self) -> ApplicationsPanel {
        ApplicationsPanel::new(
            self.collection::<RecruitmentApplication>(),
            self.notifier.clone(),
            self.search_debounce,
        )
    }

    pub fn email_batches(&self) -> EmailPanel {
        EmailPanel::new(
            self.collection::<EmailBatch>(),
            self.notifier.clone(),
            Arc::clone(&self.campaigns),
        )
    }
}
