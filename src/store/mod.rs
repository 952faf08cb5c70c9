//! Record store client: the CRUD and query surface every panel uses.
//!
//! `RecordStore` works on JSON rows so backends stay object-safe;
//! `Collection<R>` adds the typed layer on top.

mod query;
mod rest;

pub use query::*;
pub use rest::*;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::{AppError, AppResult};
use crate::models::{to_object, Patch, Record};

/// One row as an attribute map.
pub type Row = Map<String, Value>;

/// Shared handle to a store backend.
pub type SharedStore = Arc<dyn RecordStore>;

/// Rows of one page plus the total match count when it was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: Option<u64>,
}

/// Backend-neutral CRUD over named collections.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First matching row, or `None` when nothing matches.
    async fn fetch_one(&self, collection: &str, query: &Query) -> AppResult<Option<Row>>;

    async fn fetch_many(&self, collection: &str, query: &Query) -> AppResult<Page<Row>>;

    /// Insert and return the stored row, including its generated `id`.
    async fn insert(&self, collection: &str, attributes: Row) -> AppResult<Row>;

    /// Merge `patch` into the row. Zero rows affected is `NotFound`.
    async fn update(&self, collection: &str, id: &str, patch: Row) -> AppResult<Row>;

    /// Physically delete the row. Zero rows affected is `NotFound`.
    async fn remove(&self, collection: &str, id: &str) -> AppResult<()>;
}

/// Typed view of one collection.
pub struct Collection<R> {
    store: SharedStore,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<R: Record> Collection<R> {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        R::COLLECTION
    }

    /// Default query for this record type.
    pub fn query(&self) -> Query {
        Query::for_record::<R>()
    }

    pub async fn fetch_one(&self, query: &Query) -> AppResult<Option<R>> {
        match self.store.fetch_one(R::COLLECTION, query).await? {
            Some(row) => decode(row).map(Some),
            None => Ok(None),
        }
    }

    pub async fn fetch_by_id(&self, id: &str) -> AppResult<Option<R>> {
        self.fetch_one(&Query::new().eq("id", id)).await
    }

    pub async fn fetch_many(&self, query: &Query) -> AppResult<Page<R>> {
        let page = self.store.fetch_many(R::COLLECTION, query).await?;
        let rows = page
            .rows
            .into_iter()
            .map(decode)
            .collect::<AppResult<Vec<R>>>()?;
        Ok(Page {
            rows,
            total: page.total,
        })
    }

    pub async fn insert(&self, attributes: &R::New) -> AppResult<R> {
        let row = to_object(attributes)?;
        decode(self.store.insert(R::COLLECTION, row).await?)
    }

    pub async fn update(&self, id: &str, patch: Patch) -> AppResult<R> {
        decode(self.store.update(R::COLLECTION, id, patch.into_map()).await?)
    }

    /// Delete, or flag `is_deleted` for soft-deleted collections.
    pub async fn remove(&self, id: &str) -> AppResult<()> {
        if R::SOFT_DELETE {
            let patch = Patch::new().set("is_deleted", Value::Bool(true));
            self.store
                .update(R::COLLECTION, id, patch.into_map())
                .await
                .map(|_| ())
        } else {
            self.store.remove(R::COLLECTION, id).await
        }
    }
}

fn decode<R: Record>(row: Row) -> AppResult<R> {
    serde_json::from_value(Value::Object(row)).map_err(|e| {
        tracing::error!("Failed to decode {} row: {}", R::COLLECTION, e);
        AppError::Internal(format!("Failed to decode {} row: {}", R::COLLECTION, e))
    })
}
