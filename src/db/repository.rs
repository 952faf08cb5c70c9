//! SQLite-backed record store.
//!
//! Filters, search and ordering run against `json_extract` of the stored
//! document; updates are merged with `json_patch`.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{QueryBuilder, Row as _, Sqlite, SqlitePool};

use crate::errors::{AppError, AppResult};
use crate::store::{check_collection, sql_text, Page, Query, RecordStore, Row};

/// Database repository implementing the record store contract.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Row>> {
        let row = sqlx::query("SELECT data FROM records WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| parse_document(r.get("data"))).transpose()
    }
}

#[async_trait]
impl RecordStore for Repository {
    async fn fetch_one(&self, collection: &str, query: &Query) -> AppResult<Option<Row>> {
        let mut single = query.clone();
        single.range = Some((0, 0));
        single.count = false;

        let page = self.fetch_many(collection, &single).await?;
        Ok(page.rows.into_iter().next())
    }

    async fn fetch_many(&self, collection: &str, query: &Query) -> AppResult<Page<Row>> {
        check_collection(collection)?;
        query.validate()?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT data FROM records");
        push_conditions(&mut select, collection, query);

        match &query.order {
            Some(order) => {
                select
                    .push(" ORDER BY json_extract(data, ")
                    .push_bind(json_path(&order.column))
                    .push(if order.ascending { ") ASC" } else { ") DESC" })
                    .push(", rowid ASC");
            }
            None => {
                select.push(" ORDER BY rowid ASC");
            }
        }

        if let Some((start, end)) = query.range {
            let limit = end.saturating_sub(start).saturating_add(1);
            select
                .push(" LIMIT ")
                .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
                .push(" OFFSET ")
                .push_bind(i64::try_from(start).unwrap_or(i64::MAX));
        }

        let rows = select.build().fetch_all(&self.pool).await?;
        let rows = rows
            .iter()
            .map(|r| parse_document(r.get("data")))
            .collect::<AppResult<Vec<Row>>>()?;

        let total = if query.count {
            let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS total FROM records");
            push_conditions(&mut count, collection, query);
            let total: i64 = count.build().fetch_one(&self.pool).await?.get("total");
            Some(total.max(0) as u64)
        } else {
            None
        };

        Ok(Page { rows, total })
    }

    async fn insert(&self, collection: &str, attributes: Row) -> AppResult<Row> {
        check_collection(collection)?;
        let mut document = attributes;
        let now = Utc::now().to_rfc3339();

        let id = match document.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            _ => uuid::Uuid::new_v4().to_string(),
        };
        document.insert("id".to_string(), Value::String(id.clone()));

        let created_at = match document.get("created_at") {
            Some(Value::String(ts)) => ts.clone(),
            _ => now.clone(),
        };
        document.insert("created_at".to_string(), Value::String(created_at.clone()));

        let data = serde_json::to_string(&document)?;

        sqlx::query(
            "INSERT INTO records (collection, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(collection)
        .bind(&id)
        .bind(&data)
        .bind(&created_at)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(document)
    }

    async fn update(&self, collection: &str, id: &str, patch: Row) -> AppResult<Row> {
        check_collection(collection)?;
        let mut patch = patch;
        // Identity is immutable.
        patch.remove("id");
        patch.remove("created_at");

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE records SET data = json_patch(data, ?), updated_at = ? WHERE collection = ? AND id = ?",
        )
        .bind(serde_json::to_string(&patch)?)
        .bind(&now)
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} record {} not found",
                collection, id
            )));
        }

        self.get(collection, id).await?.ok_or_else(|| {
            AppError::NotFound(format!("{} record {} not found", collection, id))
        })
    }

    async fn remove(&self, collection: &str, id: &str) -> AppResult<()> {
        check_collection(collection)?;
        let result = sqlx::query("DELETE FROM records WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} record {} not found",
                collection, id
            )));
        }
        Ok(())
    }
}

/// Append the WHERE clause shared by the row and count queries.
fn push_conditions(builder: &mut QueryBuilder<'_, Sqlite>, collection: &str, query: &Query) {
    builder
        .push(" WHERE collection = ")
        .push_bind(collection.to_string());

    for filter in &query.filters {
        match sql_text(&filter.value) {
            Some(text) => {
                builder
                    .push(" AND CAST(json_extract(data, ")
                    .push_bind(json_path(&filter.column))
                    .push(") AS TEXT) = ")
                    .push_bind(text);
            }
            None => {
                builder
                    .push(" AND json_extract(data, ")
                    .push_bind(json_path(&filter.column))
                    .push(") IS NULL");
            }
        }
    }

    if let Some(search) = &query.search {
        builder.push(" AND (");
        for (i, field) in search.fields.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder
                .push("LOWER(CAST(json_extract(data, ")
                .push_bind(json_path(field))
                .push(") AS TEXT)) LIKE LOWER(")
                .push_bind(search.pattern.clone())
                .push(") ESCAPE '\\'");
        }
        builder.push(")");
    }
}

fn json_path(column: &str) -> String {
    format!("$.{}", column)
}

fn parse_document(data: String) -> AppResult<Row> {
    serde_json::from_str(&data).map_err(|e| {
        tracing::error!("Corrupt record document: {}", e);
        AppError::Database(format!("Corrupt record document: {}", e))
    })
}
