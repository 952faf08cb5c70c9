//! Collection queries: equality filters, text search, ordering and ranges.
//!
//! The same `Query` drives the SQLite backend directly and travels over HTTP
//! in the PostgREST dialect (`col=eq.v`, `or=(f.ilike."%t%")`,
//! `order=col.asc`, `offset`/`limit`).

use serde_json::Value;

use crate::errors::{AppError, AppResult};
use crate::models::Record;

/// Column equality predicate. A `null` value matches missing columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

/// Case-insensitive substring match ORed across `fields`.
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    /// LIKE pattern with `\` escapes already applied.
    pub pattern: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub search: Option<Search>,
    pub order: Option<Order>,
    /// Inclusive row range, zero-based.
    pub range: Option<(u64, u64)>,
    /// Ask the store for the total number of matching rows.
    pub count: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default query for a record type: its ordering, and for soft-deleted
    /// collections only rows that are not flagged.
    pub fn for_record<R: Record>() -> Self {
        let query = Self::new().order_by(R::ORDER_BY, R::ASCENDING);
        if R::SOFT_DELETE {
            query.eq("is_deleted", false)
        } else {
            query
        }
    }

    /// Add or replace the equality filter on `column`.
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.retain(|f| f.column != column);
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Match `term` as a literal substring of any of `fields`. Blank terms
    /// clear the search.
    pub fn search(mut self, term: &str, fields: &[&str]) -> Self {
        let term = term.trim();
        self.search = if term.is_empty() || fields.is_empty() {
            None
        } else {
            Some(Search {
                pattern: like_pattern(term),
                fields: fields.iter().map(|f| f.to_string()).collect(),
            })
        };
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn range(mut self, start: u64, end: u64) -> Self {
        self.range = Some((start, end));
        self
    }

    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Reject column names that are not plain identifiers and empty ranges.
    pub fn validate(&self) -> AppResult<()> {
        let columns = self
            .filters
            .iter()
            .map(|f| f.column.as_str())
            .chain(self.search.iter().flat_map(|s| s.fields.iter().map(|f| f.as_str())))
            .chain(self.order.iter().map(|o| o.column.as_str()));

        for column in columns {
            if !is_identifier(column) {
                return Err(AppError::BadRequest(format!("Invalid column name: {}", column)));
            }
        }

        if let Some((start, end)) = self.range {
            if end < start {
                return Err(AppError::BadRequest(format!(
                    "Invalid range: {}-{}",
                    start, end
                )));
            }
        }
        Ok(())
    }

    /// Encode as PostgREST query parameters (without `select`).
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        for filter in &self.filters {
            let value = match &filter.value {
                Value::Null => "is.null".to_string(),
                other => format!("eq.{}", value_text(other)),
            };
            params.push((filter.column.clone(), value));
        }

        if let Some(search) = &self.search {
            let clauses: Vec<String> = search
                .fields
                .iter()
                .map(|f| format!("{}.ilike.{}", f, quote(&search.pattern)))
                .collect();
            params.push(("or".to_string(), format!("({})", clauses.join(","))));
        }

        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }

        if let Some((start, end)) = self.range {
            params.push(("offset".to_string(), start.to_string()));
            let limit = end.saturating_sub(start).saturating_add(1);
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }

    /// Decode PostgREST query parameters produced by [`Query::to_params`].
    /// `count` is carried by the `Prefer` header and is left unset.
    pub fn from_params(params: &[(String, String)]) -> AppResult<Self> {
        let mut query = Query::new();
        let mut offset: Option<u64> = None;
        let mut limit: Option<u64> = None;

        for (key, value) in params {
            match key.as_str() {
                "select" => {}
                "order" => {
                    let (column, direction) =
                        value.split_once('.').unwrap_or((value.as_str(), "asc"));
                    let ascending = match direction.split('.').next() {
                        Some("asc") => true,
                        Some("desc") => false,
                        _ => {
                            return Err(AppError::BadRequest(format!("Invalid order: {}", value)))
                        }
                    };
                    query = query.order_by(column, ascending);
                }
                "offset" => offset = Some(parse_number(key, value)?),
                "limit" => limit = Some(parse_number(key, value)?),
                "or" => query.search = Some(parse_search(value)?),
                column => {
                    let filter_value = if value == "is.null" {
                        Value::Null
                    } else if let Some(raw) = value.strip_prefix("eq.") {
                        match raw {
                            "true" => Value::Bool(true),
                            "false" => Value::Bool(false),
                            other => Value::String(other.to_string()),
                        }
                    } else {
                        return Err(AppError::BadRequest(format!(
                            "Unsupported filter on {}: {}",
                            column, value
                        )));
                    };
                    query = query.eq(column, filter_value);
                }
            }
        }

        match (offset, limit) {
            (_, Some(0)) => {
                return Err(AppError::BadRequest("limit must be positive".to_string()));
            }
            (start, Some(limit)) => {
                let start = start.unwrap_or(0);
                query.range = Some((start, start.saturating_add(limit - 1)));
            }
            (Some(start), None) => query.range = Some((start, u64::MAX)),
            (None, None) => {}
        }

        query.validate()?;
        Ok(query)
    }
}

/// SQL-side text form of a filter value. JSON booleans are stored as 1/0.
pub fn sql_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some("0".to_string()),
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Collection names share the identifier rule of column names.
pub(crate) fn check_collection(collection: &str) -> AppResult<()> {
    if is_identifier(collection) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Invalid collection name: {}",
            collection
        )))
    }
}

/// Escape LIKE metacharacters so user input only matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Lower-cased substring pattern for a search term.
pub fn like_pattern(term: &str) -> String {
    format!("%{}%", escape_like(&term.to_lowercase()))
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn parse_number(key: &str, value: &str) -> AppResult<u64> {
    value
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {}: {}", key, value)))
}

/// Parse `(field.ilike."pattern",field.ilike."pattern")`.
fn parse_search(value: &str) -> AppResult<Search> {
    let inner = value
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .ok_or_else(|| AppError::BadRequest(format!("Invalid or filter: {}", value)))?;

    let mut fields = Vec::new();
    let mut pattern: Option<String> = None;

    for clause in split_clauses(inner) {
        let mut parts = clause.splitn(3, '.');
        let (field, op, raw) = match (parts.next(), parts.next(), parts.next()) {
            (Some(f), Some(op), Some(raw)) => (f, op, raw),
            _ => return Err(AppError::BadRequest(format!("Invalid or clause: {}", clause))),
        };
        if op != "ilike" {
            return Err(AppError::BadRequest(format!("Unsupported operator: {}", op)));
        }

        let clause_pattern = unquote(raw);
        match &pattern {
            Some(existing) if *existing != clause_pattern => {
                return Err(AppError::BadRequest(
                    "All search clauses must share one pattern".to_string(),
                ));
            }
            Some(_) => {}
            None => pattern = Some(clause_pattern),
        }
        fields.push(field.to_string());
    }

    match pattern {
        Some(pattern) => Ok(Search { pattern, fields }),
        None => Err(AppError::BadRequest("Empty or filter".to_string())),
    }
}

/// Split on commas outside double quotes.
fn split_clauses(input: &str) -> Vec<String> {
    let mut clauses = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in input.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => clauses.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        clauses.push(current);
    }
    clauses
}

fn unquote(raw: &str) -> String {
    let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
        return raw.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailBatch, Faq};
    use serde_json::json;

    #[test]
    fn test_escape_like_percent_is_literal() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
        assert_eq!(like_pattern("Sales 100%"), "%sales 100\\%%");
    }

    #[test]
    fn test_for_record_applies_order_and_soft_delete() {
        let faqs = Query::for_record::<Faq>();
        assert_eq!(
            faqs.order,
            Some(Order {
                column: "order_index".to_string(),
                ascending: true
            })
        );
        assert!(faqs.filters.is_empty());

        let batches = Query::for_record::<EmailBatch>();
        assert_eq!(batches.filters[0].column, "is_deleted");
        assert_eq!(batches.filters[0].value, json!(false));
    }

    #[test]
    fn test_eq_replaces_existing_filter() {
        let query = Query::new().eq("status", "new").eq("status", "contacted");
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].value, json!("contacted"));
    }

    #[test]
    fn test_blank_search_clears() {
        let query = Query::new().search("ada", &["full_name"]).search("   ", &["full_name"]);
        assert!(query.search.is_none());
    }

    #[test]
    fn test_params_survive_the_wire() {
        let query = Query::new()
            .eq("status", "reviewing")
            .eq("is_deleted", false)
            .search("o\"brien, 50%", &["full_name", "email"])
            .order_by("created_at", false)
            .range(20, 39);

        let params = query.to_params();
        assert!(params.contains(&("status".to_string(), "eq.reviewing".to_string())));
        assert!(params.contains(&("order".to_string(), "created_at.desc".to_string())));
        assert!(params.contains(&("limit".to_string(), "20".to_string())));

        let decoded = Query::from_params(&params).unwrap();
        assert_eq!(decoded.filters, query.filters);
        assert_eq!(decoded.search, query.search);
        assert_eq!(decoded.order, query.order);
        assert_eq!(decoded.range, Some((20, 39)));
    }

    #[test]
    fn test_from_params_rejects_bad_input() {
        let bad_column = vec![("name;drop".to_string(), "eq.x".to_string())];
        assert!(matches!(
            Query::from_params(&bad_column),
            Err(AppError::BadRequest(_))
        ));

        let bad_op = vec![("title".to_string(), "gt.5".to_string())];
        assert!(Query::from_params(&bad_op).is_err());

        let zero_limit = vec![("limit".to_string(), "0".to_string())];
        assert!(Query::from_params(&zero_limit).is_err());
    }

    #[test]
    fn test_check_collection() {
        assert!(check_collection("press_articles").is_ok());
        assert!(matches!(
            check_collection("jobs;drop"),
            Err(AppError::BadRequest(_))
        ));
        assert!(check_collection("").is_err());
    }

    #[test]
    fn test_null_filter() {
        let params = Query::new().eq("sent_at", Value::Null).to_params();
        assert_eq!(params[0].1, "is.null");
        let decoded = Query::from_params(&params).unwrap();
        assert_eq!(decoded.filters[0].value, Value::Null);
    }

    #[test]
    fn test_sql_text() {
        assert_eq!(sql_text(&json!(true)), Some("1".to_string()));
        assert_eq!(sql_text(&json!(7)), Some("7".to_string()));
        assert_eq!(sql_text(&json!("new")), Some("new".to_string()));
        assert_eq!(sql_text(&Value::Null), None);
    }
}
