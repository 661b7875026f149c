//! SQLite view store: each view is a table, filters run as SQL

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ontoquery_condition::sql::quote_ident;
use ontoquery_core::{ObjectData, ViewData};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::{Number, Value};

use crate::dsl::Query;
use crate::error::{StorageError, StorageResult};
use crate::traits::{ViewFilter, ViewStore};

/// SQLite-backed view store
pub struct SqliteViewStore {
    conn: Mutex<Connection>,
}

impl SqliteViewStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Create an in-memory SQLite database (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        // LIKE matches case like the search-side wildcard query
        conn.pragma_update(None, "case_sensitive_like", true)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))
    }

    /// Replace the view's table with `rows`; columns are the union of row keys
    pub fn create_view(&self, view_id: &str, rows: &[ObjectData]) -> StorageResult<()> {
        let columns: BTreeSet<&str> = rows
            .iter()
            .flat_map(|r| r.keys().map(String::as_str))
            .collect();
        if columns.is_empty() {
            return Err(StorageError::Database(format!(
                "view {} has no columns",
                view_id
            )));
        }
        let columns: Vec<&str> = columns.into_iter().collect();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let table = quote_ident(view_id);
        let column_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({column_list});"
        ))?;
        {
            let placeholders = vec!["?"; columns.len()].join(", ");
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} ({column_list}) VALUES ({placeholders})"
            ))?;
            for row in rows {
                let values = columns.iter().map(|c| to_sql(row.get(*c)));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;

        tracing::debug!("Created view table {} ({} rows)", view_id, rows.len());
        Ok(())
    }

    fn table_exists(conn: &Connection, view_id: &str) -> StorageResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [view_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

fn to_sql(value: Option<&Value>) -> SqlValue {
    match value {
        None | Some(Value::Null) => SqlValue::Null,
        Some(Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
        Some(other) => SqlValue::Text(other.to_string()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    }
}

#[async_trait]
impl ViewStore for SqliteViewStore {
    async fn get_view_data_by_id(
        &self,
        view_id: &str,
        filter: &ViewFilter,
        limit: usize,
    ) -> StorageResult<ViewData> {
        // The SQL form may omit clauses it cannot express, so it only
        // narrows; the DSL form decides which fetched rows match
        let post_filter = match Query::parse(&filter.dsl)? {
            Query::MatchAll => None,
            query => Some(query),
        };

        let conn = self.lock()?;
        if !Self::table_exists(&conn, view_id)? {
            return Err(StorageError::ViewNotFound(view_id.to_string()));
        }

        let mut sql = format!("SELECT * FROM {}", quote_ident(view_id));
        if !filter.sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.sql);
        }
        if post_filter.is_none() {
            sql.push_str(&format!(" LIMIT {}", limit.min(i64::MAX as usize)));
        }
        tracing::debug!("View query: {}", sql);

        let mut stmt = conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let mut rows = stmt.query([])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut data = ObjectData::new();
            for (i, name) in names.iter().enumerate() {
                let value = from_sql(row.get_ref(i)?);
                if !value.is_null() {
                    data.insert(name.clone(), value);
                }
            }
            if post_filter.as_ref().map_or(true, |q| q.matches(&data)) {
                out.push(data);
                if out.len() >= limit {
                    break;
                }
            }
        }

        Ok(ViewData::new(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::as_object;
    use serde_json::json;

    fn rows() -> Vec<ObjectData> {
        vec![
            as_object(json!({"view_id": 123, "view_target_id": 456, "note": "primary link"})).unwrap(),
            as_object(json!({"view_id": 123, "view_target_id": 457})).unwrap(),
            as_object(json!({"view_id": 124, "view_target_id": 458, "note": "backup"})).unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_sql_filter() {
        let store = SqliteViewStore::in_memory().unwrap();
        store.create_view("v1", &rows()).unwrap();

        let filter = ViewFilter {
            dsl: json!({"terms": {"view_id": [123]}}),
            sql: "\"view_id\" IN (123)".into(),
        };
        let data = store.get_view_data_by_id("v1", &filter, 100).await.unwrap();
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[0]["view_target_id"], json!(456));
        assert!(!data.rows[1].contains_key("note"));
    }

    #[tokio::test]
    async fn test_dsl_post_filter_without_sql() {
        let store = SqliteViewStore::in_memory().unwrap();
        store.create_view("v1", &rows()).unwrap();

        let filter = ViewFilter {
            dsl: json!({"regexp": {"note": {"value": "back.*"}}}),
            sql: String::new(),
        };
        let data = store.get_view_data_by_id("v1", &filter, 100).await.unwrap();
        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0]["view_id"], json!(124));
    }

    #[tokio::test]
    async fn test_partial_sql_is_narrowed_by_dsl() {
        let store = SqliteViewStore::in_memory().unwrap();
        store.create_view("v1", &rows()).unwrap();

        // The match clause has no SQL form; only the range reached SQLite
        let filter = ViewFilter {
            dsl: json!({"bool": {"must": [
                {"range": {"view_id": {"gte": 123}}},
                {"match": {"note": {"query": "primary"}}}
            ]}}),
            sql: "\"view_id\" >= 123".into(),
        };
        let data = store.get_view_data_by_id("v1", &filter, 100).await.unwrap();
        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0]["view_target_id"], json!(456));

        let memory = crate::memory::MemoryViewStore::new();
        memory.insert_rows("v1", rows()).unwrap();
        let expected = memory.get_view_data_by_id("v1", &filter, 100).await.unwrap();
        assert_eq!(data.rows, expected.rows);
    }

    #[tokio::test]
    async fn test_limit_applies_after_post_filter() {
        let store = SqliteViewStore::in_memory().unwrap();
        store.create_view("v1", &rows()).unwrap();

        let filter = ViewFilter {
            dsl: json!({"exists": {"field": "note"}}),
            sql: String::new(),
        };
        let data = store.get_view_data_by_id("v1", &filter, 1).await.unwrap();
        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0]["view_id"], json!(123));
    }

    #[tokio::test]
    async fn test_missing_view() {
        let store = SqliteViewStore::in_memory().unwrap();
        let err = store
            .get_view_data_by_id("nope", &ViewFilter::match_all(), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ViewNotFound(_)));
    }

    #[tokio::test]
    async fn test_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("views.db");
        {
            let store = SqliteViewStore::open(&path).unwrap();
            store.create_view("v1", &rows()).unwrap();
        }
        let store = SqliteViewStore::open(&path).unwrap();
        let data = store
            .get_view_data_by_id("v1", &ViewFilter::match_all(), 2)
            .await
            .unwrap();
        assert_eq!(data.rows.len(), 2);
    }
}
