//! SQLite implementation of the host database bridge

use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::{Number, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{Record, SqlBridge};
use crate::{Error, Result};

/// Bridge backed by a single SQLite connection.
///
/// Calls run on the blocking thread pool, one at a time.
#[derive(Clone)]
pub struct SqliteBridge {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBridge {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(bridge_error)?;
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(bridge_error)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| Error::Bridge("SQLite connection lock poisoned".to_string()))?;
            f(&conn).map_err(bridge_error)
        })
        .await
        .map_err(|e| Error::Bridge(format!("SQLite worker failed: {}", e)))?
    }
}

fn bridge_error(err: rusqlite::Error) -> Error {
    Error::Bridge(err.to_string())
}

/// Quote a table or column name after checking it is a plain identifier
fn identifier(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(Error::InvalidInput(format!("Invalid identifier: {:?}", name)));
    }
    Ok(format!("\"{}\"", name))
}

fn to_sql(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

/// Build `"a" = ?1 AND "b" = ?2` style clauses, numbering from `first`
fn placeholders(record: &Record, first: usize, separator: &str) -> Result<String> {
    let parts = record
        .keys()
        .enumerate()
        .map(|(i, column)| Ok(format!("{} = ?{}", identifier(column)?, first + i)))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(separator))
}

#[async_trait]
impl SqlBridge for SqliteBridge {
    async fn create_table(&self, table: &str, schema: &str) -> Result<()> {
        let sql = format!("CREATE TABLE {} ({})", identifier(table)?, schema.trim());
        self.with_conn(move |conn| conn.execute_batch(&sql)).await
    }

    async fn insert_data(&self, table: &str, data: Record) -> Result<i64> {
        let table = identifier(table)?;
        let sql = if data.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table)
        } else {
            let columns = data
                .keys()
                .map(|column| identifier(column))
                .collect::<Result<Vec<_>>>()?;
            let slots: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(", "),
                slots.join(", ")
            )
        };
        let values: Vec<SqlValue> = data.into_iter().map(|(_, v)| to_sql(v)).collect();

        self.with_conn(move |conn| {
            conn.execute(&sql, params_from_iter(values))?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn update_data(&self, table: &str, data: Record, filter: Record) -> Result<()> {
        if filter.is_empty() {
            return Err(Error::InvalidInput(
                "Update requires at least one filter column".to_string(),
            ));
        }
        if data.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            identifier(table)?,
            placeholders(&data, 1, ", ")?,
            placeholders(&filter, data.len() + 1, " AND ")?
        );
        let values: Vec<SqlValue> = data
            .into_iter()
            .chain(filter)
            .map(|(_, v)| to_sql(v))
            .collect();

        self.with_conn(move |conn| conn.execute(&sql, params_from_iter(values)).map(|_| ()))
            .await
    }

    async fn delete_data(&self, table: &str, filter: Record) -> Result<()> {
        if filter.is_empty() {
            return Err(Error::InvalidInput(
                "Delete requires at least one filter column".to_string(),
            ));
        }
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            identifier(table)?,
            placeholders(&filter, 1, " AND ")?
        );
        let values: Vec<SqlValue> = filter.into_iter().map(|(_, v)| to_sql(v)).collect();

        self.with_conn(move |conn| conn.execute(&sql, params_from_iter(values)).map(|_| ()))
            .await
    }

    async fn query_data(&self, query: &str, params: Vec<Value>) -> Result<Vec<Record>> {
        let sql = query.to_string();
        let values: Vec<SqlValue> = params.into_iter().map(to_sql).collect();

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();
            let mut rows = stmt.query(params_from_iter(values))?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Record::new();
                for (i, column) in columns.iter().enumerate() {
                    record.insert(column.clone(), from_sql(row.get_ref(i)?));
                }
                records.push(record);
            }
            Ok(records)
        })
        .await
    }
}
