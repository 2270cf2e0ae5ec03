use crate::error::Result;
use crate::nl2sql::parser::SelectSql;
use crate::store::result::{CellValue, QueryResult};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Handle to the sqlite file holding the fixture table.
pub struct Store {
    pub(crate) conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        tracing::debug!("opened store at {}", path.display());

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run a validated read query and collect every row.
    ///
    /// Column names come from the prepared statement, so aliases and
    /// expressions keep the names sqlite reports for them. Errors from
    /// preparation or stepping are returned unchanged.
    #[tracing::instrument(skip(self, sql), fields(sql = %sql))]
    pub fn query(&self, sql: &SelectSql) -> Result<QueryResult> {
        let mut stmt = self.conn.prepare(sql.as_str())?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                let value: Value = row.get(i)?;
                cells.push(CellValue::from(value));
            }
            rows.push(cells);
        }

        tracing::debug!(columns = columns.len(), rows = rows.len(), "query complete");
        Ok(QueryResult::new(columns, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntelliSqlError;
    use crate::nl2sql::parser::sanitize_and_validate;

    fn seeded() -> Store {
        let mut store = Store::open_in_memory().unwrap();
        store.bootstrap().unwrap();
        store
    }

    #[test]
    fn test_query_filters_by_marks() {
        let store = seeded();
        let sql = sanitize_and_validate("SELECT NAME, MARKS FROM STUDENTS WHERE MARKS > 80").unwrap();
        let result = store.query(&sql).unwrap();

        assert_eq!(result.columns(), ["NAME", "MARKS"]);
        assert_eq!(
            result.rows(),
            [
                vec![CellValue::Text("Sibin".into()), CellValue::Integer(89)],
                vec![CellValue::Text("Dilsha".into()), CellValue::Integer(99)],
            ]
        );
    }

    #[test]
    fn test_query_keeps_statement_column_order() {
        let store = seeded();
        let sql = sanitize_and_validate(
            "SELECT COMPANY, NAME FROM STUDENTS WHERE NAME = 'Lijo'",
        )
        .unwrap();
        let result = store.query(&sql).unwrap();

        assert_eq!(result.columns(), ["COMPANY", "NAME"]);
        let record = result.records().next().unwrap();
        assert_eq!(record.get("COMPANY"), Some(&CellValue::Text("TCS".into())));
        assert_eq!(record.get("NAME"), Some(&CellValue::Text("Lijo".into())));
    }

    #[test]
    fn test_query_aggregate_and_empty() {
        let store = seeded();
        let avg = sanitize_and_validate("select avg(MARKS) as avg_marks from students").unwrap();
        let result = store.query(&avg).unwrap();
        assert_eq!(result.columns(), ["avg_marks"]);
        assert_eq!(result.rows()[0][0], CellValue::Real(82.2));

        let none = sanitize_and_validate("SELECT * FROM STUDENTS WHERE MARKS > 100").unwrap();
        let result = store.query(&none).unwrap();
        assert_eq!(result.columns().len(), 4);
        assert!(result.is_empty());
    }

    #[test]
    fn test_query_errors_propagate() {
        let store = seeded();
        let missing_column = sanitize_and_validate("SELECT AGE FROM STUDENTS").unwrap();
        assert!(matches!(
            store.query(&missing_column),
            Err(IntelliSqlError::Database(_))
        ));

        let missing_table = sanitize_and_validate("SELECT * FROM TEACHERS").unwrap();
        assert!(matches!(
            store.query(&missing_table),
            Err(IntelliSqlError::Database(_))
        ));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.db");
        let store = Store::open(&path).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        assert!(path.exists());
    }
}
