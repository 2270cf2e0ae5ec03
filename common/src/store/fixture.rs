use crate::error::Result;
use crate::store::db::Store;
use rusqlite::params;
use serde::Serialize;

pub const TABLE_NAME: &str = "STUDENTS";
pub const COLUMNS: [&str; 4] = ["NAME", "CLASS", "MARKS", "COMPANY"];

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS STUDENTS (
    NAME TEXT,
    CLASS TEXT,
    MARKS INTEGER,
    COMPANY TEXT
)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRecord {
    pub name: String,
    pub class: String,
    pub marks: i64,
    pub company: String,
}

impl StudentRecord {
    fn fixture(name: &str, class: &str, marks: i64, company: &str) -> Self {
        Self {
            name: name.to_string(),
            class: class.to_string(),
            marks,
            company: company.to_string(),
        }
    }
}

/// rows written by every bootstrap, in insertion order
pub fn fixture_rows() -> Vec<StudentRecord> {
    vec![
        StudentRecord::fixture("Sijo", "BTech", 75, "JSW"),
        StudentRecord::fixture("Lijo", "MTech", 69, "TCS"),
        StudentRecord::fixture("Rijo", "BSc", 79, "WIPRO"),
        StudentRecord::fixture("Sibin", "MSc", 89, "INFOSYS"),
        StudentRecord::fixture("Dilsha", "MCom", 99, "Cyient"),
    ]
}

impl Store {
    /// Create the students table if needed and replace its contents with the
    /// fixture rows. Runs in one transaction.
    #[tracing::instrument(skip(self), fields(table = TABLE_NAME))]
    pub fn bootstrap(&mut self) -> Result<usize> {
        let rows = fixture_rows();
        let tx = self.conn.transaction()?;

        tx.execute_batch(CREATE_TABLE_SQL)?;
        let cleared = tx.execute("DELETE FROM STUDENTS", [])?;

        {
            let mut insert = tx.prepare("INSERT INTO STUDENTS VALUES (?1, ?2, ?3, ?4)")?;
            for row in &rows {
                insert.execute(params![row.name, row.class, row.marks, row.company])?;
            }
        }

        tx.commit()?;

        tracing::info!(
            cleared,
            seeded = rows.len(),
            "reset {} fixture table",
            TABLE_NAME
        );
        Ok(rows.len())
    }

    /// full table in rowid order
    pub fn students(&self) -> Result<Vec<StudentRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT NAME, CLASS, MARKS, COMPANY FROM STUDENTS ORDER BY rowid")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(StudentRecord {
                    name: row.get(0)?,
                    class: row.get(1)?,
                    marks: row.get(2)?,
                    company: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
