pub mod db;
pub mod fixture;
pub mod result;

pub use db::Store;
pub use fixture::{fixture_rows, StudentRecord, COLUMNS, TABLE_NAME};
pub use result::{CellValue, QueryResult, Record};
