pub mod config;
pub mod error;
pub mod llm;
pub mod nl2sql;
pub mod store;
pub mod tracing;

pub use config::Settings;
pub use error::{IntelliSqlError, Result};
