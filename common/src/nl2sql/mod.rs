pub mod executor;
pub mod parser;
pub mod prompt;

pub use executor::{Answer, ExecutionFailure, Outcome, Pipeline};
pub use parser::{sanitize, sanitize_and_validate, Rejection, SelectSql, REJECTION_MESSAGE};
pub use prompt::build_sql_prompt;
