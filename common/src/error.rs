use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntelliSqlError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API quota exceeded")]
    QuotaExceeded,

    #[error("{0}")]
    Generation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("tracing initialization failed: {0}")]
    Tracing(String),
}

impl IntelliSqlError {
    /// display form of a recovered generation failure
    pub fn sentinel(&self) -> String {
        format!("Error: {}", self)
    }
}

pub type Result<T> = std::result::Result<T, IntelliSqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_sentinel() {
        assert_eq!(
            IntelliSqlError::QuotaExceeded.sentinel(),
            "Error: API quota exceeded"
        );
    }

    #[test]
    fn test_generation_sentinel_carries_message() {
        let err = IntelliSqlError::Generation("model overloaded".to_string());
        assert_eq!(err.sentinel(), "Error: model overloaded");
    }
}
