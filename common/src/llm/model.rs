use crate::error::Result;
use async_trait::async_trait;

/// A hosted text-completion model.
///
/// One call is one attempt: implementations must not retry. Quota or rate
/// limit failures are reported as [`crate::IntelliSqlError::QuotaExceeded`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// model identifier sent with each request
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}
