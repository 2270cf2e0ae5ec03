use crate::config::Settings;
use crate::error::{IntelliSqlError, Result};
use crate::llm::{GeminiClient, TextGenerator};
use crate::nl2sql::parser::{sanitize_and_validate, Rejection, SelectSql};
use crate::nl2sql::prompt::build_sql_prompt;
use crate::store::{QueryResult, Store};
use thiserror::Error;

/// How a question ended, short of an execution failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// sentinel text from a failed generation request
    GenerationFailed(String),
    Rejected(Rejection),
    Rows(QueryResult),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// raw model text, or the sentinel when generation failed
    pub generated: String,
    pub outcome: Outcome,
}

/// A validated statement that failed in the store. Carries the model text so
/// the caller can show what was run.
#[derive(Error, Debug)]
#[error("query execution failed")]
pub struct ExecutionFailure {
    pub generated: String,
    #[source]
    pub source: IntelliSqlError,
}

/// Question in, rows out. Holds no per-request state.
pub struct Pipeline<G = GeminiClient> {
    generator: G,
    store: Store,
}

impl Pipeline<GeminiClient> {
    pub fn from_settings(settings: &Settings, store: Store) -> Result<Self> {
        Ok(Self::new(GeminiClient::new(settings)?, store))
    }
}

impl<G: TextGenerator> Pipeline<G> {
    pub fn new(generator: G, store: Store) -> Self {
        Self { generator, store }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Ask the model for SQL, keeping the typed error.
    #[tracing::instrument(skip(self, question), fields(llm.model = %self.generator.model()))]
    pub async fn try_generate(&self, question: &str) -> Result<String> {
        let prompt = build_sql_prompt(question);
        let text = self.generator.generate(&prompt).await?;
        Ok(text.trim().to_string())
    }

    /// Ask the model for SQL. Failures come back as `Error: ...` text.
    pub async fn generate(&self, question: &str) -> String {
        match self.try_generate(question).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("generation failed: {}", e);
                e.sentinel()
            }
        }
    }

    pub fn execute(&self, sql: &SelectSql) -> Result<QueryResult> {
        self.store.query(sql)
    }

    /// Run one question through generation, validation and execution.
    ///
    /// Generation failures and rejected statements are returned as outcomes;
    /// only an execution failure is an `Err`.
    #[tracing::instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn ask(&self, question: &str) -> std::result::Result<Answer, ExecutionFailure> {
        tracing::debug!("generating");
        let generated = match self.try_generate(question).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("generation failed: {}", e);
                let sentinel = e.sentinel();
                return Ok(Answer {
                    generated: sentinel.clone(),
                    outcome: Outcome::GenerationFailed(sentinel),
                });
            }
        };

        tracing::debug!(generated_len = generated.len(), "validating");
        let sql = match sanitize_and_validate(&generated) {
            Ok(sql) => sql,
            Err(rejection) => {
                tracing::info!("rejected generated statement");
                return Ok(Answer {
                    generated,
                    outcome: Outcome::Rejected(rejection),
                });
            }
        };

        tracing::info!(sql = %sql, "executing generated statement");
        let rows = match self.execute(&sql) {
            Ok(rows) => rows,
            Err(source) => return Err(ExecutionFailure { generated, source }),
        };
        tracing::info!(rows = rows.len(), "question answered");

        Ok(Answer {
            generated,
            outcome: Outcome::Rows(rows),
        })
    }
}
