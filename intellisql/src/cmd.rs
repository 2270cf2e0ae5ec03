use crate::render::{self, OutputFormat};
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use intellisql_common::config::{
    Settings, DEFAULT_API_BASE, DEFAULT_DB_PATH, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS,
};
use intellisql_common::llm::TextGenerator;
use intellisql_common::nl2sql::{sanitize, sanitize_and_validate, Outcome, Pipeline};
use intellisql_common::store::Store;
use intellisql_common::tracing::{init_tracing, TelemetrySettings};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "intellisql")]
#[command(about = "ask the students table questions in plain english", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    /// Output format for query results
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SettingsArgs {
    /// Gemini API key
    #[arg(long, global = true, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model identifier
    #[arg(long, global = true, env = "INTELLISQL_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of the generative language API
    #[arg(long, global = true, env = "INTELLISQL_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// SQLite file holding the students table
    #[arg(long = "db", global = true, env = "INTELLISQL_DB", default_value = DEFAULT_DB_PATH)]
    db_path: PathBuf,

    /// HTTP timeout for generation requests, in seconds
    #[arg(long, global = true, env = "INTELLISQL_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl SettingsArgs {
    fn into_settings(self) -> Settings {
        Settings {
            api_key: self.api_key,
            model: self.model,
            api_base: self.api_base,
            db_path: self.db_path,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the landing page
    Home,
    /// Reset the students table and print it
    Init,
    /// Translate one question to SQL and run it
    Ask {
        /// Question in plain english
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Run a SELECT statement directly, without the model
    Run {
        /// SQL text, optionally wrapped in a markdown fence
        sql: String,
    },
    /// Ask questions interactively
    Shell,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let _guard = init_tracing("intellisql", &TelemetrySettings::from_env())?;
        let settings = self.settings.into_settings();
        tracing::debug!(?settings, "starting");

        let mut out = io::stdout();
        match self.command {
            Commands::Home => {
                write!(out, "{}", render::home())?;
                Ok(())
            }
            Commands::Init => init(&settings, self.format, &mut out),
            Commands::Ask { question } => {
                let pipeline = open_pipeline(&settings, &mut io::stderr())?;
                answer(
                    &pipeline,
                    &question.join(" "),
                    self.format,
                    &mut out,
                    &mut io::stderr(),
                )
                .await
            }
            Commands::Run { sql } => run(&settings, &sql, self.format, &mut out),
            Commands::Shell => shell(&settings, self.format).await,
        }
    }
}

/// Open the store and reset the fixture table. Failure here is fatal.
fn open_store(settings: &Settings) -> Result<Store> {
    let mut store = Store::open(&settings.db_path)
        .with_context(|| format!("failed to open {}", settings.db_path.display()))?;
    store
        .bootstrap()
        .context("failed to seed the students table")?;

    if let Some(path) = store.path() {
        tracing::info!("students table ready at {}", path.display());
    }
    Ok(store)
}

/// A missing api key is reported on `err` and does not stop the pipeline
/// from being built.
fn open_pipeline(settings: &Settings, err: &mut impl Write) -> Result<Pipeline> {
    if let Some(warning) = settings.credential_warning() {
        tracing::warn!("{}", warning);
        writeln!(err, "{}", render::warning_banner(&warning))?;
    }

    let store = open_store(settings)?;
    let pipeline = Pipeline::from_settings(settings, store)?;
    tracing::debug!(
        db = ?pipeline.store().path(),
        model = pipeline.generator().model(),
        "pipeline ready"
    );
    Ok(pipeline)
}

fn init(settings: &Settings, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    let store = open_store(settings)?;
    let students = store.students()?;
    writeln!(out, "{}", render::result(&render::students(&students), format))?;
    Ok(())
}

fn run(settings: &Settings, sql: &str, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    let store = open_store(settings)?;

    let cleaned = sanitize(sql);
    writeln!(out, "{}", render::generated_sql(&cleaned))?;

    let sql =
        sanitize_and_validate(&cleaned).map_err(|rejection| anyhow!(rejection.to_string()))?;
    let rows = store.query(&sql).context("query execution failed")?;
    writeln!(out, "{}", render::result(&rows, format))?;
    Ok(())
}

/// One request through the pipeline, rendered. The model text is always
/// shown first; soft failures go to `err` and an execution failure is
/// returned.
async fn answer<G: TextGenerator>(
    pipeline: &Pipeline<G>,
    question: &str,
    format: OutputFormat,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        return Ok(());
    }

    let answer = match pipeline.ask(question).await {
        Ok(answer) => answer,
        Err(failure) => {
            writeln!(out, "{}", render::generated_sql(&failure.generated))?;
            return Err(failure.into());
        }
    };
    writeln!(out, "{}", render::generated_sql(&answer.generated))?;

    match answer.outcome {
        Outcome::Rows(rows) => writeln!(out, "{}", render::result(&rows, format))?,
        Outcome::GenerationFailed(sentinel) => {
            writeln!(err, "{}", render::error_banner(&sentinel))?
        }
        Outcome::Rejected(rejection) => {
            writeln!(err, "{}", render::error_banner(rejection.message()))?
        }
    }
    Ok(())
}

async fn shell(settings: &Settings, format: OutputFormat) -> Result<()> {
    let pipeline = open_pipeline(settings, &mut io::stderr())?;
    let mut editor = DefaultEditor::new()?;

    println!("Query Assistant: ask a question, Ctrl-D to quit");

    loop {
        match editor.readline("question> ") {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                editor.add_history_entry(question)?;

                let result = answer(
                    &pipeline,
                    question,
                    format,
                    &mut io::stdout(),
                    &mut io::stderr(),
                )
                .await;
                if let Err(e) = result {
                    tracing::error!("{:#}", e);
                    eprintln!("{}", render::error_banner(&format!("Error: {:#}", e)));
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
