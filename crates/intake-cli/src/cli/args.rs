use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "intake",
    version,
    about = "Ingest, validate, and store benchmark submission records"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract and syntax-check the JSON payload embedded in an event body
    Ingest(IngestArgs),
    /// Run the full schema validation over a record, report, file, or directory
    Validate(ValidateArgs),
    /// Write a validated record into the time-partitioned store
    Store(StoreArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct IngestArgs {
    /// Path to a JSON file containing the submission event (stdin if omitted)
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Environment variable holding the path to the event file
    #[arg(long, short = 'e')]
    pub env: Option<String>,

    #[arg(long, default_value = "json")]
    pub format: String, // text|json
}

#[derive(clap::Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Record file or directory to validate (reads stdin when omitted)
    pub path: Option<PathBuf>,

    /// Path to a JSON file containing the ingest output or a record
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Environment variable holding the path to the input file
    #[arg(long, short = 'e')]
    pub env: Option<String>,

    /// Path to the schema descriptor (default: schemas/result-schema-v3.0.json)
    #[arg(long, short = 's')]
    pub schema: Option<PathBuf>,

    /// Skip the schema descriptor pass, explicit checks only
    #[arg(long)]
    pub no_schema: bool,

    /// Filename pattern for directory validation
    #[arg(long, short = 'p', default_value = "*.json")]
    pub pattern: String,

    #[arg(long, default_value = "json")]
    pub format: String, // text|json
}

#[derive(clap::Args, Debug, Clone)]
pub struct StoreArgs {
    /// Path to a JSON file containing the validation output (stdin if omitted)
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Environment variable holding the path to the input file
    #[arg(long, short = 'e')]
    pub env: Option<String>,

    /// Root submissions directory
    #[arg(long, short = 'd', default_value = "submissions")]
    pub submissions_dir: PathBuf,

    #[arg(long, default_value = "json")]
    pub format: String, // text|json
}
