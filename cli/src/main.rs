use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use skutab_core::{Config, ExtractionService, Industry, Settings};
use skutab_lib::commands::{self, ExtractRequest, InputFormat};
use skutab_lib::{CommandError, CommandResult};

#[derive(Parser, Debug)]
#[command(name = "skutab")]
#[command(about = "Extract a consolidated attribute table from SKU descriptions")]
struct Args {
    /// Settings file (defaults to the one in the data directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Per-call oracle deadline in seconds, overriding settings
    #[arg(long, global = true)]
    oracle_timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract attributes from a CSV file or a text document
    Extract {
        path: PathBuf,
        /// Industry used to focus the prompt
        #[arg(long, default_value = "general")]
        industry: String,
        /// Product type mentioned in the prompt
        #[arg(long)]
        product_type: Option<String>,
        /// Input format; inferred from the extension when omitted
        #[arg(long, value_enum)]
        format: Option<InputFormat>,
        /// Description column of CSV input, overriding settings
        #[arg(long)]
        column: Option<String>,
    },
    /// Refine selected rows from a JSON request file
    Refine { request: PathBuf },
    /// Show the effective settings
    Settings {
        /// Save them to the settings file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    skutab_lib::init_logging(&["skutab=info", "skutab_lib=info", "skutab_core=info"]);

    match run(args).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            println!("{}", e.to_json());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> CommandResult<String> {
    let settings_file = args
        .settings
        .unwrap_or_else(|| Config::load_or_default().settings_file);
    let mut settings = Settings::load(&settings_file);
    if let Some(secs) = args.oracle_timeout {
        settings.oracle_timeout_secs = secs;
    }

    tracing::info!(
        provider = settings.provider.provider_type(),
        model = settings.provider.model_id(),
        "Using oracle"
    );

    match args.command {
        Command::Extract {
            path,
            industry,
            product_type,
            format,
            column,
        } => {
            if let Some(column) = column {
                settings.description_column = column;
            }
            let service = ExtractionService::from_settings(&settings);
            let request = ExtractRequest {
                path,
                industry: industry.parse::<Industry>().unwrap_or_default(),
                product_type,
                format,
            };
            let table =
                commands::extract(&service, &settings, &request, Duration::from_millis(500)).await?;
            to_json(&table)
        }
        Command::Refine { request } => {
            let service = ExtractionService::from_settings(&settings);
            let response = commands::refine(&service, &request).await?;
            to_json(&response)
        }
        Command::Settings { write } => {
            let effective = commands::settings(&settings, &settings_file, write)?;
            to_json(&effective)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> CommandResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| CommandError::internal(e.to_string()))
}
