//! ConceptWeave CLI: submits documents, waits for their jobs and prints the
//! final job snapshots as JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use conceptweave::config::{default_config, load_config, Config};
use conceptweave::job::JobStatus;
use conceptweave::logging::init_tracing;
use conceptweave::service::{ConceptWeave, Upload};

#[derive(Parser)]
#[command(
    name = "conceptweave",
    version,
    about = "Summarize documents and map their key concepts"
)]
struct Cli {
    /// JSON config file. Defaults apply when omitted.
    #[arg(short, long, env = "CONCEPTWEAVE_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Seconds to wait for each job before giving up.
    #[arg(long, default_value_t = 600)]
    wait_secs: u64,

    /// Documents to process (PDF, PPTX, DOCX, images, plain text).
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn load(cli: &Cli) -> Result<Config, conceptweave::ConfigError> {
    match &cli.config {
        Some(path) => load_config(path),
        None => default_config(),
    }
}

fn upload_for(path: &Path, bytes: Vec<u8>) -> Upload {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Upload::new(name, mime_type, bytes)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if cli.json_logs {
        config.logging.json = true;
    }
    init_tracing(&config.logging);

    let service = match ConceptWeave::from_config(config) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start");
            return ExitCode::FAILURE;
        }
    };

    let mut failed = false;
    let mut submitted = Vec::new();

    for path in &cli.files {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                failed = true;
                continue;
            }
        };

        match service.submit(upload_for(path, bytes)) {
            Ok(receipt) => {
                tracing::info!(job_id = %receipt.id, file = %receipt.original_name, "Submitted");
                submitted.push(receipt);
            }
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                failed = true;
            }
        }
    }

    let wait = Duration::from_secs(cli.wait_secs);
    for receipt in submitted {
        let Some(snapshot) = service.wait_for_terminal(&receipt.id, wait).await else {
            eprintln!(
                "{}: job {} did not finish within {}s",
                receipt.original_name, receipt.id, cli.wait_secs
            );
            failed = true;
            continue;
        };

        if snapshot.status == JobStatus::Error {
            failed = true;
        }

        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize job {}: {}", snapshot.id, e);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
