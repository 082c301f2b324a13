//! loanport: upload loan application documents and check requirement completion.
//!
//! Set LOANPORT_API_URL (or API_URL) and, if the API needs it, LOANPORT_API_TOKEN
//! (or CLIENT_APP_SHARED_TOKEN). Output is JSON on stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use loanport_api_client::ApiClient;
use loanport_cli::{
    document_type_tag, error_json, init_tracing, load_file, parse_requirement, parse_uploaded,
    truncate_string, upload_succeeded, MAX_ERROR_LEN,
};
use loanport_core::validation::{required_count_for, validate_requirements};
use loanport_core::{
    CompletedUpload, FinancingCategory, PortalConfig, RequiredDocument, RequirementReport,
};
use loanport_upload::{BatchReport, UploadOrchestrator};
use serde::Serialize;
use serde_json::json;

#[derive(Parser)]
#[command(name = "loanport", about = "Loan application document upload CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files for one document type, one at a time
    Upload {
        /// Application the documents belong to
        #[arg(long)]
        application_id: String,
        /// Document type label or tag, e.g. "Bank Statements"
        #[arg(long)]
        document_type: String,
        /// Required category, LABEL or LABEL=COUNT (repeatable)
        #[arg(long = "require")]
        require: Vec<String>,
        /// Retry failed uploads this many times
        #[arg(long, default_value = "0")]
        retries: u32,
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Check requirement completion against documents stored on the server
    Status {
        #[arg(long)]
        application_id: String,
        /// Required category, LABEL or LABEL=COUNT (repeatable)
        #[arg(long = "require")]
        require: Vec<String>,
        /// Add the documents a financing category needs
        #[arg(long)]
        category: Option<FinancingCategory>,
    },
    /// List the documents a financing category needs
    Requirements {
        /// e.g. line_of_credit, equipment_financing, sba_loan
        category: FinancingCategory,
    },
    /// Evaluate requirements offline against TYPE=FILE pairs
    Check {
        #[arg(long = "require")]
        require: Vec<String>,
        /// Completed upload as TYPE=FILE (repeatable)
        #[arg(long = "uploaded")]
        uploaded: Vec<String>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn parse_requirements(raw: &[String]) -> anyhow::Result<Vec<RequiredDocument>> {
    raw.iter().map(|r| parse_requirement(r)).collect()
}

fn batch_json(report: &BatchReport) -> serde_json::Value {
    json!({
        "accepted": report.accepted,
        "completed": report.completed,
        "failed": report.failed,
        "rejected": report.rejected.iter().map(error_json).collect::<Vec<_>>(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            application_id,
            document_type,
            require,
            retries,
            files,
        } => {
            let config = PortalConfig::from_env().context("Invalid portal configuration")?;
            let client = ApiClient::from_config(&config).context(
                "Failed to create API client. Check LOANPORT_API_URL (or API_URL)",
            )?;
            let required = parse_requirements(&require)?;
            let files = files
                .iter()
                .map(|path| load_file(path))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let orchestrator =
                UploadOrchestrator::builder(application_id.clone(), Arc::new(client))
                    .config(config.upload.clone())
                    .requirements(required)
                    .build();

            let tag = document_type_tag(&document_type);
            tracing::info!(
                application_id = %application_id,
                document_type = %tag,
                files = files.len(),
                "Starting upload"
            );
            let report = orchestrator.submit(files, tag).await;
            let mut retried = Vec::new();
            let mut pending = !report.failed.is_empty();
            for _ in 0..retries {
                if !pending {
                    break;
                }
                let attempt = orchestrator.retry_failed().await;
                pending = !attempt.failed.is_empty();
                retried.push(attempt);
            }

            let items: Vec<_> = orchestrator
                .items()
                .into_iter()
                .map(|mut item| {
                    item.error = item.error.map(|e| truncate_string(&e, MAX_ERROR_LEN));
                    item
                })
                .collect();
            let gate = orchestrator.requirement_report();
            let succeeded = upload_succeeded(&items, &report.rejected);

            print_json(&json!({
                "application_id": application_id,
                "document_type": tag,
                "upload": batch_json(&report),
                "retries": retried.iter().map(batch_json).collect::<Vec<_>>(),
                "items": items,
                "requirements": gate,
            }))?;

            if !succeeded {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Status {
            application_id,
            require,
            category,
        } => {
            let client = ApiClient::from_env().context(
                "Failed to create API client. Check LOANPORT_API_URL (or API_URL)",
            )?;
            let mut required = category
                .map(RequiredDocument::for_category)
                .unwrap_or_default();
            required.extend(parse_requirements(&require)?);

            let documents = client
                .list_documents(&application_id)
                .await
                .with_context(|| format!("Failed to list documents for {}", application_id))?;
            let completed: Vec<CompletedUpload> = documents
                .iter()
                .map(|d| CompletedUpload::new(d.file_name.clone(), d.document_type.clone()))
                .collect();
            let report = validate_requirements(&required, &completed);

            print_json(&json!({
                "application_id": application_id,
                "documents": documents,
                "requirements": report,
            }))?;
        }
        Commands::Requirements { category } => {
            let required: Vec<_> = RequiredDocument::for_category(category)
                .into_iter()
                .map(|doc| {
                    json!({
                        "label": doc.label,
                        "document_type": doc.document_type,
                        "required_count": doc
                            .required_count
                            .unwrap_or_else(|| required_count_for(&doc.label)),
                    })
                })
                .collect();
            print_json(&json!({
                "category": category,
                "documents": required,
            }))?;
        }
        Commands::Check { require, uploaded } => {
            let required = parse_requirements(&require)?;
            let completed = uploaded
                .iter()
                .map(|u| parse_uploaded(u))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let report: RequirementReport = validate_requirements(&required, &completed);
            print_json(&report)?;

            if !report.all_complete {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
