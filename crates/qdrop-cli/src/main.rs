use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qdrop_cli::report::{render_failure, render_success, ProgressPrinter};
use qdrop_cli::CliContext;
use qdrop_core::models::{ArtifactFile, BuildForm, Session, UploadProgress};
use qdrop_core::{QDropConfig, UploadError};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "qdrop")]
#[command(about = "Submit application builds to the qdrop registry")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show or change the saved organization
    Org {
        #[command(subcommand)]
        action: OrgAction,
    },
    /// Upload a build and record its metadata
    Submit(SubmitArgs),
}

#[derive(Subcommand, Debug)]
enum OrgAction {
    /// Print the saved organization ID
    Show,
    /// Verify and save an organization ID
    Set {
        #[arg(value_name = "ID")]
        organization_id: String,
    },
}

#[derive(clap::Args, Debug)]
struct SubmitArgs {
    /// Path to the build artifact
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Version of the build (e.g. 1.4.2)
    #[arg(long)]
    version: String,

    /// Label grouping builds into a lineage (defaults to the last used label)
    #[arg(long)]
    label: Option<String>,

    #[arg(long, default_value = "")]
    changelog: String,

    /// Submitter name (defaults to the last used name)
    #[arg(long)]
    user: Option<String>,

    /// Replace the most recent build with the same label
    #[arg(long)]
    replace: bool,

    /// Override the content type sent with the upload
    #[arg(long, value_name = "TYPE")]
    content_type: Option<String>,

    /// Print the completed record as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("qdrop=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = QDropConfig::from_env()?;
    let context = CliContext::new(config).await?;

    let outcome = match args.command {
        Command::Org { action } => run_org(&context, action).await,
        Command::Submit(submit) => run_submit(&context, submit).await?,
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("{}", render_failure(&err));
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run_org(context: &CliContext, action: OrgAction) -> Result<(), UploadError> {
    match action {
        OrgAction::Show => {
            match context.organizations.current().await {
                Some(id) => println!("{}", id),
                None => println!("No organization saved. Run `qdrop org set <ID>`."),
            }
            Ok(())
        }
        OrgAction::Set { organization_id } => {
            let organization_id = organization_id.trim();
            if organization_id.is_empty() {
                return Err(UploadError::MissingOrganization);
            }
            if context.organizations.update(organization_id).await? {
                println!("Organization set to {}", organization_id);
            } else {
                println!("Organization unchanged");
            }
            Ok(())
        }
    }
}

/// Outer error: the session could not be set up. Inner error: the session failed.
async fn run_submit(
    context: &CliContext,
    args: SubmitArgs,
) -> Result<Result<(), UploadError>> {
    let orchestrator = context.orchestrator()?;

    let mut file = ArtifactFile::from_path(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if let Some(content_type) = args.content_type {
        file = file.with_content_type(content_type);
    }

    let prefill = orchestrator.prefill().await;
    let form = BuildForm {
        version: args.version,
        label: args.label.unwrap_or(prefill.label),
        changelog: args.changelog,
        submitter_name: args.user.unwrap_or(prefill.submitter_name),
    };

    let session = Session {
        organization_id: context.organizations.current().await,
        form,
        file: Some(file),
        replace_previous: args.replace,
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<UploadProgress>();
    let printer = tokio::spawn(async move {
        let mut printer = ProgressPrinter::default();
        while let Some(progress) = rx.recv().await {
            if let Some(line) = printer.line(&progress) {
                eprintln!("{}", line);
            }
        }
    });

    let result = orchestrator.submit(session, &tx).await;
    drop(tx);
    if let Err(e) = printer.await {
        tracing::debug!(error = %e, "Progress printer stopped");
    }

    Ok(match result {
        Ok(done) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&done)?);
            } else {
                println!("{}", render_success(&done));
            }
            Ok(())
        }
        Err(err) => Err(err),
    })
}
