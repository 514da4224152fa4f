use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use thyroscan::data::ScanRecord;
use thyroscan::inference::medical_explanation;
use thyroscan::{
    util, Backends, Config, Dashboard, Database, DiagnosisPayload, HttpInferenceClient,
    HttpReportRenderer, Identity, ImageUpload, LocalBlobStore, LocalSessionStore, ProfileStore,
    ScanStore, SessionStore, SubmissionMode, UserId, WorkflowEvent, WorkflowOutcome,
};

#[derive(Parser, Debug)]
#[command(name = "thyroscan")]
#[command(about = "Submit thyroid ultrasound scans for analysis and browse results")]
struct Cli {
    /// Data directory (defaults to ~/.thyroscan)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Identity to act as; scans are only saved when set
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze an image
    Scan {
        image: PathBuf,
        /// Show the staged process flow
        #[arg(long)]
        guided: bool,
    },
    /// List saved scans, newest first
    History,
    /// Delete a saved scan
    Delete { id: String },
    /// Analyze an image and save the PDF report
    Report { image: PathBuf },
    /// Check the analysis service
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir.clone());

    // Initialize logging to file (~/.thyroscan/logs/thyroscan.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let config = Config::load();

    if let Command::Health = cli.command {
        return health(&config).await;
    }

    let session = Arc::new(match &cli.user {
        Some(user) => LocalSessionStore::signed_in(Identity::new(UserId::from_string(user.as_str()))),
        None => LocalSessionStore::new(),
    });
    let dashboard = build_dashboard(&config, session.clone())?;
    dashboard.on_identity_changed(session.current()).await;

    match cli.command {
        Command::Scan { image, guided } => {
            let mode = if guided {
                SubmissionMode::Guided
            } else {
                SubmissionMode::Fast
            };
            scan(&dashboard, &image, mode).await?;
        }
        Command::History => {
            require_user(&dashboard)?;
            print_history(&dashboard.history().records());
        }
        Command::Delete { id } => {
            require_user(&dashboard)?;
            let id = Uuid::parse_str(&id).with_context(|| format!("invalid scan id: {id}"))?;
            dashboard.history().delete(id).await?;
            println!("Deleted {id}");
        }
        Command::Report { image } => {
            scan(&dashboard, &image, SubmissionMode::Fast).await?;
            let path = dashboard.export_latest_report().await?;
            println!("Report saved to {}", path.display());
        }
        Command::Health => {}
    }

    Ok(())
}

fn build_dashboard(config: &Config, session: Arc<LocalSessionStore>) -> Result<Dashboard> {
    let db = Database::open_default().context("failed to open database")?;
    let timeout = config.service.request_timeout;

    let backends = Backends {
        session,
        profiles: Arc::new(ProfileStore::new(db.clone())),
        scans: Arc::new(ScanStore::new(db)),
        blobs: Arc::new(LocalBlobStore::new(util::blobs_dir())),
        inference: Arc::new(HttpInferenceClient::new(&config.service.base_url, timeout)?),
        reports: Arc::new(HttpReportRenderer::new(&config.service.base_url, timeout)?),
    };
    Ok(Dashboard::new(backends, config))
}

fn require_user(dashboard: &Dashboard) -> Result<()> {
    if dashboard.identity().is_none() {
        bail!("this command needs --user <id>");
    }
    Ok(())
}

async fn read_image(path: &Path) -> Result<ImageUpload> {
    let upload = ImageUpload::from_path(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    if image::guess_format(upload.bytes()).is_err() {
        bail!("{} is not a supported image", path.display());
    }
    Ok(upload)
}

async fn scan(dashboard: &Dashboard, path: &Path, mode: SubmissionMode) -> Result<()> {
    let upload = read_image(path).await?;
    let workflow = dashboard.workflow();
    let mut events = workflow.events();

    let submit = workflow.submit(upload, mode, dashboard.identity());
    tokio::pin!(submit);
    let outcome = loop {
        tokio::select! {
            outcome = &mut submit => break outcome?,
            Ok(event) = events.recv() => print_event(&event),
        }
    };
    while let Ok(event) = events.try_recv() {
        print_event(&event);
    }

    match outcome {
        WorkflowOutcome::Completed {
            payload, record, ..
        } => {
            print_payload(dashboard, &payload);
            if let Some(record) = record {
                println!("Saved as {}", record.id);
            }
            Ok(())
        }
        WorkflowOutcome::Failed { message, .. } => bail!(message),
        WorkflowOutcome::Superseded { .. } => bail!("scan was superseded"),
    }
}

fn print_event(event: &WorkflowEvent) {
    match event {
        WorkflowEvent::StageChanged { stage, .. } => println!("[{}]", stage.display_name()),
        WorkflowEvent::PersistenceFailed { message, .. } => {
            eprintln!("warning: result was not saved: {message}")
        }
        WorkflowEvent::HistoryRefreshFailed { message, .. } => {
            eprintln!("warning: history was not refreshed: {message}")
        }
        WorkflowEvent::Superseded { .. } => {}
    }
}

fn print_payload(dashboard: &Dashboard, payload: &DiagnosisPayload) {
    println!("Result:         {}", payload.result);
    println!("Diagnosis:      {}", payload.diagnosis);
    println!("Confidence:     {}", payload.confidence);
    println!("Recommendation: {}", payload.recommendation);
    println!("Heatmap:        {}", dashboard.assets().resolve(&payload.heatmap_url));
    println!();
    println!("{}", medical_explanation(&payload.result));
}

fn print_history(records: &[ScanRecord]) {
    if records.is_empty() {
        println!("No scans yet");
        return;
    }
    for record in records {
        let when = record
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<16}  {:<10}  {:<12}  {}",
            record.id, when, record.diagnosis, record.subtype, record.confidence
        );
    }
}

async fn health(config: &Config) -> Result<()> {
    let client = HttpInferenceClient::new(&config.service.base_url, config.service.request_timeout)?;
    let health = client
        .health()
        .await
        .with_context(|| format!("analysis service at {} is unreachable", client.base_url()))?;
    println!(
        "{}: {} (model loaded: {})",
        client.base_url(),
        health.status,
        health.model_loaded
    );
    Ok(())
}
