//! DuperHeroes image generator
//!
//! Finds roster heroes that have no portrait yet and generates one per hero
//! through Vertex AI, in rate-limited concurrent batches. Also audits the
//! roster against the image directory and cleans up duplicate formats.

mod application;
mod domain;
mod infrastructure;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::dto::{GenerationReport, GENERATION_REPORT_NAME};
use crate::application::ports::outbound::{
    ArtifactStoragePort, RosterAuditPort, RosterRepositoryPort,
};
use crate::application::services::duplicate_cleanup_service::DuplicateCleanupService;
use crate::application::services::image_generation_service::ImageGenerationService;
use crate::application::services::prompt_builder::{build_prompt, sample_hero};
use crate::application::services::roster_audit_service::render_audit_report;
use crate::domain::value_objects::ImageFormat;
use crate::infrastructure::audit::DirectoryRosterAudit;
use crate::infrastructure::config::{AppConfig, ConfigOverrides};
use crate::infrastructure::gcloud::GcloudCli;
use crate::infrastructure::persistence::JsonRosterRepository;
use crate::infrastructure::storage::LocalImageStorage;
use crate::infrastructure::vertex_ai::VertexAiClient;

const AUDIT_REPORT_NAME: &str = "image-audit.json";

#[derive(Parser)]
#[command(name = "duperheroes-imagegen", version, about = "Hero portrait generation pipeline")]
struct Cli {
    /// Debug logging and a detailed run transcript
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate images for heroes that do not have one
    Generate {
        /// Walk the whole pipeline without calling the API or writing files
        #[arg(long)]
        dry_run: bool,
        #[arg(long, value_name = "N", value_parser = parse_batch_size)]
        batch_size: Option<usize>,
        #[arg(long, value_enum, value_name = "F")]
        format: Option<ImageFormat>,
        /// Pause between batches
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,
    },
    /// Compare the roster against the images directory
    Audit {
        /// Also write the JSON report to this path
        #[arg(long, value_name = "PATH")]
        json: Option<PathBuf>,
        /// Exit non-zero when heroes lack images, images are orphaned or
        /// heroes share a slug
        #[arg(long)]
        strict: bool,
    },
    /// Remove duplicate images, keeping JPEG over JPG over PNG
    Cleanup {
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the prompt for a hero
    Prompt {
        #[arg(long, value_name = "NAME")]
        hero: Option<String>,
    },
    /// Print the last saved generation report
    Report,
}

fn parse_batch_size(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("batch size must be at least 1".to_string()),
        Ok(size) => Ok(size),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "duperheroes_imagegen=debug"
    } else {
        "duperheroes_imagegen=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = AppConfig::from_env().context("invalid configuration")?;

    match cli.command {
        Command::Generate {
            dry_run,
            batch_size,
            format,
            delay_ms,
        } => {
            config.apply(&ConfigOverrides {
                dry_run,
                verbose: cli.verbose,
                batch_size,
                format,
                delay_ms,
            })?;
            generate(config).await
        }
        Command::Audit { json, strict } => audit(&config, json, strict).await,
        Command::Cleanup { dry_run } => cleanup(&config, dry_run).await,
        Command::Prompt { hero } => prompt(&config, hero).await,
        Command::Report => report(&config).await,
    }
}

async fn generate(config: AppConfig) -> Result<ExitCode> {
    tracing::info!("Starting hero image generation");
    tracing::info!("  Roster: {}", config.paths.roster_path.display());
    tracing::info!("  Output: {}", config.paths.output_dir.display());
    if config.generator.dry_run {
        tracing::info!("DRY RUN MODE - No images will be generated");
    }

    let gcloud = Arc::new(GcloudCli::new(config.vertex.impersonate_service_account.clone()));
    let generator = VertexAiClient::new(
        config.vertex.clone(),
        config.image.clone(),
        gcloud.clone(),
        gcloud,
    )
    .context("failed to build HTTP client")?;

    let service = ImageGenerationService::new(
        Arc::new(generator),
        Arc::new(LocalImageStorage::new(
            &config.paths.output_dir,
            &config.paths.debug_dir,
        )),
        Arc::new(JsonRosterRepository::new(&config.paths.roster_path)),
        Arc::new(DirectoryRosterAudit::new(vec![config.paths.images_dir.clone()])),
        config.generator.clone(),
    );

    let summary = service.run().await;
    println!("{}", summary.render());
    if let Some(path) = &summary.report_path {
        println!("Report saved to {}", path.display());
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn audit(config: &AppConfig, json: Option<PathBuf>, strict: bool) -> Result<ExitCode> {
    let roster = JsonRosterRepository::new(&config.paths.roster_path)
        .load()
        .await?;
    let report = DirectoryRosterAudit::new(vec![config.paths.images_dir.clone()])
        .audit(&roster.heroes)
        .await?;
    println!("{}", render_audit_report(&report));

    let document = report.to_json();
    let storage = LocalImageStorage::new(&config.paths.images_dir, &config.paths.debug_dir);
    match storage.save_report(AUDIT_REPORT_NAME, &document).await {
        Ok(path) => tracing::info!("Audit report saved to {}", path.display()),
        Err(e) => tracing::warn!("Could not save audit report: {}", e),
    }

    if let Some(path) = json {
        let body = serde_json::to_string_pretty(&document)?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("JSON report written to {}", path.display());
    }

    Ok(if strict && report.stats.has_issues() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn cleanup(config: &AppConfig, dry_run: bool) -> Result<ExitCode> {
    let storage = Arc::new(LocalImageStorage::new(
        &config.paths.images_dir,
        &config.paths.debug_dir,
    ));
    let service = DuplicateCleanupService::new(storage);

    let plan = service.plan().await?;
    if plan.duplicates.is_empty() {
        println!("No duplicate files found.");
        return Ok(ExitCode::SUCCESS);
    }

    for group in &plan.duplicates {
        println!("{}: {}", group.base_name, group.files.join(", "));
    }
    for action in &plan.actions {
        println!("  remove {} - {}", action.file, action.reason);
    }

    let summary = service.execute(&plan, dry_run).await;
    println!("\n{}", summary.render());
    if dry_run {
        println!("DRY RUN MODE - No files were removed");
    }

    Ok(if summary.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn prompt(config: &AppConfig, hero: Option<String>) -> Result<ExitCode> {
    let hero = match hero {
        None => sample_hero(),
        Some(name) => {
            let roster = JsonRosterRepository::new(&config.paths.roster_path)
                .load()
                .await?;
            roster
                .heroes
                .into_iter()
                .find(|hero| hero.name.eq_ignore_ascii_case(name.trim()))
                .with_context(|| format!("hero '{}' not found in roster", name))?
        }
    };

    let rendered = build_prompt(&hero);
    println!("{}\n", rendered.prompt);
    println!("Negative prompt: {}", rendered.negative_prompt);
    println!(
        "Metadata: {}",
        serde_json::to_string_pretty(&rendered.metadata)?
    );
    Ok(ExitCode::SUCCESS)
}

async fn report(config: &AppConfig) -> Result<ExitCode> {
    let storage = LocalImageStorage::new(&config.paths.output_dir, &config.paths.debug_dir);
    let Some(document) = storage.load_report(GENERATION_REPORT_NAME).await? else {
        println!("No generation report found in {}", config.paths.debug_dir.display());
        return Ok(ExitCode::FAILURE);
    };

    let report: GenerationReport =
        serde_json::from_value(document).context("generation report has an unexpected shape")?;
    println!("{}", report.render());
    Ok(ExitCode::SUCCESS)
}
