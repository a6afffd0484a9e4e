//! Hero image generation - batch orchestration
//!
//! A run moves through `Initializing -> Scanning -> BatchLoop -> Finalizing ->
//! Done`, or ends in `Failed` when a step it cannot recover from goes wrong.
//! Heroes without an image are split into fixed-size batches. The tasks of a
//! batch run concurrently and each one settles into its own
//! [`GenerationOutcome`]; a failing task never affects its siblings. Outcomes
//! are merged into the run statistics only after the whole batch has settled,
//! then the service sleeps before starting the next batch.
//!
//! Heroes whose slugs collide would write the same file. Only the first of
//! them in roster order becomes a task; the others are skipped with a reason.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;

use crate::application::dto::{
    GenerationReport, GeneratorOptions, ReportSummary, GENERATION_REPORT_NAME,
};
use crate::application::ports::outbound::{
    ArtifactStoragePort, AuditError, ConfigurationError, GenerationError, GenerationRequest,
    ImageGenerationPort, RosterAuditPort, RosterError, RosterRepositoryPort, StorageError,
};
use crate::application::services::prompt_builder::build_prompt;
use crate::domain::entities::Roster;
use crate::domain::value_objects::{
    GenerationOutcome, GenerationTask, RunId, RunPhase, RunStatistics, StorageStats,
};

/// Errors that end a run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("failed to prepare directories: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("roster audit failed: {0}")]
    Audit(#[from] AuditError),
}

/// Errors inside a single task; always downgraded to a failed outcome
#[derive(Debug, thiserror::Error)]
enum TaskError {
    #[error("Failed to check for existing image: {0}")]
    Lookup(StorageError),
    #[error("Image generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("Failed to save image: {0}")]
    Save(StorageError),
}

/// Timestamped transcript of a run, mirrored to tracing
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Vec<String>,
    verbose: bool,
}

impl RunLog {
    pub fn new(verbose: bool) -> Self {
        Self {
            lines: Vec::new(),
            verbose,
        }
    }

    fn push(&mut self, message: &str) {
        self.lines
            .push(format!("[{}] {}", Utc::now().to_rfc3339(), message));
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::info!("{}", message);
        self.push(message);
    }

    pub fn warn(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::warn!("{}", message);
        self.push(message);
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::error!("{}", message);
        self.push(message);
    }

    /// Only kept in the transcript when running verbose
    pub fn detail(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        if self.verbose {
            tracing::info!("{}", message);
            self.push(message);
        } else {
            tracing::debug!("{}", message);
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// What a finished run hands back to the caller
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: RunId,
    pub phase: RunPhase,
    pub stats: RunStatistics,
    pub dry_run: bool,
    pub fatal_error: Option<String>,
    pub report_path: Option<PathBuf>,
    pub storage: Option<StorageStats>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.phase == RunPhase::Done && self.stats.failed == 0
    }

    pub fn render(&self) -> String {
        let stats = &self.stats;
        let mut out = String::new();
        out.push_str("HERO IMAGE GENERATION SUMMARY\n");
        out.push_str("=================================\n");
        out.push_str(&format!("Run ID: {}\n", self.run_id));
        out.push_str(&format!("Total Heroes: {}\n", stats.total_heroes));
        out.push_str(&format!("Missing Images: {}\n", stats.total_candidates));
        out.push_str(&format!("Successfully Generated: {}\n", stats.generated));
        out.push_str(&format!("Skipped: {}\n", stats.skipped));
        out.push_str(&format!("Failed: {}\n", stats.failed));
        if stats.total_candidates > 0 {
            out.push_str(&format!("Success Rate: {}%\n", stats.success_rate()));
        }

        if let Some(error) = &self.fatal_error {
            out.push_str(&format!("\nFATAL: {}\n", error));
        }

        if !stats.errors.is_empty() {
            out.push_str("\nERRORS:\n");
            for failure in &stats.errors {
                out.push_str(&format!("  {}: {}\n", failure.hero, failure.error));
            }
        }

        if let Some(storage) = &self.storage {
            out.push_str(&format!(
                "\nImage Storage: {} files, {} total\n",
                storage.count,
                storage.total_formatted()
            ));
        }

        if self.dry_run {
            out.push_str("\nDRY RUN MODE - No actual images were generated\n");
        }

        out
    }
}

struct RunContext {
    run_id: RunId,
    phase: RunPhase,
    stats: RunStatistics,
    log: RunLog,
}

impl RunContext {
    fn enter(&mut self, phase: RunPhase) {
        debug_assert!(!self.phase.is_terminal());
        tracing::debug!(run_id = %self.run_id, "phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}

/// Processes one task; holds only shared handles so it can be spawned
#[derive(Clone)]
struct TaskWorker {
    generator: Arc<dyn ImageGenerationPort>,
    storage: Arc<dyn ArtifactStoragePort>,
    dry_run: bool,
}

impl TaskWorker {
    async fn run(self, task: GenerationTask) -> GenerationOutcome {
        let hero_name = task.hero.name.clone();
        match self.try_run(task).await {
            Ok(outcome) => outcome,
            Err(e) => GenerationOutcome::Failed {
                hero_name,
                reason: e.to_string(),
            },
        }
    }

    async fn try_run(&self, task: GenerationTask) -> Result<GenerationOutcome, TaskError> {
        // The file name decides, whatever the roster says
        if self
            .storage
            .image_exists(&task.filename)
            .await
            .map_err(TaskError::Lookup)?
        {
            return Ok(GenerationOutcome::Skipped {
                hero_name: task.hero.name,
                reason: "Image already exists".to_string(),
            });
        }

        let prompt = build_prompt(&task.hero);
        tracing::debug!(
            slug = %task.slug,
            metadata = ?prompt.metadata,
            "Prompt for {}: {}...",
            task.hero.name,
            prompt.prompt.chars().take(200).collect::<String>()
        );

        if self.dry_run {
            return Ok(GenerationOutcome::Generated {
                hero_name: task.hero.name,
                image_path: task.image_path,
                simulated: true,
            });
        }

        let request = GenerationRequest {
            prompt: prompt.prompt,
            negative_prompt: prompt.negative_prompt,
            params: self.generator.params(),
        };
        let payload = self.generator.generate(&request).await?;
        let saved = self
            .storage
            .save_image(&payload, &task.filename)
            .await
            .map_err(TaskError::Save)?;
        tracing::info!("Saved {} ({} bytes)", saved.file_path.display(), saved.size);

        Ok(GenerationOutcome::Generated {
            hero_name: task.hero.name,
            image_path: task.image_path,
            simulated: false,
        })
    }
}

/// Orchestrates a generation run over the roster
pub struct ImageGenerationService {
    generator: Arc<dyn ImageGenerationPort>,
    storage: Arc<dyn ArtifactStoragePort>,
    roster: Arc<dyn RosterRepositoryPort>,
    audit: Arc<dyn RosterAuditPort>,
    options: GeneratorOptions,
}

impl ImageGenerationService {
    pub fn new(
        generator: Arc<dyn ImageGenerationPort>,
        storage: Arc<dyn ArtifactStoragePort>,
        roster: Arc<dyn RosterRepositoryPort>,
        audit: Arc<dyn RosterAuditPort>,
        options: GeneratorOptions,
    ) -> Self {
        Self {
            generator,
            storage,
            roster,
            audit,
            options,
        }
    }

    /// Run the whole pipeline. Never panics on task errors; fatal errors end
    /// in `RunPhase::Failed` and are reported in the summary.
    pub async fn run(&self) -> RunSummary {
        let mut ctx = RunContext {
            run_id: RunId::new(),
            phase: RunPhase::Idle,
            stats: RunStatistics::default(),
            log: RunLog::new(self.options.verbose),
        };

        let fatal_error = match self.execute(&mut ctx).await {
            Ok(()) => {
                ctx.enter(RunPhase::Done);
                ctx.log.info("Hero image generation completed successfully");
                None
            }
            Err(e) => {
                ctx.enter(RunPhase::Failed);
                ctx.log.error(format!("Fatal error: {}", e));
                Some(e.to_string())
            }
        };

        let report_path = self.write_report(&mut ctx, fatal_error.clone()).await;

        if ctx.phase == RunPhase::Done && !self.options.dry_run {
            let retention =
                Duration::from_secs(self.options.report_retention_days.saturating_mul(86_400));
            match self.storage.cleanup_old_reports(retention).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!("Cleaned up {} old debug files", removed),
                Err(e) => tracing::warn!("Failed to clean up old debug files: {}", e),
            }
        }

        let storage = match self.storage.storage_stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!("Failed to compute image storage usage: {}", e);
                None
            }
        };

        RunSummary {
            run_id: ctx.run_id,
            phase: ctx.phase,
            stats: ctx.stats,
            dry_run: self.options.dry_run,
            fatal_error,
            report_path,
            storage,
        }
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), RunError> {
        ctx.enter(RunPhase::Initializing);
        ctx.log.info(format!("Initializing hero image generator (run {})", ctx.run_id));
        self.generator.validate().await?;
        ctx.log.detail(format!("Generation parameters: {:?}", self.generator.params()));
        ctx.log.detail(format!("Options: {:?}", self.options));
        if !self.options.dry_run {
            self.storage.ensure_directories().await?;
        }
        ctx.log.info("Generator initialized successfully");

        ctx.enter(RunPhase::Scanning);
        ctx.log.info("Analyzing heroes database for missing images...");
        let mut roster = self.roster.load().await?;
        let audit = self.audit.audit(&roster.heroes).await?;

        // One task per target file
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut tasks = Vec::new();
        let mut shadowed = Vec::new();
        for missing in audit.heroes_without_images {
            let task = GenerationTask::new(missing.hero, self.options.output_format);
            if let Some(owner) = owners.get(&task.filename) {
                let reason = format!("Shares {} with {}", task.filename, owner);
                shadowed.push((task.hero.name, reason));
                continue;
            }
            owners.insert(task.filename.clone(), task.hero.name.clone());
            tasks.push(task);
        }

        ctx.stats = RunStatistics::new(roster.len(), tasks.len() + shadowed.len());
        ctx.log.info(format!("Found {} total heroes", roster.len()));
        ctx.log.info(format!("{} heroes need images", tasks.len() + shadowed.len()));
        for (hero_name, reason) in shadowed {
            ctx.log.warn(format!("Slug collision, skipping {}: {}", hero_name, reason));
            ctx.stats.record(&GenerationOutcome::Skipped { hero_name, reason });
        }

        ctx.enter(RunPhase::BatchLoop);
        let updates = if tasks.is_empty() {
            ctx.log.info("All heroes already have images!");
            Vec::new()
        } else {
            self.run_batches(ctx, &tasks).await
        };
        debug_assert!(ctx.stats.is_complete());

        ctx.enter(RunPhase::Finalizing);
        self.update_roster(ctx, &mut roster, updates).await?;
        Ok(())
    }

    /// Returns `(hero name, image path)` for every image actually written
    async fn run_batches(
        &self,
        ctx: &mut RunContext,
        tasks: &[GenerationTask],
    ) -> Vec<(String, String)> {
        let batch_size = self.options.batch_size.max(1);
        let total_batches = tasks.len().div_ceil(batch_size);
        let mut updates = Vec::new();

        ctx.log.info(format!(
            "Starting batch generation for {} heroes (batch size {})",
            tasks.len(),
            batch_size
        ));

        for (index, batch) in tasks.chunks(batch_size).enumerate() {
            ctx.log.info(format!(
                "Processing batch {}/{} ({} heroes)",
                index + 1,
                total_batches,
                batch.len()
            ));

            for outcome in self.process_batch(batch).await {
                ctx.stats.record(&outcome);
                match &outcome {
                    GenerationOutcome::Generated {
                        hero_name,
                        image_path,
                        simulated: true,
                    } => {
                        ctx.log.info(format!("[DRY RUN] Would generate {} -> {}", hero_name, image_path));
                    }
                    GenerationOutcome::Generated {
                        hero_name,
                        image_path,
                        simulated: false,
                    } => {
                        ctx.log.info(format!("Generated image for {}", hero_name));
                        updates.push((hero_name.clone(), image_path.clone()));
                    }
                    GenerationOutcome::Skipped { hero_name, reason } => {
                        ctx.log.info(format!("Skipping {}: {}", hero_name, reason));
                    }
                    GenerationOutcome::Failed { hero_name, reason } => {
                        ctx.log.error(format!(
                            "Failed to generate image for {}: {}",
                            hero_name, reason
                        ));
                    }
                }
            }
            ctx.stats.batches_completed += 1;
            debug_assert!(ctx.stats.is_consistent());

            if index + 1 < total_batches {
                ctx.log.info(format!(
                    "Waiting {}ms before next batch...",
                    self.options.delay_ms
                ));
                tokio::time::sleep(Duration::from_millis(self.options.delay_ms)).await;
            }
        }

        updates
    }

    /// Run every task of a batch concurrently and wait for all of them
    async fn process_batch(&self, batch: &[GenerationTask]) -> Vec<GenerationOutcome> {
        let worker = TaskWorker {
            generator: self.generator.clone(),
            storage: self.storage.clone(),
            dry_run: self.options.dry_run,
        };

        let handles = batch.iter().cloned().map(|task| {
            let worker = worker.clone();
            tokio::spawn(worker.run(task))
        });

        join_all(handles)
            .await
            .into_iter()
            .zip(batch)
            .map(|(joined, task)| match joined {
                Ok(outcome) => outcome,
                Err(e) => GenerationOutcome::Failed {
                    hero_name: task.hero.name.clone(),
                    reason: format!("task aborted: {}", e),
                },
            })
            .collect()
    }

    async fn update_roster(
        &self,
        ctx: &mut RunContext,
        roster: &mut Roster,
        updates: Vec<(String, String)>,
    ) -> Result<(), RunError> {
        if self.options.dry_run {
            ctx.log.info("[DRY RUN] Would update heroes.json with image paths");
            return Ok(());
        }
        if updates.is_empty() {
            return Ok(());
        }

        ctx.log.info("Updating heroes.json with generated image paths...");
        let mut updated = 0;
        for (name, image_path) in updates {
            if let Some(hero) = roster.find_mut(&name) {
                hero.image_path = Some(image_path);
                updated += 1;
            }
        }
        self.roster.save(roster).await?;
        ctx.log.info(format!("Updated {} hero records with image paths", updated));
        Ok(())
    }

    /// Best effort: a failure here is logged and does not change the outcome
    async fn write_report(&self, ctx: &mut RunContext, fatal_error: Option<String>) -> Option<PathBuf> {
        if self.options.dry_run {
            tracing::info!("[DRY RUN] Report not written");
            return None;
        }

        let report = GenerationReport {
            timestamp: Utc::now(),
            run_id: ctx.run_id,
            phase: ctx.phase,
            summary: ReportSummary::from(&ctx.stats),
            errors: ctx.stats.errors.clone(),
            logs: ctx.log.lines().to_vec(),
            options: self.options.clone(),
            fatal_error,
        };

        let value = match serde_json::to_value(&report) {
            Ok(value) => value,
            Err(e) => {
                ctx.log.error(format!("Failed to serialize report: {}", e));
                return None;
            }
        };

        match self.storage.save_report(GENERATION_REPORT_NAME, &value).await {
            Ok(path) => {
                tracing::info!("Debug output saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                ctx.log.error(format!("Failed to save debug output: {}", e));
                None
            }
        }
    }
}
