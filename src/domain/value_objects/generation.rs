//! Value objects describing one image generation run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{HeroSlug, ImageFormat};
use crate::domain::entities::HeroRecord;

/// Lifecycle of a generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    Idle,
    Initializing,
    Scanning,
    BatchLoop,
    Finalizing,
    Done,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// One hero paired with the file it should end up in
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub hero: HeroRecord,
    pub slug: HeroSlug,
    pub filename: String,
    pub image_path: String,
}

impl GenerationTask {
    pub fn new(hero: HeroRecord, format: ImageFormat) -> Self {
        let slug = hero.slug();
        Self {
            filename: slug.filename(format),
            image_path: slug.image_path(format),
            slug,
            hero,
        }
    }
}

/// Result of a single task
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// Image produced (or simulated) and, unless simulated, saved
    Generated {
        hero_name: String,
        image_path: String,
        simulated: bool,
    },
    /// Nothing generated: the target file already existed, or another hero
    /// of this run owns the same file name
    Skipped { hero_name: String, reason: String },
    Failed { hero_name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub hero: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Counters for one run.
///
/// `generated + skipped + failed <= total_candidates` holds throughout a run
/// and becomes an equality once every candidate has been processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub total_heroes: usize,
    pub total_candidates: usize,
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub batches_completed: usize,
    pub errors: Vec<FailureRecord>,
}

impl RunStatistics {
    pub fn new(total_heroes: usize, total_candidates: usize) -> Self {
        Self {
            total_heroes,
            total_candidates,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &GenerationOutcome) {
        match outcome {
            GenerationOutcome::Generated { .. } => self.generated += 1,
            GenerationOutcome::Skipped { .. } => self.skipped += 1,
            GenerationOutcome::Failed { hero_name, reason } => {
                self.failed += 1;
                self.errors.push(FailureRecord {
                    hero: hero_name.clone(),
                    error: reason.clone(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    pub fn processed(&self) -> usize {
        self.generated + self.skipped + self.failed
    }

    pub fn is_consistent(&self) -> bool {
        self.processed() <= self.total_candidates
    }

    pub fn is_complete(&self) -> bool {
        self.processed() == self.total_candidates
    }

    /// Percentage of candidates that were generated, rounded
    pub fn success_rate(&self) -> u32 {
        if self.total_candidates == 0 {
            return 0;
        }
        ((self.generated as f64 / self.total_candidates as f64) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_derives_filename_from_name() {
        let task = GenerationTask::new(HeroRecord::new("Captain Bulldog"), ImageFormat::Png);
        assert_eq!(task.slug.as_str(), "captain-bulldog");
        assert_eq!(task.filename, "captain-bulldog.png");
        assert_eq!(task.image_path, "./images/captain-bulldog.png");
    }

    #[test]
    fn test_statistics_bookkeeping() {
        let mut stats = RunStatistics::new(10, 3);
        stats.record(&GenerationOutcome::Generated {
            hero_name: "A".into(),
            image_path: "./images/a.png".into(),
            simulated: false,
        });
        assert!(stats.is_consistent());
        assert!(!stats.is_complete());

        stats.record(&GenerationOutcome::Skipped {
            hero_name: "B".into(),
            reason: "exists".into(),
        });
        stats.record(&GenerationOutcome::Failed {
            hero_name: "C".into(),
            reason: "boom".into(),
        });

        assert!(stats.is_complete());
        assert_eq!(stats.errors.len(), 1);
        assert_eq!(stats.errors[0].hero, "C");
        assert_eq!(stats.success_rate(), 33);
    }

    #[test]
    fn test_success_rate_without_candidates() {
        assert_eq!(RunStatistics::new(5, 0).success_rate(), 0);
    }

    #[test]
    fn test_phase_terminal_states() {
        assert!(RunPhase::Done.is_terminal());
        assert!(RunPhase::Failed.is_terminal());
        assert!(!RunPhase::BatchLoop.is_terminal());
    }
}
