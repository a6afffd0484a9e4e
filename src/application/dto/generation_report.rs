//! Report artifact written at the end of every generation run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    FailureRecord, ImageFormat, RunId, RunPhase, RunStatistics,
};

/// File name of the report inside the debug directory
pub const GENERATION_REPORT_NAME: &str = "image-generation.json";

/// Effective options of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorOptions {
    pub dry_run: bool,
    pub batch_size: usize,
    pub delay_ms: u64,
    pub verbose: bool,
    pub output_format: ImageFormat,
    pub report_retention_days: u64,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            batch_size: 5,
            delay_ms: 2000,
            verbose: false,
            output_format: ImageFormat::Png,
            report_retention_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_heroes: usize,
    pub missing_images: usize,
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub success_rate: u32,
}

impl From<&RunStatistics> for ReportSummary {
    fn from(stats: &RunStatistics) -> Self {
        Self {
            total_heroes: stats.total_heroes,
            missing_images: stats.total_candidates,
            generated: stats.generated,
            skipped: stats.skipped,
            failed: stats.failed,
            success_rate: stats.success_rate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub timestamp: DateTime<Utc>,
    pub run_id: RunId,
    pub phase: RunPhase,
    pub summary: ReportSummary,
    pub errors: Vec<FailureRecord>,
    pub logs: Vec<String>,
    pub options: GeneratorOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
}

impl GenerationReport {
    /// Short human-readable digest of a saved report
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Run {} at {}\n", self.run_id, self.timestamp.to_rfc3339()));
        out.push_str(&format!("Status: {:?}\n", self.phase));
        out.push_str(&format!("Total Heroes: {}\n", self.summary.total_heroes));
        out.push_str(&format!("Missing Images: {}\n", self.summary.missing_images));
        out.push_str(&format!("Generated: {}\n", self.summary.generated));
        out.push_str(&format!("Skipped: {}\n", self.summary.skipped));
        out.push_str(&format!("Failed: {}\n", self.summary.failed));
        out.push_str(&format!("Success Rate: {}%\n", self.summary.success_rate));
        if let Some(error) = &self.fatal_error {
            out.push_str(&format!("Fatal error: {}\n", error));
        }
        for failure in &self.errors {
            out.push_str(&format!("  {}: {}\n", failure.hero, failure.error));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_uses_camel_case_keys() {
        let mut stats = RunStatistics::new(4, 2);
        stats.generated = 1;
        stats.failed = 1;
        let report = GenerationReport {
            timestamp: Utc::now(),
            run_id: RunId::new(),
            phase: RunPhase::Done,
            summary: ReportSummary::from(&stats),
            errors: vec![],
            logs: vec!["[t] hello".to_string()],
            options: GeneratorOptions::default(),
            fatal_error: None,
        };

        let json = serde_json::to_value(&report).expect("serialization should succeed");
        assert_eq!(json["summary"]["missingImages"], 2);
        assert_eq!(json["summary"]["successRate"], 50);
        assert_eq!(json["options"]["batchSize"], 5);
        assert_eq!(json["options"]["outputFormat"], "png");
        assert_eq!(json["phase"], "done");
        assert!(json.get("fatalError").is_none());

        let back: GenerationReport =
            serde_json::from_value(json).expect("deserialization should succeed");
        assert!(back.render().contains("Success Rate: 50%"));
    }
}
