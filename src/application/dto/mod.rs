//! Data Transfer Objects - reports and options that cross the CLI and disk boundary

mod audit;
mod generation_report;

pub use audit::{
    AuditReport, AuditStats, DuplicateSet, FormatIssue, HeroImages, MissingHero, SlugCollision,
};
pub(crate) use audit::percent;
pub use generation_report::{
    GenerationReport, GeneratorOptions, ReportSummary, GENERATION_REPORT_NAME,
};
