//! Application services - Use case implementations

pub mod duplicate_cleanup_service;
pub mod image_generation_service;
pub mod prompt_builder;
pub mod roster_audit_service;
