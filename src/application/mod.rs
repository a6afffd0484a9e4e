//! Application layer - Use cases and orchestration
//!
//! - Ports: interfaces to the outside world (generation API, storage, roster)
//! - DTOs: audit and run reports
//! - Services: prompt building, audit, cleanup and the batch orchestrator

pub mod dto;
pub mod ports;
pub mod services;
