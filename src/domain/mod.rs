//! Domain layer - Core pipeline types with no I/O
//!
//! This layer contains:
//! - Entities: the hero roster
//! - Value Objects: slugs, image formats, run statistics and outcomes

pub mod entities;
pub mod value_objects;
