//! Domain entities

mod hero;

pub use hero::{HeroRecord, Roster};
