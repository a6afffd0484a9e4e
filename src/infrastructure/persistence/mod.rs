//! Roster persistence adapters

mod roster_repository;

pub use roster_repository::JsonRosterRepository;
