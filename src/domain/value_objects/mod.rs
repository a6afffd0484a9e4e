//! Value objects - Immutable objects defined by their attributes

mod generation;
mod ids;
mod image_format;
mod slug;
mod stored_image;

pub use generation::{FailureRecord, GenerationOutcome, GenerationTask, RunPhase, RunStatistics};
pub use ids::RunId;
pub use image_format::ImageFormat;
pub use slug::{slug_from_filename, slugify, HeroSlug, IMAGE_PATH_PREFIX};
pub use stored_image::{format_bytes, StorageStats, StoredImage};
