//! Configuration loading and validation.

mod settings;

pub use settings::{ApiEmbeddingConfig, Config, EmbeddingConfig, ResolutionConfig};
