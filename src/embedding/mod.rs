//! Embedding collaborators for semantic scoring.
//!
//! The scorer compares the utterance against each candidate's combined
//! title/notes/location text using cosine similarity over vectors from an
//! [`EmbeddingProvider`]. [`ApiEmbeddingProvider`] talks to any
//! OpenAI-compatible endpoint. The provider is optional: without one, or
//! whenever it fails, scoring degrades to lexical signals only.

mod api;
mod traits;

pub use api::ApiEmbeddingProvider;
pub use traits::EmbeddingProvider;

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-magnitude inputs so a bad
/// vector never poisons a score.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}
