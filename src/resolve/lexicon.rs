//! Tokenization and synonym expansion for lexical scoring.
//!
//! Synonym clusters are data, not code: the default set preserves the
//! production calibration, and callers can supply their own clusters.

/// Lowercase alphanumeric tokens of length >= 2.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_string)
        .collect()
}

/// Fixed domain clusters used to expand near-synonyms before matching.
#[derive(Debug, Clone)]
pub struct SynonymLexicon {
    clusters: Vec<Vec<String>>,
}

impl Default for SynonymLexicon {
    fn default() -> Self {
        Self::new([
            vec!["meeting", "sync", "discussion", "standup"],
            vec!["call", "phone"],
            vec!["interview"],
            vec!["online", "remote"],
            vec!["in-person", "onsite"],
        ])
    }
}

impl SynonymLexicon {
    /// Build a lexicon from explicit clusters.
    pub fn new(clusters: impl IntoIterator<Item = Vec<&'static str>>) -> Self {
        Self {
            clusters: clusters
                .into_iter()
                .map(|c| c.into_iter().map(str::to_string).collect())
                .collect(),
        }
    }

    /// Build a lexicon from owned clusters (e.g. loaded from config).
    pub fn from_clusters(clusters: Vec<Vec<String>>) -> Self {
        Self { clusters }
    }

    /// The token itself plus every cluster mate, lowercased.
    pub fn expand(&self, token: &str) -> Vec<String> {
        let token = token.to_lowercase();
        let mut variants = vec![token.clone()];
        for cluster in &self.clusters {
            if cluster.iter().any(|c| c == &token) {
                for mate in cluster {
                    if mate != &token {
                        variants.push(mate.clone());
                    }
                }
            }
        }
        variants
    }

    /// Whether the token, or any synonym of it, occurs in the (already
    /// lowercased) haystack.
    pub fn matches(&self, token: &str, haystack_lower: &str) -> bool {
        self.expand(token)
            .iter()
            .any(|variant| haystack_lower.contains(variant.as_str()))
    }
}
