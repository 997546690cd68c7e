//! Typed errors for the fatal stages of the pipeline

use thiserror::Error;

/// Errors raised by the vectorization, clustering and projection stages.
///
/// These are fatal for the run: a vector space with no vocabulary or an
/// impossible cluster count cannot produce meaningful topics, so the stage
/// aborts instead of emitting partial results. Recoverable per-batch problems
/// in the labeler are reported inline as sentinel labels, not through this
/// type.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot vectorize an empty document sequence")]
    NoDocuments,

    #[error(
        "no terms survived document-frequency filtering (min_df={min_df}, max_df={max_df}); \
         the corpus is too small or too uniform to cluster"
    )]
    EmptyVocabulary { min_df: usize, max_df: f64 },

    #[error("ngram_max must be at least 1, got {ngram_max}")]
    InvalidNgramRange { ngram_max: usize },

    #[error("vector space has no columns")]
    EmptyVectorSpace,

    #[error("invalid cluster count {k} for {n_rows} documents (must be in 1..={n_rows})")]
    InvalidClusterCount { k: usize, n_rows: usize },

    #[error("k-means clustering failed: {0}")]
    Clustering(String),
}
