//! FunnelScope: a Rust CLI pipeline for mining marketing-funnel insight from
//! customer questions
//!
//! This library ingests raw question datasets, cleans the text, classifies
//! each question into a marketing-funnel stage (TOFU/MOFU/BOFU) in batches,
//! and groups questions by topic with TF-IDF + K-Means, projecting the vector
//! space to 2D for visualization.

pub mod cli;
pub mod data;
pub mod error;
pub mod labeler;
pub mod model;
pub mod vectorize;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_datasets, QuestionSet, TextCleaner};
pub use error::PipelineError;
pub use labeler::{BatchLabeler, FunnelStage, Label, LabelResult, LexiconClassifier};
pub use model::{cluster_topics, project_to_2d, TopicModel};
pub use vectorize::{TopicVectorizer, VectorSpace, VectorizerConfig};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
