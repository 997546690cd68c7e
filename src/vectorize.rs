//! TF-IDF vectorization of cleaned question text
//!
//! Builds a weighted document-term matrix from unigrams and bigrams, with
//! English stopword removal and document-frequency filtering. The vocabulary
//! is recomputed from the exact input set on every call.

use std::collections::{BTreeMap, HashMap, HashSet};

use ndarray::Array2;

use crate::error::PipelineError;

/// Document-frequency and n-gram settings for vectorization.
#[derive(Debug, Clone, Copy)]
pub struct VectorizerConfig {
    /// Exclude terms appearing in fewer than this many documents
    pub min_df: usize,
    /// Exclude terms appearing in more than this fraction of documents
    pub max_df: f64,
    /// Longest n-gram to emit; 2 gives unigrams and bigrams. Must be at
    /// least 1; `build` rejects a zero rather than reinterpreting it.
    pub ngram_max: usize,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            min_df: 3,
            max_df: 0.8,
            ngram_max: 2,
        }
    }
}

/// Weighted document-term matrix for one pipeline run.
///
/// Rows correspond to the input texts in input order; columns to the
/// vocabulary terms in alphabetical order. Immutable after construction and
/// shared read-only by the clustering and projection stages.
#[derive(Debug)]
pub struct VectorSpace {
    /// TF-IDF weights, shape (documents, terms), rows L2-normalized
    pub matrix: Array2<f64>,
    /// Vocabulary terms, one per column
    pub terms: Vec<String>,
}

impl VectorSpace {
    pub fn n_docs(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_terms(&self) -> usize {
        self.matrix.ncols()
    }
}

/// Converts cleaned text into a TF-IDF vector space.
#[derive(Debug, Clone)]
pub struct TopicVectorizer {
    config: VectorizerConfig,
    stop_words: HashSet<&'static str>,
}

impl TopicVectorizer {
    pub fn new(config: VectorizerConfig) -> Self {
        Self {
            config,
            stop_words: english_stop_words(),
        }
    }

    /// Split a cleaned text into lowercase word tokens, drop stopwords, then
    /// emit all n-grams up to the configured length.
    fn tokenize(&self, text: &str) -> Vec<String> {
        let words: Vec<String> = text
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|w| !self.stop_words.contains(w.as_str()))
            .collect();

        let mut terms = Vec::with_capacity(words.len() * self.config.ngram_max);
        for n in 1..=self.config.ngram_max {
            if words.len() < n {
                break;
            }
            for window in words.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Build the vector space for `texts`, one row per text in input order.
    ///
    /// The vocabulary is whatever survives the `min_df`/`max_df` filter on
    /// this exact corpus. An empty surviving vocabulary is a hard error:
    /// clustering a zero-column space would produce meaningless topics.
    pub fn build<S: AsRef<str>>(&self, texts: &[S]) -> Result<VectorSpace, PipelineError> {
        if self.config.ngram_max == 0 {
            return Err(PipelineError::InvalidNgramRange {
                ngram_max: self.config.ngram_max,
            });
        }
        if texts.is_empty() {
            return Err(PipelineError::NoDocuments);
        }

        let tokenized: Vec<Vec<String>> = texts.iter().map(|t| self.tokenize(t.as_ref())).collect();
        let n_docs = tokenized.len();

        // Document frequency per term; BTreeMap keeps the vocabulary sorted
        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in &tokenized {
            let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let max_df_count = self.config.max_df * n_docs as f64;
        let surviving: Vec<(&str, usize)> = doc_freq
            .into_iter()
            .filter(|&(_, df)| df >= self.config.min_df && (df as f64) <= max_df_count)
            .collect();

        if surviving.is_empty() {
            return Err(PipelineError::EmptyVocabulary {
                min_df: self.config.min_df,
                max_df: self.config.max_df,
            });
        }

        let vocabulary: HashMap<&str, usize> = surviving
            .iter()
            .enumerate()
            .map(|(idx, &(term, _))| (term, idx))
            .collect();
        let idf: Vec<f64> = surviving
            .iter()
            .map(|&(_, df)| (((1 + n_docs) as f64) / ((1 + df) as f64)).ln() + 1.0)
            .collect();

        let mut matrix = Array2::zeros((n_docs, surviving.len()));
        for (doc_idx, doc) in tokenized.iter().enumerate() {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for term in doc {
                *counts.entry(term.as_str()).or_insert(0) += 1;
            }
            for (term, count) in counts {
                if let Some(&term_idx) = vocabulary.get(term) {
                    matrix[[doc_idx, term_idx]] = count as f64 * idf[term_idx];
                }
            }

            // L2-normalize the row; all-zero rows (no surviving terms) stay zero
            let norm = matrix.row(doc_idx).dot(&matrix.row(doc_idx)).sqrt();
            if norm > 0.0 {
                matrix.row_mut(doc_idx).mapv_inplace(|x| x / norm);
            }
        }

        let terms = surviving.iter().map(|&(term, _)| term.to_string()).collect();
        Ok(VectorSpace { matrix, terms })
    }
}

impl Default for TopicVectorizer {
    fn default() -> Self {
        Self::new(VectorizerConfig::default())
    }
}

/// English stopword list applied before n-gram generation.
fn english_stop_words() -> HashSet<&'static str> {
    [
        // Articles
        "a", "an", "the",
        // Pronouns
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "this", "that",
        "these", "those",
        // Verbs
        "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
        "do", "does", "did", "doing", "would", "should", "could", "ought", "might", "must",
        "shall", "will", "can", "may",
        // Prepositions
        "at", "by", "for", "from", "in", "into", "of", "on", "to", "with", "about", "against",
        "between", "during", "before", "after", "above", "below", "up", "down", "out", "off",
        "over", "under", "again", "further", "then", "once",
        // Conjunctions
        "and", "but", "or", "nor", "so", "yet", "both", "either", "neither", "not", "only",
        "than", "when", "where", "while", "if", "because", "as", "until", "although",
        // Other common words
        "here", "there", "all", "each", "few", "more", "most", "other", "some", "such", "no",
        "any", "own", "same", "too", "very", "just", "also", "now", "how", "why", "well",
    ]
    .into_iter()
    .collect()
}
