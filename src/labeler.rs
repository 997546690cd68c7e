//! Batched funnel-stage classification
//!
//! Classifies cleaned question text into marketing-funnel stages with a
//! confidence score, processing the input in fixed-size batches. Batches with
//! no usable text and batches whose classifier call fails are reported inline
//! through sentinel labels instead of aborting the run.

use log::{error, warn};

/// The three ordered stages of the marketing conversion funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunnelStage {
    /// Top of funnel: awareness and learning questions
    Tofu,
    /// Middle of funnel: comparison and evaluation questions
    Mofu,
    /// Bottom of funnel: purchase, account and support questions
    Bofu,
}

impl FunnelStage {
    /// All stages in funnel order, top to bottom.
    pub const ALL: [FunnelStage; 3] = [FunnelStage::Tofu, FunnelStage::Mofu, FunnelStage::Bofu];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelStage::Tofu => "TOFU",
            FunnelStage::Mofu => "MOFU",
            FunnelStage::Bofu => "BOFU",
        }
    }
}

/// Label attached to one input record: a real funnel stage or a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Stage(FunnelStage),
    /// The input held no usable text
    Skipped,
    /// The classifier failed on the batch containing this input
    Error,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Stage(stage) => stage.as_str(),
            Label::Skipped => "skipped",
            Label::Error => "error",
        }
    }

    /// True for a real funnel stage, false for the sentinels.
    pub fn is_stage(&self) -> bool {
        matches!(self, Label::Stage(_))
    }
}

/// One classification result per input record, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelResult {
    pub label: Label,
    /// In [0, 1]; always 0.0 for sentinel labels
    pub confidence: f64,
}

impl LabelResult {
    fn skipped() -> Self {
        Self {
            label: Label::Skipped,
            confidence: 0.0,
        }
    }

    fn errored() -> Self {
        Self {
            label: Label::Error,
            confidence: 0.0,
        }
    }
}

/// Zero-shot classification capability.
///
/// Implementations score each text of a batch against the candidate labels and
/// return one ranked list per text, best first. Scores are expected in [0, 1];
/// ordering among equal scores is the provider's concern, not the pipeline's.
/// Implementations must be stateless per call so a provider instance can be
/// shared read-only across callers.
pub trait ZeroShotClassifier {
    fn classify(
        &self,
        batch: &[&str],
        candidate_labels: &[FunnelStage],
    ) -> crate::Result<Vec<Vec<(FunnelStage, f64)>>>;
}

/// Deterministic keyword-lexicon classifier.
///
/// Scores a question against each funnel stage by counting lexicon hits among
/// its words, then normalizes the scores to sum to one. A stand-in for a
/// heavyweight zero-shot model behind the same trait; ties are broken by
/// funnel order via a stable sort, which is a property of this provider only.
#[derive(Debug, Default, Clone)]
pub struct LexiconClassifier;

/// Awareness vocabulary: learning and how-to questions
const TOFU_TERMS: [&str; 12] = [
    "how", "what", "guide", "learn", "tutorial", "meaning", "definition", "example", "examples",
    "beginner", "introduction", "tips",
];

/// Evaluation vocabulary: comparisons and alternatives
const MOFU_TERMS: [&str; 12] = [
    "best", "vs", "versus", "compare", "comparison", "better", "alternative", "alternatives",
    "review", "reviews", "top", "which",
];

/// Decision vocabulary: purchase, account and support questions
const BOFU_TERMS: [&str; 16] = [
    "price", "pricing", "cost", "buy", "purchase", "discount", "trial", "demo", "cancel",
    "refund", "upgrade", "login", "password", "reset", "account", "support",
];

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    fn lexicon(stage: FunnelStage) -> &'static [&'static str] {
        match stage {
            FunnelStage::Tofu => &TOFU_TERMS,
            FunnelStage::Mofu => &MOFU_TERMS,
            FunnelStage::Bofu => &BOFU_TERMS,
        }
    }

    fn score(&self, text: &str, stage: FunnelStage) -> f64 {
        let lexicon = Self::lexicon(stage);
        let hits = text
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .filter(|w| lexicon.contains(&w.to_ascii_lowercase().as_str()))
            .count();
        // Additive smoothing keeps lexicon-free questions classifiable
        1.0 + hits as f64
    }
}

impl ZeroShotClassifier for LexiconClassifier {
    fn classify(
        &self,
        batch: &[&str],
        candidate_labels: &[FunnelStage],
    ) -> crate::Result<Vec<Vec<(FunnelStage, f64)>>> {
        let mut ranked = Vec::with_capacity(batch.len());
        for text in batch {
            let raw: Vec<(FunnelStage, f64)> = candidate_labels
                .iter()
                .map(|&stage| (stage, self.score(text, stage)))
                .collect();
            let total: f64 = raw.iter().map(|(_, s)| s).sum();
            let mut scored: Vec<(FunnelStage, f64)> =
                raw.into_iter().map(|(l, s)| (l, s / total)).collect();
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));
            ranked.push(scored);
        }
        Ok(ranked)
    }
}

/// Outcome of labeling one batch.
///
/// Makes the skip/error recovery paths explicit instead of scattering them
/// through the batching loop.
#[derive(Debug)]
enum BatchOutcome {
    /// One result per raw batch element, in batch position order
    Labeled(Vec<LabelResult>),
    /// The whole batch held no usable text
    Skipped(usize),
    /// The classifier call failed for the whole batch
    Errored(usize),
}

/// Classifies cleaned text into funnel stages in fixed-size batches.
pub struct BatchLabeler {
    classifier: Box<dyn ZeroShotClassifier>,
}

impl BatchLabeler {
    pub fn new(classifier: Box<dyn ZeroShotClassifier>) -> Self {
        Self { classifier }
    }

    /// Classify every input text, one `LabelResult` per input, in input order.
    ///
    /// Inputs that are `None` or whitespace-only receive the `skipped`
    /// sentinel. A classifier failure marks every element of the affected
    /// batch as `error` and processing continues with the next batch; neither
    /// case aborts the run. The output always has the same length as `texts`.
    pub fn classify(
        &self,
        texts: &[Option<String>],
        batch_size: usize,
    ) -> crate::Result<Vec<LabelResult>> {
        if batch_size == 0 {
            anyhow::bail!("batch size must be at least 1");
        }

        let mut results = Vec::with_capacity(texts.len());
        for (batch_idx, chunk) in texts.chunks(batch_size).enumerate() {
            match self.label_batch(chunk, batch_idx * batch_size) {
                BatchOutcome::Labeled(batch_results) => results.extend(batch_results),
                BatchOutcome::Skipped(len) => {
                    results.extend(std::iter::repeat(LabelResult::skipped()).take(len))
                }
                BatchOutcome::Errored(len) => {
                    results.extend(std::iter::repeat(LabelResult::errored()).take(len))
                }
            }
        }

        debug_assert_eq!(results.len(), texts.len());
        Ok(results)
    }

    fn label_batch(&self, chunk: &[Option<String>], offset: usize) -> BatchOutcome {
        // (position within chunk, text) for the usable elements
        let valid: Vec<(usize, &str)> = chunk
            .iter()
            .enumerate()
            .filter_map(|(pos, text)| {
                text.as_deref()
                    .filter(|t| !t.trim().is_empty())
                    .map(|t| (pos, t))
            })
            .collect();

        if valid.is_empty() {
            warn!("skipped empty batch at index {offset}");
            return BatchOutcome::Skipped(chunk.len());
        }

        let batch_texts: Vec<&str> = valid.iter().map(|&(_, t)| t).collect();
        let ranked = match self.classifier.classify(&batch_texts, &FunnelStage::ALL) {
            Ok(ranked) => ranked,
            Err(e) => {
                error!("zero-shot batch at index {offset} failed: {e}");
                return BatchOutcome::Errored(chunk.len());
            }
        };

        if ranked.len() != valid.len() || ranked.iter().any(|r| r.is_empty()) {
            error!(
                "classifier returned {} rankings for {} texts at index {offset}",
                ranked.len(),
                valid.len()
            );
            return BatchOutcome::Errored(chunk.len());
        }

        // Invalid elements inside a valid batch keep their position and get
        // the skipped sentinel, so output length always matches input length.
        let mut out = vec![LabelResult::skipped(); chunk.len()];
        for (&(pos, _), predictions) in valid.iter().zip(ranked.iter()) {
            let (stage, score) = predictions[0];
            out[pos] = LabelResult {
                label: Label::Stage(stage),
                confidence: score.clamp(0.0, 1.0),
            };
        }
        BatchOutcome::Labeled(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always predicts TOFU with fixed confidence
    struct StubClassifier;

    impl ZeroShotClassifier for StubClassifier {
        fn classify(
            &self,
            batch: &[&str],
            candidate_labels: &[FunnelStage],
        ) -> crate::Result<Vec<Vec<(FunnelStage, f64)>>> {
            Ok(batch
                .iter()
                .map(|_| {
                    candidate_labels
                        .iter()
                        .enumerate()
                        .map(|(i, &l)| (l, if i == 0 { 0.9 } else { 0.05 }))
                        .collect()
                })
                .collect())
        }
    }

    /// Always fails, simulating a broken model backend
    struct FailingClassifier;

    impl ZeroShotClassifier for FailingClassifier {
        fn classify(
            &self,
            _batch: &[&str],
            _candidate_labels: &[FunnelStage],
        ) -> crate::Result<Vec<Vec<(FunnelStage, f64)>>> {
            anyhow::bail!("model backend unavailable")
        }
    }

    fn texts(items: &[Option<&str>]) -> Vec<Option<String>> {
        items.iter().map(|t| t.map(str::to_string)).collect()
    }

    #[test]
    fn test_output_matches_input_length_and_order() {
        let labeler = BatchLabeler::new(Box::new(StubClassifier));
        let input = texts(&[
            Some("how to learn rust"),
            Some("best crm"),
            Some("pricing"),
            Some("what is tofu"),
            Some("cancel account"),
        ]);

        for batch_size in 1..=6 {
            let results = labeler.classify(&input, batch_size).unwrap();
            assert_eq!(results.len(), input.len());
            assert!(results
                .iter()
                .all(|r| r.label == Label::Stage(FunnelStage::Tofu)));
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let labeler = BatchLabeler::new(Box::new(StubClassifier));
        let results = labeler.classify(&[], 8).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let labeler = BatchLabeler::new(Box::new(StubClassifier));
        let result = labeler.classify(&texts(&[Some("hello")]), 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_wholly_invalid_batch_is_skipped() {
        let labeler = BatchLabeler::new(Box::new(StubClassifier));
        let input = texts(&[None, Some(""), Some("   ")]);

        let results = labeler.classify(&input, 3).unwrap();
        assert_eq!(results.len(), 3);
        for r in &results {
            assert_eq!(r.label, Label::Skipped);
            assert_eq!(r.confidence, 0.0);
        }
    }

    #[test]
    fn test_mixed_batch_keeps_positions() {
        let labeler = BatchLabeler::new(Box::new(StubClassifier));
        let input = texts(&[Some("how to reset"), None, Some("best crm"), Some(" ")]);

        let results = labeler.classify(&input, 4).unwrap();
        assert_eq!(results.len(), 4);
        assert!(results[0].label.is_stage());
        assert_eq!(results[1].label, Label::Skipped);
        assert!(results[2].label.is_stage());
        assert_eq!(results[3].label, Label::Skipped);
    }

    #[test]
    fn test_classifier_failure_marks_whole_batch() {
        let labeler = BatchLabeler::new(Box::new(FailingClassifier));
        let input = texts(&[Some("first"), Some("second"), Some("third")]);

        let results = labeler.classify(&input, 2).unwrap();
        assert_eq!(results.len(), 3);
        for r in &results {
            assert_eq!(r.label, Label::Error);
            assert_eq!(r.confidence, 0.0);
        }
    }

    #[test]
    fn test_failure_in_one_batch_does_not_poison_others() {
        /// Fails only when the batch contains the trigger word
        struct FlakyClassifier;

        impl ZeroShotClassifier for FlakyClassifier {
            fn classify(
                &self,
                batch: &[&str],
                candidate_labels: &[FunnelStage],
            ) -> crate::Result<Vec<Vec<(FunnelStage, f64)>>> {
                if batch.iter().any(|t| t.contains("boom")) {
                    anyhow::bail!("poison batch");
                }
                StubClassifier.classify(batch, candidate_labels)
            }
        }

        let labeler = BatchLabeler::new(Box::new(FlakyClassifier));
        let input = texts(&[Some("fine"), Some("also fine"), Some("boom"), Some("fine")]);

        let results = labeler.classify(&input, 2).unwrap();
        assert!(results[0].label.is_stage());
        assert!(results[1].label.is_stage());
        assert_eq!(results[2].label, Label::Error);
        assert_eq!(results[3].label, Label::Error);
    }

    #[test]
    fn test_lexicon_classifier_single_question() {
        let labeler = BatchLabeler::new(Box::new(LexiconClassifier::new()));
        let input = texts(&[Some("How do I reset my password?")]);

        let results = labeler.classify(&input, 1).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].label.is_stage());
        assert!(results[0].confidence >= 0.0 && results[0].confidence <= 1.0);
    }

    #[test]
    fn test_lexicon_scores_sum_to_one() {
        let ranked = LexiconClassifier::new()
            .classify(&["best crm vs competitor"], &FunnelStage::ALL)
            .unwrap();
        assert_eq!(ranked.len(), 1);
        let total: f64 = ranked[0].iter().map(|(_, s)| s).sum();
        assert!((total - 1.0).abs() < 1e-9);
        // "best", "vs" are evaluation vocabulary
        assert_eq!(ranked[0][0].0, FunnelStage::Mofu);
    }

    #[test]
    fn test_label_rendering() {
        assert_eq!(Label::Stage(FunnelStage::Tofu).as_str(), "TOFU");
        assert_eq!(Label::Stage(FunnelStage::Mofu).as_str(), "MOFU");
        assert_eq!(Label::Stage(FunnelStage::Bofu).as_str(), "BOFU");
        assert_eq!(Label::Skipped.as_str(), "skipped");
        assert_eq!(Label::Error.as_str(), "error");
    }
}
