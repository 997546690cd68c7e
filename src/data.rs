//! Dataset loading, text cleaning and derived-column management using Polars

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{error, info};
use ndarray::Array1;
use polars::prelude::*;
use regex::Regex;

use crate::labeler::LabelResult;

/// Column holding the search keyword that surfaced the question, if the
/// source data carries one.
const KEYWORD_COLUMN: &str = "keyword";

/// Leading words that mark a text as a question.
const QUESTION_STARTERS: [&str; 22] = [
    "what", "why", "how", "where", "when", "who", "whom", "which", "is", "are", "am", "can",
    "could", "do", "does", "did", "will", "would", "shall", "should", "may", "might",
];

/// Regex-based text normalizer.
///
/// Applies the cleaning rules the rest of the pipeline assumes: lowercase,
/// ASCII only, alphanumeric words, single spaces, trimmed.
#[derive(Debug)]
pub struct TextCleaner {
    symbols: Regex,
    spaces: Regex,
}

impl TextCleaner {
    pub fn new() -> crate::Result<Self> {
        Ok(Self {
            symbols: Regex::new(r"[^a-z0-9\s]")?,
            spaces: Regex::new(r"\s+")?,
        })
    }

    /// Clean one raw text value.
    ///
    /// Lowercases, drops non-ASCII characters, strips punctuation and
    /// symbols, collapses whitespace runs and trims the ends.
    pub fn clean(&self, raw: &str) -> String {
        let lower = raw.to_lowercase();
        let ascii: String = lower.chars().filter(char::is_ascii).collect();
        let stripped = self.symbols.replace_all(&ascii, "");
        let collapsed = self.spaces.replace_all(&stripped, " ");
        collapsed.trim().to_string()
    }
}

/// Whether a text looks like a question: it ends with `?` or starts with a
/// known interrogative word.
pub fn is_question(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.ends_with('?') {
        return true;
    }
    match trimmed.split_whitespace().next() {
        Some(first) => QUESTION_STARTERS.contains(&first.to_lowercase().as_str()),
        None => false,
    }
}

/// Categorize a question by its leading keyword.
pub fn question_type(text: &str) -> &'static str {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return "other";
    }

    match lowered.split_whitespace().next() {
        Some("how") => return "instructional",
        Some("why") => return "reasoning",
        Some("what") => return "informational",
        Some("when") => return "temporal",
        Some("where") => return "locational",
        Some("who") | Some("whom") => return "personal",
        Some(
            "is" | "are" | "was" | "were" | "do" | "does" | "did" | "can" | "could" | "will"
            | "would" | "should" | "am" | "have" | "has",
        ) => return "boolean",
        _ => {}
    }

    let comparative = ["which", "better", "best", "vs"];
    if lowered.split_whitespace().any(|w| comparative.contains(&w)) {
        return "comparative";
    }

    "other"
}

/// List the CSV files to ingest: the path itself if it is a file, otherwise
/// every `*.csv` directly inside the directory, in name order.
pub fn list_csv_files(input: &Path) -> crate::Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(input)
        .with_context(|| format!("cannot read input directory {}", input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().map(|ext| ext == "csv").unwrap_or(false))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("no CSV files found under {}", input.display());
    }
    Ok(files)
}

/// Load every CSV and vertically concatenate the frames.
///
/// Files that fail to read are logged and skipped; loading fails only when no
/// file could be read at all.
pub fn load_datasets(paths: &[PathBuf]) -> crate::Result<DataFrame> {
    let mut combined: Option<DataFrame> = None;

    for path in paths {
        let loaded = CsvReader::from_path(path.clone()).and_then(|r| r.has_header(true).finish());
        match loaded {
            Ok(df) => {
                info!("loaded {} rows from {}", df.height(), path.display());
                combined = Some(match combined {
                    Some(acc) => acc.vstack(&df)?,
                    None => df,
                });
            }
            Err(e) => {
                error!("error reading {}: {e}", path.display());
            }
        }
    }

    combined.ok_or_else(|| anyhow::anyhow!("none of the input files could be loaded"))
}

/// The record set: the source frame plus the cleaned title column the core
/// pipeline consumes, and the derived columns it appends.
#[derive(Debug)]
pub struct QuestionSet {
    pub df: DataFrame,
    /// Cleaned title per row, `None` when the source value was null or
    /// cleaned down to nothing
    pub cleaned: Vec<Option<String>>,
}

/// Clean the title column and append `title_cleaned` and `question_type`.
pub fn prepare(
    mut df: DataFrame,
    title_column: &str,
    cleaner: &TextCleaner,
) -> crate::Result<QuestionSet> {
    let cleaned: Vec<Option<String>> = {
        let titles = df
            .column(title_column)
            .with_context(|| format!("input data has no '{title_column}' column"))?
            .utf8()
            .with_context(|| format!("'{title_column}' column is not text"))?;
        titles
            .into_iter()
            .map(|t| t.map(|s| cleaner.clean(s)).filter(|s| !s.is_empty()))
            .collect()
    };

    let cleaned_column: Vec<String> = cleaned
        .iter()
        .map(|c| c.clone().unwrap_or_default())
        .collect();
    let types: Vec<&str> = cleaned
        .iter()
        .map(|c| match c.as_deref() {
            Some(text) if is_question(text) => question_type(text),
            _ => "other",
        })
        .collect();

    df.with_column(Series::new("title_cleaned", cleaned_column))?;
    df.with_column(Series::new("question_type", types))?;

    // Search keywords, when present, get the same normalization as titles
    if df.column(KEYWORD_COLUMN).is_ok() {
        let keywords_cleaned: Vec<String> = {
            let keywords = df
                .column(KEYWORD_COLUMN)?
                .utf8()
                .with_context(|| format!("'{KEYWORD_COLUMN}' column is not text"))?;
            keywords
                .into_iter()
                .map(|k| k.map(|s| cleaner.clean(s)).unwrap_or_default())
                .collect()
        };
        df.with_column(Series::new("keyword_cleaned", keywords_cleaned))?;
    }

    Ok(QuestionSet { df, cleaned })
}

impl QuestionSet {
    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Cleaned texts as plain strings for vectorization; null rows become
    /// empty documents so row order and count are preserved.
    pub fn corpus(&self) -> Vec<&str> {
        self.cleaned
            .iter()
            .map(|c| c.as_deref().unwrap_or(""))
            .collect()
    }

    /// Append the `funnel_stage` and `confidence` columns.
    pub fn attach_labels(&mut self, results: &[LabelResult]) -> crate::Result<()> {
        if results.len() != self.len() {
            anyhow::bail!(
                "got {} label results for {} records",
                results.len(),
                self.len()
            );
        }
        let stages: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        let confidence: Vec<f64> = results.iter().map(|r| r.confidence).collect();
        self.df.with_column(Series::new("funnel_stage", stages))?;
        self.df.with_column(Series::new("confidence", confidence))?;
        Ok(())
    }

    /// Append the `text_cluster` column.
    pub fn attach_clusters(&mut self, assignments: &Array1<usize>) -> crate::Result<()> {
        if assignments.len() != self.len() {
            anyhow::bail!(
                "got {} cluster assignments for {} records",
                assignments.len(),
                self.len()
            );
        }
        let clusters: Vec<i64> = assignments.iter().map(|&c| c as i64).collect();
        self.df.with_column(Series::new("text_cluster", clusters))?;
        Ok(())
    }

    /// Write the full record set, source and derived columns, as CSV.
    pub fn write_csv(&mut self, path: &Path) -> crate::Result<()> {
        let mut file = File::create(path)
            .with_context(|| format!("cannot create output file {}", path.display()))?;
        CsvWriter::new(&mut file).finish(&mut self.df)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeler::{Label, LabelResult};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "title,keyword").unwrap();
        writeln!(file, "How do I reset my password?,Password Reset!").unwrap();
        writeln!(file, "Best CRM vs competitor??,CRM comparison").unwrap();
        writeln!(file, ",missing title").unwrap();
        writeln!(file, "!!!,symbols only").unwrap();
        file
    }

    #[test]
    fn test_cleaner_rules() {
        let cleaner = TextCleaner::new().unwrap();
        assert_eq!(cleaner.clean(" Hello!! "), "hello");
        assert_eq!(cleaner.clean("Tést🔥Data"), "tstdata");
        assert_eq!(cleaner.clean("How   do I\treset?"), "how do i reset");
        assert_eq!(cleaner.clean("???"), "");
    }

    #[test]
    fn test_is_question() {
        assert!(is_question("how do i reset my password"));
        assert!(is_question("Something unusual?"));
        assert!(is_question("which plan fits"));
        assert!(is_question("am i eligible for a refund"));
        assert!(!is_question("the quick brown fox"));
        assert!(!is_question("   "));
    }

    #[test]
    fn test_question_type_rules() {
        assert_eq!(question_type("how do i reset"), "instructional");
        assert_eq!(question_type("why is this slow"), "reasoning");
        assert_eq!(question_type("what is tofu"), "informational");
        assert_eq!(question_type("when does billing start"), "temporal");
        assert_eq!(question_type("where is the dashboard"), "locational");
        assert_eq!(question_type("who owns this account"), "personal");
        assert_eq!(question_type("can i export data"), "boolean");
        assert_eq!(question_type("crm best option"), "comparative");
        assert_eq!(question_type("plain statement"), "other");
        assert_eq!(question_type(""), "other");
    }

    #[test]
    fn test_load_and_prepare() {
        let file = create_test_csv();
        let df = load_datasets(&[file.path().to_path_buf()]).unwrap();
        assert_eq!(df.height(), 4);

        let cleaner = TextCleaner::new().unwrap();
        let set = prepare(df, "title", &cleaner).unwrap();

        assert_eq!(set.len(), 4);
        assert_eq!(
            set.cleaned[0].as_deref(),
            Some("how do i reset my password")
        );
        assert_eq!(set.cleaned[2], None); // null title
        assert_eq!(set.cleaned[3], None); // symbols clean down to nothing
        assert!(set.df.column("title_cleaned").is_ok());
        assert!(set.df.column("question_type").is_ok());
    }

    #[test]
    fn test_prepare_cleans_keyword_column() {
        let file = create_test_csv();
        let df = load_datasets(&[file.path().to_path_buf()]).unwrap();
        let cleaner = TextCleaner::new().unwrap();
        let set = prepare(df, "title", &cleaner).unwrap();

        let keywords = set.df.column("keyword_cleaned").unwrap();
        let keywords = keywords.utf8().unwrap();
        assert_eq!(keywords.get(0), Some("password reset"));
        assert_eq!(keywords.get(1), Some("crm comparison"));
    }

    #[test]
    fn test_prepare_without_keyword_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "title").unwrap();
        writeln!(file, "How do I reset my password?").unwrap();

        let df = load_datasets(&[file.path().to_path_buf()]).unwrap();
        let cleaner = TextCleaner::new().unwrap();
        let set = prepare(df, "title", &cleaner).unwrap();
        assert!(set.df.column("keyword_cleaned").is_err());
    }

    #[test]
    fn test_load_skips_unreadable_files() {
        let file = create_test_csv();
        let paths = vec![
            PathBuf::from("does_not_exist.csv"),
            file.path().to_path_buf(),
        ];
        let df = load_datasets(&paths).unwrap();
        assert_eq!(df.height(), 4);
    }

    #[test]
    fn test_load_fails_when_nothing_loads() {
        let paths = vec![PathBuf::from("does_not_exist.csv")];
        assert!(load_datasets(&paths).is_err());
    }

    #[test]
    fn test_attach_labels_checks_length() {
        let file = create_test_csv();
        let df = load_datasets(&[file.path().to_path_buf()]).unwrap();
        let cleaner = TextCleaner::new().unwrap();
        let mut set = prepare(df, "title", &cleaner).unwrap();

        let one = vec![LabelResult {
            label: Label::Skipped,
            confidence: 0.0,
        }];
        assert!(set.attach_labels(&one).is_err());

        let four = vec![
            LabelResult {
                label: Label::Skipped,
                confidence: 0.0,
            };
            4
        ];
        set.attach_labels(&four).unwrap();
        assert!(set.df.column("funnel_stage").is_ok());
        assert!(set.df.column("confidence").is_ok());
    }

    #[test]
    fn test_attach_clusters_and_write() {
        let file = create_test_csv();
        let df = load_datasets(&[file.path().to_path_buf()]).unwrap();
        let cleaner = TextCleaner::new().unwrap();
        let mut set = prepare(df, "title", &cleaner).unwrap();

        let assignments = Array1::from(vec![0usize, 1, 0, 1]);
        set.attach_clusters(&assignments).unwrap();

        let out = NamedTempFile::new().unwrap();
        set.write_csv(out.path()).unwrap();
        let written = load_datasets(&[out.path().to_path_buf()]).unwrap();
        assert_eq!(written.height(), 4);
        assert!(written.column("text_cluster").is_ok());
    }
}
