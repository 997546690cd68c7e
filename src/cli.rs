//! Command-line interface definitions and argument parsing

use clap::Parser;

/// Customer-question funnel classification and topic clustering
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input CSV file, or a directory whose *.csv files are concatenated
    #[arg(short, long, default_value = "data")]
    pub input: String,

    /// Path for the final dataset with derived columns
    #[arg(short, long, default_value = "questions_final.csv")]
    pub output: String,

    /// Output path for the cluster scatter plot
    #[arg(long, default_value = "cluster_scatter.png")]
    pub plot: String,

    /// Name of the column holding the question text
    #[arg(long, default_value = "title")]
    pub title_column: String,

    /// Number of topic clusters for K-Means
    #[arg(short = 'k', long, default_value = "3")]
    pub clusters: usize,

    /// Batch size for funnel-stage classification
    #[arg(short, long, default_value = "8")]
    pub batch_size: usize,

    /// Random seed shared by clustering and projection
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Maximum iterations for K-Means convergence
    #[arg(long, default_value = "300")]
    pub max_iters: usize,

    /// Tolerance for K-Means convergence
    #[arg(long, default_value = "1e-4")]
    pub tolerance: f64,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Reject argument combinations no pipeline stage can work with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.clusters < 1 {
            anyhow::bail!("--clusters must be at least 1");
        }
        if self.batch_size < 1 {
            anyhow::bail!("--batch-size must be at least 1");
        }
        if self.tolerance <= 0.0 {
            anyhow::bail!("--tolerance must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            input: "data".to_string(),
            output: "out.csv".to_string(),
            plot: "plot.png".to_string(),
            title_column: "title".to_string(),
            clusters: 3,
            batch_size: 8,
            seed: 42,
            max_iters: 300,
            tolerance: 1e-4,
            verbose: false,
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(base_args().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut args = base_args();
        args.clusters = 0;
        assert!(args.validate().is_err());

        let mut args = base_args();
        args.batch_size = 0;
        assert!(args.validate().is_err());

        let mut args = base_args();
        args.tolerance = 0.0;
        assert!(args.validate().is_err());
    }
}
