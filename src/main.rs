//! FunnelScope: funnel classification and topic clustering for customer questions
//!
//! This is the main entrypoint that orchestrates data loading, funnel-stage
//! classification, topic clustering, visualization and reporting.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use funnelscope::{
    cluster_topics, data, project_to_2d, viz, Args, BatchLabeler, LexiconClassifier, TextCleaner,
    TopicVectorizer, VectorizerConfig,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    args.validate()?;

    if args.verbose {
        println!("FunnelScope - Question Funnel & Topic Pipeline");
        println!("==============================================\n");
    }

    run_pipeline(&args)
}

fn run_pipeline(args: &Args) -> Result<()> {
    println!("=== Funnel Insight Pipeline ===\n");

    let start_time = Instant::now();

    // Step 1: Load and clean the question datasets
    if args.verbose {
        println!("Step 1: Loading and cleaning data");
        println!("  Input path: {}", args.input);
    }

    let data_start = Instant::now();
    let files = data::list_csv_files(Path::new(&args.input))?;
    let df = data::load_datasets(&files)?;
    let cleaner = TextCleaner::new()?;
    let mut set = data::prepare(df, &args.title_column, &cleaner)?;

    println!("✓ Data loaded: {} questions", set.len());
    if args.verbose {
        println!("  Files: {}", files.len());
        println!("  Processing time: {:.2}s", data_start.elapsed().as_secs_f64());
    }

    // Step 2: Batched funnel-stage classification
    if args.verbose {
        println!("\nStep 2: Funnel-stage classification");
        println!("  Batch size: {}", args.batch_size);
    }

    let label_start = Instant::now();
    let labeler = BatchLabeler::new(Box::new(LexiconClassifier::new()));
    let results = labeler.classify(&set.cleaned, args.batch_size)?;
    let labeled = results.iter().filter(|r| r.label.is_stage()).count();
    set.attach_labels(&results)?;

    println!(
        "✓ Funnel stages assigned: {labeled} labeled, {} sentinel",
        results.len() - labeled
    );
    if args.verbose {
        println!(
            "  Classification time: {:.2}s",
            label_start.elapsed().as_secs_f64()
        );
    }

    // Step 3: Vectorize and cluster topics
    if args.verbose {
        println!("\nStep 3: Topic clustering");
        println!("  Number of clusters: {}", args.clusters);
        println!("  Seed: {}", args.seed);
    }

    let cluster_start = Instant::now();
    let vectorizer = TopicVectorizer::new(VectorizerConfig::default());
    let space = vectorizer.build(&set.corpus())?;
    let model = cluster_topics(&space, args.clusters, args.max_iters, args.tolerance, args.seed)?;
    set.attach_clusters(&model.assignments)?;

    println!(
        "✓ Topics clustered: {} terms, inertia {:.2}",
        space.n_terms(),
        model.inertia
    );
    if args.verbose {
        println!(
            "  Clustering time: {:.2}s",
            cluster_start.elapsed().as_secs_f64()
        );
    }

    // Step 4: Project to 2D and render the report
    if args.verbose {
        println!("\nStep 4: Projection and visualization");
        println!("  Plot file: {}", args.plot);
    }

    let viz_start = Instant::now();
    let coords = project_to_2d(&space, args.seed)?;
    viz::generate_visualization_report(&set, &model, &coords, &args.plot)?;

    if args.verbose {
        println!(
            "  Visualization time: {:.2}s",
            viz_start.elapsed().as_secs_f64()
        );
    }

    // Step 5: Persist the enriched dataset
    set.write_csv(Path::new(&args.output))?;

    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    println!("Final dataset saved to: {}", args.output);
    println!("Scatter plot saved to: {}", args.plot);

    Ok(())
}
