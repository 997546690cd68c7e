//! Visualization and insight reporting using Plotters

use std::collections::BTreeMap;

use ndarray::Array2;
use plotters::prelude::*;

use crate::data::QuestionSet;
use crate::model::TopicModel;

/// Color palette for different clusters
static CLUSTER_COLORS: [RGBColor; 5] = [RED, BLUE, GREEN, YELLOW, MAGENTA];

fn cluster_color(cluster: usize) -> &'static RGBColor {
    CLUSTER_COLORS.get(cluster).unwrap_or(&BLACK)
}

/// Create a 2D scatter plot of the SVD projection, colored by cluster.
///
/// The coordinates come from the projection stage, not from the cluster
/// centroids; the two live in different spaces, so no centroid markers are
/// drawn.
pub fn create_cluster_scatter(
    coords: &Array2<f64>,
    model: &TopicModel,
    output_path: &str,
    plot_title: Option<&str>,
) -> crate::Result<()> {
    if coords.nrows() == 0 {
        anyhow::bail!("nothing to plot: projection has no rows");
    }
    let title = plot_title.unwrap_or("Topic Clusters (2D SVD projection)");

    let xs: Vec<f64> = coords.column(0).to_vec();
    let ys: Vec<f64> = coords.column(1).to_vec();

    // Plot bounds with some padding
    let x_min = xs.iter().fold(f64::INFINITY, |a, &b| a.min(b)) - 0.1;
    let x_max = xs.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)) + 0.1;
    let y_min = ys.iter().fold(f64::INFINITY, |a, &b| a.min(b)) - 0.1;
    let y_max = ys.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)) + 0.1;

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Component 1")
        .y_desc("Component 2")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (i, (&x, &y)) in xs.iter().zip(ys.iter()).enumerate() {
        let color = cluster_color(model.assignments[i]);
        chart.draw_series(std::iter::once(Circle::new((x, y), 4, color.filled())))?;
    }

    root.present()?;
    println!("Cluster scatter saved to: {output_path}");

    Ok(())
}

/// Create a bar chart of cluster sizes.
pub fn create_cluster_size_chart(model: &TopicModel, output_path: &str) -> crate::Result<()> {
    let cluster_sizes = model.cluster_sizes();
    let max_size = *cluster_sizes.iter().max().unwrap_or(&1) as f64;

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Cluster Sizes", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..(model.n_clusters as f64), 0f64..(max_size * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Cluster ID")
        .y_desc("Number of Questions")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (cluster_id, &size) in cluster_sizes.iter().enumerate() {
        chart.draw_series(std::iter::once(Rectangle::new(
            [
                (cluster_id as f64 - 0.4, 0.0),
                (cluster_id as f64 + 0.4, size as f64),
            ],
            cluster_color(cluster_id).filled(),
        )))?;
    }

    root.present()?;
    println!("Cluster size chart saved to: {output_path}");

    Ok(())
}

/// Create a histogram of classification confidence scores.
///
/// Sentinel rows carry confidence 0.0 and land in the first bin, which makes
/// skip/error volume visible at a glance.
pub fn create_confidence_histogram(set: &QuestionSet, output_path: &str) -> crate::Result<()> {
    let confidence = set.df.column("confidence")?.f64()?;

    const BINS: usize = 10;
    let mut counts = [0usize; BINS];
    for value in confidence.into_iter().flatten() {
        let bin = ((value.clamp(0.0, 1.0) * BINS as f64) as usize).min(BINS - 1);
        counts[bin] += 1;
    }
    let max_count = *counts.iter().max().unwrap_or(&1) as f64;

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Classification Confidence", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..1f64, 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Confidence")
        .y_desc("Number of Questions")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let bin_width = 1.0 / BINS as f64;
    for (bin, &count) in counts.iter().enumerate() {
        chart.draw_series(std::iter::once(Rectangle::new(
            [
                (bin as f64 * bin_width, 0.0),
                ((bin + 1) as f64 * bin_width, count as f64),
            ],
            BLUE.filled(),
        )))?;
    }

    root.present()?;
    println!("Confidence histogram saved to: {output_path}");

    Ok(())
}

/// Create a bar chart of the funnel-stage distribution, sentinels included.
pub fn create_funnel_stage_chart(set: &QuestionSet, output_path: &str) -> crate::Result<()> {
    let stages = set.df.column("funnel_stage")?.utf8()?;
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for stage in stages.into_iter().flatten() {
        *counts.entry(stage).or_insert(0) += 1;
    }
    if counts.is_empty() {
        anyhow::bail!("nothing to plot: no funnel stages assigned");
    }

    let labels: Vec<String> = counts.keys().map(|s| s.to_string()).collect();
    let values: Vec<usize> = counts.values().copied().collect();
    let max_count = *values.iter().max().unwrap_or(&1) as f64;

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Funnel Stage Distribution", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(labels.len() as f64 - 0.5), 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Funnel Stage")
        .y_desc("Number of Questions")
        .x_labels(labels.len())
        .x_label_formatter(&|x| {
            let idx = x.round();
            if idx < 0.0 || (x - idx).abs() > 0.3 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (i, &count) in values.iter().enumerate() {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(i as f64 - 0.4, 0.0), (i as f64 + 0.4, count as f64)],
            cluster_color(i).filled(),
        )))?;
    }

    root.present()?;
    println!("Funnel stage chart saved to: {output_path}");

    Ok(())
}

/// Print per-cluster and funnel-stage insight to the console.
pub fn print_cluster_insights(
    set: &QuestionSet,
    model: &TopicModel,
    samples_per_cluster: usize,
) -> crate::Result<()> {
    let types = set.df.column("question_type")?.utf8()?;

    println!("\n--- Cluster-wise Question Type Distribution ---");
    for cluster in 0..model.n_clusters {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for (i, &assigned) in model.assignments.iter().enumerate() {
            if assigned == cluster {
                if let Some(qtype) = types.get(i) {
                    *counts.entry(qtype).or_insert(0) += 1;
                }
            }
        }
        let size: usize = counts.values().sum();
        println!("\nCluster {cluster}: {size} questions");
        let mut sorted: Vec<(&str, usize)> = counts.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        for (qtype, count) in sorted {
            println!("  {qtype}: {count}");
        }
    }

    println!("\n--- Sample Questions per Cluster ---");
    for cluster in 0..model.n_clusters {
        println!("\nCluster {cluster}:");
        let sample = set
            .cleaned
            .iter()
            .zip(model.assignments.iter())
            .filter_map(|(text, &assigned)| {
                (assigned == cluster).then(|| text.as_deref()).flatten()
            })
            .take(samples_per_cluster);
        for question in sample {
            println!("  - {question}");
        }
    }

    if let Ok(stages) = set.df.column("funnel_stage") {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for stage in stages.utf8()?.into_iter().flatten() {
            *counts.entry(stage).or_insert(0) += 1;
        }
        println!("\n--- Funnel Stage Distribution ---");
        for (stage, count) in counts {
            let pct = 100.0 * count as f64 / set.len() as f64;
            println!("  {stage}: {count} ({pct:.1}%)");
        }
    }

    println!("\n--- Suggested FAQ Use Cases ---");
    println!("TOFU: primarily 'how' and 'what' questions, good for onboarding or guides.");
    println!("MOFU: 'can', 'is', 'which' questions, comparison and decision content.");
    println!("BOFU: 'why', 'should' and account questions, support or conversion pages.");

    Ok(())
}

/// Render every chart and print the insight report.
pub fn generate_visualization_report(
    set: &QuestionSet,
    model: &TopicModel,
    coords: &Array2<f64>,
    base_output_path: &str,
) -> crate::Result<()> {
    create_cluster_scatter(coords, model, base_output_path, None)?;

    let size_chart_path = base_output_path.replace(".png", "_sizes.png");
    create_cluster_size_chart(model, &size_chart_path)?;

    let confidence_path = base_output_path.replace(".png", "_confidence.png");
    create_confidence_histogram(set, &confidence_path)?;

    let stage_chart_path = base_output_path.replace(".png", "_stages.png");
    create_funnel_stage_chart(set, &stage_chart_path)?;

    print_cluster_insights(set, model, 3)?;

    Ok(())
}
