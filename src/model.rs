//! Topic clustering and 2D projection of the TF-IDF vector space
//!
//! Clustering partitions the vector space with seeded K-Means; projection
//! reduces it to two dimensions with a truncated SVD for visualization. Both
//! take the space read-only and are independent of each other.

use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use crate::error::PipelineError;
use crate::vectorize::VectorSpace;

const POWER_ITERATIONS: usize = 200;

/// Fitted topic-clustering model.
#[derive(Debug)]
pub struct TopicModel {
    /// Cluster id in [0, n_clusters) per document, in document order
    pub assignments: Array1<usize>,
    /// Cluster centroids in TF-IDF space
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares
    pub inertia: f64,
    pub n_clusters: usize,
}

impl TopicModel {
    /// Number of documents assigned to each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.assignments.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }
}

/// Partition the vector space into `k` topic clusters with seeded K-Means.
///
/// Deterministic for an identical (space, k, seed) triple. Cluster ids are
/// arbitrary: id 0 does not name the same topic across runs. A `k` outside
/// `1..=n_docs` is rejected outright rather than clamped.
pub fn cluster_topics(
    space: &VectorSpace,
    k: usize,
    max_iters: usize,
    tolerance: f64,
    seed: u64,
) -> Result<TopicModel, PipelineError> {
    let n_docs = space.n_docs();
    if k < 1 || k > n_docs {
        return Err(PipelineError::InvalidClusterCount { k, n_rows: n_docs });
    }
    if space.n_terms() == 0 {
        return Err(PipelineError::EmptyVectorSpace);
    }

    let targets: Array1<usize> = Array1::zeros(n_docs);
    let dataset = Dataset::new(space.matrix.clone(), targets);

    let rng = Xoshiro256Plus::seed_from_u64(seed);
    let model = KMeans::params_with(k, rng, L2Dist)
        .max_n_iterations(max_iters as u64)
        .tolerance(tolerance)
        .fit(&dataset)
        .map_err(|e| PipelineError::Clustering(e.to_string()))?;

    let assignments = model.predict(&dataset);
    let centroids = model.centroids().clone();
    let inertia = compute_inertia(&space.matrix, &assignments, &centroids);

    Ok(TopicModel {
        assignments,
        centroids,
        inertia,
        n_clusters: k,
    })
}

/// Project the vector space onto its first two singular directions.
///
/// Returns one (x, y) coordinate per document, in document order, computed as
/// the document weights U·S of a rank-2 truncated SVD. Deterministic for an
/// identical (space, seed) pair and entirely independent of any clustering
/// run on the same space. A degenerate spectrum leaves the remaining
/// component(s) at zero.
pub fn project_to_2d(space: &VectorSpace, seed: u64) -> Result<Array2<f64>, PipelineError> {
    if space.n_docs() == 0 {
        return Err(PipelineError::NoDocuments);
    }
    if space.n_terms() == 0 {
        return Err(PipelineError::EmptyVectorSpace);
    }

    let mut rng = Xoshiro256Plus::seed_from_u64(seed);
    let mut work = space.matrix.clone();
    let mut coords = Array2::zeros((space.n_docs(), 2));

    for component in 0..2 {
        let (sigma, u, v) = dominant_singular_triplet(&work, &mut rng);
        if sigma <= 0.0 {
            break;
        }
        coords.column_mut(component).assign(&u.mapv(|x| x * sigma));

        // Deflate the found component so the next iteration converges to the
        // second singular direction
        let outer = u.insert_axis(Axis(1)).dot(&v.insert_axis(Axis(0)));
        work -= &(outer * sigma);
    }

    Ok(coords)
}

/// Power iteration for the largest singular value and its vectors.
fn dominant_singular_triplet(
    matrix: &Array2<f64>,
    rng: &mut Xoshiro256Plus,
) -> (f64, Array1<f64>, Array1<f64>) {
    let (m, n) = matrix.dim();

    let mut v: Array1<f64> = Array1::from_iter((0..n).map(|_| rng.gen::<f64>() - 0.5));
    let norm = v.dot(&v).sqrt();
    if norm < f64::EPSILON {
        return (0.0, Array1::zeros(m), Array1::zeros(n));
    }
    v /= norm;

    let mut u = Array1::zeros(m);
    let mut sigma = 0.0;

    for _ in 0..POWER_ITERATIONS {
        let mut u_next = matrix.dot(&v);
        let norm_u = u_next.dot(&u_next).sqrt();
        if norm_u < 1e-12 {
            // the deflated matrix is (numerically) zero in this direction
            return (0.0, u, v);
        }
        u_next /= norm_u;
        u = u_next;

        let v_next = matrix.t().dot(&u);
        let next_sigma = v_next.dot(&v_next).sqrt();
        if next_sigma < 1e-12 {
            return (0.0, u, v);
        }
        v = v_next / next_sigma;

        let converged = (next_sigma - sigma).abs() < 1e-10;
        sigma = next_sigma;
        if converged {
            break;
        }
    }

    (sigma, u, v)
}

/// Within-cluster sum of squares.
fn compute_inertia(features: &Array2<f64>, labels: &Array1<usize>, centroids: &Array2<f64>) -> f64 {
    let mut inertia = 0.0;
    for (i, &cluster) in labels.iter().enumerate() {
        if cluster < centroids.nrows() {
            let point = features.row(i);
            let centroid = centroids.row(cluster);
            inertia += point
                .iter()
                .zip(centroid.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>();
        }
    }
    inertia
}
