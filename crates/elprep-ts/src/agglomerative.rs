//! Contiguous agglomerative segmentation.
//!
//! Starts with one cluster per snapshot and repeatedly merges the pair of
//! adjacent clusters with the smallest Ward linkage until the requested
//! number of segments is left. Representatives are the cluster means.

use elprep_core::PrepResult;
use tracing::debug;

use crate::segment::{NormalizedSeries, Segmentation, SegmentationBackend};

#[derive(Debug, Clone, Copy, Default)]
pub struct AgglomerativeSegmenter;

#[derive(Debug, Clone)]
struct Cluster {
    len: usize,
    sums: Vec<f64>,
}

impl Cluster {
    fn merge(&mut self, other: Cluster) {
        self.len += other.len;
        for (a, b) in self.sums.iter_mut().zip(other.sums) {
            *a += b;
        }
    }

    fn mean(&self) -> Vec<f64> {
        self.sums.iter().map(|s| s / self.len as f64).collect()
    }
}

/// Increase in within-cluster variance caused by merging `a` and `b`.
fn ward(a: &Cluster, b: &Cluster) -> f64 {
    let (na, nb) = (a.len as f64, b.len as f64);
    let distance: f64 = a
        .sums
        .iter()
        .zip(&b.sums)
        .map(|(sa, sb)| {
            let diff = sa / na - sb / nb;
            diff * diff
        })
        .sum();
    na * nb / (na + nb) * distance
}

impl SegmentationBackend for AgglomerativeSegmenter {
    fn name(&self) -> &str {
        "agglomerative"
    }

    fn segment(
        &self,
        series: &NormalizedSeries,
        segments: usize,
        solver_name: &str,
    ) -> PrepResult<Segmentation> {
        debug!(solver = solver_name, "agglomerative backend ignores the solver");
        let mut clusters: Vec<Cluster> = series
            .rows
            .iter()
            .map(|row| Cluster {
                len: 1,
                sums: row.clone(),
            })
            .collect();
        let mut costs: Vec<f64> = clusters.windows(2).map(|w| ward(&w[0], &w[1])).collect();

        while clusters.len() > segments.max(1) {
            // Ties resolve to the earliest pair.
            let Some((i, _)) = costs
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.total_cmp(b.1))
            else {
                break;
            };
            let right = clusters.remove(i + 1);
            clusters[i].merge(right);
            costs.remove(i);
            if i > 0 {
                costs[i - 1] = ward(&clusters[i - 1], &clusters[i]);
            }
            if i < costs.len() {
                costs[i] = ward(&clusters[i], &clusters[i + 1]);
            }
        }

        Ok(Segmentation {
            durations: clusters.iter().map(|c| c.len).collect(),
            values: clusters.iter().map(Cluster::mean).collect(),
        })
    }
}
