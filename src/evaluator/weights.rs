use std::sync::Arc;

use crate::core::Dataset;
use crate::evaluator::distance::DistanceMetric;
use crate::evaluator::neighbours::NeighbourTable;
use crate::utils::{argsort, Sort};

/// Applies the Relief-F weight update for one reference instance and its populated neighbour
/// table. Neighbours of the reference class ("hits") pull the weight of an attribute down by the
/// attribute difference; neighbours of every other class ("misses") push it up, re-weighted by
/// the class priors when the problem has more than two classes.
#[derive(Debug)]
pub(crate) struct WeightUpdater {
    dataset: Arc<Dataset>,
    /// Prior probability of each class, estimated by relative frequency.
    class_probs: Vec<f64>,
    /// Rank-decay factors `exp(-(j/sigma)^2)`, set when neighbours are weighted by distance.
    rank_weights: Option<Vec<f64>>,
}

impl WeightUpdater {
    /// Create the updater. This estimates the class priors and, when `weight_by_distance` is
    /// set, precomputes the length-K rank-decay vector.
    ///
    /// # Arguments
    ///
    /// * `dataset`: The dataset.
    /// * `k`: The maximum number of neighbours per class.
    /// * `sigma`: The rank-decay parameter.
    /// * `weight_by_distance`: Whether neighbours are weighted by their distance rank instead of
    ///    uniformly.
    ///
    /// returns: `WeightUpdater`
    pub fn new(dataset: Arc<Dataset>, k: usize, sigma: usize, weight_by_distance: bool) -> Self {
        let number_of_instances = dataset.number_of_instances();
        let mut class_probs = vec![0.0; dataset.number_of_classes()];
        for instance in 0..number_of_instances {
            class_probs[dataset.class_of(instance)] += 1.0;
        }
        if number_of_instances > 0 {
            for prob in &mut class_probs {
                *prob /= number_of_instances as f64;
            }
        }

        let rank_weights = weight_by_distance.then(|| {
            (0..k)
                .map(|j| (-(j as f64 / sigma as f64).powi(2)).exp())
                .collect()
        });

        Self {
            dataset,
            class_probs,
            rank_weights,
        }
    }

    /// Get the class priors.
    ///
    /// returns: `&[f64]`
    pub fn class_probs(&self) -> &[f64] {
        &self.class_probs
    }

    /// Accumulate the weight contributions of one reference instance into the weight vector. The
    /// class attribute slot is never touched.
    ///
    /// # Arguments
    ///
    /// * `metric`: The distance metric used for the per-attribute differences.
    /// * `reference`: The dataset index of the reference instance.
    /// * `table`: The neighbour table populated for the reference instance.
    /// * `weights`: The weight vector to update, one slot per attribute.
    pub fn update(
        &self,
        metric: &DistanceMetric,
        reference: usize,
        table: &NeighbourTable,
        weights: &mut [f64],
    ) {
        let class_index = self.dataset.class_index();
        let number_of_attributes = self.dataset.number_of_attributes();
        let number_of_classes = self.dataset.number_of_classes();
        let reference_class = self.dataset.class_of(reference);

        // probability space left after removing the reference class, used to re-weight misses on
        // multi-class problems
        let w_norm = if number_of_classes > 2 {
            1.0 - self.class_probs[reference_class]
        } else {
            1.0
        };

        for class in 0..number_of_classes {
            let stored = table.stored(class);
            if stored == 0 {
                continue;
            }
            let entries = table.entries(class);

            // With distance weighting neighbours are visited by ascending distance rank and the
            // rank-decay factors are normalised over the populated slots. Otherwise every
            // neighbour weighs 1/stored and the stored order is kept.
            let order: Vec<usize> = match &self.rank_weights {
                Some(_) => {
                    let distances: Vec<f64> = entries.iter().map(|e| e.distance).collect();
                    argsort(&distances, Sort::Ascending)
                }
                None => (0..stored).collect(),
            };
            let normaliser = self
                .rank_weights
                .as_ref()
                .map(|rank_weights| rank_weights[..stored].iter().sum::<f64>());

            for (rank, slot) in order.into_iter().enumerate() {
                let neighbour = entries[slot].instance;
                let scale = match (&self.rank_weights, normaliser) {
                    (Some(rank_weights), Some(normaliser)) => rank_weights[rank] / normaliser,
                    _ => 1.0 / stored as f64,
                };

                for attribute in 0..number_of_attributes {
                    if attribute == class_index {
                        continue;
                    }
                    let diff = metric.attribute_difference(attribute, reference, neighbour) * scale;
                    if class == reference_class {
                        weights[attribute] -= diff;
                    } else if number_of_classes > 2 {
                        weights[attribute] += self.class_probs[class] / w_norm * diff;
                    } else {
                        weights[attribute] += diff;
                    }
                }
            }
        }
    }
}
