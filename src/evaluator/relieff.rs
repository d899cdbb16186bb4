use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::{Dataset, RError};
use crate::evaluator::distance::{DistanceMetric, NominalDifference};
use crate::evaluator::neighbours::NeighbourTable;
use crate::evaluator::weights::WeightUpdater;
use crate::ranking::Ranking;
use crate::utils::{argsort, Sort};

/// The scheduling/reduction variant of the evaluator.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Variant {
    /// Process every reference with the full attribute set and reduce the worker weight vectors
    /// once at the end.
    #[default]
    Batch,
    /// Reduce after every reference round and exclude the current top-ranked attribute from the
    /// distance function before the next round.
    Iterative,
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Batch => write!(f, "batch"),
            Variant::Iterative => write!(f, "iterative"),
        }
    }
}

/// Input arguments for the Relief-F evaluator.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReliefFArg {
    /// The number of reference instances to process. `None`, or any size larger than the dataset,
    /// processes every instance exactly once; smaller sizes draw references at random.
    pub sample_size: Option<usize>,
    /// The number of nearest neighbours kept per class. This defaults to `10`.
    pub number_of_neighbours: usize,
    /// The rank-decay parameter of the distance weighting. This defaults to `2`.
    pub sigma: usize,
    /// Weight neighbours by their distance rank rather than uniformly. This defaults to `true`.
    pub weight_by_distance: bool,
    /// The seed of the reference sampler. `None` seeds from entropy, which makes random sampling
    /// unrepeatable. This defaults to `Some(1)`.
    pub seed: Option<u64>,
    /// The scheduling/reduction variant.
    pub variant: Variant,
    /// The difference metric applied to nominal attribute values.
    pub difference: NominalDifference,
    /// The number of peer workers processing references in parallel. This defaults to `1`.
    pub workers: usize,
}

impl Default for ReliefFArg {
    fn default() -> Self {
        Self {
            sample_size: None,
            number_of_neighbours: 10,
            sigma: 2,
            weight_by_distance: true,
            seed: Some(1),
            variant: Variant::default(),
            difference: NominalDifference::default(),
            workers: 1,
        }
    }
}

/// Per-worker state that survives across reference rounds.
struct WorkerState {
    rng: ChaCha8Rng,
    table: NeighbourTable,
}

/// The Relief-F attribute evaluator.
///
/// For every sampled reference instance the evaluator searches the K nearest neighbours of each
/// class, then rewards attributes that separate the reference from its nearest misses and
/// penalises attributes that separate it from its nearest hits. The accumulated weights are
/// scaled by the number of processed references, so they estimate the probability difference of
/// the classic Relief formulation.
///
/// Implemented based on:
/// > I. Kononenko, "Estimating attributes: Analysis and extensions of RELIEF", in Machine
/// > Learning: ECML-94, Lecture Notes in Computer Science, vol 784, 1994,
/// > doi: 10.1007/3-540-57868-4_57.
pub struct ReliefF {
    /// The dataset being evaluated.
    dataset: Arc<Dataset>,
    /// The evaluator arguments.
    args: ReliefFArg,
    /// The final attribute weights. The class attribute slot is never updated.
    weights: Vec<f64>,
    /// The attributes the iterative variant removed from the distance function.
    excluded: Vec<bool>,
    /// Whether [`ReliefF::build`] has completed.
    built: bool,
}

impl ReliefF {
    /// Configure the evaluator. This validates the arguments but does not process any instance;
    /// call [`ReliefF::build`] to compute the weights.
    ///
    /// # Arguments
    ///
    /// * `dataset`: The dataset to evaluate. The evaluator keeps a read-only view.
    /// * `args`: The [`ReliefFArg`] arguments to customise the evaluator behaviour.
    ///
    /// returns: `Result<ReliefF, RError>`
    pub fn new(dataset: Arc<Dataset>, args: ReliefFArg) -> Result<Self, RError> {
        if args.number_of_neighbours == 0 {
            return Err(RError::BadArguments(
                "number_of_neighbours".to_string(),
                "the number of neighbours must be strictly positive".to_string(),
            ));
        }
        if args.sigma == 0 {
            return Err(RError::BadArguments(
                "sigma".to_string(),
                "the rank-decay parameter must be strictly positive".to_string(),
            ));
        }
        if args.workers == 0 {
            return Err(RError::BadArguments(
                "workers".to_string(),
                "at least one worker is needed".to_string(),
            ));
        }

        let number_of_attributes = dataset.number_of_attributes();
        Ok(Self {
            dataset,
            args,
            weights: vec![0.0; number_of_attributes],
            excluded: vec![false; number_of_attributes],
            built: false,
        })
    }

    /// The number of references the evaluator will process.
    ///
    /// returns: `usize`
    fn total_references(&self) -> usize {
        let number_of_instances = self.dataset.number_of_instances();
        match self.args.sample_size {
            Some(size) if size <= number_of_instances => size,
            _ => number_of_instances,
        }
    }

    /// Process the dataset and compute the attribute weights. Once this returns, the weights can
    /// be queried with [`ReliefF::evaluate_attribute`] or ranked with [`ReliefF::ranking`].
    /// Building again restarts from a zeroed weight vector and an empty excluded set.
    ///
    /// returns: `Result<(), RError>`
    pub fn build(&mut self) -> Result<(), RError> {
        let start = Instant::now();
        let dataset = self.dataset.clone();
        let number_of_attributes = dataset.number_of_attributes();
        let class_index = dataset.class_index();
        let workers = self.args.workers;
        let total = self.total_references();

        info!(
            "Building {} over {} reference instances with {} workers",
            self, total, workers
        );

        let metric = DistanceMetric::new(dataset.clone(), self.args.difference);
        let updater = WeightUpdater::new(
            dataset.clone(),
            self.args.number_of_neighbours,
            self.args.sigma,
            self.args.weight_by_distance,
        );
        debug!("Class priors are {:?}", updater.class_probs());

        let mut weights = vec![0.0; number_of_attributes];
        let mut excluded = vec![false; number_of_attributes];

        match self.args.variant {
            Variant::Batch => {
                self.build_batch(&metric, &updater, &excluded, total, &mut weights)
            }
            Variant::Iterative => {
                self.build_iterative(&metric, &updater, &mut excluded, total, &mut weights)
            }
        }

        // scale to the probability estimate of the Relief formulation
        if total > 0 {
            let scale = 1.0 / total as f64;
            for (attribute, weight) in weights.iter_mut().enumerate() {
                if attribute != class_index {
                    *weight *= scale;
                }
            }
        }

        self.weights = weights;
        self.excluded = excluded;
        self.built = true;
        info!("Built in {:.3} seconds", start.elapsed().as_secs_f64());
        Ok(())
    }

    /// Run every worker over its own reference stream and reduce the local weight vectors once,
    /// summing them in worker order.
    fn build_batch(
        &self,
        metric: &DistanceMetric,
        updater: &WeightUpdater,
        excluded: &[bool],
        total: usize,
        weights: &mut [f64],
    ) {
        let dataset = &self.dataset;
        let number_of_instances = dataset.number_of_instances();
        let workers = self.args.workers;
        let seed = self.args.seed;
        let k = self.args.number_of_neighbours;

        let locals: Vec<Vec<f64>> = (0..workers)
            .into_par_iter()
            .map(|rank| {
                let mut rng = worker_rng(seed, rank);
                let mut table = NeighbourTable::new(dataset.number_of_classes(), k);
                let mut local = vec![0.0; dataset.number_of_attributes()];

                if total == number_of_instances {
                    for reference in (rank..total).step_by(workers) {
                        process_reference(
                            dataset, metric, updater, excluded, reference, &mut table, &mut local,
                        );
                    }
                } else {
                    for _ in 0..total.div_ceil(workers) {
                        let reference = rng.gen_range(0..number_of_instances);
                        process_reference(
                            dataset, metric, updater, excluded, reference, &mut table, &mut local,
                        );
                    }
                }
                local
            })
            .collect();

        for local in &locals {
            for (weight, value) in weights.iter_mut().zip(local) {
                *weight += value;
            }
        }
    }

    /// Process one round of W references at a time. After each round the per-worker delta vectors
    /// are summed into the shared weight vector and the best not-yet-excluded attribute is
    /// removed from the distance function.
    fn build_iterative(
        &self,
        metric: &DistanceMetric,
        updater: &WeightUpdater,
        excluded: &mut [bool],
        total: usize,
        weights: &mut [f64],
    ) {
        let dataset = &self.dataset;
        let number_of_instances = dataset.number_of_instances();
        let class_index = dataset.class_index();
        let workers = self.args.workers;
        let seed = self.args.seed;

        let mut states: Vec<WorkerState> = (0..workers)
            .map(|rank| WorkerState {
                rng: worker_rng(seed, rank),
                table: NeighbourTable::new(
                    dataset.number_of_classes(),
                    self.args.number_of_neighbours,
                ),
            })
            .collect();

        for round in (0..total).step_by(workers) {
            let excluded_view = &*excluded;
            let deltas: Vec<Vec<f64>> = states
                .par_iter_mut()
                .enumerate()
                .map(|(rank, state)| {
                    let mut delta = vec![0.0; dataset.number_of_attributes()];
                    let reference = if total == number_of_instances {
                        let index = round + rank;
                        if index >= total {
                            // outside the sample: skip the update but join the reduction
                            return delta;
                        }
                        index
                    } else {
                        state.rng.gen_range(0..number_of_instances)
                    };
                    process_reference(
                        dataset,
                        metric,
                        updater,
                        excluded_view,
                        reference,
                        &mut state.table,
                        &mut delta,
                    );
                    delta
                })
                .collect();

            for delta in &deltas {
                for (weight, value) in weights.iter_mut().zip(delta) {
                    *weight += value;
                }
            }

            // re-rank and drop the best remaining attribute from the distance function
            let rank_order = argsort(weights, Sort::Descending);
            for attribute in rank_order {
                if attribute != class_index && !excluded[attribute] {
                    debug!(
                        "Excluding attribute '{}' from the distance function",
                        dataset.attributes()[attribute].name()
                    );
                    excluded[attribute] = true;
                    break;
                }
            }
        }
    }

    /// Get the weight of one attribute. This returns an error if the evaluator has not been
    /// built or the index is out of range. The class attribute slot is never updated and its
    /// value must be ignored.
    ///
    /// # Arguments
    ///
    /// * `attribute`: The attribute index.
    ///
    /// returns: `Result<f64, RError>`
    pub fn evaluate_attribute(&self, attribute: usize) -> Result<f64, RError> {
        if !self.built {
            return Err(RError::NotBuilt);
        }
        self.weights
            .get(attribute)
            .copied()
            .ok_or(RError::BadIndex(attribute))
    }

    /// Get the final weight vector. Before [`ReliefF::build`] every slot is zero.
    ///
    /// returns: `&[f64]`
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Rank the attributes by descending weight, with the class attribute removed. This returns
    /// an error if the evaluator has not been built.
    ///
    /// returns: `Result<Ranking, RError>`
    pub fn ranking(&self) -> Result<Ranking, RError> {
        if !self.built {
            return Err(RError::NotBuilt);
        }
        Ok(Ranking::new(&self.weights, self.dataset.class_index()))
    }

    /// Get the attributes the iterative variant removed from the distance function, in attribute
    /// order.
    ///
    /// returns: `Vec<usize>`
    pub fn excluded_attributes(&self) -> Vec<usize> {
        self.excluded
            .iter()
            .enumerate()
            .filter_map(|(attribute, flag)| flag.then_some(attribute))
            .collect()
    }

    /// Get the evaluator arguments.
    ///
    /// returns: `&ReliefFArg`
    pub fn args(&self) -> &ReliefFArg {
        &self.args
    }

    /// Get the dataset being evaluated.
    ///
    /// returns: `Arc<Dataset>`
    pub fn dataset(&self) -> Arc<Dataset> {
        self.dataset.clone()
    }
}

impl Display for ReliefF {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReliefF ({} variant)", self.args.variant)
    }
}

/// Get the sampler of one worker. A fixed seed gives every worker its own reproducible stream;
/// without a seed the stream comes from entropy.
///
/// # Arguments
///
/// * `seed`: The optional seed number.
/// * `rank`: The worker rank.
///
/// returns: `ChaCha8Rng`
fn worker_rng(seed: Option<u64>, rank: usize) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(rank as u64)),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Search the neighbours of one reference instance and apply the weight update.
fn process_reference(
    dataset: &Dataset,
    metric: &DistanceMetric,
    updater: &WeightUpdater,
    excluded: &[bool],
    reference: usize,
    table: &mut NeighbourTable,
    weights: &mut [f64],
) {
    table.reset();
    for other in 0..dataset.number_of_instances() {
        if other != reference {
            let distance = metric.instance_distance(reference, other, excluded);
            table.offer(dataset.class_of(other), distance, other);
        }
    }
    updater.update(metric, reference, table, weights);
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use float_cmp::assert_approx_eq;

    use crate::core::{Attribute, AttributeType, Cell, Dataset, Instance, RError};
    use crate::evaluator::relieff::{ReliefF, ReliefFArg, Variant};

    fn nominal(name: &str, labels: &[&str]) -> Attribute {
        Attribute::new(
            name,
            AttributeType::Nominal(labels.iter().map(|l| l.to_string()).collect()),
        )
    }

    /// The four-instance dataset of the sign check: x fully separates the two classes.
    fn sign_dataset() -> Arc<Dataset> {
        let attributes = vec![nominal("x", &["a", "b"]), nominal("Class", &["+", "-"])];
        let instances = vec![
            Instance::new(vec![Cell::Label(0), Cell::Label(0)]),
            Instance::new(vec![Cell::Label(0), Cell::Label(0)]),
            Instance::new(vec![Cell::Label(1), Cell::Label(1)]),
            Instance::new(vec![Cell::Label(1), Cell::Label(1)]),
        ];
        Arc::new(Dataset::new("sign", attributes, instances, 1).unwrap())
    }

    /// A numeric attribute distributed identically in both classes: every reference has both a
    /// hit and a miss sharing its value.
    fn identity_dataset() -> Arc<Dataset> {
        let attributes = vec![
            Attribute::new("v", AttributeType::Numeric),
            nominal("Class", &["+", "-"]),
        ];
        let instances = [0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0]
            .iter()
            .enumerate()
            .map(|(row, value)| {
                Instance::new(vec![Cell::Numeric(*value), Cell::Label(row / 4)])
            })
            .collect();
        Arc::new(Dataset::new("identity", attributes, instances, 1).unwrap())
    }

    /// Five informative-to-noisy nominal attributes plus the class.
    fn wide_dataset() -> Arc<Dataset> {
        let mut attributes: Vec<Attribute> = (0..5)
            .map(|a| nominal(&format!("x{a}"), &["a", "b"]))
            .collect();
        attributes.push(nominal("Class", &["+", "-"]));

        let rows: [[usize; 6]; 6] = [
            [0, 0, 1, 0, 1, 0],
            [0, 1, 0, 0, 0, 0],
            [0, 0, 0, 1, 1, 0],
            [1, 1, 1, 0, 0, 1],
            [1, 0, 1, 1, 1, 1],
            [1, 1, 0, 1, 0, 1],
        ];
        let instances = rows
            .iter()
            .map(|row| Instance::new(row.iter().map(|label| Cell::Label(*label)).collect()))
            .collect();
        Arc::new(Dataset::new("wide", attributes, instances, 5).unwrap())
    }

    fn plain_args() -> ReliefFArg {
        ReliefFArg {
            number_of_neighbours: 1,
            weight_by_distance: false,
            ..Default::default()
        }
    }

    #[test]
    /// A perfectly separating attribute scores the maximum weight of one: every reference finds a
    /// hit at distance 0 and a miss at difference 1.
    fn test_separating_attribute_scores_one() {
        let mut evaluator = ReliefF::new(sign_dataset(), plain_args()).unwrap();
        evaluator.build().unwrap();

        assert_approx_eq!(f64, evaluator.evaluate_attribute(0).unwrap(), 1.0);
    }

    #[test]
    /// A numeric attribute distributed identically in both classes scores (close to) zero.
    fn test_identical_attribute_scores_zero() {
        let mut evaluator = ReliefF::new(identity_dataset(), plain_args()).unwrap();
        evaluator.build().unwrap();

        assert!(evaluator.evaluate_attribute(0).unwrap().abs() < 1e-6);
    }

    #[test]
    /// A zero sample size processes no reference and leaves the weight vector zeroed.
    fn test_zero_sample_size() {
        let args = ReliefFArg {
            sample_size: Some(0),
            ..plain_args()
        };
        let mut evaluator = ReliefF::new(sign_dataset(), args).unwrap();
        evaluator.build().unwrap();

        for weight in evaluator.weights() {
            assert_approx_eq!(f64, *weight, 0.0);
        }
    }

    #[test]
    /// Building twice with the same configuration gives bit-identical weights when every
    /// instance is processed once.
    fn test_deterministic_rebuild() {
        let dataset = wide_dataset();
        let args = ReliefFArg {
            number_of_neighbours: 2,
            ..Default::default()
        };

        let mut first = ReliefF::new(dataset.clone(), args.clone()).unwrap();
        first.build().unwrap();
        let mut second = ReliefF::new(dataset, args).unwrap();
        second.build().unwrap();

        assert_eq!(first.weights(), second.weights());
    }

    #[test]
    /// Splitting the full pass over two workers reproduces the single-worker weights (the same
    /// terms are summed, only the reduction order changes).
    fn test_worker_split_matches_single_worker() {
        let dataset = wide_dataset();
        let mut single = ReliefF::new(dataset.clone(), plain_args()).unwrap();
        single.build().unwrap();

        let args = ReliefFArg {
            workers: 2,
            ..plain_args()
        };
        let mut split = ReliefF::new(dataset, args).unwrap();
        split.build().unwrap();

        for (a, b) in single.weights().iter().zip(split.weights()) {
            assert_approx_eq!(f64, *a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    /// The iterative variant grows the excluded set by one non-class attribute per reference,
    /// capped at the number of non-class attributes.
    fn test_iterative_exclusion_growth() {
        let dataset = wide_dataset();

        let args = ReliefFArg {
            sample_size: Some(1),
            variant: Variant::Iterative,
            ..plain_args()
        };
        let mut evaluator = ReliefF::new(dataset.clone(), args).unwrap();
        evaluator.build().unwrap();
        assert_eq!(evaluator.excluded_attributes().len(), 1);

        let args = ReliefFArg {
            variant: Variant::Iterative,
            ..plain_args()
        };
        let mut evaluator = ReliefF::new(dataset, args).unwrap();
        evaluator.build().unwrap();
        // six references but only five non-class attributes to exclude
        let excluded = evaluator.excluded_attributes();
        assert_eq!(excluded.len(), 5);
        assert!(!excluded.contains(&5));
    }

    #[test]
    /// Every weight stays within the bound implied by the update formula.
    fn test_weights_are_bounded() {
        let dataset = wide_dataset();
        let mut evaluator = ReliefF::new(dataset.clone(), plain_args()).unwrap();
        evaluator.build().unwrap();

        // every per-reference contribution is at most 1 + max_k P(k) / (1 - P(c))
        let bound = 1.0 + 0.5 / (1.0 - 0.5);
        for (attribute, weight) in evaluator.weights().iter().enumerate() {
            if attribute != dataset.class_index() {
                assert!(weight.abs() <= bound);
            }
        }
    }

    #[test]
    /// Queries before the build or with an out-of-range index fail.
    fn test_query_errors() {
        let evaluator = ReliefF::new(sign_dataset(), plain_args()).unwrap();
        assert!(matches!(
            evaluator.evaluate_attribute(0),
            Err(RError::NotBuilt)
        ));

        let mut evaluator = ReliefF::new(sign_dataset(), plain_args()).unwrap();
        evaluator.build().unwrap();
        assert!(matches!(
            evaluator.evaluate_attribute(9),
            Err(RError::BadIndex(9))
        ));
    }

    #[test]
    /// Invalid arguments are rejected before any work is done.
    fn test_bad_arguments() {
        let args = ReliefFArg {
            number_of_neighbours: 0,
            ..Default::default()
        };
        assert!(matches!(
            ReliefF::new(sign_dataset(), args),
            Err(RError::BadArguments(_, _))
        ));

        let args = ReliefFArg {
            sigma: 0,
            ..Default::default()
        };
        assert!(matches!(
            ReliefF::new(sign_dataset(), args),
            Err(RError::BadArguments(_, _))
        ));

        let args = ReliefFArg {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            ReliefF::new(sign_dataset(), args),
            Err(RError::BadArguments(_, _))
        ));
    }

    #[test]
    /// Random sampling with a fixed seed is repeatable.
    fn test_seeded_sampling_is_repeatable() {
        let dataset = wide_dataset();
        let args = ReliefFArg {
            sample_size: Some(3),
            seed: Some(42),
            ..plain_args()
        };

        let mut first = ReliefF::new(dataset.clone(), args.clone()).unwrap();
        first.build().unwrap();
        let mut second = ReliefF::new(dataset, args).unwrap();
        second.build().unwrap();

        assert_eq!(first.weights(), second.weights());
    }
}
