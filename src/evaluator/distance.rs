use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{AttributeType, Cell, Dataset};

/// Tolerance used to detect degenerate numeric ranges.
pub const SMALL: f64 = 1e-6;

/// The difference metric applied to nominal attribute values.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NominalDifference {
    /// Two values differ by `1` when their labels are not equal.
    #[default]
    Genotype,
    /// Two values differ by the distance between their positions in the label list. This suits
    /// ordinal label lists such as `AA`, `Aa`, `aa`.
    AlleleSharing,
}

/// The observed value range of each numeric attribute. Nominal attributes and numeric attributes
/// with no observed value stay unset.
#[derive(Debug)]
struct Bounds {
    ranges: Vec<Option<(f64, f64)>>,
}

impl Bounds {
    /// Scan the dataset once and record the minimum and maximum of every numeric attribute.
    ///
    /// # Arguments
    ///
    /// * `dataset`: The dataset.
    ///
    /// returns: `Bounds`
    fn new(dataset: &Dataset) -> Self {
        let mut ranges: Vec<Option<(f64, f64)>> = vec![None; dataset.number_of_attributes()];
        for instance in dataset.instances() {
            for (range, (attribute, cell)) in ranges
                .iter_mut()
                .zip(dataset.attributes().iter().zip(instance.cells()))
            {
                if *attribute.attribute_type() != AttributeType::Numeric {
                    continue;
                }
                if let Cell::Numeric(value) = cell {
                    match range {
                        None => *range = Some((*value, *value)),
                        Some((min, max)) => {
                            if *value < *min {
                                *min = *value;
                            } else if *value > *max {
                                *max = *value;
                            }
                        }
                    }
                }
            }
        }
        Self { ranges }
    }
}

/// The per-attribute difference and Manhattan instance distance used by the nearest-neighbour
/// search. Numeric operands are normalised to `[0, 1]` with the dataset bounds before they are
/// subtracted.
#[derive(Debug)]
pub(crate) struct DistanceMetric {
    dataset: Arc<Dataset>,
    bounds: Bounds,
    difference: NominalDifference,
}

impl DistanceMetric {
    /// Create the metric for a dataset. This computes the numeric attribute bounds in one pass.
    ///
    /// # Arguments
    ///
    /// * `dataset`: The dataset.
    /// * `difference`: The difference metric to apply to nominal values.
    ///
    /// returns: `DistanceMetric`
    pub fn new(dataset: Arc<Dataset>, difference: NominalDifference) -> Self {
        let bounds = Bounds::new(&dataset);
        Self {
            dataset,
            bounds,
            difference,
        }
    }

    /// Normalise a numeric value with the observed bounds of its attribute. Values of attributes
    /// with no observed range, or with a range smaller than [`SMALL`], normalise to `0`.
    ///
    /// # Arguments
    ///
    /// * `value`: The value to normalise.
    /// * `attribute`: The attribute index.
    ///
    /// returns: `f64`
    pub fn norm(&self, value: f64, attribute: usize) -> f64 {
        match self.bounds.ranges[attribute] {
            None => 0.0,
            Some((min, max)) => {
                if (max - min).abs() < SMALL {
                    0.0
                } else {
                    (value - min) / (max - min)
                }
            }
        }
    }

    /// Compute the difference between the values two instances store for one attribute.
    ///
    /// # Arguments
    ///
    /// * `attribute`: The attribute index.
    /// * `first`: The index of the first instance.
    /// * `second`: The index of the second instance.
    ///
    /// returns: `f64`
    pub fn attribute_difference(&self, attribute: usize, first: usize, second: usize) -> f64 {
        let instances = self.dataset.instances();
        let a = instances[first].cell(attribute);
        let b = instances[second].cell(attribute);
        match (a, b) {
            (Cell::Label(la), Cell::Label(lb)) => match self.difference {
                NominalDifference::Genotype => (la != lb) as u8 as f64,
                NominalDifference::AlleleSharing => la.abs_diff(*lb) as f64,
            },
            (Cell::Numeric(va), Cell::Numeric(vb)) => {
                (self.norm(*va, attribute) - self.norm(*vb, attribute)).abs()
            }
            // unreachable: the dataset constructor aligns cells with attribute types
            _ => 0.0,
        }
    }

    /// Compute the Manhattan distance between two instances, summed over every attribute except
    /// the class attribute and the attributes flagged in the excluded mask.
    ///
    /// # Arguments
    ///
    /// * `first`: The index of the first instance.
    /// * `second`: The index of the second instance.
    /// * `excluded`: The excluded-attribute mask, one flag per attribute.
    ///
    /// returns: `f64`
    pub fn instance_distance(&self, first: usize, second: usize, excluded: &[bool]) -> f64 {
        let class_index = self.dataset.class_index();
        let mut distance = 0.0;
        for attribute in 0..self.dataset.number_of_attributes() {
            if attribute == class_index || excluded[attribute] {
                continue;
            }
            distance += self.attribute_difference(attribute, first, second);
        }
        distance
    }
}
