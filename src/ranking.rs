use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{Dataset, RError};
use crate::utils::{argsort, Sort};

/// The attributes ranked by descending weight, with the class attribute removed. The ranking
/// decides which attributes survive a prune: the retained attributes are the head of the rank
/// order after dropping `prune` entries from its tail.
#[derive(Clone, Debug)]
pub struct Ranking {
    /// The full weight vector, one slot per attribute.
    weights: Vec<f64>,
    /// Attribute indices in descending weight order, class attribute removed.
    order: Vec<usize>,
}

impl Ranking {
    /// Rank the attributes of a weight vector.
    ///
    /// # Arguments
    ///
    /// * `weights`: The weight vector, one slot per attribute.
    /// * `class_index`: The index of the class attribute, removed from the ranking.
    ///
    /// returns: `Ranking`
    pub fn new(weights: &[f64], class_index: usize) -> Self {
        let order = argsort(weights, Sort::Descending)
            .into_iter()
            .filter(|attribute| *attribute != class_index)
            .collect();
        Self {
            weights: weights.to_vec(),
            order,
        }
    }

    /// Get the attribute indices in descending weight order, class attribute removed.
    ///
    /// returns: `&[usize]`
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Get the weight of an attribute. This returns an error if the index is out of range.
    ///
    /// # Arguments
    ///
    /// * `attribute`: The attribute index.
    ///
    /// returns: `Result<f64, RError>`
    pub fn weight(&self, attribute: usize) -> Result<f64, RError> {
        self.weights
            .get(attribute)
            .copied()
            .ok_or(RError::BadIndex(attribute))
    }

    /// Get the attributes retained after pruning: the first `N - 1 - prune` entries of the rank
    /// order, with `N` the total number of attributes. This returns an error if the prune count
    /// reaches the attribute count.
    ///
    /// # Arguments
    ///
    /// * `prune`: The number of attributes to drop from the tail of the ranking.
    ///
    /// returns: `Result<Vec<usize>, RError>`
    pub fn retained(&self, prune: usize) -> Result<Vec<usize>, RError> {
        let number_of_attributes = self.weights.len();
        if prune >= number_of_attributes {
            return Err(RError::PruneOverflow(prune, number_of_attributes));
        }
        Ok(self
            .order
            .iter()
            .take(number_of_attributes - 1 - prune)
            .copied()
            .collect())
    }

    /// Build the serialisable export of the retained attributes with their names and weights.
    ///
    /// # Arguments
    ///
    /// * `dataset`: The dataset the weights belong to.
    /// * `prune`: The number of attributes to drop from the tail of the ranking.
    ///
    /// returns: `Result<RankingExport, RError>`
    pub fn export(&self, dataset: &Dataset, prune: usize) -> Result<RankingExport, RError> {
        let attributes = self
            .retained(prune)?
            .into_iter()
            .map(|attribute| {
                Ok(RankedAttribute {
                    name: dataset.attribute(attribute)?.name().to_string(),
                    weight: self.weight(attribute)?,
                })
            })
            .collect::<Result<Vec<RankedAttribute>, RError>>()?;
        Ok(RankingExport {
            relation_name: dataset.relation_name().to_string(),
            attributes,
        })
    }
}

/// One ranked attribute.
#[derive(Serialize, Deserialize, Debug)]
pub struct RankedAttribute {
    /// The attribute name.
    pub name: String,
    /// The weight the evaluator assigned to the attribute.
    pub weight: f64,
}

/// The serialisable ranking of the retained attributes, in descending weight order.
#[derive(Serialize, Deserialize, Debug)]
pub struct RankingExport {
    /// The relation name of the evaluated dataset.
    pub relation_name: String,
    /// The retained attributes in descending weight order.
    pub attributes: Vec<RankedAttribute>,
}

impl RankingExport {
    /// Serialise the ranking and save it to a JSON file. This returns an error if the file
    /// cannot be saved.
    ///
    /// # Arguments
    ///
    /// * `destination`: The path to the JSON file.
    ///
    /// returns: `Result<(), RError>`
    pub fn write_json(&self, destination: &Path) -> Result<(), RError> {
        let data = serde_json::to_string_pretty(self).map_err(|e| {
            RError::Generic(format!(
                "The following error occurred while serialising the ranking: {e}"
            ))
        })?;
        fs::write(destination, data)
            .map_err(|e| RError::File(destination.to_path_buf(), e.to_string()))
    }
}

/// How many attributes to drop from the tail of the ranking: either an absolute count or a
/// percentage of the attribute list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PruneSpec {
    /// Drop this many attributes.
    Count(usize),
    /// Drop this percentage of the attribute list, truncated to a count.
    Percent(f64),
}

impl PruneSpec {
    /// Resolve the specification to an attribute count.
    ///
    /// # Arguments
    ///
    /// * `number_of_attributes`: The size of the attribute list.
    ///
    /// returns: `usize`
    pub fn resolve(&self, number_of_attributes: usize) -> usize {
        match self {
            PruneSpec::Count(count) => *count,
            PruneSpec::Percent(percent) => {
                (percent * number_of_attributes as f64 / 100.0) as usize
            }
        }
    }
}

impl FromStr for PruneSpec {
    type Err = RError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let bad_prune = || {
            RError::BadArguments(
                "prune".to_string(),
                format!("'{value}' is neither a count nor a percentage"),
            )
        };
        match value.trim().strip_suffix('%') {
            Some(percent) => {
                let percent = percent.trim().parse::<f64>().map_err(|_| bad_prune())?;
                if !(0.0..=100.0).contains(&percent) {
                    return Err(RError::BadArguments(
                        "prune".to_string(),
                        format!("the percentage '{value}' is outside [0, 100]"),
                    ));
                }
                Ok(PruneSpec::Percent(percent))
            }
            None => Ok(PruneSpec::Count(
                value.trim().parse::<usize>().map_err(|_| bad_prune())?,
            )),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::core::RError;
    use crate::ranking::{PruneSpec, Ranking};

    #[test]
    /// Weights (2.0, 0.5, 1.0, -0.3) with the class in the last slot rank as (a, c, b); pruning
    /// drops the tail of the ranking.
    fn test_rank_and_prune() {
        let ranking = Ranking::new(&[2.0, 0.5, 1.0, -0.3], 3);

        assert_eq!(ranking.order(), &[0, 2, 1]);
        assert_eq!(ranking.retained(0).unwrap(), vec![0, 2, 1]);
        assert_eq!(ranking.retained(1).unwrap(), vec![0, 2]);
        assert_eq!(ranking.retained(2).unwrap(), vec![0]);
        assert_eq!(ranking.retained(3).unwrap(), Vec::<usize>::new());
    }

    #[test]
    /// Pruning at least as many attributes as the dataset has is rejected.
    fn test_prune_overflow() {
        let ranking = Ranking::new(&[2.0, 0.5, 1.0, -0.3], 3);
        assert!(matches!(
            ranking.retained(4),
            Err(RError::PruneOverflow(4, 4))
        ));
        assert!(matches!(
            ranking.retained(9),
            Err(RError::PruneOverflow(9, 4))
        ));
    }

    #[test]
    /// The class attribute never appears in the ranking, wherever its weight would place it.
    fn test_class_attribute_removed() {
        let ranking = Ranking::new(&[0.1, 5.0, 0.2], 1);
        assert_eq!(ranking.order(), &[2, 0]);
    }

    #[test]
    /// Prune specifications parse as counts or percentages.
    fn test_prune_spec() {
        assert_eq!("3".parse::<PruneSpec>().unwrap(), PruneSpec::Count(3));
        assert_eq!(" 12 ".parse::<PruneSpec>().unwrap(), PruneSpec::Count(12));
        assert_eq!(
            "25%".parse::<PruneSpec>().unwrap(),
            PruneSpec::Percent(25.0)
        );
        assert!("abc".parse::<PruneSpec>().is_err());
        assert!("-1".parse::<PruneSpec>().is_err());
        assert!("150%".parse::<PruneSpec>().is_err());

        assert_eq!(PruneSpec::Count(2).resolve(10), 2);
        assert_eq!(PruneSpec::Percent(25.0).resolve(10), 2);
        assert_eq!(PruneSpec::Percent(10.0).resolve(4), 0);
    }
}
