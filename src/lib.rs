//! Relief-F attribute evaluation and feature selection for tabular datasets.
//!
//! The crate reads a dataset with nominal or numeric attributes and a discrete class, assigns
//! every attribute a weight with the Relief-F instance-based evaluator, ranks the attributes by
//! weight and optionally prunes the tail of the ranking before re-emitting the dataset.
//!
//! The evaluator samples reference instances, searches the K nearest neighbours of every class
//! for each reference and rewards attributes that separate a reference from its nearest misses
//! while penalising those that separate it from its nearest hits. Two variants are available: a
//! batch variant with a single final reduction over the parallel workers, and an iterative
//! variant that re-ranks the attributes after every reference round and removes the current best
//! attribute from the distance function.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//!
//! use relieff::arff::read_arff_str;
//! use relieff::evaluator::{ReliefF, ReliefFArg};
//!
//! let data = "@RELATION and\n\
//!     @ATTRIBUTE x {a,b}\n\
//!     @ATTRIBUTE Class {yes,no}\n\
//!     @DATA\n\
//!     a,yes\na,yes\nb,no\nb,no\n";
//! let dataset = Arc::new(read_arff_str(data, "Class").unwrap());
//!
//! let mut evaluator = ReliefF::new(dataset, ReliefFArg::default()).unwrap();
//! evaluator.build().unwrap();
//! let ranking = evaluator.ranking().unwrap();
//! assert_eq!(ranking.order()[0], 0);
//! ```

pub mod arff;
pub mod core;
pub mod evaluator;
pub mod ranking;
pub mod utils;
