use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
/// Errors raised by the library.
pub enum RError {
    #[error("The following error occurred: {0}")]
    Generic(String),
    #[error("The argument '{0}' is invalid: {1}")]
    BadArguments(String, String),
    #[error("Cannot access the file {0:?}: {1}")]
    File(PathBuf, String),
    #[error("The dataset schema is invalid: {0}")]
    BadSchema(String),
    #[error("Invalid data on line {0}: {1}")]
    BadData(usize, String),
    #[error("The attribute index {0} does not exist")]
    BadIndex(usize),
    #[error("Cannot prune {0} attributes from a dataset with {1} attributes")]
    PruneOverflow(usize, usize),
    #[error("The evaluator must be built before attributes can be evaluated")]
    NotBuilt,
}
