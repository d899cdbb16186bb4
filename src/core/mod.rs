pub use attribute::{Attribute, AttributeType};
pub use dataset::{Cell, Dataset, Instance};
pub use error::RError;

mod attribute;
mod dataset;
mod error;
