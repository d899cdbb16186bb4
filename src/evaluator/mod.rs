pub use distance::{NominalDifference, SMALL};
pub use relieff::{ReliefF, ReliefFArg, Variant};

mod distance;
mod neighbours;
mod relieff;
mod weights;
