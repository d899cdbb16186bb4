pub use reader::{read_arff, read_arff_str};
pub use writer::{write_arff, write_arff_retained};

mod reader;
mod writer;
