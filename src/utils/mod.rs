pub use vectors::{argsort, Sort};

mod vectors;
