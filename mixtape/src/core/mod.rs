pub mod config;
pub use config::*;

pub mod featurizer;
pub use featurizer::*;
