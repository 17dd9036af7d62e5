pub mod version;
pub mod logging;
pub mod cli;
pub mod index_file;

pub mod core;
pub mod featurizers;
pub mod featurize;

pub use cli::OptProcess;
