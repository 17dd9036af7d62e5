pub mod config;
pub use config::{FeaturizeConfig, FeaturizerSpec};

pub mod dataset;
pub use dataset::FeatureDataset;

pub mod featurize_impl;
pub use featurize_impl::FeaturizeJob;

pub mod command;
pub use command::{
    AtomPairsCommand,
    ContactCommand,
    DihedralCommand,
    DRIDCommand,
    FeaturizeCommand,
    SuperposeCommand,
};
