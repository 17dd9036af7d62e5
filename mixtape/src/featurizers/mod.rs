//! The feature transforms, each turning a trajectory chunk into one row per frame.
pub mod dihedral;
pub use dihedral::{DihedralFeaturizer, DihedralType};

pub mod atom_pairs;
pub use atom_pairs::AtomPairsFeaturizer;

pub mod superpose;
pub use superpose::SuperposeFeaturizer;

pub mod drid;
pub use drid::DRIDFeaturizer;

pub mod contact;
pub use contact::{ContactFeaturizer, ContactScheme, Contacts};
