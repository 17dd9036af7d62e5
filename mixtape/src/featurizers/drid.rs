use std::fmt;

use shared::{
    check_indices,
    geometry::distance,
    ndarray as nd,
    numeric_methods::moment_triplet,
    Result,
};
use traj_parsers::{Topology, Trajectory};

use crate::core::{par_rows, Featurizer};


/// Distribution of reciprocal interatomic distances (DRID).
///
/// Every selected atom is summarized by the first three moments of its reciprocal distances to
/// the other selected atoms it is not bonded to, giving `3 * n` features.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DRIDFeaturizer {
    /// `None` selects every atom.
    atom_indices: Option<Vec<usize>>,
}


impl DRIDFeaturizer {
    pub fn new(atom_indices: Option<Vec<usize>>) -> Self {
        Self { atom_indices }
    }

    /// For each centroid, the selected atoms it is compared with.
    fn partners(selection: &[usize], top: &Topology) -> Vec<Vec<usize>> {
        let bonds = top.bond_set();
        selection.iter()
            .map(|&i| selection.iter()
                .copied()
                .filter(|&j| j != i && !bonds.contains(&(i.min(j), i.max(j))))
                .collect())
            .collect()
    }
}


impl fmt::Display for DRIDFeaturizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.atom_indices.as_ref() {
            Some(idx) => write!(f, "DRIDFeaturizer(atom_indices=<{} atoms>)", idx.len()),
            None => write!(f, "DRIDFeaturizer(atom_indices=None)"),
        }
    }
}


impl Featurizer for DRIDFeaturizer {
    fn partial_transform(&self, traj: &Trajectory) -> Result<nd::Array2<f64>> {
        let selection = match self.atom_indices.as_ref() {
            Some(idx) => {
                check_indices(idx, traj.natoms(), "DRID atom")?;
                idx.clone()
            },
            None => (0 .. traj.natoms()).collect(),
        };
        let partners = Self::partners(&selection, &traj.topology);

        par_rows(traj.nframes(), 3 * selection.len(), |iframe| {
            selection.iter().zip(partners.iter())
                .flat_map(|(&i, others)| {
                    let pi = traj.position(iframe, i);
                    let recip = others.iter()
                        .map(|&j| distance(pi, traj.position(iframe, j)).recip())
                        .collect::<Vec<f64>>();
                    moment_triplet(&recip)
                })
                .collect()
        })
    }
}
