use std::fmt;

use shared::{
    check_indices,
    ensure,
    geometry::{add, centroid, distance, matvec, optimal_rotation, sub},
    ndarray as nd,
    Context,
    Result,
    Vec3,
};
use traj_parsers::Trajectory;

use crate::core::{try_par_rows, Featurizer};


/// Per-atom deviations from a reference structure after optimal superposition.
///
/// Each frame is rotated and translated onto the first frame of the reference so that the
/// squared deviation over `superpose_atom_indices` is minimal, then the distances of the atoms in
/// `atom_indices` to their reference positions are the features.
#[derive(Clone, Debug)]
pub struct SuperposeFeaturizer {
    atom_indices:           Vec<usize>,
    superpose_atom_indices: Vec<usize>,
    /// Reference coordinates of every atom.
    reference:              Vec<Vec3<f64>>,
}


impl SuperposeFeaturizer {
    pub fn new(reference: &Trajectory, atom_indices: Vec<usize>, superpose_atom_indices: Option<Vec<usize>>) -> Result<Self> {
        ensure!(reference.nframes() > 0, "Reference trajectory has no frames.");
        ensure!(!atom_indices.is_empty(), "SuperposeFeaturizer needs at least one atom index.");

        let superpose_atom_indices = superpose_atom_indices.unwrap_or_else(|| atom_indices.clone());
        ensure!(!superpose_atom_indices.is_empty(), "SuperposeFeaturizer needs at least one atom to superpose on.");

        check_indices(&atom_indices, reference.natoms(), "Reference atom")?;
        check_indices(&superpose_atom_indices, reference.natoms(), "Reference superpose atom")?;

        let all = (0 .. reference.natoms()).collect::<Vec<_>>();
        Ok(Self {
            atom_indices,
            superpose_atom_indices,
            reference: reference.positions(0, &all),
        })
    }

    /// Coordinates of `atoms` in `iframe` after superposing the frame onto the reference.
    fn superposed(&self, traj: &Trajectory, iframe: usize, atoms: &[usize]) -> Result<Vec<Vec3<f64>>> {
        let mobile = traj.positions(iframe, &self.superpose_atom_indices);
        let target = self.superpose_atom_indices.iter()
            .map(|&i| self.reference[i])
            .collect::<Vec<_>>();

        let c_mobile = centroid(&mobile);
        let c_target = centroid(&target);
        let mobile = mobile.iter().map(|&x| sub(x, c_mobile)).collect::<Vec<_>>();
        let target = target.iter().map(|&x| sub(x, c_target)).collect::<Vec<_>>();
        let rot = optimal_rotation(&mobile, &target)
            .with_context(|| format!("Failed to superpose frame {} onto the reference.", iframe))?;

        Ok(atoms.iter()
            .map(|&i| add(matvec(&rot, sub(traj.position(iframe, i), c_mobile)), c_target))
            .collect())
    }
}


impl fmt::Display for SuperposeFeaturizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SuperposeFeaturizer(atom_indices=<{} atoms>, reference_traj=<{} atoms>, superpose_atom_indices=<{} atoms>)",
            self.atom_indices.len(), self.reference.len(), self.superpose_atom_indices.len())
    }
}


impl Featurizer for SuperposeFeaturizer {
    fn partial_transform(&self, traj: &Trajectory) -> Result<nd::Array2<f64>> {
        check_indices(&self.atom_indices, traj.natoms(), "Atom")?;
        check_indices(&self.superpose_atom_indices, traj.natoms(), "Superpose atom")?;

        try_par_rows(traj.nframes(), self.atom_indices.len(), |iframe| {
            Ok(self.superposed(traj, iframe, &self.atom_indices)?.into_iter()
                .zip(self.atom_indices.iter())
                .map(|(x, &i)| distance(x, self.reference[i]))
                .collect())
        })
    }
}
