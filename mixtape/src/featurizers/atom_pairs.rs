use std::fmt;

use shared::{
    check_indices,
    ensure,
    geometry::{distance, norm},
    ndarray as nd,
    Result,
};
use traj_parsers::Trajectory;

use crate::core::{par_rows, Featurizer};


/// Distances between atom pairs, raised to `exponent`.
#[derive(Clone, Debug, PartialEq)]
pub struct AtomPairsFeaturizer {
    pair_indices: Vec<[usize; 2]>,
    periodic:     bool,
    exponent:     f64,
}


impl AtomPairsFeaturizer {
    pub fn new(pair_indices: Vec<[usize; 2]>, periodic: bool, exponent: f64) -> Result<Self> {
        ensure!(!pair_indices.is_empty(), "AtomPairsFeaturizer needs at least one atom pair.");
        Ok(Self { pair_indices, periodic, exponent })
    }
}


impl fmt::Display for AtomPairsFeaturizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomPairsFeaturizer(exponent={}, pair_indices=<{} pairs>, periodic={})",
            self.exponent, self.pair_indices.len(), self.periodic)
    }
}


impl Featurizer for AtomPairsFeaturizer {
    fn partial_transform(&self, traj: &Trajectory) -> Result<nd::Array2<f64>> {
        let flat = self.pair_indices.iter().flatten().copied().collect::<Vec<_>>();
        check_indices(&flat, traj.natoms(), "Atom pair")?;

        par_rows(traj.nframes(), self.pair_indices.len(), |iframe| {
            // without a box the periodic flag has no effect
            let cell = if self.periodic { traj.cell(iframe) } else { None };
            self.pair_indices.iter()
                .map(|&[a, b]| {
                    let (pa, pb) = (traj.position(iframe, a), traj.position(iframe, b));
                    let d = match cell.as_ref() {
                        Some(cell) => norm(cell.minimum_image(pa, pb)),
                        None => distance(pa, pb),
                    };
                    d.powf(self.exponent)
                })
                .collect()
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use traj_parsers::{Frame, Topology};

    fn boxed_traj() -> Trajectory {
        let top = Arc::new(Topology::from_elements(&["Ar", "Ar", "Ar"]));
        let frame = Frame {
            positions: vec![[0.1, 0.1, 0.1], [0.9, 0.1, 0.1], [0.1, 0.5, 0.1]],
            cell: Some([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]),
            ..Default::default()
        };
        Trajectory::from_frames(&[frame.clone(), frame], &[0, 1], top).unwrap()
    }

    #[test]
    fn test_distances() {
        let traj = boxed_traj();
        let f = AtomPairsFeaturizer::new(vec![[0, 1], [0, 2]], false, 1.0).unwrap();
        let x = f.partial_transform(&traj).unwrap();
        assert_eq!(x.shape(), &[2, 2]);
        assert!((x[[0, 0]] - 0.8).abs() < 1E-6);
        assert!((x[[1, 1]] - 0.4).abs() < 1E-6);

        let f = AtomPairsFeaturizer::new(vec![[0, 1]], true, 1.0).unwrap();
        let x = f.partial_transform(&traj).unwrap();
        assert!((x[[0, 0]] - 0.2).abs() < 1E-6);

        let f = AtomPairsFeaturizer::new(vec![[0, 2]], false, -2.0).unwrap();
        let x = f.partial_transform(&traj).unwrap();
        assert!((x[[0, 0]] - 6.25).abs() < 1E-4);
    }

    #[test]
    fn test_bad_pairs() {
        assert!(AtomPairsFeaturizer::new(vec![], false, 1.0).is_err());
        let f = AtomPairsFeaturizer::new(vec![[0, 3]], false, 1.0).unwrap();
        assert!(f.partial_transform(&boxed_traj()).is_err());
    }
}
