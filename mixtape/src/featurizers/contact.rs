use std::fmt;

use clap::ValueEnum;
use itertools::Itertools;
use serde::Deserialize;
use shared::{
    check_indices,
    geometry::{distance, norm, Cell},
    ndarray as nd,
    warn,
    Result,
    Vec3,
};
use traj_parsers::{Topology, Trajectory};

use crate::core::{par_rows, Featurizer};


/// How the distance between two residues is measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactScheme {
    /// Distance between the alpha carbons.
    Ca,
    /// Closest distance between any two atoms.
    Closest,
    /// Closest distance between any two heavy atoms.
    ClosestHeavy,
    /// Closest distance between side-chain atoms.
    Sidechain,
    /// Closest distance between side-chain heavy atoms.
    SidechainHeavy,
}


impl ContactScheme {
    pub fn name(&self) -> &'static str {
        use ContactScheme::*;
        match self {
            Ca             => "ca",
            Closest        => "closest",
            ClosestHeavy   => "closest-heavy",
            Sidechain      => "sidechain",
            SidechainHeavy => "sidechain-heavy",
        }
    }

    /// Atoms of `res` taking part in the distance.
    fn atoms(&self, top: &Topology, res: usize) -> Vec<usize> {
        use ContactScheme::*;
        let atoms = top.residues[res].atoms.iter().copied();
        match self {
            Ca             => top.atom_in_residue(res, "CA").into_iter().collect(),
            Closest        => atoms.collect(),
            ClosestHeavy   => atoms.filter(|&a| !top.is_hydrogen(a)).collect(),
            Sidechain      => atoms.filter(|&a| top.is_sidechain(a)).collect(),
            SidechainHeavy => atoms.filter(|&a| top.is_sidechain(a) && !top.is_hydrogen(a)).collect(),
        }
    }
}


#[derive(Clone, Debug, PartialEq)]
pub enum Contacts {
    /// Every residue pair `(i, j)` with `j > i + 2`.
    All,
    Pairs(Vec<[usize; 2]>),
}


/// Residue-residue distances.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactFeaturizer {
    contacts:          Contacts,
    scheme:            ContactScheme,
    ignore_nonprotein: bool,
}


impl Default for ContactFeaturizer {
    fn default() -> Self {
        Self::new(Contacts::All, ContactScheme::ClosestHeavy, true)
    }
}


impl ContactFeaturizer {
    pub fn new(contacts: Contacts, scheme: ContactScheme, ignore_nonprotein: bool) -> Self {
        Self { contacts, scheme, ignore_nonprotein }
    }

    /// Residue pairs to measure, with the atoms of each side.
    fn plan(&self, top: &Topology) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let pairs = match &self.contacts {
            // sequence separation counts topology residue indices, not positions after filtering
            Contacts::All => (0 .. top.nresidues())
                .filter(|&r| !self.ignore_nonprotein || top.is_protein(r))
                .tuple_combinations()
                .filter(|&(a, b)| b > a + 2)
                .map(|(a, b)| [a, b])
                .collect::<Vec<_>>(),
            Contacts::Pairs(pairs) => {
                let flat = pairs.iter().flatten().copied().collect::<Vec<_>>();
                check_indices(&flat, top.nresidues(), "Contact residue")?;
                pairs.clone()
            },
        };

        let mut plan = Vec::with_capacity(pairs.len());
        let mut skipped = 0;
        for [a, b] in pairs {
            let (atoms_a, atoms_b) = (self.scheme.atoms(top, a), self.scheme.atoms(top, b));
            if atoms_a.is_empty() || atoms_b.is_empty() {
                skipped += 1;
                continue;
            }
            plan.push((atoms_a, atoms_b));
        }
        if skipped > 0 {
            warn!("{} residue pairs have no atoms under scheme '{}' and are left out.", skipped, self.scheme.name());
        }

        Ok(plan)
    }
}


impl fmt::Display for ContactFeaturizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contacts = match &self.contacts {
            Contacts::All => "\"all\"".to_string(),
            Contacts::Pairs(p) => format!("<{} pairs>", p.len()),
        };
        write!(f, "ContactFeaturizer(contacts={}, ignore_nonprotein={}, scheme={:?})",
            contacts, self.ignore_nonprotein, self.scheme.name())
    }
}


fn pair_distance(a: Vec3<f64>, b: Vec3<f64>, cell: Option<&Cell>) -> f64 {
    match cell {
        Some(cell) => norm(cell.minimum_image(a, b)),
        None => distance(a, b),
    }
}


impl Featurizer for ContactFeaturizer {
    fn partial_transform(&self, traj: &Trajectory) -> Result<nd::Array2<f64>> {
        let plan = self.plan(&traj.topology)?;

        par_rows(traj.nframes(), plan.len(), |iframe| {
            let cell = traj.cell(iframe);
            plan.iter()
                .map(|(atoms_a, atoms_b)| {
                    atoms_a.iter()
                        .cartesian_product(atoms_b.iter())
                        .map(|(&i, &j)| pair_distance(traj.position(iframe, i), traj.position(iframe, j), cell.as_ref()))
                        .fold(f64::INFINITY, f64::min)
                })
                .collect()
        })
    }
}
