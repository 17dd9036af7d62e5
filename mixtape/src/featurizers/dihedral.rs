use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;
use shared::{
    geometry::dihedral,
    ndarray as nd,
    Result,
};
use traj_parsers::{Topology, Trajectory};

use crate::core::{par_rows, Featurizer};


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DihedralType {
    Phi,
    Psi,
    Omega,
    Chi1,
    Chi2,
    Chi3,
    Chi4,
}


const CHI1_ATOMS: &[[&str; 4]] = &[
    ["N", "CA", "CB", "CG"],
    ["N", "CA", "CB", "CG1"],
    ["N", "CA", "CB", "SG"],
    ["N", "CA", "CB", "OG"],
    ["N", "CA", "CB", "OG1"],
];

const CHI2_ATOMS: &[[&str; 4]] = &[
    ["CA", "CB", "CG",  "CD"],
    ["CA", "CB", "CG",  "CD1"],
    ["CA", "CB", "CG1", "CD1"],
    ["CA", "CB", "CG",  "OD1"],
    ["CA", "CB", "CG",  "ND1"],
    ["CA", "CB", "CG",  "SD"],
];

const CHI3_ATOMS: &[[&str; 4]] = &[
    ["CB", "CG", "CD", "NE"],
    ["CB", "CG", "CD", "CE"],
    ["CB", "CG", "CD", "OE1"],
    ["CB", "CG", "SD", "CE"],
];

const CHI4_ATOMS: &[[&str; 4]] = &[
    ["CG", "CD", "NE", "CZ"],
    ["CG", "CD", "CE", "NZ"],
];


impl DihedralType {
    pub fn name(&self) -> &'static str {
        use DihedralType::*;
        match self {
            Phi   => "phi",
            Psi   => "psi",
            Omega => "omega",
            Chi1  => "chi1",
            Chi2  => "chi2",
            Chi3  => "chi3",
            Chi4  => "chi4",
        }
    }

    /// Atom quartets of this angle, one per residue that has it, in residue order.
    pub fn quartets(&self, top: &Topology) -> Vec<[usize; 4]> {
        use DihedralType::*;

        let find = |res: usize, name: &str| top.atom_in_residue(res, name);
        let mut ret = vec![];

        for res in 0 .. top.nresidues() {
            let quartet = match self {
                Phi => top.prev_in_chain(res).and_then(|prev| {
                    Some([find(prev, "C")?, find(res, "N")?, find(res, "CA")?, find(res, "C")?])
                }),
                Psi => top.next_in_chain(res).and_then(|next| {
                    Some([find(res, "N")?, find(res, "CA")?, find(res, "C")?, find(next, "N")?])
                }),
                Omega => top.next_in_chain(res).and_then(|next| {
                    Some([find(res, "CA")?, find(res, "C")?, find(next, "N")?, find(next, "CA")?])
                }),
                Chi1 => side_chain_quartet(top, res, CHI1_ATOMS),
                Chi2 => side_chain_quartet(top, res, CHI2_ATOMS),
                Chi3 => side_chain_quartet(top, res, CHI3_ATOMS),
                Chi4 => side_chain_quartet(top, res, CHI4_ATOMS),
            };
            ret.extend(quartet);
        }

        ret
    }
}


/// The first pattern fully present in `res`.
fn side_chain_quartet(top: &Topology, res: usize, patterns: &[[&str; 4]]) -> Option<[usize; 4]> {
    patterns.iter().find_map(|names| {
        Some([
            top.atom_in_residue(res, names[0])?,
            top.atom_in_residue(res, names[1])?,
            top.atom_in_residue(res, names[2])?,
            top.atom_in_residue(res, names[3])?,
        ])
    })
}


/// Backbone and side-chain torsions, optionally expanded to their sines and cosines.
#[derive(Clone, Debug, PartialEq)]
pub struct DihedralFeaturizer {
    types:  Vec<DihedralType>,
    sincos: bool,
}


impl DihedralFeaturizer {
    pub fn new(types: Vec<DihedralType>, sincos: bool) -> Self {
        Self { types, sincos }
    }
}


impl Default for DihedralFeaturizer {
    fn default() -> Self {
        Self::new(vec![DihedralType::Phi, DihedralType::Psi], true)
    }
}


impl fmt::Display for DihedralFeaturizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types = self.types.iter().map(|t| format!("{:?}", t.name())).collect::<Vec<_>>();
        write!(f, "DihedralFeaturizer(sincos={}, types=[{}])", self.sincos, types.join(", "))
    }
}


impl Featurizer for DihedralFeaturizer {
    fn partial_transform(&self, traj: &Trajectory) -> Result<nd::Array2<f64>> {
        let quartets = self.types.iter()
            .map(|t| t.quartets(&traj.topology))
            .collect::<Vec<_>>();
        let nangles = quartets.iter().map(|q| q.len()).sum::<usize>();
        let nfeatures = if self.sincos { 2 * nangles } else { nangles };

        par_rows(traj.nframes(), nfeatures, |iframe| {
            let mut row = Vec::with_capacity(nfeatures);
            for group in quartets.iter() {
                let angles = group.iter()
                    .map(|q| {
                        let [p0, p1, p2, p3] = q.map(|i| traj.position(iframe, i));
                        dihedral(p0, p1, p2, p3)
                    })
                    .collect::<Vec<f64>>();
                if self.sincos {
                    row.extend(angles.iter().map(|a| a.sin()));
                    row.extend(angles.iter().map(|a| a.cos()));
                } else {
                    row.extend(angles);
                }
            }
            row
        })
    }
}
