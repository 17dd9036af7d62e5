use std::collections::HashSet;
use std::fmt;

use shared::{
    bail,
    Result,
};

use crate::templates;


/// Residue names treated as protein by the contact and dihedral featurizers.
pub const PROTEIN_RESIDUES: &[&str] = &[
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
    "ASH", "GLH", "LYN", "CYX", "CYM", "HID", "HIE", "HIP", "HSD", "HSE", "HSP",
];

pub const BACKBONE_ATOMS: &[&str] = &["N", "CA", "C", "O", "H", "HA", "OXT", "H1", "H2", "H3"];


#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
    pub index:   usize,
    pub name:    String,
    pub element: String,
    pub residue: usize,
}


#[derive(Clone, Debug, PartialEq)]
pub struct Residue {
    pub index:   usize,
    pub name:    String,
    pub res_seq: i64,
    pub chain:   usize,
    pub atoms:   Vec<usize>,
}


#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    pub index:    usize,
    pub id:       String,
    pub residues: Vec<usize>,
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct Topology {
    pub atoms:    Vec<Atom>,
    pub residues: Vec<Residue>,
    pub chains:   Vec<Chain>,
    pub bonds:    Vec<[usize; 2]>,
}


impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain holding one residue `UNK`, with atoms named after their elements.
    pub fn from_elements<S: AsRef<str>>(elements: &[S]) -> Self {
        let mut top = Self::new();
        let chain = top.add_chain("A");
        let residue = top.add_residue("UNK", 1, chain);
        for element in elements {
            let element = element.as_ref();
            top.add_atom(element, &normalize_element(element), residue);
        }
        top
    }

    pub fn natoms(&self) -> usize { self.atoms.len() }
    pub fn nresidues(&self) -> usize { self.residues.len() }
    pub fn nchains(&self) -> usize { self.chains.len() }

    pub fn add_chain(&mut self, id: &str) -> usize {
        let index = self.chains.len();
        self.chains.push(Chain { index, id: id.to_string(), residues: vec![] });
        index
    }

    pub fn add_residue(&mut self, name: &str, res_seq: i64, chain: usize) -> usize {
        let index = self.residues.len();
        self.residues.push(Residue {
            index,
            name: name.to_string(),
            res_seq,
            chain,
            atoms: vec![],
        });
        self.chains[chain].residues.push(index);
        index
    }

    pub fn add_atom(&mut self, name: &str, element: &str, residue: usize) -> usize {
        let index = self.atoms.len();
        self.atoms.push(Atom {
            index,
            name: name.to_string(),
            element: element.to_string(),
            residue,
        });
        self.residues[residue].atoms.push(index);
        index
    }

    pub fn add_bond(&mut self, a: usize, b: usize) -> Result<()> {
        if a >= self.natoms() || b >= self.natoms() {
            bail!("Bond ({}, {}) refers to atoms outside of the topology with {} atoms.", a, b, self.natoms());
        }
        let bond = if a < b { [a, b] } else { [b, a] };
        if a != b && !self.bonds.contains(&bond) {
            self.bonds.push(bond);
        }
        Ok(())
    }

    /// Adds the bonds of standard residues: heavy atoms and hydrogens of amino acids, peptide bonds
    /// to the next amino acid of the same chain, and the O-H bonds of waters. Existing bonds are
    /// kept.
    pub fn add_standard_bonds(&mut self) -> Result<()> {
        let mut bonds = vec![];

        for res in self.residues.iter() {
            let find = |name: &str| self.atom_in_residue(res.index, name);
            let is_water = templates::is_water(&res.name);

            if let Some(template) = templates::heavy_atom_bonds(&res.name) {
                bonds.extend(template.filter_map(|(a, b)| Some([find(a)?, find(b)?])));

                let next_n = self.next_in_chain(res.index)
                    .filter(|&next| templates::is_amino_acid(&self.residues[next].name))
                    .and_then(|next| self.atom_in_residue(next, "N"));
                if let (Some(c), Some(n)) = (find("C"), next_n) {
                    bonds.push([c, n]);
                }
            } else if !is_water {
                continue;
            }

            let (hydrogens, heavy): (Vec<usize>, Vec<usize>) = res.atoms.iter()
                .copied()
                .partition(|&i| self.is_hydrogen(i));
            let heavy_names = heavy.iter()
                .map(|&i| self.atoms[i].name.as_str())
                .collect::<Vec<_>>();

            for h in hydrogens {
                let parent = if is_water {
                    heavy.first().copied()
                } else {
                    templates::hydrogen_parent(&self.atoms[h].name, &heavy_names).and_then(find)
                };
                if let Some(parent) = parent {
                    bonds.push([parent, h]);
                }
            }
        }

        for [a, b] in bonds {
            self.add_bond(a, b)?;
        }
        Ok(())
    }

    /// Bonded pairs stored as `(min, max)`.
    pub fn bond_set(&self) -> HashSet<(usize, usize)> {
        self.bonds.iter().map(|b| (b[0], b[1])).collect()
    }

    /// Index of the atom called `name` in residue `residue`.
    pub fn atom_in_residue(&self, residue: usize, name: &str) -> Option<usize> {
        self.residues[residue].atoms.iter()
            .copied()
            .find(|&i| self.atoms[i].name == name)
    }

    pub fn is_protein(&self, residue: usize) -> bool {
        PROTEIN_RESIDUES.contains(&self.residues[residue].name.as_str())
    }

    pub fn is_hydrogen(&self, atom: usize) -> bool {
        self.atoms[atom].element == "H"
    }

    pub fn is_sidechain(&self, atom: usize) -> bool {
        let residue = self.atoms[atom].residue;
        self.is_protein(residue) && !BACKBONE_ATOMS.contains(&self.atoms[atom].name.as_str())
    }

    /// The residue following `residue` in the same chain, if any.
    pub fn next_in_chain(&self, residue: usize) -> Option<usize> {
        let chain = &self.chains[self.residues[residue].chain];
        let pos = chain.residues.iter().position(|&r| r == residue)?;
        chain.residues.get(pos + 1).copied()
    }

    /// The residue preceding `residue` in the same chain, if any.
    pub fn prev_in_chain(&self, residue: usize) -> Option<usize> {
        let chain = &self.chains[self.residues[residue].chain];
        let pos = chain.residues.iter().position(|&r| r == residue)?;
        pos.checked_sub(1).map(|p| chain.residues[p])
    }
}


impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Topology with {} chains, {} residues, {} atoms, {} bonds>",
            self.nchains(), self.nresidues(), self.natoms(), self.bonds.len())
    }
}


/// Capitalize an element symbol, `"CL"` -> `"Cl"`.
pub fn normalize_element(symbol: &str) -> String {
    let mut chars = symbol.trim().chars().filter(|c| c.is_ascii_alphabetic());
    match chars.next() {
        Some(first) => std::iter::once(first.to_ascii_uppercase())
            .chain(chars.map(|c| c.to_ascii_lowercase()))
            .collect(),
        None => String::new(),
    }
}


/// Guess the element from an atom name when the file does not carry it, e.g. `"CA"` -> `"C"`,
/// `"1HB"` -> `"H"`.
pub fn guess_element(atom_name: &str) -> String {
    const TWO_LETTER: &[&str] = &["CL", "BR", "NA", "MG", "ZN", "FE", "MN", "CU", "LI"];

    let name = atom_name.trim().trim_start_matches(|c: char| c.is_ascii_digit()).to_ascii_uppercase();
    if TWO_LETTER.iter().any(|t| name == *t) {
        return normalize_element(&name[..2]);
    }
    name.chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_string())
        .unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::*;

    fn dipeptide() -> Topology {
        let mut top = Topology::new();
        let a = top.add_chain("A");
        let b = top.add_chain("B");
        let r0 = top.add_residue("ALA", 1, a);
        let r1 = top.add_residue("GLY", 2, a);
        let r2 = top.add_residue("HOH", 3, b);
        for name in ["N", "CA", "C", "O", "CB", "HB1"] {
            top.add_atom(name, &guess_element(name), r0);
        }
        for name in ["N", "CA", "C", "O"] {
            top.add_atom(name, &guess_element(name), r1);
        }
        top.add_atom("O", "O", r2);
        top
    }

    #[test]
    fn test_build() {
        let top = dipeptide();
        assert_eq!(top.natoms(), 11);
        assert_eq!(top.nresidues(), 3);
        assert_eq!(top.nchains(), 2);
        assert_eq!(top.atom_in_residue(1, "CA"), Some(7));
        assert_eq!(top.atom_in_residue(1, "CB"), None);
        assert!(top.is_protein(0));
        assert!(!top.is_protein(2));
        assert!(top.is_sidechain(4));
        assert!(!top.is_sidechain(1));
        assert!(top.is_hydrogen(5));
        assert_eq!(top.next_in_chain(0), Some(1));
        assert_eq!(top.next_in_chain(1), None);
        assert_eq!(top.prev_in_chain(1), Some(0));
        assert_eq!(top.prev_in_chain(2), None);
    }

    #[test]
    fn test_bonds() {
        let mut top = dipeptide();
        top.add_bond(1, 0).unwrap();
        top.add_bond(0, 1).unwrap();
        top.add_bond(2, 2).unwrap();
        assert_eq!(top.bonds, vec![[0, 1]]);
        assert!(top.bond_set().contains(&(0, 1)));
        assert!(top.add_bond(0, 100).is_err());
    }

    #[test]
    fn test_standard_bonds() {
        let mut top = Topology::new();
        let a = top.add_chain("A");
        let r0 = top.add_residue("ALA", 1, a);
        for name in ["N", "H", "CA", "HA", "C", "O", "CB", "1HB"] {
            top.add_atom(name, &guess_element(name), r0);
        }
        let r1 = top.add_residue("GLY", 2, a);
        for name in ["N", "CA", "C", "O", "OXT"] {
            top.add_atom(name, &guess_element(name), r1);
        }
        let r2 = top.add_residue("SOL", 3, a);
        for name in ["OW", "HW1", "HW2"] {
            top.add_atom(name, &guess_element(name), r2);
        }
        top.add_standard_bonds().unwrap();

        let bonds = top.bond_set();
        // N-CA, N-H, CA-HA, CA-C, C-O, CA-CB, CB-1HB, peptide C-N
        for pair in [(0, 2), (0, 1), (2, 3), (2, 4), (4, 5), (2, 6), (6, 7), (4, 8)] {
            assert!(bonds.contains(&pair), "missing bond {:?}", pair);
        }
        assert!(bonds.contains(&(10, 12)));
        assert!(bonds.contains(&(13, 14)));
        assert!(bonds.contains(&(13, 15)));
        // nothing bonds the water to the protein
        assert!(!bonds.iter().any(|&(i, j)| i < 13 && j >= 13));
        assert_eq!(top.bonds.len(), 8 + 4 + 2);

        // adding again keeps the bond list unchanged
        top.add_standard_bonds().unwrap();
        assert_eq!(top.bonds.len(), 14);
    }

    #[test]
    fn test_elements() {
        assert_eq!(guess_element("CA"), "C");
        assert_eq!(guess_element("1HB"), "H");
        assert_eq!(guess_element("CL"), "Cl");
        assert_eq!(guess_element(" OW "), "O");
        assert_eq!(normalize_element("CL"), "Cl");
        assert_eq!(normalize_element(" h"), "H");

        let top = Topology::from_elements(&["C", "o", "H"]);
        assert_eq!(top.natoms(), 3);
        assert_eq!(top.atoms[1].element, "O");
        assert_eq!(top.nresidues(), 1);
    }
}
