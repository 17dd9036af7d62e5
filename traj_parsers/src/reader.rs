use std::path::{Path, PathBuf};
use std::sync::Once;

use chemfiles::{CellShape, Property};
use shared::{
    geometry::lengths_and_angles_to_box_vectors,
    warn,
    Context,
    Result,
};

use crate::TrajFormat;
use crate::topology::{guess_element, normalize_element, Topology};
use crate::trajectory::{Frame, FrameReader};


const ANGSTROM_TO_NM: f64 = 0.1;


/// Sends chemfiles' warnings to our logger instead of its default stderr printer.
fn route_warnings() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        chemfiles::set_warning_callback(|message: &str| warn!("chemfiles: {}", message));
    });
}


/// Frame reader over any format chemfiles understands, with compressed files decompressed on the
/// fly. Positions and boxes are converted to nanometres.
pub struct ChemfilesReader {
    path:       PathBuf,
    trajectory: chemfiles::Trajectory,
    buffer:     chemfiles::Frame,
    nsteps:     usize,
    /// Steps already pulled out of `trajectory`.
    istep:      usize,
    natoms:     usize,
    topology:   Option<Topology>,
    /// The first frame, read ahead for the atom count and topology.
    pending:    Option<Frame>,
}


impl ChemfilesReader {
    pub fn open(path: &Path, format: TrajFormat) -> Result<Self> {
        route_warnings();

        let mut trajectory = chemfiles::Trajectory::open(path, 'r')
            .with_context(|| format!("Failed to open trajectory {:?}.", path))?;
        let nsteps = trajectory.nsteps();

        let mut ret = Self {
            path: path.to_path_buf(),
            trajectory,
            buffer: chemfiles::Frame::new(),
            nsteps,
            istep: 0,
            natoms: 0,
            topology: None,
            pending: None,
        };

        if nsteps > 0 {
            ret.pull()?;
            ret.natoms = ret.buffer.size();
            // XTC stores coordinates only, chemfiles fills in nameless atoms
            if format != TrajFormat::Xtc {
                ret.topology = Some(convert_topology(&ret.buffer.topology())
                    .with_context(|| format!("Invalid topology in {:?}.", path))?);
            }
            ret.pending = Some(convert_frame(&ret.buffer));
        }

        Ok(ret)
    }

    fn pull(&mut self) -> Result<()> {
        self.trajectory.read(&mut self.buffer)
            .with_context(|| format!("Failed to read frame {} of {:?}.", self.istep, self.path))?;
        self.istep += 1;
        Ok(())
    }
}


impl FrameReader for ChemfilesReader {
    fn natoms(&self) -> usize { self.natoms }

    fn topology(&self) -> Option<&Topology> { self.topology.as_ref() }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(frame) = self.pending.take() {
            return Ok(Some(frame));
        }
        if self.istep >= self.nsteps {
            return Ok(None);
        }
        self.pull()?;
        Ok(Some(convert_frame(&self.buffer)))
    }
}


fn convert_frame(frame: &chemfiles::Frame) -> Frame {
    let positions = frame.positions().iter()
        .map(|p| p.map(|v| (v * ANGSTROM_TO_NM) as f32))
        .collect();

    let cell = frame.cell();
    let cell = match cell.shape() {
        CellShape::Infinite => None,
        _ => {
            let lengths = cell.lengths().map(|v| v * ANGSTROM_TO_NM);
            let vectors = lengths_and_angles_to_box_vectors(lengths, cell.angles());
            Some(vectors.map(|row| row.map(|v| v as f32)))
        },
    };

    let time = match frame.get("time") {
        Some(Property::Double(t)) => Some(t as f32),
        _ => None,
    };

    Frame { time, positions, cell }
}


/// Builds our topology from the one chemfiles attached to a frame.
///
/// Consecutive atoms of one chemfiles residue form a residue, atoms outside of any residue are
/// grouped into `UNK` residues, and a new chain starts whenever the `chainid` property changes.
/// Bonds from the file are kept and completed with the standard residue templates.
pub fn convert_topology(top: &chemfiles::Topology) -> Result<Topology> {
    let natoms = top.size();

    let mut atom_residue = vec![None; natoms];
    for ires in 0 .. top.residues_count() {
        let Some(res) = top.residue(ires) else { continue };
        for iatom in res.atoms() {
            if let Some(slot) = atom_residue.get_mut(iatom) {
                *slot = Some(ires);
            }
        }
    }

    let mut ret = Topology::new();
    let mut current: Option<(Option<u64>, usize)> = None;
    let mut chain: Option<(Option<String>, usize)> = None;

    for (iatom, &key) in atom_residue.iter().enumerate() {
        let residue = match current {
            Some((k, residue)) if k == key => residue,
            _ => {
                let (name, res_seq, chain_id) = match key.and_then(|r| top.residue(r)) {
                    Some(res) => {
                        let chain_id = match res.get("chainid") {
                            Some(Property::String(id)) => Some(id),
                            _ => None,
                        };
                        let res_seq = res.id().unwrap_or(ret.nresidues() as i64 + 1);
                        (res.name(), res_seq, chain_id)
                    },
                    None => ("UNK".to_string(), ret.nresidues() as i64 + 1, None),
                };

                let ichain = match chain.as_ref() {
                    Some((id, ichain)) if *id == chain_id => *ichain,
                    _ => {
                        let ichain = ret.add_chain(chain_id.as_deref().unwrap_or("A"));
                        chain = Some((chain_id, ichain));
                        ichain
                    },
                };

                let residue = ret.add_residue(&name, res_seq, ichain);
                current = Some((key, residue));
                residue
            },
        };

        let atom = top.atom(iatom);
        let name = atom.name();
        let element = if atom.atomic_number() > 0 {
            normalize_element(&atom.atomic_type())
        } else {
            guess_element(&name)
        };
        ret.add_atom(&name, &element, residue);
    }

    for [a, b] in top.bonds() {
        ret.add_bond(a, b)?;
    }
    ret.add_standard_bonds()?;

    Ok(ret)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use crate::fixtures::{DIALANINE_PDB, WATER_GRO};

    fn open(dir: &Path, name: &str, content: &str) -> ChemfilesReader {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        let format = TrajFormat::from_path(&path).unwrap();
        ChemfilesReader::open(&path, format).unwrap()
    }

    #[test]
    fn test_pdb_models() {
        let dir = tempdir().unwrap();
        let mut pdb = open(dir.path(), "dialanine.pdb", DIALANINE_PDB);
        assert_eq!(pdb.natoms(), 10);

        let top = pdb.topology().unwrap().clone();
        assert_eq!(top.nchains(), 2);
        assert_eq!(top.nresidues(), 3);
        assert_eq!(top.residues[1].name, "ALA");
        assert_eq!(top.residues[1].res_seq, 2);
        assert_eq!(top.residues[2].name, "HOH");
        assert_eq!(top.atoms[1].name, "CA");
        assert_eq!(top.atoms[1].element, "C");
        assert!(top.bond_set().contains(&(1, 4)));
        // peptide bond from the templates
        assert!(top.bond_set().contains(&(2, 5)));

        let f1 = pdb.read_frame().unwrap().unwrap();
        assert!((f1.positions[1][0] - 0.1458).abs() < 1E-6);
        let cell = f1.cell.unwrap();
        assert!((cell[0][0] - 2.0).abs() < 1E-6);
        assert!(cell[0][1].abs() < 1E-6);

        let f2 = pdb.read_frame().unwrap().unwrap();
        assert!((f2.positions[0][0] - 0.01).abs() < 1E-6);
        assert!((f2.positions[9][0] - 1.01).abs() < 1E-6);

        assert!(pdb.read_frame().unwrap().is_none());
        assert!(pdb.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_pdb_without_conect() {
        let dir = tempdir().unwrap();
        let txt = DIALANINE_PDB.lines()
            .filter(|l| !l.starts_with("CONECT"))
            .map(|l| format!("{}\n", l))
            .collect::<String>();
        let pdb = open(dir.path(), "bare.pdb", &txt);
        let bonds = pdb.topology().unwrap().bond_set();

        // N-CA, CA-C, C-O, CA-CB, C-N(next)
        for pair in [(0, 1), (1, 2), (2, 3), (1, 4), (2, 5)] {
            assert!(bonds.contains(&pair), "missing bond {:?}", pair);
        }
        assert!(!bonds.iter().any(|&(i, j)| i == 9 || j == 9));
    }

    #[test]
    fn test_gro_frames() {
        let dir = tempdir().unwrap();
        let mut gro = open(dir.path(), "water.gro", WATER_GRO);
        assert_eq!(gro.natoms(), 6);

        let top = gro.topology().unwrap().clone();
        assert_eq!(top.nchains(), 1);
        assert_eq!(top.nresidues(), 2);
        assert_eq!(top.residues[1].name, "SOL");
        assert_eq!(top.residues[1].res_seq, 2);
        assert_eq!(top.atoms[4].name, "HW1");
        assert_eq!(top.atoms[4].element, "H");
        assert!(top.bond_set().contains(&(3, 4)));

        let f1 = gro.read_frame().unwrap().unwrap();
        assert!((f1.positions[1][0] - 0.226).abs() < 1E-6);
        assert!((f1.cell.unwrap()[1][1] - 1.86206).abs() < 1E-5);

        let f2 = gro.read_frame().unwrap().unwrap();
        assert!((f2.positions[5][2] - 1.160).abs() < 1E-6);

        assert!(gro.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_xyz_frames() {
        let txt = "\
3
water
O   0.000  0.000  0.000
H   0.957  0.000  0.000
H  -0.240  0.927  0.000
3
water, displaced
O   1.000  0.000  0.000
H   1.957  0.000  0.000
H   0.760  0.927  0.000
";
        let dir = tempdir().unwrap();
        let mut xyz = open(dir.path(), "water.xyz", txt);
        assert_eq!(xyz.natoms(), 3);
        let top = xyz.topology().unwrap();
        assert_eq!(top.atoms[1].element, "H");
        assert_eq!(top.nresidues(), 1);
        assert_eq!(top.residues[0].name, "UNK");

        let f1 = xyz.read_frame().unwrap().unwrap();
        assert!((f1.positions[1][0] - 0.0957).abs() < 1E-6);
        assert!(f1.cell.is_none());
        let f2 = xyz.read_frame().unwrap().unwrap();
        assert!((f2.positions[0][0] - 0.1).abs() < 1E-6);
        assert!(xyz.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.pdb");
        assert!(ChemfilesReader::open(&path, TrajFormat::Pdb).is_err());
    }
}
