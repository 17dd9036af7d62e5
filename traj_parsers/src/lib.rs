//! Trajectory and topology input on top of chemfiles.
//!
//! Supported formats are PDB, GRO, XYZ and XTC, each optionally compressed. Everything is
//! converted to nanometres on the way in.
use std::path::Path;
use std::sync::Arc;

use shared::{
    bail,
    Context,
    Result,
};

pub mod templates;
pub mod topology;
pub mod trajectory;
pub mod reader;
pub mod iterload;

pub use topology::{Atom, Chain, Residue, Topology};
pub use trajectory::{Frame, FrameReader, Trajectory};
pub use reader::ChemfilesReader;
pub use iterload::{iterload, IterLoad};


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrajFormat {
    Pdb,
    Gro,
    Xyz,
    Xtc,
}


impl TrajFormat {
    /// Format from the file extension, skipping a trailing `.gz`, `.bz2` or `.xz`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path.file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid file name {:?}.", path))?
            .to_ascii_lowercase();

        let stem = [".gz", ".bz2", ".xz"].iter()
            .find_map(|ext| name.strip_suffix(ext))
            .unwrap_or(name.as_str());

        Ok(match stem.rsplit_once('.').map(|(_, ext)| ext) {
            Some("pdb") => Self::Pdb,
            Some("gro") => Self::Gro,
            Some("xyz") => Self::Xyz,
            Some("xtc") => Self::Xtc,
            _ => bail!("Unsupported trajectory format of {:?}, expecting one of pdb, gro, xyz or xtc.", path),
        })
    }
}


/// Opens a frame reader for `path`, picking the format from its extension.
pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn FrameReader>> {
    let path = path.as_ref();
    let format = TrajFormat::from_path(path)?;
    Ok(Box::new(ChemfilesReader::open(path, format)?))
}


/// Reads a topology from the first frame of a PDB or GRO file.
pub fn load_topology<P: AsRef<Path>>(path: P) -> Result<Topology> {
    let path = path.as_ref();
    match TrajFormat::from_path(path)? {
        TrajFormat::Pdb | TrajFormat::Gro => (),
        _ => bail!("Cannot read a topology from {:?}, use a pdb or gro file.", path),
    }

    open_reader(path)?
        .topology()
        .cloned()
        .with_context(|| format!("No atoms found in topology file {:?}.", path))
}


/// The first frame of `path` as a one-frame trajectory.
pub fn load_first_frame<P: AsRef<Path>>(path: P, top: Option<Arc<Topology>>) -> Result<Trajectory> {
    let path = path.as_ref();
    iterload(path, top, 1, 1)?
        .next()
        .with_context(|| format!("No frames found in {:?}.", path))?
}


#[cfg(test)]
pub(crate) mod fixtures {
    pub const DIALANINE_PDB: &str = "\
CRYST1   20.000   20.000   20.000  90.00  90.00  90.00 P 1           1
MODEL        1
ATOM      1  N   ALA A   1       0.000   0.000   0.000  1.00  0.00           N
ATOM      2  CA  ALA A   1       1.458   0.000   0.000  1.00  0.00           C
ATOM      3  C   ALA A   1       2.009   1.420   0.000  1.00  0.00           C
ATOM      4  O   ALA A   1       1.251   2.390   0.000  1.00  0.00           O
ATOM      5  CB  ALA A   1       1.988  -0.773  -1.199  1.00  0.00           C
ATOM      6  N   ALA A   2       3.332   1.536   0.000  1.00  0.00           N
ATOM      7  CA  ALA A   2       3.970   2.845   0.000  1.00  0.00           C
ATOM      8  C   ALA A   2       5.486   2.701   0.000  1.00  0.00           C
ATOM      9  O   ALA A   2       6.009   1.582   0.000  1.00  0.00           O
TER
HETATM   10  O   HOH B   3      10.000  10.000  10.000  1.00  0.00           O
CONECT    1    2
CONECT    2    3    5
ENDMDL
MODEL        2
ATOM      1  N   ALA A   1       0.100   0.000   0.000  1.00  0.00           N
ATOM      2  CA  ALA A   1       1.558   0.000   0.000  1.00  0.00           C
ATOM      3  C   ALA A   1       2.109   1.420   0.000  1.00  0.00           C
ATOM      4  O   ALA A   1       1.351   2.390   0.000  1.00  0.00           O
ATOM      5  CB  ALA A   1       2.088  -0.773  -1.199  1.00  0.00           C
ATOM      6  N   ALA A   2       3.432   1.536   0.000  1.00  0.00           N
ATOM      7  CA  ALA A   2       4.070   2.845   0.000  1.00  0.00           C
ATOM      8  C   ALA A   2       5.586   2.701   0.000  1.00  0.00           C
ATOM      9  O   ALA A   2       6.109   1.582   0.000  1.00  0.00           O
TER
HETATM   10  O   HOH B   3      10.100  10.000  10.000  1.00  0.00           O
ENDMDL
END
";

    pub const WATER_GRO: &str = "\
Water t=   0.00000 step= 0
    6
    1SOL     OW    1   0.126   1.624   1.679
    1SOL    HW1    2   0.226   1.621   1.679
    1SOL    HW2    3   0.093   1.561   1.750
    2SOL     OW    4   0.916   0.520   1.089
    2SOL    HW1    5   0.964   0.448   1.138
    2SOL    HW2    6   0.902   0.591   1.156
   1.86206   1.86206   1.86206
Water t=   2.50000 step= 5
    6
    1SOL     OW    1   0.126   1.624   1.679
    1SOL    HW1    2   0.226   1.621   1.679
    1SOL    HW2    3   0.093   1.561   1.750
    2SOL     OW    4   0.916   0.520   1.089
    2SOL    HW1    5   0.964   0.448   1.138
    2SOL    HW2    6   0.902   0.591   1.160
   1.86206   1.86206   1.86206
";
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_format_from_path() {
        assert_eq!(TrajFormat::from_path("a/b/traj.xtc").unwrap(), TrajFormat::Xtc);
        assert_eq!(TrajFormat::from_path("conf.GRO").unwrap(), TrajFormat::Gro);
        assert_eq!(TrajFormat::from_path("top.pdb.gz").unwrap(), TrajFormat::Pdb);
        assert_eq!(TrajFormat::from_path("frames.xyz.bz2").unwrap(), TrajFormat::Xyz);
        assert!(TrajFormat::from_path("traj.dcd").is_err());
        assert!(TrajFormat::from_path("noext").is_err());
        assert!(TrajFormat::from_path("file.gz").is_err());
    }

    #[test]
    fn test_load_topology() {
        let dir = tempdir().unwrap();
        let pdb = dir.path().join("top.pdb");
        fs::write(&pdb, fixtures::DIALANINE_PDB).unwrap();
        let top = load_topology(&pdb).unwrap();
        assert_eq!(top.natoms(), 10);

        let gro = dir.path().join("top.gro");
        fs::write(&gro, fixtures::WATER_GRO).unwrap();
        assert_eq!(load_topology(&gro).unwrap().nresidues(), 2);

        let xyz = dir.path().join("top.xyz");
        fs::write(&xyz, "1\n\nO 0 0 0\n").unwrap();
        assert!(load_topology(&xyz).is_err());
        assert!(load_topology(dir.path().join("missing.pdb")).is_err());
    }

    #[test]
    fn test_load_first_frame() {
        let dir = tempdir().unwrap();
        let gro = dir.path().join("water.gro");
        fs::write(&gro, fixtures::WATER_GRO).unwrap();

        let frame = load_first_frame(&gro, None).unwrap();
        assert_eq!(frame.nframes(), 1);
        assert_eq!(frame.natoms(), 6);
        assert!(frame.cell(0).is_some());
    }
}
