use std::fs;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use shared::{
    log,
    bail,
    ensure,
    Context,
    Result,
};
use traj_parsers::{
    load_first_frame,
    Topology,
    TrajFormat,
};

use crate::core::{Featurizer, MixtapeConfig};
use crate::featurizers::{
    AtomPairsFeaturizer,
    ContactFeaturizer,
    ContactScheme,
    Contacts,
    DihedralFeaturizer,
    DihedralType,
    DRIDFeaturizer,
    SuperposeFeaturizer,
};
use crate::index_file::{load_indices, load_pairs};


/// Which featurizer to run and its parameters, selected by `kind`.
///
/// Index arguments are either paths to index files or inline lists such as `"0..9 12"`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind")]
pub enum FeaturizerSpec {
    #[serde(rename = "dihedral", alias = "DihedralFeaturizer")]
    Dihedral {
        #[serde(default = "FeaturizerSpec::default_types")]
        types: Vec<DihedralType>,
        #[serde(default = "FeaturizerSpec::default_true")]
        sincos: bool,
    },

    #[serde(rename = "atom-pairs", alias = "AtomPairsFeaturizer")]
    AtomPairs {
        pair_indices: String,
        #[serde(default)]
        periodic: bool,
        #[serde(default = "FeaturizerSpec::default_exponent")]
        exponent: f64,
    },

    #[serde(rename = "superpose", alias = "SuperposeFeaturizer")]
    Superpose {
        reference_traj: PathBuf,
        atom_indices: String,
        superpose_atom_indices: Option<String>,
    },

    #[serde(rename = "drid", alias = "DRIDFeaturizer")]
    Drid {
        atom_indices: Option<String>,
    },

    #[serde(rename = "contact", alias = "ContactFeaturizer")]
    Contact {
        #[serde(default = "FeaturizerSpec::default_contacts")]
        contacts: String,
        #[serde(default = "FeaturizerSpec::default_scheme")]
        scheme: ContactScheme,
        #[serde(default = "FeaturizerSpec::default_true")]
        ignore_nonprotein: bool,
    },
}


impl FeaturizerSpec {
    fn default_types() -> Vec<DihedralType> { vec![DihedralType::Phi, DihedralType::Psi] }
    fn default_true() -> bool { true }
    fn default_exponent() -> f64 { 1.0 }
    fn default_contacts() -> String { "all".to_string() }
    fn default_scheme() -> ContactScheme { ContactScheme::ClosestHeavy }

    pub fn kind(&self) -> &'static str {
        use FeaturizerSpec::*;
        match self {
            Dihedral  { .. } => "dihedral",
            AtomPairs { .. } => "atom-pairs",
            Superpose { .. } => "superpose",
            Drid      { .. } => "drid",
            Contact   { .. } => "contact",
        }
    }

    /// Problems found in the featurizer parameters, empty if there is none.
    pub fn problems(&self) -> Vec<String> {
        use FeaturizerSpec::*;
        let mut ret = vec![];

        match self {
            Dihedral { types, .. } => {
                if types.is_empty() {
                    ret.push("Field 'types' must name at least one dihedral type.".to_string());
                }
            },
            AtomPairs { pair_indices, exponent, .. } => {
                if pair_indices.trim().is_empty() {
                    ret.push("Field 'pair_indices' cannot be empty.".to_string());
                }
                if !exponent.is_finite() {
                    ret.push("Field 'exponent' must be a finite number.".to_string());
                }
            },
            Superpose { reference_traj, atom_indices, .. } => {
                if !reference_traj.is_file() {
                    ret.push(format!("Field 'reference_traj' does not point to a valid file: {:?}.", reference_traj));
                }
                if atom_indices.trim().is_empty() {
                    ret.push("Field 'atom_indices' cannot be empty.".to_string());
                }
            },
            Drid { .. } => {},
            Contact { contacts, .. } => {
                if contacts.trim().is_empty() {
                    ret.push("Field 'contacts' cannot be empty, use \"all\" for every residue pair.".to_string());
                }
            },
        }

        ret
    }

    /// Resolves index arguments and reference structures into a ready featurizer.
    ///
    /// `top` is only used for a reference trajectory without its own topology.
    pub fn build(&self, top: Option<&Arc<Topology>>) -> Result<Box<dyn Featurizer>> {
        use FeaturizerSpec::*;

        Ok(match self {
            Dihedral { types, sincos } => Box::new(DihedralFeaturizer::new(types.clone(), *sincos)),
            AtomPairs { pair_indices, periodic, exponent } => {
                let pairs = load_pairs(pair_indices)?;
                Box::new(AtomPairsFeaturizer::new(pairs, *periodic, *exponent)?)
            },
            Superpose { reference_traj, atom_indices, superpose_atom_indices } => {
                let format = TrajFormat::from_path(reference_traj)?;
                let ref_top = if format == TrajFormat::Xtc { top.cloned() } else { None };
                let reference = load_first_frame(reference_traj, ref_top)
                    .with_context(|| format!("Failed to load reference structure {:?}.", reference_traj))?;
                let atom_indices = load_indices(atom_indices)?;
                let superpose_atom_indices = superpose_atom_indices.as_deref()
                    .map(load_indices)
                    .transpose()?;
                Box::new(SuperposeFeaturizer::new(&reference, atom_indices, superpose_atom_indices)?)
            },
            Drid { atom_indices } => {
                let atom_indices = atom_indices.as_deref()
                    .map(load_indices)
                    .transpose()?;
                Box::new(DRIDFeaturizer::new(atom_indices))
            },
            Contact { contacts, scheme, ignore_nonprotein } => {
                let contacts = if contacts.trim() == "all" {
                    Contacts::All
                } else {
                    Contacts::Pairs(load_pairs(contacts)?)
                };
                Box::new(ContactFeaturizer::new(contacts, *scheme, *ignore_nonprotein))
            },
        })
    }
}


impl Default for FeaturizerSpec {
    fn default() -> Self {
        Self::Dihedral {
            types: Self::default_types(),
            sincos: true,
        }
    }
}


impl fmt::Display for FeaturizerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use FeaturizerSpec::*;

        writeln!(f, "[featurizer]")?;
        writeln!(f, " {:>20} = {:?}", "kind", self.kind())?;

        match self {
            Dihedral { types, sincos } => {
                let types = types.iter().map(|t| t.name()).collect::<Vec<_>>();
                writeln!(f, " {:>20} = {:?}", "types", types)?;
                writeln!(f, " {:>20} = {}",   "sincos", sincos)?;
            },
            AtomPairs { pair_indices, periodic, exponent } => {
                writeln!(f, " {:>20} = {:?}", "pair_indices", pair_indices)?;
                writeln!(f, " {:>20} = {}",   "periodic", periodic)?;
                writeln!(f, " {:>20} = {:?}", "exponent", exponent)?;
            },
            Superpose { reference_traj, atom_indices, superpose_atom_indices } => {
                writeln!(f, " {:>20} = {:?}", "reference_traj", reference_traj)?;
                writeln!(f, " {:>20} = {:?}", "atom_indices", atom_indices)?;
                if let Some(idx) = superpose_atom_indices {
                    writeln!(f, " {:>20} = {:?}", "superpose_atom_indices", idx)?;
                } else {
                    writeln!(f, "#{:>20} = \"0..9\" # defaults to atom_indices", "superpose_atom_indices")?;
                }
            },
            Drid { atom_indices } => {
                if let Some(idx) = atom_indices {
                    writeln!(f, " {:>20} = {:?}", "atom_indices", idx)?;
                } else {
                    writeln!(f, "#{:>20} = \"atom_indices.dat\" # all atoms if not set", "atom_indices")?;
                }
            },
            Contact { contacts, scheme, ignore_nonprotein } => {
                writeln!(f, " {:>20} = {:?}", "contacts", contacts)?;
                writeln!(f, " {:>20} = {:?}", "scheme", scheme.name())?;
                writeln!(f, " {:>20} = {}",   "ignore_nonprotein", ignore_nonprotein)?;
            },
        }

        Ok(())
    }
}


#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeaturizeConfig {
    /// Glob patterns, processed in the given order.
    trjs: Vec<String>,

    /// Used only if it names an existing file.
    top: Option<PathBuf>,

    /// Frames per chunk after striding, 0 loads each file at once.
    #[serde(default = "FeaturizeConfig::default_chunk")]
    chunk: usize,

    #[serde(default = "FeaturizeConfig::default_stride")]
    stride: usize,

    out: PathBuf,

    #[serde(default)]
    featurizer: FeaturizerSpec,
}


impl FeaturizeConfig {
    fn default_chunk() -> usize { 10000 }
    fn default_stride() -> usize { 1 }

    pub fn new(trjs: Vec<String>, top: Option<PathBuf>, chunk: usize, stride: usize, out: PathBuf, featurizer: FeaturizerSpec) -> Self {
        Self { trjs, top, chunk, stride, out, featurizer }
    }

    pub fn get_trjs(&self) -> &[String] { &self.trjs }
    pub fn get_top(&self) -> Option<&PathBuf> { self.top.as_ref() }
    pub fn get_chunk(&self) -> usize { self.chunk }
    pub fn get_stride(&self) -> usize { self.stride }
    pub fn get_out(&self) -> &PathBuf { &self.out }
    pub fn get_featurizer(&self) -> &FeaturizerSpec { &self.featurizer }

    /// Collects every problem of the config, then fails with all of them at once.
    pub fn check_config(&self) -> Result<()> {
        let mut ret = vec![];

        if self.trjs.is_empty() || self.trjs.iter().any(|p| p.trim().is_empty()) {
            ret.push("Field 'trjs' must hold at least one non-empty glob pattern.".to_string());
        }

        if self.stride == 0 {
            ret.push("Field 'stride' counts from 1, thus cannot be 0.".to_string());
        }

        if self.out.as_os_str().is_empty() {
            ret.push("Field 'out' cannot be empty.".to_string());
        }

        if self.out.is_file() {
            log::warn!("Field 'out' points to an existing file and it will be overwritten.");
        }

        ret.extend(self.featurizer.problems());

        if !ret.is_empty() {
            bail!("Invalid featurize config:\n    {}", ret.join("\n    "));
        }
        Ok(())
    }

    pub fn print_to_log(&self) {
        let input_print = format!("{}", self);
        let hashtag_line = "#".repeat(120);
        log::info!("Input file loaded. The formatted input is:\n\n{hashtag_line}\n{}\n{hashtag_line}\n\n", input_print);
    }
}


impl Default for FeaturizeConfig {
    fn default() -> Self {
        Self {
            trjs: vec!["trajectories/*.xtc".to_string()],
            top: Some(PathBuf::from("topology.pdb")),
            chunk: Self::default_chunk(),
            stride: Self::default_stride(),
            out: PathBuf::from("features.h5"),
            featurizer: FeaturizerSpec::default(),
        }
    }
}


impl fmt::Display for FeaturizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# mixtape config for trajectory featurization")?;
        writeln!(f)?;

        writeln!(f, " {:>20} = {:?}", "trjs", self.trjs)?;
        if let Some(top) = self.top.as_ref() {
            writeln!(f, " {:>20} = {:?}", "top", top)?;
        } else {
            writeln!(f, "#{:>20} = \"topology.pdb\" # required for xtc", "top")?;
        }
        writeln!(f, " {:>20} = {}",   "chunk", self.chunk)?;
        writeln!(f, " {:>20} = {}",   "stride", self.stride)?;
        writeln!(f, " {:>20} = {:?}", "out", self.out)?;
        writeln!(f)?;
        write!(f, "{}", self.featurizer)?;

        Ok(())
    }
}


impl MixtapeConfig for FeaturizeConfig {
    fn from_file<P>(fname: P) -> Result<Self>
    where P: AsRef<Path> {
        ensure!(fname.as_ref().is_file(), "Config file {:?} for FeaturizeConfig not available.", fname.as_ref());
        let raw = fs::read_to_string(fname.as_ref())?;
        let cfg = toml::from_str::<Self>(&raw)
            .with_context(|| format!("Failed to parse config file {:?}.", fname.as_ref()))?;
        cfg.check_config()?;
        Ok(cfg)
    }

    fn to_file<P>(&self, fname: P) -> Result<()>
    where P: AsRef<Path> {
        if fname.as_ref().is_file() {
            log::warn!("File {:?} exists, overwriting ...", fname.as_ref());
        }
        log::info!("Writing config to file {:?}", fname.as_ref());
        fs::write(fname.as_ref(), self.to_string())?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_deserialize() {
        let txt = r#"
        trjs = ["run1/*.xtc", "run2/*.xtc"]
        top = "top.pdb"
        stride = 2
        out = "dihedrals.h5"

        [featurizer]
        kind = "DihedralFeaturizer"
        types = ["phi", "chi1"]
        sincos = false
        "#;

        let actual_cfg: FeaturizeConfig = toml::from_str(txt).unwrap();
        let expect_cfg = FeaturizeConfig {
            trjs: vec!["run1/*.xtc".into(), "run2/*.xtc".into()],
            top: Some(PathBuf::from("top.pdb")),
            chunk: 10000,
            stride: 2,
            out: PathBuf::from("dihedrals.h5"),
            featurizer: FeaturizerSpec::Dihedral {
                types: vec![DihedralType::Phi, DihedralType::Chi1],
                sincos: false,
            },
        };

        assert_eq!(expect_cfg, actual_cfg);
    }

    #[test]
    fn test_featurizer_defaults() {
        let txt = r#"
        trjs = ["*.pdb"]
        out = "contacts.h5"

        [featurizer]
        kind = "contact"
        "#;
        let cfg: FeaturizeConfig = toml::from_str(txt).unwrap();
        assert_eq!(cfg.get_top(), None);
        assert_eq!(cfg.get_featurizer(), &FeaturizerSpec::Contact {
            contacts: "all".into(),
            scheme: ContactScheme::ClosestHeavy,
            ignore_nonprotein: true,
        });

        let txt = r#"
        trjs = ["*.pdb"]
        out = "pairs.h5"

        [featurizer]
        kind = "atom-pairs"
        pair_indices = "0 1 2 3"
        exponent = -1
        "#;
        let cfg: FeaturizeConfig = toml::from_str(txt).unwrap();
        assert_eq!(cfg.get_featurizer(), &FeaturizerSpec::AtomPairs {
            pair_indices: "0 1 2 3".into(),
            periodic: false,
            exponent: -1.0,
        });

        assert!(toml::from_str::<FeaturizeConfig>("trjs = []\nout = \"a.h5\"\nunknown = 1\n").is_err());
        assert!(toml::from_str::<FeaturizeConfig>("trjs = []\nout = \"a.h5\"\n[featurizer]\nkind = \"tica\"\n").is_err());
    }

    #[test]
    fn test_template_round_trip() {
        let dir = tempdir().unwrap();
        let specs = vec![
            FeaturizerSpec::default(),
            FeaturizerSpec::AtomPairs { pair_indices: "pairs.dat".into(), periodic: true, exponent: 2.0 },
            FeaturizerSpec::Superpose { reference_traj: "ref.pdb".into(), atom_indices: "0..9".into(), superpose_atom_indices: None },
            FeaturizerSpec::Drid { atom_indices: Some("0..20".into()) },
            FeaturizerSpec::Drid { atom_indices: None },
            FeaturizerSpec::Contact { contacts: "all".into(), scheme: ContactScheme::SidechainHeavy, ignore_nonprotein: false },
        ];

        for spec in specs {
            let cfg = FeaturizeConfig { featurizer: spec, ..Default::default() };
            let fname = dir.path().join("featurize_config.toml");
            cfg.to_file(&fname).unwrap();
            let raw = fs::read_to_string(&fname).unwrap();
            let back: FeaturizeConfig = toml::from_str(&raw).unwrap();
            assert_eq!(cfg, back);
        }

        let cfg = FeaturizeConfig { top: None, ..Default::default() };
        let back: FeaturizeConfig = toml::from_str(&cfg.to_string()).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn test_check_config() {
        assert!(FeaturizeConfig::default().check_config().is_ok());

        let cfg = FeaturizeConfig { stride: 0, ..Default::default() };
        assert!(cfg.check_config().is_err());

        let cfg = FeaturizeConfig { trjs: vec![], stride: 0, ..Default::default() };
        let msg = cfg.check_config().unwrap_err().to_string();
        assert!(msg.contains("'trjs'"));
        assert!(msg.contains("'stride'"));

        let cfg = FeaturizeConfig {
            featurizer: FeaturizerSpec::Dihedral { types: vec![], sincos: true },
            ..Default::default()
        };
        assert!(cfg.check_config().is_err());

        let cfg = FeaturizeConfig {
            featurizer: FeaturizerSpec::Superpose {
                reference_traj: "no_such_reference.pdb".into(),
                atom_indices: "0..3".into(),
                superpose_atom_indices: None,
            },
            ..Default::default()
        };
        assert!(cfg.check_config().is_err());
    }
}
