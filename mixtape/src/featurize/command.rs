use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, ValueEnum};
use shared::{
    log,
    Context,
    Result,
};
use crate::OptProcess;

use crate::core::MixtapeConfig;
use crate::featurizers::{ContactScheme, DihedralType};
use super::config::{FeaturizeConfig, FeaturizerSpec};
use super::featurize_impl::FeaturizeJob;


fn build_thread_pool(nthreads: usize) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(nthreads)
        .build_global()
        .context("Failed to initialize the global thread pool.")
}


/// Checks the job, then featurizes every matched trajectory and saves the dataset.
fn run_job(cfg: &FeaturizeConfig, nthreads: usize) -> Result<()> {
    build_thread_pool(nthreads)?;
    cfg.check_config()?;
    cfg.print_to_log();
    FeaturizeJob::from_config(cfg)?.run()
}


#[derive(Debug, Args)]
/// Trajectory input and output shared by all featurizers.
pub struct CommonArgs {
    #[arg(long, num_args=1.., required=true)]
    /// Trajectory files or glob patterns, e.g. "run*/traj.xtc".
    ///
    /// Patterns are processed in the given order, and the matches of one pattern in sorted order.
    trjs: Vec<String>,

    #[arg(long)]
    /// Topology file (pdb or gro), required for xtc trajectories.
    ///
    /// Ignored if it does not exist.
    top: Option<PathBuf>,

    #[arg(long, default_value_t=10000)]
    /// Number of frames to load at once, counted after striding. 0 loads each file at once.
    chunk: usize,

    #[arg(long, default_value_t=1)]
    /// Only read every stride-th frame.
    stride: usize,

    #[arg(short='o', long)]
    /// Output HDF5 file for the feature dataset.
    out: PathBuf,

    #[arg(short='n', long, default_value_t=0)]
    /// Number of threads for parallel calculation.
    ///
    /// If 0 is set, it will fall back to the number of logic CPU cores of you machine.
    nthreads: usize,
}


impl CommonArgs {
    fn to_config(&self, featurizer: FeaturizerSpec) -> FeaturizeConfig {
        FeaturizeConfig::new(
            self.trjs.clone(),
            self.top.clone(),
            self.chunk,
            self.stride,
            self.out.clone(),
            featurizer,
        )
    }

    fn run(&self, featurizer: FeaturizerSpec) -> Result<()> {
        run_job(&self.to_config(featurizer), self.nthreads)
    }
}


#[derive(Debug, Parser)]
/// Featurize trajectories with backbone and side-chain dihedral angles.
pub struct DihedralCommand {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, value_enum, num_args=1.., value_delimiter=',', default_values_t=[DihedralType::Phi, DihedralType::Psi])]
    /// Dihedral types to compute, in this order.
    types: Vec<DihedralType>,

    #[arg(long, action=ArgAction::Set, default_value_t=true)]
    /// Emit the sine and cosine of each angle instead of the angle.
    sincos: bool,
}


impl OptProcess for DihedralCommand {
    fn process(&self) -> Result<()> {
        self.common.run(FeaturizerSpec::Dihedral {
            types: self.types.clone(),
            sincos: self.sincos,
        })
    }
}


#[derive(Debug, Parser)]
/// Featurize trajectories with distances between atom pairs.
pub struct AtomPairsCommand {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, alias="pair_indices")]
    /// Two-column index file of atom pairs, or an inline list such as "0 1 0 2".
    pair_indices: String,

    #[arg(long, action=ArgAction::Set, default_value_t=false)]
    /// Use the minimum image convention when the frames have a box.
    periodic: bool,

    #[arg(long, default_value_t=1.0, allow_negative_numbers=true)]
    /// Power applied to each distance.
    exponent: f64,
}


impl OptProcess for AtomPairsCommand {
    fn process(&self) -> Result<()> {
        self.common.run(FeaturizerSpec::AtomPairs {
            pair_indices: self.pair_indices.clone(),
            periodic: self.periodic,
            exponent: self.exponent,
        })
    }
}


#[derive(Debug, Parser)]
/// Featurize trajectories with per-atom deviations from a superposed reference.
pub struct SuperposeCommand {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, alias="reference_traj")]
    /// Reference structure, its first frame is used.
    reference_traj: PathBuf,

    #[arg(long, alias="atom_indices")]
    /// Index file or inline range of the atoms whose deviations are computed.
    atom_indices: String,

    #[arg(long, alias="superpose_atom_indices")]
    /// Atoms used for the superposition, defaults to atom-indices.
    superpose_atom_indices: Option<String>,
}


impl OptProcess for SuperposeCommand {
    fn process(&self) -> Result<()> {
        self.common.run(FeaturizerSpec::Superpose {
            reference_traj: self.reference_traj.clone(),
            atom_indices: self.atom_indices.clone(),
            superpose_atom_indices: self.superpose_atom_indices.clone(),
        })
    }
}


#[derive(Debug, Parser)]
/// Featurize trajectories with the distribution of reciprocal interatomic distances (DRID).
pub struct DRIDCommand {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, alias="atom_indices")]
    /// Index file or inline range of the atoms to use, all atoms if not set.
    atom_indices: Option<String>,
}


impl OptProcess for DRIDCommand {
    fn process(&self) -> Result<()> {
        self.common.run(FeaturizerSpec::Drid {
            atom_indices: self.atom_indices.clone(),
        })
    }
}


#[derive(Debug, Parser)]
/// Featurize trajectories with residue-residue contact distances.
pub struct ContactCommand {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, default_value="all")]
    /// "all" for every residue pair at least three apart in sequence, or a two-column index file
    /// of residue pairs.
    contacts: String,

    #[arg(long, value_enum, default_value_t=ContactScheme::ClosestHeavy)]
    /// How the distance between two residues is measured.
    scheme: ContactScheme,

    #[arg(long, action=ArgAction::Set, default_value_t=true, alias="ignore_nonprotein")]
    /// Leave out non-protein residues when contacts is "all".
    ignore_nonprotein: bool,
}


impl OptProcess for ContactCommand {
    fn process(&self) -> Result<()> {
        self.common.run(FeaturizerSpec::Contact {
            contacts: self.contacts.clone(),
            scheme: self.scheme,
            ignore_nonprotein: self.ignore_nonprotein,
        })
    }
}


#[derive(Debug, Parser)]
/// Featurize trajectories as described by a config file.
pub struct FeaturizeCommand {
    #[arg(short='n', long, default_value_t=0)]
    /// Number of threads for parallel calculation.
    ///
    /// If 0 is set, it will fall back to the number of logic CPU cores of you machine.
    nthreads: usize,

    #[arg(short='c', long, default_value="featurize_config.toml", aliases=["cfg", "conf"])]
    /// Config file name.
    ///
    /// Aliases: "cfg", "conf".
    config: PathBuf,

    #[arg(long, value_enum, alias="gen")]
    /// Generate auxiliary files for the calculation.
    ///
    /// The calculation will not run if this flag is set.
    ///
    /// Alias: "gen"
    generate: Option<TemplateGenerator>,
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum TemplateGenerator {
    #[value(aliases=["config", "cfg", "conf"])]
    /// Generate config template for featurization. Aliases: "config", "cfg", "conf".
    ConfigTemplate,
}


impl OptProcess for FeaturizeCommand {
    fn process(&self) -> Result<()> {
        use TemplateGenerator::*;

        if let Some(g) = self.generate {
            return match g {
                ConfigTemplate => FeaturizeConfig::default().to_file("featurize_config_template.toml"),
            }
        }

        log::info!("Reading featurize config from {:?} ...", self.config);
        let cfg = FeaturizeConfig::from_file(&self.config)?;
        run_job(&cfg, self.nthreads)
    }
}
