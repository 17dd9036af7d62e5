use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use shared::{
    ensure,
    info,
    ndarray as nd,
    warn,
    Context,
    Result,
};
use traj_parsers::{
    iterload,
    load_topology,
    Topology,
};

use crate::core::Featurizer;
use crate::logging::logger_redirect;
use super::config::FeaturizeConfig;
use super::dataset::FeatureDataset;


/// A featurization job with the topology loaded and the featurizer built.
#[derive(Debug)]
pub struct FeaturizeJob {
    trjs:       Vec<String>,
    top:        Option<Arc<Topology>>,
    chunk:      usize,
    stride:     usize,
    out:        PathBuf,
    featurizer: Box<dyn Featurizer>,
}


impl FeaturizeJob {
    pub fn from_config(cfg: &FeaturizeConfig) -> Result<Self> {
        let top = match cfg.get_top() {
            Some(path) if path.is_file() => {
                info!("Loading topology from {:?} ...", path);
                Some(Arc::new(load_topology(path)?))
            },
            Some(path) if !path.as_os_str().is_empty() => {
                warn!("Topology file {:?} not found, using the topology of each trajectory.", path);
                None
            },
            _ => None,
        };

        let featurizer = cfg.get_featurizer().build(top.as_ref())?;

        Ok(Self {
            trjs:   cfg.get_trjs().to_vec(),
            top,
            chunk:  cfg.get_chunk(),
            stride: cfg.get_stride(),
            out:    cfg.get_out().clone(),
            featurizer,
        })
    }

    /// Every path matched by `trjs`, patterns in the given order.
    fn expand_patterns(&self) -> Result<Vec<PathBuf>> {
        let mut paths = vec![];
        for pattern in self.trjs.iter() {
            let matched = glob::glob(pattern)
                .with_context(|| format!("Invalid trajectory pattern {:?}.", pattern))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to expand trajectory pattern {:?}.", pattern))?;
            if matched.is_empty() {
                warn!("No trajectory matches pattern {:?}.", pattern);
            }
            paths.extend(matched);
        }
        Ok(paths)
    }

    /// Features of one trajectory, chunk results stacked in frame order.
    fn featurize_one<W: Write>(&self, path: &Path, progress: &mut W) -> Result<nd::Array2<f64>> {
        let basename = path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut parts = vec![];
        for (i, chunk) in iterload(path, self.top.clone(), self.stride, self.chunk)?.enumerate() {
            let chunk = chunk.with_context(|| format!("Failed to load chunk {} of {:?}.", i, path))?;
            write!(progress, "\r{} chunk {}", basename, i)?;
            progress.flush()?;
            let features = self.featurizer.partial_transform(&chunk)
                .with_context(|| format!("Failed to featurize chunk {} of {:?}.", i, path))?;
            parts.push(features);
        }
        writeln!(progress)?;

        ensure!(!parts.is_empty(), "Trajectory {:?} has no frames to featurize.", path);
        let views = parts.iter().map(|p| p.view()).collect::<Vec<_>>();
        Ok(nd::concatenate(nd::Axis(0), &views)?)
    }

    /// Runs the featurizer over every matched trajectory, reporting chunk progress to `progress`.
    pub fn featurize_all_with<W: Write>(&self, progress: &mut W) -> Result<FeatureDataset> {
        let mut dataset = FeatureDataset::new();
        for path in self.expand_patterns()? {
            let features = self.featurize_one(&path, progress)?;
            dataset.push(path.display().to_string(), features);
        }
        Ok(dataset)
    }

    pub fn featurize_all(&self) -> Result<FeatureDataset> {
        self.featurize_all_with(&mut io::stdout().lock())
    }

    pub fn run(&self) -> Result<()> {
        let outdir = match self.out.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&outdir)
            .with_context(|| format!("Failed to create output directory {:?}.", outdir))?;
        logger_redirect(&outdir)?;

        info!("{}", self.featurizer);

        let dataset = self.featurize_all()?;
        info!("Featurized {} trajectories.", dataset.len());
        dataset.save_to_h5(&self.out)?;

        println!("All done");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use crate::featurize::config::FeaturizerSpec;

    /// Three argon atoms, the third moving away by 0.1 Å per frame.
    fn write_xyz(path: &Path, nframes: usize) {
        let mut txt = String::new();
        for i in 0 .. nframes {
            txt.push_str(&format!("3\nframe {}\n", i));
            txt.push_str("Ar 0.0 0.0 0.0\n");
            txt.push_str("Ar 1.0 0.0 0.0\n");
            txt.push_str(&format!("Ar {:.1} 0.0 0.0\n", 3.0 + 0.1 * i as f64));
        }
        fs::write(path, txt).unwrap();
    }

    /// Ten carbons on the x axis 0.3 nm apart, stretched by 10% per frame, written by xdrfile.
    fn write_xtc(path: &Path, nframes: usize) {
        use xdrfile::Trajectory as _;

        let mut xtc = xdrfile::XTCTrajectory::open_write(path).unwrap();
        for iframe in 0 .. nframes {
            let scale = 1.0 + 0.1 * iframe as f32;
            let mut frame = xdrfile::Frame::new();
            frame.step = iframe;
            frame.time = iframe as f32;
            frame.box_vector = [[10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]];
            frame.coords.extend((0 .. 10).map(|i| [0.3 * i as f32 * scale, 1.0, 1.0]));
            xtc.write(&frame).unwrap();
        }
    }

    fn write_ten_carbon_pdb(path: &Path) {
        let txt = (0 .. 10)
            .map(|i| format!("HETATM{:>5}  C   LIG A   1    {:>8.3}{:>8.3}{:>8.3}  1.00  0.00           C\n",
                i + 1, 3.0 * i as f64, 10.0, 10.0))
            .collect::<String>();
        fs::write(path, txt + "END\n").unwrap();
    }

    fn pairs_config(dir: &Path, trjs: Vec<String>, chunk: usize, stride: usize) -> FeaturizeConfig {
        FeaturizeConfig::new(
            trjs, None, chunk, stride,
            dir.join("features.h5"),
            FeaturizerSpec::AtomPairs { pair_indices: "0 1 0 2".into(), periodic: false, exponent: 1.0 },
        )
    }

    #[test]
    fn test_featurize_all_in_glob_order() {
        let dir = tempdir().unwrap();
        write_xyz(&dir.path().join("b.xyz"), 5);
        write_xyz(&dir.path().join("a.xyz"), 3);
        write_xyz(&dir.path().join("c.xyz"), 2);

        let trjs = vec![
            dir.path().join("c.xyz").display().to_string(),
            dir.path().join("[ab].xyz").display().to_string(),
            dir.path().join("none_*.xyz").display().to_string(),
        ];
        let job = FeaturizeJob::from_config(&pairs_config(dir.path(), trjs, 2, 1)).unwrap();

        let mut progress = vec![];
        let dataset = job.featurize_all_with(&mut progress).unwrap();

        let names = dataset.sources().iter()
            .map(|s| Path::new(s).file_name().unwrap().to_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["c.xyz", "a.xyz", "b.xyz"]);

        let nframes = dataset.trajs().iter().map(|t| t.nrows()).collect::<Vec<_>>();
        assert_eq!(nframes, vec![2, 3, 5]);
        assert!(dataset.trajs().iter().all(|t| t.ncols() == 2));

        let b = &dataset.trajs()[2];
        assert!((b[[0, 0]] - 0.1).abs() < 1E-6);
        assert!((b[[4, 1]] - 0.34).abs() < 1E-6);

        let progress = String::from_utf8(progress).unwrap();
        assert_eq!(progress, "\rc.xyz chunk 0\n\ra.xyz chunk 0\ra.xyz chunk 1\n\rb.xyz chunk 0\rb.xyz chunk 1\rb.xyz chunk 2\n");
    }

    #[test]
    fn test_stride_and_whole_file_chunk() {
        let dir = tempdir().unwrap();
        write_xyz(&dir.path().join("a.xyz"), 7);
        let trjs = vec![dir.path().join("a.xyz").display().to_string()];
        let job = FeaturizeJob::from_config(&pairs_config(dir.path(), trjs, 0, 3)).unwrap();

        let mut progress = vec![];
        let dataset = job.featurize_all_with(&mut progress).unwrap();
        let a = &dataset.trajs()[0];
        // frames 0, 3, 6
        assert_eq!(a.nrows(), 3);
        assert!((a[[2, 1]] - 0.36).abs() < 1E-6);
        assert_eq!(String::from_utf8(progress).unwrap(), "\ra.xyz chunk 0\n");
    }

    #[test]
    fn test_missing_topology_is_ignored() {
        let dir = tempdir().unwrap();
        write_xyz(&dir.path().join("a.xyz"), 1);
        let trjs = vec![dir.path().join("a.xyz").display().to_string()];
        let cfg = FeaturizeConfig::new(
            trjs, Some(dir.path().join("no_such_top.pdb")), 10, 1,
            dir.path().join("features.h5"),
            FeaturizerSpec::Drid { atom_indices: None },
        );
        let job = FeaturizeJob::from_config(&cfg).unwrap();
        let dataset = job.featurize_all_with(&mut io::sink()).unwrap();
        assert_eq!(dataset.trajs()[0].shape(), &[1, 9]);
    }

    #[test]
    fn test_run_writes_dataset() {
        let dir = tempdir().unwrap();
        write_xyz(&dir.path().join("a.xyz"), 4);
        let trjs = vec![dir.path().join("*.xyz").display().to_string()];
        let cfg = FeaturizeConfig::new(
            trjs, None, 3, 1,
            dir.path().join("out").join("features.h5"),
            FeaturizerSpec::AtomPairs { pair_indices: "0 1 1 2".into(), periodic: true, exponent: 1.0 },
        );

        FeaturizeJob::from_config(&cfg).unwrap().run().unwrap();

        let dataset = FeatureDataset::from_h5(dir.path().join("out").join("features.h5")).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.trajs()[0].shape(), &[4, 2]);
        assert!(dir.path().join("out").join("run.log").is_file());
    }

    #[test]
    fn test_bad_trajectory_fails() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.xyz"), "3\ncomment\nAr 0 0 0\n").unwrap();
        let trjs = vec![dir.path().join("bad.xyz").display().to_string()];
        let job = FeaturizeJob::from_config(&pairs_config(dir.path(), trjs, 10, 1)).unwrap();
        assert!(job.featurize_all_with(&mut io::sink()).is_err());
    }

    #[test]
    fn test_xtc_with_topology_file() {
        let dir = tempdir().unwrap();
        write_xtc(&dir.path().join("run.xtc"), 3);
        write_ten_carbon_pdb(&dir.path().join("top.pdb"));

        let trjs = vec![dir.path().join("*.xtc").display().to_string()];
        let spec = FeaturizerSpec::AtomPairs { pair_indices: "0 1 0 9".into(), periodic: false, exponent: 1.0 };
        let cfg = FeaturizeConfig::new(
            trjs.clone(), Some(dir.path().join("top.pdb")), 2, 1,
            dir.path().join("features.h5"), spec.clone(),
        );

        let mut progress = vec![];
        let dataset = FeaturizeJob::from_config(&cfg).unwrap()
            .featurize_all_with(&mut progress).unwrap();
        assert_eq!(String::from_utf8(progress).unwrap(), "\rrun.xtc chunk 0\rrun.xtc chunk 1\n");

        let x = &dataset.trajs()[0];
        assert_eq!(x.shape(), &[3, 2]);
        for iframe in 0 .. 3 {
            let scale = 1.0 + 0.1 * iframe as f64;
            assert!((x[[iframe, 0]] - 0.3 * scale).abs() < 2E-3);
            assert!((x[[iframe, 1]] - 2.7 * scale).abs() < 2E-3);
        }

        let cfg = FeaturizeConfig::new(trjs, None, 2, 1, dir.path().join("features.h5"), spec);
        let err = FeaturizeJob::from_config(&cfg).unwrap()
            .featurize_all_with(&mut io::sink()).unwrap_err();
        assert!(format!("{:#}", err).contains("topology required"));
    }
}
