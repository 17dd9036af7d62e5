use std::path::Path;

use hdf5::{
    types::VarLenUnicode,
    File as H5File,
};
use shared::{
    anyhow,
    ensure,
    info,
    ndarray as nd,
    Result,
};


/// Feature arrays of a whole job, one per trajectory in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureDataset {
    sources: Vec<String>,
    trajs:   Vec<nd::Array2<f64>>,
}


impl FeatureDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: impl Into<String>, features: nd::Array2<f64>) {
        self.sources.push(source.into());
        self.trajs.push(features);
    }

    pub fn len(&self) -> usize { self.trajs.len() }
    pub fn is_empty(&self) -> bool { self.trajs.is_empty() }
    pub fn sources(&self) -> &[String] { &self.sources }
    pub fn trajs(&self) -> &[nd::Array2<f64>] { &self.trajs }

    fn traj_key(i: usize) -> String {
        format!("traj_{:06}", i)
    }

    pub fn from_h5<P>(fname: P) -> Result<Self>
    where P: AsRef<Path> {
        let f = H5File::open(fname)?;

        let ntrajs = f.dataset("ntrajs")?.read_scalar::<usize>()?;
        let sources = f.dataset("sources")?
            .read_raw::<VarLenUnicode>()?
            .iter()
            .map(|s| s.as_str().to_string())
            .collect::<Vec<_>>();
        ensure!(sources.len() == ntrajs, "Inconsistent number of sources and trajectories in dataset.");

        let trajs = (0 .. ntrajs)
            .map(|i| Ok(f.dataset(&Self::traj_key(i))?.read_2d::<f64>()?))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { sources, trajs })
    }

    pub fn save_to_h5<P>(&self, fname: P) -> Result<()>
    where P: AsRef<Path> {
        info!("Saving dataset to {:?} ...", fname.as_ref());
        let f = H5File::create(fname)?;

        f.new_dataset::<usize>().create("ntrajs")?.write_scalar(&self.len())?;

        let sources = self.sources.iter()
            .map(|s| s.parse::<VarLenUnicode>().map_err(|e| anyhow!("Invalid source name {:?}: {}", s, e)))
            .collect::<Result<Vec<_>>>()?;
        f.new_dataset_builder().with_data(sources.as_slice()).create("sources")?;

        for (i, traj) in self.trajs.iter().enumerate() {
            f.new_dataset_builder().with_data(traj).create(Self::traj_key(i).as_str())?;
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_h5_round_trip() {
        let mut dataset = FeatureDataset::new();
        dataset.push("run1/a.xtc", nd::arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]));
        dataset.push("run1/b.xtc", nd::arr2(&[[-1.0, 0.5]]));

        let dir = tempdir().unwrap();
        let fname = dir.path().join("features.h5");
        dataset.save_to_h5(&fname).unwrap();

        let back = FeatureDataset::from_h5(&fname).unwrap();
        assert_eq!(back, dataset);
        assert_eq!(back.sources(), &["run1/a.xtc".to_string(), "run1/b.xtc".to_string()]);
    }
}
