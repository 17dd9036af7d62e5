use std::fmt;

use rayon::prelude::*;
use shared::{
    ndarray as nd,
    Context,
    Result,
};
use traj_parsers::Trajectory;


/// A transform from a trajectory chunk to a feature matrix with one row per frame.
///
/// `Display` gives a one-line description with the parameters, which is logged before a run.
pub trait Featurizer: fmt::Debug + fmt::Display + Send + Sync {
    fn partial_transform(&self, traj: &Trajectory) -> Result<nd::Array2<f64>>;
}


/// Evaluates `row` for every frame on the rayon pool and stacks the results in frame order.
pub fn par_rows<F>(nframes: usize, nfeatures: usize, row: F) -> Result<nd::Array2<f64>>
where F: Fn(usize) -> Vec<f64> + Sync + Send {
    try_par_rows(nframes, nfeatures, |iframe| Ok(row(iframe)))
}


/// Like [`par_rows`], for rows that can fail. The first error in frame order is returned.
pub fn try_par_rows<F>(nframes: usize, nfeatures: usize, row: F) -> Result<nd::Array2<f64>>
where F: Fn(usize) -> Result<Vec<f64>> + Sync + Send {
    let rows = (0 .. nframes).into_par_iter()
        .map(row)
        .collect::<Result<Vec<Vec<f64>>>>()?;
    let data = rows.into_iter().flatten().collect::<Vec<f64>>();
    nd::Array2::from_shape_vec((nframes, nfeatures), data)
        .context("Feature rows have inconsistent lengths.")
}
