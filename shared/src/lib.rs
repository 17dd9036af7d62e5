pub use anyhow::{
    self,
    anyhow,
    Result,
    Context,
    bail,
    ensure,
};
pub use ndarray::{
    self,
    Array1,
    Array2,
    Array3,
};
pub use ndarray_linalg;
pub use regex::Regex;
pub use log::{
    self,
    warn,
    info,
    debug,
    error,
};

pub mod geometry;
pub mod numeric_methods;

// Convenient types
pub type Vector<T> = Array1<T>;  // Define this type to use broadcast operations.
pub type Matrix<T> = Array2<T>;
pub type Cube<T>   = Array3<T>;
pub type Vec3<T>   = [T;3];
pub type MatX3<T>  = Vec<[T;3]>;  // Nx3 matrix
pub type Mat33<T>  = [[T;3];3];   // 3x3 matrix


/// Parse string containing inclusive ranges and integers into a list of zero-based indices.
///
/// Valid strings can be `"0..4 12 7..8"`, which will be parsed as
/// `vec![0, 1, 2, 3, 4, 12, 7, 8]`. The order of the tokens is kept and duplicates are allowed.
pub fn range_parse(input: &str) -> Result<Vec<usize>> {
    let mut ret = vec![];

    let re_range = Regex::new(r"^(\d+)\.\.(\d+)$")?;
    let re_digit = Regex::new(r"^\d+$")?;

    for s in input.split_ascii_whitespace() {
        if re_digit.is_match(s) {
            ret.push(s.parse::<usize>()?);
        } else if let Some(m) = re_range.captures(s) {
            let start = m[1].parse::<usize>()?;
            let end   = m[2].parse::<usize>()?;

            if start > end {
                bail!("[RANGE_PARSE]: start is greater than end in token \'{}\'", s);
            }

            ret.extend(start ..= end);
        } else {
            bail!("[RANGE_PARSE]: token \'{}\' is invalid, cannot be parsed as range or index", s);
        }
    }

    Ok(ret)
}


/// Check every index in `indices` is smaller than `len`.
pub fn check_indices(indices: &[usize], len: usize, what: &str) -> Result<()> {
    if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
        bail!("{} index {} is out of range, only {} available.", what, bad, len);
    }
    Ok(())
}
