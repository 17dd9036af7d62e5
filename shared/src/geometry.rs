//! Small fixed-size vector and matrix kernels used by the featurizers.
//!
//! Positions are `[f64; 3]`, box vectors are stored row-wise in a `Mat33`, i.e. `cell[0]` is the
//! first lattice vector.
use ndarray::Array2;
use ndarray_linalg::{Determinant, Eigh, Inverse, UPLO};

use crate::{Mat33, Result, Vec3};


#[inline]
pub fn sub(a: Vec3<f64>, b: Vec3<f64>) -> Vec3<f64> {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: Vec3<f64>, b: Vec3<f64>) -> Vec3<f64> {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(a: Vec3<f64>, s: f64) -> Vec3<f64> {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: Vec3<f64>, b: Vec3<f64>) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: Vec3<f64>, b: Vec3<f64>) -> Vec3<f64> {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: Vec3<f64>) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
pub fn distance(a: Vec3<f64>, b: Vec3<f64>) -> f64 {
    norm(sub(a, b))
}


/// Dihedral angle in radians within `[-pi, pi]` formed by four points.
pub fn dihedral(p0: Vec3<f64>, p1: Vec3<f64>, p2: Vec3<f64>, p3: Vec3<f64>) -> f64 {
    let b1 = sub(p1, p0);
    let b2 = sub(p2, p1);
    let b3 = sub(p3, p2);

    let c1 = cross(b2, b3);
    let c2 = cross(b1, b2);

    let p1 = dot(b1, c1) * norm(b2);
    let p2 = dot(c1, c2);

    p1.atan2(p2)
}


fn to_array<const N: usize>(m: &[[f64; N]; N]) -> Array2<f64> {
    Array2::from_shape_fn((N, N), |(i, j)| m[i][j])
}


/// Inverse of a 3x3 matrix, `None` if it is singular.
pub fn inv3(m: &Mat33<f64>) -> Option<Mat33<f64>> {
    let a = to_array(m);
    if a.det().ok()?.abs() < 1E-12 {
        return None;
    }
    let inv = a.inv().ok()?;
    Some(std::array::from_fn(|i| std::array::from_fn(|j| inv[[i, j]])))
}


/// `m * v`
#[inline]
pub fn matvec(m: &Mat33<f64>, v: Vec3<f64>) -> Vec3<f64> {
    [dot(m[0], v), dot(m[1], v), dot(m[2], v)]
}


/// Periodic cell described by row-wise lattice vectors, with the inverse kept around for
/// fractional coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub vectors: Mat33<f64>,
    inverse: Mat33<f64>,
}


impl Cell {
    pub fn new(vectors: Mat33<f64>) -> Option<Self> {
        let inverse = inv3(&vectors)?;
        Some(Self { vectors, inverse })
    }

    /// Fractional coordinates `f` such that `r = f[0]*a + f[1]*b + f[2]*c`.
    pub fn to_fractional(&self, r: Vec3<f64>) -> Vec3<f64> {
        // r = A^T f, A holding lattice vectors as rows, thus f = (A^-1)^T r
        let inv = &self.inverse;
        [
            inv[0][0] * r[0] + inv[1][0] * r[1] + inv[2][0] * r[2],
            inv[0][1] * r[0] + inv[1][1] * r[1] + inv[2][1] * r[2],
            inv[0][2] * r[0] + inv[1][2] * r[1] + inv[2][2] * r[2],
        ]
    }

    pub fn to_cartesian(&self, f: Vec3<f64>) -> Vec3<f64> {
        let a = &self.vectors;
        [
            a[0][0] * f[0] + a[1][0] * f[1] + a[2][0] * f[2],
            a[0][1] * f[0] + a[1][1] * f[1] + a[2][1] * f[2],
            a[0][2] * f[0] + a[1][2] * f[1] + a[2][2] * f[2],
        ]
    }

    /// Displacement `b - a` wrapped with the minimum image convention.
    ///
    /// Rounding in fractional space is exact for rectangular cells. For skewed cells the 27
    /// neighbouring images of the wrapped vector are searched as well.
    pub fn minimum_image(&self, a: Vec3<f64>, b: Vec3<f64>) -> Vec3<f64> {
        let f = self.to_fractional(sub(b, a));
        let f = [f[0] - f[0].round(), f[1] - f[1].round(), f[2] - f[2].round()];
        let wrapped = self.to_cartesian(f);

        if self.is_rectangular() {
            return wrapped;
        }

        let mut best = wrapped;
        let mut best_norm = dot(wrapped, wrapped);
        for i in -1 ..= 1 {
            for j in -1 ..= 1 {
                for k in -1 ..= 1 {
                    let shift = self.to_cartesian([i as f64, j as f64, k as f64]);
                    let candidate = add(wrapped, shift);
                    let n = dot(candidate, candidate);
                    if n < best_norm {
                        best = candidate;
                        best_norm = n;
                    }
                }
            }
        }
        best
    }

    pub fn is_rectangular(&self) -> bool {
        let a = &self.vectors;
        a[0][1] == 0.0 && a[0][2] == 0.0 &&
        a[1][0] == 0.0 && a[1][2] == 0.0 &&
        a[2][0] == 0.0 && a[2][1] == 0.0
    }
}


/// Box vectors from lattice lengths and angles (degrees), with `a` along x and `b` in the xy plane.
pub fn lengths_and_angles_to_box_vectors(
    lengths: Vec3<f64>, angles: Vec3<f64>) -> Mat33<f64> {
    let [a, b, c] = lengths;
    let [alpha, beta, gamma] = angles.map(f64::to_radians);

    // Exact 90 degrees should give exact zeros.
    let cos = |x: f64| if (x - std::f64::consts::FRAC_PI_2).abs() < 1E-10 { 0.0 } else { x.cos() };

    let (cos_a, cos_b, cos_g) = (cos(alpha), cos(beta), cos(gamma));
    let sin_g = gamma.sin();

    let cx = c * cos_b;
    let cy = c * (cos_a - cos_b * cos_g) / sin_g;
    let cz = (c * c - cx * cx - cy * cy).max(0.0).sqrt();

    [
        [a, 0.0, 0.0],
        [b * cos_g, b * sin_g, 0.0],
        [cx, cy, cz],
    ]
}


pub fn centroid(xs: &[Vec3<f64>]) -> Vec3<f64> {
    let n = xs.len().max(1) as f64;
    let sum = xs.iter().fold([0.0; 3], |acc, &x| add(acc, x));
    scale(sum, n.recip())
}


/// Rotation matrix `R` minimizing `sum |R x_i - y_i|^2`, with both point sets already centered.
///
/// Uses the quaternion formulation of Horn (1987): the optimal rotation is the eigenvector of the
/// largest eigenvalue of a symmetric 4x4 matrix built from the cross covariance.
pub fn optimal_rotation(mobile: &[Vec3<f64>], reference: &[Vec3<f64>]) -> Result<Mat33<f64>> {
    let mut s = [[0.0f64; 3]; 3];
    for (x, y) in mobile.iter().zip(reference.iter()) {
        for i in 0 .. 3 {
            for j in 0 .. 3 {
                s[i][j] += x[i] * y[j];
            }
        }
    }

    let [[sxx, sxy, sxz], [syx, syy, syz], [szx, szy, szz]] = s;
    let n = to_array(&[
        [sxx + syy + szz, syz - szy,        szx - sxz,        sxy - syx       ],
        [syz - szy,       sxx - syy - szz,  sxy + syx,        szx + sxz       ],
        [szx - sxz,       sxy + syx,       -sxx + syy - szz,  syz + szy       ],
        [sxy - syx,       szx + sxz,        syz + szy,       -sxx - syy + szz ],
    ]);

    // eigenvalues come in ascending order
    let (_, eigvecs) = n.eigh(UPLO::Upper)?;
    let q = [eigvecs[[0, 3]], eigvecs[[1, 3]], eigvecs[[2, 3]], eigvecs[[3, 3]]];

    Ok(quaternion_to_rotation(q))
}


fn quaternion_to_rotation(q: [f64; 4]) -> Mat33<f64> {
    let qnorm = q.iter().map(|x| x * x).sum::<f64>().sqrt();
    let [q0, qx, qy, qz] = q.map(|x| x / qnorm);

    [
        [q0*q0 + qx*qx - qy*qy - qz*qz, 2.0 * (qx*qy - q0*qz),         2.0 * (qx*qz + q0*qy)        ],
        [2.0 * (qy*qx + q0*qz),         q0*q0 - qx*qx + qy*qy - qz*qz, 2.0 * (qy*qz - q0*qx)        ],
        [2.0 * (qz*qx - q0*qy),         2.0 * (qz*qy + q0*qx),         q0*q0 - qx*qx - qy*qy + qz*qz],
    ]
}
