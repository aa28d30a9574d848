//! 3x3 linear algebra helpers.
//!
//! These are thin wrappers around [`nalgebra`]; they exist so that every place the alignment
//! model inverts or composes a matrix fails (or doesn't) the same way.

use crate::error::{Error, Result};
use crate::{Matrix3, Vector3};
use tracing::trace;

/// The determinant of `matrix`, computed through its LU decomposition.
#[must_use]
pub fn determinant(matrix: &Matrix3) -> f64 {
    matrix.lu().determinant()
}

/// The inverse of `matrix`, computed through its LU decomposition.
///
/// Only an exactly zero determinant is reported as [`Error::SingularMatrix`]; callers that need
/// a well-conditioned matrix must check for near-singularity themselves.
pub fn invert(matrix: &Matrix3) -> Result<Matrix3> {
    let lu = matrix.lu();
    if lu.determinant() == 0. {
        return Err(Error::SingularMatrix);
    }
    lu.try_inverse().ok_or(Error::SingularMatrix)
}

/// `lhs · rhs`.
#[must_use]
pub fn matrix_matrix_multiply(lhs: &Matrix3, rhs: &Matrix3) -> Matrix3 {
    let mut product = Matrix3::zeros();
    product.gemm(1., lhs, rhs, 0.);
    product
}

/// `matrix · vector`.
#[must_use]
pub fn matrix_vector_multiply(matrix: &Matrix3, vector: &Vector3) -> Vector3 {
    let mut product = Vector3::zeros();
    product.gemv(1., matrix, vector, 0.);
    product
}

pub(crate) fn dump_vector(label: &str, vector: &Vector3) {
    trace!(
        "{label}: ({:.6}, {:.6}, {:.6})",
        vector.x,
        vector.y,
        vector.z
    );
}

pub(crate) fn dump_matrix(label: &str, matrix: &Matrix3) {
    trace!(
        "{label}: [{:.6}, {:.6}, {:.6}; {:.6}, {:.6}, {:.6}; {:.6}, {:.6}, {:.6}]",
        matrix.m11,
        matrix.m12,
        matrix.m13,
        matrix.m21,
        matrix.m22,
        matrix.m23,
        matrix.m31,
        matrix.m32,
        matrix.m33
    );
}
