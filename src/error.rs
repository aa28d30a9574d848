use thiserror::Error;

#[cfg(doc)]
use crate::{database::AlignmentDatabase, engine::AlignmentEngine};

/// Everything that can make building or querying an alignment model fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The [`AlignmentDatabase`] has no reference geographic position.
    #[error("no reference position in the alignment database")]
    MissingReferencePosition,

    /// A query was made before [`AlignmentEngine::initialise`] succeeded.
    #[error("alignment model has not been initialised")]
    NotInitialised,

    /// The three source directions of a basis change are (nearly) coplanar.
    #[error("source directions are coplanar, cannot build a basis change")]
    DegenerateBasis,

    /// A 3x3 matrix had a zero determinant where an inverse was required.
    #[error("matrix is singular")]
    SingularMatrix,

    /// The calibration directions do not span a volume, so no hull exists.
    #[error("cannot build a convex hull from {vertices} vertices that do not span a volume")]
    DegenerateHull { vertices: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
