use crate::directions::DirectionVector;
use crate::error::{Error, Result};
use crate::numeric::{self, dump_matrix};
use crate::Matrix3;
use std::fmt::{self, Display, Formatter};
use std::marker::PhantomData;
use std::ops::Mul;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Below this, the absolute determinant of a basis is treated as zero, ie, the three directions
/// spanning it as coplanar.
pub const DEGENERATE_BASIS_TOLERANCE: f64 = 1e-12;

/// A linear map taking directions in the [`Frame`](crate::Frame) `From` to directions in `To`.
///
/// Alignment matrices are estimated from calibration data, so unlike a rotation they are neither
/// orthogonal nor length-preserving. [`TransformMatrix::transform`] therefore does not, in
/// general, return a unit vector.
///
/// Transforms are applied by right-multiplying a direction:
///
/// ```rust,ignore
/// let _: DirectionVector<To> = DirectionVector<From> * TransformMatrix<From, To>;
/// ```
///
/// which keeps the "middle" frames adjacent (as they would be in a matrix product), even though
/// the underlying matrix multiply is the usual `M · v`.
///
/// <div class="warning">
///
/// This type implements `Deserialize`, and the frames of the deserialized value are _not_
/// checked.
///
/// </div>
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = ""))]
pub struct TransformMatrix<From, To> {
    pub(crate) inner: Matrix3,
    #[cfg_attr(feature = "serde", serde(skip))]
    from: PhantomData<From>,
    #[cfg_attr(feature = "serde", serde(skip))]
    to: PhantomData<To>,
}

// manual impls of Clone and Copy to avoid requiring From, To: Copy + Clone
impl<From, To> Clone for TransformMatrix<From, To> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<From, To> Copy for TransformMatrix<From, To> {}

impl<From, To> PartialEq<Self> for TransformMatrix<From, To> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq(&other.inner)
    }
}

impl<From, To> Display for TransformMatrix<From, To> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix: {}", self.inner)
    }
}

impl<From, To> TransformMatrix<From, To> {
    pub(crate) fn from_nalgebra_matrix(inner: Matrix3) -> Self {
        Self {
            inner,
            from: PhantomData,
            to: PhantomData,
        }
    }

    /// Constructs a transform from its rows.
    #[must_use]
    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        let [r1, r2, r3] = rows;
        Self::from_nalgebra_matrix(Matrix3::new(
            r1[0], r1[1], r1[2], r2[0], r2[1], r2[2], r3[0], r3[1], r3[2],
        ))
    }

    /// Returns the rows of the underlying matrix.
    #[must_use]
    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        let m = &self.inner;
        [
            [m.m11, m.m12, m.m13],
            [m.m21, m.m22, m.m23],
            [m.m31, m.m32, m.m33],
        ]
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        numeric::determinant(&self.inner)
    }

    /// Applies this transform to a direction in `From`.
    ///
    /// The result is _not_ normalized.
    #[doc(alias = "apply")]
    #[must_use]
    pub fn transform(&self, in_from: DirectionVector<From>) -> DirectionVector<To> {
        in_from * *self
    }

    /// Returns the transform that maps `To` back into `From`.
    ///
    /// Fails with [`Error::SingularMatrix`] if this transform collapses some direction to zero.
    pub fn inverse(&self) -> Result<TransformMatrix<To, From>> {
        numeric::invert(&self.inner).map(TransformMatrix::from_nalgebra_matrix)
    }

    /// Chains two transforms into one that applies `self` first, then `rhs`.
    #[must_use]
    pub fn and_then<NewTo>(self, rhs: TransformMatrix<To, NewTo>) -> TransformMatrix<From, NewTo> {
        TransformMatrix::from_nalgebra_matrix(numeric::matrix_matrix_multiply(
            &rhs.inner,
            &self.inner,
        ))
    }
}

// DirectionVector<From> * TransformMatrix<From, To> -> DirectionVector<To>
impl<From, To> Mul<TransformMatrix<From, To>> for DirectionVector<From> {
    type Output = DirectionVector<To>;

    fn mul(self, rhs: TransformMatrix<From, To>) -> Self::Output {
        DirectionVector::from_nalgebra_vector(numeric::matrix_vector_multiply(
            &rhs.inner,
            &self.inner,
        ))
    }
}

#[cfg(any(test, feature = "approx"))]
impl<From, To> AbsDiffEq<Self> for TransformMatrix<From, To> {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        0.000_000_001
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.inner.abs_diff_eq(&other.inner, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<From, To> RelativeEq for TransformMatrix<From, To> {
    fn default_max_relative() -> Self::Epsilon {
        Matrix3::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.inner.relative_eq(&other.inner, epsilon, max_relative)
    }
}

/// The change of basis that takes three `source` directions onto three `target` directions.
///
/// With `S` the matrix whose columns are the source directions and `T` the one whose columns are
/// the targets, the forward transform is `T · S⁻¹`: it maps each source direction exactly onto
/// its target, and everything in between linearly.
#[derive(Debug)]
#[must_use]
pub struct BasisChange<From, To> {
    source: [DirectionVector<From>; 3],
    target: [DirectionVector<To>; 3],
}

// manual impls of Clone and Copy to avoid requiring From, To: Copy + Clone
impl<From, To> Clone for BasisChange<From, To> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<From, To> Copy for BasisChange<From, To> {}

impl<From, To> BasisChange<From, To> {
    pub fn new(source: [DirectionVector<From>; 3], target: [DirectionVector<To>; 3]) -> Self {
        Self { source, target }
    }

    /// Computes the transform taking `source[i]` to `target[i]`.
    ///
    /// Fails with [`Error::DegenerateBasis`] if the source directions are (nearly) coplanar, ie,
    /// the absolute determinant of the source basis is below [`DEGENERATE_BASIS_TOLERANCE`].
    pub fn forward(&self) -> Result<TransformMatrix<From, To>> {
        let source = Matrix3::from_columns(&self.source.map(|v| v.inner));
        let target = Matrix3::from_columns(&self.target.map(|v| v.inner));
        dump_matrix("basis change source", &source);
        dump_matrix("basis change target", &target);

        if numeric::determinant(&source).abs() < DEGENERATE_BASIS_TOLERANCE {
            return Err(Error::DegenerateBasis);
        }
        let source_inverse = numeric::invert(&source)?;
        let forward = numeric::matrix_matrix_multiply(&target, &source_inverse);
        dump_matrix("basis change", &forward);
        Ok(TransformMatrix::from_nalgebra_matrix(forward))
    }

    /// Computes the forward transform (see [`BasisChange::forward`]) along with its inverse.
    ///
    /// Fails with [`Error::SingularMatrix`] if the forward transform has no inverse, which happens
    /// when the target directions are exactly coplanar.
    pub fn forward_and_inverse(
        &self,
    ) -> Result<(TransformMatrix<From, To>, TransformMatrix<To, From>)> {
        let forward = self.forward()?;
        let inverse = forward.inverse()?;
        dump_matrix("basis change inverse", &inverse.inner);
        Ok((forward, inverse))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{BasisChange, TransformMatrix, DEGENERATE_BASIS_TOLERANCE};
    use crate::directions::DirectionVector;
    use crate::error::Error;
    use crate::frames::{Actual, Apparent};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use quickcheck::{quickcheck, TestResult};

    /// A small, fixed misalignment: a rotation of a few degrees about a skewed axis.
    pub(crate) fn mount_error() -> TransformMatrix<Actual, Apparent> {
        let rotation = nalgebra::Rotation3::from_euler_angles(0.02, -0.03, 0.05);
        TransformMatrix::from_nalgebra_matrix(*rotation.matrix())
    }

    fn v<In>(x: f64, y: f64, z: f64) -> DirectionVector<In> {
        DirectionVector::new(x, y, z).normalized()
    }

    #[test]
    fn maps_source_onto_target() {
        let source = [v(1., 0., 0.), v(0.3, 1., 0.1), v(0.2, 0.2, 1.)];
        let target = [v(0.9, 0.1, 0.), v(0., 1., 0.), v(-0.1, 0., 1.)];
        let (forward, inverse) = BasisChange::<Actual, Apparent>::new(source, target)
            .forward_and_inverse()
            .unwrap();
        for (s, t) in source.into_iter().zip(target) {
            assert_relative_eq!(forward.transform(s), t, epsilon = 1e-12);
            assert_relative_eq!(inverse.transform(t), s, epsilon = 1e-12);
        }
    }

    #[test]
    fn recovers_a_known_transform() {
        let error = mount_error();
        let source = [v(1., 0., 0.), v(0., 1., 0.), v(0., 0., 1.)];
        let target = source.map(|s| error.transform(s));
        let forward = BasisChange::new(source, target).forward().unwrap();
        assert_relative_eq!(forward, error, epsilon = 1e-12);
    }

    #[test]
    fn coplanar_source_is_degenerate() {
        let source = [v(1., 0., 0.), v(0., 1., 0.), v(1., 1., 0.)];
        let target = [v(1., 0., 0.), v(0., 1., 0.), v(0., 0., 1.)];
        assert_eq!(
            BasisChange::<Actual, Apparent>::new(source, target).forward(),
            Err(Error::DegenerateBasis)
        );

        // nearly coplanar is just as bad
        let source = [v(1., 0., 0.), v(0., 1., 0.), v(1., 1., DEGENERATE_BASIS_TOLERANCE / 10.)];
        assert_eq!(
            BasisChange::<Actual, Apparent>::new(source, target).forward(),
            Err(Error::DegenerateBasis)
        );
    }

    #[test]
    fn coplanar_target_has_no_inverse() {
        let source = [v(1., 0., 0.), v(0., 1., 0.), v(0., 0., 1.)];
        let target = [v(1., 0., 0.), v(0., 1., 0.), v(-1., 0., 0.)];
        let change = BasisChange::<Actual, Apparent>::new(source, target);
        assert!(change.forward().is_ok());
        assert_eq!(change.forward_and_inverse(), Err(Error::SingularMatrix));
    }

    #[test]
    fn and_then_applies_left_to_right() {
        let scale_x = TransformMatrix::<Actual, Apparent>::from_rows([
            [2., 0., 0.],
            [0., 1., 0.],
            [0., 0., 1.],
        ]);
        let swap_xy = TransformMatrix::<Apparent, Actual>::from_rows([
            [0., 1., 0.],
            [1., 0., 0.],
            [0., 0., 1.],
        ]);
        let x = DirectionVector::<Actual>::new(1., 0., 0.);
        assert_eq!(
            scale_x.and_then(swap_xy).transform(x),
            DirectionVector::new(0., 2., 0.)
        );
        assert_eq!(
            swap_xy.and_then(scale_x).transform(DirectionVector::new(1., 0., 0.)),
            DirectionVector::<Apparent>::new(0., 1., 0.)
        );
    }

    #[test]
    fn rows_roundtrip() {
        let rows = [[1., 2., 3.], [4., 5., 6.], [7., 8., 10.]];
        let matrix = TransformMatrix::<Actual, Apparent>::from_rows(rows);
        assert_eq!(matrix.to_rows(), rows);
        assert_relative_eq!(matrix.determinant(), -3., epsilon = 1e-12);
    }

    quickcheck! {
        fn forward_and_inverse_compose_to_identity(
            a: DirectionVector<Actual>,
            b: DirectionVector<Actual>,
            c: DirectionVector<Actual>,
            probe: DirectionVector<Actual>
        ) -> TestResult {
            // keep to bases that are comfortably far from coplanar
            if a.cross(&b).dot(&c).abs() < 0.1 {
                return TestResult::discard();
            }
            let error = mount_error();
            let target = [a, b, c].map(|s| error.transform(s));
            let (forward, inverse) = BasisChange::new([a, b, c], target)
                .forward_and_inverse()
                .unwrap();
            assert_abs_diff_eq!(
                forward.and_then(inverse).transform(probe),
                probe,
                epsilon = 1e-9
            );
            TestResult::passed()
        }
    }
}
