use crate::frames::Frame;
use crate::Vector3;
use std::fmt::{self, Display, Formatter};
use std::marker::PhantomData;
use std::ops::{Add, Mul, Neg, Sub};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A direction (a.k.a. direction cosines) in the [`Frame`] `In`.
///
/// Conceptually this is a point on the unit sphere, but intermediate results (a linear map
/// applied to a unit vector, a vector scaled to cast a ray) are allowed to leave the sphere.
/// Call [`DirectionVector::normalize`] to put one back.
///
/// The components follow the usual direction-cosine convention for an azimuthal angle φ measured
/// counter-clockwise in the reference plane and an elevation θ above it:
///
/// ```text
/// x = cos θ cos φ
/// y = cos θ sin φ
/// z = sin θ
/// ```
///
/// so that the zenith (and the north celestial pole) is `(0, 0, 1)`.
///
/// <div class="warning">
///
/// This type implements `Deserialize`, and the frame of the deserialized value is _not_ checked.
/// Only deserialize directions that were serialized from the same frame.
///
/// </div>
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
// don't require In: Serialize/Deserialize since we skip it anyway
#[cfg_attr(feature = "serde", serde(bound = ""))]
pub struct DirectionVector<In> {
    pub(crate) inner: Vector3,
    #[cfg_attr(feature = "serde", serde(skip))]
    frame: PhantomData<In>,
}

// manual impls of Clone and Copy to avoid requiring In: Copy + Clone
impl<In> Clone for DirectionVector<In> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<In> Copy for DirectionVector<In> {}

impl<In> DirectionVector<In> {
    /// Constructs a direction from raw components in `In`.
    ///
    /// The components are stored as given; they are not normalized.
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::from_nalgebra_vector(Vector3::new(x, y, z))
    }

    pub(crate) fn from_nalgebra_vector(inner: Vector3) -> Self {
        Self {
            inner,
            frame: PhantomData,
        }
    }

    /// The nadir, `(0, 0, -1)`.
    #[must_use]
    pub fn nadir() -> Self {
        Self::new(0., 0., -1.)
    }

    /// The zenith (or celestial pole, for equatorial frames), `(0, 0, 1)`.
    #[must_use]
    pub fn zenith() -> Self {
        Self::new(0., 0., 1.)
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.inner.x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.inner.y
    }

    #[must_use]
    pub fn z(&self) -> f64 {
        self.inner.z
    }

    #[must_use]
    pub fn to_array(&self) -> [f64; 3] {
        [self.inner.x, self.inner.y, self.inner.z]
    }

    /// Cross product `self × rhs`.
    #[must_use]
    pub fn cross(&self, rhs: &Self) -> Self {
        Self::from_nalgebra_vector(self.inner.cross(&rhs.inner))
    }

    /// Dot product `self · rhs`.
    #[must_use]
    pub fn dot(&self, rhs: &Self) -> f64 {
        self.inner.dot(&rhs.inner)
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.inner.norm()
    }

    /// Scales this direction to unit length in place.
    ///
    /// A zero vector has no direction and is left untouched.
    pub fn normalize(&mut self) {
        if let Some(unit) = self.inner.try_normalize(0.) {
            self.inner = unit;
        }
    }

    /// Returns this direction scaled to unit length (see [`DirectionVector::normalize`]).
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Reinterprets these components as a direction in `NewIn` without any transformation.
    ///
    /// This is only meaningful where the mount is assumed to be perfectly aligned, ie, where
    /// actual and apparent directions coincide.
    #[must_use]
    pub fn reinterpret_in<NewIn: Frame>(self) -> DirectionVector<NewIn> {
        DirectionVector::from_nalgebra_vector(self.inner)
    }
}

impl<In> Neg for DirectionVector<In> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::from_nalgebra_vector(-self.inner)
    }
}

impl<In> Add<Self> for DirectionVector<In> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::from_nalgebra_vector(self.inner + rhs.inner)
    }
}

impl<In> Sub<Self> for DirectionVector<In> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::from_nalgebra_vector(self.inner - rhs.inner)
    }
}

impl<In> Mul<f64> for DirectionVector<In> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::from_nalgebra_vector(self.inner * rhs)
    }
}

impl<In> PartialEq<Self> for DirectionVector<In> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq(&other.inner)
    }
}

impl<In> Display for DirectionVector<In> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.6}, {:.6}, {:.6})",
            self.inner.x, self.inner.y, self.inner.z
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> AbsDiffEq<Self> for DirectionVector<In> {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        // direction cosines are dimensionless, so this is roughly 2e-4 arcseconds
        0.000_000_001
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.inner.abs_diff_eq(&other.inner, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> RelativeEq for DirectionVector<In> {
    fn default_max_relative() -> Self::Epsilon {
        Vector3::default_max_relative()
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
