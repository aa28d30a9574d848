use crate::util::BoundedAngle;
use std::fmt;
use std::fmt::Display;
use std::marker::PhantomData;
use uom::si::f64::{Angle, Length};
use uom::si::{
    angle::{degree, radian},
    length::meter,
};
use uom::ConstZero;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The observatory's place on Earth, used to turn equatorial coordinates into horizontal ones.
///
/// This is the "reference position" of an alignment database. Longitude is positive towards the
/// East.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeographicPosition {
    latitude: Angle,
    longitude: Angle,
    elevation: Length,
}

impl GeographicPosition {
    /// Constructs a position from latitude, longitude, and elevation.
    ///
    /// The latitude must be in [-90°,90°] % 360°. If it is not, this function returns `None`.
    #[must_use]
    pub fn build(
        Components {
            latitude,
            longitude,
            elevation,
        }: Components,
    ) -> Option<Self> {
        Some(
            Self::builder()
                .latitude(latitude)?
                .longitude(longitude)
                .elevation(elevation)
                .build(),
        )
    }

    /// Provides a constructor for a [`GeographicPosition`].
    pub fn builder() -> Builder<MissingLatitude, MissingLongitude> {
        Builder {
            under_construction: GeographicPosition {
                latitude: Angle::ZERO,
                longitude: Angle::ZERO,
                elevation: Length::ZERO,
            },
            has: (PhantomData, PhantomData),
        }
    }

    /// Returns the latitude, north positive, in [-90°, 90°].
    #[must_use]
    pub fn latitude(&self) -> Angle {
        Angle::new::<radian>(BoundedAngle::new(self.latitude).to_signed_range())
    }

    /// Returns the longitude, east positive, in [-180°, 180°).
    #[must_use]
    pub fn longitude(&self) -> Angle {
        Angle::new::<radian>(BoundedAngle::new(self.longitude).to_signed_range())
    }

    /// Returns the elevation above mean sea level.
    ///
    /// The alignment model itself does not depend on elevation; it is carried for the benefit of
    /// callers that share the database with refraction or ephemeris code.
    #[must_use]
    pub fn elevation(&self) -> Length {
        self.elevation
    }
}

impl Display for GeographicPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat = self.latitude();
        let lon = self.longitude();
        let ns = if lat.is_sign_negative() { 'S' } else { 'N' };
        let ew = if lon.is_sign_negative() { 'W' } else { 'E' };
        write!(
            f,
            "{:.4}°{ns}, {:.4}°{ew}, {:.1}m",
            lat.abs().get::<degree>(),
            lon.abs().get::<degree>(),
            self.elevation.get::<meter>()
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for GeographicPosition {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        // radians for the angles, meters for the elevation
        0.000_000_001
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        BoundedAngle::new(self.latitude).abs_diff_eq(&BoundedAngle::new(other.latitude), epsilon)
            && BoundedAngle::new(self.longitude)
                .abs_diff_eq(&BoundedAngle::new(other.longitude), epsilon)
            && self
                .elevation
                .get::<meter>()
                .abs_diff_eq(&other.elevation.get::<meter>(), epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for GeographicPosition {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        BoundedAngle::new(self.latitude).relative_eq(
            &BoundedAngle::new(other.latitude),
            epsilon,
            max_relative,
        ) && BoundedAngle::new(self.longitude).relative_eq(
            &BoundedAngle::new(other.longitude),
            epsilon,
            max_relative,
        ) && self.elevation.get::<meter>().relative_eq(
            &other.elevation.get::<meter>(),
            epsilon,
            max_relative,
        )
    }
}

/// Argument type for [`GeographicPosition::build`].
#[derive(Debug, Default)]
#[must_use]
pub struct Components {
    /// Must be in [-90°,90°] % 360°.
    pub latitude: Angle,

    /// East positive.
    pub longitude: Angle,

    pub elevation: Length,
}

/// Used to indicate that a partially-constructed [`GeographicPosition`] is missing the latitude.
pub struct MissingLatitude;
/// Used to indicate that a partially-constructed [`GeographicPosition`] has the latitude set.
pub struct HasLatitude;
/// Used to indicate that a partially-constructed [`GeographicPosition`] is missing the longitude.
pub struct MissingLongitude;
/// Used to indicate that a partially-constructed [`GeographicPosition`] has the longitude set.
pub struct HasLongitude;

/// [Builder] for a [`GeographicPosition`].
///
/// Construct one through [`GeographicPosition::builder`], and finalize with [`Builder::build`].
/// Elevation is optional and defaults to sea level.
///
/// [Builder]: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
#[derive(Debug)]
#[must_use]
pub struct Builder<Latitude, Longitude> {
    under_construction: GeographicPosition,
    has: (PhantomData<Latitude>, PhantomData<Longitude>),
}

// manual impls of Clone and Copy to avoid requiring the markers to be Copy + Clone
impl<L1, L2> Clone for Builder<L1, L2> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<L1, L2> Copy for Builder<L1, L2> {}

impl<L1, L2> Builder<L1, L2> {
    /// Sets the latitude of the [`GeographicPosition`]-to-be.
    ///
    /// The latitude must be in [-90°,90°] % 360°. If it is not, this function returns `None`.
    pub fn latitude(mut self, latitude: impl Into<Angle>) -> Option<Builder<HasLatitude, L2>> {
        let latitude = latitude.into();
        if !BoundedAngle::new(latitude).is_within_quarter_turn() {
            return None;
        }
        self.under_construction.latitude = latitude;
        Some(Builder {
            under_construction: self.under_construction,
            has: (PhantomData::<HasLatitude>, self.has.1),
        })
    }

    /// Sets the longitude (east positive) of the [`GeographicPosition`]-to-be.
    pub fn longitude(mut self, longitude: impl Into<Angle>) -> Builder<L1, HasLongitude> {
        self.under_construction.longitude = longitude.into();
        Builder {
            under_construction: self.under_construction,
            has: (self.has.0, PhantomData::<HasLongitude>),
        }
    }

    /// Sets the elevation above mean sea level of the [`GeographicPosition`]-to-be.
    pub fn elevation(mut self, elevation: impl Into<Length>) -> Self {
        self.under_construction.elevation = elevation.into();
        self
    }
}

impl Builder<HasLatitude, HasLongitude> {
    #[must_use]
    pub fn build(self) -> GeographicPosition {
        self.under_construction
    }
}
