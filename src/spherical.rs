//! Spherical sky coordinates and their direction-cosine form.

use crate::directions::DirectionVector;
use crate::util::BoundedAngle;
use std::fmt::{self, Display, Formatter};
use uom::si::angle::{degree, radian};
use uom::si::f64::Angle;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Equatorial coordinates: right ascension and declination.
///
/// Right ascension is an [`Angle`] like any other. If you have it in hours, multiply by 15 to get
/// degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Equatorial {
    right_ascension: Angle,
    declination: Angle,
}

/// Argument type for [`Equatorial::build`].
#[derive(Debug, Default, Clone, Copy)]
#[must_use]
pub struct EquatorialComponents {
    pub right_ascension: Angle,

    /// Must be in [-90°,90°] % 360°.
    pub declination: Angle,
}

impl Equatorial {
    /// Constructs equatorial coordinates.
    ///
    /// The declination must be in [-90°,90°] % 360°. If it is not, this function returns `None`.
    #[must_use]
    pub fn build(
        EquatorialComponents {
            right_ascension,
            declination,
        }: EquatorialComponents,
    ) -> Option<Self> {
        let declination = BoundedAngle::new(declination);
        if !declination.is_within_quarter_turn() {
            return None;
        }
        Some(Self {
            right_ascension: BoundedAngle::new(right_ascension).to_angle(),
            declination: Angle::new::<radian>(declination.to_signed_range()),
        })
    }

    /// For angles that are already known to be in range, such as the output of `asin`.
    pub(crate) fn from_angles_unchecked(right_ascension: Angle, declination: Angle) -> Self {
        Self {
            right_ascension: BoundedAngle::new(right_ascension).to_angle(),
            declination,
        }
    }

    /// Returns the right ascension in [0°, 360°).
    #[must_use]
    pub fn right_ascension(&self) -> Angle {
        self.right_ascension
    }

    /// Returns the declination in [-90°, 90°].
    #[must_use]
    pub fn declination(&self) -> Angle {
        self.declination
    }

    /// Expresses these coordinates as direction cosines in an equatorial frame.
    #[must_use]
    pub fn to_direction<In>(&self) -> DirectionVector<In> {
        direction_from_spherical(self.right_ascension, self.declination)
    }

    /// Recovers equatorial coordinates from direction cosines in an equatorial frame.
    ///
    /// The direction need not be normalized. A zero vector yields the origin of both angles.
    #[must_use]
    pub fn from_direction<In>(direction: &DirectionVector<In>) -> Self {
        let (right_ascension, declination) = spherical_from_direction(direction);
        Self {
            right_ascension,
            declination,
        }
    }
}

impl Display for Equatorial {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RA {:.4}° Dec {:+.4}°",
            self.right_ascension.get::<degree>(),
            self.declination.get::<degree>()
        )
    }
}

/// Horizontal (alt-az) coordinates as seen from some place on Earth.
///
/// Azimuth is measured from North towards East; altitude is the angle above the horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Horizontal {
    azimuth: Angle,
    altitude: Angle,
}

/// Argument type for [`Horizontal::build`].
#[derive(Debug, Default, Clone, Copy)]
#[must_use]
pub struct HorizontalComponents {
    pub azimuth: Angle,

    /// Must be in [-90°,90°] % 360°.
    pub altitude: Angle,
}

impl Horizontal {
    /// Constructs horizontal coordinates.
    ///
    /// The altitude must be in [-90°,90°] % 360°. If it is not, this function returns `None`.
    #[must_use]
    pub fn build(HorizontalComponents { azimuth, altitude }: HorizontalComponents) -> Option<Self> {
        let altitude = BoundedAngle::new(altitude);
        if !altitude.is_within_quarter_turn() {
            return None;
        }
        Some(Self {
            azimuth: BoundedAngle::new(azimuth).to_angle(),
            altitude: Angle::new::<radian>(altitude.to_signed_range()),
        })
    }

    pub(crate) fn from_angles_unchecked(azimuth: Angle, altitude: Angle) -> Self {
        Self {
            azimuth: BoundedAngle::new(azimuth).to_angle(),
            altitude,
        }
    }

    /// Returns the azimuth in [0°, 360°).
    #[must_use]
    pub fn azimuth(&self) -> Angle {
        self.azimuth
    }

    /// Returns the altitude in [-90°, 90°].
    #[must_use]
    pub fn altitude(&self) -> Angle {
        self.altitude
    }

    /// Expresses these coordinates as direction cosines in a horizontal frame.
    #[must_use]
    pub fn to_direction<In>(&self) -> DirectionVector<In> {
        direction_from_spherical(self.azimuth, self.altitude)
    }

    /// Recovers horizontal coordinates from direction cosines in a horizontal frame.
    #[must_use]
    pub fn from_direction<In>(direction: &DirectionVector<In>) -> Self {
        let (azimuth, altitude) = spherical_from_direction(direction);
        Self { azimuth, altitude }
    }
}

impl Display for Horizontal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Az {:.4}° Alt {:+.4}°",
            self.azimuth.get::<degree>(),
            self.altitude.get::<degree>()
        )
    }
}

fn direction_from_spherical<In>(azimuthal: Angle, elevation: Angle) -> DirectionVector<In> {
    let phi = azimuthal.get::<radian>();
    let theta = elevation.get::<radian>();
    DirectionVector::new(
        theta.cos() * phi.cos(),
        theta.cos() * phi.sin(),
        theta.sin(),
    )
}

fn spherical_from_direction<In>(direction: &DirectionVector<In>) -> (Angle, Angle) {
    let unit = direction.normalized();
    // atan2(0, 0) is 0, which is as good an azimuth as any at the poles
    let azimuthal = BoundedAngle::new(Angle::new::<radian>(unit.y().atan2(unit.x()))).to_angle();
    let elevation = Angle::new::<radian>(unit.z().clamp(-1., 1.).asin());
    (azimuthal, elevation)
}

#[cfg(any(test, feature = "approx"))]
fn angular_separation(a_phi: Angle, a_theta: Angle, b_phi: Angle, b_theta: Angle) -> f64 {
    let a: DirectionVector<()> = direction_from_spherical(a_phi, a_theta);
    let b: DirectionVector<()> = direction_from_spherical(b_phi, b_theta);
    // atan2 of |a×b| and a·b stays accurate for tiny separations where acos does not
    a.cross(&b).length().atan2(a.dot(&b))
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Equatorial {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        // radians on the sky
        0.000_000_001
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        angular_separation(
            self.right_ascension,
            self.declination,
            other.right_ascension,
            other.declination,
        ) <= epsilon
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Equatorial {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let componentwise = BoundedAngle::new(self.right_ascension).relative_eq(
            &BoundedAngle::new(other.right_ascension),
            epsilon,
            max_relative,
        ) && self.declination.get::<radian>().relative_eq(
            &other.declination.get::<radian>(),
            epsilon,
            max_relative,
        );
        // near the poles right ascension is ill-conditioned, so fall back to sky separation
        componentwise || self.abs_diff_eq(other, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Horizontal {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        0.000_000_001
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        angular_separation(self.azimuth, self.altitude, other.azimuth, other.altitude) <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::{Equatorial, EquatorialComponents, Horizontal, HorizontalComponents};
    use crate::directions::DirectionVector;
    use crate::frames::Actual;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use quickcheck::{quickcheck, Arbitrary};
    use rstest::rstest;
    use uom::si::angle::degree;
    use uom::si::f64::Angle;

    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }

    fn radec(ra: f64, dec: f64) -> Equatorial {
        Equatorial::build(EquatorialComponents {
            right_ascension: d(ra),
            declination: d(dec),
        })
        .expect("declination is in [-90, 90]")
    }

    impl Arbitrary for Equatorial {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            // quickcheck will give us awkward f64 values -- we ignore those
            let mut finite = || loop {
                match f64::arbitrary(g) {
                    0. => break 0.,
                    f if f.is_normal() => break f,
                    _ => {}
                }
            };
            let ra = finite().rem_euclid(360.);
            // stay off the poles, where right ascension is meaningless
            let dec = finite().rem_euclid(178.) - 89.;
            radec(ra, dec)
        }
    }

    #[rstest]
    #[case(0., 0., [1., 0., 0.])]
    #[case(90., 0., [0., 1., 0.])]
    #[case(180., 0., [-1., 0., 0.])]
    #[case(270., 0., [0., -1., 0.])]
    #[case(0., 90., [0., 0., 1.])]
    #[case(123., -90., [0., 0., -1.])]
    #[case(45., 45., [0.5, 0.5, std::f64::consts::FRAC_1_SQRT_2])]
    fn equatorial_to_direction(#[case] ra: f64, #[case] dec: f64, #[case] expected: [f64; 3]) {
        assert_abs_diff_eq!(
            radec(ra, dec).to_direction::<Actual>(),
            DirectionVector::new(expected[0], expected[1], expected[2]),
            epsilon = 1e-12
        );
    }

    #[rstest]
    #[case(d(90.5))]
    #[case(d(-91.))]
    #[case(d(180.))]
    fn declination_out_of_range_is_rejected(#[case] declination: Angle) {
        assert_eq!(
            Equatorial::build(EquatorialComponents {
                right_ascension: d(10.),
                declination,
            }),
            None
        );
        assert_eq!(
            Horizontal::build(HorizontalComponents {
                azimuth: d(10.),
                altitude: declination,
            }),
            None
        );
    }

    #[test]
    fn right_ascension_is_wrapped() {
        assert_relative_eq!(
            radec(-30., 10.).right_ascension().get::<degree>(),
            330.,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            radec(390., 10.).right_ascension().get::<degree>(),
            30.,
            epsilon = 1e-9
        );
    }

    #[test]
    fn from_unnormalized_direction() {
        let v = DirectionVector::<Actual>::new(0., 3., 3.);
        let eq = Equatorial::from_direction(&v);
        assert_relative_eq!(eq.right_ascension().get::<degree>(), 90., epsilon = 1e-9);
        assert_relative_eq!(eq.declination().get::<degree>(), 45., epsilon = 1e-9);
    }

    #[test]
    fn display() {
        insta::assert_snapshot!(radec(83.8221, -5.3911), @"RA 83.8221° Dec -5.3911°");
        let altaz = Horizontal::build(HorizontalComponents {
            azimuth: d(180.),
            altitude: d(30.),
        })
        .unwrap();
        insta::assert_snapshot!(altaz, @"Az 180.0000° Alt +30.0000°");
    }

    quickcheck! {
        fn equatorial_direction_roundtrip(eq: Equatorial) -> () {
            let back = Equatorial::from_direction(&eq.to_direction::<Actual>());
            assert_relative_eq!(eq, back, epsilon = 1e-9);
        }

        fn horizontal_direction_roundtrip(eq: Equatorial) -> () {
            // reuse the generator: same ranges, different meaning
            let altaz = Horizontal::build(HorizontalComponents {
                azimuth: eq.right_ascension(),
                altitude: eq.declination(),
            }).expect("altitude is in range");
            let back = Horizontal::from_direction(&altaz.to_direction::<Actual>());
            assert_abs_diff_eq!(altaz, back, epsilon = 1e-9);
        }
    }
}
