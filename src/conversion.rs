//! Conversions between equatorial and horizontal coordinates.
//!
//! Horizontal coordinates depend on where and when the sky is observed: the hour angle of an
//! object is the local sidereal time minus its right ascension, and the local sidereal time is
//! the Greenwich mean sidereal time advanced by the observer's (east positive) longitude.
//!
//! The sidereal time here is the linear IAU 1982 approximation, which is good to well under a
//! second of time for dates within a few centuries of J2000. That is plenty for pointing a
//! telescope, and the alignment model absorbs any constant offset anyway.

use crate::geographic::GeographicPosition;
use crate::spherical::{Equatorial, Horizontal};
use crate::time::JulianDate;
use crate::util::BoundedAngle;
use uom::si::angle::{degree, radian};
use uom::si::f64::Angle;

const GMST_AT_J2000_DEGREES: f64 = 280.460_618_37;
const SIDEREAL_DEGREES_PER_DAY: f64 = 360.985_647_366_29;

/// Greenwich mean sidereal time at `when`, in [0°, 360°).
#[must_use]
pub fn greenwich_mean_sidereal_time(when: JulianDate) -> Angle {
    let degrees = GMST_AT_J2000_DEGREES + SIDEREAL_DEGREES_PER_DAY * when.days_since_j2000();
    BoundedAngle::new(Angle::new::<degree>(degrees)).to_angle()
}

/// Local mean sidereal time at `position` at `when`, in [0°, 360°).
#[must_use]
pub fn local_sidereal_time(when: JulianDate, position: &GeographicPosition) -> Angle {
    BoundedAngle::new(greenwich_mean_sidereal_time(when) + position.longitude()).to_angle()
}

/// Where `target` appears in the sky as seen from `position` at `when`.
///
/// Azimuth is measured from North through East.
#[must_use]
pub fn equatorial_to_horizontal(
    target: &Equatorial,
    position: &GeographicPosition,
    when: JulianDate,
) -> Horizontal {
    let hour_angle = local_sidereal_time(when, position) - target.right_ascension();
    let (azimuth, altitude) = swap_hemisphere_basis(
        hour_angle.get::<radian>(),
        target.declination().get::<radian>(),
        position.latitude().get::<radian>(),
    );
    Horizontal::from_angles_unchecked(
        Angle::new::<radian>(azimuth),
        Angle::new::<radian>(altitude),
    )
}

/// The equatorial coordinates of whatever is at `apparent` as seen from `position` at `when`.
///
/// This is the exact inverse of [`equatorial_to_horizontal`].
#[must_use]
pub fn horizontal_to_equatorial(
    apparent: &Horizontal,
    position: &GeographicPosition,
    when: JulianDate,
) -> Equatorial {
    let (hour_angle, declination) = swap_hemisphere_basis(
        apparent.azimuth().get::<radian>(),
        apparent.altitude().get::<radian>(),
        position.latitude().get::<radian>(),
    );
    let right_ascension = local_sidereal_time(when, position) - Angle::new::<radian>(hour_angle);
    Equatorial::from_angles_unchecked(right_ascension, Angle::new::<radian>(declination))
}

/// Rotates (hour angle, declination) into (azimuth, altitude) about the east-west axis, or back.
///
/// Both directions are the same formula, since the rotation that takes the celestial pole to the
/// zenith also takes the zenith to the celestial pole (with the azimuth and hour angle both
/// increasing westwards from the meridian in their own frames).
fn swap_hemisphere_basis(azimuthal: f64, elevation: f64, latitude: f64) -> (f64, f64) {
    let (sin_a, cos_a) = azimuthal.sin_cos();
    let (sin_e, cos_e) = elevation.sin_cos();
    let (sin_l, cos_l) = latitude.sin_cos();

    let other_elevation = (sin_e * sin_l + cos_e * cos_l * cos_a).clamp(-1., 1.).asin();
    let other_azimuthal = f64::atan2(-cos_e * sin_a, sin_e * cos_l - cos_e * sin_l * cos_a);
    (other_azimuthal, other_elevation)
}

#[cfg(test)]
mod tests {
    use super::{
        equatorial_to_horizontal, greenwich_mean_sidereal_time, horizontal_to_equatorial,
        local_sidereal_time,
    };
    use crate::geographic::{Components, GeographicPosition};
    use crate::spherical::{Equatorial, EquatorialComponents};
    use crate::time::{JulianDate, J2000};
    use crate::util::BoundedAngle;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use quickcheck::quickcheck;
    use rstest::rstest;
    use uom::si::angle::degree;
    use uom::si::f64::{Angle, Length};

    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }

    fn site(latitude: f64, longitude: f64) -> GeographicPosition {
        GeographicPosition::build(Components {
            latitude: d(latitude),
            longitude: d(longitude),
            elevation: Length::default(),
        })
        .expect("latitude is in [-90, 90]")
    }

    /// An object at hour angle `hour_angle` as seen from `position` at J2000.
    fn at_hour_angle(hour_angle: f64, declination: f64, position: &GeographicPosition) -> Equatorial {
        let lst = local_sidereal_time(J2000, position).get::<degree>();
        Equatorial::build(EquatorialComponents {
            right_ascension: d(lst - hour_angle),
            declination: d(declination),
        })
        .expect("declination is in [-90, 90]")
    }

    #[test]
    fn sidereal_time_at_j2000() {
        assert_relative_eq!(
            greenwich_mean_sidereal_time(J2000).get::<degree>(),
            280.460_618_37,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            local_sidereal_time(J2000, &site(0., 90.)).get::<degree>(),
            10.460_618_37,
            epsilon = 1e-9
        );
    }

    #[test]
    fn sidereal_day_is_shorter_than_solar_day() {
        // one solar day later the sky has turned a little further than a full circle
        let advance = greenwich_mean_sidereal_time(J2000 + 1.).get::<degree>()
            - greenwich_mean_sidereal_time(J2000).get::<degree>();
        assert_relative_eq!(advance, 0.985_647_366_29, epsilon = 1e-6);
    }

    #[rstest]
    // on the meridian at the observer's latitude: zenith
    #[case(45., 0., 45., None, 90.)]
    // celestial equator on the meridian: due south
    #[case(45., 0., 0., Some(180.), 45.)]
    // the north celestial pole is due north at altitude = latitude
    #[case(45., 37., 90., Some(0.), 45.)]
    // rising on the celestial equator from the equator: due east on the horizon
    #[case(0., -90., 0., Some(90.), 0.)]
    // setting: due west
    #[case(0., 90., 0., Some(270.), 0.)]
    // southern hemisphere, equator on the meridian: due north
    #[case(-30., 0., 0., Some(0.), 60.)]
    fn known_positions(
        #[case] latitude: f64,
        #[case] hour_angle: f64,
        #[case] declination: f64,
        #[case] azimuth: Option<f64>,
        #[case] altitude: f64,
    ) {
        let position = site(latitude, 12.5);
        let target = at_hour_angle(hour_angle, declination, &position);
        let altaz = equatorial_to_horizontal(&target, &position, J2000);
        // asin is ill-conditioned at the zenith
        assert_relative_eq!(altaz.altitude().get::<degree>(), altitude, epsilon = 1e-6);
        if let Some(azimuth) = azimuth {
            assert_abs_diff_eq!(
                BoundedAngle::new(altaz.azimuth()),
                BoundedAngle::new(d(azimuth)),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn sky_turns_westwards() {
        let position = site(52., 5.);
        let target = at_hour_angle(-30., 20., &position);
        let earlier = equatorial_to_horizontal(&target, &position, J2000);
        let later = equatorial_to_horizontal(&target, &position, J2000 + 1. / 24.);
        // still rising in the east, an hour later it is higher and further south
        assert!(later.altitude() > earlier.altitude());
        assert!(later.azimuth() > earlier.azimuth());
        assert!(later.azimuth().get::<degree>() < 180.);
    }

    quickcheck! {
        fn horizontal_roundtrip(target: Equatorial, latitude: Equatorial, days: u16) -> () {
            // borrow the declination generator for the latitude, RA for the longitude
            let position = site(
                latitude.declination().get::<degree>(),
                latitude.right_ascension().get::<degree>(),
            );
            let when = JulianDate(J2000.0 + f64::from(days) / 7.);
            let altaz = equatorial_to_horizontal(&target, &position, when);
            let back = horizontal_to_equatorial(&altaz, &position, when);
            assert_abs_diff_eq!(target, back, epsilon = 1e-7);
        }
    }
}
