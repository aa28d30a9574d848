use std::fmt::{self, Display, Formatter};
use std::ops::Add;
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: f64 = 86_400.;
const UNIX_EPOCH_JULIAN_DATE: f64 = 2_440_587.5;

/// The J2000.0 epoch, 2000-01-01T12:00:00 TT.
pub const J2000: JulianDate = JulianDate(2_451_545.0);

/// A moment in time as a (UT) Julian date, in days.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct JulianDate(pub f64);

impl JulianDate {
    /// The current Julian date according to the system clock.
    #[must_use]
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    #[must_use]
    pub fn from_system_time(time: SystemTime) -> Self {
        let seconds = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_secs_f64(),
            Err(before) => -before.duration().as_secs_f64(),
        };
        Self(UNIX_EPOCH_JULIAN_DATE + seconds / SECONDS_PER_DAY)
    }

    /// Days elapsed since [`J2000`].
    #[must_use]
    pub fn days_since_j2000(self) -> f64 {
        self.0 - J2000.0
    }
}

/// Offsets a date by a (possibly fractional, possibly negative) number of days.
impl Add<f64> for JulianDate {
    type Output = Self;

    fn add(self, days: f64) -> Self::Output {
        Self(self.0 + days)
    }
}

impl Display for JulianDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "JD {:.5}", self.0)
    }
}

/// Source of "now" for alignment queries.
///
/// Horizontal coordinates depend on sidereal time, so every query on an alt-az mount needs to
/// know when it is being asked. Swap in a [`FixedClock`] to make queries reproducible.
pub trait Clock {
    fn now(&self) -> JulianDate;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> JulianDate {
        JulianDate::now()
    }
}

/// Always reports the same moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock(pub JulianDate);

impl Clock for FixedClock {
    fn now(&self) -> JulianDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock, JulianDate, SystemClock, J2000};
    use approx::assert_relative_eq;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn unix_epoch() {
        assert_eq!(
            JulianDate::from_system_time(UNIX_EPOCH),
            JulianDate(2_440_587.5)
        );
    }

    #[test]
    fn j2000_from_system_time() {
        // 2000-01-01T12:00:00Z
        let j2000 = UNIX_EPOCH + Duration::from_secs(946_728_000);
        assert_relative_eq!(JulianDate::from_system_time(j2000).0, J2000.0);
        assert_relative_eq!(JulianDate::from_system_time(j2000).days_since_j2000(), 0.);
    }

    #[test]
    fn before_unix_epoch() {
        let before = UNIX_EPOCH - Duration::from_secs(43_200);
        assert_relative_eq!(JulianDate::from_system_time(before).0, 2_440_587.0);
    }

    #[test]
    fn clocks() {
        let fixed = FixedClock(J2000 + 0.25);
        assert_eq!(fixed.now(), JulianDate(2_451_545.25));
        assert!(SystemClock.now() > J2000);
    }

    #[test]
    fn display() {
        insta::assert_snapshot!(J2000 + 0.5, @"JD 2451545.50000");
    }
}
