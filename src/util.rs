use std::f64::consts::{FRAC_PI_2, TAU};
use uom::si::angle::radian;
use uom::si::f64::Angle;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An angle that is compared and reported modulo one full turn.
///
/// Right ascension and azimuth wrap around, so 359.9° and -0.1° name the same direction. uom
/// itself keeps whatever value it was given, so this type does the wrapping.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct BoundedAngle {
    radians: f64,
}

impl BoundedAngle {
    pub(crate) fn new(angle: impl Into<Angle>) -> Self {
        Self {
            radians: angle.into().get::<radian>().rem_euclid(TAU),
        }
    }

    /// Returns the angle in [0°, 360°) in radians.
    pub(crate) fn get_bounded(self) -> f64 {
        // rem_euclid can round up to exactly TAU for tiny negative inputs
        if self.radians >= TAU {
            0.
        } else {
            self.radians
        }
    }

    /// Returns the angle in [0°, 360°).
    pub(crate) fn to_angle(self) -> Angle {
        Angle::new::<radian>(self.get_bounded())
    }

    /// Returns the angle in [-180°, 180°) in radians.
    pub(crate) fn to_signed_range(self) -> f64 {
        let angle = self.get_bounded();
        if angle < TAU / 2. {
            angle
        } else {
            angle - TAU
        }
    }

    /// Whether the angle, taken modulo a full turn, lies in [-90°, 90°].
    ///
    /// This is the valid range for declinations, altitudes, and latitudes.
    pub(crate) fn is_within_quarter_turn(self) -> bool {
        // degree -> radian conversion may land an ulp past the pole
        const SLACK: f64 = 1e-12;
        (-FRAC_PI_2 - SLACK..=FRAC_PI_2 + SLACK).contains(&self.to_signed_range())
    }
}

impl<U: Into<Angle>> From<U> for BoundedAngle {
    fn from(value: U) -> Self {
        BoundedAngle::new(value)
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for BoundedAngle {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        // this is very accurate in radians
        0.000_000_001
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        Self::new(Angle::new::<radian>(self.radians - other.radians))
            .to_signed_range()
            .abs()
            <= epsilon
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for BoundedAngle {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let min = f64::min(self.get_bounded(), other.get_bounded());
        let max = f64::max(self.get_bounded(), other.get_bounded());

        // either side of the 0°/360° seam
        f64::relative_eq(&min, &max, epsilon, max_relative)
            || f64::relative_eq(&(min + TAU), &max, epsilon, max_relative)
    }
}
