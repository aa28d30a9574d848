use crate::directions::DirectionVector;
use crate::frames::Apparent;
use crate::geographic::GeographicPosition;
use crate::spherical::Equatorial;
use crate::time::JulianDate;
use uom::si::angle::radian;
use uom::si::f64::Angle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A sync point as recorded: where the sky says the mount was pointing, and where the mount
/// itself said it was pointing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationEntry {
    /// The right ascension and declination of the object the mount was synced on.
    pub celestial: Equatorial,

    /// When the sync happened.
    pub observation: JulianDate,

    /// The direction the mount reported at the time, in the mount's own (apparent) frame.
    pub apparent: DirectionVector<Apparent>,
}

/// Where an [`AlignmentEngine`](crate::AlignmentEngine) gets its sync points from.
///
/// Entries are expected to be append-only; the engine only looks at them while it is being
/// [initialised](crate::AlignmentEngine::initialise), so adding entries has no effect on queries
/// until the engine is initialised again.
pub trait AlignmentDatabase {
    /// All sync points, oldest first.
    fn entries(&self) -> &[CalibrationEntry];

    /// Where on Earth the observatory is, if that is known yet.
    fn reference_position(&self) -> Option<GeographicPosition>;
}

/// An [`AlignmentDatabase`] that lives in memory.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InMemoryDatabase {
    entries: Vec<CalibrationEntry>,
    reference_position: Option<GeographicPosition>,
}

impl InMemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reference_position(position: GeographicPosition) -> Self {
        Self {
            entries: Vec::new(),
            reference_position: Some(position),
        }
    }

    pub fn set_reference_position(&mut self, position: GeographicPosition) {
        self.reference_position = Some(position);
    }

    pub fn push(&mut self, entry: CalibrationEntry) {
        self.entries.push(entry);
    }

    /// Forgets every sync point, but not the reference position.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether there is already a sync point within `tolerance` (angular separation on the sky)
    /// of `celestial`.
    ///
    /// Drivers use this to avoid recording the same sync point twice, which would make the
    /// alignment model degenerate.
    #[must_use]
    pub fn contains_near(&self, celestial: &Equatorial, tolerance: Angle) -> bool {
        let target = celestial.to_direction::<()>();
        self.entries.iter().any(|entry| {
            let other = entry.celestial.to_direction::<()>();
            let separation = target.cross(&other).length().atan2(target.dot(&other));
            separation <= tolerance.get::<radian>()
        })
    }
}

impl AlignmentDatabase for InMemoryDatabase {
    fn entries(&self) -> &[CalibrationEntry] {
        &self.entries
    }

    fn reference_position(&self) -> Option<GeographicPosition> {
        self.reference_position
    }
}

#[cfg(test)]
mod tests {
    use super::{AlignmentDatabase, CalibrationEntry, InMemoryDatabase};
    use crate::directions::DirectionVector;
    use crate::geographic::{Components, GeographicPosition};
    use crate::spherical::{Equatorial, EquatorialComponents};
    use crate::time::J2000;
    use rstest::rstest;
    use uom::si::angle::degree;
    use uom::si::f64::{Angle, Length};

    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }

    fn entry(ra: f64, dec: f64) -> CalibrationEntry {
        let celestial = Equatorial::build(EquatorialComponents {
            right_ascension: d(ra),
            declination: d(dec),
        })
        .expect("declination is in [-90, 90]");
        CalibrationEntry {
            celestial,
            observation: J2000,
            apparent: celestial.to_direction(),
        }
    }

    fn position() -> GeographicPosition {
        GeographicPosition::build(Components {
            latitude: d(52.),
            longitude: d(4.5),
            elevation: Length::default(),
        })
        .unwrap()
    }

    #[test]
    fn entries_keep_insertion_order() {
        let mut db = InMemoryDatabase::new();
        assert!(db.is_empty());
        assert_eq!(db.reference_position(), None);

        db.push(entry(10., 20.));
        db.push(entry(30., 40.));
        db.set_reference_position(position());
        assert_eq!(db.len(), 2);
        assert_eq!(db.entries(), &[entry(10., 20.), entry(30., 40.)]);
        assert_eq!(db.reference_position(), Some(position()));

        db.clear();
        assert!(db.entries().is_empty());
        assert_eq!(
            db.reference_position(),
            Some(position()),
            "clearing keeps the reference position"
        );
    }

    #[rstest]
    #[case(10., 20., true)]
    #[case(10.05, 20.05, true)]
    #[case(10.5, 20., false)]
    // right ascension is compressed near the pole
    #[case(190., 89.97, true)]
    #[case(370., 20., true)]
    fn near_duplicates(#[case] ra: f64, #[case] dec: f64, #[case] expected: bool) {
        let mut db = InMemoryDatabase::with_reference_position(position());
        db.push(entry(10., 20.));
        db.push(entry(10., 89.97));
        let candidate = entry(ra, dec).celestial;
        assert_eq!(db.contains_near(&candidate, d(0.1)), expected);
    }

    #[test]
    fn apparent_directions_are_stored_as_given() {
        let mut db = InMemoryDatabase::new();
        let mut skewed = entry(0., 0.);
        skewed.apparent = DirectionVector::new(0.99, 0.1, 0.);
        db.push(skewed);
        assert_eq!(db.entries()[0].apparent, DirectionVector::new(0.99, 0.1, 0.));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip() {
        let mut db = InMemoryDatabase::with_reference_position(position());
        db.push(entry(83.8221, -5.3911));
        let yaml = serde_yaml::to_string(&db).unwrap();
        let back: InMemoryDatabase = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.entries(), db.entries());
        assert_eq!(back.reference_position(), db.reference_position());
    }
}
