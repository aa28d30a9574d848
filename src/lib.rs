//! This library corrects the pointing of a telescope mount using a set of sync points, so that
//! astronomers can get on with observing rather than with polar alignment.
//!
//! No mount is perfectly set up: its polar axis is a little off, its axes are not quite
//! perpendicular, its encoders have some offset. The classic fix is to "sync" the mount on a few
//! known stars. Each sync point records where the sky says the mount was pointing (the _actual_
//! direction) alongside where the mount itself thought it was pointing (the _apparent_
//! direction). From those, an [`AlignmentEngine`] builds a model that maps any further direction
//! between the two.
//!
//! Directions are [`DirectionVector`]s, which are generic over a [`Frame`] so that actual and
//! apparent directions cannot be mixed up: the model maps [`Actual`] directions to [`Apparent`]
//! ones with [`TransformMatrix`]es, and back.
//!
//! Which directions are "actual" depends on the [`MountAlignment`]. For an alt-az mount
//! ([`MountAlignment::Zenith`]) they are horizontal coordinates, so the engine needs to know where
//! the observatory is and what time it is. For an equatorial mount they are equatorial
//! coordinates directly.
//!
//! # Examples
//!
//! An equatorial mount whose polar axis is off by a bit, synced on a handful of stars:
//!
//! ```
//! use skyalign::{
//!     AlignmentEngine, CalibrationEntry, DirectionVector, Equatorial, EquatorialComponents,
//!     GeographicPosition, InMemoryDatabase, MountAlignment, Apparent, JulianDate,
//! };
//! use skyalign::geographic::Components;
//! use uom::si::f64::{Angle, Length};
//! use uom::si::{angle::degree, length::meter};
//!
//! let radec = |ra: f64, dec: f64| {
//!     Equatorial::build(EquatorialComponents {
//!         right_ascension: Angle::new::<degree>(ra),
//!         declination: Angle::new::<degree>(dec),
//!     })
//!     .expect("declination is in [-90, 90]")
//! };
//!
//! // where the observatory is
//! let observatory = GeographicPosition::build(Components {
//!     latitude: Angle::new::<degree>(52.),
//!     longitude: Angle::new::<degree>(4.5),
//!     elevation: Length::new::<meter>(10.),
//! })
//! .expect("latitude is in [-90, 90]");
//! let mut database = InMemoryDatabase::with_reference_position(observatory);
//!
//! // the mount reports every direction a little too far towards +y
//! let skewed = |star: Equatorial| {
//!     let ideal: DirectionVector<Apparent> = star.to_direction();
//!     DirectionVector::new(ideal.x(), ideal.y() + 0.01, ideal.z()).normalized()
//! };
//! for star in [radec(10., 20.), radec(100., 45.), radec(200., 30.), radec(300., 60.)] {
//!     database.push(CalibrationEntry {
//!         celestial: star,
//!         observation: JulianDate::now(),
//!         apparent: skewed(star),
//!     });
//! }
//!
//! let mut engine = AlignmentEngine::new(MountAlignment::NorthCelestialPole);
//! engine.initialise(&database)?;
//!
//! // where to point the mount to look at a star we did not sync on
//! let target = radec(150., 70.);
//! let apparent = engine.transform_celestial_to_telescope(&target, 0.)?;
//! assert!((apparent.y() - skewed(target).y()).abs() < 0.01);
//!
//! // and back
//! let seen = engine.transform_telescope_to_celestial(&apparent)?;
//! assert!((seen.declination() - target.declination()).abs() < Angle::new::<degree>(0.1));
//! # Ok::<(), skyalign::Error>(())
//! ```
//!
//! # Features
//!
//! - `serde`: `Serialize` and `Deserialize` for value types, the database, and
//!   [`MountAlignment`].
//! - `approx`: `AbsDiffEq` and `RelativeEq` for value types.
//!
//! Both are enabled by default.
//!
//! # Logging
//!
//! Model construction and queries are instrumented with [`tracing`]. Which model was chosen,
//! degenerate facets, and queries that fall outside the calibrated region are logged at `debug`
//! and `warn`; every matrix and query vector is dumped at `trace`.

mod directions;
mod engine;
mod error;
mod frames;
mod spherical;
mod util;

pub mod conversion;
pub mod database;
pub mod geographic;
pub mod hull;
pub mod intersection;
pub mod numeric;
pub mod piecewise;
pub mod time;
pub mod transform;

pub(crate) type Vector3 = nalgebra::Vector3<f64>;
pub(crate) type Matrix3 = nalgebra::Matrix3<f64>;

pub use database::{AlignmentDatabase, CalibrationEntry, InMemoryDatabase};
pub use directions::DirectionVector;
pub use engine::{AlignmentEngine, ModelKind, MountAlignment, ParseMountAlignmentError};
pub use error::{Error, Result};
pub use frames::{Actual, Apparent, Frame, FrameKind};
pub use geographic::GeographicPosition;
pub use spherical::{Equatorial, EquatorialComponents, Horizontal, HorizontalComponents};
pub use time::{Clock, FixedClock, JulianDate, SystemClock};
pub use transform::{BasisChange, TransformMatrix};
