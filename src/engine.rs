//! Building the alignment model from sync points, and querying it.

use crate::conversion::{equatorial_to_horizontal, horizontal_to_equatorial};
use crate::database::AlignmentDatabase;
use crate::directions::DirectionVector;
use crate::error::{Error, Result};
use crate::frames::{Actual, Apparent};
use crate::geographic::GeographicPosition;
use crate::piecewise::{PiecewiseModel, SyncPoint};
use crate::spherical::{Equatorial, Horizontal};
use crate::time::{Clock, JulianDate, SystemClock};
use crate::transform::{BasisChange, TransformMatrix};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, trace, warn};
use uom::si::angle::degree;
use uom::si::f64::Angle;
use uom::ConstZero;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the mount is set up, which decides what "actual" directions are.
///
/// An alt-az mount ([`MountAlignment::Zenith`]) moves in azimuth and altitude, so its actual
/// directions are horizontal coordinates, which depend on the observatory's location and on the
/// time. An equatorial mount is aligned on one of the celestial poles and moves in right
/// ascension and declination directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum MountAlignment {
    #[default]
    Zenith,
    NorthCelestialPole,
    SouthCelestialPole,
}

impl MountAlignment {
    /// The direction used to complete a basis when there is only one sync point: the zenith, or
    /// the celestial pole the mount is aligned on.
    fn reference_direction(self) -> DirectionVector<Actual> {
        let pole = |declination: f64| {
            Equatorial::from_angles_unchecked(Angle::ZERO, Angle::new::<degree>(declination))
                .to_direction()
        };
        match self {
            Self::Zenith => DirectionVector::zenith(),
            Self::NorthCelestialPole => pole(90.),
            Self::SouthCelestialPole => pole(-90.),
        }
    }
}

impl Display for MountAlignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Zenith => "ZENITH",
            Self::NorthCelestialPole => "NORTH_CELESTIAL_POLE",
            Self::SouthCelestialPole => "SOUTH_CELESTIAL_POLE",
        })
    }
}

/// Returned when parsing a [`MountAlignment`] from an unknown name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mount alignment {0:?}")]
pub struct ParseMountAlignmentError(String);

impl FromStr for MountAlignment {
    type Err = ParseMountAlignmentError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ZENITH" => Ok(Self::Zenith),
            "NORTH_CELESTIAL_POLE" => Ok(Self::NorthCelestialPole),
            "SOUTH_CELESTIAL_POLE" => Ok(Self::SouthCelestialPole),
            _ => Err(ParseMountAlignmentError(s.to_owned())),
        }
    }
}

/// Which kind of model an [`AlignmentEngine`] built from its sync points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// No sync points: the mount is assumed to be perfectly aligned.
    Identity,
    /// One to three sync points: a single basis change for the whole sky.
    BasisChange,
    /// Four or more sync points: a basis change per triangle of sync points.
    Piecewise,
}

#[derive(Debug)]
enum Transforms {
    Identity,
    BasisChange {
        actual_to_apparent: TransformMatrix<Actual, Apparent>,
        apparent_to_actual: TransformMatrix<Apparent, Actual>,
    },
    Piecewise(PiecewiseModel),
}

/// Everything a query needs, copied out of the database when the model was built.
#[derive(Debug)]
struct Model {
    position: GeographicPosition,
    sync_point_count: usize,
    transforms: Transforms,
}

/// Maps between where the sky says a telescope should point and where its mount thinks it is
/// pointing, based on a set of sync points.
///
/// Build (and rebuild, whenever sync points are added) the model with
/// [`AlignmentEngine::initialise`], then map directions with
/// [`AlignmentEngine::transform_celestial_to_telescope`] and
/// [`AlignmentEngine::transform_telescope_to_celestial`].
///
/// How the model is built depends on the number of sync points:
///
/// - with none, directions are passed through as is;
/// - with one, two or three, a single basis change is fitted to them, padded out with the
///   [reference direction](MountAlignment) and cross products where there are fewer than three;
/// - with four or more, a [`PiecewiseModel`] fits a basis change to every triangle of sync
///   points.
///
/// Queries on an alt-az mount depend on the time, which is read from `C`.
#[derive(Debug)]
pub struct AlignmentEngine<C = SystemClock> {
    alignment: MountAlignment,
    clock: C,
    model: Option<Model>,
    model_epoch: u64,
}

impl AlignmentEngine<SystemClock> {
    #[must_use]
    pub fn new(alignment: MountAlignment) -> Self {
        Self::with_clock(alignment, SystemClock)
    }
}

impl<C: Clock> AlignmentEngine<C> {
    #[must_use]
    pub fn with_clock(alignment: MountAlignment, clock: C) -> Self {
        Self {
            alignment,
            clock,
            model: None,
            model_epoch: 0,
        }
    }

    #[must_use]
    pub fn mount_alignment(&self) -> MountAlignment {
        self.alignment
    }

    /// The number of sync points the current model was built from, or `None` if there is no
    /// model.
    #[must_use]
    pub fn sync_point_count(&self) -> Option<usize> {
        self.model.as_ref().map(|model| model.sync_point_count)
    }

    #[must_use]
    pub fn model_kind(&self) -> Option<ModelKind> {
        self.model.as_ref().map(|model| match model.transforms {
            Transforms::Identity => ModelKind::Identity,
            Transforms::BasisChange { .. } => ModelKind::BasisChange,
            Transforms::Piecewise(_) => ModelKind::Piecewise,
        })
    }

    /// The piecewise model, if that is what the current model is.
    #[must_use]
    pub fn piecewise_model(&self) -> Option<&PiecewiseModel> {
        match self.model.as_ref().map(|model| &model.transforms) {
            Some(Transforms::Piecewise(piecewise)) => Some(piecewise),
            _ => None,
        }
    }

    /// Increases by one every time [`AlignmentEngine::initialise`] succeeds.
    ///
    /// Callers that hold on to results derived from the model can use this to tell whether the
    /// model has been rebuilt since.
    #[must_use]
    pub fn model_epoch(&self) -> u64 {
        self.model_epoch
    }

    /// (Re)builds the model from every sync point in `database`.
    ///
    /// On success the previous model is replaced wholesale. On failure there is no model
    /// afterwards, and queries fail with [`Error::NotInitialised`] until the next successful
    /// call.
    ///
    /// Fails with [`Error::MissingReferencePosition`] if the database does not know where the
    /// observatory is, with [`Error::DegenerateBasis`] if one to three sync points do not span a
    /// basis, and with [`Error::DegenerateHull`] if four or more sync points do not span a volume.
    pub fn initialise<D>(&mut self, database: &D) -> Result<()>
    where
        D: AlignmentDatabase + ?Sized,
    {
        match self.build_model(database) {
            Ok(model) => {
                self.model = Some(model);
                self.model_epoch += 1;
                debug!("alignment model epoch {} is active", self.model_epoch);
                Ok(())
            }
            Err(error) => {
                self.model = None;
                warn!("failed to build alignment model: {error}");
                Err(error)
            }
        }
    }

    fn build_model<D>(&self, database: &D) -> Result<Model>
    where
        D: AlignmentDatabase + ?Sized,
    {
        let position = database
            .reference_position()
            .ok_or(Error::MissingReferencePosition)?;
        let sync_points: Vec<SyncPoint> = database
            .entries()
            .iter()
            .map(|entry| SyncPoint {
                actual: actual_direction(
                    self.alignment,
                    &entry.celestial,
                    &position,
                    entry.observation,
                ),
                apparent: entry.apparent,
            })
            .collect();

        let transforms = match sync_points.as_slice() {
            [] => {
                debug!("no sync points, assuming a perfectly aligned mount");
                Transforms::Identity
            }
            [first] => {
                debug!("one sync point, completing the basis with {}", self.alignment);
                let reference = self.alignment.reference_direction();
                basis_change(
                    [first.actual, reference],
                    [first.apparent, reference.reinterpret_in()],
                )?
            }
            [first, second] => {
                debug!("two sync points, completing the basis with their cross product");
                basis_change(
                    [first.actual, second.actual],
                    [first.apparent, second.apparent],
                )?
            }
            [first, second, third] => {
                debug!("three sync points");
                let (actual_to_apparent, apparent_to_actual) = BasisChange::new(
                    [first.actual, second.actual, third.actual],
                    [first.apparent, second.apparent, third.apparent],
                )
                .forward_and_inverse()?;
                Transforms::BasisChange {
                    actual_to_apparent,
                    apparent_to_actual,
                }
            }
            _ => {
                debug!("{} sync points, building piecewise model", sync_points.len());
                Transforms::Piecewise(PiecewiseModel::build(&sync_points)?)
            }
        };

        Ok(Model {
            position,
            sync_point_count: sync_points.len(),
            transforms,
        })
    }

    /// Where the mount has to point to look at `celestial`, `julian_offset` days from now.
    ///
    /// The returned direction is normalized.
    ///
    /// Fails with [`Error::NotInitialised`] if there is no model.
    pub fn transform_celestial_to_telescope(
        &self,
        celestial: &Equatorial,
        julian_offset: f64,
    ) -> Result<DirectionVector<Apparent>> {
        let model = self.model.as_ref().ok_or(Error::NotInitialised)?;
        let when = self.clock.now() + julian_offset;
        let actual = actual_direction(self.alignment, celestial, &model.position, when);

        let apparent = match &model.transforms {
            Transforms::Identity => actual.reinterpret_in(),
            Transforms::BasisChange {
                actual_to_apparent, ..
            } => actual_to_apparent.transform(actual).normalized(),
            Transforms::Piecewise(piecewise) => piecewise.actual_to_apparent(actual),
        };
        trace!("{celestial} at {when}: actual {actual}, apparent {apparent}");
        Ok(apparent)
    }

    /// What the mount is looking at (now) when it reports pointing at `apparent`.
    ///
    /// Fails with [`Error::NotInitialised`] if there is no model.
    pub fn transform_telescope_to_celestial(
        &self,
        apparent: &DirectionVector<Apparent>,
    ) -> Result<Equatorial> {
        let model = self.model.as_ref().ok_or(Error::NotInitialised)?;
        let when = self.clock.now();

        let actual = match &model.transforms {
            Transforms::Identity => apparent.reinterpret_in(),
            Transforms::BasisChange {
                apparent_to_actual, ..
            } => apparent_to_actual.transform(*apparent).normalized(),
            Transforms::Piecewise(piecewise) => piecewise.apparent_to_actual(*apparent),
        };
        let celestial = match self.alignment {
            MountAlignment::Zenith => horizontal_to_equatorial(
                &Horizontal::from_direction(&actual),
                &model.position,
                when,
            ),
            MountAlignment::NorthCelestialPole | MountAlignment::SouthCelestialPole => {
                Equatorial::from_direction(&actual)
            }
        };
        trace!("apparent {apparent} at {when}: actual {actual}, {celestial}");
        Ok(celestial)
    }
}

/// The actual direction of `celestial` in the frame the mount moves in.
fn actual_direction(
    alignment: MountAlignment,
    celestial: &Equatorial,
    position: &GeographicPosition,
    when: JulianDate,
) -> DirectionVector<Actual> {
    match alignment {
        MountAlignment::Zenith => {
            equatorial_to_horizontal(celestial, position, when).to_direction()
        }
        MountAlignment::NorthCelestialPole | MountAlignment::SouthCelestialPole => {
            celestial.to_direction()
        }
    }
}

/// A basis change from two directions, completed with their (normalized) cross product.
fn basis_change(
    [actual1, actual2]: [DirectionVector<Actual>; 2],
    [apparent1, apparent2]: [DirectionVector<Apparent>; 2],
) -> Result<Transforms> {
    let actual3 = actual1.cross(&actual2).normalized();
    let apparent3 = apparent1.cross(&apparent2).normalized();
    let (actual_to_apparent, apparent_to_actual) = BasisChange::new(
        [actual1, actual2, actual3],
        [apparent1, apparent2, apparent3],
    )
    .forward_and_inverse()?;
    Ok(Transforms::BasisChange {
        actual_to_apparent,
        apparent_to_actual,
    })
}
