#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::{DirectionVector, TransformMatrix};

/// Defines one of the two frames a pointing direction can be expressed in.
///
/// Every calibration entry carries a direction in each frame, and the whole purpose of the
/// alignment model is to move directions between them. Types like [`DirectionVector`] and
/// [`TransformMatrix`] are generic over a `Frame` so that an apparent (mount-reported) direction
/// cannot accidentally be fed to code that expects an actual (sky-derived) one.
///
/// The trait is sealed; [`Actual`] and [`Apparent`] are the only frames.
pub trait Frame: sealed::Sealed + Copy + 'static {
    /// The runtime tag for this frame.
    const KIND: FrameKind;

    /// The frame that the alignment model maps this one into.
    type Opposite: Frame<Opposite = Self>;
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Actual {}
    impl Sealed for super::Apparent {}
}

/// The frame of directions derived from astronomy and geography: where the mount is _really_
/// pointing.
///
/// For [`MountAlignment::Zenith`](crate::MountAlignment::Zenith) these are horizontal
/// (altitude/azimuth) direction cosines, for the polar hints they are equatorial
/// (right ascension/declination) direction cosines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actual;

/// The frame of directions as the mount itself reports them, including every mechanical error
/// the mount has accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Apparent;

impl Frame for Actual {
    const KIND: FrameKind = FrameKind::Actual;
    type Opposite = Apparent;
}

impl Frame for Apparent {
    const KIND: FrameKind = FrameKind::Apparent;
    type Opposite = Actual;
}

/// Runtime tag for a [`Frame`], used where geometry for both frames lives side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrameKind {
    Actual,
    Apparent,
}

impl FrameKind {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Actual => Self::Apparent,
            Self::Apparent => Self::Actual,
        }
    }
}
