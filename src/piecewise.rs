//! The piecewise alignment model used once there are enough sync points to enclose a region of
//! the sky.
//!
//! The sync points are tiled into triangles twice over: once by the convex hull of their actual
//! directions, and once by the convex hull of their apparent directions. Both hulls number their
//! vertices the same way (sync point `i` is vertex `i + 1`, and vertex [`NADIR_ID`] is an extra
//! point straight down that closes the hull underneath the sky). Every triangle that does not
//! touch the nadir gets its own basis change, computed from its three corners, so that within a
//! triangle directions are mapped exactly like the three sync points at its corners are.
//!
//! A direction is mapped by casting a ray from the origin through it and applying the transform
//! of the first triangle (in hull order) that the ray passes through. Directions outside the
//! region covered by the hull are mapped by a one-off basis change from the three nearest sync
//! points instead.

use crate::directions::DirectionVector;
use crate::error::Result;
use crate::frames::{Actual, Apparent, Frame};
use crate::hull::ConvexHull;
use crate::intersection::ray_triangle_intersection;
use crate::numeric::dump_vector;
use crate::transform::{BasisChange, TransformMatrix};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// The hull vertex id of the nadir, `(0, 0, -1)`, which is part of both hulls.
pub const NADIR_ID: usize = 0;

/// Query rays are cast this far out so that they reach beyond the unit sphere the hull
/// vertices sit on.
const RAY_SCALE: f64 = 2.;

/// The same direction as seen in both frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncPoint {
    pub actual: DirectionVector<Actual>,
    pub apparent: DirectionVector<Apparent>,
}

/// Identifies a triangle of hull vertices regardless of winding or which corner comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FacetKey([usize; 3]);

impl FacetKey {
    #[must_use]
    pub fn new(mut ids: [usize; 3]) -> Self {
        ids.sort_unstable();
        Self(ids)
    }

    /// The vertex ids, in ascending order.
    #[must_use]
    pub fn ids(&self) -> [usize; 3] {
        self.0
    }

    #[must_use]
    pub fn touches_nadir(&self) -> bool {
        self.0.contains(&NADIR_ID)
    }
}

/// The transforms attached to one triangle of sync points.
///
/// The actual-to-apparent transform is only present if the triangle is a face of the actual
/// hull, and the apparent-to-actual one if it is a face of the apparent hull. Either is also
/// missing if the corners in its source frame are coplanar with the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FacetTransforms {
    pub actual_to_apparent: Option<TransformMatrix<Actual, Apparent>>,
    pub apparent_to_actual: Option<TransformMatrix<Apparent, Actual>>,
}

/// The sync points as seen in one frame, and the convex hull over them.
#[derive(Debug)]
pub struct Geometry<In> {
    // indexed by vertex id
    directions: Vec<DirectionVector<In>>,
    hull: ConvexHull<In>,
}

impl<In: Frame> Geometry<In> {
    fn build(sync_points: impl Iterator<Item = DirectionVector<In>>) -> Result<Self> {
        let directions: Vec<_> = std::iter::once(DirectionVector::nadir())
            .chain(sync_points)
            .collect();
        let mut hull = ConvexHull::new();
        for (id, &direction) in directions.iter().enumerate() {
            hull.add_vertex(id, direction);
        }
        if let Err(error) = hull.construct() {
            warn!("cannot build the {:?} hull: {error}", In::KIND);
            return Err(error);
        }
        debug!(
            "{:?} hull has {} faces over {} vertices",
            In::KIND,
            hull.face_count(),
            directions.len()
        );
        Ok(Self { directions, hull })
    }

    #[must_use]
    pub fn hull(&self) -> &ConvexHull<In> {
        &self.hull
    }

    /// The direction of the hull vertex with the given id.
    #[must_use]
    pub fn direction(&self, id: usize) -> Option<DirectionVector<In>> {
        self.directions.get(id).copied()
    }

    fn corners(&self, ids: [usize; 3]) -> [DirectionVector<In>; 3] {
        ids.map(|id| self.directions[id])
    }

    /// The facets (other than those touching the nadir) that a ray from the origin through
    /// `query` passes through, in hull order.
    pub fn intersected_facets<'a>(
        &'a self,
        query: &DirectionVector<In>,
    ) -> impl Iterator<Item = FacetKey> + 'a {
        let ray = *query * RAY_SCALE;
        self.hull
            .faces()
            .filter(|face| !face.has_vertex(NADIR_ID))
            .filter(move |face| {
                let [v1, v2, v3] = face.corners();
                ray_triangle_intersection(&ray, v1, v2, v3)
            })
            .map(|face| FacetKey::new(face.ids()))
    }

    /// Sync point vertex ids ordered by increasing distance from `query`.
    ///
    /// Sync points at the same distance keep their original order.
    #[must_use]
    pub fn nearest(&self, query: &DirectionVector<In>) -> Vec<usize> {
        let mut by_distance: Vec<(usize, f64)> = self
            .directions
            .iter()
            .enumerate()
            .skip(1)
            .map(|(id, direction)| (id, (*direction - *query).length()))
            .collect();
        by_distance.sort_by(|(_, a), (_, b)| a.total_cmp(b));
        by_distance.into_iter().map(|(id, _)| id).collect()
    }
}

/// The piecewise model over four or more sync points.
#[derive(Debug)]
pub struct PiecewiseModel {
    actual: Geometry<Actual>,
    apparent: Geometry<Apparent>,
    transforms: BTreeMap<FacetKey, FacetTransforms>,
}

impl PiecewiseModel {
    /// Builds both hulls over `sync_points` and the transform of every facet.
    ///
    /// Facets whose corners are coplanar with the origin are left without a transform (and
    /// logged); they are never used to map a direction. Fails with
    /// [`Error::DegenerateHull`](crate::Error::DegenerateHull) if the directions in either frame
    /// do not span a volume together with the nadir.
    pub fn build(sync_points: &[SyncPoint]) -> Result<Self> {
        let actual = Geometry::build(sync_points.iter().map(|point| point.actual))?;
        let apparent = Geometry::build(sync_points.iter().map(|point| point.apparent))?;

        let mut transforms = BTreeMap::<FacetKey, FacetTransforms>::new();
        for (key, matrix) in facet_transforms(&actual, &apparent) {
            transforms.entry(key).or_default().actual_to_apparent = matrix;
        }
        for (key, matrix) in facet_transforms(&apparent, &actual) {
            transforms.entry(key).or_default().apparent_to_actual = matrix;
        }

        Ok(Self {
            actual,
            apparent,
            transforms,
        })
    }

    #[must_use]
    pub fn actual(&self) -> &Geometry<Actual> {
        &self.actual
    }

    #[must_use]
    pub fn apparent(&self) -> &Geometry<Apparent> {
        &self.apparent
    }

    /// The transforms of the facet with the given corners, if it is a facet of either hull.
    #[must_use]
    pub fn facet(&self, key: &FacetKey) -> Option<&FacetTransforms> {
        self.transforms.get(key)
    }

    /// Every facet of either hull (except those touching the nadir), in ascending key order.
    pub fn facets(&self) -> impl Iterator<Item = (&FacetKey, &FacetTransforms)> + '_ {
        self.transforms.iter()
    }

    /// Maps an actual direction to the apparent direction the mount would report for it.
    ///
    /// The result is normalized.
    #[must_use]
    pub fn actual_to_apparent(&self, query: DirectionVector<Actual>) -> DirectionVector<Apparent> {
        map_direction(&self.actual, &self.apparent, query, |facet| {
            self.transforms
                .get(&facet)
                .and_then(|transforms| transforms.actual_to_apparent)
        })
    }

    /// Maps an apparent direction, as reported by the mount, to the actual direction.
    ///
    /// The result is normalized.
    #[must_use]
    pub fn apparent_to_actual(&self, query: DirectionVector<Apparent>) -> DirectionVector<Actual> {
        map_direction(&self.apparent, &self.actual, query, |facet| {
            self.transforms
                .get(&facet)
                .and_then(|transforms| transforms.apparent_to_actual)
        })
    }
}

/// Computes the transform of every facet of `source`'s hull that does not touch the nadir.
fn facet_transforms<From: Frame>(
    source: &Geometry<From>,
    target: &Geometry<From::Opposite>,
) -> Vec<(FacetKey, Option<TransformMatrix<From, From::Opposite>>)> {
    let mut out = Vec::with_capacity(source.hull.face_count());
    for face in source.hull.faces() {
        let key = FacetKey::new(face.ids());
        if key.touches_nadir() {
            trace!("ignoring {:?} facet {:?} on the nadir", From::KIND, key.ids());
            continue;
        }
        let ids = key.ids();
        let matrix = match BasisChange::new(source.corners(ids), target.corners(ids)).forward() {
            Ok(matrix) => Some(matrix),
            Err(error) => {
                warn!(
                    "{:?} facet {:?} has no usable transform: {error}",
                    From::KIND,
                    key.ids()
                );
                None
            }
        };
        out.push((key, matrix));
    }
    out
}

fn map_direction<From: Frame>(
    source: &Geometry<From>,
    target: &Geometry<From::Opposite>,
    query: DirectionVector<From>,
    facet_transform: impl Fn(FacetKey) -> Option<TransformMatrix<From, From::Opposite>>,
) -> DirectionVector<From::Opposite> {
    dump_vector("piecewise query", &query.inner);

    let located = source.intersected_facets(&query).find_map(|facet| {
        let matrix = facet_transform(facet);
        if matrix.is_none() {
            trace!("skipping facet {:?} without a transform", facet.ids());
        }
        matrix.map(|matrix| (facet, matrix))
    });
    if let Some((facet, matrix)) = located {
        trace!("{:?} query falls in facet {:?}", From::KIND, facet.ids());
        return matrix.transform(query).normalized();
    }

    debug!(
        "{:?} query is outside the hull, using the nearest sync points",
        From::KIND
    );
    if let Some(matrix) = nearest_basis_change(source, target, &query) {
        return matrix.transform(query).normalized();
    }

    warn!(
        "no three sync points near the {:?} query span a basis, leaving it untransformed",
        From::KIND
    );
    query.reinterpret_in::<From::Opposite>()
}

/// A basis change from the three sync points closest to `query`.
///
/// If those three happen to be coplanar with the origin, the next-closest combinations are
/// tried: the furthest of the three is swapped out first.
fn nearest_basis_change<From: Frame>(
    source: &Geometry<From>,
    target: &Geometry<From::Opposite>,
    query: &DirectionVector<From>,
) -> Option<TransformMatrix<From, From::Opposite>> {
    let nearest = source.nearest(query);
    let n = nearest.len();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                let ids = [nearest[i], nearest[j], nearest[k]];
                let basis = BasisChange::new(source.corners(ids), target.corners(ids));
                match basis.forward() {
                    Ok(matrix) => {
                        trace!("nearest sync points {ids:?}");
                        return Some(matrix);
                    }
                    Err(error) => trace!("nearest sync points {ids:?}: {error}"),
                }
            }
        }
    }
    None
}
