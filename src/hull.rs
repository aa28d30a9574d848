//! Incremental convex hull of a set of directions.
//!
//! The hull is kept as a flat list of triangular faces. Faces are created, and removed, as
//! vertices are added one at a time; removing faces preserves the order of the faces that
//! remain, so the order of [`ConvexHull::faces`] is fully determined by the order in which
//! vertices were added.

use crate::directions::DirectionVector;
use crate::error::{Error, Result};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Below this, a length, area, or volume spanned by hull vertices is treated as zero.
const FLATNESS_TOLERANCE: f64 = 1e-12;

/// A triangular face of a [`ConvexHull`].
///
/// The corners are ordered counter-clockwise when viewed from outside the hull, so the face
/// normal `(b - a) × (c - a)` points outwards.
#[derive(Debug)]
pub struct Face<In> {
    ids: [usize; 3],
    corners: [DirectionVector<In>; 3],
}

// manual impls of Clone and Copy to avoid requiring In: Copy + Clone
impl<In> Clone for Face<In> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<In> Copy for Face<In> {}

impl<In> Face<In> {
    /// The ids of the three corners, as passed to [`ConvexHull::add_vertex`].
    #[must_use]
    pub fn ids(&self) -> [usize; 3] {
        self.ids
    }

    /// The positions of the three corners, in the same order as [`Face::ids`].
    #[must_use]
    pub fn corners(&self) -> &[DirectionVector<In>; 3] {
        &self.corners
    }

    #[must_use]
    pub fn has_vertex(&self, id: usize) -> bool {
        self.ids.contains(&id)
    }

    /// The outward-pointing (unnormalized) normal.
    #[must_use]
    pub fn normal(&self) -> DirectionVector<In> {
        let [a, b, c] = self.corners;
        (b - a).cross(&(c - a))
    }
}

#[derive(Debug)]
struct Vertex<In> {
    id: usize,
    position: DirectionVector<In>,
}

/// The convex hull of a set of id-tagged points in the frame `In`.
///
/// Add points with [`ConvexHull::add_vertex`], then call [`ConvexHull::construct`].
#[derive(Debug)]
pub struct ConvexHull<In> {
    vertices: Vec<Vertex<In>>,
    // indices into `vertices`, counter-clockwise from outside
    faces: Vec<[usize; 3]>,
}

impl<In> Default for ConvexHull<In> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }
}

impl<In> ConvexHull<In> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a point to be considered by the next [`ConvexHull::construct`].
    ///
    /// Ids are opaque to the hull, and only serve to identify the corners of faces.
    pub fn add_vertex(&mut self, id: usize, position: DirectionVector<In>) {
        self.vertices.push(Vertex { id, position });
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The position of the vertex with the given id, if there is one.
    #[must_use]
    pub fn vertex(&self, id: usize) -> Option<&DirectionVector<In>> {
        self.vertices
            .iter()
            .find(|vertex| vertex.id == id)
            .map(|vertex| &vertex.position)
    }

    /// Iterates over the faces of the hull.
    ///
    /// The order is the order faces were created in by [`ConvexHull::construct`], minus the faces
    /// that were later removed.
    pub fn faces(&self) -> impl Iterator<Item = Face<In>> + '_ {
        self.faces.iter().map(|&[a, b, c]| Face {
            ids: [self.vertices[a].id, self.vertices[b].id, self.vertices[c].id],
            corners: [
                self.vertices[a].position,
                self.vertices[b].position,
                self.vertices[c].position,
            ],
        })
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Builds the hull of all vertices added so far, replacing any previously built faces.
    ///
    /// Starts from a tetrahedron on the first three non-collinear vertices and the first vertex
    /// not coplanar with them, then adds every other vertex in the order it was added. Vertices
    /// that are inside (or on) the hull at that point are skipped.
    ///
    /// Fails with [`Error::DegenerateHull`] if the vertices do not span a volume.
    pub fn construct(&mut self) -> Result<()> {
        self.faces.clear();
        let degenerate = Error::DegenerateHull {
            vertices: self.vertices.len(),
        };

        let [a, b, c, d] = self.initial_tetrahedron().ok_or(degenerate)?;
        if self.signed_volume([a, b, c], d) > 0. {
            // d is in front of abc, so abc faces inwards
            self.faces = vec![[a, c, b], [c, a, d], [b, c, d], [a, b, d]];
        } else {
            self.faces = vec![[a, b, c], [b, a, d], [c, b, d], [a, c, d]];
        }
        trace!(
            "initial tetrahedron on vertices {:?}",
            [a, b, c, d].map(|i| self.vertices[i].id)
        );

        for next in 0..self.vertices.len() {
            if [a, b, c, d].contains(&next) {
                continue;
            }
            self.add_to_hull(next);
        }

        debug!(
            "convex hull of {} vertices has {} faces",
            self.vertices.len(),
            self.faces.len()
        );
        Ok(())
    }

    fn position(&self, index: usize) -> DirectionVector<In> {
        self.vertices[index].position
    }

    /// Six times the volume of the tetrahedron formed by `face` and `point`; positive if `point`
    /// is in front of the face.
    fn signed_volume(&self, [a, b, c]: [usize; 3], point: usize) -> f64 {
        let origin = self.position(a);
        let normal = (self.position(b) - origin).cross(&(self.position(c) - origin));
        normal.dot(&(self.position(point) - origin))
    }

    fn initial_tetrahedron(&self) -> Option<[usize; 4]> {
        let a = 0;
        let p = |i: usize| self.position(i);
        let b = (a + 1..self.vertices.len())
            .find(|&i| (p(i) - p(a)).length() > FLATNESS_TOLERANCE)?;
        let c = (b + 1..self.vertices.len())
            .find(|&i| (p(b) - p(a)).cross(&(p(i) - p(a))).length() > FLATNESS_TOLERANCE)?;
        let d = (c + 1..self.vertices.len())
            .find(|&i| self.signed_volume([a, b, c], i).abs() > FLATNESS_TOLERANCE)?;
        Some([a, b, c, d])
    }

    fn add_to_hull(&mut self, next: usize) {
        let visible: Vec<bool> = self
            .faces
            .iter()
            .map(|&face| self.signed_volume(face, next) > FLATNESS_TOLERANCE)
            .collect();
        if !visible.contains(&true) {
            trace!("vertex {} is inside the hull", self.vertices[next].id);
            return;
        }

        let visible_faces: Vec<[usize; 3]> = self
            .faces
            .iter()
            .zip(&visible)
            .filter_map(|(&face, &is_visible)| is_visible.then_some(face))
            .collect();
        let visible_edges: HashSet<(usize, usize)> =
            visible_faces.iter().flat_map(|&face| edges(face)).collect();
        // an edge of a visible face is on the horizon if the face across it is not visible
        let horizon: Vec<(usize, usize)> = visible_faces
            .iter()
            .flat_map(|&face| edges(face))
            .filter(|&(from, to)| !visible_edges.contains(&(to, from)))
            .collect();
        trace!(
            "vertex {} sees {} faces, horizon has {} edges",
            self.vertices[next].id,
            visible_faces.len(),
            horizon.len()
        );

        let mut visible = visible.into_iter();
        self.faces.retain(|_| !visible.next().unwrap_or(false));
        self.faces
            .extend(horizon.into_iter().map(|(from, to)| [from, to, next]));
    }
}

fn edges([a, b, c]: [usize; 3]) -> [(usize, usize); 3] {
    [(a, b), (b, c), (c, a)]
}

#[cfg(test)]
mod tests {
    use super::{ConvexHull, Face};
    use crate::directions::DirectionVector;
    use crate::error::Error;
    use crate::frames::Actual;
    use quickcheck::{quickcheck, TestResult};
    use std::collections::HashSet;

    fn v(x: f64, y: f64, z: f64) -> DirectionVector<Actual> {
        DirectionVector::new(x, y, z)
    }

    fn hull_of(points: &[DirectionVector<Actual>]) -> ConvexHull<Actual> {
        let mut hull = ConvexHull::new();
        for (id, &point) in points.iter().enumerate() {
            hull.add_vertex(id, point);
        }
        hull
    }

    fn assert_closed_and_convex(hull: &ConvexHull<Actual>, points: &[DirectionVector<Actual>]) {
        let faces: Vec<Face<Actual>> = hull.faces().collect();

        // every directed edge is matched by its reverse in exactly one other face
        let edges: Vec<(usize, usize)> = faces
            .iter()
            .flat_map(|face| {
                let [a, b, c] = face.ids();
                [(a, b), (b, c), (c, a)]
            })
            .collect();
        let unique: HashSet<_> = edges.iter().copied().collect();
        assert_eq!(unique.len(), edges.len(), "no directed edge appears twice");
        for &(from, to) in &edges {
            assert!(unique.contains(&(to, from)), "edge {from}->{to} is unmatched");
        }

        // no point is in front of any face
        for face in &faces {
            let normal = face.normal();
            for point in points {
                assert!(
                    normal.dot(&(*point - face.corners()[0])) <= 1e-9,
                    "{point} is in front of face {:?}",
                    face.ids()
                );
            }
        }
    }

    #[test]
    fn tetrahedron_either_way_round() {
        let points = [v(0., 0., 0.), v(1., 0., 0.), v(0., 1., 0.), v(0., 0., 1.)];
        let mut hull = hull_of(&points);
        hull.construct().unwrap();
        assert_eq!(hull.face_count(), 4);
        assert_closed_and_convex(&hull, &points);

        let points = [v(0., 0., 0.), v(0., 1., 0.), v(1., 0., 0.), v(0., 0., 1.)];
        let mut hull = hull_of(&points);
        hull.construct().unwrap();
        assert_closed_and_convex(&hull, &points);
    }

    #[test]
    fn octahedron() {
        let points = [
            v(0., 0., -1.),
            v(1., 0., 0.),
            v(0., 1., 0.),
            v(-1., 0., 0.),
            v(0., -1., 0.),
            v(0., 0., 1.),
        ];
        let mut hull = hull_of(&points);
        hull.construct().unwrap();
        assert_eq!(hull.face_count(), 8);
        assert_closed_and_convex(&hull, &points);
        for id in 0..points.len() {
            assert_eq!(hull.faces().filter(|face| face.has_vertex(id)).count(), 4);
        }
        // the poles are never on the same face
        assert!(!hull.faces().any(|face| face.has_vertex(0) && face.has_vertex(5)));
    }

    #[test]
    fn interior_and_duplicate_points_are_skipped() {
        let mut points = vec![];
        for x in [-1., 1.] {
            for y in [-1., 1.] {
                for z in [-1., 1.] {
                    points.push(v(x, y, z));
                }
            }
        }
        points.push(v(0., 0., 0.));
        points.push(v(1., 1., 1.));
        let mut hull = hull_of(&points);
        hull.construct().unwrap();
        // coplanar cube faces may be split either way, but there are always two triangles each
        assert_eq!(hull.face_count(), 12);
        assert_closed_and_convex(&hull, &points);
        assert!(!hull.faces().any(|face| face.has_vertex(8) || face.has_vertex(9)));
    }

    #[test]
    fn rebuilding_replaces_faces() {
        let points = [v(0., 0., 0.), v(1., 0., 0.), v(0., 1., 0.), v(0., 0., 1.)];
        let mut hull = hull_of(&points);
        hull.construct().unwrap();
        hull.add_vertex(4, v(1., 1., 1.));
        hull.construct().unwrap();
        assert_eq!(hull.face_count(), 6);
        assert_eq!(hull.vertex_count(), 5);
        assert_eq!(hull.vertex(4), Some(&v(1., 1., 1.)));
        assert_eq!(hull.vertex(5), None);
    }

    #[test]
    fn degenerate_inputs() {
        let mut hull = hull_of(&[v(1., 0., 0.), v(0., 1., 0.), v(0., 0., 1.)]);
        assert_eq!(hull.construct(), Err(Error::DegenerateHull { vertices: 3 }));

        let mut hull = hull_of(&[
            v(1., 0., 0.),
            v(0., 1., 0.),
            v(-1., 0., 0.),
            v(0., -1., 0.),
            v(0.5, 0.5, 0.),
        ]);
        assert_eq!(hull.construct(), Err(Error::DegenerateHull { vertices: 5 }));
        assert_eq!(hull.face_count(), 0);

        let mut hull = hull_of(&[v(1., 0., 0.), v(2., 0., 0.), v(3., 0., 0.), v(4., 0., 0.)]);
        assert_eq!(hull.construct(), Err(Error::DegenerateHull { vertices: 4 }));
    }

    #[test]
    fn collinear_prefix_is_tolerated() {
        let points = [
            v(0., 0., -1.),
            v(0., 0., -1.),
            v(0., 0., 1.),
            v(0., 0., 0.),
            v(1., 0., 0.),
            v(0., 1., 0.),
        ];
        let mut hull = hull_of(&points);
        hull.construct().unwrap();
        assert_closed_and_convex(&hull, &points);
    }

    quickcheck! {
        fn points_on_a_sphere(points: Vec<DirectionVector<Actual>>) -> TestResult {
            if points.len() < 4 {
                return TestResult::discard();
            }
            let mut hull = hull_of(&points);
            match hull.construct() {
                Ok(()) => {
                    assert_closed_and_convex(&hull, &points);
                    TestResult::passed()
                }
                // four random points can happen to be coplanar, but not realistically
                Err(_) => TestResult::discard(),
            }
        }
    }
}
