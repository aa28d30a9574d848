use crate::directions::DirectionVector;

/// Whether a ray cast from the origin along `ray` passes through the triangle `v1 v2 v3`.
///
/// This is the [Möller–Trumbore] test. Only hits strictly in front of the origin count. A ray
/// (nearly) parallel to the triangle's plane never hits it, but triangles are otherwise hit from
/// either side: their winding does not matter.
///
/// [Möller–Trumbore]: https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm
#[must_use]
pub fn ray_triangle_intersection<In>(
    ray: &DirectionVector<In>,
    v1: &DirectionVector<In>,
    v2: &DirectionVector<In>,
    v3: &DirectionVector<In>,
) -> bool {
    let epsilon = f64::EPSILON;

    let edge1 = *v2 - *v1;
    let edge2 = *v3 - *v1;
    let p = ray.cross(&edge2);
    let determinant = edge1.dot(&p);
    if determinant.abs() < epsilon {
        return false;
    }

    // from v1 to the ray origin
    let t = -*v1;
    let u = t.dot(&p) / determinant;
    if !(0. ..=1.).contains(&u) {
        return false;
    }

    let q = t.cross(&edge1);
    let v = ray.dot(&q) / determinant;
    if v < 0. || u + v > 1. {
        return false;
    }

    let distance = edge2.dot(&q) / determinant;
    distance > epsilon
}
