use glam::{Vec2, Vec3};

const EPSILON: f32 = 1e-9;

/// Triangulates a simple polygon projected onto the XZ plane by ear clipping.
///
/// Returns `3 * (n - 2)` indices into `points` for `n >= 3`, wound the same way
/// as the input, and nothing for fewer than three points. When no ear can be
/// found (collinear or self-touching input) the current vertex is clipped anyway
/// so the triangle count stays `n - 2`.
pub fn triangulate_xz(points: &[Vec3]) -> Vec<u32> {
    let count = points.len();
    if count < 3 {
        return Vec::new();
    }

    let projected: Vec<Vec2> = points.iter().map(|p| Vec2::new(p.x, p.z)).collect();
    let orientation = if signed_area(&projected) >= 0.0 { 1.0 } else { -1.0 };

    let mut remaining: Vec<usize> = (0..count).collect();
    let mut indices = Vec::with_capacity((count - 2) * 3);
    let mut cursor = 0;
    let mut misses = 0;

    while remaining.len() > 3 {
        let len = remaining.len();
        let prev = remaining[(cursor + len - 1) % len];
        let curr = remaining[cursor];
        let next = remaining[(cursor + 1) % len];

        if misses >= len || is_ear(&projected, &remaining, prev, curr, next, orientation) {
            indices.extend([prev as u32, curr as u32, next as u32]);
            remaining.remove(cursor);
            if cursor >= remaining.len() {
                cursor = 0;
            }
            misses = 0;
        } else {
            cursor = (cursor + 1) % len;
            misses += 1;
        }
    }

    indices.extend(remaining.iter().map(|&index| index as u32));
    indices
}

/// Signed area of a closed polygon, positive when counter-clockwise.
pub(crate) fn signed_area(points: &[Vec2]) -> f32 {
    let mut sum = 0.0;
    for (index, a) in points.iter().enumerate() {
        let b = points[(index + 1) % points.len()];
        sum += a.perp_dot(b);
    }
    sum * 0.5
}

fn is_ear(
    points: &[Vec2],
    remaining: &[usize],
    prev: usize,
    curr: usize,
    next: usize,
    orientation: f32,
) -> bool {
    let (a, b, c) = (points[prev], points[curr], points[next]);
    if (b - a).perp_dot(c - b) * orientation <= EPSILON {
        return false;
    }

    !remaining
        .iter()
        .filter(|&&index| index != prev && index != curr && index != next)
        .any(|&index| {
            let p = points[index];
            p != a && p != b && p != c && contains(a, b, c, p, orientation)
        })
}

fn contains(a: Vec2, b: Vec2, c: Vec2, p: Vec2, orientation: f32) -> bool {
    (b - a).perp_dot(p - a) * orientation >= 0.0
        && (c - b).perp_dot(p - b) * orientation >= 0.0
        && (a - c).perp_dot(p - c) * orientation >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn xz(points: &[(f32, f32)]) -> Vec<Vec3> {
        points.iter().map(|&(x, z)| Vec3::new(x, 0.0, z)).collect()
    }

    fn triangulated_area(points: &[Vec3], indices: &[u32]) -> f32 {
        indices
            .chunks_exact(3)
            .map(|tri| {
                let corners: Vec<Vec2> = tri
                    .iter()
                    .map(|&i| Vec2::new(points[i as usize].x, points[i as usize].z))
                    .collect();
                signed_area(&corners).abs()
            })
            .sum()
    }

    #[test]
    fn fewer_than_three_points_yield_nothing() {
        assert!(triangulate_xz(&[]).is_empty());
        assert!(triangulate_xz(&xz(&[(0.0, 0.0), (1.0, 0.0)])).is_empty());
    }

    #[test]
    fn triangle_passes_through() {
        let points = xz(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        assert_eq!(triangulate_xz(&points), vec![0, 1, 2]);
    }

    #[test]
    fn concave_polygon_covers_its_area() {
        // An L shape with one reflex corner.
        let points = xz(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
        ]);
        let indices = triangulate_xz(&points);
        assert_eq!(indices.len(), (points.len() - 2) * 3);
        assert!((triangulated_area(&points, &indices) - 3.0).abs() < 1e-4);
    }

    #[test]
    fn clockwise_input_is_handled() {
        let points = xz(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        let indices = triangulate_xz(&points);
        assert_eq!(indices.len(), 6);
        assert!((triangulated_area(&points, &indices) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn collinear_input_still_emits_n_minus_two_triangles() {
        let points = xz(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        let indices = triangulate_xz(&points);
        assert_eq!(indices.len(), 6);
        assert!(triangulated_area(&points, &indices) < 1e-6);
    }

    fn star_polygon() -> impl Strategy<Value = Vec<Vec3>> {
        (3usize..24).prop_flat_map(|count| {
            (
                prop::collection::vec(0.5f32..3.0, count),
                any::<bool>(),
                -2.0f32..2.0,
            )
                .prop_map(move |(radii, clockwise, height)| {
                    let mut points: Vec<Vec3> = radii
                        .iter()
                        .enumerate()
                        .map(|(i, r)| {
                            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
                            Vec3::new(r * angle.cos(), height, r * angle.sin())
                        })
                        .collect();
                    if clockwise {
                        points.reverse();
                    }
                    points
                })
        })
    }

    proptest! {
        #[test]
        fn simple_polygons_split_into_n_minus_two_triangles(points in star_polygon()) {
            let indices = triangulate_xz(&points);
            prop_assert_eq!(indices.len(), (points.len() - 2) * 3);

            let projected: Vec<Vec2> = points.iter().map(|p| Vec2::new(p.x, p.z)).collect();
            let expected = signed_area(&projected).abs();
            let covered = triangulated_area(&points, &indices);
            prop_assert!((expected - covered).abs() <= 1e-3 * expected.max(1.0),
                "expected area {} but triangles cover {}", expected, covered);
        }
    }
}
