//! Random point distribution over a mesh surface.
//!
//! The particle cloud is seeded by drawing points uniformly over the surface
//! area of the loaded model: a triangle is picked proportionally to its area
//! via a cumulative area table, then a point inside it via the square-root
//! barycentric trick. An optional minimum-distance pass rejects candidates
//! that land too close to an already accepted point, which thins clusters
//! towards a blue-noise look.

use cgmath::{InnerSpace, Vector3};
use rand::Rng;

use crate::data_structures::mesh::MeshData;

/// One point on the surface with its interpolated normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSample {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
}

/// Cumulative triangle-area table for area-proportional triangle selection.
///
/// Degenerate triangles contribute zero width and are therefore never picked.
struct AreaTable {
    cumulative: Vec<f32>,
    total: f32,
}

impl AreaTable {
    fn build(mesh: &MeshData) -> Self {
        let mut cumulative = Vec::with_capacity(mesh.triangle_count());
        let mut total = 0.0f32;
        for tri in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle(tri);
            total += (b - a).cross(c - a).magnitude() * 0.5;
            cumulative.push(total);
        }
        Self { cumulative, total }
    }

    fn pick<R: Rng>(&self, rng: &mut R) -> usize {
        let needle = rng.gen_range(0.0..self.total);
        self.cumulative.partition_point(|&acc| acc <= needle)
    }
}

fn sample_in_triangle<R: Rng>(mesh: &MeshData, tri: usize, rng: &mut R) -> SurfaceSample {
    let [a, b, c] = mesh.triangle(tri);

    // sqrt on the first draw makes the distribution uniform over the
    // triangle instead of crowding one corner.
    let su = rng.gen::<f32>().sqrt();
    let v = rng.gen::<f32>();
    let (wa, wb, wc) = (1.0 - su, su * (1.0 - v), su * v);

    let position = a * wa + b * wb + c * wc;
    let normal = match mesh.triangle_normals(tri) {
        Some([na, nb, nc]) => {
            let n = na * wa + nb * wb + nc * wc;
            if n.magnitude2() > 0.0 {
                n.normalize()
            } else {
                face_normal(a, b, c)
            }
        }
        None => face_normal(a, b, c),
    };
    SurfaceSample { position, normal }
}

fn face_normal(a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Vector3<f32> {
    let n = (b - a).cross(c - a);
    if n.magnitude2() > 0.0 {
        n.normalize()
    } else {
        Vector3::unit_y()
    }
}

/// Draw `count` points uniformly distributed over the mesh surface.
///
/// An empty mesh, or one whose triangles all have zero area, yields an
/// empty vector.
pub fn sample_surface<R: Rng>(mesh: &MeshData, count: usize, rng: &mut R) -> Vec<SurfaceSample> {
    let table = AreaTable::build(mesh);
    if table.total <= 0.0 || count == 0 {
        return Vec::new();
    }
    (0..count)
        .map(|_| sample_in_triangle(mesh, table.pick(rng), rng))
        .collect()
}

/// Like [`sample_surface`], but candidates closer than `min_distance` to an
/// accepted point are rejected.
///
/// Each accepted point costs at most `max_attempts` candidate draws, so the
/// call always terminates; when the surface cannot fit `count` points at the
/// requested spacing the result is simply shorter.
pub fn sample_surface_min_dist<R: Rng>(
    mesh: &MeshData,
    count: usize,
    min_distance: f32,
    max_attempts: usize,
    rng: &mut R,
) -> Vec<SurfaceSample> {
    if min_distance <= 0.0 {
        return sample_surface(mesh, count, rng);
    }
    let table = AreaTable::build(mesh);
    if table.total <= 0.0 || count == 0 {
        return Vec::new();
    }

    let min_dist2 = min_distance * min_distance;
    let mut accepted: Vec<SurfaceSample> = Vec::with_capacity(count);
    'outer: while accepted.len() < count {
        for _ in 0..max_attempts.max(1) {
            let candidate = sample_in_triangle(mesh, table.pick(rng), rng);
            let crowded = accepted
                .iter()
                .any(|s| (s.position - candidate.position).magnitude2() < min_dist2);
            if !crowded {
                accepted.push(candidate);
                continue 'outer;
            }
        }
        // Attempts exhausted: the surface is saturated at this spacing.
        log::debug!(
            "surface saturated after {} of {} samples (min_distance {})",
            accepted.len(),
            count,
            min_distance
        );
        break;
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn flat_pair() -> MeshData {
        // Two triangles in the z = 0 plane; the second has 100x the area.
        MeshData {
            name: "pair".into(),
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [10.0, 0.0, 0.0],
                [20.0, 0.0, 0.0],
                [10.0, 10.0, 0.0],
            ],
            normals: Vec::new(),
            tex_coords: Vec::new(),
            indices: vec![0, 1, 2, 3, 4, 5],
        }
    }

    #[test]
    fn samples_lie_on_the_source_plane() {
        let mesh = flat_pair();
        let mut rng = StdRng::seed_from_u64(7);
        for sample in sample_surface(&mesh, 500, &mut rng) {
            assert!(sample.position.z.abs() < 1e-6);
            assert!((sample.normal - Vector3::unit_z()).magnitude() < 1e-5);
        }
    }

    #[test]
    fn selection_is_area_weighted() {
        let mesh = flat_pair();
        let mut rng = StdRng::seed_from_u64(11);
        let samples = sample_surface(&mesh, 2000, &mut rng);
        let on_big = samples.iter().filter(|s| s.position.x >= 5.0).count();
        // The big triangle holds ~99% of the area.
        assert!(on_big > 1900, "only {} of 2000 on the large triangle", on_big);
    }

    #[test]
    fn deterministic_under_a_fixed_seed() {
        let mesh = flat_pair();
        let a = sample_surface(&mesh, 64, &mut StdRng::seed_from_u64(42));
        let b = sample_surface(&mesh, 64, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn empty_mesh_yields_no_samples() {
        let mesh = MeshData::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_surface(&mesh, 100, &mut rng).is_empty());
        assert!(sample_surface_min_dist(&mesh, 100, 0.1, 30, &mut rng).is_empty());
    }

    #[test]
    fn degenerate_triangles_are_never_selected() {
        // First triangle is a zero-area sliver.
        let mesh = MeshData {
            name: "sliver".into(),
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [0.0, 0.0, 5.0],
                [1.0, 0.0, 5.0],
                [0.0, 1.0, 5.0],
            ],
            normals: Vec::new(),
            tex_coords: Vec::new(),
            indices: vec![0, 1, 2, 3, 4, 5],
        };
        let mut rng = StdRng::seed_from_u64(5);
        for sample in sample_surface(&mesh, 200, &mut rng) {
            assert!((sample.position.z - 5.0).abs() < 1e-6);
        }
    }

    #[test]
    fn min_distance_holds_between_accepted_points() {
        let mesh = flat_pair();
        let mut rng = StdRng::seed_from_u64(3);
        let min_distance = 0.5;
        let samples = sample_surface_min_dist(&mesh, 200, min_distance, 30, &mut rng);
        assert!(!samples.is_empty());
        for (i, a) in samples.iter().enumerate() {
            for b in &samples[i + 1..] {
                assert!((a.position - b.position).magnitude() >= min_distance);
            }
        }
    }

    #[test]
    fn saturated_surface_terminates_short() {
        let mesh = flat_pair();
        let mut rng = StdRng::seed_from_u64(9);
        // Spacing far too large for the requested count.
        let samples = sample_surface_min_dist(&mesh, 10_000, 5.0, 10, &mut rng);
        assert!(samples.len() < 10_000);
    }
}
