//! Injected wake-interaction velocity fields.
//!
//! A wake field maps a point on the rotor disk (lateral `y`, vertical `z`, meters) to
//! normalized induced velocities `(ua, uv, uw)`, scaled by the axial free stream when
//! applied. Points the field cannot resolve return `None` and contribute nothing.

use crate::error::{BemtError, BemtResult};
use nalgebra::Vector3;
use std::collections::BTreeMap;

/// Source of normalized induced velocities on the rotor disk.
pub trait WakeField: Send + Sync {
    /// Induced velocity `(ua, uv, uw)` at disk coordinate `(y, z)`.
    fn induced_velocity(&self, y: f64, z: f64) -> Option<Vector3<f64>>;
}

impl<F> WakeField for F
where
    F: Fn(f64, f64) -> Option<Vector3<f64>> + Send + Sync,
{
    fn induced_velocity(&self, y: f64, z: f64) -> Option<Vector3<f64>> {
        self(y, z)
    }
}

/// Barycentric tolerance for points on a triangle edge.
const EDGE_TOL: f64 = 1e-12;

#[derive(Clone, Debug)]
struct Triangle {
    v: [usize; 3],
    center: [f64; 2],
    radius2: f64,
}

impl Triangle {
    fn new(v: [usize; 3], pts: &[[f64; 2]]) -> Option<Self> {
        let [a, b, c] = v.map(|i| pts[i]);
        let d = 2.0 * (a[0] * (b[1] - c[1]) + b[0] * (c[1] - a[1]) + c[0] * (a[1] - b[1]));
        if d == 0.0 || !d.is_finite() {
            return None;
        }
        let a2 = a[0] * a[0] + a[1] * a[1];
        let b2 = b[0] * b[0] + b[1] * b[1];
        let c2 = c[0] * c[0] + c[1] * c[1];
        let ux = (a2 * (b[1] - c[1]) + b2 * (c[1] - a[1]) + c2 * (a[1] - b[1])) / d;
        let uy = (a2 * (c[0] - b[0]) + b2 * (a[0] - c[0]) + c2 * (b[0] - a[0])) / d;
        let radius2 = (a[0] - ux).powi(2) + (a[1] - uy).powi(2);
        Some(Self {
            v,
            center: [ux, uy],
            radius2,
        })
    }

    fn circumcircle_contains(&self, p: [f64; 2]) -> bool {
        let dx = p[0] - self.center[0];
        let dy = p[1] - self.center[1];
        dx * dx + dy * dy < self.radius2
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.v;
        [edge(a, b), edge(b, c), edge(c, a)]
    }
}

fn edge(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Piecewise-linear wake field over a Delaunay triangulation of scattered samples.
///
/// Samples with identical coordinates keep the first value. Queries outside the convex
/// hull of the samples return `None`.
#[derive(Clone, Debug)]
pub struct ScatteredWake {
    points: Vec<[f64; 2]>,
    values: Vec<Vector3<f64>>,
    triangles: Vec<[usize; 3]>,
}

impl ScatteredWake {
    /// Triangulate `points` (y, z) carrying `values` (ua, uv, uw).
    ///
    /// # Errors
    /// Returns `BemtError::Wake` on length mismatch, non-finite samples, or samples that
    /// span no area.
    pub fn new(points: Vec<[f64; 2]>, values: Vec<Vector3<f64>>) -> BemtResult<Self> {
        if points.len() != values.len() {
            return Err(BemtError::Wake {
                what: format!("{} sample points but {} values", points.len(), values.len()),
            });
        }
        if points.iter().flatten().chain(values.iter().flat_map(|v| v.iter())).any(|x| !x.is_finite()) {
            return Err(BemtError::Wake {
                what: "wake samples must be finite".to_string(),
            });
        }

        let mut unique: BTreeMap<(u64, u64), usize> = BTreeMap::new();
        let mut kept_points = Vec::with_capacity(points.len());
        let mut kept_values = Vec::with_capacity(values.len());
        for (p, v) in points.into_iter().zip(values) {
            // +0.0 and -0.0 are the same location
            let key = ((p[0] + 0.0).to_bits(), (p[1] + 0.0).to_bits());
            if let std::collections::btree_map::Entry::Vacant(e) = unique.entry(key) {
                e.insert(kept_points.len());
                kept_points.push(p);
                kept_values.push(v);
            }
        }

        let triangles = triangulate(&kept_points);
        if triangles.is_empty() {
            return Err(BemtError::Wake {
                what: "wake samples span no area".to_string(),
            });
        }

        Ok(Self {
            points: kept_points,
            values: kept_values,
            triangles,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.points.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn interpolate(&self, y: f64, z: f64) -> Option<Vector3<f64>> {
        self.triangles.iter().find_map(|&[i, j, k]| {
            let (a, b, c) = (self.points[i], self.points[j], self.points[k]);
            let det = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
            let l1 = ((b[1] - c[1]) * (y - c[0]) + (c[0] - b[0]) * (z - c[1])) / det;
            let l2 = ((c[1] - a[1]) * (y - c[0]) + (a[0] - c[0]) * (z - c[1])) / det;
            let l3 = 1.0 - l1 - l2;
            (l1 >= -EDGE_TOL && l2 >= -EDGE_TOL && l3 >= -EDGE_TOL)
                .then(|| self.values[i] * l1 + self.values[j] * l2 + self.values[k] * l3)
        })
    }
}

impl WakeField for ScatteredWake {
    fn induced_velocity(&self, y: f64, z: f64) -> Option<Vector3<f64>> {
        if !(y.is_finite() && z.is_finite()) {
            return None;
        }
        self.interpolate(y, z)
    }
}

/// Bowyer-Watson triangulation. Returns triangles over indices into `pts`.
fn triangulate(pts: &[[f64; 2]]) -> Vec<[usize; 3]> {
    if pts.len() < 3 {
        return Vec::new();
    }

    let (mut min, mut max) = ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]);
    for p in pts {
        for d in 0..2 {
            min[d] = min[d].min(p[d]);
            max[d] = max[d].max(p[d]);
        }
    }
    let span = (max[0] - min[0]).max(max[1] - min[1]).max(f64::MIN_POSITIVE);
    let mid = [0.5 * (min[0] + max[0]), 0.5 * (min[1] + max[1])];

    let n = pts.len();
    let mut all = pts.to_vec();
    all.push([mid[0] - 20.0 * span, mid[1] - span]);
    all.push([mid[0], mid[1] + 20.0 * span]);
    all.push([mid[0] + 20.0 * span, mid[1] - span]);

    let mut triangles: Vec<Triangle> = Triangle::new([n, n + 1, n + 2], &all).into_iter().collect();

    for (idx, &p) in pts.iter().enumerate() {
        let (bad, good): (Vec<Triangle>, Vec<Triangle>) =
            triangles.into_iter().partition(|t| t.circumcircle_contains(p));

        let mut edge_count: BTreeMap<(usize, usize), u32> = BTreeMap::new();
        for t in &bad {
            for e in t.edges() {
                *edge_count.entry(e).or_insert(0) += 1;
            }
        }

        triangles = good;
        for ((a, b), _) in edge_count.into_iter().filter(|&(_, count)| count == 1) {
            if let Some(t) = Triangle::new([a, b, idx], &all) {
                triangles.push(t);
            }
        }
    }

    triangles
        .into_iter()
        .filter(|t| t.v.iter().all(|&i| i < n))
        .map(|t| t.v)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(f: impl Fn(f64, f64) -> Vector3<f64>) -> ScatteredWake {
        let mut points = Vec::new();
        let mut values = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                let (y, z) = (-1.0 + 0.5 * i as f64, -1.0 + 0.5 * j as f64);
                points.push([y, z]);
                values.push(f(y, z));
            }
        }
        ScatteredWake::new(points, values).unwrap()
    }

    #[test]
    fn reproduces_linear_field() {
        let wake = grid(|y, z| Vector3::new(0.1 + 0.2 * y - 0.3 * z, y, -z));
        for &(y, z) in &[(0.0, 0.0), (0.3, -0.7), (-0.95, 0.95), (1.0, 1.0)] {
            let v = wake.induced_velocity(y, z).unwrap();
            let expected = Vector3::new(0.1 + 0.2 * y - 0.3 * z, y, -z);
            assert!((v - expected).norm() < 1e-10, "({y}, {z}): {v:?}");
        }
    }

    #[test]
    fn outside_hull_is_none() {
        let wake = grid(|_, _| Vector3::new(1.0, 0.0, 0.0));
        assert!(wake.induced_velocity(1.5, 0.0).is_none());
        assert!(wake.induced_velocity(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn triangulation_covers_square() {
        let wake = grid(|_, _| Vector3::zeros());
        assert_eq!(wake.sample_count(), 25);
        for i in 0..=20 {
            for j in 0..=20 {
                let (y, z) = (-1.0 + 0.1 * i as f64, -1.0 + 0.1 * j as f64);
                assert!(wake.induced_velocity(y, z).is_some(), "hole at ({y}, {z})");
            }
        }
    }

    #[test]
    fn duplicate_samples_collapse() {
        let points = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [-0.0, 0.0]];
        let values = vec![Vector3::new(1.0, 0.0, 0.0); 4];
        let wake = ScatteredWake::new(points, values).unwrap();
        assert_eq!(wake.sample_count(), 3);
        assert_eq!(wake.triangle_count(), 1);
    }

    #[test]
    fn rejects_degenerate_input() {
        let collinear = vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        assert!(ScatteredWake::new(collinear, vec![Vector3::zeros(); 3]).is_err());
        assert!(ScatteredWake::new(vec![[0.0, 0.0]], vec![]).is_err());
    }

    #[test]
    fn closures_are_wake_fields() {
        let field = |y: f64, _z: f64| (y > 0.0).then(|| Vector3::new(0.5, 0.0, 0.0));
        assert!(field.induced_velocity(1.0, 0.0).is_some());
        assert!(field.induced_velocity(-1.0, 0.0).is_none());
    }
}
