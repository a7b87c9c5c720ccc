/// Procedural cog-gear meshes
///
/// A gear is a solid of revolution: a six-point cross-section (three radii at
/// the front and back rims) swept around the Z axis. The sweep is divided into
/// `4 * tooth_count` equal steps. Even steps carry profile slices and odd steps
/// are the mid-angles of the faces between them, so each tooth spans steps
/// `4k..4k+2` and the gap behind it spans `4k+2..4k+4`.
use std::f32::consts::TAU;

use nalgebra::{Point2, Point3, Vector3};

use crate::error::GeometryError;
use crate::geometry::{Mesh, Quad};

/// Quads emitted per tooth: six for the tooth pass, six for the gap pass
pub const FACES_PER_TOOTH: usize = 12;

/// Dimensions of a cog gear
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearParams {
    /// Radius of the shaft hole
    pub inner_radius: f32,
    /// Radius at the root of the teeth
    pub mid_radius: f32,
    /// Radius at the tips of the teeth
    pub outer_radius: f32,
    /// Thickness along the rotation axis
    pub width: f32,
    pub tooth_count: u32,
}

impl GearParams {
    /// Validate and build gear dimensions
    ///
    /// A single tooth is accepted but spans a half-turn: its hub faces
    /// collapse onto chords through the axis, so the solid is closed without
    /// being a 2-manifold.
    pub fn new(
        inner_radius: f32,
        mid_radius: f32,
        outer_radius: f32,
        width: f32,
        tooth_count: u32,
    ) -> Result<Self, GeometryError> {
        if tooth_count < 1 {
            return Err(GeometryError::gear("tooth count must be at least 1"));
        }
        for (name, value) in [
            ("inner radius", inner_radius),
            ("mid radius", mid_radius),
            ("outer radius", outer_radius),
            ("width", width),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GeometryError::gear(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if !(inner_radius < mid_radius && mid_radius < outer_radius) {
            return Err(GeometryError::gear(format!(
                "radii must satisfy inner < mid < outer, got {inner_radius} / {mid_radius} / {outer_radius}"
            )));
        }

        Ok(Self {
            inner_radius,
            mid_radius,
            outer_radius,
            width,
            tooth_count,
        })
    }

    /// Number of sweep steps around the full circle
    pub fn step_count(&self) -> usize {
        4 * self.tooth_count as usize
    }

    pub fn face_count(&self) -> usize {
        FACES_PER_TOOTH * self.tooth_count as usize
    }

    /// Lazy face sequence; restartable by cloning or calling again
    pub fn faces(&self) -> GearFaces {
        GearFaces {
            params: *self,
            next: 0,
            tooth: None,
        }
    }

    /// Collect the faces into a retained mesh
    pub fn build_mesh(&self) -> Mesh {
        let mesh: Mesh = self.faces().collect();
        tracing::debug!(
            teeth = self.tooth_count,
            faces = mesh.len(),
            "built gear mesh"
        );
        mesh
    }

    /// Sweep angle of step `index`; the last step wraps onto the first exactly
    fn angle(&self, index: usize) -> f32 {
        let steps = self.step_count();
        (index % steps) as f32 * TAU / steps as f32
    }

    /// Cross-section profile at sweep step `index`
    ///
    /// Order: inner, mid, outer on the front rim (z = -w/2), then outer, mid,
    /// inner on the back rim (z = +w/2).
    fn slice(&self, index: usize) -> [Point3<f32>; 6] {
        let (s, c) = self.angle(index).sin_cos();
        let h = 0.5 * self.width;
        let ring = |r: f32, z: f32| Point3::new(r * c, r * s, z);
        [
            ring(self.inner_radius, -h),
            ring(self.mid_radius, -h),
            ring(self.outer_radius, -h),
            ring(self.outer_radius, h),
            ring(self.mid_radius, h),
            ring(self.inner_radius, h),
        ]
    }

    /// The twelve quads of tooth `k`, tooth pass first
    fn tooth_faces(&self, k: usize) -> [Quad; FACES_PER_TOOTH] {
        let step = 4 * k;
        let a = self.slice(step);
        let b = self.slice(step + 2);
        let c = self.slice(step + 4);

        let (tooth_sin, tooth_cos) = self.angle(step + 1).sin_cos();
        let (gap_sin, gap_cos) = self.angle(step + 3).sin_cos();
        let (b_sin, b_cos) = self.angle(step + 2).sin_cos();
        let (c_sin, c_cos) = self.angle(step + 4).sin_cos();

        let front = -Vector3::z();
        let back = Vector3::z();
        let uv = |u: f32, v: f32| Some(Point2::new(u, v));

        [
            // Tooth pass: hub and crown on both rims, shaft and tip
            Quad::flat([b[0], b[1], a[1], a[0]], front, None),
            Quad::flat([b[1], b[2], a[2], a[1]], front, None),
            Quad::flat([a[5], a[4], b[4], b[5]], back, None),
            Quad::flat([a[4], a[3], b[3], b[4]], back, None),
            Quad::flat(
                [a[0], a[5], b[5], b[0]],
                Vector3::new(-tooth_cos, -tooth_sin, 0.0),
                None,
            ),
            Quad::flat(
                [a[2], b[2], b[3], a[3]],
                Vector3::new(tooth_cos, tooth_sin, 0.0),
                None,
            ),
            // Gap pass: gap body, then the flanks walling it in
            Quad::flat([c[0], c[1], b[1], b[0]], front, uv(0.0, 1.0)),
            Quad::flat([b[5], b[4], c[4], c[5]], back, uv(1.0, 0.0)),
            Quad::flat(
                [b[0], b[5], c[5], c[0]],
                Vector3::new(-gap_cos, -gap_sin, 0.0),
                uv(1.0, 1.0),
            ),
            Quad::flat(
                [b[1], c[1], c[4], b[4]],
                Vector3::new(gap_cos, gap_sin, 0.0),
                uv(0.0, 0.0),
            ),
            Quad::flat(
                [b[4], b[3], b[2], b[1]],
                Vector3::new(-b_sin, b_cos, 0.0),
                None,
            ),
            Quad::flat(
                [c[1], c[2], c[3], c[4]],
                Vector3::new(c_sin, -c_cos, 0.0),
                None,
            ),
        ]
    }
}

/// Lazy, finite sequence of gear faces
#[derive(Debug, Clone)]
pub struct GearFaces {
    params: GearParams,
    next: usize,
    tooth: Option<(usize, [Quad; FACES_PER_TOOTH])>,
}

impl Iterator for GearFaces {
    type Item = Quad;

    fn next(&mut self) -> Option<Quad> {
        if self.next >= self.params.face_count() {
            return None;
        }
        let k = self.next / FACES_PER_TOOTH;
        if !matches!(&self.tooth, Some((cached, _)) if *cached == k) {
            self.tooth = Some((k, self.params.tooth_faces(k)));
        }
        let quad = self.tooth.as_ref()?.1[self.next % FACES_PER_TOOTH];
        self.next += 1;
        Some(quad)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.params.face_count() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GearFaces {}

/// Generate the faces of a cog gear
///
/// Fails with [`GeometryError::InvalidGearParameters`] when the tooth count is
/// zero, a dimension is not positive, or the radii are out of order.
pub fn generate_gear_mesh(
    inner_radius: f32,
    mid_radius: f32,
    outer_radius: f32,
    width: f32,
    tooth_count: u32,
) -> Result<GearFaces, GeometryError> {
    GearParams::new(inner_radius, mid_radius, outer_radius, width, tooth_count)
        .map(|params| params.faces())
}
