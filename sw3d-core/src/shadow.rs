/// Planar projected shadows
///
/// The shadow matrix flattens geometry onto a receiver plane along the rays
/// leaving a light. Rendering the casters a second time through it, darkened
/// and with depth testing off, draws their shadow on the plane.
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::error::GeometryError;
use crate::plane::Plane;

/// Below this `|plane . light|` the light is treated as lying on the plane
pub const LIGHT_ON_PLANE_EPSILON: f32 = 1e-6;

/// Light source casting the shadow
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Positional light, `w = 1`
    Point(Point3<f32>),
    /// Light at infinity shining along the given direction, `w = 0`
    Directional(Vector3<f32>),
}

impl Light {
    /// Build from a homogeneous position; `w == 0` means directional
    pub fn from_homogeneous(position: &Vector4<f32>) -> Self {
        if position.w == 0.0 {
            // A directional light "at" (x, y, z, 0) shines away from that direction
            Light::Directional(-position.xyz())
        } else {
            Light::Point(Point3::from(position.xyz() / position.w))
        }
    }

    pub fn homogeneous(&self) -> Vector4<f32> {
        match self {
            Light::Point(p) => Vector4::new(p.x, p.y, p.z, 1.0),
            Light::Directional(dir) => Vector4::new(-dir.x, -dir.y, -dir.z, 0.0),
        }
    }
}

/// Projective transform flattening geometry onto a plane as seen from a light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMatrix {
    matrix: Matrix4<f32>,
}

impl ShadowMatrix {
    /// `M = (P . L) I - L P^T`
    pub fn new(plane: &Plane, light: &Light) -> Result<Self, GeometryError> {
        let p = plane.coefficients();
        let l = light.homogeneous();
        let dot = p.dot(&l);

        let scale = p.xyz().norm() * l.norm();
        if dot.abs() <= LIGHT_ON_PLANE_EPSILON * scale {
            return Err(GeometryError::LightOnPlane);
        }

        let matrix = Matrix4::identity() * dot - l * p.transpose();
        tracing::debug!(?plane, ?light, dot, "computed shadow matrix");
        Ok(Self { matrix })
    }

    /// Ground plane from three points, then the matrix for `light`
    pub fn from_points(
        points: &[Point3<f32>; 3],
        light: &Light,
    ) -> Result<Self, GeometryError> {
        let plane = Plane::from_points(&points[0], &points[1], &points[2])?;
        Self::new(&plane, light)
    }

    pub fn matrix(&self) -> &Matrix4<f32> {
        &self.matrix
    }

    /// Column-major element order, as fixed-function pipelines expect
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.matrix.as_slice());
        out
    }

    /// Project a point onto the plane, with the homogeneous divide applied
    ///
    /// Returns `None` for points on the light's own plane parallel to the
    /// receiver, whose shadow lies at infinity.
    pub fn project_point(&self, point: &Point3<f32>) -> Option<Point3<f32>> {
        let h = self.matrix * point.to_homogeneous();
        if h.w.abs() <= f32::EPSILON {
            return None;
        }
        Some(Point3::from(h.xyz() / h.w))
    }
}

/// Shadow matrix for the plane through `ground` and a homogeneous light
/// position (`w = 1` point light, `w = 0` directional light)
pub fn compute_shadow_matrix(
    ground: [Point3<f32>; 3],
    light_position: Vector4<f32>,
) -> Result<Matrix4<f32>, GeometryError> {
    let light = Light::from_homogeneous(&light_position);
    ShadowMatrix::from_points(&ground, &light).map(|shadow| shadow.matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ground() -> [Point3<f32>; 3] {
        [
            Point3::new(0.0, -0.4, 0.0),
            Point3::new(10.0, -0.4, 0.0),
            Point3::new(5.0, -0.4, -5.0),
        ]
    }

    fn scene_shadow() -> ShadowMatrix {
        ShadowMatrix::from_points(&ground(), &Light::Point(Point3::new(-100.0, 100.0, 50.0)))
            .unwrap()
    }

    /// `a` and `b` describe the same projective point
    fn assert_homogeneous_eq(a: &Vector4<f32>, b: &Vector4<f32>) {
        let (na, nb) = (a.norm(), b.norm());
        assert!(na > 0.0 && nb > 0.0);
        let (ua, ub) = (a / na, b / nb);
        let same = (ua - ub).norm() < 1e-4 || (ua + ub).norm() < 1e-4;
        assert!(same, "{a:?} is not a multiple of {b:?}");
    }

    #[test]
    fn test_scene_point_lands_on_ground() {
        let shadow = scene_shadow();
        let projected = shadow.project_point(&Point3::new(5.0, 0.0, -2.0)).unwrap();
        assert_relative_eq!(projected.y, -0.4, epsilon = 1e-4);

        // The shadow lies on the light ray through the point
        let light = Point3::new(-100.0, 100.0, 50.0);
        let towards_point = (Point3::new(5.0, 0.0, -2.0) - light).normalize();
        let towards_shadow = (projected - light).normalize();
        assert_relative_eq!(towards_point, towards_shadow, epsilon = 1e-4);
    }

    #[test]
    fn test_points_on_plane_are_fixed() {
        let shadow = scene_shadow();
        for p in [
            Point3::new(0.0, -0.4, 0.0),
            Point3::new(3.5, -0.4, -7.25),
            Point3::new(-12.0, -0.4, 4.0),
        ] {
            let projected = shadow.project_point(&p).unwrap();
            assert_relative_eq!(projected, p, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_projection_is_idempotent() {
        let m = *scene_shadow().matrix();
        for p in [
            Vector4::new(5.0, 0.0, -2.0, 1.0),
            Vector4::new(-1.0, 3.0, 2.0, 1.0),
            Vector4::new(0.5, 0.25, -9.0, 1.0),
        ] {
            let once = m * p;
            let twice = m * once;
            assert_homogeneous_eq(&once, &twice);
        }
    }

    #[test]
    fn test_matrix_matches_element_table() {
        let plane = Plane::from_points(&ground()[0], &ground()[1], &ground()[2]).unwrap();
        let l = Vector4::new(-100.0, 100.0, 50.0, 1.0);
        let m = compute_shadow_matrix(ground(), l).unwrap();
        let (a, b, c, d) = (plane.a, plane.b, plane.c, plane.d);
        let dot = a * l.x + b * l.y + c * l.z + d * l.w;

        // cols[column * 4 + row]
        let cols = ShadowMatrix::new(&plane, &Light::Point(Point3::new(-100.0, 100.0, 50.0)))
            .unwrap()
            .to_cols_array();
        assert_relative_eq!(cols[0], dot - l.x * a, epsilon = 1e-3);
        assert_relative_eq!(cols[4], -l.x * b, epsilon = 1e-3);
        assert_relative_eq!(cols[12], -l.x * d, epsilon = 1e-3);
        assert_relative_eq!(cols[5], dot - l.y * b, epsilon = 1e-3);
        assert_relative_eq!(cols[13], -l.y * d, epsilon = 1e-3);
        assert_relative_eq!(cols[3], -l.w * a, epsilon = 1e-3);
        assert_relative_eq!(cols[15], dot - l.w * d, epsilon = 1e-3);
        assert_relative_eq!(m[(1, 3)], -l.y * d, epsilon = 1e-3);
        assert_relative_eq!(m[(3, 3)], dot - l.w * d, epsilon = 1e-3);
    }

    #[test]
    fn test_directional_light_projects_along_direction() {
        let light = Light::Directional(Vector3::new(0.0, -1.0, 0.0));
        let shadow = ShadowMatrix::from_points(&ground(), &light).unwrap();
        let projected = shadow.project_point(&Point3::new(2.0, 5.0, -3.0)).unwrap();
        assert_relative_eq!(projected, Point3::new(2.0, -0.4, -3.0), epsilon = 1e-4);
    }

    #[test]
    fn test_homogeneous_light_round_trip() {
        let position = Vector4::new(-100.0, 100.0, 50.0, 1.0);
        assert_eq!(
            Light::from_homogeneous(&position),
            Light::Point(Point3::new(-100.0, 100.0, 50.0))
        );
        let at_infinity = Vector4::new(0.0, 1.0, 0.0, 0.0);
        assert_eq!(Light::from_homogeneous(&at_infinity).homogeneous(), at_infinity);
    }

    #[test]
    fn test_light_on_plane_rejected() {
        let on_plane = Light::Point(Point3::new(3.0, -0.4, 1.0));
        assert_eq!(
            ShadowMatrix::from_points(&ground(), &on_plane),
            Err(GeometryError::LightOnPlane)
        );
        let grazing = Light::Directional(Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(
            ShadowMatrix::from_points(&ground(), &grazing),
            Err(GeometryError::LightOnPlane)
        );
    }

    #[test]
    fn test_degenerate_ground_propagates() {
        let line = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let result = compute_shadow_matrix(line, Vector4::new(0.0, 10.0, 0.0, 1.0));
        assert_eq!(result, Err(GeometryError::DegeneratePlane));
    }
}
