/// Plane equations for shadow receivers
use nalgebra::{Point3, Vector3, Vector4};

use crate::error::GeometryError;

/// Relative tolerance used to reject collinear plane points
pub const PLANE_EPSILON: f32 = 1e-6;

/// Plane `a*x + b*y + c*z + d = 0` with a unit-length normal `(a, b, c)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl Plane {
    /// Plane through three points, facing along `(p1 - p0) x (p2 - p0)`
    pub fn from_points(
        p0: &Point3<f32>,
        p1: &Point3<f32>,
        p2: &Point3<f32>,
    ) -> Result<Self, GeometryError> {
        let edge1 = p1 - p0;
        let edge2 = p2 - p0;
        let normal = edge1.cross(&edge2);
        let len = normal.norm();

        if !len.is_finite() || len <= PLANE_EPSILON * edge1.norm() * edge2.norm() {
            return Err(GeometryError::DegeneratePlane);
        }

        let normal = normal / len;
        Ok(Self::from_normal(&normal, p0))
    }

    /// Plane with the given unit normal passing through `point`
    pub fn from_normal(normal: &Vector3<f32>, point: &Point3<f32>) -> Self {
        Self {
            a: normal.x,
            b: normal.y,
            c: normal.z,
            d: -normal.dot(&point.coords),
        }
    }

    pub fn normal(&self) -> Vector3<f32> {
        Vector3::new(self.a, self.b, self.c)
    }

    /// Coefficients as a homogeneous row vector `(a, b, c, d)`
    pub fn coefficients(&self) -> Vector4<f32> {
        Vector4::new(self.a, self.b, self.c, self.d)
    }

    pub fn signed_distance(&self, point: &Point3<f32>) -> f32 {
        self.normal().dot(&point.coords) + self.d
    }

    pub fn contains(&self, point: &Point3<f32>, epsilon: f32) -> bool {
        self.signed_distance(point).abs() <= epsilon
    }
}
