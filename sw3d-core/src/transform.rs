/// 3D transformation matrices
use nalgebra::{Matrix3, Matrix4, Unit, Vector3};

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation of `degrees` about `axis` (right-handed, like `glRotatef`)
    pub fn rotation_deg(degrees: f32, axis: Vector3<f32>) -> Matrix4<f32> {
        match Unit::try_new(axis, f32::EPSILON) {
            Some(axis) => Matrix4::from_axis_angle(&axis, degrees.to_radians()),
            None => Matrix4::identity(),
        }
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Matrix carrying normals through `model` (inverse transpose of its linear part)
    pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix3<f32> {
        let linear = model.fixed_view::<3, 3>(0, 0).into_owned();
        linear
            .try_inverse()
            .map(|inverse| inverse.transpose())
            .unwrap_or(linear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_rotation_about_y() {
        let matrix = Transform::rotation_deg(90.0, Vector3::y());
        let p = matrix.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_zero_axis_is_identity() {
        let matrix = Transform::rotation_deg(45.0, Vector3::zeros());
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_translate_then_rotate_composes_like_gl() {
        // glTranslatef then glRotatef: rotation applies to the object first
        let model = Transform::translation_matrix(0.0, 0.0, -2.5)
            * Transform::rotation_deg(180.0, Vector3::y());
        let p = model.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(-1.0, 0.0, -2.5), epsilon = 1e-6);
    }

    #[test]
    fn test_normal_matrix_undoes_nonuniform_scale() {
        let model = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 1.0, 1.0));
        let n = Transform::normal_matrix(&model) * Vector3::new(1.0, 1.0, 0.0);
        assert_relative_eq!(n, Vector3::new(0.5, 1.0, 0.0), epsilon = 1e-6);
    }
}
