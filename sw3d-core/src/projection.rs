/// Camera frame and projection utilities
use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3};

/// Free-moving camera: a position with a forward and an up direction
///
/// Movement happens in the camera's own frame, so "forward" always means the
/// direction the camera is looking.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub forward: Unit<Vector3<f32>>,
    pub up: Unit<Vector3<f32>>,
    /// Vertical field of view in degrees
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            position: Point3::origin(),
            forward: -Vector3::z_axis(),
            up: Vector3::y_axis(),
            fov_deg: 35.0,
            aspect: 1.0,
            near: 1.0,
            far: 50.0,
        };
        camera.set_viewport(width, height);
        camera
    }

    /// Update the aspect ratio; an empty viewport keeps the previous one
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    /// Move along the viewing direction
    pub fn move_forward(&mut self, distance: f32) {
        self.position += self.forward.into_inner() * distance;
    }

    /// Turn about the camera's own up axis; positive angles turn left
    pub fn rotate_local_y(&mut self, radians: f32) {
        let rotation = Rotation3::from_axis_angle(&self.up, radians);
        self.forward = Unit::new_normalize(rotation * self.forward.into_inner());
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let target = self.position + self.forward.into_inner();
        Matrix4::look_at_rh(&self.position, &target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov_deg.to_radians(), self.near, self.far)
    }

    /// World space to clip space
    pub fn clip_from_world(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
