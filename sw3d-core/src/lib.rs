/// SW3D Core Library - Shared geometry and transformation logic
///
/// This library provides the stateless core of the scene demo: the cog-gear
/// mesh generator, plane equations and planar shadow matrices, plus the mesh,
/// camera, animation and scene types the render loop consumes.

pub mod animation;
pub mod config;
pub mod error;
pub mod gear;
pub mod geometry;
pub mod plane;
pub mod projection;
pub mod scene;
pub mod shadow;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use animation::{advance, AnimationState};
pub use config::{RenderMode, SceneConfig};
pub use error::{ConfigError, GeometryError};
pub use gear::{generate_gear_mesh, GearFaces, GearParams};
pub use geometry::{Mesh, Quad, Triangle, Vertex};
pub use plane::Plane;
pub use projection::Camera;
pub use scene::{DrawItem, Material, SceneState};
pub use shadow::{compute_shadow_matrix, Light, ShadowMatrix};
pub use transform::Transform;
