/// The demo scene: room, ground, furniture and cogs as retained meshes
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::animation::{advance, AnimationState};
use crate::config::{CogPlacement, RenderMode, SceneConfig};
use crate::error::GeometryError;
use crate::gear::GearParams;
use crate::geometry::Mesh;
use crate::projection::Camera;
use crate::shadow::{Light, ShadowMatrix};
use crate::transform::Transform;

/// Ground grid half-size and tile size
const GROUND_EXTENT: f32 = 20.0;
const GROUND_STEP: f32 = 1.0;
const GROUND_Y: f32 = -1.9;

const SOFA_SCALE: f32 = 0.1;
const CUBE_HALF_EXTENT: f32 = 0.06;
/// Centre the sofa and the orbiting cube turn around
const CENTREPIECE: [f32; 3] = [0.0, 0.0, -2.5];
const WANDER_DEPTH: f32 = -8.5;

/// Surface appearance, standing in for a bound texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Material {
    Ground,
    Wall,
    WallMural,
    Ceiling,
    Sofa,
    SofaSeat,
    SofaFoot,
    Cube,
    Iron,
}

impl Material {
    /// Linear RGB albedo
    pub fn base_color(&self) -> [f32; 3] {
        match self {
            Material::Ground => [0.45, 0.55, 0.35],
            Material::Wall => [0.8, 0.75, 0.65],
            Material::WallMural => [0.35, 0.55, 0.8],
            Material::Ceiling => [0.9, 0.9, 0.9],
            Material::Sofa => [0.7, 0.2, 0.2],
            Material::SofaSeat => [0.8, 0.35, 0.3],
            Material::SofaFoot => [0.35, 0.2, 0.1],
            Material::Cube => [0.9, 0.2, 0.15],
            Material::Iron => [0.6, 0.62, 0.66],
        }
    }
}

/// One mesh placed in the world
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub mesh: &'a Mesh,
    pub model: Matrix4<f32>,
    pub material: Material,
}

/// Meshes built once at startup and reused every frame
#[derive(Debug, Clone)]
struct SceneMeshes {
    ground: Mesh,
    room: Vec<(Mesh, Material)>,
    sofa: Vec<(Mesh, Material)>,
    cube: Mesh,
    /// One mesh per distinct set of gear dimensions
    gears: Vec<(GearParams, Mesh)>,
}

impl SceneMeshes {
    fn gear_index(&mut self, params: &GearParams) -> usize {
        if let Some(index) = self.gears.iter().position(|(p, _)| p == params) {
            return index;
        }
        self.gears.push((*params, params.build_mesh()));
        self.gears.len() - 1
    }
}

/// Room walls, each its own single-quad mesh so it can carry a material
fn room_meshes() -> Vec<(Mesh, Material)> {
    let room = Mesh::room(Point3::new(-4.5, -1.55, -15.0), Point3::new(4.5, 2.45, -6.0));
    room.quads
        .into_iter()
        .map(|quad| {
            let n = quad.normal();
            let material = if n.y < -0.5 {
                Material::Ceiling
            } else if n.z > 0.5 {
                Material::WallMural
            } else {
                Material::Wall
            };
            (std::iter::once(quad).collect(), material)
        })
        .collect()
}

/// Backrest, seat and two feet, in sofa-local coordinates
fn sofa_meshes(s: f32) -> Vec<(Mesh, Material)> {
    let p = Point3::new;
    // The whole sofa sits slightly below its pivot
    let drop = -0.1;
    let mut feet = Mesh::cuboid(
        p(-2.5 * s, -3.2 * s + drop, -s),
        p(-1.5 * s, -2.5 * s + drop, s),
    );
    feet.append(Mesh::cuboid(
        p(1.5 * s, -3.2 * s + drop, -s),
        p(2.5 * s, -2.5 * s + drop, s),
    ));

    vec![
        (
            Mesh::cuboid(p(-3.0 * s, -s + drop, -s), p(3.0 * s, s + drop, -0.5 * s)),
            Material::Sofa,
        ),
        (
            Mesh::cuboid(p(-3.0 * s, -2.5 * s + drop, -s), p(3.0 * s, -s + drop, s)),
            Material::SofaSeat,
        ),
        (feet, Material::SofaFoot),
    ]
}

/// A fixed cog with its mesh resolved
#[derive(Debug, Clone, Copy)]
struct PlacedCog {
    placement: CogPlacement,
    mesh: usize,
}

/// All state the render loop needs, owned by the caller and passed each frame
#[derive(Debug, Clone)]
pub struct SceneState {
    pub camera: Camera,
    pub animation: AnimationState,
    pub light: Light,
    pub shadow: ShadowMatrix,
    pub shadow_alpha: f32,
    pub render_mode: RenderMode,
    pub paused: bool,
    pub move_step: f32,
    pub turn_step: f32,
    meshes: SceneMeshes,
    cogs: Vec<PlacedCog>,
    wanderer_mesh: usize,
}

impl SceneState {
    /// Build meshes and the shadow matrix for `config`
    pub fn new(config: &SceneConfig, width: u32, height: u32) -> Result<Self, GeometryError> {
        let light = Light::from_homogeneous(&config.light);
        let shadow = config.shadow_matrix()?;

        let mut meshes = SceneMeshes {
            ground: Mesh::ground_grid(
                GROUND_EXTENT,
                GROUND_STEP,
                GROUND_Y,
                1.0 / (GROUND_EXTENT * 0.075),
            ),
            room: room_meshes(),
            sofa: sofa_meshes(SOFA_SCALE),
            cube: Mesh::cube(CUBE_HALF_EXTENT),
            gears: Vec::new(),
        };

        let cogs = config
            .cogs
            .iter()
            .map(|placement| PlacedCog {
                placement: *placement,
                mesh: meshes.gear_index(&placement.params),
            })
            .collect();
        let wanderer_mesh = meshes.gear_index(&config.wanderer);

        let mut camera = Camera::new(width, height);
        camera.fov_deg = config.fov_deg;
        camera.near = config.near;
        camera.far = config.far;

        tracing::info!(
            cogs = config.cogs.len(),
            gear_meshes = meshes.gears.len(),
            ground_tiles = meshes.ground.len(),
            "scene built"
        );

        Ok(Self {
            camera,
            animation: AnimationState::new(),
            light,
            shadow,
            shadow_alpha: config.shadow_alpha,
            render_mode: config.render_mode,
            paused: false,
            move_step: config.move_step,
            turn_step: config.turn_step,
            meshes,
            cogs,
            wanderer_mesh,
        })
    }

    /// Advance the animation unless paused
    pub fn tick(&mut self, dt: f32) {
        if !self.paused {
            self.animation = advance(self.animation, dt);
        }
    }

    pub fn light_position(&self) -> Vector4<f32> {
        self.light.homogeneous()
    }

    /// Ground and room: lit, never shadow casters
    pub fn static_items(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::with_capacity(1 + self.meshes.room.len());
        items.push(DrawItem {
            mesh: &self.meshes.ground,
            model: Matrix4::identity(),
            material: Material::Ground,
        });
        items.extend(self.meshes.room.iter().map(|(mesh, material)| DrawItem {
            mesh,
            model: Matrix4::identity(),
            material: *material,
        }));
        items
    }

    /// Moving props for the current animation state; drawn lit and as shadows
    pub fn inhabitants(&self) -> Vec<DrawItem<'_>> {
        let spin = self.animation.spin_deg;
        let [cx, cy, cz] = CENTREPIECE;
        let centre = Transform::translation_matrix(cx, cy, cz);
        let mut items = Vec::with_capacity(self.meshes.sofa.len() + self.cogs.len() + 2);

        items.push(DrawItem {
            mesh: &self.meshes.cube,
            model: centre
                * Transform::rotation_deg(-2.0 * spin, Vector3::y())
                * Transform::translation_matrix(1.0, 0.0, 0.0),
            material: Material::Cube,
        });

        let sofa_model = centre * Transform::rotation_deg(spin, Vector3::y());
        items.extend(self.meshes.sofa.iter().map(|(mesh, material)| DrawItem {
            mesh,
            model: sofa_model,
            material: *material,
        }));

        for cog in &self.cogs {
            let p = cog.placement.position;
            items.push(DrawItem {
                mesh: &self.meshes.gears[cog.mesh].1,
                model: Transform::translation_matrix(p.x, p.y, p.z)
                    * Transform::rotation_deg(cog.placement.spin_sign * spin, Vector3::z()),
                material: Material::Iron,
            });
        }

        let wanderer = self.animation.wanderer;
        items.push(DrawItem {
            mesh: &self.meshes.gears[self.wanderer_mesh].1,
            model: Transform::translation_matrix(wanderer.x, wanderer.y, WANDER_DEPTH)
                * Transform::rotation_deg(wanderer.spin_deg, Vector3::z()),
            material: Material::Iron,
        });

        items
    }

    /// Inhabitants flattened through the shadow matrix
    pub fn shadow_items(&self) -> Vec<DrawItem<'_>> {
        let shadow = *self.shadow.matrix();
        self.inhabitants()
            .into_iter()
            .map(|item| DrawItem {
                model: shadow * item.model,
                ..item
            })
            .collect()
    }

    pub fn move_forward(&mut self, direction: f32) {
        self.camera.move_forward(direction * self.move_step);
    }

    pub fn turn(&mut self, direction: f32) {
        self.camera.rotate_local_y(direction * self.turn_step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scene() -> SceneState {
        SceneState::new(&SceneConfig::default(), 80, 40).unwrap()
    }

    #[test]
    fn test_default_scene_contents() {
        let scene = scene();
        assert_eq!(scene.static_items().len(), 6);
        // cube, three sofa parts, two fixed cogs, the wanderer
        assert_eq!(scene.inhabitants().len(), 7);
        // The fixed cogs share one mesh; the wanderer has its own
        assert_eq!(scene.meshes.gears.len(), 2);
        assert_eq!(scene.meshes.gears[0].1.len(), 360);
    }

    #[test]
    fn test_room_materials() {
        let scene = scene();
        let materials: Vec<Material> = scene.meshes.room.iter().map(|(_, m)| *m).collect();
        assert_eq!(materials.iter().filter(|m| **m == Material::Ceiling).count(), 1);
        assert_eq!(materials.iter().filter(|m| **m == Material::WallMural).count(), 1);
        assert_eq!(materials.iter().filter(|m| **m == Material::Wall).count(), 3);
    }

    #[test]
    fn test_shadow_items_land_on_ground_plane() {
        let mut scene = scene();
        scene.tick(0.75);
        for item in scene.shadow_items() {
            for quad in item.mesh.quads.iter().take(8) {
                for v in &quad.vertices {
                    let h = item.model * v.position.to_homogeneous();
                    assert_relative_eq!(h.y / h.w, -0.4, epsilon = 1e-3);
                }
            }
        }
    }

    #[test]
    fn test_tick_respects_pause() {
        let mut scene = scene();
        scene.tick(0.5);
        let moved = scene.animation;
        assert_ne!(moved, AnimationState::new());

        scene.paused = true;
        scene.tick(0.5);
        assert_eq!(scene.animation, moved);
    }

    #[test]
    fn test_cube_orbits_centrepiece() {
        let scene = scene();
        let cube = scene.inhabitants()[0];
        let centre = cube.model.transform_point(&Point3::origin());
        assert_relative_eq!(centre, Point3::new(1.0, 0.0, -2.5), epsilon = 1e-5);
    }

    #[test]
    fn test_camera_steps_follow_config() {
        let mut scene = scene();
        scene.move_forward(1.0);
        assert_relative_eq!(scene.camera.position.z, -0.1, epsilon = 1e-6);
        scene.turn(-1.0);
        assert!(scene.camera.forward.x > 0.0);
    }
}
