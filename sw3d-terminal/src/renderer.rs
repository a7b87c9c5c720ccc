/// ASCII rasterizer for terminal rendering
///
/// A tiny software pipeline in the spirit of a fixed-function rasterizer:
/// colour, depth and stencil buffers per terminal cell, near-plane clipping,
/// back-face culling, Gouraud lighting from one light and alpha blending.
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};
use std::io::Write;
use sw3d_core::{Material, Mesh, Transform, Triangle};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Light reaching surfaces facing away from the light
pub const AMBIENT: f32 = 0.25;

/// Colour the framebuffer is cleared to
const CLEAR_COLOR: [f32; 3] = [0.0, 0.0, 0.0];

/// How fragments are coloured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Diffuse lighting of `albedo` from a homogeneous light position
    Lit { albedo: [f32; 3], light: Vector4<f32> },
    /// Constant colour, no lighting
    Flat([f32; 3]),
}

impl Shading {
    pub fn lit(material: Material, light: Vector4<f32>) -> Self {
        Shading::Lit {
            albedo: material.base_color(),
            light,
        }
    }
}

/// Per-draw pipeline switches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterState {
    pub depth_test: bool,
    pub cull_back_faces: bool,
    /// Blend over the framebuffer with this source alpha
    pub blend_alpha: Option<f32>,
    /// Only touch cells whose stencil is zero, incrementing it on every write
    pub stencil_dedup: bool,
    pub wireframe: bool,
}

impl RasterState {
    /// Opaque, depth-tested, back faces culled
    pub fn opaque(wireframe: bool) -> Self {
        Self {
            depth_test: true,
            cull_back_faces: true,
            blend_alpha: None,
            stencil_dedup: false,
            wireframe,
        }
    }

    /// Translucent flattened geometry: no depth test, each cell blended at most once
    pub fn shadow(alpha: f32, wireframe: bool) -> Self {
        Self {
            depth_test: false,
            cull_back_faces: false,
            blend_alpha: Some(alpha),
            stencil_dedup: true,
            wireframe,
        }
    }
}

/// A vertex after the vertex stage: clip position plus shaded colour
#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    clip: Vector4<f32>,
    color: [f32; 3],
}

impl ClipVertex {
    fn lerp(&self, other: &ClipVertex, t: f32) -> ClipVertex {
        ClipVertex {
            clip: self.clip.lerp(&other.clip, t),
            color: lerp3(self.color, other.color, t),
        }
    }

    /// Signed distance to the near plane in clip space (`z = -w`)
    fn near_distance(&self) -> f32 {
        self.clip.z + self.clip.w
    }
}

/// A vertex in screen space
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
    color: [f32; 3],
}

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    color_buffer: Vec<[f32; 3]>,
    stencil_buffer: Vec<u8>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            color_buffer: vec![CLEAR_COLOR; size],
            stencil_buffer: vec![0; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    /// Clear colour, depth and stencil
    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.color_buffer.fill(CLEAR_COLOR);
        self.stencil_buffer.fill(0);
    }

    pub fn color_at(&self, x: usize, y: usize) -> [f32; 3] {
        self.color_buffer[y * self.width + x]
    }

    pub fn stencil_at(&self, x: usize, y: usize) -> u8 {
        self.stencil_buffer[y * self.width + x]
    }

    /// Character the cell will be drawn with
    pub fn char_at(&self, x: usize, y: usize) -> char {
        ramp_char(self.color_at(x, y))
    }

    /// Run a mesh through the pipeline
    pub fn draw_mesh(
        &mut self,
        mesh: &Mesh,
        model: &Matrix4<f32>,
        clip_from_world: &Matrix4<f32>,
        shading: &Shading,
        state: &RasterState,
    ) {
        let clip_from_model = clip_from_world * model;
        let normal_matrix = Transform::normal_matrix(model);

        if state.wireframe {
            for quad in &mesh.quads {
                let corners = quad
                    .vertices
                    .map(|v| self.vertex_stage(&v.position, &v.normal, model, &clip_from_model, &normal_matrix, shading));
                for i in 0..4 {
                    self.draw_line(&corners[i], &corners[(i + 1) % 4], state);
                }
            }
            return;
        }

        for triangle in mesh.triangles() {
            self.render_triangle(&triangle, model, &clip_from_model, &normal_matrix, shading, state);
        }
    }

    fn vertex_stage(
        &self,
        position: &Point3<f32>,
        normal: &Vector3<f32>,
        model: &Matrix4<f32>,
        clip_from_model: &Matrix4<f32>,
        normal_matrix: &Matrix3<f32>,
        shading: &Shading,
    ) -> ClipVertex {
        let local = position.to_homogeneous();
        let color = match shading {
            Shading::Flat(color) => *color,
            Shading::Lit { albedo, light } => {
                let world = model * local;
                let world = world.xyz() / world.w;
                let n = (normal_matrix * normal).normalize();
                let to_light = if light.w == 0.0 {
                    light.xyz()
                } else {
                    light.xyz() / light.w - world
                };
                let diffuse = n.dot(&to_light.normalize()).max(0.0);
                let intensity = (AMBIENT + diffuse).min(1.0);
                albedo.map(|c| c * intensity)
            }
        };
        ClipVertex {
            clip: clip_from_model * local,
            color,
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model: &Matrix4<f32>,
        clip_from_model: &Matrix4<f32>,
        normal_matrix: &Matrix3<f32>,
        shading: &Shading,
        state: &RasterState,
    ) {
        let vertices = triangle
            .vertices
            .map(|v| self.vertex_stage(&v.position, &v.normal, model, clip_from_model, normal_matrix, shading));

        let polygon = clip_near(&vertices);
        if polygon.len() < 3 {
            return; // Triangle is clipped
        }

        let screen: Vec<ScreenVertex> = polygon.iter().map(|v| self.to_screen(v)).collect();
        for i in 1..screen.len() - 1 {
            let tri = [screen[0], screen[i], screen[i + 1]];
            if state.cull_back_faces && !is_front_facing(&tri) {
                continue;
            }
            self.rasterize_triangle(&tri, state);
        }
    }

    fn to_screen(&self, v: &ClipVertex) -> ScreenVertex {
        let w = v.clip.w;
        ScreenVertex {
            x: (v.clip.x / w + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - v.clip.y / w) * 0.5 * self.height as f32,
            depth: v.clip.z / w,
            color: v.color,
        }
    }

    fn rasterize_triangle(&mut self, tri: &[ScreenVertex; 3], state: &RasterState) {
        let [v0, v1, v2] = *tri;
        // Constant colour is kept exact rather than re-summed per cell
        let flat = (v0.color == v1.color && v1.color == v2.color).then_some(v0.color);

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor() as i32;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil() as i32;
        let min_y = v0.y.min(v1.y).min(v2.y).floor() as i32;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                if let Some((w0, w1, w2)) =
                    barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), (px, py))
                {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                        let color = flat.unwrap_or_else(|| {
                            [0, 1, 2].map(|c| {
                                w0 * v0.color[c] + w1 * v1.color[c] + w2 * v2.color[c]
                            })
                        });
                        self.write_fragment(x as usize, y as usize, depth, color, state);
                    }
                }
            }
        }
    }

    fn draw_line(&mut self, a: &ClipVertex, b: &ClipVertex, state: &RasterState) {
        let (da, db) = (a.near_distance(), b.near_distance());
        if da < 0.0 && db < 0.0 {
            return;
        }
        let (a, b) = if da < 0.0 {
            (a.lerp(b, da / (da - db)), *b)
        } else if db < 0.0 {
            (*a, b.lerp(a, db / (db - da)))
        } else {
            (*a, *b)
        };
        if a.clip.w <= f32::EPSILON || b.clip.w <= f32::EPSILON {
            return;
        }

        let (sa, sb) = (self.to_screen(&a), self.to_screen(&b));
        let steps = (sb.x - sa.x).abs().max((sb.y - sa.y).abs()).ceil().clamp(1.0, 4096.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = sa.x + (sb.x - sa.x) * t;
            let y = sa.y + (sb.y - sa.y) * t;
            if x < 0.0 || y < 0.0 || x >= self.width as f32 || y >= self.height as f32 {
                continue;
            }
            let depth = sa.depth + (sb.depth - sa.depth) * t;
            self.write_fragment(x as usize, y as usize, depth, lerp3(sa.color, sb.color, t), state);
        }
    }

    /// Stencil, depth and blend stages for one cell
    fn write_fragment(&mut self, x: usize, y: usize, depth: f32, color: [f32; 3], state: &RasterState) {
        if depth > 1.0 {
            return;
        }
        let idx = y * self.width + x;

        if state.stencil_dedup && self.stencil_buffer[idx] != 0 {
            return;
        }
        if state.depth_test {
            if depth >= self.depth_buffer[idx] {
                return;
            }
            self.depth_buffer[idx] = depth;
        }

        self.color_buffer[idx] = match state.blend_alpha {
            Some(alpha) => lerp3(self.color_buffer[idx], color, alpha),
            None => color,
        };

        if state.stencil_dedup {
            self.stencil_buffer[idx] = self.stencil_buffer[idx].saturating_add(1);
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current: Option<Color> = None;
        for y in 0..self.height {
            writer.queue(MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let color = self.color_at(x, y);
                let c = ramp_char(color);

                // Hue from the colour, brightness from the character
                let fg = hue(color);
                if current != Some(fg) {
                    writer.queue(SetForegroundColor(fg))?;
                    current = Some(fg);
                }
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Sutherland-Hodgman against the near plane; returns the kept polygon
fn clip_near(vertices: &[ClipVertex; 3]) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let current = vertices[i];
        let next = vertices[(i + 1) % 3];
        let (dc, dn) = (current.near_distance(), next.near_distance());

        if dc >= 0.0 {
            out.push(current);
        }
        if (dc >= 0.0) != (dn >= 0.0) {
            out.push(current.lerp(&next, dc / (dc - dn)));
        }
    }
    out.retain(|v| v.clip.w > f32::EPSILON);
    out
}

/// Counter-clockwise in normalized device coordinates (clockwise on screen, y down)
fn is_front_facing(tri: &[ScreenVertex; 3]) -> bool {
    let [a, b, c] = tri;
    let area = (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y);
    area < 0.0
}

fn luminance(color: [f32; 3]) -> f32 {
    0.2126 * color[0] + 0.7152 * color[1] + 0.0722 * color[2]
}

fn ramp_char(color: [f32; 3]) -> char {
    let brightness = luminance(color).clamp(0.0, 1.0);
    let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
    LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)]
}

fn hue(color: [f32; 3]) -> Color {
    let peak = color[0].max(color[1]).max(color[2]);
    if peak <= 0.0 {
        return Color::DarkGrey;
    }
    let [r, g, b] = color.map(|c| ((c / peak) * 255.0).round() as u8);
    Color::Rgb { r, g, b }
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [0, 1, 2].map(|i| a[i] + (b[i] - a[i]) * t)
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sw3d_core::Quad;

    const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
    const BLACK: [f32; 3] = [0.0, 0.0, 0.0];

    /// Axis-aligned rectangle in normalized device coordinates, facing the viewer
    fn ndc_rect(x0: f32, y0: f32, x1: f32, y1: f32, z: f32) -> Mesh {
        std::iter::once(Quad::flat(
            [
                Point3::new(x0, y0, z),
                Point3::new(x1, y0, z),
                Point3::new(x1, y1, z),
                Point3::new(x0, y1, z),
            ],
            Vector3::z(),
            None,
        ))
        .collect()
    }

    fn draw(renderer: &mut AsciiRenderer, mesh: &Mesh, shading: Shading, state: RasterState) {
        let identity = Matrix4::identity();
        renderer.draw_mesh(mesh, &identity, &identity, &shading, &state);
    }

    fn white_background(renderer: &mut AsciiRenderer) {
        draw(
            renderer,
            &ndc_rect(-1.0, -1.0, 1.0, 1.0, 0.9),
            Shading::Flat(WHITE),
            RasterState::opaque(false),
        );
    }

    #[test]
    fn test_fullscreen_quad_covers_buffer() {
        let mut renderer = AsciiRenderer::new(20, 10);
        white_background(&mut renderer);
        for y in 0..10 {
            for x in 0..20 {
                assert_eq!(renderer.color_at(x, y), WHITE);
                assert_eq!(renderer.char_at(x, y), '@');
            }
        }
        renderer.clear();
        assert_eq!(renderer.char_at(5, 5), ' ');
    }

    #[test]
    fn test_flat_colour_is_exact_across_triangle() {
        let mut renderer = AsciiRenderer::new(37, 23);
        let teal = [0.1, 0.7, 0.3];
        let mesh: Mesh = std::iter::once(Quad::flat(
            [
                Point3::new(-0.9, -0.8, 0.1),
                Point3::new(0.7, -0.95, 0.3),
                Point3::new(0.85, 0.6, -0.2),
                Point3::new(-0.6, 0.9, 0.0),
            ],
            Vector3::z(),
            None,
        ))
        .collect();
        draw(&mut renderer, &mesh, Shading::Flat(teal), RasterState::opaque(false));

        let mut covered = 0;
        for y in 0..23 {
            for x in 0..37 {
                let color = renderer.color_at(x, y);
                if color != BLACK {
                    assert_eq!(color, teal);
                    covered += 1;
                }
            }
        }
        assert!(covered > 100);
    }

    #[test]
    fn test_stencil_blends_overlap_once() {
        let mut renderer = AsciiRenderer::new(20, 10);
        white_background(&mut renderer);

        // Two overlapping shadow casters, like two legs of one object
        let left = ndc_rect(-1.0, -1.0, 0.5, 1.0, 0.0);
        let right = ndc_rect(-0.5, -1.0, 1.0, 1.0, 0.0);
        let shadow = RasterState::shadow(0.5, false);
        draw(&mut renderer, &left, Shading::Flat(BLACK), shadow);
        draw(&mut renderer, &right, Shading::Flat(BLACK), shadow);

        // Overlap in the middle, single coverage at the edges
        for x in [0, 10, 19] {
            assert_relative_eq!(renderer.color_at(x, 5)[0], 0.5, epsilon = 1e-6);
            assert_eq!(renderer.stencil_at(x, 5), 1);
        }
    }

    #[test]
    fn test_overlap_darkens_twice_without_stencil() {
        let mut renderer = AsciiRenderer::new(20, 10);
        white_background(&mut renderer);

        let state = RasterState {
            stencil_dedup: false,
            ..RasterState::shadow(0.5, false)
        };
        draw(&mut renderer, &ndc_rect(-1.0, -1.0, 0.5, 1.0, 0.0), Shading::Flat(BLACK), state);
        draw(&mut renderer, &ndc_rect(-0.5, -1.0, 1.0, 1.0, 0.0), Shading::Flat(BLACK), state);

        assert_relative_eq!(renderer.color_at(10, 5)[0], 0.25, epsilon = 1e-6);
        assert_relative_eq!(renderer.color_at(0, 5)[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let mut renderer = AsciiRenderer::new(10, 10);
        let near = ndc_rect(-1.0, -1.0, 1.0, 1.0, -0.5);
        let far = ndc_rect(-1.0, -1.0, 1.0, 1.0, 0.5);
        draw(&mut renderer, &near, Shading::Flat(WHITE), RasterState::opaque(false));
        draw(&mut renderer, &far, Shading::Flat([0.2, 0.2, 0.2]), RasterState::opaque(false));
        assert_eq!(renderer.color_at(5, 5), WHITE);
    }

    #[test]
    fn test_back_faces_culled() {
        let mut renderer = AsciiRenderer::new(10, 10);
        let back = Mesh {
            quads: ndc_rect(-1.0, -1.0, 1.0, 1.0, 0.0).quads.iter().map(Quad::flipped).collect(),
        };
        draw(&mut renderer, &back, Shading::Flat(WHITE), RasterState::opaque(false));
        assert_eq!(renderer.color_at(5, 5), BLACK);

        let no_cull = RasterState {
            cull_back_faces: false,
            ..RasterState::opaque(false)
        };
        draw(&mut renderer, &back, Shading::Flat(WHITE), no_cull);
        assert_eq!(renderer.color_at(5, 5), WHITE);
    }

    #[test]
    fn test_near_plane_clipping_keeps_visible_part() {
        let mut renderer = AsciiRenderer::new(40, 20);
        let camera = sw3d_core::Camera::new(40, 20);
        // A floor strip running from behind the camera to far ahead
        let floor: Mesh = std::iter::once(Quad::flat(
            [
                Point3::new(-1.0, -1.0, 5.0),
                Point3::new(1.0, -1.0, 5.0),
                Point3::new(1.0, -1.0, -20.0),
                Point3::new(-1.0, -1.0, -20.0),
            ],
            Vector3::y(),
            None,
        ))
        .collect();
        renderer.draw_mesh(
            &floor,
            &Matrix4::identity(),
            &camera.clip_from_world(),
            &Shading::Flat(WHITE),
            &RasterState::opaque(false),
        );
        // Bottom centre is floor, top row is not
        assert_eq!(renderer.color_at(20, 19), WHITE);
        assert_eq!(renderer.color_at(20, 0), BLACK);
    }

    #[test]
    fn test_lighting_faces_light_brighter() {
        let mut renderer = AsciiRenderer::new(10, 10);
        let light = Vector4::new(0.0, 0.0, 10.0, 1.0);
        let facing = ndc_rect(-1.0, -1.0, 1.0, 1.0, 0.0);
        draw(
            &mut renderer,
            &facing,
            Shading::Lit { albedo: WHITE, light },
            RasterState::opaque(false),
        );
        let lit = renderer.color_at(5, 5)[0];
        assert!(lit > 0.9, "facing surface should be fully lit, got {lit}");

        renderer.clear();
        let away = Vector4::new(0.0, 0.0, -10.0, 1.0);
        draw(
            &mut renderer,
            &facing,
            Shading::Lit { albedo: WHITE, light: away },
            RasterState::opaque(false),
        );
        assert_relative_eq!(renderer.color_at(5, 5)[0], AMBIENT, epsilon = 1e-5);
    }

    #[test]
    fn test_wireframe_draws_edges_only() {
        let mut renderer = AsciiRenderer::new(21, 21);
        draw(
            &mut renderer,
            &ndc_rect(-0.5, -0.5, 0.5, 0.5, 0.0),
            Shading::Flat(WHITE),
            RasterState::opaque(true),
        );
        assert_eq!(renderer.color_at(10, 10), BLACK);
        let lit_cells = (0..21)
            .flat_map(|y| (0..21).map(move |x| (x, y)))
            .filter(|&(x, y)| renderer.color_at(x, y) == WHITE)
            .count();
        assert!(lit_cells > 0);
    }

    #[test]
    fn test_resize_resets_buffers() {
        let mut renderer = AsciiRenderer::new(4, 4);
        renderer.resize(8, 3);
        assert_eq!((renderer.width(), renderer.height()), (8, 3));
        assert_eq!(renderer.stencil_at(7, 2), 0);
    }

    #[test]
    fn test_draw_emits_every_cell() {
        let renderer = AsciiRenderer::new(3, 2);
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        assert!(!out.is_empty());
    }
}
