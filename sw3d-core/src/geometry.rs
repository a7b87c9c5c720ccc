/// Geometry primitives for 3D rendering
use nalgebra::{Point2, Point3, Vector3};

/// A 3D vertex with position, normal and an optional texture coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub tex_coord: Option<Point2<f32>>,
}

impl Vertex {
    pub fn at(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self {
            position,
            normal,
            tex_coord: None,
        }
    }

    pub fn with_tex_coord(mut self, u: f32, v: f32) -> Self {
        self.tex_coord = Some(Point2::new(u, v));
        self
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }
}

/// A four-vertex planar polygon, wound counter-clockwise around its normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub vertices: [Vertex; 4],
}

impl Quad {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex, v3: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2, v3],
        }
    }

    /// Build a flat-shaded quad: every corner shares `normal` and `tex_coord`
    pub fn flat(
        corners: [Point3<f32>; 4],
        normal: Vector3<f32>,
        tex_coord: Option<Point2<f32>>,
    ) -> Self {
        Self {
            vertices: corners.map(|position| Vertex {
                position,
                normal,
                tex_coord,
            }),
        }
    }

    /// Flat quad with the usual unit-square texture mapping on its corners
    fn textured(corners: [Point3<f32>; 4], normal: Vector3<f32>) -> Self {
        const UV: [(f32, f32); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let mut quad = Self::flat(corners, normal, None);
        for (vertex, (u, v)) in quad.vertices.iter_mut().zip(UV) {
            vertex.tex_coord = Some(Point2::new(u, v));
        }
        quad
    }

    /// The normal shared by the quad's corners
    pub fn normal(&self) -> Vector3<f32> {
        self.vertices[0].normal
    }

    /// Geometric normal (Newell's method), not normalized
    pub fn newell_normal(&self) -> Vector3<f32> {
        let mut n = Vector3::zeros();
        for i in 0..4 {
            let a = self.vertices[i].position;
            let b = self.vertices[(i + 1) % 4].position;
            n.x += (a.y - b.y) * (a.z + b.z);
            n.y += (a.z - b.z) * (a.x + b.x);
            n.z += (a.x - b.x) * (a.y + b.y);
        }
        n
    }

    /// True when all four corners lie within `epsilon` of a common plane
    pub fn is_planar(&self, epsilon: f32) -> bool {
        let n = self.newell_normal();
        let len = n.norm();
        // Sliver with no area: the corners are collinear
        if len <= f32::EPSILON {
            return true;
        }
        let n = n / len;
        let origin = self.vertices[0].position;
        self.vertices
            .iter()
            .all(|v| n.dot(&(v.position - origin)).abs() <= epsilon)
    }

    /// Same surface seen from the other side
    pub fn flipped(&self) -> Self {
        let [a, b, c, d] = self.vertices;
        let mut quad = Self::new(d, c, b, a);
        for vertex in &mut quad.vertices {
            vertex.normal = -vertex.normal;
        }
        quad
    }

    /// Split into two triangles sharing the 0-2 diagonal
    pub fn triangles(&self) -> [Triangle; 2] {
        let [a, b, c, d] = self.vertices;
        [Triangle::new(a, b, c), Triangle::new(a, c, d)]
    }
}

/// A retained 3D mesh composed of quads
#[derive(Debug, Clone)]
pub struct Mesh {
    pub quads: Vec<Quad>,
}

impl Mesh {
    pub fn new() -> Self {
        Self { quads: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            quads: Vec::with_capacity(capacity),
        }
    }

    pub fn add_quad(&mut self, quad: Quad) {
        self.quads.push(quad);
    }

    pub fn append(&mut self, other: Mesh) {
        self.quads.extend(other.quads);
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.quads.iter().flat_map(|quad| quad.triangles())
    }

    /// Axis-aligned box with outward-facing, textured faces
    pub fn cuboid(min: Point3<f32>, max: Point3<f32>) -> Self {
        let (x0, y0, z0) = (min.x, min.y, min.z);
        let (x1, y1, z1) = (max.x, max.y, max.z);
        let p = Point3::new;
        let mut mesh = Self::with_capacity(6);

        // +X
        mesh.add_quad(Quad::textured(
            [p(x1, y0, z1), p(x1, y0, z0), p(x1, y1, z0), p(x1, y1, z1)],
            Vector3::x(),
        ));
        // -X
        mesh.add_quad(Quad::textured(
            [p(x0, y0, z0), p(x0, y0, z1), p(x0, y1, z1), p(x0, y1, z0)],
            -Vector3::x(),
        ));
        // +Y
        mesh.add_quad(Quad::textured(
            [p(x0, y1, z1), p(x1, y1, z1), p(x1, y1, z0), p(x0, y1, z0)],
            Vector3::y(),
        ));
        // -Y
        mesh.add_quad(Quad::textured(
            [p(x0, y0, z0), p(x1, y0, z0), p(x1, y0, z1), p(x0, y0, z1)],
            -Vector3::y(),
        ));
        // +Z
        mesh.add_quad(Quad::textured(
            [p(x0, y0, z1), p(x1, y0, z1), p(x1, y1, z1), p(x0, y1, z1)],
            Vector3::z(),
        ));
        // -Z
        mesh.add_quad(Quad::textured(
            [p(x1, y0, z0), p(x0, y0, z0), p(x0, y1, z0), p(x1, y1, z0)],
            -Vector3::z(),
        ));

        mesh
    }

    /// Cube centred on the origin, extending `half_extent` along each axis
    pub fn cube(half_extent: f32) -> Self {
        let h = half_extent;
        Self::cuboid(Point3::new(-h, -h, -h), Point3::new(h, h, h))
    }

    /// Open-fronted box seen from the inside: floor, back wall, side walls and ceiling
    pub fn room(min: Point3<f32>, max: Point3<f32>) -> Self {
        let shell = Self::cuboid(min, max);
        let mut mesh = Self::with_capacity(5);
        for quad in &shell.quads {
            // The +Z side stays open
            if quad.normal().z > 0.5 {
                continue;
            }
            mesh.add_quad(quad.flipped());
        }
        mesh
    }

    /// Upward-facing grid of `step`-sized tiles covering `[-extent, extent)` on X and Z
    pub fn ground_grid(extent: f32, step: f32, y: f32, tex_step: f32) -> Self {
        let cells = ((2.0 * extent) / step).round().max(0.0) as usize;
        let mut mesh = Self::with_capacity(cells * cells);
        let up = Vector3::y();

        for i in 0..cells {
            let x0 = -extent + i as f32 * step;
            let x1 = x0 + step;
            let s0 = i as f32 * tex_step;
            for j in 0..cells {
                let z0 = -extent + j as f32 * step;
                let z1 = z0 + step;
                let t0 = j as f32 * tex_step;
                mesh.add_quad(Quad::new(
                    Vertex::at(Point3::new(x0, y, z1), up).with_tex_coord(s0, t0 + tex_step),
                    Vertex::at(Point3::new(x1, y, z1), up)
                        .with_tex_coord(s0 + tex_step, t0 + tex_step),
                    Vertex::at(Point3::new(x1, y, z0), up).with_tex_coord(s0 + tex_step, t0),
                    Vertex::at(Point3::new(x0, y, z0), up).with_tex_coord(s0, t0),
                ));
            }
        }

        mesh
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Quad> for Mesh {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        Self {
            quads: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winding_matches_normal(quad: &Quad) -> bool {
        quad.newell_normal().dot(&quad.normal()) > 0.0
    }

    #[test]
    fn test_cube_faces_wind_outward() {
        let cube = Mesh::cube(1.0);
        assert_eq!(cube.len(), 6);
        for quad in &cube.quads {
            assert!(winding_matches_normal(quad));
            assert!(quad.is_planar(1e-6));
            // Outward: the face centre sits on the side the normal points to
            let centre = quad
                .vertices
                .iter()
                .fold(Vector3::zeros(), |acc, v| acc + v.position.coords)
                / 4.0;
            assert!(centre.dot(&quad.normal()) > 0.0);
        }
    }

    #[test]
    fn test_room_faces_inward_and_open_front() {
        let room = Mesh::room(Point3::new(-1.0, 0.0, -2.0), Point3::new(1.0, 2.0, 0.0));
        assert_eq!(room.len(), 5);
        assert!(room.quads.iter().all(|q| q.normal().z > -0.5));
        assert!(room.quads.iter().all(winding_matches_normal));
        let floor = room
            .quads
            .iter()
            .find(|q| q.vertices.iter().all(|v| v.position.y == 0.0))
            .unwrap();
        assert_eq!(floor.normal(), Vector3::y());
    }

    #[test]
    fn test_ground_grid_tiles() {
        let grid = Mesh::ground_grid(2.0, 1.0, -0.5, 0.5);
        assert_eq!(grid.len(), 16);
        for quad in &grid.quads {
            assert!(winding_matches_normal(quad));
            assert!(quad.vertices.iter().all(|v| v.position.y == -0.5));
            assert!(quad.vertices.iter().all(|v| v.tex_coord.is_some()));
        }
    }

    #[test]
    fn test_quad_triangles_cover_quad() {
        let quad = Mesh::cube(1.0).quads[0];
        let [t0, t1] = quad.triangles();
        assert_eq!(t0.vertices[0].position, t1.vertices[0].position);
        assert!((t0.calculate_normal() - quad.normal()).norm() < 1e-6);
        assert!((t1.calculate_normal() - quad.normal()).norm() < 1e-6);
    }

    #[test]
    fn test_skewed_quad_is_not_planar() {
        let quad = Quad::flat(
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.5),
                Point3::new(0.0, 1.0, 0.0),
            ],
            Vector3::z(),
            None,
        );
        assert!(!quad.is_planar(1e-3));
    }
}
