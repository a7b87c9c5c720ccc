/// STL export for binary and ASCII formats
use std::io::{self, Write};

use crate::geometry::{Mesh, Triangle};

/// Write a mesh as an ASCII STL solid
pub fn write_ascii_stl<W: Write>(mesh: &Mesh, name: &str, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "solid {name}")?;
    for triangle in mesh.triangles() {
        let n = facet_normal(&triangle);
        writeln!(writer, "  facet normal {:e} {:e} {:e}", n[0], n[1], n[2])?;
        writeln!(writer, "    outer loop")?;
        for vertex in &triangle.vertices {
            let p = vertex.position;
            writeln!(writer, "      vertex {:e} {:e} {:e}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {name}")?;
    Ok(())
}

/// Write a mesh as a binary STL file
pub fn write_binary_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> io::Result<()> {
    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|triangle| stl_io::Triangle {
            normal: stl_io::Normal::new(facet_normal(&triangle)),
            vertices: triangle.vertices.map(|vertex| {
                let p = vertex.position;
                stl_io::Vertex::new([p.x, p.y, p.z])
            }),
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())
}

/// Geometric normal, or zero for slivers
fn facet_normal(triangle: &Triangle) -> [f32; 3] {
    let n = triangle.calculate_normal();
    if n.iter().all(|v| v.is_finite()) {
        [n.x, n.y, n.z]
    } else {
        [0.0; 3]
    }
}
