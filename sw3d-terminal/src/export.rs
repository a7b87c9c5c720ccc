/// Writing meshes to STL files from the command line
use anyhow::Context;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use sw3d_core::{stl, Mesh};

/// Buffered ASCII STL, flushed so late write errors are reported
pub fn write_ascii<W: Write>(mesh: &Mesh, name: &str, inner: W) -> io::Result<()> {
    let mut writer = BufWriter::new(inner);
    stl::write_ascii_stl(mesh, name, &mut writer)?;
    writer.flush()
}

pub fn export_ascii(mesh: &Mesh, name: &str, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_ascii(mesh, name, file).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), faces = mesh.len(), "exported mesh");
    Ok(())
}
