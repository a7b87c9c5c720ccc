/// Example: Generate a cog and write it as binary STL
///
/// Usage: cargo run --example export_cog -- out.stl [teeth]
use anyhow::Context;
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use sw3d_core::{generate_gear_mesh, stl, Mesh};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let Some(path) = args.get(1) else {
        eprintln!("Usage: {} <out.stl> [teeth]", args[0]);
        return Ok(());
    };
    let teeth: u32 = match args.get(2) {
        Some(t) => t.parse().with_context(|| format!("invalid tooth count `{t}`"))?,
        None => 30,
    };

    let mesh: Mesh = generate_gear_mesh(0.2, 0.5, 0.55, 0.05, teeth)?.collect();
    println!("Generated cog: {} teeth, {} quads", teeth, mesh.len());

    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    let mut writer = BufWriter::new(file);
    stl::write_binary_stl(&mesh, &mut writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("failed to write {path}"))?;
    println!("Wrote {path}");
    Ok(())
}
