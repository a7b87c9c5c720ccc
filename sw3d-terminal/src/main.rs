/// SW3D Terminal Demo - Cogs and shadows in a room
///
/// Renders the scene as coloured ASCII in the terminal.
/// Controls:
///   - Up/Down: Move forward/back
///   - Left/Right: Turn
///   - M: Toggle filled/wireframe
///   - Space: Pause animation
///   - Q/ESC: Quit
use anyhow::{bail, Context};
use std::env;
use std::path::PathBuf;
use sw3d_core::{RenderMode, SceneConfig};
use sw3d_terminal::{export, logging, TerminalApp};

const USAGE: &str =
    "usage: sw3d-terminal [--config <scene file>] [--export-stl <path>] [--log-file <path>] [--wireframe]";

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    export_stl: Option<PathBuf>,
    log_file: Option<PathBuf>,
    wireframe: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(path_value(&mut iter, &arg)?),
            "--export-stl" => args.export_stl = Some(path_value(&mut iter, &arg)?),
            "--log-file" => args.log_file = Some(path_value(&mut iter, &arg)?),
            "--wireframe" => args.wireframe = true,
            "--help" | "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => bail!("unknown argument `{other}`\n{USAGE}"),
        }
    }
    Ok(args)
}

fn path_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<PathBuf> {
    iter.next()
        .map(PathBuf::from)
        .with_context(|| format!("{flag} needs a value\n{USAGE}"))
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    logging::init(args.log_file.as_deref())?;

    let mut config = match &args.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if args.wireframe {
        config.render_mode = RenderMode::Line;
    }

    if let Some(path) = &args.export_stl {
        let params = config.cogs.first().map_or(config.wanderer, |cog| cog.params);
        let mesh = params.build_mesh();
        export::export_ascii(&mesh, "cog", path)?;
        println!("Wrote {} quads to {}", mesh.len(), path.display());
        return Ok(());
    }

    let mut app = TerminalApp::new(&config)?;
    app.run()?;

    Ok(())
}
