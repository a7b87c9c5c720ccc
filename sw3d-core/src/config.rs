/// Scene configuration and its line-oriented text format
///
/// ```text
/// # comment
/// light -100 100 50 1
/// ground 0 -0.4 0  10 -0.4 0  5 -0.4 -5
/// shadow_alpha 0.6
/// fov 35
/// clip 1 50
/// fps 30
/// mode fill
/// move_step 0.1
/// turn_step 0.1
/// cog -2.2 0.4 -10  0.2 0.5 0.55 0.05 30  -1
/// wanderer 0.2 0.4 0.43 0.05 30
/// ```
///
/// Any `cog` line replaces the default pair of fixed cogs.
use std::fs;
use std::path::Path;

use nalgebra::{Point3, Vector4};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{space0, space1, u32 as parse_u32},
    combinator::{all_consuming, map, map_res, value},
    multi::count,
    number::complete::float,
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::error::{ConfigError, GeometryError};
use crate::gear::GearParams;
use crate::shadow::{Light, ShadowMatrix};

/// How polygons are rasterized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Fill,
    Line,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            RenderMode::Fill => RenderMode::Line,
            RenderMode::Line => RenderMode::Fill,
        }
    }
}

/// A cog fixed in place, spinning about the Z axis with the shared spin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CogPlacement {
    pub position: Point3<f32>,
    pub params: GearParams,
    /// +1 turns counter-clockwise about +Z, -1 clockwise
    pub spin_sign: f32,
}

/// Everything the demo scene can be tuned with
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// Homogeneous light position; `w = 0` for a directional light
    pub light: Vector4<f32>,
    /// Three points spanning the shadow receiver plane
    pub ground: [Point3<f32>; 3],
    pub shadow_alpha: f32,
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub target_fps: u32,
    pub render_mode: RenderMode,
    pub move_step: f32,
    pub turn_step: f32,
    pub cogs: Vec<CogPlacement>,
    pub wanderer: GearParams,
}

const LARGE_COG: GearParams = GearParams {
    inner_radius: 0.2,
    mid_radius: 0.5,
    outer_radius: 0.55,
    width: 0.05,
    tooth_count: 30,
};

const SMALL_COG: GearParams = GearParams {
    inner_radius: 0.2,
    mid_radius: 0.4,
    outer_radius: 0.43,
    width: 0.05,
    tooth_count: 30,
};

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            light: Vector4::new(-100.0, 100.0, 50.0, 1.0),
            ground: [
                Point3::new(0.0, -0.4, 0.0),
                Point3::new(10.0, -0.4, 0.0),
                Point3::new(5.0, -0.4, -5.0),
            ],
            shadow_alpha: 0.6,
            fov_deg: 35.0,
            near: 1.0,
            far: 50.0,
            target_fps: 30,
            render_mode: RenderMode::Fill,
            move_step: 0.1,
            turn_step: 0.1,
            cogs: vec![
                CogPlacement {
                    position: Point3::new(-2.2, 0.4, -10.0),
                    params: LARGE_COG,
                    spin_sign: -1.0,
                },
                CogPlacement {
                    position: Point3::new(2.2, 0.4, -10.0),
                    params: LARGE_COG,
                    spin_sign: 1.0,
                },
            ],
            wanderer: SMALL_COG,
        }
    }
}

impl SceneConfig {
    /// Read and parse a scene file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text)?;
        tracing::info!(path = %path.display(), cogs = config.cogs.len(), "loaded scene file");
        Ok(config)
    }

    /// Parse scene text on top of the defaults
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut replaced_cogs = false;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            let directive = match all_consuming(terminated(directive, space0))(content) {
                Ok((_, directive)) => directive,
                Err(_) => {
                    return Err(ConfigError::Parse {
                        line,
                        message: format!("unrecognised directive `{content}`"),
                    })
                }
            };

            if let Directive::Cog(_) = directive {
                if !replaced_cogs {
                    config.cogs.clear();
                    replaced_cogs = true;
                }
            }
            config
                .apply(directive)
                .map_err(|message| ConfigError::Parse { line, message })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the light and ground give a usable shadow
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shadow_matrix()?;
        Ok(())
    }

    pub fn shadow_matrix(&self) -> Result<ShadowMatrix, GeometryError> {
        ShadowMatrix::from_points(&self.ground, &Light::from_homogeneous(&self.light))
    }

    fn apply(&mut self, directive: Directive) -> Result<(), String> {
        match directive {
            Directive::Light(light) => self.light = light,
            Directive::Ground(ground) => self.ground = ground,
            Directive::ShadowAlpha(alpha) => {
                if !(0.0..=1.0).contains(&alpha) {
                    return Err(format!("shadow_alpha must be within 0..1, got {alpha}"));
                }
                self.shadow_alpha = alpha;
            }
            Directive::Fov(fov) => {
                if !(fov > 0.0 && fov < 180.0) {
                    return Err(format!("fov must be between 0 and 180 degrees, got {fov}"));
                }
                self.fov_deg = fov;
            }
            Directive::Clip(near, far) => {
                if !(near > 0.0 && far > near) {
                    return Err(format!("clip planes need 0 < near < far, got {near} {far}"));
                }
                self.near = near;
                self.far = far;
            }
            Directive::Fps(fps) => {
                if fps == 0 {
                    return Err("fps must be at least 1".to_string());
                }
                self.target_fps = fps;
            }
            Directive::Mode(mode) => self.render_mode = mode,
            Directive::MoveStep(step) => self.move_step = step,
            Directive::TurnStep(step) => self.turn_step = step,
            Directive::Cog(cog) => {
                let params = gear_params(&cog.dims, cog.teeth)?;
                self.cogs.push(CogPlacement {
                    position: cog.position,
                    params,
                    spin_sign: cog.spin_sign.signum(),
                });
            }
            Directive::Wanderer(dims, teeth) => self.wanderer = gear_params(&dims, teeth)?,
        }
        Ok(())
    }
}

fn gear_params(dims: &[f32; 4], teeth: u32) -> Result<GearParams, String> {
    GearParams::new(dims[0], dims[1], dims[2], dims[3], teeth).map_err(|e| e.to_string())
}

#[derive(Debug, Clone, PartialEq)]
struct CogLine {
    position: Point3<f32>,
    dims: [f32; 4],
    teeth: u32,
    spin_sign: f32,
}

#[derive(Debug, Clone, PartialEq)]
enum Directive {
    Light(Vector4<f32>),
    Ground([Point3<f32>; 3]),
    ShadowAlpha(f32),
    Fov(f32),
    Clip(f32, f32),
    Fps(u32),
    Mode(RenderMode),
    MoveStep(f32),
    TurnStep(f32),
    Cog(CogLine),
    Wanderer([f32; 4], u32),
}

fn directive(input: &str) -> IResult<&str, Directive> {
    alt((
        map(preceded(keyword("light"), count(number, 4)), |v| {
            Directive::Light(Vector4::new(v[0], v[1], v[2], v[3]))
        }),
        map(preceded(keyword("ground"), count(point, 3)), |p| {
            Directive::Ground([p[0], p[1], p[2]])
        }),
        map(preceded(keyword("shadow_alpha"), number), Directive::ShadowAlpha),
        map(preceded(keyword("fov"), number), Directive::Fov),
        map(preceded(keyword("clip"), tuple((number, number))), |(near, far)| {
            Directive::Clip(near, far)
        }),
        map(preceded(keyword("fps"), integer), Directive::Fps),
        map(preceded(keyword("mode"), render_mode), Directive::Mode),
        map(preceded(keyword("move_step"), number), Directive::MoveStep),
        map(preceded(keyword("turn_step"), number), Directive::TurnStep),
        map(
            preceded(keyword("cog"), tuple((point, dims, integer, number))),
            |(position, dims, teeth, spin_sign)| {
                Directive::Cog(CogLine {
                    position,
                    dims,
                    teeth,
                    spin_sign,
                })
            },
        ),
        map(
            preceded(keyword("wanderer"), tuple((dims, integer))),
            |(dims, teeth)| Directive::Wanderer(dims, teeth),
        ),
    ))(input)
}

/// A directive name followed by at least one space
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(word), space1)
}

fn number(input: &str) -> IResult<&str, f32> {
    map_res(preceded(space0, float), |value: f32| {
        if value.is_finite() {
            Ok(value)
        } else {
            Err("non-finite number")
        }
    })(input)
}

fn integer(input: &str) -> IResult<&str, u32> {
    preceded(space0, parse_u32)(input)
}

fn point(input: &str) -> IResult<&str, Point3<f32>> {
    map(tuple((number, number, number)), |(x, y, z)| Point3::new(x, y, z))(input)
}

/// Inner, mid and outer radius followed by width
fn dims(input: &str) -> IResult<&str, [f32; 4]> {
    map(count(number, 4), |v| [v[0], v[1], v[2], v[3]])(input)
}

fn render_mode(input: &str) -> IResult<&str, RenderMode> {
    alt((
        value(RenderMode::Fill, tag("fill")),
        value(RenderMode::Line, tag("line")),
    ))(input)
}
