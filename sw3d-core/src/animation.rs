/// Per-frame animation state for the scene's moving props
///
/// Rates match a demo ticking at 60 frames per second: the shared spin turns
/// half a degree per frame and the wandering cog drifts 0.01 units per frame
/// while spinning two degrees per frame.

/// Shared spin of the sofa, orbiting cube and fixed cogs, in degrees per second
pub const SPIN_RATE_DEG: f32 = 30.0;
/// Spin of the wandering cog, in degrees per second
pub const WANDER_SPIN_RATE_DEG: f32 = 120.0;
/// Travel speed of the wandering cog along each axis, in units per second
pub const WANDER_SPEED: f32 = 0.6;

pub const WANDER_X_RANGE: (f32, f32) = (-3.0, 3.0);
pub const WANDER_Y_RANGE: (f32, f32) = (-1.0, 1.5);

/// Cog bouncing back and forth inside a rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wanderer {
    pub x: f32,
    pub y: f32,
    pub rising_x: bool,
    pub rising_y: bool,
    pub spin_deg: f32,
}

impl Wanderer {
    /// Flip direction at the bounds, then move
    fn advance(self, dt: f32) -> Self {
        let rising_x = bounce(self.x, WANDER_X_RANGE, self.rising_x);
        let rising_y = bounce(self.y, WANDER_Y_RANGE, self.rising_y);
        let step = WANDER_SPEED * dt;

        Self {
            x: self.x + if rising_x { step } else { -step },
            y: self.y + if rising_y { step } else { -step },
            rising_x,
            rising_y,
            spin_deg: wrap_degrees(self.spin_deg + WANDER_SPIN_RATE_DEG * dt),
        }
    }
}

impl Default for Wanderer {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rising_x: false,
            rising_y: false,
            spin_deg: 0.0,
        }
    }
}

/// Everything that moves between frames
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationState {
    pub spin_deg: f32,
    pub wanderer: Wanderer,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Step the animation forward by `dt` seconds
pub fn advance(state: AnimationState, dt: f32) -> AnimationState {
    let dt = dt.max(0.0);
    AnimationState {
        spin_deg: wrap_degrees(state.spin_deg + SPIN_RATE_DEG * dt),
        wanderer: state.wanderer.advance(dt),
    }
}

fn bounce(value: f32, (low, high): (f32, f32), rising: bool) -> bool {
    if value <= low {
        true
    } else if value >= high {
        false
    } else {
        rising
    }
}

fn wrap_degrees(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}
