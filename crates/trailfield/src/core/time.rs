use std::f32::consts::{FRAC_PI_2, TAU};

/// Display rate the per-frame tuning numbers (speeds in px/frame, air
/// friction per frame) were chosen at. Defaults multiply by it to get the
/// per-second units the physics backend integrates in.
pub const REFERENCE_FPS: f32 = 60.0;

/// Fixed timestep accumulator, in milliseconds.
/// Turns variable frame times into a whole number of simulation steps.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// The fixed delta time per step.
    dt_ms: f64,
    /// Accumulated time from variable frame deltas.
    accumulator: f64,
}

impl FixedTimestep {
    /// Most steps a single `accumulate` call will hand out.
    pub const MAX_STEPS: u32 = 10;

    pub fn new(dt_ms: f64) -> Self {
        Self {
            dt_ms: dt_ms.max(f64::EPSILON),
            accumulator: 0.0,
        }
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_ms: f64) -> u32 {
        self.accumulator += frame_ms.max(0.0);
        // Cap to prevent a spiral of death after a long stall.
        self.accumulator = self.accumulator.min(self.dt_ms * Self::MAX_STEPS as f64);
        let steps = (self.accumulator / self.dt_ms) as u32;
        self.accumulator -= steps as f64 * self.dt_ms;
        steps
    }

    /// Interpolation alpha between steps (0.0 to 1.0).
    pub fn alpha(&self) -> f64 {
        self.accumulator / self.dt_ms
    }

    pub fn dt_ms(&self) -> f64 {
        self.dt_ms
    }
}

/// A wall-clock reading supplied by the host each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockReading {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl ClockReading {
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours: hours % 24,
            minutes: minutes % 60,
            seconds: seconds % 60,
        }
    }

    /// Second-hand angle in radians; 12 o'clock is -π/2, clockwise in Y-down space.
    pub fn second_angle(&self) -> f32 {
        self.seconds as f32 / 60.0 * TAU - FRAC_PI_2
    }

    pub fn minute_angle(&self) -> f32 {
        self.minutes as f32 / 60.0 * TAU - FRAC_PI_2
    }

    /// Hour-hand angle; creeps forward with the minutes.
    pub fn hour_angle(&self) -> f32 {
        let h = (self.hours % 12) as f32 + self.minutes as f32 / 60.0;
        h / 12.0 * TAU - FRAC_PI_2
    }

    /// The four `HHMM` digits.
    pub fn digits(&self) -> [u8; 4] {
        [
            (self.hours / 10) as u8,
            (self.hours % 10) as u8,
            (self.minutes / 10) as u8,
            (self.minutes % 10) as u8,
        ]
    }
}
