use web_time::Instant;

/// Damped harmonic spring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spring {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
    /// Distance from target under which the spring may come to rest.
    pub rest_delta: f32,
    /// Speed (units/s) under which the spring may come to rest.
    pub rest_speed: f32,
}

impl Default for Spring {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damping: 10.0,
            mass: 1.0,
            rest_delta: 0.01,
            rest_speed: 0.01,
        }
    }
}

impl Spring {
    pub fn new(stiffness: f32, damping: f32) -> Self {
        Self {
            stiffness,
            damping,
            ..Self::default()
        }
    }

    /// < 1.0 overshoots, >= 1.0 does not.
    pub fn damping_ratio(&self) -> f32 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }
}

// Integration step; keeps stiff springs stable at low frame rates.
const STEP_SECS: f32 = 1.0 / 240.0;

/// A value pulled toward its target by a [`Spring`], advanced by wall time.
#[derive(Clone, Debug)]
pub struct SpringValue {
    spring: Spring,
    current: f32,
    target: f32,
    velocity: f32,
    last_tick: Option<Instant>,
}

impl SpringValue {
    pub fn new(initial: f32, spring: Spring) -> Self {
        Self {
            spring,
            current: initial,
            target: initial,
            velocity: 0.0,
            last_tick: None,
        }
    }

    /// Retargets without resetting velocity, so an interrupted animation
    /// turns around smoothly.
    pub fn set_target(&mut self, target: f32, now: Instant) {
        if target == self.target && self.last_tick.is_none() {
            return;
        }
        self.target = target;
        if self.last_tick.is_none() {
            self.last_tick = Some(now);
        }
    }

    /// Jumps to `value` and stops.
    pub fn snap_to(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.velocity = 0.0;
        self.last_tick = None;
    }

    /// Steps the simulation up to `now`. Returns `true` while still moving.
    pub fn update(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_tick else {
            return false;
        };
        let mut dt = now.saturating_duration_since(last).as_secs_f32();
        self.last_tick = Some(now);

        let Spring {
            stiffness,
            damping,
            mass,
            rest_delta,
            rest_speed,
        } = self.spring;

        while dt > 0.0 {
            let h = dt.min(STEP_SECS);
            let displacement = self.current - self.target;
            let accel = (-stiffness * displacement - damping * self.velocity) / mass;
            // semi-implicit Euler
            self.velocity += accel * h;
            self.current += self.velocity * h;
            dt -= h;
        }

        if (self.current - self.target).abs() < rest_delta && self.velocity.abs() < rest_speed {
            self.snap_to(self.target);
            return false;
        }
        true
    }

    pub fn get(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn spring(&self) -> Spring {
        self.spring
    }

    pub fn is_animating(&self) -> bool {
        self.last_tick.is_some()
    }
}
