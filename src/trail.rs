//! Exhaust trail behind the rocket.
//!
//! Particles are spawned when a multiplier update moves the rocket and are
//! advanced once per display frame, so the trail keeps animating between
//! irregular network ticks.

use crate::position::{
    EmissionPoint,
    Surface,
};
use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};

pub const PARTICLES_PER_EMISSION: usize = 3;
pub const MAX_PARTICLES: usize = 600;
const SIZE_DECAY: f64 = 0.96;
const MIN_VISIBLE_SIZE: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrailParticle {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub dx: f64,
    pub dy: f64,
    pub remaining_life: i32,
    pub color: Rgba,
}

impl TrailParticle {
    fn spawn(rng: &mut impl Rng, at: EmissionPoint) -> Self {
        Self {
            x: at.x,
            y: at.y,
            size: rng.random_range(1.0..3.5),
            dx: rng.random_range(-0.6..0.6),
            dy: rng.random_range(0.4..1.2),
            remaining_life: rng.random_range(15..40),
            color: Rgba {
                r: 255,
                g: rng.random_range(150..250),
                b: 0,
                a: rng.random_range(0.2..0.6),
            },
        }
    }

    /// Advances one frame; returns false once the particle should be dropped.
    fn advance(&mut self) -> bool {
        self.x += self.dx;
        self.y += self.dy;
        self.remaining_life -= 1;
        self.size *= SIZE_DECAY;
        self.remaining_life > 0 && self.size >= MIN_VISIBLE_SIZE
    }
}

pub struct TrailSimulator {
    surface: Surface,
    particles: Vec<TrailParticle>,
    emitting: bool,
    rng: StdRng,
}

impl TrailSimulator {
    pub fn new(surface: Surface) -> Self {
        Self::with_rng(surface, StdRng::from_os_rng())
    }

    pub fn with_rng(surface: Surface, rng: StdRng) -> Self {
        Self {
            surface,
            particles: Vec::new(),
            emitting: false,
            rng,
        }
    }

    pub fn particles(&self) -> &[TrailParticle] {
        &self.particles
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    /// Discards every particle and adopts the current layout.
    pub fn reinitialize(&mut self, surface: Surface) {
        self.surface = surface;
        self.particles.clear();
    }

    pub fn set_emitting(&mut self, emitting: bool) {
        self.emitting = emitting;
    }

    /// Seeds a batch at the flame. Points computed against a stale layout
    /// fall outside the current surface and are ignored.
    pub fn emit(&mut self, at: EmissionPoint) {
        if !self.emitting || !self.surface.contains(at) {
            return;
        }
        for _ in 0..PARTICLES_PER_EMISSION {
            let particle = TrailParticle::spawn(&mut self.rng, at);
            self.particles.push(particle);
        }
        if self.particles.len() > MAX_PARTICLES {
            let excess = self.particles.len() - MAX_PARTICLES;
            self.particles.drain(0..excess);
        }
    }

    /// One display frame: move, shrink and expire.
    pub fn step(&mut self) {
        self.particles.retain_mut(TrailParticle::advance);
    }
}
