//! Maps the multiplier onto the rocket's height in the flight area.
//!
//! Ascent follows a logarithmic curve so high multipliers compress instead of
//! running off the top of the surface.

pub const EASING_BASE: f64 = 1.25;
pub const MAX_MULTIPLIER: f64 = 30.0;
/// Portion of the rocket that may leave the top edge at full progress.
const EMITTER_CLEARANCE: f64 = 0.85;
/// Flame sits slightly above the rocket's bottom edge.
const FLAME_OFFSET: f64 = 0.05;

/// Normalized ascent in `[0, 1]`; anything at or below 1.00x is the floor.
pub fn progress(multiplier: f64) -> f64 {
    if multiplier.is_nan() || multiplier <= 1.0 {
        return 0.0;
    }
    let current = multiplier.log(EASING_BASE);
    let horizon = MAX_MULTIPLIER.log(EASING_BASE);
    (current / horizon).min(1.0)
}

/// Distance of the emitter's bottom from the floor, clamped to the travel range.
pub fn offset(progress: f64, container_height: f64, emitter_height: f64) -> f64 {
    let travel = (container_height - emitter_height * EMITTER_CLEARANCE).max(0.0);
    (progress * travel).clamp(0.0, travel)
}

/// Size of the drawing surface in its own units, y growing downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
    pub emitter_height: f64,
}

impl Surface {
    pub fn new(width: f64, height: f64, emitter_height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            emitter_height: emitter_height.max(0.0),
        }
    }

    pub fn contains(&self, point: EmissionPoint) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmissionPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tilt {
    /// Resting on the launch pad, leaning before lift-off.
    #[default]
    Tilted,
    Upright,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RocketPose {
    pub bottom: f64,
    pub tilt: Tilt,
    pub crashed: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PositionMapper {
    surface: Surface,
    pose: RocketPose,
}

impl PositionMapper {
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            pose: RocketPose::default(),
        }
    }

    pub fn pose(&self) -> RocketPose {
        self.pose
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn resize(&mut self, surface: Surface) {
        self.surface = surface;
        if !self.pose.crashed {
            let travel = offset(1.0, surface.height, surface.emitter_height);
            self.pose.bottom = self.pose.bottom.min(travel);
        }
    }

    pub fn on_waiting(&mut self) {
        self.pose = RocketPose {
            bottom: 0.0,
            tilt: Tilt::Tilted,
            crashed: false,
        };
    }

    /// Moves the rocket for a running multiplier and returns where the trail
    /// should be seeded.
    pub fn on_running(&mut self, multiplier: f64) -> Option<EmissionPoint> {
        if self.pose.crashed {
            return None;
        }
        let Surface {
            width,
            height,
            emitter_height,
        } = self.surface;
        let bottom = offset(progress(multiplier), height, emitter_height);
        self.pose = RocketPose {
            bottom,
            tilt: Tilt::Upright,
            crashed: false,
        };
        Some(EmissionPoint {
            x: width / 2.0,
            y: height - bottom - emitter_height * FLAME_OFFSET,
        })
    }

    /// Freezes the rocket where it was last placed.
    pub fn on_crashed(&mut self) {
        self.pose.crashed = true;
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use proptest::prelude::*;

    fn surface() -> Surface {
        Surface::new(80.0, 200.0, 20.0)
    }

    #[test]
    fn progress__is_zero_at_and_below_one() {
        assert_eq!(progress(1.0), 0.0);
        assert_eq!(progress(0.5), 0.0);
        assert_eq!(progress(f64::NAN), 0.0);
    }

    #[test]
    fn progress__reaches_one_at_the_horizon_and_stays_there() {
        assert!((progress(MAX_MULTIPLIER) - 1.0).abs() < 1e-12);
        assert_eq!(progress(1_000.0), 1.0);
    }

    #[test]
    fn progress__decelerates_at_high_multipliers() {
        let low_gain = progress(3.0) - progress(2.0);
        let high_gain = progress(21.0) - progress(20.0);
        assert!(high_gain < low_gain);
    }

    #[test]
    fn offset__is_clamped_to_travel_range() {
        assert_eq!(offset(1.0, 200.0, 20.0), 183.0);
        assert_eq!(offset(0.0, 200.0, 20.0), 0.0);
        assert_eq!(offset(0.5, 10.0, 40.0), 0.0);
    }

    #[test]
    fn on_running__places_rocket_upright_and_emits_below_it() {
        // given
        let mut mapper = PositionMapper::new(surface());

        // when
        let point = mapper.on_running(MAX_MULTIPLIER).unwrap();

        // then
        let pose = mapper.pose();
        assert_eq!(pose.tilt, Tilt::Upright);
        assert_eq!(pose.bottom, 183.0);
        assert_eq!(point.x, 40.0);
        assert!((point.y - 16.0).abs() < 1e-9);
    }

    #[test]
    fn on_crashed__freezes_position_against_later_ticks() {
        // given
        let mut mapper = PositionMapper::new(surface());
        mapper.on_running(2.0);
        let frozen = mapper.pose().bottom;

        // when
        mapper.on_crashed();
        let emitted = mapper.on_running(5.0);

        // then
        assert!(emitted.is_none());
        assert_eq!(mapper.pose().bottom, frozen);
        assert!(mapper.pose().crashed);
    }

    #[test]
    fn on_waiting__returns_to_floor_tilted() {
        // given
        let mut mapper = PositionMapper::new(surface());
        mapper.on_running(4.0);
        mapper.on_crashed();

        // when
        mapper.on_waiting();

        // then
        assert_eq!(
            mapper.pose(),
            RocketPose {
                bottom: 0.0,
                tilt: Tilt::Tilted,
                crashed: false
            }
        );
    }

    proptest! {
        #[test]
        fn progress__is_bounded_and_non_decreasing(a in 0.0f64..1_000.0, b in 0.0f64..1_000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (p_lo, p_hi) = (progress(lo), progress(hi));
            prop_assert!((0.0..=1.0).contains(&p_lo));
            prop_assert!((0.0..=1.0).contains(&p_hi));
            prop_assert!(p_lo <= p_hi);
        }
    }
}
