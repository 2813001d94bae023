use glam::Vec2;

use crate::core::time::ClockReading;

/// Which clock hand a placement follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Hour,
    Minute,
    Second,
}

impl Hand {
    /// Angle of this hand for `clock`, 12 o'clock at -π/2.
    pub fn angle(self, clock: &ClockReading) -> f32 {
        match self {
            Hand::Hour => clock.hour_angle(),
            Hand::Minute => clock.minute_angle(),
            Hand::Second => clock.second_angle(),
        }
    }
}

/// Where a trail spawns its next particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Always the same point.
    Fixed(Vec2),
    /// At `length` along a clock hand pivoting on `center`.
    ClockHand { center: Vec2, length: f32, hand: Hand },
}

impl Placement {
    /// Ball `slot` of `slots` along the second hand, spaced so the last one
    /// sits at the tip.
    pub fn second_slot(center: Vec2, second_length: f32, slot: u8, slots: u8) -> Self {
        Placement::ClockHand {
            center,
            length: second_length * slot_fraction(slot, slots),
            hand: Hand::Second,
        }
    }

    /// Spawn point for the current clock reading.
    pub fn resolve(&self, clock: &ClockReading) -> Vec2 {
        match *self {
            Placement::Fixed(p) => p,
            Placement::ClockHand { center, length, hand } => {
                center + Vec2::from_angle(hand.angle(clock)) * length
            }
        }
    }
}

/// `(slot + 1) / slots`: how far along the second hand a slot sits, also
/// used to interpolate slot radius and colour.
pub fn slot_fraction(slot: u8, slots: u8) -> f32 {
    if slots == 0 {
        return 1.0;
    }
    (slot as f32 + 1.0) / slots as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: Vec2 = Vec2::new(480.0, 480.0);

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn minute_hand_at_quarter_past_points_right() {
        let clock = ClockReading::new(3, 15, 0);
        let p = Placement::ClockHand { center: CENTER, length: 280.0, hand: Hand::Minute };
        assert!(close(p.resolve(&clock), Vec2::new(760.0, 480.0)));
    }

    #[test]
    fn hour_hand_creeps_with_minutes() {
        let on_the_hour = ClockReading::new(6, 0, 0);
        let p = Placement::ClockHand { center: CENTER, length: 180.0, hand: Hand::Hour };
        assert!(close(p.resolve(&on_the_hour), Vec2::new(480.0, 660.0)));
        let half_past = ClockReading::new(6, 30, 0);
        assert!(p.resolve(&half_past).x < 480.0, "hour hand moves past 6 toward 7");
    }

    #[test]
    fn second_slots_spread_to_the_tip() {
        let clock = ClockReading::new(0, 0, 0);
        let first = Placement::second_slot(CENTER, 400.0, 0, 10).resolve(&clock);
        let last = Placement::second_slot(CENTER, 400.0, 9, 10).resolve(&clock);
        assert!(close(first, Vec2::new(480.0, 440.0)));
        assert!(close(last, Vec2::new(480.0, 80.0)));
    }

    #[test]
    fn fixed_ignores_clock() {
        let p = Placement::Fixed(Vec2::new(1.0, 2.0));
        assert_eq!(p.resolve(&ClockReading::new(11, 59, 59)), Vec2::new(1.0, 2.0));
        assert_eq!(slot_fraction(0, 0), 1.0);
    }
}
