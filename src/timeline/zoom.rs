//! Discrete zoom levels for stepping the visible width in and out.

use super::Domain;

const SECOND: f64 = 1_000.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;

/// Preset visible widths in milliseconds, narrowest first.
const PRESETS: [f64; 25] = [
    10.0,
    50.0,
    100.0,
    250.0,
    500.0,
    SECOND,
    5.0 * SECOND,
    15.0 * SECOND,
    30.0 * SECOND,
    MINUTE,
    5.0 * MINUTE,
    15.0 * MINUTE,
    30.0 * MINUTE,
    HOUR,
    3.0 * HOUR,
    6.0 * HOUR,
    12.0 * HOUR,
    DAY,
    3.0 * DAY,
    7.0 * DAY,
    14.0 * DAY,
    30.0 * DAY,
    90.0 * DAY,
    180.0 * DAY,
    365.0 * DAY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomScale {
    /// Index into the ladder's rungs.
    Preset(usize),
    /// Already at the narrowest rung; zooming in has no further effect.
    Minimum,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoomLadder {
    rungs: Vec<f64>,
}

impl Default for ZoomLadder {
    fn default() -> Self {
        Self {
            rungs: PRESETS.to_vec(),
        }
    }
}

impl ZoomLadder {
    /// Build a ladder from arbitrary widths. Non-positive and non-finite
    /// widths are dropped; the rest are sorted and deduplicated.
    pub fn new(widths: impl IntoIterator<Item = f64>) -> Self {
        let mut rungs: Vec<f64> = widths
            .into_iter()
            .filter(|width| width.is_finite() && *width > 0.0)
            .collect();
        rungs.sort_by(f64::total_cmp);
        rungs.dedup();
        if rungs.is_empty() {
            return Self::default();
        }
        Self { rungs }
    }

    /// The widest rung narrower than the domain, or `Minimum`.
    pub fn next_smaller(&self, domain: Domain) -> ZoomScale {
        let width = domain.width();
        match self.rungs.iter().rposition(|rung| *rung < width) {
            Some(index) => ZoomScale::Preset(index),
            None => ZoomScale::Minimum,
        }
    }

    /// The narrowest rung wider than the domain, saturating at the widest.
    pub fn next_bigger(&self, domain: Domain) -> ZoomScale {
        let width = domain.width();
        let index = self
            .rungs
            .iter()
            .position(|rung| *rung > width)
            .unwrap_or(self.rungs.len() - 1);
        ZoomScale::Preset(index)
    }

    pub fn width_of(&self, scale: ZoomScale) -> f64 {
        match scale {
            ZoomScale::Preset(index) => self.rungs[index.min(self.rungs.len() - 1)],
            ZoomScale::Minimum => self.rungs[0],
        }
    }

    pub fn is_zoom_in_possible(&self, domain: Domain) -> bool {
        !domain.is_degenerate() && self.next_smaller(domain) != ZoomScale::Minimum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_to_neighbouring_rungs() {
        let ladder = ZoomLadder::default();
        let domain = Domain::new(500.0, 1500.0);

        assert_eq!(ladder.width_of(ladder.next_smaller(domain)), 500.0);
        assert_eq!(ladder.width_of(ladder.next_bigger(domain)), 5_000.0);
    }

    #[test]
    fn between_rungs_picks_the_closest_in_each_direction() {
        let ladder = ZoomLadder::default();
        let domain = Domain::new(0.0, 3_000.0);

        assert_eq!(ladder.width_of(ladder.next_smaller(domain)), 1_000.0);
        assert_eq!(ladder.width_of(ladder.next_bigger(domain)), 5_000.0);
    }

    #[test]
    fn saturates_at_both_ends() {
        let ladder = ZoomLadder::new([10.0, 100.0]);

        let tiny = Domain::new(0.0, 10.0);
        assert_eq!(ladder.next_smaller(tiny), ZoomScale::Minimum);
        assert_eq!(ladder.width_of(ZoomScale::Minimum), 10.0);
        assert!(!ladder.is_zoom_in_possible(tiny));

        let huge = Domain::new(0.0, 1_000_000.0);
        assert_eq!(ladder.next_bigger(huge), ZoomScale::Preset(1));
        assert_eq!(ladder.width_of(ladder.next_bigger(huge)), 100.0);
    }

    #[test]
    fn invalid_widths_fall_back_to_presets() {
        let ladder = ZoomLadder::new([f64::NAN, -5.0, 0.0]);
        assert_eq!(ladder, ZoomLadder::default());
    }
}
