//! Timed linear transitions between two domains.
//!
//! A tween is advanced once per redraw. Every tween carries the generation it
//! was started with, and a frame computed for an older generation is dropped
//! instead of applied.

use super::Domain;
use std::time::{Duration, Instant};

pub const DEFAULT_TWEEN: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub generation: u64,
    pub started_at: Instant,
    pub from: Domain,
    pub to: Domain,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AnimationState {
    #[default]
    None,
    Active(Tween),
}

impl AnimationState {
    pub fn is_active(&self) -> bool {
        matches!(self, AnimationState::Active(_))
    }

    pub fn generation(&self) -> Option<u64> {
        match self {
            AnimationState::Active(tween) => Some(tween.generation),
            AnimationState::None => None,
        }
    }
}

/// One interpolated step of a tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub generation: u64,
    pub domain: Domain,
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationScheduler {
    duration: Duration,
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TWEEN)
    }
}

impl AnimationScheduler {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn begin(&self, generation: u64, from: Domain, to: Domain, now: Instant) -> Tween {
        Tween {
            generation,
            started_at: now,
            from,
            to,
        }
    }

    /// Interpolate `tween` at `now`. Once the duration has elapsed the sample
    /// is exactly `tween.to`.
    pub fn sample(&self, tween: &Tween, now: Instant) -> Sample {
        let elapsed = now.saturating_duration_since(tween.started_at);
        if elapsed >= self.duration || self.duration.is_zero() {
            return Sample {
                generation: tween.generation,
                domain: tween.to,
                finished: true,
            };
        }

        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        Sample {
            generation: tween.generation,
            domain: Domain::new(
                lerp(tween.from.start, tween.to.start, t),
                lerp(tween.from.end, tween.to.end, t),
            ),
            finished: false,
        }
    }

    /// Apply `sample` to `state`, or return `None` when the sample belongs to
    /// a tween that has since been replaced or finished.
    pub fn commit(&self, state: AnimationState, sample: Sample) -> Option<(Domain, AnimationState)> {
        match state {
            AnimationState::Active(tween) if tween.generation == sample.generation => {
                let next = if sample.finished {
                    AnimationState::None
                } else {
                    state
                };
                Some((sample.domain, next))
            }
            _ => None,
        }
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + t * (to - from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tween(scheduler: &AnimationScheduler, generation: u64, now: Instant) -> Tween {
        scheduler.begin(
            generation,
            Domain::new(0.0, 1000.0),
            Domain::new(200.0, 600.0),
            now,
        )
    }

    #[test]
    fn interpolates_each_endpoint_linearly() {
        let scheduler = AnimationScheduler::default();
        let start = Instant::now();
        let tween = tween(&scheduler, 1, start);

        let half = scheduler.sample(&tween, start + Duration::from_millis(500));
        assert!(!half.finished);
        assert!((half.domain.start - 100.0).abs() < 1e-9);
        assert!((half.domain.end - 800.0).abs() < 1e-9);
    }

    #[test]
    fn snaps_to_target_once_elapsed() {
        let scheduler = AnimationScheduler::default();
        let start = Instant::now();
        let tween = tween(&scheduler, 1, start);

        let done = scheduler.sample(&tween, start + Duration::from_millis(1500));
        assert!(done.finished);
        assert_eq!(done.domain, Domain::new(200.0, 600.0));

        let (domain, state) = scheduler
            .commit(AnimationState::Active(tween), done)
            .unwrap();
        assert_eq!(domain, Domain::new(200.0, 600.0));
        assert_eq!(state, AnimationState::None);
    }

    #[test]
    fn stale_samples_are_discarded() {
        let scheduler = AnimationScheduler::default();
        let start = Instant::now();
        let old = tween(&scheduler, 1, start);
        let sample = scheduler.sample(&old, start + Duration::from_millis(100));

        let newer = AnimationState::Active(tween(&scheduler, 2, start));
        assert_eq!(scheduler.commit(newer, sample), None);
        assert_eq!(scheduler.commit(AnimationState::None, sample), None);
    }

    #[test]
    fn samples_before_start_stay_at_origin() {
        let scheduler = AnimationScheduler::default();
        let start = Instant::now() + Duration::from_secs(1);
        let tween = tween(&scheduler, 1, start);

        let early = scheduler.sample(&tween, Instant::now());
        assert_eq!(early.domain, Domain::new(0.0, 1000.0));
    }
}
