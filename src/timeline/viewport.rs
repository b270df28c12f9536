//! Visible-range state and the operations that move it.
//!
//! [`ViewportState`] is a plain value and [`ViewportState::apply`] is a pure
//! transition. [`ViewportController`] owns the current state together with the
//! zoom ladder and tween settings and is the only writer of the domain.

use super::animation::{AnimationScheduler, AnimationState, Sample};
use super::zoom::ZoomLadder;
use super::{Domain, TimeScale, TimelineEvent};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Full time extent of `events`: earliest start to latest end (or start, for
/// instant events). Empty input gives [`Domain::EMPTY`].
pub fn compute_max_domain(events: &[TimelineEvent]) -> Domain {
    let start = events
        .iter()
        .map(|event| event.start_ms)
        .fold(f64::NAN, f64::min);
    let end = events
        .iter()
        .map(TimelineEvent::last_ms)
        .fold(f64::NAN, f64::max);
    Domain::new(start, end)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    /// A new event extent; resets both the domain and the max domain.
    Load(Domain),
    /// Whether the pointer currently rests on an event mark.
    Hover(bool),
    ZoomIn {
        cursor_ms: f64,
        now: Instant,
    },
    ZoomOut {
        cursor_ms: f64,
        now: Instant,
    },
    ZoomCustom {
        pixel_start: f32,
        pixel_end: f32,
        scale: TimeScale,
        now: Instant,
    },
    Pan {
        pixel_delta: f32,
        scale: TimeScale,
    },
    Reset {
        now: Instant,
    },
    Frame {
        generation: u64,
        now: Instant,
    },
}

pub struct Context<'a> {
    pub ladder: &'a ZoomLadder,
    pub scheduler: &'a AnimationScheduler,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    /// The domain currently rendered, possibly mid-tween.
    pub domain: Domain,
    pub max_domain: Domain,
    pub animation: AnimationState,
    /// Generation of the most recently started tween.
    pub generation: u64,
    pub pointer_over_mark: bool,
}

impl ViewportState {
    pub fn new(max_domain: Domain) -> Self {
        Self {
            domain: max_domain,
            max_domain,
            animation: AnimationState::None,
            generation: 0,
            pointer_over_mark: false,
        }
    }

    /// Zoom and reset are refused while a tween runs or a mark is hovered.
    pub fn is_change_allowed(&self) -> bool {
        !self.animation.is_active() && !self.pointer_over_mark
    }

    pub fn apply(self, op: &Operation, ctx: &Context<'_>) -> ViewportState {
        match *op {
            Operation::Load(max_domain) => ViewportState {
                domain: max_domain,
                max_domain,
                animation: AnimationState::None,
                ..self
            },
            Operation::Hover(pointer_over_mark) => ViewportState {
                pointer_over_mark,
                ..self
            },
            Operation::ZoomIn { cursor_ms, now } => {
                if !self.is_change_allowed() || self.domain.is_degenerate() {
                    return self;
                }
                let width = ctx.ladder.width_of(ctx.ladder.next_smaller(self.domain));
                self.animate_to(self.zoom_target(cursor_ms, width), now, ctx)
            }
            Operation::ZoomOut { cursor_ms, now } => {
                if !self.is_change_allowed() || self.domain.is_degenerate() {
                    return self;
                }
                // The ladder saturates at its widest rung; never let a zoom out narrow the view.
                let width = ctx
                    .ladder
                    .width_of(ctx.ladder.next_bigger(self.domain))
                    .max(self.domain.width());
                self.animate_to(self.zoom_target(cursor_ms, width), now, ctx)
            }
            Operation::ZoomCustom {
                pixel_start,
                pixel_end,
                scale,
                now,
            } => {
                if !self.is_change_allowed() || scale.is_degenerate() {
                    return self;
                }
                let (left, right) = if pixel_start <= pixel_end {
                    (pixel_start, pixel_end)
                } else {
                    (pixel_end, pixel_start)
                };
                // Drags may be released outside the canvas.
                let width = scale.pixel_width();
                let (left, right) = (left.clamp(0.0, width), right.clamp(0.0, width));
                let target = Domain::new(
                    scale.to_ms(left).max(self.max_domain.start),
                    scale.to_ms(right).min(self.max_domain.end),
                );
                if !(target.width() > 0.0) {
                    return self;
                }
                self.animate_to(target, now, ctx)
            }
            Operation::Pan { pixel_delta, scale } => {
                if scale.is_degenerate() || self.domain.is_degenerate() {
                    return self;
                }
                let delta_ms =
                    pixel_delta as f64 * self.domain.width() / scale.pixel_width() as f64;
                let next = self.domain.translate(delta_ms);
                if self.max_domain.contains_domain(&next) {
                    ViewportState {
                        domain: next,
                        ..self
                    }
                } else {
                    self
                }
            }
            Operation::Reset { now } => {
                if !self.is_change_allowed() || self.max_domain.is_degenerate() {
                    return self;
                }
                self.animate_to(self.max_domain, now, ctx)
            }
            Operation::Frame { generation, now } => {
                let AnimationState::Active(tween) = self.animation else {
                    return self;
                };
                let sample = ctx.scheduler.sample(&tween, now);
                let sample = Sample {
                    generation,
                    ..sample
                };
                match ctx.scheduler.commit(self.animation, sample) {
                    Some((domain, animation)) => ViewportState {
                        domain,
                        animation,
                        ..self
                    },
                    None => self,
                }
            }
        }
    }

    fn zoom_target(&self, cursor_ms: f64, width: f64) -> Domain {
        Domain::new(
            (cursor_ms - width / 2.0).max(self.max_domain.start),
            (cursor_ms + width / 2.0).min(self.max_domain.end),
        )
    }

    /// Start a tween from the currently rendered domain, replacing any
    /// tween already in flight.
    fn animate_to(self, target: Domain, now: Instant, ctx: &Context<'_>) -> ViewportState {
        if target.bits() == self.domain.bits() {
            return self;
        }
        let generation = self.generation + 1;
        let tween = ctx.scheduler.begin(generation, self.domain, target, now);
        ViewportState {
            animation: AnimationState::Active(tween),
            generation,
            ..self
        }
    }
}

/// What a dispatched operation did, for the host's change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    pub domain_changed: bool,
    pub tween_started: bool,
    pub tween_finished: bool,
}

#[derive(Debug)]
pub struct ViewportController {
    state: ViewportState,
    ladder: ZoomLadder,
    scheduler: AnimationScheduler,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(ZoomLadder::default(), super::animation::DEFAULT_TWEEN)
    }
}

impl ViewportController {
    pub fn new(ladder: ZoomLadder, tween: Duration) -> Self {
        Self {
            state: ViewportState::new(Domain::EMPTY),
            ladder,
            scheduler: AnimationScheduler::new(tween),
        }
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn domain(&self) -> Domain {
        self.state.domain
    }

    pub fn max_domain(&self) -> Domain {
        self.state.max_domain
    }

    pub fn is_animating(&self) -> bool {
        self.state.animation.is_active()
    }

    pub fn active_generation(&self) -> Option<u64> {
        self.state.animation.generation()
    }

    pub fn is_change_allowed(&self) -> bool {
        self.state.is_change_allowed()
    }

    pub fn is_zoom_in_possible(&self) -> bool {
        self.ladder.is_zoom_in_possible(self.state.domain)
    }

    pub fn is_zoom_out_possible(&self) -> bool {
        self.state.domain.width() < self.state.max_domain.width()
    }

    pub fn dispatch(&mut self, op: Operation) -> Outcome {
        let before = self.state;
        let ctx = Context {
            ladder: &self.ladder,
            scheduler: &self.scheduler,
        };
        let after = before.apply(&op, &ctx);

        let outcome = Outcome {
            domain_changed: before.domain.bits() != after.domain.bits(),
            tween_started: after.generation != before.generation,
            tween_finished: before.animation.is_active() && !after.animation.is_active(),
        };

        if let (true, AnimationState::Active(tween)) = (outcome.tween_started, after.animation) {
            debug!(
                generation = tween.generation,
                from = ?tween.from,
                to = ?tween.to,
                "viewport tween started"
            );
        } else if outcome.tween_finished {
            debug!(domain = ?after.domain, "viewport tween finished");
        } else if let Operation::Frame { generation, .. } = op {
            if before.animation.generation() != Some(generation) {
                trace!(generation, "stale animation frame discarded");
            }
        } else if !matches!(op, Operation::Hover(_)) && !outcome.domain_changed {
            trace!(?op, "viewport operation ignored");
        }

        self.state = after;
        outcome
    }

    pub fn load(&mut self, max_domain: Domain) -> Outcome {
        self.dispatch(Operation::Load(max_domain))
    }

    pub fn hover(&mut self, pointer_over_mark: bool) -> Outcome {
        self.dispatch(Operation::Hover(pointer_over_mark))
    }

    pub fn zoom_in(&mut self, cursor_ms: f64, now: Instant) -> Outcome {
        self.dispatch(Operation::ZoomIn { cursor_ms, now })
    }

    pub fn zoom_out(&mut self, cursor_ms: f64, now: Instant) -> Outcome {
        self.dispatch(Operation::ZoomOut { cursor_ms, now })
    }

    pub fn zoom_custom(
        &mut self,
        pixel_start: f32,
        pixel_end: f32,
        scale: TimeScale,
        now: Instant,
    ) -> Outcome {
        self.dispatch(Operation::ZoomCustom {
            pixel_start,
            pixel_end,
            scale,
            now,
        })
    }

    pub fn pan(&mut self, pixel_delta: f32, scale: TimeScale) -> Outcome {
        self.dispatch(Operation::Pan { pixel_delta, scale })
    }

    pub fn reset(&mut self, now: Instant) -> Outcome {
        self.dispatch(Operation::Reset { now })
    }

    pub fn frame(&mut self, generation: u64, now: Instant) -> Outcome {
        self.dispatch(Operation::Frame { generation, now })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimEdge {
    Start,
    End,
}

/// A user-adjustable sub-range of the visible domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    pub fn new(start: f64, end: f64) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Move the start edge to `pixel`, staying inside the domain and not
    /// past the end edge.
    #[must_use]
    pub fn trim_start(self, pixel: f32, scale: &TimeScale) -> TrimRange {
        let domain = scale.domain();
        let start = scale.to_ms(pixel).max(domain.start).min(self.end);
        TrimRange { start, ..self }
    }

    #[must_use]
    pub fn trim_end(self, pixel: f32, scale: &TimeScale) -> TrimRange {
        let domain = scale.domain();
        let end = scale.to_ms(pixel).min(domain.end).max(self.start);
        TrimRange { end, ..self }
    }

    #[must_use]
    pub fn move_edge(self, edge: TrimEdge, pixel: f32, scale: &TimeScale) -> TrimRange {
        match edge {
            TrimEdge::Start => self.trim_start(pixel, scale),
            TrimEdge::End => self.trim_end(pixel, scale),
        }
    }

    /// The edge within `tolerance` pixels of `pixel`, preferring the closer one.
    pub fn edge_near(&self, pixel: f32, scale: &TimeScale, tolerance: f32) -> Option<TrimEdge> {
        let start = (scale.to_px(self.start) - pixel).abs();
        let end = (scale.to_px(self.end) - pixel).abs();
        if start > tolerance && end > tolerance {
            None
        } else if start <= end {
            Some(TrimEdge::Start)
        } else {
            Some(TrimEdge::End)
        }
    }
}
