//! Pointer gestures on the events canvas.
//!
//! The canvas turns raw mouse input into [`Input`] values, probes what lies
//! under the pointer, and feeds both to [`Interaction::handle`]. The resulting
//! [`Gesture`]s are what the application reacts to; nothing here touches the
//! viewport directly.

use super::EventId;
use super::viewport::TrimEdge;
use iced::Point;
use std::time::{Duration, Instant};

/// Minimum horizontal travel before a press turns into a drag, and the
/// minimum width of a committed drag-to-zoom selection.
pub const DRAG_THRESHOLD: f32 = 4.0;
/// How close to a trim edge the pointer has to be to grab it.
pub const TRIM_TOLERANCE: f32 = 4.0;
pub const DOUBLE_CLICK: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Pan {
        last_x: f32,
    },
    ZoomCustom {
        anchor_x: f32,
        current_x: f32,
    },
    Trim {
        edge: TrimEdge,
    },
    TrimHover(TrimEdge),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Hover(Option<EventId>),
    Click(EventId),
    ZoomIn { cursor_x: f32 },
    ZoomOut { cursor_x: f32 },
    ZoomInCustom { start: f32, end: f32 },
    ZoomInCustomPreview { start: f32, end: f32 },
    ZoomReset,
    /// Pixel delta in domain direction: positive moves the view later in time.
    Pan(f32),
    TrimStart(f32),
    TrimEnd(f32),
    CursorMoved(f32),
    InteractionEnd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Moved(Point),
    Pressed { position: Point, shift: bool, now: Instant },
    Released(Point),
    Wheel { position: Point, lines: f32 },
    Left,
}

/// What lies under the pointer for the current input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Probe {
    pub mark: Option<EventId>,
    pub trim_edge: Option<TrimEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionFlags {
    pub zoom_in_possible: bool,
    pub zoom_out_possible: bool,
    pub animating: bool,
}

impl InteractionFlags {
    fn can_zoom_in(&self) -> bool {
        self.zoom_in_possible && !self.animating
    }

    fn can_zoom_out(&self) -> bool {
        self.zoom_out_possible && !self.animating
    }
}

#[derive(Debug, Default)]
pub struct Interaction {
    mode: InteractionMode,
    hovered: Option<EventId>,
    press: Option<Press>,
    last_press: Option<(Point, Instant)>,
}

#[derive(Debug, Clone)]
struct Press {
    position: Point,
    mark: Option<EventId>,
    dragged: bool,
}

impl Interaction {
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn hovered(&self) -> Option<&EventId> {
        self.hovered.as_ref()
    }

    /// The pending drag-to-zoom selection, as ordered pixel bounds.
    pub fn zoom_preview(&self) -> Option<(f32, f32)> {
        match self.mode {
            InteractionMode::ZoomCustom { anchor_x, current_x } => {
                Some((anchor_x.min(current_x), anchor_x.max(current_x)))
            }
            _ => None,
        }
    }

    pub fn handle(&mut self, input: Input, probe: Probe, flags: InteractionFlags) -> Vec<Gesture> {
        match input {
            Input::Moved(position) => self.moved(position, probe),
            Input::Pressed {
                position,
                shift,
                now,
            } => self.pressed(position, shift, now, probe, flags),
            Input::Released(position) => self.released(position, probe),
            Input::Wheel { position, lines } => {
                if lines > 0.0 && flags.can_zoom_in() {
                    vec![Gesture::ZoomIn {
                        cursor_x: position.x,
                    }]
                } else if lines < 0.0 && flags.can_zoom_out() {
                    vec![Gesture::ZoomOut {
                        cursor_x: position.x,
                    }]
                } else {
                    Vec::new()
                }
            }
            Input::Left => self.left(),
        }
    }

    fn moved(&mut self, position: Point, probe: Probe) -> Vec<Gesture> {
        let mut gestures = vec![Gesture::CursorMoved(position.x)];

        match self.mode {
            InteractionMode::Pan { last_x } => {
                let press = self.press.as_mut();
                let dragged = press.map_or(true, |press| {
                    press.dragged |= (position.x - press.position.x).abs() > DRAG_THRESHOLD;
                    press.dragged
                });
                if dragged {
                    let delta = last_x - position.x;
                    self.mode = InteractionMode::Pan { last_x: position.x };
                    if delta != 0.0 {
                        gestures.push(Gesture::Pan(delta));
                    }
                }
            }
            InteractionMode::ZoomCustom { anchor_x, .. } => {
                self.mode = InteractionMode::ZoomCustom {
                    anchor_x,
                    current_x: position.x,
                };
                gestures.push(Gesture::ZoomInCustomPreview {
                    start: anchor_x.min(position.x),
                    end: anchor_x.max(position.x),
                });
            }
            InteractionMode::Trim { edge } => gestures.push(match edge {
                TrimEdge::Start => Gesture::TrimStart(position.x),
                TrimEdge::End => Gesture::TrimEnd(position.x),
            }),
            InteractionMode::Idle | InteractionMode::TrimHover(_) => {
                self.mode = match probe.trim_edge {
                    Some(edge) => InteractionMode::TrimHover(edge),
                    None => InteractionMode::Idle,
                };
                if probe.mark != self.hovered {
                    self.hovered = probe.mark.clone();
                    gestures.push(Gesture::Hover(probe.mark));
                }
            }
        }

        gestures
    }

    fn pressed(
        &mut self,
        position: Point,
        shift: bool,
        now: Instant,
        probe: Probe,
        flags: InteractionFlags,
    ) -> Vec<Gesture> {
        let is_double = self.last_press.is_some_and(|(last, at)| {
            now.saturating_duration_since(at) <= DOUBLE_CLICK
                && (last.x - position.x).abs() <= DRAG_THRESHOLD
                && (last.y - position.y).abs() <= DRAG_THRESHOLD
        });
        if is_double {
            self.last_press = None;
            self.press = None;
            self.mode = InteractionMode::Idle;
            return if flags.animating {
                Vec::new()
            } else {
                vec![Gesture::ZoomReset]
            };
        }
        self.last_press = Some((position, now));

        self.mode = if let Some(edge) = probe.trim_edge {
            InteractionMode::Trim { edge }
        } else if shift && flags.can_zoom_in() {
            InteractionMode::ZoomCustom {
                anchor_x: position.x,
                current_x: position.x,
            }
        } else if !flags.animating {
            InteractionMode::Pan { last_x: position.x }
        } else {
            InteractionMode::Idle
        };
        self.press = Some(Press {
            position,
            mark: probe.mark,
            dragged: false,
        });
        Vec::new()
    }

    fn released(&mut self, position: Point, probe: Probe) -> Vec<Gesture> {
        let press = self.press.take();
        let mut gestures = Vec::new();

        match self.mode {
            InteractionMode::ZoomCustom { anchor_x, .. } => {
                if (position.x - anchor_x).abs() >= DRAG_THRESHOLD {
                    gestures.push(Gesture::ZoomInCustom {
                        start: anchor_x.min(position.x),
                        end: anchor_x.max(position.x),
                    });
                }
                gestures.push(Gesture::InteractionEnd);
            }
            InteractionMode::Trim { .. } => gestures.push(Gesture::InteractionEnd),
            InteractionMode::Pan { .. } | InteractionMode::Idle | InteractionMode::TrimHover(_) => {
                if let Some(Press {
                    mark: Some(pressed),
                    dragged: false,
                    ..
                }) = press
                {
                    if probe.mark.as_ref() == Some(&pressed) {
                        gestures.push(Gesture::Click(pressed));
                    }
                }
            }
        }

        self.mode = match probe.trim_edge {
            Some(edge) => InteractionMode::TrimHover(edge),
            None => InteractionMode::Idle,
        };
        gestures
    }

    fn left(&mut self) -> Vec<Gesture> {
        let mut gestures = Vec::new();
        if matches!(
            self.mode,
            InteractionMode::ZoomCustom { .. } | InteractionMode::Trim { .. }
        ) {
            gestures.push(Gesture::InteractionEnd);
        }
        if self.hovered.take().is_some() {
            gestures.push(Gesture::Hover(None));
        }
        self.mode = InteractionMode::Idle;
        self.press = None;
        gestures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> InteractionFlags {
        InteractionFlags {
            zoom_in_possible: true,
            zoom_out_possible: true,
            animating: false,
        }
    }

    fn on(mark: &str) -> Probe {
        Probe {
            mark: Some(mark.into()),
            trim_edge: None,
        }
    }

    fn press(x: f32, shift: bool, now: Instant) -> Input {
        Input::Pressed {
            position: Point::new(x, 10.0),
            shift,
            now,
        }
    }

    fn moved(x: f32) -> Input {
        Input::Moved(Point::new(x, 10.0))
    }

    fn released(x: f32) -> Input {
        Input::Released(Point::new(x, 10.0))
    }

    #[test]
    fn wheel_zooms_in_and_out_when_allowed() {
        let mut interaction = Interaction::default();
        let wheel = |lines| Input::Wheel {
            position: Point::new(120.0, 5.0),
            lines,
        };

        assert_eq!(
            interaction.handle(wheel(1.0), Probe::default(), flags()),
            vec![Gesture::ZoomIn { cursor_x: 120.0 }]
        );
        assert_eq!(
            interaction.handle(wheel(-1.0), Probe::default(), flags()),
            vec![Gesture::ZoomOut { cursor_x: 120.0 }]
        );

        let animating = InteractionFlags {
            animating: true,
            ..flags()
        };
        assert!(interaction.handle(wheel(1.0), Probe::default(), animating).is_empty());

        let at_limit = InteractionFlags {
            zoom_in_possible: false,
            ..flags()
        };
        assert!(interaction.handle(wheel(1.0), Probe::default(), at_limit).is_empty());
    }

    #[test]
    fn drag_pans_after_threshold_with_negated_delta() {
        let mut interaction = Interaction::default();
        let now = Instant::now();
        interaction.handle(press(100.0, false, now), Probe::default(), flags());

        let small = interaction.handle(moved(102.0), Probe::default(), flags());
        assert_eq!(small, vec![Gesture::CursorMoved(102.0)]);

        let drag = interaction.handle(moved(130.0), Probe::default(), flags());
        assert_eq!(drag, vec![Gesture::CursorMoved(130.0), Gesture::Pan(-30.0)]);

        let more = interaction.handle(moved(120.0), Probe::default(), flags());
        assert_eq!(more, vec![Gesture::CursorMoved(120.0), Gesture::Pan(10.0)]);

        assert!(interaction.handle(released(120.0), Probe::default(), flags()).is_empty());
        assert_eq!(interaction.mode(), InteractionMode::Idle);
    }

    #[test]
    fn shift_drag_previews_then_commits_zoom() {
        let mut interaction = Interaction::default();
        let now = Instant::now();
        interaction.handle(press(300.0, true, now), Probe::default(), flags());

        let preview = interaction.handle(moved(200.0), Probe::default(), flags());
        assert_eq!(
            preview[1],
            Gesture::ZoomInCustomPreview {
                start: 200.0,
                end: 300.0
            }
        );
        assert_eq!(interaction.zoom_preview(), Some((200.0, 300.0)));

        let done = interaction.handle(released(180.0), Probe::default(), flags());
        assert_eq!(
            done,
            vec![
                Gesture::ZoomInCustom {
                    start: 180.0,
                    end: 300.0
                },
                Gesture::InteractionEnd
            ]
        );
        assert_eq!(interaction.zoom_preview(), None);
    }

    #[test]
    fn short_shift_drag_is_discarded() {
        let mut interaction = Interaction::default();
        interaction.handle(press(300.0, true, Instant::now()), Probe::default(), flags());
        let done = interaction.handle(released(302.0), Probe::default(), flags());
        assert_eq!(done, vec![Gesture::InteractionEnd]);
    }

    #[test]
    fn click_requires_same_mark_and_no_drag() {
        let mut interaction = Interaction::default();
        let now = Instant::now();

        interaction.handle(press(50.0, false, now), on("a"), flags());
        assert_eq!(
            interaction.handle(released(51.0), on("a"), flags()),
            vec![Gesture::Click("a".into())]
        );

        let later = now + Duration::from_secs(1);
        interaction.handle(press(50.0, false, later), on("a"), flags());
        assert!(interaction.handle(released(50.0), on("b"), flags()).is_empty());

        let later = later + Duration::from_secs(1);
        interaction.handle(press(50.0, false, later), on("a"), flags());
        interaction.handle(moved(90.0), on("a"), flags());
        assert!(interaction.handle(released(90.0), on("a"), flags()).is_empty());
    }

    #[test]
    fn double_click_resets_zoom() {
        let mut interaction = Interaction::default();
        let now = Instant::now();
        interaction.handle(press(50.0, false, now), Probe::default(), flags());
        interaction.handle(released(50.0), Probe::default(), flags());

        let second = interaction.handle(
            press(51.0, false, now + Duration::from_millis(200)),
            Probe::default(),
            flags(),
        );
        assert_eq!(second, vec![Gesture::ZoomReset]);

        let third = interaction.handle(
            press(51.0, false, now + Duration::from_millis(300)),
            Probe::default(),
            flags(),
        );
        assert!(third.is_empty());
    }

    #[test]
    fn hover_reports_changes_only() {
        let mut interaction = Interaction::default();
        let first = interaction.handle(moved(10.0), on("a"), flags());
        assert_eq!(
            first,
            vec![Gesture::CursorMoved(10.0), Gesture::Hover(Some("a".into()))]
        );
        let same = interaction.handle(moved(11.0), on("a"), flags());
        assert_eq!(same, vec![Gesture::CursorMoved(11.0)]);

        let gone = interaction.handle(Input::Left, Probe::default(), flags());
        assert_eq!(gone, vec![Gesture::Hover(None)]);
        assert_eq!(interaction.hovered(), None);
    }

    #[test]
    fn trim_edges_take_priority_over_pan() {
        let mut interaction = Interaction::default();
        let near_start = Probe {
            mark: None,
            trim_edge: Some(TrimEdge::Start),
        };

        interaction.handle(moved(20.0), near_start.clone(), flags());
        assert_eq!(interaction.mode(), InteractionMode::TrimHover(TrimEdge::Start));

        interaction.handle(press(20.0, false, Instant::now()), near_start.clone(), flags());
        assert_eq!(
            interaction.mode(),
            InteractionMode::Trim {
                edge: TrimEdge::Start
            }
        );

        let drag = interaction.handle(moved(60.0), Probe::default(), flags());
        assert_eq!(drag, vec![Gesture::CursorMoved(60.0), Gesture::TrimStart(60.0)]);

        let done = interaction.handle(released(60.0), Probe::default(), flags());
        assert_eq!(done, vec![Gesture::InteractionEnd]);
        assert_eq!(interaction.mode(), InteractionMode::Idle);
    }

    #[test]
    fn no_pan_while_animating() {
        let mut interaction = Interaction::default();
        let animating = InteractionFlags {
            animating: true,
            ..flags()
        };
        interaction.handle(press(100.0, false, Instant::now()), Probe::default(), animating);
        let moved = interaction.handle(moved(200.0), Probe::default(), animating);
        assert_eq!(moved, vec![Gesture::CursorMoved(200.0)]);
    }
}
