use crate::Message;
use crate::tooltip::{self, TooltipStyle};
use iced::mouse;
use iced::widget::canvas::{self, Geometry, Program};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme, Vector, keyboard};
use std::cell::RefCell;
use std::time::Instant;

use super::interaction::{Input, Interaction, InteractionFlags, InteractionMode, Probe, TRIM_TOLERANCE};
use super::layering::{MarkLayers, MarkRenderer, MarkShape, MarkStroke, Pass, Visual};
use super::ticks::{TICK_SPACING, ticks};
use super::viewport::{TrimEdge, TrimRange};
use super::{Domain, EventSet, LaneLayout, TimeScale};

fn paint_visual(frame: &mut canvas::Frame, visual: &Visual) {
    let path = match visual.shape {
        MarkShape::Circle { center, radius } => canvas::Path::circle(center, radius),
        MarkShape::Rect(rect) => canvas::Path::rectangle(rect.position(), rect.size()),
    };

    frame.fill(&path, visual.fill);
    if let Some(stroke) = visual.stroke {
        frame.stroke(
            &path,
            canvas::Stroke::default()
                .with_color(stroke.color)
                .with_width(stroke.width),
        );
    }
}

/// What the pointer is over: the top-most mark and any grabbable trim edge.
fn probe_at(
    layers: &MarkLayers,
    trim: Option<TrimRange>,
    scale: &TimeScale,
    position: Point,
) -> Probe {
    let trim_edge = if scale.is_degenerate() {
        None
    } else {
        trim.and_then(|trim| trim.edge_near(position.x, scale, TRIM_TOLERANCE))
    };
    Probe {
        mark: layers.hit_test(position).cloned(),
        trim_edge,
    }
}

pub struct EventsProgram<'a> {
    pub events: &'a EventSet,
    pub layout: &'a LaneLayout,
    pub domain: Domain,
    pub renderer: &'a dyn MarkRenderer,
    pub background: Color,
    pub selection: Color,
    pub pinned: MarkStroke,
    pub flags: InteractionFlags,
    pub trim: Option<TrimRange>,
    /// Per-frame offset from the tooltip-follow mechanism. Zero when tooltips
    /// are painted in this canvas's own frame.
    pub tooltip_tracking: Vector,
}

#[derive(Default)]
pub struct EventsState {
    modifiers: keyboard::Modifiers,
    interaction: Interaction,
    layers: RefCell<MarkLayers>,
    grid: canvas::Cache,
    background: canvas::Cache,
    foreground: canvas::Cache,
    selection: canvas::Cache,
}

impl EventsState {
    fn cache(&self, pass: Pass) -> &canvas::Cache {
        match pass {
            Pass::Background => &self.background,
            Pass::Foreground => &self.foreground,
            Pass::Selection => &self.selection,
        }
    }
}

impl EventsProgram<'_> {
    fn draw_overlay(
        &self,
        state: &EventsState,
        layers: &MarkLayers,
        frame: &mut canvas::Frame,
        scale: &TimeScale,
        bounds: Rectangle,
    ) {
        if let Some(trim) = self.trim {
            let start = scale.to_px(trim.start).max(0.0);
            let end = scale.to_px(trim.end).min(bounds.width);
            let shade = Color::from_rgba(0.0, 0.0, 0.0, 0.08);
            frame.fill_rectangle(Point::ORIGIN, Size::new(start, bounds.height), shade);
            frame.fill_rectangle(
                Point::new(end, 0.0),
                Size::new((bounds.width - end).max(0.0), bounds.height),
                shade,
            );

            let active = match state.interaction.mode() {
                InteractionMode::Trim { edge } | InteractionMode::TrimHover(edge) => Some(edge),
                _ => None,
            };
            for (edge, x) in [
                (TrimEdge::Start, start),
                (TrimEdge::End, end),
            ] {
                frame.stroke(
                    &canvas::Path::line(Point::new(x, 0.0), Point::new(x, bounds.height)),
                    canvas::Stroke::default()
                        .with_color(self.selection)
                        .with_width(if active == Some(edge) { 3.0 } else { 1.5 }),
                );
            }
        }

        if let Some((start, end)) = state.interaction.zoom_preview() {
            let rect = Rectangle::new(
                Point::new(start, 0.0),
                Size::new(end - start, bounds.height),
            );
            frame.fill_rectangle(
                rect.position(),
                rect.size(),
                Color {
                    a: 0.15,
                    ..self.selection
                },
            );
            frame.stroke(
                &canvas::Path::rectangle(rect.position(), rect.size()),
                canvas::Stroke::default()
                    .with_color(self.selection)
                    .with_width(1.0),
            );
        }

        let Some(hovered) = state.interaction.hovered() else {
            return;
        };
        let (Some(event), Some(visual)) = (self.events.get(hovered), layers.visual_for(hovered))
        else {
            return;
        };

        let outline = visual.bounds;
        frame.stroke(
            &canvas::Path::rectangle(
                Point::new(outline.x - 1.0, outline.y - 1.0),
                Size::new(outline.width + 2.0, outline.height + 2.0),
            ),
            canvas::Stroke::default()
                .with_color(Color::from_rgba(0.0, 0.0, 0.0, 0.3))
                .with_width(1.0),
        );

        let style = TooltipStyle::default();
        if let Some(layout) = tooltip::tooltip_for(
            event,
            visual,
            self.tooltip_tracking,
            bounds.width,
            style.padding,
        ) {
            tooltip::draw(frame, &layout, &style);
        }
    }
}

impl Program<Message> for EventsProgram<'_> {
    type State = EventsState;

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let scale = TimeScale::new(self.domain, bounds.width);
        let mut layers = state.layers.borrow_mut();
        layers.set_pinned(self.pinned);
        let invalidation = layers.sync(self.events, self.layout, scale, self.renderer);

        if invalidation.background {
            state.grid.clear();
        }
        for (pass, dirty) in [
            (Pass::Background, invalidation.background),
            (Pass::Foreground, invalidation.foreground),
            (Pass::Selection, invalidation.selection),
        ] {
            if dirty {
                state.cache(pass).clear();
            }
        }

        let grid = state.grid.draw(renderer, bounds.size(), |frame| {
            frame.fill_rectangle(Point::ORIGIN, bounds.size(), self.background);

            if scale.is_degenerate() {
                frame.fill_text(canvas::Text {
                    content: "No events to display".to_string(),
                    position: Point::new(bounds.width / 2.0 - 60.0, bounds.height / 2.0 - 8.0),
                    color: Color::from_rgb(0.5, 0.5, 0.5),
                    size: 13.0.into(),
                    ..Default::default()
                });
                return;
            }

            // Faint vertical lines matching the header ticks.
            let (_, ticks) = ticks(&scale, TICK_SPACING);
            for tick in ticks {
                frame.stroke(
                    &canvas::Path::line(
                        Point::new(tick.x, 0.0),
                        Point::new(tick.x, bounds.height),
                    ),
                    canvas::Stroke::default()
                        .with_color(Color::from_rgba(0.5, 0.5, 0.5, 0.3))
                        .with_width(1.0),
                );
            }

            let lane_height = self.layout.lane_height();
            let mut row = 0.0;
            while row <= self.layout.total_height() && lane_height > 0.0 {
                frame.stroke(
                    &canvas::Path::line(Point::new(0.0, row), Point::new(bounds.width, row)),
                    canvas::Stroke::default()
                        .with_color(Color::from_rgb(0.9, 0.9, 0.9))
                        .with_width(1.0),
                );
                row += lane_height;
            }
        });

        let mut geometries = vec![grid];
        for pass in Pass::PAINT_ORDER {
            geometries.push(state.cache(pass).draw(renderer, bounds.size(), |frame| {
                for visual in layers.pass(pass) {
                    paint_visual(frame, visual);
                }
            }));
        }

        let mut overlay = canvas::Frame::new(renderer, bounds.size());
        if !scale.is_degenerate() {
            self.draw_overlay(state, &layers, &mut overlay, &scale, bounds);
        }
        geometries.push(overlay.into_geometry());
        geometries
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: &iced::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        let relative = |position: Point| Point::new(position.x - bounds.x, position.y - bounds.y);
        let engaged = !matches!(
            state.interaction.mode(),
            InteractionMode::Idle | InteractionMode::TrimHover(_)
        );

        let input = match event {
            iced::Event::Keyboard(keyboard::Event::ModifiersChanged(modifiers)) => {
                state.modifiers = *modifiers;
                return None;
            }
            iced::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                match (cursor.position_in(bounds), cursor.position()) {
                    (Some(position), _) => Input::Moved(position),
                    // Keep tracking drags that leave the canvas.
                    (None, Some(position)) if engaged => Input::Moved(relative(position)),
                    _ => Input::Left,
                }
            }
            iced::Event::Mouse(mouse::Event::CursorLeft) => Input::Left,
            iced::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let position = cursor.position_in(bounds)?;
                Input::Pressed {
                    position,
                    shift: state.modifiers.shift(),
                    now: Instant::now(),
                }
            }
            iced::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                match (cursor.position_in(bounds), cursor.position()) {
                    (Some(position), _) => Input::Released(position),
                    (None, Some(position)) if engaged => Input::Released(relative(position)),
                    _ => Input::Left,
                }
            }
            iced::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                let position = cursor.position_in(bounds)?;
                let (mouse::ScrollDelta::Lines { y, .. } | mouse::ScrollDelta::Pixels { y, .. }) =
                    *delta;
                if y == 0.0 {
                    return None;
                }
                Input::Wheel {
                    position,
                    lines: y.signum(),
                }
            }
            _ => return None,
        };

        let scale = TimeScale::new(self.domain, bounds.width);
        let probe = match input {
            Input::Moved(position) | Input::Pressed { position, .. } | Input::Released(position) => {
                probe_at(&state.layers.borrow(), self.trim, &scale, position)
            }
            Input::Wheel { .. } | Input::Left => Probe::default(),
        };

        let is_wheel = matches!(input, Input::Wheel { .. });
        let gestures = state.interaction.handle(input, probe, self.flags);
        if gestures.is_empty() {
            return engaged.then(canvas::Action::request_redraw);
        }

        let action = canvas::Action::publish(Message::Canvas {
            gestures,
            width: bounds.width,
        });
        Some(if is_wheel || engaged {
            action.and_capture()
        } else {
            action
        })
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        match state.interaction.mode() {
            InteractionMode::Pan { .. } => mouse::Interaction::Grabbing,
            InteractionMode::ZoomCustom { .. } => mouse::Interaction::Crosshair,
            InteractionMode::Trim { .. } | InteractionMode::TrimHover(_) => {
                mouse::Interaction::ResizingHorizontally
            }
            InteractionMode::Idle if state.interaction.hovered().is_some() => {
                mouse::Interaction::Pointer
            }
            InteractionMode::Idle if cursor.is_over(bounds) => mouse::Interaction::Grab,
            InteractionMode::Idle => mouse::Interaction::default(),
        }
    }
}
