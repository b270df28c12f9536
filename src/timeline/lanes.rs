use crate::Message;
use crate::timeline::{Lane, LaneLayout};
use iced::mouse;
use iced::widget::canvas::{self, Action, Geometry, Program};
use iced::{Color, Event, Point, Rectangle, Renderer, Size, Theme};

/// Lane label column to the left of the events canvas.
pub(crate) struct LanesProgram<'a> {
    pub(crate) lanes: &'a [Lane],
    pub(crate) layout: &'a LaneLayout,
    /// Events per lane, parallel to `lanes`.
    pub(crate) counts: &'a [usize],
}

#[derive(Default)]
pub(crate) struct LanesState {
    hovered_lane: Option<usize>,
}

impl LanesProgram<'_> {
    fn lane_at(&self, position: Point) -> Option<usize> {
        lane_index_at(position.y, self.layout.lane_height(), self.lanes.len())
    }
}

fn lane_index_at(y: f32, lane_height: f32, lane_count: usize) -> Option<usize> {
    if !(lane_height > 0.0) || y < 0.0 {
        return None;
    }
    let index = (y / lane_height).floor() as usize;
    (index < lane_count).then_some(index)
}

impl Program<Message> for LanesProgram<'_> {
    type State = LanesState;

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        frame.fill_rectangle(
            Point::new(0.0, 0.0),
            Size::new(bounds.width, bounds.height),
            Color::from_rgb(0.98, 0.98, 0.98),
        );

        let lane_height = self.layout.lane_height();
        for (index, lane) in self.lanes.iter().enumerate() {
            let row_top = index as f32 * lane_height;
            let is_hovered = state.hovered_lane == Some(index);
            if is_hovered {
                frame.fill_rectangle(
                    Point::new(0.0, row_top),
                    Size::new(bounds.width, lane_height),
                    Color::from_rgb(0.94, 0.94, 0.94),
                );
            }

            frame.stroke(
                &canvas::Path::line(Point::new(0.0, row_top), Point::new(bounds.width, row_top)),
                canvas::Stroke::default()
                    .with_color(Color::from_rgb(0.9, 0.9, 0.9))
                    .with_width(1.0),
            );

            frame.fill_text(canvas::Text {
                content: lane.label.clone(),
                position: Point::new(8.0, row_top + lane_height / 2.0 - 8.0),
                color: if is_hovered {
                    Color::from_rgb(0.1, 0.2, 0.35)
                } else {
                    Color::from_rgb(0.2, 0.2, 0.2)
                },
                size: 12.0.into(),
                ..Default::default()
            });

            if let Some(count) = self.counts.get(index) {
                frame.fill_text(canvas::Text {
                    content: count.to_string(),
                    position: Point::new(bounds.width - 28.0, row_top + lane_height / 2.0 - 7.0),
                    color: Color::from_rgb(0.55, 0.55, 0.55),
                    size: 11.0.into(),
                    ..Default::default()
                });
            }
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Action<Message>> {
        if let Event::Mouse(mouse::Event::CursorMoved { .. } | mouse::Event::CursorLeft) = event {
            let hovered = cursor
                .position_in(bounds)
                .and_then(|position| self.lane_at(position));

            if hovered != state.hovered_lane {
                state.hovered_lane = hovered;
                return Some(Action::request_redraw());
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_lookup_by_band() {
        assert_eq!(lane_index_at(0.0, 40.0, 3), Some(0));
        assert_eq!(lane_index_at(39.9, 40.0, 3), Some(0));
        assert_eq!(lane_index_at(40.0, 40.0, 3), Some(1));
        assert_eq!(lane_index_at(119.0, 40.0, 3), Some(2));
        assert_eq!(lane_index_at(120.0, 40.0, 3), None);
        assert_eq!(lane_index_at(-1.0, 40.0, 3), None);
        assert_eq!(lane_index_at(10.0, 0.0, 3), None);
    }
}
