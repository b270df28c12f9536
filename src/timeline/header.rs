// Time axis drawn above the events canvas, sharing its mapping.
use crate::Message;
use crate::timeline::{Domain, TimeScale};
use crate::timeline::ticks::{TICK_SPACING, format_time_label, ticks};
use crate::timeline::viewport::TrimRange;
use iced::mouse;
use iced::widget::canvas::{self, Geometry, Program};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

pub(crate) struct HeaderProgram {
    pub(crate) domain: Domain,
    pub(crate) trim: Option<TrimRange>,
}

impl Program<Message> for HeaderProgram {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        frame.fill_rectangle(
            Point::new(0.0, 0.0),
            Size::new(bounds.width, bounds.height),
            Color::from_rgb(0.95, 0.95, 0.95),
        );

        let scale = TimeScale::new(self.domain, bounds.width);
        let (interval, ticks) = ticks(&scale, TICK_SPACING);
        let layer_height = bounds.height / 2.0;

        // Top layer: the date of the left edge, so clock-only labels stay anchored.
        if !ticks.is_empty() {
            frame.fill_text(canvas::Text {
                content: format_time_label(scale.to_ms(0.0), 86_400_000.0),
                position: Point::new(4.0, 4.0),
                color: Color::from_rgb(0.2, 0.2, 0.2),
                size: 11.0.into(),
                ..Default::default()
            });
        }

        for tick in &ticks {
            frame.fill_text(canvas::Text {
                content: format_time_label(tick.ms, interval),
                position: Point::new(tick.x + 2.0, layer_height + 4.0),
                color: Color::from_rgb(0.3, 0.3, 0.3),
                size: 11.0.into(),
                ..Default::default()
            });

            frame.stroke(
                &canvas::Path::line(
                    Point::new(tick.x, layer_height),
                    Point::new(tick.x, bounds.height),
                ),
                canvas::Stroke::default()
                    .with_color(Color::from_rgb(0.36, 0.36, 0.36))
                    .with_width(0.8),
            );
        }

        if let Some(trim) = self.trim.filter(|_| !scale.is_degenerate()) {
            let start = scale.to_px(trim.start);
            let end = scale.to_px(trim.end);
            frame.fill_rectangle(
                Point::new(start, 0.0),
                Size::new((end - start).max(0.0), 3.0),
                Color::from_rgb(0.0, 0.4, 0.8),
            );
        }

        frame.stroke(
            &canvas::Path::line(
                Point::new(0.0, layer_height),
                Point::new(bounds.width, layer_height),
            ),
            canvas::Stroke::default()
                .with_color(Color::from_rgb(0.85, 0.85, 0.85))
                .with_width(0.5),
        );

        vec![frame.into_geometry()]
    }
}
