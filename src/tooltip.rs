//! Placement and painting of event tooltips on the timeline canvas.
//!
//! Tooltips are anchored to the event mark, not to the live pointer: point
//! tooltips follow the mark's own x (minus the host's tracking offset) and
//! period tooltips sit over the visible part of the span. The box is shifted
//! by a linear map of the anchor so it stays readable near either edge.

use crate::timeline::TimelineEvent;
use crate::timeline::layering::{MarkShape, Visual};
use iced::widget::canvas;
use iced::{Border, Color, Point, Rectangle, Size, Vector};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const SAFETY_MARGIN: f32 = 15.0;
pub const TOOLTIP_HEIGHT: f32 = 30.0;
pub const VERTICAL_PADDING: f32 = 12.0;
pub const ARROW_SIZE: f32 = 20.0;

const TEXT_SIZE: f32 = 11.0;
/// Rough advance of one terminal column at `TEXT_SIZE`.
const COLUMN_ADVANCE: f32 = 6.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipKind {
    Period,
    Point,
}

impl TooltipKind {
    pub fn for_event(event: &TimelineEvent) -> Self {
        if event.is_period() {
            TooltipKind::Period
        } else {
            TooltipKind::Point
        }
    }

    pub fn box_width(self) -> f32 {
        match self {
            TooltipKind::Period => 180.0,
            TooltipKind::Point => 100.0,
        }
    }
}

/// Linear map from an anchor in `[0, parent_width]` to an offset inside the
/// box in `[SAFETY_MARGIN, box_width - SAFETY_MARGIN]`.
pub fn clamp_offset(anchor_x: f32, parent_width: f32, box_width: f32) -> f32 {
    let low = SAFETY_MARGIN;
    let high = box_width - SAFETY_MARGIN;
    if !(parent_width > 0.0) || !anchor_x.is_finite() {
        return (low + high) / 2.0;
    }
    let t = (anchor_x / parent_width).clamp(0.0, 1.0);
    low + t * (high - low)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipLayout {
    pub kind: TooltipKind,
    pub bounds: Rectangle,
    pub arrow_box: Rectangle,
    /// Left corner, right corner, tip.
    pub arrow: [Point; 3],
    pub text: String,
    pub text_origin: Point,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TooltipStyle {
    pub background: Color,
    pub border: Border,
    pub shadow_color: Color,
    pub shadow_offset: Vector,
    pub padding: f32,
    pub text_color: Color,
}

impl Default for TooltipStyle {
    fn default() -> Self {
        Self {
            background: Color::from_rgb(1.0, 1.0, 1.0),
            border: Border {
                color: Color::from_rgba(0.0, 0.0, 0.0, 0.35),
                width: 1.0,
                radius: 4.0.into(),
            },
            shadow_color: Color::from_rgba(0.0, 0.0, 0.0, 0.15),
            shadow_offset: Vector::new(2.0, 2.0),
            padding: 6.0,
            text_color: Color::from_rgb(0.2, 0.2, 0.2),
        }
    }
}

/// Lay out the tooltip for `visual`.
///
/// `tracking` is the per-frame offset supplied by the host's tooltip-follow
/// mechanism; only point tooltips use its x component.
pub fn layout(
    kind: TooltipKind,
    visual: &Visual,
    text: &str,
    tracking: Vector,
    parent_width: f32,
    padding: f32,
) -> TooltipLayout {
    let (anchor_x, event_y) = match (kind, visual.shape) {
        (TooltipKind::Point, MarkShape::Circle { center, .. }) => (center.x - tracking.x, center.y),
        (TooltipKind::Point, MarkShape::Rect(rect)) => (rect.center_x() - tracking.x, rect.center_y()),
        (TooltipKind::Period, shape) => {
            let rect = shape.bounds();
            let left = rect.x.max(0.0);
            let right = (rect.x + rect.width).min(parent_width.max(0.0));
            let center = ((left + right) / 2.0).max(0.0).min(parent_width.max(0.0));
            (center, rect.center_y())
        }
    };

    let width = kind.box_width();
    let left = anchor_x - clamp_offset(anchor_x, parent_width, width);
    let top = event_y - (TOOLTIP_HEIGHT + VERTICAL_PADDING) + tracking.y;
    let bounds = Rectangle::new(Point::new(left, top), Size::new(width, TOOLTIP_HEIGHT));

    let arrow_box = Rectangle::new(
        Point::new(anchor_x - ARROW_SIZE / 2.0, top + TOOLTIP_HEIGHT),
        Size::new(ARROW_SIZE, ARROW_SIZE),
    );
    let arrow = [
        Point::new(arrow_box.x, arrow_box.y),
        Point::new(arrow_box.x + ARROW_SIZE, arrow_box.y),
        Point::new(anchor_x, arrow_box.y + ARROW_SIZE / 2.0),
    ];

    TooltipLayout {
        kind,
        bounds,
        arrow_box,
        arrow,
        text: truncate_to_width(text, width - padding * 2.0),
        text_origin: Point::new(left + padding, top + (TOOLTIP_HEIGHT - TEXT_SIZE) / 2.0 - 1.0),
    }
}

/// Tooltip for a hovered event; events without tooltip text get none.
pub fn tooltip_for(
    event: &TimelineEvent,
    visual: &Visual,
    tracking: Vector,
    parent_width: f32,
    padding: f32,
) -> Option<TooltipLayout> {
    let text = event.tooltip.as_deref().filter(|text| !text.trim().is_empty())?;
    Some(layout(
        TooltipKind::for_event(event),
        visual,
        text,
        tracking,
        parent_width,
        padding,
    ))
}

/// Cut `text` to fit `max_width` pixels, ending with an ellipsis when cut.
pub fn truncate_to_width(text: &str, max_width: f32) -> String {
    let columns = (max_width / COLUMN_ADVANCE).floor().max(0.0) as usize;
    if text.width() <= columns {
        return text.to_string();
    }
    if columns == 0 {
        return String::new();
    }

    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > columns - 1 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

pub(crate) fn draw(frame: &mut canvas::Frame, layout: &TooltipLayout, style: &TooltipStyle) {
    let shadow = layout.bounds + style.shadow_offset;
    frame.fill_rectangle(shadow.position(), shadow.size(), style.shadow_color);

    let body = canvas::Path::rounded_rectangle(
        layout.bounds.position(),
        layout.bounds.size(),
        style.border.radius,
    );
    frame.fill(&body, style.background);
    frame.stroke(
        &body,
        canvas::Stroke::default()
            .with_color(style.border.color)
            .with_width(style.border.width),
    );

    let [left, right, tip] = layout.arrow;
    let arrow = canvas::Path::new(|builder| {
        builder.move_to(left);
        builder.line_to(tip);
        builder.line_to(right);
    });
    frame.fill(&arrow, style.background);
    frame.stroke(
        &arrow,
        canvas::Stroke::default()
            .with_color(style.border.color)
            .with_width(style.border.width),
    );

    frame.fill_text(canvas::Text {
        content: layout.text.clone(),
        position: layout.text_origin,
        color: style.text_color,
        size: TEXT_SIZE.into(),
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::layering::MarkShape;

    fn point_visual(x: f32, y: f32) -> Visual {
        Visual::new(
            "p".into(),
            MarkShape::Circle {
                center: Point::new(x, y),
                radius: 6.0,
            },
            Color::BLACK,
            None,
        )
    }

    fn period_visual(x: f32, width: f32, y: f32) -> Visual {
        Visual::new(
            "s".into(),
            MarkShape::Rect(Rectangle::new(
                Point::new(x, y - 6.0),
                Size::new(width, 12.0),
            )),
            Color::BLACK,
            None,
        )
    }

    #[test]
    fn offset_stays_inside_safety_margins() {
        let parent_width = 640.0;
        for kind in [TooltipKind::Period, TooltipKind::Point] {
            let box_width = kind.box_width();
            for step in 0..=64 {
                let x = parent_width * step as f32 / 64.0;
                let offset = clamp_offset(x, parent_width, box_width);
                assert!(offset >= SAFETY_MARGIN - 1e-4, "{offset} at {x}");
                assert!(offset <= box_width - SAFETY_MARGIN + 1e-4, "{offset} at {x}");
            }
        }
        assert_eq!(clamp_offset(0.0, 640.0, 100.0), 15.0);
        assert_eq!(clamp_offset(640.0, 640.0, 100.0), 85.0);
    }

    #[test]
    fn point_tooltip_follows_mark_minus_tracking() {
        let visual = point_visual(320.0, 100.0);
        let layout = layout(
            TooltipKind::Point,
            &visual,
            "hello",
            Vector::new(20.0, 0.0),
            640.0,
            6.0,
        );

        assert_eq!(layout.bounds.width, 100.0);
        assert_eq!(layout.arrow[2].x, 300.0);
        let offset = clamp_offset(300.0, 640.0, 100.0);
        assert_eq!(layout.bounds.x, 300.0 - offset);
    }

    #[test]
    fn box_sits_above_the_mark() {
        let visual = point_visual(50.0, 100.0);
        let layout = layout(TooltipKind::Point, &visual, "x", Vector::new(0.0, 5.0), 640.0, 6.0);

        assert_eq!(layout.bounds.height, TOOLTIP_HEIGHT);
        assert_eq!(layout.bounds.y, 100.0 - 42.0 + 5.0);
        assert_eq!(layout.arrow_box.y, layout.bounds.y + TOOLTIP_HEIGHT);
        assert_eq!(layout.arrow_box.size(), Size::new(20.0, 20.0));
    }

    #[test]
    fn period_tooltip_anchors_to_visible_span() {
        let visual = period_visual(-500.0, 700.0, 80.0);
        let layout = layout(
            TooltipKind::Period,
            &visual,
            "long",
            Vector::new(99.0, 0.0),
            640.0,
            6.0,
        );

        assert_eq!(layout.bounds.width, 180.0);
        assert_eq!(layout.arrow[2].x, 100.0);
    }

    #[test]
    fn arrow_tip_stays_inside_box_horizontally() {
        for x in [0.0, 3.0, 320.0, 637.0, 640.0] {
            let visual = point_visual(x, 60.0);
            let layout = layout(TooltipKind::Point, &visual, "x", Vector::ZERO, 640.0, 6.0);
            let tip = layout.arrow[2].x;
            assert!(tip >= layout.bounds.x + SAFETY_MARGIN - 1e-3);
            assert!(tip <= layout.bounds.x + layout.bounds.width - SAFETY_MARGIN + 1e-3);
        }
    }

    #[test]
    fn long_text_is_truncated_with_ellipsis() {
        assert_eq!(truncate_to_width("short", 88.0), "short");

        let cut = truncate_to_width("a very long tooltip that cannot fit", 88.0);
        assert!(cut.ends_with('…'));
        assert!(cut.width() <= 13);

        assert_eq!(truncate_to_width("wide", 0.0), "");
    }

    #[test]
    fn events_without_text_get_no_tooltip() {
        let visual = point_visual(100.0, 60.0);
        let bare = TimelineEvent::instant("x", "l", 1.0);
        assert_eq!(tooltip_for(&bare, &visual, Vector::ZERO, 640.0, 6.0), None);

        let blank = TimelineEvent::instant("x", "l", 1.0).with_tooltip("  ");
        assert_eq!(tooltip_for(&blank, &visual, Vector::ZERO, 640.0, 6.0), None);

        let labelled = TimelineEvent::instant("x", "l", 1.0).with_tooltip("Deploy");
        let layout = tooltip_for(&labelled, &visual, Vector::ZERO, 640.0, 6.0).unwrap();
        assert_eq!(layout.kind, TooltipKind::Point);
        assert_eq!(layout.text, "Deploy");
    }

    #[test]
    fn kind_follows_event_shape() {
        assert_eq!(
            TooltipKind::for_event(&TimelineEvent::instant("a", "l", 1.0)),
            TooltipKind::Point
        );
        assert_eq!(
            TooltipKind::for_event(&TimelineEvent::period("a", "l", 1.0, 2.0)),
            TooltipKind::Period
        );
    }
}
