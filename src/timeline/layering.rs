//! Draw-order protocol for event marks.
//!
//! Marks are produced in three passes, painted in this order:
//!
//! 1. background: one opaque shape per visible event in original order, so
//!    grid lines never show through the translucent marks above it;
//! 2. foreground: every visible event, longest first, so short periods and
//!    instants land on top of the long spans they overlap;
//! 3. selection: only selected events, again longest first, so a selected
//!    mark is never hidden by a later foreground mark.
//!
//! Passes 1 and 2 are keyed on the event geometry (everything but
//! `is_selected`), the lane layout and the mapping. Pass 3 additionally keys on
//! the selection revision. Flipping only a selection flag therefore leaves the
//! foreground pass as it was, including whatever highlight it last rendered.

use super::{EventId, EventSet, LaneLayout, TimeScale, TimelineEvent, color_from_label};
use iced::{Color, Point, Rectangle, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Background,
    Foreground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Background,
    Foreground,
    Selection,
}

impl Pass {
    pub const PAINT_ORDER: [Pass; 3] = [Pass::Background, Pass::Foreground, Pass::Selection];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkShape {
    Circle { center: Point, radius: f32 },
    Rect(Rectangle),
}

impl MarkShape {
    pub fn bounds(&self) -> Rectangle {
        match *self {
            MarkShape::Circle { center, radius } => Rectangle {
                x: center.x - radius,
                y: center.y - radius,
                width: radius * 2.0,
                height: radius * 2.0,
            },
            MarkShape::Rect(rect) => rect,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkStroke {
    pub color: Color,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub event_id: EventId,
    pub shape: MarkShape,
    pub fill: Color,
    pub stroke: Option<MarkStroke>,
    /// Hit-test area; the whole box counts, not just the painted shape.
    pub bounds: Rectangle,
}

impl Visual {
    pub fn new(event_id: EventId, shape: MarkShape, fill: Color, stroke: Option<MarkStroke>) -> Self {
        Self {
            event_id,
            bounds: shape.bounds(),
            shape,
            fill,
            stroke,
        }
    }

    fn is_finite(&self) -> bool {
        let b = self.bounds;
        b.x.is_finite() && b.y.is_finite() && b.width.is_finite() && b.height.is_finite()
    }
}

/// Produces the visual for one event in one role.
pub trait MarkRenderer {
    fn render(
        &self,
        event: &TimelineEvent,
        role: Role,
        scale: &TimeScale,
        lane_y: f32,
    ) -> Option<Visual>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkPalette {
    pub background: Color,
    pub selection: Color,
    pub pinned_outline: Color,
    /// Fill for events without their own color; `None` derives one from the id.
    pub default_event: Option<Color>,
    pub foreground_opacity: f32,
    pub marker_height: f32,
}

impl Default for MarkPalette {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            selection: Color::from_rgb(0.0, 0.4, 0.8),
            pinned_outline: Color::from_rgb(0.85, 0.35, 0.0),
            default_event: None,
            foreground_opacity: 0.5,
            marker_height: 12.0,
        }
    }
}

impl MarkPalette {
    pub fn pinned_stroke(&self) -> MarkStroke {
        MarkStroke {
            color: self.pinned_outline,
            width: 2.0,
        }
    }
}

/// Circle for instants, lane-centred bar for periods.
pub fn mark_shape(event: &TimelineEvent, scale: &TimeScale, lane_y: f32, marker_height: f32) -> MarkShape {
    let x0 = scale.to_px(event.start_ms);
    let Some(end_ms) = event.end_ms else {
        return MarkShape::Circle {
            center: Point::new(x0, lane_y),
            radius: marker_height / 2.0,
        };
    };

    // Keep far off-screen edges bounded; only the visible part matters.
    let (r0, r1) = scale.range();
    let margin = r1 - r0;
    let x0 = x0.clamp(r0 - margin, r1 + margin);
    let x1 = scale.to_px(end_ms).clamp(r0 - margin, r1 + margin);
    MarkShape::Rect(Rectangle::new(
        Point::new(x0.min(x1), lane_y - marker_height / 2.0),
        Size::new((x1 - x0).abs().max(1.0), marker_height),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DefaultRenderer {
    pub palette: MarkPalette,
}

impl DefaultRenderer {
    pub fn new(palette: MarkPalette) -> Self {
        Self { palette }
    }
}

impl MarkRenderer for DefaultRenderer {
    fn render(
        &self,
        event: &TimelineEvent,
        role: Role,
        scale: &TimeScale,
        lane_y: f32,
    ) -> Option<Visual> {
        let palette = &self.palette;
        let shape = mark_shape(event, scale, lane_y, palette.marker_height);

        let (fill, stroke) = match role {
            Role::Background => (palette.background, None),
            Role::Foreground if event.is_selected => (
                palette.selection,
                Some(MarkStroke {
                    color: Color::from_rgba(0.0, 0.0, 0.0, 0.6),
                    width: 1.5,
                }),
            ),
            Role::Foreground => {
                let base = event
                    .color
                    .or(palette.default_event)
                    .unwrap_or_else(|| color_from_label(&event.id.0));
                (
                    Color {
                        a: base.a * palette.foreground_opacity,
                        ..base
                    },
                    Some(MarkStroke {
                        color: base,
                        width: 1.0,
                    }),
                )
            }
        };

        Some(Visual::new(event.id.clone(), shape, fill, stroke))
    }
}

/// Which passes were recomputed by a [`MarkLayers::sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Invalidation {
    pub background: bool,
    pub foreground: bool,
    pub selection: bool,
}

impl Invalidation {
    pub fn any(&self) -> bool {
        self.background || self.foreground || self.selection
    }
}

#[derive(Debug, Clone)]
struct GeometryKey {
    revision: u64,
    layout: LaneLayout,
    scale: TimeScale,
}

impl GeometryKey {
    fn matches(&self, other: &GeometryKey) -> bool {
        self.revision == other.revision
            && self.layout == other.layout
            && self.scale.same_as(&other.scale)
    }
}

#[derive(Debug)]
pub struct MarkLayers {
    pinned: MarkStroke,
    visible: Vec<usize>,
    background: Vec<Visual>,
    foreground: Vec<Visual>,
    selection: Vec<Visual>,
    geometry_key: Option<GeometryKey>,
    selection_revision: Option<u64>,
}

impl Default for MarkLayers {
    fn default() -> Self {
        Self::new(MarkPalette::default().pinned_stroke())
    }
}

impl MarkLayers {
    pub fn new(pinned: MarkStroke) -> Self {
        Self {
            pinned,
            visible: Vec::new(),
            background: Vec::new(),
            foreground: Vec::new(),
            selection: Vec::new(),
            geometry_key: None,
            selection_revision: None,
        }
    }

    /// Change the pinned outline. Forces a full recompute on the next sync.
    pub fn set_pinned(&mut self, pinned: MarkStroke) {
        if self.pinned != pinned {
            self.pinned = pinned;
            self.geometry_key = None;
        }
    }

    /// Bring the passes up to date, recomputing only those whose key moved.
    pub fn sync(
        &mut self,
        events: &EventSet,
        layout: &LaneLayout,
        scale: TimeScale,
        renderer: &dyn MarkRenderer,
    ) -> Invalidation {
        let key = GeometryKey {
            revision: events.geometry_revision(),
            layout: layout.clone(),
            scale,
        };
        let geometry_dirty = !self
            .geometry_key
            .as_ref()
            .is_some_and(|current| current.matches(&key));
        let selection_dirty =
            geometry_dirty || self.selection_revision != Some(events.selection_revision());

        let all = events.events();
        if geometry_dirty {
            self.visible = if scale.is_degenerate() {
                Vec::new()
            } else {
                events.visible(scale.domain())
            };
            self.background =
                self.render_pass(all, &self.visible, Role::Background, layout, &scale, renderer);
            let longest_first = by_duration_desc(all, &self.visible);
            self.foreground =
                self.render_pass(all, &longest_first, Role::Foreground, layout, &scale, renderer);
            self.geometry_key = Some(key);
        }

        if selection_dirty {
            let selected: Vec<usize> = self
                .visible
                .iter()
                .copied()
                .filter(|&index| all.get(index).is_some_and(|event| event.is_selected))
                .collect();
            let longest_first = by_duration_desc(all, &selected);
            self.selection =
                self.render_pass(all, &longest_first, Role::Foreground, layout, &scale, renderer);
            self.selection_revision = Some(events.selection_revision());
        }

        Invalidation {
            background: geometry_dirty,
            foreground: geometry_dirty,
            selection: selection_dirty,
        }
    }

    fn render_pass(
        &self,
        events: &[TimelineEvent],
        order: &[usize],
        role: Role,
        layout: &LaneLayout,
        scale: &TimeScale,
        renderer: &dyn MarkRenderer,
    ) -> Vec<Visual> {
        order
            .iter()
            .filter_map(|&index| {
                let event = events.get(index)?;
                let lane_y = layout.lane_y(&event.lane)?;
                let mut visual = renderer.render(event, role, scale, lane_y)?;
                if event.is_pinned {
                    visual.stroke = Some(self.pinned);
                }
                visual.is_finite().then_some(visual)
            })
            .collect()
    }

    pub fn pass(&self, pass: Pass) -> &[Visual] {
        match pass {
            Pass::Background => &self.background,
            Pass::Foreground => &self.foreground,
            Pass::Selection => &self.selection,
        }
    }

    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    /// Every visual in paint order.
    pub fn paint_order(&self) -> impl Iterator<Item = (Pass, &Visual)> {
        Pass::PAINT_ORDER
            .into_iter()
            .flat_map(move |pass| self.pass(pass).iter().map(move |visual| (pass, visual)))
    }

    /// The top-most visual of `id`, if it is drawn at all.
    pub fn visual_for(&self, id: &EventId) -> Option<&Visual> {
        self.selection
            .iter()
            .rev()
            .chain(self.foreground.iter().rev())
            .find(|visual| &visual.event_id == id)
    }

    /// The event whose box is top-most under `point`, whichever pass drew it.
    pub fn hit_test(&self, point: Point) -> Option<&EventId> {
        self.selection
            .iter()
            .rev()
            .chain(self.foreground.iter().rev())
            .find(|visual| visual.bounds.contains(point))
            .map(|visual| &visual.event_id)
    }
}

/// Stable sort of `indices` by descending duration; instants end up last.
fn by_duration_desc(events: &[TimelineEvent], indices: &[usize]) -> Vec<usize> {
    let mut sorted = indices.to_vec();
    sorted.sort_by(|&a, &b| events[b].duration().total_cmp(&events[a].duration()));
    sorted
}
