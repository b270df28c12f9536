use iced::Color;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod animation;
pub mod events;
pub mod header;
pub mod interaction;
pub mod lanes;
pub mod layering;
pub mod ticks;
pub mod viewport;
pub mod visibility;
pub mod zoom;

use visibility::EventIndex;

pub const LABEL_WIDTH: f32 = 150.0;
pub const HEADER_HEIGHT: f32 = 36.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        EventId(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneId(pub String);

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LaneId {
    fn from(value: &str) -> Self {
        LaneId(value.to_string())
    }
}

/// A visible time range in milliseconds since the Unix epoch.
///
/// `Domain::EMPTY` (both bounds NaN) stands for "no events"; callers check
/// [`Domain::is_degenerate`] before doing any pixel math with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    pub start: f64,
    pub end: f64,
}

impl Domain {
    pub const EMPTY: Domain = Domain {
        start: f64::NAN,
        end: f64::NAN,
    };

    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    pub fn center(&self) -> f64 {
        self.start + self.width() / 2.0
    }

    pub fn is_degenerate(&self) -> bool {
        self.start.is_nan() || self.end.is_nan()
    }

    pub fn contains(&self, ms: f64) -> bool {
        ms >= self.start && ms <= self.end
    }

    /// Inclusive containment of `other` inside `self`.
    pub fn contains_domain(&self, other: &Domain) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    pub fn translate(&self, delta_ms: f64) -> Domain {
        Domain::new(self.start + delta_ms, self.end + delta_ms)
    }

    fn bits(&self) -> (u64, u64) {
        (self.start.to_bits(), self.end.to_bits())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEvent {
    pub id: EventId,
    pub start_ms: f64,
    /// Present for period events, absent for instant events.
    pub end_ms: Option<f64>,
    pub is_selected: bool,
    pub is_pinned: bool,
    pub color: Option<Color>,
    pub tooltip: Option<String>,
    pub lane: LaneId,
}

impl TimelineEvent {
    pub fn instant(id: &str, lane: &str, start_ms: f64) -> Self {
        Self {
            id: id.into(),
            start_ms,
            end_ms: None,
            is_selected: false,
            is_pinned: false,
            color: None,
            tooltip: None,
            lane: lane.into(),
        }
    }

    pub fn period(id: &str, lane: &str, start_ms: f64, end_ms: f64) -> Self {
        Self {
            end_ms: Some(end_ms),
            ..Self::instant(id, lane, start_ms)
        }
    }

    #[must_use]
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn selected(mut self, is_selected: bool) -> Self {
        self.is_selected = is_selected;
        self
    }

    #[must_use]
    pub fn pinned(mut self, is_pinned: bool) -> Self {
        self.is_pinned = is_pinned;
        self
    }

    pub fn is_period(&self) -> bool {
        self.end_ms.is_some()
    }

    pub fn last_ms(&self) -> f64 {
        self.end_ms.unwrap_or(self.start_ms)
    }

    /// Zero for instant events.
    pub fn duration(&self) -> f64 {
        self.end_ms.map_or(0.0, |end| end - self.start_ms)
    }

    /// Everything that affects geometry, i.e. all fields except `is_selected`.
    fn same_geometry(&self, other: &TimelineEvent) -> bool {
        self.id == other.id
            && self.start_ms.to_bits() == other.start_ms.to_bits()
            && self.end_ms.map(f64::to_bits) == other.end_ms.map(f64::to_bits)
            && self.is_pinned == other.is_pinned
            && self.color == other.color
            && self.tooltip == other.tooltip
            && self.lane == other.lane
    }
}

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// The event list plus structural revisions used to invalidate render passes.
///
/// `geometry_revision` changes whenever anything but selection changes;
/// `selection_revision` changes only when some `is_selected` flag flips.
#[derive(Debug)]
pub struct EventSet {
    events: Vec<TimelineEvent>,
    index: EventIndex,
    geometry_revision: u64,
    selection_revision: u64,
}

impl Default for EventSet {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl EventSet {
    pub fn new(events: Vec<TimelineEvent>) -> Self {
        let index = EventIndex::build(&events);
        Self {
            events,
            index,
            geometry_revision: next_revision(),
            selection_revision: next_revision(),
        }
    }

    /// Replace the whole list. Revisions only move for the parts that differ.
    pub fn replace(&mut self, events: Vec<TimelineEvent>) {
        let geometry_changed = events.len() != self.events.len()
            || events
                .iter()
                .zip(&self.events)
                .any(|(new, old)| !new.same_geometry(old));
        let selection_changed = events.len() != self.events.len()
            || events
                .iter()
                .zip(&self.events)
                .any(|(new, old)| new.is_selected != old.is_selected);

        if geometry_changed {
            self.index = EventIndex::build(&events);
            self.geometry_revision = next_revision();
        }
        if selection_changed {
            self.selection_revision = next_revision();
        }
        self.events = events;
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &EventId) -> Option<&TimelineEvent> {
        self.events.iter().find(|event| &event.id == id)
    }

    pub fn geometry_revision(&self) -> u64 {
        self.geometry_revision
    }

    pub fn selection_revision(&self) -> u64 {
        self.selection_revision
    }

    pub fn max_domain(&self) -> Domain {
        viewport::compute_max_domain(&self.events)
    }

    /// Indices of the events visible in `domain`, in original order.
    pub fn visible(&self, domain: Domain) -> Vec<usize> {
        self.index.visible(&self.events, domain)
    }

    /// Returns whether anything changed.
    pub fn set_selected(&mut self, id: &EventId, is_selected: bool) -> bool {
        let Some(event) = self.events.iter_mut().find(|event| &event.id == id) else {
            return false;
        };
        if event.is_selected == is_selected {
            return false;
        }
        event.is_selected = is_selected;
        self.selection_revision = next_revision();
        true
    }

    pub fn select_only(&mut self, id: &EventId) {
        let mut changed = false;
        for event in &mut self.events {
            let is_selected = &event.id == id;
            if event.is_selected != is_selected {
                event.is_selected = is_selected;
                changed = true;
            }
        }
        if changed {
            self.selection_revision = next_revision();
        }
    }

    pub fn clear_selection(&mut self) {
        let mut changed = false;
        for event in self.events.iter_mut().filter(|event| event.is_selected) {
            event.is_selected = false;
            changed = true;
        }
        if changed {
            self.selection_revision = next_revision();
        }
    }

    pub fn toggle_pinned(&mut self, id: &EventId) -> bool {
        let Some(event) = self.events.iter_mut().find(|event| &event.id == id) else {
            return false;
        };
        event.is_pinned = !event.is_pinned;
        self.geometry_revision = next_revision();
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    pub id: LaneId,
    pub label: String,
}

/// Vertical placement of lanes: fixed-height bands stacked from y = 0.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneLayout {
    lanes: Vec<LaneId>,
    lane_height: f32,
}

impl LaneLayout {
    pub fn new(lanes: &[Lane], lane_height: f32) -> Self {
        Self {
            lanes: lanes.iter().map(|lane| lane.id.clone()).collect(),
            lane_height,
        }
    }

    pub fn lane_height(&self) -> f32 {
        self.lane_height
    }

    pub fn total_height(&self) -> f32 {
        self.lanes.len() as f32 * self.lane_height
    }

    /// Center line of the lane's band.
    pub fn lane_y(&self, lane: &LaneId) -> Option<f32> {
        self.lanes
            .iter()
            .position(|id| id == lane)
            .map(|index| (index as f32 + 0.5) * self.lane_height)
    }
}

/// Linear, invertible mapping between a [`Domain`] and a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    domain: Domain,
    range: (f32, f32),
}

impl TimeScale {
    pub fn new(domain: Domain, width: f32) -> Self {
        Self {
            domain,
            range: (0.0, width),
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn range(&self) -> (f32, f32) {
        self.range
    }

    pub fn pixel_width(&self) -> f32 {
        self.range.1 - self.range.0
    }

    pub fn is_degenerate(&self) -> bool {
        self.domain.is_degenerate() || !(self.pixel_width() > 0.0)
    }

    /// A zero-width domain maps every time onto the middle of the range.
    pub fn to_px(&self, ms: f64) -> f32 {
        let (r0, r1) = self.range;
        let width = self.domain.width();
        if width == 0.0 {
            return (r0 + r1) / 2.0;
        }
        (r0 as f64 + (ms - self.domain.start) / width * (r1 - r0) as f64) as f32
    }

    pub fn to_ms(&self, px: f32) -> f64 {
        let (r0, r1) = self.range;
        if r1 == r0 {
            return self.domain.start;
        }
        self.domain.start + ((px - r0) as f64 / (r1 - r0) as f64) * self.domain.width()
    }

    /// Bitwise equality, so a NaN domain still compares equal to itself.
    pub fn same_as(&self, other: &TimeScale) -> bool {
        self.domain.bits() == other.domain.bits()
            && self.range.0.to_bits() == other.range.0.to_bits()
            && self.range.1.to_bits() == other.range.1.to_bits()
    }
}

pub fn color_from_label(label: &str) -> Color {
    let mut hash = 0u64;
    for c in label.chars() {
        hash = hash.wrapping_add(c as u64);
        hash = hash.wrapping_mul(0x517cc1b727220a95);
    }

    let r = ((hash >> 16) & 0xFF) as f32 / 255.0;
    let g = ((hash >> 8) & 0xFF) as f32 / 255.0;
    let b = (hash & 0xFF) as f32 / 255.0;

    Color::from_rgb(0.3 + r * 0.4, 0.3 + g * 0.4, 0.3 + b * 0.4)
}
