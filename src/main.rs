mod data;
mod settings;
mod timeline;
mod tooltip;
mod ui;

use crate::data::TimelineData;
use crate::settings::Settings;
use crate::timeline::events::EventsProgram;
use crate::timeline::header::HeaderProgram;
use crate::timeline::interaction::{Gesture, InteractionFlags};
use crate::timeline::lanes::LanesProgram;
use crate::timeline::layering::{DefaultRenderer, MarkPalette};
use crate::timeline::ticks::{format_duration, format_time_label};
use crate::timeline::viewport::{Outcome, TrimRange, ViewportController};
use crate::timeline::zoom::ZoomLadder;
use crate::timeline::{
    Domain, EventId, EventSet, HEADER_HEIGHT, LABEL_WIDTH, Lane, LaneLayout, TimeScale,
};
use iced::widget::{Canvas, Space, column, container, row, text};
use iced::{Alignment, Element, Length, Subscription, Task, Vector, window};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn main() -> iced::Result {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "eventline=info,warn".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    iced::application(Eventline::new, Eventline::update, Eventline::view)
        .title(Eventline::title)
        .subscription(Eventline::subscription)
        .run()
}

#[derive(Debug, Clone)]
pub enum Message {
    FileLoaded(PathBuf, TimelineData),
    LoadFailed(PathBuf, String),
    Canvas { gestures: Vec<Gesture>, width: f32 },
    AnimationFrame { generation: u64, now: Instant },
    ZoomIn,
    ZoomOut,
    ZoomReset,
    TrimToView,
    ClearTrim,
    ToggleHints,
}

/// Time the pixel range `[0, width]` of the events canvas currently shows.
fn scale_for(viewport: &ViewportController, width: f32) -> TimeScale {
    TimeScale::new(viewport.domain(), width)
}

struct Eventline {
    settings: Settings,
    config_path: Option<PathBuf>,
    source: Option<PathBuf>,
    lanes: Vec<Lane>,
    lane_counts: Vec<usize>,
    layout: LaneLayout,
    events: EventSet,
    viewport: ViewportController,
    palette: MarkPalette,
    renderer: DefaultRenderer,
    trim: Option<TrimRange>,
    hovered: Option<EventId>,
    cursor_ms: Option<f64>,
    /// Range under a drag-to-zoom selection, in milliseconds.
    zoom_preview: Option<Domain>,
    show_hints: bool,
}

impl Eventline {
    fn new() -> (Self, Task<Message>) {
        let config_path = Settings::config_path();
        let settings = match config_path.as_deref().map(Settings::load) {
            Some(Ok(settings)) => {
                info!(path = ?config_path, "loaded settings");
                settings
            }
            Some(Err(err)) => {
                warn!(path = ?config_path, %err, "failed to load settings, using defaults");
                Settings::default()
            }
            None => Settings::default(),
        };

        let app = Self::with_data(settings, config_path, data::sample_timeline());

        let initial_task = match std::env::args().nth(1) {
            Some(path_str) => {
                let path = PathBuf::from(path_str);
                Task::perform(
                    async move {
                        match data::load_timeline(&path) {
                            Ok(data) => Message::FileLoaded(path, data),
                            Err(err) => Message::LoadFailed(path, err.to_string()),
                        }
                    },
                    |msg| msg,
                )
            }
            None => {
                info!("no input file given, showing sample data");
                Task::none()
            }
        };

        (app, initial_task)
    }

    fn with_data(settings: Settings, config_path: Option<PathBuf>, data: TimelineData) -> Self {
        let ladder = if settings.zoom_presets_ms.is_empty() {
            ZoomLadder::default()
        } else {
            ZoomLadder::new(settings.zoom_presets_ms.iter().copied())
        };
        let palette = settings.palette();
        let mut app = Eventline {
            layout: LaneLayout::new(&[], settings.lane_height()),
            viewport: ViewportController::new(ladder, settings.tween()),
            renderer: DefaultRenderer::new(palette),
            palette,
            settings,
            config_path,
            source: None,
            lanes: Vec::new(),
            lane_counts: Vec::new(),
            events: EventSet::default(),
            trim: None,
            hovered: None,
            cursor_ms: None,
            zoom_preview: None,
            show_hints: false,
        };
        app.load(data);
        app
    }

    fn load(&mut self, data: TimelineData) {
        self.lane_counts = data.lane_counts();
        self.layout = LaneLayout::new(&data.lanes, self.settings.lane_height());
        self.lanes = data.lanes;
        self.events.replace(data.events);
        self.viewport.load(self.events.max_domain());
        self.trim = None;
        self.hovered = None;
        self.cursor_ms = None;
        self.zoom_preview = None;
        info!(
            events = self.events.events().len(),
            lanes = self.lanes.len(),
            domain = ?self.viewport.domain(),
            "timeline loaded"
        );
    }

    fn title(&self) -> String {
        match self.source.as_ref().and_then(|path| path.file_name()) {
            Some(name) => format!("Eventline - {}", name.to_string_lossy()),
            None => "Eventline - sample data".to_string(),
        }
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        let now = Instant::now();
        match message {
            Message::FileLoaded(path, data) => {
                self.source = Some(path);
                self.load(data);
            }
            Message::LoadFailed(path, err) => {
                warn!(path = %path.display(), %err, "failed to load timeline, keeping sample data");
            }
            Message::Canvas { gestures, width } => {
                for gesture in gestures {
                    self.apply_gesture(gesture, width, now);
                }
            }
            Message::AnimationFrame { generation, now } => {
                let outcome = self.viewport.frame(generation, now);
                self.report(outcome);
            }
            Message::ZoomIn => {
                let outcome = self.viewport.zoom_in(self.viewport.domain().center(), now);
                self.report(outcome);
            }
            Message::ZoomOut => {
                let outcome = self.viewport.zoom_out(self.viewport.domain().center(), now);
                self.report(outcome);
            }
            Message::ZoomReset => {
                let outcome = self.viewport.reset(now);
                self.report(outcome);
            }
            Message::TrimToView => {
                let domain = self.viewport.domain();
                if !domain.is_degenerate() {
                    let inset = domain.width() * 0.1;
                    self.set_trim(Some(TrimRange::new(
                        domain.start + inset,
                        domain.end - inset,
                    )));
                }
            }
            Message::ClearTrim => self.set_trim(None),
            Message::ToggleHints => self.show_hints = !self.show_hints,
        }
        Task::none()
    }

    fn apply_gesture(&mut self, gesture: Gesture, width: f32, now: Instant) {
        let scale = scale_for(&self.viewport, width);
        match gesture {
            Gesture::Hover(id) => {
                debug!(event = ?id, "hover");
                self.viewport.hover(id.is_some());
                self.hovered = id;
            }
            Gesture::Click(id) => {
                debug!(event = %id, "click");
                let already = self.events.get(&id).is_some_and(|event| event.is_selected);
                if already {
                    self.events.clear_selection();
                } else {
                    self.events.select_only(&id);
                }
            }
            Gesture::ZoomIn { cursor_x } => {
                let outcome = self.viewport.zoom_in(scale.to_ms(cursor_x), now);
                self.report(outcome);
            }
            Gesture::ZoomOut { cursor_x } => {
                let outcome = self.viewport.zoom_out(scale.to_ms(cursor_x), now);
                self.report(outcome);
            }
            Gesture::ZoomInCustom { start, end } => {
                self.zoom_preview = None;
                let outcome = self.viewport.zoom_custom(start, end, scale, now);
                self.report(outcome);
            }
            Gesture::ZoomInCustomPreview { start, end } => {
                self.zoom_preview = (!scale.is_degenerate()).then(|| {
                    let (left, right) = (start.min(end), start.max(end));
                    Domain::new(scale.to_ms(left), scale.to_ms(right))
                });
                trace!(range = ?self.zoom_preview, "zoom selection preview");
            }
            Gesture::ZoomReset => {
                let outcome = self.viewport.reset(now);
                self.report(outcome);
            }
            Gesture::Pan(delta) => {
                let outcome = self.viewport.pan(delta, scale);
                self.report(outcome);
            }
            Gesture::TrimStart(px) => {
                let trim = self.trim.map(|trim| trim.trim_start(px, &scale));
                self.set_trim(trim);
            }
            Gesture::TrimEnd(px) => {
                let trim = self.trim.map(|trim| trim.trim_end(px, &scale));
                self.set_trim(trim);
            }
            Gesture::CursorMoved(px) => {
                self.cursor_ms = (!scale.is_degenerate()).then(|| scale.to_ms(px));
                trace!(cursor_ms = ?self.cursor_ms, "cursor moved");
            }
            Gesture::InteractionEnd => {
                self.zoom_preview = None;
                debug!("interaction end");
            }
        }
    }

    fn set_trim(&mut self, trim: Option<TrimRange>) {
        if trim != self.trim {
            self.trim = trim;
            debug!(trim = ?self.trim, "trim range changed");
        }
    }

    /// Zoom-range notifications: settled tweens and immediate pans.
    fn report(&self, outcome: Outcome) {
        let settled = outcome.tween_finished
            || (outcome.domain_changed && !outcome.tween_started && !self.viewport.is_animating());
        if settled {
            debug!(domain = ?self.viewport.domain(), "zoom range changed");
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        match self.viewport.active_generation() {
            Some(generation) => window::frames()
                .with(generation)
                .map(|(generation, now)| Message::AnimationFrame { generation, now }),
            None => Subscription::none(),
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let domain = self.viewport.domain();
        let change_allowed = self.viewport.is_change_allowed();

        let toolbar = row![
            ui::toolbar_button(
                "Zoom in",
                (change_allowed && self.viewport.is_zoom_in_possible()).then_some(Message::ZoomIn),
            ),
            ui::toolbar_button(
                "Zoom out",
                (change_allowed && self.viewport.is_zoom_out_possible())
                    .then_some(Message::ZoomOut),
            ),
            ui::toolbar_button("Reset", change_allowed.then_some(Message::ZoomReset)),
            ui::toolbar_button(
                "Trim to view",
                (!domain.is_degenerate()).then_some(Message::TrimToView),
            ),
            ui::toolbar_button("Clear trim", self.trim.map(|_| Message::ClearTrim)),
            Space::new().width(Length::Fill),
            text(domain_label(domain)).size(12),
            ui::toolbar_button("Hints", Some(Message::ToggleHints)),
        ]
        .spacing(6)
        .padding(5)
        .align_y(Alignment::Center);

        let header = row![
            Space::new().width(Length::Fixed(LABEL_WIDTH)),
            Canvas::new(HeaderProgram {
                domain,
                trim: self.trim,
            })
            .width(Length::Fill)
            .height(Length::Fixed(HEADER_HEIGHT)),
        ];

        let body = row![
            Canvas::new(LanesProgram {
                lanes: &self.lanes,
                layout: &self.layout,
                counts: &self.lane_counts,
            })
            .width(Length::Fixed(LABEL_WIDTH))
            .height(Length::Fill),
            Canvas::new(EventsProgram {
                events: &self.events,
                layout: &self.layout,
                domain,
                renderer: &self.renderer,
                background: self.palette.background,
                selection: self.palette.selection,
                pinned: self.palette.pinned_stroke(),
                flags: InteractionFlags {
                    zoom_in_possible: self.viewport.is_zoom_in_possible(),
                    zoom_out_possible: self.viewport.is_zoom_out_possible(),
                    animating: self.viewport.is_animating(),
                },
                trim: self.trim,
                // Tooltips are painted in the events canvas itself; nothing follows the pointer.
                tooltip_tracking: Vector::ZERO,
            })
            .width(Length::Fill)
            .height(Length::Fill),
        ]
        .height(Length::Fill);

        let mut content = column![toolbar, header, body, self.details_view()];
        if self.show_hints {
            content = content.push(self.settings.hints(self.config_path.as_deref()));
        }
        content.into()
    }

    fn details_view(&self) -> Element<'_, Message> {
        let selected = self.events.events().iter().find(|event| event.is_selected);
        let event_line = match selected.or_else(|| {
            self.hovered
                .as_ref()
                .and_then(|id| self.events.get(id))
        }) {
            Some(event) => {
                let when = match event.end_ms {
                    Some(end) => format!(
                        "{} to {} ({})",
                        format_time_label(event.start_ms, 1.0),
                        format_time_label(end, 1.0),
                        format_duration(end - event.start_ms),
                    ),
                    None => format_time_label(event.start_ms, 1.0),
                };
                format!(
                    "{}{} [{}] {}",
                    if event.is_selected { "Selected: " } else { "Hovered: " },
                    event.id,
                    event.lane,
                    when
                )
            }
            None => "Select an event to see details".to_string(),
        };

        let cursor = match (self.zoom_preview, self.cursor_ms) {
            (Some(range), _) => format!("Zoom to: {}", domain_label(range)),
            (None, Some(ms)) => format!("Cursor: {}", format_time_label(ms, 1.0)),
            (None, None) => "Cursor: -".to_string(),
        };
        let trim = match self.trim {
            Some(trim) => format!(
                "Trim: {} to {}",
                format_time_label(trim.start, 1.0),
                format_time_label(trim.end, 1.0)
            ),
            None => "Trim: none".to_string(),
        };

        container(
            column![
                text(event_line).size(14),
                row![text(cursor).size(12), text(trim).size(12)].spacing(20),
            ]
            .spacing(5)
            .padding(10),
        )
        .width(Length::Fill)
        .height(Length::Fixed(70.0))
        .style(ui::panel_style)
        .into()
    }
}

fn domain_label(domain: Domain) -> String {
    if domain.is_degenerate() {
        return "No events".to_string();
    }
    format!(
        "{} to {} ({})",
        format_time_label(domain.start, 1.0),
        format_time_label(domain.end, 1.0),
        format_duration(domain.width())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn app() -> Eventline {
        Eventline::with_data(Settings::default(), None, data::sample_timeline())
    }

    fn canvas(gestures: Vec<Gesture>) -> Message {
        Message::Canvas {
            gestures,
            width: 1000.0,
        }
    }

    fn settle(app: &mut Eventline) {
        if let Some(generation) = app.viewport.active_generation() {
            let _ = app.update(Message::AnimationFrame {
                generation,
                now: Instant::now() + Duration::from_secs(5),
            });
        }
    }

    #[test]
    fn starts_at_full_extent() {
        let app = app();
        assert_eq!(app.viewport.domain(), app.events.max_domain());
        assert!(!app.viewport.is_animating());
        assert_eq!(app.viewport.active_generation(), None);
    }

    #[test]
    fn wheel_zoom_animates_then_settles() {
        let mut app = app();
        let full = app.viewport.domain();

        let _ = app.update(canvas(vec![Gesture::ZoomIn { cursor_x: 500.0 }]));
        assert!(app.viewport.is_animating());
        assert!(app.viewport.active_generation().is_some());

        settle(&mut app);
        assert!(!app.viewport.is_animating());
        assert!(app.viewport.domain().width() < full.width());
        assert!(full.contains_domain(&app.viewport.domain()));
    }

    #[test]
    fn hovering_a_mark_blocks_zoom() {
        let mut app = app();
        let _ = app.update(canvas(vec![Gesture::Hover(Some("deploy-1".into()))]));
        let _ = app.update(canvas(vec![Gesture::ZoomIn { cursor_x: 500.0 }]));
        assert!(!app.viewport.is_animating());

        let _ = app.update(canvas(vec![Gesture::Hover(None)]));
        let _ = app.update(Message::ZoomIn);
        assert!(app.viewport.is_animating());
    }

    #[test]
    fn click_toggles_single_selection() {
        let mut app = app();
        let _ = app.update(canvas(vec![Gesture::Click("build-1".into())]));
        let _ = app.update(canvas(vec![Gesture::Click("build-2".into())]));

        let selected: Vec<&str> = app
            .events
            .events()
            .iter()
            .filter(|event| event.is_selected)
            .map(|event| event.id.0.as_str())
            .collect();
        assert_eq!(selected, vec!["build-2"]);

        let _ = app.update(canvas(vec![Gesture::Click("build-2".into())]));
        assert!(app.events.events().iter().all(|event| !event.is_selected));
    }

    #[test]
    fn trim_is_created_moved_and_cleared() {
        let mut app = app();
        let _ = app.update(Message::TrimToView);
        let before = app.trim.unwrap();

        let _ = app.update(canvas(vec![Gesture::TrimStart(500.0)]));
        let after = app.trim.unwrap();
        let scale = TimeScale::new(app.viewport.domain(), 1000.0);
        assert!((after.start - scale.to_ms(500.0)).abs() < 1e-6);
        assert_eq!(after.end, before.end);

        let _ = app.update(Message::ClearTrim);
        assert_eq!(app.trim, None);
        let _ = app.update(canvas(vec![Gesture::TrimEnd(10.0)]));
        assert_eq!(app.trim, None);
    }

    #[test]
    fn zoom_selection_preview_is_reported_in_milliseconds() {
        let mut app = app();
        let scale = TimeScale::new(app.viewport.domain(), 1000.0);

        let _ = app.update(canvas(vec![Gesture::ZoomInCustomPreview {
            start: 600.0,
            end: 200.0,
        }]));
        let preview = app.zoom_preview.unwrap();
        assert!((preview.start - scale.to_ms(200.0)).abs() < 1e-6);
        assert!((preview.end - scale.to_ms(600.0)).abs() < 1e-6);

        let _ = app.update(canvas(vec![
            Gesture::ZoomInCustom {
                start: 200.0,
                end: 600.0,
            },
            Gesture::InteractionEnd,
        ]));
        assert_eq!(app.zoom_preview, None);
        settle(&mut app);
        assert!((app.viewport.domain().start - preview.start).abs() < 1e-6);
        assert!((app.viewport.domain().end - preview.end).abs() < 1e-6);
    }

    #[test]
    fn loaded_file_replaces_sample_data() {
        let mut app = app();
        let data = data::parse_timeline(
            r#"{ "lanes": [{ "id": "a" }], "events": [{ "id": "x", "lane": "a", "start": 100, "end": 200 }] }"#,
        )
        .unwrap();
        let _ = app.update(Message::FileLoaded(PathBuf::from("demo.json"), data));

        assert_eq!(app.viewport.domain(), Domain::new(100.0, 200.0));
        assert_eq!(app.lanes.len(), 1);
        assert_eq!(app.title(), "Eventline - demo.json");
    }

    #[test]
    fn empty_data_shows_placeholder_label() {
        let app = Eventline::with_data(Settings::default(), None, TimelineData::default());
        assert!(app.viewport.domain().is_degenerate());
        assert_eq!(domain_label(app.viewport.domain()), "No events");
    }
}
