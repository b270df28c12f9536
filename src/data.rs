use crate::settings::parse_hex_color;
use crate::timeline::{EventId, Lane, LaneId, TimelineEvent};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event {event} references unknown lane {lane}")]
    UnknownLane { event: EventId, lane: LaneId },
    #[error("event {event} has an invalid time range")]
    InvalidRange { event: EventId },
}

#[derive(Debug, Deserialize)]
struct TimelineFile {
    lanes: Vec<LaneRecord>,
    events: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
struct LaneRecord {
    id: String,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    id: String,
    lane: String,
    /// Milliseconds since the Unix epoch.
    start: f64,
    #[serde(default)]
    end: Option<f64>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    tooltip: Option<String>,
    #[serde(default)]
    selected: bool,
    #[serde(default)]
    pinned: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TimelineData {
    pub lanes: Vec<Lane>,
    pub events: Vec<TimelineEvent>,
}

impl TimelineData {
    /// Events per lane, parallel to `lanes`.
    pub fn lane_counts(&self) -> Vec<usize> {
        self.lanes
            .iter()
            .map(|lane| self.events.iter().filter(|event| event.lane == lane.id).count())
            .collect()
    }
}

pub fn load_timeline(path: &Path) -> Result<TimelineData, LoadError> {
    let source = std::fs::read_to_string(path)?;
    parse_timeline(&source)
}

pub fn parse_timeline(source: &str) -> Result<TimelineData, LoadError> {
    let file: TimelineFile = serde_json::from_str(source)?;

    let lanes: Vec<Lane> = file
        .lanes
        .into_iter()
        .map(|record| Lane {
            label: record.label.unwrap_or_else(|| record.id.clone()),
            id: LaneId(record.id),
        })
        .collect();
    let known: HashSet<&LaneId> = lanes.iter().map(|lane| &lane.id).collect();

    let mut events = Vec::with_capacity(file.events.len());
    for record in file.events {
        let id = EventId(record.id);
        let lane = LaneId(record.lane);
        if !known.contains(&lane) {
            return Err(LoadError::UnknownLane { event: id, lane });
        }

        let valid = record.start.is_finite()
            && record
                .end
                .is_none_or(|end| end.is_finite() && end >= record.start);
        if !valid {
            return Err(LoadError::InvalidRange { event: id });
        }

        events.push(TimelineEvent {
            id,
            start_ms: record.start,
            end_ms: record.end,
            is_selected: record.selected,
            is_pinned: record.pinned,
            color: record.color.as_deref().and_then(parse_hex_color),
            tooltip: record.tooltip,
            lane,
        });
    }

    Ok(TimelineData { lanes, events })
}

/// Built-in data shown when no file is given or loading fails.
pub fn sample_timeline() -> TimelineData {
    // 2024-06-10 08:00:00 UTC
    const BASE: f64 = 1_718_006_400_000.0;
    const MINUTE: f64 = 60_000.0;
    let at = |minutes: f64| BASE + minutes * MINUTE;

    let lanes = [
        ("deploys", "Deploys"),
        ("builds", "Builds"),
        ("incidents", "Incidents"),
        ("alerts", "Alerts"),
    ]
    .into_iter()
    .map(|(id, label)| Lane {
        id: id.into(),
        label: label.to_string(),
    })
    .collect();

    let events = vec![
        TimelineEvent::instant("deploy-1", "deploys", at(15.0)).with_tooltip("Deploy v1.4.0"),
        TimelineEvent::instant("deploy-2", "deploys", at(190.0)).with_tooltip("Deploy v1.4.1"),
        TimelineEvent::instant("deploy-3", "deploys", at(420.0)).with_tooltip("Deploy v1.5.0"),
        TimelineEvent::period("build-1", "builds", at(0.0), at(12.0)).with_tooltip("Build #812"),
        TimelineEvent::period("build-2", "builds", at(170.0), at(186.0)).with_tooltip("Build #813"),
        TimelineEvent::period("build-3", "builds", at(395.0), at(417.0)).with_tooltip("Build #814"),
        TimelineEvent::period("nightly", "builds", at(-60.0), at(480.0))
            .with_tooltip("Nightly integration run"),
        TimelineEvent::period("incident-1", "incidents", at(200.0), at(290.0))
            .with_tooltip("Elevated error rate after v1.4.1")
            .pinned(true),
        TimelineEvent::period("incident-2", "incidents", at(230.0), at(245.0))
            .with_tooltip("Database failover"),
        TimelineEvent::instant("alert-1", "alerts", at(201.0)).with_tooltip("5xx > 2%"),
        TimelineEvent::instant("alert-2", "alerts", at(232.0)).with_tooltip("Primary DB unreachable"),
        TimelineEvent::instant("alert-3", "alerts", at(233.5)).with_tooltip("Replica promoted"),
        TimelineEvent::instant("alert-4", "alerts", at(288.0)).with_tooltip("Error rate recovered"),
    ];

    TimelineData { lanes, events }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lanes_and_events() {
        let data = parse_timeline(
            r##"{
                "lanes": [{ "id": "a", "label": "Lane A" }, { "id": "b" }],
                "events": [
                    { "id": "x", "lane": "a", "start": 10, "tooltip": "hello" },
                    { "id": "y", "lane": "b", "start": 20, "end": 30, "color": "#ff0000", "pinned": true }
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(data.lanes[1].label, "b");
        assert_eq!(data.events.len(), 2);
        assert!(!data.events[0].is_period());
        assert_eq!(data.events[0].tooltip.as_deref(), Some("hello"));
        assert_eq!(data.events[1].end_ms, Some(30.0));
        assert!(data.events[1].is_pinned);
        assert!(data.events[1].color.is_some());
        assert_eq!(data.lane_counts(), vec![1, 1]);
    }

    #[test]
    fn rejects_unknown_lanes() {
        let err = parse_timeline(
            r#"{ "lanes": [], "events": [{ "id": "x", "lane": "nowhere", "start": 1 }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::UnknownLane { .. }));
    }

    #[test]
    fn rejects_inverted_ranges() {
        let err = parse_timeline(
            r#"{ "lanes": [{ "id": "a" }], "events": [{ "id": "x", "lane": "a", "start": 5, "end": 1 }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidRange { .. }));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(parse_timeline("{"), Err(LoadError::Json(_))));
    }

    #[test]
    fn sample_events_all_have_known_lanes() {
        let data = sample_timeline();
        assert!(!data.events.is_empty());
        assert!(data.lane_counts().iter().all(|&count| count > 0));
        assert_eq!(data.lane_counts().iter().sum::<usize>(), data.events.len());
    }
}
