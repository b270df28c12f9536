//! Shared helpers for computing time tick positions and formatting labels.

use super::TimeScale;
use chrono::{DateTime, Utc};

/// Target distance between two ticks, in pixels.
pub const TICK_SPACING: f32 = 100.0;

const SECOND: f64 = 1_000.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;

/// Calendar-friendly steps used once ticks are at least a second apart.
const CLOCK_STEPS: [f64; 24] = [
    SECOND,
    2.0 * SECOND,
    5.0 * SECOND,
    10.0 * SECOND,
    15.0 * SECOND,
    30.0 * SECOND,
    MINUTE,
    2.0 * MINUTE,
    5.0 * MINUTE,
    10.0 * MINUTE,
    15.0 * MINUTE,
    30.0 * MINUTE,
    HOUR,
    2.0 * HOUR,
    3.0 * HOUR,
    6.0 * HOUR,
    12.0 * HOUR,
    DAY,
    2.0 * DAY,
    7.0 * DAY,
    14.0 * DAY,
    30.0 * DAY,
    90.0 * DAY,
    365.0 * DAY,
];

/// Choose a "nice" interval (1, 2 or 5 times a power of ten).
pub fn nice_interval(interval: f64) -> f64 {
    if !interval.is_finite() || interval <= 0.0 {
        return 0.0;
    }

    let log10 = interval.log10().floor();
    let base = 10.0f64.powf(log10);
    let ratio = interval / base;
    if ratio <= 1.0 {
        base
    } else if ratio <= 2.0 {
        base * 2.0
    } else if ratio <= 5.0 {
        base * 5.0
    } else {
        base * 10.0
    }
}

/// Tick step for `ms_interval`: decimal below a second, clock units above.
pub fn tick_interval(ms_interval: f64) -> f64 {
    if !ms_interval.is_finite() || ms_interval <= 0.0 {
        return 0.0;
    }
    if ms_interval < SECOND {
        return nice_interval(ms_interval);
    }
    CLOCK_STEPS
        .iter()
        .copied()
        .find(|&step| step >= ms_interval)
        .unwrap_or_else(|| nice_interval(ms_interval / DAY) * DAY)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub x: f32,
    pub ms: f64,
}

/// Ticks covering the scale's domain, roughly `spacing` pixels apart.
pub fn ticks(scale: &TimeScale, spacing: f32) -> (f64, Vec<Tick>) {
    let domain = scale.domain();
    if scale.is_degenerate() || !(domain.width() > 0.0) {
        return (0.0, Vec::new());
    }

    let per_pixel = domain.width() / scale.pixel_width() as f64;
    let interval = tick_interval(per_pixel * spacing as f64);
    // Steps below the float resolution of the timestamps cannot be told apart.
    let resolution = domain.start.abs().max(domain.end.abs()) * f64::EPSILON;
    if !(interval > resolution) {
        return (0.0, Vec::new());
    }

    let first = (domain.start / interval).ceil() * interval;
    let steps = ((domain.end - first) / interval).floor();
    if !(steps >= 0.0) {
        return (interval, Vec::new());
    }
    let max_ticks = (scale.pixel_width() / spacing.max(1.0)).ceil() as usize * 4 + 2;
    let count = (steps as usize).saturating_add(1).min(max_ticks);

    let mut ticks: Vec<Tick> = Vec::with_capacity(count);
    for i in 0..count {
        let ms = first + i as f64 * interval;
        if ticks.last().is_some_and(|last| ms <= last.ms) {
            break;
        }
        ticks.push(Tick {
            x: scale.to_px(ms),
            ms,
        });
    }
    (interval, ticks)
}

/// Format an absolute timestamp with the precision `interval` calls for.
pub fn format_time_label(ms: f64, interval: f64) -> String {
    let Some(time) = DateTime::<Utc>::from_timestamp_millis(ms.round() as i64) else {
        return format!("{ms:.0} ms");
    };
    let pattern = if interval >= DAY {
        "%Y-%m-%d"
    } else if interval >= MINUTE {
        "%m-%d %H:%M"
    } else if interval >= SECOND {
        "%H:%M:%S"
    } else {
        "%H:%M:%S%.3f"
    };
    time.format(pattern).to_string()
}

/// Format a span length using the largest unit that keeps it above one.
pub fn format_duration(ms: f64) -> String {
    if !ms.is_finite() {
        return "-".to_string();
    }
    let abs = ms.abs();
    if abs >= DAY {
        format!("{:.2} d", ms / DAY)
    } else if abs >= HOUR {
        format!("{:.2} h", ms / HOUR)
    } else if abs >= MINUTE {
        format!("{:.2} min", ms / MINUTE)
    } else if abs >= SECOND {
        format!("{:.2} s", ms / SECOND)
    } else {
        format!("{ms:.0} ms")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Domain;

    #[test]
    fn nice_interval_rounds_up_to_1_2_5() {
        assert_eq!(nice_interval(3.0), 5.0);
        assert_eq!(nice_interval(17.0), 20.0);
        assert_eq!(nice_interval(100.0), 100.0);
        assert_eq!(nice_interval(0.0), 0.0);
        assert_eq!(nice_interval(f64::NAN), 0.0);
    }

    #[test]
    fn clock_steps_above_one_second() {
        assert_eq!(tick_interval(250.0), 500.0);
        assert_eq!(tick_interval(1_200.0), 2_000.0);
        assert_eq!(tick_interval(40_000.0), MINUTE);
        assert_eq!(tick_interval(4.0 * HOUR), 6.0 * HOUR);
        assert_eq!(tick_interval(400.0 * DAY), 500.0 * DAY);
    }

    #[test]
    fn ticks_stay_inside_the_domain() {
        let scale = TimeScale::new(Domain::new(1_250.0, 9_750.0), 800.0);
        let (interval, ticks) = ticks(&scale, TICK_SPACING);

        assert_eq!(interval, 2_000.0);
        let times: Vec<f64> = ticks.iter().map(|tick| tick.ms).collect();
        assert_eq!(times, vec![2_000.0, 4_000.0, 6_000.0, 8_000.0]);
        assert!(ticks.iter().all(|tick| tick.x >= 0.0 && tick.x <= 800.0));
    }

    #[test]
    fn degenerate_scale_has_no_ticks() {
        let (_, empty) = ticks(&TimeScale::new(Domain::EMPTY, 800.0), TICK_SPACING);
        assert!(empty.is_empty());
        let (_, point) = ticks(&TimeScale::new(Domain::new(5.0, 5.0), 800.0), TICK_SPACING);
        assert!(point.is_empty());
    }

    fn assert_increasing(ticks: &[Tick]) {
        assert!(ticks.windows(2).all(|pair| pair[0].ms < pair[1].ms));
    }

    #[test]
    fn epoch_scale_ticks_at_the_ladder_floor() {
        let start = 1.7e12;
        let scale = TimeScale::new(Domain::new(start, start + 10.0), 1000.0);
        let (interval, ticks) = ticks(&scale, TICK_SPACING);

        assert_eq!(interval, 1.0);
        assert_eq!(ticks.len(), 11);
        assert_eq!(ticks[0].ms, start);
        assert_eq!(ticks[10].ms, start + 10.0);
        assert_increasing(&ticks);
    }

    #[test]
    fn epoch_scale_sub_millisecond_widths_terminate() {
        let start = 1_718_006_400_123.0;
        let scale = TimeScale::new(Domain::new(start, start + 1.0), 1000.0);
        let (interval, ticks) = ticks(&scale, TICK_SPACING);

        assert!((interval - 0.1).abs() < 1e-12);
        assert!((9..=11).contains(&ticks.len()));
        assert_increasing(&ticks);
        assert!(ticks.iter().all(|tick| tick.x > -1.0 && tick.x < 1001.0));
    }

    #[test]
    fn steps_below_float_resolution_give_no_ticks() {
        let narrow = TimeScale::new(Domain::new(1.7e12, 1.7e12 + 0.001), 1000.0);
        assert!(ticks(&narrow, TICK_SPACING).1.is_empty());

        let far = TimeScale::new(Domain::new(1e15, 1e15 + 0.5), 1000.0);
        assert!(ticks(&far, TICK_SPACING).1.is_empty());
    }

    #[test]
    fn tick_count_is_bounded_by_canvas_width() {
        let scale = TimeScale::new(Domain::new(1.7e12, 1.7e12 + 365.0 * DAY), 300.0);
        let (_, ticks) = ticks(&scale, TICK_SPACING);
        assert!(!ticks.is_empty());
        assert!(ticks.len() <= 3 * 4 + 2);
        assert_increasing(&ticks);
    }

    #[test]
    fn labels_follow_interval_precision() {
        let ms = 1_700_000_123_456.0;
        assert_eq!(format_time_label(ms, DAY), "2023-11-14");
        assert_eq!(format_time_label(ms, MINUTE), "11-14 22:15");
        assert_eq!(format_time_label(ms, SECOND), "22:15:23");
        assert_eq!(format_time_label(ms, 100.0), "22:15:23.456");
    }

    #[test]
    fn durations_use_largest_unit() {
        assert_eq!(format_duration(250.0), "250 ms");
        assert_eq!(format_duration(1_500.0), "1.50 s");
        assert_eq!(format_duration(90.0 * MINUTE), "1.50 h");
        assert_eq!(format_duration(f64::NAN), "-");
    }
}
