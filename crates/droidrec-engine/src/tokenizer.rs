//! Parsing of `getevent -lt` style lines.
//!
//! A line looks like
//! `[   5128.531209] /dev/input/event2: EV_ABS       ABS_MT_POSITION_X    000001f4`.
//! Lines without a bracketed timestamp, and categories the recorder does not
//! track, are dropped.

use droidrec_common::protocol::{EventCategory, RawEvent};

const CATEGORIES: [EventCategory; 4] = [
    EventCategory::Key,
    EventCategory::PositionX,
    EventCategory::PositionY,
    EventCategory::TrackingId,
];

pub fn parse_timestamp(line: &str) -> Option<f64> {
    let open = line.find('[')?;
    let rest = &line[open + 1..];
    let close = rest.find(']')?;
    rest[..close].trim().parse::<f64>().ok().filter(|t| t.is_finite())
}

fn categorize(line: &str) -> EventCategory {
    CATEGORIES
        .into_iter()
        .find(|category| category.marker().is_some_and(|marker| line.contains(marker)))
        .unwrap_or(EventCategory::Other)
}

/// Tokenize one producer line. Returns `None` for noise, partial reads and
/// unrecognized categories.
pub fn tokenize(line: &str) -> Option<RawEvent> {
    let timestamp = parse_timestamp(line)?;
    let category = categorize(line);
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let value = (*tokens.last()?).to_string();

    let code = match category {
        EventCategory::Key => tokens.iter().find(|t| t.starts_with("KEY_"))?.to_string(),
        EventCategory::Other => return None,
        other => other.marker()?.to_string(),
    };

    Some(RawEvent {
        timestamp,
        category,
        code,
        value,
    })
}
