//! Parsers for the text adb prints.

use regex::Regex;
use std::sync::LazyLock;

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)x(\d+)").unwrap());
static MAX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bmax (\d+)").unwrap());
static COMPONENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z][\w.]*)/([\w.$]+)").unwrap());

/// Screen size from `wm size`. An `Override size` line, printed after the
/// physical one, wins.
pub fn parse_screen_size(output: &str) -> Option<(u32, u32)> {
    output
        .lines()
        .filter(|line| line.contains("size:"))
        .filter_map(|line| {
            let caps = SIZE_RE.captures(line)?;
            Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
        })
        .last()
}

/// Maximum reported magnitude of one axis label from `getevent -lp`. The
/// first device reporting the axis wins.
pub fn parse_axis_max(output: &str, axis: &str) -> Option<u32> {
    output
        .lines()
        .filter(|line| line.contains(axis))
        .find_map(|line| MAX_RE.captures(line)?[1].parse().ok())
}

/// Foreground component (`package/activity`) from `dumpsys activity
/// activities`.
pub fn parse_foreground_activity(output: &str) -> Option<String> {
    let markers = ["topResumedActivity", "mResumedActivity", "ResumedActivity"];
    markers.iter().find_map(|marker| {
        output
            .lines()
            .filter(|line| line.contains(marker))
            .find_map(|line| COMPONENT_RE.find(line).map(|m| m.as_str().to_string()))
    })
}
