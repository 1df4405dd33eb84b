//! Element lookup in a UI hierarchy dump.
//!
//! Only the `bounds="[l,t][r,b]"` attributes matter here; they are scanned in
//! document order.

use droidrec_common::protocol::{Bounds, Point};
use regex::Regex;
use std::sync::LazyLock;

static BOUNDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"bounds="\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]""#).unwrap()
});

/// Every element rectangle in the document, in document order.
pub fn parse_bounds(markup: &str) -> Vec<Bounds> {
    BOUNDS_RE
        .captures_iter(markup)
        .filter_map(|caps| {
            let coord = |i: usize| caps.get(i)?.as_str().parse::<i32>().ok();
            Some(Bounds::new(coord(1)?, coord(2)?, coord(3)?, coord(4)?))
        })
        .collect()
}

/// The smallest-area element containing `point`. On equal area the first
/// element in document order wins.
pub fn smallest_containing(markup: &str, point: Point) -> Option<Bounds> {
    let mut best: Option<Bounds> = None;
    for bounds in parse_bounds(markup) {
        if bounds.area() == 0 || !bounds.contains(point) {
            continue;
        }
        match best {
            Some(current) if current.area() <= bounds.area() => {}
            _ => best = Some(bounds),
        }
    }
    best
}
