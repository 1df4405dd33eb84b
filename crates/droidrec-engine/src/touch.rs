//! Reconstruction of single-contact touch sessions into taps, long-presses
//! and swipes.

use droidrec_common::protocol::{ClassifiedAction, Point};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchThresholds {
    /// Max gap between samples of one gesture segment, in seconds.
    pub continuity_secs: f64,
    /// Min stationary duration of a long-press, in seconds.
    pub long_press_secs: f64,
    /// Movement below this many pixels counts as stationary.
    pub tap_distance_px: f64,
}

impl Default for TouchThresholds {
    fn default() -> Self {
        Self {
            continuity_secs: 0.1,
            long_press_secs: 0.6,
            tap_distance_px: 10.0,
        }
    }
}

/// Classify one closed segment. Exactly one of tap, long-press or swipe.
pub fn classify(
    start: Point,
    end: Point,
    duration: f64,
    thresholds: &TouchThresholds,
) -> ClassifiedAction {
    if start.distance_to(&end) < thresholds.tap_distance_px {
        if duration >= thresholds.long_press_secs {
            ClassifiedAction::LongPress {
                x: start.x,
                y: start.y,
                duration,
            }
        } else {
            ClassifiedAction::Tap {
                x: start.x,
                y: start.y,
            }
        }
    } else {
        ClassifiedAction::Swipe {
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
            duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenSession {
    pub start: Point,
    pub current: Point,
    pub started_at: f64,
    pub last_sample_at: f64,
}

impl OpenSession {
    fn begin(point: Point, now: f64) -> Self {
        Self {
            start: point,
            current: point,
            started_at: now,
            last_sample_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TouchSession {
    #[default]
    Idle,
    Open(OpenSession),
}

#[derive(Debug, Clone)]
pub struct TouchTracker {
    thresholds: TouchThresholds,
    release_id: String,
    /// Latest normalized coordinates of the contact. A sample is only taken
    /// once both axes are known, on the Y report.
    x: Option<i32>,
    y: Option<i32>,
    session: TouchSession,
}

impl TouchTracker {
    pub fn new(thresholds: TouchThresholds, release_id: impl Into<String>) -> Self {
        Self {
            thresholds,
            release_id: release_id.into(),
            x: None,
            y: None,
            session: TouchSession::Idle,
        }
    }

    pub fn session(&self) -> &TouchSession {
        &self.session
    }

    pub fn is_active(&self) -> bool {
        matches!(self.session, TouchSession::Open(_))
    }

    pub fn is_release(&self, tracking_id: &str) -> bool {
        tracking_id.eq_ignore_ascii_case(&self.release_id)
    }

    pub fn on_position_x(&mut self, x: i32) {
        self.x = Some(x);
    }

    pub fn on_position_y(&mut self, y: i32, now: f64) -> Option<ClassifiedAction> {
        self.y = Some(y);
        let x = self.x?;
        self.sample(Point::new(x, y), now)
    }

    /// Feed one paired sample. Returns the segment closed by a continuity
    /// break, if any.
    pub fn sample(&mut self, point: Point, now: f64) -> Option<ClassifiedAction> {
        match &mut self.session {
            TouchSession::Idle => {
                trace!("touch segment opened at ({}, {})", point.x, point.y);
                self.session = TouchSession::Open(OpenSession::begin(point, now));
                None
            }
            TouchSession::Open(open) => {
                if now - open.last_sample_at > self.thresholds.continuity_secs {
                    let action = classify(
                        open.start,
                        open.current,
                        now - open.started_at,
                        &self.thresholds,
                    );
                    debug!(
                        "sample gap of {:.3}s splits the contact",
                        now - open.last_sample_at
                    );
                    *open = OpenSession::begin(point, now);
                    Some(action)
                } else {
                    open.current = point;
                    open.last_sample_at = now;
                    None
                }
            }
        }
    }

    /// Handle a tracking-id report. A release closes the open segment.
    pub fn on_tracking_id(&mut self, value: &str, now: f64) -> Option<ClassifiedAction> {
        if !self.is_release(value) {
            debug!("ACTION_DOWN (tracking id {})", value);
            return None;
        }
        debug!("ACTION_UP");
        self.release(now)
    }

    pub fn release(&mut self, now: f64) -> Option<ClassifiedAction> {
        let latest = self.x.zip(self.y).map(|(x, y)| Point::new(x, y));
        let session = std::mem::take(&mut self.session);
        self.x = None;
        self.y = None;

        match session {
            TouchSession::Open(open) => {
                let end = latest.unwrap_or(open.current);
                Some(classify(
                    open.start,
                    end,
                    now - open.started_at,
                    &self.thresholds,
                ))
            }
            TouchSession::Idle => {
                trace!("release without a paired sample, nothing to classify");
                None
            }
        }
    }

    /// Forget any open segment without classifying it.
    pub fn abandon(&mut self) -> bool {
        let was_open = self.is_active();
        self.session = TouchSession::Idle;
        self.x = None;
        self.y = None;
        was_open
    }
}
