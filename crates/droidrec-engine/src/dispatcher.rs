//! Per-line state machine routing tokenized events to the key batch tracker
//! and the touch tracker.
//!
//! Every emitted action is returned to the caller in order; a pending key
//! batch is always emitted before a touch coordinate is processed, before a
//! touch segment is emitted, and before a special key.

use crate::config::GestureConfig;
use crate::formatter::describe_action;
use crate::keys::KeyBatchTracker;
use crate::normalizer::CoordinateNormalizer;
use crate::tokenizer::tokenize;
use crate::touch::{TouchThresholds, TouchTracker};
use droidrec_common::protocol::{ClassifiedAction, EventCategory, RawEvent};
use tracing::{debug, info, trace};

pub struct GestureDispatcher {
    normalizer: CoordinateNormalizer,
    keys: KeyBatchTracker,
    touch: TouchTracker,
}

impl GestureDispatcher {
    pub fn new(config: &GestureConfig, normalizer: CoordinateNormalizer) -> Self {
        let thresholds = TouchThresholds {
            continuity_secs: config.continuity_threshold_secs,
            long_press_secs: config.long_press_threshold_secs,
            tap_distance_px: config.tap_distance_px,
        };
        Self {
            normalizer,
            keys: KeyBatchTracker::new(config.special_keys.iter().cloned()),
            touch: TouchTracker::new(thresholds, config.release_tracking_id.clone()),
        }
    }

    pub fn keys(&self) -> &KeyBatchTracker {
        &self.keys
    }

    pub fn touch(&self) -> &TouchTracker {
        &self.touch
    }

    /// Tokenize and process one raw producer line.
    pub fn process_line(&mut self, line: &str) -> Vec<ClassifiedAction> {
        match tokenize(line) {
            Some(event) => self.process_event(&event),
            None => {
                trace!("dropped line: {}", line);
                Vec::new()
            }
        }
    }

    pub fn process_event(&mut self, event: &RawEvent) -> Vec<ClassifiedAction> {
        let mut out = Vec::new();
        match event.category {
            EventCategory::Key => {
                if let Some(transition) = event.key_transition() {
                    self.keys.on_transition(transition, &mut out);
                }
            }
            EventCategory::PositionX => {
                self.keys.flush(&mut out);
                match self.normalizer.x.scale_hex(&event.value) {
                    Some(x) => self.touch.on_position_x(x),
                    None => trace!("unparseable x magnitude {:?}", event.value),
                }
            }
            EventCategory::PositionY => {
                self.keys.flush(&mut out);
                match self.normalizer.y.scale_hex(&event.value) {
                    Some(y) => {
                        if let Some(action) = self.touch.on_position_y(y, event.timestamp) {
                            out.push(action);
                        }
                    }
                    None => trace!("unparseable y magnitude {:?}", event.value),
                }
            }
            EventCategory::TrackingId => {
                if let Some(action) = self.touch.on_tracking_id(&event.value, event.timestamp) {
                    self.keys.flush(&mut out);
                    out.push(action);
                }
            }
            EventCategory::Other => {}
        }
        log_processed(&out);
        out
    }

    /// Explicit "finish input" request: emit the pending key batch.
    pub fn finish_input(&mut self) -> Vec<ClassifiedAction> {
        let mut out = Vec::new();
        self.keys.flush(&mut out);
        log_processed(&out);
        out
    }

    /// End of stream. The pending key batch is emitted; an open touch
    /// segment never saw its release and is dropped.
    pub fn finish_stream(&mut self) -> Vec<ClassifiedAction> {
        if self.touch.abandon() {
            debug!("stream ended with an open touch segment, dropping it");
        }
        self.finish_input()
    }
}

fn log_processed(actions: &[ClassifiedAction]) {
    for action in actions {
        info!("[processed] {}", describe_action(action));
    }
}
