//! Grouping of ordinary key presses into one input action.

use droidrec_common::protocol::{ClassifiedAction, KeyEdge, KeyTransition};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct KeyBatchTracker {
    special_keys: HashSet<String>,
    /// Only one open DOWN is tracked; a second DOWN replaces it.
    held: Option<String>,
    pending: Vec<String>,
}

impl KeyBatchTracker {
    pub fn new<I, S>(special_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            special_keys: special_keys.into_iter().map(Into::into).collect(),
            held: None,
            pending: Vec::new(),
        }
    }

    pub fn is_special(&self, key: &str) -> bool {
        self.special_keys.contains(key)
    }

    pub fn held(&self) -> Option<&str> {
        self.held.as_deref()
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Apply one key edge. Emits the flushed batch and the special event, in
    /// that order, when a special key is released.
    pub fn on_transition(&mut self, transition: KeyTransition, out: &mut Vec<ClassifiedAction>) {
        match transition.edge {
            KeyEdge::Down => {
                self.held = Some(transition.key);
            }
            KeyEdge::Up => {
                // UP for anything other than the held key is ignored.
                if self.held.as_deref() != Some(transition.key.as_str()) {
                    return;
                }
                let Some(key) = self.held.take() else {
                    return;
                };
                if self.is_special(&key) {
                    self.flush(out);
                    out.push(ClassifiedAction::special(key));
                } else {
                    self.pending.push(key);
                }
            }
        }
    }

    /// Emit the pending batch, if any.
    pub fn flush(&mut self, out: &mut Vec<ClassifiedAction>) {
        if self.pending.is_empty() {
            return;
        }
        let keys = std::mem::take(&mut self.pending);
        out.push(ClassifiedAction::key_input(keys));
    }
}
