use serde::{Deserialize, Serialize};

/// Event categories understood by the recorder. Anything else is `Other` and
/// is dropped before it reaches the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Key,
    PositionX,
    PositionY,
    TrackingId,
    Other,
}

impl EventCategory {
    /// Marker text identifying the category inside a raw protocol line.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            EventCategory::Key => Some("EV_KEY"),
            EventCategory::PositionX => Some("ABS_MT_POSITION_X"),
            EventCategory::PositionY => Some("ABS_MT_POSITION_Y"),
            EventCategory::TrackingId => Some("ABS_MT_TRACKING_ID"),
            EventCategory::Other => None,
        }
    }
}

/// One tokenized protocol line.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Seconds on the producer's monotonic clock.
    pub timestamp: f64,
    pub category: EventCategory,
    pub code: String,
    pub value: String,
}

impl RawEvent {
    pub fn key_transition(&self) -> Option<KeyTransition> {
        if self.category != EventCategory::Key {
            return None;
        }
        let edge = match self.value.as_str() {
            "DOWN" => KeyEdge::Down,
            "UP" => KeyEdge::Up,
            _ => return None,
        };
        Some(KeyTransition {
            key: self.code.clone(),
            edge,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Down,
    Up,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTransition {
    pub key: String,
    pub edge: KeyEdge,
}

/// A point in on-screen pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Rectangle of a UI element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i64 {
        i64::from(self.right) - i64::from(self.left)
    }

    pub fn height(&self) -> i64 {
        i64::from(self.bottom) - i64::from(self.top)
    }

    /// Area in square pixels; zero for degenerate rectangles.
    pub fn area(&self) -> i64 {
        if self.width() <= 0 || self.height() <= 0 {
            return 0;
        }
        self.width() * self.height()
    }

    /// Left/top edges are inside, right/bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }
}

/// A reconstructed user action, before enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action_type", content = "action_detail", rename_all = "snake_case")]
pub enum ClassifiedAction {
    /// Ordinary keys typed since the last flush, in press order.
    #[serde(rename = "input")]
    KeyInput {
        keys: Vec<String>,
        #[serde(default)]
        text: String,
    },
    SpecialEvent {
        #[serde(rename = "event")]
        key: String,
    },
    #[serde(rename = "click")]
    Tap { x: i32, y: i32 },
    #[serde(rename = "press")]
    LongPress { x: i32, y: i32, duration: f64 },
    Swipe {
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        duration: f64,
    },
}

impl ClassifiedAction {
    pub fn key_input(keys: Vec<String>) -> Self {
        let text = keys.join(", ");
        ClassifiedAction::KeyInput { keys, text }
    }

    pub fn special(key: impl Into<String>) -> Self {
        ClassifiedAction::SpecialEvent { key: key.into() }
    }

    /// The interaction point of actions that touch a single location.
    pub fn point(&self) -> Option<Point> {
        match self {
            ClassifiedAction::Tap { x, y } | ClassifiedAction::LongPress { x, y, .. } => {
                Some(Point::new(*x, *y))
            }
            _ => None,
        }
    }

    pub fn action_type(&self) -> &'static str {
        match self {
            ClassifiedAction::KeyInput { .. } => "input",
            ClassifiedAction::SpecialEvent { .. } => "special_event",
            ClassifiedAction::Tap { .. } => "click",
            ClassifiedAction::LongPress { .. } => "press",
            ClassifiedAction::Swipe { .. } => "swipe",
        }
    }
}

/// One persisted, enriched unit of the action log. Step 0 is the initial
/// snapshot and carries no action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step_id: u32,
    #[serde(flatten)]
    pub action: Option<ClassifiedAction>,
    pub screen_shot: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_tree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operated_bounds: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_screen_shot: Option<String>,
}

impl Step {
    pub fn new(step_id: u32, action: Option<ClassifiedAction>, screen_shot: String) -> Self {
        Self {
            step_id,
            action,
            screen_shot,
            activity_info: None,
            ui_tree: None,
            operated_bounds: None,
            processed_screen_shot: None,
        }
    }

    pub fn is_initial(&self) -> bool {
        self.action.is_none()
    }
}

/// The persisted record of one recording session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionLog {
    pub target: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl ActionLog {
    pub fn new(target: Option<String>) -> Self {
        Self {
            target,
            steps: Vec::new(),
        }
    }

    /// Id the next appended step must carry. Ids are dense from 0.
    pub fn next_step_id(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// Number of steps carrying an action (step 0 excluded).
    pub fn action_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_initial()).count()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
