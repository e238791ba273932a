//! Browser driver abstraction.
//!
//! The harness consumes a browser engine only through [`BrowserDriver`].
//! Element reads return [`ElementSnapshot`]s for every current match of a
//! locator, so strictness and visibility rules live above the driver.

use crate::config::HarnessConfig;
use crate::locator::{BoundingBox, Locator, Point};
use crate::result::ProbeResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One matched element as observed at query time
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Rendered with a non-empty box and not hidden by style
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Text content, untrimmed
    pub text: String,
    /// Form control value, if the element has one
    #[serde(default)]
    pub value: Option<String>,
    /// `data-testid` marker, if present
    #[serde(default)]
    pub test_id: Option<String>,
    /// Viewport geometry, if laid out
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

impl ElementSnapshot {
    /// Trimmed text content
    #[must_use]
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }
}

/// Low-level pointer input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Primary button pressed
    Down(Point),
    /// Pointer moved
    Move {
        /// New position
        at: Point,
        /// Primary button held during the move
        held: bool,
    },
    /// Primary button released
    Up(Point),
}

impl PointerEvent {
    /// Where the event happens
    #[must_use]
    pub const fn position(&self) -> Point {
        match self {
            Self::Down(p) | Self::Up(p) | Self::Move { at: p, .. } => *p,
        }
    }
}

impl fmt::Display for PointerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down(p) => write!(f, "down({:.1}, {:.1})", p.x, p.y),
            Self::Move { at, held } => {
                write!(f, "move({:.1}, {:.1}{})", at.x, at.y, if *held { ", held" } else { "" })
            }
            Self::Up(p) => write!(f, "up({:.1}, {:.1})", p.x, p.y),
        }
    }
}

/// Browser engine seam
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate to an absolute URL and wait for the document to load
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Current absolute URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Every current match of the locator, in document order
    async fn query(&self, locator: &Locator) -> ProbeResult<Vec<ElementSnapshot>>;

    /// Click the first match
    async fn click(&self, locator: &Locator) -> ProbeResult<()>;

    /// Replace the value of the first matching input
    async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()>;

    /// Choose an option of the first matching select by value
    async fn select_option(&self, locator: &Locator, value: &str) -> ProbeResult<()>;

    /// Dispatch one pointer event at viewport coordinates
    async fn dispatch_pointer(&self, event: PointerEvent) -> ProbeResult<()>;

    /// Release the session
    async fn close(&self) -> ProbeResult<()>;
}

/// Opens isolated browser sessions, one per scenario
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Short label for logs (e.g. `chromium`, `mock`)
    fn label(&self) -> &str;

    /// Open a fresh driver
    async fn open(&self, config: Arc<HarnessConfig>) -> ProbeResult<Box<dyn BrowserDriver>>;
}
