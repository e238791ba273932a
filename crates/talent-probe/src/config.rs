//! Harness configuration.
//!
//! Defaults mirror the application's local setup: frontend on port 3000,
//! a 1920x1080 desktop viewport, 10s actions and 30s navigations.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            chromium_path: None,
            sandbox: true,
        }
    }
}

/// Wait bounds, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Bound for every polling expectation
    pub expect_ms: u64,
    /// Interval between polls
    pub poll_interval_ms: u64,
    /// Bound for a single action (click, fill)
    pub action_ms: u64,
    /// Bound for a navigation round trip
    pub navigation_ms: u64,
    /// Bound for the moved card to show up in its new column
    pub post_drag_ms: u64,
    /// Bound for a whole scenario
    pub scenario_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            expect_ms: 5_000,
            poll_interval_ms: 100,
            action_ms: 10_000,
            navigation_ms: 30_000,
            post_drag_ms: 5_000,
            scenario_ms: 120_000,
        }
    }
}

impl Timeouts {
    /// Expectation bound
    #[must_use]
    pub const fn expect(&self) -> Duration {
        Duration::from_millis(self.expect_ms)
    }

    /// Poll interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Action bound
    #[must_use]
    pub const fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    /// Navigation bound
    #[must_use]
    pub const fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    /// Post-drag visibility bound
    #[must_use]
    pub const fn post_drag(&self) -> Duration {
        Duration::from_millis(self.post_drag_ms)
    }

    /// Scenario bound
    #[must_use]
    pub const fn scenario(&self) -> Duration {
        Duration::from_millis(self.scenario_ms)
    }
}

/// Pointer gesture settings.
///
/// `dwell_ms` and `settle_ms` are the only fixed sleeps in the harness: the
/// dwell lets the board's drag library register intent before the drop, the
/// settle lets the persist call finish before post-conditions are read.
/// Both reduce flakiness; neither guarantees correctness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSettings {
    /// Intermediate pointer-move events between source and target
    pub steps: u32,
    /// Drop point distance below the target column's top edge
    pub drop_offset_y: f64,
    /// Pause between the last move and pointer-up
    pub dwell_ms: u64,
    /// Pause after pointer-up before verification
    pub settle_ms: u64,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            steps: 10,
            drop_offset_y: 50.0,
            dwell_ms: 100,
            settle_ms: 800,
        }
    }
}

impl DragSettings {
    /// Dwell duration
    #[must_use]
    pub const fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    /// Settle duration
    #[must_use]
    pub const fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// What the seeded backend is expected to provide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedExpectations {
    /// Position exercised by the kanban scenarios
    pub position_id: u64,
    /// Minimum number of stages for drag scenarios
    pub min_stages: usize,
}

impl Default for SeedExpectations {
    fn default() -> Self {
        Self {
            position_id: 1,
            min_stages: 2,
        }
    }
}

/// Full harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Application base URL
    pub base_url: String,
    /// Browser settings
    pub browser: BrowserSettings,
    /// Wait bounds
    pub timeouts: Timeouts,
    /// Drag gesture settings
    pub drag: DragSettings,
    /// Seed data expectations
    pub seed: SeedExpectations,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            browser: BrowserSettings::default(),
            timeouts: Timeouts::default(),
            drag: DragSettings::default(),
            seed: SeedExpectations::default(),
        }
    }
}

impl HarnessConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a YAML file; missing keys keep their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parse from YAML text
    pub fn from_yaml_str(text: &str) -> ProbeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.browser.headless = headless;
        self
    }

    /// Set the chromium binary
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.browser.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.browser.sandbox = false;
        self
    }

    /// Replace all wait bounds
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Replace drag settings
    #[must_use]
    pub const fn with_drag(mut self, drag: DragSettings) -> Self {
        self.drag = drag;
        self
    }

    /// Set the exercised position
    #[must_use]
    pub const fn with_position_id(mut self, id: u64) -> Self {
        self.seed.position_id = id;
        self
    }

    /// Tight bounds for the in-memory board used by tests
    #[must_use]
    pub fn fast() -> Self {
        Self::default()
            .with_base_url("http://talent.test")
            .with_timeouts(Timeouts {
                expect_ms: 300,
                poll_interval_ms: 5,
                action_ms: 300,
                navigation_ms: 300,
                post_drag_ms: 300,
                scenario_ms: 5_000,
            })
            .with_drag(DragSettings {
                dwell_ms: 1,
                settle_ms: 1,
                ..DragSettings::default()
            })
    }

    /// Absolute URL for an application path
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Reject settings no scenario can run with
    pub fn validate(&self) -> ProbeResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProbeError::Config {
                message: format!("base_url must be http(s), got {:?}", self.base_url),
            });
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(ProbeError::Config {
                message: "timeouts.poll_interval_ms must be positive".to_string(),
            });
        }
        if self.timeouts.poll_interval_ms > self.timeouts.expect_ms {
            return Err(ProbeError::Config {
                message: "timeouts.poll_interval_ms exceeds timeouts.expect_ms".to_string(),
            });
        }
        if self.drag.steps == 0 {
            return Err(ProbeError::Config {
                message: "drag.steps must be at least 1".to_string(),
            });
        }
        if !(self.drag.drop_offset_y.is_finite() && self.drag.drop_offset_y >= 0.0) {
            return Err(ProbeError::Config {
                message: "drag.drop_offset_y must be a non-negative number".to_string(),
            });
        }
        Ok(())
    }
}
