//! talent-probe: end-to-end verification for the recruitment pipeline kanban.
//!
//! Drives a browser through the recruiter dashboard, the positions list and
//! a position's interview-stage board, and proves that dragging a candidate
//! card between stage columns actually moved the candidate.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ Scenario     │──►│ Page objects │──►│ Session      │──►│ Browser     │
//! │ runner       │   │ + drag engine│   │ expect/wait  │   │ driver      │
//! └──────────────┘   └──────────────┘   └──────────────┘   └─────────────┘
//!        │                  │                                  │      │
//!        ▼                  ▼                               Chromium  mock
//!   pass/fail/skip    stage transitions                      (CDP)   board
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use talent_probe::{catalog, ChromiumSessions, HarnessConfig, ScenarioRunner};
//!
//! # async fn run() {
//! let runner = ScenarioRunner::new(Arc::new(ChromiumSessions::new()), HarnessConfig::default());
//! let report = runner.run_all(&catalog()).await;
//! assert!(report.all_passed());
//! # }
//! ```

#![warn(missing_docs)]

mod assertion;
/// Chromium driver over the DevTools protocol
pub mod browser;
mod config;
mod drag;
mod driver;
mod locator;
/// In-memory recruitment board for testing without a browser
pub mod mock;
mod page_object;
/// Page objects for the three application views
pub mod pages;
/// Marker resolution from domain identities to locators
pub mod resolver;
mod result;
mod scenario;
/// The scenario catalog
pub mod scenarios;
mod session;
mod transition;
mod wait;

pub use assertion::{expect_url, Expect};
pub use browser::ChromiumSessions;
pub use config::{BrowserSettings, DragSettings, HarnessConfig, SeedExpectations, Timeouts};
pub use drag::{drag_to, DragPlan, GestureStep};
pub use driver::{BrowserDriver, ElementSnapshot, PointerEvent, SessionFactory};
pub use locator::{
    BoundingBox, Locator, LocatorOptions, LocatorStep, Point, Selector, TEST_ID_ATTRIBUTE,
};
pub use page_object::{path_of, PageObject, PageState, StateCell, UrlMatcher};
pub use result::{NotFoundReason, ProbeError, ProbeResult};
pub use scenario::{Scenario, ScenarioOutcome, ScenarioResult, ScenarioRunner, SuiteReport};
pub use scenarios::catalog;
pub use session::Session;
pub use transition::{verify_conservation, StageCounts, StageMove, TransitionReport};
pub use wait::{Check, Elapsed, Waiter};
