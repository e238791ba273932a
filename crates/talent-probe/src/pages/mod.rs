//! Page abstractions for the recruitment application.
//!
//! Each page borrows the scenario's [`Session`] and exposes locators,
//! navigation and composite verifications for one view.

mod dashboard;
mod position_details;
mod positions_list;

pub use dashboard::Dashboard;
pub use position_details::PositionDetails;
pub use positions_list::{PositionStatus, PositionsList};

use crate::driver::ElementSnapshot;
use crate::locator::Locator;
use crate::page_object::UrlMatcher;
use crate::result::{NotFoundReason, ProbeError, ProbeResult};
use crate::session::Session;
use std::time::Duration;
use tokio::time::Instant;

/// Load verification for one page: every unmet condition becomes a
/// [`ProbeError::LoadTimeout`] naming the page and the condition
pub(crate) struct LoadCheck<'a> {
    session: &'a Session,
    page: &'static str,
}

impl<'a> LoadCheck<'a> {
    pub(crate) const fn new(session: &'a Session, page: &'static str) -> Self {
        Self { session, page }
    }

    fn timed_out(&self, condition: &str, waited: Duration, err: ProbeError) -> ProbeError {
        match err {
            ProbeError::ElementNotFound {
                reason: NotFoundReason::Ambiguous(_),
                ..
            }
            | ProbeError::Driver { .. }
            | ProbeError::Navigation { .. } => err,
            other => ProbeError::LoadTimeout {
                page: self.page.to_string(),
                condition: format!("{condition} ({other})"),
                waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            },
        }
    }

    pub(crate) async fn url(&self, matcher: &UrlMatcher) -> ProbeResult<String> {
        let start = Instant::now();
        self.session
            .expect_url(matcher)
            .await
            .map_err(|e| {
                self.timed_out(&format!("URL matches {}", matcher.pattern()), start.elapsed(), e)
            })
    }

    pub(crate) async fn visible(&self, locator: &Locator, condition: &str) -> ProbeResult<ElementSnapshot> {
        let start = Instant::now();
        self.session
            .expect(locator)
            .to_be_visible()
            .await
            .map_err(|e| self.timed_out(condition, start.elapsed(), e))
    }

    pub(crate) async fn text(&self, locator: &Locator, expected: &str, condition: &str) -> ProbeResult<()> {
        let start = Instant::now();
        self.session
            .expect(locator)
            .to_have_text(expected)
            .await
            .map_err(|e| self.timed_out(condition, start.elapsed(), e))
    }
}
