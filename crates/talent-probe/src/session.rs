//! A browser session bound to the harness configuration.

use crate::assertion::{expect_url, Expect};
use crate::config::HarnessConfig;
use crate::driver::{BrowserDriver, ElementSnapshot, PointerEvent};
use crate::locator::Locator;
use crate::page_object::{path_of, UrlMatcher};
use crate::result::{NotFoundReason, ProbeError, ProbeResult};
use crate::wait::Waiter;
use std::sync::Arc;
use tracing::debug;

/// Driver plus configuration, shared by every page object of a scenario
pub struct Session {
    driver: Box<dyn BrowserDriver>,
    config: Arc<HarnessConfig>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Bind a driver to a configuration
    #[must_use]
    pub fn new(driver: Box<dyn BrowserDriver>, config: Arc<HarnessConfig>) -> Self {
        Self { driver, config }
    }

    /// Harness configuration
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &dyn BrowserDriver {
        self.driver.as_ref()
    }

    /// Poller bounded by the expectation timeout
    #[must_use]
    pub fn waiter(&self) -> Waiter {
        Waiter::from_timeouts(&self.config.timeouts)
    }

    /// Start an expectation on `locator`
    #[must_use]
    pub fn expect(&self, locator: &Locator) -> Expect<'_> {
        Expect::new(self.driver(), locator, self.waiter())
    }

    /// Wait for the URL path to match `matcher`
    pub async fn expect_url(&self, matcher: &UrlMatcher) -> ProbeResult<String> {
        expect_url(self.driver(), matcher, self.waiter()).await
    }

    /// Navigate to an application path relative to the base URL
    pub async fn goto(&self, path: &str) -> ProbeResult<()> {
        let url = self.config.url_for(path);
        debug!(%url, "navigate");
        let bound = self.config.timeouts.navigation();
        match tokio::time::timeout(bound, self.driver.navigate(&url)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Navigation {
                url,
                message: format!("no load event within {}ms", bound.as_millis()),
            }),
        }
    }

    /// Path of the current URL
    pub async fn current_path(&self) -> ProbeResult<String> {
        let url = self.driver.current_url().await?;
        Ok(path_of(&url).to_string())
    }

    /// Current number of matches; no waiting
    pub async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        Ok(self.driver.query(locator).await?.len())
    }

    /// Every current match; no waiting
    pub async fn query(&self, locator: &Locator) -> ProbeResult<Vec<ElementSnapshot>> {
        self.driver.query(locator).await
    }

    /// The single current match; no waiting
    pub async fn snapshot(&self, locator: &Locator, what: &str) -> ProbeResult<ElementSnapshot> {
        let mut matches = self.driver.query(locator).await?;
        let reason = match matches.len() {
            0 => NotFoundReason::Missing,
            1 => return Ok(matches.remove(0)),
            _ if !locator.requires_unique() => return Ok(matches.remove(0)),
            n => NotFoundReason::Ambiguous(n),
        };
        Err(ProbeError::ElementNotFound {
            what: what.to_string(),
            locator: locator.to_string(),
            reason,
        })
    }

    /// Wait for the element to be actionable
    async fn actionable(&self, locator: &Locator, what: &str) -> ProbeResult<()> {
        self.expect(locator)
            .within(self.config.timeouts.action())
            .named(what)
            .to_be_enabled()
            .await
            .map(|_| ())
    }

    /// Click once the element is visible and enabled
    pub async fn click(&self, locator: &Locator, what: &str) -> ProbeResult<()> {
        self.actionable(locator, what).await?;
        debug!(%locator, what, "click");
        self.driver.click(locator).await
    }

    /// Fill an input once it is actionable
    pub async fn fill(&self, locator: &Locator, what: &str, text: &str) -> ProbeResult<()> {
        self.actionable(locator, what).await?;
        debug!(%locator, what, text, "fill");
        self.driver.fill(locator, text).await
    }

    /// Choose a select option once it is actionable
    pub async fn select_option(&self, locator: &Locator, what: &str, value: &str) -> ProbeResult<()> {
        self.actionable(locator, what).await?;
        debug!(%locator, what, value, "select");
        self.driver.select_option(locator, value).await
    }

    /// Dispatch a pointer event
    pub async fn pointer(&self, event: PointerEvent) -> ProbeResult<()> {
        self.driver.dispatch_pointer(event).await
    }

    /// Release the browser
    pub async fn close(&self) -> ProbeResult<()> {
        self.driver.close().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockApp, MockDriver};
    use crate::resolver::{any_stage_column, candidate_card_locator};

    fn session() -> (Session, MockDriver) {
        let driver = MockDriver::new(MockApp::seeded());
        let session = Session::new(Box::new(driver.clone()), Arc::new(HarnessConfig::fast()));
        (session, driver)
    }

    #[tokio::test]
    async fn test_goto_uses_base_url() {
        let (session, driver) = session();
        session.goto("/positions").await.unwrap();
        assert_eq!(session.current_path().await.unwrap(), "/positions");
        assert!(driver.was_called("navigate:http://talent.test/positions"));
    }

    #[tokio::test]
    async fn test_snapshot_strictness() {
        let (session, _) = session();
        session.goto("/positions/1").await.unwrap();
        assert!(session
            .snapshot(&candidate_card_locator(42), "card")
            .await
            .is_ok());
        let err = session
            .snapshot(&any_stage_column(), "column")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProbeError::ElementNotFound {
                reason: NotFoundReason::Ambiguous(_),
                ..
            }
        ));
        let err = session
            .snapshot(&candidate_card_locator(1000), "card")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProbeError::ElementNotFound {
                reason: NotFoundReason::Missing,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_click_missing_element_names_it() {
        let (session, _) = session();
        session.goto("/").await.unwrap();
        let err = session
            .click(&Locator::test_id("nope"), "ghost button")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ghost button"));
    }
}
