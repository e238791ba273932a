//! Auto-retrying expectations.
//!
//! `expect(locator).to_be_visible()` style assertions. Each one re-queries
//! the locator on every poll. A strict locator that matches several elements
//! fails at once with [`NotFoundReason::Ambiguous`]; waiting cannot fix it.
//!
//! Text expectations compare with every whitespace run collapsed to one
//! space on both sides. Case is significant.

use crate::driver::{BrowserDriver, ElementSnapshot};
use crate::locator::Locator;
use crate::page_object::UrlMatcher;
use crate::result::{NotFoundReason, ProbeError, ProbeResult};
use crate::wait::{Check, Waiter};

/// A pending expectation on a locator
pub struct Expect<'a> {
    driver: &'a dyn BrowserDriver,
    locator: Locator,
    waiter: Waiter,
    what: Option<String>,
}

impl std::fmt::Debug for Expect<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expect")
            .field("locator", &self.locator.to_string())
            .field("waiter", &self.waiter)
            .field("what", &self.what)
            .finish_non_exhaustive()
    }
}

/// Resolve the element an element-level read applies to
fn single<'s>(
    locator: &Locator,
    matches: &'s [ElementSnapshot],
    what: &str,
) -> ProbeResult<Option<&'s ElementSnapshot>> {
    if locator.requires_unique() && matches.len() > 1 {
        return Err(ProbeError::ElementNotFound {
            what: what.to_string(),
            locator: locator.to_string(),
            reason: NotFoundReason::Ambiguous(matches.len()),
        });
    }
    Ok(matches.first())
}

/// Trim and collapse whitespace runs into single spaces
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn describe(matches: &[ElementSnapshot]) -> String {
    match matches.first() {
        None => "0 matches".to_string(),
        Some(el) if !el.visible => format!("{} match(es), hidden", matches.len()),
        Some(el) if !el.enabled => format!("{} match(es), disabled", matches.len()),
        Some(el) => format!("{} match(es), text {:?}", matches.len(), el.trimmed_text()),
    }
}

impl<'a> Expect<'a> {
    /// Create an expectation; the locator's own timeout overrides the waiter's
    #[must_use]
    pub fn new(driver: &'a dyn BrowserDriver, locator: &Locator, waiter: Waiter) -> Self {
        let waiter = locator
            .options()
            .timeout
            .map_or(waiter, |t| waiter.with_timeout(t));
        Self {
            driver,
            locator: locator.clone(),
            waiter,
            what: None,
        }
    }

    /// Name the element for failure messages; a named element that never
    /// appears is reported as not found rather than not visible
    #[must_use]
    pub fn named(mut self, what: impl Into<String>) -> Self {
        self.what = Some(what.into());
        self
    }

    /// Override the bound
    #[must_use]
    pub fn within(mut self, timeout: std::time::Duration) -> Self {
        self.waiter = self.waiter.with_timeout(timeout);
        self
    }

    fn label(&self) -> String {
        self.what
            .clone()
            .unwrap_or_else(|| self.locator.to_string())
    }

    /// Wait until the element is visible; returns its snapshot
    pub async fn to_be_visible(&self) -> ProbeResult<ElementSnapshot> {
        let driver = self.driver;
        let locator = &self.locator;
        let label = self.label();
        let label_ref = label.as_str();
        self.waiter
            .until(
                move || async move {
                    let matches = driver.query(locator).await?;
                    Ok(match single(locator, &matches, label_ref)? {
                        Some(el) if el.visible => Check::Ready(el.clone()),
                        _ => Check::Pending(describe(&matches)),
                    })
                },
                |elapsed| {
                    let nothing = elapsed.last == "0 matches";
                    match &self.what {
                        Some(what) if nothing => ProbeError::ElementNotFound {
                            what: what.clone(),
                            locator: locator.to_string(),
                            reason: NotFoundReason::Missing,
                        },
                        _ => ProbeError::ElementNotVisible {
                            locator: locator.to_string(),
                            waited_ms: elapsed.waited_ms,
                        },
                    }
                },
            )
            .await
    }

    /// Wait until the element is visible and enabled
    pub async fn to_be_enabled(&self) -> ProbeResult<ElementSnapshot> {
        let driver = self.driver;
        let locator = &self.locator;
        let label = self.label();
        let label_ref = label.as_str();
        self.waiter
            .until(
                move || async move {
                    let matches = driver.query(locator).await?;
                    Ok(match single(locator, &matches, label_ref)? {
                        Some(el) if el.visible && el.enabled => Check::Ready(el.clone()),
                        _ => Check::Pending(describe(&matches)),
                    })
                },
                |elapsed| match &self.what {
                    Some(what) if elapsed.last == "0 matches" => ProbeError::ElementNotFound {
                        what: what.clone(),
                        locator: locator.to_string(),
                        reason: NotFoundReason::Missing,
                    },
                    _ => ProbeError::AssertionFailed {
                        message: format!(
                            "{label_ref} not actionable after {}ms ({})",
                            elapsed.waited_ms, elapsed.last
                        ),
                    },
                },
            )
            .await
    }

    /// Wait until the text equals `expected`
    pub async fn to_have_text(&self, expected: &str) -> ProbeResult<()> {
        self.text_matches(expected, |actual, wanted| actual == wanted)
            .await
    }

    /// Wait until the text contains `expected`
    pub async fn to_contain_text(&self, expected: &str) -> ProbeResult<()> {
        self.text_matches(expected, |actual, wanted| actual.contains(wanted))
            .await
    }

    async fn text_matches<P>(&self, expected: &str, accept: P) -> ProbeResult<()>
    where
        P: Fn(&str, &str) -> bool + Send + Sync,
    {
        let driver = self.driver;
        let locator = &self.locator;
        let label = self.label();
        let label_ref = label.as_str();
        let wanted = collapse_whitespace(expected);
        let wanted_ref = wanted.as_str();
        let accept = &accept;
        self.waiter
            .until(
                move || async move {
                    let matches = driver.query(locator).await?;
                    Ok(match single(locator, &matches, label_ref)? {
                        Some(el) => {
                            let actual = collapse_whitespace(&el.text);
                            if accept(&actual, wanted_ref) {
                                Check::Ready(())
                            } else {
                                Check::Pending(actual)
                            }
                        }
                        None => Check::Pending(String::new()),
                    })
                },
                |elapsed| ProbeError::TextMismatch {
                    locator: locator.to_string(),
                    expected: expected.to_string(),
                    actual: elapsed.last,
                },
            )
            .await
    }

    /// Wait until exactly `expected` elements match
    pub async fn to_have_count(&self, expected: usize) -> ProbeResult<()> {
        let driver = self.driver;
        let locator = &self.locator;
        let label = self.label();
        self.waiter
            .until(
                move || async move {
                    let n = driver.query(locator).await?.len();
                    Ok(if n == expected {
                        Check::Ready(())
                    } else {
                        Check::Pending(n.to_string())
                    })
                },
                |elapsed| ProbeError::CountMismatch {
                    what: label,
                    expected,
                    actual: elapsed.last.parse().unwrap_or_default(),
                },
            )
            .await
    }
}

/// Wait until the current URL's path matches `matcher`
pub async fn expect_url(
    driver: &dyn BrowserDriver,
    matcher: &UrlMatcher,
    waiter: Waiter,
) -> ProbeResult<String> {
    waiter
        .until(
            move || async move {
                let url = driver.current_url().await?;
                Ok(if matcher.matches(&url) {
                    Check::Ready(url)
                } else {
                    Check::Pending(url)
                })
            },
            |elapsed| ProbeError::UrlMismatch {
                expected: matcher.pattern().to_string(),
                actual: elapsed.last,
            },
        )
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockApp, MockDriver, MockFault};
    use crate::resolver::{any_stage_column, candidate_card_locator, stage_column_locator};
    use std::time::Duration;

    fn waiter() -> Waiter {
        Waiter::new(Duration::from_millis(40), Duration::from_millis(5))
    }

    async fn on_board(faults: Vec<MockFault>) -> MockDriver {
        let driver = MockDriver::new(MockApp::seeded()).with_faults(faults);
        driver
            .navigate("http://talent.test/positions/1")
            .await
            .unwrap();
        driver
    }

    mod visibility_tests {
        use super::*;

        #[tokio::test]
        async fn test_visible_card() {
            let driver = on_board(vec![]).await;
            let snap = Expect::new(&driver, &candidate_card_locator(42), waiter())
                .to_be_visible()
                .await
                .unwrap();
            assert_eq!(snap.test_id.as_deref(), Some("candidate-card-42"));
        }

        #[tokio::test]
        async fn test_missing_named_element_is_not_found() {
            let driver = on_board(vec![]).await;
            let err = Expect::new(&driver, &candidate_card_locator(999), waiter())
                .named("drag source")
                .to_be_visible()
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ProbeError::ElementNotFound {
                    reason: NotFoundReason::Missing,
                    ..
                }
            ));
            assert!(err.to_string().contains("drag source"));
        }

        #[tokio::test]
        async fn test_hidden_element_times_out() {
            let driver = on_board(vec![MockFault::Hide("kanban-board".into())]).await;
            let err = Expect::new(&driver, &crate::locator::Locator::test_id("kanban-board"), waiter())
                .to_be_visible()
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotVisible { .. }));
        }

        #[tokio::test]
        async fn test_ambiguous_fails_fast() {
            let driver = on_board(vec![]).await;
            let err = Expect::new(&driver, &any_stage_column(), Waiter::new(Duration::from_secs(30), Duration::from_millis(5)))
                .to_be_visible()
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ProbeError::ElementNotFound {
                    reason: NotFoundReason::Ambiguous(_),
                    ..
                }
            ));
        }

        #[tokio::test]
        async fn test_first_relaxes_strictness() {
            let driver = on_board(vec![]).await;
            assert!(Expect::new(&driver, &any_stage_column().first(), waiter())
                .to_be_visible()
                .await
                .is_ok());
        }
    }

    mod text_and_count_tests {
        use super::*;
        use crate::resolver::stage_header_locator;

        #[tokio::test]
        async fn test_header_contains_title() {
            let driver = on_board(vec![]).await;
            Expect::new(&driver, &stage_header_locator("Initial Screening"), waiter())
                .to_contain_text("Initial Screening")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_text_compares_collapsed_whitespace() {
            let driver = on_board(vec![]).await;
            let header = stage_header_locator("Initial Screening");
            Expect::new(&driver, &header, waiter())
                .to_contain_text("Initial   Screening")
                .await
                .unwrap();
            Expect::new(&driver, &header, waiter())
                .to_have_text(" Initial\tScreening ")
                .await
                .unwrap();
            let err = Expect::new(&driver, &header, waiter())
                .to_contain_text("initial screening")
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::TextMismatch { .. }));
        }

        #[tokio::test]
        async fn test_text_mismatch_reports_actual() {
            let driver = on_board(vec![]).await;
            let err = Expect::new(&driver, &stage_header_locator("Offer"), waiter())
                .to_have_text("Hired")
                .await
                .unwrap_err();
            match err {
                ProbeError::TextMismatch { expected, actual, .. } => {
                    assert_eq!(expected, "Hired");
                    assert_eq!(actual, "Offer");
                }
                other => panic!("unexpected {other}"),
            }
        }

        #[tokio::test]
        async fn test_count() {
            let driver = on_board(vec![]).await;
            let cards = stage_column_locator("Initial Screening")
                .locator(crate::resolver::any_candidate_card());
            Expect::new(&driver, &cards, waiter())
                .to_have_count(1)
                .await
                .unwrap();
            let err = Expect::new(&driver, &cards, waiter())
                .to_have_count(3)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ProbeError::CountMismatch {
                    expected: 3,
                    actual: 1,
                    ..
                }
            ));
        }
    }

    mod url_tests {
        use super::*;

        #[tokio::test]
        async fn test_numeric_position_url() {
            let driver = on_board(vec![]).await;
            let url = expect_url(&driver, &UrlMatcher::new("/positions/#id"), waiter())
                .await
                .unwrap();
            assert!(url.ends_with("/positions/1"));
        }

        #[tokio::test]
        async fn test_url_mismatch() {
            let driver = on_board(vec![]).await;
            let err = expect_url(&driver, &UrlMatcher::new("/positions"), waiter())
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::UrlMismatch { .. }));
        }
    }
}
