use super::LoadCheck;
use crate::locator::{Locator, Selector};
use crate::page_object::{PageObject, PageState, StateCell, UrlMatcher};
use crate::resolver::{any_position_card, position_card_locator};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Status values offered by the status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    /// Accepting candidates
    Open,
    /// Hired
    Filled,
    /// Closed without hire
    Closed,
    /// Not published
    Draft,
}

impl PositionStatus {
    /// Option value in the select
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Filled => "filled",
            Self::Closed => "closed",
            Self::Draft => "draft",
        }
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionStatus {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "filled" => Ok(Self::Filled),
            "closed" => Ok(Self::Closed),
            "draft" => Ok(Self::Draft),
            other => Err(ProbeError::Config {
                message: format!("unknown position status {other:?}"),
            }),
        }
    }
}

/// Positions list at `/positions`
#[derive(Debug)]
pub struct PositionsList<'a> {
    session: &'a Session,
    state: StateCell,
}

impl<'a> PositionsList<'a> {
    /// Canonical path
    pub const PATH: &'static str = "/positions";
    /// Exact heading text
    pub const TITLE: &'static str = "Posiciones";

    /// Wrap the session
    #[must_use]
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            state: StateCell::default(),
        }
    }

    /// Page container
    #[must_use]
    pub fn container(&self) -> Locator {
        Locator::test_id("positions-page")
    }

    /// Page heading
    #[must_use]
    pub fn title(&self) -> Locator {
        Locator::test_id("positions-title")
    }

    /// Back to dashboard button
    #[must_use]
    pub fn back_button(&self) -> Locator {
        Locator::test_id("back-to-dashboard-btn")
    }

    /// List container
    #[must_use]
    pub fn list(&self) -> Locator {
        Locator::test_id("positions-list")
    }

    /// Title search input
    #[must_use]
    pub fn search_input(&self) -> Locator {
        Locator::from_selector(Selector::Placeholder("Buscar por título".to_string()))
    }

    /// Date filter input
    #[must_use]
    pub fn date_input(&self) -> Locator {
        Locator::new(r#"input[type="date"]"#)
    }

    /// Status filter select
    #[must_use]
    pub fn status_select(&self) -> Locator {
        Locator::new("select").with_text("Estado")
    }

    /// Manager filter select
    #[must_use]
    pub fn manager_select(&self) -> Locator {
        Locator::new("select").with_text("Manager")
    }

    /// Every position card
    #[must_use]
    pub fn position_cards(&self) -> Locator {
        any_position_card()
    }

    /// Card of one position
    #[must_use]
    pub fn position_card(&self, id: u64) -> Locator {
        position_card_locator(id)
    }

    /// "Ver proceso" button inside a position card
    #[must_use]
    pub fn view_process_button(&self, id: u64) -> Locator {
        self.position_card(id)
            .locator(Selector::role("button", "ver proceso"))
    }

    /// Open a position's kanban board
    pub async fn click_position(&self, id: u64) -> ProbeResult<()> {
        let _ = self
            .session
            .expect(&self.position_card(id))
            .named(format!("position card {id}"))
            .to_be_visible()
            .await?;
        self.state.reset();
        self.session
            .click(&self.view_process_button(id), "view process button")
            .await
    }

    /// The list is visible and holds at least one card
    pub async fn verify_positions_displayed(&self) -> ProbeResult<()> {
        let _ = self
            .session
            .expect(&self.list())
            .named("positions list")
            .to_be_visible()
            .await?;
        let _ = self
            .session
            .expect(&self.position_cards().first())
            .named("first position card")
            .to_be_visible()
            .await?;
        Ok(())
    }

    /// Search, date, status and manager controls are visible
    pub async fn verify_filter_controls_visible(&self) -> ProbeResult<()> {
        let controls = [
            (self.search_input(), "title search input"),
            (self.date_input(), "date input"),
            (self.status_select(), "status select"),
            (self.manager_select(), "manager select"),
        ];
        for (locator, what) in &controls {
            let _ = self
                .session
                .expect(locator)
                .named(*what)
                .to_be_visible()
                .await?;
        }
        Ok(())
    }

    /// Type into the title search
    pub async fn search_by_title(&self, title: &str) -> ProbeResult<()> {
        self.session
            .fill(&self.search_input(), "title search input", title)
            .await
    }

    /// Empty the title search
    pub async fn clear_search(&self) -> ProbeResult<()> {
        self.search_by_title("").await
    }

    /// Pick a status in the status filter
    pub async fn filter_by_status(&self, status: PositionStatus) -> ProbeResult<()> {
        self.session
            .select_option(&self.status_select(), "status select", status.as_str())
            .await
    }

    /// Reset the status filter
    pub async fn clear_status_filter(&self) -> ProbeResult<()> {
        self.session
            .select_option(&self.status_select(), "status select", "")
            .await
    }

    /// Return to the dashboard
    pub async fn go_back_to_dashboard(&self) -> ProbeResult<()> {
        self.state.reset();
        self.session
            .click(&self.back_button(), "back to dashboard button")
            .await
    }

    /// Cards currently rendered
    pub async fn position_count(&self) -> ProbeResult<usize> {
        self.session.count(&self.position_cards()).await
    }

    /// Title of the card at `index`, trimmed
    pub async fn position_title(&self, index: usize) -> ProbeResult<String> {
        let card = self.position_cards().nth(index);
        let _ = self
            .session
            .expect(&card)
            .named(format!("position card #{index}"))
            .to_be_visible()
            .await?;
        let title = card
            .locator(Selector::css(".card-title, h5, h4"))
            .first();
        let snapshot = self.session.snapshot(&title, "position title").await?;
        Ok(snapshot.trimmed_text().to_string())
    }
}

#[async_trait]
impl<'a> PageObject for PositionsList<'a> {
    fn page_name(&self) -> &'static str {
        "PositionsList"
    }

    fn url_pattern(&self) -> UrlMatcher {
        UrlMatcher::new(Self::PATH)
    }

    fn state(&self) -> PageState {
        self.state.get()
    }

    async fn goto(&self) -> ProbeResult<()> {
        self.state.reset();
        self.session.goto(Self::PATH).await
    }

    async fn verify_page_loaded(&self) -> ProbeResult<()> {
        let check = LoadCheck::new(self.session, self.page_name());
        let _ = check.url(&self.url_pattern()).await?;
        let _ = check
            .visible(&self.container(), "positions page container visible")
            .await?;
        let _ = check.visible(&self.title(), "positions title visible").await?;
        check
            .text(&self.title(), Self::TITLE, "positions title reads \"Posiciones\"")
            .await?;
        self.state.promote();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::mock::{MockApp, MockDriver, MockFault, MockPosition};
    use std::sync::Arc;

    fn session_with(app: MockApp, faults: Vec<MockFault>) -> Session {
        let driver = MockDriver::new(app).with_faults(faults);
        Session::new(Box::new(driver), Arc::new(HarnessConfig::fast()))
    }

    async fn loaded(session: &Session) -> PositionsList<'_> {
        let page = PositionsList::new(session);
        page.goto().await.unwrap();
        page.verify_page_loaded().await.unwrap();
        page
    }

    mod load_tests {
        use super::*;

        #[tokio::test]
        async fn test_loads_and_lists() {
            let session = session_with(MockApp::seeded(), vec![]);
            let page = loaded(&session).await;
            assert_eq!(page.state(), PageState::Verified);
            page.verify_positions_displayed().await.unwrap();
            page.verify_filter_controls_visible().await.unwrap();
            assert_eq!(page.position_count().await.unwrap(), 3);
            assert_eq!(page.position_title(1).await.unwrap(), "Data Scientist");
        }

        #[tokio::test]
        async fn test_goto_verify_twice_is_idempotent() {
            let session = session_with(MockApp::seeded(), vec![]);
            let page = loaded(&session).await;
            page.goto().await.unwrap();
            assert_eq!(page.state(), PageState::Unverified);
            page.verify_page_loaded().await.unwrap();
            assert_eq!(page.state(), PageState::Verified);
        }

        #[tokio::test]
        async fn test_slow_render_is_polled() {
            let session = session_with(MockApp::seeded(), vec![MockFault::LateRender { polls: 4 }]);
            let page = loaded(&session).await;
            assert_eq!(page.state(), PageState::Verified);
        }

        #[tokio::test]
        async fn test_hidden_title_names_condition() {
            let session = session_with(MockApp::seeded(), vec![MockFault::Hide("positions-title".into())]);
            let page = PositionsList::new(&session);
            page.goto().await.unwrap();
            let err = page.verify_page_loaded().await.unwrap_err();
            assert!(err.to_string().contains("positions title visible"));
            assert_eq!(page.state(), PageState::Unverified);
        }

        #[tokio::test]
        async fn test_empty_list_fails_display_check() {
            let session = session_with(MockApp::new(), vec![]);
            let page = loaded(&session).await;
            let err = page.verify_positions_displayed().await.unwrap_err();
            assert!(err.to_string().contains("first position card"));
        }
    }

    mod interaction_tests {
        use super::*;

        #[tokio::test]
        async fn test_click_position() {
            let session = session_with(MockApp::seeded(), vec![]);
            let page = loaded(&session).await;
            page.click_position(2).await.unwrap();
            assert_eq!(session.current_path().await.unwrap(), "/positions/2");
            assert_eq!(page.state(), PageState::Unverified);
        }

        #[tokio::test]
        async fn test_click_unknown_position() {
            let session = session_with(MockApp::seeded(), vec![]);
            let page = loaded(&session).await;
            let err = page.click_position(99).await.unwrap_err();
            assert!(err.to_string().contains("position card 99"));
        }

        #[tokio::test]
        async fn test_back_to_dashboard() {
            let session = session_with(MockApp::seeded(), vec![]);
            let page = loaded(&session).await;
            page.go_back_to_dashboard().await.unwrap();
            assert_eq!(session.current_path().await.unwrap(), "/");
        }

        #[tokio::test]
        async fn test_search_and_filter_controls_accept_input() {
            let session = session_with(
                MockApp::new().position(MockPosition::new(5, "Backend Developer")),
                vec![],
            );
            let page = loaded(&session).await;
            page.search_by_title("Developer").await.unwrap();
            page.filter_by_status(PositionStatus::Open).await.unwrap();
            page.clear_status_filter().await.unwrap();
            page.clear_search().await.unwrap();
        }
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Open".parse::<PositionStatus>().unwrap(), PositionStatus::Open);
        assert_eq!(PositionStatus::Draft.to_string(), "draft");
        assert!("archived".parse::<PositionStatus>().is_err());
    }
}
