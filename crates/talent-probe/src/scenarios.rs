//! The recruitment pipeline scenario catalog.
//!
//! Scenarios read the exercised position from [`SeedExpectations`] and turn
//! seed data that cannot exercise them into [`ProbeError::PreconditionUnmet`].
//!
//! [`SeedExpectations`]: crate::config::SeedExpectations

use crate::locator::Locator;
use crate::page_object::{PageObject, UrlMatcher};
use crate::pages::{Dashboard, PositionDetails, PositionStatus, PositionsList};
use crate::resolver::{any_candidate_card, any_stage_column, any_stage_header, token_collisions};
use crate::result::{ProbeError, ProbeResult};
use crate::scenario::Scenario;
use crate::session::Session;
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

const FEATURE_MISSING: &str = "positions filtering is not implemented in the frontend";

/// Every scenario, in suite order
#[must_use]
pub fn catalog() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(PositionsPageLoads),
        Box::new(DragCandidateToNextStage),
        Box::new(NavigationWorkflow),
        Box::new(FilterPositionsByStatus),
        Box::new(SearchPositionsByTitle),
        Box::new(CandidatesAcrossStages),
        Box::new(PositionDetailsDisplay),
        Box::new(EmptySearchResults),
        Box::new(CandidateCardInformation),
        Box::new(RoundTripConservation),
    ]
}

/// Positions list, then the configured position's board, verified
async fn open_board(session: &Session) -> ProbeResult<PositionDetails<'_>> {
    let id = session.config().seed.position_id;
    let list = PositionsList::new(session);
    list.goto().await?;
    list.verify_page_loaded().await?;
    list.click_position(id).await?;

    let board = PositionDetails::new(session, id);
    board.verify_page_loaded().await?;
    Ok(board)
}

/// Stage titles of the board, refusing boards a move cannot be tested on
async fn movable_stages(session: &Session, board: &PositionDetails<'_>) -> ProbeResult<Vec<String>> {
    let min = session.config().seed.min_stages.max(2);
    let titles = board.stage_titles().await?;
    if titles.len() < min {
        return Err(ProbeError::precondition(format!(
            "position {} has {} stage(s), need at least {min}",
            board.position_id(),
            titles.len()
        )));
    }
    if let Some((token, clashing)) = token_collisions(titles.iter().map(String::as_str))
        .into_iter()
        .next()
    {
        return Err(ProbeError::precondition(format!(
            "stage titles {clashing:?} share the marker token {token:?}"
        )));
    }
    Ok(titles)
}

/// Positions page shows its title, cards, filter controls and back button
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionsPageLoads;

#[async_trait]
impl Scenario for PositionsPageLoads {
    fn name(&self) -> &'static str {
        "positions page loads with visible elements"
    }

    async fn run(&self, session: &Session) -> ProbeResult<()> {
        let page = PositionsList::new(session);
        page.goto().await?;
        page.verify_page_loaded().await?;
        page.verify_positions_displayed().await?;

        for (locator, what) in [
            (page.search_input(), "title search input"),
            (page.status_select(), "status select"),
            (page.manager_select(), "manager select"),
            (page.back_button(), "back to dashboard button"),
        ] {
            let _ = session.expect(&locator).named(what).to_be_visible().await?;
        }
        Ok(())
    }
}

/// Drag the first card of the first stage into the second stage
#[derive(Debug, Clone, Copy, Default)]
pub struct DragCandidateToNextStage;

#[async_trait]
impl Scenario for DragCandidateToNextStage {
    fn name(&self) -> &'static str {
        "candidate changes stage via drag and drop"
    }

    async fn run(&self, session: &Session) -> ProbeResult<()> {
        let board = open_board(session).await?;

        let min = session.config().seed.min_stages.max(2);
        let columns = session.count(&any_stage_column()).await?;
        if columns < min {
            return Err(ProbeError::precondition(format!(
                "board shows {columns} stage column(s), need at least {min}"
            )));
        }

        let mut headers = Vec::with_capacity(2);
        for index in 0..2 {
            let header = any_stage_column().nth(index).locator(any_stage_header());
            let snapshot = session
                .expect(&header)
                .named(format!("header of stage #{index}"))
                .to_be_visible()
                .await?;
            headers.push(snapshot.trimmed_text().to_string());
        }
        if headers.iter().any(String::is_empty) {
            return Err(ProbeError::precondition("stage headers carry no title"));
        }
        let _ = movable_stages(session, &board).await?;
        let (first, second) = (&headers[0], &headers[1]);

        let Some(candidate) = board.candidate_ids_in_stage(first).await?.into_iter().next() else {
            return Err(ProbeError::precondition(format!(
                "no candidates in first stage {first:?}"
            )));
        };
        debug!(%candidate, from = %first, to = %second, "moving first candidate");

        let report = board.move_candidate(&candidate, second).await?;
        debug!(after = %report.after, "board after move");
        Ok(())
    }
}

/// Dashboard to positions to details and back again
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationWorkflow;

#[async_trait]
impl Scenario for NavigationWorkflow {
    fn name(&self) -> &'static str {
        "navigates through the position workflow"
    }

    async fn run(&self, session: &Session) -> ProbeResult<()> {
        let dashboard = Dashboard::new(session);
        dashboard.goto().await?;
        dashboard.verify_page_loaded().await?;

        dashboard.go_to_positions().await?;
        let list = PositionsList::new(session);
        list.verify_page_loaded().await?;

        let id = session.config().seed.position_id;
        list.click_position(id).await?;
        let board = PositionDetails::new(session, id);
        board.verify_page_loaded().await?;
        let _ = session
            .expect(&board.kanban_board())
            .named("kanban board")
            .to_be_visible()
            .await?;

        board.go_back_to_positions().await?;
        let _ = session.expect_url(&UrlMatcher::new(PositionsList::PATH)).await?;
        let _ = session
            .expect(&list.container())
            .named("positions page container")
            .to_be_visible()
            .await?;

        list.go_back_to_dashboard().await?;
        let _ = session.expect_url(&UrlMatcher::new(Dashboard::PATH)).await?;
        Ok(())
    }
}

/// Status filter narrows the list and clearing it restores the list
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterPositionsByStatus;

#[async_trait]
impl Scenario for FilterPositionsByStatus {
    fn name(&self) -> &'static str {
        "filters positions by status"
    }

    fn disabled(&self) -> Option<&'static str> {
        Some(FEATURE_MISSING)
    }

    async fn run(&self, session: &Session) -> ProbeResult<()> {
        let page = PositionsList::new(session);
        page.goto().await?;
        page.verify_page_loaded().await?;
        page.verify_positions_displayed().await?;
        let initial = page.position_count().await?;

        page.filter_by_status(PositionStatus::Open).await?;
        let filtered = page.position_count().await?;
        if filtered > initial {
            return Err(ProbeError::AssertionFailed {
                message: format!("status filter grew the list from {initial} to {filtered}"),
            });
        }

        page.clear_status_filter().await?;
        session
            .expect(&page.position_cards())
            .named("position cards")
            .to_have_count(initial)
            .await
    }
}

/// Title search keeps only matching positions
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPositionsByTitle;

impl SearchPositionsByTitle {
    const TERM: &'static str = "Developer";
}

#[async_trait]
impl Scenario for SearchPositionsByTitle {
    fn name(&self) -> &'static str {
        "searches positions by title"
    }

    fn disabled(&self) -> Option<&'static str> {
        Some(FEATURE_MISSING)
    }

    async fn run(&self, session: &Session) -> ProbeResult<()> {
        let page = PositionsList::new(session);
        page.goto().await?;
        page.verify_page_loaded().await?;

        page.search_by_title(Self::TERM).await?;
        if page.position_count().await? > 0 {
            let title = page.position_title(0).await?;
            if !title.to_lowercase().contains(&Self::TERM.to_lowercase()) {
                return Err(ProbeError::TextMismatch {
                    locator: "first position title".to_string(),
                    expected: Self::TERM.to_string(),
                    actual: title,
                });
            }
        }

        page.clear_search().await?;
        page.verify_positions_displayed().await
    }
}

/// Every stage renders a header and the board holds candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidatesAcrossStages;

#[async_trait]
impl Scenario for CandidatesAcrossStages {
    fn name(&self) -> &'static str {
        "displays candidates across all interview stages"
    }

    async fn run(&self, session: &Session) -> ProbeResult<()> {
        let board = open_board(session).await?;
        let titles = movable_stages(session, &board).await?;

        let mut total = 0;
        for title in &titles {
            let _ = session
                .expect(&board.stage_header(title))
                .named(format!("stage header {title:?}"))
                .to_be_visible()
                .await?;
            total += board.count_candidates_in_stage(title).await?;
        }
        if total == 0 {
            return Err(ProbeError::precondition(format!(
                "position {} has no candidates",
                board.position_id()
            )));
        }
        Ok(())
    }
}

/// Details page shows the board, a back button and a numeric URL
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionDetailsDisplay;

#[async_trait]
impl Scenario for PositionDetailsDisplay {
    fn name(&self) -> &'static str {
        "displays position details"
    }

    async fn run(&self, session: &Session) -> ProbeResult<()> {
        let board = open_board(session).await?;
        let _ = session
            .expect(&board.kanban_board())
            .named("kanban board")
            .to_be_visible()
            .await?;
        let _ = session
            .expect(&board.back_button_by_role())
            .named("back button")
            .to_be_visible()
            .await?;
        let _ = session.expect_url(&board.url_pattern()).await?;
        Ok(())
    }
}

/// A search with no hits empties the list and clearing it recovers
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySearchResults;

#[async_trait]
impl Scenario for EmptySearchResults {
    fn name(&self) -> &'static str {
        "handles empty search results"
    }

    fn disabled(&self) -> Option<&'static str> {
        Some(FEATURE_MISSING)
    }

    async fn run(&self, session: &Session) -> ProbeResult<()> {
        let page = PositionsList::new(session);
        page.goto().await?;
        page.verify_page_loaded().await?;

        page.search_by_title("XYZ_NONEXISTENT_POSITION_12345").await?;
        session
            .expect(&page.position_cards())
            .named("position cards")
            .to_have_count(0)
            .await?;

        page.clear_search().await?;
        page.verify_positions_displayed().await
    }
}

/// First card carries a numeric marker and accepts input
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateCardInformation;

#[async_trait]
impl Scenario for CandidateCardInformation {
    fn name(&self) -> &'static str {
        "displays candidate card information"
    }

    async fn run(&self, session: &Session) -> ProbeResult<()> {
        let _board = open_board(session).await?;

        let cards = Locator::from_selector(any_candidate_card()).with_strict(false);
        if session.count(&cards).await? == 0 {
            return Err(ProbeError::precondition("no candidate cards on the board"));
        }

        let card = cards.first();
        let snapshot = session
            .expect(&card)
            .named("first candidate card")
            .to_be_visible()
            .await?;
        let marker = snapshot.test_id.unwrap_or_default();
        let numeric = Regex::new(r"^candidate-card-\d+$").map_err(|e| ProbeError::AssertionFailed {
            message: e.to_string(),
        })?;
        if !numeric.is_match(&marker) {
            return Err(ProbeError::AssertionFailed {
                message: format!("candidate card marker {marker:?} is not candidate-card-<digits>"),
            });
        }

        let _ = session
            .expect(&card)
            .named("first candidate card")
            .to_be_enabled()
            .await?;
        Ok(())
    }
}

/// Move a candidate out and back; the board ends where it started
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundTripConservation;

#[async_trait]
impl Scenario for RoundTripConservation {
    fn name(&self) -> &'static str {
        "conserves candidates across a round trip"
    }

    async fn run(&self, session: &Session) -> ProbeResult<()> {
        let board = open_board(session).await?;
        let titles = movable_stages(session, &board).await?;

        let mut source = None;
        for title in &titles {
            if let Some(id) = board.candidate_ids_in_stage(title).await?.into_iter().next() {
                source = Some((title.clone(), id));
                break;
            }
        }
        let Some((home, candidate)) = source else {
            return Err(ProbeError::precondition(format!(
                "position {} has no candidates",
                board.position_id()
            )));
        };
        let Some(away) = titles.iter().find(|t| *t != &home) else {
            return Err(ProbeError::precondition("no second stage to move into"));
        };

        let out = board.move_candidate(&candidate, away).await?;
        let back = board.move_candidate(&candidate, &home).await?;

        if back.after != out.before {
            return Err(ProbeError::ConservationViolated {
                message: format!(
                    "board did not return to its starting counts: before {}, after {}",
                    out.before, back.after
                ),
            });
        }
        board.verify_candidate_in_stage(&candidate, &home).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::mock::{MockApp, MockDriver, MockFault, MockPosition};
    use std::sync::Arc;

    fn session_on(app: MockApp, config: HarnessConfig) -> (Session, MockDriver) {
        let driver = MockDriver::new(app);
        let session = Session::new(Box::new(driver.clone()), Arc::new(config));
        (session, driver)
    }

    fn seeded() -> (Session, MockDriver) {
        session_on(MockApp::seeded(), HarnessConfig::fast())
    }

    mod catalog_tests {
        use super::*;
        use std::collections::HashSet;

        #[test]
        fn test_ten_unique_names() {
            let scenarios = catalog();
            assert_eq!(scenarios.len(), 10);
            let names: HashSet<_> = scenarios.iter().map(|s| s.name()).collect();
            assert_eq!(names.len(), 10);
        }

        #[test]
        fn test_exactly_the_search_and_filter_scenarios_are_disabled() {
            let disabled: Vec<_> = catalog()
                .iter()
                .filter(|s| s.disabled().is_some())
                .map(|s| s.name())
                .collect();
            assert_eq!(
                disabled,
                [
                    "filters positions by status",
                    "searches positions by title",
                    "handles empty search results"
                ]
            );
        }
    }

    mod drag_scenario_tests {
        use super::*;

        #[tokio::test]
        async fn test_moves_first_candidate_of_first_stage() {
            let (session, driver) = seeded();
            DragCandidateToNextStage.run(&session).await.unwrap();
            let board = driver.app();
            let position = board.find(1).unwrap();
            assert_eq!(position.stage_of(42), Some(1));
        }

        #[tokio::test]
        async fn test_single_stage_is_precondition() {
            let app = MockApp::new().position(MockPosition::new(1, "Solo").stage("Only", [(5, "Eve")]));
            let (session, driver) = session_on(app, HarnessConfig::fast());
            let err = DragCandidateToNextStage.run(&session).await.unwrap_err();
            assert!(err.is_precondition());
            assert!(driver.pointer_events().is_empty());
        }

        #[tokio::test]
        async fn test_empty_first_stage_is_precondition() {
            let app = MockApp::new().position(
                MockPosition::new(1, "Backend")
                    .stage("Applied", [])
                    .stage("Offer", [(9, "Linus")]),
            );
            let (session, _) = session_on(app, HarnessConfig::fast());
            let err = DragCandidateToNextStage.run(&session).await.unwrap_err();
            assert!(err.to_string().contains("Applied"));
            assert!(err.is_precondition());
        }

        #[tokio::test]
        async fn test_colliding_titles_are_precondition() {
            let app = MockApp::new().position(
                MockPosition::new(1, "Backend")
                    .stage("Phone Screen", [(1, "A")])
                    .stage("phone  screen", []),
            );
            let (session, _) = session_on(app, HarnessConfig::fast());
            let err = DragCandidateToNextStage.run(&session).await.unwrap_err();
            assert!(err.is_precondition());
            assert!(err.to_string().contains("phone-screen"));
        }

        #[tokio::test]
        async fn test_ignored_drop_fails() {
            let (session, driver) = seeded();
            driver.inject(MockFault::IgnoreDrops);
            let err = DragCandidateToNextStage.run(&session).await.unwrap_err();
            assert!(!err.is_precondition());
        }

        #[tokio::test]
        async fn test_round_trip_restores_board() {
            let (session, driver) = seeded();
            let before = driver.app().find(1).unwrap().counts();
            RoundTripConservation.run(&session).await.unwrap();
            assert_eq!(driver.app().find(1).unwrap().counts(), before);
            assert_eq!(driver.app().find(1).unwrap().stage_of(42), Some(0));
        }
    }

    mod page_scenario_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigation_ends_on_dashboard() {
            let (session, _) = seeded();
            NavigationWorkflow.run(&session).await.unwrap();
            assert_eq!(session.current_path().await.unwrap(), "/");
        }

        #[tokio::test]
        async fn test_details_display_for_configured_position() {
            let (session, _) = session_on(MockApp::seeded(), HarnessConfig::fast().with_position_id(2));
            PositionDetailsDisplay.run(&session).await.unwrap();
            assert_eq!(session.current_path().await.unwrap(), "/positions/2");
        }

        #[tokio::test]
        async fn test_card_marker_must_be_numeric() {
            let (session, _) = seeded();
            CandidateCardInformation.run(&session).await.unwrap();

            let app = MockApp::new().position(
                MockPosition::new(1, "Backend")
                    .stage("Applied", [])
                    .stage("Offer", []),
            );
            let (session, _) = session_on(app, HarnessConfig::fast());
            let err = CandidateCardInformation.run(&session).await.unwrap_err();
            assert!(err.is_precondition());
        }

        #[tokio::test]
        async fn test_disabled_card_fails() {
            let (session, driver) = seeded();
            driver.inject(MockFault::Disable("candidate-card-42".into()));
            let err = CandidateCardInformation.run(&session).await.unwrap_err();
            assert!(!err.is_precondition());
        }

        #[tokio::test]
        async fn test_empty_board_skips_candidates_scenario() {
            let (session, _) = session_on(MockApp::seeded(), HarnessConfig::fast().with_position_id(2));
            CandidatesAcrossStages.run(&session).await.unwrap();

            let app = MockApp::new().position(
                MockPosition::new(1, "Backend")
                    .stage("Applied", [])
                    .stage("Offer", []),
            );
            let (session, _) = session_on(app, HarnessConfig::fast());
            assert!(CandidatesAcrossStages
                .run(&session)
                .await
                .unwrap_err()
                .is_precondition());
        }

        #[tokio::test]
        async fn test_filter_body_runs_against_static_list() {
            let (session, driver) = seeded();
            FilterPositionsByStatus.run(&session).await.unwrap();
            assert!(driver.was_called("select:"));
        }
    }
}
