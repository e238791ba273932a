use super::LoadCheck;
use crate::drag::{drag_to, DragPlan};
use crate::locator::Locator;
use crate::page_object::{PageObject, PageState, StateCell, UrlMatcher};
use crate::resolver::{
    any_candidate_card, any_stage_column, any_stage_header, candidate_card_locator,
    candidate_id_from_marker, candidate_name_locator, stage_column_locator, stage_header_locator,
    stage_token,
};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::transition::{verify_conservation, StageCounts, StageMove, TransitionReport};
use async_trait::async_trait;
use tracing::info;

/// Kanban board of one position at `/positions/<id>`
#[derive(Debug)]
pub struct PositionDetails<'a> {
    session: &'a Session,
    position_id: u64,
    state: StateCell,
}

impl<'a> PositionDetails<'a> {
    /// Wrap the session for one position
    #[must_use]
    pub fn new(session: &'a Session, position_id: u64) -> Self {
        Self {
            session,
            position_id,
            state: StateCell::default(),
        }
    }

    /// Position shown by this page
    #[must_use]
    pub const fn position_id(&self) -> u64 {
        self.position_id
    }

    /// Canonical path
    #[must_use]
    pub fn path(&self) -> String {
        format!("/positions/{}", self.position_id)
    }

    /// Page container
    #[must_use]
    pub fn container(&self) -> Locator {
        Locator::test_id("position-details-page")
    }

    /// Position name heading
    #[must_use]
    pub fn position_name(&self) -> Locator {
        Locator::test_id("position-name")
    }

    /// Back to positions button
    #[must_use]
    pub fn back_button(&self) -> Locator {
        Locator::test_id("back-to-positions-btn")
    }

    /// Any back button, by accessible name
    #[must_use]
    pub fn back_button_by_role(&self) -> Locator {
        Locator::role("button", "back|volver")
    }

    /// Kanban board
    #[must_use]
    pub fn kanban_board(&self) -> Locator {
        Locator::test_id("kanban-board")
    }

    /// Column of a stage
    #[must_use]
    pub fn stage_column(&self, title: &str) -> Locator {
        stage_column_locator(title)
    }

    /// Header of a stage
    #[must_use]
    pub fn stage_header(&self, title: &str) -> Locator {
        stage_header_locator(title)
    }

    /// Card of a candidate, wherever it is
    #[must_use]
    pub fn candidate_card(&self, id: &str) -> Locator {
        candidate_card_locator(id)
    }

    /// Name label of a candidate
    #[must_use]
    pub fn candidate_name(&self, id: &str) -> Locator {
        candidate_name_locator(id)
    }

    /// Every card inside a stage column; re-evaluated on each use
    #[must_use]
    pub fn candidates_in_stage(&self, title: &str) -> Locator {
        self.stage_column(title).locator(any_candidate_card())
    }

    /// Verify the page, and that the heading reads `expected_name` exactly
    pub async fn verify_page_loaded_with_name(&self, expected_name: &str) -> ProbeResult<()> {
        self.verify_page_loaded().await?;
        LoadCheck::new(self.session, self.page_name())
            .text(
                &self.position_name(),
                expected_name,
                &format!("position name reads {expected_name:?}"),
            )
            .await
    }

    /// Column visible, header visible, header mentions the title.
    ///
    /// The column and header resolve through the stage token, so any casing
    /// finds them; the header text check is case-sensitive.
    pub async fn verify_stage_exists(&self, title: &str) -> ProbeResult<()> {
        let _ = self
            .session
            .expect(&self.stage_column(title))
            .named(format!("stage column {title:?}"))
            .to_be_visible()
            .await?;
        let header = self.stage_header(title);
        let _ = self
            .session
            .expect(&header)
            .named(format!("stage header {title:?}"))
            .to_be_visible()
            .await?;
        self.session.expect(&header).to_contain_text(title).await
    }

    /// Every title exists, checked in order
    pub async fn verify_stages_exist(&self, titles: &[&str]) -> ProbeResult<()> {
        for title in titles {
            self.verify_stage_exists(title).await?;
        }
        Ok(())
    }

    /// The card is rendered inside the stage's column
    pub async fn verify_candidate_in_stage(&self, id: &str, title: &str) -> ProbeResult<()> {
        let _ = self
            .session
            .expect(&self.stage_column(title))
            .named(format!("stage column {title:?}"))
            .to_be_visible()
            .await?;
        let _ = self
            .session
            .expect(&self.candidate_card(id).within(&self.stage_column(title)))
            .named(format!("candidate {id} in {title:?}"))
            .to_be_visible()
            .await?;
        Ok(())
    }

    /// Stage titles in board order, read from the headers
    pub async fn stage_titles(&self) -> ProbeResult<Vec<String>> {
        let headers = any_stage_column()
            .locator(any_stage_header())
            .with_strict(false);
        Ok(self
            .session
            .query(&headers)
            .await?
            .iter()
            .map(|h| h.trimmed_text().to_string())
            .collect())
    }

    /// Current number of cards in a stage
    pub async fn count_candidates_in_stage(&self, title: &str) -> ProbeResult<usize> {
        self.session.count(&self.candidates_in_stage(title)).await
    }

    /// Candidate ids in a stage, in board order
    pub async fn candidate_ids_in_stage(&self, title: &str) -> ProbeResult<Vec<String>> {
        Ok(self
            .session
            .query(&self.candidates_in_stage(title))
            .await?
            .iter()
            .filter_map(|card| card.test_id.as_deref().and_then(candidate_id_from_marker))
            .map(str::to_string)
            .collect())
    }

    /// Snapshot of every stage's count
    pub async fn stage_counts(&self) -> ProbeResult<StageCounts> {
        let mut counts = Vec::new();
        for title in self.stage_titles().await? {
            let n = self.count_candidates_in_stage(&title).await?;
            counts.push((title, n));
        }
        Ok(StageCounts::new(counts))
    }

    /// Stage whose column currently holds the card
    pub async fn stage_of_candidate(&self, id: &str) -> ProbeResult<Option<String>> {
        for title in self.stage_titles().await? {
            let scoped = self.candidate_card(id).within(&self.stage_column(&title));
            if self.session.count(&scoped).await? > 0 {
                return Ok(Some(title));
            }
        }
        Ok(None)
    }

    /// Simulate dragging a card onto a stage column; proves nothing
    pub async fn drag_candidate_to_stage(&self, id: &str, target: &str) -> ProbeResult<DragPlan> {
        drag_to(self.session, &self.candidate_card(id), &self.stage_column(target)).await
    }

    /// Drag a card to another stage and prove the move happened
    pub async fn move_candidate(&self, id: &str, target: &str) -> ProbeResult<TransitionReport> {
        let from = self
            .stage_of_candidate(id)
            .await?
            .ok_or_else(|| ProbeError::ElementNotFound {
                what: "drag source".to_string(),
                locator: self.candidate_card(id).within(&any_stage_column()).to_string(),
                reason: crate::result::NotFoundReason::Missing,
            })?;
        if stage_token(&from) == stage_token(target) {
            return Err(ProbeError::precondition(format!(
                "candidate {id} is already in {target:?}"
            )));
        }
        let stage_move = StageMove {
            candidate: id.to_string(),
            from,
            to: target.to_string(),
        };

        let before = self.stage_counts().await?;
        let _ = self.drag_candidate_to_stage(id, target).await?;
        self.verify_transition(&stage_move, &before).await?;
        let after = self.stage_counts().await?;
        verify_conservation(&stage_move, &before, &after)?;

        info!(%stage_move, %after, "stage move verified");
        Ok(TransitionReport {
            stage_move,
            before,
            after,
        })
    }

    /// Post-drag checks against the live board
    async fn verify_transition(&self, stage_move: &StageMove, before: &StageCounts) -> ProbeResult<()> {
        let bound = self.session.config().timeouts.post_drag();
        let id = stage_move.candidate.as_str();
        let target = stage_move.to.as_str();

        let _ = self
            .session
            .expect(&self.candidate_card(id).within(&self.stage_column(target)))
            .within(bound)
            .named(format!("candidate {id} in {target:?}"))
            .to_be_visible()
            .await?;

        let expected = before.get(target).unwrap_or_default() + 1;
        self.session
            .expect(&self.candidates_in_stage(target))
            .within(bound)
            .named(format!("candidates in {target}"))
            .to_have_count(expected)
            .await?;

        let copies = self
            .session
            .count(&self.candidate_card(id).within(&any_stage_column()))
            .await?;
        if copies != 1 {
            return Err(ProbeError::ConservationViolated {
                message: format!("candidate {id} rendered in {copies} columns after the move"),
            });
        }

        let _ = self
            .session
            .expect(&self.candidate_name(id))
            .named(format!("name of candidate {id}"))
            .to_be_visible()
            .await?;
        Ok(())
    }

    /// Open a candidate's card
    pub async fn click_candidate(&self, id: &str) -> ProbeResult<()> {
        self.session
            .click(&self.candidate_card(id), &format!("candidate card {id}"))
            .await
    }

    /// Return to the positions list
    pub async fn go_back_to_positions(&self) -> ProbeResult<()> {
        self.state.reset();
        self.session
            .click(&self.back_button(), "back to positions button")
            .await
    }
}

#[async_trait]
impl<'a> PageObject for PositionDetails<'a> {
    fn page_name(&self) -> &'static str {
        "PositionDetails"
    }

    fn url_pattern(&self) -> UrlMatcher {
        UrlMatcher::new("/positions/#id")
    }

    fn state(&self) -> PageState {
        self.state.get()
    }

    async fn goto(&self) -> ProbeResult<()> {
        self.state.reset();
        self.session.goto(&self.path()).await
    }

    async fn verify_page_loaded(&self) -> ProbeResult<()> {
        let check = LoadCheck::new(self.session, self.page_name());
        let _ = check.url(&self.url_pattern()).await?;
        let _ = check
            .visible(&self.container(), "position details container visible")
            .await?;
        let _ = check
            .visible(&self.kanban_board(), "kanban board visible")
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
    use crate::mock::{MockApp, MockDriver, MockFault};
    use std::sync::Arc;

    fn session(faults: Vec<MockFault>) -> (Session, MockDriver) {
        let driver = MockDriver::new(MockApp::seeded()).with_faults(faults);
        let session = Session::new(Box::new(driver.clone()), Arc::new(HarnessConfig::fast()));
        (session, driver)
    }

    async fn board(session: &Session) -> PositionDetails<'_> {
        let page = PositionDetails::new(session, 1);
        page.goto().await.unwrap();
        page.verify_page_loaded().await.unwrap();
        page
    }

    mod load_tests {
        use super::*;

        #[tokio::test]
        async fn test_loads_with_name() {
            let (session, _) = session(vec![]);
            let page = board(&session).await;
            page.verify_page_loaded_with_name("Senior Full-Stack Engineer")
                .await
                .unwrap();
            assert_eq!(page.state(), PageState::Verified);
        }

        #[tokio::test]
        async fn test_wrong_name() {
            let (session, _) = session(vec![]);
            let page = board(&session).await;
            let err = page.verify_page_loaded_with_name("Janitor").await.unwrap_err();
            assert!(matches!(err, ProbeError::LoadTimeout { .. }));
            assert!(err.to_string().contains("Janitor"));
        }

        #[tokio::test]
        async fn test_hidden_board() {
            let (session, _) = session(vec![MockFault::Hide("kanban-board".into())]);
            let page = PositionDetails::new(&session, 1);
            page.goto().await.unwrap();
            let err = page.verify_page_loaded().await.unwrap_err();
            assert!(err.to_string().contains("kanban board visible"));
        }

        #[tokio::test]
        async fn test_unknown_position() {
            let (session, _) = session(vec![]);
            let page = PositionDetails::new(&session, 77);
            page.goto().await.unwrap();
            let err = page.verify_page_loaded().await.unwrap_err();
            assert!(err.to_string().contains("position details container visible"));
        }
    }

    mod query_tests {
        use super::*;

        #[tokio::test]
        async fn test_stage_titles_and_counts() {
            let (session, _) = session(vec![]);
            let page = board(&session).await;
            assert_eq!(
                page.stage_titles().await.unwrap(),
                ["Initial Screening", "Technical Interview", "Manager Interview", "Offer"]
            );
            let counts = page.stage_counts().await.unwrap();
            assert_eq!(counts.get("Manager Interview"), Some(2));
            assert_eq!(counts.total(), 3);
            assert_eq!(
                page.candidate_ids_in_stage("Manager Interview").await.unwrap(),
                ["7", "8"]
            );
        }

        #[tokio::test]
        async fn test_stage_checks() {
            let (session, _) = session(vec![]);
            let page = board(&session).await;
            page.verify_stages_exist(&["Initial Screening", "Initial   Screening", "Offer"])
                .await
                .unwrap();
            let err = page
                .verify_stage_exists("initial  screening")
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::TextMismatch { .. }));
            page.verify_candidate_in_stage("42", "Initial Screening")
                .await
                .unwrap();
            assert!(page
                .verify_candidate_in_stage("42", "Offer")
                .await
                .is_err());
            assert_eq!(
                page.stage_of_candidate("8").await.unwrap().as_deref(),
                Some("Manager Interview")
            );
        }

        #[tokio::test]
        async fn test_back_button_by_role_is_unique() {
            let (session, _) = session(vec![]);
            let page = board(&session).await;
            let _ = session
                .expect(&page.back_button_by_role())
                .to_be_visible()
                .await
                .unwrap();
            page.go_back_to_positions().await.unwrap();
            assert_eq!(session.current_path().await.unwrap(), "/positions");
        }
    }

    mod move_tests {
        use super::*;

        #[tokio::test]
        async fn test_move_candidate_42() {
            let (session, _) = session(vec![]);
            let page = board(&session).await;
            let report = page.move_candidate("42", "Technical Interview").await.unwrap();
            assert_eq!(report.stage_move.from, "Initial Screening");
            assert_eq!(report.before.get("Initial Screening"), Some(1));
            assert_eq!(report.before.get("Technical Interview"), Some(0));
            assert_eq!(report.after.get("Initial Screening"), Some(0));
            assert_eq!(report.after.get("Technical Interview"), Some(1));
            page.verify_candidate_in_stage("42", "technical interview")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_ignored_drop_fails_visibility() {
            let (session, _) = session(vec![MockFault::IgnoreDrops]);
            let page = board(&session).await;
            let err = page.move_candidate("42", "Technical Interview").await.unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotFound { .. }));
            assert!(err.to_string().contains("Technical Interview"));
        }

        #[tokio::test]
        async fn test_duplicate_drop_violates_conservation() {
            let (session, _) = session(vec![MockFault::DuplicateOnDrop]);
            let page = board(&session).await;
            let err = page.move_candidate("42", "Technical Interview").await.unwrap_err();
            assert!(matches!(err, ProbeError::ConservationViolated { .. }));
        }

        #[tokio::test]
        async fn test_delayed_drop_is_polled() {
            let (session, _) = session(vec![MockFault::DelayedDrop { polls: 5 }]);
            let page = board(&session).await;
            assert!(page.move_candidate("42", "Technical Interview").await.is_ok());
        }

        #[tokio::test]
        async fn test_same_stage_is_precondition() {
            let (session, driver) = session(vec![]);
            let page = board(&session).await;
            let err = page.move_candidate("42", "initial screening").await.unwrap_err();
            assert!(err.is_precondition());
            assert!(driver.pointer_events().is_empty());
        }

        #[tokio::test]
        async fn test_unknown_candidate() {
            let (session, _) = session(vec![]);
            let page = board(&session).await;
            let err = page.move_candidate("999", "Offer").await.unwrap_err();
            assert!(err.to_string().contains("drag source"));
        }

        #[tokio::test]
        async fn test_click_candidate() {
            let (session, driver) = session(vec![]);
            let page = board(&session).await;
            page.click_candidate("7").await.unwrap();
            assert!(driver.was_called("click:testid=candidate-card-7"));
        }
    }
}
