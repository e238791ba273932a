use super::LoadCheck;
use crate::locator::Locator;
use crate::page_object::{PageObject, PageState, StateCell, UrlMatcher};
use crate::result::ProbeResult;
use crate::session::Session;
use async_trait::async_trait;

/// Recruiter dashboard at `/`
#[derive(Debug)]
pub struct Dashboard<'a> {
    session: &'a Session,
    state: StateCell,
}

impl<'a> Dashboard<'a> {
    /// Canonical path
    pub const PATH: &'static str = "/";

    /// Wrap the session
    #[must_use]
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            state: StateCell::default(),
        }
    }

    /// "Añadir Nuevo Candidato" button
    #[must_use]
    pub fn add_candidate_button(&self) -> Locator {
        Locator::role("button", "añadir nuevo candidato")
    }

    /// "Ir a Posiciones" button
    #[must_use]
    pub fn positions_button(&self) -> Locator {
        Locator::role("button", "ir a posiciones")
    }

    /// Open the positions list
    pub async fn go_to_positions(&self) -> ProbeResult<()> {
        self.state.reset();
        self.session
            .click(&self.positions_button(), "go to positions button")
            .await
    }

    /// Open the add-candidate form
    pub async fn go_to_add_candidate(&self) -> ProbeResult<()> {
        self.state.reset();
        self.session
            .click(&self.add_candidate_button(), "add candidate button")
            .await
    }
}

#[async_trait]
impl<'a> PageObject for Dashboard<'a> {
    fn page_name(&self) -> &'static str {
        "Dashboard"
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
            .visible(&self.add_candidate_button(), "add candidate button visible")
            .await?;
        let _ = check
            .visible(&self.positions_button(), "go to positions button visible")
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
    use crate::result::ProbeError;
    use std::sync::Arc;

    fn session(faults: Vec<MockFault>) -> Session {
        let driver = MockDriver::new(MockApp::seeded()).with_faults(faults);
        Session::new(Box::new(driver), Arc::new(HarnessConfig::fast()))
    }

    #[tokio::test]
    async fn test_load_and_state() {
        let session = session(vec![]);
        let dashboard = Dashboard::new(&session);
        assert_eq!(dashboard.state(), PageState::Unverified);
        dashboard.goto().await.unwrap();
        dashboard.verify_page_loaded().await.unwrap();
        assert_eq!(dashboard.state(), PageState::Verified);
        dashboard.goto().await.unwrap();
        assert_eq!(dashboard.state(), PageState::Unverified);
    }

    #[tokio::test]
    async fn test_go_to_positions() {
        let session = session(vec![]);
        let dashboard = Dashboard::new(&session);
        dashboard.goto().await.unwrap();
        dashboard.go_to_positions().await.unwrap();
        assert_eq!(session.current_path().await.unwrap(), "/positions");
    }

    #[tokio::test]
    async fn test_go_to_add_candidate() {
        let session = session(vec![]);
        let dashboard = Dashboard::new(&session);
        dashboard.goto().await.unwrap();
        dashboard.verify_page_loaded().await.unwrap();
        dashboard.go_to_add_candidate().await.unwrap();
        assert_eq!(dashboard.state(), PageState::Unverified);
        assert_eq!(session.current_path().await.unwrap(), "/add-candidate");
    }

    #[tokio::test]
    async fn test_wrong_page_is_load_timeout() {
        let session = session(vec![]);
        session.goto("/positions").await.unwrap();
        let err = Dashboard::new(&session)
            .verify_page_loaded()
            .await
            .unwrap_err();
        match err {
            ProbeError::LoadTimeout { page, condition, .. } => {
                assert_eq!(page, "Dashboard");
                assert!(condition.contains("URL matches /"));
            }
            other => panic!("unexpected {other}"),
        }
    }
}
