//! Full scenario catalog against the in-memory recruitment board.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use talent_probe::mock::{MockApp, MockFault, MockSessions};
use talent_probe::{
    catalog, HarnessConfig, ScenarioOutcome, ScenarioRunner, SessionFactory, SuiteReport,
};

async fn run_with(sessions: &Arc<MockSessions>, config: HarnessConfig) -> SuiteReport {
    ScenarioRunner::new(Arc::clone(sessions) as Arc<dyn SessionFactory>, config)
        .run_all(&catalog())
        .await
}

fn outcome<'a>(report: &'a SuiteReport, name: &str) -> &'a ScenarioOutcome {
    &report
        .get(name)
        .unwrap_or_else(|| panic!("no result for {name}"))
        .outcome
}

#[tokio::test]
async fn test_seeded_board_passes_every_enabled_scenario() {
    let sessions = Arc::new(MockSessions::new(MockApp::seeded()));
    let report = run_with(&sessions, HarnessConfig::fast()).await;

    assert_eq!(report.total(), 10);
    assert_eq!(report.passed_count(), 7, "failures: {:?}", report.failures());
    assert_eq!(report.skipped_count(), 3);
    assert!(report.all_passed());
    assert!(outcome(&report, "filters positions by status").is_skipped());
    assert!(outcome(&report, "searches positions by title").is_skipped());
    assert!(outcome(&report, "handles empty search results").is_skipped());
}

#[tokio::test]
async fn test_every_scenario_gets_a_fresh_board() {
    let sessions = Arc::new(MockSessions::new(MockApp::seeded()));
    let _ = run_with(&sessions, HarnessConfig::fast()).await;

    let opened = sessions.opened();
    assert_eq!(opened.len(), 7);
    assert!(opened.iter().all(|d| d.is_closed()));

    // drag scenario moved 42; the round trip after it started from the seed
    let drag_board = opened[1].app();
    assert_eq!(drag_board.find(1).unwrap().stage_of(42), Some(1));
    let round_trip_board = opened[6].app();
    assert_eq!(round_trip_board.find(1).unwrap().stage_of(42), Some(0));
}

#[tokio::test]
async fn test_thin_seed_skips_instead_of_failing() {
    let sessions = Arc::new(MockSessions::new(MockApp::seeded()));
    let report = run_with(&sessions, HarnessConfig::fast().with_position_id(3)).await;

    assert!(report.all_passed(), "failures: {:?}", report.failures());
    assert_eq!(report.passed_count(), 3);
    assert_eq!(report.skipped_count(), 7);
    assert!(matches!(
        outcome(&report, "candidate changes stage via drag and drop"),
        ScenarioOutcome::Skipped(reason) if reason.contains("stage column")
    ));
    assert!(outcome(&report, "displays candidate card information").is_skipped());
}

#[tokio::test]
async fn test_ignored_drops_fail_only_drag_scenarios() {
    let sessions =
        Arc::new(MockSessions::new(MockApp::seeded()).with_faults(vec![MockFault::IgnoreDrops]));
    let report = run_with(&sessions, HarnessConfig::fast()).await;

    assert_eq!(report.failed_count(), 2);
    let failed: Vec<_> = report.failures().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        failed,
        [
            "candidate changes stage via drag and drop",
            "conserves candidates across a round trip"
        ]
    );
    let ScenarioOutcome::Failed(reason) = outcome(&report, "candidate changes stage via drag and drop")
    else {
        panic!("expected failure");
    };
    assert!(reason.contains("Technical Interview"));
}

#[tokio::test]
async fn test_duplicated_card_is_a_conservation_failure() {
    let sessions = Arc::new(
        MockSessions::new(MockApp::seeded()).with_faults(vec![MockFault::DuplicateOnDrop]),
    );
    let report = run_with(&sessions, HarnessConfig::fast()).await;

    let ScenarioOutcome::Failed(reason) = outcome(&report, "candidate changes stage via drag and drop")
    else {
        panic!("expected failure");
    };
    assert!(reason.contains("Conservation violated"));
}

#[tokio::test]
async fn test_missing_board_names_the_page_and_condition() {
    let sessions = Arc::new(
        MockSessions::new(MockApp::seeded()).with_faults(vec![MockFault::Hide("kanban-board".into())]),
    );
    let report = run_with(&sessions, HarnessConfig::fast()).await;

    assert!(outcome(&report, "positions page loads with visible elements").is_passed());
    let ScenarioOutcome::Failed(reason) = outcome(&report, "displays position details") else {
        panic!("expected failure");
    };
    assert!(reason.contains("PositionDetails"));
    assert!(reason.contains("kanban board visible"));
    assert_eq!(report.failed_count(), 6);
}

#[tokio::test]
async fn test_filter_selects_a_single_scenario() {
    let sessions = Arc::new(MockSessions::new(MockApp::seeded()));
    let report = ScenarioRunner::new(
        Arc::clone(&sessions) as Arc<dyn SessionFactory>,
        HarnessConfig::fast(),
    )
        .with_filter("round trip")
        .run_all(&catalog())
        .await;

    assert_eq!(report.total(), 1);
    assert!(report.results[0].outcome.is_passed());
    assert_eq!(sessions.opened().len(), 1);
}
