//! Marker resolution: domain identity to locator.
//!
//! Pure functions. Nothing here touches the DOM; a renamed marker scheme in
//! the application makes every locator match nothing.

use crate::locator::{Locator, Selector};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Marker prefix of a stage column
pub const STAGE_COLUMN_PREFIX: &str = "stage-column-";
/// Marker prefix of a stage header
pub const STAGE_HEADER_PREFIX: &str = "stage-header-";
/// Marker prefix of a candidate card
pub const CANDIDATE_CARD_PREFIX: &str = "candidate-card-";
/// Marker prefix of a candidate name label
pub const CANDIDATE_NAME_PREFIX: &str = "candidate-name-";
/// Marker prefix of a position card
pub const POSITION_CARD_PREFIX: &str = "position-card-";

/// Normalize a stage title into its marker token.
///
/// Lowercases, trims, and collapses every whitespace run into a single `-`.
/// `"Initial Screening"` and `"initial   screening"` both yield
/// `"initial-screening"`.
#[must_use]
pub fn stage_token(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Column holding a stage's candidates
#[must_use]
pub fn stage_column_locator(title: &str) -> Locator {
    Locator::test_id(format!("{STAGE_COLUMN_PREFIX}{}", stage_token(title)))
}

/// Header of a stage column
#[must_use]
pub fn stage_header_locator(title: &str) -> Locator {
    Locator::test_id(format!("{STAGE_HEADER_PREFIX}{}", stage_token(title)))
}

/// Card of a candidate; the id is used verbatim
#[must_use]
pub fn candidate_card_locator(id: impl Display) -> Locator {
    Locator::test_id(format!("{CANDIDATE_CARD_PREFIX}{id}"))
}

/// Name label of a candidate
#[must_use]
pub fn candidate_name_locator(id: impl Display) -> Locator {
    Locator::test_id(format!("{CANDIDATE_NAME_PREFIX}{id}"))
}

/// Card of a position in the positions list
#[must_use]
pub fn position_card_locator(id: impl Display) -> Locator {
    Locator::test_id(format!("{POSITION_CARD_PREFIX}{id}"))
}

/// Every stage column on the board
#[must_use]
pub fn any_stage_column() -> Locator {
    Locator::test_id_prefix(STAGE_COLUMN_PREFIX)
}

/// Any stage header selector, for scoping inside a column
#[must_use]
pub fn any_stage_header() -> Selector {
    Selector::test_id_prefix(STAGE_HEADER_PREFIX)
}

/// Any candidate card selector, for scoping inside a column
#[must_use]
pub fn any_candidate_card() -> Selector {
    Selector::test_id_prefix(CANDIDATE_CARD_PREFIX)
}

/// Every position card in the list
#[must_use]
pub fn any_position_card() -> Locator {
    Locator::test_id_prefix(POSITION_CARD_PREFIX)
}

/// Recover the candidate id from a card marker value
#[must_use]
pub fn candidate_id_from_marker(marker: &str) -> Option<&str> {
    marker
        .strip_prefix(CANDIDATE_CARD_PREFIX)
        .filter(|id| !id.is_empty())
}

/// Distinct titles that normalize to the same token.
///
/// Resolution does not disambiguate collisions; callers use this to treat
/// colliding seed data as an unmet precondition.
#[must_use]
pub fn token_collisions<'a, I>(titles: I) -> Vec<(String, Vec<String>)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut by_token: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for title in titles {
        let entry = by_token.entry(stage_token(title)).or_default();
        if !entry.iter().any(|t| t == title) {
            entry.push(title.to_string());
        }
    }
    by_token
        .into_iter()
        .filter(|(_, titles)| titles.len() > 1)
        .collect()
}
