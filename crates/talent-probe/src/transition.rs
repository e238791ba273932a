//! Stage-transition bookkeeping.
//!
//! A move of one candidate between two stages of the same position must
//! conserve candidates: the target gains exactly one, the source loses
//! exactly one and the board total stays put.

use crate::resolver::stage_token;
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Candidate count of every stage, in board order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    stages: Vec<(String, usize)>,
}

impl StageCounts {
    /// Build from `(title, count)` pairs
    #[must_use]
    pub fn new(stages: Vec<(String, usize)>) -> Self {
        Self { stages }
    }

    /// Count for a stage; titles compare by marker token
    #[must_use]
    pub fn get(&self, title: &str) -> Option<usize> {
        let token = stage_token(title);
        self.stages
            .iter()
            .find(|(t, _)| stage_token(t) == token)
            .map(|(_, n)| *n)
    }

    /// Sum over all stages
    #[must_use]
    pub fn total(&self) -> usize {
        self.stages.iter().map(|(_, n)| n).sum()
    }

    /// Stage titles in board order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|(t, _)| t.as_str())
    }

    /// Number of stages
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// No stages at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Display for StageCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (title, n)) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{title}: {n}")?;
        }
        Ok(())
    }
}

/// One requested move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMove {
    /// Candidate id as rendered in its marker
    pub candidate: String,
    /// Stage the card started in
    pub from: String,
    /// Stage the card was dropped on
    pub to: String,
}

impl fmt::Display for StageMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "candidate {} : {} -> {}", self.candidate, self.from, self.to)
    }
}

/// Evidence of a verified move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReport {
    /// The move
    pub stage_move: StageMove,
    /// Counts before the drag
    pub before: StageCounts,
    /// Counts after verification
    pub after: StageCounts,
}

fn stage_count(counts: &StageCounts, title: &str, when: &str) -> ProbeResult<usize> {
    counts.get(title).ok_or_else(|| ProbeError::ConservationViolated {
        message: format!("stage {title:?} missing from {when} snapshot"),
    })
}

/// Check the count deltas of a move
pub fn verify_conservation(
    stage_move: &StageMove,
    before: &StageCounts,
    after: &StageCounts,
) -> ProbeResult<()> {
    let target_before = stage_count(before, &stage_move.to, "before")?;
    let target_after = stage_count(after, &stage_move.to, "after")?;
    if target_after != target_before + 1 {
        return Err(ProbeError::CountMismatch {
            what: format!("candidates in {}", stage_move.to),
            expected: target_before + 1,
            actual: target_after,
        });
    }

    let source_before = stage_count(before, &stage_move.from, "before")?;
    let source_after = stage_count(after, &stage_move.from, "after")?;
    if source_after + 1 != source_before {
        return Err(ProbeError::ConservationViolated {
            message: format!(
                "{} went from {source_before} to {source_after} after moving candidate {} out",
                stage_move.from, stage_move.candidate
            ),
        });
    }

    if after.total() != before.total() {
        return Err(ProbeError::ConservationViolated {
            message: format!(
                "board total changed from {} to {} ({after})",
                before.total(),
                after.total()
            ),
        });
    }
    Ok(())
}
