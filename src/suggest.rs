//! Ranks known paths as likely intended targets of an unmatched one.
//!
//! Scores are the sum of independent signals:
//!
//! | Signal                                                   | Points |
//! |----------------------------------------------------------|--------|
//! | last literal segment identical                           | 5      |
//! | candidate's parent path is a segment prefix of target    | 3      |
//! | candidate contains target's last literal segment (≥ 4)   | 2      |
//! | common leading characters / 6, capped                    | ≤ 4    |
//!
//! Placeholder segments are ignored when picking the "last" segment, so
//! `/users/:param` and `/tasks/:param` do not score on their shared tail.

use crate::path_normalizer::{CanonicalPath, PARAM_PLACEHOLDER};

const EXACT_SEGMENT_SCORE: u32 = 5;
const PARENT_PREFIX_SCORE: u32 = 3;
const SUBSTRING_SCORE: u32 = 2;
const MIN_SUBSTRING_LEN: usize = 4;
const COMMON_PREFIX_STEP: usize = 6;
const MAX_COMMON_PREFIX_SCORE: usize = 4;

/// Candidate path without its trailing placeholders and its last literal
/// segment. `None` when that leaves only the root.
fn parent_path(candidate: &CanonicalPath) -> Option<String> {
    let mut segments: Vec<&str> = candidate.segments().collect();
    while segments
        .last()
        .is_some_and(|segment| segment.contains(PARAM_PLACEHOLDER))
    {
        segments.pop();
    }
    segments.pop();

    if segments.is_empty() {
        None
    } else {
        Some(format!("/{}", segments.join("/")))
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

pub fn score(target: &CanonicalPath, candidate: &CanonicalPath) -> u32 {
    let mut score = 0;
    let target_last = target.last_literal_segment();

    if target_last.is_some() && target_last == candidate.last_literal_segment() {
        score += EXACT_SEGMENT_SCORE;
    }

    if let Some(parent) = parent_path(candidate) {
        let target = target.as_str();
        if target == parent || target.starts_with(&format!("{}/", parent)) {
            score += PARENT_PREFIX_SCORE;
        }
    }

    if let Some(last) = target_last {
        if last.chars().count() >= MIN_SUBSTRING_LEN && candidate.as_str().contains(last) {
            score += SUBSTRING_SCORE;
        }
    }

    let common = common_prefix_len(target.as_str(), candidate.as_str());
    score += (common / COMMON_PREFIX_STEP).min(MAX_COMMON_PREFIX_SCORE) as u32;

    score
}

/// Up to `limit` candidates with a positive score, best first. Equal scores
/// keep candidate order.
pub fn suggest<'a>(
    target: &CanonicalPath,
    candidates: impl IntoIterator<Item = &'a CanonicalPath>,
    limit: usize,
) -> Vec<CanonicalPath> {
    let mut scored: Vec<(u32, &CanonicalPath)> = candidates
        .into_iter()
        .filter(|candidate| *candidate != target)
        .map(|candidate| (score(target, candidate), candidate))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, candidate)| candidate.clone())
        .collect()
}
