//! Result reduction
//!
//! Turns raw snapshots into the one fact a question asks for. Pure: no
//! I/O, same snapshots in, same answer out.

mod logs;
mod naming;

pub use logs::{log_excerpt, LOG_TAIL_LINES, MAX_LOG_ANSWER_CHARS};
pub use naming::{display_name, strip_generated_suffix};

use crate::models::{Answer, Attribute, Intent, ResourceRecord, ResourceSnapshot};
use crate::planner::is_label_selector;

/// How well a record matches the question's target. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchRank {
    ExactName,
    Owner,
    NamePrefix,
}

fn match_rank(record: &ResourceRecord, target: &str) -> Option<MatchRank> {
    if record.name.eq_ignore_ascii_case(target) {
        return Some(MatchRank::ExactName);
    }
    if record
        .owners
        .iter()
        .any(|owner| owner.name.eq_ignore_ascii_case(target))
    {
        return Some(MatchRank::Owner);
    }
    let prefix = format!("{}-", target.to_ascii_lowercase());
    if record.name.to_ascii_lowercase().starts_with(&prefix) {
        return Some(MatchRank::NamePrefix);
    }
    None
}

/// All records across snapshots in inspector order, without duplicates
/// (a `Get` and a `List` may return the same object).
fn candidates(snapshots: &[ResourceSnapshot]) -> Vec<&ResourceRecord> {
    let mut seen: Vec<&ResourceRecord> = Vec::new();
    for record in snapshots.iter().flat_map(|s| s.records.iter()) {
        let duplicate = seen.iter().any(|r| {
            r.kind == record.kind && r.namespace == record.namespace && r.name == record.name
        });
        if !duplicate {
            seen.push(record);
        }
    }
    seen
}

/// Pick the record a single-target question is about
fn select<'a>(intent: &Intent, snapshots: &'a [ResourceSnapshot]) -> Option<&'a ResourceRecord> {
    let candidates = candidates(snapshots);
    let target = intent
        .target
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty() && !is_label_selector(t));

    match target {
        None => candidates.first().copied(),
        Some(target) => candidates
            .into_iter()
            .filter_map(|r| match_rank(r, target).map(|rank| (rank, r)))
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, r)| r),
    }
}

fn count(snapshots: &[ResourceSnapshot]) -> usize {
    snapshots.iter().map(|s| s.records.len()).sum()
}

/// Reduce snapshots to a short answer
pub fn reduce(intent: &Intent, snapshots: &[ResourceSnapshot]) -> Answer {
    match intent.attribute {
        Attribute::Count => Answer::new(count(snapshots).to_string()),
        Attribute::Status => match select(intent, snapshots) {
            Some(record) => record
                .status
                .as_deref()
                .map(Answer::new)
                .unwrap_or_else(Answer::undetermined),
            None => Answer::not_found(),
        },
        Attribute::Name => match select(intent, snapshots) {
            Some(record) => Answer::new(display_name(record)),
            None => Answer::not_found(),
        },
        Attribute::LogText => {
            let lines: Vec<&str> = snapshots
                .iter()
                .flat_map(|s| s.log_lines.iter().map(String::as_str))
                .collect();
            log_excerpt(&lines)
                .map(Answer::new)
                .unwrap_or_else(Answer::not_found)
        }
        Attribute::Existence => {
            let exists = select(intent, snapshots).is_some();
            Answer::new(if exists { "yes" } else { "no" })
        }
        Attribute::Unknown => Answer::undetermined(),
    }
}
