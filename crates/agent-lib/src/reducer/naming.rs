//! Resource name normalization
//!
//! Live pods carry generated names (`my-deployment-7f9c8d6b5-xk2pl`). The
//! answer should name the controller the user actually created, so the
//! owner chain is walked to its top. The suffix regex only runs when the
//! chain stops at an intermediate controller.

use crate::models::ResourceRecord;
use regex::Regex;
use std::sync::OnceLock;

/// Characters Kubernetes uses for random name suffixes and
/// pod-template hashes (no vowels, no 0/1/3).
const SUFFIX_ALPHABET: &str = "bcdfghjklmnpqrstvwxz2456789";

/// Controllers that are themselves created by another controller
const INTERMEDIATE_KINDS: &[&str] = &["ReplicaSet"];

static SUFFIX_PATTERN: OnceLock<Regex> = OnceLock::new();

fn suffix_pattern() -> &'static Regex {
    SUFFIX_PATTERN.get_or_init(|| {
        let pattern = format!(r"(?:-[{a}]{{5,10}}){{1,2}}$", a = SUFFIX_ALPHABET);
        Regex::new(&pattern).expect("suffix pattern is valid")
    })
}

/// Strip one or two trailing generated segments.
/// `mongodb-56c598c8fc` -> `mongodb`, `web-7f9c8d6b5-xk2pl` -> `web`.
pub fn strip_generated_suffix(name: &str) -> &str {
    match suffix_pattern().find(name) {
        Some(m) if m.start() > 0 => &name[..m.start()],
        _ => name,
    }
}

/// Name to report for a record: the highest controller in its owner
/// chain, or its own name when nothing owns it.
pub fn display_name(record: &ResourceRecord) -> String {
    match record.owners.last() {
        None => record.name.clone(),
        Some(owner) if INTERMEDIATE_KINDS.contains(&owner.kind.as_str()) => {
            strip_generated_suffix(&owner.name).to_string()
        }
        Some(owner) => owner.name.clone(),
    }
}
