//! Name-similarity check
//!
//! Compares the incoming nickname against the last few nicknames seen
//! across all addresses. Bot floods tend to generate near-identical names;
//! an edit distance at or below the configured threshold is a detection,
//! while distance 0 (the same name, e.g. a rejoin) is ignored.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::check::{CheckDescriptor, CheckMode};
use crate::config::NameSimilaritySettings;
use crate::user::ConnectingUser;

/// Bounded history of recently seen nicknames, shared across configuration
/// reloads so a reload does not blind the check.
#[derive(Debug, Default)]
pub struct NameHistory {
    entries: Mutex<VecDeque<String>>,
}

impl NameHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `nickname` against the recorded history, then record it.
    /// Returns whether any historical name is within `distance` edits
    /// (identical names excluded).
    fn check_and_record(&self, nickname: &str, distance: usize, capacity: usize) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let detected = entries.iter().any(|seen| {
            let edits = levenshtein(seen, nickname);
            edits >= 1 && edits <= distance
        });

        while entries.len() >= capacity {
            entries.pop_front();
        }
        entries.push_back(nickname.to_string());
        detected
    }
}

pub struct NameSimilarityCheck {
    descriptor: CheckDescriptor,
    mode: CheckMode,
    message: String,
    distance: usize,
    history_size: usize,
    history: Arc<NameHistory>,
}

impl NameSimilarityCheck {
    pub fn new(
        settings: &NameSimilaritySettings,
        message: String,
        history: Arc<NameHistory>,
    ) -> Self {
        Self {
            descriptor: CheckDescriptor::new("name-similarity", settings.priority),
            mode: settings.check_mode,
            message,
            distance: settings.distance,
            history_size: settings.history_size,
            history,
        }
    }

    pub fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_detected(&self, user: &ConnectingUser, under_attack: bool) -> bool {
        let raw = self
            .history
            .check_and_record(&user.nickname, self.distance, self.history_size);
        self.mode.evaluate(under_attack, raw)
    }
}

/// Classic two-row Levenshtein edit distance over characters.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (curr[j] + 1).min(prev[j + 1] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(distance: usize, history_size: usize) -> NameSimilarityCheck {
        let settings = NameSimilaritySettings {
            check_mode: CheckMode::Always,
            distance,
            history_size,
            ..NameSimilaritySettings::default()
        };
        NameSimilarityCheck::new(&settings, "similar".to_string(), Arc::new(NameHistory::new()))
    }

    fn user(nickname: &str) -> ConnectingUser {
        ConnectingUser::new("203.0.113.5", nickname)
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("Steve", "Steve"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn identical_name_is_never_a_detection() {
        let check = check(2, 5);
        assert!(!check.is_detected(&user("Steve"), false));
        assert!(!check.is_detected(&user("Steve"), false));
    }

    #[test]
    fn distance_at_threshold_is_a_detection() {
        let check = check(1, 5);
        assert!(!check.is_detected(&user("Steve1"), false));
        assert!(check.is_detected(&user("Steve2"), false));
    }

    #[test]
    fn distance_above_threshold_is_not_a_detection() {
        let check = check(1, 5);
        assert!(!check.is_detected(&user("Steve"), false));
        assert!(!check.is_detected(&user("Alexander"), false));
    }

    #[test]
    fn history_is_bounded() {
        let check = check(1, 2);
        assert!(!check.is_detected(&user("Aaaa1"), false));
        assert!(!check.is_detected(&user("Bbbb"), false));
        assert!(!check.is_detected(&user("Cccc"), false));
        // "Aaaa1" has been evicted by now, so a near-identical name passes.
        assert!(!check.is_detected(&user("Dddd"), false));
        assert!(check.is_detected(&user("Dddd1"), false));
    }
}
