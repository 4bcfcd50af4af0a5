use strsim::jaro_winkler;
use tracing::debug;

use super::normalizer::normalize_name;
use super::TARGET_IDENTITY;

// First names must share this prefix (and be at least this long) for the
// surname heuristic to call two names the same person.
const FIRST_NAME_PREFIX_LEN: usize = 3;

// Jaro-Winkler threshold for the scored matcher, tuned for person names.
const PERSON_SIMILARITY_THRESHOLD: f64 = 0.90;

/// Identity matching seam. Fusion and race-building only see this trait,
/// so the match policy can be swapped without touching merge logic.
pub trait NameMatcher {
    fn names_match(&self, a: &str, b: &str) -> bool;
}

/// Test whether two differently-formatted names denote the same person.
///
/// Exact key equality matches. Otherwise both names must have a surname,
/// the surnames must be identical, and the first names must agree on their
/// first three characters. Biased to tolerate "Michael" vs "Michael James"
/// and nickname-prefix variants while resisting unrelated-person matches.
pub fn names_match(a: &str, b: &str) -> bool {
    let key_a = normalize_name(a);
    let key_b = normalize_name(b);

    if key_a == key_b {
        return true;
    }

    let tokens_a: Vec<&str> = key_a.split_whitespace().collect();
    let tokens_b: Vec<&str> = key_b.split_whitespace().collect();
    if tokens_a.len() < 2 || tokens_b.len() < 2 {
        return false;
    }

    if tokens_a.last() != tokens_b.last() {
        return false;
    }

    let first_a = tokens_a[0];
    let first_b = tokens_b[0];
    if first_a.chars().count() < FIRST_NAME_PREFIX_LEN
        || first_b.chars().count() < FIRST_NAME_PREFIX_LEN
    {
        return false;
    }

    if first_a
        .chars()
        .take(FIRST_NAME_PREFIX_LEN)
        .eq(first_b.chars().take(FIRST_NAME_PREFIX_LEN))
    {
        debug!(
            target: TARGET_IDENTITY,
            "Prefix match: '{}' and '{}' treated as the same person", a, b
        );
        return true;
    }

    false
}

/// The conservative first-name-prefix heuristic. Default matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMatcher;

impl NameMatcher for HeuristicMatcher {
    fn names_match(&self, a: &str, b: &str) -> bool {
        names_match(a, b)
    }
}

/// Stricter scoring matcher: identical surnames plus a Jaro-Winkler
/// similarity threshold on the first names instead of a raw prefix check.
#[derive(Debug, Clone, Copy)]
pub struct ScoredMatcher {
    threshold: f64,
}

impl Default for ScoredMatcher {
    fn default() -> Self {
        ScoredMatcher {
            threshold: PERSON_SIMILARITY_THRESHOLD,
        }
    }
}

impl ScoredMatcher {
    pub fn with_threshold(threshold: f64) -> Self {
        ScoredMatcher { threshold }
    }
}

impl NameMatcher for ScoredMatcher {
    fn names_match(&self, a: &str, b: &str) -> bool {
        let key_a = normalize_name(a);
        let key_b = normalize_name(b);

        if key_a == key_b {
            return true;
        }

        let tokens_a: Vec<&str> = key_a.split_whitespace().collect();
        let tokens_b: Vec<&str> = key_b.split_whitespace().collect();
        if tokens_a.len() < 2 || tokens_b.len() < 2 {
            return false;
        }
        if tokens_a.last() != tokens_b.last() {
            return false;
        }

        let similarity = jaro_winkler(tokens_a[0], tokens_b[0]);
        if similarity >= self.threshold {
            debug!(
                target: TARGET_IDENTITY,
                "Scored match: '{}' and '{}' with similarity {:.3}", a, b, similarity
            );
            return true;
        }

        false
    }
}
