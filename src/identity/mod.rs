pub mod matching;
pub mod normalizer;

pub use matching::{names_match, HeuristicMatcher, NameMatcher, ScoredMatcher};
pub use normalizer::normalize_name;

// Module-level log target
pub const TARGET_IDENTITY: &str = "identity";
