use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

// Generational suffixes stripped before matching. Longer forms first so
// "jr." is consumed before the bare "jr" check runs.
const GENERATIONAL_SUFFIXES: [&str; 10] = [
    " jr.", " sr.", " iii.", " ii.", " iv.", " jr", " sr", " iii", " ii", " iv",
];

/// Canonicalize a person's display name into a matching key.
///
/// Lowercases, folds diacritics, strips generational suffixes, and rewrites
/// "Last, First Middle" into "first last" keeping only the first token of
/// the first-name portion. Middle names and initials are dropped from the
/// key; the original display string is kept elsewhere.
pub fn normalize_name(name: &str) -> String {
    let mut key: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string();

    for suffix in GENERATIONAL_SUFFIXES {
        if key.ends_with(suffix) {
            key.truncate(key.len() - suffix.len());
            key = key.trim_end().to_string();
        }
    }

    if let Some((last, rest)) = key.split_once(',') {
        let last = last.trim();
        let first = rest.trim().split_whitespace().next().unwrap_or("");
        return format!("{first} {last}").trim().to_string();
    }

    key
}
