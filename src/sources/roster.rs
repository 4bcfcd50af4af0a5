use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

use super::portal::fetch_page;
use crate::config::state_name;
use crate::model::{CandidateRecord, Office, Party};
use crate::TARGET_WEB_REQUEST;

const ENCYCLOPEDIA_BASE: &str = "https://ballotpedia.org";

lazy_static! {
    static ref RACE_HEADER_RE: Regex =
        Regex::new(r#"(?s)<div class="race_header[^"]*">(.*?)</div>"#).unwrap();
    static ref RESULTS_TEXT_RE: Regex =
        Regex::new(r#"(?s)<p class="results_text">(.*?)</p>"#).unwrap();
    static ref RESULTS_ROW_RE: Regex =
        Regex::new(r#"(?s)<tr class="results_row[^"]*">(.*?)</tr>"#).unwrap();
    static ref NAME_LINK_RE: Regex = Regex::new(r"(?s)<a[^>]*>(.*?)</a>").unwrap();
    static ref THUMBNAIL_CLASS_RE: Regex =
        Regex::new(r#"class="([^"]*image-candidate-thumbnail-wrapper[^"]*)""#).unwrap();
    static ref TAG_RE: Regex = Regex::new(r"<[^>]+>").unwrap();
}

fn strip_tags(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Possible encyclopedia page URLs for a state's governor race. Some
/// states elect governor and lieutenant governor on one ticket and use a
/// longer page slug.
pub fn governor_page_urls(state: &str, cycle: i32) -> [String; 2] {
    let slug = state_name(state).replace(' ', "_");
    [
        format!("{ENCYCLOPEDIA_BASE}/{slug}_gubernatorial_election,_{cycle}"),
        format!(
            "{ENCYCLOPEDIA_BASE}/{slug}_gubernatorial_and_lieutenant_gubernatorial_election,_{cycle}"
        ),
    ]
}

/// Parse declared governor candidates out of an encyclopedia race page.
///
/// Only vote boxes describing a current race are read ("running in", not
/// the "ran in" of a past cycle). Candidates are deduplicated by name
/// across the general-election and primary boxes on the same page.
pub fn parse_governor_candidates(page: &str, state: &str) -> Vec<CandidateRecord> {
    let mut candidates = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for block in page.split(r#"class="votebox"#).skip(1) {
        let Some(header) = RACE_HEADER_RE
            .captures(block)
            .map(|c| strip_tags(&c[1]).to_lowercase())
        else {
            continue;
        };
        let results = RESULTS_TEXT_RE
            .captures(block)
            .map(|c| strip_tags(&c[1]).to_lowercase())
            .unwrap_or_default();
        if !results.contains("running in") && !results.contains("is running") {
            continue;
        }

        let dem_primary = header.contains("democratic primary");
        let rep_primary = header.contains("republican primary");

        for row in RESULTS_ROW_RE.captures_iter(block) {
            let row = &row[1];
            let Some(name) = NAME_LINK_RE.captures(row).map(|c| strip_tags(&c[1])) else {
                continue;
            };
            if name.len() < 3 || name == "Submit photo" {
                continue;
            }
            if !seen.insert(name.to_lowercase()) {
                continue;
            }

            let party = row_party(row, dem_primary, rep_primary);
            candidates.push(CandidateRecord {
                name,
                party,
                party_full: party.full_name().to_string(),
                state: state.to_string(),
                office: Office::Governor,
                district: None,
                incumbent: row.contains("Incumbent"),
                fec_id: String::new(),
                committee_id: String::new(),
                totals: None,
                funding_breakdown: Default::default(),
                donors: Vec::new(),
                lookup_url: String::new(),
            });
        }
    }

    candidates
}

/// Party for one candidate row: the thumbnail's party class when present,
/// then the primary the vote box belongs to, then party keywords in the
/// row text. Unknown defaults to independent, which a finance source may
/// later backfill.
fn row_party(row: &str, dem_primary: bool, rep_primary: bool) -> Party {
    if let Some(classes) = THUMBNAIL_CLASS_RE.captures(row) {
        for class in classes[1].split_whitespace() {
            if class == "image-candidate-thumbnail-wrapper" {
                continue;
            }
            let party = Party::from_code(&class.replace('_', " "));
            if party != Party::Unknown {
                return party;
            }
        }
    }
    if dem_primary {
        return Party::Democratic;
    }
    if rep_primary {
        return Party::Republican;
    }

    let lower = row.to_lowercase();
    if lower.contains("democratic") || lower.contains("(d)") {
        Party::Democratic
    } else if lower.contains("republican") || lower.contains("(r)") {
        Party::Republican
    } else if lower.contains("libertarian") || lower.contains("(l)") {
        Party::Libertarian
    } else if lower.contains("green") || lower.contains("(g)") {
        Party::Green
    } else {
        Party::Independent
    }
}

/// Fetch one state's declared governor roster from the encyclopedia,
/// trying each page slug variant until one yields candidates.
pub async fn governor_roster(
    client: &reqwest::Client,
    state: &str,
    cycle: i32,
) -> Vec<CandidateRecord> {
    for url in governor_page_urls(state, cycle) {
        let Some(page) = fetch_page(client, &url).await else {
            continue;
        };
        let candidates = parse_governor_candidates(&page, state);
        if !candidates.is_empty() {
            debug!(
                target: TARGET_WEB_REQUEST,
                "Encyclopedia roster: {} governor candidates for {}", candidates.len(), state
            );
            return candidates;
        }
    }

    debug!(target: TARGET_WEB_REQUEST, "Encyclopedia roster: no candidates for {}", state);
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votebox(header: &str, results: &str, rows: &str) -> String {
        format!(
            r#"<div class="votebox"><div class="race_header">{header}</div>
            <p class="results_text">{results}</p>
            <table>{rows}</table></div>"#
        )
    }

    fn row(name: &str, extra: &str) -> String {
        format!(r#"<tr class="results_row"><td><a href="/x">{name}</a>{extra}</td></tr>"#)
    }

    #[test]
    fn test_parse_general_election_box() {
        let rows = format!(
            "{}{}",
            row(
                "Jane Smith",
                r#"<div class="image-candidate-thumbnail-wrapper Democratic"></div> (Incumbent)"#
            ),
            row("Sam Roe", r#"<div class="image-candidate-thumbnail-wrapper Republican"></div>"#),
        );
        let page = votebox(
            "General election for Governor of Texas",
            "The following candidates are running in the general election.",
            &rows,
        );
        let candidates = parse_governor_candidates(&page, "TX");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "Jane Smith");
        assert_eq!(candidates[0].party, Party::Democratic);
        assert!(candidates[0].incumbent);
        assert_eq!(candidates[0].office, Office::Governor);
        assert!(candidates[0].fec_id.is_empty());
        assert_eq!(candidates[1].party, Party::Republican);
        assert!(!candidates[1].incumbent);
    }

    #[test]
    fn test_historical_boxes_skipped() {
        let page = votebox(
            "General election for Governor of Texas",
            "The following candidates ran in the general election in 2022.",
            &row("Old Candidate", ""),
        );
        assert!(parse_governor_candidates(&page, "TX").is_empty());
    }

    #[test]
    fn test_primary_box_party_fallback() {
        let page = votebox(
            "Democratic primary for Governor of Iowa",
            "The following candidates are running in the Democratic primary.",
            &row("Pat Doe", ""),
        );
        let candidates = parse_governor_candidates(&page, "IA");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].party, Party::Democratic);
    }

    #[test]
    fn test_dedup_across_boxes() {
        let page = format!(
            "{}{}",
            votebox(
                "General election for Governor of Iowa",
                "The following candidates are running in the general election.",
                &row("Pat Doe", ""),
            ),
            votebox(
                "Republican primary for Governor of Iowa",
                "The following candidates are running in the Republican primary.",
                &row("Pat Doe", ""),
            ),
        );
        assert_eq!(parse_governor_candidates(&page, "IA").len(), 1);
    }

    #[test]
    fn test_placeholder_rows_skipped() {
        let page = votebox(
            "General election for Governor of Iowa",
            "The following candidates are running in the general election.",
            &row("Submit photo", ""),
        );
        assert!(parse_governor_candidates(&page, "IA").is_empty());
    }

    #[test]
    fn test_page_url_slugs() {
        let urls = governor_page_urls("NH", 2026);
        assert_eq!(
            urls[0],
            "https://ballotpedia.org/New_Hampshire_gubernatorial_election,_2026"
        );
        assert!(urls[1].contains("gubernatorial_and_lieutenant_gubernatorial"));
    }
}
