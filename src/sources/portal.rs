use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::state_name;
use crate::donors::{classify, is_uninformative, DETAIL_DONOR_CAP};
use crate::model::{DonorRecord, Party, RawContribution, SourceFinanceRecord};
use crate::util::{round2, title_case};
use crate::TARGET_WEB_REQUEST;

/// States whose governor-race finances are published on the race-page
/// portal.
pub const EMBEDDED_PORTAL_STATES: [&str; 20] = [
    "AL", "AZ", "CA", "CO", "FL", "GA", "IL", "IA", "MI", "MN", "NV", "NH", "NM", "NY", "OH",
    "PA", "SC", "TX", "WI", "WY",
];

const EMBEDDED_BASE: &str = "https://www.transparencyusa.org";

lazy_static! {
    // The portal's pages ship their data inside a minified script of the
    // form `window.__NUXT__=(function(a,b,...){...})(val1,val2,...)`.
    // Values in object literals are either inline literals or references to
    // those function parameters.
    static ref SCRIPT_PARAMS_RE: Regex =
        Regex::new(r"window\.__NUXT__=\(function\(([^)]*)\)").unwrap();
    static ref SCRIPT_ARGS_RE: Regex =
        Regex::new(r"(?s)\}\(((?:[^()]*|\([^()]*\))*)\)\)\s*;?\s*</script>").unwrap();
    static ref SCRIPT_ARGS_ALT_RE: Regex =
        Regex::new(r"(?s)\}\)\(((?:[^()]*|\([^()]*\))*)\)\s*;?\s*</script>").unwrap();
    static ref EMBEDDED_DONOR_RE: Regex = Regex::new(
        r#"electionAmount:([^,}]+),contributorName:("(?:[^"\\]|\\.)*"|[a-zA-Z_$][a-zA-Z0-9_$]*)"#
    )
    .unwrap();
    static ref RACE_CANDIDATE_RE: Regex = {
        let val = r#"(?:"(?:[^"\\]|\\.)*"|[a-zA-Z_$][a-zA-Z0-9_$]*)"#;
        let num = r"[^,}]+";
        let pattern = format!(
            "candidateFullName:({val}),\
             candidateLastName:{val},\
             candidateSlug:({val}),\
             candidateImageName:{val},\
             candidateBpUrl:{val},\
             candidateStatus:{val},\
             candidateIsWriteIn:{val},\
             candidateIsIncumbent:({val}),\
             candidateParty:({val}),\
             candidateTotalContributions:({num}),\
             candidateTotalExpenditures:{num},\
             (?:candidateTotalLoans:{num},)?\
             personHasTusaData:({val})"
        );
        Regex::new(&pattern).unwrap()
    };
}

/// Map of script parameter name to its raw argument token.
type ScriptVars = HashMap<String, String>;

/// Recover the parameter-to-argument mapping from the page's embedded
/// script so references inside object literals can be resolved.
pub fn extract_script_vars(page: &str) -> ScriptVars {
    let Some(params) = SCRIPT_PARAMS_RE.captures(page) else {
        return ScriptVars::new();
    };
    let params: Vec<&str> = params[1].split(',').map(str::trim).collect();

    let args = SCRIPT_ARGS_RE
        .captures(page)
        .or_else(|| SCRIPT_ARGS_ALT_RE.captures(page));
    let Some(args) = args else {
        return ScriptVars::new();
    };

    params
        .into_iter()
        .zip(split_top_level(&args[1]))
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Split a comma-separated argument list at the top level, respecting
/// string literals and nested parentheses (e.g. `Array(16)`).
fn split_top_level(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for c in raw.chars() {
        if in_string {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                current.push(c);
            }
            '(' | '{' | '[' => {
                depth += 1;
                current.push(c);
            }
            ')' | '}' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                tokens.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }
    tokens
}

/// Resolve one raw token: unquote string literals, follow a parameter
/// reference one level, otherwise return the token unchanged.
fn resolve<'a>(raw: &'a str, vars: &'a ScriptVars) -> &'a str {
    let token = raw.trim();
    if let Some(value) = vars.get(token) {
        return value;
    }
    token
}

fn unquote(token: &str) -> Option<String> {
    let inner = token.strip_prefix('"')?.strip_suffix('"')?;
    Some(inner.replace("\\u002F", "/").replace("\\\"", "\""))
}

fn resolve_string(raw: &str, vars: &ScriptVars) -> Option<String> {
    unquote(resolve(raw, vars))
}

fn resolve_number(raw: &str, vars: &ScriptVars) -> Option<f64> {
    resolve(raw, vars).parse().ok()
}

fn resolve_flag(raw: &str, vars: &ScriptVars) -> bool {
    let token = resolve(raw, vars);
    token == "true" || unquote(token).as_deref() == Some("Y")
}

/// One candidate as listed on a portal race page.
#[derive(Debug, Clone, PartialEq)]
pub struct RacePageCandidate {
    pub name: String,
    pub slug: String,
    pub party: Option<Party>,
    pub incumbent: bool,
    pub total_contributions: f64,
    pub has_finance_data: bool,
}

/// Parse the candidate roster out of a race page. Entries whose name
/// cannot be resolved to a string are skipped.
pub fn extract_race_candidates(page: &str, vars: &ScriptVars) -> Vec<RacePageCandidate> {
    RACE_CANDIDATE_RE
        .captures_iter(page)
        .filter_map(|captures| {
            let name = resolve_string(&captures[1], vars)?;
            if name.trim().is_empty() {
                return None;
            }
            let slug = resolve_string(&captures[2], vars).unwrap_or_default();
            let party = resolve_string(&captures[4], vars)
                .map(|raw| Party::from_code(&raw))
                .filter(|party| *party != Party::Unknown);
            Some(RacePageCandidate {
                name,
                slug,
                party,
                incumbent: resolve_flag(&captures[3], vars),
                total_contributions: resolve_number(&captures[5], vars).unwrap_or(0.0),
                has_finance_data: resolve_flag(&captures[6], vars),
            })
        })
        .collect()
}

/// Pull contribution rows out of a candidate page's embedded script. Rows
/// whose amount or name cannot be resolved are skipped.
pub fn extract_embedded_contributions(page: &str, vars: &ScriptVars) -> Vec<RawContribution> {
    let mut out = Vec::new();
    for captures in EMBEDDED_DONOR_RE.captures_iter(page) {
        let Some(amount) = resolve_number(&captures[1], vars) else {
            continue;
        };
        let Some(name) = resolve_string(&captures[2], vars) else {
            continue;
        };
        let name = name.trim().to_string();
        if name.is_empty() || amount <= 0.0 {
            continue;
        }
        out.push(RawContribution {
            contributor_name: name,
            amount,
            ..Default::default()
        });
    }
    out
}

pub fn governor_race_url(state: &str) -> String {
    let slug = state_name(state).to_lowercase().replace(' ', "-");
    format!("{EMBEDDED_BASE}/{}/race/governor-of-{slug}", state.to_lowercase())
}

pub fn candidate_page_url(state: &str, slug: &str) -> String {
    format!("{EMBEDDED_BASE}/{}/candidate/{slug}", state.to_lowercase())
}

pub(crate) async fn fetch_page(client: &reqwest::Client, url: &str) -> Option<String> {
    match client.get(url).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => Some(body),
            Err(err) => {
                warn!(target: TARGET_WEB_REQUEST, "Failed to read page body from {}: {}", url, err);
                None
            }
        },
        Ok(response) => {
            warn!(target: TARGET_WEB_REQUEST, "Non-success status {} from {}", response.status(), url);
            None
        }
        Err(err) => {
            warn!(target: TARGET_WEB_REQUEST, "Request to {} failed: {}", url, err);
            None
        }
    }
}

/// Fetch one state's governor-race finances from the race-page portal:
/// the race page for candidate totals, then each funded candidate's own
/// page for their largest contributors.
pub async fn embedded_governor_finance(
    client: &reqwest::Client,
    state: &str,
) -> Vec<SourceFinanceRecord> {
    let race_url = governor_race_url(state);
    let Some(page) = fetch_page(client, &race_url).await else {
        return Vec::new();
    };
    let vars = extract_script_vars(&page);
    let roster = extract_race_candidates(&page, &vars);

    let mut out = Vec::new();
    for candidate in roster {
        let mut donors = Vec::new();
        let mut lookup_url = String::new();
        if candidate.has_finance_data
            && !candidate.slug.is_empty()
            && candidate.total_contributions > 0.0
        {
            let page_url = candidate_page_url(state, &candidate.slug);
            if let Some(page) = fetch_page(client, &page_url).await {
                let vars = extract_script_vars(&page);
                donors = donor_list(&extract_embedded_contributions(&page, &vars));
            }
            lookup_url = page_url;
        }
        out.push(SourceFinanceRecord {
            name: candidate.name,
            total_raised: round2(candidate.total_contributions),
            donors,
            party: candidate.party,
            incumbent: Some(candidate.incumbent),
            lookup_url,
        });
    }

    debug!(
        target: TARGET_WEB_REQUEST,
        "Race-page portal: {} governor candidates for {}", out.len(), state
    );
    out
}

/// One row of a Socrata-style contribution dataset.
#[derive(Debug, Deserialize)]
struct SocrataRow {
    #[serde(default)]
    candidate_name: String,
    #[serde(default, alias = "contributor")]
    contributor_name: String,
    #[serde(default)]
    contributor_type: String,
    #[serde(default)]
    amount: String,
}

/// Query a state's Socrata open-data endpoint for governor contributions
/// and fold them into per-candidate finance records.
pub async fn socrata_governor_finance(
    client: &reqwest::Client,
    base_url: &str,
    where_clause: &str,
    lookup_url: &str,
) -> Vec<SourceFinanceRecord> {
    let request = client.get(base_url).query(&[
        ("$where", where_clause),
        ("$order", "amount DESC"),
        ("$limit", "50000"),
    ]);

    let rows: Vec<SocrataRow> = match request.send().await {
        Ok(response) if response.status().is_success() => match response.json().await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(
                    target: TARGET_WEB_REQUEST,
                    "Failed to parse portal response from {}: {}", base_url, err
                );
                return Vec::new();
            }
        },
        Ok(response) => {
            warn!(
                target: TARGET_WEB_REQUEST,
                "Non-success status {} from portal {}", response.status(), base_url
            );
            return Vec::new();
        }
        Err(err) => {
            warn!(target: TARGET_WEB_REQUEST, "Portal request to {} failed: {}", base_url, err);
            return Vec::new();
        }
    };

    let mut by_candidate: HashMap<String, Vec<RawContribution>> = HashMap::new();
    for row in rows {
        let candidate = row.candidate_name.trim();
        let amount: f64 = row.amount.trim().parse().unwrap_or(0.0);
        if candidate.is_empty() || amount <= 0.0 {
            continue;
        }
        let hint = row.contributor_type.trim();
        by_candidate
            .entry(candidate.to_string())
            .or_default()
            .push(RawContribution {
                contributor_name: row.contributor_name.trim().to_string(),
                amount,
                type_hint: (!hint.is_empty()).then(|| hint.to_string()),
                ..Default::default()
            });
    }

    let mut records: Vec<SourceFinanceRecord> = by_candidate
        .into_iter()
        .filter_map(|(name, raw)| summarize_contributions(&name, &raw, lookup_url))
        .collect();
    records.sort_by(|a, b| a.name.cmp(&b.name));

    debug!(
        target: TARGET_WEB_REQUEST,
        "Socrata portal {} produced {} candidate records", base_url, records.len()
    );
    records
}

/// Fold one candidate's raw portal contributions into a finance record:
/// summed total and a ranked, capped donor list with uninformative
/// pass-through entries removed. None when nothing was raised.
pub fn summarize_contributions(
    candidate_name: &str,
    raw: &[RawContribution],
    lookup_url: &str,
) -> Option<SourceFinanceRecord> {
    let mut total = 0.0;
    let mut by_donor: HashMap<String, (f64, Option<String>)> = HashMap::new();

    for item in raw {
        if item.amount <= 0.0 {
            continue;
        }
        total += item.amount;
        let donor = item.contributor_name.trim();
        if donor.is_empty() || is_uninformative(donor) {
            continue;
        }
        let entry = by_donor.entry(donor.to_string()).or_default();
        entry.0 += item.amount;
        if item.type_hint.is_some() {
            entry.1 = item.type_hint.clone();
        }
    }

    if total <= 0.0 {
        return None;
    }

    let raw_donors: Vec<RawDonorTotal> = by_donor
        .into_iter()
        .map(|(name, (amount, hint))| RawDonorTotal { name, amount, hint })
        .collect();

    Some(SourceFinanceRecord {
        name: candidate_name.to_string(),
        total_raised: round2(total),
        donors: rank_donor_totals(raw_donors),
        party: None,
        incumbent: None,
        lookup_url: lookup_url.to_string(),
    })
}

struct RawDonorTotal {
    name: String,
    amount: f64,
    hint: Option<String>,
}

fn rank_donor_totals(raw: Vec<RawDonorTotal>) -> Vec<DonorRecord> {
    let mut donors: Vec<DonorRecord> = raw
        .into_iter()
        .map(|donor| DonorRecord {
            category: classify(&donor.name, donor.hint.as_deref()),
            name: title_case(&donor.name),
            amount: round2(donor.amount),
            count: None,
            description: None,
        })
        .collect();
    donors.sort_by(|a, b| b.amount.total_cmp(&a.amount).then(a.name.cmp(&b.name)));
    donors.truncate(DETAIL_DONOR_CAP);
    donors
}

/// Accumulated per-donor totals from a candidate page, ranked and capped.
fn donor_list(raw: &[RawContribution]) -> Vec<DonorRecord> {
    let mut by_donor: HashMap<String, f64> = HashMap::new();
    for item in raw {
        let donor = item.contributor_name.trim();
        if donor.is_empty() || item.amount <= 0.0 || is_uninformative(donor) {
            continue;
        }
        *by_donor.entry(donor.to_string()).or_default() += item.amount;
    }
    rank_donor_totals(
        by_donor
            .into_iter()
            .map(|(name, amount)| RawDonorTotal { name, amount, hint: None })
            .collect(),
    )
}
