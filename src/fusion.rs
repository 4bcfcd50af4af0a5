use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::finance::breakdown_from_donors;
use crate::identity::{normalize_name, NameMatcher};
use crate::model::{CandidateRecord, CommitteeTotals, Office, Party, SourceFinanceRecord};
use crate::TARGET_FUSION;

/// Unmatched source records below this total are dropped instead of being
/// promoted into the roster (test filings, stale committees).
pub const DEFAULT_INCLUSION_FLOOR: f64 = 1000.0;

#[derive(Debug, Clone)]
pub struct FusionOptions {
    /// Minimum total for promoting a source-only candidate.
    pub inclusion_floor: f64,
    /// Office assigned to promoted candidates (taken from fetch context).
    pub office: Office,
    /// Source name, for logging only.
    pub source: &'static str,
}

impl FusionOptions {
    pub fn new(office: Office, source: &'static str) -> Self {
        FusionOptions {
            inclusion_floor: DEFAULT_INCLUSION_FLOOR,
            office,
            source,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub merged: usize,
    pub promoted: usize,
    pub parties_backfilled: usize,
}

/// Merge per-candidate financial data from one source into the roster.
///
/// A source may only fill financial fields that are currently empty on a
/// roster candidate; it never overwrites a non-zero total from an earlier,
/// higher-precedence source. Matching is restricted to the candidate's own
/// state and takes the first source record the matcher accepts. Unmatched
/// source records above the inclusion floor become new roster candidates.
/// Party backfill is the single exception to the fill-only rule: a specific
/// party from a source replaces an unknown/independent roster party.
pub fn merge(
    roster: &mut Vec<CandidateRecord>,
    sources: &HashMap<String, Vec<SourceFinanceRecord>>,
    matcher: &dyn NameMatcher,
    opts: &FusionOptions,
) -> MergeStats {
    let mut stats = MergeStats::default();

    for candidate in roster.iter_mut() {
        let Some(records) = sources.get(&candidate.state) else {
            continue;
        };

        // First match wins; see the matcher seam for the stricter option.
        let matched = records
            .iter()
            .find(|record| matcher.names_match(&candidate.name, &record.name));
        let Some(record) = matched else {
            continue;
        };

        if !candidate.has_finance() && record.total_raised > 0.0 {
            candidate.totals = Some(CommitteeTotals::raised_only(record.total_raised));
            candidate.donors = record.donors.clone();
            candidate.funding_breakdown = breakdown_from_donors(&record.donors);
            if !record.lookup_url.is_empty() {
                candidate.lookup_url = record.lookup_url.clone();
            }
            stats.merged += 1;
            debug!(
                target: TARGET_FUSION,
                "{}: filled {} ({}) with total {:.0}",
                opts.source, candidate.name, candidate.state, record.total_raised
            );
        }

        if matches!(candidate.party, Party::Independent | Party::Unknown) {
            if let Some(party) = record.party {
                if party.is_specific() {
                    candidate.party = party;
                    candidate.party_full = party.full_name().to_string();
                    stats.parties_backfilled += 1;
                }
            }
        }
    }

    // Promote source-only candidates with no roster match.
    let mut existing: HashMap<String, HashSet<String>> = HashMap::new();
    for candidate in roster.iter() {
        existing
            .entry(candidate.state.clone())
            .or_default()
            .insert(candidate.identity_key());
    }

    // Deterministic promotion order regardless of map iteration order
    let mut states: Vec<&String> = sources.keys().collect();
    states.sort();

    for state in states {
        for record in &sources[state] {
            if record.total_raised < opts.inclusion_floor {
                continue;
            }
            let key = normalize_name(&record.name);
            let state_keys = existing.entry(state.clone()).or_default();
            if state_keys.contains(&key) {
                continue;
            }

            let party = record.party.unwrap_or(Party::Independent);
            roster.push(CandidateRecord {
                name: record.name.clone(),
                party,
                party_full: party.full_name().to_string(),
                state: state.clone(),
                office: opts.office,
                district: None,
                incumbent: record.incumbent.unwrap_or(false),
                fec_id: String::new(),
                committee_id: String::new(),
                totals: Some(CommitteeTotals::raised_only(record.total_raised)),
                funding_breakdown: breakdown_from_donors(&record.donors),
                donors: record.donors.clone(),
                lookup_url: record.lookup_url.clone(),
            });
            state_keys.insert(key);
            stats.promoted += 1;
        }
    }

    info!(
        target: TARGET_FUSION,
        "{}: merged {} existing, promoted {} new, backfilled {} parties",
        opts.source, stats.merged, stats.promoted, stats.parties_backfilled
    );

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::HeuristicMatcher;
    use crate::model::{DonorCategory, DonorRecord};

    fn roster_candidate(name: &str, state: &str, total: f64) -> CandidateRecord {
        CandidateRecord {
            name: name.to_string(),
            party: Party::Independent,
            party_full: Party::Independent.full_name().to_string(),
            state: state.to_string(),
            office: Office::Governor,
            district: None,
            incumbent: false,
            fec_id: String::new(),
            committee_id: String::new(),
            totals: (total > 0.0).then(|| CommitteeTotals::raised_only(total)),
            funding_breakdown: Default::default(),
            donors: Vec::new(),
            lookup_url: String::new(),
        }
    }

    fn source_record(name: &str, total: f64) -> SourceFinanceRecord {
        SourceFinanceRecord {
            name: name.to_string(),
            total_raised: total,
            donors: vec![DonorRecord {
                name: "Top Donor".to_string(),
                amount: total / 2.0,
                category: DonorCategory::Individual,
                count: None,
                description: None,
            }],
            party: None,
            incumbent: None,
            lookup_url: String::new(),
        }
    }

    fn by_state(state: &str, records: Vec<SourceFinanceRecord>) -> HashMap<String, Vec<SourceFinanceRecord>> {
        let mut map = HashMap::new();
        map.insert(state.to_string(), records);
        map
    }

    #[test]
    fn test_fill_only_never_overwrites() {
        let mut roster = vec![roster_candidate("Jane Smith", "NE", 75_000.0)];
        let sources = by_state("NE", vec![source_record("Smith, Jane", 10_000.0)]);
        let stats = merge(
            &mut roster,
            &sources,
            &HeuristicMatcher,
            &FusionOptions::new(Office::Governor, "test"),
        );
        assert_eq!(stats.merged, 0);
        assert_eq!(roster[0].total_raised(), 75_000.0);
    }

    #[test]
    fn test_fills_empty_candidate() {
        let mut roster = vec![roster_candidate("Jane Smith", "NE", 0.0)];
        let sources = by_state("NE", vec![source_record("Smith, Jane", 40_000.0)]);
        let stats = merge(
            &mut roster,
            &sources,
            &HeuristicMatcher,
            &FusionOptions::new(Office::Governor, "test"),
        );
        assert_eq!(stats.merged, 1);
        assert_eq!(roster[0].total_raised(), 40_000.0);
        assert_eq!(roster[0].donors.len(), 1);
        assert_eq!(roster[0].funding_breakdown.individual, 100.0);
    }

    #[test]
    fn test_matching_restricted_to_state() {
        let mut roster = vec![roster_candidate("Jane Smith", "IA", 0.0)];
        let sources = by_state("NE", vec![source_record("Jane Smith", 40_000.0)]);
        let stats = merge(
            &mut roster,
            &sources,
            &HeuristicMatcher,
            &FusionOptions::new(Office::Governor, "test"),
        );
        assert_eq!(stats.merged, 0);
        assert!(!roster[0].has_finance());
        // The unmatched record is promoted under its own state instead
        assert_eq!(stats.promoted, 1);
        assert_eq!(roster[1].state, "NE");
    }

    #[test]
    fn test_promotion_above_floor() {
        let mut roster = vec![roster_candidate("Jane Smith", "NE", 0.0)];
        let sources = by_state(
            "NE",
            vec![
                source_record("Jane Smith", 40_000.0),
                source_record("Sam Newcomer", 5_000.0),
                source_record("Tiny Filer", 500.0),
            ],
        );
        let stats = merge(
            &mut roster,
            &sources,
            &HeuristicMatcher,
            &FusionOptions::new(Office::Governor, "test"),
        );
        assert_eq!(stats.promoted, 1);
        assert_eq!(roster.len(), 2);
        let promoted = &roster[1];
        assert_eq!(promoted.name, "Sam Newcomer");
        assert_eq!(promoted.party, Party::Independent);
        assert_eq!(promoted.office, Office::Governor);
        assert!(promoted.fec_id.is_empty());
    }

    #[test]
    fn test_party_backfill() {
        let mut roster = vec![roster_candidate("Jane Smith", "NE", 50_000.0)];
        let mut record = source_record("Jane Smith", 50_000.0);
        record.party = Some(Party::Democratic);
        let sources = by_state("NE", vec![record]);
        let stats = merge(
            &mut roster,
            &sources,
            &HeuristicMatcher,
            &FusionOptions::new(Office::Governor, "test"),
        );
        assert_eq!(stats.parties_backfilled, 1);
        assert_eq!(roster[0].party, Party::Democratic);
        assert_eq!(roster[0].party_full, "Democratic Party");
        // Finance untouched: fill-only
        assert_eq!(stats.merged, 0);
    }

    #[test]
    fn test_constitution_party_not_backfilled() {
        let mut roster = vec![roster_candidate("Jane Smith", "NE", 0.0)];
        let mut record = source_record("Jane Smith", 40_000.0);
        record.party = Some(Party::Constitution);
        let sources = by_state("NE", vec![record]);
        merge(
            &mut roster,
            &sources,
            &HeuristicMatcher,
            &FusionOptions::new(Office::Governor, "test"),
        );
        assert_eq!(roster[0].party, Party::Independent);
    }

    #[test]
    fn test_first_match_wins() {
        // Two source records both match; the first in source order is used.
        let mut roster = vec![roster_candidate("Michael Jones", "NE", 0.0)];
        let sources = by_state(
            "NE",
            vec![
                source_record("Michael Jones", 10_000.0),
                source_record("Michael A. Jones", 99_000.0),
            ],
        );
        merge(
            &mut roster,
            &sources,
            &HeuristicMatcher,
            &FusionOptions::new(Office::Governor, "test"),
        );
        assert_eq!(roster[0].total_raised(), 10_000.0);
    }

    #[test]
    fn test_empty_source_is_harmless() {
        let mut roster = vec![roster_candidate("Jane Smith", "NE", 0.0)];
        let sources = HashMap::new();
        let stats = merge(
            &mut roster,
            &sources,
            &HeuristicMatcher,
            &FusionOptions::new(Office::Governor, "test"),
        );
        assert_eq!(stats, MergeStats::default());
        assert_eq!(roster.len(), 1);
    }
}
