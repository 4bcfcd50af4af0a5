use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::config::state_name;
use crate::model::{CandidateRecord, District, Office, Race};
use crate::TARGET_FUSION;

/// Build the race key for a candidate: `(state, office, district)`.
/// Senate and governor races carry no district; House candidates without a
/// parsed district fall back to the at-large marker.
pub fn race_key(candidate: &CandidateRecord) -> String {
    match candidate.office {
        Office::Senate | Office::Governor => {
            format!("{}-{}", candidate.state, candidate.office.key())
        }
        Office::House => {
            let district = candidate.district.unwrap_or(District::AtLarge);
            format!("{}-house-{}", candidate.state, district.key())
        }
    }
}

fn race_label(state: &str, office: Office, district: Option<District>) -> String {
    let name = state_name(state);
    match office {
        Office::Senate => format!("U.S. Senate - {name}"),
        Office::Governor => format!("Governor - {name}"),
        Office::House => match district.unwrap_or(District::AtLarge) {
            District::AtLarge => format!("U.S. House - {name} (At-Large)"),
            District::Numbered(n) => format!("U.S. House - {name}, District {n}"),
        },
    }
}

// Dedup score: incumbency dominates, then evidence richness, then money.
fn keeps_over(a: &CandidateRecord, b: &CandidateRecord) -> bool {
    (a.incumbent, a.donors.len(), a.total_raised())
        > (b.incumbent, b.donors.len(), b.total_raised())
}

/// Partition the candidate set into races, remove duplicate filings within
/// each race, remove same-person ghost filings across races, and order each
/// roster incumbents-first then by total raised descending.
pub fn build_races(candidates: Vec<CandidateRecord>) -> BTreeMap<String, Race> {
    let total_in = candidates.len();

    // Group by race, deduplicating within each race by identity key.
    let mut grouped: BTreeMap<String, BTreeMap<String, CandidateRecord>> = BTreeMap::new();
    for candidate in candidates {
        let key = race_key(&candidate);
        let by_identity = grouped.entry(key).or_default();
        let identity = candidate.identity_key();
        match by_identity.get(&identity) {
            Some(existing) if !keeps_over(&candidate, existing) => {
                debug!(
                    target: TARGET_FUSION,
                    "Dropping duplicate filing for {} in {}", candidate.name, race_key(&candidate)
                );
            }
            _ => {
                by_identity.insert(identity, candidate);
            }
        }
    }

    // Cross-race ghost removal: a person appearing in several races where
    // one appearance has money and another has none loses the empty ones.
    let mut appearances: HashMap<(String, String), Vec<(String, f64)>> = HashMap::new();
    for (race, by_identity) in &grouped {
        for (identity, candidate) in by_identity {
            appearances
                .entry((candidate.state.clone(), identity.clone()))
                .or_default()
                .push((race.clone(), candidate.total_raised()));
        }
    }

    let mut ghosts = 0usize;
    for ((state, identity), entries) in appearances {
        if entries.len() < 2 {
            continue;
        }
        let has_funded = entries.iter().any(|(_, total)| *total > 0.0);
        let has_empty = entries.iter().any(|(_, total)| *total <= 0.0);
        if !(has_funded && has_empty) {
            continue;
        }
        for (race, total) in entries {
            if total <= 0.0 {
                if let Some(by_identity) = grouped.get_mut(&race) {
                    if by_identity.remove(&identity).is_some() {
                        ghosts += 1;
                        debug!(
                            target: TARGET_FUSION,
                            "Removed ghost filing for '{}' ({}) in {}", identity, state, race
                        );
                    }
                }
            }
        }
    }

    let mut races = BTreeMap::new();
    let mut total_out = 0usize;
    for (key, by_identity) in grouped {
        let mut roster: Vec<CandidateRecord> = by_identity.into_values().collect();
        if roster.is_empty() {
            continue;
        }
        roster.sort_by(|a, b| {
            b.incumbent
                .cmp(&a.incumbent)
                .then(b.total_raised().total_cmp(&a.total_raised()))
                .then_with(|| a.name.cmp(&b.name))
        });

        let first = &roster[0];
        let label = race_label(&first.state, first.office, first.district);
        total_out += roster.len();
        races.insert(
            key.clone(),
            Race {
                race_key: key,
                label,
                state: first.state.clone(),
                office: first.office,
                candidates: roster,
            },
        );
    }

    info!(
        target: TARGET_FUSION,
        "Built {} races from {} candidates ({} kept, {} ghost filings removed)",
        races.len(),
        total_in,
        total_out,
        ghosts
    );

    races
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommitteeTotals, DonorCategory, DonorRecord, Party};

    fn candidate(
        name: &str,
        state: &str,
        office: Office,
        district: Option<District>,
        incumbent: bool,
        total: f64,
    ) -> CandidateRecord {
        CandidateRecord {
            name: name.to_string(),
            party: Party::Democratic,
            party_full: Party::Democratic.full_name().to_string(),
            state: state.to_string(),
            office,
            district,
            incumbent,
            fec_id: String::new(),
            committee_id: String::new(),
            totals: (total > 0.0).then(|| CommitteeTotals::raised_only(total)),
            funding_breakdown: Default::default(),
            donors: Vec::new(),
            lookup_url: String::new(),
        }
    }

    fn with_donors(mut c: CandidateRecord, n: usize) -> CandidateRecord {
        c.donors = (0..n)
            .map(|i| DonorRecord {
                name: format!("Donor {i}"),
                amount: 1000.0,
                category: DonorCategory::Individual,
                count: None,
                description: None,
            })
            .collect();
        c
    }

    #[test]
    fn test_race_keys() {
        let senate = candidate("A", "TX", Office::Senate, None, false, 0.0);
        assert_eq!(race_key(&senate), "TX-senate");

        let house = candidate("B", "CA", Office::House, Some(District::Numbered(12)), false, 0.0);
        assert_eq!(race_key(&house), "CA-house-12");

        let at_large = candidate("C", "AK", Office::House, Some(District::AtLarge), false, 0.0);
        assert_eq!(race_key(&at_large), "AK-house-AL");

        let governor = candidate("D", "NE", Office::Governor, None, false, 0.0);
        assert_eq!(race_key(&governor), "NE-governor");
    }

    #[test]
    fn test_race_labels() {
        let races = build_races(vec![
            candidate("A", "TX", Office::Senate, None, false, 100.0),
            candidate("B", "AK", Office::House, Some(District::AtLarge), false, 100.0),
            candidate("C", "CA", Office::House, Some(District::Numbered(12)), false, 100.0),
            candidate("D", "NE", Office::Governor, None, false, 100.0),
        ]);
        assert_eq!(races["TX-senate"].label, "U.S. Senate - Texas");
        assert_eq!(races["AK-house-AL"].label, "U.S. House - Alaska (At-Large)");
        assert_eq!(races["CA-house-12"].label, "U.S. House - California, District 12");
        assert_eq!(races["NE-governor"].label, "Governor - Nebraska");
    }

    #[test]
    fn test_within_race_dedup_incumbency_dominates() {
        let incumbent = with_donors(
            candidate("Jane Smith", "TX", Office::Senate, None, true, 10_000.0),
            2,
        );
        let challenger_dupe = with_donors(
            candidate("Smith, Jane", "TX", Office::Senate, None, false, 90_000.0),
            8,
        );
        let races = build_races(vec![incumbent, challenger_dupe]);
        let roster = &races["TX-senate"].candidates;
        assert_eq!(roster.len(), 1);
        assert!(roster[0].incumbent);
        assert_eq!(roster[0].donors.len(), 2);
    }

    #[test]
    fn test_within_race_dedup_donor_count_breaks_ties() {
        let sparse = with_donors(
            candidate("Jane Smith", "TX", Office::Senate, None, false, 90_000.0),
            1,
        );
        let rich = with_donors(
            candidate("Smith, Jane", "TX", Office::Senate, None, false, 10_000.0),
            6,
        );
        let races = build_races(vec![sparse, rich]);
        let roster = &races["TX-senate"].candidates;
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].donors.len(), 6);
    }

    #[test]
    fn test_ghost_filing_removed() {
        let ghost = candidate("Pat Doe", "TX", Office::Senate, None, false, 0.0);
        let funded = candidate(
            "Pat Doe",
            "TX",
            Office::House,
            Some(District::Numbered(7)),
            false,
            50_000.0,
        );
        let races = build_races(vec![ghost, funded]);
        assert!(!races.contains_key("TX-senate"));
        assert_eq!(races["TX-house-7"].candidates.len(), 1);
    }

    #[test]
    fn test_multi_race_candidacy_without_ghost_left_alone() {
        let senate = candidate("Pat Doe", "TX", Office::Senate, None, false, 20_000.0);
        let house = candidate(
            "Pat Doe",
            "TX",
            Office::House,
            Some(District::Numbered(7)),
            false,
            50_000.0,
        );
        let races = build_races(vec![senate, house]);
        assert_eq!(races["TX-senate"].candidates.len(), 1);
        assert_eq!(races["TX-house-7"].candidates.len(), 1);
    }

    #[test]
    fn test_same_name_different_states_not_ghosts() {
        let tx = candidate("Pat Doe", "TX", Office::Senate, None, false, 0.0);
        let ok = candidate("Pat Doe", "OK", Office::Senate, None, false, 50_000.0);
        let races = build_races(vec![tx, ok]);
        assert_eq!(races["TX-senate"].candidates.len(), 1);
        assert_eq!(races["OK-senate"].candidates.len(), 1);
    }

    #[test]
    fn test_ordering_incumbents_first_then_money() {
        let races = build_races(vec![
            candidate("Rich Challenger", "TX", Office::Senate, None, false, 900_000.0),
            candidate("The Incumbent", "TX", Office::Senate, None, true, 100_000.0),
            candidate("Poor Challenger", "TX", Office::Senate, None, false, 5_000.0),
        ]);
        let roster = &races["TX-senate"].candidates;
        assert_eq!(roster[0].name, "The Incumbent");
        assert_eq!(roster[1].name, "Rich Challenger");
        assert_eq!(roster[2].name, "Poor Challenger");
    }
}
