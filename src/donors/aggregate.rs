use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::classify::{classify, is_platform_or_jfc, is_uninformative, NON_INFORMATIVE_EMPLOYERS};
use super::TARGET_DONORS;
use crate::model::{DonorCategory, DonorRecord, RawContribution};
use crate::util::{round2, title_case};

#[derive(Default)]
struct EmployerBucket {
    total: f64,
    rows: u32,
    contributors: HashSet<String>,
}

#[derive(Default)]
struct PayerBucket {
    total: f64,
    occupation: String,
    hint: Option<String>,
}

/// Fold raw itemized contributions into a ranked, capped list of distinct
/// payers.
///
/// Contributions with an informative declared employer are grouped by that
/// employer as an organization; the rest are grouped by the contributor's
/// own name. Individually-grouped payers must meet `floor` to appear;
/// employer groups have no floor. Output is sorted by accumulated amount
/// descending and truncated to `cap`.
pub fn aggregate_individual(raw: &[RawContribution], floor: f64, cap: usize) -> Vec<DonorRecord> {
    let mut by_employer: HashMap<String, EmployerBucket> = HashMap::new();
    let mut by_name: HashMap<String, PayerBucket> = HashMap::new();

    for item in raw {
        let name = item.contributor_name.trim();
        if name.is_empty() || item.amount <= 0.0 {
            continue;
        }
        if is_uninformative(name) || is_uninformative(&item.employer) {
            continue;
        }

        let employer = item.employer.trim().to_uppercase();
        if employer.is_empty() || NON_INFORMATIVE_EMPLOYERS.contains(employer.as_str()) {
            let bucket = by_name.entry(name.to_string()).or_default();
            bucket.total += item.amount;
            bucket.occupation = item.occupation.trim().to_string();
            bucket.hint = item.type_hint.clone();
        } else {
            let bucket = by_employer.entry(employer).or_default();
            bucket.total += item.amount;
            bucket.rows += 1;
            bucket.contributors.insert(name.to_string());
        }
    }

    let mut donors = Vec::with_capacity(by_employer.len() + by_name.len());

    for (employer, bucket) in by_employer {
        let count = if bucket.contributors.is_empty() {
            bucket.rows
        } else {
            bucket.contributors.len() as u32
        };
        let mut display_name = title_case(&employer);
        if count > 1 {
            display_name.push_str(&format!(" ({count} employees)"));
        }
        donors.push(DonorRecord {
            name: display_name,
            amount: round2(bucket.total),
            category: DonorCategory::Organization,
            count: Some(count),
            description: None,
        });
    }

    for (name, bucket) in by_name {
        if bucket.total < floor {
            continue;
        }
        let description = if bucket.occupation.is_empty() {
            None
        } else {
            Some(title_case(&bucket.occupation))
        };
        donors.push(DonorRecord {
            name: title_case(&name),
            amount: round2(bucket.total),
            category: classify(&name, bucket.hint.as_deref()),
            count: None,
            description,
        });
    }

    rank_and_cap(donors, cap)
}

/// Fold committee-level contributions into a ranked payer list. Grouping is
/// by contributor name directly; fundraising platforms, joint-fundraising
/// transfers, and uninformative rollups are excluded before grouping.
pub fn aggregate_committee(raw: &[RawContribution], cap: usize) -> Vec<DonorRecord> {
    let mut by_name: HashMap<String, f64> = HashMap::new();
    let mut skipped = 0usize;

    for item in raw {
        let name = item.contributor_name.trim();
        if name.is_empty() || item.amount <= 0.0 {
            continue;
        }
        if is_platform_or_jfc(name) || is_uninformative(name) {
            skipped += 1;
            continue;
        }
        *by_name.entry(name.to_string()).or_default() += item.amount;
    }

    if skipped > 0 {
        debug!(
            target: TARGET_DONORS,
            "Excluded {} pass-through or uninformative committee entries", skipped
        );
    }

    let donors = by_name
        .into_iter()
        .map(|(name, total)| DonorRecord {
            name: title_case(&name),
            amount: round2(total),
            category: DonorCategory::Pac,
            count: None,
            description: None,
        })
        .collect();

    rank_and_cap(donors, cap)
}

fn rank_and_cap(mut donors: Vec<DonorRecord>, cap: usize) -> Vec<DonorRecord> {
    donors.sort_by(|a, b| b.amount.total_cmp(&a.amount).then(a.name.cmp(&b.name)));
    donors.truncate(cap);
    donors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contribution(name: &str, employer: &str, occupation: &str, amount: f64) -> RawContribution {
        RawContribution {
            contributor_name: name.to_string(),
            employer: employer.to_string(),
            occupation: occupation.to_string(),
            amount,
            type_hint: None,
        }
    }

    #[test]
    fn test_employer_grouping() {
        let raw = vec![
            contribution("ALICE ADAMS", "ACME CORP", "ENGINEER", 2000.0),
            contribution("BOB BROWN", "ACME CORP", "MANAGER", 1500.0),
            contribution("CAROL CLARK", "ACME CORP", "ANALYST", 500.0),
        ];
        let donors = aggregate_individual(&raw, 500.0, 10);
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].name, "Acme Corp (3 employees)");
        assert_eq!(donors[0].amount, 4000.0);
        assert_eq!(donors[0].category, DonorCategory::Organization);
        assert_eq!(donors[0].count, Some(3));
    }

    #[test]
    fn test_single_employee_has_no_count_suffix() {
        let raw = vec![contribution("ALICE ADAMS", "ACME CORP", "", 1000.0)];
        let donors = aggregate_individual(&raw, 500.0, 10);
        assert_eq!(donors[0].name, "Acme Corp");
        assert_eq!(donors[0].count, Some(1));
    }

    #[test]
    fn test_significance_floor_for_individuals() {
        // "RETIRED" is a non-informative employer, so both group by name
        let raw = vec![
            contribution("JANE DOE", "RETIRED", "RETIRED", 600.0),
            contribution("JOHN ROE", "RETIRED", "RETIRED", 400.0),
        ];
        let donors = aggregate_individual(&raw, 500.0, 10);
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].name, "Jane Doe");
        assert_eq!(donors[0].category, DonorCategory::Individual);
    }

    #[test]
    fn test_floor_applies_to_accumulated_total() {
        let raw = vec![
            contribution("JANE DOE", "", "TEACHER", 300.0),
            contribution("JANE DOE", "", "TEACHER", 300.0),
        ];
        let donors = aggregate_individual(&raw, 500.0, 10);
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].amount, 600.0);
        assert_eq!(donors[0].description.as_deref(), Some("Teacher"));
    }

    #[test]
    fn test_employer_groups_have_no_floor() {
        let raw = vec![contribution("ALICE ADAMS", "SMALL SHOP LLC", "", 50.0)];
        let donors = aggregate_individual(&raw, 500.0, 10);
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].amount, 50.0);
    }

    #[test]
    fn test_uninformative_entries_dropped() {
        let raw = vec![
            contribution("UNITEMIZED RECEIPTS", "", "", 90_000.0),
            contribution("ANONYMOUS", "", "", 5_000.0),
            contribution("JANE DOE", "AGGREGATED CONTRIBUTIONS", "", 1_000.0),
            contribution("REAL PERSON", "", "", 800.0),
        ];
        let donors = aggregate_individual(&raw, 500.0, 10);
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].name, "Real Person");
    }

    #[test]
    fn test_malformed_records_skipped() {
        let raw = vec![
            contribution("", "", "", 1000.0),
            contribution("JANE DOE", "", "", 0.0),
            contribution("JANE DOE", "", "", -50.0),
        ];
        assert!(aggregate_individual(&raw, 500.0, 10).is_empty());
    }

    #[test]
    fn test_ranked_and_capped() {
        let raw = vec![
            contribution("A PERSON", "", "", 600.0),
            contribution("B PERSON", "", "", 900.0),
            contribution("C PERSON", "", "", 700.0),
        ];
        let donors = aggregate_individual(&raw, 500.0, 2);
        assert_eq!(donors.len(), 2);
        assert_eq!(donors[0].name, "B Person");
        assert_eq!(donors[1].name, "C Person");
    }

    #[test]
    fn test_committee_grouping_excludes_pass_through() {
        let raw = vec![
            contribution("WINRED", "", "", 500_000.0),
            contribution("SMITH VICTORY FUND", "", "", 100_000.0),
            contribution("TEACHERS UNION PAC", "", "", 10_000.0),
            contribution("TEACHERS UNION PAC", "", "", 5_000.0),
        ];
        let donors = aggregate_committee(&raw, 10);
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].name, "Teachers Union Pac");
        assert_eq!(donors[0].amount, 15_000.0);
        assert_eq!(donors[0].category, DonorCategory::Pac);
    }
}
