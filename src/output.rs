use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::donors::SUMMARY_DONOR_CAP;
use crate::model::{CandidateRecord, District, DonorRecord, FundingBreakdown, Office, Race};
use crate::util::format_money;
use crate::TARGET_FUSION;

/// Public-facing view of one candidate, shaped for the published dataset.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateEntry {
    pub name: String,
    pub party: String,
    pub party_full: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<District>,
    pub office: Office,
    pub incumbent: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fec_id: String,
    pub total_raised: f64,
    pub total_raised_display: String,
    pub cash_on_hand: f64,
    pub funding_breakdown: FundingBreakdown,
    pub top_donors: Vec<DonorRecord>,
    pub all_donors: Vec<DonorRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fec_url: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub lookup_url: String,
}

/// One published race: label plus its candidate entries, in roster order.
#[derive(Debug, Clone, Serialize)]
pub struct RaceEntry {
    pub race_key: String,
    pub label: String,
    pub state: String,
    pub office: Office,
    pub candidates: Vec<CandidateEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub last_updated: String,
    pub election_year: i32,
    pub total_races: usize,
    pub total_candidates: usize,
    pub data_sources: Vec<String>,
}

/// Flatten an internal candidate record into its published form.
pub fn candidate_entry(candidate: &CandidateRecord) -> CandidateEntry {
    let total = candidate.total_raised();
    let fec_url = (!candidate.fec_id.is_empty())
        .then(|| format!("https://www.fec.gov/data/candidate/{}/", candidate.fec_id));

    CandidateEntry {
        name: candidate.name.clone(),
        party: candidate.party.code().to_string(),
        party_full: candidate.party_full.clone(),
        state: candidate.state.clone(),
        district: candidate.district,
        office: candidate.office,
        incumbent: candidate.incumbent,
        fec_id: candidate.fec_id.clone(),
        total_raised: total,
        total_raised_display: format_money(total),
        cash_on_hand: candidate.cash_on_hand(),
        funding_breakdown: candidate.funding_breakdown.clone(),
        top_donors: candidate
            .donors
            .iter()
            .take(SUMMARY_DONOR_CAP)
            .cloned()
            .collect(),
        all_donors: candidate.donors.clone(),
        fec_url,
        lookup_url: candidate.lookup_url.clone(),
    }
}

fn race_entry(race: &Race) -> RaceEntry {
    RaceEntry {
        race_key: race.race_key.clone(),
        label: race.label.clone(),
        state: race.state.clone(),
        office: race.office,
        candidates: race.candidates.iter().map(candidate_entry).collect(),
    }
}

/// Write the race-keyed dataset and its metadata sidecar.
///
/// `candidates.json` is written compact since it is the large,
/// machine-consumed file; `metadata.json` stays human-readable.
pub fn write_dataset(
    races: &BTreeMap<String, Race>,
    data_dir: &Path,
    cycle: i32,
    data_sources: &[&str],
) -> Result<()> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let dataset: BTreeMap<&String, RaceEntry> =
        races.iter().map(|(key, race)| (key, race_entry(race))).collect();

    let candidates_path = data_dir.join("candidates.json");
    let body = serde_json::to_string(&dataset).context("Failed to serialize dataset")?;
    fs::write(&candidates_path, body)
        .with_context(|| format!("Failed to write {}", candidates_path.display()))?;

    let total_candidates = races.values().map(|race| race.candidates.len()).sum();
    let metadata = Metadata {
        last_updated: Utc::now().to_rfc3339(),
        election_year: cycle,
        total_races: races.len(),
        total_candidates,
        data_sources: data_sources.iter().map(|s| s.to_string()).collect(),
    };
    let metadata_path = data_dir.join("metadata.json");
    let body = serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;
    fs::write(&metadata_path, body)
        .with_context(|| format!("Failed to write {}", metadata_path.display()))?;

    info!(
        target: TARGET_FUSION,
        "Wrote {} races ({} candidates) to {}",
        races.len(),
        total_candidates,
        candidates_path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommitteeTotals, DonorCategory, Party};

    fn candidate(total: f64, donor_count: usize) -> CandidateRecord {
        CandidateRecord {
            name: "Jane Smith".to_string(),
            party: Party::Democratic,
            party_full: "Democratic Party".to_string(),
            state: "TX".to_string(),
            office: Office::Senate,
            district: None,
            incumbent: true,
            fec_id: "S6TX00123".to_string(),
            committee_id: "C00123456".to_string(),
            totals: Some(CommitteeTotals {
                total_raised: total,
                cash_on_hand: 42_000.0,
                ..Default::default()
            }),
            funding_breakdown: Default::default(),
            donors: (0..donor_count)
                .map(|i| DonorRecord {
                    name: format!("Donor {i}"),
                    amount: 1000.0 - i as f64,
                    category: DonorCategory::Individual,
                    count: None,
                    description: None,
                })
                .collect(),
            lookup_url: String::new(),
        }
    }

    #[test]
    fn test_entry_shape() {
        let entry = candidate_entry(&candidate(2_400_000.0, 8));
        assert_eq!(entry.party, "D");
        assert_eq!(entry.total_raised_display, "$2.4M");
        assert_eq!(entry.cash_on_hand, 42_000.0);
        assert_eq!(entry.top_donors.len(), 5);
        assert_eq!(entry.all_donors.len(), 8);
        assert_eq!(
            entry.fec_url.as_deref(),
            Some("https://www.fec.gov/data/candidate/S6TX00123/")
        );
    }

    #[test]
    fn test_entry_without_fec_id_has_no_fec_url() {
        let mut record = candidate(50_000.0, 0);
        record.fec_id = String::new();
        record.lookup_url = "https://example.gov/filing/1".to_string();
        let entry = candidate_entry(&record);
        assert!(entry.fec_url.is_none());

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("fec_url").is_none());
        assert!(json.get("fec_id").is_none());
        assert_eq!(json["lookup_url"], "https://example.gov/filing/1");
    }

    #[test]
    fn test_dataset_files_written() {
        let dir = std::env::temp_dir().join(format!("racefunds-test-{}", std::process::id()));
        let mut races = BTreeMap::new();
        races.insert(
            "TX-senate".to_string(),
            Race {
                race_key: "TX-senate".to_string(),
                label: "U.S. Senate - Texas".to_string(),
                state: "TX".to_string(),
                office: Office::Senate,
                candidates: vec![candidate(100_000.0, 2)],
            },
        );

        write_dataset(&races, &dir, 2026, &["fec"]).unwrap();

        let body = fs::read_to_string(dir.join("candidates.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["TX-senate"]["race_key"], "TX-senate");
        assert_eq!(parsed["TX-senate"]["label"], "U.S. Senate - Texas");
        assert_eq!(parsed["TX-senate"]["candidates"][0]["total_raised_display"], "$100K");

        let meta: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("metadata.json")).unwrap()).unwrap();
        assert_eq!(meta["election_year"], 2026);
        assert_eq!(meta["total_races"], 1);
        assert_eq!(meta["total_candidates"], 1);

        fs::remove_dir_all(&dir).unwrap();
    }
}
