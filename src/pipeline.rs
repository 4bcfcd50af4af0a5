use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio::time::Duration;
use tracing::{info, warn};

use crate::config::{Config, GOVERNOR_STATES, SENATE_STATES, STATES, TERRITORIES};
use crate::donors::{
    aggregate_committee, aggregate_individual, DETAIL_DONOR_CAP, INDIVIDUAL_SIGNIFICANCE_FLOOR,
};
use crate::finance::compute_breakdown;
use crate::fusion::{merge, FusionOptions};
use crate::identity::NameMatcher;
use crate::model::{
    CandidateRecord, CommitteeTotals, DonorRecord, FundingBreakdown, Office, SourceFinanceRecord,
};
use crate::output::write_dataset;
use crate::races::build_races;
use crate::sources::aggregator::AggregatorClient;
use crate::sources::cache;
use crate::sources::fec::FecClient;
use crate::sources::portal::{self, EMBEDDED_PORTAL_STATES};
use crate::sources::roster;
use crate::TARGET_FUSION;

/// Candidates drawing more than this share of funding from PACs get their
/// donor list supplemented with committee-to-committee transfers.
const PAC_SHARE_THRESHOLD: f64 = 2.0;
const PAC_SUPPLEMENT_MIN_TOTAL: f64 = 50_000.0;

const HI_SOCRATA_BASE: &str = "https://hicscdata.hawaii.gov/resource/jexd-xbcg.json";
const HI_PORTAL_URL: &str = "https://hicscdata.hawaii.gov";

const PORTAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Cached slice of a candidate's federal finance enrichment, so reruns
/// within the cache window skip three API calls per candidate.
#[derive(Debug, Serialize, Deserialize)]
struct FinanceSnapshot {
    committee_id: String,
    totals: Option<CommitteeTotals>,
    funding_breakdown: FundingBreakdown,
    donors: Vec<DonorRecord>,
}

pub struct Pipeline {
    config: Config,
    fec: FecClient,
    aggregator: AggregatorClient,
    portal_client: reqwest::Client,
    matcher: Box<dyn NameMatcher>,
    offline: bool,
}

impl Pipeline {
    pub fn new(config: Config, matcher: Box<dyn NameMatcher>, offline: bool) -> Self {
        let fec = FecClient::new(&config);
        let aggregator = AggregatorClient::new(&config);
        let portal_client = reqwest::Client::builder()
            .timeout(PORTAL_TIMEOUT)
            .user_agent("racefunds/0.3 (civic data project)")
            .build()
            .unwrap_or_default();
        Pipeline {
            config,
            fec,
            aggregator,
            portal_client,
            matcher,
            offline,
        }
    }

    /// Run the full refresh: fetch, enrich, fuse, group, and write the
    /// dataset. A failing source degrades to empty data; only filesystem
    /// problems writing the output are fatal.
    pub async fn run(&self, governors_only: bool) -> Result<()> {
        let mut candidates = self.governor_candidates().await;
        if !governors_only {
            candidates.extend(self.federal_candidates().await);
        }

        let races = build_races(candidates);
        write_dataset(
            &races,
            &self.config.data_dir,
            self.config.cycle,
            &[
                "FEC",
                "Ballotpedia",
                "state disclosure portals",
                "state finance aggregator",
            ],
        )
    }

    /// Federal roster: Senate candidates in states with a seat up this
    /// cycle, House candidates everywhere but the territories. Each
    /// candidate is then enriched with committee totals and donors.
    async fn federal_candidates(&self) -> Vec<CandidateRecord> {
        let mut candidates = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for state in SENATE_STATES {
            for candidate in self.state_roster(state, Office::Senate).await {
                if seen.insert(candidate.fec_id.clone()) {
                    candidates.push(candidate);
                }
            }
        }
        for state in STATES {
            if TERRITORIES.contains(&state) {
                continue;
            }
            for candidate in self.state_roster(state, Office::House).await {
                if seen.insert(candidate.fec_id.clone()) {
                    candidates.push(candidate);
                }
            }
        }

        info!(target: TARGET_FUSION, "Federal roster: {} candidates", candidates.len());

        for candidate in candidates.iter_mut() {
            self.enrich_federal(candidate).await;
        }
        candidates
    }

    async fn state_roster(&self, state: &str, office: Office) -> Vec<CandidateRecord> {
        let path = self
            .config
            .cache_dir
            .join(format!("candidates-{state}-{}.json", office.key()));
        if let Some(cached) = cache::load_fresh(&path) {
            return cached;
        }
        if self.offline {
            return Vec::new();
        }
        let roster = self.fec.candidates(state, office).await;
        if !roster.is_empty() {
            cache::store(&path, &roster);
        }
        roster
    }

    /// Fill in one federal candidate's committee, totals, breakdown, and
    /// donor list. A candidate with no principal committee, or for whom
    /// every call fails, is left on the roster with empty finances.
    async fn enrich_federal(&self, candidate: &mut CandidateRecord) {
        let path = self
            .config
            .cache_dir
            .join(format!("finance-{}.json", candidate.fec_id));
        if let Some(snapshot) = cache::load_fresh::<FinanceSnapshot>(&path) {
            candidate.committee_id = snapshot.committee_id;
            candidate.totals = snapshot.totals;
            candidate.funding_breakdown = snapshot.funding_breakdown;
            candidate.donors = snapshot.donors;
            return;
        }
        if self.offline {
            return;
        }

        let Some(committee_id) = self.fec.principal_committee(&candidate.fec_id).await else {
            warn!(
                target: TARGET_FUSION,
                "No principal committee for {} ({})", candidate.name, candidate.fec_id
            );
            return;
        };
        candidate.committee_id = committee_id;

        if let Some(totals) = self.fec.committee_totals(&candidate.committee_id).await {
            candidate.funding_breakdown = compute_breakdown(&totals);
            candidate.totals = Some(totals);
        }

        if candidate.has_finance() {
            let receipts = self.fec.itemized_receipts(&candidate.committee_id, true).await;
            let mut donors =
                aggregate_individual(&receipts, INDIVIDUAL_SIGNIFICANCE_FLOOR, DETAIL_DONOR_CAP);

            if candidate.funding_breakdown.pac > PAC_SHARE_THRESHOLD
                && candidate.total_raised() > PAC_SUPPLEMENT_MIN_TOTAL
            {
                let transfers = self.fec.itemized_receipts(&candidate.committee_id, false).await;
                donors.extend(aggregate_committee(&transfers, DETAIL_DONOR_CAP));
                donors.sort_by(|a, b| b.amount.total_cmp(&a.amount).then(a.name.cmp(&b.name)));
                donors.truncate(DETAIL_DONOR_CAP);
            }
            candidate.donors = donors;
        }

        cache::store(
            &path,
            &FinanceSnapshot {
                committee_id: candidate.committee_id.clone(),
                totals: candidate.totals.clone(),
                funding_breakdown: candidate.funding_breakdown.clone(),
                donors: candidate.donors.clone(),
            },
        );
    }

    /// Governor roster: declared candidates from the encyclopedia first,
    /// then finance fusion. Portal records are merged before the
    /// aggregator and therefore take precedence; either source may also
    /// promote a filer the encyclopedia has not listed yet.
    async fn governor_candidates(&self) -> Vec<CandidateRecord> {
        let mut roster = self.encyclopedia_roster().await;

        let portal_records = self.portal_records().await;
        merge(
            &mut roster,
            &portal_records,
            self.matcher.as_ref(),
            &FusionOptions::new(Office::Governor, "state portal"),
        );

        let aggregator_records = self.aggregator_records().await;
        merge(
            &mut roster,
            &aggregator_records,
            self.matcher.as_ref(),
            &FusionOptions::new(Office::Governor, "state aggregator"),
        );

        info!(target: TARGET_FUSION, "Governor roster: {} candidates", roster.len());
        roster
    }

    async fn encyclopedia_roster(&self) -> Vec<CandidateRecord> {
        let mut candidates = Vec::new();
        for state in GOVERNOR_STATES {
            let path = self.config.cache_dir.join(format!("roster-{state}.json"));
            let state_roster: Vec<CandidateRecord> = match cache::load_fresh(&path) {
                Some(cached) => cached,
                None if self.offline => Vec::new(),
                None => {
                    let fetched =
                        roster::governor_roster(&self.portal_client, state, self.config.cycle)
                            .await;
                    if !fetched.is_empty() {
                        cache::store(&path, &fetched);
                    }
                    fetched
                }
            };
            candidates.extend(state_roster);
        }
        info!(
            target: TARGET_FUSION,
            "Encyclopedia roster: {} declared governor candidates", candidates.len()
        );
        candidates
    }

    async fn portal_records(&self) -> HashMap<String, Vec<SourceFinanceRecord>> {
        let mut by_state = HashMap::new();
        for state in GOVERNOR_STATES {
            if !EMBEDDED_PORTAL_STATES.contains(&state) && state != "HI" {
                continue;
            }
            let records = self.cached_portal(state).await;
            if !records.is_empty() {
                by_state.insert(state.to_string(), records);
            }
        }
        by_state
    }

    async fn cached_portal(&self, state: &str) -> Vec<SourceFinanceRecord> {
        let path = self.config.cache_dir.join(format!("portal-{state}.json"));
        if let Some(records) = cache::load_fresh(&path) {
            return records;
        }
        if self.offline {
            return Vec::new();
        }

        let records = if state == "HI" {
            // Filings start the year before the election
            let where_clause = format!(
                "office='Governor' AND date>'{}-01-01T00:00:00'",
                self.config.cycle - 1
            );
            portal::socrata_governor_finance(
                &self.portal_client,
                HI_SOCRATA_BASE,
                &where_clause,
                HI_PORTAL_URL,
            )
            .await
        } else {
            portal::embedded_governor_finance(&self.portal_client, state).await
        };

        if !records.is_empty() {
            cache::store(&path, &records);
        }
        records
    }

    async fn aggregator_records(&self) -> HashMap<String, Vec<SourceFinanceRecord>> {
        if !self.aggregator.has_key() && !self.offline {
            info!(target: TARGET_FUSION, "No aggregator API key configured; skipping");
            return HashMap::new();
        }

        let mut by_state = HashMap::new();
        for state in GOVERNOR_STATES {
            let path = self.config.cache_dir.join(format!("aggregator-{state}.json"));
            let records = match cache::load_fresh(&path) {
                Some(records) => records,
                None if self.offline => Vec::new(),
                None => {
                    let records = self.aggregator.governor_finance(state).await;
                    if !records.is_empty() {
                        cache::store(&path, &records);
                    }
                    records
                }
            };
            if !records.is_empty() {
                by_state.insert(state.to_string(), records);
            }
        }
        by_state
    }
}
