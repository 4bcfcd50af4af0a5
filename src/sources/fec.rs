use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::{CandidateRecord, CommitteeTotals, District, Office, Party, RawContribution};
use crate::TARGET_WEB_REQUEST;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_DELAY: Duration = Duration::from_secs(2);
const MAX_RETRIES: usize = 3;
const PER_PAGE: usize = 100;

/// Client for the federal campaign-finance disclosure API.
///
/// All fetch methods degrade to empty data on failure after logging; a
/// source outage must never abort the pipeline.
pub struct FecClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    cycle: i32,
}

impl FecClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        FecClient {
            client,
            api_key: config.fec_api_key.clone(),
            base_url: config.fec_base_url.clone(),
            cycle: config.cycle,
        }
    }

    /// GET a JSON endpoint, retrying with exponential backoff when the API
    /// rate-limits us. Returns None after exhausting retries.
    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Option<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut delay = RETRY_DELAY;

        for attempt in 1..=MAX_RETRIES {
            let request = self
                .client
                .get(&url)
                .query(&[("api_key", self.api_key.as_str())])
                .query(params);

            match request.send().await {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    warn!(
                        target: TARGET_WEB_REQUEST,
                        "Rate limited on {} (attempt {}/{}), backing off {:?}",
                        path, attempt, MAX_RETRIES, delay
                    );
                    sleep(delay).await;
                    delay *= 2;
                }
                Ok(response) if response.status().is_success() => {
                    match response.json::<Value>().await {
                        Ok(body) => return Some(body),
                        Err(err) => {
                            warn!(
                                target: TARGET_WEB_REQUEST,
                                "Failed to parse response from {}: {}", path, err
                            );
                            return None;
                        }
                    }
                }
                Ok(response) => {
                    warn!(
                        target: TARGET_WEB_REQUEST,
                        "Non-success status {} from {}", response.status(), path
                    );
                    return None;
                }
                Err(err) => {
                    warn!(
                        target: TARGET_WEB_REQUEST,
                        "Request to {} failed (attempt {}/{}): {}", path, attempt, MAX_RETRIES, err
                    );
                    sleep(delay).await;
                    delay *= 2;
                }
            }
        }

        warn!(target: TARGET_WEB_REQUEST, "Giving up on {} after {} attempts", path, MAX_RETRIES);
        None
    }

    /// Fetch the declared candidate roster for one state and office,
    /// following pagination to the end.
    pub async fn candidates(&self, state: &str, office: Office) -> Vec<CandidateRecord> {
        let office_code = match office {
            Office::House => "H",
            Office::Senate => "S",
            // Governor races are not federal; nothing to fetch here.
            Office::Governor => return Vec::new(),
        };

        let mut out = Vec::new();
        let mut page = 1usize;

        loop {
            let params = [
                ("state", state.to_string()),
                ("office", office_code.to_string()),
                ("cycle", self.cycle.to_string()),
                ("candidate_status", "C".to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let Some(body) = self.get_json("/candidates/", &params).await else {
                break;
            };

            let results = body["results"].as_array().cloned().unwrap_or_default();
            for row in &results {
                if let Some(candidate) = self.candidate_from_row(row, state, office) {
                    out.push(candidate);
                }
            }

            let total_pages = body["pagination"]["pages"].as_u64().unwrap_or(1) as usize;
            if page >= total_pages || results.is_empty() {
                break;
            }
            page += 1;
        }

        debug!(
            target: TARGET_WEB_REQUEST,
            "Fetched {} {} candidates for {}", out.len(), office, state
        );
        out
    }

    fn candidate_from_row(
        &self,
        row: &Value,
        state: &str,
        office: Office,
    ) -> Option<CandidateRecord> {
        let fec_id = row["candidate_id"].as_str()?.to_string();
        let name = row["name"].as_str()?.to_string();
        let party = Party::from_code(row["party"].as_str().unwrap_or(""));
        let district = match office {
            Office::House => District::from_raw(row["district"].as_str().unwrap_or("")),
            _ => None,
        };
        let incumbent = row["incumbent_challenge"].as_str() == Some("I");

        Some(CandidateRecord {
            name,
            party,
            party_full: party.full_name().to_string(),
            state: state.to_string(),
            office,
            district,
            incumbent,
            fec_id,
            committee_id: String::new(),
            totals: None,
            funding_breakdown: Default::default(),
            donors: Vec::new(),
            lookup_url: String::new(),
        })
    }

    /// Look up a candidate's principal campaign committee.
    pub async fn principal_committee(&self, candidate_id: &str) -> Option<String> {
        let path = format!("/candidate/{candidate_id}/committees/");
        let params = [
            ("designation", "P".to_string()),
            ("cycle", self.cycle.to_string()),
        ];
        let body = self.get_json(&path, &params).await?;
        body["results"]
            .as_array()?
            .first()?
            .get("committee_id")?
            .as_str()
            .map(String::from)
    }

    /// Fetch committee-level financial totals for the current cycle.
    pub async fn committee_totals(&self, committee_id: &str) -> Option<CommitteeTotals> {
        let path = format!("/committee/{committee_id}/totals/");
        let params = [("cycle", self.cycle.to_string())];
        let body = self.get_json(&path, &params).await?;
        let row = body["results"].as_array()?.first()?;

        Some(CommitteeTotals {
            total_raised: num(row, "receipts"),
            total_spent: num(row, "disbursements"),
            individual_contributions: num(row, "individual_itemized_contributions"),
            individual_unitemized: num(row, "individual_unitemized_contributions"),
            pac_contributions: num(row, "other_political_committee_contributions"),
            party_contributions: num(row, "political_party_committee_contributions"),
            candidate_self_fund: num(row, "candidate_contribution"),
            cash_on_hand: num(row, "last_cash_on_hand_end_period"),
        })
    }

    /// Fetch the largest itemized receipts for a committee. `individual`
    /// selects person contributions; false selects committee-to-committee
    /// transfers (PACs, party committees, joint fundraisers).
    pub async fn itemized_receipts(
        &self,
        committee_id: &str,
        individual: bool,
    ) -> Vec<RawContribution> {
        let params = [
            ("committee_id", committee_id.to_string()),
            ("two_year_transaction_period", self.cycle.to_string()),
            ("is_individual", individual.to_string()),
            ("sort", "-contribution_receipt_amount".to_string()),
            ("per_page", PER_PAGE.to_string()),
        ];
        let Some(body) = self.get_json("/schedules/schedule_a/", &params).await else {
            return Vec::new();
        };

        body["results"]
            .as_array()
            .map(|rows| {
                rows.iter()
                    .map(|row| RawContribution {
                        contributor_name: str_field(row, "contributor_name"),
                        employer: str_field(row, "contributor_employer"),
                        occupation: str_field(row, "contributor_occupation"),
                        amount: num(row, "contribution_receipt_amount"),
                        type_hint: row["entity_type"].as_str().map(String::from),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn num(row: &Value, key: &str) -> f64 {
    row[key].as_f64().unwrap_or(0.0)
}

fn str_field(row: &Value, key: &str) -> String {
    row[key].as_str().unwrap_or("").to_string()
}
