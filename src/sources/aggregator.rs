use serde_json::Value;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::donors::{classify, is_uninformative, DETAIL_DONOR_CAP};
use crate::model::{DonorRecord, Party, SourceFinanceRecord};
use crate::util::{round2, title_case};
use crate::TARGET_WEB_REQUEST;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How many election years behind the target cycle to look before giving
/// up. State filing calendars lag; a governor race for 2026 may still be
/// filed under 2024 or earlier.
const YEAR_FALLBACK: i32 = 4;

/// Client for the nonprofit state-finance aggregator API. The API keys
/// every response on grouped "token" objects; `token` unwraps them.
pub struct AggregatorClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    cycle: i32,
}

impl AggregatorClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        AggregatorClient {
            client,
            api_key: config.aggregator_api_key.clone(),
            base_url: config.aggregator_base_url.clone(),
            cycle: config.cycle,
        }
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn query(&self, params: &[(&str, String)]) -> Option<Value> {
        let request = self
            .client
            .get(&self.base_url)
            .query(&[("mode", "json"), ("APIKey", self.api_key.as_str())])
            .query(params);

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<Value>().await {
                    Ok(body) => Some(body),
                    Err(err) => {
                        warn!(
                            target: TARGET_WEB_REQUEST,
                            "Failed to parse aggregator response: {}", err
                        );
                        None
                    }
                }
            }
            Ok(response) => {
                warn!(
                    target: TARGET_WEB_REQUEST,
                    "Non-success status {} from aggregator", response.status()
                );
                None
            }
            Err(err) => {
                warn!(target: TARGET_WEB_REQUEST, "Aggregator request failed: {}", err);
                None
            }
        }
    }

    /// Fetch governor-race finance records for one state, trying the target
    /// cycle first and falling back through earlier years until candidates
    /// appear.
    pub async fn governor_finance(&self, state: &str) -> Vec<SourceFinanceRecord> {
        if !self.has_key() {
            return Vec::new();
        }

        for year in ((self.cycle - YEAR_FALLBACK)..=self.cycle).rev() {
            let params = [
                ("s", state.to_string()),
                ("y", year.to_string()),
                ("c-r-ot", "G".to_string()),
                ("gro", "c-t-id".to_string()),
            ];
            let Some(body) = self.query(&params).await else {
                continue;
            };
            let records = self.records_from_body(&body, state).await;
            if !records.is_empty() {
                debug!(
                    target: TARGET_WEB_REQUEST,
                    "Aggregator: {} governor candidates for {} (year {})",
                    records.len(),
                    state,
                    year
                );
                return records;
            }
        }

        debug!(target: TARGET_WEB_REQUEST, "Aggregator: no governor data for {}", state);
        Vec::new()
    }

    async fn records_from_body(&self, body: &Value, state: &str) -> Vec<SourceFinanceRecord> {
        let rows = body["records"].as_array().cloned().unwrap_or_default();
        let mut out = Vec::new();

        for row in &rows {
            let Some(name) = token(row, "Candidate") else {
                continue;
            };
            let total: f64 = token(row, "Total_$")
                .and_then(|raw| raw.replace(',', "").parse().ok())
                .unwrap_or(0.0);
            if total <= 0.0 {
                continue;
            }

            let party = party_from_row(row);
            let incumbent = token(row, "Incumbency_Status")
                .map(|status| status.eq_ignore_ascii_case("Incumbent"));

            let entity_id = row["Candidate_Entity"]["id"]
                .as_str()
                .map(String::from)
                .or_else(|| row["Candidate_Entity"]["id"].as_i64().map(|id| id.to_string()));
            let donors = match &entity_id {
                Some(id) => self.top_donors(id).await,
                None => Vec::new(),
            };
            let lookup_url = entity_id
                .map(|id| format!("https://www.followthemoney.org/entity-details?eid={id}"))
                .unwrap_or_default();

            out.push(SourceFinanceRecord {
                name: title_case(&name),
                total_raised: round2(total),
                donors,
                party,
                incumbent,
                lookup_url,
            });
        }

        debug!(
            target: TARGET_WEB_REQUEST,
            "Aggregator parsed {} of {} rows for {}", out.len(), rows.len(), state
        );
        out
    }

    /// Fetch one candidate's largest contributors, grouped by donor entity.
    async fn top_donors(&self, entity_id: &str) -> Vec<DonorRecord> {
        let params = [
            ("c-t-eid", entity_id.to_string()),
            ("gro", "d-eid".to_string()),
            ("so", "a".to_string()),
            ("sod", "0".to_string()),
        ];
        let Some(body) = self.query(&params).await else {
            return Vec::new();
        };

        let mut donors: Vec<DonorRecord> = body["records"]
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| {
                        let name = token(row, "Contributor")?;
                        if is_uninformative(&name) {
                            return None;
                        }
                        let amount: f64 =
                            token(row, "Total_$")?.replace(',', "").parse().ok()?;
                        if amount <= 0.0 {
                            return None;
                        }
                        let hint = token(row, "Type_of_Contributor");
                        Some(DonorRecord {
                            name: title_case(&name),
                            amount: round2(amount),
                            category: classify(&name, hint.as_deref()),
                            count: None,
                            description: None,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        donors.sort_by(|a, b| b.amount.total_cmp(&a.amount).then(a.name.cmp(&b.name)));
        donors.truncate(DETAIL_DONOR_CAP);
        donors
    }
}

/// Unwrap the aggregator's grouped-field shape: `{"Candidate": {"Candidate":
/// "SMITH, JANE", "id": ...}}`.
fn token(row: &Value, key: &str) -> Option<String> {
    row[key][key].as_str().map(|value| value.trim().to_string())
}

fn party_from_row(row: &Value) -> Option<Party> {
    token(row, "Specific_Party")
        .or_else(|| token(row, "General_Party"))
        .as_deref()
        .map(Party::from_code)
}
