use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity;

/// Party code enumeration used across all sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    #[serde(rename = "D")]
    Democratic,
    #[serde(rename = "R")]
    Republican,
    #[serde(rename = "L")]
    Libertarian,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "I")]
    Independent,
    #[serde(rename = "C")]
    Constitution,
    #[serde(rename = "?")]
    #[serde(other)]
    Unknown,
}

impl Party {
    /// Normalize a raw party code or name from any source to a single letter.
    pub fn from_code(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "D" | "DEM" | "DFL" | "DEMOCRATIC" => Party::Democratic,
            "R" | "REP" | "REPUBLICAN" => Party::Republican,
            "L" | "LIB" | "LIBERTARIAN" => Party::Libertarian,
            "G" | "GRE" | "GREEN" => Party::Green,
            "I" | "IND" | "NNE" | "INDEPENDENT" | "UNAFFILIATED" => Party::Independent,
            "C" | "CON" | "CONSTITUTION" => Party::Constitution,
            "" => Party::Unknown,
            _ => {
                // Long-form names from scraped pages
                let lower = upper.to_lowercase();
                if lower.contains("democrat") {
                    Party::Democratic
                } else if lower.contains("republican") {
                    Party::Republican
                } else if lower.contains("libertarian") {
                    Party::Libertarian
                } else if lower.contains("green") {
                    Party::Green
                } else if lower.contains("constitution") {
                    Party::Constitution
                } else if lower.contains("independent") || lower.contains("no party") {
                    Party::Independent
                } else {
                    Party::Unknown
                }
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Party::Democratic => "D",
            Party::Republican => "R",
            Party::Libertarian => "L",
            Party::Green => "G",
            Party::Independent => "I",
            Party::Constitution => "C",
            Party::Unknown => "?",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            Party::Democratic => "Democratic Party",
            Party::Republican => "Republican Party",
            Party::Libertarian => "Libertarian Party",
            Party::Green => "Green Party",
            Party::Independent => "Independent",
            Party::Constitution => "Constitution Party",
            Party::Unknown => "Unknown",
        }
    }

    /// True for the parties a source is allowed to backfill onto a roster
    /// candidate whose own party is unknown or independent.
    pub fn is_specific(&self) -> bool {
        matches!(
            self,
            Party::Democratic | Party::Republican | Party::Libertarian | Party::Green
        )
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Office {
    #[serde(rename = "U.S. House")]
    House,
    #[serde(rename = "U.S. Senate")]
    Senate,
    #[serde(rename = "Governor")]
    Governor,
}

impl Office {
    /// Short form used in race keys.
    pub fn key(&self) -> &'static str {
        match self {
            Office::House => "house",
            Office::Senate => "senate",
            Office::Governor => "governor",
        }
    }
}

impl fmt::Display for Office {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Office::House => write!(f, "U.S. House"),
            Office::Senate => write!(f, "U.S. Senate"),
            Office::Governor => write!(f, "Governor"),
        }
    }
}

/// U.S. House district: numbered, or the at-large marker for
/// single-district states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum District {
    Numbered(u8),
    AtLarge,
}

impl District {
    /// Parse a regulator-style district field ("00" means at-large).
    pub fn from_raw(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.eq_ignore_ascii_case("AL") {
            return Some(District::AtLarge);
        }
        match trimmed.parse::<u8>() {
            Ok(0) => Some(District::AtLarge),
            Ok(n) => Some(District::Numbered(n)),
            Err(_) => None,
        }
    }

    pub fn key(&self) -> String {
        match self {
            District::Numbered(n) => n.to_string(),
            District::AtLarge => "AL".to_string(),
        }
    }
}

impl From<District> for String {
    fn from(d: District) -> String {
        d.key()
    }
}

impl TryFrom<String> for District {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        District::from_raw(&value).ok_or_else(|| format!("invalid district: {value:?}"))
    }
}

/// Committee-level financial summary. Absent fields are zero, never missing,
/// so downstream math never branches on presence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitteeTotals {
    #[serde(default)]
    pub total_raised: f64,
    #[serde(default)]
    pub total_spent: f64,
    #[serde(default)]
    pub individual_contributions: f64,
    #[serde(default)]
    pub individual_unitemized: f64,
    #[serde(default)]
    pub pac_contributions: f64,
    #[serde(default)]
    pub party_contributions: f64,
    #[serde(default)]
    pub candidate_self_fund: f64,
    #[serde(default)]
    pub cash_on_hand: f64,
}

impl CommitteeTotals {
    /// Totals known only as a single raised figure (state and aggregator
    /// sources report no category sub-totals).
    pub fn raised_only(total_raised: f64) -> Self {
        CommitteeTotals {
            total_raised,
            ..Default::default()
        }
    }
}

/// Percentage breakdown of funding sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingBreakdown {
    #[serde(default)]
    pub individual: f64,
    #[serde(default)]
    pub pac: f64,
    #[serde(default)]
    pub party: f64,
    #[serde(rename = "self", default)]
    pub self_fund: f64,
    #[serde(default)]
    pub other: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonorCategory {
    Individual,
    Organization,
    Pac,
    Party,
}

impl fmt::Display for DonorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DonorCategory::Individual => write!(f, "individual"),
            DonorCategory::Organization => write!(f, "organization"),
            DonorCategory::Pac => write!(f, "pac"),
            DonorCategory::Party => write!(f, "party"),
        }
    }
}

/// One aggregated payer on a candidate's donor list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorRecord {
    pub name: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub category: DonorCategory,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// One raw itemized contribution as reported by a disclosure source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawContribution {
    #[serde(default)]
    pub contributor_name: String,
    #[serde(default)]
    pub employer: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub amount: f64,
    /// Source-provided payer category, when the source has one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub type_hint: Option<String>,
}

/// One source's view of one candidate's finances. Consumed by the fusion
/// resolver and discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFinanceRecord {
    pub name: String,
    #[serde(default)]
    pub total_raised: f64,
    #[serde(default)]
    pub donors: Vec<DonorRecord>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub party: Option<Party>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub incumbent: Option<bool>,
    /// Source's own disclosure page for this candidate, if it has one.
    #[serde(default)]
    pub lookup_url: String,
}

/// One candidate in one race.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    pub party: Party,
    #[serde(default)]
    pub party_full: String,
    pub state: String,
    pub office: Office,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub district: Option<District>,
    #[serde(default)]
    pub incumbent: bool,
    #[serde(default)]
    pub fec_id: String,
    #[serde(default)]
    pub committee_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub totals: Option<CommitteeTotals>,
    #[serde(default)]
    pub funding_breakdown: FundingBreakdown,
    #[serde(default)]
    pub donors: Vec<DonorRecord>,
    #[serde(default)]
    pub lookup_url: String,
}

impl CandidateRecord {
    pub fn total_raised(&self) -> f64 {
        self.totals.as_ref().map(|t| t.total_raised).unwrap_or(0.0)
    }

    pub fn cash_on_hand(&self) -> f64 {
        self.totals.as_ref().map(|t| t.cash_on_hand).unwrap_or(0.0)
    }

    pub fn has_finance(&self) -> bool {
        self.total_raised() > 0.0
    }

    /// Normalized-identity key: unique per person within a race.
    pub fn identity_key(&self) -> String {
        identity::normalize_name(&self.name)
    }
}

/// One race: a globally unique key and its candidate roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Race {
    pub race_key: String,
    pub label: String,
    pub state: String,
    pub office: Office,
    pub candidates: Vec<CandidateRecord>,
}
