use lazy_static::lazy_static;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Default election cycle targeted by the pipeline.
pub const DEFAULT_CYCLE: i32 = 2026;

/// All state and territory postal codes known to the federal regulator.
pub const STATES: [&str; 56] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC", "PR", "GU", "VI", "AS", "MP",
];

/// Territories without House races in the dataset.
pub const TERRITORIES: [&str; 5] = ["PR", "GU", "VI", "AS", "MP"];

/// States with Class II Senate seats up in 2026.
pub const SENATE_STATES: [&str; 33] = [
    "AL", "AK", "AR", "CO", "DE", "GA", "ID", "IL", "IA", "KS", "KY", "LA", "ME", "MA", "MI",
    "MN", "MS", "MT", "NE", "NH", "NJ", "NM", "NC", "OK", "OR", "RI", "SC", "SD", "TN", "TX",
    "VA", "WV", "WY",
];

/// States with governor races in 2026.
pub const GOVERNOR_STATES: [&str; 36] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "FL", "GA", "HI", "ID", "IL", "IA", "KS", "ME",
    "MD", "MA", "MI", "MN", "NE", "NV", "NH", "NM", "NY", "OH", "OK", "OR", "PA", "RI", "SC",
    "SD", "TN", "TX", "VT", "WI", "WY",
];

/// Single-district states whose House seat is at-large.
pub const AT_LARGE_STATES: [&str; 8] = ["AK", "DE", "MT", "ND", "SD", "VT", "WY", "DC"];

lazy_static! {
    static ref STATE_NAMES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("AL", "Alabama");
        map.insert("AK", "Alaska");
        map.insert("AZ", "Arizona");
        map.insert("AR", "Arkansas");
        map.insert("CA", "California");
        map.insert("CO", "Colorado");
        map.insert("CT", "Connecticut");
        map.insert("DE", "Delaware");
        map.insert("FL", "Florida");
        map.insert("GA", "Georgia");
        map.insert("HI", "Hawaii");
        map.insert("ID", "Idaho");
        map.insert("IL", "Illinois");
        map.insert("IN", "Indiana");
        map.insert("IA", "Iowa");
        map.insert("KS", "Kansas");
        map.insert("KY", "Kentucky");
        map.insert("LA", "Louisiana");
        map.insert("ME", "Maine");
        map.insert("MD", "Maryland");
        map.insert("MA", "Massachusetts");
        map.insert("MI", "Michigan");
        map.insert("MN", "Minnesota");
        map.insert("MS", "Mississippi");
        map.insert("MO", "Missouri");
        map.insert("MT", "Montana");
        map.insert("NE", "Nebraska");
        map.insert("NV", "Nevada");
        map.insert("NH", "New Hampshire");
        map.insert("NJ", "New Jersey");
        map.insert("NM", "New Mexico");
        map.insert("NY", "New York");
        map.insert("NC", "North Carolina");
        map.insert("ND", "North Dakota");
        map.insert("OH", "Ohio");
        map.insert("OK", "Oklahoma");
        map.insert("OR", "Oregon");
        map.insert("PA", "Pennsylvania");
        map.insert("RI", "Rhode Island");
        map.insert("SC", "South Carolina");
        map.insert("SD", "South Dakota");
        map.insert("TN", "Tennessee");
        map.insert("TX", "Texas");
        map.insert("UT", "Utah");
        map.insert("VT", "Vermont");
        map.insert("VA", "Virginia");
        map.insert("WA", "Washington");
        map.insert("WV", "West Virginia");
        map.insert("WI", "Wisconsin");
        map.insert("WY", "Wyoming");
        map.insert("DC", "District of Columbia");
        map.insert("PR", "Puerto Rico");
        map.insert("GU", "Guam");
        map.insert("VI", "U.S. Virgin Islands");
        map.insert("AS", "American Samoa");
        map.insert("MP", "Northern Mariana Islands");
        map
    };
}

/// Human-readable state name, falling back to the code itself.
pub fn state_name(code: &str) -> &str {
    STATE_NAMES.get(code).copied().unwrap_or(code)
}

/// Runtime configuration, environment-driven with workable defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub fec_api_key: String,
    pub fec_base_url: String,
    pub aggregator_api_key: String,
    pub aggregator_base_url: String,
    pub cycle: i32,
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            fec_api_key: env::var("FEC_API_KEY").unwrap_or_else(|_| "DEMO_KEY".to_string()),
            fec_base_url: env::var("FEC_BASE_URL")
                .unwrap_or_else(|_| "https://api.open.fec.gov/v1".to_string()),
            aggregator_api_key: env::var("AGGREGATOR_API_KEY").unwrap_or_default(),
            aggregator_base_url: env::var("AGGREGATOR_BASE_URL")
                .unwrap_or_else(|_| "https://api.followthemoney.org".to_string()),
            cycle: env::var("ELECTION_CYCLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CYCLE),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".cache")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names_cover_all_codes() {
        for code in STATES {
            assert_ne!(state_name(code), code, "missing name for {code}");
        }
    }

    #[test]
    fn test_unknown_code_falls_back() {
        assert_eq!(state_name("ZZ"), "ZZ");
    }

    #[test]
    fn test_senate_2026_is_class_ii() {
        assert!(SENATE_STATES.contains(&"TX"));
        assert!(SENATE_STATES.contains(&"GA"));
        assert!(SENATE_STATES.contains(&"NH"));
        // Class I was 2024, Class III is 2028
        assert!(!SENATE_STATES.contains(&"CA"));
        assert!(!SENATE_STATES.contains(&"FL"));
    }

    #[test]
    fn test_at_large_states_are_states() {
        for code in AT_LARGE_STATES {
            assert!(STATES.contains(&code));
        }
    }
}
