use lazy_static::lazy_static;
use std::collections::HashSet;

use crate::model::DonorCategory;

// Entries carrying an amount but no identifiable payer. Dropped outright,
// never retained as "unknown".
const UNINFORMATIVE_KEYWORDS: [&str; 4] = ["UNITEMIZED", "AGGREGATED", "NOT ITEMIZED", "ANONYMOUS"];

// Online fundraising platforms: the contributor of record for money they
// merely routed.
const PLATFORM_NAMES: [&str; 3] = ["WINRED", "ACTBLUE", "ACTBLUE TECHNICAL SERVICES"];

// Joint-fundraising-committee markers; their transfers are pass-through.
const JFC_KEYWORDS: [&str; 3] = ["VICTORY FUND", "VICTORY COMMITTEE", "JOINT FUNDRAISING"];

const PAC_NAME_KEYWORDS: [&str; 3] = ["PAC", "COMMITTEE", "POLITICAL ACTION"];
const ORG_NAME_KEYWORDS: [&str; 5] = ["LLC", "INC", "CORP", "ASSOCIATION", "UNION"];
const PARTY_NAME_KEYWORDS: [&str; 3] = ["PARTY", "DEMOCRATIC", "REPUBLICAN"];

lazy_static! {
    /// Declared employers that identify no actual employer. Contributions
    /// with these are grouped by the individual's own name instead.
    pub static ref NON_INFORMATIVE_EMPLOYERS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        set.insert("N/A");
        set.insert("NONE");
        set.insert("RETIRED");
        set.insert("SELF-EMPLOYED");
        set.insert("SELF");
        set.insert("NOT EMPLOYED");
        set.insert("HOMEMAKER");
        set.insert("INFORMATION REQUESTED");
        set
    };
}

/// True if the text names no identifiable payer (bulk/anonymous rollups).
pub fn is_uninformative(text: &str) -> bool {
    let upper = text.to_uppercase();
    UNINFORMATIVE_KEYWORDS.iter().any(|kw| upper.contains(kw))
}

/// True if the name is a fundraising platform or a joint fundraising
/// committee. Only consulted for committee-level contributions, where such
/// entries represent pass-through money reported elsewhere.
pub fn is_platform_or_jfc(name: &str) -> bool {
    let upper = name.to_uppercase();
    PLATFORM_NAMES.iter().any(|p| upper.contains(p))
        || JFC_KEYWORDS.iter().any(|kw| upper.contains(kw))
}

/// Assign a payer category from an explicit source hint when available,
/// otherwise from name-pattern keywords. Defaults to individual.
pub fn classify(name: &str, type_hint: Option<&str>) -> DonorCategory {
    if let Some(hint) = type_hint {
        let hint = hint.to_lowercase();
        if !hint.is_empty() {
            if hint.contains("individual") || hint.contains("person") {
                return DonorCategory::Individual;
            }
            if hint.contains("pac") || hint.contains("committee") {
                return DonorCategory::Pac;
            }
            if hint.contains("party") {
                return DonorCategory::Party;
            }
            if hint.contains("corp") || hint.contains("business") || hint.contains("organization")
            {
                return DonorCategory::Organization;
            }
        }
    }

    let upper = name.to_uppercase();
    if PAC_NAME_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
        return DonorCategory::Pac;
    }
    if ORG_NAME_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
        return DonorCategory::Organization;
    }
    if PARTY_NAME_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
        return DonorCategory::Party;
    }
    DonorCategory::Individual
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninformative_entries() {
        assert!(is_uninformative("Unitemized Contributions"));
        assert!(is_uninformative("AGGREGATED INDIVIDUAL RECEIPTS"));
        assert!(is_uninformative("Contributions Not Itemized"));
        assert!(is_uninformative("anonymous donor"));
        assert!(!is_uninformative("Jane Doe"));
        assert!(!is_uninformative("Acme Corp"));
    }

    #[test]
    fn test_platform_and_jfc_detection() {
        assert!(is_platform_or_jfc("WINRED"));
        assert!(is_platform_or_jfc("ActBlue Technical Services"));
        assert!(is_platform_or_jfc("Smith Victory Fund"));
        assert!(is_platform_or_jfc("TEAM JONES JOINT FUNDRAISING CMTE"));
        assert!(!is_platform_or_jfc("Teachers Union PAC"));
    }

    #[test]
    fn test_classify_from_hint() {
        assert_eq!(
            classify("whatever", Some("Individual")),
            DonorCategory::Individual
        );
        assert_eq!(
            classify("whatever", Some("Political Committee")),
            DonorCategory::Pac
        );
        assert_eq!(classify("whatever", Some("party")), DonorCategory::Party);
        assert_eq!(
            classify("whatever", Some("Business Entity")),
            DonorCategory::Organization
        );
    }

    #[test]
    fn test_classify_from_name_patterns() {
        assert_eq!(
            classify("FREEDOM WORKS PAC", None),
            DonorCategory::Pac
        );
        assert_eq!(
            classify("Acme Holdings LLC", None),
            DonorCategory::Organization
        );
        assert_eq!(
            classify("Democratic State Central Cmte of Iowa", None),
            DonorCategory::Party
        );
        assert_eq!(classify("Jane Doe", None), DonorCategory::Individual);
    }

    #[test]
    fn test_empty_hint_falls_through_to_name() {
        assert_eq!(
            classify("United Auto Workers Union", Some("")),
            DonorCategory::Organization
        );
    }
}
