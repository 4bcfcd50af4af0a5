use crate::model::{CommitteeTotals, DonorCategory, DonorRecord, FundingBreakdown};

/// Convert committee-level aggregate totals into a percentage breakdown of
/// funding sources. Values are rounded to one decimal place; "other"
/// absorbs rounding slack and unclassified receipt categories (loans,
/// transfers, interest). All-zero when nothing has been raised.
pub fn compute_breakdown(totals: &CommitteeTotals) -> FundingBreakdown {
    if totals.total_raised <= 0.0 {
        return FundingBreakdown::default();
    }

    let total = totals.total_raised;
    let individual =
        (totals.individual_contributions + totals.individual_unitemized) / total * 100.0;
    let pac = totals.pac_contributions / total * 100.0;
    let party = totals.party_contributions / total * 100.0;
    let self_fund = totals.candidate_self_fund / total * 100.0;
    let other = (100.0 - individual - pac - party - self_fund).max(0.0);

    FundingBreakdown {
        individual: round1(individual),
        pac: round1(pac),
        party: round1(party),
        self_fund: round1(self_fund),
        other: round1(other),
    }
}

/// Derive a breakdown from a donor list when committee totals are
/// unavailable (aggregator and state portal sources). Each donor's amount
/// is bucketed by category and divided by the sum of categorized amounts,
/// expressed as whole percentages. Self-funding is not observable from
/// itemized donor data, so "self" is always zero here; the organization
/// share is reported under "other".
pub fn breakdown_from_donors(donors: &[DonorRecord]) -> FundingBreakdown {
    let mut individual = 0.0;
    let mut pac = 0.0;
    let mut party = 0.0;
    let mut organization = 0.0;

    for donor in donors {
        match donor.category {
            DonorCategory::Individual => individual += donor.amount,
            DonorCategory::Pac => pac += donor.amount,
            DonorCategory::Party => party += donor.amount,
            DonorCategory::Organization => organization += donor.amount,
        }
    }

    let categorized = individual + pac + party + organization;
    if categorized <= 0.0 {
        return FundingBreakdown::default();
    }

    FundingBreakdown {
        individual: (individual / categorized * 100.0).round(),
        pac: (pac / categorized * 100.0).round(),
        party: (party / categorized * 100.0).round(),
        self_fund: 0.0,
        other: (organization / categorized * 100.0).round(),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
