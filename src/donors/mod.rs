pub mod aggregate;
pub mod classify;

pub use aggregate::{aggregate_committee, aggregate_individual};
pub use classify::{classify, is_platform_or_jfc, is_uninformative};

// Module-level log target
pub const TARGET_DONORS: &str = "donor";

/// Donor-list cap for summary views.
pub const SUMMARY_DONOR_CAP: usize = 5;
/// Donor-list cap for detail views and PAC-only lists.
pub const DETAIL_DONOR_CAP: usize = 10;
/// Individual contributors below this accumulated total are left off the
/// donor list.
pub const INDIVIDUAL_SIGNIFICANCE_FLOOR: f64 = 500.0;
