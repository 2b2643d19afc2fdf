/*!
 * Ownership breakdown and state minimum compliance
 *
 * Ownership strings are classified with an ordered rule table; the first rule
 * whose pattern occurs in the lowercased string wins. Non-profit patterns come
 * first because "not for profit" also contains "for profit".
 */

use serde::{Deserialize, Serialize};

use crate::aggregate::median;
use crate::data_types::{OwnershipCategory, Scope, StateCode, StateMinimumStandard};
use crate::dataset::WrappedDataset;
use crate::join::{JoinedFacility, ScopeJoin};

/// Ordered `(pattern, category)` rules
pub const OWNERSHIP_RULES: &[(&str, OwnershipCategory)] = &[
    ("not for profit", OwnershipCategory::NonProfit),
    ("not-for-profit", OwnershipCategory::NonProfit),
    ("non profit", OwnershipCategory::NonProfit),
    ("non-profit", OwnershipCategory::NonProfit),
    ("nonprofit", OwnershipCategory::NonProfit),
    ("for profit", OwnershipCategory::ForProfit),
    ("for-profit", OwnershipCategory::ForProfit),
    ("proprietary", OwnershipCategory::ForProfit),
    ("government", OwnershipCategory::Government),
    ("federal", OwnershipCategory::Government),
    ("state", OwnershipCategory::Government),
    ("county", OwnershipCategory::Government),
    ("city", OwnershipCategory::Government),
    ("hospital district", OwnershipCategory::Government),
];

pub fn classify_ownership(raw: &str) -> Option<OwnershipCategory> {
    let lowered = raw.to_lowercase();
    OWNERSHIP_RULES
        .iter()
        .find(|(pattern, _)| lowered.contains(pattern))
        .map(|(_, category)| *category)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipBucket {
    pub count: usize,
    /// Share of classified facilities
    pub percent: f64,
    #[serde(rename = "medianHPRD")]
    pub median_hprd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipBreakdown {
    pub for_profit: OwnershipBucket,
    pub non_profit: OwnershipBucket,
    pub government: OwnershipBucket,
    pub classified: usize,
    /// Facilities whose ownership string matched no rule
    pub unclassified: usize,
}

impl OwnershipBreakdown {
    pub fn bucket(&self, category: OwnershipCategory) -> &OwnershipBucket {
        match category {
            OwnershipCategory::ForProfit => &self.for_profit,
            OwnershipCategory::NonProfit => &self.non_profit,
            OwnershipCategory::Government => &self.government,
        }
    }
}

/// Bucket the joined facilities of a scope; `None` when nothing classifies
pub fn ownership_breakdown(join: &ScopeJoin<'_>) -> Option<OwnershipBreakdown> {
    let classified: Vec<(OwnershipCategory, &JoinedFacility<'_>)> = join
        .joined
        .iter()
        .filter_map(|f| classify_ownership(&f.profile.ownership_raw).map(|c| (c, f)))
        .collect();
    if classified.is_empty() {
        return None;
    }
    let total = classified.len();

    let bucket = |category: OwnershipCategory| -> OwnershipBucket {
        let members: Vec<&JoinedFacility<'_>> = classified
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, f)| *f)
            .collect();
        OwnershipBucket {
            count: members.len(),
            percent: members.len() as f64 / total as f64 * 100.0,
            median_hprd: median(
                members
                    .iter()
                    .filter(|f| f.metrics.has_usable_staffing())
                    .map(|f| f.metrics.total_hprd)
                    .collect(),
            ),
        }
    };

    Some(OwnershipBreakdown {
        for_profit: bucket(OwnershipCategory::ForProfit),
        non_profit: bucket(OwnershipCategory::NonProfit),
        government: bucket(OwnershipCategory::Government),
        classified: total,
        unclassified: join.joined.len() - total,
    })
}

/// Facilities of a state below its minimum staffing standard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceSummary {
    pub state: StateCode,
    pub standard: StateMinimumStandard,
    pub standard_label: String,
    /// Joined facilities with usable staffing
    ///
    /// Facilities without a provider profile are left out here even though
    /// they count toward the scope's basics.
    pub facilities_assessed: usize,
    pub below_minimum: usize,
    /// Share of `facilities_assessed`, not of every facility in the scope
    pub below_minimum_percent: f64,
}

/// Compliance for a state scope with a known minimum; `None` otherwise
pub fn state_compliance(dataset: &WrappedDataset, join: &ScopeJoin<'_>) -> Option<ComplianceSummary> {
    let Scope::State(state) = join.scope else {
        return None;
    };
    let standard = *dataset.state_minimum(state)?;

    let assessed: Vec<f64> = join.usable().map(|f| f.metrics.total_hprd).collect();
    let below = assessed.iter().filter(|hprd| **hprd < standard.min_hprd).count();
    let below_minimum_percent = if assessed.is_empty() {
        0.0
    } else {
        below as f64 / assessed.len() as f64 * 100.0
    };

    Some(ComplianceSummary {
        state,
        standard,
        standard_label: standard.display_label(),
        facilities_assessed: assessed.len(),
        below_minimum: below,
        below_minimum_percent,
    })
}
